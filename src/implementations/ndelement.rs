//! ndelement, through an external bridge.
use super::bridge::{self, Adjustment};
use super::{ConstructionRequest, Implementation};
use crate::error::VerificationError;
use crate::settings::Settings;
use crate::tabulation::VerificationData;
use std::collections::BTreeMap;

#[derive(Debug, Clone, Copy, Default)]
pub struct NdelementImplementation;

impl Implementation for NdelementImplementation {
    fn id(&self) -> &'static str {
        "ndelement"
    }

    fn name(&self) -> &'static str {
        "ndelement"
    }

    fn url(&self) -> &'static str {
        "https://github.com/bempp/ndelement"
    }

    fn install(&self) -> Option<&'static str> {
        Some("pip3 install ndelement")
    }

    fn verification(&self) -> bool {
        true
    }

    fn format(&self, name: &str, params: &BTreeMap<String, String>) -> String {
        let mut out = format!("Family.{name}");
        out += &super::format_params(params, |key, value| match key {
            "continuity" => format!("Continuity.{value}"),
            _ => value.to_string(),
        });
        out
    }

    fn version(&self, settings: &Settings) -> Option<String> {
        settings.bridge(self.id()).and_then(|b| b.version.clone())
    }

    fn verify(
        &self,
        request: &ConstructionRequest<'_>,
        settings: &Settings,
    ) -> Result<VerificationData, VerificationError> {
        bridge::verification_data(self.id(), request, settings, |_| Adjustment::default())
    }
}

//! Basix, through an external bridge.
use super::bridge::{self, Adjustment};
use super::{ConstructionRequest, Implementation};
use crate::error::VerificationError;
use crate::settings::Settings;
use crate::tabulation::VerificationData;
use std::collections::BTreeMap;

#[derive(Debug, Clone, Copy, Default)]
pub struct BasixImplementation;

impl Implementation for BasixImplementation {
    fn id(&self) -> &'static str {
        "basix"
    }

    fn name(&self) -> &'static str {
        "Basix"
    }

    fn url(&self) -> &'static str {
        "https://github.com/FEniCS/basix"
    }

    fn install(&self) -> Option<&'static str> {
        Some("pip3 install fenics-basix")
    }

    fn verification(&self) -> bool {
        true
    }

    fn format(&self, name: &str, params: &BTreeMap<String, String>) -> String {
        let mut out = format!("basix.ElementFamily.{name}");
        out += &super::format_params(params, |key, value| match key {
            "lagrange_variant" => format!("basix.LagrangeVariant.{value}"),
            "dpc_variant" => format!("basix.DPCVariant.{value}"),
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

//! Bempp-cl, which is listed for its construction strings but not verified.
use super::{ConstructionRequest, Implementation};
use crate::error::{NotImplementedReason, VerificationError};
use crate::settings::Settings;
use crate::tabulation::VerificationData;
use std::collections::BTreeMap;

#[derive(Debug, Clone, Copy, Default)]
pub struct BemppClImplementation;

impl Implementation for BemppClImplementation {
    fn id(&self) -> &'static str {
        "bempp-cl"
    }

    fn name(&self) -> &'static str {
        "Bempp-cl"
    }

    fn url(&self) -> &'static str {
        "https://github.com/bempp/bempp-cl"
    }

    fn install(&self) -> Option<&'static str> {
        Some("pip3 install bempp-cl")
    }

    fn verification(&self) -> bool {
        false
    }

    fn format(&self, name: &str, _params: &BTreeMap<String, String>) -> String {
        format!("\"{name}\"")
    }

    fn version(&self, _settings: &Settings) -> Option<String> {
        None
    }

    fn verify(
        &self,
        _request: &ConstructionRequest<'_>,
        _settings: &Settings,
    ) -> Result<VerificationData, VerificationError> {
        let reason = NotImplementedReason::Unsupported("Bempp-cl is not verified".to_string());
        Err(reason.into())
    }
}

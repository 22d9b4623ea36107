//! The reference library, backed by `defelement-reference`.
use super::{ConstructionRequest, Implementation};
use crate::element::ElementDescriptor;
use crate::error::{NotImplementedReason, VerificationError};
use crate::example::ParamValue;
use crate::settings::Settings;
use crate::tabulation::{EntityDofMap, Tabulation, VerificationData};
use defelement_reference::create_element;
use nalgebra::DMatrix;
use std::collections::BTreeMap;
use std::sync::Arc;

#[derive(Debug, Clone, Copy, Default)]
pub struct SymfemImplementation;

pub(crate) fn map_reference_error(error: defelement_reference::Error) -> VerificationError {
    use defelement_reference::Error;
    let reason = match error {
        Error::UnsupportedDegree { degree, .. } => NotImplementedReason::Degree(degree),
        Error::UnsupportedVariant { variant, .. } => NotImplementedReason::Variant(variant),
        Error::UnsupportedCell { cell, .. } => NotImplementedReason::Cell(cell.to_string()),
        Error::UnknownCell(cell) => NotImplementedReason::Cell(cell),
        Error::NotUnisolvent { .. } => return VerificationError::Library(error.to_string()),
        other => NotImplementedReason::Unsupported(other.to_string()),
    };
    VerificationError::NotImplemented(reason)
}

impl Implementation for SymfemImplementation {
    fn id(&self) -> &'static str {
        "symfem"
    }

    fn name(&self) -> &'static str {
        "Symfem"
    }

    fn url(&self) -> &'static str {
        "https://github.com/mscroggs/symfem"
    }

    fn install(&self) -> Option<&'static str> {
        Some("pip3 install symfem")
    }

    fn verification(&self) -> bool {
        true
    }

    fn format(&self, name: &str, params: &BTreeMap<String, String>) -> String {
        let mut out = format!("\"{name}\"");
        out += &super::format_params(params, |_, value| format!("\"{value}\""));
        out
    }

    fn version(&self, _settings: &Settings) -> Option<String> {
        Some(defelement_reference::VERSION.to_string())
    }

    fn verify(
        &self,
        request: &ConstructionRequest<'_>,
        _settings: &Settings,
    ) -> Result<VerificationData, VerificationError> {
        let mut params = request.implementation.params.clone();
        for (key, value) in request.example.kwargs() {
            match value {
                ParamValue::Int(_) | ParamValue::Str(_) => {
                    params.insert(key.clone(), value.to_string());
                }
                ParamValue::List(_) => {
                    let reason = format!("list-valued parameter \"{key}\"");
                    return Err(NotImplementedReason::Unsupported(reason).into());
                }
            }
        }

        let element = create_element(
            request.cell.name(),
            &request.implementation.name,
            request.implementation.degree,
            &params,
        )
        .map_err(map_reference_error)?;
        let entity_dofs = EntityDofMap::new(element.entity_dof_map().to_vec());
        let element = Arc::new(element);

        let tabulator = move |points: &DMatrix<f64>| -> Result<Tabulation, VerificationError> {
            if points.ncols() != element.cell().tdim() {
                return Err(VerificationError::malformed(format!(
                    "points of dimension {} on a {}",
                    points.ncols(),
                    element.cell()
                )));
            }
            Tabulation::from_matrix(points.nrows(), element.value_size(), element.tabulate(points))
        };
        Ok(VerificationData::new(entity_dofs, tabulator))
    }

    fn notes(&self, element: &ElementDescriptor) -> Vec<String> {
        if element.implemented(self.id()) {
            Vec::new()
        } else {
            vec!["This element is not available in the reference library.".to_string()]
        }
    }
}

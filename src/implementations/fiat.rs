//! FIAT, through an external bridge.
//!
//! FIAT numbers the sub-entities of quadrilaterals and hexahedra differently from the
//! reference cells, and some FIAT elements carry more DOFs than the element they realise.
//! Both are corrected here, so the bridge reports FIAT's own numbering unchanged.
use super::bridge::{self, Adjustment};
use super::{ConstructionRequest, Implementation};
use crate::element::ElementDescriptor;
use crate::error::VerificationError;
use crate::settings::Settings;
use crate::tabulation::{EntityDofMap, VerificationData};
use defelement_reference::ReferenceCell;
use std::collections::BTreeMap;

#[derive(Debug, Clone, Copy, Default)]
pub struct FiatImplementation;

/// Reference sub-entity `i` of dimension `d` is FIAT sub-entity `QUADRILATERAL[d][i]`.
pub const QUADRILATERAL: [&[usize]; 3] = [&[0, 2, 1, 3], &[2, 0, 1, 3], &[0]];

pub const HEXAHEDRON: [&[usize]; 4] = [
    &[0, 4, 2, 6, 1, 5, 3, 7],
    &[8, 4, 0, 6, 2, 10, 1, 3, 9, 5, 7, 11],
    &[4, 2, 0, 1, 3, 5],
    &[0],
];

/// Elements whose FIAT realisation has extra DOFs, with the dimension of the actual element.
const TRUE_SPACE_DIMENSION: [(&str, usize); 5] = [
    ("Bell", 18),
    ("Mardal-Tai-Winther", 9),
    ("reduced Hsieh-Clough-Tocher", 9),
    ("Arnold-Winther", 24),
    ("nonconforming Arnold-Winther", 15),
];

/// Elements whose FIAT realisation carries `(tdim + 1)(tdim - 1)` extra DOFs.
const EXTRA_FACET_BUBBLES: [&str; 3] = [
    "Bernardi-Raugel",
    "Guzman-Neilan (first kind)",
    "Guzman-Neilan (second kind)",
];

/// The number of leading FIAT DOFs that belong to the element, if FIAT has extra DOFs.
pub fn reduced_dimension(element_name: &str, tdim: usize, fiat_dim: usize) -> Option<usize> {
    if EXTRA_FACET_BUBBLES.contains(&element_name) {
        return Some(fiat_dim.saturating_sub((tdim + 1) * (tdim - 1)));
    }
    TRUE_SPACE_DIMENSION
        .iter()
        .find(|(name, _)| *name == element_name)
        .map(|&(_, dim)| dim)
}

fn adjustment(cell: ReferenceCell, element_name: &str, reported: &EntityDofMap) -> Adjustment {
    let tables = match cell {
        ReferenceCell::Quadrilateral => QUADRILATERAL.to_vec(),
        ReferenceCell::Hexahedron => HEXAHEDRON.to_vec(),
        _ => Vec::new(),
    };
    Adjustment {
        tables,
        ndofs: reduced_dimension(element_name, cell.tdim(), reported.dof_count()),
    }
}

impl Implementation for FiatImplementation {
    fn id(&self) -> &'static str {
        "fiat"
    }

    fn name(&self) -> &'static str {
        "FIAT"
    }

    fn url(&self) -> &'static str {
        "https://github.com/firedrakeproject/fiat"
    }

    fn install(&self) -> Option<&'static str> {
        Some("pip3 install git+https://github.com/firedrakeproject/fiat.git")
    }

    fn verification(&self) -> bool {
        true
    }

    fn format(&self, name: &str, params: &BTreeMap<String, String>) -> String {
        let mut out = format!("FIAT.{name}");
        let arguments: Vec<_> = params
            .iter()
            .filter(|(key, _)| key.as_str() != "degree")
            .map(|(key, value)| match key.as_str() {
                "variant" => format!("{key}=\"{value}\""),
                _ => format!("{key}={value}"),
            })
            .collect();
        if !arguments.is_empty() {
            out += &format!("(..., {})", arguments.join(", "));
        }
        out
    }

    fn notes(&self, element: &ElementDescriptor) -> Vec<String> {
        let extra = TRUE_SPACE_DIMENSION
            .iter()
            .any(|(name, _)| *name == element.name)
            || EXTRA_FACET_BUBBLES.contains(&element.name.as_str());
        if extra {
            vec![
                "This implementation includes additional DOFs that are used when mapping the \
                 element, as described in Kirby (2018)."
                    .to_string(),
            ]
        } else {
            Vec::new()
        }
    }

    fn version(&self, settings: &Settings) -> Option<String> {
        settings.bridge(self.id()).and_then(|b| b.version.clone())
    }

    fn verify(
        &self,
        request: &ConstructionRequest<'_>,
        settings: &Settings,
    ) -> Result<VerificationData, VerificationError> {
        let cell = request.cell;
        let element_name = request.element.name.clone();
        bridge::verification_data(self.id(), request, settings, |reported| {
            adjustment(cell, &element_name, reported)
        })
    }
}

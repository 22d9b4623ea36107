//! Basix elements wrapped for UFL, through an external bridge.
//!
//! `basix.ufl` numbers the edges of triangles and the edges and faces of tetrahedra in the
//! opposite order to the reference cells. The bridge reports its own numbering, which is
//! reversed here.
//!
//! Two libraries live in this module: `basix.ufl` itself, constructed from its own recipes,
//! and `*(symfem -> basix.ufl)`, which hands the reference recipe to a bridge that converts
//! the reference element into a custom `basix.ufl` element.
use super::basix::BasixImplementation;
use super::bridge::{self, Adjustment};
use super::{ConstructionRequest, Implementation, REFERENCE};
use crate::element::ElementDescriptor;
use crate::error::VerificationError;
use crate::settings::Settings;
use crate::tabulation::VerificationData;
use defelement_reference::ReferenceCell;
use std::collections::BTreeMap;

/// Reference sub-entity `i` of dimension `d` is `basix.ufl` sub-entity `TRIANGLE[d][i]`.
pub const TRIANGLE: [&[usize]; 2] = [&[0, 1, 2], &[2, 1, 0]];

pub const TETRAHEDRON: [&[usize]; 3] = [&[0, 1, 2, 3], &[5, 4, 3, 2, 1, 0], &[3, 2, 1, 0]];

/// Elements that cannot be represented as custom `basix.ufl` elements, by descriptor id.
///
/// These are elements with derivative DOFs, macro elements, elements with different numbers
/// of DOFs on entities of the same type, mixed elements, dual elements and non-Ciarlet
/// elements.
pub const NOT_REPRESENTABLE: &[&str] = &[
    // Derivative DOFs
    "alfeld-sorokina",
    "argyris",
    "arnold-boffi-falk",
    "bell",
    "bernardi-raugel",
    "bogner-fox-schmitt",
    "hermite",
    "morley",
    "morley-wang-xu",
    "taylor",
    "wu-xu",
    // DOFs of div curl
    "gopalakrishnan-lederer-schoberl",
    // Macro elements
    "guzman-neilan",
    "guzman-neilan2",
    "hsieh-clough-tocher",
    "johnson-mercier",
    "p1-iso-p2",
    "p1-macro",
    "reduced-hsieh-clough-tocher",
    // Differently sized entities of one type
    "fortin-soulie",
    "transition",
    // Mixed
    "mini",
    "pechstein-schoberl",
    "taylor-hood",
    "scott-vogelius",
    // Dual
    "buffa-christiansen",
    "dual",
    "rotated-buffa-christiansen",
    // Not Ciarlet
    "direct-serendipity",
    "enriched-galerkin",
    "lfeg",
];

fn adjustment(cell: ReferenceCell) -> Adjustment {
    let tables = match cell {
        ReferenceCell::Triangle => TRIANGLE.to_vec(),
        ReferenceCell::Tetrahedron => TETRAHEDRON.to_vec(),
        _ => Vec::new(),
    };
    Adjustment {
        tables,
        ndofs: None,
    }
}

#[derive(Debug, Clone, Copy, Default)]
pub struct BasixUflImplementation;

impl Implementation for BasixUflImplementation {
    fn id(&self) -> &'static str {
        "basix.ufl"
    }

    fn name(&self) -> &'static str {
        "Basix.UFL"
    }

    fn url(&self) -> &'static str {
        "https://github.com/FEniCS/basix"
    }

    fn install(&self) -> Option<&'static str> {
        Some("pip3 install git+https://github.com/FEniCS/basix fenics-ufl")
    }

    fn verification(&self) -> bool {
        true
    }

    /// Formats as Basix does, with the value shape appended.
    fn format(&self, name: &str, params: &BTreeMap<String, String>) -> String {
        let mut basix_params = params.clone();
        let shape = basix_params.remove("shape");
        let mut out = BasixImplementation.format(name, &basix_params);
        if let Some(shape) = shape {
            out += &format!(", shape={shape}");
        }
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
        let cell = request.cell;
        bridge::verification_data(self.id(), request, settings, |_| adjustment(cell))
    }
}

#[derive(Debug, Clone, Copy, Default)]
pub struct CustomBasixUflImplementation;

impl Implementation for CustomBasixUflImplementation {
    fn id(&self) -> &'static str {
        "*(symfem -> basix.ufl)"
    }

    fn name(&self) -> &'static str {
        "Basix.UFL (custom element)"
    }

    fn url(&self) -> &'static str {
        "https://github.com/FEniCS/basix"
    }

    fn install(&self) -> Option<&'static str> {
        Some("pip3 install git+https://github.com/FEniCS/basix fenics-ufl symfem")
    }

    fn verification(&self) -> bool {
        true
    }

    fn recipe_library(&self) -> &'static str {
        REFERENCE
    }

    fn format(&self, name: &str, params: &BTreeMap<String, String>) -> String {
        let variant = params
            .get("variant")
            .map(|variant| format!(", variant=\"{variant}\""))
            .unwrap_or_default();
        format!(
            "symfem.basix_interface.create_basix_element(\
             symfem.create_element(..., \"{name}\", ...{variant}), ufl=True)"
        )
    }

    /// Every element the reference provides, unless it cannot be written as a custom element.
    fn implemented(&self, element: &ElementDescriptor) -> bool {
        element.implemented(REFERENCE) && !NOT_REPRESENTABLE.contains(&element.id.as_str())
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
        bridge::verification_data(self.id(), request, settings, |_| adjustment(cell))
    }
}

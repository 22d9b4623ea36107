//! Adapters for the finite element libraries taking part in verification.
//!
//! Every library is described by an [`Implementation`]. The set of libraries is fixed and
//! available through [`implementations`]; the reference library is [`REFERENCE`].
use crate::element::{ElementDescriptor, ImplementationString};
use crate::error::{NotImplementedReason, VerificationError};
use crate::example::Example;
use crate::settings::Settings;
use crate::tabulation::VerificationData;
use defelement_reference::ReferenceCell;
use std::collections::BTreeMap;

pub mod basix;
pub mod basix_ufl;
pub mod bempp_cl;
pub mod bridge;
pub mod fiat;
pub mod ndelement;
pub mod simplefem;
pub mod symfem;

/// The id of the library every other library is compared against.
pub const REFERENCE: &str = "symfem";

/// Everything an adapter needs to construct one example of an element.
#[derive(Debug, Clone, Copy)]
pub struct ConstructionRequest<'a> {
    pub element: &'a ElementDescriptor,
    pub example: &'a Example,
    pub cell: ReferenceCell,
    /// The library's implementation string, resolved for the example.
    pub implementation: &'a ImplementationString,
}

/// A finite element library.
pub trait Implementation: Sync {
    /// Short identifier, used as key in descriptors and results.
    fn id(&self) -> &'static str;

    /// Display name.
    fn name(&self) -> &'static str;

    fn url(&self) -> &'static str;

    /// Installation instructions, if the library can be installed.
    fn install(&self) -> Option<&'static str> {
        None
    }

    /// Whether results of this library are verified against the reference.
    fn verification(&self) -> bool;

    /// Renders the construction string of the element in the library's own syntax.
    fn format(&self, name: &str, params: &BTreeMap<String, String>) -> String;

    /// The library whose implementation strings in the descriptors construct elements in
    /// this one. Libraries that convert elements of another library read its recipes.
    fn recipe_library(&self) -> &'static str {
        self.id()
    }

    /// Whether the library provides the element at all.
    fn implemented(&self, element: &ElementDescriptor) -> bool {
        element.implemented(self.recipe_library())
    }

    /// Notes to show alongside the element for this library.
    fn notes(&self, _element: &ElementDescriptor) -> Vec<String> {
        Vec::new()
    }

    /// The version of the library, if it is available.
    fn version(&self, settings: &Settings) -> Option<String>;

    /// Constructs the element described by `request`.
    fn verify(
        &self,
        request: &ConstructionRequest<'_>,
        settings: &Settings,
    ) -> Result<VerificationData, VerificationError>;
}

static IMPLEMENTATIONS: [&dyn Implementation; 8] = [
    &symfem::SymfemImplementation,
    &simplefem::SimplefemImplementation,
    &basix::BasixImplementation,
    &basix_ufl::BasixUflImplementation,
    &basix_ufl::CustomBasixUflImplementation,
    &fiat::FiatImplementation,
    &ndelement::NdelementImplementation,
    &bempp_cl::BemppClImplementation,
];

/// All known libraries.
pub fn implementations() -> &'static [&'static dyn Implementation] {
    &IMPLEMENTATIONS
}

pub fn get(id: &str) -> Option<&'static dyn Implementation> {
    IMPLEMENTATIONS.iter().copied().find(|i| i.id() == id)
}

/// The reference library.
pub fn reference() -> &'static dyn Implementation {
    &symfem::SymfemImplementation
}

/// The libraries that are verified against the reference.
pub fn verified() -> impl Iterator<Item = &'static dyn Implementation> {
    IMPLEMENTATIONS
        .iter()
        .copied()
        .filter(|i| i.verification() && i.id() != REFERENCE)
}

/// Resolves the implementation string of `implementation` for an example.
///
/// Fails with `NotImplemented` if the element, the variant, the cell or the degree is not
/// covered by the library.
pub fn resolve(
    implementation: &dyn Implementation,
    element: &ElementDescriptor,
    example: &Example,
) -> Result<ImplementationString, VerificationError> {
    if !implementation.implemented(element) {
        return Err(NotImplementedReason::Element.into());
    }
    ReferenceCell::from_name(example.cell())
        .map_err(|_| NotImplementedReason::Cell(example.cell().to_string()))?;
    element.implementation_string(
        implementation.recipe_library(),
        example.cell(),
        example.degree(),
        example.variant(),
    )
}

/// Resolves the implementation string of `implementation` for an example and constructs the
/// element. Nothing is constructed if the example cannot be resolved.
pub fn construct(
    implementation: &dyn Implementation,
    element: &ElementDescriptor,
    example: &Example,
    settings: &Settings,
) -> Result<VerificationData, VerificationError> {
    let resolved = resolve(implementation, element, example)?;
    construct_resolved(implementation, element, example, &resolved, settings)
}

/// Constructs an element from an implementation string obtained with [`resolve`].
pub fn construct_resolved(
    implementation: &dyn Implementation,
    element: &ElementDescriptor,
    example: &Example,
    resolved: &ImplementationString,
    settings: &Settings,
) -> Result<VerificationData, VerificationError> {
    let cell = ReferenceCell::from_name(example.cell())
        .map_err(|_| NotImplementedReason::Cell(example.cell().to_string()))?;
    let request = ConstructionRequest {
        element,
        example,
        cell,
        implementation: resolved,
    };
    implementation.verify(&request, settings)
}

/// Renders `, key=value` for every parameter, in key order.
fn format_params(
    params: &BTreeMap<String, String>,
    render: impl Fn(&str, &str) -> String,
) -> String {
    params
        .iter()
        .map(|(key, value)| format!(", {key}={}", render(key, value)))
        .collect()
}

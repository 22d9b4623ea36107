//! Element families provided by the reference library.
//!
//! Families are looked up by name. Both short names (as used in implementation strings,
//! e.g. `N1div`) and common long names (e.g. `Raviart-Thomas`) are accepted.
use crate::cell::EntityMap;
use crate::functionals::Functional;
use crate::polynomials::cell_exponents;
use crate::quadrature::make_quadrature;
use crate::{CiarletElement, Error, ReferenceCell};
use std::collections::BTreeMap;

pub mod crouzeix_raviart;
pub mod hermite;
pub mod lagrange;
pub mod nedelec;
pub mod second_kind;

/// The families known to the reference library, by canonical name.
pub const FAMILIES: [&str; 8] = ["P", "dP", "Hermite", "CR", "N1div", "N1curl", "N2div", "N2curl"];

/// Maps a family name or alias onto its canonical name.
pub fn canonical_family(name: &str) -> Option<&'static str> {
    let canonical = match name {
        "P" | "Lagrange" | "lagrange" | "Q" => "P",
        "dP" | "discontinuous Lagrange" | "DG" => "dP",
        "Hermite" | "hermite" => "Hermite",
        "CR" | "Crouzeix-Raviart" | "crouzeix-raviart" => "CR",
        "N1div" | "Raviart-Thomas" | "RT" | "N1F" => "N1div",
        "N1curl" | "Nedelec" | "Nedelec (first kind)" | "N1E" => "N1curl",
        "N2div" | "Brezzi-Douglas-Marini" | "BDM" | "N2F" => "N2div",
        "N2curl" | "Nedelec (second kind)" | "N2E" => "N2curl",
        _ => return None,
    };
    Some(canonical)
}

/// Parsed construction parameters shared by all families.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
struct Parameters {
    variant: Option<String>,
    discontinuous: bool,
}

impl Parameters {
    fn parse(family: &str, params: &BTreeMap<String, String>) -> Result<Self, Error> {
        let mut parsed = Self::default();
        for (key, value) in params {
            match key.as_str() {
                "variant" | "lagrange_variant" => parsed.variant = Some(value.clone()),
                "discontinuous" => {
                    parsed.discontinuous = match value.as_str() {
                        "True" | "true" | "1" => true,
                        "False" | "false" | "0" => false,
                        _ => {
                            return Err(Error::UnsupportedParameter {
                                family: family.to_string(),
                                parameter: format!("{key}={value}"),
                            })
                        }
                    }
                }
                _ => {
                    return Err(Error::UnsupportedParameter {
                        family: family.to_string(),
                        parameter: key.clone(),
                    })
                }
            }
        }
        Ok(parsed)
    }

    fn check_variant(&self, family: &str, allowed: &[&str]) -> Result<(), Error> {
        match &self.variant {
            Some(variant) if !allowed.contains(&variant.as_str()) => {
                Err(Error::UnsupportedVariant {
                    family: family.to_string(),
                    variant: variant.clone(),
                })
            }
            _ => Ok(()),
        }
    }
}

/// Creates a reference element.
///
/// `params` holds the keyword parameters of the implementation string, for example
/// `variant=equispaced` or `discontinuous=True`.
pub fn create_element(
    cell: &str,
    family: &str,
    degree: usize,
    params: &BTreeMap<String, String>,
) -> Result<CiarletElement, Error> {
    let cell = ReferenceCell::from_name(cell)?;
    let canonical =
        canonical_family(family).ok_or_else(|| Error::UnknownFamily(family.to_string()))?;
    let parameters = Parameters::parse(canonical, params)?;
    // Moment-based families have the same entity spans for any choice of moment basis
    let moment_variants = ["legendre", "lagrange"];

    match canonical {
        "P" | "dP" => {
            parameters.check_variant(canonical, &["equispaced", "gll"])?;
            if parameters.variant.as_deref() == Some("gll") && degree > 2 {
                // GLL and equispaced points only agree up to degree 2
                return Err(Error::UnsupportedVariant {
                    family: canonical.to_string(),
                    variant: "gll".to_string(),
                });
            }
            lagrange::create(cell, degree, parameters.discontinuous || canonical == "dP")
        }
        "Hermite" => {
            parameters.check_variant(canonical, &[])?;
            hermite::create(cell, degree, parameters.discontinuous)
        }
        "CR" => {
            parameters.check_variant(canonical, &[])?;
            crouzeix_raviart::create(cell, degree, parameters.discontinuous)
        }
        "N1div" => {
            parameters.check_variant(canonical, &moment_variants)?;
            nedelec::create_div(cell, degree, parameters.discontinuous)
        }
        "N1curl" => {
            parameters.check_variant(canonical, &moment_variants)?;
            nedelec::create_curl(cell, degree, parameters.discontinuous)
        }
        "N2div" => {
            parameters.check_variant(canonical, &moment_variants)?;
            second_kind::create_div(cell, degree, parameters.discontinuous)
        }
        "N2curl" => {
            parameters.check_variant(canonical, &moment_variants)?;
            second_kind::create_curl(cell, degree, parameters.discontinuous)
        }
        _ => Err(Error::UnknownFamily(family.to_string())),
    }
}

/// Empty functional lists for every sub-entity of a cell.
pub(crate) fn empty_functionals(cell: ReferenceCell) -> Vec<Vec<Vec<Functional>>> {
    cell.entity_counts()
        .into_iter()
        .map(|count| vec![Vec::new(); count])
        .collect()
}

/// Integral moments on every sub-entity of dimension `dim`, against the scalar polynomials
/// of degree `q_degree` on the sub-entity, times each of the given directions.
pub(crate) fn entity_moments(
    cell: ReferenceCell,
    dim: usize,
    q_degree: usize,
    quadrature_degree: usize,
    directions: impl Fn(&EntityMap) -> Vec<Vec<f64>>,
) -> Vec<Vec<Functional>> {
    let entity_type = cell
        .sub_entity_type(dim)
        .expect("moments are taken on entities of positive dimension");
    let rule = make_quadrature(entity_type, quadrature_degree);
    let qs = cell_exponents(entity_type, q_degree);
    (0..cell.sub_entities(dim).len())
        .map(|entity| {
            let map = cell.sub_entity_map(dim, entity);
            let dirs = directions(&map);
            qs.iter()
                .flat_map(|q| {
                    dirs.iter()
                        .map(|d| Functional::entity_moment(&map, &rule, q, d))
                        .collect::<Vec<_>>()
                })
                .collect()
        })
        .collect()
}

/// Unit vectors of the given dimension.
pub(crate) fn unit_vectors(tdim: usize) -> Vec<Vec<f64>> {
    (0..tdim)
        .map(|i| (0..tdim).map(|j| if i == j { 1.0 } else { 0.0 }).collect())
        .collect()
}

pub(crate) fn require_cell(
    family: &str,
    cell: ReferenceCell,
    allowed: &[ReferenceCell],
) -> Result<(), Error> {
    if allowed.contains(&cell) {
        Ok(())
    } else {
        Err(Error::UnsupportedCell {
            family: family.to_string(),
            cell,
        })
    }
}

pub(crate) fn unsupported_degree(family: &str, degree: usize) -> Error {
    Error::UnsupportedDegree {
        family: family.to_string(),
        degree,
    }
}

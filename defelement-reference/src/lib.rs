//! Reference finite element definitions.
//!
//! This crate provides the elements that every other library is verified against. Elements are
//! defined in the Ciarlet sense: a reference cell, a polynomial span and a set of functionals
//! (degrees of freedom), each functional associated with a sub-entity of the cell. The basis is
//! obtained by inverting the dual matrix, see [`CiarletElement`].
//!
//! Cells follow the numbering of the DefElement reference cells. Vertex coordinates are given
//! by [`ReferenceCell::vertices`], and sub-entities are listed by
//! [`ReferenceCell::sub_entities`].
use std::fmt;
use std::fmt::{Display, Formatter};

pub mod cell;
pub mod ciarlet;
pub mod families;
pub mod functionals;
pub mod polynomials;
pub mod quadrature;

pub use cell::ReferenceCell;
pub use ciarlet::CiarletElement;
pub use families::create_element;

/// The version of the reference library, used to invalidate cached tabulations.
pub const VERSION: &str = env!("CARGO_PKG_VERSION");

/// Library-wide error type.
#[derive(Debug, Clone, PartialEq)]
#[non_exhaustive]
pub enum Error {
    /// The cell name is not one of the supported reference cells.
    UnknownCell(String),
    /// The element family is not known to the reference library.
    UnknownFamily(String),
    /// The family is known, but not defined on the requested cell.
    UnsupportedCell { family: String, cell: ReferenceCell },
    /// The family is known, but not for the requested degree.
    UnsupportedDegree { family: String, degree: usize },
    /// The requested variant of the family is not available.
    UnsupportedVariant { family: String, variant: String },
    /// A construction parameter was given that the family does not understand.
    UnsupportedParameter { family: String, parameter: String },
    /// The functionals do not determine a unique basis of the polynomial span.
    NotUnisolvent { family: String, degree: usize },
}

impl Error {
    /// Whether the error signals a missing feature rather than a broken definition.
    pub fn is_not_implemented(&self) -> bool {
        !matches!(self, Self::NotUnisolvent { .. })
    }
}

impl Display for Error {
    fn fmt(&self, f: &mut Formatter<'_>) -> fmt::Result {
        match self {
            Self::UnknownCell(cell) => write!(f, "unknown reference cell \"{cell}\""),
            Self::UnknownFamily(family) => write!(f, "unknown element family \"{family}\""),
            Self::UnsupportedCell { family, cell } => {
                write!(f, "element family \"{family}\" is not defined on a {cell}")
            }
            Self::UnsupportedDegree { family, degree } => {
                write!(f, "element family \"{family}\" is not available for degree {degree}")
            }
            Self::UnsupportedVariant { family, variant } => {
                write!(f, "element family \"{family}\" has no variant \"{variant}\"")
            }
            Self::UnsupportedParameter { family, parameter } => {
                write!(f, "element family \"{family}\" does not accept parameter \"{parameter}\"")
            }
            Self::NotUnisolvent { family, degree } => {
                write!(
                    f,
                    "the degrees of freedom of \"{family}\" (degree {degree}) are not unisolvent"
                )
            }
        }
    }
}

impl std::error::Error for Error {}

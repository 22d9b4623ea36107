//! The cubic Hermite element.
use super::{empty_functionals, require_cell, unsupported_degree};
use crate::functionals::Functional;
use crate::polynomials::{total_degree_exponents, PolynomialSet};
use crate::{CiarletElement, Error, ReferenceCell};

/// Creates the Hermite element, which is only defined for degree 3.
///
/// Degrees of freedom are point evaluations and first derivatives at the vertices, plus point
/// evaluations at the barycentres of the triangular sub-entities.
pub fn create(
    cell: ReferenceCell,
    degree: usize,
    discontinuous: bool,
) -> Result<CiarletElement, Error> {
    use ReferenceCell::*;
    require_cell("Hermite", cell, &[Interval, Triangle, Tetrahedron])?;
    if degree != 3 {
        return Err(unsupported_degree("Hermite", degree));
    }

    let tdim = cell.tdim();
    let span = PolynomialSet::full(tdim, 1, total_degree_exponents(tdim, 3));
    let mut functionals = empty_functionals(cell);
    for (v, vertex) in cell.vertices().into_iter().enumerate() {
        functionals[0][v].push(Functional::point_evaluation(vertex.clone()));
        for direction in 0..tdim {
            functionals[0][v].push(Functional::derivative_evaluation(vertex.clone(), direction));
        }
    }
    if tdim >= 2 {
        for (face, dofs) in functionals[2].iter_mut().enumerate() {
            dofs.push(Functional::point_evaluation(cell.sub_entity_midpoint(2, face)));
        }
    }

    CiarletElement::create(cell, "Hermite", degree, span, functionals, discontinuous)
}

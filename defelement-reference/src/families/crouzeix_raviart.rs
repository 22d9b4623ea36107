//! The Crouzeix-Raviart element.
use super::{empty_functionals, require_cell, unsupported_degree};
use crate::functionals::Functional;
use crate::polynomials::{total_degree_exponents, PolynomialSet};
use crate::{CiarletElement, Error, ReferenceCell};

/// Creates the linear Crouzeix-Raviart element, with point evaluations at facet midpoints.
pub fn create(
    cell: ReferenceCell,
    degree: usize,
    discontinuous: bool,
) -> Result<CiarletElement, Error> {
    require_cell("CR", cell, &[ReferenceCell::Triangle, ReferenceCell::Tetrahedron])?;
    if degree != 1 {
        return Err(unsupported_degree("CR", degree));
    }

    let tdim = cell.tdim();
    let span = PolynomialSet::full(tdim, 1, total_degree_exponents(tdim, 1));
    let mut functionals = empty_functionals(cell);
    for (facet, dofs) in functionals[tdim - 1].iter_mut().enumerate() {
        dofs.push(Functional::point_evaluation(cell.sub_entity_midpoint(tdim - 1, facet)));
    }

    CiarletElement::create(cell, "CR", degree, span, functionals, discontinuous)
}

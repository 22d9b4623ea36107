//! Nédélec elements of the second kind: `N2div` (Brezzi-Douglas-Marini) and `N2curl`.
use super::{empty_functionals, entity_moments, nedelec, require_cell, unsupported_degree};
use crate::functionals::Functional;
use crate::polynomials::{total_degree_exponents, PolynomialSet};
use crate::quadrature::make_quadrature;
use crate::{CiarletElement, Error, ReferenceCell};

fn full_span(cell: ReferenceCell, degree: usize) -> PolynomialSet {
    let tdim = cell.tdim();
    PolynomialSet::full(tdim, tdim, total_degree_exponents(tdim, degree))
}

/// Creates the Brezzi-Douglas-Marini element.
///
/// Degrees of freedom are normal moments against `P_k` on facets and, for `k >= 2`, interior
/// moments against the Nédélec (first kind) space of degree `k - 1`.
pub fn create_div(
    cell: ReferenceCell,
    degree: usize,
    discontinuous: bool,
) -> Result<CiarletElement, Error> {
    require_cell("N2div", cell, &[ReferenceCell::Triangle, ReferenceCell::Tetrahedron])?;
    if degree == 0 {
        return Err(unsupported_degree("N2div", degree));
    }
    let tdim = cell.tdim();
    let quadrature_degree = 2 * degree + 2;
    let mut functionals = empty_functionals(cell);
    functionals[tdim - 1] =
        entity_moments(cell, tdim - 1, degree, quadrature_degree, |map| vec![map.normal()]);
    if degree >= 2 {
        let rule = make_quadrature(cell, quadrature_degree);
        functionals[tdim][0] =
            Functional::moments_against(&nedelec::curl_span(cell, degree - 1), &rule);
    }
    let span = full_span(cell, degree);
    CiarletElement::create(cell, "N2div", degree, span, functionals, discontinuous)
}

/// Creates the Nédélec (second kind) element.
///
/// On tetrahedra, only the lowest degree is available.
pub fn create_curl(
    cell: ReferenceCell,
    degree: usize,
    discontinuous: bool,
) -> Result<CiarletElement, Error> {
    require_cell("N2curl", cell, &[ReferenceCell::Triangle, ReferenceCell::Tetrahedron])?;
    if degree == 0 || (cell == ReferenceCell::Tetrahedron && degree > 1) {
        return Err(unsupported_degree("N2curl", degree));
    }
    let tdim = cell.tdim();
    let quadrature_degree = 2 * degree + 2;
    let mut functionals = empty_functionals(cell);
    functionals[1] = entity_moments(cell, 1, degree, quadrature_degree, |map| vec![map.tangent()]);
    if degree >= 2 {
        let rule = make_quadrature(cell, quadrature_degree);
        functionals[tdim][0] =
            Functional::moments_against(&nedelec::div_span(cell, degree - 1), &rule);
    }
    let span = full_span(cell, degree);
    CiarletElement::create(cell, "N2curl", degree, span, functionals, discontinuous)
}

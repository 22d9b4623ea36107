//! Nédélec elements of the first kind: `N1div` (Raviart-Thomas) and `N1curl`.
use super::{empty_functionals, entity_moments, require_cell, unit_vectors, unsupported_degree};
use crate::polynomials::{homogeneous_exponents, index_of, total_degree_exponents, PolynomialSet};
use crate::{CiarletElement, Error, ReferenceCell};
use nalgebra::DMatrix;

fn levi_civita(i: usize, j: usize, k: usize) -> f64 {
    match (i, j, k) {
        (0, 1, 2) | (1, 2, 0) | (2, 0, 1) => 1.0,
        (0, 2, 1) | (2, 1, 0) | (1, 0, 2) => -1.0,
        _ => 0.0,
    }
}

/// Generators of `P_{k-1}^d`, embedded in the vector monomials of degree `k`.
fn vector_generators(tdim: usize, degree: usize) -> Vec<Vec<(usize, f64)>> {
    let exponents = total_degree_exponents(tdim, degree);
    let n = exponents.len();
    let mut rows = Vec::new();
    for c in 0..tdim {
        for m in total_degree_exponents(tdim, degree - 1) {
            let i = index_of(&exponents, &m).expect("lower degree monomials are included");
            rows.push(vec![(c * n + i, 1.0)]);
        }
    }
    rows
}

fn assemble(tdim: usize, degree: usize, rows: Vec<Vec<(usize, f64)>>) -> PolynomialSet {
    let exponents = total_degree_exponents(tdim, degree);
    let mut generators = DMatrix::zeros(rows.len(), tdim * exponents.len());
    for (r, row) in rows.iter().enumerate() {
        for &(col, value) in row {
            generators[(r, col)] += value;
        }
    }
    PolynomialSet::from_generators(tdim, tdim, exponents, generators)
}

/// The span `P_{k-1}^d + x P~_{k-1}` of the degree `k` Raviart-Thomas element.
pub fn div_span(cell: ReferenceCell, degree: usize) -> PolynomialSet {
    let tdim = cell.tdim();
    let exponents = total_degree_exponents(tdim, degree);
    let n = exponents.len();
    let mut rows = vector_generators(tdim, degree);
    for m in homogeneous_exponents(tdim, degree - 1) {
        let row = (0..tdim)
            .map(|c| {
                let mut e = m;
                e[c] += 1;
                let i = index_of(&exponents, &e).expect("degree k monomials are included");
                (c * n + i, 1.0)
            })
            .collect();
        rows.push(row);
    }
    assemble(tdim, degree, rows)
}

/// The span `P_{k-1}^d + S_k` of the degree `k` Nédélec (first kind) element, where `S_k`
/// holds the homogeneous fields of degree `k` orthogonal to `x`.
pub fn curl_span(cell: ReferenceCell, degree: usize) -> PolynomialSet {
    let tdim = cell.tdim();
    let exponents = total_degree_exponents(tdim, degree);
    let n = exponents.len();
    let mut rows = vector_generators(tdim, degree);
    let shifted = |m: [usize; 3], variable: usize| {
        let mut e = m;
        e[variable] += 1;
        index_of(&exponents, &e).expect("degree k monomials are included")
    };
    for m in homogeneous_exponents(tdim, degree - 1) {
        if tdim == 2 {
            // (-y, x) m
            rows.push(vec![(shifted(m, 1), -1.0), (n + shifted(m, 0), 1.0)]);
        } else {
            // x cross (e_c m)
            for c in 0..3 {
                let mut row = Vec::new();
                for j in 0..3 {
                    for v in 0..3 {
                        let sign = levi_civita(j, v, c);
                        if sign != 0.0 {
                            row.push((j * n + shifted(m, v), sign));
                        }
                    }
                }
                rows.push(row);
            }
        }
    }
    assemble(tdim, degree, rows)
}

/// Creates the Raviart-Thomas element with normal moments on facets.
pub fn create_div(
    cell: ReferenceCell,
    degree: usize,
    discontinuous: bool,
) -> Result<CiarletElement, Error> {
    require_cell("N1div", cell, &[ReferenceCell::Triangle, ReferenceCell::Tetrahedron])?;
    if degree == 0 {
        return Err(unsupported_degree("N1div", degree));
    }
    let tdim = cell.tdim();
    let quadrature_degree = 2 * degree + 2;
    let mut functionals = empty_functionals(cell);
    functionals[tdim - 1] =
        entity_moments(cell, tdim - 1, degree - 1, quadrature_degree, |map| vec![map.normal()]);
    if degree >= 2 {
        functionals[tdim] =
            entity_moments(cell, tdim, degree - 2, quadrature_degree, |_| unit_vectors(tdim));
    }
    let span = div_span(cell, degree);
    CiarletElement::create(cell, "N1div", degree, span, functionals, discontinuous)
}

/// Creates the Nédélec (first kind) element with tangential moments on edges.
pub fn create_curl(
    cell: ReferenceCell,
    degree: usize,
    discontinuous: bool,
) -> Result<CiarletElement, Error> {
    require_cell("N1curl", cell, &[ReferenceCell::Triangle, ReferenceCell::Tetrahedron])?;
    if degree == 0 {
        return Err(unsupported_degree("N1curl", degree));
    }
    let tdim = cell.tdim();
    let quadrature_degree = 2 * degree + 2;
    let mut functionals = empty_functionals(cell);
    functionals[1] =
        entity_moments(cell, 1, degree - 1, quadrature_degree, |map| vec![map.tangent()]);
    if tdim == 3 && degree >= 2 {
        functionals[2] =
            entity_moments(cell, 2, degree - 2, quadrature_degree, |map| map.axes.clone());
    }
    if degree >= tdim {
        functionals[tdim] = entity_moments(cell, tdim, degree - tdim, quadrature_degree, |_| {
            unit_vectors(tdim)
        });
    }
    let span = curl_span(cell, degree);
    CiarletElement::create(cell, "N1curl", degree, span, functionals, discontinuous)
}

//! Lagrange elements with equispaced point evaluations.
use super::empty_functionals;
use crate::functionals::Functional;
use crate::polynomials::{cell_exponents, PolynomialSet};
use crate::{CiarletElement, Error, ReferenceCell};

/// Points `i / n` of the lattice of size `n` that lie in the interior of `cell`.
pub fn interior_lattice(cell: ReferenceCell, n: usize) -> Vec<Vec<f64>> {
    let h = 1.0 / n as f64;
    let mut points = Vec::new();
    match cell {
        ReferenceCell::Interval => {
            for i in 1..n {
                points.push(vec![i as f64 * h]);
            }
        }
        ReferenceCell::Triangle => {
            for j in 1..n {
                for i in 1..n - j {
                    points.push(vec![i as f64 * h, j as f64 * h]);
                }
            }
        }
        ReferenceCell::Quadrilateral => {
            for j in 1..n {
                for i in 1..n {
                    points.push(vec![i as f64 * h, j as f64 * h]);
                }
            }
        }
        ReferenceCell::Tetrahedron => {
            for k in 1..n {
                for j in 1..n - k {
                    for i in 1..n - j - k {
                        points.push(vec![i as f64 * h, j as f64 * h, k as f64 * h]);
                    }
                }
            }
        }
        ReferenceCell::Hexahedron => {
            for k in 1..n {
                for j in 1..n {
                    for i in 1..n {
                        points.push(vec![i as f64 * h, j as f64 * h, k as f64 * h]);
                    }
                }
            }
        }
    }
    points
}

pub fn create(
    cell: ReferenceCell,
    degree: usize,
    discontinuous: bool,
) -> Result<CiarletElement, Error> {
    let tdim = cell.tdim();
    let span = PolynomialSet::full(tdim, 1, cell_exponents(cell, degree));
    let mut functionals = empty_functionals(cell);

    if degree == 0 {
        let midpoint = cell.sub_entity_midpoint(tdim, 0);
        functionals[tdim][0].push(Functional::point_evaluation(midpoint));
    } else {
        for (v, vertex) in cell.vertices().into_iter().enumerate() {
            functionals[0][v].push(Functional::point_evaluation(vertex));
        }
        for dim in 1..=tdim {
            let entity_type = cell
                .sub_entity_type(dim)
                .expect("entities of positive dimension have a type");
            let local_points = interior_lattice(entity_type, degree);
            for (entity, dofs) in functionals[dim].iter_mut().enumerate() {
                let map = cell.sub_entity_map(dim, entity);
                dofs.extend(
                    local_points
                        .iter()
                        .map(|t| Functional::point_evaluation(map.map_point(t))),
                );
            }
        }
    }

    CiarletElement::create(cell, "P", degree, span, functionals, discontinuous)
}

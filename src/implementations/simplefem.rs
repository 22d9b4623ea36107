//! Adapter for the `simplefem` crate.
//!
//! simplefem defines its elements on the triangle with vertices `(-1, 0)`, `(1, 0)` and
//! `(0, 1)` and does not report which sub-entity a basis function belongs to. The adapter
//! infers this from the position of each evaluation point, and maps sample points from the
//! reference triangle onto simplefem's triangle before tabulating.
use super::{ConstructionRequest, Implementation};
use crate::error::{NotImplementedReason, VerificationError};
use crate::settings::Settings;
use crate::tabulation::{EntityDofMap, Tabulation, VerificationData};
use defelement_reference::ReferenceCell;
use nalgebra::DMatrix;
use simplefem::Lagrange;
use std::collections::BTreeMap;
use std::sync::Arc;

const POSITION_TOLERANCE: f64 = 1e-10;

#[derive(Debug, Clone, Copy, Default)]
pub struct SimplefemImplementation;

/// The sub-entity `(dim, index)` in reference numbering that contains a point of
/// simplefem's triangle.
pub fn sub_entity_of(point: [f64; 2]) -> (usize, usize) {
    let [x, y] = point;
    let close = |a: f64, b: f64| (a - b).abs() < POSITION_TOLERANCE;
    for (v, vertex) in simplefem::VERTICES.iter().enumerate() {
        if close(x, vertex[0]) && close(y, vertex[1]) {
            return (0, v);
        }
    }
    if close(x + y, 1.0) {
        (1, 0)
    } else if close(y - x, 1.0) {
        (1, 1)
    } else if close(y, 0.0) {
        (1, 2)
    } else {
        (2, 0)
    }
}

/// Maps a point on the reference triangle onto simplefem's triangle.
pub fn to_simplefem_triangle(x: f64, y: f64) -> [f64; 2] {
    [2.0 * x + y - 1.0, y]
}

impl Implementation for SimplefemImplementation {
    fn id(&self) -> &'static str {
        "simplefem"
    }

    fn name(&self) -> &'static str {
        "simplefem"
    }

    fn url(&self) -> &'static str {
        "https://github.com/DefElement/simplefem"
    }

    fn verification(&self) -> bool {
        true
    }

    fn format(&self, name: &str, _params: &BTreeMap<String, String>) -> String {
        name.to_string()
    }

    fn version(&self, _settings: &Settings) -> Option<String> {
        Some(simplefem::VERSION.to_string())
    }

    fn verify(
        &self,
        request: &ConstructionRequest<'_>,
        _settings: &Settings,
    ) -> Result<VerificationData, VerificationError> {
        if request.implementation.name != "lagrange" {
            let name = request.implementation.name.clone();
            return Err(NotImplementedReason::Unsupported(format!("unknown element {name}")).into());
        }
        if request.cell != ReferenceCell::Triangle {
            return Err(NotImplementedReason::Cell(request.cell.to_string()).into());
        }
        let degree = request.implementation.degree;
        let element =
            Lagrange::new(degree).map_err(|_| NotImplementedReason::Degree(degree))?;

        let counts = request.cell.entity_counts();
        let mut entity_dofs: Vec<Vec<Vec<usize>>> =
            counts.iter().map(|&n| vec![Vec::new(); n]).collect();
        for (dof, &point) in element.evaluation_points().iter().enumerate() {
            let (dim, entity) = sub_entity_of(point);
            entity_dofs[dim][entity].push(dof);
        }

        let element = Arc::new(element);
        let tabulator = move |points: &DMatrix<f64>| -> Result<Tabulation, VerificationError> {
            if points.ncols() != 2 {
                return Err(VerificationError::malformed("simplefem only supports triangles"));
            }
            let table = DMatrix::from_fn(points.nrows(), element.dim(), |p, dof| {
                element.evaluate(dof, to_simplefem_triangle(points[(p, 0)], points[(p, 1)]))
            });
            Tabulation::from_matrix(points.nrows(), 1, table)
        };
        Ok(VerificationData::new(EntityDofMap::new(entity_dofs), tabulator))
    }
}

//! The basis comparator.
//!
//! Two elements are considered the same if, for every sub-entity, the basis functions
//! associated with that sub-entity span the same space. This makes the comparison
//! independent of the choice of basis within each sub-entity: scaling, reordering or mixing
//! the functions of one sub-entity does not change the outcome, while moving a function to
//! another sub-entity or changing the space does.
//!
//! Spans are compared through numerical ranks: the sub-blocks `A` and `B` of the two
//! tabulations span the same column space exactly when
//! `rank([A | B]) == rank(A) == rank(B)`.
use crate::error::VerificationError;
use crate::tabulation::{EntityDofMap, Tabulation, VerificationData};
use defelement_reference::ReferenceCell;
use nalgebra::DMatrix;
use std::fmt;
use std::fmt::{Display, Formatter};

/// Default relative tolerance for numerical ranks.
pub const DEFAULT_TOLERANCE: f64 = 1e-8;

/// A reason for two elements to disagree.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Mismatch {
    /// The elements have different value shapes.
    ValueShape { a: usize, b: usize },
    /// A sub-entity carries a different number of DOFs in the two elements.
    EntityCount {
        dim: usize,
        entity: usize,
        a: usize,
        b: usize,
    },
    /// A sub-entity carries the same number of DOFs, but they span different spaces.
    Rank {
        dim: usize,
        entity: usize,
        rank_a: usize,
        rank_b: usize,
        rank_combined: usize,
    },
}

impl Mismatch {
    /// The sub-entity the mismatch was found on, if any.
    pub fn entity(&self) -> Option<(usize, usize)> {
        match self {
            Self::ValueShape { .. } => None,
            Self::EntityCount { dim, entity, .. } | Self::Rank { dim, entity, .. } => {
                Some((*dim, *entity))
            }
        }
    }
}

impl Display for Mismatch {
    fn fmt(&self, f: &mut Formatter<'_>) -> fmt::Result {
        match self {
            Self::ValueShape { a, b } => write!(f, "value sizes differ ({a} != {b})"),
            Self::EntityCount { dim, entity, a, b } => write!(
                f,
                "sub-entity ({dim}, {entity}) has {a} DOFs in one element and {b} in the other"
            ),
            Self::Rank {
                dim,
                entity,
                rank_a,
                rank_b,
                rank_combined,
            } => write!(
                f,
                "sub-entity ({dim}, {entity}) spans differ (ranks {rank_a}, {rank_b}, combined \
                 {rank_combined})"
            ),
        }
    }
}

/// The outcome of a comparison. The elements agree if no mismatches were found.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct Verdict {
    mismatches: Vec<Mismatch>,
}

impl Verdict {
    pub fn passed(&self) -> bool {
        self.mismatches.is_empty()
    }

    /// The headline diagnostic: the first mismatch found.
    pub fn diagnostic(&self) -> Option<&Mismatch> {
        self.mismatches.first()
    }

    /// All mismatches, in the order the sub-entities were visited.
    pub fn mismatches(&self) -> &[Mismatch] {
        &self.mismatches
    }
}

/// The numerical rank of a matrix: the number of singular values above
/// `tolerance * sigma_max`.
pub fn rank(matrix: &DMatrix<f64>, tolerance: f64) -> usize {
    if matrix.is_empty() {
        return 0;
    }
    let singular_values = matrix.clone().singular_values();
    let max = singular_values.max();
    if max == 0.0 {
        return 0;
    }
    singular_values
        .iter()
        .filter(|&&s| s > tolerance * max)
        .count()
}

/// Scales every non-zero column to unit Euclidean norm.
fn normalize_columns(mut matrix: DMatrix<f64>) -> DMatrix<f64> {
    for mut column in matrix.column_iter_mut() {
        let norm = column.norm();
        if norm > 0.0 {
            column /= norm;
        }
    }
    matrix
}

/// Compares two tabulated elements on `cell`.
///
/// Both tabulations must be taken at the same points. Returns `MalformedInput` if an
/// entity map does not match the cell or does not partition the DOFs of its tabulation.
pub fn verify(
    cell: ReferenceCell,
    a: (&EntityDofMap, &Tabulation),
    b: (&EntityDofMap, &Tabulation),
    tolerance: f64,
) -> Result<Verdict, VerificationError> {
    let (map_a, table_a) = a;
    let (map_b, table_b) = b;
    map_a.validate(cell, table_a.ndofs())?;
    map_b.validate(cell, table_b.ndofs())?;
    if table_a.npoints() != table_b.npoints() {
        return Err(VerificationError::malformed(format!(
            "tabulations use different numbers of points ({} != {})",
            table_a.npoints(),
            table_b.npoints()
        )));
    }

    if table_a.value_size() != table_b.value_size() {
        return Ok(Verdict {
            mismatches: vec![Mismatch::ValueShape {
                a: table_a.value_size(),
                b: table_b.value_size(),
            }],
        });
    }

    let mut mismatches = Vec::new();
    for (dim, entity, dofs_a) in map_a.iter() {
        let dofs_b = map_b
            .dofs(dim, entity)
            .expect("both maps were validated against the same cell");
        if dofs_a.len() != dofs_b.len() {
            mismatches.push(Mismatch::EntityCount {
                dim,
                entity,
                a: dofs_a.len(),
                b: dofs_b.len(),
            });
            continue;
        }
        if dofs_a.is_empty() {
            continue;
        }

        let block_a = normalize_columns(table_a.columns(dofs_a));
        let block_b = normalize_columns(table_b.columns(dofs_b));
        let combined = DMatrix::from_fn(block_a.nrows(), dofs_a.len() + dofs_b.len(), |i, j| {
            if j < dofs_a.len() {
                block_a[(i, j)]
            } else {
                block_b[(i, j - dofs_a.len())]
            }
        });
        let rank_a = rank(&block_a, tolerance);
        let rank_b = rank(&block_b, tolerance);
        let rank_combined = rank(&combined, tolerance);
        if !(rank_a == rank_b && rank_combined == rank_a) {
            mismatches.push(Mismatch::Rank {
                dim,
                entity,
                rank_a,
                rank_b,
                rank_combined,
            });
        }
    }
    Ok(Verdict { mismatches })
}

/// Tabulates two constructed elements at `points` and compares them.
pub fn verify_data(
    cell: ReferenceCell,
    a: &VerificationData,
    b: &VerificationData,
    points: &DMatrix<f64>,
    tolerance: f64,
) -> Result<Verdict, VerificationError> {
    let table_a = a.tabulate(points)?;
    let table_b = b.tabulate(points)?;
    verify(
        cell,
        (&a.entity_dofs, &table_a),
        (&b.entity_dofs, &table_b),
        tolerance,
    )
}

//! Tabulated basis functions and sub-entity to DOF maps.
use crate::error::VerificationError;
use defelement_reference::ReferenceCell;
use nalgebra::DMatrix;
use serde::{Deserialize, Serialize};

/// Values of all basis functions of an element at a set of points.
///
/// The table has one row per (point, component) pair, ordered point-major, and one column per
/// basis function: entry `(p * value_size + c, d)` is component `c` of basis function `d` at
/// point `p`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Tabulation {
    npoints: usize,
    value_size: usize,
    table: DMatrix<f64>,
}

impl Tabulation {
    pub fn from_matrix(
        npoints: usize,
        value_size: usize,
        table: DMatrix<f64>,
    ) -> Result<Self, VerificationError> {
        if table.nrows() != npoints * value_size {
            return Err(VerificationError::malformed(format!(
                "tabulation has {} rows, expected {npoints} points times {value_size} components",
                table.nrows()
            )));
        }
        if table.iter().any(|v| !v.is_finite()) {
            return Err(VerificationError::malformed("tabulation contains non-finite values"));
        }
        Ok(Self {
            npoints,
            value_size,
            table,
        })
    }

    /// Builds a tabulation from nested values indexed `[point][component][dof]`.
    pub fn from_nested(values: &[Vec<Vec<f64>>]) -> Result<Self, VerificationError> {
        let npoints = values.len();
        let value_size = values.first().map_or(0, Vec::len);
        let ndofs = values
            .first()
            .and_then(|p| p.first())
            .map_or(0, Vec::len);
        let mut table = DMatrix::zeros(npoints * value_size, ndofs);
        for (p, components) in values.iter().enumerate() {
            if components.len() != value_size {
                return Err(VerificationError::malformed(format!(
                    "point {p} has {} components, expected {value_size}",
                    components.len()
                )));
            }
            for (c, dofs) in components.iter().enumerate() {
                if dofs.len() != ndofs {
                    return Err(VerificationError::malformed(format!(
                        "point {p}, component {c} has {} values, expected {ndofs}",
                        dofs.len()
                    )));
                }
                for (d, &v) in dofs.iter().enumerate() {
                    table[(p * value_size + c, d)] = v;
                }
            }
        }
        Self::from_matrix(npoints, value_size, table)
    }

    pub fn npoints(&self) -> usize {
        self.npoints
    }

    pub fn value_size(&self) -> usize {
        self.value_size
    }

    pub fn ndofs(&self) -> usize {
        self.table.ncols()
    }

    pub fn table(&self) -> &DMatrix<f64> {
        &self.table
    }

    pub fn value(&self, point: usize, component: usize, dof: usize) -> f64 {
        self.table[(point * self.value_size + component, dof)]
    }

    /// The flattened `(npoints * value_size) x dofs.len()` block for a subset of DOFs.
    pub fn columns(&self, dofs: &[usize]) -> DMatrix<f64> {
        self.table.select_columns(dofs)
    }

    /// Keeps only the first `ndofs` basis functions.
    pub fn truncated(&self, ndofs: usize) -> Self {
        let ndofs = ndofs.min(self.ndofs());
        Self {
            npoints: self.npoints,
            value_size: self.value_size,
            table: self.table.columns(0, ndofs).into_owned(),
        }
    }
}

/// The DOFs associated with each sub-entity, indexed `[dim][entity]`.
#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(transparent)]
pub struct EntityDofMap(Vec<Vec<Vec<usize>>>);

impl EntityDofMap {
    pub fn new(dofs: Vec<Vec<Vec<usize>>>) -> Self {
        Self(dofs)
    }

    pub fn dofs(&self, dim: usize, entity: usize) -> Option<&[usize]> {
        self.0
            .get(dim)
            .and_then(|d| d.get(entity))
            .map(Vec::as_slice)
    }

    /// Iterates over `(dim, entity, dofs)` for all sub-entities.
    pub fn iter(&self) -> impl Iterator<Item = (usize, usize, &[usize])> {
        self.0.iter().enumerate().flat_map(|(dim, entities)| {
            entities
                .iter()
                .enumerate()
                .map(move |(entity, dofs)| (dim, entity, dofs.as_slice()))
        })
    }

    /// The total number of DOFs listed in the map.
    pub fn dof_count(&self) -> usize {
        self.iter().map(|(_, _, dofs)| dofs.len()).sum()
    }

    pub fn into_inner(self) -> Vec<Vec<Vec<usize>>> {
        self.0
    }

    /// Checks that the map matches the topology of `cell` and partitions `0..ndofs`.
    pub fn validate(&self, cell: ReferenceCell, ndofs: usize) -> Result<(), VerificationError> {
        let counts = cell.entity_counts();
        if self.0.len() != counts.len() {
            return Err(VerificationError::malformed(format!(
                "entity map has {} dimensions, a {cell} has {}",
                self.0.len(),
                counts.len()
            )));
        }
        for (dim, (entities, &count)) in self.0.iter().zip(&counts).enumerate() {
            if entities.len() != count {
                return Err(VerificationError::malformed(format!(
                    "entity map has {} entities of dimension {dim}, a {cell} has {count}",
                    entities.len()
                )));
            }
        }
        let mut seen = vec![false; ndofs];
        for (dim, entity, dofs) in self.iter() {
            for &dof in dofs {
                match seen.get_mut(dof) {
                    Some(s) if !*s => *s = true,
                    Some(_) => {
                        return Err(VerificationError::malformed(format!(
                            "DOF {dof} is listed more than once (again at ({dim}, {entity}))"
                        )))
                    }
                    None => {
                        return Err(VerificationError::malformed(format!(
                            "DOF {dof} at ({dim}, {entity}) is out of range for {ndofs} DOFs"
                        )))
                    }
                }
            }
        }
        if let Some(missing) = seen.iter().position(|s| !s) {
            return Err(VerificationError::malformed(format!(
                "DOF {missing} is not associated with any sub-entity"
            )));
        }
        Ok(())
    }

    /// Renumbers sub-entities: entity `i` of dimension `d` in the result is entity
    /// `tables[d][i]` of `self`. Dimensions without a table are kept as they are.
    pub fn reindexed(&self, tables: &[&[usize]]) -> Self {
        let dofs = self
            .0
            .iter()
            .enumerate()
            .map(|(dim, entities)| match tables.get(dim) {
                Some(table) => table.iter().map(|&i| entities[i].clone()).collect(),
                None => entities.clone(),
            })
            .collect();
        Self(dofs)
    }

    /// Drops all DOFs with index `ndofs` or above.
    pub fn truncated(&self, ndofs: usize) -> Self {
        let dofs = self
            .0
            .iter()
            .map(|entities| {
                entities
                    .iter()
                    .map(|dofs| dofs.iter().copied().filter(|&d| d < ndofs).collect())
                    .collect()
            })
            .collect();
        Self(dofs)
    }
}

impl From<Vec<Vec<Vec<usize>>>> for EntityDofMap {
    fn from(dofs: Vec<Vec<Vec<usize>>>) -> Self {
        Self(dofs)
    }
}

/// Evaluates the basis functions of a constructed element at points on the reference cell.
///
/// `points` holds one point per row, in reference coordinates.
pub trait Tabulator: Send + Sync {
    fn tabulate(&self, points: &DMatrix<f64>) -> Result<Tabulation, VerificationError>;
}

impl<F> Tabulator for F
where
    F: Fn(&DMatrix<f64>) -> Result<Tabulation, VerificationError> + Send + Sync,
{
    fn tabulate(&self, points: &DMatrix<f64>) -> Result<Tabulation, VerificationError> {
        self(points)
    }
}

/// What an adapter returns for a constructed element: the sub-entity map in reference
/// numbering and a way to tabulate the basis.
pub struct VerificationData {
    pub entity_dofs: EntityDofMap,
    pub tabulator: Box<dyn Tabulator>,
}

impl VerificationData {
    pub fn new(entity_dofs: EntityDofMap, tabulator: impl Tabulator + 'static) -> Self {
        Self {
            entity_dofs,
            tabulator: Box::new(tabulator),
        }
    }

    pub fn tabulate(&self, points: &DMatrix<f64>) -> Result<Tabulation, VerificationError> {
        self.tabulator.tabulate(points)
    }
}

impl std::fmt::Debug for VerificationData {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("VerificationData")
            .field("entity_dofs", &self.entity_dofs)
            .finish_non_exhaustive()
    }
}

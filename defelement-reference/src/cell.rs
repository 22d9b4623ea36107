//! Reference cells and their sub-entity numbering.
use crate::Error;
use std::fmt;
use std::fmt::{Display, Formatter};
use std::str::FromStr;

/// The reference cells known to the verification engine.
#[derive(Debug, Copy, Clone, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub enum ReferenceCell {
    Interval,
    Triangle,
    Quadrilateral,
    Tetrahedron,
    Hexahedron,
}

impl ReferenceCell {
    pub const ALL: [ReferenceCell; 5] = [
        Self::Interval,
        Self::Triangle,
        Self::Quadrilateral,
        Self::Tetrahedron,
        Self::Hexahedron,
    ];

    pub fn from_name(name: &str) -> Result<Self, Error> {
        match name {
            "interval" => Ok(Self::Interval),
            "triangle" => Ok(Self::Triangle),
            "quadrilateral" => Ok(Self::Quadrilateral),
            "tetrahedron" => Ok(Self::Tetrahedron),
            "hexahedron" => Ok(Self::Hexahedron),
            _ => Err(Error::UnknownCell(name.to_string())),
        }
    }

    pub fn name(&self) -> &'static str {
        match self {
            Self::Interval => "interval",
            Self::Triangle => "triangle",
            Self::Quadrilateral => "quadrilateral",
            Self::Tetrahedron => "tetrahedron",
            Self::Hexahedron => "hexahedron",
        }
    }

    /// The topological dimension of the cell.
    pub fn tdim(&self) -> usize {
        match self {
            Self::Interval => 1,
            Self::Triangle | Self::Quadrilateral => 2,
            Self::Tetrahedron | Self::Hexahedron => 3,
        }
    }

    pub fn is_simplex(&self) -> bool {
        matches!(self, Self::Interval | Self::Triangle | Self::Tetrahedron)
    }

    /// Vertex coordinates of the cell, in reference numbering.
    pub fn vertices(&self) -> Vec<Vec<f64>> {
        let v: &[&[f64]] = match self {
            Self::Interval => &[&[0.0], &[1.0]],
            Self::Triangle => &[&[0.0, 0.0], &[1.0, 0.0], &[0.0, 1.0]],
            Self::Quadrilateral => &[&[0.0, 0.0], &[1.0, 0.0], &[0.0, 1.0], &[1.0, 1.0]],
            Self::Tetrahedron => &[
                &[0.0, 0.0, 0.0],
                &[1.0, 0.0, 0.0],
                &[0.0, 1.0, 0.0],
                &[0.0, 0.0, 1.0],
            ],
            Self::Hexahedron => &[
                &[0.0, 0.0, 0.0],
                &[1.0, 0.0, 0.0],
                &[0.0, 1.0, 0.0],
                &[1.0, 1.0, 0.0],
                &[0.0, 0.0, 1.0],
                &[1.0, 0.0, 1.0],
                &[0.0, 1.0, 1.0],
                &[1.0, 1.0, 1.0],
            ],
        };
        v.iter().map(|x| x.to_vec()).collect()
    }

    /// The vertices of each sub-entity of dimension `dim`.
    ///
    /// Returns an empty list if `dim` exceeds the dimension of the cell.
    pub fn sub_entities(&self, dim: usize) -> Vec<Vec<usize>> {
        let tdim = self.tdim();
        if dim > tdim {
            return Vec::new();
        }
        let nvertices = self.vertices().len();
        if dim == 0 {
            return (0..nvertices).map(|v| vec![v]).collect();
        }
        if dim == tdim {
            return vec![(0..nvertices).collect()];
        }
        let entities: &[&[usize]] = match (self, dim) {
            (Self::Triangle, 1) => &[&[1, 2], &[0, 2], &[0, 1]],
            (Self::Quadrilateral, 1) => &[&[0, 1], &[0, 2], &[1, 3], &[2, 3]],
            (Self::Tetrahedron, 1) => &[&[2, 3], &[1, 3], &[1, 2], &[0, 3], &[0, 2], &[0, 1]],
            (Self::Tetrahedron, 2) => &[&[1, 2, 3], &[0, 2, 3], &[0, 1, 3], &[0, 1, 2]],
            (Self::Hexahedron, 1) => &[
                &[0, 1],
                &[0, 2],
                &[0, 4],
                &[1, 3],
                &[1, 5],
                &[2, 3],
                &[2, 6],
                &[3, 7],
                &[4, 5],
                &[4, 6],
                &[5, 7],
                &[6, 7],
            ],
            (Self::Hexahedron, 2) => &[
                &[0, 1, 2, 3],
                &[0, 1, 4, 5],
                &[0, 2, 4, 6],
                &[1, 3, 5, 7],
                &[2, 3, 6, 7],
                &[4, 5, 6, 7],
            ],
            _ => unreachable!("all proper sub-entities are listed"),
        };
        entities.iter().map(|e| e.to_vec()).collect()
    }

    /// Number of sub-entities of each dimension `0..=tdim`.
    pub fn entity_counts(&self) -> Vec<usize> {
        (0..=self.tdim())
            .map(|dim| self.sub_entities(dim).len())
            .collect()
    }

    /// The cell type of a sub-entity, or `None` for vertices.
    pub fn sub_entity_type(&self, dim: usize) -> Option<ReferenceCell> {
        match dim {
            0 => None,
            1 => Some(Self::Interval),
            2 if self.is_simplex() => Some(Self::Triangle),
            2 => Some(Self::Quadrilateral),
            3 => Some(*self),
            _ => None,
        }
    }

    /// The affine map from the reference cell of a sub-entity onto the sub-entity.
    pub fn sub_entity_map(&self, dim: usize, index: usize) -> EntityMap {
        let vertices = self.vertices();
        let entity = &self.sub_entities(dim)[index];
        let origin = vertices[entity[0]].clone();
        let axes = match self.sub_entity_type(dim) {
            None => Vec::new(),
            Some(entity_type) => entity_type
                .axis_vertices()
                .iter()
                .map(|&local| {
                    vertices[entity[local]]
                        .iter()
                        .zip(&origin)
                        .map(|(x, o)| x - o)
                        .collect()
                })
                .collect(),
        };
        EntityMap { origin, axes }
    }

    /// Local vertices `v` such that `v - v_0` are the coordinate axes of the cell.
    fn axis_vertices(&self) -> &'static [usize] {
        match self {
            Self::Interval => &[1],
            Self::Triangle | Self::Quadrilateral => &[1, 2],
            Self::Tetrahedron => &[1, 2, 3],
            Self::Hexahedron => &[1, 2, 4],
        }
    }

    /// The midpoint (vertex average) of a sub-entity.
    pub fn sub_entity_midpoint(&self, dim: usize, index: usize) -> Vec<f64> {
        let vertices = self.vertices();
        let entity = &self.sub_entities(dim)[index];
        let mut midpoint = vec![0.0; self.tdim()];
        for &v in entity {
            for (m, x) in midpoint.iter_mut().zip(&vertices[v]) {
                *m += x / entity.len() as f64;
            }
        }
        midpoint
    }
}

impl Display for ReferenceCell {
    fn fmt(&self, f: &mut Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.name())
    }
}

impl FromStr for ReferenceCell {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::from_name(s)
    }
}

/// An affine parametrisation `x(t) = origin + sum_i t_i axes_i` of a sub-entity.
#[derive(Debug, Clone, PartialEq)]
pub struct EntityMap {
    pub origin: Vec<f64>,
    pub axes: Vec<Vec<f64>>,
}

impl EntityMap {
    pub fn map_point(&self, t: &[f64]) -> Vec<f64> {
        assert_eq!(t.len(), self.axes.len(), "parameter dimension mismatch");
        let mut x = self.origin.clone();
        for (ti, axis) in t.iter().zip(&self.axes) {
            for (xj, aj) in x.iter_mut().zip(axis) {
                *xj += ti * aj;
            }
        }
        x
    }

    /// The tangent of an edge, scaled with the edge length.
    pub fn tangent(&self) -> Vec<f64> {
        self.axes[0].clone()
    }

    /// A normal to a facet, scaled with the facet size.
    pub fn normal(&self) -> Vec<f64> {
        match self.axes.len() {
            1 => {
                let t = &self.axes[0];
                vec![-t[1], t[0]]
            }
            2 => {
                let (a, b) = (&self.axes[0], &self.axes[1]);
                vec![
                    a[1] * b[2] - a[2] * b[1],
                    a[2] * b[0] - a[0] * b[2],
                    a[0] * b[1] - a[1] * b[0],
                ]
            }
            n => panic!("facets of dimension {n} have no normal"),
        }
    }
}

//! A tiny finite element library.
//!
//! `simplefem` implements Lagrange elements on the triangle with vertices `(-1, 0)`, `(1, 0)`
//! and `(0, 1)`. It exists mainly to exercise cross-library verification on a cell that is not
//! the usual reference triangle.
use nalgebra::DMatrix;
use std::fmt;
use std::fmt::{Display, Formatter};

pub const VERSION: &str = env!("CARGO_PKG_VERSION");

/// The vertices of the triangle that all elements are defined on.
pub const VERTICES: [[f64; 2]; 3] = [[-1.0, 0.0], [1.0, 0.0], [0.0, 1.0]];

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Error {
    UnsupportedDegree(usize),
}

impl Display for Error {
    fn fmt(&self, f: &mut Formatter<'_>) -> fmt::Result {
        match self {
            Self::UnsupportedDegree(degree) => {
                write!(f, "Lagrange elements of degree {degree} are not supported")
            }
        }
    }
}

impl std::error::Error for Error {}

/// A Lagrange element with evaluation points on an equispaced lattice.
#[derive(Debug, Clone)]
pub struct Lagrange {
    degree: usize,
    points: Vec<[f64; 2]>,
    exponents: Vec<(i32, i32)>,
    // Row i holds the monomial coefficients of basis function i
    coefficients: DMatrix<f64>,
}

impl Lagrange {
    pub fn new(degree: usize) -> Result<Self, Error> {
        if degree == 0 {
            return Err(Error::UnsupportedDegree(degree));
        }
        let [a, b, c] = VERTICES;
        let k = degree as f64;
        let mut points = Vec::new();
        for j in 0..=degree {
            for i in 0..=degree - j {
                let (s, t) = (i as f64 / k, j as f64 / k);
                points.push([
                    a[0] + s * (b[0] - a[0]) + t * (c[0] - a[0]),
                    a[1] + s * (b[1] - a[1]) + t * (c[1] - a[1]),
                ]);
            }
        }
        let exponents: Vec<_> = (0..=degree as i32)
            .flat_map(|total| (0..=total).map(move |py| (total - py, py)))
            .collect();

        let n = points.len();
        let vandermonde = DMatrix::from_fn(n, n, |p, m| {
            let (ex, ey) = exponents[m];
            points[p][0].powi(ex) * points[p][1].powi(ey)
        });
        // phi_i(p_j) = (C V^T)_ij = delta_ij
        let coefficients = vandermonde
            .transpose()
            .try_inverse()
            .ok_or(Error::UnsupportedDegree(degree))?;

        Ok(Self {
            degree,
            points,
            exponents,
            coefficients,
        })
    }

    pub fn degree(&self) -> usize {
        self.degree
    }

    /// The number of basis functions.
    pub fn dim(&self) -> usize {
        self.points.len()
    }

    /// The evaluation points, numbered like the basis functions.
    pub fn evaluation_points(&self) -> &[[f64; 2]] {
        &self.points
    }

    /// Evaluates basis function `dof` at a point.
    pub fn evaluate(&self, dof: usize, point: [f64; 2]) -> f64 {
        self.exponents
            .iter()
            .enumerate()
            .map(|(m, &(ex, ey))| {
                self.coefficients[(dof, m)] * point[0].powi(ex) * point[1].powi(ey)
            })
            .sum()
    }

    /// Evaluates all basis functions at a point.
    pub fn evaluate_all(&self, point: [f64; 2]) -> Vec<f64> {
        (0..self.dim()).map(|dof| self.evaluate(dof, point)).collect()
    }
}

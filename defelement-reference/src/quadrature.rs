//! Quadrature rules on the reference cells.
//!
//! Rules for intervals, quadrilaterals and hexahedra are tensor products of Gauss-Legendre
//! rules. Triangles and tetrahedra use collapsed (Duffy) products of the same rules, which
//! is far from optimal in the number of points, but exact and simple.
use crate::ReferenceCell;
use std::f64::consts::PI;

/// A quadrature rule: points in reference coordinates and the corresponding weights.
#[derive(Debug, Clone, PartialEq)]
pub struct QuadratureRule {
    pub points: Vec<Vec<f64>>,
    pub weights: Vec<f64>,
}

impl QuadratureRule {
    pub fn len(&self) -> usize {
        self.weights.len()
    }

    pub fn is_empty(&self) -> bool {
        self.weights.is_empty()
    }

    pub fn iter(&self) -> impl Iterator<Item = (&[f64], f64)> {
        self.points
            .iter()
            .map(Vec::as_slice)
            .zip(self.weights.iter().copied())
    }
}

/// Legendre polynomial p_n(x) and p_{n-1}(x) by the three-term recurrence.
fn legendre(n: usize, x: f64) -> (f64, f64) {
    let mut p1 = 1.0;
    let mut p2 = 0.0;
    for m in 1..=n {
        let m = m as f64;
        let p3 = p2;
        p2 = p1;
        p1 = ((2.0 * m - 1.0) * x * p2 - (m - 1.0) * p3) / m;
    }
    (p1, p2)
}

/// Gauss-Legendre rule with `n` points on `[0, 1]`, exact for degree `2n - 1`.
///
/// # Panics
///
/// Panics if zero points are requested.
pub fn gauss_legendre(n: usize) -> (Vec<f64>, Vec<f64>) {
    assert!(n > 0, "number of points must be positive");
    let mut points = vec![0.0; n];
    let mut weights = vec![0.0; n];

    // Roots come in symmetric pairs, so only the first half needs Newton iterations
    for i in 0..(n + 1) / 2 {
        let mut x = (PI * (i as f64 + 0.75) / (n as f64 + 0.5)).cos();
        let mut dp;
        loop {
            let (p, p_prev) = legendre(n, x);
            dp = n as f64 * (x * p - p_prev) / (x * x - 1.0);
            let dx = -p / dp;
            x += dx;
            if dx.abs() <= 1e-15 {
                let (p, p_prev) = legendre(n, x);
                dp = n as f64 * (x * p - p_prev) / (x * x - 1.0);
                break;
            }
        }
        let w = 2.0 / ((1.0 - x * x) * dp * dp);

        // Map from [-1, 1] to [0, 1]
        points[i] = 0.5 * (1.0 - x);
        weights[i] = 0.5 * w;
        points[n - 1 - i] = 0.5 * (1.0 + x);
        weights[n - 1 - i] = 0.5 * w;
    }

    (points, weights)
}

fn points_for_degree(degree: usize) -> usize {
    degree / 2 + 1
}

/// A rule on `cell` that integrates polynomials of the given total degree exactly.
pub fn make_quadrature(cell: ReferenceCell, degree: usize) -> QuadratureRule {
    let mut rule = QuadratureRule {
        points: Vec::new(),
        weights: Vec::new(),
    };
    match cell {
        ReferenceCell::Interval => {
            let (x, w) = gauss_legendre(points_for_degree(degree));
            rule.points = x.into_iter().map(|x| vec![x]).collect();
            rule.weights = w;
        }
        ReferenceCell::Quadrilateral | ReferenceCell::Hexahedron => {
            let (x, w) = gauss_legendre(points_for_degree(degree));
            let tdim = cell.tdim();
            rule.points.push(Vec::new());
            rule.weights.push(1.0);
            for _ in 0..tdim {
                let mut points = Vec::new();
                let mut weights = Vec::new();
                for (p, wp) in rule.points.iter().zip(&rule.weights) {
                    for (xi, wi) in x.iter().zip(&w) {
                        let mut q = p.clone();
                        q.push(*xi);
                        points.push(q);
                        weights.push(wp * wi);
                    }
                }
                rule.points = points;
                rule.weights = weights;
            }
        }
        ReferenceCell::Triangle => {
            // The collapsed coordinate picks up one extra power of (1 - u) from the Jacobian
            let (x, w) = gauss_legendre(points_for_degree(degree + 1));
            for (&u, &wu) in x.iter().zip(&w) {
                for (&v, &wv) in x.iter().zip(&w) {
                    rule.points.push(vec![u, v * (1.0 - u)]);
                    rule.weights.push(wu * wv * (1.0 - u));
                }
            }
        }
        ReferenceCell::Tetrahedron => {
            let (x, w) = gauss_legendre(points_for_degree(degree + 2));
            for (&u, &wu) in x.iter().zip(&w) {
                for (&v, &wv) in x.iter().zip(&w) {
                    for (&s, &ws) in x.iter().zip(&w) {
                        rule.points
                            .push(vec![u, v * (1.0 - u), s * (1.0 - u) * (1.0 - v)]);
                        rule.weights
                            .push(wu * wv * ws * (1.0 - u).powi(2) * (1.0 - v));
                    }
                }
            }
        }
    }
    rule
}

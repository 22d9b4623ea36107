//! Monomial bases and polynomial spans.
use crate::ReferenceCell;
use itertools::iproduct;
use nalgebra::{DMatrix, DVector};

/// Exponents of a monomial in up to three variables.
pub type Exponent = [usize; 3];

/// Monomials of total degree at most `degree` in `tdim` variables.
///
/// Monomials are sorted by total degree, then lexicographically.
pub fn total_degree_exponents(tdim: usize, degree: usize) -> Vec<Exponent> {
    (0..=degree)
        .flat_map(|k| homogeneous_exponents(tdim, k))
        .collect()
}

/// Monomials of total degree exactly `degree` in `tdim` variables.
pub fn homogeneous_exponents(tdim: usize, degree: usize) -> Vec<Exponent> {
    let mut exponents = Vec::new();
    match tdim {
        1 => exponents.push([degree, 0, 0]),
        2 => {
            for a in (0..=degree).rev() {
                exponents.push([a, degree - a, 0]);
            }
        }
        3 => {
            for a in (0..=degree).rev() {
                for b in (0..=degree - a).rev() {
                    exponents.push([a, b, degree - a - b]);
                }
            }
        }
        _ => panic!("unsupported number of variables: {tdim}"),
    }
    exponents
}

/// Monomials with every exponent at most `degree`.
pub fn tensor_exponents(tdim: usize, degree: usize) -> Vec<Exponent> {
    let range = |d: usize| if d < tdim { 0..=degree } else { 0..=0 };
    let mut exponents: Vec<Exponent> = iproduct!(range(2), range(1), range(0))
        .map(|(c, b, a)| [a, b, c])
        .collect();
    exponents.sort_by_key(|e| (e.iter().sum::<usize>(), std::cmp::Reverse(*e)));
    exponents
}

/// The natural scalar polynomial space of degree `degree` on a cell: P_k on simplices and
/// Q_k on tensor product cells.
pub fn cell_exponents(cell: ReferenceCell, degree: usize) -> Vec<Exponent> {
    if cell.is_simplex() {
        total_degree_exponents(cell.tdim(), degree)
    } else {
        tensor_exponents(cell.tdim(), degree)
    }
}

pub fn evaluate_monomial(exponent: &Exponent, point: &[f64]) -> f64 {
    point
        .iter()
        .zip(exponent)
        .map(|(x, &e)| x.powi(e as i32))
        .product()
}

/// Partial derivative of a monomial in the direction of variable `direction`.
pub fn evaluate_monomial_derivative(exponent: &Exponent, point: &[f64], direction: usize) -> f64 {
    if exponent[direction] == 0 {
        return 0.0;
    }
    let mut lowered = *exponent;
    lowered[direction] -= 1;
    exponent[direction] as f64 * evaluate_monomial(&lowered, point)
}

/// Position of `exponent` in a list of monomials.
pub fn index_of(exponents: &[Exponent], exponent: &Exponent) -> Option<usize> {
    exponents.iter().position(|e| e == exponent)
}

/// A finite-dimensional space of (possibly vector-valued) polynomials.
///
/// Each member is stored as a row of coefficients with respect to the vector monomials
/// `e_c x^m`, where column `c * nmonomials + m` holds the coefficient of monomial `m` in
/// component `c`.
#[derive(Debug, Clone, PartialEq)]
pub struct PolynomialSet {
    tdim: usize,
    value_size: usize,
    exponents: Vec<Exponent>,
    coefficients: DMatrix<f64>,
}

impl PolynomialSet {
    /// The full space spanned by all vector monomials.
    pub fn full(tdim: usize, value_size: usize, exponents: Vec<Exponent>) -> Self {
        let n = value_size * exponents.len();
        Self {
            tdim,
            value_size,
            exponents,
            coefficients: DMatrix::identity(n, n),
        }
    }

    /// The space spanned by the rows of `generators`.
    ///
    /// The generators may be linearly dependent; the stored basis is an orthonormal basis
    /// of their span.
    pub fn from_generators(
        tdim: usize,
        value_size: usize,
        exponents: Vec<Exponent>,
        generators: DMatrix<f64>,
    ) -> Self {
        assert_eq!(generators.ncols(), value_size * exponents.len());
        if generators.nrows() == 0 {
            return Self {
                tdim,
                value_size,
                coefficients: DMatrix::zeros(0, value_size * exponents.len()),
                exponents,
            };
        }
        let ncols = generators.ncols();
        let svd = generators.svd(false, true);
        let max_sv = svd.singular_values.max();
        let v_t = svd
            .v_t
            .expect("right singular vectors were requested");
        let rows: Vec<_> = svd
            .singular_values
            .iter()
            .enumerate()
            .filter(|&(_, &s)| s > 1e-10 * max_sv)
            .map(|(i, _)| v_t.row(i).into_owned())
            .collect();
        let coefficients = if rows.is_empty() {
            DMatrix::zeros(0, ncols)
        } else {
            DMatrix::from_rows(&rows)
        };
        Self {
            tdim,
            value_size,
            exponents,
            coefficients,
        }
    }

    pub fn tdim(&self) -> usize {
        self.tdim
    }

    pub fn value_size(&self) -> usize {
        self.value_size
    }

    pub fn exponents(&self) -> &[Exponent] {
        &self.exponents
    }

    pub fn coefficients(&self) -> &DMatrix<f64> {
        &self.coefficients
    }

    pub fn dim(&self) -> usize {
        self.coefficients.nrows()
    }

    /// Monomial values (or partial derivatives) at a point.
    pub fn monomial_values(&self, point: &[f64], derivative: Option<usize>) -> DVector<f64> {
        DVector::from_iterator(
            self.exponents.len(),
            self.exponents.iter().map(|e| match derivative {
                None => evaluate_monomial(e, point),
                Some(direction) => evaluate_monomial_derivative(e, point, direction),
            }),
        )
    }

    /// Values of all members at a point, as a `dim x value_size` matrix.
    pub fn evaluate(&self, point: &[f64]) -> DMatrix<f64> {
        let monomials = self.monomial_values(point, None);
        let n = self.exponents.len();
        DMatrix::from_fn(self.dim(), self.value_size, |i, c| {
            self.coefficients
                .row(i)
                .columns(c * n, n)
                .transpose()
                .dot(&monomials)
        })
    }
}

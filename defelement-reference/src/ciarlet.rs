//! Ciarlet finite elements.
use crate::functionals::Functional;
use crate::polynomials::{evaluate_monomial, Exponent, PolynomialSet};
use crate::{Error, ReferenceCell};
use log::debug;
use nalgebra::DMatrix;

/// A finite element defined by a polynomial span and a dual set of functionals.
///
/// The basis function `phi_j` satisfies `l_i(phi_j) = delta_ij` for the functionals `l_i`,
/// numbered in the order in which they are listed per sub-entity: all vertices, then all
/// edges, and so on.
#[derive(Debug, Clone, PartialEq)]
pub struct CiarletElement {
    cell: ReferenceCell,
    family: String,
    degree: usize,
    value_size: usize,
    exponents: Vec<Exponent>,
    // Row j holds the coefficients of basis function j in the vector monomial basis
    coefficients: DMatrix<f64>,
    entity_dofs: Vec<Vec<Vec<usize>>>,
}

impl CiarletElement {
    /// Creates an element from its span and functionals.
    ///
    /// `functionals[d][e]` lists the functionals associated with sub-entity `e` of
    /// dimension `d`. If `discontinuous` is set, all degrees of freedom are associated with
    /// the interior of the cell instead.
    pub fn create(
        cell: ReferenceCell,
        family: &str,
        degree: usize,
        span: PolynomialSet,
        functionals: Vec<Vec<Vec<Functional>>>,
        discontinuous: bool,
    ) -> Result<Self, Error> {
        let tdim = cell.tdim();
        assert_eq!(functionals.len(), tdim + 1, "functionals must be given for every dimension");

        let mut entity_dofs = Vec::with_capacity(tdim + 1);
        let mut all = Vec::new();
        for (dim, entities) in functionals.into_iter().enumerate() {
            assert_eq!(entities.len(), cell.sub_entities(dim).len());
            let mut dofs_dim = Vec::with_capacity(entities.len());
            for entity in entities {
                let start = all.len();
                all.extend(entity);
                dofs_dim.push((start..all.len()).collect::<Vec<_>>());
            }
            entity_dofs.push(dofs_dim);
        }

        let not_unisolvent = || Error::NotUnisolvent {
            family: family.to_string(),
            degree,
        };
        if all.len() != span.dim() {
            debug!(
                "{family} of degree {degree} on {cell}: {} functionals for a span of dimension {}",
                all.len(),
                span.dim()
            );
            return Err(not_unisolvent());
        }

        // Dual matrix D_ij = l_i(s_j) for the span basis s_j
        let n = all.len();
        let mut dual = DMatrix::zeros(n, n);
        for (i, functional) in all.iter().enumerate() {
            dual.set_row(i, &functional.apply(&span).transpose());
        }
        if n > 0 {
            let singular_values = dual.clone().singular_values();
            if singular_values.min() <= 1e-12 * singular_values.max() {
                return Err(not_unisolvent());
            }
        }
        // With phi_j = sum_k A_jk s_k, l_i(phi_j) = (A D^T)_ji, so A = D^{-T}
        let inverse = dual
            .transpose()
            .try_inverse()
            .ok_or_else(not_unisolvent)?;
        let coefficients = inverse * span.coefficients();

        if discontinuous {
            for dofs in entity_dofs.iter_mut().take(tdim) {
                dofs.iter_mut().for_each(Vec::clear);
            }
            entity_dofs[tdim] = vec![(0..n).collect()];
        }

        Ok(Self {
            cell,
            family: family.to_string(),
            degree,
            value_size: span.value_size(),
            exponents: span.exponents().to_vec(),
            coefficients,
            entity_dofs,
        })
    }

    pub fn cell(&self) -> ReferenceCell {
        self.cell
    }

    pub fn family(&self) -> &str {
        &self.family
    }

    pub fn degree(&self) -> usize {
        self.degree
    }

    pub fn value_size(&self) -> usize {
        self.value_size
    }

    /// The number of basis functions.
    pub fn dim(&self) -> usize {
        self.coefficients.nrows()
    }

    pub fn entity_dofs(&self, dim: usize, entity: usize) -> Option<&[usize]> {
        self.entity_dofs
            .get(dim)
            .and_then(|d| d.get(entity))
            .map(Vec::as_slice)
    }

    /// The full sub-entity to degree of freedom map, indexed by `[dim][entity]`.
    pub fn entity_dof_map(&self) -> &[Vec<Vec<usize>>] {
        &self.entity_dofs
    }

    /// Evaluates all basis functions at the given points.
    ///
    /// `points` has one point per row. The result has one row per (point, component) pair,
    /// ordered point-major, and one column per basis function.
    pub fn tabulate(&self, points: &DMatrix<f64>) -> DMatrix<f64> {
        assert_eq!(points.ncols(), self.cell.tdim(), "points have the wrong dimension");
        let n = self.exponents.len();
        let mut table = DMatrix::zeros(points.nrows() * self.value_size, self.dim());
        let mut point = vec![0.0; points.ncols()];
        for p in 0..points.nrows() {
            for (d, x) in point.iter_mut().enumerate() {
                *x = points[(p, d)];
            }
            let monomials = nalgebra::DVector::from_iterator(
                n,
                self.exponents.iter().map(|e| evaluate_monomial(e, &point)),
            );
            for c in 0..self.value_size {
                let values = self.coefficients.columns(c * n, n) * &monomials;
                table.set_row(p * self.value_size + c, &values.transpose());
            }
        }
        table
    }
}

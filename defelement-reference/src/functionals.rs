//! Degrees of freedom as linear functionals on polynomial spaces.
use crate::cell::EntityMap;
use crate::polynomials::{evaluate_monomial, Exponent, PolynomialSet};
use crate::quadrature::QuadratureRule;
use nalgebra::DVector;

/// One term `weight * (D v)_component(point)` of a functional, where `D` is either the
/// identity or a partial derivative.
#[derive(Debug, Clone, PartialEq)]
pub struct Term {
    pub point: Vec<f64>,
    pub component: usize,
    pub derivative: Option<usize>,
    pub weight: f64,
}

/// A linear functional, represented as a finite sum of weighted point evaluations.
///
/// Integral moments are expanded with a quadrature rule that is exact for the spaces
/// involved, so every functional used by the reference elements has this form.
#[derive(Debug, Clone, PartialEq, Default)]
pub struct Functional {
    terms: Vec<Term>,
}

impl Functional {
    pub fn terms(&self) -> &[Term] {
        &self.terms
    }

    pub fn point_evaluation(point: Vec<f64>) -> Self {
        Self {
            terms: vec![Term {
                point,
                component: 0,
                derivative: None,
                weight: 1.0,
            }],
        }
    }

    pub fn derivative_evaluation(point: Vec<f64>, direction: usize) -> Self {
        Self {
            terms: vec![Term {
                point,
                component: 0,
                derivative: Some(direction),
                weight: 1.0,
            }],
        }
    }

    /// `v(point) . direction` for a vector-valued `v`.
    pub fn dot_point_evaluation(point: Vec<f64>, direction: &[f64]) -> Self {
        let terms = direction
            .iter()
            .enumerate()
            .filter(|&(_, &d)| d != 0.0)
            .map(|(component, &weight)| Term {
                point: point.clone(),
                component,
                derivative: None,
                weight,
            })
            .collect();
        Self { terms }
    }

    /// The moment `int_E q(t) v(x(t)) . direction dt` over a sub-entity `E`.
    ///
    /// `q` is a monomial in the local coordinates of the sub-entity, and `rule` is a
    /// quadrature rule on the reference cell of the sub-entity.
    pub fn entity_moment(
        map: &EntityMap,
        rule: &QuadratureRule,
        q: &Exponent,
        direction: &[f64],
    ) -> Self {
        let mut terms = Vec::new();
        for (t, w) in rule.iter() {
            let x = map.map_point(t);
            let qw = w * evaluate_monomial(q, t);
            for (component, &d) in direction.iter().enumerate() {
                if d != 0.0 {
                    terms.push(Term {
                        point: x.clone(),
                        component,
                        derivative: None,
                        weight: qw * d,
                    });
                }
            }
        }
        Self { terms }
    }

    /// The moment `int_K v . q` against every member `q` of `set`, over the whole cell.
    pub fn moments_against(set: &PolynomialSet, rule: &QuadratureRule) -> Vec<Self> {
        let mut functionals = vec![Functional::default(); set.dim()];
        for (x, w) in rule.iter() {
            let values = set.evaluate(x);
            for (i, functional) in functionals.iter_mut().enumerate() {
                for component in 0..set.value_size() {
                    let value = values[(i, component)];
                    if value != 0.0 {
                        functional.terms.push(Term {
                            point: x.to_vec(),
                            component,
                            derivative: None,
                            weight: w * value,
                        });
                    }
                }
            }
        }
        functionals
    }

    /// Applies the functional to every member of `set`.
    pub fn apply(&self, set: &PolynomialSet) -> DVector<f64> {
        let n = set.exponents().len();
        let coefficients = set.coefficients();
        let mut result = DVector::zeros(set.dim());
        for term in &self.terms {
            let monomials = set.monomial_values(&term.point, term.derivative);
            let block = coefficients.columns(term.component * n, n);
            result += term.weight * (block * monomials);
        }
        result
    }
}

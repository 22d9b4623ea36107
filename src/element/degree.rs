//! Integer expressions in the degree `k` and the topological dimension `tdim`.
//!
//! Used by the `DEGREEMAP`, `DEGREEMIN` and `DEGREEMAX` recipe parameters, for example
//! `DEGREEMAP=k+1` or `DEGREEMIN=tdim`. Supported syntax is integers, `k`, `tdim`, the binary
//! operators `+ - * /` (with `/` rounding down), unary minus and parentheses.
use std::fmt;
use std::fmt::{Display, Formatter};
use std::iter::Peekable;
use std::str::Chars;

#[derive(Clone, Debug, PartialEq, Eq)]
pub struct DegreeExprError {
    error: String,
}

impl DegreeExprError {
    fn new(error: impl Into<String>) -> Self {
        Self { error: error.into() }
    }
}

impl Display for DegreeExprError {
    fn fmt(&self, f: &mut Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.error)
    }
}

impl std::error::Error for DegreeExprError {}

#[derive(Clone, Debug, PartialEq, Eq)]
pub enum DegreeExpr {
    Const(i64),
    Degree,
    Tdim,
    Neg(Box<DegreeExpr>),
    Add(Box<DegreeExpr>, Box<DegreeExpr>),
    Sub(Box<DegreeExpr>, Box<DegreeExpr>),
    Mul(Box<DegreeExpr>, Box<DegreeExpr>),
    Div(Box<DegreeExpr>, Box<DegreeExpr>),
}

impl DegreeExpr {
    pub fn parse(input: &str) -> Result<Self, DegreeExprError> {
        let mut parser = Parser {
            chars: input.chars().peekable(),
        };
        let expr = parser.expr()?;
        parser.skip_whitespace();
        match parser.chars.next() {
            None => Ok(expr),
            Some(c) => Err(DegreeExprError::new(format!(
                "unexpected character '{c}' in degree expression \"{input}\""
            ))),
        }
    }

    pub fn evaluate(&self, degree: i64, tdim: i64) -> Result<i64, DegreeExprError> {
        let eval = |e: &DegreeExpr| e.evaluate(degree, tdim);
        Ok(match self {
            Self::Const(c) => *c,
            Self::Degree => degree,
            Self::Tdim => tdim,
            Self::Neg(a) => -eval(a)?,
            Self::Add(a, b) => eval(a)? + eval(b)?,
            Self::Sub(a, b) => eval(a)? - eval(b)?,
            Self::Mul(a, b) => eval(a)? * eval(b)?,
            Self::Div(a, b) => {
                let divisor = eval(b)?;
                if divisor == 0 {
                    return Err(DegreeExprError::new("division by zero in degree expression"));
                }
                eval(a)?.div_euclid(divisor)
            }
        })
    }
}

struct Parser<'a> {
    chars: Peekable<Chars<'a>>,
}

impl<'a> Parser<'a> {
    fn skip_whitespace(&mut self) {
        while self.chars.next_if(|c| c.is_whitespace()).is_some() {}
    }

    fn peek(&mut self) -> Option<char> {
        self.skip_whitespace();
        self.chars.peek().copied()
    }

    fn expr(&mut self) -> Result<DegreeExpr, DegreeExprError> {
        let mut lhs = self.term()?;
        while let Some(op @ ('+' | '-')) = self.peek() {
            self.chars.next();
            let rhs = self.term()?;
            lhs = match op {
                '+' => DegreeExpr::Add(Box::new(lhs), Box::new(rhs)),
                _ => DegreeExpr::Sub(Box::new(lhs), Box::new(rhs)),
            };
        }
        Ok(lhs)
    }

    fn term(&mut self) -> Result<DegreeExpr, DegreeExprError> {
        let mut lhs = self.factor()?;
        while let Some(op @ ('*' | '/')) = self.peek() {
            self.chars.next();
            let rhs = self.factor()?;
            lhs = match op {
                '*' => DegreeExpr::Mul(Box::new(lhs), Box::new(rhs)),
                _ => DegreeExpr::Div(Box::new(lhs), Box::new(rhs)),
            };
        }
        Ok(lhs)
    }

    fn factor(&mut self) -> Result<DegreeExpr, DegreeExprError> {
        match self.peek() {
            Some('-') => {
                self.chars.next();
                Ok(DegreeExpr::Neg(Box::new(self.factor()?)))
            }
            Some('(') => {
                self.chars.next();
                let inner = self.expr()?;
                match self.peek() {
                    Some(')') => {
                        self.chars.next();
                        Ok(inner)
                    }
                    _ => Err(DegreeExprError::new("missing closing parenthesis")),
                }
            }
            Some(c) if c.is_ascii_digit() => {
                let mut digits = String::new();
                while let Some(d) = self.chars.next_if(char::is_ascii_digit) {
                    digits.push(d);
                }
                digits
                    .parse()
                    .map(DegreeExpr::Const)
                    .map_err(|e| DegreeExprError::new(format!("invalid integer {digits}: {e}")))
            }
            Some(c) if c.is_ascii_alphabetic() => {
                let mut name = String::new();
                while let Some(d) = self.chars.next_if(|c| c.is_ascii_alphanumeric()) {
                    name.push(d);
                }
                match name.as_str() {
                    "k" => Ok(DegreeExpr::Degree),
                    "tdim" => Ok(DegreeExpr::Tdim),
                    _ => Err(DegreeExprError::new(format!("unknown variable \"{name}\""))),
                }
            }
            Some(c) => Err(DegreeExprError::new(format!("unexpected character '{c}'"))),
            None => Err(DegreeExprError::new("unexpected end of degree expression")),
        }
    }
}

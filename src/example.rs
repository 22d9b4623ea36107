//! Parsing of element examples.
//!
//! An example names a concrete instance of an element: a cell, a degree, an optional variant
//! and optional keyword arguments, written as
//!
//! ```text
//! triangle,2
//! quadrilateral,1,legendre
//! triangle,3 {reduced=True,orders=[1,2]}
//! ```
use serde::{Serialize, Serializer};
use std::collections::BTreeMap;
use std::fmt;
use std::fmt::{Display, Formatter};
use std::str::FromStr;

#[derive(Clone, Debug, PartialEq, Eq)]
pub struct ExampleParseError {
    error: String,
}

impl ExampleParseError {
    fn new(example: &str, error: impl Display) -> Self {
        Self {
            error: format!("invalid example \"{example}\": {error}"),
        }
    }
}

impl Display for ExampleParseError {
    fn fmt(&self, f: &mut Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.error)
    }
}

impl std::error::Error for ExampleParseError {}

/// A keyword argument value: an integer, a string or a list of values.
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum ParamValue {
    Int(i64),
    Str(String),
    List(Vec<ParamValue>),
}

impl ParamValue {
    fn parse(value: &str) -> Self {
        let value = value.trim();
        if let Some(inner) = value.strip_prefix('[').and_then(|v| v.strip_suffix(']')) {
            return Self::List(split_top_level(inner, ';').map(Self::parse).collect());
        }
        if !value.is_empty() && value.bytes().all(|b| b.is_ascii_digit()) {
            if let Ok(i) = value.parse() {
                return Self::Int(i);
            }
        }
        Self::Str(value.to_string())
    }
}

impl Display for ParamValue {
    fn fmt(&self, f: &mut Formatter<'_>) -> fmt::Result {
        match self {
            Self::Int(i) => write!(f, "{i}"),
            Self::Str(s) => write!(f, "{s}"),
            Self::List(values) => {
                write!(f, "[")?;
                for (i, v) in values.iter().enumerate() {
                    if i > 0 {
                        write!(f, ", ")?;
                    }
                    write!(f, "{v}")?;
                }
                write!(f, "]")
            }
        }
    }
}

impl Serialize for ParamValue {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        match self {
            Self::Int(i) => serializer.serialize_i64(*i),
            Self::Str(s) => serializer.serialize_str(s),
            Self::List(values) => values.serialize(serializer),
        }
    }
}

/// Splits at separators that are not nested inside brackets.
fn split_top_level(s: &str, separator: char) -> impl Iterator<Item = &str> {
    let mut parts = Vec::new();
    let mut depth = 0usize;
    let mut start = 0;
    for (i, c) in s.char_indices() {
        match c {
            '[' => depth += 1,
            ']' => depth = depth.saturating_sub(1),
            c if c == separator && depth == 0 => {
                parts.push(&s[start..i]);
                start = i + c.len_utf8();
            }
            _ => {}
        }
    }
    parts.push(&s[start..]);
    parts.into_iter()
}

/// A parsed example.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct Example {
    raw: String,
    cell: String,
    degree: usize,
    variant: Option<String>,
    kwargs: BTreeMap<String, ParamValue>,
}

impl Example {
    pub fn parse(example: &str) -> Result<Self, ExampleParseError> {
        let err = |e: &dyn Display| ExampleParseError::new(example, e);

        let (head, kwargs) = match example.split_once(" {") {
            Some((head, rest)) => {
                let body = rest
                    .split('}')
                    .next()
                    .unwrap_or_default();
                let mut kwargs = BTreeMap::new();
                for item in split_top_level(body, ',') {
                    // Commas inside lists are separators of list entries
                    let item = replace_nested_commas(item);
                    let (key, value) = item
                        .split_once('=')
                        .ok_or_else(|| err(&format!("expected key=value, found \"{item}\"")))?;
                    kwargs.insert(key.trim().to_string(), ParamValue::parse(value));
                }
                (head, kwargs)
            }
            None => (example, BTreeMap::new()),
        };

        let parts: Vec<&str> = head.split(',').collect();
        let (cell, degree, variant) = match parts.as_slice() {
            [cell, degree] => (cell, degree, None),
            [cell, degree, variant] => (cell, degree, Some(variant.trim().to_string())),
            _ => return Err(err(&"expected cell,degree[,variant]")),
        };
        let degree = degree
            .trim()
            .parse()
            .map_err(|e| err(&format!("degree \"{degree}\": {e}")))?;

        Ok(Self {
            raw: example.to_string(),
            cell: cell.trim().to_string(),
            degree,
            variant,
            kwargs,
        })
    }

    /// The example exactly as written in the descriptor.
    pub fn raw(&self) -> &str {
        &self.raw
    }

    pub fn cell(&self) -> &str {
        &self.cell
    }

    pub fn degree(&self) -> usize {
        self.degree
    }

    pub fn variant(&self) -> Option<&str> {
        self.variant.as_deref()
    }

    pub fn kwargs(&self) -> &BTreeMap<String, ParamValue> {
        &self.kwargs
    }
}

fn replace_nested_commas(s: &str) -> String {
    let mut depth = 0usize;
    s.chars()
        .map(|c| {
            match c {
                '[' => depth += 1,
                ']' => depth = depth.saturating_sub(1),
                ',' if depth > 0 => return ';',
                _ => {}
            }
            c
        })
        .collect()
}

impl FromStr for Example {
    type Err = ExampleParseError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::parse(s)
    }
}

impl Display for Example {
    fn fmt(&self, f: &mut Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.raw)
    }
}

//! Element descriptors and the element catalogue.
//!
//! Each descriptor lists the examples of an element and, for every library, how the element
//! is constructed there. An implementation entry is a recipe string such as
//! `P variant=equispaced DEGREEMAP=k+1`, `null` for an element the library does not provide,
//! or a map keyed by variant name and/or reference cell whose values are again entries.
use crate::error::{NotImplementedReason, VerificationError};
use crate::example::Example;
use crate::implementations::REFERENCE;
use defelement_reference::ReferenceCell;
use eyre::{eyre, WrapErr};
use log::debug;
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::fmt;
use std::path::Path;
use std::sync::Arc;

mod degree;

pub use degree::{DegreeExpr, DegreeExprError};

/// An implementation entry for one library.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum Recipe {
    Single(String),
    Keyed(BTreeMap<String, Option<Recipe>>),
}

/// A degree bound: either a fixed integer or an expression in `k` and `tdim`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum DegreeBound {
    Fixed(usize),
    Formula(String),
}

impl DegreeBound {
    fn evaluate(&self, degree: usize, tdim: usize) -> Result<i64, DegreeExprError> {
        match self {
            Self::Fixed(bound) => Ok(*bound as i64),
            Self::Formula(formula) => {
                DegreeExpr::parse(formula)?.evaluate(degree as i64, tdim as i64)
            }
        }
    }
}

/// An implementation string resolved for a specific example.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ImplementationString {
    /// The library-specific element name.
    pub name: String,
    /// The degree to pass to the library, after applying `DEGREEMAP`.
    pub degree: usize,
    /// Remaining `key=value` parameters.
    pub params: BTreeMap<String, String>,
}

impl fmt::Display for ImplementationString {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{} {}", self.name, self.degree)?;
        for (key, value) in &self.params {
            write!(f, " {key}={value}")?;
        }
        Ok(())
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub struct ElementDescriptor {
    /// Identifier, taken from the file stem of the descriptor.
    #[serde(skip)]
    pub id: String,
    pub name: String,
    pub reference_cells: Vec<String>,
    #[serde(default)]
    pub min_degree: Option<DegreeBound>,
    #[serde(default)]
    pub max_degree: Option<DegreeBound>,
    #[serde(default)]
    pub examples: Vec<String>,
    #[serde(default)]
    pub implementations: BTreeMap<String, Option<Recipe>>,
}

impl ElementDescriptor {
    pub fn from_json(id: &str, json: &str) -> eyre::Result<Self> {
        let mut descriptor: Self = serde_json::from_str(json)
            .wrap_err_with(|| format!("failed to parse element descriptor \"{id}\""))?;
        descriptor.id = id.to_string();
        Ok(descriptor)
    }

    /// Whether the library has an implementation entry for this element.
    pub fn implemented(&self, library: &str) -> bool {
        matches!(self.implementations.get(library), Some(Some(_)))
    }

    /// The libraries with an implementation entry, in alphabetical order.
    pub fn implemented_libraries(&self) -> impl Iterator<Item = &str> {
        self.implementations
            .iter()
            .filter(|(_, recipe)| recipe.is_some())
            .map(|(library, _)| library.as_str())
    }

    /// The parsed examples, in the order they are declared.
    pub fn parsed_examples(&self) -> eyre::Result<Vec<Example>> {
        self.examples
            .iter()
            .map(|e| {
                Example::parse(e)
                    .wrap_err_with(|| format!("in element descriptor \"{}\"", self.id))
            })
            .collect()
    }

    /// Whether `degree` lies within the declared degree range for the cell.
    pub fn degree_in_range(
        &self,
        cell: ReferenceCell,
        degree: usize,
    ) -> Result<bool, DegreeExprError> {
        let tdim = cell.tdim();
        let degree_i = degree as i64;
        if let Some(min) = &self.min_degree {
            if degree_i < min.evaluate(degree, tdim)? {
                return Ok(false);
            }
        }
        if let Some(max) = &self.max_degree {
            if degree_i > max.evaluate(degree, tdim)? {
                return Ok(false);
            }
        }
        Ok(true)
    }

    /// Resolves the implementation string of a library for a cell, degree and variant.
    pub fn implementation_string(
        &self,
        library: &str,
        cell: &str,
        degree: usize,
        variant: Option<&str>,
    ) -> Result<ImplementationString, VerificationError> {
        let not_implemented = |reason| Err(VerificationError::NotImplemented(reason));

        let mut entry = match self.implementations.get(library) {
            Some(Some(recipe)) => recipe,
            _ => return not_implemented(NotImplementedReason::Element),
        };
        let recipe = loop {
            match entry {
                Recipe::Single(recipe) => break recipe,
                Recipe::Keyed(map) => {
                    let key = variant
                        .filter(|v| map.contains_key(*v))
                        .or_else(|| map.contains_key(cell).then_some(cell));
                    entry = match key.and_then(|key| map.get(key)) {
                        Some(Some(next)) => next,
                        Some(None) => {
                            let reason = match variant.filter(|v| map.contains_key(*v)) {
                                Some(v) => NotImplementedReason::Variant(v.to_string()),
                                None => NotImplementedReason::Cell(cell.to_string()),
                            };
                            return not_implemented(reason);
                        }
                        None => {
                            let keyed_by_cell =
                                map.keys().any(|k| ReferenceCell::from_name(k).is_ok());
                            return match variant {
                                Some(v) if !keyed_by_cell => {
                                    not_implemented(NotImplementedReason::Variant(v.to_string()))
                                }
                                _ => not_implemented(NotImplementedReason::Cell(cell.to_string())),
                            };
                        }
                    };
                }
            }
        };

        let tdim = ReferenceCell::from_name(cell).map(|c| c.tdim()).unwrap_or(0);
        let mut parts = recipe.split_whitespace();
        let name = parts
            .next()
            .ok_or_else(|| {
                VerificationError::malformed(format!("empty {library} recipe in \"{}\"", self.id))
            })?
            .to_string();
        let mut params = BTreeMap::new();
        let mut mapped_degree = degree as i64;
        for part in parts {
            let (key, value) = part.split_once('=').ok_or_else(|| {
                let message = format!("recipe parameter \"{part}\" is not key=value");
                VerificationError::malformed(message)
            })?;
            let eval = |value: &str| {
                DegreeExpr::parse(value)
                    .and_then(|e| e.evaluate(degree as i64, tdim as i64))
                    .map_err(|e| VerificationError::malformed(e.to_string()))
            };
            match key {
                "DEGREEMAP" => mapped_degree = eval(value)?,
                "DEGREEMIN" if (degree as i64) < eval(value)? => {
                    return not_implemented(NotImplementedReason::Degree(degree))
                }
                "DEGREEMAX" if (degree as i64) > eval(value)? => {
                    return not_implemented(NotImplementedReason::Degree(degree))
                }
                "DEGREEMIN" | "DEGREEMAX" => {}
                _ => {
                    params.insert(key.to_string(), value.to_string());
                }
            }
        }
        let degree = usize::try_from(mapped_degree)
            .map_err(|_| VerificationError::NotImplemented(NotImplementedReason::Degree(degree)))?;

        Ok(ImplementationString {
            name,
            degree,
            params,
        })
    }

    /// Checks that every example can be resolved for every library that implements the
    /// element, returning a description of each problem found.
    pub fn validate(&self) -> Vec<String> {
        let mut problems = Vec::new();
        if !self.implemented(REFERENCE) {
            problems.push(format!("{}: no {REFERENCE} implementation", self.id));
        }
        let examples = match self.parsed_examples() {
            Ok(examples) => examples,
            Err(e) => {
                problems.push(format!("{e:#}"));
                return problems;
            }
        };
        for example in &examples {
            let cell = match ReferenceCell::from_name(example.cell()) {
                Ok(cell) => cell,
                Err(_) => {
                    let problem = format!("{}: example \"{example}\" has an unknown cell", self.id);
                    problems.push(problem);
                    continue;
                }
            };
            if !self.reference_cells.iter().any(|c| c == example.cell()) {
                problems.push(format!(
                    "{}: example \"{example}\" is on a cell that is not listed",
                    self.id
                ));
            }
            match self.degree_in_range(cell, example.degree()) {
                Ok(true) => {}
                Ok(false) => problems.push(format!(
                    "{}: example \"{example}\" is outside the degree range",
                    self.id
                )),
                Err(e) => problems.push(format!("{}: {e}", self.id)),
            }
            for library in self.implemented_libraries() {
                let resolved = self.implementation_string(
                    library,
                    example.cell(),
                    example.degree(),
                    example.variant(),
                );
                match resolved {
                    Ok(_) => {}
                    // Every example must be constructible by the reference library
                    Err(e) if library == REFERENCE => {
                        problems.push(format!("{}: example \"{example}\": {e}", self.id))
                    }
                    Err(VerificationError::NotImplemented(_)) => {}
                    Err(e) => problems.push(format!("{} ({library}): {e}", self.id)),
                }
            }
        }
        problems
    }
}

/// The catalogue of element descriptors.
#[derive(Debug, Clone, Default)]
pub struct ElementStore {
    elements: Vec<Arc<ElementDescriptor>>,
}

impl ElementStore {
    pub fn new(mut elements: Vec<ElementDescriptor>) -> Self {
        elements.sort_by(|a, b| a.id.cmp(&b.id));
        Self {
            elements: elements.into_iter().map(Arc::new).collect(),
        }
    }

    /// Loads every `*.json` descriptor in a directory.
    pub fn load_dir(path: impl AsRef<Path>) -> eyre::Result<Self> {
        let path = path.as_ref();
        let mut elements = Vec::new();
        let entries = std::fs::read_dir(path)
            .wrap_err_with(|| format!("failed to read element directory {}", path.display()))?;
        for entry in entries {
            let file = entry?.path();
            if file.extension().and_then(|e| e.to_str()) != Some("json") {
                continue;
            }
            let id = file
                .file_stem()
                .and_then(|s| s.to_str())
                .ok_or_else(|| eyre!("invalid descriptor file name {}", file.display()))?;
            let json = std::fs::read_to_string(&file)
                .wrap_err_with(|| format!("failed to read {}", file.display()))?;
            elements.push(ElementDescriptor::from_json(id, &json)?);
        }
        debug!("loaded {} element descriptors from {}", elements.len(), path.display());
        Ok(Self::new(elements))
    }

    pub fn get(&self, id: &str) -> Option<&Arc<ElementDescriptor>> {
        self.elements.iter().find(|e| e.id == id)
    }

    pub fn iter(&self) -> impl Iterator<Item = &Arc<ElementDescriptor>> {
        self.elements.iter()
    }

    pub fn len(&self) -> usize {
        self.elements.len()
    }

    pub fn is_empty(&self) -> bool {
        self.elements.is_empty()
    }

    /// Validates every descriptor; see [`ElementDescriptor::validate`].
    pub fn validate(&self) -> eyre::Result<()> {
        let problems: Vec<_> = self.elements.iter().flat_map(|e| e.validate()).collect();
        if problems.is_empty() {
            Ok(())
        } else {
            Err(eyre!("invalid element descriptors:\n{}", problems.join("\n")))
        }
    }
}

//! Error types shared by the adapters, the comparator and the aggregator.
use std::fmt;
use std::fmt::{Display, Formatter};
use std::time::Duration;

/// Why a library cannot provide an (element, example) pair.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum NotImplementedReason {
    /// The library has no implementation string for the element.
    Element,
    /// The requested variant is not implemented by the library.
    Variant(String),
    /// The requested degree is outside the degrees covered by the implementation string.
    Degree(usize),
    /// The cell of the example is not supported.
    Cell(String),
    /// The reference library cannot construct the example, so nothing can be compared.
    Reference(String),
    /// The library itself is not available in this environment.
    Unavailable(String),
    /// The library reported that it does not support the construction.
    Unsupported(String),
}

impl Display for NotImplementedReason {
    fn fmt(&self, f: &mut Formatter<'_>) -> fmt::Result {
        match self {
            Self::Element => write!(f, "element not implemented"),
            Self::Variant(variant) => write!(f, "variant \"{variant}\" not implemented"),
            Self::Degree(degree) => write!(f, "degree {degree} not implemented"),
            Self::Cell(cell) => write!(f, "cell \"{cell}\" not supported"),
            Self::Reference(reason) => write!(f, "not implemented on reference: {reason}"),
            Self::Unavailable(library) => write!(f, "library {library} is not available"),
            Self::Unsupported(message) => write!(f, "{message}"),
        }
    }
}

/// Errors raised while constructing, tabulating or comparing elements.
///
/// Disagreement between two elements is not an error, see
/// [`Verdict`](crate::verification::Verdict).
#[derive(Debug, Clone, PartialEq)]
pub enum VerificationError {
    /// The library cannot express the requested element.
    NotImplemented(NotImplementedReason),
    /// Construction or tabulation did not finish within the configured timeout.
    Timeout(Duration),
    /// Input violates a structural requirement, for example an entity map that does not
    /// partition the degrees of freedom.
    MalformedInput(String),
    /// The library failed while constructing or tabulating the element.
    Library(String),
}

impl VerificationError {
    pub fn not_implemented(reason: NotImplementedReason) -> Self {
        Self::NotImplemented(reason)
    }

    pub fn malformed(message: impl Into<String>) -> Self {
        Self::MalformedInput(message.into())
    }

    pub fn is_not_implemented(&self) -> bool {
        matches!(self, Self::NotImplemented(_))
    }
}

impl Display for VerificationError {
    fn fmt(&self, f: &mut Formatter<'_>) -> fmt::Result {
        match self {
            Self::NotImplemented(reason) => write!(f, "not implemented: {reason}"),
            Self::Timeout(timeout) => {
                write!(f, "construction timed out after {:.1} s", timeout.as_secs_f64())
            }
            Self::MalformedInput(message) => write!(f, "malformed input: {message}"),
            Self::Library(message) => write!(f, "library error: {message}"),
        }
    }
}

impl std::error::Error for VerificationError {}

impl From<NotImplementedReason> for VerificationError {
    fn from(reason: NotImplementedReason) -> Self {
        Self::NotImplemented(reason)
    }
}

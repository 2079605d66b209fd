use std::fmt;

/// Failures surfaced by the glitch effect.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum GlitchError {
    /// A color string was neither hex nor a well-formed `rgb()`/`rgba()`.
    UnparseableColor(String),
    /// The host tree rejected a mutation, usually because the node was
    /// removed from the page after the scan.
    InvalidTreeOperation(String),
    /// An options value could not be used.
    InvalidOption(String),
}

impl fmt::Display for GlitchError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::UnparseableColor(value) => write!(f, "unparseable color: {value:?}"),
            Self::InvalidTreeOperation(msg) => write!(f, "invalid tree operation: {msg}"),
            Self::InvalidOption(msg) => write!(f, "invalid option: {msg}"),
        }
    }
}

impl std::error::Error for GlitchError {}

use std::fmt;

#[derive(Debug)]
pub enum Error {
    /// An index or domain lookup matched no current frame.
    NotFound(String),
    /// The operation would violate a structural invariant; nothing was mutated.
    Structural(String),
    /// Dimensionality disagreement, caught at construction time.
    ShapeMismatch { expected: usize, actual: usize },
    /// The mapping does not define the requested transform direction.
    NotInvertible(String),
    InvalidArgument(String),
}

impl fmt::Display for Error {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Error::NotFound(msg) => write!(f, "not found: {msg}"),
            Error::Structural(msg) => write!(f, "structural invariant: {msg}"),
            Error::ShapeMismatch { expected, actual } => {
                write!(f, "shape mismatch: expected {expected} axes, got {actual}")
            }
            Error::NotInvertible(msg) => write!(f, "not invertible: {msg}"),
            Error::InvalidArgument(msg) => write!(f, "invalid argument: {msg}"),
        }
    }
}

impl std::error::Error for Error {}

pub type Result<T> = std::result::Result<T, Error>;

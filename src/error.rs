//! Error types for reslicing.

use thiserror::Error;

/// Errors that end a reslice invocation.
///
/// None of these are retried by the engine; changing the parameters (for
/// example a smaller output spacing) is up to the caller.
#[derive(Debug, Error, Clone, PartialEq)]
pub enum ResliceError {
    /// The cut cannot be resliced with the given parameters.
    #[error("Invalid geometry: {0}")]
    InvalidGeometry(String),

    /// The output volume could not be allocated.
    #[error("Out of memory: output volume needs {requested_bytes} bytes")]
    OutOfMemory {
        /// Size of the output volume that was refused.
        requested_bytes: u64,
    },

    /// The monitor asked for the run to stop.
    #[error("Reslice cancelled")]
    Cancelled,
}

impl ResliceError {
    pub(crate) fn geometry(msg: impl Into<String>) -> Self {
        ResliceError::InvalidGeometry(msg.into())
    }
}

/// Result type for reslicing.
pub type ResliceResult<T> = std::result::Result<T, ResliceError>;

/// Errors raised while parsing a start edge or a cut description.
#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum ParseError {
    /// Unknown start edge name.
    #[error("unknown start edge '{0}' (expected top, left, bottom or right)")]
    StartEdge(String),

    /// Unknown cut kind before the colon.
    #[error("unknown cut kind '{0}' (expected none, rect, line, polyline or freehand)")]
    CutKind(String),

    /// A coordinate list was malformed.
    #[error("malformed coordinates '{0}'")]
    Coordinates(String),
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_error_display() {
        let err = ResliceError::Cancelled;
        assert_eq!(format!("{err}"), "Reslice cancelled");

        let err = ResliceError::OutOfMemory {
            requested_bytes: 4096,
        };
        assert!(format!("{err}").contains("4096"));

        let err = ResliceError::geometry("output Z spacing is too large");
        assert!(format!("{err}").contains("too large"));
    }
}

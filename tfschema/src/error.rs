//! Error types for tfschema

use crate::path::StepKind;

/// Error returned when a path step cannot be applied to a schema node or type.
///
/// The rendered messages are part of the public contract: providers surface
/// them verbatim inside "Invalid Schema Path" diagnostics.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum PathStepError {
    #[error("cannot apply step {step} to {target}")]
    CannotApply { step: StepKind, target: String },

    #[error("no attribute or block \"{name}\" on {target}")]
    NoSuchAttribute { name: String, target: String },

    #[error("no attribute \"{name}\" on {target}")]
    NoSuchObjectAttribute { name: String, target: String },

    #[error("element index {index} is out of range for {target}")]
    IndexOutOfRange { index: i64, target: String },

    #[error("path leads to block, not an attribute")]
    PathIsBlock,

    #[error("got unexpected type {kind}")]
    UnexpectedNode { kind: String },

    #[error("{remaining} still remains in the path: {source}")]
    Remaining {
        remaining: String,
        #[source]
        source: Box<PathStepError>,
    },
}

/// Error type for tfschema operations
#[derive(Debug, thiserror::Error)]
pub enum Error {
    #[error(transparent)]
    PathStep(#[from] PathStepError),

    #[error("Type mismatch: expected {expected}, got {actual}")]
    TypeMismatch { expected: String, actual: String },

    #[error("Value conversion error: unknown value at {0} cannot be encoded")]
    UnknownValue(String),

    #[error("Value conversion error: {0}")]
    Conversion(String),

    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    #[error("Private state error: {0}")]
    PrivateState(String),

    #[error("{0}")]
    Custom(String),
}

/// Result type alias for tfschema operations
pub type Result<T> = std::result::Result<T, Error>;

impl From<String> for Error {
    fn from(s: String) -> Self {
        Error::Custom(s)
    }
}

impl From<&str> for Error {
    fn from(s: &str) -> Self {
        Error::Custom(s.to_string())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn path_step_error_messages() {
        let err = PathStepError::CannotApply {
            step: StepKind::ElementKeyString,
            target: "ListNestedAttribute".to_string(),
        };
        assert_eq!(
            err.to_string(),
            "cannot apply step ElementKeyString to ListNestedAttribute"
        );

        let err = PathStepError::NoSuchAttribute {
            name: "other".to_string(),
            target: "SingleNestedBlock".to_string(),
        };
        assert_eq!(
            err.to_string(),
            "no attribute or block \"other\" on SingleNestedBlock"
        );
    }

    #[test]
    fn remaining_error_wraps_source() {
        let err = PathStepError::Remaining {
            remaining: "ElementKeyInt(0)".to_string(),
            source: Box::new(PathStepError::CannotApply {
                step: StepKind::ElementKeyInt,
                target: "schema".to_string(),
            }),
        };
        assert_eq!(
            err.to_string(),
            "ElementKeyInt(0) still remains in the path: cannot apply step ElementKeyInt to schema"
        );
    }

    #[test]
    fn custom_errors_from_strings() {
        let err: Error = "boom".into();
        assert_eq!(err.to_string(), "boom");

        let err: Error = String::from("bang").into();
        assert!(matches!(err, Error::Custom(ref s) if s == "bang"));
    }
}

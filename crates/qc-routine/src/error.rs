use qc_model::QcError;
use thiserror::Error;

/// Any failure while initialising or running a routine.
#[derive(Debug, Error)]
pub enum RoutineError {
    /// Wrong number of parameters.
    #[error("expected {expected} parameters, got {actual}")]
    ParameterCount { expected: usize, actual: usize },

    /// A parameter could not be parsed or is out of range.
    #[error("parameter {index} ('{value}'): {reason}")]
    InvalidParameter {
        index: usize,
        value: String,
        reason: String,
    },

    /// Parameters are individually valid but inconsistent.
    #[error("invalid configuration: {reason}")]
    InvalidConfiguration { reason: String },

    #[error("routine is already initialised")]
    AlreadyInitialised,

    #[error("routine has not been initialised")]
    NotInitialised,

    /// A record could not be evaluated.
    #[error("line {line}: {reason}")]
    Record { line: usize, reason: String },

    /// Data model failure, such as an unknown column.
    #[error(transparent)]
    Model(#[from] QcError),

    /// Failure from a routine's own logic, with the original cause.
    #[error("{message}")]
    Processing {
        message: String,
        #[source]
        source: Option<Box<dyn std::error::Error + Send + Sync>>,
    },
}

impl RoutineError {
    pub fn processing(message: impl Into<String>) -> Self {
        RoutineError::Processing {
            message: message.into(),
            source: None,
        }
    }

    pub fn processing_with<E>(message: impl Into<String>, source: E) -> Self
    where
        E: std::error::Error + Send + Sync + 'static,
    {
        RoutineError::Processing {
            message: message.into(),
            source: Some(Box::new(source)),
        }
    }

    /// True for errors raised by `initialise`.
    pub fn is_configuration(&self) -> bool {
        matches!(
            self,
            RoutineError::ParameterCount { .. }
                | RoutineError::InvalidParameter { .. }
                | RoutineError::InvalidConfiguration { .. }
                | RoutineError::AlreadyInitialised
        )
    }
}

pub type Result<T> = std::result::Result<T, RoutineError>;

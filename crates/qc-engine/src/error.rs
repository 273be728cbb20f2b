use qc_routine::RoutineError;
use thiserror::Error;

/// Errors that stop a run before any record is touched.
#[derive(Debug, Error)]
pub enum EngineError {
    /// One or more routines were never successfully initialised.
    #[error("routines not initialised: {}", routines.join(", "))]
    Configuration { routines: Vec<String> },

    /// A routine configuration names a routine the registry does not know.
    #[error("routine {position} ('{name}') is not registered")]
    UnknownRoutine { position: usize, name: String },

    /// A routine rejected its parameters.
    #[error("routine {position} ('{name}') rejected its parameters: {source}")]
    Initialise {
        position: usize,
        name: String,
        #[source]
        source: RoutineError,
    },
}

pub type Result<T> = std::result::Result<T, EngineError>;

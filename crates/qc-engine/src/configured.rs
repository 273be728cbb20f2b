//! Routines bound to their names and parameters.

use qc_routine::{Routine, RoutineError, RoutineRegistry};
use serde::{Deserialize, Serialize};

use crate::error::{EngineError, Result};

/// One entry of a routine configuration file.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RoutineSpec {
    /// Registered routine name.
    pub routine: String,
    #[serde(default)]
    pub parameters: Vec<String>,
}

impl RoutineSpec {
    pub fn new(routine: impl Into<String>, parameters: &[&str]) -> Self {
        Self {
            routine: routine.into(),
            parameters: parameters.iter().map(|p| p.to_string()).collect(),
        }
    }
}

/// A routine instance with the name and parameters it runs under.
pub struct ConfiguredRoutine {
    name: String,
    parameters: Vec<String>,
    routine: Box<dyn Routine>,
    initialised: bool,
}

impl ConfiguredRoutine {
    /// Wrap an uninitialised routine.
    pub fn new(name: impl Into<String>, routine: Box<dyn Routine>, parameters: Vec<String>) -> Self {
        Self {
            name: name.into(),
            parameters,
            routine,
            initialised: false,
        }
    }

    /// Pass the stored parameters to the routine. Allowed once.
    pub fn initialise(&mut self) -> std::result::Result<(), RoutineError> {
        if self.initialised {
            return Err(RoutineError::AlreadyInitialised);
        }
        self.routine.initialise(&self.parameters)?;
        self.initialised = true;
        Ok(())
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn parameters(&self) -> &[String] {
        &self.parameters
    }

    pub fn is_initialised(&self) -> bool {
        self.initialised
    }

    pub(crate) fn routine_mut(&mut self) -> &mut dyn Routine {
        self.routine.as_mut()
    }
}

impl std::fmt::Debug for ConfiguredRoutine {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ConfiguredRoutine")
            .field("name", &self.name)
            .field("parameters", &self.parameters)
            .field("initialised", &self.initialised)
            .finish_non_exhaustive()
    }
}

/// Create and initialise routines from their specs, in order.
///
/// The first unknown name or rejected parameter list aborts the build.
pub fn build_routines(
    registry: &RoutineRegistry,
    specs: &[RoutineSpec],
) -> Result<Vec<ConfiguredRoutine>> {
    specs
        .iter()
        .enumerate()
        .map(|(position, spec)| {
            let routine =
                registry
                    .create(&spec.routine)
                    .ok_or_else(|| EngineError::UnknownRoutine {
                        position,
                        name: spec.routine.clone(),
                    })?;
            let mut configured =
                ConfiguredRoutine::new(spec.routine.clone(), routine, spec.parameters.clone());
            configured
                .initialise()
                .map_err(|source| EngineError::Initialise {
                    position,
                    name: spec.routine.clone(),
                    source,
                })?;
            tracing::debug!(position, routine = %spec.routine, "routine initialised");
            Ok(configured)
        })
        .collect()
}

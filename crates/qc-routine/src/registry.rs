//! Registry of routine implementations keyed by name.
//!
//! Routine configurations refer to routines by name; the registry turns a
//! name into a fresh, uninitialised instance. Additional routines can be
//! registered at runtime without touching the engine.

use std::collections::BTreeMap;
use std::fmt;
use std::sync::Arc;

use crate::routine::Routine;
use crate::routines::{
    ConstantValueRoutine, FlagPropagationRoutine, GradientRoutine, MissingValueRoutine,
    RangeCheckRoutine,
};

/// Creates a new, uninitialised routine instance.
pub type RoutineFactory = Arc<dyn Fn() -> Box<dyn Routine> + Send + Sync>;

/// A registered routine.
#[derive(Clone)]
pub struct RoutineDescriptor {
    pub name: String,
    pub description: String,
    /// Human-readable parameter names, in order.
    pub parameters: Vec<String>,
    factory: RoutineFactory,
}

impl RoutineDescriptor {
    pub fn new<F>(name: &str, description: &str, parameters: &[&str], factory: F) -> Self
    where
        F: Fn() -> Box<dyn Routine> + Send + Sync + 'static,
    {
        Self {
            name: name.to_string(),
            description: description.to_string(),
            parameters: parameters.iter().map(|p| p.to_string()).collect(),
            factory: Arc::new(factory),
        }
    }

    pub fn create(&self) -> Box<dyn Routine> {
        (self.factory)()
    }
}

impl fmt::Debug for RoutineDescriptor {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("RoutineDescriptor")
            .field("name", &self.name)
            .field("parameters", &self.parameters)
            .finish_non_exhaustive()
    }
}

/// Routines indexed by lowercase name.
#[derive(Debug, Clone, Default)]
pub struct RoutineRegistry {
    routines: BTreeMap<String, RoutineDescriptor>,
}

impl RoutineRegistry {
    /// Create an empty registry.
    pub fn new() -> Self {
        Self::default()
    }

    /// Registry holding the built-in routines.
    pub fn with_builtins() -> Self {
        let mut registry = Self::new();
        registry.register(RoutineDescriptor::new(
            "missing_value",
            "Flag records with no value in a column",
            &["column", "flag"],
            || Box::new(MissingValueRoutine::new()),
        ));
        registry.register(RoutineDescriptor::new(
            "range_check",
            "Flag values outside questionable and bad ranges",
            &[
                "column",
                "questionable min",
                "questionable max",
                "bad min",
                "bad max",
            ],
            || Box::new(RangeCheckRoutine::new()),
        ));
        registry.register(RoutineDescriptor::new(
            "gradient",
            "Flag jumps between consecutive values",
            &["column", "max delta"],
            || Box::new(GradientRoutine::new()),
        ));
        registry.register(RoutineDescriptor::new(
            "constant_value",
            "Flag values that stay constant for too long",
            &["column", "time column", "max minutes"],
            || Box::new(ConstantValueRoutine::new()),
        ));
        registry.register(RoutineDescriptor::new(
            "flag_propagation",
            "Copy a column's flag to a dependent column",
            &["source column", "target column"],
            || Box::new(FlagPropagationRoutine::new()),
        ));
        registry
    }

    /// Register a routine, replacing any previous one with the same name.
    pub fn register(&mut self, descriptor: RoutineDescriptor) {
        let key = descriptor.name.to_ascii_lowercase();
        if self.routines.contains_key(&key) {
            tracing::warn!(routine = %descriptor.name, "replacing registered routine");
        } else {
            tracing::debug!(routine = %descriptor.name, "registered routine");
        }
        self.routines.insert(key, descriptor);
    }

    /// Look up a routine by name, ignoring case.
    pub fn get(&self, name: &str) -> Option<&RoutineDescriptor> {
        self.routines.get(&name.trim().to_ascii_lowercase())
    }

    /// Create an uninitialised instance of the named routine.
    pub fn create(&self, name: &str) -> Option<Box<dyn Routine>> {
        self.get(name).map(RoutineDescriptor::create)
    }

    pub fn len(&self) -> usize {
        self.routines.len()
    }

    pub fn is_empty(&self) -> bool {
        self.routines.is_empty()
    }

    /// Iterate over routines in name order.
    pub fn iter(&self) -> impl Iterator<Item = &RoutineDescriptor> {
        self.routines.values()
    }
}

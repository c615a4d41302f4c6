//! Named fit parameters and the mutable registry read by graph leaves.

use indexmap::IndexMap;
use serde::{Deserialize, Serialize};

use crate::errors::{ErrorInfo, PwaError};

/// A single named fit parameter.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct FitParameter {
    /// Unique parameter name.
    pub name: String,
    /// Current value.
    pub value: f64,
    /// Optional lower/upper bounds handed to the optimizer.
    #[serde(default)]
    pub bounds: Option<(f64, f64)>,
    /// Whether the optimizer may vary this parameter.
    #[serde(default)]
    pub fixed: bool,
}

impl FitParameter {
    /// Creates a free parameter with the given starting value.
    pub fn free(name: impl Into<String>, value: f64) -> Self {
        Self {
            name: name.into(),
            value,
            bounds: None,
            fixed: false,
        }
    }

    /// Creates a fixed parameter.
    pub fn fixed(name: impl Into<String>, value: f64) -> Self {
        Self {
            name: name.into(),
            value,
            bounds: None,
            fixed: true,
        }
    }

    /// Sets the bounds, returning the parameter for chaining.
    pub fn with_bounds(mut self, low: f64, high: f64) -> Self {
        self.bounds = Some((low, high));
        self
    }
}

#[derive(Debug, Clone)]
struct Slot {
    parameter: FitParameter,
    revision: u64,
}

/// Registry of fit parameters, keyed by name.
///
/// Iteration order is declaration order. Every successful value change bumps
/// the parameter's revision; graph leaves compare revisions to decide
/// staleness, so an update to the same value is deliberately not a change.
#[derive(Debug, Clone, Default)]
pub struct ParameterSet {
    slots: IndexMap<String, Slot>,
}

impl ParameterSet {
    /// Creates an empty registry.
    pub fn new() -> Self {
        Self::default()
    }

    /// Registers a parameter. Re-declaring an existing name keeps the first
    /// declaration (the original registry deduplicated shared parameters the
    /// same way).
    pub fn declare(&mut self, parameter: FitParameter) {
        self.slots
            .entry(parameter.name.clone())
            .or_insert(Slot {
                parameter,
                revision: 1,
            });
    }

    fn unknown(name: &str) -> PwaError {
        PwaError::Params(
            ErrorInfo::new("unknown-parameter", "parameter is not registered")
                .with_context("name", name),
        )
    }

    /// Returns the current value of a parameter.
    pub fn value(&self, name: &str) -> Result<f64, PwaError> {
        self.slots
            .get(name)
            .map(|slot| slot.parameter.value)
            .ok_or_else(|| Self::unknown(name))
    }

    /// Returns the revision counter of a parameter.
    pub fn revision(&self, name: &str) -> Result<u64, PwaError> {
        self.slots
            .get(name)
            .map(|slot| slot.revision)
            .ok_or_else(|| Self::unknown(name))
    }

    /// Sets a parameter value unconditionally, bumping the revision if the
    /// value actually changed. Ignores the fixed flag; used by construction
    /// code and tests.
    pub fn set_value(&mut self, name: &str, value: f64) -> Result<(), PwaError> {
        let slot = self.slots.get_mut(name).ok_or_else(|| Self::unknown(name))?;
        if slot.parameter.value != value {
            slot.parameter.value = value;
            slot.revision += 1;
        }
        Ok(())
    }

    /// Updates parameters from a named value list. Unknown names are ignored
    /// and fixed parameters are left untouched, matching the optimizer-facing
    /// contract.
    pub fn update_from_named(&mut self, values: &[(String, f64)]) {
        for (name, value) in values {
            if let Some(slot) = self.slots.get_mut(name.as_str()) {
                if !slot.parameter.fixed && slot.parameter.value != *value {
                    slot.parameter.value = *value;
                    slot.revision += 1;
                }
            }
        }
    }

    /// Strict variant of [`ParameterSet::update_from_named`]: the first
    /// unknown name aborts with `unknown-parameter` before any update is
    /// applied.
    pub fn update_from_named_strict(&mut self, values: &[(String, f64)]) -> Result<(), PwaError> {
        for (name, _) in values {
            if !self.slots.contains_key(name.as_str()) {
                return Err(Self::unknown(name));
            }
        }
        self.update_from_named(values);
        Ok(())
    }

    /// Returns whether a parameter is registered.
    pub fn contains(&self, name: &str) -> bool {
        self.slots.contains_key(name)
    }

    /// Number of registered parameters.
    pub fn len(&self) -> usize {
        self.slots.len()
    }

    /// Returns whether the registry is empty.
    pub fn is_empty(&self) -> bool {
        self.slots.is_empty()
    }

    /// Iterates over the registered parameters in declaration order.
    pub fn iter(&self) -> impl Iterator<Item = &FitParameter> {
        self.slots.values().map(|slot| &slot.parameter)
    }

    /// Returns the free parameters as a named value list, the shape handed to
    /// the optimizer as the starting point.
    pub fn free_values(&self) -> Vec<(String, f64)> {
        self.slots
            .values()
            .filter(|slot| !slot.parameter.fixed)
            .map(|slot| (slot.parameter.name.clone(), slot.parameter.value))
            .collect()
    }
}

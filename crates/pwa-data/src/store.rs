//! Columnar cache of derived kinematic quantities.

use std::collections::{BTreeMap, BTreeSet};

use pwa_core::errors::{ErrorInfo, PwaError};
use pwa_core::Event;

use crate::kinematics;
use crate::variables::{KinVariable, Partition};

#[derive(Debug, Clone, Default)]
struct PartitionState {
    event_count: usize,
    variables: BTreeSet<KinVariable>,
    columns: BTreeMap<KinVariable, Vec<f64>>,
    revision: u64,
}

/// Per-partition columnar store of derived kinematic variables.
///
/// The store amortizes kinematic recomputation: many amplitude-graph leaves
/// read the same invariant mass or decay angle, which is derived exactly once
/// per batch. Partitions hold a single active batch each; `set_batch`
/// replaces the previous one and bumps the partition revision that column
/// leaves use for staleness.
#[derive(Debug, Clone, Default)]
pub struct EventStore {
    partitions: BTreeMap<Partition, PartitionState>,
}

impl EventStore {
    /// Creates an empty store.
    pub fn new() -> Self {
        Self::default()
    }

    /// Declares the layout of a partition: its event count and the variables
    /// derivable for it. Re-declaring with the same count merges variable
    /// sets; a different count is a `layout-conflict`. Derivability of every
    /// variable is checked against the sample event up front.
    pub fn layout(
        &mut self,
        partition: Partition,
        event_count: usize,
        sample: &Event,
        variables: &[KinVariable],
    ) -> Result<(), PwaError> {
        if event_count == 0 {
            return Err(PwaError::Storage(
                ErrorInfo::new("layout-conflict", "partition layout needs at least one event")
                    .with_context("partition", partition.as_raw().to_string()),
            ));
        }
        for variable in variables {
            kinematics::check_derivable(variable, sample)?;
        }
        let state = self.partitions.entry(partition).or_default();
        if state.event_count != 0 && state.event_count != event_count {
            return Err(PwaError::Storage(
                ErrorInfo::new(
                    "layout-conflict",
                    "partition is already laid out with a different event count",
                )
                .with_context("partition", partition.as_raw().to_string())
                .with_context("declared", state.event_count.to_string())
                .with_context("requested", event_count.to_string()),
            ));
        }
        state.event_count = event_count;
        state.variables.extend(variables.iter().cloned());
        Ok(())
    }

    /// Computes and caches all declared columns for the batch, replacing any
    /// prior batch of this partition.
    pub fn set_batch(&mut self, partition: Partition, events: &[Event]) -> Result<(), PwaError> {
        let state = self.partitions.get_mut(&partition).ok_or_else(|| {
            PwaError::Storage(
                ErrorInfo::new("layout-conflict", "partition has no declared layout")
                    .with_context("partition", partition.as_raw().to_string())
                    .with_hint("call layout() before set_batch()"),
            )
        })?;
        if events.len() != state.event_count {
            return Err(PwaError::Storage(
                ErrorInfo::new("layout-conflict", "batch size disagrees with the layout")
                    .with_context("partition", partition.as_raw().to_string())
                    .with_context("declared", state.event_count.to_string())
                    .with_context("batch", events.len().to_string()),
            ));
        }
        let mut columns = BTreeMap::new();
        for variable in &state.variables {
            let column: Vec<f64> = events
                .iter()
                .map(|event| kinematics::derive(variable, event))
                .collect();
            columns.insert(variable.clone(), column);
        }
        state.columns = columns;
        state.revision += 1;
        Ok(())
    }

    /// Returns the cached column for a declared variable.
    pub fn column(&self, partition: Partition, variable: &KinVariable) -> Result<&[f64], PwaError> {
        let state = self.partitions.get(&partition).ok_or_else(|| {
            PwaError::Storage(
                ErrorInfo::new("unknown-variable", "partition has no declared layout")
                    .with_context("partition", partition.as_raw().to_string()),
            )
        })?;
        if !state.variables.contains(variable) {
            return Err(PwaError::Storage(
                ErrorInfo::new("unknown-variable", "variable is not declared for the partition")
                    .with_context("partition", partition.as_raw().to_string())
                    .with_context("variable", variable.label()),
            ));
        }
        state.columns.get(variable).map(Vec::as_slice).ok_or_else(|| {
            PwaError::Storage(
                ErrorInfo::new("no-active-batch", "no batch has been set for the partition")
                    .with_context("partition", partition.as_raw().to_string())
                    .with_hint("call set_batch() before evaluating"),
            )
        })
    }

    /// Revision counter of the partition's active batch (0 before the first
    /// batch).
    pub fn revision(&self, partition: Partition) -> u64 {
        self.partitions
            .get(&partition)
            .map(|state| state.revision)
            .unwrap_or(0)
    }

    /// Declared event count of a partition, if laid out.
    pub fn event_count(&self, partition: Partition) -> Option<usize> {
        self.partitions
            .get(&partition)
            .map(|state| state.event_count)
            .filter(|&count| count != 0)
    }

    /// Declared variables of a partition, in canonical order.
    pub fn declared_variables(&self, partition: Partition) -> Vec<KinVariable> {
        self.partitions
            .get(&partition)
            .map(|state| state.variables.iter().cloned().collect())
            .unwrap_or_default()
    }
}

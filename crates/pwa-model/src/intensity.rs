//! The intensity evaluation interface consumed by the estimator and the
//! event generator.

use std::collections::BTreeMap;

use pwa_core::errors::{ErrorInfo, PwaError};
use pwa_core::{Event, ParameterSet};
use pwa_data::{EventStore, Partition};
use pwa_graph::{structure_dump, Graph, Value};

use crate::builder::AmplitudeBuilder;
use crate::topology::ModelDescription;

/// Coherent intensity model over the data, phase-space and single-point
/// partitions.
///
/// Owns one amplitude graph per partition, the fit parameters and the event
/// store. One instance serves one evaluation stream; independent instances
/// (for example one per parallel fit) never share state.
#[derive(Debug)]
pub struct CoherentIntensity {
    graphs: BTreeMap<Partition, Graph>,
    variables: Vec<pwa_data::KinVariable>,
    parameters: ParameterSet,
    store: EventStore,
    invalid_events: u64,
    invalid_reported: bool,
}

impl CoherentIntensity {
    /// Builds the per-partition graphs from a model description.
    pub fn new(description: &ModelDescription) -> Result<Self, PwaError> {
        let builder = AmplitudeBuilder::new(description);
        let mut parameters = ParameterSet::new();
        builder.declare_parameters(&mut parameters);

        let mut graphs = BTreeMap::new();
        let mut variables = Vec::new();
        for partition in [Partition::DATA, Partition::PHASE_SPACE, Partition::SINGLE] {
            let built = builder.build(partition)?;
            variables = built.variables;
            graphs.insert(partition, built.graph);
        }
        Ok(Self {
            graphs,
            variables,
            parameters,
            store: EventStore::new(),
            invalid_events: 0,
            invalid_reported: false,
        })
    }

    /// Read access to the fit parameters (start values for the optimizer).
    pub fn parameters(&self) -> &ParameterSet {
        &self.parameters
    }

    /// Updates parameters from a named value list; unknown names are ignored.
    pub fn update_parameters(&mut self, values: &[(String, f64)]) {
        self.parameters.update_from_named(values);
    }

    /// Strict parameter update: unknown names abort before any change.
    pub fn update_parameters_strict(&mut self, values: &[(String, f64)]) -> Result<(), PwaError> {
        self.parameters.update_from_named_strict(values)
    }

    fn attach(&mut self, partition: Partition, events: &[Event]) -> Result<(), PwaError> {
        let sample = events.first().ok_or_else(|| {
            PwaError::Storage(
                ErrorInfo::new("layout-conflict", "cannot attach an empty batch")
                    .with_context("partition", partition.as_raw().to_string()),
            )
        })?;
        self.store
            .layout(partition, events.len(), sample, &self.variables)?;
        self.store.set_batch(partition, events)
    }

    /// Attaches the data batch. The first call fixes the partition's event
    /// count; later batches must keep it.
    pub fn set_data(&mut self, events: &[Event]) -> Result<(), PwaError> {
        self.attach(Partition::DATA, events)
    }

    /// Attaches the phase-space (normalization) batch.
    pub fn set_phase_space(&mut self, events: &[Event]) -> Result<(), PwaError> {
        self.attach(Partition::PHASE_SPACE, events)
    }

    fn clamp(&mut self, raw: f64) -> f64 {
        if raw.is_finite() {
            return raw;
        }
        self.invalid_events += 1;
        if !self.invalid_reported {
            self.invalid_reported = true;
            tracing::warn!(
                "intensity evaluated to a non-finite value; clamping to zero \
                 (reported once, see invalid_event_count())"
            );
        }
        0.0
    }

    /// Evaluates the per-event intensity of the active batch of `partition`.
    ///
    /// Non-finite per-event values are clamped to zero so a single malformed
    /// kinematic point cannot abort a batch; the clamp count is kept on the
    /// instance.
    pub fn evaluate_batch(&mut self, partition: Partition) -> Result<Vec<f64>, PwaError> {
        let graph = self.graphs.get_mut(&partition).ok_or_else(|| {
            PwaError::Model(
                ErrorInfo::new("unknown-partition", "no graph was built for the partition")
                    .with_context("partition", partition.as_raw().to_string()),
            )
        })?;
        graph.evaluate(&self.parameters, &self.store)?;
        let head = match graph.head_value()? {
            Value::Vector(values) => values.clone(),
            other => {
                return Err(PwaError::Model(
                    ErrorInfo::new("type-mismatch", "intensity head is not a real vector")
                        .with_context("found", format!("{:?}", other.kind())),
                ))
            }
        };
        let count = self
            .store
            .event_count(partition)
            .unwrap_or(head.len().max(1));
        // A term-free model yields a width-1 head; broadcast it over the batch.
        let values = if head.len() == count {
            head
        } else if head.len() == 1 {
            vec![head[0]; count]
        } else {
            return Err(PwaError::Graph(
                ErrorInfo::new("width-mismatch", "head width disagrees with the batch")
                    .with_context("expected", count.to_string())
                    .with_context("found", head.len().to_string()),
            ));
        };
        Ok(values.into_iter().map(|value| self.clamp(value)).collect())
    }

    /// Evaluates the intensity of a single kinematic point through the
    /// dedicated one-event partition.
    pub fn evaluate_point(&mut self, event: &Event) -> Result<f64, PwaError> {
        self.store
            .layout(Partition::SINGLE, 1, event, &self.variables)?;
        self.store
            .set_batch(Partition::SINGLE, std::slice::from_ref(event))?;
        let values = self.evaluate_batch(Partition::SINGLE)?;
        Ok(values[0])
    }

    /// Number of events whose intensity was clamped to zero so far.
    pub fn invalid_event_count(&self) -> u64 {
        self.invalid_events
    }

    /// Structural dump of one partition's graph, for debugging.
    pub fn dump_structure(&self, partition: Partition) -> Option<String> {
        self.graphs.get(&partition).map(structure_dump)
    }

    /// Per-node evaluation counters of one partition's graph.
    pub fn evaluation_counts(&self, partition: Partition) -> Option<BTreeMap<String, u64>> {
        self.graphs.get(&partition).map(Graph::evaluation_counts)
    }
}

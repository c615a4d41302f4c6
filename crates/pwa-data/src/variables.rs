//! Identifiers for event partitions and derived kinematic variables.

use serde::{Deserialize, Serialize};

/// Identifier for an event-store partition.
///
/// The well-known partitions are the data sample, the phase-space sample and
/// a one-event scratch partition used for single-point intensity evaluation.
/// Additional partitions may be allocated by callers that keep several
/// samples alive at once.
#[derive(
    Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize,
)]
pub struct Partition(u32);

impl Partition {
    /// The measured data sample.
    pub const DATA: Partition = Partition(0);
    /// The phase-space (normalization) sample.
    pub const PHASE_SPACE: Partition = Partition(1);
    /// One-event partition backing scalar point evaluation.
    pub const SINGLE: Partition = Partition(2);

    /// Creates a partition identifier from its raw integer representation.
    pub const fn from_raw(raw: u32) -> Self {
        Self(raw)
    }

    /// Returns the raw integer representation of the identifier.
    pub const fn as_raw(&self) -> u32 {
        self.0
    }
}

/// A set of final-state particle slots, stored sorted and deduplicated.
#[derive(
    Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize,
)]
pub struct Subsystem(Vec<u16>);

impl Subsystem {
    /// Creates a subsystem from arbitrary (possibly unsorted) slot indices.
    pub fn new(mut indices: Vec<u16>) -> Self {
        indices.sort_unstable();
        indices.dedup();
        Self(indices)
    }

    /// The sorted slot indices.
    pub fn indices(&self) -> &[u16] {
        &self.0
    }

    /// Largest referenced slot index, if any.
    pub fn max_index(&self) -> Option<u16> {
        self.0.last().copied()
    }

    /// Compact label used in node and variable names, e.g. `0+2`.
    pub fn label(&self) -> String {
        let parts: Vec<String> = self.0.iter().map(|idx| idx.to_string()).collect();
        parts.join("+")
    }
}

/// Kind of derived per-event scalar.
#[derive(
    Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize,
)]
pub enum VariableKind {
    /// Invariant mass squared of the subsystem.
    InvariantMassSq,
    /// Cosine of the helicity polar angle of `child` in the subsystem rest
    /// frame.
    CosHelicityTheta,
    /// Helicity azimuthal angle of `child` in the subsystem rest frame.
    HelicityPhi,
}

impl VariableKind {
    pub(crate) fn label(&self) -> &'static str {
        match self {
            VariableKind::InvariantMassSq => "msq",
            VariableKind::CosHelicityTheta => "costheta",
            VariableKind::HelicityPhi => "phi",
        }
    }
}

/// Identifier for one derived kinematic column.
#[derive(
    Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize,
)]
pub struct KinVariable {
    /// Which scalar is derived.
    pub kind: VariableKind,
    /// The subsystem the scalar refers to.
    pub subsystem: Subsystem,
    /// Child subset whose direction defines the decay angles. Empty for
    /// invariant masses.
    pub child: Subsystem,
}

impl KinVariable {
    /// Invariant mass squared of a subsystem.
    pub fn mass_sq(subsystem: Subsystem) -> Self {
        Self {
            kind: VariableKind::InvariantMassSq,
            subsystem,
            child: Subsystem::new(Vec::new()),
        }
    }

    /// Helicity cos theta of `child` inside `subsystem`.
    pub fn cos_theta(subsystem: Subsystem, child: Subsystem) -> Self {
        Self {
            kind: VariableKind::CosHelicityTheta,
            subsystem,
            child,
        }
    }

    /// Helicity phi of `child` inside `subsystem`.
    pub fn phi(subsystem: Subsystem, child: Subsystem) -> Self {
        Self {
            kind: VariableKind::HelicityPhi,
            subsystem,
            child,
        }
    }

    /// Stable human-readable label, also used for graph leaf names.
    pub fn label(&self) -> String {
        if self.child.indices().is_empty() {
            format!("{}_{}", self.kind.label(), self.subsystem.label())
        } else {
            format!(
                "{}_{}_of_{}",
                self.kind.label(),
                self.child.label(),
                self.subsystem.label()
            )
        }
    }
}

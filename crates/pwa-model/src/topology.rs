//! Decay-topology description consumed by the amplitude builder.
//!
//! These types are the externally-parsed model input: particle states with
//! their quantum numbers, sequential two-body decay chains with named fit
//! parameters, and an optional coherent flat background. File parsing lives
//! outside this crate.

use pwa_core::FitParameter;
use serde::{Deserialize, Serialize};

/// One particle appearing in a decay chain.
///
/// Spins and helicities are stored as twice their value so half-integer spins
/// stay exact integers.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ParticleState {
    /// Particle name, used in node labels.
    pub name: String,
    /// Twice the spin J.
    pub spin2: i32,
    /// Twice the helicity.
    pub helicity2: i32,
    /// Whether the particle is intrinsically coherent: its index is removed
    /// before coherency grouping, so amplitudes differing only in such
    /// particles interfere.
    #[serde(default)]
    pub coherent: bool,
}

/// Complex coefficient of an amplitude term, split into magnitude and phase
/// fit parameters.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Coefficient {
    /// Magnitude parameter.
    pub magnitude: FitParameter,
    /// Phase parameter (radians).
    pub phase: FitParameter,
}

/// Dynamical function attached to one two-body decay.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "kebab-case")]
pub enum LineshapeSpec {
    /// Unit amplitude; used for non-resonant contributions and top nodes
    /// whose dynamics is absorbed elsewhere.
    NonResonant,
    /// Relativistic Breit-Wigner with constant width.
    RelativisticBreitWigner {
        /// Resonance mass parameter.
        mass: FitParameter,
        /// Resonance width parameter.
        width: FitParameter,
    },
    /// Two-channel Flatte shape.
    Flatte {
        /// Resonance mass parameter.
        mass: FitParameter,
        /// Coupling to the first channel.
        g1: FitParameter,
        /// Coupling to the second channel.
        g2: FitParameter,
        /// Daughter masses of the first channel.
        channel1: (f64, f64),
        /// Daughter masses of the second channel.
        channel2: (f64, f64),
    },
}

/// One two-body decay inside a sequential chain.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TwoBodyDecay {
    /// Index of the mother particle in [`ModelDescription::particles`].
    pub mother: u32,
    /// Indices of the two daughters.
    pub daughters: (u32, u32),
    /// Twice the canonical orbital angular momentum L.
    pub l2: u32,
    /// Twice the canonical total spin S.
    pub s2: u32,
    /// Final-state slots (in the reference ordering) whose summed momentum is
    /// the decaying subsystem.
    pub subsystem_slots: Vec<u16>,
    /// Final-state slots of the first daughter; defines the decay angles.
    pub child_slots: Vec<u16>,
    /// Dynamical function of the subsystem invariant mass.
    pub lineshape: LineshapeSpec,
}

/// One sequential decay chain contributing a complex amplitude.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DecayAmplitudeTerm {
    /// Unique term name, used as the node-name stem.
    pub name: String,
    /// Complex coefficient of the term.
    pub coefficient: Coefficient,
    /// Two-body decays from the top of the chain downwards.
    pub chain: Vec<TwoBodyDecay>,
    /// Final-state permutations the term is coherently summed over. Each list
    /// maps reference slot -> event slot and must be a permutation of the
    /// final-state slots. At least the identity must be present.
    pub evaluation_lists: Vec<Vec<u16>>,
    /// Parity factor multiplied onto the combinatorial sum.
    #[serde(default = "default_parity_factor")]
    pub parity_factor: f64,
}

fn default_parity_factor() -> f64 {
    1.0
}

/// Coherent flat background added to every coherency group before squaring.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct BackgroundSpec {
    /// Magnitude parameter.
    pub magnitude: FitParameter,
    /// Phase parameter (radians).
    pub phase: FitParameter,
}

/// Full model description handed to the builder.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ModelDescription {
    /// Number of final-state particles per event.
    pub final_state_size: u16,
    /// Particle registry referenced by index from the decay chains.
    pub particles: Vec<ParticleState>,
    /// Amplitude terms.
    pub terms: Vec<DecayAmplitudeTerm>,
    /// Optional coherent background.
    #[serde(default)]
    pub background: Option<BackgroundSpec>,
}

#![deny(missing_docs)]

//! Coherent/incoherent amplitude model: decay-topology description, angular
//! and dynamical strategies, the amplitude graph builder and the intensity
//! evaluation interface.

pub mod angular;
pub mod builder;
pub mod dynamics;
pub mod intensity;
pub mod topology;
pub mod wigner;

pub use angular::{angular_amplitude, HelicityAngular};
pub use builder::{AmplitudeBuilder, AmplitudeGraph};
pub use dynamics::{breit_wigner_amplitude, Flatte, NonResonant, RelativisticBreitWigner};
pub use intensity::CoherentIntensity;
pub use topology::{
    BackgroundSpec, Coefficient, DecayAmplitudeTerm, LineshapeSpec, ModelDescription,
    ParticleState, TwoBodyDecay,
};
pub use wigner::{wigner_big_d_conj, wigner_small_d};

#![deny(missing_docs)]

//! Fit-side collaborators of the intensity model: the negative
//! log-likelihood estimator and hit-and-miss event generation.

pub mod estimator;
pub mod generate;
pub mod phasespace;

pub use estimator::MinLogLike;
pub use generate::{generate, EVENT_BUNCH_SIZE, SAFETY_MARGIN};
pub use phasespace::{NBodySampler, PhaseSpaceSampler};

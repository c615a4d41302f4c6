#![deny(missing_docs)]
#![doc = include_str!("../docs/core-api.md")]

pub mod errors;
pub mod event;
pub mod parameters;
pub mod rng;

pub use errors::{ErrorInfo, PwaError};
pub use event::{Event, FourVector};
pub use parameters::{FitParameter, ParameterSet};
pub use rng::{accept_stream_seed, derive_substream_seed, RngHandle};

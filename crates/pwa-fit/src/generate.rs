//! Hit-and-miss event generation against the intensity model.

use pwa_core::errors::{ErrorInfo, PwaError};
use pwa_core::{accept_stream_seed, Event, RngHandle};
use pwa_model::CoherentIntensity;

use crate::phasespace::PhaseSpaceSampler;

/// Candidate events evaluated per bunch.
pub const EVENT_BUNCH_SIZE: usize = 5000;

/// Relative margin added above the observed intensity maximum.
pub const SAFETY_MARGIN: f64 = 0.05;

/// Generates `count` events distributed according to the intensity.
///
/// Candidates come from the sampler in bunches; each bunch is evaluated, the
/// generation bound tracks the largest observed intensity plus the safety
/// margin, and whenever a later bunch exceeds the bound all accepted events
/// are discarded, the sampler is reset to its initial seed and generation
/// restarts under the raised bound. Accept/reject uniforms are drawn from a
/// dedicated single-threaded stream so the outcome is independent of any
/// evaluation parallelism. Deterministic given a fixed seed and a fixed
/// bound-raise history.
pub fn generate(
    count: usize,
    sampler: &mut dyn PhaseSpaceSampler,
    intensity: &mut CoherentIntensity,
    seed: u64,
) -> Result<Vec<Event>, PwaError> {
    if count == 0 {
        return Ok(Vec::new());
    }
    let initial_seed = sampler.seed();
    let mut accepted: Vec<Event> = Vec::with_capacity(count);
    let mut bound = 0.0_f64;
    let mut accept_rng = RngHandle::from_seed(accept_stream_seed(seed));

    loop {
        let bunch: Vec<Event> = (0..EVENT_BUNCH_SIZE).map(|_| sampler.generate()).collect();
        let mut intensities = Vec::with_capacity(bunch.len());
        for event in &bunch {
            intensities.push(event.weight * intensity.evaluate_point(event)?);
        }
        let bunch_max = intensities.iter().copied().fold(0.0_f64, f64::max);
        if bunch_max > bound {
            bound = (1.0 + SAFETY_MARGIN) * bunch_max;
            if !accepted.is_empty() {
                tracing::info!(
                    bound,
                    discarded = accepted.len(),
                    "bunch maximum exceeded the generation bound; raising it and restarting"
                );
                accepted.clear();
                sampler.reset(initial_seed);
                accept_rng = RngHandle::from_seed(accept_stream_seed(seed));
                continue;
            }
        }
        if bound <= 0.0 {
            return Err(PwaError::Generator(
                ErrorInfo::new("zero-intensity", "intensity vanishes on the whole bunch")
                    .with_hint("check the model parameters"),
            ));
        }
        // Uniforms are drawn before the accept loop, single-threaded, so the
        // decisions do not depend on how the intensities were computed.
        let randoms: Vec<f64> = (0..bunch.len())
            .map(|_| accept_rng.uniform(0.0, bound))
            .collect();
        for (event, (&value, &random)) in bunch
            .into_iter()
            .zip(intensities.iter().zip(randoms.iter()))
        {
            if random < value {
                let mut event = event;
                event.weight = 1.0;
                accepted.push(event);
                if accepted.len() == count {
                    return Ok(accepted);
                }
            }
        }
    }
}

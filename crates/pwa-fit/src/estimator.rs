//! Negative log-likelihood estimator over the intensity model.

use pwa_core::errors::{ErrorInfo, PwaError};
use pwa_core::Event;
use pwa_data::Partition;
use pwa_model::CoherentIntensity;

/// Unbinned `-log L` of the intensity over a data sample, normalized with a
/// phase-space sample.
///
/// The estimator owns the intensity model; the optimizer drives it through
/// [`MinLogLike::control_parameter`] with a named parameter list and reads a
/// scalar back.
#[derive(Debug)]
pub struct MinLogLike {
    intensity: CoherentIntensity,
    data_size: usize,
}

impl MinLogLike {
    /// Creates the estimator, attaching the data and phase-space batches.
    pub fn new(
        mut intensity: CoherentIntensity,
        data: &[Event],
        phase_space: &[Event],
    ) -> Result<Self, PwaError> {
        intensity.set_data(data)?;
        intensity.set_phase_space(phase_space)?;
        Ok(Self {
            intensity,
            data_size: data.len(),
        })
    }

    /// Read access to the owned intensity model.
    pub fn intensity(&self) -> &CoherentIntensity {
        &self.intensity
    }

    /// Free parameters with their current values, the optimizer's starting
    /// point.
    pub fn start_parameters(&self) -> Vec<(String, f64)> {
        self.intensity.parameters().free_values()
    }

    /// Updates the fit parameters and computes the estimator value:
    /// `-sum_data log I + N_data * log(mean_phsp I)`.
    ///
    /// Events whose intensity was clamped to zero are skipped from the data
    /// sum; they already produced a diagnostic in the intensity layer.
    pub fn control_parameter(&mut self, values: &[(String, f64)]) -> Result<f64, PwaError> {
        self.intensity.update_parameters(values);
        self.evaluate()
    }

    /// Computes the estimator value with the current parameters.
    pub fn evaluate(&mut self) -> Result<f64, PwaError> {
        let data = self.intensity.evaluate_batch(Partition::DATA)?;
        let phase_space = self.intensity.evaluate_batch(Partition::PHASE_SPACE)?;

        let mut log_sum = 0.0;
        for value in &data {
            if *value > 0.0 {
                log_sum += value.ln();
            }
        }
        let normalization: f64 =
            phase_space.iter().sum::<f64>() / phase_space.len().max(1) as f64;
        if normalization <= 0.0 || !normalization.is_finite() {
            return Err(PwaError::Model(
                ErrorInfo::new(
                    "invalid-normalization",
                    "phase-space intensity integral is not positive",
                )
                .with_context("normalization", normalization.to_string()),
            ));
        }
        Ok(-log_sum + self.data_size as f64 * normalization.ln())
    }
}

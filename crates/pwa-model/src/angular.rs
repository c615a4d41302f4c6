//! Angular factor of a two-body helicity amplitude.

use num_complex::Complex64;
use pwa_core::errors::{ErrorInfo, PwaError};
use pwa_graph::{arity_guard, common_width, Strategy, Value, ValueKind};

use crate::wigner::wigner_big_d_conj;

/// Helicity-frame angular amplitude `D^{J*}_{M,lambda}(phi, theta, 0)`.
///
/// Children, in order: the final-state slot list of the combination the node
/// was built for (structural metadata carried in the graph, as the reference
/// trees did), the cos-theta column and the phi column.
#[derive(Debug, Clone, Copy)]
pub struct HelicityAngular {
    j2: i32,
    m2: i32,
    lambda2: i32,
}

impl HelicityAngular {
    /// Creates the angular strategy for a decay with twice-spin `j2` of the
    /// mother, twice-helicity `m2` of the mother and twice-helicity
    /// difference `lambda2` of the daughters.
    pub fn new(j2: i32, m2: i32, lambda2: i32) -> Self {
        Self { j2, m2, lambda2 }
    }
}

impl Strategy for HelicityAngular {
    fn name(&self) -> &'static str {
        "helicity-angular"
    }

    fn output_kind(&self) -> ValueKind {
        ValueKind::ComplexVector
    }

    fn arity(&self) -> Option<usize> {
        Some(3)
    }

    fn execute(&self, children: &[&Value]) -> Result<Value, PwaError> {
        arity_guard(self.name(), 3, children)?;
        let Value::UIntVector(_) = children[0] else {
            return Err(PwaError::Graph(
                ErrorInfo::new("type-mismatch", "first angular child must be the slot list")
                    .with_context("operation", self.name()),
            ));
        };
        let width = common_width(&children[1..])?;
        let mut out = Vec::with_capacity(width);
        for idx in 0..width {
            let cos_theta = children[1].real_at(idx).clamp(-1.0, 1.0);
            let phi = children[2].real_at(idx);
            out.push(wigner_big_d_conj(
                self.j2,
                self.m2,
                self.lambda2,
                phi,
                cos_theta.acos(),
            ));
        }
        Ok(Value::ComplexVector(out))
    }
}

/// Reference evaluation of the angular factor for one kinematic point, used
/// by tests and cross-checks.
pub fn angular_amplitude(j2: i32, m2: i32, lambda2: i32, cos_theta: f64, phi: f64) -> Complex64 {
    wigner_big_d_conj(j2, m2, lambda2, phi, cos_theta.clamp(-1.0, 1.0).acos())
}

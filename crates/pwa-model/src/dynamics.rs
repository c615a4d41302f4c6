//! Dynamical functions (lineshapes) of the subsystem invariant mass.
//!
//! Each strategy takes the combination slot list, the mass-squared column and
//! its shape parameters as graph children, so shape parameters are ordinary
//! fit-parameter leaves and untouched resonances stay cached across
//! evaluations.

use num_complex::Complex64;
use pwa_core::errors::{ErrorInfo, PwaError};
use pwa_graph::{arity_guard, common_width, Strategy, Value, ValueKind};

fn slot_list_guard(op: &'static str, value: &Value) -> Result<(), PwaError> {
    match value {
        Value::UIntVector(_) => Ok(()),
        _ => Err(PwaError::Graph(
            ErrorInfo::new("type-mismatch", "first dynamical child must be the slot list")
                .with_context("operation", op),
        )),
    }
}

/// Unit amplitude for non-resonant contributions.
///
/// Children: slot list, mass-squared column. The column fixes the per-event
/// width; its values are not used.
#[derive(Debug, Clone, Copy)]
pub struct NonResonant;

impl Strategy for NonResonant {
    fn name(&self) -> &'static str {
        "non-resonant"
    }

    fn output_kind(&self) -> ValueKind {
        ValueKind::ComplexVector
    }

    fn arity(&self) -> Option<usize> {
        Some(2)
    }

    fn execute(&self, children: &[&Value]) -> Result<Value, PwaError> {
        arity_guard(self.name(), 2, children)?;
        slot_list_guard(self.name(), children[0])?;
        let width = common_width(&children[1..])?;
        Ok(Value::ComplexVector(vec![
            Complex64::new(1.0, 0.0);
            width
        ]))
    }
}

/// Relativistic Breit-Wigner with constant width.
///
/// Children: slot list, mass-squared column, mass parameter, width parameter.
#[derive(Debug, Clone, Copy)]
pub struct RelativisticBreitWigner;

impl Strategy for RelativisticBreitWigner {
    fn name(&self) -> &'static str {
        "rel-breit-wigner"
    }

    fn output_kind(&self) -> ValueKind {
        ValueKind::ComplexVector
    }

    fn arity(&self) -> Option<usize> {
        Some(4)
    }

    fn execute(&self, children: &[&Value]) -> Result<Value, PwaError> {
        arity_guard(self.name(), 4, children)?;
        slot_list_guard(self.name(), children[0])?;
        let width = common_width(&children[1..])?;
        let mut out = Vec::with_capacity(width);
        for idx in 0..width {
            let s = children[1].real_at(idx);
            let m0 = children[2].real_at(idx);
            let gamma0 = children[3].real_at(idx);
            let denominator = Complex64::new(m0 * m0 - s, -m0 * gamma0);
            out.push(Complex64::new(1.0, 0.0) / denominator);
        }
        Ok(Value::ComplexVector(out))
    }
}

/// Two-channel Flatte shape.
///
/// Children: slot list, mass-squared column, mass, g1, g2. The channel
/// daughter masses are fixed at construction.
#[derive(Debug, Clone, Copy)]
pub struct Flatte {
    channel1: (f64, f64),
    channel2: (f64, f64),
}

impl Flatte {
    /// Creates a Flatte shape coupling to the two given channels.
    pub fn new(channel1: (f64, f64), channel2: (f64, f64)) -> Self {
        Self { channel1, channel2 }
    }
}

/// Two-body phase-space factor `rho(s)` with analytic continuation below
/// threshold.
fn phase_space_factor(s: f64, ma: f64, mb: f64) -> Complex64 {
    let sum = (ma + mb) * (ma + mb);
    let diff = (ma - mb) * (ma - mb);
    let arg = (1.0 - sum / s) * (1.0 - diff / s);
    if arg >= 0.0 {
        Complex64::new(arg.sqrt(), 0.0)
    } else {
        Complex64::new(0.0, (-arg).sqrt())
    }
}

impl Strategy for Flatte {
    fn name(&self) -> &'static str {
        "flatte"
    }

    fn output_kind(&self) -> ValueKind {
        ValueKind::ComplexVector
    }

    fn arity(&self) -> Option<usize> {
        Some(5)
    }

    fn execute(&self, children: &[&Value]) -> Result<Value, PwaError> {
        arity_guard(self.name(), 5, children)?;
        slot_list_guard(self.name(), children[0])?;
        let width = common_width(&children[1..])?;
        let mut out = Vec::with_capacity(width);
        for idx in 0..width {
            let s = children[1].real_at(idx);
            let m0 = children[2].real_at(idx);
            let g1 = children[3].real_at(idx);
            let g2 = children[4].real_at(idx);
            let rho1 = phase_space_factor(s, self.channel1.0, self.channel1.1);
            let rho2 = phase_space_factor(s, self.channel2.0, self.channel2.1);
            let coupling = g1 * g1 * rho1 + g2 * g2 * rho2;
            let denominator = Complex64::new(m0 * m0 - s, 0.0) - Complex64::new(0.0, 1.0) * coupling;
            out.push(Complex64::new(1.0, 0.0) / denominator);
        }
        Ok(Value::ComplexVector(out))
    }
}

/// Reference Breit-Wigner evaluation for one point, used by tests.
pub fn breit_wigner_amplitude(s: f64, m0: f64, gamma0: f64) -> Complex64 {
    Complex64::new(1.0, 0.0) / Complex64::new(m0 * m0 - s, -m0 * gamma0)
}

//! Typed node values.

use num_complex::Complex64;
use serde::{Deserialize, Serialize};

/// Output type tag of a graph node.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub enum ValueKind {
    /// Real scalar.
    Scalar,
    /// Complex scalar.
    ComplexScalar,
    /// Per-event real vector.
    Vector,
    /// Per-event complex vector.
    ComplexVector,
    /// Per-event unsigned integer vector (index lists).
    UIntVector,
}

impl ValueKind {
    /// Returns whether values of this kind carry one entry per event.
    pub fn is_per_event(&self) -> bool {
        matches!(
            self,
            ValueKind::Vector | ValueKind::ComplexVector | ValueKind::UIntVector
        )
    }

    pub(crate) fn label(&self) -> &'static str {
        match self {
            ValueKind::Scalar => "scalar",
            ValueKind::ComplexScalar => "cscalar",
            ValueKind::Vector => "vector",
            ValueKind::ComplexVector => "cvector",
            ValueKind::UIntVector => "uvector",
        }
    }
}

/// A cached node value.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub enum Value {
    /// Real scalar.
    Scalar(f64),
    /// Complex scalar.
    ComplexScalar(Complex64),
    /// Per-event real vector.
    Vector(Vec<f64>),
    /// Per-event complex vector.
    ComplexVector(Vec<Complex64>),
    /// Per-event unsigned integer vector.
    UIntVector(Vec<u32>),
}

impl Value {
    /// The type tag of this value.
    pub fn kind(&self) -> ValueKind {
        match self {
            Value::Scalar(_) => ValueKind::Scalar,
            Value::ComplexScalar(_) => ValueKind::ComplexScalar,
            Value::Vector(_) => ValueKind::Vector,
            Value::ComplexVector(_) => ValueKind::ComplexVector,
            Value::UIntVector(_) => ValueKind::UIntVector,
        }
    }

    /// A zero-valued placeholder of the given kind, used before the first
    /// evaluation.
    pub fn zero_of(kind: ValueKind) -> Value {
        match kind {
            ValueKind::Scalar => Value::Scalar(0.0),
            ValueKind::ComplexScalar => Value::ComplexScalar(Complex64::new(0.0, 0.0)),
            ValueKind::Vector => Value::Vector(Vec::new()),
            ValueKind::ComplexVector => Value::ComplexVector(Vec::new()),
            ValueKind::UIntVector => Value::UIntVector(Vec::new()),
        }
    }

    /// Width of the value: 1 for scalars, the length for vectors.
    pub fn width(&self) -> usize {
        match self {
            Value::Scalar(_) | Value::ComplexScalar(_) => 1,
            Value::Vector(v) => v.len(),
            Value::ComplexVector(v) => v.len(),
            Value::UIntVector(v) => v.len(),
        }
    }

    /// Complex view of entry `idx`, broadcasting scalars. Integer vectors
    /// have no complex view; the type check at construction keeps them out
    /// of arithmetic operations.
    pub fn complex_at(&self, idx: usize) -> Complex64 {
        match self {
            Value::Scalar(v) => Complex64::new(*v, 0.0),
            Value::ComplexScalar(v) => *v,
            Value::Vector(v) => Complex64::new(v[if v.len() == 1 { 0 } else { idx }], 0.0),
            Value::ComplexVector(v) => v[if v.len() == 1 { 0 } else { idx }],
            Value::UIntVector(_) => Complex64::new(f64::NAN, 0.0),
        }
    }

    /// Real view of entry `idx`, broadcasting scalars. Complex entries with
    /// non-zero imaginary parts are the caller's type error.
    pub fn real_at(&self, idx: usize) -> f64 {
        match self {
            Value::Scalar(v) => *v,
            Value::ComplexScalar(v) => v.re,
            Value::Vector(v) => v[if v.len() == 1 { 0 } else { idx }],
            Value::ComplexVector(v) => v[if v.len() == 1 { 0 } else { idx }].re,
            Value::UIntVector(_) => f64::NAN,
        }
    }

    /// Returns the scalar value if this is a real scalar or width-1 vector.
    pub fn as_scalar(&self) -> Option<f64> {
        match self {
            Value::Scalar(v) => Some(*v),
            Value::Vector(v) if v.len() == 1 => Some(v[0]),
            _ => None,
        }
    }

    /// Returns the per-event real vector view if this is a real value.
    pub fn as_real_slice(&self) -> Option<&[f64]> {
        match self {
            Value::Vector(v) => Some(v),
            _ => None,
        }
    }
}

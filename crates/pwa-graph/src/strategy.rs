//! Elementwise operations attached to graph nodes.

use num_complex::Complex64;
use pwa_core::errors::{ErrorInfo, PwaError};

use crate::value::{Value, ValueKind};

/// A pure operation mapping child values to one output value.
///
/// Strategies declare their output kind so the graph can reject a mismatched
/// attachment at construction time. `execute` is only invoked when the owning
/// node is stale.
pub trait Strategy: std::fmt::Debug + Send + Sync {
    /// Short name used in structural dumps.
    fn name(&self) -> &'static str;

    /// Output kind produced by this operation.
    fn output_kind(&self) -> ValueKind;

    /// Required child count, if fixed. Checked during `resolve_links`.
    fn arity(&self) -> Option<usize> {
        None
    }

    /// Computes the output from the child values.
    fn execute(&self, children: &[&Value]) -> Result<Value, PwaError>;
}

/// Common width of a set of children: scalars broadcast, all wider values
/// must agree.
pub fn common_width(children: &[&Value]) -> Result<usize, PwaError> {
    let mut target = 1usize;
    for child in children {
        let width = child.width();
        if width == 1 {
            continue;
        }
        if target == 1 {
            target = width;
        } else if width != target {
            return Err(PwaError::Graph(
                ErrorInfo::new(
                    "width-mismatch",
                    "elementwise operation over misaligned per-event arrays",
                )
                .with_context("expected", target.to_string())
                .with_context("found", width.to_string()),
            ));
        }
    }
    Ok(target)
}

fn arithmetic_unsupported(op: &'static str) -> PwaError {
    PwaError::Graph(
        ErrorInfo::new("type-mismatch", "integer vectors do not support arithmetic")
            .with_context("operation", op),
    )
}

/// Child-count guard for fixed-arity operations invoked outside the graph's
/// own resolution checks.
pub fn arity_guard(
    op: &'static str,
    expected: usize,
    children: &[&Value],
) -> Result<(), PwaError> {
    if children.len() != expected {
        return Err(PwaError::Graph(
            ErrorInfo::new("broken-link", "operation child count is wrong")
                .with_context("operation", op)
                .with_context("expected", expected.to_string())
                .with_context("found", children.len().to_string()),
        ));
    }
    Ok(())
}

fn shape_result(kind: ValueKind, op: &'static str, width: usize) -> Result<(), PwaError> {
    if !kind.is_per_event() && width > 1 {
        return Err(PwaError::Graph(
            ErrorInfo::new("width-mismatch", "scalar node fed per-event children")
                .with_context("operation", op)
                .with_context("found", width.to_string()),
        ));
    }
    Ok(())
}

fn fold_real(
    kind: ValueKind,
    op: &'static str,
    children: &[&Value],
    init: f64,
    f: impl Fn(f64, f64) -> f64,
) -> Result<Value, PwaError> {
    let width = common_width(children)?;
    shape_result(kind, op, width)?;
    if kind.is_per_event() {
        let mut out = Vec::with_capacity(width);
        for idx in 0..width {
            let mut acc = init;
            for child in children {
                acc = f(acc, child.real_at(idx));
            }
            out.push(acc);
        }
        Ok(Value::Vector(out))
    } else {
        let mut acc = init;
        for child in children {
            acc = f(acc, child.real_at(0));
        }
        Ok(Value::Scalar(acc))
    }
}

fn fold_complex(
    kind: ValueKind,
    op: &'static str,
    children: &[&Value],
    init: Complex64,
    f: impl Fn(Complex64, Complex64) -> Complex64,
) -> Result<Value, PwaError> {
    let width = common_width(children)?;
    shape_result(kind, op, width)?;
    if kind.is_per_event() {
        let mut out = Vec::with_capacity(width);
        for idx in 0..width {
            let mut acc = init;
            for child in children {
                acc = f(acc, child.complex_at(idx));
            }
            out.push(acc);
        }
        Ok(Value::ComplexVector(out))
    } else {
        let mut acc = init;
        for child in children {
            acc = f(acc, child.complex_at(0));
        }
        Ok(Value::ComplexScalar(acc))
    }
}

/// Elementwise sum of all children.
#[derive(Debug, Clone, Copy)]
pub struct AddAll {
    kind: ValueKind,
}

impl AddAll {
    /// Creates a summation producing the given kind.
    pub fn new(kind: ValueKind) -> Self {
        Self { kind }
    }
}

impl Strategy for AddAll {
    fn name(&self) -> &'static str {
        "add-all"
    }

    fn output_kind(&self) -> ValueKind {
        self.kind
    }

    fn execute(&self, children: &[&Value]) -> Result<Value, PwaError> {
        match self.kind {
            ValueKind::Scalar | ValueKind::Vector => {
                fold_real(self.kind, self.name(), children, 0.0, |a, b| a + b)
            }
            ValueKind::ComplexScalar | ValueKind::ComplexVector => fold_complex(
                self.kind,
                self.name(),
                children,
                Complex64::new(0.0, 0.0),
                |a, b| a + b,
            ),
            ValueKind::UIntVector => Err(arithmetic_unsupported(self.name())),
        }
    }
}

/// Elementwise product of all children.
#[derive(Debug, Clone, Copy)]
pub struct MultAll {
    kind: ValueKind,
}

impl MultAll {
    /// Creates a product producing the given kind.
    pub fn new(kind: ValueKind) -> Self {
        Self { kind }
    }
}

impl Strategy for MultAll {
    fn name(&self) -> &'static str {
        "mult-all"
    }

    fn output_kind(&self) -> ValueKind {
        self.kind
    }

    fn execute(&self, children: &[&Value]) -> Result<Value, PwaError> {
        match self.kind {
            ValueKind::Scalar | ValueKind::Vector => {
                fold_real(self.kind, self.name(), children, 1.0, |a, b| a * b)
            }
            ValueKind::ComplexScalar | ValueKind::ComplexVector => fold_complex(
                self.kind,
                self.name(),
                children,
                Complex64::new(1.0, 0.0),
                |a, b| a * b,
            ),
            ValueKind::UIntVector => Err(arithmetic_unsupported(self.name())),
        }
    }
}

/// Squared magnitude of the single complex child.
#[derive(Debug, Clone, Copy)]
pub struct AbsSquare {
    kind: ValueKind,
}

impl AbsSquare {
    /// Creates the squared-magnitude operation producing a real kind.
    pub fn new(kind: ValueKind) -> Self {
        Self { kind }
    }
}

impl Strategy for AbsSquare {
    fn name(&self) -> &'static str {
        "abs-square"
    }

    fn output_kind(&self) -> ValueKind {
        self.kind
    }

    fn arity(&self) -> Option<usize> {
        Some(1)
    }

    fn execute(&self, children: &[&Value]) -> Result<Value, PwaError> {
        arity_guard(self.name(), 1, children)?;
        let child = children[0];
        let width = common_width(children)?;
        shape_result(self.kind, self.name(), width)?;
        if self.kind.is_per_event() {
            let mut out = Vec::with_capacity(width);
            for idx in 0..width {
                out.push(child.complex_at(idx).norm_sqr());
            }
            Ok(Value::Vector(out))
        } else {
            Ok(Value::Scalar(child.complex_at(0).norm_sqr()))
        }
    }
}

/// Builds a complex value from magnitude and phase children.
#[derive(Debug, Clone, Copy)]
pub struct Complexify {
    kind: ValueKind,
}

impl Complexify {
    /// Creates the magnitude/phase combination producing a complex kind.
    pub fn new(kind: ValueKind) -> Self {
        Self { kind }
    }
}

impl Strategy for Complexify {
    fn name(&self) -> &'static str {
        "complexify"
    }

    fn output_kind(&self) -> ValueKind {
        self.kind
    }

    fn arity(&self) -> Option<usize> {
        Some(2)
    }

    fn execute(&self, children: &[&Value]) -> Result<Value, PwaError> {
        arity_guard(self.name(), 2, children)?;
        let width = common_width(children)?;
        shape_result(self.kind, self.name(), width)?;
        let polar = |idx: usize| {
            let mag = children[0].real_at(idx);
            let phase = children[1].real_at(idx);
            Complex64::from_polar(mag, phase)
        };
        if self.kind.is_per_event() {
            Ok(Value::ComplexVector((0..width).map(polar).collect()))
        } else {
            Ok(Value::ComplexScalar(polar(0)))
        }
    }
}

use crate::error::CalcResult;
use num_traits::{Float, FromPrimitive};
use std::fmt::Debug;

/// A trait for types the expression VM can compute with.
/// Must support basic arithmetic, debug printing, and conversion from f64.
pub trait Scalar: Float + FromPrimitive + Debug + 'static {}

impl<T: Float + FromPrimitive + Debug + 'static> Scalar for T {}

/// The contract the calculator expects from a numeric evaluator.
///
/// Given an expression in parser syntax, return its value or a typed error
/// (`CalcError::Parse` / `CalcError::Math`). Implementations must not panic
/// on malformed input.
pub trait Evaluator {
    fn evaluate(&self, expression: &str) -> CalcResult<f64>;

    /// Renders a value to `precision` significant digits.
    fn format(&self, value: f64, precision: usize) -> String;
}

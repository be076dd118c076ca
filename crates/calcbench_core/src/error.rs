use thiserror::Error;

/// Failures raised by the numeric layers of the engine.
///
/// Components never hand these to their callers directly: the calculator,
/// workbench and converter each fold them into a sentinel value at their
/// boundary. The typed variants exist so that the boundary can log what
/// went wrong and so that lower layers stay testable on their own.
#[derive(Debug, Clone, PartialEq, Error)]
pub enum CalcError {
    /// Malformed expression syntax, or an unknown identifier/function.
    #[error("parse error: {0}")]
    Parse(String),
    /// The expression parsed but produced no finite value.
    #[error("math error: {0}")]
    Math(String),
    /// Matrix operands do not satisfy an operation's shape precondition.
    #[error("dimension mismatch in {operation}: {left:?} vs {right:?}")]
    Dimension {
        operation: &'static str,
        left: (usize, usize),
        right: (usize, usize),
    },
    /// Determinant/inverse on a non-square matrix, or inverse of a singular one.
    #[error("singular matrix: {0}")]
    SingularMatrix(String),
    /// Non-numeric text handed to a numeric field.
    #[error("invalid input: {0}")]
    InputFormat(String),
}

pub type CalcResult<T> = Result<T, CalcError>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn dimension_error_mentions_both_shapes() {
        let err = CalcError::Dimension {
            operation: "multiply",
            left: (2, 3),
            right: (2, 2),
        };
        let text = err.to_string();
        assert!(text.contains("multiply"));
        assert!(text.contains("(2, 3)"));
        assert!(text.contains("(2, 2)"));
    }
}

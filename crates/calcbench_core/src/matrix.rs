//! Matrix workbench: an ordered, editable collection of matrices with two
//! selected operands and a single published result.

use crate::conversion::parse_input;
use crate::error::{CalcError, CalcResult};
use crate::linalg::{self, Matrix};
use nalgebra::DMatrix;
use serde::{Deserialize, Serialize};
use std::str::FromStr;
use tracing::{debug, warn};

pub const ERROR_LABEL: &str = "Error";
const INITIAL_LABEL: &str = "Result";

/// The collection never shrinks below this many matrices.
pub const MIN_MATRICES: usize = 2;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum MatrixOperation {
    Add,
    Subtract,
    Multiply,
    TransposeA,
    TransposeB,
    DetA,
    DetB,
    InvA,
    InvB,
}

impl FromStr for MatrixOperation {
    type Err = CalcError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let op = match s {
            "add" => Self::Add,
            "subtract" => Self::Subtract,
            "multiply" => Self::Multiply,
            "transpose_a" => Self::TransposeA,
            "transpose_b" => Self::TransposeB,
            "det_a" => Self::DetA,
            "det_b" => Self::DetB,
            "inv_a" => Self::InvA,
            "inv_b" => Self::InvB,
            other => {
                return Err(CalcError::InputFormat(format!(
                    "unknown matrix operation: {other}"
                )))
            }
        };
        Ok(op)
    }
}

/// The last computed output of the workbench.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct MatrixResult {
    pub value: Matrix,
    pub label: String,
}

/// How a result should be read: a lone number or a grid.
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum ResultShape<'a> {
    Scalar(f64),
    Grid(&'a [Vec<f64>]),
}

impl MatrixResult {
    fn initial() -> Self {
        Self {
            value: Matrix::zeros(1, 1),
            label: INITIAL_LABEL.to_string(),
        }
    }

    fn error() -> Self {
        Self {
            value: Matrix::zeros(1, 1),
            label: ERROR_LABEL.to_string(),
        }
    }

    pub fn is_error(&self) -> bool {
        self.label == ERROR_LABEL
    }

    pub fn shape(&self) -> ResultShape<'_> {
        match self.value.shape() {
            (1, 1) => ResultShape::Scalar(self.value.rows()[0][0]),
            _ => ResultShape::Grid(self.value.rows()),
        }
    }
}

/// Alphabetic operand label: 0 → A, 25 → Z, 26 → AA, 27 → AB, …
pub fn alpha_label(index: usize) -> String {
    let mut n = index + 1;
    let mut label = Vec::new();
    while n > 0 {
        let rem = (n - 1) % 26;
        label.push(b'A' + rem as u8);
        n = (n - 1) / 26;
    }
    label.reverse();
    String::from_utf8_lossy(&label).into_owned()
}

/// Parses a cell edit from its leading number (`"12abc"` is 12).
/// Text without one becomes 0.
pub fn parse_cell(text: &str) -> f64 {
    parse_input(text).unwrap_or(0.0)
}

#[derive(Debug, Clone, Serialize)]
pub struct WorkbenchSnapshot {
    pub matrices: Vec<Matrix>,
    pub labels: Vec<String>,
    pub selected_a: usize,
    pub selected_b: usize,
    pub result: MatrixResult,
}

#[derive(Debug, Clone)]
pub struct MatrixWorkbench {
    matrices: Vec<Matrix>,
    idx_a: usize,
    idx_b: usize,
    result: MatrixResult,
}

impl Default for MatrixWorkbench {
    fn default() -> Self {
        Self {
            matrices: vec![square2([1.0, 2.0, 3.0, 4.0]), square2([5.0, 6.0, 7.0, 8.0])],
            idx_a: 0,
            idx_b: 1,
            result: MatrixResult::initial(),
        }
    }
}

fn square2(values: [f64; 4]) -> Matrix {
    Matrix::from_dmatrix(&DMatrix::from_row_slice(2, 2, &values))
}

impl MatrixWorkbench {
    pub fn new() -> Self {
        Self::default()
    }

    /// Starts from the given matrices; fewer than two are padded with 2x2 zeros.
    pub fn with_matrices(mut matrices: Vec<Matrix>) -> Self {
        while matrices.len() < MIN_MATRICES {
            matrices.push(Matrix::zeros(2, 2));
        }
        Self {
            matrices,
            idx_a: 0,
            idx_b: 1,
            result: MatrixResult::initial(),
        }
    }

    pub fn matrices(&self) -> &[Matrix] {
        &self.matrices
    }

    pub fn matrix(&self, index: usize) -> Option<&Matrix> {
        self.matrices.get(index)
    }

    pub fn len(&self) -> usize {
        self.matrices.len()
    }

    pub fn is_empty(&self) -> bool {
        self.matrices.is_empty()
    }

    pub fn selected(&self) -> (usize, usize) {
        (self.idx_a, self.idx_b)
    }

    pub fn result(&self) -> &MatrixResult {
        &self.result
    }

    pub fn select_a(&mut self, index: usize) -> bool {
        if index >= self.matrices.len() {
            warn!(index, len = self.matrices.len(), "operand A out of range");
            return false;
        }
        self.idx_a = index;
        true
    }

    pub fn select_b(&mut self, index: usize) -> bool {
        if index >= self.matrices.len() {
            warn!(index, len = self.matrices.len(), "operand B out of range");
            return false;
        }
        self.idx_b = index;
        true
    }

    pub fn set_cell(&mut self, matrix: usize, row: usize, col: usize, value: f64) -> bool {
        let value = if value.is_finite() { value } else { 0.0 };
        self.matrices
            .get_mut(matrix)
            .is_some_and(|m| m.set(row, col, value))
    }

    pub fn set_cell_text(&mut self, matrix: usize, row: usize, col: usize, text: &str) -> bool {
        self.set_cell(matrix, row, col, parse_cell(text))
    }

    pub fn add_row(&mut self, matrix: usize) -> bool {
        self.edit(matrix, |m| {
            m.push_row();
            true
        })
    }

    pub fn add_col(&mut self, matrix: usize) -> bool {
        self.edit(matrix, |m| {
            m.push_col();
            true
        })
    }

    pub fn remove_row(&mut self, matrix: usize, row: usize) -> bool {
        self.edit(matrix, |m| m.remove_row(row))
    }

    pub fn remove_col(&mut self, matrix: usize, col: usize) -> bool {
        self.edit(matrix, |m| m.remove_col(col))
    }

    /// Appends a 2x2 zero matrix and returns its index.
    pub fn add_matrix(&mut self) -> usize {
        self.matrices.push(Matrix::zeros(2, 2));
        self.matrices.len() - 1
    }

    /// Removes a matrix unless only two remain; operands reset to 0 and 1.
    pub fn remove_matrix(&mut self, index: usize) -> bool {
        if self.matrices.len() <= MIN_MATRICES || index >= self.matrices.len() {
            return false;
        }
        self.matrices.remove(index);
        self.idx_a = 0;
        self.idx_b = 1;
        true
    }

    /// Runs `op` on the selected operands and publishes the outcome.
    pub fn perform(&mut self, op: MatrixOperation) -> &MatrixResult {
        self.result = match self.compute(op) {
            Ok((value, label)) => MatrixResult { value, label },
            Err(err) => {
                debug!(?op, error = %err, "matrix operation failed");
                MatrixResult::error()
            }
        };
        &self.result
    }

    /// Appends a copy of the current result as a new matrix.
    pub fn store_result(&mut self) -> Option<usize> {
        if self.result.is_error() {
            return None;
        }
        self.matrices.push(self.result.value.clone());
        Some(self.matrices.len() - 1)
    }

    pub fn labels(&self) -> Vec<String> {
        (0..self.matrices.len()).map(alpha_label).collect()
    }

    pub fn snapshot(&self) -> WorkbenchSnapshot {
        WorkbenchSnapshot {
            matrices: self.matrices.clone(),
            labels: self.labels(),
            selected_a: self.idx_a,
            selected_b: self.idx_b,
            result: self.result.clone(),
        }
    }

    fn edit(&mut self, matrix: usize, f: impl FnOnce(&mut Matrix) -> bool) -> bool {
        self.matrices.get_mut(matrix).is_some_and(f)
    }

    fn compute(&self, op: MatrixOperation) -> CalcResult<(Matrix, String)> {
        let a = self.operand(self.idx_a)?;
        let b = self.operand(self.idx_b)?;
        let la = alpha_label(self.idx_a);
        let lb = alpha_label(self.idx_b);

        let computed = match op {
            MatrixOperation::Add => (linalg::add(a, b)?, format!("{la} + {lb}")),
            MatrixOperation::Subtract => (linalg::subtract(a, b)?, format!("{la} - {lb}")),
            MatrixOperation::Multiply => (linalg::multiply(a, b)?, format!("{la} × {lb}")),
            MatrixOperation::TransposeA => (linalg::transpose(a), format!("{la}^T")),
            MatrixOperation::TransposeB => (linalg::transpose(b), format!("{lb}^T")),
            MatrixOperation::DetA => (scalar(linalg::determinant(a)?), format!("det({la})")),
            MatrixOperation::DetB => (scalar(linalg::determinant(b)?), format!("det({lb})")),
            MatrixOperation::InvA => (linalg::inverse(a)?, format!("{la}^(-1)")),
            MatrixOperation::InvB => (linalg::inverse(b)?, format!("{lb}^(-1)")),
        };
        Ok(computed)
    }

    fn operand(&self, index: usize) -> CalcResult<&Matrix> {
        self.matrices
            .get(index)
            .ok_or_else(|| CalcError::InputFormat(format!("no matrix at index {index}")))
    }
}

fn scalar(value: f64) -> Matrix {
    let mut m = Matrix::zeros(1, 1);
    m.set(0, 0, value);
    m
}

#[cfg(test)]
mod tests {
    use super::*;

    fn rows(m: &Matrix) -> Vec<Vec<f64>> {
        m.rows().to_vec()
    }

    #[test]
    fn starts_with_two_sample_matrices() {
        let wb = MatrixWorkbench::new();
        assert_eq!(wb.len(), 2);
        assert_eq!(rows(&wb.matrices()[0]), vec![vec![1.0, 2.0], vec![3.0, 4.0]]);
        assert_eq!(rows(&wb.matrices()[1]), vec![vec![5.0, 6.0], vec![7.0, 8.0]]);
        assert_eq!(wb.result().label, "Result");
    }

    #[test]
    fn labels_are_alphabetic_by_position() {
        assert_eq!(alpha_label(0), "A");
        assert_eq!(alpha_label(1), "B");
        assert_eq!(alpha_label(25), "Z");
        assert_eq!(alpha_label(26), "AA");
        assert_eq!(alpha_label(27), "AB");
    }

    #[test]
    fn add_and_subtract_publish_labelled_results() {
        let mut wb = MatrixWorkbench::new();
        let result = wb.perform(MatrixOperation::Add).clone();
        assert_eq!(result.label, "A + B");
        assert_eq!(rows(&result.value), vec![vec![6.0, 8.0], vec![10.0, 12.0]]);

        wb.select_a(1);
        wb.select_b(0);
        let result = wb.perform(MatrixOperation::Subtract);
        assert_eq!(result.label, "B - A");
        assert_eq!(rows(&result.value), vec![vec![4.0, 4.0], vec![4.0, 4.0]]);
    }

    #[test]
    fn multiply_with_mismatched_shapes_reports_error_label() {
        let a = Matrix::from_rows(vec![vec![1.0, 2.0, 3.0], vec![4.0, 5.0, 6.0]]).expect("2x3");
        let b = Matrix::zeros(2, 2);
        let mut wb = MatrixWorkbench::with_matrices(vec![a, b]);

        let result = wb.perform(MatrixOperation::Multiply);
        assert_eq!(result.label, "Error");
        assert_eq!(rows(&result.value), vec![vec![0.0]]);
        assert!(result.is_error());
    }

    #[test]
    fn multiply_uses_matrix_product() {
        let mut wb = MatrixWorkbench::new();
        let result = wb.perform(MatrixOperation::Multiply);
        assert_eq!(result.label, "A × B");
        assert_eq!(rows(&result.value), vec![vec![19.0, 22.0], vec![43.0, 50.0]]);
    }

    #[test]
    fn determinant_is_exposed_as_scalar() {
        let mut wb = MatrixWorkbench::new();
        let result = wb.perform(MatrixOperation::DetB);
        assert_eq!(result.label, "det(B)");
        match result.shape() {
            ResultShape::Scalar(v) => assert!((v + 2.0).abs() < 1e-9),
            ResultShape::Grid(_) => panic!("determinant should be scalar"),
        }
    }

    #[test]
    fn transpose_and_inverse_labels() {
        let mut wb = MatrixWorkbench::new();
        assert_eq!(wb.perform(MatrixOperation::TransposeA).label, "A^T");
        assert_eq!(wb.perform(MatrixOperation::TransposeB).label, "B^T");
        let inv = wb.perform(MatrixOperation::InvA).clone();
        assert_eq!(inv.label, "A^(-1)");
        assert!(matches!(inv.shape(), ResultShape::Grid(g) if g.len() == 2));
    }

    #[test]
    fn singular_inverse_reports_error_label() {
        let singular = Matrix::from_rows(vec![vec![1.0, 2.0], vec![2.0, 4.0]]).expect("2x2");
        let mut wb = MatrixWorkbench::with_matrices(vec![singular]);
        assert!(wb.perform(MatrixOperation::InvA).is_error());
        // The failed operation leaves the operands untouched.
        assert_eq!(wb.matrices()[0].shape(), (2, 2));
    }

    #[test]
    fn row_and_column_removal_stops_at_one_by_one() {
        let mut wb = MatrixWorkbench::with_matrices(vec![Matrix::zeros(1, 1)]);
        for _ in 0..3 {
            assert!(!wb.remove_row(0, 0));
            assert!(!wb.remove_col(0, 0));
        }
        assert_eq!(wb.matrices()[0].shape(), (1, 1));
    }

    #[test]
    fn shape_edits_append_zero_rows_and_columns() {
        let mut wb = MatrixWorkbench::new();
        assert!(wb.add_row(0));
        assert!(wb.add_col(0));
        assert_eq!(
            rows(&wb.matrices()[0]),
            vec![vec![1.0, 2.0, 0.0], vec![3.0, 4.0, 0.0], vec![0.0, 0.0, 0.0]]
        );
        assert!(wb.remove_row(0, 0));
        assert!(wb.remove_col(0, 1));
        assert_eq!(rows(&wb.matrices()[0]), vec![vec![3.0, 0.0], vec![0.0, 0.0]]);
        assert!(!wb.add_row(9));
    }

    #[test]
    fn remove_matrix_keeps_two_and_resets_selection() {
        let mut wb = MatrixWorkbench::new();
        assert!(!wb.remove_matrix(0));
        assert_eq!(wb.len(), 2);

        let c = wb.add_matrix();
        assert_eq!(c, 2);
        assert!(wb.select_a(2));
        assert!(wb.select_b(0));
        assert!(wb.remove_matrix(1));
        assert_eq!(wb.len(), 2);
        assert_eq!(wb.selected(), (0, 1));
    }

    #[test]
    fn selection_out_of_range_is_rejected() {
        let mut wb = MatrixWorkbench::new();
        assert!(!wb.select_a(2));
        assert!(!wb.select_b(5));
        assert_eq!(wb.selected(), (0, 1));
    }

    #[test]
    fn invalid_cell_text_becomes_zero() {
        let mut wb = MatrixWorkbench::new();
        assert!(wb.set_cell_text(0, 0, 0, ""));
        assert!(wb.set_cell_text(0, 0, 1, "abc"));
        assert!(wb.set_cell_text(0, 1, 0, " 2.5 "));
        assert!(wb.set_cell(0, 1, 1, f64::NAN));
        assert_eq!(rows(&wb.matrices()[0]), vec![vec![0.0, 0.0], vec![2.5, 0.0]]);
        assert!(!wb.set_cell_text(0, 5, 5, "1"));
    }

    #[test]
    fn cell_text_reads_its_leading_number() {
        let mut wb = MatrixWorkbench::new();
        assert!(wb.set_cell_text(0, 0, 0, "12abc"));
        assert!(wb.set_cell_text(0, 0, 1, "-3e2x"));
        assert!(wb.set_cell_text(0, 1, 0, "inf"));
        assert!(wb.set_cell_text(0, 1, 1, ".5."));
        assert_eq!(rows(&wb.matrices()[0]), vec![vec![12.0, -300.0], vec![0.0, 0.5]]);
    }

    #[test]
    fn store_result_appends_a_copy_unless_error() {
        let mut wb = MatrixWorkbench::new();
        assert_eq!(wb.store_result(), Some(2));

        wb.perform(MatrixOperation::Add);
        let stored = wb.store_result().expect("stored");
        assert_eq!(rows(&wb.matrices()[stored]), vec![vec![6.0, 8.0], vec![10.0, 12.0]]);

        wb.set_cell(stored, 0, 0, 99.0);
        assert_eq!(wb.result().value.get(0, 0), Some(6.0));

        let wide = Matrix::zeros(1, 3);
        let mut wb = MatrixWorkbench::with_matrices(vec![wide]);
        wb.perform(MatrixOperation::DetA);
        assert_eq!(wb.store_result(), None);
        assert_eq!(wb.len(), 2);
    }

    #[test]
    fn operation_names_parse() {
        assert_eq!("inv_b".parse::<MatrixOperation>(), Ok(MatrixOperation::InvB));
        assert!("power".parse::<MatrixOperation>().is_err());
    }

    #[test]
    fn snapshot_lists_labels_and_selection() {
        let mut wb = MatrixWorkbench::new();
        wb.add_matrix();
        let snapshot = wb.snapshot();
        assert_eq!(snapshot.labels, vec!["A", "B", "C"]);
        assert_eq!((snapshot.selected_a, snapshot.selected_b), (0, 1));
    }
}

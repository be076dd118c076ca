//! Rectangular matrices and the linear-algebra primitives the workbench uses.
//!
//! Storage is row-major `Vec<Vec<f64>>` so it maps directly onto an
//! editable grid; arithmetic goes through `nalgebra::DMatrix`.

use crate::error::{CalcError, CalcResult};
use nalgebra::DMatrix;
use serde::{Deserialize, Serialize};

/// A rectangular matrix with at least one row and one column.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(try_from = "Vec<Vec<f64>>", into = "Vec<Vec<f64>>")]
pub struct Matrix {
    rows: Vec<Vec<f64>>,
}

impl Matrix {
    /// A zero matrix; dimensions below 1 are raised to 1.
    pub fn zeros(rows: usize, cols: usize) -> Self {
        Self {
            rows: vec![vec![0.0; cols.max(1)]; rows.max(1)],
        }
    }

    pub fn from_rows(rows: Vec<Vec<f64>>) -> CalcResult<Self> {
        let cols = rows.first().map_or(0, Vec::len);
        if rows.is_empty() || cols == 0 {
            return Err(CalcError::InputFormat(
                "matrix needs at least one row and one column".to_string(),
            ));
        }
        if let Some(bad) = rows.iter().position(|row| row.len() != cols) {
            return Err(CalcError::InputFormat(format!(
                "row {bad} has {} cells, expected {cols}",
                rows[bad].len()
            )));
        }
        Ok(Self { rows })
    }

    pub fn nrows(&self) -> usize {
        self.rows.len()
    }

    pub fn ncols(&self) -> usize {
        self.rows[0].len()
    }

    pub fn shape(&self) -> (usize, usize) {
        (self.nrows(), self.ncols())
    }

    pub fn is_square(&self) -> bool {
        self.nrows() == self.ncols()
    }

    pub fn rows(&self) -> &[Vec<f64>] {
        &self.rows
    }

    pub fn get(&self, row: usize, col: usize) -> Option<f64> {
        self.rows.get(row).and_then(|r| r.get(col)).copied()
    }

    /// Writes one cell. Returns false when the coordinates are out of range.
    pub fn set(&mut self, row: usize, col: usize, value: f64) -> bool {
        match self.rows.get_mut(row).and_then(|r| r.get_mut(col)) {
            Some(cell) => {
                *cell = value;
                true
            }
            None => false,
        }
    }

    pub fn push_row(&mut self) {
        let cols = self.ncols();
        self.rows.push(vec![0.0; cols]);
    }

    pub fn push_col(&mut self) {
        for row in &mut self.rows {
            row.push(0.0);
        }
    }

    /// Removes row `index` unless it is out of range or the last one left.
    pub fn remove_row(&mut self, index: usize) -> bool {
        if self.nrows() <= 1 || index >= self.nrows() {
            return false;
        }
        self.rows.remove(index);
        true
    }

    /// Removes column `index` unless it is out of range or the last one left.
    pub fn remove_col(&mut self, index: usize) -> bool {
        if self.ncols() <= 1 || index >= self.ncols() {
            return false;
        }
        for row in &mut self.rows {
            row.remove(index);
        }
        true
    }

    pub fn to_dmatrix(&self) -> DMatrix<f64> {
        DMatrix::from_fn(self.nrows(), self.ncols(), |r, c| self.rows[r][c])
    }

    pub fn from_dmatrix(matrix: &DMatrix<f64>) -> Self {
        let rows = (0..matrix.nrows().max(1))
            .map(|r| {
                (0..matrix.ncols().max(1))
                    .map(|c| matrix.get((r, c)).copied().unwrap_or(0.0))
                    .collect()
            })
            .collect();
        Self { rows }
    }

    pub fn into_rows(self) -> Vec<Vec<f64>> {
        self.rows
    }
}

impl TryFrom<Vec<Vec<f64>>> for Matrix {
    type Error = CalcError;

    fn try_from(rows: Vec<Vec<f64>>) -> CalcResult<Self> {
        Self::from_rows(rows)
    }
}

impl From<Matrix> for Vec<Vec<f64>> {
    fn from(matrix: Matrix) -> Self {
        matrix.rows
    }
}

pub fn add(a: &Matrix, b: &Matrix) -> CalcResult<Matrix> {
    require_same_shape("add", a, b)?;
    Ok(Matrix::from_dmatrix(&(a.to_dmatrix() + b.to_dmatrix())))
}

pub fn subtract(a: &Matrix, b: &Matrix) -> CalcResult<Matrix> {
    require_same_shape("subtract", a, b)?;
    Ok(Matrix::from_dmatrix(&(a.to_dmatrix() - b.to_dmatrix())))
}

pub fn multiply(a: &Matrix, b: &Matrix) -> CalcResult<Matrix> {
    if a.ncols() != b.nrows() {
        return Err(CalcError::Dimension {
            operation: "multiply",
            left: a.shape(),
            right: b.shape(),
        });
    }
    Ok(Matrix::from_dmatrix(&(a.to_dmatrix() * b.to_dmatrix())))
}

pub fn transpose(a: &Matrix) -> Matrix {
    Matrix::from_dmatrix(&a.to_dmatrix().transpose())
}

pub fn determinant(a: &Matrix) -> CalcResult<f64> {
    require_square("determinant", a)?;
    let det = a.to_dmatrix().determinant();
    if !det.is_finite() {
        return Err(CalcError::Math("determinant is not finite".to_string()));
    }
    Ok(det)
}

pub fn inverse(a: &Matrix) -> CalcResult<Matrix> {
    require_square("inverse", a)?;
    let inverse = a
        .to_dmatrix()
        .lu()
        .try_inverse()
        .ok_or_else(|| CalcError::SingularMatrix("determinant is zero".to_string()))?;
    if inverse.iter().any(|v| !v.is_finite()) {
        return Err(CalcError::SingularMatrix(
            "inverse has non-finite entries".to_string(),
        ));
    }
    Ok(Matrix::from_dmatrix(&inverse))
}

fn require_same_shape(operation: &'static str, a: &Matrix, b: &Matrix) -> CalcResult<()> {
    if a.shape() != b.shape() {
        return Err(CalcError::Dimension {
            operation,
            left: a.shape(),
            right: b.shape(),
        });
    }
    Ok(())
}

fn require_square(operation: &str, a: &Matrix) -> CalcResult<()> {
    if !a.is_square() {
        let (rows, cols) = a.shape();
        return Err(CalcError::SingularMatrix(format!(
            "{operation} requires a square matrix, got {rows}x{cols}"
        )));
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    fn m(rows: &[&[f64]]) -> Matrix {
        Matrix::from_rows(rows.iter().map(|r| r.to_vec()).collect()).expect("valid matrix")
    }

    fn assert_close(actual: &Matrix, expected: &Matrix) {
        assert_eq!(actual.shape(), expected.shape());
        for (a, e) in actual.rows().iter().flatten().zip(expected.rows().iter().flatten()) {
            assert!((a - e).abs() < 1e-10, "{actual:?} != {expected:?}");
        }
    }

    #[test]
    fn from_rows_rejects_ragged_and_empty_input() {
        assert!(Matrix::from_rows(vec![]).is_err());
        assert!(Matrix::from_rows(vec![vec![]]).is_err());
        assert!(Matrix::from_rows(vec![vec![1.0, 2.0], vec![3.0]]).is_err());
    }

    #[test]
    fn elementwise_operations_require_equal_shapes() {
        let a = m(&[&[1.0, 2.0], &[3.0, 4.0]]);
        let b = m(&[&[5.0, 6.0], &[7.0, 8.0]]);
        assert_eq!(add(&a, &b).expect("add"), m(&[&[6.0, 8.0], &[10.0, 12.0]]));
        assert_eq!(
            subtract(&a, &b).expect("subtract"),
            m(&[&[-4.0, -4.0], &[-4.0, -4.0]])
        );
        let c = m(&[&[1.0, 2.0, 3.0]]);
        assert!(matches!(add(&a, &c), Err(CalcError::Dimension { .. })));
    }

    #[test]
    fn multiply_checks_inner_dimension() {
        let a = m(&[&[1.0, 2.0, 3.0], &[4.0, 5.0, 6.0]]);
        let b = m(&[&[1.0, 0.0], &[0.0, 1.0]]);
        assert!(matches!(multiply(&a, &b), Err(CalcError::Dimension { .. })));

        let product = multiply(&b, &a).expect("2x2 * 2x3");
        assert_eq!(product, a);
    }

    #[test]
    fn transpose_swaps_shape() {
        let a = m(&[&[1.0, 2.0, 3.0]]);
        assert_eq!(transpose(&a), m(&[&[1.0], &[2.0], &[3.0]]));
    }

    #[test]
    fn determinant_and_inverse() {
        let a = m(&[&[1.0, 2.0], &[3.0, 4.0]]);
        assert!((determinant(&a).expect("det") + 2.0).abs() < 1e-12);
        assert_close(
            &inverse(&a).expect("inverse"),
            &m(&[&[-2.0, 1.0], &[1.5, -0.5]]),
        );
    }

    #[test]
    fn singular_and_non_square_matrices_are_rejected() {
        let singular = m(&[&[1.0, 2.0], &[2.0, 4.0]]);
        assert!(matches!(inverse(&singular), Err(CalcError::SingularMatrix(_))));

        let wide = m(&[&[1.0, 2.0, 3.0]]);
        assert!(matches!(determinant(&wide), Err(CalcError::SingularMatrix(_))));
        assert!(matches!(inverse(&wide), Err(CalcError::SingularMatrix(_))));
    }

    #[test]
    fn shape_edits_keep_a_one_by_one_floor() {
        let mut a = Matrix::zeros(1, 1);
        assert!(!a.remove_row(0));
        assert!(!a.remove_col(0));
        a.push_row();
        a.push_col();
        assert_eq!(a.shape(), (2, 2));
        assert!(a.remove_row(1));
        assert!(!a.remove_col(7));
        assert_eq!(a.shape(), (1, 2));
    }

    #[test]
    fn serde_round_trip_validates_rows() {
        let a = m(&[&[1.0, 2.0], &[3.0, 4.0]]);
        let rows: Vec<Vec<f64>> = a.clone().into();
        assert_eq!(Matrix::try_from(rows).expect("valid"), a);
        assert!(Matrix::try_from(vec![vec![1.0], vec![]]).is_err());
    }
}

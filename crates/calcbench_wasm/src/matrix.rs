//! Matrix workbench wrapper.

use crate::host::{js_error, to_js};
use calcbench_core::matrix::{MatrixOperation, MatrixWorkbench, ResultShape};
use wasm_bindgen::prelude::*;

#[wasm_bindgen]
pub struct WasmMatrixWorkbench {
    inner: MatrixWorkbench,
}

impl Default for WasmMatrixWorkbench {
    fn default() -> Self {
        Self::new()
    }
}

#[wasm_bindgen]
impl WasmMatrixWorkbench {
    #[wasm_bindgen(constructor)]
    pub fn new() -> WasmMatrixWorkbench {
        console_error_panic_hook::set_once();
        WasmMatrixWorkbench {
            inner: MatrixWorkbench::new(),
        }
    }

    pub fn matrix_count(&self) -> u32 {
        self.inner.len() as u32
    }

    /// `[rows, cols]` of a matrix, empty when the index is out of range.
    pub fn matrix_shape(&self, index: u32) -> Vec<u32> {
        self.inner
            .matrix(index as usize)
            .map(|m| vec![m.nrows() as u32, m.ncols() as u32])
            .unwrap_or_default()
    }

    /// Row-major cells of a matrix, empty when the index is out of range.
    pub fn matrix_cells(&self, index: u32) -> Vec<f64> {
        self.inner
            .matrix(index as usize)
            .map(|m| m.rows().iter().flatten().copied().collect())
            .unwrap_or_default()
    }

    pub fn labels(&self) -> Vec<String> {
        self.inner.labels()
    }

    pub fn selected(&self) -> Vec<u32> {
        let (a, b) = self.inner.selected();
        vec![a as u32, b as u32]
    }

    pub fn select_a(&mut self, index: u32) -> bool {
        self.inner.select_a(index as usize)
    }

    pub fn select_b(&mut self, index: u32) -> bool {
        self.inner.select_b(index as usize)
    }

    pub fn set_cell(&mut self, matrix: u32, row: u32, col: u32, value: f64) -> bool {
        self.inner
            .set_cell(matrix as usize, row as usize, col as usize, value)
    }

    pub fn set_cell_text(&mut self, matrix: u32, row: u32, col: u32, text: &str) -> bool {
        self.inner
            .set_cell_text(matrix as usize, row as usize, col as usize, text)
    }

    pub fn add_row(&mut self, matrix: u32) -> bool {
        self.inner.add_row(matrix as usize)
    }

    pub fn add_col(&mut self, matrix: u32) -> bool {
        self.inner.add_col(matrix as usize)
    }

    pub fn remove_row(&mut self, matrix: u32, row: u32) -> bool {
        self.inner.remove_row(matrix as usize, row as usize)
    }

    pub fn remove_col(&mut self, matrix: u32, col: u32) -> bool {
        self.inner.remove_col(matrix as usize, col as usize)
    }

    pub fn add_matrix(&mut self) -> u32 {
        self.inner.add_matrix() as u32
    }

    pub fn remove_matrix(&mut self, index: u32) -> bool {
        self.inner.remove_matrix(index as usize)
    }

    /// Runs a named operation (`add`, `det_a`, `inv_b`, …) and returns the result label.
    pub fn perform(&mut self, op: &str) -> Result<String, JsValue> {
        let op: MatrixOperation = op.parse().map_err(js_error)?;
        Ok(self.inner.perform(op).label.clone())
    }

    pub fn store_result(&mut self) -> Option<u32> {
        self.inner.store_result().map(|index| index as u32)
    }

    pub fn result_label(&self) -> String {
        self.inner.result().label.clone()
    }

    /// The result value when it is 1x1, so callers can render a plain number.
    pub fn result_scalar(&self) -> Option<f64> {
        match self.inner.result().shape() {
            ResultShape::Scalar(value) => Some(value),
            ResultShape::Grid(_) => None,
        }
    }

    pub fn result(&self) -> Result<JsValue, JsValue> {
        to_js(self.inner.result(), "matrix result")
    }

    pub fn snapshot(&self) -> Result<JsValue, JsValue> {
        to_js(&self.inner.snapshot(), "workbench state")
    }
}

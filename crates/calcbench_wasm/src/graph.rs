//! Plot sampling entry points.

use crate::host::{js_error, to_js};
use calcbench_core::graph;
use wasm_bindgen::prelude::*;

/// Samples `y = f(x)` over `[x_min, x_max]`; returns `{ x: [...], y: [...] }`.
#[wasm_bindgen]
pub fn sample_curve(expression: &str, x_min: f64, x_max: f64, samples: u32) -> Result<JsValue, JsValue> {
    let curve = graph::sample_curve(expression, x_min, x_max, samples as usize).map_err(js_error)?;
    to_js(&curve, "curve samples")
}

/// Samples `z = f(x, y)` on a square grid; returns `{ x: [...], y: [...], z: [...] }`.
#[wasm_bindgen]
pub fn sample_surface(expression: &str, min: f64, max: f64, step: f64) -> Result<JsValue, JsValue> {
    let surface = graph::sample_surface(expression, min, max, step).map_err(js_error)?;
    to_js(&surface, "surface samples")
}

#[cfg(all(test, target_arch = "wasm32"))]
mod tests {
    use super::{sample_curve, sample_surface};
    use wasm_bindgen_test::wasm_bindgen_test;

    #[wasm_bindgen_test]
    fn sample_curve_returns_points() {
        assert!(sample_curve("sin(x)", -10.0, 10.0, 500).is_ok());
    }

    #[wasm_bindgen_test]
    fn sample_surface_rejects_malformed_expression() {
        assert!(sample_surface("x +", -5.0, 5.0, 0.2).is_err());
    }
}

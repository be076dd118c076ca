//! Expression builder wrapper.

use crate::host::{clock, js_error, to_js};
use calcbench_core::calculator::{Calculator, CalculatorSettings};
use calcbench_core::keymap;
use serde_wasm_bindgen::from_value;
use wasm_bindgen::prelude::*;

#[wasm_bindgen]
pub struct WasmCalculator {
    inner: Calculator,
}

impl WasmCalculator {
    fn from_settings(settings: CalculatorSettings) -> WasmCalculator {
        WasmCalculator {
            inner: Calculator::new(settings).with_clock(clock),
        }
    }
}

impl Default for WasmCalculator {
    fn default() -> Self {
        Self::new()
    }
}

#[wasm_bindgen]
impl WasmCalculator {
    #[wasm_bindgen(constructor)]
    pub fn new() -> WasmCalculator {
        console_error_panic_hook::set_once();
        Self::from_settings(CalculatorSettings::default())
    }

    /// Builds a calculator from a `{ history_capacity, result_precision }` object.
    pub fn with_settings(settings: JsValue) -> Result<WasmCalculator, JsValue> {
        console_error_panic_hook::set_once();
        let settings: CalculatorSettings = from_value(settings).map_err(js_error)?;
        Ok(Self::from_settings(settings))
    }

    pub fn press_digit(&mut self, digit: &str) {
        self.inner.press_digit(digit);
    }

    /// Returns false when `op` is not a single operator character.
    pub fn press_operator(&mut self, op: &str) -> bool {
        let mut chars = op.chars();
        match (chars.next(), chars.next()) {
            (Some(c), None) if calcbench_core::calculator::OPERATORS.contains(&c) => {
                self.inner.press_operator(c);
                true
            }
            _ => false,
        }
    }

    pub fn insert_function(&mut self, name: &str) {
        self.inner.insert_function(name);
    }

    pub fn delete_last(&mut self) {
        self.inner.delete();
    }

    pub fn clear(&mut self) {
        self.inner.clear();
    }

    /// Evaluates and returns the new display text.
    pub fn evaluate(&mut self) -> String {
        self.inner.evaluate();
        self.inner.display_text().to_string()
    }

    /// Feeds a `KeyboardEvent.key`. Returns false for unbound keys.
    pub fn handle_key(&mut self, key: &str) -> bool {
        match keymap::dispatch(key) {
            Some(token) => {
                self.inner.press(token);
                true
            }
            None => false,
        }
    }

    pub fn recall(&mut self, index: u32) -> bool {
        self.inner.recall(index as usize)
    }

    pub fn clear_history(&mut self) {
        self.inner.clear_history();
    }

    pub fn expression(&self) -> String {
        self.inner.expression_text().to_string()
    }

    pub fn display(&self) -> String {
        self.inner.display_text().to_string()
    }

    pub fn history_len(&self) -> u32 {
        self.inner.history().len() as u32
    }

    pub fn snapshot(&self) -> Result<JsValue, JsValue> {
        to_js(&self.inner.snapshot(), "calculator state")
    }
}


#[cfg(all(test, target_arch = "wasm32"))]
mod wasm_tests {
    use super::WasmCalculator;
    use serde_wasm_bindgen::to_value;
    use wasm_bindgen_test::wasm_bindgen_test;

    #[wasm_bindgen_test]
    fn snapshot_serializes() {
        let calc = WasmCalculator::new();
        assert!(calc.snapshot().is_ok());
    }

    #[wasm_bindgen_test]
    fn settings_object_bounds_history() {
        let settings = calcbench_core::CalculatorSettings {
            history_capacity: 1,
            result_precision: 10,
        };
        let mut calc =
            WasmCalculator::with_settings(to_value(&settings).expect("settings")).expect("calc");
        for digit in ["1", "2"] {
            calc.clear();
            calc.press_digit(digit);
            calc.evaluate();
        }
        assert_eq!(calc.history_len(), 1);
    }
}

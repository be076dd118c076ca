//! Unit converter wrapper.

use crate::host::{js_error, to_js};
use calcbench_core::conversion::{ConversionSettings, UnitConverter};
use serde_wasm_bindgen::from_value;
use wasm_bindgen::prelude::*;

#[wasm_bindgen]
pub struct WasmUnitConverter {
    inner: UnitConverter,
}

impl Default for WasmUnitConverter {
    fn default() -> Self {
        Self::new()
    }
}

#[wasm_bindgen]
impl WasmUnitConverter {
    #[wasm_bindgen(constructor)]
    pub fn new() -> WasmUnitConverter {
        console_error_panic_hook::set_once();
        WasmUnitConverter {
            inner: UnitConverter::default(),
        }
    }

    /// Builds a converter from a `{ linear_decimals, temperature_decimals }` object.
    pub fn with_settings(settings: JsValue) -> Result<WasmUnitConverter, JsValue> {
        console_error_panic_hook::set_once();
        let settings: ConversionSettings = from_value(settings).map_err(js_error)?;
        Ok(WasmUnitConverter {
            inner: UnitConverter::new(settings),
        })
    }

    pub fn category_names(&self) -> Vec<String> {
        self.inner.catalog().iter().map(|c| c.name.clone()).collect()
    }

    pub fn unit_names(&self) -> Vec<String> {
        self.inner
            .category()
            .units
            .iter()
            .map(|u| u.name.clone())
            .collect()
    }

    pub fn select_category(&mut self, name: &str) -> Result<(), JsValue> {
        self.inner.select_category(name).map_err(js_error)
    }

    pub fn set_from_unit(&mut self, name: &str) -> Result<(), JsValue> {
        self.inner.set_from_unit(name).map_err(js_error)
    }

    pub fn set_to_unit(&mut self, name: &str) -> Result<(), JsValue> {
        self.inner.set_to_unit(name).map_err(js_error)
    }

    /// Sets the input text and returns the recomputed result.
    pub fn set_input(&mut self, input: &str) -> String {
        self.inner.set_input(input);
        self.inner.result().to_string()
    }

    pub fn swap_units(&mut self) {
        self.inner.swap_units();
    }

    pub fn category(&self) -> String {
        self.inner.category().name.clone()
    }

    pub fn from_unit(&self) -> String {
        self.inner.from_unit().name.clone()
    }

    pub fn to_unit(&self) -> String {
        self.inner.to_unit().name.clone()
    }

    pub fn result(&self) -> String {
        self.inner.result().to_string()
    }

    pub fn catalog(&self) -> Result<JsValue, JsValue> {
        to_js(&self.inner.catalog(), "conversion catalog")
    }

    pub fn snapshot(&self) -> Result<JsValue, JsValue> {
        to_js(&self.inner.snapshot(), "conversion state")
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn converts_through_the_bridge() {
        let mut conv = WasmUnitConverter::new();
        assert_eq!(conv.set_input("1000"), "1.000000");

        conv.select_category("Temperature").expect("temperature");
        assert_eq!(conv.from_unit(), "Celsius");
        assert_eq!(conv.to_unit(), "Fahrenheit");
        assert_eq!(conv.set_input("100"), "212.0000");

        conv.swap_units();
        assert_eq!(conv.set_input("32"), "0.0000");
    }

    #[test]
    fn lists_categories_and_units() {
        let conv = WasmUnitConverter::new();
        assert_eq!(conv.category_names().len(), 8);
        assert_eq!(conv.unit_names()[0], "Meter");
        assert_eq!(conv.category(), "Length");
    }

    #[test]
    fn invalid_input_is_reported_as_text() {
        let mut conv = WasmUnitConverter::new();
        assert_eq!(conv.set_input("abc"), "Invalid input");
        assert_eq!(conv.result(), "Invalid input");
    }
}

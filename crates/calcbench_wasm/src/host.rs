//! Host glue shared by the wrappers.

use serde::Serialize;
use serde_wasm_bindgen::to_value;
use wasm_bindgen::prelude::*;

/// Timestamp source for history entries.
#[cfg(target_arch = "wasm32")]
pub(crate) fn clock() -> u64 {
    js_sys::Date::now() as u64
}

#[cfg(not(target_arch = "wasm32"))]
pub(crate) fn clock() -> u64 {
    calcbench_core::calculator::system_clock()
}

pub(crate) fn to_js<T: Serialize>(value: &T, what: &str) -> Result<JsValue, JsValue> {
    to_value(value).map_err(|e| JsValue::from_str(&format!("Failed to serialize {what}: {e}")))
}

pub(crate) fn js_error(err: impl std::fmt::Display) -> JsValue {
    JsValue::from_str(&err.to_string())
}

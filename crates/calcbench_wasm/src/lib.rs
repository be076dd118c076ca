//! WASM bindings for the Calcbench engine.
//!
//! Each engine component gets its own wrapper type so the front end can
//! hold them independently, mirroring how the core keeps them uncoupled.

mod calculator;
mod conversion;
mod graph;
mod host;
mod matrix;

pub use calculator::WasmCalculator;
pub use conversion::WasmUnitConverter;
pub use graph::{sample_curve, sample_surface};
pub use matrix::WasmMatrixWorkbench;

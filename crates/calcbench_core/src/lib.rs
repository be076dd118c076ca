pub mod calculator;
pub mod conversion;
pub mod equation_engine;
pub mod error;
pub mod format;
pub mod graph;
pub mod history;
pub mod keymap;
pub mod linalg;
pub mod matrix;
/// The `calcbench_core` crate is the computation engine behind the Calcbench UI.
/// Every operation is synchronous and driven by a single input event; state is
/// owned by the component that mutates it.
///
/// Key components:
/// - **Traits**: `Scalar` (numeric type abstraction), `Evaluator` (expression evaluation contract).
/// - **Equation Engine**: Parser and bytecode VM for calculator and graph expressions.
/// - **Calculator**: Keystroke-driven expression builder with a bounded history log.
/// - **Matrix Workbench**: Editable matrix collection with operand selection, backed by `nalgebra`.
/// - **Conversion**: Unit catalog and the reactive conversion request.
pub mod traits;

pub use calculator::{Calculator, CalculatorSettings, ExpressionState, InputToken};
pub use conversion::{ConversionSettings, UnitConverter};
pub use error::{CalcError, CalcResult};
pub use matrix::{MatrixOperation, MatrixWorkbench};

//! Keystroke-driven expression builder.
//!
//! The builder owns the text the user is composing and turns discrete
//! inputs (digits, operators, function inserts, delete, clear, evaluate)
//! into the next state. Successful evaluations are appended to the
//! history log; failures collapse into the `Error` state.

use crate::equation_engine::ExpressionEvaluator;
use crate::history::{HistoryEntry, HistoryLog, DEFAULT_HISTORY_CAPACITY};
use crate::traits::Evaluator;
use serde::{Deserialize, Serialize};
use std::time::{SystemTime, UNIX_EPOCH};
use tracing::{debug, trace};

pub const ERROR_DISPLAY: &str = "Error";
const EMPTY_DISPLAY: &str = "0";

/// Characters after which another operator press is ignored.
const TRAILING_OPERATORS: &[char] = &['+', '-', '*', '/', '%', '^', '(', '×', '÷'];

/// Operator keys accepted by `press_operator`.
pub const OPERATORS: &[char] = &['+', '-', '*', '/', '%', '^', '(', ')', '×', '÷'];

#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct CalculatorSettings {
    pub history_capacity: usize,
    /// Significant digits kept when a result is formatted.
    pub result_precision: usize,
}

impl Default for CalculatorSettings {
    fn default() -> Self {
        Self {
            history_capacity: DEFAULT_HISTORY_CAPACITY,
            result_precision: 10,
        }
    }
}

/// Where the builder currently is.
///
/// The expression text and the display text are both derived from this
/// value, so they cannot drift apart.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum ExpressionState {
    /// Composing. An empty text displays as "0".
    Editing { text: String },
    /// Showing a formatted result that is also the live expression.
    JustEvaluated { text: String },
    /// The last evaluation failed.
    Error,
}

impl ExpressionState {
    fn empty() -> Self {
        Self::Editing {
            text: String::new(),
        }
    }

    pub fn expression_text(&self) -> &str {
        match self {
            Self::Editing { text } | Self::JustEvaluated { text } => text,
            Self::Error => "",
        }
    }

    pub fn display_text(&self) -> &str {
        match self {
            Self::Editing { text } if text.is_empty() => EMPTY_DISPLAY,
            Self::Editing { text } | Self::JustEvaluated { text } => text,
            Self::Error => ERROR_DISPLAY,
        }
    }

    /// True when the next digit starts a new expression.
    pub fn is_fresh(&self) -> bool {
        match self {
            Self::Editing { text } => text.is_empty(),
            Self::JustEvaluated { .. } | Self::Error => true,
        }
    }
}

/// One discrete input to the builder.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum InputToken {
    /// A digit, the decimal point, or a constant such as `pi`.
    Digit(String),
    Operator(char),
    Function(String),
    Delete,
    Clear,
    Evaluate,
}

#[derive(Debug, Clone, Serialize)]
pub struct CalculatorSnapshot {
    pub expression: String,
    pub display: String,
    pub history: Vec<HistoryEntry>,
}

/// Milliseconds since the Unix epoch from the OS clock.
pub fn system_clock() -> u64 {
    SystemTime::now()
        .duration_since(UNIX_EPOCH)
        .map(|elapsed| elapsed.as_millis() as u64)
        .unwrap_or(0)
}

#[derive(Debug, Clone)]
pub struct Calculator<E: Evaluator = ExpressionEvaluator> {
    state: ExpressionState,
    history: HistoryLog,
    evaluator: E,
    settings: CalculatorSettings,
    clock: fn() -> u64,
}

impl Default for Calculator<ExpressionEvaluator> {
    fn default() -> Self {
        Self::new(CalculatorSettings::default())
    }
}

impl Calculator<ExpressionEvaluator> {
    pub fn new(settings: CalculatorSettings) -> Self {
        Self::with_evaluator(ExpressionEvaluator, settings)
    }
}

impl<E: Evaluator> Calculator<E> {
    pub fn with_evaluator(evaluator: E, settings: CalculatorSettings) -> Self {
        Self {
            state: ExpressionState::empty(),
            history: HistoryLog::new(settings.history_capacity),
            evaluator,
            settings,
            clock: system_clock,
        }
    }

    /// Replaces the timestamp source (hosts without an OS clock supply their own).
    pub fn with_clock(mut self, clock: fn() -> u64) -> Self {
        self.clock = clock;
        self
    }

    pub fn state(&self) -> &ExpressionState {
        &self.state
    }

    pub fn expression_text(&self) -> &str {
        self.state.expression_text()
    }

    pub fn display_text(&self) -> &str {
        self.state.display_text()
    }

    pub fn history(&self) -> &HistoryLog {
        &self.history
    }

    pub fn settings(&self) -> &CalculatorSettings {
        &self.settings
    }

    pub fn press(&mut self, token: InputToken) {
        match token {
            InputToken::Digit(digit) => self.press_digit(&digit),
            InputToken::Operator(op) => self.press_operator(op),
            InputToken::Function(name) => self.insert_function(&name),
            InputToken::Delete => self.delete(),
            InputToken::Clear => self.clear(),
            InputToken::Evaluate => self.evaluate(),
        }
    }

    pub fn press_digit(&mut self, digit: &str) {
        let text = if self.state.is_fresh() {
            digit.to_string()
        } else {
            format!("{}{digit}", self.state.expression_text())
        };
        self.transition(ExpressionState::Editing { text });
    }

    pub fn press_operator(&mut self, op: char) {
        let next = match &self.state {
            ExpressionState::JustEvaluated { text } => format!("{text}{op}"),
            ExpressionState::Error => return,
            ExpressionState::Editing { text } => match text.chars().last() {
                None => return,
                Some(last) if TRAILING_OPERATORS.contains(&last) => return,
                Some(_) => format!("{text}{op}"),
            },
        };
        self.transition(ExpressionState::Editing { text: next });
    }

    /// Appends `name(`, opening a grouped sub-expression.
    pub fn insert_function(&mut self, name: &str) {
        let text = format!("{}{name}(", self.state.expression_text());
        self.transition(ExpressionState::Editing { text });
    }

    pub fn delete(&mut self) {
        let mut text = self.state.expression_text().to_string();
        text.pop();
        self.transition(ExpressionState::Editing { text });
    }

    pub fn clear(&mut self) {
        self.transition(ExpressionState::empty());
    }

    pub fn evaluate(&mut self) {
        let source = match self.state.expression_text() {
            "" => self.state.display_text().to_string(),
            text => text.to_string(),
        };
        if source.trim().is_empty() {
            return;
        }
        let parser_ready = source.replace('÷', "/").replace('×', "*");

        match self.evaluator.evaluate(&parser_ready) {
            Ok(value) => {
                let result = self
                    .evaluator
                    .format(value, self.settings.result_precision);
                self.history.record(HistoryEntry {
                    expression: source,
                    result: result.clone(),
                    timestamp_ms: (self.clock)(),
                });
                self.transition(ExpressionState::JustEvaluated { text: result });
            }
            Err(err) => {
                debug!(expression = %source, error = %err, "evaluation failed");
                self.transition(ExpressionState::Error);
            }
        }
    }

    /// Continues from a past result. Returns false if `index` is out of range.
    pub fn recall(&mut self, index: usize) -> bool {
        let Some(entry) = self.history.get(index) else {
            return false;
        };
        let text = entry.result.clone();
        self.transition(ExpressionState::JustEvaluated { text });
        true
    }

    pub fn clear_history(&mut self) {
        self.history.clear();
    }

    pub fn snapshot(&self) -> CalculatorSnapshot {
        CalculatorSnapshot {
            expression: self.expression_text().to_string(),
            display: self.display_text().to_string(),
            history: self.history.entries().to_vec(),
        }
    }

    fn transition(&mut self, next: ExpressionState) {
        trace!(from = ?self.state, to = ?next, "expression state");
        self.state = next;
    }
}

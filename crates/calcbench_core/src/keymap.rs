//! Keyboard bindings for the expression builder.
//!
//! A pure lookup from a key name (as reported by a browser `KeyboardEvent.key`)
//! to an input token; it holds no state of its own.

use crate::calculator::{InputToken, OPERATORS};

/// Single-letter shortcuts that insert a function.
pub const FUNCTION_KEYS: &[(char, &str)] = &[
    ('s', "sin"),
    ('o', "cos"),
    ('t', "tan"),
    ('l', "log"),
    ('e', "exp"),
    ('r', "sqrt"),
];

pub fn dispatch(key: &str) -> Option<InputToken> {
    match key {
        "Enter" | "=" => return Some(InputToken::Evaluate),
        "Backspace" | "c" | "C" => return Some(InputToken::Delete),
        "Escape" => return Some(InputToken::Clear),
        _ => {}
    }

    let mut chars = key.chars();
    let (Some(c), None) = (chars.next(), chars.next()) else {
        return None;
    };

    if c.is_ascii_digit() || c == '.' {
        return Some(InputToken::Digit(c.to_string()));
    }
    if OPERATORS.contains(&c) {
        return Some(InputToken::Operator(c));
    }
    FUNCTION_KEYS
        .iter()
        .find(|(shortcut, _)| *shortcut == c)
        .map(|(_, name)| InputToken::Function((*name).to_string()))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn maps_digits_and_operators() {
        assert_eq!(dispatch("7"), Some(InputToken::Digit("7".to_string())));
        assert_eq!(dispatch("."), Some(InputToken::Digit(".".to_string())));
        assert_eq!(dispatch("^"), Some(InputToken::Operator('^')));
        assert_eq!(dispatch("("), Some(InputToken::Operator('(')));
    }

    #[test]
    fn maps_control_keys() {
        assert_eq!(dispatch("Enter"), Some(InputToken::Evaluate));
        assert_eq!(dispatch("Backspace"), Some(InputToken::Delete));
        assert_eq!(dispatch("C"), Some(InputToken::Delete));
        assert_eq!(dispatch("c"), Some(InputToken::Delete));
        assert_eq!(dispatch("Escape"), Some(InputToken::Clear));
    }

    #[test]
    fn maps_function_shortcuts() {
        assert_eq!(dispatch("s"), Some(InputToken::Function("sin".to_string())));
        assert_eq!(dispatch("r"), Some(InputToken::Function("sqrt".to_string())));
        assert_eq!(dispatch("e"), Some(InputToken::Function("exp".to_string())));
    }

    #[test]
    fn unmapped_keys_are_ignored() {
        assert_eq!(dispatch("q"), None);
        assert_eq!(dispatch("Shift"), None);
        assert_eq!(dispatch(""), None);
    }
}

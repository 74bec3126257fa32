//! Runtime values for the interpreter

use super::alphabet;
use serde::Serialize;
use std::fmt;

/// How a variable's value should be read
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum VarKind {
    /// Never declared, or declared with an unknown kind code
    #[default]
    Unset,
    /// `text` is authoritative
    Text,
    /// `number` is authoritative
    Number,
}

/// A program variable.
///
/// Both representations are always kept so either can be read; `kind`
/// selects which one is the variable's value.
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct Variable {
    pub id: u8,
    pub kind: VarKind,
    /// Number of digits (or groups, for text) used to build the value
    pub size: usize,
    pub text: String,
    pub number: f64,
}

impl Variable {
    pub fn text(id: u8, text: impl Into<String>) -> Self {
        let text = text.into();
        Variable {
            id,
            kind: VarKind::Text,
            size: text.chars().count(),
            text,
            number: 0.0,
        }
    }

    pub fn number(id: u8, number: f64) -> Self {
        let text = render_number(number);
        Variable {
            id,
            kind: VarKind::Number,
            size: text.len(),
            text,
            number,
        }
    }

    /// The value as printed by a Print instruction.
    pub fn display_value(&self) -> String {
        match self.kind {
            VarKind::Text => self.text.clone(),
            VarKind::Number => render_number(self.number),
            VarKind::Unset => String::new(),
        }
    }
}

impl fmt::Display for Variable {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self.kind {
            VarKind::Text => write!(f, "[{}] {:?}", self.id, self.text),
            VarKind::Number => write!(f, "[{}] {}", self.id, render_number(self.number)),
            VarKind::Unset => write!(f, "[{}] <unset>", self.id),
        }
    }
}

/// A decoded Modify or Condition operand, readable as text or as a number.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Operand {
    pub text: String,
    pub number: f64,
}

impl Operand {
    /// Interpret an accumulated digit buffer both ways.
    pub fn from_digits(digits: &str, window: usize) -> Self {
        Operand {
            text: alphabet::to_text(digits, window),
            number: parse_number(digits),
        }
    }

    /// Substitute a variable's current value for a literal operand.
    pub fn from_variable(var: &Variable) -> Self {
        Operand {
            text: var.text.clone(),
            number: var.number,
        }
    }
}

/// Parse a run of digits as a number, falling back to 0.
pub fn parse_number(digits: &str) -> f64 {
    if digits.is_empty() || !digits.bytes().all(|b| b.is_ascii_digit() || b == b'.') {
        return 0.0;
    }
    digits.parse::<f64>().unwrap_or(0.0)
}

/// Parse a fixed-point literal: the first digit is how many of the remaining
/// digits come before the decimal point.
pub fn parse_fixed_point(digits: &str) -> f64 {
    let Some((lead, rest)) = digits.split_at_checked(1) else {
        return 0.0;
    };
    let point = lead.parse::<usize>().unwrap_or(0);
    if point >= rest.len() {
        return parse_number(rest);
    }
    let (whole, frac) = rest.split_at(point);
    let whole = if whole.is_empty() { "0" } else { whole };
    parse_number(&format!("{whole}.{frac}"))
}

/// Shortest decimal rendering: whole numbers print without a fraction.
pub fn render_number(n: f64) -> String {
    if n == 0.0 {
        // Avoid "-0"
        return "0".to_string();
    }
    format!("{n}")
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_display_value() {
        assert_eq!(Variable::number(1, 42.0).display_value(), "42");
        assert_eq!(Variable::number(1, 2.5).display_value(), "2.5");
        assert_eq!(Variable::text(1, "hi").display_value(), "hi");
        assert_eq!(Variable::default().display_value(), "");
    }

    #[test]
    fn test_parse_number_fallback() {
        assert_eq!(parse_number("100"), 100.0);
        assert_eq!(parse_number("007"), 7.0);
        assert_eq!(parse_number(""), 0.0);
        assert_eq!(parse_number("1a"), 0.0);
    }

    #[test]
    fn test_parse_fixed_point() {
        assert_eq!(parse_fixed_point("1314"), 3.14);
        assert_eq!(parse_fixed_point("3314159"), 314.159);
        assert_eq!(parse_fixed_point("025"), 0.25);
        // Point past the end: no fraction
        assert_eq!(parse_fixed_point("942"), 42.0);
        assert_eq!(parse_fixed_point(""), 0.0);
    }

    #[test]
    fn test_render_number() {
        assert_eq!(render_number(100.0), "100");
        assert_eq!(render_number(-0.0), "0");
        assert_eq!(render_number(-3.5), "-3.5");
    }

    #[test]
    fn test_operand_both_views() {
        let op = Operand::from_digits("89", 1);
        assert_eq!(op.text, "hi");
        assert_eq!(op.number, 89.0);
    }

    #[test]
    fn test_variable_display() {
        assert_eq!(format!("{}", Variable::text(3, "ab")), "[3] \"ab\"");
        assert_eq!(format!("{}", Variable::number(4, 7.0)), "[4] 7");
    }
}

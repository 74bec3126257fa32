//! Comparison and modifier function tables
//!
//! Both tables map a decoded integer to a plain function over a variable and
//! an operand. The variable's kind decides whether the text or the numeric
//! view of the operand is used.

use super::value::{Operand, VarKind, Variable};

/// Longest text a repeat may produce, in bytes
pub const MAX_TEXT_LEN: usize = 1 << 24;

/// Compares a variable against an operand
pub type ComparisonFn = fn(&Variable, &Operand) -> bool;

/// Mutates a variable in place using an operand
pub type ModifierFn = fn(&mut Variable, &Operand);

/// Look up a comparison by code.
pub fn comparison(code: u64) -> Option<ComparisonFn> {
    match code {
        1 => Some(equal_to),
        2 => Some(less_than),
        3 => Some(greater_than),
        4 => Some(is_divisible),
        _ => None,
    }
}

/// Look up a modifier by code.
pub fn modifier(code: u64) -> Option<ModifierFn> {
    match code {
        1 => Some(add),
        2 => Some(subtract),
        3 => Some(multiply),
        4 => Some(divide),
        5 => Some(power),
        6 => Some(set),
        _ => None,
    }
}

/// Text or numeric equality.
pub fn equal_to(var: &Variable, operand: &Operand) -> bool {
    match var.kind {
        VarKind::Text => var.text == operand.text,
        VarKind::Number => var.number == operand.number,
        VarKind::Unset => false,
    }
}

/// Text length, or numeric value, below the operand.
pub fn less_than(var: &Variable, operand: &Operand) -> bool {
    match var.kind {
        VarKind::Text => (var.text.chars().count() as f64) < operand.number,
        VarKind::Number => var.number < operand.number,
        VarKind::Unset => false,
    }
}

/// Text length, or numeric value, above the operand.
pub fn greater_than(var: &Variable, operand: &Operand) -> bool {
    match var.kind {
        VarKind::Text => (var.text.chars().count() as f64) > operand.number,
        VarKind::Number => var.number > operand.number,
        VarKind::Unset => false,
    }
}

/// Numeric divisibility. Text has no notion of it and always passes.
pub fn is_divisible(var: &Variable, operand: &Operand) -> bool {
    match var.kind {
        VarKind::Text => true,
        VarKind::Number => modulo(var.number, operand.number) == 0.0,
        VarKind::Unset => false,
    }
}

/// Text: append. Number: sum.
pub fn add(var: &mut Variable, operand: &Operand) {
    match var.kind {
        VarKind::Text => var.text.push_str(&operand.text),
        _ => var.number += operand.number,
    }
}

/// Text: drop that many characters off the end. Number: difference.
pub fn subtract(var: &mut Variable, operand: &Operand) {
    match var.kind {
        VarKind::Text => {
            let keep = var.text.chars().count().saturating_sub(count(operand.number));
            var.text = var.text.chars().take(keep).collect();
        }
        _ => var.number -= operand.number,
    }
}

/// Text: repeat. Number: product.
///
/// A repeat that would grow past [`MAX_TEXT_LEN`] leaves the text unchanged.
pub fn multiply(var: &mut Variable, operand: &Operand) {
    match var.kind {
        VarKind::Text => {
            let times = count(operand.number);
            let fits = var.text.len().checked_mul(times).is_some_and(|len| len <= MAX_TEXT_LEN);
            if fits {
                var.text = var.text.repeat(times);
            }
        }
        _ => var.number *= operand.number,
    }
}

/// Text: remove every occurrence of the operand. Number: quotient, with
/// division by zero giving zero.
pub fn divide(var: &mut Variable, operand: &Operand) {
    match var.kind {
        VarKind::Text => {
            if !operand.text.is_empty() {
                var.text = var.text.replace(&operand.text, "");
            }
        }
        _ => {
            var.number = if operand.number == 0.0 {
                0.0
            } else {
                var.number / operand.number
            };
        }
    }
}

/// Text: unchanged. Number: raised to the operand.
pub fn power(var: &mut Variable, operand: &Operand) {
    if var.kind != VarKind::Text {
        var.number = var.number.powf(operand.number);
    }
}

/// Overwrite with the operand.
pub fn set(var: &mut Variable, operand: &Operand) {
    match var.kind {
        VarKind::Text => var.text = operand.text.clone(),
        _ => var.number = operand.number,
    }
}

/// Modulus with a zero divisor giving zero.
fn modulo(a: f64, b: f64) -> f64 {
    if b == 0.0 { 0.0 } else { a % b }
}

/// A numeric operand used as a repeat/trim count.
fn count(n: f64) -> usize {
    if n.is_finite() && n > 0.0 {
        n.floor() as usize
    } else {
        0
    }
}

//! Instruction records and the generic record decoder
//!
//! Every instruction starts with a fixed list of scalar fields, one
//! `window`-wide group each. The decoder only knows about field tags; the
//! records differ purely in their field lists and in what their handler does
//! afterwards.

use super::stream::DigitStream;
use tracing::debug;

/// Instruction selected by an opcode group
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Opcode {
    Print,
    Create,
    Modify,
    Condition,
    SetContext,
    /// Aborts the whole program
    Continue,
}

impl Opcode {
    pub fn from_value(value: u64) -> Option<Self> {
        match value {
            9 => Some(Opcode::Print),
            8 => Some(Opcode::Create),
            7 => Some(Opcode::Modify),
            6 => Some(Opcode::Condition),
            5 => Some(Opcode::SetContext),
            4 => Some(Opcode::Continue),
            _ => None,
        }
    }
}

/// Semantic type of a record field
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FieldKind {
    Uint,
    /// Nonzero means true
    Bool,
}

/// A named field in a record's declared order
#[derive(Debug, Clone, Copy)]
pub struct Field {
    pub name: &'static str,
    pub kind: FieldKind,
}

const fn uint(name: &'static str) -> Field {
    Field {
        name,
        kind: FieldKind::Uint,
    }
}

const fn flag(name: &'static str) -> Field {
    Field {
        name,
        kind: FieldKind::Bool,
    }
}

/// A decoded field value
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FieldValue {
    Uint(u64),
    Bool(bool),
}

impl FieldValue {
    pub fn as_uint(self) -> u64 {
        match self {
            FieldValue::Uint(n) => n,
            FieldValue::Bool(b) => u64::from(b),
        }
    }

    pub fn as_bool(self) -> bool {
        match self {
            FieldValue::Uint(n) => n != 0,
            FieldValue::Bool(b) => b,
        }
    }
}

/// Decode one group per field, in order.
///
/// Returns `None` if the stream runs out before the last field.
pub fn decode_fields<'a>(
    fields: &[Field],
    stream: DigitStream<'a>,
    window: usize,
    record: &str,
    trace: bool,
) -> Option<(Vec<FieldValue>, DigitStream<'a>)> {
    let mut values = Vec::with_capacity(fields.len());
    let mut rest = stream;
    for field in fields {
        let (group, tail) = rest.take_group(window)?;
        let raw = group.value();
        let value = match field.kind {
            FieldKind::Uint => FieldValue::Uint(raw),
            FieldKind::Bool => FieldValue::Bool(raw != 0),
        };
        if trace {
            debug!(offset = group.offset(), "{record}.{}: [{group}]{tail}", field.name);
        }
        values.push(value);
        rest = tail;
    }
    Some((values, rest))
}

/// A record with a fixed field list
pub trait Record: Sized {
    const NAME: &'static str;
    const FIELDS: &'static [Field];

    /// Build from exactly `FIELDS.len()` values.
    fn from_values(values: &[FieldValue]) -> Self;

    fn decode<'a>(
        stream: DigitStream<'a>,
        window: usize,
        trace: bool,
    ) -> Option<(Self, DigitStream<'a>)> {
        let (values, rest) = decode_fields(Self::FIELDS, stream, window, Self::NAME, trace)?;
        Some((Self::from_values(&values), rest))
    }
}

/// Variable IDs are 8 bits wide; wider groups wrap.
pub fn var_id(value: u64) -> u8 {
    (value % 256) as u8
}

fn size(value: u64) -> usize {
    usize::try_from(value).unwrap_or(usize::MAX)
}

/// Print { kind, size }
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct PrintRecord {
    /// 1 = text, 2 = variable
    pub kind: u64,
    pub size: usize,
}

impl PrintRecord {
    pub const TEXT: u64 = 1;
    pub const VARIABLE: u64 = 2;
}

impl Record for PrintRecord {
    const NAME: &'static str = "Print";
    const FIELDS: &'static [Field] = &[uint("kind"), uint("size")];

    fn from_values(values: &[FieldValue]) -> Self {
        PrintRecord {
            kind: values[0].as_uint(),
            size: size(values[1].as_uint()),
        }
    }
}

/// Declared kind of a new variable
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DeclaredKind {
    Text,
    Number,
    /// Number whose first digit places the decimal point
    FixedPoint,
    /// Value copy of another variable
    Alias,
    Other(u64),
}

impl DeclaredKind {
    pub fn from_value(value: u64) -> Self {
        match value {
            1 => DeclaredKind::Text,
            2 => DeclaredKind::Number,
            3 => DeclaredKind::FixedPoint,
            9 => DeclaredKind::Alias,
            other => DeclaredKind::Other(other),
        }
    }
}

/// CreateVariable { id, kind, size }
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct CreateRecord {
    pub id: u8,
    pub kind: DeclaredKind,
    pub size: usize,
}

impl Record for CreateRecord {
    const NAME: &'static str = "Create";
    const FIELDS: &'static [Field] = &[uint("id"), uint("kind"), uint("size")];

    fn from_values(values: &[FieldValue]) -> Self {
        CreateRecord {
            id: var_id(values[0].as_uint()),
            kind: DeclaredKind::from_value(values[1].as_uint()),
            size: size(values[2].as_uint()),
        }
    }
}

/// Modify { target, op, is_ref, size }
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ModifyRecord {
    pub target: u8,
    pub op: u64,
    pub operand_is_ref: bool,
    pub size: usize,
}

impl Record for ModifyRecord {
    const NAME: &'static str = "Modify";
    const FIELDS: &'static [Field] =
        &[uint("target"), uint("op"), flag("is_ref"), uint("size")];

    fn from_values(values: &[FieldValue]) -> Self {
        ModifyRecord {
            target: var_id(values[0].as_uint()),
            op: values[1].as_uint(),
            operand_is_ref: values[2].as_bool(),
            size: size(values[3].as_uint()),
        }
    }
}

/// Condition { target, comparison, is_loop, size }
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ConditionRecord {
    pub target: u8,
    pub comparison: u64,
    pub is_loop: bool,
    pub size: usize,
}

impl Record for ConditionRecord {
    const NAME: &'static str = "Condition";
    const FIELDS: &'static [Field] = &[
        uint("target"),
        uint("comparison"),
        flag("is_loop"),
        uint("size"),
    ];

    fn from_values(values: &[FieldValue]) -> Self {
        ConditionRecord {
            target: var_id(values[0].as_uint()),
            comparison: values[1].as_uint(),
            is_loop: values[2].as_bool(),
            size: size(values[3].as_uint()),
        }
    }
}

/// SetContext { window, debug }
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ContextRecord {
    pub window: usize,
    pub debug: bool,
}

impl Record for ContextRecord {
    const NAME: &'static str = "Context";
    const FIELDS: &'static [Field] = &[uint("window"), flag("debug")];

    fn from_values(values: &[FieldValue]) -> Self {
        ContextRecord {
            window: size(values[0].as_uint()),
            debug: values[1].as_bool(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_opcode_table() {
        assert_eq!(Opcode::from_value(9), Some(Opcode::Print));
        assert_eq!(Opcode::from_value(8), Some(Opcode::Create));
        assert_eq!(Opcode::from_value(7), Some(Opcode::Modify));
        assert_eq!(Opcode::from_value(6), Some(Opcode::Condition));
        assert_eq!(Opcode::from_value(5), Some(Opcode::SetContext));
        assert_eq!(Opcode::from_value(4), Some(Opcode::Continue));
        assert!(Opcode::from_value(0).is_none());
        assert!(Opcode::from_value(3).is_none());
        assert!(Opcode::from_value(10).is_none());
    }

    #[test]
    fn test_decode_leaves_extra_groups() {
        let (rec, rest) = CreateRecord::decode(DigitStream::new("1231009"), 1, false).unwrap();
        assert_eq!(
            rec,
            CreateRecord {
                id: 1,
                kind: DeclaredKind::Number,
                size: 3
            }
        );
        assert_eq!(rest.as_str(), "1009");
        assert_eq!(rest.offset(), 3);
    }

    #[test]
    fn test_decode_window_two() {
        let (rec, rest) = ModifyRecord::decode(DigitStream::new("0106050312"), 2, false).unwrap();
        assert_eq!(rec.target, 1);
        assert_eq!(rec.op, 6);
        assert!(rec.operand_is_ref);
        assert_eq!(rec.size, 3);
        assert_eq!(rest.as_str(), "12");
    }

    #[test]
    fn test_decode_short_stream() {
        assert!(ConditionRecord::decode(DigitStream::new("121"), 1, false).is_none());
    }

    #[test]
    fn test_bool_is_nonzero() {
        let (rec, _) = ContextRecord::decode(DigitStream::new("27"), 1, false).unwrap();
        assert_eq!(rec, ContextRecord { window: 2, debug: true });
    }

    #[test]
    fn test_var_id_wraps() {
        assert_eq!(var_id(255), 255);
        assert_eq!(var_id(256), 0);
        assert_eq!(var_id(999), 231);
    }

    #[test]
    fn test_declared_kind_codes() {
        assert_eq!(DeclaredKind::from_value(1), DeclaredKind::Text);
        assert_eq!(DeclaredKind::from_value(3), DeclaredKind::FixedPoint);
        assert_eq!(DeclaredKind::from_value(9), DeclaredKind::Alias);
        assert_eq!(DeclaredKind::from_value(5), DeclaredKind::Other(5));
    }
}

//! The dynamically-shaped output of a decode call.
//!
//! A [`Value`] tree structurally mirrors the [`TypeDescriptor`] tree it was
//! decoded against, is produced fresh per decode call, and is owned entirely
//! by the caller once returned.
//!
//! [`TypeDescriptor`]: crate::schema::TypeDescriptor

/// A record of named fields in wire order.
#[derive(Debug, Clone, PartialEq, Default)]
#[cfg_attr(feature = "serde", derive(serde::Serialize))]
pub struct Record {
    fields: Vec<(String, Value)>,
}

impl Record {
    pub fn new() -> Self {
        Self { fields: Vec::new() }
    }

    pub fn push(&mut self, name: impl Into<String>, value: Value) {
        self.fields.push((name.into(), value));
    }

    /// Looks up a field by name.
    pub fn get(&self, name: &str) -> Option<&Value> {
        self.fields
            .iter()
            .find(|(field, _)| field == name)
            .map(|(_, value)| value)
    }

    pub fn len(&self) -> usize {
        self.fields.len()
    }

    pub fn is_empty(&self) -> bool {
        self.fields.is_empty()
    }

    pub fn iter(&self) -> impl Iterator<Item = (&str, &Value)> {
        self.fields.iter().map(|(name, value)| (name.as_str(), value))
    }
}

impl FromIterator<(String, Value)> for Record {
    fn from_iter<I: IntoIterator<Item = (String, Value)>>(iter: I) -> Self {
        Self {
            fields: iter.into_iter().collect(),
        }
    }
}

/// A decoded value: primitives, ordered sequences, and keyed records.
#[derive(Debug, Clone, PartialEq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize))]
pub enum Value {
    /// Produced by the `Null` descriptor and by absent optionals.
    Null,
    Int(i64),
    Bool(bool),
    Real(f64),
    Blob(Vec<u8>),
    FourCc([u8; 4]),
    /// Packed-encoding bit array: one decoded flag per element.
    Flags(Vec<bool>),
    /// Tagged-encoding bit array: declared bit length plus the raw buffer,
    /// deferring flag extraction to the caller.
    BitBlob { len: usize, bytes: Vec<u8> },
    Array(Vec<Value>),
    Struct(Record),
    /// One active arm of a choice descriptor.
    Choice { name: String, value: Box<Value> },
}

impl Value {
    pub fn as_int(&self) -> Option<i64> {
        match self {
            Value::Int(v) => Some(*v),
            _ => None,
        }
    }

    pub fn as_bool(&self) -> Option<bool> {
        match self {
            Value::Bool(v) => Some(*v),
            _ => None,
        }
    }

    pub fn as_blob(&self) -> Option<&[u8]> {
        match self {
            Value::Blob(v) => Some(v),
            _ => None,
        }
    }

    pub fn as_array(&self) -> Option<&[Value]> {
        match self {
            Value::Array(v) => Some(v),
            _ => None,
        }
    }

    pub fn as_struct(&self) -> Option<&Record> {
        match self {
            Value::Struct(v) => Some(v),
            _ => None,
        }
    }

    /// Shorthand for struct field lookup.
    pub fn field(&self, name: &str) -> Option<&Value> {
        self.as_struct().and_then(|record| record.get(name))
    }

    pub fn is_null(&self) -> bool {
        matches!(self, Value::Null)
    }

    /// Extracts an integer from a delta-encoded game-loop value.
    ///
    /// The schema wraps the per-record time offset differently across
    /// protocol versions — a bare `Int`, or a single-armed choice/struct
    /// around one. This unwraps whichever shape arrived.
    pub fn game_loop_delta(&self) -> Option<i64> {
        match self {
            Value::Int(v) => Some(*v),
            Value::Choice { value, .. } => value.game_loop_delta(),
            Value::Struct(record) if record.len() == 1 => {
                record.iter().next().and_then(|(_, v)| v.game_loop_delta())
            }
            _ => None,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn record_lookup_preserves_wire_order() {
        let mut record = Record::new();
        record.push("b", Value::Int(2));
        record.push("a", Value::Int(1));
        assert_eq!(record.get("a"), Some(&Value::Int(1)));
        let names: Vec<_> = record.iter().map(|(name, _)| name).collect();
        assert_eq!(names, vec!["b", "a"]);
    }

    #[test]
    fn game_loop_delta_unwraps_choice_and_struct() {
        assert_eq!(Value::Int(12).game_loop_delta(), Some(12));

        let choice = Value::Choice {
            name: "six_bits".into(),
            value: Box::new(Value::Int(40)),
        };
        assert_eq!(choice.game_loop_delta(), Some(40));

        let mut record = Record::new();
        record.push("delta", Value::Int(7));
        assert_eq!(Value::Struct(record).game_loop_delta(), Some(7));

        // A multi-field struct is not a delta wrapper.
        let mut wide = Record::new();
        wide.push("a", Value::Int(1));
        wide.push("b", Value::Int(2));
        assert_eq!(Value::Struct(wide).game_loop_delta(), None);
    }
}

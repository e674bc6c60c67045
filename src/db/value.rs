//! Tagged column values.
//!
//! Rows coming out of the database are heterogeneous. Everything downstream
//! (row hashing, primary key identity, report rendering) matches on this enum
//! instead of coercing through strings.

use rusqlite::types::ValueRef;

#[derive(Debug, Clone, PartialEq)]
pub enum Value {
    Null,
    Integer(i64),
    Real(f64),
    Text(String),
    Blob(Vec<u8>),
}

impl Value {
    /// Single byte tag used by the row canonicalizer.
    pub fn tag(&self) -> u8 {
        match self {
            Value::Null => b'N',
            Value::Integer(_) => b'I',
            Value::Real(_) => b'R',
            Value::Text(_) => b'T',
            Value::Blob(_) => b'B',
        }
    }

    /// Lossless byte payload for hashing. Reals use their bit pattern so
    /// `0.1` never collides with a rounded display form.
    pub fn payload(&self) -> Vec<u8> {
        match self {
            Value::Null => Vec::new(),
            Value::Integer(i) => i.to_be_bytes().to_vec(),
            Value::Real(f) => f.to_bits().to_be_bytes().to_vec(),
            Value::Text(s) => s.as_bytes().to_vec(),
            Value::Blob(b) => b.clone(),
        }
    }

    /// Identity string when this value is used as a primary key.
    pub fn as_key(&self) -> String {
        match self {
            Value::Null => String::new(),
            Value::Integer(i) => i.to_string(),
            Value::Real(f) => f.to_string(),
            Value::Text(s) => s.clone(),
            Value::Blob(b) => hex::encode(b),
        }
    }

    pub fn is_null(&self) -> bool {
        matches!(self, Value::Null)
    }
}

impl From<ValueRef<'_>> for Value {
    fn from(value: ValueRef<'_>) -> Self {
        match value {
            ValueRef::Null => Value::Null,
            ValueRef::Integer(i) => Value::Integer(i),
            ValueRef::Real(f) => Value::Real(f),
            // sqlite does not enforce utf-8 in TEXT columns
            ValueRef::Text(t) => match std::str::from_utf8(t) {
                Ok(s) => Value::Text(s.to_string()),
                Err(_) => Value::Blob(t.to_vec()),
            },
            ValueRef::Blob(b) => Value::Blob(b.to_vec()),
        }
    }
}

/// One row in schema column order.
#[derive(Debug, Clone, PartialEq, Default)]
pub struct Row {
    pub columns: Vec<(String, Value)>,
}

impl Row {
    pub fn new(columns: Vec<(String, Value)>) -> Self {
        Row { columns }
    }

    pub fn get(&self, column: &str) -> Option<&Value> {
        self.columns
            .iter()
            .find(|(name, _)| name == column)
            .map(|(_, value)| value)
    }
}

//! # Store Rows
//!
//! Driver-independent representation of a result row. The repository parses
//! these into routes column by column, so a row with a missing or mistyped
//! column can be rejected on its own without failing the whole read.

/// A single decoded column value.
#[derive(Debug, Clone, PartialEq)]
pub enum StoreValue {
    Null,
    Text(String),
    Float(f64),
    Integer(i64),
    /// A column type this client does not decode, carrying the store's type name.
    Unsupported(String),
}

impl StoreValue {
    /// Short type label used in row-parse diagnostics.
    pub fn type_label(&self) -> String {
        match self {
            Self::Null => "null".to_string(),
            Self::Text(_) => "text".to_string(),
            Self::Float(_) => "float".to_string(),
            Self::Integer(_) => "integer".to_string(),
            Self::Unsupported(name) => format!("unsupported type {name}"),
        }
    }

    /// Numeric view of the value; integers widen to `f64`.
    pub fn as_f64(&self) -> Option<f64> {
        match self {
            Self::Float(v) => Some(*v),
            Self::Integer(v) => Some(*v as f64),
            _ => None,
        }
    }

    pub fn as_text(&self) -> Option<&str> {
        match self {
            Self::Text(s) => Some(s),
            _ => None,
        }
    }
}

/// An ordered set of `(column, value)` pairs.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct StoreRow {
    columns: Vec<(String, StoreValue)>,
}

impl StoreRow {
    pub fn new() -> Self {
        Self::default()
    }

    /// Builder-style column append.
    pub fn with(mut self, column: impl Into<String>, value: StoreValue) -> Self {
        self.set(column, value);
        self
    }

    /// Set a column, replacing an existing value of the same name.
    pub fn set(&mut self, column: impl Into<String>, value: StoreValue) {
        let column = column.into();
        match self.columns.iter_mut().find(|(c, _)| *c == column) {
            Some((_, v)) => *v = value,
            None => self.columns.push((column, value)),
        }
    }

    /// Look a column up by name.
    pub fn get(&self, column: &str) -> Option<&StoreValue> {
        self.columns
            .iter()
            .find(|(c, _)| c == column)
            .map(|(_, v)| v)
    }

    pub fn len(&self) -> usize {
        self.columns.len()
    }

    pub fn is_empty(&self) -> bool {
        self.columns.is_empty()
    }

    pub fn columns(&self) -> impl Iterator<Item = (&str, &StoreValue)> {
        self.columns.iter().map(|(c, v)| (c.as_str(), v))
    }
}

use core::fmt::{Display, Formatter};
use serde_json::Value;

/// A single value within a [`Table`](super::Table).
#[derive(Debug, Clone, PartialEq)]
pub enum Cell {
    Null,
    Bool(bool),
    Int(i64),
    Float(f64),
    Text(String),
}

impl Cell {
    /// Infers the most specific cell type for a piece of delimited text.
    #[must_use]
    pub fn infer(text: &str) -> Self {
        if text.is_empty() {
            return Self::Null;
        }

        if let Ok(v) = text.parse::<i64>() {
            return Self::Int(v);
        }

        if let Ok(v) = text.parse::<f64>() {
            return Self::Float(v);
        }

        if text.eq_ignore_ascii_case("true") {
            return Self::Bool(true);
        }

        if text.eq_ignore_ascii_case("false") {
            return Self::Bool(false);
        }

        Self::Text(text.to_string())
    }

    #[must_use]
    pub const fn is_null(&self) -> bool {
        matches!(self, Self::Null)
    }

    /// Numeric view of the cell, if it holds a number.
    #[must_use]
    #[expect(clippy::cast_precision_loss, reason = "table numbers are treated as floating point for arithmetic")]
    pub const fn as_f64(&self) -> Option<f64> {
        match self {
            Self::Int(v) => Some(*v as f64),
            Self::Float(v) => Some(*v),
            _ => None,
        }
    }

    #[must_use]
    pub fn as_str(&self) -> Option<&str> {
        match self {
            Self::Text(s) => Some(s),
            _ => None,
        }
    }

    /// Value equality where integers and floats compare by numeric value.
    #[must_use]
    pub fn same_value(&self, other: &Self) -> bool {
        match (self, other) {
            (Self::Int(_) | Self::Float(_), Self::Int(_) | Self::Float(_)) => self.as_f64() == other.as_f64(),
            _ => self == other,
        }
    }

    #[must_use]
    pub fn to_json(&self) -> Value {
        match self {
            Self::Null => Value::Null,
            Self::Bool(b) => Value::Bool(*b),
            Self::Int(i) => Value::from(*i),
            Self::Float(f) => serde_json::Number::from_f64(*f).map_or(Value::Null, Value::Number),
            Self::Text(s) => Value::String(s.clone()),
        }
    }

    /// Converts a JSON scalar into a cell.
    ///
    /// Arrays and objects have no cell representation and are stored as their JSON text.
    #[must_use]
    pub fn from_json(value: &Value) -> Self {
        match value {
            Value::Null => Self::Null,
            Value::Bool(b) => Self::Bool(*b),
            Value::Number(n) => n.as_i64().map_or_else(|| n.as_f64().map_or(Self::Null, Self::Float), Self::Int),
            Value::String(s) => Self::Text(s.clone()),
            Value::Array(_) | Value::Object(_) => Self::Text(value.to_string()),
        }
    }
}

impl Display for Cell {
    fn fmt(&self, f: &mut Formatter<'_>) -> core::fmt::Result {
        match self {
            Self::Null => Ok(()),
            Self::Bool(b) => write!(f, "{b}"),
            Self::Int(i) => write!(f, "{i}"),
            Self::Float(v) => write!(f, "{v}"),
            Self::Text(s) => write!(f, "{s}"),
        }
    }
}

impl From<i64> for Cell {
    fn from(value: i64) -> Self {
        Self::Int(value)
    }
}

impl From<f64> for Cell {
    fn from(value: f64) -> Self {
        Self::Float(value)
    }
}

impl From<bool> for Cell {
    fn from(value: bool) -> Self {
        Self::Bool(value)
    }
}

impl From<&str> for Cell {
    fn from(value: &str) -> Self {
        Self::Text(value.to_string())
    }
}

impl From<String> for Cell {
    fn from(value: String) -> Self {
        Self::Text(value)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_infer() {
        assert_eq!(Cell::infer(""), Cell::Null);
        assert_eq!(Cell::infer("42"), Cell::Int(42));
        assert_eq!(Cell::infer("-1.5"), Cell::Float(-1.5));
        assert_eq!(Cell::infer("True"), Cell::Bool(true));
        assert_eq!(Cell::infer("false"), Cell::Bool(false));
        assert_eq!(Cell::infer("north"), Cell::Text("north".into()));
    }

    #[test]
    fn test_same_value_crosses_numeric_types() {
        assert!(Cell::Int(3).same_value(&Cell::Float(3.0)));
        assert!(!Cell::Int(3).same_value(&Cell::Text("3".into())));
        assert!(Cell::Null.same_value(&Cell::Null));
    }

    #[test]
    fn test_json_conversion() {
        assert_eq!(Cell::Float(f64::NAN).to_json(), Value::Null);
        assert_eq!(Cell::from_json(&serde_json::json!(7)), Cell::Int(7));
        assert_eq!(Cell::from_json(&serde_json::json!(0.5)), Cell::Float(0.5));
        assert_eq!(Cell::from_json(&serde_json::json!([1])), Cell::Text("[1]".into()));
    }
}

//! Dynamically-typed values flowing through the pipeline.
//!
//! Every item the shell holds is a [`Value`]. Values never change once
//! produced; each operation builds new values from old ones.
//!
//! Coercion rules:
//! - A value is *numeric* when it is an `Int`, a `Float`, or a `Str` whose
//!   whole (trimmed) text parses as a finite number.
//! - Ordering puts `Null` first, then numeric values ordered numerically,
//!   then everything else ordered by textual form.
//! - Equality is numeric between `Int` and `Float`, structural otherwise.
//!   A numeric string never equals a number: `Int(2) != Str("2")`, yet
//!   [`Value::compare`] orders them as equal. `distinct` and `groupby` use
//!   equality; sorting, `min` and `max` use ordering.

use std::cmp::Ordering;
use std::fmt;

use serde::ser::{Serialize, SerializeMap, SerializeSeq, Serializer};

/// A single dynamically-typed value.
#[derive(Debug, Clone)]
pub enum Value {
    Null,
    Bool(bool),
    Int(i64),
    Float(f64),
    Str(String),
    /// Schema-less record produced by projection or grouping.
    Record(Record),
    /// Member list of a group, produced by `groupby ... items`.
    List(Vec<Value>),
}

/// Ordered mapping of field names to values.
///
/// Field order is insertion order and is preserved for display and export.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Record {
    fields: Vec<(String, Value)>,
}

impl Record {
    pub fn new() -> Self {
        Self::default()
    }

    /// Builder-style field append.
    pub fn with_field(mut self, name: impl Into<String>, value: Value) -> Self {
        self.push(name, value);
        self
    }

    pub fn push(&mut self, name: impl Into<String>, value: Value) {
        self.fields.push((name.into(), value));
    }

    pub fn get(&self, name: &str) -> Option<&Value> {
        self.fields.iter().find(|(n, _)| n == name).map(|(_, v)| v)
    }

    pub fn fields(&self) -> impl Iterator<Item = (&str, &Value)> {
        self.fields.iter().map(|(n, v)| (n.as_str(), v))
    }

    pub fn names(&self) -> impl Iterator<Item = &str> {
        self.fields.iter().map(|(n, _)| n.as_str())
    }

    pub fn len(&self) -> usize {
        self.fields.len()
    }

    pub fn is_empty(&self) -> bool {
        self.fields.is_empty()
    }
}

/// Parse text as a finite number, the way numeric strings are recognised.
pub fn parse_number(text: &str) -> Option<f64> {
    text.trim().parse::<f64>().ok().filter(|n| n.is_finite())
}

impl Value {
    /// Parse a literal token into the most specific kind.
    ///
    /// Quoted tokens are always strings. Otherwise tries boolean, integer,
    /// float and finally falls back to the raw text.
    pub fn parse_literal(token: &str) -> Value {
        let token = token.trim();

        if token.len() >= 2
            && ((token.starts_with('"') && token.ends_with('"'))
                || (token.starts_with('\'') && token.ends_with('\'')))
        {
            return Value::Str(token[1..token.len() - 1].to_string());
        }

        if token.eq_ignore_ascii_case("true") {
            return Value::Bool(true);
        }
        if token.eq_ignore_ascii_case("false") {
            return Value::Bool(false);
        }
        if let Ok(i) = token.parse::<i64>() {
            return Value::Int(i);
        }
        if let Some(f) = parse_number(token) {
            return Value::Float(f);
        }
        Value::Str(token.to_string())
    }

    /// Name of this value's kind, as used in diagnostics.
    pub fn kind_name(&self) -> &'static str {
        match self {
            Value::Null => "null",
            Value::Bool(_) => "bool",
            Value::Int(_) => "int",
            Value::Float(_) => "double",
            Value::Str(_) => "string",
            Value::Record(_) => "record",
            Value::List(_) => "list",
        }
    }

    pub fn is_null(&self) -> bool {
        matches!(self, Value::Null)
    }

    /// Numeric view of this value, if it has one.
    pub fn as_number(&self) -> Option<f64> {
        match self {
            Value::Int(i) => Some(*i as f64),
            Value::Float(f) => Some(*f),
            Value::Str(s) => parse_number(s),
            _ => None,
        }
    }

    pub fn is_numeric(&self) -> bool {
        self.as_number().is_some()
    }

    /// Textual form: strings unquoted, null empty, everything else as displayed.
    pub fn to_text(&self) -> String {
        match self {
            Value::Null => String::new(),
            Value::Str(s) => s.clone(),
            other => other.to_string(),
        }
    }

    /// Total ordering used by sorting, `min` and `max`.
    pub fn compare(&self, other: &Value) -> Ordering {
        match (self, other) {
            (Value::Null, Value::Null) => Ordering::Equal,
            (Value::Null, _) => Ordering::Less,
            (_, Value::Null) => Ordering::Greater,
            _ => match (self.as_number(), other.as_number()) {
                (Some(a), Some(b)) => a.total_cmp(&b),
                (Some(_), None) => Ordering::Less,
                (None, Some(_)) => Ordering::Greater,
                (None, None) => self.to_text().cmp(&other.to_text()),
            },
        }
    }
}

impl PartialEq for Value {
    fn eq(&self, other: &Self) -> bool {
        match (self, other) {
            (Value::Null, Value::Null) => true,
            (Value::Bool(a), Value::Bool(b)) => a == b,
            (Value::Int(a), Value::Int(b)) => a == b,
            (Value::Float(a), Value::Float(b)) => a == b,
            (Value::Int(a), Value::Float(b)) | (Value::Float(b), Value::Int(a)) => {
                *a as f64 == *b
            }
            (Value::Str(a), Value::Str(b)) => a == b,
            (Value::Record(a), Value::Record(b)) => a == b,
            (Value::List(a), Value::List(b)) => a == b,
            _ => false,
        }
    }
}

impl fmt::Display for Value {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Value::Null => f.write_str("null"),
            Value::Bool(b) => write!(f, "{b}"),
            Value::Int(i) => write!(f, "{i}"),
            Value::Float(x) => write!(f, "{x}"),
            Value::Str(s) => write!(f, "\"{s}\""),
            Value::Record(r) => write!(f, "{r}"),
            Value::List(items) => {
                f.write_str("[")?;
                for (i, item) in items.iter().enumerate() {
                    if i > 0 {
                        f.write_str(", ")?;
                    }
                    write!(f, "{item}")?;
                }
                f.write_str("]")
            }
        }
    }
}

impl fmt::Display for Record {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        if self.fields.is_empty() {
            return f.write_str("{ }");
        }
        f.write_str("{ ")?;
        for (i, (name, value)) in self.fields.iter().enumerate() {
            if i > 0 {
                f.write_str(", ")?;
            }
            write!(f, "{name} = {value}")?;
        }
        f.write_str(" }")
    }
}

impl Serialize for Value {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        match self {
            Value::Null => serializer.serialize_unit(),
            Value::Bool(b) => serializer.serialize_bool(*b),
            Value::Int(i) => serializer.serialize_i64(*i),
            Value::Float(x) if x.is_finite() => serializer.serialize_f64(*x),
            Value::Float(_) => serializer.serialize_unit(),
            Value::Str(s) => serializer.serialize_str(s),
            Value::Record(r) => r.serialize(serializer),
            Value::List(items) => {
                let mut seq = serializer.serialize_seq(Some(items.len()))?;
                for item in items {
                    seq.serialize_element(item)?;
                }
                seq.end()
            }
        }
    }
}

impl Serialize for Record {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        let mut map = serializer.serialize_map(Some(self.fields.len()))?;
        for (name, value) in &self.fields {
            map.serialize_entry(name, value)?;
        }
        map.end()
    }
}

impl From<bool> for Value {
    fn from(b: bool) -> Self {
        Value::Bool(b)
    }
}

impl From<i64> for Value {
    fn from(i: i64) -> Self {
        Value::Int(i)
    }
}

impl From<f64> for Value {
    fn from(x: f64) -> Self {
        Value::Float(x)
    }
}

impl From<&str> for Value {
    fn from(s: &str) -> Self {
        Value::Str(s.to_string())
    }
}

impl From<Record> for Value {
    fn from(r: Record) -> Self {
        Value::Record(r)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_literal_order() {
        assert_eq!(Value::parse_literal("true"), Value::Bool(true));
        assert_eq!(Value::parse_literal("FALSE"), Value::Bool(false));
        assert!(matches!(Value::parse_literal("42"), Value::Int(42)));
        assert!(matches!(Value::parse_literal("-7"), Value::Int(-7)));
        assert!(matches!(Value::parse_literal("3.5"), Value::Float(f) if f == 3.5));
        assert!(matches!(Value::parse_literal("apple"), Value::Str(ref s) if s == "apple"));
    }

    #[test]
    fn test_parse_literal_quoted_is_string() {
        assert!(matches!(Value::parse_literal("\"42\""), Value::Str(ref s) if s == "42"));
        assert!(matches!(Value::parse_literal("'true'"), Value::Str(ref s) if s == "true"));
        // A lone quote is not a quoted literal
        assert!(matches!(Value::parse_literal("\""), Value::Str(ref s) if s == "\""));
    }

    #[test]
    fn test_parse_literal_rejects_non_finite() {
        assert!(matches!(Value::parse_literal("NaN"), Value::Str(_)));
        assert!(matches!(Value::parse_literal("inf"), Value::Str(_)));
    }

    #[test]
    fn test_numeric_strings() {
        assert_eq!(Value::from("12.5").as_number(), Some(12.5));
        assert_eq!(Value::from(" 3 ").as_number(), Some(3.0));
        assert!(!Value::from("12a").is_numeric());
        assert!(!Value::Bool(true).is_numeric());
        assert!(!Value::Null.is_numeric());
    }

    #[test]
    fn test_numeric_string_equality_and_ordering_differ() {
        assert_ne!(Value::Int(2), Value::from("2"));
        assert_eq!(Value::Int(2).compare(&Value::from("2")), Ordering::Equal);
    }

    #[test]
    fn test_int_float_equality() {
        assert_eq!(Value::Int(2), Value::Float(2.0));
        assert_ne!(Value::Int(2), Value::from("2"));
        assert_ne!(Value::Null, Value::from(""));
    }

    #[test]
    fn test_compare_numeric_before_text() {
        assert_eq!(Value::Int(10).compare(&Value::Float(9.5)), Ordering::Greater);
        assert_eq!(Value::from("10").compare(&Value::Int(9)), Ordering::Greater);
        assert_eq!(Value::Int(100).compare(&Value::from("abc")), Ordering::Less);
        assert_eq!(Value::from("apple").compare(&Value::from("banana")), Ordering::Less);
        assert_eq!(Value::Null.compare(&Value::Int(-5)), Ordering::Less);
    }

    #[test]
    fn test_display() {
        let record = Record::new()
            .with_field("Key", Value::Int(1))
            .with_field("Items", Value::List(vec![Value::from("a"), Value::Float(2.5)]));
        assert_eq!(
            Value::Record(record).to_string(),
            r#"{ Key = 1, Items = ["a", 2.5] }"#
        );
        assert_eq!(Value::Null.to_string(), "null");
        assert_eq!(Value::Float(2.0).to_string(), "2");
        assert_eq!(Value::from("x").to_text(), "x");
    }

    #[test]
    fn test_serialize_preserves_field_order() {
        let record = Record::new()
            .with_field("Zeta", Value::Int(1))
            .with_field("Alpha", Value::Null);
        let json = serde_json::to_string(&Value::Record(record)).unwrap();
        assert_eq!(json, r#"{"Zeta":1,"Alpha":null}"#);
    }
}

//! Numeric coercion helpers and group aggregation.
//!
//! `sum` and `average` only look at items that coerce to a number; other
//! items are skipped silently. `min` and `max` work in two tiers: over the
//! numeric items when there are any, otherwise over the textual form of the
//! rest. An empty input has no minimum or maximum and yields `Null`.

use std::cmp::Ordering;

use crate::value::{Record, Value};

/// Sum of the numeric items, `0` when there are none.
pub fn sum(items: &[Value]) -> f64 {
    // Starts at +0.0; `Iterator::sum` over floats starts at -0.0.
    items
        .iter()
        .filter_map(Value::as_number)
        .fold(0.0, |acc, n| acc + n)
}

/// Mean of the numeric items, `0` when there are none.
pub fn average(items: &[Value]) -> f64 {
    let numbers: Vec<f64> = items.iter().filter_map(Value::as_number).collect();
    if numbers.is_empty() {
        0.0
    } else {
        numbers.iter().sum::<f64>() / numbers.len() as f64
    }
}

pub fn min(items: &[Value]) -> Value {
    extreme(items, Ordering::Less)
}

pub fn max(items: &[Value]) -> Value {
    extreme(items, Ordering::Greater)
}

/// First item that no later item beats in the `wanted` direction,
/// numeric tier first.
fn extreme(items: &[Value], wanted: Ordering) -> Value {
    let best_number = items
        .iter()
        .filter_map(Value::as_number)
        .reduce(|best, n| if n.total_cmp(&best) == wanted { n } else { best });
    if let Some(n) = best_number {
        return Value::Float(n);
    }

    items
        .iter()
        .filter(|v| !v.is_numeric())
        .map(|v| (v, v.to_text()))
        .reduce(|best, next| if next.1.cmp(&best.1) == wanted { next } else { best })
        .map(|(v, _)| v.clone())
        .unwrap_or(Value::Null)
}

/// How grouped members are summarised.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Aggregate {
    Count,
    Sum,
    Average,
    Min,
    Max,
    Items,
}

impl Aggregate {
    /// Resolve an aggregate name, case-insensitively.
    ///
    /// Anything unrecognised falls back to [`Aggregate::Items`].
    pub fn from_name(name: &str) -> Aggregate {
        match name.trim().to_lowercase().as_str() {
            "count" => Aggregate::Count,
            "sum" => Aggregate::Sum,
            "avg" | "average" => Aggregate::Average,
            "min" => Aggregate::Min,
            "max" => Aggregate::Max,
            _ => Aggregate::Items,
        }
    }

    /// Field that carries the aggregate in each output record.
    pub fn field_name(self) -> &'static str {
        match self {
            Aggregate::Count => "Count",
            Aggregate::Sum => "Sum",
            Aggregate::Average => "Average",
            Aggregate::Min => "Min",
            Aggregate::Max => "Max",
            Aggregate::Items => "Items",
        }
    }

    pub fn apply(self, members: &[Value]) -> Value {
        match self {
            Aggregate::Count => Value::Int(members.len() as i64),
            Aggregate::Sum => Value::Float(sum(members)),
            Aggregate::Average => Value::Float(average(members)),
            Aggregate::Min => min(members),
            Aggregate::Max => max(members),
            Aggregate::Items => Value::List(members.to_vec()),
        }
    }
}

/// Keyed groups in first-seen key order.
///
/// Keys match by value equality, so `1` and `1.0` share a group.
#[derive(Debug, Default)]
pub struct Groups {
    entries: Vec<(Value, Vec<Value>)>,
}

impl Groups {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn insert(&mut self, key: Value, item: Value) {
        match self.entries.iter_mut().find(|(k, _)| *k == key) {
            Some((_, members)) => members.push(item),
            None => self.entries.push((key, vec![item])),
        }
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// One `{ Key, <Aggregate> }` record per group.
    pub fn aggregate(self, aggregate: Aggregate) -> Vec<Value> {
        self.entries
            .into_iter()
            .map(|(key, members)| {
                Value::Record(
                    Record::new()
                        .with_field("Key", key)
                        .with_field(aggregate.field_name(), aggregate.apply(&members)),
                )
            })
            .collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn values(items: &[&str]) -> Vec<Value> {
        items.iter().map(|s| Value::parse_literal(s)).collect()
    }

    #[test]
    fn test_sum_and_average_skip_non_numeric() {
        let items = values(&["1", "\"a\"", "3"]);
        assert_eq!(sum(&items), 4.0);
        assert_eq!(average(&items), 2.0);
    }

    #[test]
    fn test_sum_without_numbers_is_positive_zero() {
        assert_eq!(Value::Float(sum(&[])).to_string(), "0");
        assert_eq!(Value::Float(sum(&[Value::from("a")])).to_string(), "0");
        assert_eq!(format!("{:.2}", sum(&values(&["\"a\"", "\"b\""]))), "0.00");
    }

    #[test]
    fn test_numeric_strings_count() {
        let items = vec![Value::from("2.5"), Value::Int(1)];
        assert_eq!(sum(&items), 3.5);
    }

    #[test]
    fn test_average_of_nothing_numeric() {
        assert_eq!(average(&[]), 0.0);
        assert_eq!(average(&values(&["apple"])), 0.0);
    }

    #[test]
    fn test_min_max_prefer_numbers() {
        let items = values(&["banana", "10", "2", "apple"]);
        assert_eq!(min(&items), Value::Float(2.0));
        assert_eq!(max(&items), Value::Float(10.0));
    }

    #[test]
    fn test_min_max_textual_fallback() {
        let items = values(&["banana", "apple"]);
        assert_eq!(min(&items), Value::from("apple"));
        assert_eq!(max(&items), Value::from("banana"));
    }

    #[test]
    fn test_min_max_empty_is_null() {
        assert_eq!(min(&[]), Value::Null);
        assert_eq!(max(&[]), Value::Null);
    }

    #[test]
    fn test_from_name_fallback() {
        assert_eq!(Aggregate::from_name("COUNT"), Aggregate::Count);
        assert_eq!(Aggregate::from_name("average"), Aggregate::Average);
        assert_eq!(Aggregate::from_name("avg"), Aggregate::Average);
        assert_eq!(Aggregate::from_name("median"), Aggregate::Items);
    }

    #[test]
    fn test_groups_keep_first_seen_order() {
        let mut groups = Groups::new();
        for i in 1..=5 {
            groups.insert(Value::Int(i % 2), Value::Int(i));
        }
        assert_eq!(groups.len(), 2);
        let out = groups.aggregate(Aggregate::Count);
        assert_eq!(out[0].to_string(), "{ Key = 1, Count = 3 }");
        assert_eq!(out[1].to_string(), "{ Key = 0, Count = 2 }");
    }

    #[test]
    fn test_groups_items() {
        let mut groups = Groups::new();
        groups.insert(Value::from("a"), Value::Int(1));
        groups.insert(Value::from("a"), Value::Int(2));
        let out = groups.aggregate(Aggregate::Items);
        assert_eq!(out[0].to_string(), r#"{ Key = "a", Items = [1, 2] }"#);
    }

    #[test]
    fn test_int_and_float_keys_merge() {
        let mut groups = Groups::new();
        groups.insert(Value::Int(1), Value::Int(1));
        groups.insert(Value::Float(1.0), Value::Int(2));
        assert_eq!(groups.len(), 1);
    }
}

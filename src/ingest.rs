//! Turning the initial data line into values.

use crate::value::Value;

/// Parse a comma-separated literal line.
///
/// Commas inside a quoted run do not split. Blank parts are dropped, so an
/// empty result means the line held no usable data.
pub fn parse_input(line: &str) -> Vec<Value> {
    split_respecting_quotes(line)
        .into_iter()
        .map(str::trim)
        .filter(|part| !part.is_empty())
        .map(Value::parse_literal)
        .collect()
}

fn split_respecting_quotes(line: &str) -> Vec<&str> {
    let mut parts = Vec::new();
    let mut quote: Option<char> = None;
    let mut start = 0;

    for (i, c) in line.char_indices() {
        match (quote, c) {
            (None, '"' | '\'') => quote = Some(c),
            (Some(q), _) if c == q => quote = None,
            (None, ',') => {
                parts.push(&line[start..i]);
                start = i + 1;
            }
            _ => {}
        }
    }
    parts.push(&line[start..]);
    parts
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_mixed_literals() {
        let values = parse_input("1, 2.5, true, \"hello\", world");
        assert_eq!(
            values,
            vec![
                Value::Int(1),
                Value::Float(2.5),
                Value::Bool(true),
                Value::from("hello"),
                Value::from("world"),
            ]
        );
    }

    #[test]
    fn test_commas_inside_quotes() {
        let values = parse_input("'a,b', \"c, d\", e");
        assert_eq!(
            values,
            vec![Value::from("a,b"), Value::from("c, d"), Value::from("e")]
        );
    }

    #[test]
    fn test_blank_parts_dropped() {
        assert_eq!(parse_input("1,,2, "), vec![Value::Int(1), Value::Int(2)]);
        assert!(parse_input("  , ,").is_empty());
        assert!(parse_input("").is_empty());
    }

    #[test]
    fn test_quoted_number_stays_string() {
        assert!(matches!(&parse_input("\"42\"")[0], Value::Str(s) if s == "42"));
    }
}

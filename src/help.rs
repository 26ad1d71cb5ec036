//! Command reference shown by `help`.

pub struct Entry {
    pub usage: &'static str,
    pub description: &'static str,
    pub example: &'static str,
}

pub struct Section {
    pub title: &'static str,
    pub entries: &'static [Entry],
    /// Free-form line printed after the entries.
    pub note: Option<&'static str>,
}

const fn entry(usage: &'static str, description: &'static str, example: &'static str) -> Entry {
    Entry {
        usage,
        description,
        example,
    }
}

pub const TITLE: &str = "LAMBDA-PIPE COMMANDS";

pub const SECTIONS: &[Section] = &[
    Section {
        title: "FILTERING & SELECTION",
        entries: &[
            entry("filter/where <lambda>", "Filter items by condition", "filter x => (int)x > 10"),
            entry(
                "select <lambda>",
                "Transform/project items",
                "select x => new { Value = x, Square = ((int)x) * ((int)x) }",
            ),
            entry("distinct", "Remove duplicate items", "distinct"),
        ],
        note: None,
    },
    Section {
        title: "ORDERING & GROUPING",
        entries: &[
            entry("orderby/sort [lambda] [desc]", "Sort items (stable)", "orderby x => x desc"),
            entry("groupby/group <lambda> [agg]", "Group and aggregate", "groupby x => (int)x % 2 count"),
        ],
        note: Some("Available aggregates: count, sum, avg, min, max, items"),
    },
    Section {
        title: "QUANTIFIERS & AGGREGATES",
        entries: &[
            entry("take <n>", "Take first n items", "take 5"),
            entry("skip <n>", "Skip first n items", "skip 3"),
            entry("any [lambda]", "Check if any item matches", "any x => (int)x > 100"),
            entry("all [lambda]", "Check if all items match", "all x => (int)x > 0"),
            entry("count [lambda]", "Count items (optionally matching)", "count x => (int)x > 5"),
            entry("sum", "Sum numeric values", "sum"),
            entry("avg/average", "Average of numeric values", "avg"),
            entry("min", "Find minimum value", "min"),
            entry("max", "Find maximum value", "max"),
            entry("first [lambda]", "Get first item (optionally matching)", "first x => (int)x > 5"),
            entry("last [lambda]", "Get last item (optionally matching)", "last"),
        ],
        note: None,
    },
    Section {
        title: "UTILITY COMMANDS",
        entries: &[
            entry("export/save <format>", "Export results (csv, json, txt)", "export json"),
            entry("undo", "Undo last operation", "undo"),
            entry("redo", "Redo last undone operation", "redo"),
            entry("reset", "Reset to original data", "reset"),
            entry("help", "Show this help", "help"),
            entry("exit", "Exit the application", "exit"),
        ],
        note: None,
    },
];

pub const TIPS: &[&str] = &[
    "Use (int)x, (double)x, (string)x for type casting",
    "String values in input should be quoted: \"hello\", 'world'",
    "Lambda expressions must use => syntax",
    "Records: x => new { Name = x, Len = ((string)x).Length }",
    "Commands are case-insensitive",
    "Use Ctrl+C to clear the current line, Ctrl+D to quit",
];

#[cfg(test)]
mod tests {
    use super::*;
    use crate::dsl::parse_command;

    #[test]
    fn test_every_example_parses() {
        for section in SECTIONS {
            for entry in section.entries {
                assert!(
                    parse_command(entry.example).is_ok(),
                    "example does not parse: {}",
                    entry.example
                );
            }
        }
    }
}

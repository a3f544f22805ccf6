// Handwriting practice lines

/// Entries longer than this are repeated fewer times per line
const SHORT_ENTRY_CHARS: usize = 10;
const SHORT_REPEATS: usize = 5;
const LONG_REPEATS: usize = 2;
const GAP: &str = "   ";

/// Splits comma-separated input into tracing lines, repeating each entry so
/// it fills the width of a line.
pub fn tracing_lines(text: &str) -> Vec<String> {
    text.split(',')
        .map(str::trim)
        .filter(|entry| !entry.is_empty())
        .map(|entry| {
            let repeats = if entry.chars().count() > SHORT_ENTRY_CHARS {
                LONG_REPEATS
            } else {
                SHORT_REPEATS
            };
            vec![entry; repeats].join(GAP)
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn short_entries_repeat_five_times() {
        let lines = tracing_lines("cat, dog");
        assert_eq!(lines.len(), 2);
        assert_eq!(lines[0], "cat   cat   cat   cat   cat");
        assert_eq!(lines[1].matches("dog").count(), 5);
    }

    #[test]
    fn long_entries_repeat_twice() {
        let lines = tracing_lines("The quick brown fox");
        assert_eq!(lines, vec!["The quick brown fox   The quick brown fox".to_string()]);
    }

    #[test]
    fn blank_entries_are_skipped() {
        assert!(tracing_lines(" , ,, ").is_empty());
        assert_eq!(tracing_lines("แมว,, นก").len(), 2);
    }
}

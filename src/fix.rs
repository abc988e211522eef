//! Text edits produced by code actions, and the line diff used when a
//! fixed document does not match its expectation.
//!
//! Edits are byte-offset based, matching tree-sitter and [`TextSpan`].
//! Everything here is pure; no file I/O.

use std::collections::HashSet;
use std::fmt::Write as _;

use thiserror::Error;

use crate::text::TextSpan;

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum EditError {
    #[error("overlapping edits detected at byte {0}")]
    Overlapping(usize),

    #[error("edit range [{start}..{end}) exceeds source length {source_len}")]
    OutOfRange {
        start: usize,
        end: usize,
        source_len: usize,
    },

    #[error("edit start {start} is after edit end {end}")]
    Inverted { start: usize, end: usize },

    #[error("edit boundary {0} is not on a character boundary")]
    NotCharBoundary(usize),

    #[error("edit targets a document that is not in the project: {0}")]
    UnknownDocument(String),
}

/// Replace `span` with `replacement`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TextEdit {
    pub span: TextSpan,
    pub replacement: String,
}

impl TextEdit {
    pub fn replace(span: TextSpan, replacement: impl Into<String>) -> Self {
        Self {
            span,
            replacement: replacement.into(),
        }
    }

    pub fn insert(offset: usize, text: impl Into<String>) -> Self {
        Self::replace(TextSpan::empty(offset), text)
    }

    pub fn delete(span: TextSpan) -> Self {
        Self::replace(span, String::new())
    }

    pub fn overlaps_with(&self, other: &TextEdit) -> bool {
        // Two insertions at the same offset are ambiguous too.
        if self.span.is_empty() && other.span.is_empty() {
            return self.span.start == other.span.start;
        }
        self.span.start < other.span.end && other.span.start < self.span.end
    }

    fn validate(&self, source: &str) -> Result<(), EditError> {
        let TextSpan { start, end } = self.span;
        if start > end {
            return Err(EditError::Inverted { start, end });
        }
        if end > source.len() {
            return Err(EditError::OutOfRange {
                start,
                end,
                source_len: source.len(),
            });
        }
        for at in [start, end] {
            if !source.is_char_boundary(at) {
                return Err(EditError::NotCharBoundary(at));
            }
        }
        Ok(())
    }
}

/// Apply non-overlapping edits, all expressed against the original `source`.
pub fn apply_edits(source: &str, edits: &[TextEdit]) -> Result<String, EditError> {
    for edit in edits {
        edit.validate(source)?;
    }

    let mut sorted: Vec<&TextEdit> = edits.iter().collect();
    sorted.sort_by_key(|e| (e.span.start, e.span.end));
    for pair in sorted.windows(2) {
        if pair[0].overlaps_with(pair[1]) {
            return Err(EditError::Overlapping(pair[1].span.start));
        }
    }

    // Apply from the end so earlier offsets stay valid.
    let mut result = source.to_string();
    for edit in sorted.into_iter().rev() {
        result.replace_range(edit.span.range(), &edit.replacement);
    }
    Ok(result)
}

/// Unified-style line diff of `expected` against `actual`, with three lines
/// of context. Empty only when the texts are equal; texts that differ only
/// in line endings are shown escaped.
pub fn format_diff(expected: &str, actual: &str, name: &str) -> String {
    format_diff_with_context(expected, actual, name, 3)
}

pub fn format_diff_with_context(expected: &str, actual: &str, name: &str, context: usize) -> String {
    let old: Vec<&str> = expected.lines().collect();
    let new: Vec<&str> = actual.lines().collect();
    let max_len = old.len().max(new.len());

    let changed: Vec<usize> = (0..max_len).filter(|&i| old.get(i) != new.get(i)).collect();
    if changed.is_empty() {
        if expected == actual {
            return String::new();
        }
        return format!("--- expected/{name}\n{expected:?}\n+++ actual/{name}\n{actual:?}\n");
    }

    // Group changed lines into hunks whose context windows touch.
    let mut hunks: Vec<(usize, usize)> = Vec::new();
    for &i in &changed {
        let start = i.saturating_sub(context);
        let end = (i + context + 1).min(max_len);
        match hunks.last_mut() {
            Some(last) if start <= last.1 => last.1 = end,
            _ => hunks.push((start, end)),
        }
    }
    let changed: HashSet<usize> = changed.into_iter().collect();

    let mut out = String::new();
    let _ = writeln!(out, "--- expected/{name}");
    let _ = writeln!(out, "+++ actual/{name}");

    for (start, end) in hunks {
        let old_size = end.min(old.len()).saturating_sub(start);
        let new_size = end.min(new.len()).saturating_sub(start);
        let _ = writeln!(out, "@@ -{},{old_size} +{},{new_size} @@", start + 1, start + 1);

        for line in start..end {
            if changed.contains(&line) {
                if let Some(text) = old.get(line) {
                    let _ = writeln!(out, "-{text}");
                }
                if let Some(text) = new.get(line) {
                    let _ = writeln!(out, "+{text}");
                }
            } else if let Some(text) = old.get(line) {
                let _ = writeln!(out, " {text}");
            }
        }
    }

    out
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn applies_edits_regardless_of_input_order() {
        let source = "int s = n.Span.Start;";
        let edits = vec![
            TextEdit::replace(TextSpan::new(20, 21), ";;"),
            TextEdit::replace(TextSpan::new(10, 20), "SpanStart"),
        ];
        assert_eq!(apply_edits(source, &edits).unwrap(), "int s = n.SpanStart;;");
    }

    #[test]
    fn insert_and_delete() {
        let edits = vec![
            TextEdit::insert(0, "// "),
            TextEdit::delete(TextSpan::new(3, 7)),
        ];
        assert_eq!(apply_edits("abc1234", &edits).unwrap(), "// abc");
    }

    #[test]
    fn no_edits_is_identity() {
        assert_eq!(apply_edits("x", &[]).unwrap(), "x");
    }

    #[test]
    fn overlapping_edits_are_rejected() {
        let edits = vec![
            TextEdit::replace(TextSpan::new(0, 5), "a"),
            TextEdit::replace(TextSpan::new(3, 8), "b"),
        ];
        assert_eq!(apply_edits("0123456789", &edits), Err(EditError::Overlapping(3)));

        let inserts = vec![TextEdit::insert(2, "a"), TextEdit::insert(2, "b")];
        assert_eq!(apply_edits("0123", &inserts), Err(EditError::Overlapping(2)));
    }

    #[test]
    fn adjacent_edits_are_allowed() {
        let edits = vec![
            TextEdit::replace(TextSpan::new(0, 2), "x"),
            TextEdit::replace(TextSpan::new(2, 4), "y"),
        ];
        assert_eq!(apply_edits("abcd", &edits).unwrap(), "xy");
    }

    #[test]
    fn invalid_ranges_are_rejected() {
        assert_eq!(
            apply_edits("abc", &[TextEdit::delete(TextSpan::new(1, 9))]),
            Err(EditError::OutOfRange {
                start: 1,
                end: 9,
                source_len: 3
            })
        );
        assert_eq!(
            apply_edits("abc", &[TextEdit::delete(TextSpan { start: 2, end: 1 })]),
            Err(EditError::Inverted { start: 2, end: 1 })
        );
        assert_eq!(
            apply_edits("é", &[TextEdit::insert(1, "x")]),
            Err(EditError::NotCharBoundary(1))
        );
    }

    #[test]
    fn diff_shows_changed_lines_with_context() {
        let expected = "a\nb\nc\nd\ne\nf\ng\nh\ni";
        let actual = "a\nb\nc\nd\nE\nf\ng\nh\ni";
        insta::assert_snapshot!(format_diff(expected, actual, "Test.cs"), @r"
        --- expected/Test.cs
        +++ actual/Test.cs
        @@ -2,7 +2,7 @@
         b
         c
         d
        -e
        +E
         f
         g
         h
        ");
    }

    #[test]
    fn diff_of_equal_texts_is_empty() {
        assert_eq!(format_diff("a\nb", "a\nb", "Test.cs"), "");
    }

    #[test]
    fn line_ending_differences_are_shown_escaped() {
        insta::assert_snapshot!(format_diff("a\nb", "a\nb\n", "Test.cs"), @r#"
        --- expected/Test.cs
        "a\nb"
        +++ actual/Test.cs
        "a\nb\n"
        "#);
        assert_eq!(
            format_diff("a\nb", "a\r\nb", "Test.cs"),
            "--- expected/Test.cs\n\"a\\nb\"\n+++ actual/Test.cs\n\"a\\r\\nb\"\n"
        );
    }
}

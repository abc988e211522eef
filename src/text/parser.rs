//! Parser for the span annotation mini-language used in test sources.
//!
//! - `[|` opens a span and `|]` closes the most recently opened one
//! - `[||]` is an empty span marking an insertion point
//! - `[[|]` is a literal `[` immediately followed by a closing marker
//!
//! Markers are removed from the returned text; everything else, including
//! line endings, is copied verbatim.

use std::borrow::Cow;

use thiserror::Error;

use super::span::{LinePosition, LinePositionSpan, LinePositionSpanInfo, TextSpan};

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum SpanParseError {
    #[error("closing marker `|]` at {position} has no matching `[|`")]
    UnmatchedClose { position: LinePosition },

    #[error("opening marker `[|` at {position} is never closed")]
    Unclosed { position: LinePosition },

    #[error("text contains no span")]
    NoSpan,

    #[error("text contains more than one span ({count} found)")]
    MultipleSpans { count: usize },
}

/// Order in which parsed spans are returned.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum SpanOrder {
    /// The order in which closing markers appear.
    #[default]
    Closed,
    /// By start offset, then end offset.
    Ascending,
    /// Reverse of `Ascending`.
    Descending,
}

/// Source text with markers removed, plus the spans they delimited.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AnnotatedText {
    pub text: String,
    /// Expected text produced by substitution mode, if requested.
    pub expected: Option<String>,
    pub spans: Vec<LinePositionSpanInfo>,
}

impl AnnotatedText {
    pub fn text_spans(&self) -> impl Iterator<Item = TextSpan> + '_ {
        self.spans.iter().map(|s| s.span)
    }

    /// The only span in the text.
    pub fn single_span(&self) -> Result<LinePositionSpanInfo, SpanParseError> {
        match self.spans.as_slice() {
            [] => Err(SpanParseError::NoSpan),
            [span] => Ok(*span),
            spans => Err(SpanParseError::MultipleSpans { count: spans.len() }),
        }
    }
}

#[derive(Debug, Clone, Copy)]
struct Marker {
    offset: usize,
    position: LinePosition,
}

/// Strip markers from `text`, returning spans in closing order.
pub fn parse(text: &str) -> Result<AnnotatedText, SpanParseError> {
    parse_with_order(text, SpanOrder::Closed)
}

pub fn parse_with_order(text: &str, order: SpanOrder) -> Result<AnnotatedText, SpanParseError> {
    let bytes = text.as_bytes();
    let peek = |at: usize| bytes.get(at).copied().unwrap_or(0);

    let mut out = String::with_capacity(text.len());
    let mut spans: Vec<LinePositionSpanInfo> = Vec::new();

    // The flat case only ever needs one open marker; the stack is created
    // when a second `[|` arrives before the first one closes.
    let mut pending: Option<Marker> = None;
    let mut stack: Option<Vec<Marker>> = None;

    let mut last = 0;
    let mut line = 0;
    let mut column = 0;
    let mut i = 0;

    let mut close_span = |i: usize,
                          last: usize,
                          line: usize,
                          column: usize,
                          out: &mut String,
                          pending: &mut Option<Marker>,
                          stack: &mut Option<Vec<Marker>>|
     -> Result<(), SpanParseError> {
        let start = match stack.as_mut() {
            Some(stack) => stack.pop(),
            None => pending.take(),
        }
        .ok_or(SpanParseError::UnmatchedClose {
            position: LinePosition::new(line, column),
        })?;

        let end = Marker {
            offset: out.len() + (i - last),
            position: LinePosition::new(line, column),
        };

        spans.push(LinePositionSpanInfo {
            span: TextSpan::new(start.offset, end.offset),
            line_span: LinePositionSpan::new(start.position, end.position),
        });

        out.push_str(&text[last..i]);
        Ok(())
    };

    while i < bytes.len() {
        match bytes[i] {
            b'\r' => {
                if peek(i + 1) == b'\n' {
                    i += 1;
                }
                line += 1;
                column = 0;
                i += 1;
                continue;
            }
            b'\n' => {
                line += 1;
                column = 0;
                i += 1;
                continue;
            }
            b'[' if peek(i + 1) == b'|' => {
                out.push_str(&text[last..i]);

                let marker = Marker {
                    offset: out.len(),
                    position: LinePosition::new(line, column),
                };

                if let Some(stack) = stack.as_mut() {
                    stack.push(marker);
                } else if let Some(first) = pending.take() {
                    stack = Some(vec![first, marker]);
                } else {
                    pending = Some(marker);
                }

                i += 2;
                last = i;
                continue;
            }
            b'[' if peek(i + 1) == b'[' && peek(i + 2) == b'|' && peek(i + 3) == b']' => {
                // Keep the first `[` as text, then close.
                i += 1;
                column += 1;
                close_span(i, last, line, column, &mut out, &mut pending, &mut stack)?;
                i += 3;
                last = i;
                continue;
            }
            b'|' if peek(i + 1) == b']' => {
                close_span(i, last, line, column, &mut out, &mut pending, &mut stack)?;
                i += 2;
                last = i;
                continue;
            }
            _ => {}
        }

        column += 1;
        i += 1;
    }

    let unclosed = pending.or_else(|| stack.as_ref().and_then(|s| s.last().copied()));
    if let Some(marker) = unclosed {
        return Err(SpanParseError::Unclosed {
            position: marker.position,
        });
    }

    out.push_str(&text[last..]);

    match order {
        SpanOrder::Closed => {}
        SpanOrder::Ascending => spans.sort_by_key(|s| (s.span.start, s.span.end)),
        SpanOrder::Descending => {
            spans.sort_by_key(|s| (s.span.start, s.span.end));
            spans.reverse();
        }
    }

    Ok(AnnotatedText {
        text: out,
        expected: None,
        spans,
    })
}

/// Substitute `source_data` into the single span of `template`.
///
/// When `source_data` has no markers of its own it becomes the span;
/// otherwise its single inner span is kept. With `expected_data`, the
/// expected text is `template` with the span replaced by it.
pub fn parse_and_replace(
    template: &str,
    source_data: &str,
    expected_data: Option<&str>,
) -> Result<AnnotatedText, SpanParseError> {
    let code = parse(template)?;
    let span = code.single_span()?.span;

    let expected = expected_data.map(|data| splice(&code.text, span, data));

    let inner = parse(source_data)?;
    let payload: Cow<'_, str> = match inner.spans.len() {
        0 => Cow::Owned(format!("[|{source_data}|]")),
        1 => Cow::Borrowed(source_data),
        count => return Err(SpanParseError::MultipleSpans { count }),
    };

    let mut result = parse(&splice(&code.text, span, &payload))?;
    result.expected = expected;
    Ok(result)
}

fn splice(text: &str, span: TextSpan, replacement: &str) -> String {
    let mut out = String::with_capacity(text.len() - span.len() + replacement.len());
    out.push_str(&text[..span.start]);
    out.push_str(replacement);
    out.push_str(&text[span.end..]);
    out
}

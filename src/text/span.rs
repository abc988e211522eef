use std::fmt;
use std::ops::Range;

/// Half-open byte range `[start, end)` in a document.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Default)]
pub struct TextSpan {
    pub start: usize,
    pub end: usize,
}

impl TextSpan {
    pub fn new(start: usize, end: usize) -> Self {
        debug_assert!(start <= end, "span start {start} is after end {end}");
        Self { start, end }
    }

    pub fn from_range(range: Range<usize>) -> Self {
        Self::new(range.start, range.end)
    }

    pub fn empty(at: usize) -> Self {
        Self::new(at, at)
    }

    pub fn len(&self) -> usize {
        self.end - self.start
    }

    pub fn is_empty(&self) -> bool {
        self.start == self.end
    }

    pub fn range(&self) -> Range<usize> {
        self.start..self.end
    }

    /// Whether `other` lies entirely within this span.
    pub fn contains(&self, other: TextSpan) -> bool {
        self.start <= other.start && other.end <= self.end
    }
}

impl fmt::Display for TextSpan {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "[{}..{})", self.start, self.end)
    }
}

/// Zero-based line and column. Columns count bytes from the start of the line.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Default)]
pub struct LinePosition {
    pub line: usize,
    pub column: usize,
}

impl LinePosition {
    pub fn new(line: usize, column: usize) -> Self {
        Self { line, column }
    }
}

impl fmt::Display for LinePosition {
    /// Rendered one-based, the way editors show positions.
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}:{}", self.line + 1, self.column + 1)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Default)]
pub struct LinePositionSpan {
    pub start: LinePosition,
    pub end: LinePosition,
}

impl LinePositionSpan {
    pub fn new(start: LinePosition, end: LinePosition) -> Self {
        Self { start, end }
    }
}

impl fmt::Display for LinePositionSpan {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "({})-({})", self.start, self.end)
    }
}

/// A span located both as bytes and as line/column positions.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct LinePositionSpanInfo {
    pub span: TextSpan,
    pub line_span: LinePositionSpan,
}

impl LinePositionSpanInfo {
    pub fn start(&self) -> usize {
        self.span.start
    }

    pub fn end(&self) -> usize {
        self.span.end
    }
}

/// Maps byte offsets to line/column positions.
///
/// `\r\n`, `\n` and a lone `\r` each terminate a line, matching the
/// annotation parser.
#[derive(Debug, Clone)]
pub struct LineIndex {
    line_starts: Vec<usize>,
    len: usize,
}

impl LineIndex {
    pub fn new(text: &str) -> Self {
        let bytes = text.as_bytes();
        let mut line_starts = vec![0];
        let mut i = 0;
        while i < bytes.len() {
            match bytes[i] {
                b'\r' => {
                    if bytes.get(i + 1) == Some(&b'\n') {
                        i += 1;
                    }
                    line_starts.push(i + 1);
                }
                b'\n' => line_starts.push(i + 1),
                _ => {}
            }
            i += 1;
        }

        Self {
            line_starts,
            len: text.len(),
        }
    }

    pub fn line_count(&self) -> usize {
        self.line_starts.len()
    }

    /// Position of `offset`; offsets past the end clamp to the end of text.
    pub fn position(&self, offset: usize) -> LinePosition {
        let offset = offset.min(self.len);
        let line = match self.line_starts.binary_search(&offset) {
            Ok(line) => line,
            Err(next) => next - 1,
        };
        LinePosition::new(line, offset - self.line_starts[line])
    }

    pub fn line_span(&self, span: TextSpan) -> LinePositionSpan {
        LinePositionSpan::new(self.position(span.start), self.position(span.end))
    }

    pub fn locate(&self, span: TextSpan) -> LinePositionSpanInfo {
        LinePositionSpanInfo {
            span,
            line_span: self.line_span(span),
        }
    }
}

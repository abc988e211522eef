//! Text positions and the span annotation language used by test sources.

mod parser;
mod span;

pub use parser::{
    AnnotatedText, SpanOrder, SpanParseError, parse, parse_and_replace, parse_with_order,
};
pub use span::{LineIndex, LinePosition, LinePositionSpan, LinePositionSpanInfo, TextSpan};

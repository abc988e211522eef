//! Sample analyzers, fixes and refactorings for C#.

mod util;

pub mod span_start;
pub mod swap_operands;

pub use span_start::{USE_SPAN_START, UseSpanStartAnalyzer, UseSpanStartFix};
pub use swap_operands::{SWAP_BINARY_OPERANDS, SwapBinaryOperandsRefactoring};

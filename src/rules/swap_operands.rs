use anyhow::Result;

use crate::action::{CodeAction, RefactoringContext, RefactoringProvider};
use crate::fix::TextEdit;

use super::util::{enclosing_node, slice, span_of};

pub const SWAP_BINARY_OPERANDS: &str = "RR0025";

/// Operators that keep their meaning when the operands swap, paired with
/// the operator to use afterwards.
const SWAPPABLE: &[(&str, &str)] = &[
    ("==", "=="),
    ("!=", "!="),
    ("&&", "&&"),
    ("||", "||"),
    ("*", "*"),
    ("&", "&"),
    ("|", "|"),
    ("^", "^"),
    ("<", ">"),
    ("<=", ">="),
    (">", "<"),
    (">=", "<="),
];

/// Swaps the operands of the innermost binary expression at the selection,
/// mirroring relational operators.
pub struct SwapBinaryOperandsRefactoring;

impl RefactoringProvider for SwapBinaryOperandsRefactoring {
    fn compute_refactorings(&self, ctx: &mut RefactoringContext<'_>) -> Result<()> {
        let Some(tree) = ctx.compilation.syntax_tree(ctx.document.id) else {
            return Ok(());
        };
        let Some(node) = enclosing_node(tree, ctx.span, &["binary_expression"]) else {
            return Ok(());
        };

        let count = node.child_count();
        if count < 3 {
            return Ok(());
        }
        let (Some(left), Some(operator), Some(right)) = (
            node.child_by_field_name("left").or_else(|| node.child(0)),
            node.child_by_field_name("operator").or_else(|| node.child(1)),
            node.child_by_field_name("right").or_else(|| node.child(count - 1)),
        ) else {
            return Ok(());
        };

        let source = ctx.document.text.as_str();
        let Some(&(_, swapped)) = SWAPPABLE
            .iter()
            .find(|(op, _)| *op == slice(source, operator))
        else {
            return Ok(());
        };

        let mut edits = vec![
            TextEdit::replace(span_of(left), slice(source, right)),
            TextEdit::replace(span_of(right), slice(source, left)),
        ];
        if swapped != slice(source, operator) {
            edits.push(TextEdit::replace(span_of(operator), swapped));
        }

        let action = CodeAction::new("Swap operands")
            .with_equivalence_key(SWAP_BINARY_OPERANDS)
            .with_edits(ctx.document.id, edits);
        ctx.register(action);
        Ok(())
    }
}

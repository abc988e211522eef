use tree_sitter::{Node, Tree};

use crate::text::TextSpan;

pub(crate) fn walk(node: Node, f: &mut impl FnMut(Node)) {
    f(node);
    let mut cursor = node.walk();
    for child in node.children(&mut cursor) {
        walk(child, f);
    }
}

pub(crate) fn slice<'a>(source: &'a str, node: Node) -> &'a str {
    // tree-sitter offsets are UTF-8 byte offsets; fall back to an empty
    // string rather than panic if one ever lands mid-character.
    source.get(node.byte_range()).unwrap_or("")
}

pub(crate) fn span_of(node: Node) -> TextSpan {
    TextSpan::from_range(node.byte_range())
}

pub(crate) fn compact_ws(text: &str) -> String {
    text.chars().filter(|c| !c.is_whitespace()).collect()
}

/// Innermost node of one of `kinds` that covers `span`.
pub(crate) fn enclosing_node<'t>(tree: &'t Tree, span: TextSpan, kinds: &[&str]) -> Option<Node<'t>> {
    let mut node = tree
        .root_node()
        .descendant_for_byte_range(span.start, span.end)?;
    loop {
        if kinds.contains(&node.kind()) && span_of(node).contains(span) {
            return Some(node);
        }
        node = node.parent()?;
    }
}

/// Receiver of a `receiver.Span.Start` access, ignoring whitespace around
/// the dots.
pub(crate) fn span_start_receiver(text: &str) -> Option<&str> {
    let (rest, last) = text.rsplit_once('.')?;
    if last.trim() != "Start" {
        return None;
    }
    let (receiver, middle) = rest.rsplit_once('.')?;
    if middle.trim() != "Span" {
        return None;
    }
    let receiver = receiver.trim();
    (!receiver.is_empty()).then_some(receiver)
}

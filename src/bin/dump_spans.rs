//! Span dumping tool for debugging annotated test sources.
//!
//! Prints the text with markers removed, then every marked span with its
//! byte range, its 1-based line/column range and the covered text.

use std::env;
use std::fs;
use std::process::ExitCode;

use lint_verify::text::{SpanOrder, parse_with_order};

fn preview(text: &str) -> String {
    let shown: String = text.chars().take(50).collect();
    let shown = if shown.len() < text.len() {
        format!("{shown}...")
    } else {
        shown
    };
    shown.replace('\n', "\\n")
}

fn main() -> ExitCode {
    let args: Vec<String> = env::args().collect();
    let (file_path, order) = match args.as_slice() {
        [_, path] => (path, SpanOrder::Closed),
        [_, flag, path] if flag == "--ascending" => (path, SpanOrder::Ascending),
        [_, flag, path] if flag == "--descending" => (path, SpanOrder::Descending),
        _ => {
            eprintln!("Usage: dump_spans [--ascending|--descending] <file>");
            return ExitCode::from(2);
        }
    };

    let source = match fs::read_to_string(file_path) {
        Ok(source) => source,
        Err(e) => {
            eprintln!("Failed to read {file_path}: {e}");
            return ExitCode::FAILURE;
        }
    };

    let annotated = match parse_with_order(&source, order) {
        Ok(annotated) => annotated,
        Err(e) => {
            eprintln!("{file_path}: {e}");
            return ExitCode::FAILURE;
        }
    };

    println!("Spans in {file_path}:");
    println!("================");
    for (i, info) in annotated.spans.iter().enumerate() {
        let covered = annotated.text.get(info.span.range()).unwrap_or_default();
        println!(
            "{i}: {} ({})  \"{}\"",
            info.span,
            info.line_span,
            preview(covered)
        );
    }
    println!("================");
    print!("{}", annotated.text);
    ExitCode::SUCCESS
}

//! Line/column context for grammar and input diagnostics.

/// Most source lines shown above the marker.
pub const MAX_CONTEXT_LINES: usize = 3;

pub const NO_INPUT: &str = "No input provided";

pub const INPUT_HEADER: &str = "Failed to parse input string:";

pub fn grammar_header(reason: &str) -> String {
    format!("Failed to parse grammar: {reason}")
}

/// Up to the last [`MAX_CONTEXT_LINES`] lines ending at the line holding
/// `position`, followed by a `^` marker under its column.
///
/// `position` counts chars, newline included. A position on a line's
/// terminating newline is shown at column 0 of the next line; positions past
/// the end stick to the last line.
pub fn position_context(text: &str, position: usize) -> Vec<String> {
    if text.is_empty() {
        return vec![NO_INPUT.to_string()];
    }

    let lines: Vec<&str> = text.split('\n').collect();
    let mut line_idx = 0;
    let mut column = position;
    loop {
        let len = lines[line_idx].chars().count();
        if column < len || line_idx + 1 == lines.len() {
            break;
        }
        // Step over the line and its newline; landing on the newline itself
        // clamps to the start of the next line.
        column = column.saturating_sub(len + 1);
        line_idx += 1;
        if column == 0 {
            break;
        }
    }

    let first = (line_idx + 1).saturating_sub(MAX_CONTEXT_LINES);
    let mut out: Vec<String> = lines[first..=line_idx]
        .iter()
        .map(|line| line.to_string())
        .collect();
    out.push(format!("{}^", " ".repeat(column)));
    out
}

/// Header, blank line, then the context lines.
pub(crate) fn render(header: &str, text: &str, position: usize) -> String {
    let mut lines = vec![header.to_string(), String::new()];
    lines.extend(position_context(text, position));
    lines.join("\n")
}

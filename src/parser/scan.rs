//! Delimiter-balanced scanning over raw lines.
//!
//! Registration blocks and documentation overrides are not valid syntax in any
//! single grammar, so these helpers only count delimiters character by
//! character and never look at tokens.

/// How many lines after the marker may hold the opening brace of its block.
pub const BRACE_LOOKAHEAD: usize = 5;

/// A balanced `{ ... }` region cut out of a list of lines.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Block<'a> {
    /// 0-based index of the line holding the opening brace.
    pub start: usize,
    /// 0-based index of the line where depth returned to zero (inclusive).
    pub end: usize,
    pub lines: Vec<&'a str>,
}

impl Block<'_> {
    pub fn text(&self) -> String {
        self.lines.join("\n")
    }
}

/// Extracts the brace-balanced block that starts at or shortly after `marker_line`.
///
/// Returns `None` when no `{` appears within [`BRACE_LOOKAHEAD`] lines of the marker.
/// An unterminated block runs to the end of input.
pub fn extract_braced_block<'a>(lines: &[&'a str], marker_line: usize) -> Option<Block<'a>> {
    let window_end = (marker_line + BRACE_LOOKAHEAD).min(lines.len());
    let start = (marker_line..window_end).find(|&i| lines[i].contains('{'))?;

    let mut depth: i64 = 0;
    let mut block = Vec::new();
    let mut end = start;
    for (i, line) in lines.iter().enumerate().skip(start) {
        depth += brace_delta(line);
        block.push(*line);
        end = i;
        if depth <= 0 {
            break;
        }
    }

    Some(Block {
        start,
        end,
        lines: block,
    })
}

/// Net change in `{`/`}` depth over one line.
pub fn brace_delta(line: &str) -> i64 {
    line.chars().fold(0, |acc, c| match c {
        '{' => acc + 1,
        '}' => acc - 1,
        _ => acc,
    })
}

pub fn count_char(line: &str, needle: char) -> usize {
    line.chars().filter(|&c| c == needle).count()
}

/// Joins lines from `start` until parenthesis depth returns to zero.
///
/// Returns the trimmed lines joined with single spaces and the index of the last
/// line consumed.
pub fn gather_parenthesized(lines: &[&str], start: usize) -> (String, usize) {
    let mut depth: i64 = 0;
    let mut parts = Vec::new();
    let mut last = start;
    for (i, line) in lines.iter().enumerate().skip(start) {
        for c in line.chars() {
            match c {
                '(' => depth += 1,
                ')' => depth -= 1,
                _ => {}
            }
        }
        parts.push(line.trim());
        last = i;
        if depth <= 0 {
            break;
        }
    }
    (parts.join(" "), last)
}

/// Content between the first `(` and the last `)` of `text`, trimmed.
///
/// Returns the trimmed input when the parentheses are missing or out of order.
pub fn outer_parenthesized(text: &str) -> String {
    match (text.find('('), text.rfind(')')) {
        (Some(open), Some(close)) if open < close => text[open + 1..close].trim().to_string(),
        _ => text.trim().to_string(),
    }
}

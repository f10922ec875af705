//! Structural parser for canonical schema-compiler output.
//!
//! Nesting is tracked with a name stack and a parallel stack of opening depths.
//! Closing is driven purely by brace arithmetic: a record closes the moment the
//! running depth falls to or below the depth at which it was opened.

use crate::model::{SchemaField, SchemaNode};
use crate::parser::scan::count_char;
use regex::Regex;
use std::sync::LazyLock;

static RECORD_OPEN: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"struct\s+(\w+)\s+@0x[0-9a-fA-F]+\s*\{").unwrap());
static FIELD: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"^\s+(\w+)\s+@(\d+)\s+:(\S+)").unwrap());
static ANNOTATION: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"\$(\w+)\(([^)]*)\)").unwrap());
static ANNOTATION_DECL: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"^\s+annotation\s+(\w+)\s+@0x").unwrap());
static TRAILING_COMMENT: LazyLock<Regex> = LazyLock::new(|| Regex::new(r"\s+#\s.*$").unwrap());

/// Parses canonical schema text into the records it declares.
///
/// The result is ordered by the moment each record was last closed, so nested
/// records precede the record that contains them.
pub fn parse_schema(text: &str) -> Vec<SchemaNode> {
    let mut parser = SchemaParser::default();
    for line in text.lines() {
        parser.feed(line);
    }
    parser.finish()
}

#[derive(Default)]
struct SchemaParser {
    /// Records that are no longer the current node.
    arena: Vec<SchemaNode>,
    names: Vec<String>,
    open_depths: Vec<usize>,
    depth: usize,
    current: Option<SchemaNode>,
}

impl SchemaParser {
    fn feed(&mut self, line: &str) {
        let opens = count_char(line, '{');
        let closes = count_char(line, '}');

        if let Some(caps) = RECORD_OPEN.captures(line) {
            self.open_record(&caps[1]);
        }
        self.depth += opens;

        if let Some(node) = self.current.as_mut() {
            if let Some(field) = parse_field(line) {
                node.fields.push(field);
            }
            if let Some(caps) = ANNOTATION_DECL.captures(line) {
                node.declared_annotations.push(caps[1].to_string());
            }
        }

        self.depth = self.depth.saturating_sub(closes);
        self.close_finished();
    }

    fn open_record(&mut self, name: &str) {
        if let Some(open) = self.current.take() {
            self.arena.push(open);
        }
        self.names.push(name.to_string());
        self.open_depths.push(self.depth);
        self.current = Some(SchemaNode::new(name, self.names.join(".")));
    }

    fn close_finished(&mut self) {
        while let Some(&opened_at) = self.open_depths.last() {
            if self.depth > opened_at {
                break;
            }

            let closed = self.current.take().map(|node| {
                let qualified = node.qualified_name.clone();
                self.arena.push(node);
                qualified
            });
            self.open_depths.pop();
            self.names.pop();

            if self.names.is_empty() {
                continue;
            }
            let parent_name = self.names.join(".");
            if let Some(idx) = self
                .arena
                .iter()
                .position(|n| n.qualified_name == parent_name)
            {
                let mut parent = self.arena.remove(idx);
                if let Some(child) = closed {
                    parent.nested.push(child);
                }
                self.current = Some(parent);
            }
        }
    }

    fn finish(mut self) -> Vec<SchemaNode> {
        if let Some(open) = self.current.take() {
            self.arena.push(open);
        }
        self.arena
    }
}

fn parse_field(line: &str) -> Option<SchemaField> {
    let caps = FIELD.captures(line)?;
    // Field ordinals are 16-bit; anything wider is not a field declaration.
    let ordinal = u32::from(caps[2].parse::<u16>().ok()?);
    let annotations = ANNOTATION
        .captures_iter(line)
        .map(|a| format!("${}({})", &a[1], &a[2]))
        .collect();
    let trimmed = line.trim();
    let raw = TRAILING_COMMENT.replace(trimmed, "");
    let raw = raw.strip_suffix(';').unwrap_or(&*raw).to_string();

    Some(SchemaField {
        name: caps[1].to_string(),
        ordinal,
        ty: caps[3].trim_end_matches([';', ',']).to_string(),
        annotations,
        raw,
    })
}

/// Finds a record by qualified name, falling back to its bare name.
pub fn find_record<'a>(nodes: &'a [SchemaNode], name: &str) -> Option<&'a SchemaNode> {
    nodes
        .iter()
        .find(|n| n.qualified_name == name)
        .or_else(|| nodes.iter().find(|n| n.name == name))
}

use serde::{Deserialize, Serialize};
use std::collections::BTreeSet;

/// One record type recovered from canonical schema text.
#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq, Eq)]
pub struct SchemaNode {
    pub name: String,
    /// Dot-joined ancestor path, e.g. `Worker.Module`.
    pub qualified_name: String,
    /// Fields declared directly in this record, in declaration order.
    pub fields: Vec<SchemaField>,
    pub declared_annotations: Vec<String>,
    /// Qualified names of records nested directly inside this one.
    pub nested: Vec<String>,
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct SchemaField {
    pub name: String,
    pub ordinal: u32,
    #[serde(rename = "type")]
    pub ty: String,
    pub annotations: Vec<String>,
    pub raw: String,
}

impl SchemaNode {
    pub fn new(name: impl Into<String>, qualified_name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            qualified_name: qualified_name.into(),
            ..Default::default()
        }
    }

    pub fn max_ordinal(&self) -> Option<u32> {
        self.fields.iter().map(|f| f.ordinal).max()
    }

    /// `max(ordinal) + 1`, or 0 for a record without fields.
    pub fn next_ordinal(&self) -> u32 {
        self.max_ordinal().map_or(0, |m| m.saturating_add(1))
    }

    /// Ordinals below the maximum that no field uses. These were retired and must not be reused.
    pub fn ordinal_gaps(&self) -> Vec<u32> {
        let Some(max) = self.max_ordinal() else {
            return Vec::new();
        };
        let used: BTreeSet<u32> = self.fields.iter().map(|f| f.ordinal).collect();
        (0..max).filter(|o| !used.contains(o)).collect()
    }
}

/// Next-ordinal summary for a single record.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct OrdinalReport {
    pub qualified_name: String,
    pub schema_file: String,
    pub total_fields: usize,
    pub next_ordinal: u32,
    pub highest: Option<HighestOrdinal>,
    pub gaps: Vec<u32>,
    pub declared_annotations: Vec<String>,
    pub last_fields: Vec<SchemaField>,
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct HighestOrdinal {
    pub ordinal: u32,
    pub field: String,
}

/// One-line summary per record, used when no record name is given.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct RecordSummary {
    pub qualified_name: String,
    pub total_fields: usize,
    pub highest: Option<u32>,
    pub next_ordinal: u32,
}

impl From<&SchemaNode> for RecordSummary {
    fn from(node: &SchemaNode) -> Self {
        Self {
            qualified_name: node.qualified_name.clone(),
            total_fields: node.fields.len(),
            highest: node.max_ordinal(),
            next_ordinal: node.next_ordinal(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn field(name: &str, ordinal: u32) -> SchemaField {
        SchemaField {
            name: name.to_string(),
            ordinal,
            ty: "Bool".to_string(),
            annotations: Vec::new(),
            raw: String::new(),
        }
    }

    #[test]
    fn test_next_ordinal_and_gaps() {
        let mut node = SchemaNode::new("Flags", "Flags");
        assert_eq!(node.next_ordinal(), 0);
        assert!(node.ordinal_gaps().is_empty());

        node.fields = vec![field("a", 0), field("b", 3), field("c", 1)];
        assert_eq!(node.next_ordinal(), 4);
        assert_eq!(node.ordinal_gaps(), vec![2]);
    }

    #[test]
    fn test_next_ordinal_saturates() {
        let mut node = SchemaNode::new("Wide", "Wide");
        node.fields = vec![field("a", u32::MAX)];
        assert_eq!(node.next_ordinal(), u32::MAX);
    }
}

use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::fmt;

/// Canonical labels a reference resolved to, with an optional note explaining how.
#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq, Eq)]
pub struct Resolution {
    pub labels: Vec<String>,
    pub note: Option<String>,
}

impl Resolution {
    pub fn new(labels: Vec<String>) -> Self {
        Self { labels, note: None }
    }

    pub fn with_note(mut self, note: impl Into<String>) -> Self {
        self.note = Some(note.into());
        self
    }
}

/// Labels grouped by ownership domain or origin repository, sorted by key.
pub type LabelGroups = BTreeMap<String, Vec<String>>;

#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "snake_case")]
pub enum Direction {
    /// What the target depends on.
    Forward,
    /// What depends on the target.
    Reverse,
}

#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "snake_case")]
pub enum UsageBreadth {
    Unused,
    Narrow,
    Moderate,
    Broad,
}

impl UsageBreadth {
    pub fn from_domain_count(domains: usize) -> Self {
        match domains {
            0 => UsageBreadth::Unused,
            1 => UsageBreadth::Narrow,
            2..=3 => UsageBreadth::Moderate,
            _ => UsageBreadth::Broad,
        }
    }
}

impl fmt::Display for UsageBreadth {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let s = match self {
            UsageBreadth::Unused => "unused",
            UsageBreadth::Narrow => "narrow",
            UsageBreadth::Moderate => "moderate",
            UsageBreadth::Broad => "broad",
        };
        f.write_str(s)
    }
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct DependencyReport {
    pub reference: String,
    pub direction: Direction,
    pub labels: Vec<String>,
    pub note: Option<String>,
    pub internal_deps: LabelGroups,
    pub external_deps: LabelGroups,
    pub reverse_deps: LabelGroups,
}

impl DependencyReport {
    pub fn new(reference: impl Into<String>, direction: Direction, resolution: Resolution) -> Self {
        Self {
            reference: reference.into(),
            direction,
            labels: resolution.labels,
            note: resolution.note,
            internal_deps: LabelGroups::new(),
            external_deps: LabelGroups::new(),
            reverse_deps: LabelGroups::new(),
        }
    }

    pub fn internal_total(&self) -> usize {
        self.internal_deps.values().map(Vec::len).sum()
    }

    pub fn external_total(&self) -> usize {
        self.external_deps.values().map(Vec::len).sum()
    }

    pub fn reverse_total(&self) -> usize {
        self.reverse_deps.values().map(Vec::len).sum()
    }

    pub fn breadth(&self) -> UsageBreadth {
        UsageBreadth::from_domain_count(self.reverse_deps.len())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_breadth_thresholds() {
        assert_eq!(UsageBreadth::from_domain_count(0), UsageBreadth::Unused);
        assert_eq!(UsageBreadth::from_domain_count(1), UsageBreadth::Narrow);
        assert_eq!(UsageBreadth::from_domain_count(3), UsageBreadth::Moderate);
        assert_eq!(UsageBreadth::from_domain_count(4), UsageBreadth::Broad);
    }
}

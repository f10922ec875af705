//! Label syntax: ecosystem qualifiers, internal/external classification, and grouping.

use crate::config::{GraphSettings, ResolverTables};
use crate::model::LabelGroups;
use serde::{Deserialize, Serialize};
use std::fmt;

#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "snake_case")]
pub enum Ecosystem {
    /// External C++ repositories, reached through the alias table.
    Cpp,
    /// Vendored Rust crates.
    Rust,
}

impl fmt::Display for Ecosystem {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Ecosystem::Cpp => f.write_str("C++"),
            Ecosystem::Rust => f.write_str("Rust"),
        }
    }
}

/// A user-supplied reference with its ecosystem qualifier split off.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Reference {
    pub ecosystem: Option<Ecosystem>,
    pub name: String,
}

impl Reference {
    pub fn parse(input: &str, tables: &ResolverTables) -> Self {
        let input = input.trim();
        let qualifiers = tables
            .rust_prefixes
            .iter()
            .map(|p| (p, Ecosystem::Rust))
            .chain(tables.cpp_prefixes.iter().map(|p| (p, Ecosystem::Cpp)));

        for (prefix, ecosystem) in qualifiers {
            let matches = input
                .get(..prefix.len())
                .is_some_and(|head| head.eq_ignore_ascii_case(prefix));
            if matches {
                return Self {
                    ecosystem: Some(ecosystem),
                    name: input[prefix.len()..].trim_start().to_string(),
                };
            }
        }

        Self {
            ecosystem: None,
            name: input.to_string(),
        }
    }

    pub fn is_canonical(&self) -> bool {
        is_canonical(&self.name)
    }
}

/// Already a label: internal `//...` or external `@...`/`@@...`.
pub fn is_canonical(reference: &str) -> bool {
    reference.starts_with("//") || reference.starts_with('@')
}

pub fn is_noise(label: &str, settings: &GraphSettings) -> bool {
    settings
        .noise_prefixes
        .iter()
        .any(|p| label.starts_with(p.as_str()))
}

pub fn is_internal(label: &str, settings: &GraphSettings) -> bool {
    label.starts_with(&settings.internal_prefix)
}

/// Ownership domain of an internal label: its package path below the internal
/// prefix, minus the configured leading segment. Anything else is `other`.
pub fn domain_of(label: &str, settings: &GraphSettings) -> String {
    let package = label
        .strip_prefix(&settings.internal_prefix)
        .and_then(|rest| rest.split_once(':'))
        .map(|(package, _)| package)
        .filter(|package| !package.is_empty());

    match package {
        Some(p) => p
            .strip_prefix(&settings.domain_strip_prefix)
            .unwrap_or(p)
            .to_string(),
        None => "other".to_string(),
    }
}

/// Origin repository of an external label.
///
/// `@repo//pkg:t` is `@repo`. A canonical `@@seg//pkg:t` name is reduced to
/// the last non-empty `+`-separated component of `seg`, so module-extension
/// prefixes and trailing version markers collapse to the bare repository.
pub fn repo_of(label: &str) -> String {
    let head = label.split("//").next().unwrap_or(label);

    if let Some(seg) = head.strip_prefix("@@") {
        if let Some(bare) = seg.rsplit('+').find(|c| !c.is_empty()) {
            return format!("@{}", bare);
        }
    }
    head.to_string()
}

pub fn group_by_domain<'a>(
    labels: impl IntoIterator<Item = &'a String>,
    settings: &GraphSettings,
) -> LabelGroups {
    let mut groups = LabelGroups::new();
    for label in labels {
        groups
            .entry(domain_of(label, settings))
            .or_default()
            .push(label.clone());
    }
    groups
}

pub fn group_by_repo<'a>(labels: impl IntoIterator<Item = &'a String>) -> LabelGroups {
    let mut groups = LabelGroups::new();
    for label in labels {
        groups.entry(repo_of(label)).or_default().push(label.clone());
    }
    groups
}

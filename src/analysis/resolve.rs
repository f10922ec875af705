//! Short-name to label resolution.
//!
//! Strategies run in a fixed order and the first one that yields labels wins.
//! An ecosystem qualifier restricts the run to that ecosystem's strategies.

use super::InputError;
use super::labels::{Ecosystem, Reference};
use crate::acquire::{GraphQuery, ToolError};
use crate::config::ResolverTables;
use crate::model::Resolution;
use std::fmt;
use std::sync::Arc;
use thiserror::Error;

/// One discovery attempt. Renders as the exact query it issued.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Strategy {
    /// All targets of an external repository.
    ExternalRepo { repo: String },
    /// Crate registry targets whose label mentions the crate name.
    CrateRegistry { registry: String, name: String },
    /// Registry repositories named after the crate.
    CrateRepository { registry: String, name: String },
}

impl Strategy {
    pub fn query(&self) -> String {
        match self {
            Strategy::ExternalRepo { repo } => format!("{}//...", repo),
            Strategy::CrateRegistry { registry, .. } => format!("{}//...", registry),
            Strategy::CrateRepository { registry, name } => format!(
                "filter(\"{}__{}\", //external:all-targets)",
                registry.trim_start_matches('@'),
                name
            ),
        }
    }
}

impl fmt::Display for Strategy {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Strategy::ExternalRepo { .. } => write!(f, "external repository: `{}`", self.query()),
            Strategy::CrateRegistry { name, .. } => write!(
                f,
                "Rust crate: `{}` (labels containing `:{}` or `/{}`)",
                self.query(),
                name,
                name
            ),
            Strategy::CrateRepository { .. } => write!(f, "Rust crate repository: `{}`", self.query()),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ResolveError {
    #[error(transparent)]
    Input(#[from] InputError),

    #[error(transparent)]
    Unresolved(#[from] Unresolved),
}

/// Nothing matched. Lists every strategy attempted, in order.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Unresolved {
    pub reference: String,
    pub ecosystem: Option<Ecosystem>,
    pub tried: Vec<Strategy>,
}

impl fmt::Display for Unresolved {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self.ecosystem {
            Some(eco) => writeln!(f, "Could not resolve {} dependency \"{}\".", eco, self.reference)?,
            None => writeln!(
                f,
                "Could not resolve \"{}\" to a dependency label.",
                self.reference
            )?,
        }
        writeln!(f)?;
        writeln!(f, "Tried:")?;
        for strategy in &self.tried {
            writeln!(f, "- {}", strategy)?;
        }
        writeln!(f)?;
        write!(
            f,
            "Provide a full label instead (e.g. `@ada-url//:ada`)"
        )?;
        if self.ecosystem.is_none() {
            write!(
                f,
                ", or qualify the name (`rust:{0}` or `cpp:{0}`) to narrow the search",
                self.reference
            )?;
        }
        write!(f, ".")
    }
}

impl std::error::Error for Unresolved {}

/// Resolves references against the build graph using immutable lookup tables.
#[derive(Clone)]
pub struct Resolver {
    tables: Arc<ResolverTables>,
    graph: Arc<dyn GraphQuery>,
}

impl Resolver {
    pub fn new(tables: ResolverTables, graph: Arc<dyn GraphQuery>) -> Self {
        Self {
            tables: Arc::new(tables),
            graph,
        }
    }

    pub fn tables(&self) -> &ResolverTables {
        &self.tables
    }

    pub fn parse(&self, input: &str) -> Reference {
        Reference::parse(input, &self.tables)
    }

    pub async fn resolve(&self, reference: &Reference) -> Result<Resolution, ResolveError> {
        if reference.name.is_empty() {
            return Err(InputError::EmptyReference.into());
        }
        if reference.is_canonical() {
            return Ok(Resolution::new(vec![reference.name.clone()]));
        }

        let name = reference.name.as_str();
        let mut tried = Vec::new();

        if reference.ecosystem != Some(Ecosystem::Rust) {
            let canonical = self
                .tables
                .aliases
                .get(&name.to_lowercase())
                .map(String::as_str)
                .unwrap_or(name);
            let labels = self.discover_external(canonical, &mut tried).await;
            if !labels.is_empty() {
                let resolution = Resolution::new(labels);
                return Ok(if canonical != name {
                    resolution.with_note(format!("Resolved alias \"{}\" to \"{}\"", name, canonical))
                } else {
                    resolution
                });
            }
        }

        if reference.ecosystem != Some(Ecosystem::Cpp) {
            let labels = self.discover_crate(name, &mut tried).await;
            if !labels.is_empty() {
                return Ok(Resolution::new(labels).with_note("Resolved as Rust crate"));
            }
        }

        if reference.ecosystem.is_none() {
            let raw = Strategy::ExternalRepo {
                repo: repo_name(name),
            };
            if !tried.contains(&raw) {
                let labels = self.discover_external(name, &mut tried).await;
                if !labels.is_empty() {
                    return Ok(Resolution::new(labels));
                }
            }
        }

        Err(Unresolved {
            reference: name.to_string(),
            ecosystem: reference.ecosystem,
            tried,
        }
        .into())
    }

    /// Lists an external repository, preferring top-level targets.
    async fn discover_external(&self, repo: &str, tried: &mut Vec<Strategy>) -> Vec<String> {
        let strategy = Strategy::ExternalRepo {
            repo: repo_name(repo),
        };
        let labels = self.run(&strategy).await;
        tried.push(strategy);

        let top_level: Vec<String> = labels
            .iter()
            .filter(|l| is_top_level(l))
            .cloned()
            .collect();
        let mut candidates = if top_level.is_empty() {
            labels
        } else {
            top_level
        };
        candidates.truncate(self.tables.external_cap);
        candidates
    }

    async fn discover_crate(&self, name: &str, tried: &mut Vec<Strategy>) -> Vec<String> {
        let registry = self.tables.crate_registry.clone();
        let needle = name.to_lowercase();

        let listing = Strategy::CrateRegistry {
            registry: registry.clone(),
            name: name.to_string(),
        };
        let mut matching: Vec<String> = self
            .run(&listing)
            .await
            .into_iter()
            .filter(|l| {
                let lower = l.to_lowercase();
                lower.contains(&format!(":{}", needle)) || lower.contains(&format!("/{}", needle))
            })
            .collect();
        tried.push(listing);
        if !matching.is_empty() {
            matching.truncate(self.tables.crate_cap);
            return matching;
        }

        let by_repository = Strategy::CrateRepository {
            registry,
            name: name.to_string(),
        };
        let mut labels = self.run(&by_repository).await;
        tried.push(by_repository);
        labels.truncate(self.tables.crate_cap);
        labels
    }

    async fn run(&self, strategy: &Strategy) -> Vec<String> {
        let query = strategy.query();
        self.graph
            .query(&query)
            .await
            .unwrap_or_else(|e| empty_on_failure(&query, e))
    }
}

pub(crate) fn empty_on_failure(query: &str, error: ToolError) -> Vec<String> {
    tracing::warn!(query, error = %error, "graph query failed; treating as no results");
    Vec::new()
}

fn repo_name(name: &str) -> String {
    if name.starts_with('@') {
        name.to_string()
    } else {
        format!("@{}", name)
    }
}

/// `@repo//pkg:target` with neither a nested package nor a nested target.
fn is_top_level(label: &str) -> bool {
    let Some((_, rest)) = label.split_once("//") else {
        return false;
    };
    match rest.split_once(':') {
        Some((package, target)) => !package.contains('/') && !target.contains('/'),
        None => false,
    }
}

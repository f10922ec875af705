//! Forward and reverse dependency queries.

use super::labels::{self, Reference};
use super::InputError;
use super::resolve::{ResolveError, Resolver, Unresolved, empty_on_failure};
use crate::acquire::GraphQuery;
use crate::config::GraphSettings;
use crate::model::{DependencyReport, Direction, Resolution};
use futures::future::join_all;
use std::collections::BTreeSet;
use std::path::Path;
use std::sync::Arc;

#[derive(Clone)]
pub struct DependencyQuery {
    resolver: Resolver,
    graph: Arc<dyn GraphQuery>,
    settings: GraphSettings,
}

impl DependencyQuery {
    pub fn new(resolver: Resolver, graph: Arc<dyn GraphQuery>, settings: GraphSettings) -> Self {
        Self {
            resolver,
            graph,
            settings,
        }
    }

    /// What `target` depends on, plus its direct internal dependents.
    pub async fn query_forward(
        &self,
        target: &str,
        depth: u32,
    ) -> Result<DependencyReport, ResolveError> {
        let label = self.resolve_target(target).await?;
        let forward = format!("deps({}, {})", label, depth);
        let reverse = format!("rdeps({}, {}, 1)", self.settings.internal_scope, label);

        let (forward_labels, reverse_labels) =
            tokio::join!(self.query_or_empty(&forward), self.query_or_empty(&reverse));

        let mut internal = Vec::new();
        let mut external = Vec::new();
        for l in forward_labels {
            if l == label || labels::is_noise(&l, &self.settings) {
                continue;
            }
            if labels::is_internal(&l, &self.settings) {
                internal.push(l);
            } else if l.starts_with('@') {
                external.push(l);
            }
        }
        internal.sort();
        external.sort();

        let mut dependents: Vec<String> = reverse_labels
            .into_iter()
            .filter(|l| *l != label && labels::is_internal(l, &self.settings))
            .collect();
        dependents.sort();
        dependents.dedup();

        let mut report = DependencyReport::new(
            target,
            Direction::Forward,
            Resolution::new(vec![label]),
        );
        report.internal_deps = labels::group_by_domain(&internal, &self.settings);
        report.external_deps = labels::group_by_repo(&external);
        report.reverse_deps = labels::group_by_domain(&dependents, &self.settings);
        Ok(report)
    }

    /// What depends on `reference` inside the internal scope.
    pub async fn query_reverse(
        &self,
        reference: &str,
        depth: u32,
    ) -> Result<DependencyReport, ResolveError> {
        let parsed = self.resolver.parse(reference);
        let resolution = self.resolver.resolve(&parsed).await?;

        let queries: Vec<String> = resolution
            .labels
            .iter()
            .map(|l| format!("rdeps({}, {}, {})", self.settings.internal_scope, l, depth))
            .collect();
        let results = join_all(queries.iter().map(|q| self.query_or_empty(q))).await;

        let dependents: BTreeSet<String> = results
            .into_iter()
            .flatten()
            .filter(|l| labels::is_internal(l, &self.settings))
            .collect();

        let mut report = DependencyReport::new(reference, Direction::Reverse, resolution);
        report.reverse_deps = labels::group_by_domain(&dependents, &self.settings);
        Ok(report)
    }

    /// Maps a forward-query target to a single label.
    pub async fn resolve_target(&self, target: &str) -> Result<String, ResolveError> {
        let parsed: Reference = self.resolver.parse(target);
        if parsed.name.is_empty() {
            return Err(InputError::EmptyReference.into());
        }
        if parsed.is_canonical() {
            return Ok(parsed.name);
        }

        if parsed.ecosystem.is_some() {
            let resolution = self.resolver.resolve(&parsed).await?;
            return resolution.labels.into_iter().next().ok_or_else(|| {
                Unresolved {
                    reference: parsed.name,
                    ecosystem: parsed.ecosystem,
                    tried: Vec::new(),
                }
                .into()
            });
        }

        let file = if parsed.name.starts_with("src/") {
            parsed.name.clone()
        } else {
            format!("src/{}", parsed.name)
        };
        let path = Path::new(&file);
        let dir = path
            .parent()
            .map(|d| d.to_string_lossy().into_owned())
            .unwrap_or_default();

        let rules = self
            .query_or_empty(&format!("kind(\"rule\", //{}/...)", dir))
            .await;
        if !rules.is_empty() {
            let stem = path
                .file_stem()
                .map(|s| s.to_string_lossy().into_owned())
                .unwrap_or_default();
            let suffix = format!(":{}", stem);
            let exact = rules.iter().find(|l| l.ends_with(&suffix));
            return Ok(exact.unwrap_or(&rules[0]).clone());
        }

        let base = Path::new(&dir)
            .file_name()
            .map(|s| s.to_string_lossy().into_owned())
            .unwrap_or_default();
        Ok(format!("//{}:{}", dir, base))
    }

    async fn query_or_empty(&self, expression: &str) -> Vec<String> {
        self.graph
            .query(expression)
            .await
            .unwrap_or_else(|e| empty_on_failure(expression, e))
    }
}

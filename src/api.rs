//! Library API for declmap.
//!
//! A [`Project`] binds a project root to its configuration and to the three
//! text sources every query draws on. The CLI and the MCP server are thin
//! wrappers over these methods; callers embedding declmap use them directly.
//!
//! # Example
//!
//! ```no_run
//! use declmap::{Direction, Project};
//! use std::path::Path;
//!
//! # async fn run() -> Result<(), declmap::DeclmapError> {
//! let project = Project::open(Path::new("."))?;
//! let model = project.interface("ReadableStream").await?;
//! println!("{} methods", model.methods.len());
//!
//! let report = project.dependencies("ssl", Direction::Reverse, 1).await?;
//! println!("{} dependents ({} usage)", report.reverse_total(), report.breadth());
//! # Ok(())
//! # }
//! ```

use crate::acquire::{
    BazelQuery, CapnpCompiler, GraphQuery, SchemaCompiler, TextSearch, WalkSearch,
};
use crate::analysis::{
    self, CompatError, CompatReport, DependencyQuery, ExtractError, InputError, OrdinalOutcome,
    ResolveError, Resolver, SchemaError,
};
use crate::config::{Config, ConfigError};
use crate::fs::{FileSystem, RealFs};
use crate::model::{CrossReference, DependencyReport, Direction, InterfaceModel};
use std::path::{Path, PathBuf};
use std::sync::Arc;
use thiserror::Error;

#[derive(Debug, Error)]
pub enum DeclmapError {
    #[error("Path not found: {}", .0.display())]
    PathNotFound(PathBuf),

    #[error("Configuration error: {0}")]
    Config(#[from] ConfigError),

    #[error(transparent)]
    Input(#[from] InputError),

    #[error(transparent)]
    Extract(#[from] ExtractError),

    #[error(transparent)]
    Schema(#[from] SchemaError),

    #[error(transparent)]
    Resolve(#[from] ResolveError),

    #[error(transparent)]
    Compat(#[from] CompatError),
}

/// A project root with its configuration and text sources.
#[derive(Clone)]
pub struct Project {
    root: PathBuf,
    config: Config,
    search: Arc<dyn TextSearch>,
    graph: Arc<dyn GraphQuery>,
    compiler: Arc<dyn SchemaCompiler>,
    fs: Arc<dyn FileSystem>,
}

impl Project {
    /// Resolves `root`, loads its `.declmap.toml` and wires up the real tools.
    pub fn open(root: &Path) -> Result<Self, DeclmapError> {
        let root = root
            .canonicalize()
            .map_err(|_| DeclmapError::PathNotFound(root.to_path_buf()))?;
        let config = Config::load(&root)?;
        Ok(Self::with_config(root, config))
    }

    /// Uses `config` as given, without reading a configuration file.
    pub fn with_config(root: impl Into<PathBuf>, config: Config) -> Self {
        let root = root.into();
        let search = WalkSearch::new(
            &root,
            &config.search.source_dir,
            config.search.max_results,
        );
        let graph = BazelQuery::new(&config.graph.tool, &root);
        let compiler = CapnpCompiler::new(&root, &config.graph.tool, config.schema.clone());

        Self {
            search: Arc::new(search),
            graph: Arc::new(graph),
            compiler: Arc::new(compiler),
            fs: Arc::new(RealFs),
            root,
            config,
        }
    }

    pub fn with_search(mut self, search: Arc<dyn TextSearch>) -> Self {
        self.search = search;
        self
    }

    pub fn with_graph(mut self, graph: Arc<dyn GraphQuery>) -> Self {
        self.graph = graph;
        self
    }

    pub fn with_compiler(mut self, compiler: Arc<dyn SchemaCompiler>) -> Self {
        self.compiler = compiler;
        self
    }

    pub fn with_fs(mut self, fs: Arc<dyn FileSystem>) -> Self {
        self.fs = fs;
        self
    }

    pub fn root(&self) -> &Path {
        &self.root
    }

    pub fn config(&self) -> &Config {
        &self.config
    }

    /// The interface model registered for `type_name`.
    pub async fn interface(&self, type_name: &str) -> Result<InterfaceModel, DeclmapError> {
        let model = analysis::extract_interface(
            type_name,
            self.search.as_ref(),
            self.fs.as_ref(),
            &self.root,
            &self.config.search,
        )
        .await?;
        Ok(model)
    }

    /// Ordinal report for `record` in the schema `file`, or a summary of all records.
    pub async fn ordinal(
        &self,
        file: &Path,
        record: Option<&str>,
    ) -> Result<OrdinalOutcome, DeclmapError> {
        Ok(analysis::next_ordinal(self.compiler.as_ref(), file, record).await?)
    }

    pub async fn dependencies(
        &self,
        target: &str,
        direction: Direction,
        depth: u32,
    ) -> Result<DependencyReport, DeclmapError> {
        let resolver = Resolver::new(self.config.resolver.clone(), self.graph.clone());
        let query = DependencyQuery::new(resolver, self.graph.clone(), self.config.graph.clone());
        let target = target.trim();
        let report = match direction {
            Direction::Forward => query.query_forward(target, depth).await?,
            Direction::Reverse => query.query_reverse(target, depth).await?,
        };
        Ok(report)
    }

    /// Compatibility flags from the configured schema, optionally filtered by
    /// name and classified at `date`.
    pub async fn compat(
        &self,
        date: Option<&str>,
        flag: Option<&str>,
    ) -> Result<CompatReport, DeclmapError> {
        let file = &self.config.schema.compat_file;
        Ok(analysis::compat_report(self.compiler.as_ref(), file, date, flag).await?)
    }

    pub async fn cross_reference(&self, symbol: &str) -> Result<CrossReference, DeclmapError> {
        let xref = analysis::cross_reference(
            symbol,
            self.search.as_ref(),
            self.fs.as_ref(),
            &self.root,
            &self.config.search,
        )
        .await?;
        Ok(xref)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::acquire::fake::{FakeCompiler, FakeGraph, FakeSearch};

    fn project() -> Project {
        Project::with_config("/repo", Config::default())
            .with_search(Arc::new(FakeSearch::new()))
            .with_graph(Arc::new(FakeGraph::new()))
    }

    #[test]
    fn test_open_missing_root() {
        let err = Project::open(Path::new("/definitely/not/here")).err().unwrap();
        assert!(matches!(err, DeclmapError::PathNotFound(_)));
    }

    #[tokio::test]
    async fn test_malformed_identifier_is_input_error() {
        let err = project().interface("Foo Bar").await.unwrap_err();
        assert!(matches!(
            err,
            DeclmapError::Extract(ExtractError::Input(InputError::InvalidIdentifier { .. }))
        ));
    }

    #[tokio::test]
    async fn test_compat_uses_configured_file() {
        let compiler = Arc::new(FakeCompiler::with_output(
            "struct CompatibilityFlags @0x1 {\n  a @0 :Bool $compatEnableAllDates();\n}\n",
        ));
        let project = project().with_compiler(compiler.clone());
        let report = project.compat(None, None).await.unwrap();
        assert!(matches!(report, CompatReport::Listing(_)));
        assert_eq!(compiler.calls(), 1);
    }

    #[tokio::test]
    async fn test_unresolvable_dependency_is_resolve_error() {
        let err = project()
            .dependencies("rust:nothing", Direction::Reverse, 1)
            .await
            .unwrap_err();
        assert!(matches!(err, DeclmapError::Resolve(_)));
        assert!(err.to_string().contains("nothing"));
    }
}

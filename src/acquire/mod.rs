//! Text acquisition.
//!
//! Every piece of raw text the analyses consume comes through one of three
//! collaborators: a text search over the source tree, a build-graph query, and
//! a schema compiler. Each is a trait so analyses can be driven by fakes.

mod compiler;
mod graph;
mod search;

pub use compiler::{CapnpCompiler, SchemaCompiler};
pub use graph::{BazelQuery, GraphQuery};
pub use search::{SearchRequest, TextSearch, WalkSearch};

use thiserror::Error;

#[derive(Debug, Error)]
pub enum ToolError {
    #[error("`{tool}` is not available. Run:\n  {hint}")]
    Unavailable { tool: String, hint: String },

    #[error("`{tool}` failed ({status}): {detail}")]
    Failed {
        tool: String,
        status: String,
        detail: String,
    },

    #[error("failed to run `{tool}`: {source}")]
    Io {
        tool: String,
        #[source]
        source: std::io::Error,
    },

    #[error("invalid search pattern `{pattern}`: {source}")]
    InvalidPattern {
        pattern: String,
        #[source]
        source: regex::Error,
    },

    #[error("invalid file glob `{glob}`: {source}")]
    InvalidGlob {
        glob: String,
        #[source]
        source: ignore::Error,
    },

    #[error("search task failed: {0}")]
    Join(#[from] tokio::task::JoinError),
}

impl ToolError {
    /// Maps a spawn failure, treating a missing executable as unavailable.
    pub(crate) fn spawn(tool: &str, hint: impl Into<String>, source: std::io::Error) -> Self {
        if source.kind() == std::io::ErrorKind::NotFound {
            ToolError::Unavailable {
                tool: tool.to_string(),
                hint: hint.into(),
            }
        } else {
            ToolError::Io {
                tool: tool.to_string(),
                source,
            }
        }
    }
}

#[cfg(test)]
pub mod fake {
    //! In-memory collaborators for unit tests.

    use super::*;
    use crate::model::SearchHit;
    use async_trait::async_trait;
    use std::collections::{HashMap, HashSet};
    use std::path::Path;
    use std::sync::Mutex;

    fn failure(tool: &str, what: &str) -> ToolError {
        ToolError::Failed {
            tool: tool.to_string(),
            status: "exit status: 1".to_string(),
            detail: what.to_string(),
        }
    }

    /// Answers build-graph queries from a fixed table and records every expression asked.
    #[derive(Debug, Default)]
    pub struct FakeGraph {
        answers: HashMap<String, Vec<String>>,
        failing: HashSet<String>,
        calls: Mutex<Vec<String>>,
    }

    impl FakeGraph {
        pub fn new() -> Self {
            Self::default()
        }

        pub fn answer(mut self, expression: &str, labels: &[&str]) -> Self {
            self.answers.insert(
                expression.to_string(),
                labels.iter().map(|l| l.to_string()).collect(),
            );
            self
        }

        pub fn fail(mut self, expression: &str) -> Self {
            self.failing.insert(expression.to_string());
            self
        }

        pub fn calls(&self) -> Vec<String> {
            self.calls.lock().unwrap().clone()
        }
    }

    #[async_trait]
    impl GraphQuery for FakeGraph {
        async fn query(&self, expression: &str) -> Result<Vec<String>, ToolError> {
            self.calls.lock().unwrap().push(expression.to_string());
            if self.failing.contains(expression) {
                return Err(failure("bazel", expression));
            }
            Ok(self.answers.get(expression).cloned().unwrap_or_default())
        }
    }

    /// Answers text searches keyed on the exact pattern.
    #[derive(Debug, Default)]
    pub struct FakeSearch {
        answers: HashMap<String, Vec<SearchHit>>,
        failing: HashSet<String>,
        calls: Mutex<Vec<SearchRequest>>,
    }

    impl FakeSearch {
        pub fn new() -> Self {
            Self::default()
        }

        pub fn answer(mut self, pattern: &str, hits: Vec<SearchHit>) -> Self {
            self.answers.insert(pattern.to_string(), hits);
            self
        }

        pub fn fail(mut self, pattern: &str) -> Self {
            self.failing.insert(pattern.to_string());
            self
        }

        pub fn calls(&self) -> Vec<SearchRequest> {
            self.calls.lock().unwrap().clone()
        }
    }

    pub fn hit(path: &str, line: usize, text: &str) -> SearchHit {
        SearchHit {
            path: path.into(),
            line,
            text: text.to_string(),
        }
    }

    #[async_trait]
    impl TextSearch for FakeSearch {
        async fn search(&self, request: &SearchRequest) -> Result<Vec<SearchHit>, ToolError> {
            self.calls.lock().unwrap().push(request.clone());
            if self.failing.contains(&request.pattern) {
                return Err(failure("search", &request.pattern));
            }
            Ok(self
                .answers
                .get(&request.pattern)
                .cloned()
                .unwrap_or_default())
        }
    }

    /// Returns canned schema text, or fails when constructed without any.
    #[derive(Debug, Default)]
    pub struct FakeCompiler {
        output: Option<String>,
        calls: Mutex<usize>,
    }

    impl FakeCompiler {
        pub fn with_output(output: &str) -> Self {
            Self {
                output: Some(output.to_string()),
                calls: Mutex::new(0),
            }
        }

        pub fn unavailable() -> Self {
            Self::default()
        }

        pub fn calls(&self) -> usize {
            *self.calls.lock().unwrap()
        }
    }

    #[async_trait]
    impl SchemaCompiler for FakeCompiler {
        async fn compile(&self, _file: &Path) -> Result<String, ToolError> {
            *self.calls.lock().unwrap() += 1;
            self.output.clone().ok_or_else(|| ToolError::Unavailable {
                tool: "capnp".to_string(),
                hint: "bazel build @capnp-cpp//src/capnp:capnp_tool".to_string(),
            })
        }
    }
}

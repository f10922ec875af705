use super::ToolError;
use crate::model::SearchHit;
use async_trait::async_trait;
use ignore::WalkBuilder;
use ignore::overrides::OverrideBuilder;
use rayon::prelude::*;
use regex::Regex;
use std::path::{Path, PathBuf};

/// One text search: a regular expression applied line by line to the files
/// matching any of `globs`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SearchRequest {
    pub pattern: String,
    pub globs: Vec<String>,
    /// Report each matching file once (line 0) instead of every matching line.
    pub files_only: bool,
    pub max_results: Option<usize>,
}

impl SearchRequest {
    pub fn new(pattern: impl Into<String>, glob: &str) -> Self {
        Self {
            pattern: pattern.into(),
            globs: vec![glob.to_string()],
            files_only: false,
            max_results: None,
        }
    }

    pub fn with_globs(mut self, globs: &[&str]) -> Self {
        self.globs = globs.iter().map(|g| g.to_string()).collect();
        self
    }

    pub fn files_only(mut self) -> Self {
        self.files_only = true;
        self
    }

    pub fn limit(mut self, max: usize) -> Self {
        self.max_results = Some(max);
        self
    }
}

#[async_trait]
pub trait TextSearch: Send + Sync {
    /// Returns matches in path order. Paths are relative to the project root.
    async fn search(&self, request: &SearchRequest) -> Result<Vec<SearchHit>, ToolError>;
}

/// In-process search: walks the source directory honouring `.gitignore`,
/// skipping hidden entries, and scans candidate files in parallel.
#[derive(Debug, Clone)]
pub struct WalkSearch {
    root: PathBuf,
    source_dir: PathBuf,
    default_limit: usize,
}

impl WalkSearch {
    pub fn new(root: impl Into<PathBuf>, source_dir: impl AsRef<Path>, default_limit: usize) -> Self {
        let root = root.into();
        let source_dir = root.join(source_dir);
        Self {
            root,
            source_dir,
            default_limit,
        }
    }
}

#[async_trait]
impl TextSearch for WalkSearch {
    async fn search(&self, request: &SearchRequest) -> Result<Vec<SearchHit>, ToolError> {
        let root = self.root.clone();
        let dir = self.source_dir.clone();
        let request = request.clone();
        let limit = request.max_results.unwrap_or(self.default_limit);

        tracing::debug!(pattern = %request.pattern, globs = ?request.globs, "text search");
        tokio::task::spawn_blocking(move || search_tree(&root, &dir, &request, limit)).await?
    }
}

fn search_tree(
    root: &Path,
    dir: &Path,
    request: &SearchRequest,
    limit: usize,
) -> Result<Vec<SearchHit>, ToolError> {
    let regex = Regex::new(&request.pattern).map_err(|source| ToolError::InvalidPattern {
        pattern: request.pattern.clone(),
        source,
    })?;

    let mut overrides = OverrideBuilder::new(dir);
    for glob in &request.globs {
        overrides
            .add(glob)
            .map_err(|source| ToolError::InvalidGlob {
                glob: glob.clone(),
                source,
            })?;
    }
    let overrides = overrides.build().map_err(|source| ToolError::InvalidGlob {
        glob: request.globs.join(","),
        source,
    })?;

    let walker = WalkBuilder::new(dir)
        .hidden(true)
        .git_ignore(true)
        .overrides(overrides)
        .build();

    let mut files: Vec<PathBuf> = walker
        .flatten()
        .filter(|entry| entry.file_type().is_some_and(|t| t.is_file()))
        .map(|entry| entry.into_path())
        .collect();
    files.sort();

    let per_file: Vec<Vec<SearchHit>> = files
        .par_iter()
        .map(|file| scan_file(root, file, &regex, request.files_only))
        .collect();

    let mut hits: Vec<SearchHit> = per_file.into_iter().flatten().collect();
    hits.truncate(limit);
    Ok(hits)
}

fn scan_file(root: &Path, file: &Path, regex: &Regex, files_only: bool) -> Vec<SearchHit> {
    // Unreadable or non-UTF-8 files are not searchable text.
    let Ok(content) = std::fs::read_to_string(file) else {
        return Vec::new();
    };
    let path = file.strip_prefix(root).unwrap_or(file).to_path_buf();

    if files_only {
        return if content.lines().any(|line| regex.is_match(line)) {
            vec![SearchHit {
                path,
                line: 0,
                text: String::new(),
            }]
        } else {
            Vec::new()
        };
    }

    content
        .lines()
        .enumerate()
        .filter(|(_, line)| regex.is_match(line))
        .map(|(i, line)| SearchHit {
            path: path.clone(),
            line: i + 1,
            text: line.to_string(),
        })
        .collect()
}

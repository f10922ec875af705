use serde::{Deserialize, Serialize};
use std::path::PathBuf;

/// A single line matched by a text search.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct SearchHit {
    pub path: PathBuf,
    /// 1-based line number, 0 for file-only matches.
    pub line: usize,
    pub text: String,
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct FileCount {
    pub path: PathBuf,
    pub references: usize,
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct TypeGroup {
    pub macro_name: String,
    pub path: PathBuf,
    pub line: usize,
}

/// Everything known about one symbol across declarations, implementation and tests.
#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq, Eq)]
pub struct CrossReference {
    pub symbol: String,
    /// The primary declaration first, followed by other header references.
    pub declarations: Vec<SearchHit>,
    pub implementations: Vec<FileCount>,
    pub registration: Option<SearchHit>,
    pub registered_members: Vec<String>,
    pub type_group: Option<TypeGroup>,
    pub gating: Vec<SearchHit>,
    pub tests: Vec<PathBuf>,
}

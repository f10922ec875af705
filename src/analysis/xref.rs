//! One-shot cross-reference for a symbol.

use super::{InputError, or_empty, validate_identifier};
use crate::acquire::{SearchRequest, TextSearch};
use crate::config::SearchSettings;
use crate::fs::FileSystem;
use crate::model::{CrossReference, FileCount, SearchHit, TypeGroup};
use crate::parser::extract_braced_block;
use regex::Regex;
use std::path::{Path, PathBuf};
use std::sync::LazyLock;

/// Lines after a type-group macro definition that may list its members.
const TYPE_GROUP_SPAN: usize = 80;
const MAX_MEMBERS: usize = 30;

static PRIMARY_DECLARATION: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"class\s+\w+\s*(final\s*)?[:{]").unwrap());
static TYPE_GROUP: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"\b(EW_\w+_ISOLATE_TYPES)\b").unwrap());
static MEMBER: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(
        r"JSG_(METHOD|STATIC_METHOD|READONLY_PROTOTYPE_PROPERTY|PROTOTYPE_PROPERTY|LAZY_INSTANCE_PROPERTY|LAZY_READONLY_INSTANCE_PROPERTY|INSTANCE_PROPERTY|READONLY_INSTANCE_PROPERTY|NESTED_TYPE|INHERIT|TS_)",
    )
    .unwrap()
});

/// Runs the six lookups for `symbol` concurrently. A failed lookup leaves its
/// section empty and does not affect the others.
pub async fn cross_reference(
    symbol: &str,
    search: &dyn TextSearch,
    fs: &dyn FileSystem,
    root: &Path,
    settings: &SearchSettings,
) -> Result<CrossReference, InputError> {
    validate_identifier("symbol", symbol)?;
    let sym = regex::escape(symbol);
    let header = settings.header_glob.as_str();

    let declarations = SearchRequest::new(format!(r"class\s+{}\b", sym), header);
    let implementations = SearchRequest::new(format!(r"\b{}::", sym), &settings.impl_glob);
    let registration = SearchRequest::new(format!(r"JSG_RESOURCE_TYPE\s*\(\s*{}\b", sym), header);
    let tests = SearchRequest::new(format!(r"\b{}\b", sym), "*test*.js")
        .with_globs(&["*test*.js", "*test*.ts", "*test*.c++", "*.wd-test"])
        .files_only();
    let gating = SearchRequest::new(
        format!(r"flags\.get\w*\(\).*\b{0}\b|\b{0}\b.*flags\.get", sym),
        header,
    );

    let (declarations, implementations, registration, tests, gating, type_group) = tokio::join!(
        run(search, &declarations),
        run(search, &implementations),
        run(search, &registration),
        run(search, &tests),
        run(search, &gating),
        find_type_group(symbol, search, fs, root, header),
    );

    let registration = registration.into_iter().next();
    let registered_members = registration
        .as_ref()
        .map(|hit| registered_members(hit, fs, root))
        .unwrap_or_default();

    Ok(CrossReference {
        symbol: symbol.to_string(),
        declarations: primary_first(declarations),
        implementations: count_by_file(implementations),
        registration,
        registered_members,
        type_group,
        gating,
        tests: unique_paths(tests),
    })
}

async fn run(search: &dyn TextSearch, request: &SearchRequest) -> Vec<SearchHit> {
    or_empty(search.search(request).await, &request.pattern)
}

/// Moves the first hit that looks like a class definition to the front.
fn primary_first(mut hits: Vec<SearchHit>) -> Vec<SearchHit> {
    if let Some(pos) = hits
        .iter()
        .position(|h| PRIMARY_DECLARATION.is_match(&h.text))
    {
        let primary = hits.remove(pos);
        hits.insert(0, primary);
    }
    hits
}

fn count_by_file(hits: Vec<SearchHit>) -> Vec<FileCount> {
    let mut counts: Vec<FileCount> = Vec::new();
    for hit in hits {
        match counts.iter_mut().find(|c| c.path == hit.path) {
            Some(count) => count.references += 1,
            None => counts.push(FileCount {
                path: hit.path,
                references: 1,
            }),
        }
    }
    counts
}

fn unique_paths(hits: Vec<SearchHit>) -> Vec<PathBuf> {
    let mut paths: Vec<PathBuf> = Vec::new();
    for hit in hits {
        if !paths.contains(&hit.path) {
            paths.push(hit.path);
        }
    }
    paths
}

/// Member declarations from the registration block at `hit`.
fn registered_members(hit: &SearchHit, fs: &dyn FileSystem, root: &Path) -> Vec<String> {
    let Ok(content) = fs.read_to_string(&root.join(&hit.path)) else {
        return Vec::new();
    };
    let lines: Vec<&str> = content.lines().collect();
    let Some(block) = extract_braced_block(&lines, hit.line.saturating_sub(1)) else {
        return Vec::new();
    };

    block
        .lines
        .iter()
        .map(|l| l.trim())
        .filter(|l| MEMBER.is_match(l))
        .take(MAX_MEMBERS)
        .map(str::to_string)
        .collect()
}

/// Finds the isolate type-group macro whose definition line, or one of the
/// lines that follow it, names the symbol.
async fn find_type_group(
    symbol: &str,
    search: &dyn TextSearch,
    fs: &dyn FileSystem,
    root: &Path,
    header: &str,
) -> Option<TypeGroup> {
    let request = SearchRequest::new(r"EW_\w+_ISOLATE_TYPES", header).files_only();
    let files = run(search, &request).await;
    let word = Regex::new(&format!(r"\b{}\b", regex::escape(symbol))).ok()?;

    for file in files {
        let Ok(content) = fs.read_to_string(&root.join(&file.path)) else {
            continue;
        };
        let lines: Vec<&str> = content.lines().collect();
        for (i, line) in lines.iter().enumerate() {
            let Some(caps) = TYPE_GROUP.captures(line) else {
                continue;
            };
            let end = (i + TYPE_GROUP_SPAN).min(lines.len().saturating_sub(1));
            if lines[i..=end].iter().any(|l| word.is_match(l)) {
                return Some(TypeGroup {
                    macro_name: caps[1].to_string(),
                    path: file.path.clone(),
                    line: i + 1,
                });
            }
        }
    }
    None
}

//! Interface model extraction for a single registered type.

use super::{InputError, or_empty, validate_identifier};
use crate::acquire::{SearchRequest, TextSearch};
use crate::config::SearchSettings;
use crate::fs::FileSystem;
use crate::model::{
    DocOverride, DocOverrideKind, InterfaceModel, RegistrationKind, SearchHit, SourceLocation,
    StructField,
};
use crate::parser::{
    BRACE_LOOKAHEAD, extract_braced_block, gather_parenthesized, outer_parenthesized,
    parse_registration_block,
};
use regex::Regex;
use std::path::{Path, PathBuf};
use thiserror::Error;

/// Lines before a `JSG_STRUCT(` that may hold the declaration it belongs to.
const STRUCT_LOOKBACK: usize = 100;

#[derive(Debug, Error)]
pub enum ExtractError {
    #[error(transparent)]
    Input(#[from] InputError),

    #[error(
        "No registration found for `{type_name}`. It may not be a registered type, or it may be registered under a different name."
    )]
    NotRegistered { type_name: String },

    #[error("Found `{}` but could not locate `JSG_RESOURCE_TYPE({type_name})` in it.", .file.display())]
    MarkerMissing { type_name: String, file: PathBuf },

    #[error(
        "Found `JSG_RESOURCE_TYPE({type_name})` at `{location}` but no opening brace follows within {} lines.",
        BRACE_LOOKAHEAD
    )]
    BlockMissing {
        type_name: String,
        location: SourceLocation,
    },

    #[error("Failed to read `{}`: {source}", .path.display())]
    Read {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
}

struct Candidate {
    hit: SearchHit,
    content: Option<String>,
    score: u32,
}

/// Finds the registration of `type_name` and parses it into an interface model.
///
/// A resource registration block is preferred. When none exists, a value-struct
/// registration inside a declaration of the type is used instead.
pub async fn extract_interface(
    type_name: &str,
    search: &dyn TextSearch,
    fs: &dyn FileSystem,
    root: &Path,
    settings: &SearchSettings,
) -> Result<InterfaceModel, ExtractError> {
    validate_identifier("type name", type_name)?;
    let name = regex::escape(type_name);

    let marker_request = SearchRequest::new(
        format!(r"JSG_RESOURCE_TYPE\s*\(\s*{}\b", name),
        &settings.header_glob,
    );
    let hits = or_empty(search.search(&marker_request).await, &marker_request.pattern);

    if !hits.is_empty() {
        return extract_resource(type_name, hits, fs, root);
    }

    let decl_request = SearchRequest::new(
        format!(r"(class|struct)\s+{}\b", name),
        &settings.header_glob,
    )
    .files_only();
    let files = or_empty(search.search(&decl_request).await, &decl_request.pattern);

    for hit in files {
        let path = root.join(&hit.path);
        let content = match fs.read_to_string(&path) {
            Ok(c) => c,
            Err(e) => {
                tracing::warn!(file = %path.display(), error = %e, "skipping unreadable header");
                continue;
            }
        };
        if let Some(model) = extract_struct(type_name, &hit.path, &content) {
            return Ok(model);
        }
    }

    Err(ExtractError::NotRegistered {
        type_name: type_name.to_string(),
    })
}

fn extract_resource(
    type_name: &str,
    hits: Vec<SearchHit>,
    fs: &dyn FileSystem,
    root: &Path,
) -> Result<InterfaceModel, ExtractError> {
    let top_level = Regex::new(&format!(r"(?m)^class {}\b", regex::escape(type_name)))
        .map_err(|_| InputError::InvalidIdentifier {
            what: "type name",
            value: type_name.to_string(),
        })?;
    let lowered = type_name.to_lowercase();

    let mut candidates: Vec<Candidate> = hits
        .into_iter()
        .map(|hit| {
            let content = fs.read_to_string(&root.join(&hit.path)).ok();
            let mut score = 0;
            let file_name = hit
                .path
                .file_name()
                .map(|n| n.to_string_lossy().to_lowercase())
                .unwrap_or_default();
            if file_name.contains(&lowered) {
                score += 10;
            }
            if content.as_deref().is_some_and(|c| top_level.is_match(c)) {
                score += 20;
            }
            Candidate {
                hit,
                content,
                score,
            }
        })
        .collect();

    let mut best = 0;
    for (i, candidate) in candidates.iter().enumerate() {
        if candidate.score > candidates[best].score {
            best = i;
        }
    }
    let chosen = candidates.remove(best);
    let also_registered_in = candidates
        .iter()
        .map(|c| SourceLocation::new(&c.hit.path, c.hit.line))
        .collect();
    tracing::debug!(
        file = %chosen.hit.path.display(),
        score = chosen.score,
        "selected registration candidate"
    );

    let content = match chosen.content {
        Some(c) => c,
        None => {
            let path = root.join(&chosen.hit.path);
            fs.read_to_string(&path)
                .map_err(|source| ExtractError::Read { path, source })?
        }
    };

    let mut model = parse_resource(type_name, &chosen.hit.path, &content)?;
    model.also_registered_in = also_registered_in;
    Ok(model)
}

/// Parses the resource registration of `type_name` out of one file's text.
pub fn parse_resource(
    type_name: &str,
    file: &Path,
    content: &str,
) -> Result<InterfaceModel, ExtractError> {
    let marker = Regex::new(&format!(
        r"JSG_RESOURCE_TYPE\s*\(\s*{}\b(?:\s*,\s*([^)]*))?",
        regex::escape(type_name)
    ))
    .map_err(|_| InputError::InvalidIdentifier {
        what: "type name",
        value: type_name.to_string(),
    })?;

    let lines: Vec<&str> = content.lines().collect();
    let (marker_line, condition) = lines
        .iter()
        .enumerate()
        .find_map(|(i, line)| {
            marker.captures(line).map(|caps| {
                let condition = caps
                    .get(1)
                    .map(|m| m.as_str().trim().to_string())
                    .filter(|c| !c.is_empty());
                (i, condition)
            })
        })
        .ok_or_else(|| ExtractError::MarkerMissing {
            type_name: type_name.to_string(),
            file: file.to_path_buf(),
        })?;

    let location = SourceLocation::new(file, marker_line + 1);
    let block = extract_braced_block(&lines, marker_line).ok_or_else(|| {
        ExtractError::BlockMissing {
            type_name: type_name.to_string(),
            location: location.clone(),
        }
    })?;

    let mut model = InterfaceModel::new(type_name, RegistrationKind::Resource { condition });
    model.location = location;
    parse_registration_block(&block.lines, &mut model);
    add_class_extras(type_name, content, &mut model);
    Ok(model)
}

static ITERATOR_DECLS: std::sync::LazyLock<Vec<Regex>> = std::sync::LazyLock::new(|| {
    [
        r"\bJSG_ITERATOR\s*\(\s*\w+\s*,\s*\w+\s*,",
        r"\bJSG_ASYNC_ITERATOR\s*\(\s*\w+\s*,\s*\w+\s*,",
        r"\bJSG_ITERATOR_TYPE\s*\(\s*\w+\s*,",
        r"\bJSG_ASYNC_ITERATOR_TYPE\s*\(\s*\w+\s*,",
    ]
    .iter()
    .filter_map(|p| Regex::new(p).ok())
    .collect()
});

/// Markers that live in the class body rather than the registration block.
fn add_class_extras(type_name: &str, content: &str, model: &mut InterfaceModel) {
    model.memory_info = content.contains(&format!("JSG_MEMORY_INFO({})", type_name));
    for pattern in ITERATOR_DECLS.iter() {
        for m in pattern.find_iter(content) {
            let decl = m.as_str().trim_end();
            let decl = decl.strip_suffix(',').unwrap_or(decl).trim_end();
            model.iterator_declarations.push(format!("{})", decl));
        }
    }
}

/// Struct form: a `JSG_STRUCT(...)` inside a declaration of `type_name`.
pub fn extract_struct(type_name: &str, file: &Path, content: &str) -> Option<InterfaceModel> {
    let decl = Regex::new(&format!(r"(class|struct)\s+{}\b", regex::escape(type_name))).ok()?;
    let lines: Vec<&str> = content.lines().collect();

    let (decl_line, struct_line) = lines.iter().enumerate().find_map(|(i, line)| {
        if !is_struct_marker(line) {
            return None;
        }
        let from = i.saturating_sub(STRUCT_LOOKBACK);
        (from..i)
            .rev()
            .find(|&j| decl.is_match(lines[j]))
            .map(|j| (j, i))
    })?;

    let (joined, _) = gather_parenthesized(&lines, struct_line);
    let from_marker = joined
        .find("JSG_STRUCT")
        .map_or(joined.as_str(), |pos| &joined[pos..]);
    let args = outer_parenthesized(from_marker);

    let mut model = InterfaceModel::new(type_name, RegistrationKind::Struct);
    model.location = SourceLocation::new(file, struct_line + 1);
    model.struct_fields = args
        .split(',')
        .map(str::trim)
        .filter(|f| !f.is_empty())
        .map(StructField::from_bound)
        .collect();

    let body_end = extract_braced_block(&lines, decl_line)
        .map_or(lines.len().saturating_sub(1), |b| b.end);
    let mut i = decl_line;
    while i <= body_end && i < lines.len() {
        let kind = if lines[i].contains("JSG_STRUCT_TS_OVERRIDE") {
            Some(DocOverrideKind::StructOverride)
        } else if lines[i].contains("JSG_STRUCT_TS_DEFINE") {
            Some(DocOverrideKind::StructDefine)
        } else {
            None
        };
        match kind {
            Some(kind) => {
                let (joined, last) = gather_parenthesized(&lines, i);
                let from_macro = joined
                    .find(kind.macro_name())
                    .map_or(joined.as_str(), |pos| &joined[pos..]);
                model.doc_overrides.push(DocOverride {
                    kind,
                    content: outer_parenthesized(from_macro),
                });
                i = last + 1;
            }
            None => i += 1,
        }
    }

    Some(model)
}

fn is_struct_marker(line: &str) -> bool {
    line.find("JSG_STRUCT")
        .is_some_and(|pos| line[pos + "JSG_STRUCT".len()..].trim_start().starts_with('('))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::acquire::fake::{FakeSearch, hit};
    use crate::fs::mock::MockFs;
    use crate::model::{Inheritance, PropertyLocation};

    const HEADER: &str = r#"
namespace workerd::api {

class AbortSignal final: public EventTarget {
 public:
  JSG_RESOURCE_TYPE(AbortSignal, CompatibilityFlags::Reader flags) {
    JSG_INHERIT(EventTarget);
    JSG_STATIC_METHOD(abort);
    JSG_READONLY_PROTOTYPE_PROPERTY(aborted, getAborted);
    JSG_METHOD(throwIfAborted);
    if (flags.getJsgPropertyOnPrototypeTemplate()) {
      JSG_PROTOTYPE_PROPERTY(onabort, getOnAbort, setOnAbort);
    }
  }

  JSG_MEMORY_INFO(AbortSignal) {}

  JSG_ITERATOR(EntryIterator, entries,
               kj::Array<kj::String>, IteratorState, entryIteratorNext);
};

}
"#;

    const NESTED: &str = r#"
class Outer {
  class AbortSignal {
    JSG_RESOURCE_TYPE(AbortSignal) {
      JSG_METHOD(nested);
    }
  };
};
"#;

    fn settings() -> SearchSettings {
        SearchSettings::default()
    }

    #[test]
    fn test_parse_resource_block_and_extras() {
        let model = parse_resource("AbortSignal", Path::new("src/abort.h"), HEADER).unwrap();

        assert_eq!(
            model.registration,
            RegistrationKind::Resource {
                condition: Some("CompatibilityFlags::Reader flags".to_string())
            }
        );
        assert_eq!(model.location.line, 6);
        assert_eq!(
            model.inherited_from,
            vec![Inheritance::Type("EventTarget".to_string())]
        );
        assert_eq!(model.methods.len(), 2);
        assert_eq!(model.properties.len(), 2);
        assert_eq!(model.properties[1].location, PropertyLocation::Prototype);
        assert!(model.memory_info);
        assert_eq!(
            model.iterator_declarations,
            vec!["JSG_ITERATOR(EntryIterator, entries)".to_string()]
        );
    }

    #[test]
    fn test_missing_brace_names_file_and_line() {
        let text = "JSG_RESOURCE_TYPE(Foo);\n\n\n\n\n\n{\n}\n";
        let err = parse_resource("Foo", Path::new("src/foo.h"), text).unwrap_err();
        let message = err.to_string();
        assert!(message.contains("src/foo.h:1"));
    }

    #[tokio::test]
    async fn test_top_level_declaration_outranks_nested_one() {
        let search = FakeSearch::new().answer(
            r"JSG_RESOURCE_TYPE\s*\(\s*AbortSignal\b",
            vec![
                hit("src/workerd/api/outer.h", 4, "    JSG_RESOURCE_TYPE(AbortSignal) {"),
                hit("src/workerd/api/basics.h", 6, "  JSG_RESOURCE_TYPE(AbortSignal, flags) {"),
            ],
        );
        let fs = MockFs::with_files([
            ("/repo/src/workerd/api/outer.h", NESTED),
            ("/repo/src/workerd/api/basics.h", HEADER),
        ]);

        let model = extract_interface("AbortSignal", &search, &fs, Path::new("/repo"), &settings())
            .await
            .unwrap();

        assert_eq!(model.location.file, PathBuf::from("src/workerd/api/basics.h"));
        assert_eq!(model.also_registered_in.len(), 1);
        assert_eq!(
            model.also_registered_in[0].file,
            PathBuf::from("src/workerd/api/outer.h")
        );
    }

    #[tokio::test]
    async fn test_filename_match_breaks_even_content_scores() {
        let search = FakeSearch::new().answer(
            r"JSG_RESOURCE_TYPE\s*\(\s*AbortSignal\b",
            vec![
                hit("src/a.h", 4, ""),
                hit("src/abortsignal.h", 4, ""),
            ],
        );
        let fs = MockFs::with_files([
            ("/repo/src/a.h", NESTED),
            ("/repo/src/abortsignal.h", NESTED),
        ]);

        let model = extract_interface("AbortSignal", &search, &fs, Path::new("/repo"), &settings())
            .await
            .unwrap();
        assert_eq!(model.location.file, PathBuf::from("src/abortsignal.h"));
    }

    #[tokio::test]
    async fn test_struct_form_when_no_resource_block() {
        let header = r#"
struct QueueSendOptions {
  jsg::Optional<kj::String> contentType;
  jsg::Optional<int> $delaySeconds;
  JSG_STRUCT(contentType,
             $delaySeconds);
  JSG_STRUCT_TS_OVERRIDE(QueueSendOptions {
    contentType?: QueueContentType;
  });
};
"#;
        let search = FakeSearch::new().answer(
            r"(class|struct)\s+QueueSendOptions\b",
            vec![hit("src/queue.h", 0, "")],
        );
        let fs = MockFs::with_files([("/repo/src/queue.h", header)]);

        let model = extract_interface("QueueSendOptions", &search, &fs, Path::new("/repo"), &settings())
            .await
            .unwrap();

        assert_eq!(model.registration, RegistrationKind::Struct);
        assert_eq!(model.struct_fields.len(), 2);
        assert_eq!(model.struct_fields[1].js_name, "delaySeconds");
        assert_eq!(model.struct_fields[1].bound_name, "$delaySeconds");
        assert_eq!(model.doc_overrides.len(), 1);
        assert_eq!(model.doc_overrides[0].kind, DocOverrideKind::StructOverride);
        assert!(model.doc_overrides[0].content.contains("contentType?"));
    }

    #[tokio::test]
    async fn test_search_failure_reads_as_not_registered() {
        let search = FakeSearch::new().fail(r"JSG_RESOURCE_TYPE\s*\(\s*Missing\b");
        let fs = MockFs::new();
        let err = extract_interface("Missing", &search, &fs, Path::new("/repo"), &settings())
            .await
            .unwrap_err();
        assert!(matches!(err, ExtractError::NotRegistered { .. }));
    }

    #[tokio::test]
    async fn test_malformed_type_name_is_rejected_before_searching() {
        let search = FakeSearch::new();
        let fs = MockFs::new();
        let err = extract_interface("Foo(", &search, &fs, Path::new("/repo"), &settings())
            .await
            .unwrap_err();
        assert!(matches!(err, ExtractError::Input(_)));
        assert!(search.calls().is_empty());
    }

    #[tokio::test]
    async fn test_unreadable_header_does_not_stop_struct_search() {
        let header = "struct RetryOptions {\n  int limit;\n  JSG_STRUCT(limit);\n};\n";
        let search = FakeSearch::new().answer(
            r"(class|struct)\s+RetryOptions\b",
            vec![hit("src/gone.h", 0, ""), hit("src/retry.h", 0, "")],
        );
        let fs = MockFs::with_files([("/repo/src/retry.h", header)]);

        let model = extract_interface("RetryOptions", &search, &fs, Path::new("/repo"), &settings())
            .await
            .unwrap();
        assert_eq!(model.location.file, PathBuf::from("src/retry.h"));
        assert_eq!(model.struct_fields[0].js_name, "limit");
    }

    #[tokio::test]
    async fn test_only_unreadable_headers_reads_as_not_registered() {
        let search = FakeSearch::new().answer(
            r"(class|struct)\s+RetryOptions\b",
            vec![hit("src/gone.h", 0, "")],
        );
        let fs = MockFs::new();
        let err = extract_interface("RetryOptions", &search, &fs, Path::new("/repo"), &settings())
            .await
            .unwrap_err();
        assert!(matches!(err, ExtractError::NotRegistered { .. }));
    }
}

//! Integration tests for the declmap library API.

use async_trait::async_trait;
use declmap::acquire::{GraphQuery, SchemaCompiler, ToolError};
use declmap::analysis::{CompatReport, OrdinalOutcome};
use declmap::model::{RegistrationKind, UsageBreadth};
use declmap::{Config, DeclmapError, Direction, Project};
use std::collections::HashMap;
use std::path::Path;
use std::sync::Arc;

const STREAMS_HEADER: &str = r#"#pragma once

namespace workerd::api {

class ReadableStream: public jsg::Object {
 public:
  jsg::Promise<void> cancel(jsg::Lock& js, jsg::Optional<jsg::Value> reason);
  bool isLocked();

  JSG_RESOURCE_TYPE(ReadableStream, CompatibilityFlags::Reader flags) {
    JSG_READONLY_PROTOTYPE_PROPERTY(locked, isLocked);
    JSG_METHOD(cancel);
    JSG_METHOD_NAMED(getReader, getReaderImpl);
    JSG_STATIC_METHOD(from);
    JSG_ASYNC_ITERABLE(values);
    JSG_TS_OVERRIDE(<R = any> {
      getReader(): ReadableStreamDefaultReader<R>;
    });
  }

  JSG_MEMORY_INFO(ReadableStream) {}
};

struct QueuingStrategy {
  jsg::Optional<uint64_t> highWaterMark;
  jsg::Optional<jsg::Function<uint64_t(jsg::Value)>> size;

  JSG_STRUCT(highWaterMark, size);
};

}  // namespace workerd::api
"#;

const STREAMS_IMPL: &str = r#"
jsg::Promise<void> ReadableStream::cancel(jsg::Lock& js, jsg::Optional<jsg::Value> reason) {}
bool ReadableStream::isLocked() { return false; }
"#;

fn fixture() -> tempfile::TempDir {
    let dir = tempfile::tempdir().unwrap();
    let api = dir.path().join("src/workerd/api");
    std::fs::create_dir_all(&api).unwrap();
    std::fs::write(api.join("streams.h"), STREAMS_HEADER).unwrap();
    std::fs::write(api.join("streams.c++"), STREAMS_IMPL).unwrap();
    std::fs::write(
        api.join("streams-test.js"),
        "const rs = new ReadableStream();\n",
    )
    .unwrap();
    dir
}

/// Answers build-graph queries from a table; unknown expressions yield nothing.
struct TableGraph(HashMap<String, Vec<String>>);

impl TableGraph {
    fn new(entries: &[(&str, &[&str])]) -> Self {
        Self(
            entries
                .iter()
                .map(|(q, labels)| (q.to_string(), labels.iter().map(|l| l.to_string()).collect()))
                .collect(),
        )
    }
}

#[async_trait]
impl GraphQuery for TableGraph {
    async fn query(&self, expression: &str) -> Result<Vec<String>, ToolError> {
        Ok(self.0.get(expression).cloned().unwrap_or_default())
    }
}

struct CannedCompiler(&'static str);

#[async_trait]
impl SchemaCompiler for CannedCompiler {
    async fn compile(&self, _file: &Path) -> Result<String, ToolError> {
        Ok(self.0.to_string())
    }
}

#[tokio::test]
async fn test_interface_from_source_tree() {
    let dir = fixture();
    let project = Project::open(dir.path()).unwrap();

    let model = project.interface("ReadableStream").await.unwrap();
    assert_eq!(
        model.registration,
        RegistrationKind::Resource {
            condition: Some("CompatibilityFlags::Reader flags".to_string())
        }
    );
    assert_eq!(model.location.line, 10);

    let names: Vec<&str> = model.methods.iter().map(|m| m.js_name.as_str()).collect();
    assert_eq!(names, vec!["cancel", "getReader", "from"]);
    assert!(model.methods[2].is_static);
    assert_eq!(model.properties.len(), 1);
    assert_eq!(model.iterators.len(), 1);
    assert_eq!(model.doc_overrides.len(), 1);
    assert!(model.doc_overrides[0].content.contains("getReader()"));
    assert!(model.memory_info);
}

#[tokio::test]
async fn test_struct_registration_from_source_tree() {
    let dir = fixture();
    let project = Project::open(dir.path()).unwrap();

    let model = project.interface("QueuingStrategy").await.unwrap();
    assert_eq!(model.registration, RegistrationKind::Struct);
    let fields: Vec<&str> = model.struct_fields.iter().map(|f| f.js_name.as_str()).collect();
    assert_eq!(fields, vec!["highWaterMark", "size"]);
}

#[tokio::test]
async fn test_unregistered_type() {
    let dir = fixture();
    let project = Project::open(dir.path()).unwrap();

    let err = project.interface("WritableStream").await.unwrap_err();
    assert!(err.to_string().contains("WritableStream"));
}

#[tokio::test]
async fn test_cross_reference_from_source_tree() {
    let dir = fixture();
    let project = Project::open(dir.path()).unwrap();

    let xref = project.cross_reference("ReadableStream").await.unwrap();
    assert_eq!(
        xref.declarations[0].path,
        Path::new("src/workerd/api/streams.h")
    );
    assert_eq!(xref.implementations.len(), 1);
    assert_eq!(xref.implementations[0].references, 2);
    assert_eq!(xref.registration.as_ref().unwrap().line, 10);
    assert!(xref.registered_members.iter().any(|m| m == "JSG_METHOD(cancel);"));
    assert_eq!(xref.tests, vec![Path::new("src/workerd/api/streams-test.js")]);
    assert!(xref.type_group.is_none());
}

#[tokio::test]
async fn test_reverse_dependencies_with_alias() {
    let graph = TableGraph::new(&[
        ("@workerd-v8//...", &["@workerd-v8//:v8"]),
        (
            "rdeps(//src/..., @workerd-v8//:v8, 1)",
            &[
                "//src/workerd/jsg:jsg",
                "//src/workerd/api:api",
                "//src/workerd/io:io",
                "//src/workerd/server:server",
                "@workerd-v8//:v8",
            ],
        ),
    ]);
    let project = Project::with_config("/repo", Config::default()).with_graph(Arc::new(graph));

    let report = project
        .dependencies("V8", Direction::Reverse, 1)
        .await
        .unwrap();
    assert_eq!(report.labels, vec!["@workerd-v8//:v8"]);
    assert!(report.note.as_deref().unwrap().contains("workerd-v8"));
    assert_eq!(report.reverse_total(), 4);
    assert_eq!(report.breadth(), UsageBreadth::Broad);
}

#[tokio::test]
async fn test_ordinal_and_compat_through_compiler() {
    let schema = "struct Worker @0x1 {\n  modules @0 :List(Module);\n  compatibilityDate @2 :Text;\n}\n";
    let project = Project::with_config("/repo", Config::default())
        .with_compiler(Arc::new(CannedCompiler(schema)));

    let outcome = project
        .ordinal(Path::new("src/workerd/server/workerd.capnp"), Some("Worker"))
        .await
        .unwrap();
    let OrdinalOutcome::Record(report) = outcome else {
        panic!("expected a record report");
    };
    assert_eq!(report.next_ordinal, 3);
    assert_eq!(report.gaps, vec![1]);

    let flags = "struct CompatibilityFlags @0x2 {\n  a @0 :Bool $compatEnableFlag(\"a_flag\") $compatEnableDate(\"2024-01-01\");\n}\n";
    let project = project.with_compiler(Arc::new(CannedCompiler(flags)));
    let report = project.compat(Some("2023-12-31"), None).await.unwrap();
    let CompatReport::AtDate(snapshot) = report else {
        panic!("expected a dated snapshot");
    };
    assert_eq!(snapshot.not_yet_enabled.len(), 1);
    assert!(snapshot.enabled.is_empty());
}

#[test]
fn test_open_invalid_path() {
    match Project::open(Path::new("/nonexistent/path")) {
        Err(DeclmapError::PathNotFound(_)) => {}
        Err(e) => panic!("Expected PathNotFound error, got: {:?}", e),
        Ok(_) => panic!("Expected error for invalid path"),
    }
}

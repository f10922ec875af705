use crate::api::{DeclmapError, Project};
use crate::cli::OutputFormat;
use crate::model::Direction;
use crate::output::{self, Report};
use rmcp::handler::server::tool::cached_schema_for_type;
use rmcp::model::{
    CallToolRequestParam, CallToolResult, Content, Implementation, ListToolsResult,
    PaginatedRequestParam, ServerCapabilities, ServerInfo, Tool,
};
use rmcp::schemars;
use rmcp::schemars::JsonSchema;
use rmcp::service::{RequestContext, RoleServer};
use rmcp::{ErrorData as McpError, ServerHandler, ServiceExt};
use serde::Deserialize;
use std::path::PathBuf;

pub async fn cmd_mcp(project: Project) -> i32 {
    let service = DeclmapService::new(project);
    let transport = rmcp::transport::io::stdio();

    let running_service = match service.serve(transport).await {
        Ok(service) => service,
        Err(e) => {
            tracing::error!(error = %e, "MCP server failed to start");
            return 1;
        }
    };

    if let Err(e) = running_service.waiting().await {
        tracing::error!(error = %e, "MCP server task failed");
        return 1;
    }
    0
}

#[derive(Clone)]
struct DeclmapService {
    project: Project,
}

impl DeclmapService {
    fn new(project: Project) -> Self {
        Self { project }
    }

    async fn dispatch(&self, name: &str, args: serde_json::Value) -> Result<String, ToolFailure> {
        match name {
            "jsg_interface" => {
                let p: InterfaceParams = params(args)?;
                let model = self.project.interface(p.type_name.trim()).await?;
                render(p.format, Report::Interface(&model))
            }
            "capnp_ordinal" => {
                let p: OrdinalParams = params(args)?;
                let file = self.project.root().join(&p.file);
                let outcome = self.project.ordinal(&file, p.struct_name.as_deref()).await?;
                render(p.format, Report::Ordinal(&outcome))
            }
            "bazel_deps" => {
                let p: DepsParams = params(args)?;
                let direction = match p.direction.as_deref() {
                    None | Some("rdeps") => Direction::Reverse,
                    Some("deps") => Direction::Forward,
                    Some(other) => {
                        return Err(ToolFailure::Params(format!(
                            "Unknown direction '{}'; use \"rdeps\" or \"deps\"",
                            other
                        )));
                    }
                };
                let report = self
                    .project
                    .dependencies(&p.target, direction, p.depth.unwrap_or(1))
                    .await?;
                render(p.format, Report::Dependencies(&report))
            }
            "compat_flags" => {
                let p: CompatParams = params(args)?;
                let report = self
                    .project
                    .compat(p.date.as_deref(), p.flag.as_deref())
                    .await?;
                render(p.format, Report::Compat(&report))
            }
            "cross_reference" => {
                let p: XrefParams = params(args)?;
                let xref = self.project.cross_reference(p.symbol.trim()).await?;
                render(p.format, Report::CrossReference(&xref))
            }
            _ => Err(ToolFailure::Unknown(name.to_string())),
        }
    }
}

/// Why a tool call produced no report.
#[derive(Debug)]
enum ToolFailure {
    Unknown(String),
    Params(String),
    Query(String),
}

impl From<DeclmapError> for ToolFailure {
    fn from(e: DeclmapError) -> Self {
        ToolFailure::Query(e.to_string())
    }
}

fn params<T: serde::de::DeserializeOwned>(args: serde_json::Value) -> Result<T, ToolFailure> {
    serde_json::from_value(args).map_err(|e| ToolFailure::Params(format!("Invalid parameters: {}", e)))
}

fn render(format: Option<String>, report: Report<'_>) -> Result<String, ToolFailure> {
    let format = match format.as_deref() {
        None | Some("markdown") => OutputFormat::Markdown,
        Some("json") => OutputFormat::Json,
        Some(other) => return Err(ToolFailure::Params(format!("Unknown format: {}", other))),
    };
    output::render(format, report).map_err(|e| ToolFailure::Query(format!("Failed to format output: {}", e)))
}

#[derive(Debug, Deserialize, JsonSchema)]
struct InterfaceParams {
    /// Registered class name, e.g. "ReadableStream" or "Headers"
    type_name: String,
    /// Output format: "markdown" (default) or "json"
    format: Option<String>,
}

#[derive(Debug, Deserialize, JsonSchema)]
struct OrdinalParams {
    /// Schema file relative to the project root, e.g. "src/workerd/server/workerd.capnp"
    file: PathBuf,
    /// Struct name, bare ("Worker") or dotted ("Worker.Binding"). Omit to summarize every struct.
    struct_name: Option<String>,
    /// Output format: "markdown" (default) or "json"
    format: Option<String>,
}

#[derive(Debug, Deserialize, JsonSchema)]
struct DepsParams {
    /// Short dependency name (ssl, v8), label (@ada-url//:ada, //src/workerd/jsg:jsg),
    /// file path, or an ecosystem-qualified name ("rust:base64", "cpp:base64")
    target: String,
    /// "rdeps" (default) for what depends on the target, "deps" for what it depends on
    direction: Option<String>,
    /// Search depth, 1 (default) for direct only
    depth: Option<u32>,
    /// Output format: "markdown" (default) or "json"
    format: Option<String>,
}

#[derive(Debug, Deserialize, JsonSchema)]
struct CompatParams {
    /// Compatibility date (YYYY-MM-DD); omit to list every flag
    date: Option<String>,
    /// Only flags whose field name, enable flag or disable flag contains this text
    flag: Option<String>,
    /// Output format: "markdown" (default) or "json"
    format: Option<String>,
}

#[derive(Debug, Deserialize, JsonSchema)]
struct XrefParams {
    /// Class or type name
    symbol: String,
    /// Output format: "markdown" (default) or "json"
    format: Option<String>,
}

impl ServerHandler for DeclmapService {
    fn get_info(&self) -> ServerInfo {
        ServerInfo {
            protocol_version: rmcp::model::ProtocolVersion::LATEST,
            capabilities: ServerCapabilities::builder().enable_tools().build(),
            server_info: Implementation {
                name: "declmap".to_string(),
                title: Some("Declmap".to_string()),
                version: env!("CARGO_PKG_VERSION").to_string(),
                icons: None,
                website_url: None,
            },
            instructions: Some(
                "Declmap answers structural questions about a workerd-style checkout. \
                 Use 'jsg_interface' for a type's script-visible surface, 'capnp_ordinal' \
                 before adding a schema field, 'bazel_deps' for build dependencies, \
                 'compat_flags' for compatibility flags and 'cross_reference' to find \
                 everything related to a class."
                    .to_string(),
            ),
        }
    }

    fn list_tools(
        &self,
        _request: Option<PaginatedRequestParam>,
        _context: RequestContext<RoleServer>,
    ) -> impl std::future::Future<Output = Result<ListToolsResult, McpError>> + Send {
        async move {
            Ok(ListToolsResult {
                tools: vec![
                    Tool::new(
                        "jsg_interface",
                        "Extract the methods, properties, constants, nested types and hooks a C++ class registers with JSG_RESOURCE_TYPE or JSG_STRUCT",
                        cached_schema_for_type::<InterfaceParams>(),
                    ),
                    Tool::new(
                        "capnp_ordinal",
                        "Find the next available field ordinal of a Cap'n Proto struct, with gaps and the last few fields",
                        cached_schema_for_type::<OrdinalParams>(),
                    ),
                    Tool::new(
                        "bazel_deps",
                        "Resolve a dependency name to Bazel labels and report what depends on it, or what a target depends on, grouped by component",
                        cached_schema_for_type::<DepsParams>(),
                    ),
                    Tool::new(
                        "compat_flags",
                        "List compatibility flags, or show which are enabled at a compatibility date",
                        cached_schema_for_type::<CompatParams>(),
                    ),
                    Tool::new(
                        "cross_reference",
                        "Find a class's declaration, implementation files, registration, type group, flag gating and tests",
                        cached_schema_for_type::<XrefParams>(),
                    ),
                ],
                next_cursor: None,
            })
        }
    }

    fn call_tool(
        &self,
        request: CallToolRequestParam,
        _context: RequestContext<RoleServer>,
    ) -> impl std::future::Future<Output = Result<CallToolResult, McpError>> + Send {
        let this = self.clone();
        async move {
            let args = request
                .arguments
                .map(serde_json::Value::Object)
                .unwrap_or_else(|| serde_json::Value::Object(Default::default()));

            match this.dispatch(request.name.as_ref(), args).await {
                Ok(output) => Ok(CallToolResult::success(vec![Content::text(output)])),
                Err(ToolFailure::Query(e)) => Ok(CallToolResult::error(vec![Content::text(e)])),
                Err(ToolFailure::Params(e)) => Err(McpError::invalid_params(e, None)),
                Err(ToolFailure::Unknown(name)) => Err(McpError::invalid_params(
                    format!("Unknown tool: {}", name),
                    None,
                )),
            }
        }
    }
}

use clap::{Parser, Subcommand};
use std::path::PathBuf;

#[derive(Parser, Debug)]
#[command(name = "declmap")]
#[command(about = "Structural queries over registration macros, schemas and the build graph")]
#[command(version)]
pub struct Cli {
    #[command(subcommand)]
    pub command: Command,

    /// Project root (defaults to current directory)
    #[arg(long, global = true, default_value = ".")]
    pub root: PathBuf,

    /// Output format
    #[arg(short, long, global = true, default_value = "markdown")]
    pub format: OutputFormat,

    /// Output file (defaults to stdout)
    #[arg(short, long, global = true)]
    pub output: Option<PathBuf>,

    /// Log external tool invocations to stderr
    #[arg(short, long, global = true)]
    pub verbose: bool,
}

#[derive(Subcommand, Debug, Clone)]
pub enum Command {
    /// Extract the interface a type registers
    Interface(InterfaceArgs),

    /// Report the next free ordinal of a schema record
    Ordinal(OrdinalArgs),

    /// Query forward or reverse build dependencies
    Deps(DepsArgs),

    /// List compatibility flags, or classify them at a date
    Compat(CompatArgs),

    /// Cross-reference a symbol across headers, implementation and tests
    Xref(XrefArgs),

    /// Generate a starter .declmap.toml configuration file
    Init,

    /// Serve the queries as MCP tools over stdio
    Mcp,
}

#[derive(Parser, Debug, Clone)]
pub struct InterfaceArgs {
    /// Registered type name, e.g. ReadableStream
    pub type_name: String,
}

#[derive(Parser, Debug, Clone)]
pub struct OrdinalArgs {
    /// Schema file, relative to the project root
    pub file: PathBuf,

    /// Record name, bare or dotted (summarizes every record when omitted)
    pub record: Option<String>,
}

#[derive(Parser, Debug, Clone)]
pub struct DepsArgs {
    /// Short name, label, file path, or `rust:`/`cpp:` qualified name
    pub target: String,

    /// Query direction
    #[arg(long, default_value = "rdeps")]
    pub direction: DepsDirection,

    /// Depth of the search (1 for direct only)
    #[arg(long, default_value = "1")]
    pub depth: u32,
}

#[derive(Parser, Debug, Clone)]
pub struct CompatArgs {
    /// Compatibility date (YYYY-MM-DD)
    #[arg(long)]
    pub date: Option<String>,

    /// Only flags whose name contains this text
    #[arg(long)]
    pub flag: Option<String>,
}

#[derive(Parser, Debug, Clone)]
pub struct XrefArgs {
    /// Class or type name
    pub symbol: String,
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, clap::ValueEnum)]
pub enum OutputFormat {
    #[default]
    Markdown,
    Json,
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, clap::ValueEnum)]
pub enum DepsDirection {
    /// What depends on the target
    #[default]
    Rdeps,
    /// What the target depends on
    Deps,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_deps_defaults_to_direct_reverse_query() {
        let cli = Cli::try_parse_from(["declmap", "deps", "ssl"]).unwrap();
        let Command::Deps(args) = cli.command else {
            panic!("expected deps");
        };
        assert_eq!(args.direction, DepsDirection::Rdeps);
        assert_eq!(args.depth, 1);
        assert_eq!(cli.format, OutputFormat::Markdown);
    }

    #[test]
    fn test_global_flags_after_subcommand() {
        let cli = Cli::try_parse_from([
            "declmap", "ordinal", "src/workerd/server/workerd.capnp", "Worker", "--format",
            "json", "--root", "/work",
        ])
        .unwrap();
        assert_eq!(cli.format, OutputFormat::Json);
        assert_eq!(cli.root, PathBuf::from("/work"));
        let Command::Ordinal(args) = cli.command else {
            panic!("expected ordinal");
        };
        assert_eq!(args.record.as_deref(), Some("Worker"));
    }
}

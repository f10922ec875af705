mod compat;
mod deps;
mod init;
mod interface;
mod mcp;
mod ordinal;
mod xref;

pub use compat::cmd_compat;
pub use deps::cmd_deps;
pub use init::{cmd_init, cmd_init_with_fs};
pub use interface::cmd_interface;
pub use mcp::cmd_mcp;
pub use ordinal::cmd_ordinal;
pub use xref::cmd_xref;

use crate::api::{DeclmapError, Project};
use crate::cli::{Cli, OutputFormat};
use crate::config::Config;
use crate::fs::{FileSystem, default_fs};
use crate::output::{self, Report};
use crate::style;
use std::io::{self, Write};
use std::path::PathBuf;

/// Shared context for command execution: the opened project and where the
/// rendered report goes.
pub struct CommandContext {
    pub project: Project,
    pub format: OutputFormat,
    pub output: Option<PathBuf>,
}

impl CommandContext {
    /// Resolves the root and loads its config, falling back to defaults when
    /// the config cannot be read. Returns Err(exit_code) if the root is missing.
    pub fn new(cli: &Cli) -> Result<Self, i32> {
        let root = match cli.root.canonicalize() {
            Ok(p) => p,
            Err(_) => {
                style::error(&format!("Could not resolve path: {}", style::path(&cli.root)));
                return Err(1);
            }
        };

        let config = Config::load(&root).unwrap_or_else(|e| {
            style::warning(&format!("Failed to load config: {}. Using defaults.", e));
            Config::default()
        });

        Ok(Self {
            project: Project::with_config(root, config),
            format: cli.format,
            output: cli.output.clone(),
        })
    }

    /// Renders `report` to the output file or stdout and returns the exit code.
    pub fn emit(&self, report: Report<'_>) -> i32 {
        self.emit_with_fs(report, default_fs())
    }

    pub fn emit_with_fs(&self, report: Report<'_>, fs: &dyn FileSystem) -> i32 {
        let rendered = match output::render(self.format, report) {
            Ok(s) => s,
            Err(e) => {
                style::error(&format!("Failed to format output: {}", e));
                return 1;
            }
        };

        if let Some(path) = &self.output {
            return match fs.write(path, &rendered) {
                Ok(()) => {
                    style::success(&format!("Wrote {}", style::path(path)));
                    0
                }
                Err(e) => {
                    style::error(&format!("Could not write output file: {}", e));
                    1
                }
            };
        }

        let mut stdout = io::stdout();
        let result = match self.format {
            OutputFormat::Markdown => style::render_markdown(&rendered, &mut stdout),
            OutputFormat::Json => stdout.write_all(rendered.as_bytes()),
        };
        if let Err(e) = result {
            style::error(&format!("Failed to write output: {}", e));
            return 1;
        }
        0
    }
}

/// Prints a failed query and returns its exit code.
pub fn fail(err: &DeclmapError) -> i32 {
    style::error(&err.to_string());
    1
}

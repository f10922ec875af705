mod json;
mod markdown;

pub use json::JsonOutput;
pub use markdown::MarkdownOutput;

use crate::analysis::{CompatReport, OrdinalOutcome};
use crate::cli::OutputFormat;
use crate::model::{CrossReference, DependencyReport, InterfaceModel};
use serde::Serialize;
use std::io::Write;

/// A result of any one query, borrowed for rendering.
#[derive(Debug, Clone, Copy, Serialize)]
#[serde(untagged)]
pub enum Report<'a> {
    Interface(&'a InterfaceModel),
    Ordinal(&'a OrdinalOutcome),
    Dependencies(&'a DependencyReport),
    Compat(&'a CompatReport),
    CrossReference(&'a CrossReference),
}

pub trait OutputFormatter {
    fn format<W: Write>(&self, report: Report<'_>, writer: &mut W) -> std::io::Result<()>;
}

/// Renders `report` into a string in the requested format.
pub fn render(format: OutputFormat, report: Report<'_>) -> std::io::Result<String> {
    let mut buffer = Vec::new();
    match format {
        OutputFormat::Markdown => MarkdownOutput.format(report, &mut buffer)?,
        OutputFormat::Json => JsonOutput.format(report, &mut buffer)?,
    }
    String::from_utf8(buffer).map_err(|e| std::io::Error::new(std::io::ErrorKind::InvalidData, e))
}

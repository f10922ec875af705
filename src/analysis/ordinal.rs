use super::{InputError, validate_record_name};
use crate::acquire::{SchemaCompiler, ToolError};
use crate::model::{HighestOrdinal, OrdinalReport, RecordSummary, SchemaNode};
use crate::parser::{find_record, parse_schema};
use serde::Serialize;
use std::path::Path;
use thiserror::Error;

/// How many of the highest-ordinal fields the report shows.
pub const LAST_FIELDS: usize = 5;

#[derive(Debug, Error)]
pub enum SchemaError {
    #[error(transparent)]
    Input(#[from] InputError),

    #[error("Could not compile `{file}`: {source}")]
    Compile {
        file: String,
        #[source]
        source: ToolError,
    },

    #[error("Struct '{name}' not found in {file}\n\nAvailable: {}", .available.join(", "))]
    NotFound {
        name: String,
        file: String,
        available: Vec<String>,
    },
}

/// Either one record's report or a summary of every record in the file.
#[derive(Debug, Clone, Serialize, PartialEq, Eq)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum OrdinalOutcome {
    Record(OrdinalReport),
    Summary {
        schema_file: String,
        records: Vec<RecordSummary>,
    },
}

pub fn ordinal_report(node: &SchemaNode, schema_file: &str) -> OrdinalReport {
    let mut by_ordinal = node.fields.clone();
    by_ordinal.sort_by_key(|f| f.ordinal);

    let highest = by_ordinal.last().map(|f| HighestOrdinal {
        ordinal: f.ordinal,
        field: f.name.clone(),
    });
    let skip = by_ordinal.len().saturating_sub(LAST_FIELDS);
    let last_fields = by_ordinal.split_off(skip);

    OrdinalReport {
        qualified_name: node.qualified_name.clone(),
        schema_file: schema_file.to_string(),
        total_fields: node.fields.len(),
        next_ordinal: node.next_ordinal(),
        highest,
        gaps: node.ordinal_gaps(),
        declared_annotations: node.declared_annotations.clone(),
        last_fields,
    }
}

/// Compiles `file` and reports the next free ordinal of `record`, or of every
/// record when none is named.
pub async fn next_ordinal(
    compiler: &dyn SchemaCompiler,
    file: &Path,
    record: Option<&str>,
) -> Result<OrdinalOutcome, SchemaError> {
    if let Some(name) = record {
        validate_record_name(name)?;
    }

    let schema_file = file
        .file_name()
        .map(|n| n.to_string_lossy().into_owned())
        .unwrap_or_else(|| file.display().to_string());
    let text = compiler
        .compile(file)
        .await
        .map_err(|source| SchemaError::Compile {
            file: file.display().to_string(),
            source,
        })?;
    let nodes = parse_schema(&text);

    let Some(name) = record else {
        return Ok(OrdinalOutcome::Summary {
            schema_file,
            records: nodes.iter().map(RecordSummary::from).collect(),
        });
    };

    match find_record(&nodes, name) {
        Some(node) => Ok(OrdinalOutcome::Record(ordinal_report(node, &schema_file))),
        None => Err(SchemaError::NotFound {
            name: name.to_string(),
            file: schema_file,
            available: nodes.iter().map(|n| n.qualified_name.clone()).collect(),
        }),
    }
}

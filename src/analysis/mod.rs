mod compat;
mod deps;
mod extract;
pub mod labels;
mod ordinal;
mod resolve;
mod xref;

pub use compat::{CompatError, CompatReport, compat_report, flags_at_date, list_flags};
pub use deps::DependencyQuery;
pub use extract::{ExtractError, extract_interface, extract_struct, parse_resource};
pub use labels::{Ecosystem, Reference};
pub use ordinal::{LAST_FIELDS, OrdinalOutcome, SchemaError, next_ordinal, ordinal_report};
pub use resolve::{ResolveError, Resolver, Strategy, Unresolved};
pub use xref::cross_reference;

use crate::acquire::ToolError;
use regex::Regex;
use std::sync::LazyLock;
use thiserror::Error;

static IDENTIFIER: LazyLock<Regex> = LazyLock::new(|| Regex::new(r"^[A-Za-z_]\w*$").unwrap());
static RECORD_NAME: LazyLock<Regex> = LazyLock::new(|| Regex::new(r"^\w+(\.\w+)*$").unwrap());
static DATE: LazyLock<Regex> = LazyLock::new(|| Regex::new(r"^\d{4}-\d{2}-\d{2}$").unwrap());

/// Malformed input, rejected before any external tool is invoked.
#[derive(Debug, Clone, Error, PartialEq, Eq)]
pub enum InputError {
    #[error("Invalid {what} `{value}`: expected a plain identifier.")]
    InvalidIdentifier { what: &'static str, value: String },

    #[error("Invalid record name `{0}`: expected a name like `Worker` or `Worker.Binding`.")]
    InvalidRecordName(String),

    #[error("Invalid date `{0}`: expected YYYY-MM-DD.")]
    InvalidDate(String),

    #[error(
        "Empty dependency reference: expected a name such as `ssl` or `rust:base64`, or a label like `@ada-url//:ada`."
    )]
    EmptyReference,
}

pub fn validate_identifier(what: &'static str, value: &str) -> Result<(), InputError> {
    if IDENTIFIER.is_match(value) {
        Ok(())
    } else {
        Err(InputError::InvalidIdentifier {
            what,
            value: value.to_string(),
        })
    }
}

pub fn validate_record_name(value: &str) -> Result<(), InputError> {
    if RECORD_NAME.is_match(value) {
        Ok(())
    } else {
        Err(InputError::InvalidRecordName(value.to_string()))
    }
}

pub fn validate_date(value: &str) -> Result<(), InputError> {
    if DATE.is_match(value) {
        Ok(())
    } else {
        Err(InputError::InvalidDate(value.to_string()))
    }
}

/// Treats a failed search as an empty one. The failure is logged.
pub(crate) fn or_empty<T>(result: Result<Vec<T>, ToolError>, what: &str) -> Vec<T> {
    result.unwrap_or_else(|e| {
        tracing::warn!(query = what, error = %e, "search failed, treating as empty");
        Vec::new()
    })
}

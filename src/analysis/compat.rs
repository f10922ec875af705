//! Compatibility flags and their state at a compatibility date.

use super::{InputError, validate_date};
use crate::acquire::{SchemaCompiler, ToolError};
use crate::model::{CompatFlag, CompatListing, CompatSnapshot};
use crate::parser::parse_compat_flags;
use serde::Serialize;
use std::path::Path;
use thiserror::Error;

#[derive(Debug, Error)]
pub enum CompatError {
    #[error(transparent)]
    Input(#[from] InputError),

    #[error("Could not compile compatibility flags: {0}")]
    Compile(#[source] ToolError),

    #[error("No compatibility flags found in `{file}`.")]
    Empty { file: String },

    #[error("No flags matching '{query}'. There are {total} total flags.")]
    NoMatch { query: String, total: usize },
}

#[derive(Debug, Clone, Serialize, PartialEq, Eq)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum CompatReport {
    Listing(CompatListing),
    AtDate(CompatSnapshot),
}

/// Loads the flags from the compatibility schema and either lists them or
/// classifies them at `date`. The date is checked before anything is compiled.
pub async fn compat_report(
    compiler: &dyn SchemaCompiler,
    file: &Path,
    date: Option<&str>,
    flag: Option<&str>,
) -> Result<CompatReport, CompatError> {
    if let Some(date) = date {
        validate_date(date)?;
    }

    let text = compiler.compile(file).await.map_err(CompatError::Compile)?;
    let flags = parse_compat_flags(&text);
    if flags.is_empty() {
        return Err(CompatError::Empty {
            file: file.display().to_string(),
        });
    }

    let selected = match flag {
        Some(query) => {
            let matching: Vec<CompatFlag> =
                flags.iter().filter(|f| f.matches(query)).cloned().collect();
            if matching.is_empty() {
                return Err(CompatError::NoMatch {
                    query: query.to_string(),
                    total: flags.len(),
                });
            }
            matching
        }
        None => flags,
    };

    Ok(match date {
        Some(date) => CompatReport::AtDate(flags_at_date(&selected, date)),
        None => CompatReport::Listing(list_flags(&selected)),
    })
}

pub fn list_flags(flags: &[CompatFlag]) -> CompatListing {
    let obsolete = flags.iter().filter(|f| f.obsolete).count();
    let active: Vec<&CompatFlag> = flags.iter().filter(|f| !f.obsolete).collect();

    let mut dated: Vec<CompatFlag> = active.iter().filter(|f| f.is_dated()).map(|f| (*f).clone()).collect();
    sort_by_date(&mut dated);

    CompatListing {
        active: active.len(),
        obsolete,
        dated,
        opt_in: active
            .iter()
            .filter(|f| !f.is_dated() && !f.experimental)
            .map(|f| (*f).clone())
            .collect(),
        experimental: active
            .iter()
            .filter(|f| !f.is_dated() && f.experimental)
            .map(|f| (*f).clone())
            .collect(),
    }
}

/// Partitions the non-obsolete flags by their state at `date` (`YYYY-MM-DD`).
pub fn flags_at_date(flags: &[CompatFlag], date: &str) -> CompatSnapshot {
    let mut snapshot = CompatSnapshot {
        date: date.to_string(),
        ..Default::default()
    };

    for flag in flags.iter().filter(|f| !f.obsolete) {
        let bucket = if flag.enable_all_dates {
            &mut snapshot.enabled
        } else if let Some(enable) = flag.enable_date.as_deref() {
            // ISO dates order lexicographically.
            if enable <= date {
                &mut snapshot.enabled
            } else {
                &mut snapshot.not_yet_enabled
            }
        } else if flag.experimental {
            &mut snapshot.experimental
        } else {
            &mut snapshot.opt_in
        };
        bucket.push(flag.clone());
    }

    sort_by_date(&mut snapshot.enabled);
    sort_by_date(&mut snapshot.not_yet_enabled);
    snapshot
}

fn sort_by_date(flags: &mut [CompatFlag]) {
    flags.sort_by(|a, b| {
        a.enable_date
            .as_deref()
            .unwrap_or("")
            .cmp(b.enable_date.as_deref().unwrap_or(""))
    });
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::acquire::fake::FakeCompiler;

    const FLAGS: &str = r#"struct CompatibilityFlags @0x8f8c1b68151b6cef {
  formDataParserSupportsFiles @0 :Bool $compatEnableFlag("formdata_parser_supports_files") $compatEnableDate("2021-11-03");
  obsolete1 @1 :Bool;
  nodeJsCompat @2 :Bool $compatEnableFlag("nodejs_compat") $compatDisableFlag("no_nodejs_compat");
  workerdExperimental @3 :Bool $compatEnableFlag("experimental") $experimental();
  specCompliantUrl @4 :Bool $compatEnableFlag("url_standard") $compatEnableDate("2023-06-14");
  alwaysOn @5 :Bool $compatEnableAllDates();
}
"#;

    fn names(flags: &[CompatFlag]) -> Vec<&str> {
        flags.iter().map(|f| f.display_name()).collect()
    }

    #[tokio::test]
    async fn test_classification_at_date() {
        let compiler = FakeCompiler::with_output(FLAGS);
        let report = compat_report(&compiler, Path::new("compat.capnp"), Some("2022-01-01"), None)
            .await
            .unwrap();
        let CompatReport::AtDate(snapshot) = report else {
            panic!("expected a dated snapshot");
        };

        assert_eq!(
            names(&snapshot.enabled),
            vec!["alwaysOn", "formdata_parser_supports_files"]
        );
        assert_eq!(names(&snapshot.not_yet_enabled), vec!["url_standard"]);
        assert_eq!(names(&snapshot.opt_in), vec!["nodejs_compat"]);
        assert_eq!(names(&snapshot.experimental), vec!["experimental"]);
    }

    #[tokio::test]
    async fn test_enable_date_is_inclusive() {
        let compiler = FakeCompiler::with_output(FLAGS);
        let report = compat_report(&compiler, Path::new("compat.capnp"), Some("2023-06-14"), Some("url"))
            .await
            .unwrap();
        let CompatReport::AtDate(snapshot) = report else {
            panic!("expected a dated snapshot");
        };
        assert_eq!(names(&snapshot.enabled), vec!["url_standard"]);
    }

    #[tokio::test]
    async fn test_malformed_date_is_rejected_before_compiling() {
        let compiler = FakeCompiler::with_output(FLAGS);
        let err = compat_report(&compiler, Path::new("compat.capnp"), Some("2023-6-14"), None)
            .await
            .unwrap_err();
        assert!(matches!(err, CompatError::Input(InputError::InvalidDate(_))));
        assert_eq!(compiler.calls(), 0);
    }

    #[tokio::test]
    async fn test_filter_without_matches_reports_total() {
        let compiler = FakeCompiler::with_output(FLAGS);
        let err = compat_report(&compiler, Path::new("compat.capnp"), None, Some("zzz"))
            .await
            .unwrap_err();
        assert_eq!(err.to_string(), "No flags matching 'zzz'. There are 6 total flags.");
    }

    #[test]
    fn test_listing_groups() {
        let listing = list_flags(&parse_compat_flags(FLAGS));
        assert_eq!(listing.active, 5);
        assert_eq!(listing.obsolete, 1);
        assert_eq!(listing.dated.len(), 3);
        assert_eq!(listing.dated[0].field_name, "alwaysOn");
        assert_eq!(names(&listing.opt_in), vec!["nodejs_compat"]);
        assert_eq!(names(&listing.experimental), vec!["experimental"]);
    }
}

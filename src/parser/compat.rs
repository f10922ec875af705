use crate::model::CompatFlag;
use regex::Regex;
use std::sync::LazyLock;

static FLAG_FIELD: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"^\s+(\w+)\s+@(\d+)\s+:Bool").unwrap());
/// `$name("value")`.
static QUOTED_ANNOTATION: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r#"\$(\w+)\("([^"]*)"\)"#).unwrap());
/// `$name(args)`, up to the first `)`.
static RAW_ANNOTATION: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"\$(\w+)\(([^)]*)\)").unwrap());

/// Reads every boolean field of canonical compatibility-flag schema text.
pub fn parse_compat_flags(text: &str) -> Vec<CompatFlag> {
    text.lines().filter_map(parse_flag_line).collect()
}

fn parse_flag_line(line: &str) -> Option<CompatFlag> {
    let caps = FLAG_FIELD.captures(line)?;
    let field_name = caps[1].to_string();
    let ordinal = caps[2].parse().ok()?;

    Some(CompatFlag {
        obsolete: field_name.starts_with("obsolete"),
        field_name,
        ordinal,
        enable_flag: quoted_annotation(line, "compatEnableFlag"),
        disable_flag: quoted_annotation(line, "compatDisableFlag"),
        enable_date: quoted_annotation(line, "compatEnableDate"),
        enable_all_dates: line.contains("$compatEnableAllDates("),
        experimental: line.contains("$experimental("),
        needed_by_fl: line.contains("$neededByFl("),
        implied_by: raw_annotation(line, "impliedByAfterDate"),
    })
}

fn quoted_annotation(line: &str, name: &str) -> Option<String> {
    QUOTED_ANNOTATION
        .captures_iter(line)
        .find(|c| &c[1] == name)
        .map(|c| c[2].to_string())
}

fn raw_annotation(line: &str, name: &str) -> Option<String> {
    RAW_ANNOTATION
        .captures_iter(line)
        .find(|c| &c[1] == name)
        .map(|c| c[2].to_string())
        .filter(|args| !args.is_empty())
}

use crate::analysis::{CompatReport, OrdinalOutcome};
use crate::model::{
    CompatFlag, CompatListing, CompatSnapshot, CrossReference, DependencyReport, Direction,
    InterfaceModel, LabelGroups, OrdinalReport, RecordSummary, RegistrationKind,
};
use crate::output::{OutputFormatter, Report};
use std::io::{self, Write};

/// Labels listed per domain before the rest are summarized.
const GROUP_LISTING: usize = 15;
/// External repositories with at most this many labels list them inline.
const INLINE_REPO_LABELS: usize = 3;
const OVERRIDE_PREVIEW: usize = 80;
const OTHER_DECLARATIONS: usize = 5;
const TEST_LISTING: usize = 10;

#[derive(Debug, Default, Clone, Copy)]
pub struct MarkdownOutput;

impl OutputFormatter for MarkdownOutput {
    fn format<W: Write>(&self, report: Report<'_>, writer: &mut W) -> io::Result<()> {
        match report {
            Report::Interface(model) => write_interface(model, writer),
            Report::Ordinal(OrdinalOutcome::Record(r)) => write_ordinal(r, writer),
            Report::Ordinal(OrdinalOutcome::Summary {
                schema_file,
                records,
            }) => write_record_summary(schema_file, records, writer),
            Report::Dependencies(r) => match r.direction {
                Direction::Forward => write_forward(r, writer),
                Direction::Reverse => write_reverse(r, writer),
            },
            Report::Compat(CompatReport::Listing(l)) => write_listing(l, writer),
            Report::Compat(CompatReport::AtDate(s)) => write_snapshot(s, writer),
            Report::CrossReference(x) => write_xref(x, writer),
        }
    }
}

fn write_interface<W: Write>(m: &InterfaceModel, w: &mut W) -> io::Result<()> {
    if matches!(m.registration, RegistrationKind::Struct) {
        return write_struct(m, w);
    }

    writeln!(w, "## Interface: {}\n", m.type_name)?;
    writeln!(w, "**File:** `{}`", m.location)?;
    if let RegistrationKind::Resource {
        condition: Some(condition),
    } = &m.registration
    {
        writeln!(w, "**Config:** `{}` (conditional registration)", condition)?;
    }
    if !m.also_registered_in.is_empty() {
        let others: Vec<String> = m
            .also_registered_in
            .iter()
            .map(|l| format!("`{}`", l))
            .collect();
        writeln!(
            w,
            "**Also registered in:** {} (may be a nested class with the same name)",
            others.join(", ")
        )?;
    }
    writeln!(w)?;

    if !m.inherited_from.is_empty() {
        writeln!(w, "### Inheritance\n")?;
        for i in &m.inherited_from {
            writeln!(w, "- {}", i)?;
        }
        writeln!(w)?;
    }

    if !m.methods.is_empty() {
        writeln!(w, "### Methods\n")?;
        for method in &m.methods {
            write!(w, "- `{}`", method.js_name)?;
            if method.bound_name != method.js_name {
                write!(w, " → `{}`", method.bound_name)?;
            }
            if method.is_static {
                write!(w, " *(static)*")?;
            }
            writeln!(w)?;
        }
        writeln!(w)?;
    }

    if !m.properties.is_empty() {
        writeln!(w, "### Properties\n")?;
        for p in &m.properties {
            let mut flags = vec![p.location.to_string()];
            if p.readonly {
                flags.push("readonly".to_string());
            }
            if p.lazy {
                flags.push("lazy".to_string());
            }
            write!(w, "- `{}` → getter: `{}`", p.js_name, p.getter_name)?;
            if let Some(setter) = &p.setter_name {
                write!(w, ", setter: `{}`", setter)?;
            }
            writeln!(w, " *({})*", flags.join(", "))?;
        }
        writeln!(w)?;
    }

    if !m.constants.is_empty() {
        writeln!(w, "### Constants\n")?;
        for c in &m.constants {
            write!(w, "- `{}`", c.js_name)?;
            if c.expression != c.js_name {
                write!(w, " = `{}`", c.expression)?;
            }
            writeln!(w)?;
        }
        writeln!(w)?;
    }

    if !m.nested_types.is_empty() {
        writeln!(w, "### Nested Types\n")?;
        for n in &m.nested_types {
            write!(w, "- `{}`", n.js_name)?;
            if n.bound_type != n.js_name {
                write!(w, " → `{}`", n.bound_type)?;
            }
            writeln!(w)?;
        }
        writeln!(w)?;
    }

    if !m.iterators.is_empty() {
        writeln!(w, "### Iterators\n")?;
        for it in &m.iterators {
            writeln!(w, "- `{}` via `{}`", it.iterator_symbol(), it.method_name)?;
        }
        writeln!(w)?;
    }

    if let Some(tag) = &m.serialization_tag {
        let kind = if tag.one_way { "one-way serializable" } else { "serializable" };
        writeln!(w, "### Serialization\n\n- {} with tag `{}`\n", kind, tag.tag)?;
    }

    if let Some(callable) = &m.callable_via {
        writeln!(w, "### Callable\n\n- Invocable via `{}`\n", callable)?;
    }

    if let Some(getter) = &m.wildcard_getter {
        writeln!(w, "### Wildcard Property\n\n- Catch-all getter: `{}`\n", getter)?;
    }

    if !m.disposers.is_empty() {
        writeln!(w, "### Disposal\n")?;
        for d in &m.disposers {
            writeln!(w, "- `{}` via `{}`", d.dispose_symbol(), d.method_name)?;
        }
        writeln!(w)?;
    }

    write_doc_overrides(m, w)?;

    if !m.script_bundles.is_empty() {
        writeln!(w, "### Script Bundles\n")?;
        for b in &m.script_bundles {
            writeln!(w, "- `{}`", b)?;
        }
        writeln!(w)?;
    }

    if m.memory_info {
        writeln!(w, "**Memory tracking:** Has `JSG_MEMORY_INFO`")?;
    }
    if !m.iterator_declarations.is_empty() {
        writeln!(w, "**Iterator declarations:**")?;
        for decl in &m.iterator_declarations {
            writeln!(w, "- `{}`", decl)?;
        }
    }
    Ok(())
}

fn write_struct<W: Write>(m: &InterfaceModel, w: &mut W) -> io::Result<()> {
    writeln!(w, "## Struct: {}\n", m.type_name)?;
    writeln!(w, "**File:** `{}`", m.location)?;
    writeln!(w, "**Type:** Value type (deep-copied to and from script objects)\n")?;

    if !m.struct_fields.is_empty() {
        writeln!(w, "### Fields\n")?;
        for f in &m.struct_fields {
            write!(w, "- `{}`", f.js_name)?;
            if f.bound_name != f.js_name {
                write!(w, " (bound as `{}`)", f.bound_name)?;
            }
            writeln!(w)?;
        }
        writeln!(w)?;
    }
    write_doc_overrides(m, w)
}

fn write_doc_overrides<W: Write>(m: &InterfaceModel, w: &mut W) -> io::Result<()> {
    if m.doc_overrides.is_empty() {
        return Ok(());
    }
    writeln!(w, "### TypeScript Overrides\n")?;
    for o in &m.doc_overrides {
        writeln!(w, "- `{}`: {}", o.kind.macro_name(), preview(&o.content))?;
    }
    writeln!(w)
}

fn preview(content: &str) -> String {
    if content.chars().count() > OVERRIDE_PREVIEW {
        let head: String = content.chars().take(OVERRIDE_PREVIEW).collect();
        format!("{}...", head)
    } else {
        content.to_string()
    }
}

fn write_ordinal<W: Write>(r: &OrdinalReport, w: &mut W) -> io::Result<()> {
    writeln!(w, "## {} ({})\n", r.qualified_name, r.schema_file)?;
    writeln!(w, "**Next available ordinal: @{}**\n", r.next_ordinal)?;
    writeln!(w, "- Total fields: {}", r.total_fields)?;
    match &r.highest {
        Some(h) => writeln!(w, "- Highest ordinal: @{} (`{}`)", h.ordinal, h.field)?,
        None => writeln!(w, "- No fields yet")?,
    }
    if !r.gaps.is_empty() {
        let gaps: Vec<String> = r.gaps.iter().map(|g| format!("@{}", g)).collect();
        writeln!(w, "- Gaps: {}", gaps.join(", "))?;
        writeln!(w, "  (Likely retired; do NOT reuse)")?;
    }
    if !r.declared_annotations.is_empty() {
        writeln!(w, "- Annotations: {}", r.declared_annotations.join(", "))?;
    }

    if !r.last_fields.is_empty() {
        writeln!(w, "\n### Last {} fields\n", r.last_fields.len())?;
        for f in &r.last_fields {
            writeln!(w, "- `{}`", f.raw)?;
        }
    }

    writeln!(w, "\n### Usage\n")?;
    writeln!(w, "```capnp")?;
    writeln!(w, "  yourNewField @{} :Bool;", r.next_ordinal)?;
    writeln!(w, "```")
}

fn write_record_summary<W: Write>(
    schema_file: &str,
    records: &[RecordSummary],
    w: &mut W,
) -> io::Result<()> {
    writeln!(w, "## Records in {}\n", schema_file)?;
    if records.is_empty() {
        return writeln!(w, "No records found.");
    }
    writeln!(w, "| Record | Fields | Highest | Next |")?;
    writeln!(w, "|---|---|---|---|")?;
    for r in records {
        let highest = r
            .highest
            .map(|h| format!("@{}", h))
            .unwrap_or_else(|| "-".to_string());
        writeln!(
            w,
            "| `{}` | {} | {} | @{} |",
            r.qualified_name, r.total_fields, highest, r.next_ordinal
        )?;
    }
    Ok(())
}

fn write_domain_groups<W: Write>(groups: &LabelGroups, w: &mut W) -> io::Result<()> {
    for (domain, labels) in groups {
        writeln!(w, "**{}/**", domain)?;
        for l in labels.iter().take(GROUP_LISTING) {
            writeln!(w, "- `{}`", l)?;
        }
        if labels.len() > GROUP_LISTING {
            writeln!(w, "- ... and {} more", labels.len() - GROUP_LISTING)?;
        }
        writeln!(w)?;
    }
    Ok(())
}

fn write_forward<W: Write>(r: &DependencyReport, w: &mut W) -> io::Result<()> {
    writeln!(w, "## Dependencies: {}\n", r.reference)?;
    if let Some(label) = r.labels.first() {
        writeln!(w, "**Target:** `{}`\n", label)?;
    }

    if !r.internal_deps.is_empty() {
        writeln!(
            w,
            "### Direct dependencies, internal ({} targets)\n",
            r.internal_total()
        )?;
        write_domain_groups(&r.internal_deps, w)?;
    }

    if !r.external_deps.is_empty() {
        writeln!(
            w,
            "### Direct dependencies, external ({} targets across {} repos)\n",
            r.external_total(),
            r.external_deps.len()
        )?;
        for (repo, labels) in &r.external_deps {
            if labels.len() <= INLINE_REPO_LABELS {
                let listed: Vec<String> = labels.iter().map(|l| format!("`{}`", l)).collect();
                writeln!(w, "- **{}**: {}", repo, listed.join(", "))?;
            } else {
                writeln!(w, "- **{}**: {} targets", repo, labels.len())?;
            }
        }
        writeln!(w)?;
    }

    if r.reverse_deps.is_empty() {
        writeln!(w, "### Reverse dependencies\n")?;
        writeln!(w, "No internal targets directly depend on this target.")
    } else {
        writeln!(
            w,
            "### Reverse dependencies ({} targets depend on this)\n",
            r.reverse_total()
        )?;
        write_domain_groups(&r.reverse_deps, w)
    }
}

fn write_reverse<W: Write>(r: &DependencyReport, w: &mut W) -> io::Result<()> {
    writeln!(w, "## Reverse dependencies: {}\n", r.reference)?;
    let labels: Vec<String> = r.labels.iter().map(|l| format!("`{}`", l)).collect();
    writeln!(w, "**Resolved labels:** {}", labels.join(", "))?;
    if let Some(note) = &r.note {
        writeln!(w, "**Note:** {}", note)?;
    }
    writeln!(w)?;

    if r.reverse_deps.is_empty() {
        writeln!(w, "No direct dependents found in the internal scope.\n")?;
        writeln!(
            w,
            "The dependency may only be consumed transitively, or the label may be wrong. Check with:"
        )?;
        writeln!(w, "```")?;
        for label in &r.labels {
            let repo = label.split("//").next().unwrap_or(label);
            writeln!(w, "bazel query '{}//...' --output label", repo)?;
        }
        return writeln!(w, "```");
    }

    writeln!(w, "### Direct dependents ({} targets)\n", r.reverse_total())?;
    write_domain_groups(&r.reverse_deps, w)?;

    let counts: Vec<String> = r
        .reverse_deps
        .iter()
        .map(|(domain, labels)| format!("{} ({})", domain, labels.len()))
        .collect();
    writeln!(w, "### Summary\n")?;
    writeln!(
        w,
        "**{} targets** across {} components: {}\n",
        r.reverse_total(),
        r.reverse_deps.len(),
        counts.join(", ")
    )?;
    writeln!(
        w,
        "**{} usage**: consumed by {} component(s).",
        capitalize(&r.breadth().to_string()),
        r.reverse_deps.len()
    )
}

fn capitalize(s: &str) -> String {
    let mut chars = s.chars();
    match chars.next() {
        Some(first) => first.to_uppercase().chain(chars).collect(),
        None => String::new(),
    }
}

fn flag_suffix(f: &CompatFlag) -> String {
    let mut notes = Vec::new();
    if let Some(disable) = &f.disable_flag {
        notes.push(format!("disable: `{}`", disable));
    }
    if let Some(implied) = &f.implied_by {
        notes.push(format!("implied by {}", implied));
    }
    if f.needed_by_fl {
        notes.push("needed by FL".to_string());
    }
    if notes.is_empty() {
        String::new()
    } else {
        format!(" ({})", notes.join("; "))
    }
}

fn write_listing<W: Write>(l: &CompatListing, w: &mut W) -> io::Result<()> {
    writeln!(w, "## Compatibility flags\n")?;
    writeln!(w, "{} active flags, {} obsolete.\n", l.active, l.obsolete)?;

    writeln!(w, "### Date-gated ({})\n", l.dated.len())?;
    for f in &l.dated {
        let date = f.enable_date.as_deref().unwrap_or("all dates");
        writeln!(w, "- **{}**: `{}`{}", date, f.display_name(), flag_suffix(f))?;
    }

    writeln!(w, "\n### Opt-in only, no default date ({})\n", l.opt_in.len())?;
    for f in &l.opt_in {
        writeln!(w, "- `{}`{}", f.display_name(), flag_suffix(f))?;
    }

    writeln!(w, "\n### Experimental ({})\n", l.experimental.len())?;
    for f in &l.experimental {
        writeln!(w, "- `{}`", f.display_name())?;
    }
    Ok(())
}

fn write_snapshot<W: Write>(s: &CompatSnapshot, w: &mut W) -> io::Result<()> {
    writeln!(w, "## Compatibility flags at {}\n", s.date)?;
    writeln!(w, "- **{}** enabled by default", s.enabled.len())?;
    writeln!(w, "- **{}** not yet enabled (future date)", s.not_yet_enabled.len())?;
    writeln!(w, "- **{}** opt-in only (no date set)", s.opt_in.len())?;
    writeln!(w, "- **{}** experimental\n", s.experimental.len())?;

    if !s.enabled.is_empty() {
        writeln!(w, "### Enabled by default ({})\n", s.enabled.len())?;
        for f in &s.enabled {
            let since = f.enable_date.as_deref().unwrap_or("all dates");
            writeln!(w, "- `{}` (since {})", f.display_name(), since)?;
        }
    }
    if !s.not_yet_enabled.is_empty() {
        writeln!(
            w,
            "\n### Not yet enabled, date is after \"{}\" ({})\n",
            s.date,
            s.not_yet_enabled.len()
        )?;
        for f in &s.not_yet_enabled {
            writeln!(
                w,
                "- `{}` ({})",
                f.display_name(),
                f.enable_date.as_deref().unwrap_or_default()
            )?;
        }
    }
    if !s.opt_in.is_empty() {
        writeln!(w, "\n### Opt-in only ({})\n", s.opt_in.len())?;
        for f in &s.opt_in {
            writeln!(w, "- `{}`", f.display_name())?;
        }
    }
    if !s.experimental.is_empty() {
        writeln!(w, "\n### Experimental ({})\n", s.experimental.len())?;
        for f in &s.experimental {
            writeln!(w, "- `{}`", f.display_name())?;
        }
    }
    Ok(())
}

fn write_xref<W: Write>(x: &CrossReference, w: &mut W) -> io::Result<()> {
    writeln!(w, "## Cross-reference: {}\n", x.symbol)?;

    writeln!(w, "### Declaration\n")?;
    match x.declarations.split_first() {
        Some((primary, others)) => {
            writeln!(
                w,
                "- `{}:{}`: {}",
                primary.path.display(),
                primary.line,
                primary.text.trim()
            )?;
            if !others.is_empty() {
                let listed: Vec<String> = others
                    .iter()
                    .take(OTHER_DECLARATIONS)
                    .map(|h| format!("`{}:{}`", h.path.display(), h.line))
                    .collect();
                write!(w, "- Also referenced in: {}", listed.join(", "))?;
                if others.len() > OTHER_DECLARATIONS {
                    write!(w, " (+{} more)", others.len() - OTHER_DECLARATIONS)?;
                }
                writeln!(w)?;
            }
        }
        None => writeln!(w, "Not found in any header.")?,
    }

    writeln!(w, "\n### Implementation\n")?;
    if x.implementations.is_empty() {
        writeln!(w, "No implementation files reference `{}::`.", x.symbol)?;
    }
    for f in &x.implementations {
        writeln!(w, "- `{}` ({} references)", f.path.display(), f.references)?;
    }

    writeln!(w, "\n### Registration\n")?;
    match &x.registration {
        Some(hit) => {
            writeln!(w, "- Registered in `{}:{}`", hit.path.display(), hit.line)?;
            if !x.registered_members.is_empty() {
                writeln!(w, "- Methods and properties:")?;
                for m in &x.registered_members {
                    writeln!(w, "  - `{}`", m)?;
                }
            }
        }
        None => writeln!(w, "No `JSG_RESOURCE_TYPE({})` found.", x.symbol)?,
    }

    writeln!(w, "\n### Type Group\n")?;
    match &x.type_group {
        Some(g) => writeln!(
            w,
            "- Part of `{}` (defined in `{}:{}`)",
            g.macro_name,
            g.path.display(),
            g.line
        )?,
        None => writeln!(w, "Not found in any isolate type group.")?,
    }

    if !x.gating.is_empty() {
        writeln!(w, "\n### Compatibility Flag Gating\n")?;
        for h in &x.gating {
            writeln!(w, "- `{}:{}`: {}", h.path.display(), h.line, h.text.trim())?;
        }
    }

    writeln!(w, "\n### Tests\n")?;
    if x.tests.is_empty() {
        return writeln!(w, "No test files found referencing `{}`.", x.symbol);
    }
    for t in x.tests.iter().take(TEST_LISTING) {
        writeln!(w, "- `{}`", t.display())?;
    }
    if x.tests.len() > TEST_LISTING {
        writeln!(w, "- ... and {} more", x.tests.len() - TEST_LISTING)?;
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::model::{
        HighestOrdinal, Method, Resolution, SchemaField, SearchHit, SourceLocation,
    };
    use std::path::PathBuf;

    fn render(report: Report<'_>) -> String {
        let mut buffer = Vec::new();
        MarkdownOutput.format(report, &mut buffer).unwrap();
        String::from_utf8(buffer).unwrap()
    }

    #[test]
    fn test_interface_lists_renamed_and_static_methods() {
        let mut model = InterfaceModel::new(
            "Headers",
            RegistrationKind::Resource {
                condition: Some("flags".to_string()),
            },
        );
        model.location = SourceLocation::new("src/workerd/api/http.h", 120);
        model.add_method(Method {
            js_name: "get".to_string(),
            bound_name: "get_".to_string(),
            is_static: false,
        });
        model.add_method(Method {
            js_name: "from".to_string(),
            bound_name: "from".to_string(),
            is_static: true,
        });

        let text = render(Report::Interface(&model));
        assert!(text.contains("## Interface: Headers"));
        assert!(text.contains("`src/workerd/api/http.h:120`"));
        assert!(text.contains("**Config:** `flags`"));
        assert!(text.contains("- `get` → `get_`"));
        assert!(text.contains("- `from` *(static)*"));
    }

    #[test]
    fn test_ordinal_report_shows_gaps_and_usage() {
        let report = OrdinalReport {
            qualified_name: "Worker".to_string(),
            schema_file: "workerd.capnp".to_string(),
            total_fields: 2,
            next_ordinal: 4,
            highest: Some(HighestOrdinal {
                ordinal: 3,
                field: "bindings".to_string(),
            }),
            gaps: vec![1, 2],
            declared_annotations: Vec::new(),
            last_fields: vec![SchemaField {
                name: "bindings".to_string(),
                ordinal: 3,
                ty: "List(Binding)".to_string(),
                annotations: Vec::new(),
                raw: "bindings @3 :List(Binding)".to_string(),
            }],
        };
        let text = render(Report::Ordinal(&OrdinalOutcome::Record(report)));
        assert!(text.contains("**Next available ordinal: @4**"));
        assert!(text.contains("- Gaps: @1, @2"));
        assert!(text.contains("yourNewField @4 :Bool;"));
    }

    #[test]
    fn test_reverse_report_without_dependents_suggests_query() {
        let report = DependencyReport::new(
            "ada-url",
            Direction::Reverse,
            Resolution::new(vec!["@ada-url//:ada".to_string()]),
        );
        let text = render(Report::Dependencies(&report));
        assert!(text.contains("No direct dependents"));
        assert!(text.contains("bazel query '@ada-url//...' --output label"));
    }

    #[test]
    fn test_reverse_report_summarizes_breadth() {
        let mut report = DependencyReport::new(
            "ssl",
            Direction::Reverse,
            Resolution::new(vec!["@ssl//:ssl".to_string()]).with_note("Resolved alias"),
        );
        report
            .reverse_deps
            .insert("api".to_string(), vec!["//src/workerd/api:crypto".to_string()]);
        let text = render(Report::Dependencies(&report));
        assert!(text.contains("**Note:** Resolved alias"));
        assert!(text.contains("api (1)"));
        assert!(text.contains("**Narrow usage**"));
    }

    #[test]
    fn test_xref_reports_missing_sections() {
        let xref = CrossReference {
            symbol: "Blob".to_string(),
            declarations: vec![SearchHit {
                path: PathBuf::from("src/workerd/api/blob.h"),
                line: 12,
                text: "class Blob: public jsg::Object {".to_string(),
            }],
            ..Default::default()
        };
        let text = render(Report::CrossReference(&xref));
        assert!(text.contains("- `src/workerd/api/blob.h:12`: class Blob"));
        assert!(text.contains("No `JSG_RESOURCE_TYPE(Blob)` found."));
        assert!(text.contains("No test files found referencing `Blob`."));
        assert!(!text.contains("Compatibility Flag Gating"));
    }

    #[test]
    fn test_long_override_is_truncated() {
        let long = "x".repeat(100);
        assert_eq!(preview(&long).len(), OVERRIDE_PREVIEW + 3);
        assert_eq!(preview("short"), "short");
    }
}

//! Registration-block parsing.
//!
//! Each declarative form is one entry in [`RULES`]. Entries are tried in order and
//! the first match claims the line, so named variants sit before their unnamed
//! counterparts and more specific property forms before general ones.

use crate::model::{
    Constant, DocOverride, DocOverrideKind, HookKind, HookMethod, Inheritance, InterfaceModel,
    Method, NestedType, Property, PropertyLocation, SerializationTag,
};
use crate::parser::scan::{gather_parenthesized, outer_parenthesized};
use regex::{Captures, Regex};
use std::sync::LazyLock;

type Handler = fn(&Captures<'_>, &mut InterfaceModel);

enum Action {
    /// The whole form sits on one line.
    Line(Handler),
    /// A documentation override whose argument may span several lines.
    Gather(DocOverrideKind),
}

struct Rule {
    name: &'static str,
    pattern: Regex,
    action: Action,
}

impl Rule {
    fn new(name: &'static str, args: &str, action: Action) -> Self {
        let pattern = Regex::new(&format!(r"\b{}\s*\({}", name, args))
            .unwrap_or_else(|e| panic!("invalid pattern for {}: {}", name, e));
        Self {
            name,
            pattern,
            action,
        }
    }
}

const ONE: &str = r"\s*(\w+)\s*\)";
const TWO: &str = r"\s*(\w+)\s*,\s*(\w+)\s*\)";
const THREE: &str = r"\s*(\w+)\s*,\s*(\w+)\s*,\s*(\w+)\s*\)";
const NAME_AND_EXPR: &str = r"\s*(\w+)\s*,\s*([^)]+)\)";
const ANY: &str = r"\s*([^)]+)\)";
const REST: &str = r"(.*)$";

static RULES: LazyLock<Vec<Rule>> = LazyLock::new(|| {
    use Action::{Gather, Line};

    vec![
        Rule::new("JSG_INHERIT", ONE, Line(|c, m| {
            m.inherited_from.push(Inheritance::Type(c[1].to_string()));
        })),
        Rule::new("JSG_INHERIT_INTRINSIC", ANY, Line(|c, m| {
            m.inherited_from.push(Inheritance::Intrinsic(c[1].trim().to_string()));
        })),
        Rule::new("JSG_STATIC_METHOD_NAMED", TWO, Line(|c, m| {
            m.add_method(method(&c[1], &c[2], true));
        })),
        Rule::new("JSG_STATIC_METHOD", ONE, Line(|c, m| {
            m.add_method(method(&c[1], &c[1], true));
        })),
        Rule::new("JSG_METHOD_NAMED", TWO, Line(|c, m| {
            m.add_method(method(&c[1], &c[2], false));
        })),
        Rule::new("JSG_METHOD", ONE, Line(|c, m| {
            m.add_method(method(&c[1], &c[1], false));
        })),
        Rule::new("JSG_CALLABLE", ONE, Line(|c, m| {
            m.callable_via = Some(c[1].to_string());
        })),
        Rule::new("JSG_STATIC_READONLY_PROPERTY_NAMED", TWO, Line(|c, m| {
            m.add_property(property(&c[1], &c[2], None, PropertyLocation::Static, true, false));
        })),
        Rule::new("JSG_STATIC_READONLY_PROPERTY", ONE, Line(|c, m| {
            m.add_property(property(&c[1], &c[1], None, PropertyLocation::Static, true, false));
        })),
        Rule::new("JSG_LAZY_READONLY_INSTANCE_PROPERTY", TWO, Line(|c, m| {
            m.add_property(property(&c[1], &c[2], None, PropertyLocation::Instance, true, true));
        })),
        Rule::new("JSG_LAZY_INSTANCE_PROPERTY", TWO, Line(|c, m| {
            m.add_property(property(&c[1], &c[2], None, PropertyLocation::Instance, false, true));
        })),
        Rule::new("JSG_READONLY_INSTANCE_PROPERTY", TWO, Line(|c, m| {
            m.add_property(property(&c[1], &c[2], None, PropertyLocation::Instance, true, false));
        })),
        Rule::new("JSG_INSTANCE_PROPERTY", THREE, Line(|c, m| {
            m.add_property(property(&c[1], &c[2], Some(&c[3]), PropertyLocation::Instance, false, false));
        })),
        Rule::new("JSG_READONLY_PROTOTYPE_PROPERTY", TWO, Line(|c, m| {
            m.add_property(property(&c[1], &c[2], None, PropertyLocation::Prototype, true, false));
        })),
        Rule::new("JSG_PROTOTYPE_PROPERTY", THREE, Line(|c, m| {
            m.add_property(property(&c[1], &c[2], Some(&c[3]), PropertyLocation::Prototype, false, false));
        })),
        Rule::new("JSG_INSPECT_PROPERTY", TWO, Line(|c, m| {
            m.add_property(property(&c[1], &c[2], None, PropertyLocation::Inspect, true, false));
        })),
        Rule::new("JSG_WILDCARD_PROPERTY", ONE, Line(|c, m| {
            m.wildcard_getter = Some(c[1].to_string());
        })),
        Rule::new("JSG_STATIC_CONSTANT_NAMED", NAME_AND_EXPR, Line(|c, m| {
            m.constants.push(Constant {
                js_name: c[1].to_string(),
                expression: c[2].trim().to_string(),
            });
        })),
        Rule::new("JSG_STATIC_CONSTANT", ONE, Line(|c, m| {
            m.constants.push(Constant {
                js_name: c[1].to_string(),
                expression: c[1].to_string(),
            });
        })),
        Rule::new("JSG_NESTED_TYPE_NAMED", TWO, Line(|c, m| {
            m.nested_types.push(NestedType {
                js_name: c[2].to_string(),
                bound_type: c[1].to_string(),
            });
        })),
        Rule::new("JSG_NESTED_TYPE", ONE, Line(|c, m| {
            m.nested_types.push(NestedType {
                js_name: c[1].to_string(),
                bound_type: c[1].to_string(),
            });
        })),
        Rule::new("JSG_ASYNC_ITERABLE", ONE, Line(|c, m| {
            m.iterators.push(hook(HookKind::Async, &c[1]));
        })),
        Rule::new("JSG_ITERABLE", ONE, Line(|c, m| {
            m.iterators.push(hook(HookKind::Sync, &c[1]));
        })),
        Rule::new("JSG_ASYNC_DISPOSE", ONE, Line(|c, m| {
            m.disposers.push(hook(HookKind::Async, &c[1]));
        })),
        Rule::new("JSG_DISPOSE", ONE, Line(|c, m| {
            m.disposers.push(hook(HookKind::Sync, &c[1]));
        })),
        Rule::new("JSG_ONEWAY_SERIALIZABLE", ANY, Line(|c, m| {
            m.serialization_tag = Some(SerializationTag {
                one_way: true,
                tag: c[1].trim().to_string(),
            });
        })),
        Rule::new("JSG_SERIALIZABLE", ANY, Line(|c, m| {
            m.serialization_tag = Some(SerializationTag {
                one_way: false,
                tag: c[1].trim().to_string(),
            });
        })),
        Rule::new("JSG_TS_ROOT", "", Line(|_, m| {
            m.doc_overrides.push(DocOverride {
                kind: DocOverrideKind::Root,
                content: "(root type)".to_string(),
            });
        })),
        Rule::new("JSG_TS_OVERRIDE", REST, Gather(DocOverrideKind::Override)),
        Rule::new("JSG_TS_DEFINE", REST, Gather(DocOverrideKind::Define)),
        Rule::new("JSG_CONTEXT_JS_BUNDLE", ONE, Line(|c, m| {
            m.script_bundles.push(c[1].to_string());
        })),
    ]
});

fn method(js_name: &str, bound_name: &str, is_static: bool) -> Method {
    Method {
        js_name: js_name.to_string(),
        bound_name: bound_name.to_string(),
        is_static,
    }
}

fn property(
    js_name: &str,
    getter: &str,
    setter: Option<&str>,
    location: PropertyLocation,
    readonly: bool,
    lazy: bool,
) -> Property {
    Property {
        js_name: js_name.to_string(),
        getter_name: getter.to_string(),
        setter_name: setter.map(str::to_string),
        readonly,
        lazy,
        location,
    }
}

fn hook(kind: HookKind, method_name: &str) -> HookMethod {
    HookMethod {
        kind,
        method_name: method_name.to_string(),
    }
}

fn is_skippable(line: &str) -> bool {
    line.is_empty() || line.starts_with("//") || line.starts_with("/*")
}

/// Parses the lines of a registration block into `model`.
///
/// Lines that match no rule are skipped; a partially understood block is not an error.
pub fn parse_registration_block(block: &[&str], model: &mut InterfaceModel) {
    let mut i = 0;
    while i < block.len() {
        let line = block[i].trim();
        if is_skippable(line) {
            i += 1;
            continue;
        }

        let mut next = i + 1;
        for rule in RULES.iter() {
            let Some(caps) = rule.pattern.captures(line) else {
                continue;
            };
            match &rule.action {
                Action::Line(handler) => handler(&caps, model),
                Action::Gather(kind) => {
                    let (content, last) = gather_override(block, i, rule.name);
                    model.doc_overrides.push(DocOverride {
                        kind: *kind,
                        content,
                    });
                    next = last + 1;
                }
            }
            tracing::trace!(rule = rule.name, line = i, "matched registration form");
            break;
        }
        i = next;
    }
}

/// Gathers a possibly multi-line override and returns its outermost argument.
fn gather_override(block: &[&str], start: usize, macro_name: &str) -> (String, usize) {
    let (joined, last) = gather_parenthesized(block, start);
    let from_macro = joined
        .find(macro_name)
        .map_or(joined.as_str(), |pos| &joined[pos..]);
    (outer_parenthesized(from_macro), last)
}

/// Parses a standalone block of text.
pub fn parse_registration_text(text: &str, model: &mut InterfaceModel) {
    let lines: Vec<&str> = text.lines().collect();
    parse_registration_block(&lines, model);
}

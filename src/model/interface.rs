use serde::{Deserialize, Serialize};
use std::fmt;
use std::path::PathBuf;

/// The externally visible surface of one registered type, as recovered from
/// its registration block.
#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq)]
pub struct InterfaceModel {
    pub type_name: String,
    pub location: SourceLocation,
    pub registration: RegistrationKind,
    /// Other files that register a type with the same name (usually nested classes).
    pub also_registered_in: Vec<SourceLocation>,
    pub inherited_from: Vec<Inheritance>,
    pub methods: Vec<Method>,
    pub properties: Vec<Property>,
    pub constants: Vec<Constant>,
    pub nested_types: Vec<NestedType>,
    pub iterators: Vec<HookMethod>,
    pub disposers: Vec<HookMethod>,
    pub serialization_tag: Option<SerializationTag>,
    pub callable_via: Option<String>,
    pub wildcard_getter: Option<String>,
    pub doc_overrides: Vec<DocOverride>,
    pub script_bundles: Vec<String>,
    pub memory_info: bool,
    pub iterator_declarations: Vec<String>,
    pub struct_fields: Vec<StructField>,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq, Eq)]
pub struct SourceLocation {
    pub file: PathBuf,
    /// 1-based line number, 0 when unknown.
    pub line: usize,
}

impl SourceLocation {
    pub fn new(file: impl Into<PathBuf>, line: usize) -> Self {
        Self {
            file: file.into(),
            line,
        }
    }
}

impl fmt::Display for SourceLocation {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}:{}", self.file.display(), self.line)
    }
}

#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq, Eq)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum RegistrationKind {
    /// A resource type block, optionally gated on a configuration parameter.
    Resource { condition: Option<String> },
    /// A value struct that is deep-copied to and from script objects.
    #[default]
    Struct,
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
#[serde(tag = "kind", content = "target", rename_all = "snake_case")]
pub enum Inheritance {
    Type(String),
    Intrinsic(String),
}

impl fmt::Display for Inheritance {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Inheritance::Type(t) => write!(f, "JSG_INHERIT({})", t),
            Inheritance::Intrinsic(t) => write!(f, "JSG_INHERIT_INTRINSIC({})", t),
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct Method {
    pub js_name: String,
    pub bound_name: String,
    pub is_static: bool,
}

#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Hash)]
#[serde(rename_all = "snake_case")]
pub enum PropertyLocation {
    Instance,
    Prototype,
    Static,
    Inspect,
}

impl fmt::Display for PropertyLocation {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let s = match self {
            PropertyLocation::Instance => "instance",
            PropertyLocation::Prototype => "prototype",
            PropertyLocation::Static => "static",
            PropertyLocation::Inspect => "inspect-only",
        };
        f.write_str(s)
    }
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct Property {
    pub js_name: String,
    pub getter_name: String,
    pub setter_name: Option<String>,
    pub readonly: bool,
    pub lazy: bool,
    pub location: PropertyLocation,
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct Constant {
    pub js_name: String,
    pub expression: String,
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct NestedType {
    pub js_name: String,
    pub bound_type: String,
}

#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "snake_case")]
pub enum HookKind {
    Sync,
    Async,
}

/// An iterator or disposal hook bound to a method.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct HookMethod {
    pub kind: HookKind,
    pub method_name: String,
}

impl HookMethod {
    pub fn iterator_symbol(&self) -> &'static str {
        match self.kind {
            HookKind::Sync => "[Symbol.iterator]",
            HookKind::Async => "[Symbol.asyncIterator]",
        }
    }

    pub fn dispose_symbol(&self) -> &'static str {
        match self.kind {
            HookKind::Sync => "[Symbol.dispose]",
            HookKind::Async => "[Symbol.asyncDispose]",
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct SerializationTag {
    pub one_way: bool,
    pub tag: String,
}

#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "snake_case")]
pub enum DocOverrideKind {
    Root,
    Override,
    Define,
    StructOverride,
    StructDefine,
}

impl DocOverrideKind {
    pub fn macro_name(&self) -> &'static str {
        match self {
            DocOverrideKind::Root => "JSG_TS_ROOT",
            DocOverrideKind::Override => "JSG_TS_OVERRIDE",
            DocOverrideKind::Define => "JSG_TS_DEFINE",
            DocOverrideKind::StructOverride => "JSG_STRUCT_TS_OVERRIDE",
            DocOverrideKind::StructDefine => "JSG_STRUCT_TS_DEFINE",
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct DocOverride {
    pub kind: DocOverrideKind,
    pub content: String,
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct StructField {
    pub js_name: String,
    pub bound_name: String,
}

impl StructField {
    /// A leading `$` on the bound name escapes a reserved word; the exposed name drops it.
    pub fn from_bound(bound: &str) -> Self {
        Self {
            js_name: bound.strip_prefix('$').unwrap_or(bound).to_string(),
            bound_name: bound.to_string(),
        }
    }
}

impl InterfaceModel {
    pub fn new(type_name: impl Into<String>, registration: RegistrationKind) -> Self {
        Self {
            type_name: type_name.into(),
            registration,
            ..Default::default()
        }
    }

    /// Adds a method unless one with the same exposed name and staticness exists.
    pub fn add_method(&mut self, method: Method) {
        let exists = self
            .methods
            .iter()
            .any(|m| m.js_name == method.js_name && m.is_static == method.is_static);
        if !exists {
            self.methods.push(method);
        }
    }

    /// Adds a property unless one with the same exposed name and location exists.
    pub fn add_property(&mut self, property: Property) {
        let exists = self
            .properties
            .iter()
            .any(|p| p.js_name == property.js_name && p.location == property.location);
        if !exists {
            self.properties.push(property);
        }
    }

    pub fn is_empty(&self) -> bool {
        self.inherited_from.is_empty()
            && self.methods.is_empty()
            && self.properties.is_empty()
            && self.constants.is_empty()
            && self.nested_types.is_empty()
            && self.iterators.is_empty()
            && self.disposers.is_empty()
            && self.serialization_tag.is_none()
            && self.callable_via.is_none()
            && self.wildcard_getter.is_none()
            && self.doc_overrides.is_empty()
            && self.struct_fields.is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn method(js: &str, bound: &str, is_static: bool) -> Method {
        Method {
            js_name: js.to_string(),
            bound_name: bound.to_string(),
            is_static,
        }
    }

    #[test]
    fn test_method_dedup_is_keyed_on_name_and_staticness() {
        let mut model = InterfaceModel::new("Foo", RegistrationKind::Struct);
        model.add_method(method("get", "get", false));
        model.add_method(method("get", "getOther", false));
        model.add_method(method("get", "get", true));

        assert_eq!(model.methods.len(), 2);
        assert_eq!(model.methods[0].bound_name, "get");
        assert!(model.methods[1].is_static);
    }

    #[test]
    fn test_struct_field_strips_dollar_prefix() {
        let field = StructField::from_bound("$type");
        assert_eq!(field.js_name, "type");
        assert_eq!(field.bound_name, "$type");
    }
}

mod compat;
mod deps;
mod interface;
mod schema;
mod xref;

pub use compat::{CompatFlag, CompatListing, CompatSnapshot};
pub use deps::{DependencyReport, Direction, LabelGroups, Resolution, UsageBreadth};
pub use interface::{
    Constant, DocOverride, DocOverrideKind, HookKind, HookMethod, Inheritance, InterfaceModel,
    Method, NestedType, Property, PropertyLocation, RegistrationKind, SerializationTag,
    SourceLocation, StructField,
};
pub use schema::{HighestOrdinal, OrdinalReport, RecordSummary, SchemaField, SchemaNode};
pub use xref::{CrossReference, FileCount, SearchHit, TypeGroup};

pub mod acquire;
pub mod analysis;
pub mod api;
pub mod cli;
pub mod commands;
pub mod config;
pub mod fs;
pub mod model;
pub mod output;
pub mod parser;
pub mod style;

pub use api::{DeclmapError, Project};
pub use cli::Cli;
pub use config::Config;
pub use model::{
    CompatFlag, CrossReference, DependencyReport, Direction, InterfaceModel, OrdinalReport,
    Resolution, SchemaNode,
};

use serde::Deserialize;
use std::collections::BTreeMap;
use std::path::{Path, PathBuf};
use thiserror::Error;

pub const CONFIG_FILE: &str = ".declmap.toml";

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("Failed to read config file: {0}")]
    Io(#[from] std::io::Error),
    #[error("Failed to parse config file: {0}")]
    Parse(#[from] toml::de::Error),
}

#[derive(Debug, Clone)]
pub struct Config {
    pub search: SearchSettings,
    pub graph: GraphSettings,
    pub resolver: ResolverTables,
    pub schema: SchemaSettings,
}

#[derive(Debug, Clone)]
pub struct SearchSettings {
    /// Directory (relative to the project root) holding declaration files.
    pub source_dir: PathBuf,
    pub header_glob: String,
    pub impl_glob: String,
    pub max_results: usize,
}

#[derive(Debug, Clone)]
pub struct GraphSettings {
    pub tool: String,
    /// Universe for reverse-dependency queries, e.g. `//src/...`.
    pub internal_scope: String,
    /// Prefix every internal label starts with, e.g. `//src/`.
    pub internal_prefix: String,
    /// Leading path segment dropped when deriving an ownership domain.
    pub domain_strip_prefix: String,
    pub noise_prefixes: Vec<String>,
}

/// Immutable lookup tables handed to the label resolver.
#[derive(Debug, Clone)]
pub struct ResolverTables {
    /// Short name (lower-case) to canonical external repository name.
    pub aliases: BTreeMap<String, String>,
    pub rust_prefixes: Vec<String>,
    pub cpp_prefixes: Vec<String>,
    /// Repository that vendors third-party crates.
    pub crate_registry: String,
    pub external_cap: usize,
    pub crate_cap: usize,
}

#[derive(Debug, Clone)]
pub struct SchemaSettings {
    pub compiler: PathBuf,
    pub plugin: PathBuf,
    pub import_paths: Vec<PathBuf>,
    pub build_targets: Vec<String>,
    pub compat_file: PathBuf,
}

#[derive(Debug, Deserialize)]
struct RawConfig {
    search: Option<RawSearch>,
    graph: Option<RawGraph>,
    aliases: Option<BTreeMap<String, String>>,
    ecosystems: Option<RawEcosystems>,
    schema: Option<RawSchema>,
}

#[derive(Debug, Deserialize)]
struct RawSearch {
    source_dir: Option<PathBuf>,
    header_glob: Option<String>,
    impl_glob: Option<String>,
    max_results: Option<usize>,
}

#[derive(Debug, Deserialize)]
struct RawGraph {
    tool: Option<String>,
    internal_scope: Option<String>,
    internal_prefix: Option<String>,
    domain_strip_prefix: Option<String>,
    noise_prefixes: Option<Vec<String>>,
}

#[derive(Debug, Deserialize)]
struct RawEcosystems {
    rust_prefixes: Option<Vec<String>>,
    cpp_prefixes: Option<Vec<String>>,
    crate_registry: Option<String>,
}

#[derive(Debug, Deserialize)]
struct RawSchema {
    compiler: Option<PathBuf>,
    plugin: Option<PathBuf>,
    import_paths: Option<Vec<PathBuf>>,
    build_targets: Option<Vec<String>>,
    compat_file: Option<PathBuf>,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            search: SearchSettings::default(),
            graph: GraphSettings::default(),
            resolver: ResolverTables::default(),
            schema: SchemaSettings::default(),
        }
    }
}

impl Default for SearchSettings {
    fn default() -> Self {
        Self {
            source_dir: PathBuf::from("src"),
            header_glob: "*.h".to_string(),
            impl_glob: "*.c++".to_string(),
            max_results: 50,
        }
    }
}

impl Default for GraphSettings {
    fn default() -> Self {
        Self {
            tool: "bazel".to_string(),
            internal_scope: "//src/...".to_string(),
            internal_prefix: "//src/".to_string(),
            domain_strip_prefix: "workerd/".to_string(),
            noise_prefixes: vec![
                "@bazel_tools".to_string(),
                "@platforms".to_string(),
                "@@rules_".to_string(),
            ],
        }
    }
}

impl Default for ResolverTables {
    fn default() -> Self {
        let aliases = [
            ("boringssl", "ssl"),
            ("openssl", "ssl"),
            ("v8", "workerd-v8"),
            ("icu", "com_googlesource_chromium_icu"),
            ("cxx", "workerd-cxx"),
            ("sqlite", "sqlite3"),
            ("capnp", "capnp-cpp"),
            ("capnproto", "capnp-cpp"),
            ("kj", "capnp-cpp"),
        ]
        .into_iter()
        .map(|(k, v)| (k.to_string(), v.to_string()))
        .collect();

        Self {
            aliases,
            rust_prefixes: vec!["rust:".to_string(), "crate:".to_string()],
            cpp_prefixes: vec!["cpp:".to_string(), "cc:".to_string()],
            crate_registry: "@crates_vendor".to_string(),
            external_cap: 5,
            crate_cap: 3,
        }
    }
}

impl Default for SchemaSettings {
    fn default() -> Self {
        Self {
            compiler: PathBuf::from("bazel-bin/external/+http+capnp-cpp/src/capnp/capnp_tool"),
            plugin: PathBuf::from("bazel-bin/external/+http+capnp-cpp/src/capnp/capnpc-capnp"),
            import_paths: vec![
                PathBuf::from("bazel-workerd/external/+http+capnp-cpp/src"),
                PathBuf::from("src/workerd/io"),
                PathBuf::from("src/workerd/server"),
                PathBuf::from("src"),
            ],
            build_targets: vec![
                "@capnp-cpp//src/capnp:capnp_tool".to_string(),
                "@capnp-cpp//src/capnp:capnpc-capnp".to_string(),
            ],
            compat_file: PathBuf::from("src/workerd/io/compatibility-date.capnp"),
        }
    }
}

impl Config {
    pub fn load(project_path: &Path) -> Result<Self, ConfigError> {
        let config_path = project_path.join(CONFIG_FILE);

        if !config_path.exists() {
            return Ok(Self::default());
        }

        let content = std::fs::read_to_string(&config_path)?;
        Self::from_toml(&content)
    }

    pub fn from_toml(content: &str) -> Result<Self, ConfigError> {
        let raw: RawConfig = toml::from_str(content)?;
        let mut config = Self::default();

        if let Some(s) = raw.search {
            let d = &mut config.search;
            d.source_dir = s.source_dir.unwrap_or_else(|| d.source_dir.clone());
            d.header_glob = s.header_glob.unwrap_or_else(|| d.header_glob.clone());
            d.impl_glob = s.impl_glob.unwrap_or_else(|| d.impl_glob.clone());
            d.max_results = s.max_results.unwrap_or(d.max_results);
        }

        if let Some(g) = raw.graph {
            let d = &mut config.graph;
            d.tool = g.tool.unwrap_or_else(|| d.tool.clone());
            d.internal_scope = g.internal_scope.unwrap_or_else(|| d.internal_scope.clone());
            d.internal_prefix = g.internal_prefix.unwrap_or_else(|| d.internal_prefix.clone());
            d.domain_strip_prefix = g
                .domain_strip_prefix
                .unwrap_or_else(|| d.domain_strip_prefix.clone());
            d.noise_prefixes = g.noise_prefixes.unwrap_or_else(|| d.noise_prefixes.clone());
        }

        // Configured aliases extend the built-in table; keys are matched lower-case.
        if let Some(aliases) = raw.aliases {
            for (short, repo) in aliases {
                config.resolver.aliases.insert(short.to_lowercase(), repo);
            }
        }

        if let Some(e) = raw.ecosystems {
            let d = &mut config.resolver;
            d.rust_prefixes = e.rust_prefixes.unwrap_or_else(|| d.rust_prefixes.clone());
            d.cpp_prefixes = e.cpp_prefixes.unwrap_or_else(|| d.cpp_prefixes.clone());
            d.crate_registry = e.crate_registry.unwrap_or_else(|| d.crate_registry.clone());
        }

        if let Some(s) = raw.schema {
            let d = &mut config.schema;
            d.compiler = s.compiler.unwrap_or_else(|| d.compiler.clone());
            d.plugin = s.plugin.unwrap_or_else(|| d.plugin.clone());
            d.import_paths = s.import_paths.unwrap_or_else(|| d.import_paths.clone());
            d.build_targets = s.build_targets.unwrap_or_else(|| d.build_targets.clone());
            d.compat_file = s.compat_file.unwrap_or_else(|| d.compat_file.clone());
        }

        Ok(config)
    }
}

/// Starter `.declmap.toml` written by `declmap init`.
pub fn generate_config_template() -> String {
    r#"# declmap configuration
# Every key is optional; omitted keys keep their built-in defaults.

[search]
# Directory holding declaration files, relative to the project root
source_dir = "src"
header_glob = "*.h"
impl_glob = "*.c++"
max_results = 50

[graph]
tool = "bazel"
internal_scope = "//src/..."
internal_prefix = "//src/"
domain_strip_prefix = "workerd/"
noise_prefixes = ["@bazel_tools", "@platforms", "@@rules_"]

# Short dependency names rewritten to external repository names.
# Entries here are added to the built-in table.
[aliases]
# boringssl = "ssl"

[ecosystems]
rust_prefixes = ["rust:", "crate:"]
cpp_prefixes = ["cpp:", "cc:"]
crate_registry = "@crates_vendor"

[schema]
compiler = "bazel-bin/external/+http+capnp-cpp/src/capnp/capnp_tool"
plugin = "bazel-bin/external/+http+capnp-cpp/src/capnp/capnpc-capnp"
import_paths = ["bazel-workerd/external/+http+capnp-cpp/src", "src/workerd/io", "src/workerd/server", "src"]
build_targets = ["@capnp-cpp//src/capnp:capnp_tool", "@capnp-cpp//src/capnp:capnpc-capnp"]
compat_file = "src/workerd/io/compatibility-date.capnp"
"#
    .to_string()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_template_parses_to_defaults() {
        let config = Config::from_toml(&generate_config_template()).unwrap();
        let defaults = Config::default();
        assert_eq!(config.search.source_dir, defaults.search.source_dir);
        assert_eq!(config.graph.internal_scope, defaults.graph.internal_scope);
        assert_eq!(config.resolver.aliases, defaults.resolver.aliases);
        assert_eq!(config.schema.build_targets, defaults.schema.build_targets);
    }

    #[test]
    fn test_aliases_extend_builtin_table() {
        let config = Config::from_toml("[aliases]\nZlib = \"zlib-ng\"\n").unwrap();
        assert_eq!(config.resolver.aliases.get("zlib").map(String::as_str), Some("zlib-ng"));
        assert_eq!(config.resolver.aliases.get("v8").map(String::as_str), Some("workerd-v8"));
    }

    #[test]
    fn test_partial_sections_keep_defaults() {
        let config = Config::from_toml("[graph]\ntool = \"bazelisk\"\n").unwrap();
        assert_eq!(config.graph.tool, "bazelisk");
        assert_eq!(config.graph.internal_prefix, "//src/");
    }

    #[test]
    fn test_invalid_toml_is_an_error() {
        assert!(matches!(
            Config::from_toml("[graph\n"),
            Err(ConfigError::Parse(_))
        ));
    }
}

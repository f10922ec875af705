use serde::{Deserialize, Serialize};

/// A boolean field of the compatibility-flag schema and its gating annotations.
#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq, Eq)]
pub struct CompatFlag {
    pub field_name: String,
    pub ordinal: u32,
    pub enable_flag: Option<String>,
    pub disable_flag: Option<String>,
    pub enable_date: Option<String>,
    pub enable_all_dates: bool,
    pub experimental: bool,
    pub needed_by_fl: bool,
    pub implied_by: Option<String>,
    pub obsolete: bool,
}

impl CompatFlag {
    /// The user-facing flag name, falling back to the schema field name.
    pub fn display_name(&self) -> &str {
        self.enable_flag.as_deref().unwrap_or(&self.field_name)
    }

    pub fn is_dated(&self) -> bool {
        self.enable_all_dates || self.enable_date.is_some()
    }

    pub fn matches(&self, query: &str) -> bool {
        let q = query.to_lowercase();
        let contains = |s: &str| s.to_lowercase().contains(&q);
        contains(&self.field_name)
            || self.enable_flag.as_deref().is_some_and(contains)
            || self.disable_flag.as_deref().is_some_and(contains)
    }
}

/// Flags partitioned by their state at one compatibility date.
#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq, Eq)]
pub struct CompatSnapshot {
    pub date: String,
    pub enabled: Vec<CompatFlag>,
    pub not_yet_enabled: Vec<CompatFlag>,
    pub opt_in: Vec<CompatFlag>,
    pub experimental: Vec<CompatFlag>,
}

/// All non-obsolete flags grouped for listing without a date.
#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq, Eq)]
pub struct CompatListing {
    pub active: usize,
    pub obsolete: usize,
    pub dated: Vec<CompatFlag>,
    pub opt_in: Vec<CompatFlag>,
    pub experimental: Vec<CompatFlag>,
}

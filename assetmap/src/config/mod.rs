//! Runtime configuration.
//!
//! Settings combine three concerns: which GIS services to query, how to
//! reach the Maximo asset API, and resolver tuning (timeouts, concurrency).
//! They can be built programmatically with the `with_*` methods or loaded
//! from an INI file with sections `[gis]`, `[assets]`, `[resolver]` and
//! `[departments]`. A missing file yields defaults, so the CLI works with
//! nothing but flags and environment variables.

use std::collections::BTreeMap;
use std::path::Path;

use ini::Ini;
use thiserror::Error;

/// Attribute that carries the location code on GIS features.
pub const DEFAULT_CODE_FIELD: &str = "MAXIMO_CODE";

/// Attribute that carries the human-readable name on GIS features.
pub const DEFAULT_NAME_FIELD: &str = "FACILITY_NAME";

/// Default per-request HTTP timeout, shared with the HTTP layer.
pub use crate::http::DEFAULT_TIMEOUT_SECS;

/// Default ceiling on concurrently running resolutions.
pub const DEFAULT_MAX_CONCURRENT: usize = 25;

/// Errors loading configuration from disk.
#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("failed to load config file: {0}")]
    Load(#[from] ini::Error),

    #[error("invalid value for '{key}': {value}")]
    InvalidValue { key: String, value: String },
}

/// GIS service settings.
#[derive(Debug, Clone)]
pub struct GisSettings {
    /// MapServer base URLs, queried in order.
    pub services: Vec<String>,
    /// Feature attribute matched against location codes.
    pub code_field: String,
    /// Feature attribute used for display names.
    pub name_field: String,
}

impl Default for GisSettings {
    fn default() -> Self {
        Self {
            services: Vec::new(),
            code_field: DEFAULT_CODE_FIELD.to_string(),
            name_field: DEFAULT_NAME_FIELD.to_string(),
        }
    }
}

impl GisSettings {
    /// Set the list of MapServer base URLs.
    pub fn with_services(mut self, services: Vec<String>) -> Self {
        self.services = services;
        self
    }

    /// Set the code attribute name.
    pub fn with_code_field(mut self, field: impl Into<String>) -> Self {
        self.code_field = field.into();
        self
    }

    /// Set the display-name attribute name.
    pub fn with_name_field(mut self, field: impl Into<String>) -> Self {
        self.name_field = field.into();
        self
    }
}

/// Maximo asset API settings.
#[derive(Debug, Clone)]
pub struct AssetApiSettings {
    /// API base URL, without a trailing slash.
    pub base_url: String,
    /// API key sent with every request.
    pub api_key: String,
    /// Optional site restriction applied to asset queries.
    pub site_id: Option<String>,
    /// Department name to OSLC filter fragment.
    pub departments: BTreeMap<String, String>,
}

impl Default for AssetApiSettings {
    fn default() -> Self {
        Self {
            base_url: String::new(),
            api_key: String::new(),
            site_id: None,
            departments: default_departments(),
        }
    }
}

/// Built-in department filters, keyed by department name.
fn default_departments() -> BTreeMap<String, String> {
    [
        ("POWR", r#"ASSETNUM="POWR%""#),
        ("MACS", r#"ASSETNUM="MA%""#),
        ("SVMT", r#"ASSETNUM="SV%""#),
        ("BMNT", r#"ASSETNUM="B____%""#),
        ("CMNT", r#"ASSETNUM="R____%""#),
        ("CTEM", r#"WT_MAINT_OFFICE="%CTEM%""#),
    ]
    .into_iter()
    .map(|(k, v)| (k.to_string(), v.to_string()))
    .collect()
}

impl AssetApiSettings {
    /// Set the API base URL.
    pub fn with_base_url(mut self, url: impl Into<String>) -> Self {
        self.base_url = url.into();
        self
    }

    /// Set the API key.
    pub fn with_api_key(mut self, key: impl Into<String>) -> Self {
        self.api_key = key.into();
        self
    }

    /// Restrict asset queries to one site.
    pub fn with_site_id(mut self, site: impl Into<String>) -> Self {
        self.site_id = Some(site.into());
        self
    }

    /// Returns the OSLC where clause for one department filter fragment.
    ///
    /// Decommissioned assets and child assets (those with a parent asset)
    /// are always excluded; the site restriction is applied when configured.
    pub fn asset_where_clause(&self, department_filter: &str) -> String {
        let mut clause = format!(r#"STATUS!="DECOMMISSIONED" AND {department_filter}"#);
        if let Some(site) = &self.site_id {
            clause.push_str(&format!(r#" AND SITEID="{site}""#));
        }
        clause.push_str(r#" AND PARENT!="*""#);
        clause
    }
}

/// Resolver tuning.
#[derive(Debug, Clone)]
pub struct ResolverSettings {
    /// Per-request HTTP timeout in seconds.
    pub timeout_secs: u64,
    /// Ceiling on concurrently running resolutions.
    pub max_concurrent: usize,
}

impl Default for ResolverSettings {
    fn default() -> Self {
        Self {
            timeout_secs: DEFAULT_TIMEOUT_SECS,
            max_concurrent: DEFAULT_MAX_CONCURRENT,
        }
    }
}

/// Top-level settings for a resolver session.
#[derive(Debug, Clone, Default)]
pub struct Settings {
    pub gis: GisSettings,
    pub assets: AssetApiSettings,
    pub resolver: ResolverSettings,
}

impl Settings {
    /// Load settings from an INI file.
    ///
    /// A missing file is not an error; defaults are returned so callers can
    /// layer CLI flags and environment variables on top.
    pub fn load(path: &Path) -> Result<Self, ConfigError> {
        if !path.exists() {
            return Ok(Self::default());
        }
        let ini = Ini::load_from_file(path)?;
        Self::from_ini(&ini)
    }

    fn from_ini(ini: &Ini) -> Result<Self, ConfigError> {
        let mut settings = Self::default();

        if let Some(section) = ini.section(Some("gis")) {
            if let Some(services) = section.get("services") {
                settings.gis.services = services
                    .split(',')
                    .map(str::trim)
                    .filter(|s| !s.is_empty())
                    .map(String::from)
                    .collect();
            }
            if let Some(field) = section.get("code_field") {
                settings.gis.code_field = field.to_string();
            }
            if let Some(field) = section.get("name_field") {
                settings.gis.name_field = field.to_string();
            }
        }

        if let Some(section) = ini.section(Some("assets")) {
            if let Some(url) = section.get("base_url") {
                settings.assets.base_url = url.to_string();
            }
            if let Some(key) = section.get("api_key") {
                settings.assets.api_key = key.to_string();
            }
            if let Some(site) = section.get("site_id") {
                settings.assets.site_id = Some(site.to_string());
            }
        }

        if let Some(section) = ini.section(Some("resolver")) {
            if let Some(value) = section.get("timeout_secs") {
                settings.resolver.timeout_secs = parse_key("timeout_secs", value)?;
            }
            if let Some(value) = section.get("max_concurrent") {
                settings.resolver.max_concurrent = parse_key("max_concurrent", value)?;
            }
        }

        // A [departments] section replaces the built-in table entirely.
        if let Some(section) = ini.section(Some("departments")) {
            let table: BTreeMap<String, String> = section
                .iter()
                .map(|(k, v)| (k.to_string(), v.to_string()))
                .collect();
            if !table.is_empty() {
                settings.assets.departments = table;
            }
        }

        Ok(settings)
    }

    /// Set the asset API key, overriding any loaded value.
    pub fn with_api_key(mut self, key: impl Into<String>) -> Self {
        self.assets.api_key = key.into();
        self
    }
}

fn parse_key<T: std::str::FromStr>(key: &str, value: &str) -> Result<T, ConfigError> {
    value.parse().map_err(|_| ConfigError::InvalidValue {
        key: key.to_string(),
        value: value.to_string(),
    })
}

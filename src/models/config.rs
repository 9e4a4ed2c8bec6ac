//! Application configuration structures.
//!
//! The `defaults` module ships the extraction profile observed on the
//! vendor portal: section anchors, field blueprints, and the canonical
//! price-label rename table. Everything is overridable via `config.toml`.

use std::collections::BTreeMap;
use std::fs;
use std::path::Path;

use regex::Regex;
use serde::{Deserialize, Serialize};

use crate::error::{AppError, Result};
use crate::models::blueprint::{Cardinality, ExtractionProfile};

/// Root application configuration.
#[derive(Debug, Clone, Serialize, Deserialize, Default)]
pub struct Config {
    /// Portal endpoints and HTTP behavior
    #[serde(default)]
    pub portal: PortalConfig,

    /// Cache and output locations
    #[serde(default)]
    pub storage: StorageConfig,

    /// Section anchors and field blueprints
    #[serde(default)]
    pub profile: ProfileConfig,
}

impl Config {
    /// Load configuration from a TOML file.
    pub fn load(path: impl AsRef<Path>) -> Result<Self> {
        let content = fs::read_to_string(path)?;
        Ok(toml::from_str(&content)?)
    }

    /// Load configuration or return default if loading fails.
    pub fn load_or_default(path: impl AsRef<Path>) -> Self {
        if !path.as_ref().exists() {
            return Self::default();
        }
        Self::load(&path).unwrap_or_else(|e| {
            log::warn!(
                "Config load failed from {:?}: {}. Using defaults.",
                path.as_ref(),
                e
            );
            Self::default()
        })
    }

    /// Validate configuration values for basic sanity.
    ///
    /// Also compiles the extraction profile and the identifier pattern so a
    /// malformed blueprint fails fast, before any document is processed.
    pub fn validate(&self) -> Result<()> {
        if self.portal.user_agent.trim().is_empty() {
            return Err(AppError::validation("portal.user_agent is empty"));
        }
        if self.portal.timeout_secs == 0 {
            return Err(AppError::validation("portal.timeout_secs must be > 0"));
        }
        if !self.portal.base_url.starts_with("http") {
            return Err(AppError::validation("portal.base_url must be an http(s) URL"));
        }
        if self.portal.login_marker.is_empty() {
            return Err(AppError::validation("portal.login_marker is empty"));
        }
        self.portal.identifier_regex()?;
        if self.profile.sections.is_empty() {
            return Err(AppError::validation("no fixed sections defined"));
        }
        ExtractionProfile::compile(&self.profile)?;
        Ok(())
    }
}

/// Portal endpoints and HTTP client settings.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PortalConfig {
    /// Portal base URL
    #[serde(default = "defaults::base_url")]
    pub base_url: String,

    /// Path of the job listing (and login) endpoint
    #[serde(default = "defaults::list_path")]
    pub list_path: String,

    /// Path of the job detail endpoint
    #[serde(default = "defaults::detail_path")]
    pub detail_path: String,

    /// Job status filter sent with listing and detail requests
    #[serde(default = "defaults::job_status")]
    pub job_status: String,

    /// Substring of the login response that marks success
    #[serde(default = "defaults::login_marker")]
    pub login_marker: String,

    /// Pattern extracting job identifiers from the listing page;
    /// must carry exactly one capture group
    #[serde(default = "defaults::uuid_pattern")]
    pub uuid_pattern: String,

    /// User-Agent header for HTTP requests
    #[serde(default = "defaults::user_agent")]
    pub user_agent: String,

    /// Request timeout in seconds
    #[serde(default = "defaults::timeout")]
    pub timeout_secs: u64,
}

impl PortalConfig {
    /// Full URL of the listing endpoint.
    pub fn list_url(&self) -> String {
        format!("{}{}", self.base_url, self.list_path)
    }

    /// Full URL of the detail endpoint.
    pub fn detail_url(&self) -> String {
        format!("{}{}", self.base_url, self.detail_path)
    }

    /// Compile and validate the identifier pattern.
    pub fn identifier_regex(&self) -> Result<Regex> {
        let regex = Regex::new(&self.uuid_pattern)?;
        if regex.captures_len() != 2 {
            return Err(AppError::validation(format!(
                "portal.uuid_pattern '{}' must have exactly one capture group",
                self.uuid_pattern
            )));
        }
        Ok(regex)
    }
}

impl Default for PortalConfig {
    fn default() -> Self {
        Self {
            base_url: defaults::base_url(),
            list_path: defaults::list_path(),
            detail_path: defaults::detail_path(),
            job_status: defaults::job_status(),
            login_marker: defaults::login_marker(),
            uuid_pattern: defaults::uuid_pattern(),
            user_agent: defaults::user_agent(),
            timeout_secs: defaults::timeout(),
        }
    }
}

/// Cache and output locations, relative to the storage directory.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct StorageConfig {
    /// Directory for cached job documents
    #[serde(default = "defaults::cache_dir")]
    pub cache_dir: String,

    /// Directory for exported records and diagnostics
    #[serde(default = "defaults::output_dir")]
    pub output_dir: String,
}

impl Default for StorageConfig {
    fn default() -> Self {
        Self {
            cache_dir: defaults::cache_dir(),
            output_dir: defaults::output_dir(),
        }
    }
}

/// Declarative extraction profile: anchors, blueprints, price renames.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ProfileConfig {
    /// Fixed sections extracted into the merged field map
    #[serde(default = "defaults::fixed_sections")]
    pub sections: Vec<SectionConfig>,

    /// Price table anchor and rename rules
    #[serde(default)]
    pub prices: PriceTableConfig,

    /// Repeated address section
    #[serde(default = "defaults::address_section")]
    pub addresses: SectionConfig,
}

impl Default for ProfileConfig {
    fn default() -> Self {
        Self {
            sections: defaults::fixed_sections(),
            prices: PriceTableConfig::default(),
            addresses: defaults::address_section(),
        }
    }
}

/// One section anchor with its field blueprint.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SectionConfig {
    /// Section kind (header, client, itinerary, address, ...)
    pub name: String,

    /// Tag name of the anchor subtree
    pub tag: String,

    /// Attribute filter on the anchor tag
    #[serde(default)]
    pub attrs: BTreeMap<String, String>,

    /// Expected match cardinality
    #[serde(default)]
    pub cardinality: Cardinality,

    /// Field name to extraction rule
    #[serde(default)]
    pub fields: BTreeMap<String, FieldSpecConfig>,
}

/// One declarative field-extraction rule.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct FieldSpecConfig {
    /// Signed line index into the section's line sequence;
    /// negative counts from the end
    pub line: i32,

    /// Pattern with exactly one capture group
    pub pattern: String,

    /// Whether a miss produces a diagnostic
    #[serde(default)]
    pub required: bool,
}

/// Price table anchor and remapping rules.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PriceTableConfig {
    /// Tag name of the price table subtree
    #[serde(default = "defaults::prices_tag")]
    pub tag: String,

    /// Attribute filter on the price table tag
    #[serde(default)]
    pub attrs: BTreeMap<String, String>,

    /// Vendor label to canonical field name renames
    #[serde(default = "defaults::price_renames")]
    pub renames: Vec<Rename>,

    /// Characters to skip off the raw waiting-time cell so that only the
    /// trailing price remains. Provisional; verify against real samples.
    #[serde(default = "defaults::waiting_time_offset")]
    pub waiting_time_offset: usize,
}

impl Default for PriceTableConfig {
    fn default() -> Self {
        Self {
            tag: defaults::prices_tag(),
            attrs: BTreeMap::new(),
            renames: defaults::price_renames(),
            waiting_time_offset: defaults::waiting_time_offset(),
        }
    }
}

/// A label rename rule.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Rename {
    pub from: String,
    pub to: String,
}

mod defaults {
    use std::collections::BTreeMap;

    use super::{FieldSpecConfig, Rename, SectionConfig};
    use crate::models::blueprint::Cardinality;

    // Portal defaults
    pub fn base_url() -> String {
        "http://bamboo-mec.de".into()
    }
    pub fn list_path() -> String {
        "/ll.php5".into()
    }
    pub fn detail_path() -> String {
        "/ll_detail.php5".into()
    }
    pub fn job_status() -> String {
        "delivered".into()
    }
    pub fn login_marker() -> String {
        // "erfolgreich" appears in the portal's login-success page
        "erfolgreich".into()
    }
    pub fn uuid_pattern() -> String {
        r"uuid=(\d{7})".into()
    }
    pub fn user_agent() -> String {
        "Mozilla/5.0 (compatible; miner/0.1)".into()
    }
    pub fn timeout() -> u64 {
        30
    }

    // Storage defaults
    pub fn cache_dir() -> String {
        "cache".into()
    }
    pub fn output_dir() -> String {
        "records".into()
    }

    // Price table defaults
    pub fn prices_tag() -> String {
        "tbody".into()
    }
    pub fn waiting_time_offset() -> usize {
        // The raw cell reads "<minutes> Min <price>"; skipping 7 characters
        // keeps the price for the two-digit minute counts seen so far.
        7
    }
    pub fn price_renames() -> Vec<Rename> {
        [
            ("Stadtkurier", "city_tour"),
            ("Stadt Stopp(s)", "extra_stops"),
            ("OV Ex Nat PU", "overnight"),
            ("ON Ex Nat Del.", "overnight"),
            ("Empfangsbestät.", "fax_confirm"),
            ("Wartezeit min.", "waiting_time"),
        ]
        .iter()
        .map(|(from, to)| Rename {
            from: from.to_string(),
            to: to.to_string(),
        })
        .collect()
    }

    fn field(line: i32, pattern: &str, required: bool) -> FieldSpecConfig {
        FieldSpecConfig {
            line,
            pattern: pattern.to_string(),
            required,
        }
    }

    fn fields(entries: &[(&str, FieldSpecConfig)]) -> BTreeMap<String, FieldSpecConfig> {
        entries
            .iter()
            .map(|(name, spec)| (name.to_string(), spec.clone()))
            .collect()
    }

    // Profile defaults
    pub fn fixed_sections() -> Vec<SectionConfig> {
        vec![
            SectionConfig {
                name: "header".to_string(),
                tag: "h2".to_string(),
                attrs: BTreeMap::new(),
                cardinality: Cardinality::One,
                fields: fields(&[
                    ("order_id", field(0, r".*(\d{10})", false)),
                    ("is_payed_cash", field(0, r"(BAR)", false)),
                ]),
            },
            SectionConfig {
                name: "client".to_string(),
                tag: "h4".to_string(),
                attrs: BTreeMap::new(),
                cardinality: Cardinality::One,
                fields: fields(&[
                    ("client_id", field(0, r".*(\d{5})$", true)),
                    ("client_name", field(0, r"Kunde:\s(.*)\s\|", true)),
                ]),
            },
            SectionConfig {
                name: "itinerary".to_string(),
                tag: "p".to_string(),
                attrs: BTreeMap::new(),
                cardinality: Cardinality::One,
                fields: fields(&[("distance", field(0, r"(\d{1,2},\d{3})\sdistance", false))]),
            },
        ]
    }

    pub fn address_section() -> SectionConfig {
        let mut attrs = BTreeMap::new();
        attrs.insert("data-collapsed".to_string(), "true".to_string());
        SectionConfig {
            name: "address".to_string(),
            tag: "div".to_string(),
            attrs,
            cardinality: Cardinality::Many,
            fields: fields(&[
                ("company", field(1, r"(.*)", true)),
                ("address", field(2, r"(.*)", true)),
                ("city", field(3, r"(?:\d{5})\s(.*)", true)),
                ("postal_code", field(3, r"(\d{5})(?:.*)", true)),
                ("purpose", field(0, r"(Abholung|Zustellung)", true)),
                // Tail-anchored: trailing contact/status lines vary, so the
                // timing fields count from the end of the section.
                ("after", field(-3, r"(?:.*)ab\s(\d{2}:\d{2})", false)),
                ("until", field(-3, r"(?:.*)bis\s+(\d{2}:\d{2})", false)),
                ("timestamp", field(-2, r"ST:\s(\d{2}:\d{2})", true)),
            ]),
        }
    }
}

//! # Configuration
//!
//! Where the database lives, how the store labels its documents, and how many
//! rows the summary reports keep.
//!
//! ## Configuration Sources
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │                    Configuration Priority                               │
//! │                                                                         │
//! │  1. Environment Variables (highest priority)                           │
//! │     TALLY_DB_PATH=/data/shop.db                                        │
//! │     TALLY_STORE_NAME="Corner Store"                                    │
//! │     TALLY_REPORT_TOP_N=10                                              │
//! │                                                                         │
//! │  2. TOML Config File                                                   │
//! │     $TALLY_CONFIG, or                                                  │
//! │     ~/.config/tally/tally.toml (Linux)                                 │
//! │     ~/Library/Application Support/com.tally.tally/tally.toml (macOS)   │
//! │                                                                         │
//! │  3. Default Values (lowest priority)                                   │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```
//!
//! ## Configuration File Format
//! ```toml
//! [database]
//! path = "/var/lib/tally/tally.db"
//! max_connections = 5
//!
//! [store]
//! name = "Corner Store"
//! currency_symbol = "Rs "
//! invoice_prefix = "INV"
//! payment_prefix = "PAY"
//!
//! [reports]
//! top_n = 5
//! ```

use serde::{Deserialize, Serialize};
use std::path::PathBuf;
use thiserror::Error;
use tracing::{debug, info, warn};

use crate::pool::DbConfig;
use tally_core::{Money, DEFAULT_TOP_N, WALK_IN_CUSTOMER};

// =============================================================================
// Errors
// =============================================================================

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("Failed to read config file: {0}")]
    Io(#[from] std::io::Error),

    #[error("Invalid config file: {0}")]
    Parse(#[from] toml::de::Error),

    #[error("Failed to write config file: {0}")]
    Serialize(#[from] toml::ser::Error),

    #[error("Invalid configuration: {0}")]
    Invalid(String),

    #[error("No config directory available on this platform")]
    NoConfigPath,
}

pub type ConfigResult<T> = Result<T, ConfigError>;

// =============================================================================
// Sections
// =============================================================================

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DatabaseSettings {
    /// SQLite file. `None` means the platform data directory.
    #[serde(default)]
    pub path: Option<PathBuf>,

    #[serde(default = "default_max_connections")]
    pub max_connections: u32,
}

fn default_max_connections() -> u32 {
    5
}

impl Default for DatabaseSettings {
    fn default() -> Self {
        DatabaseSettings {
            path: None,
            max_connections: default_max_connections(),
        }
    }
}

/// Store identity and document numbering.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct StoreSettings {
    #[serde(default = "default_store_name")]
    pub name: String,

    #[serde(default = "default_currency_symbol")]
    pub currency_symbol: String,

    /// Decimal places shown for amounts (stored amounts are always cents).
    #[serde(default = "default_currency_decimals")]
    pub currency_decimals: u8,

    #[serde(default = "default_invoice_prefix")]
    pub invoice_prefix: String,

    #[serde(default = "default_payment_prefix")]
    pub payment_prefix: String,

    /// Name recorded on sales without a selected customer.
    #[serde(default = "default_walk_in_name")]
    pub walk_in_customer_name: String,
}

fn default_store_name() -> String {
    "Tally Store".to_string()
}
fn default_currency_symbol() -> String {
    "$".to_string()
}
fn default_currency_decimals() -> u8 {
    2
}
fn default_invoice_prefix() -> String {
    "INV".to_string()
}
fn default_payment_prefix() -> String {
    "PAY".to_string()
}
fn default_walk_in_name() -> String {
    WALK_IN_CUSTOMER.to_string()
}

impl Default for StoreSettings {
    fn default() -> Self {
        StoreSettings {
            name: default_store_name(),
            currency_symbol: default_currency_symbol(),
            currency_decimals: default_currency_decimals(),
            invoice_prefix: default_invoice_prefix(),
            payment_prefix: default_payment_prefix(),
            walk_in_customer_name: default_walk_in_name(),
        }
    }
}

impl StoreSettings {
    /// Formats an amount for display.
    ///
    /// ## Example
    /// ```rust
    /// use tally_db::config::StoreSettings;
    /// use tally_core::Money;
    ///
    /// let store = StoreSettings::default();
    /// assert_eq!(store.format_currency(Money::from_cents(1234)), "$12.34");
    /// assert_eq!(store.format_currency(Money::from_cents(-5)), "-$0.05");
    /// ```
    pub fn format_currency(&self, amount: Money) -> String {
        let cents = amount.cents();
        let sign = if cents < 0 { "-" } else { "" };
        let cents = cents.unsigned_abs();

        // Stored amounts carry two decimals; show fewer by rounding
        match self.currency_decimals {
            0 => format!("{}{}{}", sign, self.currency_symbol, (cents + 50) / 100),
            1 => format!(
                "{}{}{}.{}",
                sign,
                self.currency_symbol,
                (cents + 5) / 100,
                ((cents + 5) % 100) / 10
            ),
            _ => format!(
                "{}{}{}.{:02}",
                sign,
                self.currency_symbol,
                cents / 100,
                cents % 100
            ),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ReportSettings {
    /// Rows kept in top-customer / top-item sections.
    #[serde(default = "default_top_n")]
    pub top_n: usize,
}

fn default_top_n() -> usize {
    DEFAULT_TOP_N
}

impl Default for ReportSettings {
    fn default() -> Self {
        ReportSettings {
            top_n: default_top_n(),
        }
    }
}

// =============================================================================
// App Config
// =============================================================================

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct AppConfig {
    #[serde(default)]
    pub database: DatabaseSettings,

    #[serde(default)]
    pub store: StoreSettings,

    #[serde(default)]
    pub reports: ReportSettings,
}

impl AppConfig {
    /// Loads configuration from file, environment, and defaults.
    ///
    /// ## Load Order (later overrides earlier)
    /// 1. Default values
    /// 2. Config file (`config_path`, `TALLY_CONFIG`, or the platform path)
    /// 3. Environment variables
    pub fn load(config_path: Option<PathBuf>) -> ConfigResult<Self> {
        let mut config = Self::default();

        let path = config_path
            .or_else(|| std::env::var_os("TALLY_CONFIG").map(PathBuf::from))
            .or_else(Self::default_config_path);

        if let Some(path) = path {
            if path.exists() {
                info!(?path, "Loading config from file");
                config = Self::from_toml(&std::fs::read_to_string(&path)?)?;
            } else {
                debug!(?path, "Config file not found, using defaults");
            }
        }

        config.apply_overrides(|key| std::env::var(key).ok());
        config.validate()?;

        Ok(config)
    }

    /// Loads config or falls back to defaults (with environment overrides).
    pub fn load_or_default(config_path: Option<PathBuf>) -> Self {
        Self::load(config_path).unwrap_or_else(|e| {
            warn!("Failed to load config: {}. Using defaults.", e);
            let mut config = Self::default();
            config.apply_overrides(|key| std::env::var(key).ok());
            config
        })
    }

    pub fn from_toml(contents: &str) -> ConfigResult<Self> {
        Ok(toml::from_str(contents)?)
    }

    pub fn save(&self, config_path: Option<PathBuf>) -> ConfigResult<()> {
        let path = config_path
            .or_else(Self::default_config_path)
            .ok_or(ConfigError::NoConfigPath)?;

        if let Some(parent) = path.parent() {
            std::fs::create_dir_all(parent)?;
        }
        std::fs::write(&path, toml::to_string_pretty(self)?)?;

        info!(?path, "Config saved");
        Ok(())
    }

    pub fn validate(&self) -> ConfigResult<()> {
        if self.database.max_connections == 0 {
            return Err(ConfigError::Invalid(
                "database.max_connections must be greater than 0".into(),
            ));
        }
        if self.reports.top_n == 0 {
            return Err(ConfigError::Invalid(
                "reports.top_n must be greater than 0".into(),
            ));
        }
        if self.store.invoice_prefix.trim().is_empty() || self.store.payment_prefix.trim().is_empty()
        {
            return Err(ConfigError::Invalid(
                "document prefixes must not be empty".into(),
            ));
        }
        Ok(())
    }

    /// Applies `TALLY_*` overrides read through `lookup`.
    pub fn apply_overrides<F>(&mut self, lookup: F)
    where
        F: Fn(&str) -> Option<String>,
    {
        if let Some(path) = lookup("TALLY_DB_PATH") {
            debug!(path = %path, "Overriding database path from environment");
            self.database.path = Some(PathBuf::from(path));
        }

        if let Some(name) = lookup("TALLY_STORE_NAME") {
            self.store.name = name;
        }

        if let Some(top_n) = lookup("TALLY_REPORT_TOP_N") {
            match top_n.parse::<usize>() {
                Ok(n) => self.reports.top_n = n,
                Err(_) => warn!(value = %top_n, "Ignoring invalid TALLY_REPORT_TOP_N"),
            }
        }
    }

    /// The SQLite file to open: configured path, else `tally.db` in the
    /// platform data directory, else the working directory.
    pub fn database_path(&self) -> PathBuf {
        if let Some(path) = &self.database.path {
            return path.clone();
        }
        Self::project_dirs()
            .map(|dirs| dirs.data_dir().join("tally.db"))
            .unwrap_or_else(|| PathBuf::from("tally.db"))
    }

    pub fn db_config(&self) -> DbConfig {
        DbConfig::new(self.database_path()).max_connections(self.database.max_connections)
    }

    fn default_config_path() -> Option<PathBuf> {
        Self::project_dirs().map(|dirs| dirs.config_dir().join("tally.toml"))
    }

    fn project_dirs() -> Option<directories::ProjectDirs> {
        directories::ProjectDirs::from("com", "tally", "tally")
    }
}

//! Application settings loading from config.toml
//!
//! `config.toml` carries display preferences and the default transaction categories
//! that are seeded for each new account. Every section is optional; missing
//! sections fall back to built-in defaults.

use crate::entities::CategoryType;
use crate::errors::{Error, Result};
use serde::{Deserialize, Serialize};
use std::path::Path;

/// Configuration structure representing the entire config.toml file
#[derive(Debug, Deserialize)]
pub struct Config {
    /// Currency display settings
    #[serde(default)]
    pub display: DisplayConfig,
    /// Categories seeded for new accounts
    #[serde(default = "default_categories")]
    pub categories: Vec<CategoryConfig>,
}

/// Currency display settings
#[derive(Debug, Deserialize, Clone, PartialEq, Eq)]
#[serde(default)]
pub struct DisplayConfig {
    /// Symbol placed before the amount
    pub currency_symbol: String,
    /// Thousands separator
    pub grouping_separator: char,
}

impl Default for DisplayConfig {
    fn default() -> Self {
        Self {
            currency_symbol: "$".to_string(),
            grouping_separator: ',',
        }
    }
}

/// Configuration for a single default category
#[derive(Debug, Deserialize, Serialize, Clone, PartialEq, Eq)]
pub struct CategoryConfig {
    /// Category name
    pub name: String,
    /// Which transaction types it applies to
    #[serde(rename = "type")]
    pub category_type: CategoryType,
}

impl CategoryConfig {
    fn new(name: &str, category_type: CategoryType) -> Self {
        Self {
            name: name.to_string(),
            category_type,
        }
    }
}

/// Built-in category set used when config.toml has none.
#[must_use]
pub fn default_categories() -> Vec<CategoryConfig> {
    vec![
        CategoryConfig::new("Services", CategoryType::Income),
        CategoryConfig::new("Consulting", CategoryType::Income),
        CategoryConfig::new("Advertising", CategoryType::Expense),
        CategoryConfig::new("Software", CategoryType::Expense),
        CategoryConfig::new("Salaries", CategoryType::Expense),
        CategoryConfig::new("Other", CategoryType::Both),
    ]
}

/// Loads settings from a TOML file
///
/// # Errors
/// Returns an error if:
/// - The file cannot be read
/// - The TOML syntax is invalid
/// - A category has an unknown type
pub fn load_config<P: AsRef<Path>>(path: P) -> Result<Config> {
    let contents = std::fs::read_to_string(path.as_ref()).map_err(|e| Error::Config {
        message: format!("Failed to read config file: {e}"),
    })?;

    toml::from_str(&contents).map_err(|e| Error::Config {
        message: format!("Failed to parse config.toml: {e}"),
    })
}

/// Loads settings from ./config.toml, using defaults when the file is absent.
pub fn load_default_config() -> Result<Config> {
    let path = Path::new("config.toml");
    if !path.exists() {
        tracing::info!("No config.toml found, using built-in defaults");
        return Ok(Config {
            display: DisplayConfig::default(),
            categories: default_categories(),
        });
    }
    load_config(path)
}

//! Local user preferences stored as a small JSON file.
//!
//! The file holds two fixed keys: `"language"` and `"transaction_categories"`.
//! Anything missing or unreadable falls back to the defaults, so a damaged file
//! never stops the app from starting.

use crate::{
    config::settings::{CategoryConfig, default_categories},
    errors::Result,
};
use serde::{Deserialize, Serialize};
use std::{
    fs,
    path::{Path, PathBuf},
};
use tracing::{debug, warn};

const LANGUAGE_KEY: &str = "language";
const CATEGORIES_KEY: &str = "transaction_categories";

/// Interface language.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Language {
    /// English
    #[default]
    En,
    /// Spanish
    Es,
}

/// Preferences backed by a JSON file.
#[derive(Debug, Clone)]
pub struct PreferenceStore {
    path: PathBuf,
    language: Language,
    categories: Vec<CategoryConfig>,
}

impl PreferenceStore {
    /// Loads preferences from `path`, using defaults for anything missing or corrupt.
    #[must_use]
    pub fn open(path: impl Into<PathBuf>) -> Self {
        Self::open_with_defaults(path, default_categories())
    }

    /// Like [`Self::open`], with the category fallback taken from `config.toml`.
    #[must_use]
    pub fn open_with_defaults(path: impl Into<PathBuf>, defaults: Vec<CategoryConfig>) -> Self {
        let path = path.into();
        let document = read_document(&path);

        let language = read_key(&document, LANGUAGE_KEY, &path).unwrap_or_default();
        let categories = read_key(&document, CATEGORIES_KEY, &path).unwrap_or(defaults);

        Self {
            path,
            language,
            categories,
        }
    }

    /// Location of the backing file.
    #[must_use]
    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Current language.
    #[must_use]
    pub const fn language(&self) -> Language {
        self.language
    }

    /// Default categories offered to new accounts.
    #[must_use]
    pub fn categories(&self) -> &[CategoryConfig] {
        &self.categories
    }

    /// Changes the language and rewrites the file.
    pub fn set_language(&mut self, language: Language) -> Result<()> {
        self.language = language;
        self.save()
    }

    /// Replaces the default categories and rewrites the file.
    pub fn set_categories(&mut self, categories: Vec<CategoryConfig>) -> Result<()> {
        self.categories = categories;
        self.save()
    }

    fn save(&self) -> Result<()> {
        let mut document = serde_json::Map::new();
        document.insert(
            LANGUAGE_KEY.to_string(),
            serde_json::to_value(self.language)?,
        );
        document.insert(
            CATEGORIES_KEY.to_string(),
            serde_json::to_value(&self.categories)?,
        );

        if let Some(parent) = self.path.parent().filter(|p| !p.as_os_str().is_empty()) {
            fs::create_dir_all(parent)?;
        }
        fs::write(
            &self.path,
            serde_json::to_string_pretty(&serde_json::Value::Object(document))?,
        )?;
        debug!("Saved preferences to {}", self.path.display());
        Ok(())
    }
}

fn read_document(path: &Path) -> serde_json::Map<String, serde_json::Value> {
    let contents = match fs::read_to_string(path) {
        Ok(contents) => contents,
        Err(e) if e.kind() == std::io::ErrorKind::NotFound => {
            debug!("No preference file at {}, using defaults", path.display());
            return serde_json::Map::new();
        }
        Err(e) => {
            warn!("Could not read {}: {e}. Using defaults", path.display());
            return serde_json::Map::new();
        }
    };

    match serde_json::from_str(&contents) {
        Ok(serde_json::Value::Object(document)) => document,
        Ok(_) => {
            warn!("{} is not a JSON object. Using defaults", path.display());
            serde_json::Map::new()
        }
        Err(e) => {
            warn!("{} is corrupt: {e}. Using defaults", path.display());
            serde_json::Map::new()
        }
    }
}

fn read_key<T: for<'de> Deserialize<'de>>(
    document: &serde_json::Map<String, serde_json::Value>,
    key: &str,
    path: &Path,
) -> Option<T> {
    let value = document.get(key)?;
    match T::deserialize(value) {
        Ok(parsed) => Some(parsed),
        Err(e) => {
            warn!("Ignoring invalid \"{key}\" in {}: {e}", path.display());
            None
        }
    }
}

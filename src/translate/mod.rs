//! Translation hook for keys exported to the page translation table.

use std::fs;
use std::path::Path;

use rustc_hash::FxHashMap;

use crate::config::ConfigError;

/// Turns a translation key into display text.
pub trait Translator {
    fn translate(&self, key: &str) -> String;
}

/// Returns every key unchanged. Used when no translator is configured.
#[derive(Debug, Clone, Copy, Default)]
pub struct Passthrough;

impl Translator for Passthrough {
    fn translate(&self, key: &str) -> String {
        key.to_owned()
    }
}

/// Lookup table of `key = "text"` pairs. Missing keys pass through.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct TableTranslator {
    table: FxHashMap<String, String>,
}

impl TableTranslator {
    pub fn new(table: FxHashMap<String, String>) -> Self {
        Self { table }
    }

    /// Load a flat TOML table.
    pub fn load(path: &Path) -> Result<Self, ConfigError> {
        let content = fs::read_to_string(path).map_err(|e| ConfigError::Io(path.to_path_buf(), e))?;
        Self::parse(&content)
    }

    pub fn parse(content: &str) -> Result<Self, ConfigError> {
        Ok(Self {
            table: toml::from_str(content)?,
        })
    }

    pub fn len(&self) -> usize {
        self.table.len()
    }

    pub fn is_empty(&self) -> bool {
        self.table.is_empty()
    }
}

impl Translator for TableTranslator {
    fn translate(&self, key: &str) -> String {
        self.table
            .get(key)
            .cloned()
            .unwrap_or_else(|| key.to_owned())
    }
}

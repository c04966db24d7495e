//! Page-wide translation table collected during an emission.

use rustc_hash::FxHashSet;

use crate::error::Result;
use crate::markup::Element;
use crate::translate::Translator;

/// Declares the global table without clobbering one set by an earlier fragment.
pub const TRANSLATIONS_INIT: &str =
    "var translations = typeof translations == 'undefined' ? {} : translations;";

/// Unique translation keys in first-seen order.
#[derive(Debug, Clone, Default)]
pub struct TranslationTable {
    keys: Vec<String>,
    seen: FxHashSet<String>,
}

impl TranslationTable {
    pub fn new() -> Self {
        Self::default()
    }

    /// Add keys, skipping those already present.
    pub fn extend<'k>(&mut self, keys: impl IntoIterator<Item = &'k String>) {
        for key in keys {
            if self.seen.insert(key.clone()) {
                self.keys.push(key.clone());
            }
        }
    }

    pub fn keys(&self) -> &[String] {
        &self.keys
    }

    pub fn is_empty(&self) -> bool {
        self.keys.is_empty()
    }

    /// The preamble script: init line, then one assignment per key.
    pub fn to_script(&self, translator: Option<&dyn Translator>) -> Result<Element> {
        let mut lines = Vec::with_capacity(self.keys.len() + 1);
        lines.push(TRANSLATIONS_INIT.to_owned());
        for key in &self.keys {
            let text = match translator {
                Some(t) => t.translate(key),
                None => key.clone(),
            };
            lines.push(format!(
                "translations[{}] = {};",
                serde_json::to_string(key)?,
                serde_json::to_string(&text)?
            ));
        }
        Ok(Element::script().text(format!("\n{}", lines.join("\n"))))
    }
}

//! Resource definitions and the catalog they live in.
//!
//! A catalog maps a resource name to its declared definition. It is built
//! once (usually from `webres.toml`) and treated as read-only afterwards.
//!
//! ```toml
//! [scripts.app]
//! depends = ["jquery"]     # a single string is accepted too
//! filename = "js/app.js"
//! minified = "js/app.min.js"
//! public = "https://cdn.example/app.js"
//! include = false
//! translations = ["Hello"]
//! config = "app"
//! ```

mod kind;

pub use kind::AssetKind;

use rustc_hash::FxHashMap;
use serde::{Deserialize, Deserializer, Serialize};

// ============================================================================
// Source variants
// ============================================================================

/// Anything that declares source variants the artifact builder can pick from.
pub trait Sourced {
    /// Raw (development) source path, relative to the web root.
    fn filename(&self) -> Option<&str>;

    /// Already-minified source path, relative to the web root.
    fn minified(&self) -> Option<&str>;

    /// Public/CDN URL.
    fn public(&self) -> Option<&str> {
        None
    }

    /// Embed content instead of referencing by URL.
    fn is_inline(&self) -> bool;
}

// ============================================================================
// Script definition
// ============================================================================

/// Declared definition of a script resource.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ResourceDefinition {
    /// Names of resources that must be emitted before this one.
    #[serde(deserialize_with = "one_or_many")]
    pub depends: Vec<String>,

    /// Raw source path.
    pub filename: Option<String>,

    /// Minified source path.
    pub minified: Option<String>,

    /// Public URL, used instead of a local build when `use_public` is set.
    pub public: Option<String>,

    /// Inline the source content into the markup.
    pub include: bool,

    /// Translation keys exported to the page-wide translation table.
    pub translations: Vec<String>,

    /// Handle of the config provider that supplies page variables.
    pub config: Option<String>,
}

impl ResourceDefinition {
    /// Definition with only a raw source file.
    pub fn with_filename(filename: impl Into<String>) -> Self {
        Self {
            filename: Some(filename.into()),
            ..Self::default()
        }
    }

    /// Builder: add a dependency.
    pub fn depends_on(mut self, name: impl Into<String>) -> Self {
        self.depends.push(name.into());
        self
    }
}

impl Sourced for ResourceDefinition {
    fn filename(&self) -> Option<&str> {
        self.filename.as_deref()
    }

    fn minified(&self) -> Option<&str> {
        self.minified.as_deref()
    }

    fn public(&self) -> Option<&str> {
        self.public.as_deref()
    }

    fn is_inline(&self) -> bool {
        self.include
    }
}

/// Accept `depends = "a"` as well as `depends = ["a", "b"]`.
fn one_or_many<'de, D>(deserializer: D) -> Result<Vec<String>, D::Error>
where
    D: Deserializer<'de>,
{
    #[derive(Deserialize)]
    #[serde(untagged)]
    enum OneOrMany {
        One(String),
        Many(Vec<String>),
    }

    Ok(match OneOrMany::deserialize(deserializer)? {
        OneOrMany::One(name) => vec![name],
        OneOrMany::Many(names) => names,
    })
}

// ============================================================================
// Style definition
// ============================================================================

/// Declared definition of a stylesheet.
///
/// Styles have no dependency graph, translations or page variables.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct StyleDefinition {
    pub filename: Option<String>,
    pub minified: Option<String>,
    pub include: bool,
    /// `media` attribute of the emitted element.
    pub media: Option<String>,
}

impl Sourced for StyleDefinition {
    fn filename(&self) -> Option<&str> {
        self.filename.as_deref()
    }

    fn minified(&self) -> Option<&str> {
        self.minified.as_deref()
    }

    fn is_inline(&self) -> bool {
        self.include
    }
}

// ============================================================================
// Catalog
// ============================================================================

/// Name → definition mapping.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct Catalog<D> {
    entries: FxHashMap<String, D>,
}

impl<D> Default for Catalog<D> {
    fn default() -> Self {
        Self {
            entries: FxHashMap::default(),
        }
    }
}

impl<D> Catalog<D> {
    pub fn new() -> Self {
        Self::default()
    }

    /// Builder: add a definition.
    pub fn with(mut self, name: impl Into<String>, definition: D) -> Self {
        self.entries.insert(name.into(), definition);
        self
    }

    #[inline]
    pub fn get(&self, name: &str) -> Option<&D> {
        self.entries.get(name)
    }

    #[inline]
    pub fn contains(&self, name: &str) -> bool {
        self.entries.contains_key(name)
    }

    /// All declared names, sorted for deterministic output.
    pub fn names(&self) -> Vec<&str> {
        let mut names: Vec<_> = self.entries.keys().map(String::as_str).collect();
        names.sort_unstable();
        names
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}

impl<D> FromIterator<(String, D)> for Catalog<D> {
    fn from_iter<I: IntoIterator<Item = (String, D)>>(iter: I) -> Self {
        Self {
            entries: iter.into_iter().collect(),
        }
    }
}

/// Script catalog.
pub type ScriptCatalog = Catalog<ResourceDefinition>;

/// Style catalog.
pub type StyleCatalog = Catalog<StyleDefinition>;

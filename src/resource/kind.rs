//! Asset kind definitions.

use std::fmt;

/// Kind of web resource.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum AssetKind {
    /// JavaScript, emitted as `<script>`.
    Script,
    /// Stylesheet, emitted as `<link>` or `<style>`.
    Style,
}

impl AssetKind {
    /// Extension used when the source file has none.
    pub const fn default_ext(self) -> &'static str {
        match self {
            Self::Script => "js",
            Self::Style => "css",
        }
    }
}

impl fmt::Display for AssetKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            Self::Script => "script",
            Self::Style => "style",
        })
    }
}

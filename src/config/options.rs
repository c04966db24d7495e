//! `[options]` section configuration.
//!
//! Build switches shared by the script and style managers.
//!
//! # Example
//!
//! ```toml
//! [options]
//! production = true
//! use_public = true
//! generate_gzip_file = true
//! script_compress_command = "uglifyjs %s -c -m"
//! output_dir = "www/assets"
//! ```

use std::path::{Path, PathBuf};
use std::time::Duration;

use serde::{Deserialize, Serialize};

use crate::artifact::{BuildOptions, BuiltinMinifier, CommandMinifier, Minifier};
use crate::resource::AssetKind;

/// Pipeline options.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct OptionsConfig {
    /// Host production flag.
    pub production: bool,

    /// Reference public/CDN URLs when a script declares one.
    pub use_public: bool,

    /// Prefer minified variants. Follows `production` when omitted.
    pub use_minified: Option<bool>,

    /// Write `.gz` siblings next to built artifacts.
    pub generate_gzip_file: bool,

    /// Compress command template for scripts, `%s` is the source path.
    pub script_compress_command: Option<String>,

    /// Compress command template for styles.
    pub style_compress_command: Option<String>,

    /// Minify in process when no command is configured.
    pub builtin_minify: bool,

    /// Seconds a compress command may run. `0` waits forever.
    pub compress_timeout: u64,

    /// Root that resource filenames are relative to.
    pub web_root: PathBuf,

    /// Artifact directory. Defaults to `<web_root>/assets`.
    pub output_dir: Option<PathBuf>,

    /// URL path under which `output_dir` is served.
    pub path: String,

    /// Translation table (`key = "text"`).
    pub translations: Option<PathBuf>,
}

impl Default for OptionsConfig {
    fn default() -> Self {
        Self {
            production: false,
            use_public: false,
            use_minified: None,
            generate_gzip_file: false,
            script_compress_command: None,
            style_compress_command: None,
            builtin_minify: false,
            compress_timeout: 30,
            web_root: PathBuf::from("www"),
            output_dir: None,
            path: "assets".into(),
            translations: None,
        }
    }
}

impl OptionsConfig {
    /// Effective `use_minified`.
    pub fn use_minified(&self) -> bool {
        self.use_minified.unwrap_or(self.production)
    }

    /// Effective artifact directory.
    pub fn output_dir(&self) -> PathBuf {
        self.output_dir
            .clone()
            .unwrap_or_else(|| self.web_root.join("assets"))
    }

    pub fn compress_command(&self, kind: AssetKind) -> Option<&str> {
        match kind {
            AssetKind::Script => self.script_compress_command.as_deref(),
            AssetKind::Style => self.style_compress_command.as_deref(),
        }
    }

    pub fn timeout(&self) -> Option<Duration> {
        (self.compress_timeout > 0).then(|| Duration::from_secs(self.compress_timeout))
    }

    /// Build options for one asset kind. Styles never use public URLs.
    pub fn build_options(&self, kind: AssetKind) -> BuildOptions {
        BuildOptions {
            use_public: self.use_public && kind == AssetKind::Script,
            use_minified: self.use_minified(),
            generate_gzip: self.generate_gzip_file,
            web_root: self.web_root.clone(),
            output_dir: self.output_dir(),
            path: self.path.clone(),
        }
    }

    /// Minifier for one asset kind: the compress command if set, else the
    /// builtin one when enabled.
    pub fn minifier(&self, kind: AssetKind) -> Option<Box<dyn Minifier>> {
        match self.compress_command(kind) {
            Some(template) => Some(Box::new(
                CommandMinifier::new(template).with_timeout(self.timeout()),
            )),
            None if self.builtin_minify => Some(Box::new(BuiltinMinifier)),
            None => None,
        }
    }

    /// Resolve relative paths against `root`.
    pub(super) fn normalize(&mut self, root: &Path) {
        use super::util::resolve_path;

        self.web_root = resolve_path(&self.web_root, root);
        self.output_dir = Some(match self.output_dir.take() {
            Some(dir) => resolve_path(&dir, root),
            None => self.web_root.join("assets"),
        });
        if let Some(translations) = self.translations.take() {
            self.translations = Some(resolve_path(&translations, root));
        }
    }
}

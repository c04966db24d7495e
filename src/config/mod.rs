//! Pipeline configuration management for `webres.toml`.
//!
//! # Module Structure
//!
//! ```text
//! config/
//! ├── error      # ConfigError
//! ├── options    # [options]
//! ├── util       # config discovery, path resolution
//! └── mod.rs     # WebresConfig (this file)
//! ```
//!
//! # Sections
//!
//! | Section            | Purpose                                          |
//! |--------------------|--------------------------------------------------|
//! | `[options]`        | Public/minified switches, compress, output paths |
//! | `[scripts.<name>]` | Script catalog                                   |
//! | `[styles.<name>]`  | Style catalog                                    |
//! | `[variables.<h>]`  | Static page variables, provider handle `<h>`     |

mod error;
mod options;
mod util;

pub use error::ConfigError;
pub use options::OptionsConfig;

use util::{find_config_file, resolve_path};

use std::fs;
use std::path::{Path, PathBuf};

use anyhow::{Context, Result, bail};
use rustc_hash::FxHashMap;
use serde::{Deserialize, Serialize};

use crate::log;
use crate::provider::{ProviderRegistry, StaticProvider, Variables};
use crate::resource::{AssetKind, ScriptCatalog, StyleCatalog};
use crate::translate::TableTranslator;
use crate::utils::exec::template_program;

// ============================================================================
// root configuration
// ============================================================================

/// Root configuration structure representing webres.toml
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct WebresConfig {
    /// Absolute path to the config file (internal use only)
    #[serde(skip)]
    pub config_path: PathBuf,

    /// Project root directory - parent of config file (internal use only)
    #[serde(skip)]
    pub root: PathBuf,

    #[serde(default)]
    pub options: OptionsConfig,

    #[serde(default)]
    pub scripts: ScriptCatalog,

    #[serde(default)]
    pub styles: StyleCatalog,

    /// Static variables per provider handle.
    #[serde(default)]
    pub variables: FxHashMap<String, Variables>,
}

impl WebresConfig {
    /// Find, load and validate the configuration named by `config`.
    ///
    /// Searches upward from cwd for relative names.
    pub fn load(config: &Path, production: Option<bool>) -> Result<Self> {
        let Some(path) = find_config_file(config) else {
            bail!("config file '{}' not found", config.display());
        };

        let mut loaded = Self::from_path(&path)?;
        loaded.finalize(&path);
        Self::update_option(&mut loaded.options.production, production.as_ref());
        loaded
            .validate()
            .with_context(|| format!("invalid configuration in {}", path.display()))?;
        Ok(loaded)
    }

    /// Parse configuration from a TOML string, warning about unknown fields.
    pub fn parse(content: &str) -> Result<Self, ConfigError> {
        let (config, ignored) = Self::parse_with_ignored(content)?;
        if !ignored.is_empty() {
            Self::print_unknown_fields_warning(&ignored);
        }
        Ok(config)
    }

    /// Load configuration from file path with unknown field detection.
    pub fn from_path(path: &Path) -> Result<Self, ConfigError> {
        let content =
            fs::read_to_string(path).map_err(|err| ConfigError::Io(path.to_path_buf(), err))?;
        Self::parse(&content)
    }

    /// Parse TOML content, collecting any unknown fields.
    fn parse_with_ignored(content: &str) -> Result<(Self, Vec<String>), ConfigError> {
        let mut ignored = Vec::new();
        let deserializer = toml::Deserializer::new(content);
        let config = serde_ignored::deserialize(deserializer, |path: serde_ignored::Path| {
            ignored.push(path.to_string());
        })?;
        Ok((config, ignored))
    }

    /// Print warning about unknown fields.
    fn print_unknown_fields_warning(fields: &[String]) {
        log!("warning"; "unknown fields in webres.toml, ignoring:");
        for field in fields {
            eprintln!("- {}", field);
        }
    }

    /// Set paths from the config file location and resolve relative paths.
    pub fn finalize(&mut self, config_path: &Path) {
        let root = config_path
            .parent()
            .map(Path::to_path_buf)
            .unwrap_or_default();
        self.config_path = config_path.to_path_buf();
        self.options.normalize(&root);
        self.root = root;
    }

    /// Update config option if CLI value is provided.
    fn update_option<T: Clone>(config_option: &mut T, cli_option: Option<&T>) {
        if let Some(option) = cli_option {
            *config_option = option.clone();
        }
    }

    /// Join a path with the root directory.
    pub fn root_join(&self, path: impl AsRef<Path>) -> PathBuf {
        resolve_path(path.as_ref(), &self.root)
    }

    // ========================================================================
    // collaborators
    // ========================================================================

    /// Registry with a [`StaticProvider`] per `[variables.<handle>]` table.
    pub fn providers(&self) -> ProviderRegistry {
        let mut registry = ProviderRegistry::new();
        for (handle, variables) in &self.variables {
            registry.register(handle.clone(), StaticProvider::new(variables.clone()));
        }
        registry
    }

    /// Translation table, if one is configured.
    pub fn translator(&self) -> Result<Option<TableTranslator>, ConfigError> {
        self.options
            .translations
            .as_deref()
            .map(TableTranslator::load)
            .transpose()
    }

    // ========================================================================
    // validation
    // ========================================================================

    /// Check the output directory and compress command programs.
    pub fn validate(&self) -> Result<(), ConfigError> {
        validate_output_dir(&self.options.output_dir())?;

        for kind in [AssetKind::Script, AssetKind::Style] {
            let Some(template) = self.options.compress_command(kind) else {
                continue;
            };
            let Some(program) = template_program(template) else {
                return Err(ConfigError::Validation(format!(
                    "[options.{kind}_compress_command] is empty"
                )));
            };
            if which::which(program).is_err() {
                return Err(ConfigError::Validation(format!(
                    "[options.{kind}_compress_command] `{program}` not found in PATH"
                )));
            }
        }

        if let Some(path) = &self.options.translations
            && !path.is_file()
        {
            return Err(ConfigError::Validation(format!(
                "[options.translations] `{}` not found",
                path.display()
            )));
        }

        Ok(())
    }
}

/// The output directory must exist, be a directory and accept new files.
pub fn validate_output_dir(dir: &Path) -> Result<(), ConfigError> {
    let fail = |reason: String| ConfigError::OutputDir {
        path: dir.to_path_buf(),
        reason,
    };

    match fs::metadata(dir) {
        Err(_) => return Err(fail("does not exist".into())),
        Ok(meta) if !meta.is_dir() => return Err(fail("is not a directory".into())),
        Ok(_) => {}
    }

    tempfile::NamedTempFile::new_in(dir)
        .map(drop)
        .map_err(|e| fail(format!("is not writable: {e}")))
}

// ============================================================================
// tests
// ============================================================================

//! Artifact generation: source selection, content-addressed build cache,
//! minification and precompressed siblings.
//!
//! # Source selection (first match wins)
//!
//! 1. `use_public` and a public URL → reference the URL, nothing is built.
//! 2. A minified variant, when `use_minified` is on or there is no raw
//!    source → copied as is.
//! 3. The raw source → minified when `use_minified` is on and a minifier is
//!    configured, copied otherwise.
//! 4. Nothing usable → [`Error::MissingSource`].
//!
//! # Cache
//!
//! ```text
//! <output_dir>/<md5 of source bytes>[.min].<ext>
//! <output_dir>/<md5 of source bytes>[.min].<ext>.gz   (generate_gzip)
//! ```
//!
//! An existing output file is a cache hit and is trusted without
//! re-verification. Nothing is ever invalidated.

mod hash;
pub mod minify;
mod write;

pub use hash::ContentHash;
pub use minify::{BuiltinMinifier, CommandMinifier, Minifier};
pub use write::gzip_path;

use std::cell::Cell;
use std::fs;
use std::path::{Path, PathBuf};

use crate::error::{Error, Result};
use crate::resource::{AssetKind, Sourced};
use crate::{debug, log};

// ============================================================================
// Options
// ============================================================================

/// Build switches shared by every artifact of one kind.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct BuildOptions {
    /// Prefer public/CDN URLs when a resource declares one.
    pub use_public: bool,
    /// Prefer minified variants and minify raw sources.
    pub use_minified: bool,
    /// Write a `.gz` sibling next to every newly built artifact.
    pub generate_gzip: bool,
    /// Directory resource filenames are relative to.
    pub web_root: PathBuf,
    /// Directory artifacts are written to.
    pub output_dir: PathBuf,
    /// URL path segment under which `output_dir` is served.
    pub path: String,
}

impl Default for BuildOptions {
    fn default() -> Self {
        Self {
            use_public: false,
            use_minified: false,
            generate_gzip: false,
            web_root: PathBuf::from("www"),
            output_dir: PathBuf::from("www/assets"),
            path: "assets".into(),
        }
    }
}

// ============================================================================
// Results
// ============================================================================

/// How a resource is referenced from markup.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ArtifactRef {
    /// Reference by URL.
    Url(String),
    /// Embed the source content.
    Inline(String),
}

/// Counters for one builder's lifetime.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct BuildStats {
    /// Artifacts written.
    pub built: usize,
    /// Artifacts found already present.
    pub cache_hits: usize,
    /// Resources served from a public URL.
    pub public: usize,
}

/// The chosen source variant of a resource.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Selected<'a> {
    Public(&'a str),
    Local { path: PathBuf, minified: bool },
}

/// A locally built (or cached) artifact.
#[derive(Debug, Clone)]
struct Built {
    file_name: String,
    /// Bytes of the selected source file.
    source: Vec<u8>,
}

// ============================================================================
// Builder
// ============================================================================

/// Builds artifacts of one [`AssetKind`].
pub struct ArtifactBuilder {
    kind: AssetKind,
    options: BuildOptions,
    minifier: Option<Box<dyn Minifier>>,
    stats: Cell<BuildStats>,
}

impl ArtifactBuilder {
    pub fn new(kind: AssetKind, options: BuildOptions) -> Self {
        Self {
            kind,
            options,
            minifier: None,
            stats: Cell::new(BuildStats::default()),
        }
    }

    /// Builder: set the minification strategy.
    pub fn with_minifier(mut self, minifier: Option<Box<dyn Minifier>>) -> Self {
        self.minifier = minifier;
        self
    }

    pub fn options(&self) -> &BuildOptions {
        &self.options
    }

    pub fn kind(&self) -> AssetKind {
        self.kind
    }

    pub fn stats(&self) -> BuildStats {
        self.stats.get()
    }

    /// Whether raw sources get minified: `use_minified` with a minifier.
    #[inline]
    fn compresses(&self) -> bool {
        self.options.use_minified && self.minifier.is_some()
    }

    /// Pick the source variant of `resource` under the current options.
    pub fn select<'a, R: Sourced>(&self, name: &str, resource: &'a R) -> Result<Selected<'a>> {
        let opts = &self.options;

        if opts.use_public
            && !resource.is_inline()
            && let Some(url) = resource.public()
        {
            return Ok(Selected::Public(url));
        }

        if let Some(minified) = resource.minified()
            && (opts.use_minified || resource.filename().is_none())
        {
            return Ok(Selected::Local {
                path: opts.web_root.join(minified),
                minified: true,
            });
        }

        if let Some(filename) = resource.filename() {
            return Ok(Selected::Local {
                path: opts.web_root.join(filename),
                minified: false,
            });
        }

        Err(Error::MissingSource {
            name: name.to_owned(),
        })
    }

    /// Build (or fetch from cache) the artifact of `resource` and return its
    /// markup reference. URLs are rooted at `base_path`.
    pub fn build<R: Sourced>(&self, name: &str, resource: &R, base_path: &str) -> Result<ArtifactRef> {
        match self.select(name, resource)? {
            Selected::Public(url) => {
                self.bump(|s| s.public += 1);
                debug!("artifact"; "{} → {}", name, url);
                Ok(ArtifactRef::Url(public_url(base_path, url)))
            }
            Selected::Local { path, minified } => {
                let built = self.build_local(name, &path, minified)?;
                if resource.is_inline() {
                    Ok(ArtifactRef::Inline(
                        String::from_utf8_lossy(&built.source).into_owned(),
                    ))
                } else {
                    Ok(ArtifactRef::Url(asset_url(
                        base_path,
                        &self.options.path,
                        &built.file_name,
                    )))
                }
            }
        }
    }

    /// Output file name for a source with the given hash.
    pub fn output_name(&self, hash: ContentHash, source: &Path, minified: bool) -> String {
        let ext = source
            .extension()
            .and_then(|e| e.to_str())
            .unwrap_or(self.kind.default_ext());
        if minified || self.compresses() {
            format!("{hash}.min.{ext}")
        } else {
            format!("{hash}.{ext}")
        }
    }

    fn build_local(&self, name: &str, source: &Path, minified: bool) -> Result<Built> {
        let bytes = fs::read(source).map_err(|e| Error::io(source, e))?;
        let file_name = self.output_name(ContentHash::of(&bytes), source, minified);
        let output = self.options.output_dir.join(&file_name);

        if output.exists() {
            self.bump(|s| s.cache_hits += 1);
            debug!("artifact"; "{} → {} (cached)", name, file_name);
            return Ok(Built {
                file_name,
                source: bytes,
            });
        }

        let content = match &self.minifier {
            Some(minifier) if !minified && self.options.use_minified => minifier
                .minify(source, &bytes)
                .map_err(|e| Error::Compress {
                    name: name.to_owned(),
                    message: format!("{e:#}"),
                })?,
            _ => bytes.clone(),
        };

        write::write_atomic(&output, &content)?;
        if self.options.generate_gzip {
            write::write_gzip_sibling(&output, &content)?;
        }

        self.bump(|s| s.built += 1);
        log!("artifact"; "{} → {}", name, file_name);
        Ok(Built {
            file_name,
            source: bytes,
        })
    }

    fn bump(&self, f: impl FnOnce(&mut BuildStats)) {
        let mut stats = self.stats.get();
        f(&mut stats);
        self.stats.set(stats);
    }
}

// ============================================================================
// URLs
// ============================================================================

/// Whether `s` is an absolute URL (has a scheme) or scheme-relative (`//host`).
pub fn is_absolute_url(s: &str) -> bool {
    s.starts_with("//") || url::Url::parse(s).is_ok()
}

/// URL of a built artifact: `base_path/path/file_name`.
pub fn asset_url(base_path: &str, path: &str, file_name: &str) -> String {
    let base = base_path.trim_end_matches('/');
    let path = path.trim_matches('/');
    if path.is_empty() {
        format!("{base}/{file_name}")
    } else {
        format!("{base}/{path}/{file_name}")
    }
}

/// Public URLs pass through when absolute, otherwise they hang off `base_path`.
pub fn public_url(base_path: &str, url: &str) -> String {
    if is_absolute_url(url) {
        url.to_owned()
    } else {
        format!(
            "{}/{}",
            base_path.trim_end_matches('/'),
            url.trim_start_matches('/')
        )
    }
}

//! Script and style managers: the entry points a page renderer calls.
//!
//! A manager owns its catalog and artifact builder for the lifetime of the
//! process; every call to `emit` resolves and renders one request.

use rustc_hash::FxHashSet;

use crate::artifact::{ArtifactBuilder, ArtifactRef, BuildOptions, BuildStats, Minifier};
use crate::config::{ConfigError, WebresConfig};
use crate::emit::{Emission, EmissionEngine, RequestContext};
use crate::error::{Error, Result};
use crate::markup::{Element, Fragment};
use crate::provider::ProviderRegistry;
use crate::resolve::DependencyResolver;
use crate::resource::{AssetKind, ScriptCatalog, StyleCatalog};
use crate::translate::Translator;

// ============================================================================
// Scripts
// ============================================================================

pub struct ScriptManager {
    catalog: ScriptCatalog,
    builder: ArtifactBuilder,
    providers: ProviderRegistry,
    translator: Option<Box<dyn Translator>>,
}

impl ScriptManager {
    pub fn new(catalog: ScriptCatalog, options: BuildOptions) -> Self {
        Self {
            catalog,
            builder: ArtifactBuilder::new(AssetKind::Script, options),
            providers: ProviderRegistry::new(),
            translator: None,
        }
    }

    /// Manager wired from a loaded configuration.
    pub fn from_config(config: &WebresConfig) -> Result<Self, ConfigError> {
        let translator = config
            .translator()?
            .map(|t| Box::new(t) as Box<dyn Translator>);
        Ok(
            Self::new(config.scripts.clone(), config.options.build_options(AssetKind::Script))
                .with_minifier(config.options.minifier(AssetKind::Script))
                .with_providers(config.providers())
                .with_translator(translator),
        )
    }

    pub fn with_minifier(mut self, minifier: Option<Box<dyn Minifier>>) -> Self {
        self.builder = self.builder.with_minifier(minifier);
        self
    }

    pub fn with_providers(mut self, providers: ProviderRegistry) -> Self {
        self.providers = providers;
        self
    }

    pub fn with_translator(mut self, translator: Option<Box<dyn Translator>>) -> Self {
        self.translator = translator;
        self
    }

    pub fn catalog(&self) -> &ScriptCatalog {
        &self.catalog
    }

    pub fn builder(&self) -> &ArtifactBuilder {
        &self.builder
    }

    pub fn stats(&self) -> BuildStats {
        self.builder.stats()
    }

    /// Markup for `names` and their dependencies.
    pub fn emit<S: AsRef<str>>(&self, names: &[S], ctx: &RequestContext) -> Result<Emission> {
        let mut resolution = DependencyResolver::new(&self.catalog).resolve(names)?;
        EmissionEngine::new(&self.builder, &self.providers)
            .with_translator(self.translator.as_deref())
            .emit(&mut resolution, ctx)
    }

    /// Emission order of `names` without building anything.
    pub fn order<S: AsRef<str>>(&self, names: &[S]) -> Result<Vec<String>> {
        let mut resolution = DependencyResolver::new(&self.catalog).resolve(names)?;
        resolution.drain(|_| Ok::<_, Error>(()))
    }
}

// ============================================================================
// Styles
// ============================================================================

pub struct StyleManager {
    catalog: StyleCatalog,
    builder: ArtifactBuilder,
}

impl StyleManager {
    /// `use_public` is ignored: styles have no public variant.
    pub fn new(catalog: StyleCatalog, options: BuildOptions) -> Self {
        let options = BuildOptions {
            use_public: false,
            ..options
        };
        Self {
            catalog,
            builder: ArtifactBuilder::new(AssetKind::Style, options),
        }
    }

    pub fn from_config(config: &WebresConfig) -> Self {
        Self::new(config.styles.clone(), config.options.build_options(AssetKind::Style))
            .with_minifier(config.options.minifier(AssetKind::Style))
    }

    pub fn with_minifier(mut self, minifier: Option<Box<dyn Minifier>>) -> Self {
        self.builder = self.builder.with_minifier(minifier);
        self
    }

    pub fn catalog(&self) -> &StyleCatalog {
        &self.catalog
    }

    pub fn builder(&self) -> &ArtifactBuilder {
        &self.builder
    }

    pub fn stats(&self) -> BuildStats {
        self.builder.stats()
    }

    /// Markup for `names` in the requested order, each style once.
    pub fn emit<S: AsRef<str>>(&self, names: &[S], ctx: &RequestContext) -> Result<Fragment> {
        // Check all names first so a bad request builds nothing
        let mut definitions = Vec::with_capacity(names.len());
        let mut seen = FxHashSet::default();
        for name in names.iter().map(|n| n.as_ref()) {
            let definition = self
                .catalog
                .get(name)
                .ok_or_else(|| Error::UndefinedResource {
                    name: name.to_owned(),
                    required_by: None,
                })?;
            if seen.insert(name) {
                definitions.push((name, definition));
            }
        }

        let mut fragment = Fragment::new();
        for (name, definition) in definitions {
            let element = match self.builder.build(name, definition, &ctx.base_path)? {
                ArtifactRef::Url(url) => Element::new("link")
                    .attr("rel", "stylesheet")
                    .attr("type", "text/css")
                    .attr("href", url),
                ArtifactRef::Inline(content) => {
                    Element::new("style").attr("type", "text/css").text(content)
                }
            };
            let element = match &definition.media {
                Some(media) => element.attr("media", media.clone()),
                None => element,
            };
            fragment.push(element);
            fragment.push_text("\n");
        }
        Ok(fragment)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::artifact::ContentHash;
    use crate::resource::{ResourceDefinition, StyleDefinition};
    use std::fs;
    use std::path::Path;
    use tempfile::TempDir;

    fn site() -> TempDir {
        let dir = TempDir::new().unwrap();
        for sub in ["js", "css", "assets"] {
            fs::create_dir_all(dir.path().join(sub)).unwrap();
        }
        dir
    }

    fn options(root: &Path) -> BuildOptions {
        BuildOptions {
            web_root: root.to_path_buf(),
            output_dir: root.join("assets"),
            path: "static".into(),
            ..BuildOptions::default()
        }
    }

    #[test]
    fn test_script_manager_emit_with_base_path() {
        let dir = site();
        fs::write(dir.path().join("js/a.js"), "a").unwrap();
        fs::write(dir.path().join("js/b.js"), "b").unwrap();
        let catalog = ScriptCatalog::new()
            .with("a", ResourceDefinition::with_filename("js/a.js"))
            .with("b", ResourceDefinition::with_filename("js/b.js").depends_on("a"));
        let manager = ScriptManager::new(catalog, options(dir.path()));

        let emission = manager.emit(&["b"], &RequestContext::new("/app")).unwrap();

        let html = emission.fragment.to_string();
        let a = format!("src=\"/app/static/{}.js\"", ContentHash::of(b"a"));
        let b = format!("src=\"/app/static/{}.js\"", ContentHash::of(b"b"));
        assert!(html.find(&a).unwrap() < html.find(&b).unwrap());
        assert_eq!(manager.stats().built, 2);
    }

    #[test]
    fn test_script_order_builds_nothing() {
        let dir = site();
        let catalog = ScriptCatalog::new()
            .with("a", ResourceDefinition::with_filename("js/missing.js"))
            .with("b", ResourceDefinition::default().depends_on("a"));
        let manager = ScriptManager::new(catalog, options(dir.path()));

        assert_eq!(manager.order(&["b"]).unwrap(), ["a", "b"]);
        assert_eq!(manager.stats(), BuildStats::default());
    }

    #[test]
    fn test_style_manager_requested_order_and_dedup() {
        let dir = site();
        fs::write(dir.path().join("css/a.css"), "a{}").unwrap();
        fs::write(dir.path().join("css/b.css"), "b{}").unwrap();
        let catalog = StyleCatalog::new()
            .with(
                "a",
                StyleDefinition {
                    filename: Some("css/a.css".into()),
                    media: Some("print".into()),
                    ..StyleDefinition::default()
                },
            )
            .with(
                "b",
                StyleDefinition {
                    filename: Some("css/b.css".into()),
                    ..StyleDefinition::default()
                },
            );
        let manager = StyleManager::new(catalog, options(dir.path()));

        let fragment = manager
            .emit(&["b", "a", "b"], &RequestContext::default())
            .unwrap();

        let links: Vec<_> = fragment.elements().collect();
        assert_eq!(links.len(), 2);
        assert_eq!(
            links[0].to_string(),
            format!(
                "<link rel=\"stylesheet\" type=\"text/css\" href=\"/static/{}.css\">",
                ContentHash::of(b"b{}")
            )
        );
        assert_eq!(links[1].get("media"), Some("print"));
        assert_eq!(fragment.len(), 4);
    }

    #[test]
    fn test_style_inline() {
        let dir = site();
        fs::write(dir.path().join("css/crit.css"), "body{margin:0}").unwrap();
        let catalog = StyleCatalog::new().with(
            "crit",
            StyleDefinition {
                filename: Some("css/crit.css".into()),
                include: true,
                ..StyleDefinition::default()
            },
        );
        let manager = StyleManager::new(catalog, options(dir.path()));

        let fragment = manager.emit(&["crit"], &RequestContext::default()).unwrap();

        assert_eq!(
            fragment.elements().next().unwrap().to_string(),
            "<style type=\"text/css\">body{margin:0}</style>"
        );
    }

    #[test]
    fn test_style_undefined_builds_nothing() {
        let dir = site();
        fs::write(dir.path().join("css/a.css"), "a{}").unwrap();
        let catalog = StyleCatalog::new().with(
            "a",
            StyleDefinition {
                filename: Some("css/a.css".into()),
                ..StyleDefinition::default()
            },
        );
        let manager = StyleManager::new(catalog, options(dir.path()));

        let err = manager
            .emit(&["a", "nope"], &RequestContext::default())
            .unwrap_err();

        assert!(matches!(err, Error::UndefinedResource { ref name, .. } if name == "nope"));
        assert_eq!(manager.stats().built, 0);
    }
}

//! Emission: drain the resolver's ready queue and assemble markup.
//!
//! The queue is drained in rounds. Each round takes a snapshot of the queue
//! and, for every node in it:
//!
//! 1. builds (or fetches) its artifact and appends its markup,
//! 2. marks it printed,
//! 3. queues for the *next* round each dependent whose dependencies are now
//!    all printed.
//!
//! When the queue runs dry the collected translation keys, if any, become a
//! single table script placed before everything else.

mod translations;

pub use translations::{TRANSLATIONS_INIT, TranslationTable};

use serde_json::Value;

use crate::artifact::{ArtifactBuilder, ArtifactRef};
use crate::error::Result;
use crate::markup::{Element, Fragment};
use crate::provider::{ProviderRegistry, Variables};
use crate::resolve::{Resolution, ResolvedNode};
use crate::translate::Translator;

// ============================================================================
// Request context
// ============================================================================

/// Per-request state handed to every operation of one emission.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct RequestContext {
    /// Identifier of the page being rendered, passed on to config providers.
    pub page: Option<String>,
    /// URL prefix of the site (`""` when served from the root).
    pub base_path: String,
    /// Host production flag.
    pub production: bool,
}

impl RequestContext {
    pub fn new(base_path: impl Into<String>) -> Self {
        Self {
            base_path: base_path.into(),
            ..Self::default()
        }
    }

    /// Builder: set the page identifier.
    pub fn page(mut self, page: impl Into<String>) -> Self {
        self.page = Some(page.into());
        self
    }
}

// ============================================================================
// Engine
// ============================================================================

/// Markup plus the names in the order they were emitted.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Emission {
    pub fragment: Fragment,
    pub order: Vec<String>,
}

pub struct EmissionEngine<'a> {
    builder: &'a ArtifactBuilder,
    providers: &'a ProviderRegistry,
    translator: Option<&'a dyn Translator>,
}

impl<'a> EmissionEngine<'a> {
    pub fn new(builder: &'a ArtifactBuilder, providers: &'a ProviderRegistry) -> Self {
        Self {
            builder,
            providers,
            translator: None,
        }
    }

    /// Builder: translate table entries. Without one, keys pass through.
    pub fn with_translator(mut self, translator: Option<&'a dyn Translator>) -> Self {
        self.translator = translator;
        self
    }

    /// Emit every node of `resolution`, dependencies first.
    ///
    /// On error nothing is returned; the fragment only exists on success.
    pub fn emit(&self, resolution: &mut Resolution<'_>, ctx: &RequestContext) -> Result<Emission> {
        let mut fragment = Fragment::new();
        let mut translations = TranslationTable::new();

        let order = resolution.drain(|node| -> Result<()> {
            translations.extend(&node.definition.translations);
            self.emit_node(node, ctx, &mut fragment)?;
            fragment.push_text("\n");
            Ok(())
        })?;

        if !translations.is_empty() {
            fragment.prepend(translations.to_script(self.translator)?);
        }

        Ok(Emission { fragment, order })
    }

    /// Main element, then the config script when the resource has one.
    fn emit_node(
        &self,
        node: &ResolvedNode<'_>,
        ctx: &RequestContext,
        fragment: &mut Fragment,
    ) -> Result<()> {
        let element = match self.builder.build(&node.name, node.definition, &ctx.base_path)? {
            ArtifactRef::Url(url) => Element::script().attr("src", url),
            ArtifactRef::Inline(content) => Element::script().text(content),
        };
        fragment.push(element);

        if let Some(handle) = &node.definition.config {
            let variables = self.providers.variables(handle, &node.name, ctx)?;
            fragment.push_text("\n");
            fragment.push(config_script(&variables)?);
        }
        Ok(())
    }
}

// ============================================================================
// Config script
// ============================================================================

/// `var name = <json>;` or, for dotted paths, `name = <json>;`.
pub fn variable_line(name: &str, value: &Value) -> Result<String> {
    let keyword = if name.contains('.') { "" } else { "var " };
    Ok(format!("{keyword}{name} = {};\n", serde_json::to_string(value)?))
}

/// Script assigning every provided variable.
pub fn config_script(variables: &Variables) -> Result<Element> {
    let lines = variables
        .iter()
        .map(|(name, value)| variable_line(name, value))
        .collect::<Result<Vec<_>>>()?;
    Ok(Element::script().text(format!("\n{}", lines.join("\n"))))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::artifact::{BuildOptions, ContentHash};
    use crate::error::Error;
    use crate::markup::Node;
    use crate::provider::StaticProvider;
    use crate::resolve::DependencyResolver;
    use crate::resource::{AssetKind, ResourceDefinition, ScriptCatalog};
    use crate::translate::TableTranslator;
    use serde_json::json;
    use std::fs;
    use std::path::Path;
    use tempfile::TempDir;

    struct Site {
        dir: TempDir,
    }

    impl Site {
        fn new(files: &[(&str, &str)]) -> Self {
            let dir = TempDir::new().unwrap();
            fs::create_dir_all(dir.path().join("assets")).unwrap();
            for (name, content) in files {
                let path = dir.path().join(name);
                fs::create_dir_all(path.parent().unwrap()).unwrap();
                fs::write(path, content).unwrap();
            }
            Self { dir }
        }

        fn builder(&self) -> ArtifactBuilder {
            self.builder_with(|_| {})
        }

        fn builder_with(&self, f: impl FnOnce(&mut BuildOptions)) -> ArtifactBuilder {
            let mut options = BuildOptions {
                web_root: self.dir.path().to_path_buf(),
                output_dir: self.dir.path().join("assets"),
                ..BuildOptions::default()
            };
            f(&mut options);
            ArtifactBuilder::new(AssetKind::Script, options)
        }

        fn root(&self) -> &Path {
            self.dir.path()
        }
    }

    fn run(
        catalog: &ScriptCatalog,
        requested: &[&str],
        builder: &ArtifactBuilder,
        providers: &ProviderRegistry,
        translator: Option<&dyn Translator>,
    ) -> Result<Emission> {
        let mut resolution = DependencyResolver::new(catalog).resolve(requested)?;
        EmissionEngine::new(builder, providers)
            .with_translator(translator)
            .emit(&mut resolution, &RequestContext::default())
    }

    fn srcs(fragment: &Fragment) -> Vec<String> {
        fragment
            .elements()
            .filter_map(|el| el.get("src").map(str::to_owned))
            .collect()
    }

    fn position(order: &[String], name: &str) -> usize {
        order.iter().position(|n| n == name).unwrap()
    }

    #[test]
    fn test_dependency_before_dependent() {
        let site = Site::new(&[("a.js", "var a;"), ("b.js", "var b;")]);
        let catalog = ScriptCatalog::new()
            .with("A", ResourceDefinition::with_filename("a.js"))
            .with("B", ResourceDefinition::with_filename("b.js").depends_on("A"));

        let emission = run(&catalog, &["B"], &site.builder(), &ProviderRegistry::new(), None).unwrap();

        assert_eq!(emission.order, vec!["A", "B"]);
        let srcs = srcs(&emission.fragment);
        assert_eq!(
            srcs,
            vec![
                format!("/assets/{}.js", ContentHash::of(b"var a;")),
                format!("/assets/{}.js", ContentHash::of(b"var b;")),
            ]
        );
        // Each script is followed by a newline text node, no translation block
        assert_eq!(emission.fragment.len(), 4);
        assert!(matches!(&emission.fragment.nodes()[1], Node::Text(t) if t == "\n"));
    }

    #[test]
    fn test_topological_order_on_larger_graph() {
        let files: Vec<(String, String)> = ["a", "b", "c", "d", "e", "f"]
            .iter()
            .map(|n| (format!("{n}.js"), format!("var {n};")))
            .collect();
        let refs: Vec<(&str, &str)> = files.iter().map(|(a, b)| (a.as_str(), b.as_str())).collect();
        let site = Site::new(&refs);
        let catalog = ScriptCatalog::new()
            .with("a", ResourceDefinition::with_filename("a.js"))
            .with("b", ResourceDefinition::with_filename("b.js").depends_on("a"))
            .with("c", ResourceDefinition::with_filename("c.js").depends_on("a"))
            .with("d", ResourceDefinition::with_filename("d.js").depends_on("b").depends_on("c"))
            .with("e", ResourceDefinition::with_filename("e.js"))
            .with("f", ResourceDefinition::with_filename("f.js").depends_on("d").depends_on("e"));

        let emission = run(&catalog, &["f", "b"], &site.builder(), &ProviderRegistry::new(), None).unwrap();

        assert_eq!(emission.order.len(), 6);
        for (name, deps) in [
            ("b", &["a"][..]),
            ("c", &["a"][..]),
            ("d", &["b", "c"][..]),
            ("f", &["d", "e"][..]),
        ] {
            for dep in deps {
                assert!(position(&emission.order, dep) < position(&emission.order, name));
            }
        }
    }

    #[test]
    fn test_shared_dependency_emitted_once() {
        let site = Site::new(&[("lib.js", "lib"), ("x.js", "x"), ("y.js", "y")]);
        let catalog = ScriptCatalog::new()
            .with("lib", ResourceDefinition::with_filename("lib.js"))
            .with("x", ResourceDefinition::with_filename("x.js").depends_on("lib"))
            .with("y", ResourceDefinition::with_filename("y.js").depends_on("lib"));

        let emission = run(&catalog, &["x", "y"], &site.builder(), &ProviderRegistry::new(), None).unwrap();

        assert_eq!(emission.order, vec!["lib", "x", "y"]);
    }

    #[test]
    fn test_undefined_resource_emits_nothing() {
        let site = Site::new(&[("a.js", "a")]);
        let catalog = ScriptCatalog::new().with("a", ResourceDefinition::with_filename("a.js"));
        let builder = site.builder();

        let err = run(&catalog, &["a", "missing"], &builder, &ProviderRegistry::new(), None).unwrap_err();

        assert!(matches!(err, Error::UndefinedResource { ref name, .. } if name == "missing"));
        assert_eq!(builder.stats().built, 0);
    }

    #[test]
    fn test_missing_source_aborts_emission() {
        let site = Site::new(&[("a.js", "a")]);
        let catalog = ScriptCatalog::new()
            .with("a", ResourceDefinition::with_filename("a.js"))
            .with("b", ResourceDefinition::default().depends_on("a"));

        let err = run(&catalog, &["b"], &site.builder(), &ProviderRegistry::new(), None).unwrap_err();
        assert!(matches!(err, Error::MissingSource { ref name } if name == "b"));
    }

    #[test]
    fn test_translation_passthrough_without_translator() {
        let site = Site::new(&[("a.js", "a")]);
        let catalog = ScriptCatalog::new().with(
            "a",
            ResourceDefinition {
                translations: vec!["Hello".into()],
                ..ResourceDefinition::with_filename("a.js")
            },
        );

        let emission = run(&catalog, &["a"], &site.builder(), &ProviderRegistry::new(), None).unwrap();

        let first = emission.fragment.elements().next().unwrap();
        let text = first.text.as_deref().unwrap();
        assert!(text.starts_with(&format!("\n{TRANSLATIONS_INIT}")));
        assert!(text.contains("translations[\"Hello\"] = \"Hello\";"));
    }

    #[test]
    fn test_translation_keys_deduplicated_and_translated() {
        let site = Site::new(&[("a.js", "a"), ("b.js", "b")]);
        let catalog = ScriptCatalog::new()
            .with(
                "a",
                ResourceDefinition {
                    translations: vec!["Hello".into(), "Bye".into()],
                    ..ResourceDefinition::with_filename("a.js")
                },
            )
            .with(
                "b",
                ResourceDefinition {
                    translations: vec!["Hello".into()],
                    ..ResourceDefinition::with_filename("b.js").depends_on("a")
                },
            );
        let translator = TableTranslator::parse("Hello = \"Ahoj\"").unwrap();

        let emission = run(
            &catalog,
            &["b"],
            &site.builder(),
            &ProviderRegistry::new(),
            Some(&translator),
        )
        .unwrap();

        let table = emission.fragment.elements().next().unwrap().text.clone().unwrap();
        assert_eq!(table.matches("translations[\"Hello\"]").count(), 1);
        assert!(table.contains("translations[\"Hello\"] = \"Ahoj\";"));
        assert!(table.contains("translations[\"Bye\"] = \"Bye\";"));
        // Table + two scripts
        assert_eq!(emission.fragment.elements().count(), 3);
    }

    #[test]
    fn test_config_script_follows_resource() {
        let site = Site::new(&[("app.js", "app")]);
        let catalog = ScriptCatalog::new().with(
            "app",
            ResourceDefinition {
                config: Some("app".into()),
                ..ResourceDefinition::with_filename("app.js")
            },
        );
        let variables = match json!({"apiUrl": "/api", "App.debug": false}) {
            Value::Object(map) => map,
            _ => unreachable!(),
        };
        let providers = ProviderRegistry::new().with("app", StaticProvider::new(variables));

        let emission = run(&catalog, &["app"], &site.builder(), &providers, None).unwrap();

        let nodes = emission.fragment.nodes();
        assert_eq!(nodes.len(), 4);
        assert!(matches!(&nodes[1], Node::Text(t) if t == "\n"));
        let Node::Element(config) = &nodes[2] else {
            panic!("expected config script");
        };
        assert_eq!(
            config.text.as_deref(),
            Some("\nvar apiUrl = \"/api\";\n\nApp.debug = false;\n")
        );
    }

    #[test]
    fn test_unknown_provider_fails() {
        let site = Site::new(&[("app.js", "app")]);
        let catalog = ScriptCatalog::new().with(
            "app",
            ResourceDefinition {
                config: Some("nope".into()),
                ..ResourceDefinition::with_filename("app.js")
            },
        );

        let err = run(&catalog, &["app"], &site.builder(), &ProviderRegistry::new(), None).unwrap_err();
        assert!(matches!(err, Error::UnknownProvider { .. }));
    }

    #[test]
    fn test_public_url_verbatim() {
        let site = Site::new(&[]);
        let catalog = ScriptCatalog::new().with(
            "a",
            ResourceDefinition {
                public: Some("https://cdn.example/a.js".into()),
                ..ResourceDefinition::default()
            },
        );
        let builder = site.builder_with(|o| o.use_public = true);

        let emission = run(&catalog, &["a"], &builder, &ProviderRegistry::new(), None).unwrap();

        assert_eq!(srcs(&emission.fragment), vec!["https://cdn.example/a.js"]);
        assert_eq!(fs::read_dir(site.root().join("assets")).unwrap().count(), 0);
    }

    #[test]
    fn test_rerun_is_idempotent() {
        let site = Site::new(&[("a.js", "a"), ("b.js", "b")]);
        let catalog = ScriptCatalog::new()
            .with("A", ResourceDefinition::with_filename("a.js"))
            .with("B", ResourceDefinition::with_filename("b.js").depends_on("A"));

        let first_builder = site.builder();
        let first = run(&catalog, &["B"], &first_builder, &ProviderRegistry::new(), None).unwrap();
        let second_builder = site.builder();
        let second = run(&catalog, &["B"], &second_builder, &ProviderRegistry::new(), None).unwrap();

        assert_eq!(first, second);
        assert_eq!(first_builder.stats().built, 2);
        assert_eq!(second_builder.stats().built, 0);
        assert_eq!(second_builder.stats().cache_hits, 2);
    }

    #[test]
    fn test_inline_script_embeds_source() {
        let site = Site::new(&[("a.js", "init();")]);
        let catalog = ScriptCatalog::new().with(
            "a",
            ResourceDefinition {
                include: true,
                ..ResourceDefinition::with_filename("a.js")
            },
        );

        let emission = run(&catalog, &["a"], &site.builder(), &ProviderRegistry::new(), None).unwrap();

        let script = emission.fragment.elements().next().unwrap();
        assert_eq!(script.text.as_deref(), Some("init();"));
        assert_eq!(script.get("src"), None);
    }

    #[test]
    fn test_variable_line() {
        assert_eq!(variable_line("a", &json!([1, 2])).unwrap(), "var a = [1,2];\n");
        assert_eq!(variable_line("App.a", &json!("x")).unwrap(), "App.a = \"x\";\n");
    }
}

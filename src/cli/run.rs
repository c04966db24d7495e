//! Command handlers.
//!
//! Markup goes to stdout, everything else to stderr through the logger.

use std::io::{Write, stdout};

use anyhow::{Context, Result, bail};

use crate::artifact::{ArtifactBuilder, Selected};
use crate::config::WebresConfig;
use crate::emit::RequestContext;
use crate::manager::{ScriptManager, StyleManager};
use crate::resolve::DependencyResolver;
use crate::resource::Sourced;
use crate::{debug, log};

use super::EmitArgs;

fn context(config: &WebresConfig, args: &EmitArgs, page: Option<&str>) -> RequestContext {
    RequestContext {
        page: page.map(str::to_owned),
        base_path: args.base_path.clone(),
        production: config.options.production,
    }
}

fn print(markup: &str) -> Result<()> {
    let mut out = stdout().lock();
    out.write_all(markup.as_bytes())
        .and_then(|()| out.flush())
        .context("failed to write markup to stdout")
}

/// `webres scripts`
pub fn scripts(config: &WebresConfig, args: &EmitArgs, page: Option<&str>) -> Result<()> {
    let manager = ScriptManager::from_config(config)?;
    let emission = manager.emit(&args.names, &context(config, args, page))?;

    debug!("emit"; "order: {}", emission.order.join(", "));
    let stats = manager.stats();
    debug!("artifact"; "{} built, {} cached, {} public", stats.built, stats.cache_hits, stats.public);

    print(&emission.fragment.to_string())
}

/// `webres styles`
pub fn styles(config: &WebresConfig, args: &EmitArgs) -> Result<()> {
    let manager = StyleManager::from_config(config);
    let fragment = manager.emit(&args.names, &context(config, args, None))?;

    let stats = manager.stats();
    debug!("artifact"; "{} built, {} cached", stats.built, stats.cache_hits);

    print(&fragment.to_string())
}

/// `webres order`
pub fn order(config: &WebresConfig, names: &[String]) -> Result<()> {
    let manager = ScriptManager::from_config(config)?;
    let order = manager.order(names)?;
    let mut listing = order.join("\n");
    listing.push('\n');
    print(&listing)
}

/// `webres check`: resolve every script, then make sure each resource has a
/// readable source under the current options.
pub fn check(config: &WebresConfig) -> Result<()> {
    let scripts = ScriptManager::from_config(config)?;
    let styles = StyleManager::from_config(config);
    let mut problems = 0usize;

    let resolver = DependencyResolver::new(scripts.catalog());
    for name in scripts.catalog().names() {
        if let Err(e) = resolver.resolve(&[name]) {
            log!("error"; "{}", e);
            problems += 1;
        }
    }

    for name in scripts.catalog().names() {
        if let Some(definition) = scripts.catalog().get(name) {
            problems += check_source(scripts.builder(), name, definition);
        }
    }
    for name in styles.catalog().names() {
        if let Some(definition) = styles.catalog().get(name) {
            problems += check_source(styles.builder(), name, definition);
        }
    }

    if problems > 0 {
        bail!("{} problem(s) found", problems);
    }
    log!(
        "check";
        "{} scripts, {} styles ok",
        scripts.catalog().len(),
        styles.catalog().len()
    );
    Ok(())
}

fn check_source<R: Sourced>(builder: &ArtifactBuilder, name: &str, resource: &R) -> usize {
    match builder.select(name, resource) {
        Ok(Selected::Public(_)) => 0,
        Ok(Selected::Local { path, .. }) if path.is_file() => 0,
        Ok(Selected::Local { path, .. }) => {
            log!("error"; "{} `{}`: `{}` not found", builder.kind(), name, path.display());
            1
        }
        Err(e) => {
            log!("error"; "{}", e);
            1
        }
    }
}

//! Dependency resolution for scripts.
//!
//! Expands the requested names into their full dependency closure and builds
//! the structures the emission engine drains:
//!
//! ```text
//! requested: [app]            catalog: app → [ui, jquery], ui → [jquery]
//!
//! nodes:   jquery, ui, app    (completion order)
//! index:   jquery → [ui, app]
//!          ui     → [app]
//! queue:   [jquery]           (nodes without dependencies)
//! ```
//!
//! Expansion is depth-first and memoized on the resource name, so diamonds
//! resolve the shared node once. A node is marked in-progress while its
//! dependencies are expanded; reaching it again before completion is a cycle.

mod graph;

pub use graph::{DependencyIndex, Resolution, ResolvedNode};

use crate::debug;
use crate::error::{Error, Result};
use crate::resource::ScriptCatalog;

/// Resolves requested script names against a catalog.
#[derive(Debug, Clone, Copy)]
pub struct DependencyResolver<'c> {
    catalog: &'c ScriptCatalog,
}

impl<'c> DependencyResolver<'c> {
    pub const fn new(catalog: &'c ScriptCatalog) -> Self {
        Self { catalog }
    }

    /// Expand `requested` into a [`Resolution`].
    ///
    /// Fails on the first undefined name or dependency cycle; nothing is
    /// returned in that case.
    pub fn resolve<S: AsRef<str>>(&self, requested: &[S]) -> Result<Resolution<'c>> {
        let mut resolution = Resolution::default();
        let mut in_progress = Vec::new();

        for name in requested {
            self.add(name.as_ref(), None, &mut resolution, &mut in_progress)?;
        }

        debug!("resolve"; "{} requested, {} required, {} ready",
            requested.len(), resolution.len(), resolution.initial_queue().len());
        Ok(resolution)
    }

    fn add(
        &self,
        name: &str,
        required_by: Option<&str>,
        resolution: &mut Resolution<'c>,
        in_progress: &mut Vec<String>,
    ) -> Result<()> {
        if resolution.contains(name) {
            return Ok(());
        }

        if let Some(pos) = in_progress.iter().position(|n| n == name) {
            let mut cycle = in_progress[pos..].to_vec();
            cycle.push(name.to_owned());
            return Err(Error::CyclicDependency { cycle });
        }

        let definition = self
            .catalog
            .get(name)
            .ok_or_else(|| Error::UndefinedResource {
                name: name.to_owned(),
                required_by: required_by.map(str::to_owned),
            })?;

        in_progress.push(name.to_owned());
        for dependency in &definition.depends {
            self.add(dependency, Some(name), resolution, in_progress)?;
            resolution.index_mut().record(dependency, name);
        }
        in_progress.pop();

        resolution.insert(ResolvedNode::new(name.to_owned(), definition));
        Ok(())
    }
}

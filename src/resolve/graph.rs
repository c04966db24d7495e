//! Resolved dependency graph: node arena, dependents index, ready queue.

use rustc_hash::FxHashMap;

use crate::debug;
use crate::resource::ResourceDefinition;

// =============================================================================
// ResolvedNode
// =============================================================================

/// A required resource within one resolution pass.
///
/// The `printed` flag goes from `false` to `true` exactly once.
#[derive(Debug, Clone)]
pub struct ResolvedNode<'c> {
    pub name: String,
    pub definition: &'c ResourceDefinition,
    printed: bool,
}

impl<'c> ResolvedNode<'c> {
    pub(super) fn new(name: String, definition: &'c ResourceDefinition) -> Self {
        Self {
            name,
            definition,
            printed: false,
        }
    }

    /// Declared dependencies, always a sequence.
    #[inline]
    pub fn depends(&self) -> &'c [String] {
        &self.definition.depends
    }

    #[inline]
    pub fn is_printed(&self) -> bool {
        self.printed
    }
}

// =============================================================================
// DependencyIndex
// =============================================================================

/// Reverse edges: dependency name → names of resources that declared it.
///
/// Dependents keep the order in which they were reached during expansion.
#[derive(Debug, Default)]
pub struct DependencyIndex {
    dependents: FxHashMap<String, Vec<String>>,
}

impl DependencyIndex {
    pub(super) fn record(&mut self, dependency: &str, dependent: &str) {
        let entry = self.dependents.entry(dependency.to_owned()).or_default();
        if !entry.iter().any(|d| d == dependent) {
            entry.push(dependent.to_owned());
        }
    }

    /// Resources that declared `name` as a dependency.
    pub fn dependents(&self, name: &str) -> &[String] {
        self.dependents.get(name).map(Vec::as_slice).unwrap_or_default()
    }

    pub fn len(&self) -> usize {
        self.dependents.len()
    }

    pub fn is_empty(&self) -> bool {
        self.dependents.is_empty()
    }
}

// =============================================================================
// Resolution
// =============================================================================

/// Output of [`DependencyResolver::resolve`](super::DependencyResolver::resolve).
///
/// Owns every node of the closure. All mutation of the printed flags goes
/// through this arena; the index only refers to names.
#[derive(Debug, Default)]
pub struct Resolution<'c> {
    nodes: FxHashMap<String, ResolvedNode<'c>>,
    /// Names in the order their expansion completed.
    order: Vec<String>,
    index: DependencyIndex,
    queue: Vec<String>,
}

impl<'c> Resolution<'c> {
    pub(super) fn insert(&mut self, node: ResolvedNode<'c>) {
        if node.depends().is_empty() {
            self.queue.push(node.name.clone());
        }
        self.order.push(node.name.clone());
        self.nodes.insert(node.name.clone(), node);
    }

    pub(super) fn index_mut(&mut self) -> &mut DependencyIndex {
        &mut self.index
    }

    #[inline]
    pub fn contains(&self, name: &str) -> bool {
        self.nodes.contains_key(name)
    }

    #[inline]
    pub fn get(&self, name: &str) -> Option<&ResolvedNode<'c>> {
        self.nodes.get(name)
    }

    /// Names of the whole closure, dependencies before the nodes that needed them.
    pub fn names(&self) -> &[String] {
        &self.order
    }

    pub fn index(&self) -> &DependencyIndex {
        &self.index
    }

    /// Nodes without dependencies, ready before anything was printed.
    pub fn initial_queue(&self) -> &[String] {
        &self.queue
    }

    /// Move the initial queue out for draining.
    pub fn take_queue(&mut self) -> Vec<String> {
        std::mem::take(&mut self.queue)
    }

    pub fn len(&self) -> usize {
        self.nodes.len()
    }

    pub fn is_empty(&self) -> bool {
        self.nodes.is_empty()
    }

    #[inline]
    pub fn is_printed(&self, name: &str) -> bool {
        self.nodes.get(name).is_some_and(ResolvedNode::is_printed)
    }

    /// Mark a node as emitted. Marking twice is a no-op.
    pub fn mark_printed(&mut self, name: &str) {
        if let Some(node) = self.nodes.get_mut(name) {
            node.printed = true;
        }
    }

    /// Dependents of `name` that became ready: not printed yet and every one
    /// of their own dependencies printed.
    pub fn ready_dependents(&self, name: &str) -> Vec<String> {
        self.index
            .dependents(name)
            .iter()
            .filter_map(|dependent| self.nodes.get(dependent))
            .filter(|node| !node.printed && node.depends().iter().all(|d| self.is_printed(d)))
            .map(|node| node.name.clone())
            .collect()
    }

    /// Drain the ready queue in rounds.
    ///
    /// Each round snapshots the queue; every node of the snapshot is passed to
    /// `visit`, marked printed, and its newly ready dependents are queued for
    /// the next round. Returns the names in visit order.
    pub fn drain<E>(
        &mut self,
        mut visit: impl FnMut(&ResolvedNode<'c>) -> Result<(), E>,
    ) -> Result<Vec<String>, E> {
        let mut order = Vec::with_capacity(self.nodes.len());
        let mut queue = self.take_queue();
        let mut round = 0usize;

        while !queue.is_empty() {
            round += 1;
            let snapshot = std::mem::take(&mut queue);
            debug!("emit"; "round {}: {}", round, snapshot.join(", "));

            for name in snapshot {
                let Some(node) = self.nodes.get(&name) else {
                    continue;
                };
                if node.printed {
                    continue;
                }
                visit(node)?;

                self.mark_printed(&name);
                for ready in self.ready_dependents(&name) {
                    if !queue.contains(&ready) {
                        queue.push(ready);
                    }
                }
                order.push(name);
            }
        }
        Ok(order)
    }

    /// Whether every node of the closure was emitted.
    pub fn all_printed(&self) -> bool {
        self.nodes.values().all(ResolvedNode::is_printed)
    }
}

//! The build graph and the read-only view the pipeline emitter consumes.
//!
//! Edges read "depends on": `(a, b)` means `a` cannot start until `b` is
//! complete.

use crate::key::{NodeKey, NodeKind};
use crate::node::BuildNode;
use c3i_core::{Error, Platform, RenderedRecipe, Result, Variant};
use c3i_task_graph::TaskGraph;
use std::path::Path;

/// Everything an emitter needs to know about one node.
#[derive(Debug, Clone, Copy)]
pub struct NodeAttributes<'a> {
    /// Rendered package metadata
    pub recipe: &'a RenderedRecipe,
    /// Platform the task runs on
    pub platform: &'a Platform,
    /// Variant the recipe was rendered with
    pub variant: &'a Variant,
    /// Build, test or test-only
    pub kind: NodeKind,
    /// Recipe directory
    pub recipe_dir: &'a Path,
}

/// DAG of build, test and test-only tasks, keyed by [`NodeKey`].
///
/// Nodes iterate in insertion order.
#[derive(Debug, Clone, Default)]
pub struct BuildGraph {
    inner: TaskGraph<BuildNode>,
}

impl BuildGraph {
    /// Create an empty graph.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Number of nodes.
    #[must_use]
    pub fn len(&self) -> usize {
        self.inner.task_count()
    }

    /// Whether the graph has no nodes.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.inner.is_empty()
    }

    /// Whether a node with `key` exists.
    #[must_use]
    pub fn contains(&self, key: &str) -> bool {
        self.inner.contains_task(key)
    }

    /// Look up a node.
    #[must_use]
    pub fn node(&self, key: &str) -> Option<&BuildNode> {
        self.inner.get_node_by_name(key).map(|n| &n.task)
    }

    /// Nodes in insertion order.
    pub fn nodes(&self) -> impl Iterator<Item = &BuildNode> {
        self.inner.iter_nodes().map(|n| &n.task)
    }

    /// Node keys in insertion order.
    pub fn keys(&self) -> impl Iterator<Item = &NodeKey> {
        self.nodes().map(|n| &n.key)
    }

    /// Every edge as a sorted `(dependent, dependency)` key pair.
    #[must_use]
    pub fn edges(&self) -> Vec<(&str, &str)> {
        self.inner.edges()
    }

    /// Number of edges.
    #[must_use]
    pub fn edge_count(&self) -> usize {
        self.inner.edge_count()
    }

    /// Emitter-facing attributes of a node.
    #[must_use]
    pub fn attributes(&self, key: &str) -> Option<NodeAttributes<'_>> {
        self.node(key).map(|n| NodeAttributes {
            recipe: &n.recipe,
            platform: &n.platform,
            variant: &n.variant,
            kind: n.kind,
            recipe_dir: &n.recipe_dir,
        })
    }

    /// Keys of the nodes `key` depends on, sorted.
    #[must_use]
    pub fn dependencies(&self, key: &str) -> Vec<&str> {
        self.inner.dependencies(key)
    }

    /// Keys of the nodes depending on `key`, sorted.
    #[must_use]
    pub fn dependents(&self, key: &str) -> Vec<&str> {
        self.inner.dependents(key)
    }

    /// Insert `node` unless its key is taken. Returns whether it was inserted.
    pub fn insert(&mut self, node: BuildNode) -> bool {
        if self.contains(&node.key) {
            return false;
        }
        let key = node.key.clone();
        self.inner.add_task(&key, node);
        true
    }

    /// Remove a node and all edges touching it.
    pub fn remove(&mut self, key: &str) -> Option<BuildNode> {
        self.inner.remove_task(key)
    }

    /// Record that `from` depends on `to`. Duplicate edges collapse.
    ///
    /// # Errors
    ///
    /// A self edge is reported as a one-node [`Error::CycleDetected`]; an
    /// unknown endpoint is an [`Error::Config`].
    pub fn add_edge(&mut self, from: &str, to: &str) -> Result<bool> {
        self.inner.add_dependency(from, to).map_err(graph_error)
    }

    /// Remove the edge `from -> to`, returning whether it existed.
    pub fn remove_edge(&mut self, from: &str, to: &str) -> bool {
        self.inner.remove_dependency(from, to)
    }

    /// Union `other` into this graph. Returns the number of nodes added.
    ///
    /// # Errors
    ///
    /// Only fails if `other` is malformed.
    pub fn compose(&mut self, other: &Self) -> Result<usize> {
        self.inner.merge(&other.inner).map_err(graph_error)
    }

    /// Nodes with dependencies first, ties broken by key.
    ///
    /// # Errors
    ///
    /// Returns [`Error::CycleDetected`] naming one cycle.
    pub fn order(&self) -> Result<Vec<&BuildNode>> {
        self.inner
            .topological_sort()
            .map(|nodes| nodes.into_iter().map(|n| &n.task).collect())
            .map_err(graph_error)
    }

    /// Nodes grouped by dependency level, each level sorted by key.
    ///
    /// # Errors
    ///
    /// Returns [`Error::CycleDetected`] naming one cycle.
    pub fn levels(&self) -> Result<Vec<Vec<&BuildNode>>> {
        self.inner
            .get_parallel_groups()
            .map(|groups| {
                groups
                    .into_iter()
                    .map(|g| g.into_iter().map(|n| &n.task).collect())
                    .collect()
            })
            .map_err(graph_error)
    }
}

fn graph_error(err: c3i_task_graph::Error) -> Error {
    use c3i_task_graph::Error as GraphError;

    match err {
        GraphError::CycleDetected { edges } => Error::cycle(edges),
        GraphError::SelfDependency { task } => Error::cycle(vec![(task.clone(), task)]),
        GraphError::MissingTask { name } => {
            Error::config(format!("node '{name}' is not in the build graph"))
        }
        GraphError::MissingDependency { task, dependency } => Error::config(format!(
            "node '{task}' depends on '{dependency}', which is not in the build graph"
        )),
    }
}

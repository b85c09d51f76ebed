//! Noarch collapse.
//!
//! A noarch package is built once, on the designated build subdir, and only
//! tested everywhere else. Collapsing replaces each other-platform
//! `build`/`test` pair with one `test-only` node fed by the single builder.

use crate::graph::BuildGraph;
use crate::key::{NodeKey, NodeKind};
use c3i_core::{Error, Result};
use std::collections::BTreeMap;
use tracing::{debug, info, instrument, warn};

/// Subdir noarch packages are built on unless configured otherwise.
pub const DEFAULT_BUILD_SUBDIR: &str = "linux-64";

/// Rewrites per-platform noarch builds into one builder plus test-only nodes.
#[derive(Debug, Clone)]
pub struct NoarchCollapser {
    build_subdir: String,
}

impl Default for NoarchCollapser {
    fn default() -> Self {
        Self {
            build_subdir: DEFAULT_BUILD_SUBDIR.to_string(),
        }
    }
}

/// One noarch package: where it is built and what gets collapsed.
struct Group {
    builder: NodeKey,
    collapsible: Vec<NodeKey>,
}

impl NoarchCollapser {
    /// Build noarch packages on `linux-64`.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Build noarch packages on `subdir` instead.
    #[must_use]
    pub fn with_build_subdir(mut self, subdir: impl Into<String>) -> Self {
        self.build_subdir = subdir.into();
        self
    }

    /// The designated build subdir.
    #[must_use]
    pub fn build_subdir(&self) -> &str {
        &self.build_subdir
    }

    /// Collapse every noarch package in `graph`, returning the number of
    /// `test-only` nodes created.
    ///
    /// Every package is checked for a builder before the graph is touched.
    ///
    /// # Errors
    ///
    /// [`Error::NoarchWithoutBuilder`] when a noarch package has no `build`
    /// node on the build subdir.
    #[instrument(skip_all, fields(build_subdir = %self.build_subdir))]
    pub fn collapse(&self, graph: &mut BuildGraph) -> Result<usize> {
        let groups = self.groups(graph)?;
        let mut created = 0;

        for (package, group) in groups {
            for build_key in group.collapsible {
                collapse_one(graph, &build_key, &group.builder)?;
                created += 1;
            }
            debug!(package = %package, builder = %group.builder, "Collapsed noarch package");
        }

        if created > 0 {
            info!(test_only = created, "Collapsed noarch builds");
        }
        Ok(created)
    }

    fn groups(&self, graph: &BuildGraph) -> Result<BTreeMap<String, Group>> {
        let mut by_package: BTreeMap<String, Vec<NodeKey>> = BTreeMap::new();
        for node in graph.nodes() {
            if node.kind == NodeKind::Build && node.recipe.is_noarch() {
                by_package
                    .entry(node.name().to_string())
                    .or_default()
                    .push(node.key.clone());
            }
        }

        let mut groups = BTreeMap::new();
        for (package, keys) in by_package {
            let (mut builders, mut collapsible): (Vec<NodeKey>, Vec<NodeKey>) =
                keys.into_iter().partition(|key| {
                    graph
                        .node(key)
                        .is_some_and(|n| n.platform.subdir() == self.build_subdir)
                });
            if builders.is_empty() {
                return Err(Error::noarch_without_builder(package, &self.build_subdir));
            }
            if builders.len() > 1 {
                warn!(
                    package = %package,
                    count = builders.len(),
                    "More than one noarch build on the build subdir, keeping the first"
                );
            }
            let builder = builders.remove(0);
            collapsible.extend(builders);
            groups.insert(
                package,
                Group {
                    builder,
                    collapsible,
                },
            );
        }
        Ok(groups)
    }
}

/// Replace `build_key` and its twin test node with a test-only node fed by `builder`.
fn collapse_one(graph: &mut BuildGraph, build_key: &NodeKey, builder: &NodeKey) -> Result<()> {
    let Some(build) = graph.node(build_key).cloned() else {
        return Ok(());
    };
    let test_key = build.key_as(NodeKind::Test);

    let mut consumers: Vec<String> = graph
        .dependents(build_key)
        .into_iter()
        .chain(graph.dependents(&test_key))
        .filter(|x| ![build_key.as_str(), test_key.as_str(), builder.as_str()].contains(x))
        .map(str::to_string)
        .collect();
    consumers.sort();
    consumers.dedup();

    let test = graph.remove(&test_key);
    graph.remove(build_key);

    for consumer in &consumers {
        graph.add_edge(consumer, builder)?;
    }

    let test_only = test.unwrap_or(build).with_kind(NodeKind::TestOnly);
    let test_only_key = test_only.key.clone();
    debug!(node = %test_only_key, builder = %builder, "Adding test-only node");
    graph.insert(test_only);
    graph.add_edge(&test_only_key, builder)?;
    Ok(())
}

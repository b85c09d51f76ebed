//! Downstream expansion.
//!
//! A change to a package may break the packages depending on it. Expansion
//! walks the reverse edges of the graph over *all* recipes and adds those
//! dependents to the working graph, one layer per step.

use crate::builder::GraphBuilder;
use crate::graph::BuildGraph;
use crate::key::NodeKey;
use c3i_core::{ChannelResolver, Error, Platform, RecipeRenderer, Result};
use std::path::{Path, PathBuf};
use tracing::{debug, info, instrument};

/// How far expansion reaches.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ExpandOptions {
    /// Number of passes; `0` disables expansion, negative runs to a fixed point
    pub steps: i64,
    /// Package budget per call; negative is unlimited
    pub max_downstream: i64,
}

impl Default for ExpandOptions {
    fn default() -> Self {
        Self {
            steps: 0,
            max_downstream: 5,
        }
    }
}

impl ExpandOptions {
    /// Node budget: each package contributes a build and a test node.
    fn node_budget(self) -> Option<usize> {
        usize::try_from(self.max_downstream)
            .ok()
            .map(|packages| packages.saturating_mul(2))
    }
}

/// Grows a graph along reverse-dependency edges.
pub struct DownstreamExpander<'a, R: ?Sized, C: ?Sized> {
    builder: GraphBuilder<'a, R, C>,
    options: ExpandOptions,
}

impl<'a, R, C> DownstreamExpander<'a, R, C>
where
    R: RecipeRenderer + ?Sized,
    C: ChannelResolver + ?Sized,
{
    /// Expand with a copy of `builder`'s rules and recipes root.
    pub fn new(builder: &GraphBuilder<'a, R, C>, options: ExpandOptions) -> Self {
        Self {
            builder: builder.clone(),
            options,
        }
    }

    /// Use `root` for the full recipe set and for every lookup while
    /// expanding, including dependencies of the recipes added.
    #[must_use]
    pub fn with_recipes_root(mut self, root: impl Into<PathBuf>) -> Self {
        self.builder = self.builder.with_recipes_root(root);
        self
    }

    /// Expand `graph` on `platform`, returning the number of nodes added.
    ///
    /// The budget is checked before each dependent is added, and a dependent
    /// may pull in upstream nodes too, so the count can exceed the budget by
    /// one package's worth of nodes.
    ///
    /// # Errors
    ///
    /// [`Error::Config`] when `steps != 0` and no recipes root is known, plus
    /// any error from building.
    #[instrument(skip_all, fields(platform = %platform.label, steps = self.options.steps))]
    pub fn expand(&self, graph: &mut BuildGraph, platform: &Platform) -> Result<usize> {
        if self.options.steps == 0 {
            return Ok(0);
        }
        let root = self.builder.recipes_root().ok_or_else(|| {
            Error::config("downstream expansion (steps != 0) needs a recipes root")
        })?;

        let full = self.builder.build(&recipe_dirs(root)?, platform)?;
        let budget = self.options.node_budget();
        let mut added = 0usize;
        let mut pass = 0i64;

        'passes: while self.options.steps < 0 || pass < self.options.steps {
            pass += 1;
            let before = graph.len();
            let snapshot: Vec<NodeKey> = graph.keys().cloned().collect();

            for key in &snapshot {
                for dependent in full.dependents(key) {
                    if budget.is_some_and(|b| added >= b) {
                        debug!(added, "Downstream budget exhausted");
                        break 'passes;
                    }
                    let Some(node) = full.node(dependent) else {
                        continue;
                    };
                    let size = graph.len();
                    self.builder
                        .add_recipe(graph, &node.recipe_dir, &node.platform, &node.variant)?;
                    added += graph.len() - size;
                }
            }

            debug!(pass, new = graph.len() - before, "Expansion pass complete");
            if graph.len() == before {
                break;
            }
        }

        info!(added, passes = pass, "Expanded downstream");
        Ok(added)
    }
}

/// Immediate, non-hidden subdirectories of `root`, sorted by name.
fn recipe_dirs(root: &Path) -> Result<Vec<PathBuf>> {
    let entries = std::fs::read_dir(root).map_err(|e| Error::io(e, root, "list recipes"))?;
    let mut dirs = Vec::new();
    for entry in entries {
        let path = entry.map_err(|e| Error::io(e, root, "list recipes"))?.path();
        let hidden = path
            .file_name()
            .and_then(|n| n.to_str())
            .is_some_and(|n| n.starts_with('.'));
        if path.is_dir() && !hidden {
            dirs.push(path);
        }
    }
    dirs.sort();
    Ok(dirs)
}

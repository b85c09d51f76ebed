//! End-to-end planning across platforms.

use crate::builder::GraphBuilder;
use crate::expand::{DownstreamExpander, ExpandOptions};
use crate::graph::BuildGraph;
use crate::noarch::{DEFAULT_BUILD_SUBDIR, NoarchCollapser};
use c3i_core::{ChannelResolver, Platform, RecipeRenderer, Result, VariantMatrix};
use std::path::PathBuf;
use tracing::{info, instrument};

/// What to plan.
#[derive(Debug, Clone)]
pub struct PlanRequest {
    /// Directory of recipes; required for dependency lookup and expansion
    pub recipes_root: Option<PathBuf>,
    /// Recipe directories to start from, relative to `recipes_root`
    pub seeds: Vec<PathBuf>,
    /// Platforms to build on
    pub platforms: Vec<Platform>,
    /// Downstream expansion policy, applied per platform
    pub expand: ExpandOptions,
    /// Subdir that builds noarch packages
    pub noarch_build_subdir: String,
}

impl Default for PlanRequest {
    fn default() -> Self {
        Self {
            recipes_root: None,
            seeds: Vec::new(),
            platforms: Vec::new(),
            expand: ExpandOptions::default(),
            noarch_build_subdir: DEFAULT_BUILD_SUBDIR.to_string(),
        }
    }
}

/// Runs build, expand and compose per platform, then collapses noarch packages.
pub struct Planner<'a, R: ?Sized, C: ?Sized> {
    renderer: &'a R,
    resolver: &'a C,
    matrix: VariantMatrix,
}

impl<'a, R, C> Planner<'a, R, C>
where
    R: RecipeRenderer + ?Sized,
    C: ChannelResolver + ?Sized,
{
    /// Create a planner.
    pub fn new(renderer: &'a R, resolver: &'a C, matrix: VariantMatrix) -> Self {
        Self {
            renderer,
            resolver,
            matrix,
        }
    }

    /// Plan `request`. An empty result is not an error here.
    ///
    /// # Errors
    ///
    /// Any error from building, expanding or collapsing.
    #[instrument(
        skip_all,
        fields(seeds = request.seeds.len(), platforms = request.platforms.len())
    )]
    pub fn plan(&self, request: &PlanRequest) -> Result<BuildGraph> {
        let mut builder = GraphBuilder::new(self.renderer, self.resolver, self.matrix.clone());
        if let Some(root) = &request.recipes_root {
            builder = builder.with_recipes_root(root);
        }
        let expander = DownstreamExpander::new(&builder, request.expand);

        let mut merged = BuildGraph::new();
        for platform in &request.platforms {
            let mut graph = builder.build(&request.seeds, platform)?;
            expander.expand(&mut graph, platform)?;
            merged.compose(&graph)?;
        }

        NoarchCollapser::new()
            .with_build_subdir(&request.noarch_build_subdir)
            .collapse(&mut merged)?;

        info!(
            nodes = merged.len(),
            edges = merged.edge_count(),
            "Planned build graph"
        );
        Ok(merged)
    }
}

//! Initial graph construction.
//!
//! Every (recipe, variant) pair on a platform becomes a `build` node and its
//! twin `test` node. Build-time requirements that no channel provides pull in
//! upstream `build` nodes, recursively; run and test requirements of the
//! `test` node do the same.

use crate::graph::BuildGraph;
use crate::key::{NodeKey, NodeKind};
use crate::node::BuildNode;
use c3i_core::{
    ChannelResolver, DependencySpec, Error, Platform, RecipeRenderer, RenderedRecipe, Result,
    Variant, VariantMatrix,
};
use std::path::{Path, PathBuf};
use tracing::{debug, info, instrument};

/// Builds the graph for a set of seed recipes on one platform.
pub struct GraphBuilder<'a, R: ?Sized, C: ?Sized> {
    renderer: &'a R,
    resolver: &'a C,
    matrix: VariantMatrix,
    recipes_root: Option<PathBuf>,
}

impl<R: ?Sized, C: ?Sized> Clone for GraphBuilder<'_, R, C> {
    fn clone(&self) -> Self {
        Self {
            renderer: self.renderer,
            resolver: self.resolver,
            matrix: self.matrix.clone(),
            recipes_root: self.recipes_root.clone(),
        }
    }
}

impl<'a, R, C> GraphBuilder<'a, R, C>
where
    R: RecipeRenderer + ?Sized,
    C: ChannelResolver + ?Sized,
{
    /// Create a builder rendering every recipe against `matrix`.
    pub fn new(renderer: &'a R, resolver: &'a C, matrix: VariantMatrix) -> Self {
        Self {
            renderer,
            resolver,
            matrix,
            recipes_root: None,
        }
    }

    /// Directory holding one subdirectory per recipe.
    ///
    /// Relative seeds are resolved against it, and unsatisfied dependencies
    /// are looked up as `<root>/<package name>`.
    #[must_use]
    pub fn with_recipes_root(mut self, root: impl Into<PathBuf>) -> Self {
        self.recipes_root = Some(root.into());
        self
    }

    /// The configured recipes root.
    #[must_use]
    pub fn recipes_root(&self) -> Option<&Path> {
        self.recipes_root.as_deref()
    }

    /// Variants a recipe is rendered with on `platform`.
    #[must_use]
    pub fn variants_for(&self, platform: &Platform) -> Vec<Variant> {
        self.matrix.with_overrides(&platform.variants).expand()
    }

    /// Build a fresh graph from `seeds` on `platform`.
    ///
    /// # Errors
    ///
    /// Propagates renderer and resolver failures and reports dependencies
    /// that can be neither installed nor built.
    #[instrument(skip_all, fields(platform = %platform.label, seeds = seeds.len()))]
    pub fn build<P: AsRef<Path>>(&self, seeds: &[P], platform: &Platform) -> Result<BuildGraph> {
        let mut graph = BuildGraph::new();
        let variants = self.variants_for(platform);

        for seed in seeds {
            let dir = self.seed_dir(seed.as_ref());
            for variant in &variants {
                self.add_recipe(&mut graph, &dir, platform, variant)?;
            }
        }

        info!(
            nodes = graph.len(),
            edges = graph.edge_count(),
            variants = variants.len(),
            "Built initial graph"
        );
        Ok(graph)
    }

    /// Add one recipe (and everything it needs) to `graph`.
    ///
    /// Returns the key of its `build` node, or `None` when the directory is
    /// not a recipe or the recipe skips this variant.
    ///
    /// # Errors
    ///
    /// See [`GraphBuilder::build`].
    pub fn add_recipe(
        &self,
        graph: &mut BuildGraph,
        dir: &Path,
        platform: &Platform,
        variant: &Variant,
    ) -> Result<Option<NodeKey>> {
        let Some(recipe) = self.renderer.render(dir, variant, platform)? else {
            debug!(dir = %dir.display(), "Not a recipe, skipping");
            return Ok(None);
        };
        if recipe.skip() {
            debug!(package = recipe.name(), variant = %variant, "Recipe skips variant");
            return Ok(None);
        }
        self.insert_recipe(graph, dir, recipe, platform, variant).map(Some)
    }

    fn insert_recipe(
        &self,
        graph: &mut BuildGraph,
        dir: &Path,
        recipe: RenderedRecipe,
        platform: &Platform,
        variant: &Variant,
    ) -> Result<NodeKey> {
        let build = BuildNode::new(
            NodeKind::Build,
            recipe,
            platform.clone(),
            variant.clone(),
            dir.to_path_buf(),
        );
        let build_key = build.key.clone();
        if graph.contains(&build_key) {
            return Ok(build_key);
        }
        let test = build.with_kind(NodeKind::Test);
        let build_deps = build.recipe.build_deps().to_vec();
        let run_test_deps = build.recipe.run_test_deps();

        debug!(node = %build_key, "Adding build node");
        graph.insert(build);
        for dep in &build_deps {
            if let Some(upstream) = self.resolve(graph, dep, &build_key, platform, variant)? {
                graph.add_edge(&build_key, &upstream)?;
            }
        }

        let test_key = test.key.clone();
        graph.insert(test);
        graph.add_edge(&test_key, &build_key)?;
        for dep in &run_test_deps {
            if let Some(upstream) = self.resolve(graph, dep, &test_key, platform, variant)? {
                graph.add_edge(&test_key, &upstream)?;
            }
        }

        Ok(build_key)
    }

    /// Decide how `dep` of `node` is satisfied: `None` when installable,
    /// otherwise the key of the `build` node that produces it.
    fn resolve(
        &self,
        graph: &mut BuildGraph,
        dep: &DependencySpec,
        node: &NodeKey,
        platform: &Platform,
        variant: &Variant,
    ) -> Result<Option<NodeKey>> {
        if self.resolver.satisfies(dep, platform)? {
            debug!(node = %node, dependency = %dep, "Installable from channel");
            return Ok(None);
        }

        if let Some(existing) = graph.nodes().find(|n| {
            n.kind == NodeKind::Build
                && n.platform.label == platform.label
                && dep.is_satisfied_by(n.recipe.name(), n.recipe.version(), n.recipe.build_id())
        }) {
            return Ok(Some(existing.key.clone()));
        }

        if let Some(root) = &self.recipes_root {
            let dir = root.join(&dep.name);
            if let Some(recipe) = self.renderer.render(&dir, variant, platform)?
                && !recipe.skip()
                && recipe.provides(dep)
            {
                debug!(
                    node = %node,
                    dependency = %dep,
                    dir = %dir.display(),
                    "Building dependency"
                );
                return self.insert_recipe(graph, &dir, recipe, platform, variant).map(Some);
            }
        }

        Err(Error::unresolvable(dep.to_string(), node.as_str()))
    }

    fn seed_dir(&self, seed: &Path) -> PathBuf {
        match &self.recipes_root {
            Some(root) => root.join(seed),
            None => seed.to_path_buf(),
        }
    }
}

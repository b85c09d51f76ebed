//! In-memory collaborators for engine tests.

#![allow(dead_code)]

use c3i_core::{
    ChannelResolver, DependencySpec, Error, Platform, RecipeRenderer, RenderedRecipe, Result,
    Variant, VariantMatrix,
};
use c3i_engine::BuildGraph;
use std::cell::Cell;
use std::collections::{BTreeSet, HashMap};
use std::path::Path;

/// A recipe as the fake renderer sees it.
#[derive(Debug, Clone, Default)]
pub struct FakeRecipe {
    pub version: String,
    pub build_deps: Vec<String>,
    pub run_deps: Vec<String>,
    pub test_deps: Vec<String>,
    pub noarch: bool,
    /// Platform labels the recipe skips
    pub skip_on: Vec<String>,
    /// Variant key that feeds the build id
    pub variant_key: Option<String>,
    /// Render with a different package name than the directory
    pub package_name: Option<String>,
}

impl FakeRecipe {
    pub fn new() -> Self {
        Self {
            version: "1.0".to_string(),
            ..Self::default()
        }
    }

    pub fn build_deps(mut self, deps: &[&str]) -> Self {
        self.build_deps = deps.iter().map(|d| (*d).to_string()).collect();
        self
    }

    pub fn run_deps(mut self, deps: &[&str]) -> Self {
        self.run_deps = deps.iter().map(|d| (*d).to_string()).collect();
        self
    }

    pub fn test_deps(mut self, deps: &[&str]) -> Self {
        self.test_deps = deps.iter().map(|d| (*d).to_string()).collect();
        self
    }

    pub fn version(mut self, version: &str) -> Self {
        self.version = version.to_string();
        self
    }

    pub fn noarch(mut self) -> Self {
        self.noarch = true;
        self
    }

    pub fn skip_on(mut self, label: &str) -> Self {
        self.skip_on.push(label.to_string());
        self
    }

    pub fn varies_with(mut self, key: &str) -> Self {
        self.variant_key = Some(key.to_string());
        self
    }
}

/// Renders recipes from a name-keyed table; unknown directories are not recipes.
#[derive(Default)]
pub struct FakeRenderer {
    recipes: HashMap<String, FakeRecipe>,
    failing: Option<String>,
    pub renders: Cell<usize>,
}

impl FakeRenderer {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with(mut self, name: &str, recipe: FakeRecipe) -> Self {
        self.recipes.insert(name.to_string(), recipe);
        self
    }

    /// Rendering `name` fails with a recipe error.
    pub fn failing_on(mut self, name: &str) -> Self {
        self.failing = Some(name.to_string());
        self
    }

    pub fn names(&self) -> Vec<String> {
        let mut names: Vec<String> = self.recipes.keys().cloned().collect();
        names.sort();
        names
    }
}

impl RecipeRenderer for FakeRenderer {
    fn render(
        &self,
        dir: &Path,
        variant: &Variant,
        platform: &Platform,
    ) -> Result<Option<RenderedRecipe>> {
        self.renders.set(self.renders.get() + 1);
        let Some(name) = dir.file_name().and_then(|n| n.to_str()) else {
            return Ok(None);
        };
        if self.failing.as_deref() == Some(name) {
            return Err(Error::recipe(dir, "template error"));
        }
        let Some(recipe) = self.recipes.get(name) else {
            return Ok(None);
        };

        let build_id = recipe
            .variant_key
            .as_deref()
            .and_then(|key| variant.get(key))
            .map_or_else(|| "0".to_string(), |v| format!("v{}_0", v.replace('.', "")));
        let package = recipe.package_name.as_deref().unwrap_or(name);

        Ok(Some(
            RenderedRecipe::new(package, recipe.version.clone(), build_id)
                .with_build_deps(&recipe.build_deps)?
                .with_run_deps(&recipe.run_deps)?
                .with_test_deps(&recipe.test_deps)?
                .noarch(recipe.noarch)
                .skipped(recipe.skip_on.contains(&platform.label)),
        ))
    }

    fn recognizes(&self, dir: &Path) -> bool {
        dir.file_name()
            .and_then(|n| n.to_str())
            .is_some_and(|n| self.recipes.contains_key(n))
    }
}

/// Knows a fixed set of published `(name, version)` packages.
#[derive(Default)]
pub struct FakeResolver {
    published: Vec<(String, String)>,
    failing: bool,
}

impl FakeResolver {
    /// Nothing is installable.
    pub fn empty() -> Self {
        Self::default()
    }

    pub fn with(mut self, name: &str, version: &str) -> Self {
        self.published.push((name.to_string(), version.to_string()));
        self
    }

    /// Every query fails.
    pub fn failing() -> Self {
        Self {
            published: Vec::new(),
            failing: true,
        }
    }
}

impl ChannelResolver for FakeResolver {
    fn satisfies(&self, dep: &DependencySpec, _platform: &Platform) -> Result<bool> {
        if self.failing {
            return Err(Error::resolver(dep.to_string(), "channel unreachable"));
        }
        Ok(self
            .published
            .iter()
            .any(|(name, version)| *name == dep.name && dep.matches_version(version)))
    }
}

/// A recipes root with one empty directory per recipe, plus a hidden one.
pub fn recipe_tree(renderer: &FakeRenderer) -> tempfile::TempDir {
    let dir = tempfile::tempdir().unwrap();
    for name in renderer.names() {
        std::fs::create_dir(dir.path().join(name)).unwrap();
    }
    std::fs::create_dir(dir.path().join(".git")).unwrap();
    dir
}

pub fn linux() -> Platform {
    Platform::new("linux", "64", "linux-64")
}

pub fn osx() -> Platform {
    Platform::new("osx", "64", "osx-64")
}

pub fn win() -> Platform {
    Platform::new("win", "64", "win-64")
}

pub fn keys(graph: &BuildGraph) -> BTreeSet<String> {
    graph.keys().map(ToString::to_string).collect()
}

pub fn set(keys: &[&str]) -> BTreeSet<String> {
    keys.iter().map(|k| (*k).to_string()).collect()
}

pub fn edges(graph: &BuildGraph) -> Vec<(String, String)> {
    graph
        .edges()
        .into_iter()
        .map(|(a, b)| (a.to_string(), b.to_string()))
        .collect()
}

pub fn matrix(entries: &[(&str, &[&str])]) -> VariantMatrix {
    entries
        .iter()
        .map(|(k, vs)| (*k, vs.iter().map(|v| (*v).to_string()).collect()))
        .collect()
}

/// `a <- b <- c <- d` at build time (each builds against the previous).
pub fn chain() -> FakeRenderer {
    FakeRenderer::new()
        .with("a", FakeRecipe::new())
        .with("b", FakeRecipe::new().build_deps(&["a"]))
        .with("c", FakeRecipe::new().build_deps(&["b"]))
        .with("d", FakeRecipe::new().build_deps(&["c"]))
}

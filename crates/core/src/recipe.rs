//! Rendered recipes.

use crate::error::Result;
use crate::spec::{DependencySpec, parse_requirements};
use serde::Serialize;

/// A recipe rendered for one platform and variant.
///
/// Produced by a [`RecipeRenderer`](crate::RecipeRenderer). Two recipes with
/// the same name and build id describe the same package build.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct RenderedRecipe {
    name: String,
    version: String,
    build_id: String,
    skip: bool,
    noarch: bool,
    build_deps: Vec<DependencySpec>,
    run_deps: Vec<DependencySpec>,
    test_deps: Vec<DependencySpec>,
}

impl RenderedRecipe {
    /// Start a recipe with no dependencies, not skipped and not noarch.
    pub fn new(
        name: impl Into<String>,
        version: impl Into<String>,
        build_id: impl Into<String>,
    ) -> Self {
        Self {
            name: name.into(),
            version: version.into(),
            build_id: build_id.into(),
            skip: false,
            noarch: false,
            build_deps: Vec::new(),
            run_deps: Vec::new(),
            test_deps: Vec::new(),
        }
    }

    /// Mark the recipe as skipped on this platform/variant.
    #[must_use]
    pub fn skipped(mut self, skip: bool) -> Self {
        self.skip = skip;
        self
    }

    /// Mark the recipe as platform-independent.
    #[must_use]
    pub fn noarch(mut self, noarch: bool) -> Self {
        self.noarch = noarch;
        self
    }

    /// Set build-time requirements from match-spec strings.
    ///
    /// # Errors
    ///
    /// Returns [`Error::InvalidDependency`](crate::Error::InvalidDependency)
    /// for a requirement that does not parse.
    pub fn with_build_deps<I: IntoIterator<Item = S>, S: AsRef<str>>(
        mut self,
        deps: I,
    ) -> Result<Self> {
        self.build_deps = parse_requirements(deps)?;
        Ok(self)
    }

    /// Set run-time requirements.
    ///
    /// # Errors
    ///
    /// See [`RenderedRecipe::with_build_deps`].
    pub fn with_run_deps<I: IntoIterator<Item = S>, S: AsRef<str>>(
        mut self,
        deps: I,
    ) -> Result<Self> {
        self.run_deps = parse_requirements(deps)?;
        Ok(self)
    }

    /// Set test-time requirements.
    ///
    /// # Errors
    ///
    /// See [`RenderedRecipe::with_build_deps`].
    pub fn with_test_deps<I: IntoIterator<Item = S>, S: AsRef<str>>(
        mut self,
        deps: I,
    ) -> Result<Self> {
        self.test_deps = parse_requirements(deps)?;
        Ok(self)
    }

    /// Package name.
    #[must_use]
    pub fn name(&self) -> &str {
        &self.name
    }

    /// Package version.
    #[must_use]
    pub fn version(&self) -> &str {
        &self.version
    }

    /// Build id (build string), unique per variant.
    #[must_use]
    pub fn build_id(&self) -> &str {
        &self.build_id
    }

    /// Whether the recipe is skipped.
    #[must_use]
    pub fn skip(&self) -> bool {
        self.skip
    }

    /// Whether the package is platform-independent.
    #[must_use]
    pub fn is_noarch(&self) -> bool {
        self.noarch
    }

    /// Build-time requirements.
    #[must_use]
    pub fn build_deps(&self) -> &[DependencySpec] {
        &self.build_deps
    }

    /// Run-time requirements.
    #[must_use]
    pub fn run_deps(&self) -> &[DependencySpec] {
        &self.run_deps
    }

    /// Test-time requirements.
    #[must_use]
    pub fn test_deps(&self) -> &[DependencySpec] {
        &self.test_deps
    }

    /// Run and test requirements merged by name; a test requirement replaces
    /// a run requirement on the same package.
    #[must_use]
    pub fn run_test_deps(&self) -> Vec<DependencySpec> {
        let mut merged = self.run_deps.clone();
        for dep in &self.test_deps {
            if let Some(existing) = merged.iter_mut().find(|d| d.name == dep.name) {
                *existing = dep.clone();
            } else {
                merged.push(dep.clone());
            }
        }
        merged
    }

    /// Whether this recipe produces a package satisfying `dep`'s name and version.
    #[must_use]
    pub fn provides(&self, dep: &DependencySpec) -> bool {
        self.name == dep.name && dep.matches_version(&self.version)
    }
}

//! Seams to the outside world.
//!
//! The graph engine never reads recipe files or package indexes itself; it
//! asks a [`RecipeRenderer`] and a [`ChannelResolver`].

use crate::{DependencySpec, Platform, RenderedRecipe, Result, Variant};
use std::path::Path;

/// Turns a recipe directory into concrete package metadata.
pub trait RecipeRenderer {
    /// Render `dir` for `platform` and `variant`.
    ///
    /// Returns `Ok(None)` when `dir` is not a recipe. Must not modify `dir`.
    ///
    /// # Errors
    ///
    /// Returns [`Error::Recipe`](crate::Error::Recipe) when the recipe exists
    /// but cannot be rendered.
    fn render(
        &self,
        dir: &Path,
        variant: &Variant,
        platform: &Platform,
    ) -> Result<Option<RenderedRecipe>>;

    /// Whether `dir` looks like a recipe directory.
    fn recognizes(&self, dir: &Path) -> bool;
}

/// Answers whether a dependency is already installable from a channel.
pub trait ChannelResolver {
    /// Whether some published package satisfies `dep` on `platform`.
    ///
    /// # Errors
    ///
    /// Returns [`Error::Resolver`](crate::Error::Resolver) when the channel
    /// index cannot be consulted.
    fn satisfies(&self, dep: &DependencySpec, platform: &Platform) -> Result<bool>;
}

impl<T: RecipeRenderer + ?Sized> RecipeRenderer for &T {
    fn render(
        &self,
        dir: &Path,
        variant: &Variant,
        platform: &Platform,
    ) -> Result<Option<RenderedRecipe>> {
        (**self).render(dir, variant, platform)
    }

    fn recognizes(&self, dir: &Path) -> bool {
        (**self).recognizes(dir)
    }
}

impl<T: ChannelResolver + ?Sized> ChannelResolver for &T {
    fn satisfies(&self, dep: &DependencySpec, platform: &Platform) -> Result<bool> {
        (**self).satisfies(dep, platform)
    }
}

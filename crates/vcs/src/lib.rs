//! Changed-recipe detection.
//!
//! A [`SourceControl`] backend lists the files touched by a revision range;
//! [`ChangeDetector`] maps those files onto the recipe directories that own
//! them.

mod git;

pub use git::{GitCli, revision_range};

use c3i_core::{RecipeRenderer, Result};
use std::collections::BTreeSet;
use std::path::{Component, Path, PathBuf};
use tracing::{debug, info, instrument};

/// Lists files changed between two revisions.
pub trait SourceControl {
    /// Files changed by `start` (when `stop` is `None`) or by `start..stop`,
    /// relative to `root`.
    ///
    /// # Errors
    ///
    /// Returns [`c3i_core::Error::SourceControl`] when the revisions cannot
    /// be resolved or the backend is unavailable.
    fn changed_files(&self, root: &Path, start: &str, stop: Option<&str>) -> Result<Vec<PathBuf>>;
}

impl<T: SourceControl + ?Sized> SourceControl for &T {
    fn changed_files(&self, root: &Path, start: &str, stop: Option<&str>) -> Result<Vec<PathBuf>> {
        (**self).changed_files(root, start, stop)
    }
}

/// Finds recipe directories touched by a revision range.
#[derive(Debug, Clone)]
pub struct ChangeDetector<S> {
    source_control: S,
}

impl<S: SourceControl> ChangeDetector<S> {
    /// Create a detector over `source_control`.
    pub fn new(source_control: S) -> Self {
        Self { source_control }
    }

    /// Names of the immediate subdirectories of `root` that contain a changed
    /// file and that `renderer` recognizes as recipes.
    ///
    /// Files directly under `root` are ignored.
    ///
    /// # Errors
    ///
    /// Propagates the backend's [`c3i_core::Error::SourceControl`].
    #[instrument(skip(self, renderer), fields(root = %root.display()))]
    pub fn changed_recipes<R: RecipeRenderer + ?Sized>(
        &self,
        root: &Path,
        start: &str,
        stop: Option<&str>,
        renderer: &R,
    ) -> Result<BTreeSet<String>> {
        let files = self.source_control.changed_files(root, start, stop)?;
        let mut recipes = BTreeSet::new();

        for file in &files {
            let Some(top) = top_level_dir(file) else {
                continue;
            };
            if recipes.contains(&top) {
                continue;
            }
            if renderer.recognizes(&root.join(&top)) {
                recipes.insert(top);
            } else {
                debug!(dir = %top, "Changed directory is not a recipe");
            }
        }

        info!(files = files.len(), recipes = recipes.len(), "Detected changed recipes");
        Ok(recipes)
    }
}

fn top_level_dir(file: &Path) -> Option<String> {
    let mut components = file.components().filter(|c| !matches!(c, Component::CurDir));
    let first = components.next()?;
    // a bare file name has no owning directory
    components.next()?;
    match first {
        Component::Normal(name) => Some(name.to_string_lossy().into_owned()),
        _ => None,
    }
}

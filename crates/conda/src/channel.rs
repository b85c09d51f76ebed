//! Local channel lookup through `repodata.json`.

use c3i_core::{ChannelResolver, DependencySpec, Error, Platform, Result};
use rattler_conda_types::{PackageRecord, RepoData};
use std::cell::RefCell;
use std::collections::HashMap;
use std::path::{Path, PathBuf};
use tracing::{debug, instrument};

const REPODATA: &str = "repodata.json";
const NOARCH_SUBDIR: &str = "noarch";

/// Records of one subdir across every channel, grouped by package name.
type Index = HashMap<String, Vec<PackageRecord>>;

/// Answers "is this installable?" from channels laid out on disk.
///
/// Each channel is a directory with one `<subdir>/repodata.json` per platform
/// plus `noarch/repodata.json`. Missing files count as empty.
#[derive(Debug, Default)]
pub struct RepodataResolver {
    channels: Vec<PathBuf>,
    indexes: RefCell<HashMap<String, Index>>,
}

impl RepodataResolver {
    /// Resolve against `channels`, searched in order.
    pub fn new<I, P>(channels: I) -> Self
    where
        I: IntoIterator<Item = P>,
        P: Into<PathBuf>,
    {
        Self {
            channels: channels.into_iter().map(Into::into).collect(),
            indexes: RefCell::new(HashMap::new()),
        }
    }

    /// Configured channel directories.
    #[must_use]
    pub fn channels(&self) -> &[PathBuf] {
        &self.channels
    }

    /// Every record named `name` visible on `platform`.
    ///
    /// # Errors
    ///
    /// See [`ChannelResolver::satisfies`].
    pub fn records(&self, name: &str, platform: &Platform) -> Result<Vec<PackageRecord>> {
        let subdir = platform.subdir();
        self.ensure_index(&subdir, name)?;
        Ok(self
            .indexes
            .borrow()
            .get(&subdir)
            .and_then(|index| index.get(name))
            .cloned()
            .unwrap_or_default())
    }

    fn ensure_index(&self, subdir: &str, dependency: &str) -> Result<()> {
        if self.indexes.borrow().contains_key(subdir) {
            return Ok(());
        }

        let mut index = Index::new();
        for channel in &self.channels {
            for dir in [subdir, NOARCH_SUBDIR] {
                for record in load_repodata(&channel.join(dir).join(REPODATA), dependency)? {
                    index
                        .entry(record.name.as_normalized().to_string())
                        .or_default()
                        .push(record);
                }
            }
        }
        debug!(
            subdir,
            packages = index.len(),
            channels = self.channels.len(),
            "Loaded channel index"
        );
        self.indexes.borrow_mut().insert(subdir.to_string(), index);
        Ok(())
    }
}

fn load_repodata(path: &Path, dependency: &str) -> Result<Vec<PackageRecord>> {
    if !path.is_file() {
        return Ok(Vec::new());
    }
    let text = std::fs::read_to_string(path).map_err(|e| Error::io(e, path, "read repodata"))?;
    let repodata: RepoData = serde_json::from_str(&text).map_err(|e| {
        Error::resolver(dependency, format!("malformed '{}': {e}", path.display()))
    })?;

    let mut records: Vec<(String, PackageRecord)> = repodata
        .packages
        .into_iter()
        .chain(repodata.conda_packages)
        .collect();
    records.sort_by(|a, b| a.0.cmp(&b.0));
    Ok(records.into_iter().map(|(_, record)| record).collect())
}

impl ChannelResolver for RepodataResolver {
    #[instrument(skip_all, fields(dependency = %dep, subdir = %platform.subdir()))]
    fn satisfies(&self, dep: &DependencySpec, platform: &Platform) -> Result<bool> {
        let subdir = platform.subdir();
        self.ensure_index(&subdir, &dep.to_string())?;

        let indexes = self.indexes.borrow();
        let found = indexes
            .get(&subdir)
            .and_then(|index| index.get(&dep.name))
            .is_some_and(|records| {
                records.iter().any(|r| {
                    dep.matches_version(&r.version.to_string()) && dep.matches_build(&r.build)
                })
            });
        debug!(found, "Checked channels");
        Ok(found)
    }
}

//! Build platforms.
//!
//! Each platform is described by one YAML file in the platforms directory:
//!
//! ```yaml
//! label: centos5-64
//! platform: linux
//! arch: 64
//! variants:
//!   python: [3.6]
//! worker_tags: [linux-large]
//! ```

use crate::{Error, Result, scalar};
use indexmap::IndexMap;
use serde::{Deserialize, Serialize};
use std::fmt;
use std::path::{Path, PathBuf};
use tracing::{debug, info};

/// Where a build executes.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Platform {
    /// Platform family (`linux`, `osx`, `win`, ...)
    #[serde(rename = "platform")]
    pub family: String,

    /// Architecture (`64`, `32`, `ppc64le`, ...)
    #[serde(deserialize_with = "scalar::string")]
    pub arch: String,

    /// Label used in node keys
    pub label: String,

    /// Variant values that replace the global matrix on this platform
    #[serde(
        default,
        deserialize_with = "scalar::string_list_map",
        skip_serializing_if = "IndexMap::is_empty"
    )]
    pub variants: IndexMap<String, Vec<String>>,

    /// Commands run before each build on this platform
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub prefix_commands: Vec<String>,

    /// Commands run after each build on this platform
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub suffix_commands: Vec<String>,

    /// Tags selecting CI workers
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub worker_tags: Vec<String>,

    /// Opaque worker connection settings, passed through to the plan
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub connector: Option<serde_yaml::Value>,
}

impl Platform {
    /// Create a platform without overrides, commands or tags.
    pub fn new(
        family: impl Into<String>,
        arch: impl Into<String>,
        label: impl Into<String>,
    ) -> Self {
        Self {
            family: family.into(),
            arch: arch.into(),
            label: label.into(),
            variants: IndexMap::new(),
            prefix_commands: Vec::new(),
            suffix_commands: Vec::new(),
            worker_tags: Vec::new(),
            connector: None,
        }
    }

    /// Package subdir for this platform, e.g. `linux-64`.
    #[must_use]
    pub fn subdir(&self) -> String {
        format!("{}-{}", self.family, self.arch)
    }

    /// Add a variant override.
    #[must_use]
    pub fn with_variant(mut self, key: impl Into<String>, values: Vec<String>) -> Self {
        self.variants.insert(key.into(), values);
        self
    }

    /// Add worker tags.
    #[must_use]
    pub fn with_worker_tags(mut self, tags: Vec<String>) -> Self {
        self.worker_tags = tags;
        self
    }
}

impl fmt::Display for Platform {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{} ({})", self.label, self.subdir())
    }
}

/// Load every platform file in `dir`, keeping those whose file stem matches
/// one of `filters` (glob syntax). An empty filter list keeps everything.
///
/// Files are read in file-name order; only `.yml` and `.yaml` files count.
///
/// # Errors
///
/// Returns [`Error::Config`] for a missing directory or invalid filter,
/// [`Error::Io`] for unreadable files and [`Error::Parse`] for malformed ones.
pub fn load_platforms(dir: &Path, filters: &[String]) -> Result<Vec<Platform>> {
    if !dir.is_dir() {
        return Err(Error::config(format!(
            "platform directory '{}' does not exist",
            dir.display()
        )));
    }

    let patterns = filters
        .iter()
        .map(|f| {
            glob::Pattern::new(f)
                .map_err(|e| Error::config(format!("invalid platform filter '{f}': {e}")))
        })
        .collect::<Result<Vec<_>>>()?;

    let entries = std::fs::read_dir(dir).map_err(|e| Error::io(e, dir, "list"))?;
    let mut files: Vec<PathBuf> = Vec::new();
    for entry in entries {
        let path = entry.map_err(|e| Error::io(e, dir, "list"))?.path();
        let is_yaml = path
            .extension()
            .and_then(|e| e.to_str())
            .is_some_and(|e| e == "yml" || e == "yaml");
        if is_yaml && path.is_file() {
            files.push(path);
        }
    }
    files.sort();

    let mut platforms = Vec::new();
    for path in files {
        let stem = path
            .file_stem()
            .and_then(|s| s.to_str())
            .unwrap_or_default();
        if !patterns.is_empty() && !patterns.iter().any(|p| p.matches(stem)) {
            debug!(file = %path.display(), "Platform filtered out");
            continue;
        }
        let content = std::fs::read_to_string(&path).map_err(|e| Error::io(e, &path, "read"))?;
        let platform: Platform =
            serde_yaml::from_str(&content).map_err(|e| Error::parse(&path, e.to_string()))?;
        debug!(platform = %platform, file = %path.display(), "Loaded platform");
        platforms.push(platform);
    }

    info!(count = platforms.len(), dir = %dir.display(), "Loaded build platforms");
    Ok(platforms)
}

//! The plan document handed to pipeline emitters.

use c3i_core::{Result, Variant};
use c3i_engine::{BuildGraph, NodeKind, order};
use serde::Serialize;
use std::collections::HashMap;
use std::path::PathBuf;

/// Every task of a build graph, dependencies first.
#[derive(Debug, Serialize)]
pub struct PlanDocument {
    pub tasks: Vec<PlannedTask>,
}

#[derive(Debug, Serialize)]
pub struct PlannedTask {
    pub key: String,
    pub kind: NodeKind,
    pub package: String,
    pub version: String,
    pub build_id: String,
    pub platform: PlatformRef,
    #[serde(skip_serializing_if = "Variant::is_empty")]
    pub variant: Variant,
    pub recipe_dir: PathBuf,
    /// Depth in the graph; tasks on one level can run in parallel
    pub level: usize,
    #[serde(skip_serializing_if = "Vec::is_empty")]
    pub depends_on: Vec<String>,
    #[serde(skip_serializing_if = "Vec::is_empty")]
    pub worker_tags: Vec<String>,
    #[serde(skip_serializing_if = "Vec::is_empty")]
    pub prefix_commands: Vec<String>,
    #[serde(skip_serializing_if = "Vec::is_empty")]
    pub suffix_commands: Vec<String>,
}

#[derive(Debug, Serialize)]
pub struct PlatformRef {
    pub label: String,
    pub subdir: String,
}

impl PlanDocument {
    /// Lay out `graph` in execution order.
    pub fn from_graph(graph: &BuildGraph) -> Result<Self> {
        let levels: HashMap<String, usize> = graph
            .levels()?
            .into_iter()
            .enumerate()
            .flat_map(|(level, nodes)| nodes.into_iter().map(move |n| (n.key.to_string(), level)))
            .collect();

        let tasks = order(graph)?
            .into_iter()
            .map(|node| {
                let key = node.key.to_string();
                PlannedTask {
                    level: levels.get(&key).copied().unwrap_or_default(),
                    depends_on: graph
                        .dependencies(&key)
                        .into_iter()
                        .map(str::to_string)
                        .collect(),
                    key,
                    kind: node.kind,
                    package: node.recipe.name().to_string(),
                    version: node.recipe.version().to_string(),
                    build_id: node.recipe.build_id().to_string(),
                    platform: PlatformRef {
                        subdir: node.platform.subdir(),
                        label: node.platform.label,
                    },
                    variant: node.variant,
                    recipe_dir: node.recipe_dir,
                    worker_tags: node.platform.worker_tags,
                    prefix_commands: node.platform.prefix_commands,
                    suffix_commands: node.platform.suffix_commands,
                }
            })
            .collect();

        Ok(Self { tasks })
    }

    /// Render as YAML.
    pub fn to_yaml(&self) -> miette::Result<String> {
        serde_yaml::to_string(self).map_err(|e| miette::miette!("Failed to serialize plan: {e}"))
    }
}

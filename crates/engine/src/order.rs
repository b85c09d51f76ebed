//! Final ordering.

use crate::graph::BuildGraph;
use crate::node::BuildNode;
use c3i_core::Result;
use tracing::{debug, instrument};

/// Nodes of `graph`, dependencies first, ties broken by key.
///
/// # Errors
///
/// [`c3i_core::Error::CycleDetected`] listing one cycle, starting from the
/// smallest key that cannot be ordered.
#[instrument(skip_all, fields(nodes = graph.len()))]
pub fn order(graph: &BuildGraph) -> Result<Vec<BuildNode>> {
    let ordered: Vec<BuildNode> = graph.order()?.into_iter().cloned().collect();
    debug!(count = ordered.len(), "Ordered build graph");
    Ok(ordered)
}

//! Keyed DAG algorithms for c3i.
//!
//! This crate provides a directed acyclic graph of named tasks on top of
//! petgraph. Tasks keep their insertion order, dependency edges are explicit,
//! and every ordering it produces is deterministic: ties are broken by task
//! name.
//!
//! # Key Types
//!
//! - [`TaskGraph`]: The graph structure for building and querying task dependencies
//! - [`GraphNode`]: A node in the graph containing the task name and data
//!
//! # Example
//!
//! ```
//! use c3i_task_graph::TaskGraph;
//!
//! let mut graph = TaskGraph::new();
//! graph.add_task("zlib", ());
//! graph.add_task("libpng", ());
//! graph.add_dependency("libpng", "zlib").unwrap();
//!
//! let order: Vec<&str> = graph
//!     .topological_sort()
//!     .unwrap()
//!     .iter()
//!     .map(|n| n.name.as_str())
//!     .collect();
//! assert_eq!(order, ["zlib", "libpng"]);
//! ```

mod error;
mod graph;
mod traversal;

pub use error::{Error, Result};
pub use graph::{GraphNode, TaskGraph};
pub use traversal::{ParallelGroups, TopologicalOrder};

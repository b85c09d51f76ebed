//! Build-graph engine for c3i.
//!
//! Turns a set of changed recipes into an ordered DAG of build and test
//! tasks:
//!
//! 1. [`GraphBuilder`] renders each seed recipe for every variant on a
//!    platform and pulls in upstream recipes for dependencies no channel
//!    provides.
//! 2. [`DownstreamExpander`] adds the packages that depend on what is being
//!    rebuilt.
//! 3. [`NoarchCollapser`] keeps one build per noarch package and turns the
//!    other platforms into test-only tasks.
//! 4. [`order`] sorts the result, dependencies first.
//!
//! [`Planner`] runs all of it across platforms.

mod builder;
mod expand;
mod graph;
mod key;
mod node;
mod noarch;
mod order;
mod plan;

pub use builder::GraphBuilder;
pub use expand::{DownstreamExpander, ExpandOptions};
pub use graph::{BuildGraph, NodeAttributes};
pub use key::{NodeKey, NodeKind};
pub use node::BuildNode;
pub use noarch::{DEFAULT_BUILD_SUBDIR, NoarchCollapser};
pub use order::order;
pub use plan::{PlanRequest, Planner};

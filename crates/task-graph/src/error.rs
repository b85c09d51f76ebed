//! Error types for task graph operations.

use std::fmt;

/// Result type for task graph operations.
pub type Result<T> = std::result::Result<T, Error>;

/// Errors that can occur during task graph operations.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Error {
    /// A dependency cycle was detected in the graph.
    CycleDetected {
        /// One cycle as consecutive `(dependent, dependency)` edges.
        edges: Vec<(String, String)>,
    },

    /// A task named in an operation is not in the graph.
    MissingTask {
        /// Name of the missing task.
        name: String,
    },

    /// A task depends on another task that doesn't exist.
    MissingDependency {
        /// The task that has the missing dependency.
        task: String,
        /// The name of the missing dependency.
        dependency: String,
    },

    /// A task was made to depend on itself.
    SelfDependency {
        /// The offending task.
        task: String,
    },
}

impl fmt::Display for Error {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::CycleDetected { edges } => {
                let list = edges
                    .iter()
                    .map(|(from, to)| format!("{from} -> {to}"))
                    .collect::<Vec<_>>()
                    .join(", ");
                write!(f, "Cycle detected in task graph: {list}")
            }
            Self::MissingTask { name } => write!(f, "Task '{name}' is not in the graph"),
            Self::MissingDependency { task, dependency } => {
                write!(f, "Task '{task}' depends on missing task '{dependency}'")
            }
            Self::SelfDependency { task } => write!(f, "Task '{task}' depends on itself"),
        }
    }
}

impl std::error::Error for Error {}

//! Error types for the c3i build-graph engine.
//!
//! Every failure the engine can report is one flat [`Error`] kind. Nothing is
//! recovered internally: an error aborts the current operation and the caller
//! decides whether to surface, log or retry.

use miette::Diagnostic;
use std::path::{Path, PathBuf};
use thiserror::Error;

/// Main error type for c3i operations
#[derive(Error, Debug, Diagnostic)]
pub enum Error {
    /// Revision-range resolution failed
    #[error("Source control error: {message}")]
    #[diagnostic(
        code(c3i::vcs::failed),
        help("Pass an explicit folder list if the recipe root is not a git checkout")
    )]
    SourceControl {
        /// What went wrong, usually git's stderr
        message: String,
    },

    /// Recipe rendering failed
    #[error("Failed to render recipe '{}': {message}", path.display())]
    #[diagnostic(code(c3i::recipe::render))]
    Recipe {
        /// Recipe directory that was being rendered
        path: PathBuf,
        /// Renderer message
        message: String,
    },

    /// A requirement string is not a valid match spec
    #[error("Invalid requirement '{requirement}': {message}")]
    #[diagnostic(
        code(c3i::recipe::requirement),
        help("Requirements are conda match specs such as 'numpy >=1.11,<2' or 'python>=3.8'")
    )]
    InvalidDependency {
        /// The requirement as written
        requirement: String,
        /// Parser message
        message: String,
    },

    /// Channel resolver failed
    #[error("Channel resolver failed for '{dependency}': {message}")]
    #[diagnostic(code(c3i::resolver::failed))]
    Resolver {
        /// Dependency specification that was being checked
        dependency: String,
        /// Resolver message
        message: String,
    },

    /// A dependency is neither installable nor buildable
    #[error("Dependency '{dependency}' of '{node}' is not installable and no recipe can build it")]
    #[diagnostic(
        code(c3i::graph::unresolvable),
        help("Add a recipe directory named after the package or a channel that provides it")
    )]
    UnresolvableDependency {
        /// The dependency specification
        dependency: String,
        /// Key of the node that needs it
        node: String,
    },

    /// A noarch package has no build candidate on the designated platform
    #[error("Noarch package '{package}' has no build node on '{build_subdir}'")]
    #[diagnostic(code(c3i::noarch::no_builder))]
    NoarchWithoutBuilder {
        /// Package name
        package: String,
        /// Platform subdir designated for noarch builds
        build_subdir: String,
    },

    /// The graph contains a cycle
    #[error("Cycle detected in build graph: {}", format_edges(edges))]
    #[diagnostic(code(c3i::graph::cycle))]
    CycleDetected {
        /// One offending cycle as consecutive `(from, to)` edges
        edges: Vec<(String, String)>,
    },

    /// Caller-supplied parameters violate the contract
    #[error("Configuration error: {message}")]
    #[diagnostic(code(c3i::config::invalid))]
    Config {
        /// Description of the problem
        message: String,
    },

    /// The graph builder produced no nodes
    #[error("Nothing to do: the build graph is empty")]
    #[diagnostic(
        code(c3i::graph::empty),
        help("Check the revision range or pass --folders explicitly")
    )]
    EmptyGraph,

    /// I/O error with path context
    #[error("I/O error during {operation} of '{}': {source}", path.display())]
    #[diagnostic(code(c3i::io::error))]
    Io {
        /// The underlying I/O error
        #[source]
        source: std::io::Error,
        /// Path the operation touched
        path: PathBuf,
        /// Description of the operation that failed
        operation: String,
    },

    /// A configuration file could not be parsed
    #[error("Failed to parse '{}': {message}", path.display())]
    #[diagnostic(code(c3i::config::parse))]
    Parse {
        /// File that failed to parse
        path: PathBuf,
        /// Parser message
        message: String,
    },
}

fn format_edges(edges: &[(String, String)]) -> String {
    edges
        .iter()
        .map(|(from, to)| format!("{from} -> {to}"))
        .collect::<Vec<_>>()
        .join(", ")
}

impl Error {
    /// Create a source control error
    pub fn source_control(message: impl Into<String>) -> Self {
        Self::SourceControl {
            message: message.into(),
        }
    }

    /// Create a recipe rendering error
    pub fn recipe(path: impl Into<PathBuf>, message: impl Into<String>) -> Self {
        Self::Recipe {
            path: path.into(),
            message: message.into(),
        }
    }

    /// Create an invalid requirement error
    pub fn invalid_dependency(requirement: impl Into<String>, message: impl Into<String>) -> Self {
        Self::InvalidDependency {
            requirement: requirement.into(),
            message: message.into(),
        }
    }

    /// Create a channel resolver error
    pub fn resolver(dependency: impl Into<String>, message: impl Into<String>) -> Self {
        Self::Resolver {
            dependency: dependency.into(),
            message: message.into(),
        }
    }

    /// Create an unresolvable dependency error
    pub fn unresolvable(dependency: impl Into<String>, node: impl Into<String>) -> Self {
        Self::UnresolvableDependency {
            dependency: dependency.into(),
            node: node.into(),
        }
    }

    /// Create a noarch-without-builder error
    pub fn noarch_without_builder(
        package: impl Into<String>,
        build_subdir: impl Into<String>,
    ) -> Self {
        Self::NoarchWithoutBuilder {
            package: package.into(),
            build_subdir: build_subdir.into(),
        }
    }

    /// Create a cycle error from a list of edges
    pub fn cycle(edges: Vec<(String, String)>) -> Self {
        Self::CycleDetected { edges }
    }

    /// Create a configuration error
    pub fn config(message: impl Into<String>) -> Self {
        Self::Config {
            message: message.into(),
        }
    }

    /// Create an I/O error with context
    pub fn io(
        source: std::io::Error,
        path: impl AsRef<Path>,
        operation: impl Into<String>,
    ) -> Self {
        Self::Io {
            source,
            path: path.as_ref().to_path_buf(),
            operation: operation.into(),
        }
    }

    /// Create a parse error
    pub fn parse(path: impl AsRef<Path>, message: impl Into<String>) -> Self {
        Self::Parse {
            path: path.as_ref().to_path_buf(),
            message: message.into(),
        }
    }
}

/// Result type for c3i operations
pub type Result<T> = std::result::Result<T, Error>;

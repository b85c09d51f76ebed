//! Task graph storage using petgraph.
//!
//! Nodes are addressed by name and remembered in insertion order. Edges run
//! from a dependency to its dependent, so a task becomes ready once every
//! incoming edge has been satisfied.

use crate::{Error, Result};
use indexmap::IndexMap;
use petgraph::Direction;
use petgraph::algo::is_cyclic_directed;
use petgraph::stable_graph::{NodeIndex, StableDiGraph};
use tracing::debug;

/// A node in the task graph.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct GraphNode<T> {
    /// Name of the task.
    pub name: String,
    /// The task data.
    pub task: T,
}

/// Task graph for dependency resolution and execution ordering.
#[derive(Debug, Clone)]
pub struct TaskGraph<T> {
    /// The directed graph of tasks, edges point dependency -> dependent.
    pub(crate) graph: StableDiGraph<GraphNode<T>, ()>,
    /// Map from task names to node indices, in insertion order.
    pub(crate) name_to_node: IndexMap<String, NodeIndex>,
}

impl<T> TaskGraph<T> {
    /// Create a new empty task graph.
    #[must_use]
    pub fn new() -> Self {
        Self {
            graph: StableDiGraph::new(),
            name_to_node: IndexMap::new(),
        }
    }

    /// Add a single task to the graph.
    ///
    /// If a task with the same name already exists, the graph is left
    /// unchanged and the existing node index is returned.
    pub fn add_task(&mut self, name: &str, task: T) -> NodeIndex {
        if let Some(&node) = self.name_to_node.get(name) {
            return node;
        }

        let node_index = self.graph.add_node(GraphNode {
            name: name.to_string(),
            task,
        });
        self.name_to_node.insert(name.to_string(), node_index);
        debug!(task = name, "Added task node");
        node_index
    }

    /// Remove a task and every edge touching it, returning its data.
    pub fn remove_task(&mut self, name: &str) -> Option<T> {
        let index = self.name_to_node.shift_remove(name)?;
        self.graph.remove_node(index).map(|node| node.task)
    }

    /// Record that `task` depends on `dependency`.
    ///
    /// Returns `false` when the edge already existed.
    ///
    /// # Errors
    ///
    /// Fails when either task is missing or when `task == dependency`.
    pub fn add_dependency(&mut self, task: &str, dependency: &str) -> Result<bool> {
        if task == dependency {
            return Err(Error::SelfDependency {
                task: task.to_string(),
            });
        }
        let to = self.index_of(task)?;
        let from = self
            .name_to_node
            .get(dependency)
            .copied()
            .ok_or_else(|| Error::MissingDependency {
                task: task.to_string(),
                dependency: dependency.to_string(),
            })?;

        if self.graph.find_edge(from, to).is_some() {
            return Ok(false);
        }
        self.graph.add_edge(from, to, ());
        Ok(true)
    }

    /// Drop the edge `task -> dependency`, returning whether it existed.
    pub fn remove_dependency(&mut self, task: &str, dependency: &str) -> bool {
        let (Some(&to), Some(&from)) = (
            self.name_to_node.get(task),
            self.name_to_node.get(dependency),
        ) else {
            return false;
        };
        self.graph
            .find_edge(from, to)
            .and_then(|edge| self.graph.remove_edge(edge))
            .is_some()
    }

    /// Names of the tasks `name` depends on, sorted.
    #[must_use]
    pub fn dependencies(&self, name: &str) -> Vec<&str> {
        self.neighbors(name, Direction::Incoming)
    }

    /// Names of the tasks that depend on `name`, sorted.
    #[must_use]
    pub fn dependents(&self, name: &str) -> Vec<&str> {
        self.neighbors(name, Direction::Outgoing)
    }

    fn neighbors(&self, name: &str, direction: Direction) -> Vec<&str> {
        let Some(&index) = self.name_to_node.get(name) else {
            return Vec::new();
        };
        let mut names: Vec<&str> = self
            .graph
            .neighbors_directed(index, direction)
            .map(|n| self.graph[n].name.as_str())
            .collect();
        names.sort_unstable();
        names
    }

    /// Every edge as a `(dependent, dependency)` name pair, sorted.
    #[must_use]
    pub fn edges(&self) -> Vec<(&str, &str)> {
        let mut edges: Vec<(&str, &str)> = self
            .graph
            .edge_indices()
            .filter_map(|e| self.graph.edge_endpoints(e))
            .map(|(from, to)| (self.graph[to].name.as_str(), self.graph[from].name.as_str()))
            .collect();
        edges.sort_unstable();
        edges
    }

    /// Add every task and edge of `other` that is not already present.
    ///
    /// Returns the number of tasks added. Existing tasks keep their data.
    ///
    /// # Errors
    ///
    /// Propagates edge insertion failures, which a well-formed `other` never
    /// produces.
    pub fn merge(&mut self, other: &Self) -> Result<usize>
    where
        T: Clone,
    {
        let mut added = 0;
        for node in other.iter_nodes() {
            if !self.contains_task(&node.name) {
                self.add_task(&node.name, node.task.clone());
                added += 1;
            }
        }
        for (task, dependency) in other.edges() {
            self.add_dependency(task, dependency)?;
        }
        Ok(added)
    }

    /// Check if the graph has cycles.
    #[must_use]
    pub fn has_cycles(&self) -> bool {
        is_cyclic_directed(&self.graph)
    }

    /// Get the number of tasks in the graph.
    #[must_use]
    pub fn task_count(&self) -> usize {
        self.name_to_node.len()
    }

    /// Get the number of edges in the graph.
    #[must_use]
    pub fn edge_count(&self) -> usize {
        self.graph.edge_count()
    }

    /// Whether the graph holds no tasks.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.name_to_node.is_empty()
    }

    /// Check if a task exists in the graph.
    #[must_use]
    pub fn contains_task(&self, name: &str) -> bool {
        self.name_to_node.contains_key(name)
    }

    /// Get a reference to a task node by name.
    #[must_use]
    pub fn get_node_by_name(&self, name: &str) -> Option<&GraphNode<T>> {
        self.name_to_node
            .get(name)
            .and_then(|&idx| self.graph.node_weight(idx))
    }

    /// Get a mutable reference to a task's data by name.
    pub fn get_task_mut(&mut self, name: &str) -> Option<&mut T> {
        let idx = *self.name_to_node.get(name)?;
        self.graph.node_weight_mut(idx).map(|node| &mut node.task)
    }

    /// Iterate over all nodes in insertion order.
    pub fn iter_nodes(&self) -> impl Iterator<Item = &GraphNode<T>> {
        self.name_to_node.values().map(|&idx| &self.graph[idx])
    }

    /// Task names in insertion order.
    pub fn task_names(&self) -> impl Iterator<Item = &str> {
        self.name_to_node.keys().map(String::as_str)
    }

    pub(crate) fn index_of(&self, name: &str) -> Result<NodeIndex> {
        self.name_to_node
            .get(name)
            .copied()
            .ok_or_else(|| Error::MissingTask {
                name: name.to_string(),
            })
    }
}

impl<T> Default for TaskGraph<T> {
    fn default() -> Self {
        Self::new()
    }
}

//! Traversal algorithms for task graphs.
//!
//! Ordering is Kahn's algorithm with a name-sorted ready set, so the same
//! graph always yields the same sequence regardless of insertion order.

use crate::{Error, GraphNode, Result, TaskGraph};
use petgraph::Direction;
use petgraph::stable_graph::NodeIndex;
use std::collections::{BTreeSet, HashMap, HashSet};

/// A topologically sorted sequence of task nodes.
///
/// All dependencies come before the tasks that depend on them.
pub type TopologicalOrder<'a, T> = Vec<&'a GraphNode<T>>;

/// Groups of tasks that can execute in parallel.
///
/// Each inner vector contains tasks that have no dependencies on each other.
/// The outer vector is ordered by dependency level: every task in group N
/// depends only on tasks in groups before N.
pub type ParallelGroups<'a, T> = Vec<Vec<&'a GraphNode<T>>>;

impl<T> TaskGraph<T> {
    /// Get topologically sorted list of tasks, ties broken by name.
    ///
    /// # Errors
    ///
    /// Returns [`Error::CycleDetected`] listing one cycle if the graph is cyclic.
    pub fn topological_sort(&self) -> Result<TopologicalOrder<'_, T>> {
        let (order, blocked) = self.kahn();
        if !blocked.is_empty() {
            return Err(Error::CycleDetected {
                edges: self.cycle_through(&blocked),
            });
        }
        Ok(order.into_iter().map(|idx| &self.graph[idx]).collect())
    }

    /// Get the tasks grouped by dependency level, each group sorted by name.
    ///
    /// # Errors
    ///
    /// Returns [`Error::CycleDetected`] if the graph is cyclic.
    pub fn get_parallel_groups(&self) -> Result<ParallelGroups<'_, T>> {
        let sorted = self.topological_sort()?;

        let mut groups: ParallelGroups<'_, T> = Vec::new();
        let mut levels: HashMap<&str, usize> = HashMap::new();

        for node in sorted {
            let level = self
                .dependencies(&node.name)
                .into_iter()
                .filter_map(|dep| levels.get(dep).map(|l| l + 1))
                .max()
                .unwrap_or(0);
            if level >= groups.len() {
                groups.resize_with(level + 1, Vec::new);
            }
            groups[level].push(node);
            levels.insert(node.name.as_str(), level);
        }

        for group in &mut groups {
            group.sort_by(|a, b| a.name.cmp(&b.name));
        }
        Ok(groups)
    }

    /// One cycle of the graph as `(dependent, dependency)` edges, if any.
    ///
    /// The walk starts at the smallest task name that cannot be ordered and
    /// always follows the smallest unordered dependency.
    #[must_use]
    pub fn find_cycle(&self) -> Option<Vec<(String, String)>> {
        let (_, blocked) = self.kahn();
        (!blocked.is_empty()).then(|| self.cycle_through(&blocked))
    }

    /// Kahn's algorithm: the ordered prefix and the nodes left blocked.
    fn kahn(&self) -> (Vec<NodeIndex>, HashSet<NodeIndex>) {
        let mut pending: HashMap<NodeIndex, usize> = self
            .name_to_node
            .values()
            .map(|&idx| {
                let count = self
                    .graph
                    .neighbors_directed(idx, Direction::Incoming)
                    .count();
                (idx, count)
            })
            .collect();

        let mut ready: BTreeSet<(&str, NodeIndex)> = pending
            .iter()
            .filter(|&(_, &count)| count == 0)
            .map(|(&idx, _)| (self.graph[idx].name.as_str(), idx))
            .collect();

        let mut order = Vec::with_capacity(pending.len());
        while let Some((_, idx)) = ready.pop_first() {
            pending.remove(&idx);
            order.push(idx);
            for dependent in self.graph.neighbors_directed(idx, Direction::Outgoing) {
                if let Some(count) = pending.get_mut(&dependent) {
                    *count -= 1;
                    if *count == 0 {
                        ready.insert((self.graph[dependent].name.as_str(), dependent));
                    }
                }
            }
        }

        (order, pending.into_keys().collect())
    }

    /// Walk smallest-first through `blocked` until a node repeats.
    ///
    /// Every blocked node has at least one blocked dependency, so the walk
    /// always closes a loop.
    fn cycle_through(&self, blocked: &HashSet<NodeIndex>) -> Vec<(String, String)> {
        let name = |idx: &NodeIndex| self.graph[*idx].name.as_str();

        let Some(start) = blocked.iter().copied().min_by(|a, b| name(a).cmp(name(b))) else {
            return Vec::new();
        };
        let mut path = vec![start];
        let mut position: HashMap<NodeIndex, usize> = HashMap::from([(start, 0)]);
        let mut current = start;

        while let Some(next) = self
            .graph
            .neighbors_directed(current, Direction::Incoming)
            .filter(|dep| blocked.contains(dep))
            .min_by(|a, b| name(a).cmp(name(b)))
        {
            if let Some(&pos) = position.get(&next) {
                let mut cycle: Vec<(String, String)> = path[pos..]
                    .windows(2)
                    .map(|pair| (name(&pair[0]).to_string(), name(&pair[1]).to_string()))
                    .collect();
                cycle.push((name(&current).to_string(), name(&next).to_string()));
                return cycle;
            }
            position.insert(next, path.len());
            path.push(next);
            current = next;
        }
        Vec::new()
    }
}

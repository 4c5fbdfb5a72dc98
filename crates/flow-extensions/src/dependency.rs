//! Dependency references and the dependency graph between extensions.
//!
//! Edges point from dependent to dependency: if A depends on B, the edge is
//! `A -> B`. Unlike a build graph, extension graphs may legitimately contain
//! cycles, so the graph answers reachability questions instead of producing
//! an ordering.
//!
//! # Example
//!
//! ```
//! use flow_extensions::dependency::DependencyGraph;
//!
//! let mut graph = DependencyGraph::new();
//! graph.add_edge("acme:viewer", "acme:io");
//! graph.add_edge("acme:io", "org.flow:core");
//!
//! let deps = graph.all_dependencies_of("acme:viewer");
//! assert!(deps.contains("org.flow:core"));
//! assert!(graph.all_dependents_of("org.flow:core").contains("acme:viewer"));
//! ```

use std::collections::{BTreeMap, BTreeSet};

use serde::{Deserialize, Serialize};

/// Reference to another extension.
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub struct Dependency {
    pub id: String,
    /// Lowest acceptable version of the dependency, if any.
    #[serde(default)]
    pub min_version: Option<String>,
}

impl Dependency {
    pub fn new(id: impl Into<String>) -> Self {
        Self {
            id: id.into(),
            min_version: None,
        }
    }

    pub fn at_least(id: impl Into<String>, version: impl Into<String>) -> Self {
        Self {
            id: id.into(),
            min_version: Some(version.into()),
        }
    }
}

/// Reference to an external repository site an extension relies on.
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub struct SiteDependency {
    pub name: String,
    pub url: String,
}

impl SiteDependency {
    pub fn new(name: impl Into<String>, url: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            url: url.into(),
        }
    }
}

/// Directed graph of extension dependencies. May contain cycles.
#[derive(Debug, Clone, Default)]
pub struct DependencyGraph {
    /// Adjacency list: key depends on each value.
    edges: BTreeMap<String, BTreeSet<String>>,
}

impl DependencyGraph {
    /// Create an empty dependency graph.
    pub fn new() -> Self {
        Self::default()
    }

    /// Build the graph from `(id, dependency ids)` pairs. Dependencies that
    /// are not themselves listed still become nodes.
    pub fn from_extensions<'a, I, D>(extensions: I) -> Self
    where
        I: IntoIterator<Item = (&'a str, D)>,
        D: IntoIterator<Item = &'a str>,
    {
        let mut graph = Self::new();
        for (id, dependencies) in extensions {
            graph.add_node(id);
            for dependency in dependencies {
                graph.add_edge(id, dependency);
            }
        }
        graph
    }

    /// Add a node without edges. Existing nodes are left untouched.
    pub fn add_node(&mut self, id: &str) {
        self.edges.entry(id.to_string()).or_default();
    }

    /// Declare that `from` depends on `to`, adding missing nodes.
    pub fn add_edge(&mut self, from: &str, to: &str) {
        self.add_node(to);
        self.edges
            .entry(from.to_string())
            .or_default()
            .insert(to.to_string());
    }

    pub fn contains(&self, id: &str) -> bool {
        self.edges.contains_key(id)
    }

    pub fn node_count(&self) -> usize {
        self.edges.len()
    }

    pub fn edge_count(&self) -> usize {
        self.edges.values().map(BTreeSet::len).sum()
    }

    /// Direct dependencies of `id`.
    pub fn dependencies_of(&self, id: &str) -> Vec<&str> {
        self.edges
            .get(id)
            .map(|deps| deps.iter().map(String::as_str).collect())
            .unwrap_or_default()
    }

    /// Every extension `id` depends on, directly or transitively, excluding
    /// `id` itself.
    pub fn all_dependencies_of(&self, id: &str) -> BTreeSet<String> {
        let mut reached = self.reachable_from(id, |node| {
            self.edges.get(node).into_iter().flatten().cloned().collect()
        });
        reached.remove(id);
        reached
    }

    /// Every extension that depends on `id`, directly or transitively,
    /// excluding `id` itself.
    pub fn all_dependents_of(&self, id: &str) -> BTreeSet<String> {
        let mut reached = self.reachable_from(id, |node| {
            self.edges
                .iter()
                .filter(|(_, deps)| deps.contains(node))
                .map(|(from, _)| from.clone())
                .collect()
        });
        reached.remove(id);
        reached
    }

    /// Nodes that lie on at least one dependency cycle.
    pub fn cycle_participants(&self) -> BTreeSet<String> {
        self.edges
            .keys()
            .filter(|id| {
                self.edges
                    .get(id.as_str())
                    .into_iter()
                    .flatten()
                    .any(|dep| dep == *id || self.all_dependencies_of(dep).contains(id.as_str()))
            })
            .cloned()
            .collect()
    }

    pub fn has_cycles(&self) -> bool {
        !self.cycle_participants().is_empty()
    }

    fn reachable_from<F>(&self, start: &str, next: F) -> BTreeSet<String>
    where
        F: Fn(&str) -> Vec<String>,
    {
        let mut visited = BTreeSet::new();
        let mut stack = vec![start.to_string()];
        while let Some(current) = stack.pop() {
            for neighbour in next(&current) {
                if visited.insert(neighbour.clone()) {
                    stack.push(neighbour);
                }
            }
        }
        visited
    }
}

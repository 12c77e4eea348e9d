use std::collections::{BTreeSet, HashSet};

use serde::Serialize;
use tracing::debug;

use crate::prerequisites::PrerequisiteGraph;

/// Nodes and edges on some path into a focus node.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct Highlight {
    pub node_ids: BTreeSet<String>,
    pub edge_ids: BTreeSet<String>,
}

impl Highlight {
    pub fn is_empty(&self) -> bool {
        self.node_ids.is_empty() && self.edge_ids.is_empty()
    }

    pub fn contains_node(&self, id: &str) -> bool {
        self.node_ids.contains(id)
    }

    pub fn contains_edge(&self, id: &str) -> bool {
        self.edge_ids.contains(id)
    }
}

/// Collects the focus node, every transitive prerequisite of it, and every
/// edge lying on a path from a prerequisite to the focus node.
///
/// Each node is expanded at most once, so cycles and converging paths
/// terminate. A focus node without incoming edges yields just itself.
pub fn find_prerequisite_paths(focus: &str, graph: &PrerequisiteGraph) -> Highlight {
    let mut highlight = Highlight::default();
    highlight.node_ids.insert(focus.to_string());

    let mut visited: HashSet<&str> = HashSet::from([focus]);
    let mut stack: Vec<&str> = vec![focus];

    while let Some(current) = stack.pop() {
        for prereq in graph.prerequisites(current) {
            highlight.node_ids.insert(prereq.clone());
            if let Some(edge_id) = graph.edge_id(prereq, current) {
                highlight.edge_ids.insert(edge_id.to_string());
            }
            if visited.insert(prereq.as_str()) {
                stack.push(prereq.as_str());
            }
        }
    }

    debug!(
        focus,
        nodes = highlight.node_ids.len(),
        edges = highlight.edge_ids.len(),
        "computed prerequisite paths"
    );
    highlight
}

/// Tracks the focused node and the highlight derived from it.
///
/// Each focus change recomputes the highlight from scratch; clearing the
/// focus resets it to empty.
#[derive(Debug, Clone, Default)]
pub struct FocusTracker {
    graph: PrerequisiteGraph,
    focus: Option<String>,
    current: Highlight,
}

impl FocusTracker {
    pub fn new(graph: PrerequisiteGraph) -> Self {
        Self {
            graph,
            focus: None,
            current: Highlight::default(),
        }
    }

    pub fn on_focus_change(&mut self, focus: Option<&str>) -> &Highlight {
        self.focus = focus.map(str::to_string);
        self.current = match focus {
            Some(id) => find_prerequisite_paths(id, &self.graph),
            None => Highlight::default(),
        };
        &self.current
    }

    pub fn focus(&self) -> Option<&str> {
        self.focus.as_deref()
    }

    pub fn highlight(&self) -> &Highlight {
        &self.current
    }

    /// Whether a node should be drawn de-emphasized.
    pub fn is_node_dimmed(&self, id: &str) -> bool {
        self.focus.is_some() && !self.current.contains_node(id)
    }

    pub fn is_edge_dimmed(&self, id: &str) -> bool {
        self.focus.is_some() && !self.current.contains_edge(id)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::graph_parser::parse_graph;
    use pretty_assertions::assert_eq;

    fn graph(input: &str) -> PrerequisiteGraph {
        PrerequisiteGraph::from_diagram(&parse_graph(input))
    }

    fn set(items: &[&str]) -> BTreeSet<String> {
        items.iter().map(|s| s.to_string()).collect()
    }

    #[test]
    fn linear_chain() {
        let h = find_prerequisite_paths("C", &graph("A --> B\nB --> C\n"));
        assert_eq!(h.node_ids, set(&["A", "B", "C"]));
        assert_eq!(h.edge_ids, set(&["A-B", "B-C"]));
    }

    #[test]
    fn descendants_are_not_highlighted() {
        let h = find_prerequisite_paths("B", &graph("A --> B\nB --> C\n"));
        assert_eq!(h.node_ids, set(&["A", "B"]));
        assert_eq!(h.edge_ids, set(&["A-B"]));
    }

    #[test]
    fn self_loop_terminates() {
        let h = find_prerequisite_paths("A", &graph("A --> A\n"));
        assert_eq!(h.node_ids, set(&["A"]));
        assert_eq!(h.edge_ids, set(&["A-A"]));
    }

    #[test]
    fn unknown_focus_yields_only_itself() {
        let h = find_prerequisite_paths("Z", &graph("A --> B\n"));
        assert_eq!(h.node_ids, set(&["Z"]));
        assert!(h.edge_ids.is_empty());
    }

    #[test]
    fn tracker_starts_empty() {
        let tracker = FocusTracker::new(graph("A --> B\n"));
        assert_eq!(tracker.focus(), None);
        assert!(tracker.highlight().is_empty());
        assert!(!tracker.is_node_dimmed("A"));
    }

    #[test]
    fn tracker_recomputes_on_focus_change() {
        let mut tracker = FocusTracker::new(graph("A --> B\nB --> C\nX --> Y\n"));

        let h = tracker.on_focus_change(Some("C")).clone();
        assert_eq!(h.node_ids, set(&["A", "B", "C"]));
        assert!(tracker.is_node_dimmed("X"));
        assert!(!tracker.is_node_dimmed("A"));
        assert!(tracker.is_edge_dimmed("X-Y"));
        assert!(!tracker.is_edge_dimmed("B-C"));

        let h = tracker.on_focus_change(Some("Y")).clone();
        assert_eq!(h.node_ids, set(&["X", "Y"]));
        assert!(tracker.is_node_dimmed("C"));
    }

    #[test]
    fn tracker_clears_on_focus_leave() {
        let mut tracker = FocusTracker::new(graph("A --> B\n"));
        tracker.on_focus_change(Some("B"));
        let h = tracker.on_focus_change(None);
        assert!(h.is_empty());
        assert_eq!(tracker.focus(), None);
        assert!(!tracker.is_edge_dimmed("A-B"));
    }
}

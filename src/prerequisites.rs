use std::collections::HashMap;

use tracing::debug;

use crate::graph_ast::{Diagram, Edge};

/// Reverse-adjacency index over a diagram's edges.
///
/// Maps each node to its direct prerequisites (sources of edges pointing
/// into it), and each `(source, target)` pair to the id of the edge that
/// connects them. Built once per diagram and never edited afterwards.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct PrerequisiteGraph {
    prerequisites: HashMap<String, Vec<String>>,
    // target -> source -> edge id
    edge_ids: HashMap<String, HashMap<String, String>>,
}

impl PrerequisiteGraph {
    pub fn build(edges: &[Edge]) -> Self {
        let mut graph = Self::default();

        for edge in edges {
            graph
                .prerequisites
                .entry(edge.target.clone())
                .or_default()
                .push(edge.source.clone());
            graph
                .edge_ids
                .entry(edge.target.clone())
                .or_default()
                .entry(edge.source.clone())
                .or_insert_with(|| edge.id.clone());
        }

        debug!(
            targets = graph.prerequisites.len(),
            edges = edges.len(),
            "built prerequisite index"
        );
        graph
    }

    pub fn from_diagram(diagram: &Diagram) -> Self {
        Self::build(&diagram.edges)
    }

    /// Direct prerequisites of `id`, in edge declaration order.
    pub fn prerequisites(&self, id: &str) -> &[String] {
        self.prerequisites
            .get(id)
            .map(Vec::as_slice)
            .unwrap_or_default()
    }

    pub fn edge_id(&self, source: &str, target: &str) -> Option<&str> {
        self.edge_ids
            .get(target)?
            .get(source)
            .map(String::as_str)
    }

    pub fn is_empty(&self) -> bool {
        self.prerequisites.is_empty()
    }
}

use std::collections::{HashMap, HashSet};

use tracing::debug;

use crate::graph_ast::Direction;
use crate::layout::{LayoutConfig, LayoutEngine, Point, Positions, Size, SizedNode};

/// Default layout: longest-path ranks laid out one after another along the
/// flow direction, each rank centered across it.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct LayeredLayout {
    pub node_sep: f64,
    pub rank_sep: f64,
}

impl LayeredLayout {
    pub fn new(config: &LayoutConfig) -> Self {
        Self {
            node_sep: config.node_sep,
            rank_sep: config.rank_sep,
        }
    }
}

impl Default for LayeredLayout {
    fn default() -> Self {
        Self::new(&LayoutConfig::default())
    }
}

impl LayoutEngine for LayeredLayout {
    fn layout(
        &self,
        nodes: &[SizedNode<'_>],
        edges: &[(&str, &str)],
        direction: Direction,
    ) -> Positions {
        let ranks = assign_ranks(nodes, edges);
        let max_rank = ranks.values().copied().max().unwrap_or(0);

        let mut ranks_nodes: Vec<Vec<&SizedNode<'_>>> = vec![Vec::new(); max_rank + 1];
        for node in nodes {
            ranks_nodes[ranks[node.id]].push(node);
        }

        let horizontal = direction.is_horizontal();
        // extent along the flow axis / across it
        let along = |size: Size| if horizontal { size.width } else { size.height };
        let across = |size: Size| if horizontal { size.height } else { size.width };

        let rank_depths: Vec<f64> = ranks_nodes
            .iter()
            .map(|rank| rank.iter().map(|n| along(n.size)).fold(0.0, f64::max))
            .collect();
        let rank_breadths: Vec<f64> = ranks_nodes
            .iter()
            .map(|rank| {
                let gaps = rank.len().saturating_sub(1) as f64 * self.node_sep;
                rank.iter().map(|n| across(n.size)).sum::<f64>() + gaps
            })
            .collect();
        let max_breadth = rank_breadths.iter().copied().fold(0.0, f64::max);
        let total_depth = rank_depths.iter().sum::<f64>()
            + max_rank as f64 * self.rank_sep;

        let mut positions = Positions::new();
        let mut rank_start = 0.0;
        for (rank, rank_nodes) in ranks_nodes.iter().enumerate() {
            let flow = rank_start + rank_depths[rank] / 2.0;
            let mut cursor = (max_breadth - rank_breadths[rank]) / 2.0;

            for node in rank_nodes {
                let cross = cursor + across(node.size) / 2.0;
                let point = match direction {
                    Direction::TopDown => Point { x: cross, y: flow },
                    Direction::BottomUp => Point { x: cross, y: total_depth - flow },
                    Direction::LeftRight => Point { x: flow, y: cross },
                    Direction::RightLeft => Point { x: total_depth - flow, y: cross },
                };
                positions.insert(node.id.to_string(), point);
                cursor += across(node.size) + self.node_sep;
            }

            rank_start += rank_depths[rank] + self.rank_sep;
        }

        debug!(nodes = nodes.len(), ranks = max_rank + 1, "laid out diagram");
        positions
    }
}

/// Longest-path rank of every node: 0 for nodes without prerequisites,
/// otherwise one more than the highest-ranked prerequisite.
///
/// Edges closing a cycle are ignored, so every node still gets a rank.
fn assign_ranks<'a>(
    nodes: &[SizedNode<'a>],
    edges: &[(&'a str, &'a str)],
) -> HashMap<&'a str, usize> {
    let mut in_edges: HashMap<&'a str, Vec<&'a str>> = HashMap::new();
    for &(source, target) in edges {
        in_edges.entry(target).or_default().push(source);
    }

    let mut ranks: HashMap<&'a str, usize> = HashMap::new();
    let mut on_path: HashSet<&'a str> = HashSet::new();
    for node in nodes {
        compute_rank(node.id, &in_edges, &mut ranks, &mut on_path);
    }
    ranks
}

fn compute_rank<'a>(
    id: &'a str,
    in_edges: &HashMap<&'a str, Vec<&'a str>>,
    ranks: &mut HashMap<&'a str, usize>,
    on_path: &mut HashSet<&'a str>,
) -> Option<usize> {
    if let Some(&r) = ranks.get(id) {
        return Some(r);
    }
    if !on_path.insert(id) {
        return None;
    }

    let rank = in_edges
        .get(id)
        .into_iter()
        .flatten()
        .filter_map(|&pred| compute_rank(pred, in_edges, ranks, on_path))
        .map(|r| r + 1)
        .max()
        .unwrap_or(0);

    on_path.remove(id);
    ranks.insert(id, rank);
    Some(rank)
}

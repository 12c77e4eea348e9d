use std::collections::HashMap;
use std::path::Path;

use serde::{Deserialize, Serialize};
use tracing::{debug, warn};

use crate::error::{Error, Result};
use crate::graph_ast::{Diagram, Direction, Edge};
use crate::measure::node_size;

#[derive(Debug, Clone, Copy, Default, PartialEq, Serialize)]
pub struct Point {
    pub x: f64,
    pub y: f64,
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Serialize)]
pub struct Size {
    pub width: f64,
    pub height: f64,
}

/// Layout tuning, loadable from TOML. Missing keys keep their defaults.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct LayoutConfig {
    /// Used when the diagram does not declare a direction.
    pub rank_dir: Direction,
    /// Gap between neighbouring nodes of one rank.
    pub node_sep: f64,
    /// Gap between consecutive ranks.
    pub rank_sep: f64,
    pub node_width: f64,
    pub node_height: f64,
    pub char_width: f64,
    pub line_height: f64,
}

impl Default for LayoutConfig {
    fn default() -> Self {
        Self {
            rank_dir: Direction::LeftRight,
            node_sep: 80.0,
            rank_sep: 200.0,
            node_width: 250.0,
            node_height: 80.0,
            char_width: 8.0,
            line_height: 20.0,
        }
    }
}

impl LayoutConfig {
    pub fn from_toml(text: &str) -> Result<Self> {
        Ok(toml::from_str(text)?)
    }

    pub fn load(path: &Path) -> Result<Self> {
        let text = std::fs::read_to_string(path).map_err(|source| Error::Io {
            input: path.display().to_string(),
            source,
        })?;
        Self::from_toml(&text)
    }
}

/// A node as handed to a [`LayoutEngine`]: its id and estimated size.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct SizedNode<'a> {
    pub id: &'a str,
    pub size: Size,
}

/// Center point per node id.
pub type Positions = HashMap<String, Point>;

/// Assigns positions to sized nodes given the edges between them.
///
/// Implementations may be arbitrary layout algorithms; the only contract is
/// one center point per node id they were given.
pub trait LayoutEngine {
    fn layout(
        &self,
        nodes: &[SizedNode<'_>],
        edges: &[(&str, &str)],
        direction: Direction,
    ) -> Positions;
}

/// Everything the rendering layer needs to draw a diagram.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct RenderModel {
    pub direction: Direction,
    pub nodes: Vec<RenderNode>,
    pub edges: Vec<Edge>,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct RenderNode {
    pub id: String,
    pub label: String,
    /// Top-left corner.
    pub position: Point,
    pub width: f64,
    pub height: f64,
}

impl RenderModel {
    pub fn build(diagram: &Diagram, engine: &dyn LayoutEngine, config: &LayoutConfig) -> Self {
        let direction = diagram.direction.unwrap_or(config.rank_dir);
        let sized: Vec<SizedNode<'_>> = diagram
            .nodes
            .iter()
            .map(|n| SizedNode {
                id: &n.id,
                size: node_size(&n.label, config),
            })
            .collect();
        let pairs: Vec<(&str, &str)> = diagram
            .edges
            .iter()
            .map(|e| (e.source.as_str(), e.target.as_str()))
            .collect();

        let positions = engine.layout(&sized, &pairs, direction);

        let nodes = diagram
            .nodes
            .iter()
            .zip(&sized)
            .map(|(node, sized)| {
                let center = positions.get(&node.id).copied().unwrap_or_else(|| {
                    warn!(node = %node.id, "layout engine returned no position");
                    Point {
                        x: sized.size.width / 2.0,
                        y: sized.size.height / 2.0,
                    }
                });
                RenderNode {
                    id: node.id.clone(),
                    label: node.label.clone(),
                    position: Point {
                        x: center.x - sized.size.width / 2.0,
                        y: center.y - sized.size.height / 2.0,
                    },
                    width: sized.size.width,
                    height: sized.size.height,
                }
            })
            .collect::<Vec<_>>();

        debug!(nodes = nodes.len(), ?direction, "built render model");
        Self {
            direction,
            nodes,
            edges: diagram.edges.clone(),
        }
    }

    pub fn node(&self, id: &str) -> Option<&RenderNode> {
        self.nodes.iter().find(|n| n.id == id)
    }
}

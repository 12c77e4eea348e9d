pub mod error;
pub mod graph_ast;
pub mod graph_layout;
pub mod graph_parser;
pub mod highlight;
pub mod layout;
pub mod measure;
pub mod prerequisites;

pub use error::{Error, Result};
pub use graph_ast::{Diagram, Direction, Edge, Node};
pub use graph_layout::LayeredLayout;
pub use graph_parser::parse_graph;
pub use highlight::{FocusTracker, Highlight, find_prerequisite_paths};
pub use layout::{LayoutConfig, LayoutEngine, RenderModel};
pub use prerequisites::PrerequisiteGraph;

pub fn render(input: &str) -> RenderModel {
    render_with_config(input, &LayoutConfig::default())
}

/// Parses `input` and lays it out with the built-in [`LayeredLayout`].
pub fn render_with_config(input: &str, config: &LayoutConfig) -> RenderModel {
    let diagram = parse_graph(input);
    RenderModel::build(&diagram, &LayeredLayout::new(config), config)
}

/// Prerequisite paths into `focus` for a diagram given as text.
pub fn highlight(input: &str, focus: &str) -> Highlight {
    let diagram = parse_graph(input);
    find_prerequisite_paths(focus, &PrerequisiteGraph::from_diagram(&diagram))
}

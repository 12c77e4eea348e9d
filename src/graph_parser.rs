use std::collections::HashSet;

use tracing::{debug, trace};
use winnow::combinator::{alt, delimited, opt};
use winnow::prelude::*;
use winnow::token::{take_till, take_while};

use crate::graph_ast::*;

const ARROW: &str = "-->";
const COMMENT: &str = "%%";
const FRONT_MATTER_FENCE: &str = "---";

/// Parses prerequisite diagram text into a [`Diagram`].
///
/// Parsing is lenient: statements that match no rule are dropped and never
/// reported as errors, so the worst outcome is an empty diagram.
pub fn parse_graph(input: &str) -> Diagram {
    let mut builder = GraphBuilder::default();

    for line in statement_lines(input) {
        let mut rest = line;
        if let Ok(token) = declaration(&mut rest) {
            builder.declare(token);
        } else if let Some((source, targets)) = split_edge(line) {
            builder.edge_statement(line, source, targets);
        } else if let Some(node) = find_labeled_node(line) {
            builder.add_node(node);
        } else {
            trace!(line, "skipping unrecognized statement");
        }
    }

    let diagram = builder.finish();
    debug!(
        nodes = diagram.nodes.len(),
        edges = diagram.edges.len(),
        direction = ?diagram.direction,
        "parsed diagram"
    );
    diagram
}

/// Trimmed, non-empty, non-comment lines with the first front-matter block removed.
fn statement_lines(input: &str) -> Vec<&str> {
    let mut lines: Vec<&str> = input
        .lines()
        .map(str::trim)
        .filter(|line| !line.is_empty() && !line.starts_with(COMMENT))
        .collect();

    if let Some(open) = lines.iter().position(|l| *l == FRONT_MATTER_FENCE) {
        if let Some(len) = lines[open + 1..]
            .iter()
            .position(|l| *l == FRONT_MATTER_FENCE)
        {
            let close = open + 1 + len;
            trace!(lines = close - open + 1, "dropping front matter");
            lines.drain(open..=close);
        }
    }

    lines
}

/// `graph <dir>` or `flowchart <dir>`; yields the direction token.
fn declaration<'s>(input: &mut &'s str) -> winnow::Result<&'s str> {
    alt(("graph", "flowchart")).parse_next(input)?;
    take_while(1.., char::is_whitespace).parse_next(input)?;
    take_till(0.., char::is_whitespace).parse_next(input)
}

/// Splits an edge statement into its source and targets expressions.
///
/// A chained statement (`A --> B --> C`) keeps only the text between the
/// first and second arrows as its targets.
fn split_edge(line: &str) -> Option<(&str, &str)> {
    let (source, rest) = line.split_once(ARROW)?;
    let targets = rest.split_once(ARROW).map_or(rest, |(head, _)| head);
    Some((source.trim(), targets.trim()))
}

#[derive(Debug, Clone, Copy, PartialEq)]
struct NodeRef<'s> {
    id: &'s str,
    label: Option<&'s str>,
}

fn is_identifier_char(c: char) -> bool {
    c.is_ascii_alphanumeric() || c == '_' || c == '-'
}

fn identifier<'s>(input: &mut &'s str) -> winnow::Result<&'s str> {
    take_while(1.., is_identifier_char).parse_next(input)
}

fn bracketed_label<'s>(input: &mut &'s str) -> winnow::Result<&'s str> {
    delimited('[', take_while(1.., |c: char| c != ']'), ']').parse_next(input)
}

fn node_ref<'s>(input: &mut &'s str) -> winnow::Result<NodeRef<'s>> {
    let id = identifier.parse_next(input)?;
    let label = opt(bracketed_label).parse_next(input)?;
    Ok(NodeRef { id, label })
}

fn skip_to_identifier(input: &mut &str) -> winnow::Result<()> {
    take_till(0.., is_identifier_char).void().parse_next(input)
}

/// First node reference anywhere in `text`, label optional.
fn find_node_ref(text: &str) -> Option<NodeRef<'_>> {
    let mut input = text;
    skip_to_identifier(&mut input).ok()?;
    node_ref(&mut input).ok()
}

/// First identifier in `text` that is immediately followed by a `[label]`.
fn find_labeled_node(text: &str) -> Option<NodeRef<'_>> {
    let mut input = text;
    loop {
        skip_to_identifier(&mut input).ok()?;
        let node = node_ref(&mut input).ok()?;
        if node.label.is_some() {
            return Some(node);
        }
    }
}

#[derive(Debug, Default)]
struct GraphBuilder {
    declared: bool,
    direction: Option<Direction>,
    nodes: Vec<Node>,
    known: HashSet<String>,
    edges: Vec<Edge>,
    pairs: HashSet<(String, String)>,
    edge_ids: HashSet<String>,
}

impl GraphBuilder {
    fn declare(&mut self, token: &str) {
        if !self.declared {
            self.declared = true;
            self.direction = Direction::from_token(token);
        }
    }

    /// Registers a node; the first mention fixes its label.
    fn add_node(&mut self, node: NodeRef<'_>) {
        if self.known.insert(node.id.to_string()) {
            self.nodes.push(Node {
                id: node.id.to_string(),
                label: node.label.unwrap_or(node.id).to_string(),
            });
        }
    }

    fn edge_statement(&mut self, line: &str, source: &str, targets: &str) {
        let Some(source) = find_node_ref(source) else {
            trace!(line, "skipping edge statement without a source node");
            return;
        };
        self.add_node(source);

        for part in targets.split('&').map(str::trim) {
            match find_node_ref(part) {
                Some(target) => {
                    self.add_node(target);
                    self.add_edge(source.id, target.id);
                }
                None => trace!(line, part, "skipping unmatched edge target"),
            }
        }
    }

    fn add_edge(&mut self, source: &str, target: &str) {
        if !self.pairs.insert((source.to_string(), target.to_string())) {
            trace!(source, target, "dropping duplicate edge");
            return;
        }

        let base = format!("{source}-{target}");
        let mut id = base.clone();
        let mut n = 2;
        while self.edge_ids.contains(&id) {
            id = format!("{base}~{n}");
            n += 1;
        }
        self.edge_ids.insert(id.clone());

        self.edges.push(Edge {
            id,
            source: source.to_string(),
            target: target.to_string(),
        });
    }

    fn finish(self) -> Diagram {
        Diagram {
            direction: self.direction,
            nodes: self.nodes,
            edges: self.edges,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    fn labels(diagram: &Diagram) -> Vec<(&str, &str)> {
        diagram
            .nodes
            .iter()
            .map(|n| (n.id.as_str(), n.label.as_str()))
            .collect()
    }

    fn edge_ids(diagram: &Diagram) -> Vec<&str> {
        diagram.edges.iter().map(|e| e.id.as_str()).collect()
    }

    #[test]
    fn parse_node_ref_with_label() {
        let mut input = "A[Intro to CS]";
        let n = node_ref(&mut input).unwrap();
        assert_eq!(n.id, "A");
        assert_eq!(n.label, Some("Intro to CS"));
        assert_eq!(input, "");
    }

    #[test]
    fn parse_node_ref_without_label() {
        let mut input = "CS-101 rest";
        let n = node_ref(&mut input).unwrap();
        assert_eq!(n.id, "CS-101");
        assert_eq!(n.label, None);
        assert_eq!(input, " rest");
    }

    #[test]
    fn parse_node_ref_empty_brackets_leave_label_unset() {
        let mut input = "A[]";
        let n = node_ref(&mut input).unwrap();
        assert_eq!(n.label, None);
        assert_eq!(input, "[]");
    }

    #[test]
    fn parse_node_ref_unclosed_bracket_leaves_label_unset() {
        let mut input = "A[Intro";
        let n = node_ref(&mut input).unwrap();
        assert_eq!(n.id, "A");
        assert_eq!(n.label, None);
    }

    #[test]
    fn label_may_contain_open_bracket() {
        let mut input = "A[x [y]";
        let n = node_ref(&mut input).unwrap();
        assert_eq!(n.label, Some("x [y"));
    }

    #[test]
    fn find_node_ref_skips_leading_punctuation() {
        let n = find_node_ref("  (B)").unwrap();
        assert_eq!(n.id, "B");
        assert_eq!(n.label, None);
    }

    #[test]
    fn find_node_ref_none_without_identifier() {
        assert_eq!(find_node_ref(""), None);
        assert_eq!(find_node_ref("[] ()"), None);
    }

    #[test]
    fn find_labeled_node_takes_first_labeled_identifier() {
        let n = find_labeled_node("style B[Label]").unwrap();
        assert_eq!(n.id, "B");
        assert_eq!(n.label, Some("Label"));
    }

    #[test]
    fn find_labeled_node_rejects_plain_identifiers() {
        assert_eq!(find_labeled_node("A"), None);
        assert_eq!(find_labeled_node("classDef foo fill:#fff"), None);
    }

    #[test]
    fn declaration_yields_direction_token() {
        let mut input = "flowchart LR";
        assert_eq!(declaration(&mut input).unwrap(), "LR");
    }

    #[test]
    fn declaration_requires_whitespace_after_keyword() {
        let mut input = "graphite --> B";
        assert!(declaration(&mut input).is_err());
    }

    #[test]
    fn split_edge_at_first_arrow() {
        assert_eq!(split_edge("A --> B & C"), Some(("A", "B & C")));
        assert_eq!(split_edge("A --> B --> C"), Some(("A", "B")));
        assert_eq!(split_edge("A[x]"), None);
    }

    #[test]
    fn statement_lines_drop_comments_and_blanks() {
        let lines = statement_lines("%% header\n\n  A --> B  \n\t%% trailing\n");
        assert_eq!(lines, vec!["A --> B"]);
    }

    #[test]
    fn statement_lines_drop_front_matter_block() {
        let lines = statement_lines("---\ntitle: Courses\n---\nA --> B\n");
        assert_eq!(lines, vec!["A --> B"]);
    }

    #[test]
    fn statement_lines_keep_lone_fence() {
        let lines = statement_lines("---\nA --> B\n");
        assert_eq!(lines, vec!["---", "A --> B"]);
    }

    #[test]
    fn parse_simple_edge() {
        let diagram = parse_graph("graph LR\n    A[Start] --> B[End]\n");
        assert_eq!(diagram.direction, Some(Direction::LeftRight));
        assert_eq!(labels(&diagram), vec![("A", "Start"), ("B", "End")]);
        assert_eq!(edge_ids(&diagram), vec!["A-B"]);
        assert_eq!(diagram.edges[0].source, "A");
        assert_eq!(diagram.edges[0].target, "B");
    }

    #[test]
    fn parse_unknown_direction_leaves_direction_unset() {
        let diagram = parse_graph("flowchart sideways\nA --> B\n");
        assert_eq!(diagram.direction, None);
        assert_eq!(diagram.edges.len(), 1);
    }

    #[test]
    fn first_declaration_fixes_direction() {
        let diagram = parse_graph("graph TD\nA --> B\ngraph LR\n");
        assert_eq!(diagram.direction, Some(Direction::TopDown));
    }

    #[test]
    fn parse_without_declaration() {
        let diagram = parse_graph("A --> B\n");
        assert_eq!(diagram.direction, None);
        assert_eq!(edge_ids(&diagram), vec!["A-B"]);
    }

    #[test]
    fn unlabeled_mention_seeds_identifier_as_label() {
        let diagram = parse_graph("A --> B\nA[Intro]\n");
        assert_eq!(labels(&diagram), vec![("A", "A"), ("B", "B")]);
    }

    #[test]
    fn skip_edge_statement_without_source() {
        let diagram = parse_graph("--> B\n[] --> C\n");
        assert!(diagram.is_empty());
    }

    #[test]
    fn skip_unmatched_fan_out_parts_individually() {
        let diagram = parse_graph("A --> B & [] & C\n");
        assert_eq!(edge_ids(&diagram), vec!["A-B", "A-C"]);
    }

    #[test]
    fn duplicate_pair_is_dropped() {
        let diagram = parse_graph("A --> B\nA --> B\nA --> B & B\n");
        assert_eq!(edge_ids(&diagram), vec!["A-B"]);
    }

    #[test]
    fn colliding_edge_ids_are_disambiguated() {
        let diagram = parse_graph("A-B --> C\nA --> B-C\nA-B-C --> X\n");
        assert_eq!(edge_ids(&diagram), vec!["A-B-C", "A-B-C~2", "A-B-C-X"]);
        assert_eq!(diagram.edges[1].source, "A");
        assert_eq!(diagram.edges[1].target, "B-C");
    }

    #[test]
    fn arrow_without_spaces() {
        let diagram = parse_graph("A-->B\n");
        assert_eq!(edge_ids(&diagram), vec!["A-B"]);
    }
}

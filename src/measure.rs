use unicode_width::UnicodeWidthStr;

use crate::layout::{LayoutConfig, Size};

const BREAK_TAGS: [&str; 3] = ["<br/>", "<br />", "<br>"];
const LABEL_PADDING: f64 = 10.0;

pub fn display_width(s: &str) -> usize {
    UnicodeWidthStr::width(s)
}

/// Splits a label on `<br>`, `<br/>` and `<br />`, ignoring case.
pub fn label_lines(label: &str) -> Vec<&str> {
    let mut lines = Vec::new();
    let mut start = 0;
    let mut cursor = 0;

    while let Some(offset) = label[cursor..].find('<') {
        let at = cursor + offset;
        match break_tag_len(&label[at..]) {
            Some(len) => {
                lines.push(&label[start..at]);
                start = at + len;
                cursor = start;
            }
            None => cursor = at + 1,
        }
    }
    lines.push(&label[start..]);
    lines
}

fn break_tag_len(text: &str) -> Option<usize> {
    BREAK_TAGS
        .iter()
        .find(|tag| {
            text.get(..tag.len())
                .is_some_and(|head| head.eq_ignore_ascii_case(tag))
        })
        .map(|tag| tag.len())
}

/// Widest line of a label, in terminal columns.
pub fn label_width(label: &str) -> usize {
    label_lines(label)
        .iter()
        .map(|line| display_width(line))
        .max()
        .unwrap_or(0)
}

/// Estimated on-screen size of a node box, never smaller than the
/// configured default node size.
pub fn node_size(label: &str, config: &LayoutConfig) -> Size {
    let lines = label_lines(label).len() as f64;
    let text_width = label_width(label) as f64 * config.char_width + 2.0 * LABEL_PADDING;
    let text_height = lines * config.line_height + 2.0 * LABEL_PADDING;
    Size {
        width: text_width.max(config.node_width),
        height: text_height.max(config.node_height),
    }
}

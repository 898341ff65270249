//! Canonical MMD output.
//!
//! The writer never fails: every tree reachable through the [`MindMap`] API
//! has a textual form, and for trees produced by the parser reading that
//! form back gives an equal tree.

use mindmap_syntax::fence::write_fenced;
use mindmap_syntax::format_attribute_line;
use serde::{Deserialize, Serialize};

use crate::models::{MindMap, Topic, TopicId};
use crate::parsing::escape_title;

pub const DEFAULT_DELIMITER_LENGTH: usize = 3;
pub const DEFAULT_MIN_FENCE_LENGTH: usize = 3;

/// Layout choices of the writer. Values below the minimum are raised to it.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct WriteOptions {
    /// Free text written before the document attributes.
    pub header: Option<String>,
    /// Number of `-` in the delimiter line, at least 2.
    pub delimiter_length: usize,
    /// Shortest backtick fence around extras and snippets, at least 1.
    pub min_fence_length: usize,
}

impl Default for WriteOptions {
    fn default() -> Self {
        Self {
            header: None,
            delimiter_length: DEFAULT_DELIMITER_LENGTH,
            min_fence_length: DEFAULT_MIN_FENCE_LENGTH,
        }
    }
}

pub fn write_map(map: &MindMap, options: &WriteOptions) -> String {
    let mut out = String::new();

    if let Some(header) = &options.header {
        for line in header.lines() {
            if reads_as_header_syntax(line) {
                out.push(' ');
            }
            out.push_str(line);
            out.push('\n');
        }
    }
    if !map.attributes().is_empty() {
        out.push_str("> ");
        out.push_str(&format_attribute_line(map.attributes()));
        out.push('\n');
    }
    out.push_str(&"-".repeat(options.delimiter_length.max(2)));
    out.push('\n');

    write_topic(map, map.root(), 1, options.min_fence_length.max(1), &mut out);
    out
}

/// Header text that the lexer would take for an attribute line or the
/// delimiter.
fn reads_as_header_syntax(line: &str) -> bool {
    let trimmed = line.strip_suffix('\r').unwrap_or(line);
    line.starts_with("> ") || (trimmed.len() >= 2 && trimmed.bytes().all(|b| b == b'-'))
}

fn write_topic(map: &MindMap, id: TopicId, depth: usize, min_fence: usize, out: &mut String) {
    let Some(topic) = map.topic(id) else {
        return;
    };

    out.push_str(&"#".repeat(depth));
    out.push(' ');
    out.push_str(&escape_title(topic.text()));
    out.push('\n');

    write_topic_body(topic, min_fence, out);

    for child in topic.children() {
        write_topic(map, *child, depth + 1, min_fence, out);
    }
}

fn write_topic_body(topic: &Topic, min_fence: usize, out: &mut String) {
    if !topic.attributes().is_empty() {
        out.push_str("> ");
        out.push_str(&format_attribute_line(topic.attributes()));
        out.push('\n');
    }

    for extra in topic.extras() {
        out.push_str("- ");
        out.push_str(extra.kind().name());
        out.push('\n');
        write_fenced(out, "", &extra.content(), min_fence);
        out.push('\n');
    }

    for (language, body) in topic.code_snippets() {
        write_fenced(out, language, body, min_fence);
        out.push('\n');
    }
}

//! Builds a [`MindMap`] from MMD text.
//!
//! The builder walks the lexer tokens once. Only three conditions abort a
//! parse: an unrecognised line, a broken topic hierarchy and a missing header
//! delimiter. Everything else (unknown extra kinds, undecodable payloads,
//! stray blocks) is logged and skipped.

pub mod title;

use std::ops::Range;

use mindmap_syntax::fence::{decode_extra_text, split_fenced};
use mindmap_syntax::{Token, TokenType, lex_with_spans, parse_attribute_line};
use thiserror::Error;

use crate::models::{ExtraKind, MindMap, TopicId};
pub use title::{escape_title, normalize_line_breaks, unescape_title};

/// Fatal parse failures. Line numbers are 1-based.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ParseError {
    #[error("missing header delimiter line (two or more '-')")]
    MissingDelimiter,

    #[error("line {line}: unrecognised line {text:?}")]
    UnknownLine { line: usize, text: String },

    #[error("line {line}: topic of depth {depth} where at most {max} is allowed")]
    DepthJump {
        line: usize,
        depth: usize,
        max: usize,
    },

    #[error("line {line}: second top level topic, a map has a single root")]
    MultipleRoots { line: usize },
}

pub fn parse_map(text: &str) -> Result<MindMap, ParseError> {
    let mut builder = TreeBuilder::new(text);
    for (token, span) in lex_with_spans(text) {
        builder.token(token, span)?;
    }
    builder.finish()
}

enum PendingExtra {
    None,
    Kind(ExtraKind),
    Dropped,
}

struct TreeBuilder<'a> {
    source: &'a str,
    map: MindMap,
    in_header: bool,
    /// Topics on the path to the current one; index `i` has depth `i + 1`.
    stack: Vec<TopicId>,
    pending: PendingExtra,
}

impl<'a> TreeBuilder<'a> {
    fn new(source: &'a str) -> Self {
        Self {
            source,
            map: MindMap::new(),
            in_header: true,
            stack: Vec::new(),
            pending: PendingExtra::None,
        }
    }

    fn line_of(&self, offset: usize) -> usize {
        self.source[..offset].matches('\n').count() + 1
    }

    fn token(&mut self, token: Token<'_>, span: Range<usize>) -> Result<(), ParseError> {
        match token.kind {
            TokenType::HeadLine | TokenType::Whitespace => {}
            TokenType::HeadDelimiter => self.in_header = false,
            TokenType::Attribute => {
                self.pending = PendingExtra::None;
                let attributes = parse_attribute_line(&token.text[1..]);
                match self.stack.last() {
                    Some(topic) => {
                        if let Ok(topic) = self.map.get_mut(*topic) {
                            topic.attributes.extend(attributes);
                        }
                    }
                    None => self.map.attributes_mut().extend(attributes),
                }
            }
            TokenType::Topic => {
                self.pending = PendingExtra::None;
                self.topic(token.text, span.start)?;
            }
            TokenType::ExtraType => self.extra_type(token.text, span.start),
            TokenType::ExtraText => self.extra_text(token.text, span.start),
            TokenType::UnknownLine => {
                return Err(ParseError::UnknownLine {
                    line: self.line_of(span.start),
                    text: token.text.trim_end().to_string(),
                });
            }
        }
        Ok(())
    }

    fn topic(&mut self, text: &str, offset: usize) -> Result<(), ParseError> {
        let depth = text.bytes().take_while(|b| *b == b'#').count();
        let line = &text[depth..];
        let line = line.strip_suffix('\n').unwrap_or(line);
        let line = line.strip_suffix('\r').unwrap_or(line);
        let title = unescape_title(line.strip_prefix(' ').unwrap_or(line));

        let max = self.stack.len() + 1;
        if depth > max {
            return Err(ParseError::DepthJump {
                line: self.line_of(offset),
                depth,
                max,
            });
        }
        if depth == 1 && !self.stack.is_empty() {
            return Err(ParseError::MultipleRoots {
                line: self.line_of(offset),
            });
        }

        self.stack.truncate(depth - 1);
        let id = match self.stack.last() {
            Some(parent) => self.map.push_child(*parent, title),
            None => {
                let root = self.map.root();
                if let Ok(topic) = self.map.get_mut(root) {
                    topic.text = title;
                }
                root
            }
        };
        self.stack.push(id);
        Ok(())
    }

    fn extra_type(&mut self, text: &str, offset: usize) {
        let name = text[1..].trim();
        if self.stack.is_empty() {
            log::warn!(
                "line {}: extra {name:?} before the first topic is ignored",
                self.line_of(offset)
            );
            self.pending = PendingExtra::Dropped;
            return;
        }
        self.pending = match name.parse::<ExtraKind>() {
            Ok(kind) => PendingExtra::Kind(kind),
            Err(e) => {
                log::warn!("line {}: {e}, dropping the extra", self.line_of(offset));
                PendingExtra::Dropped
            }
        };
    }

    fn extra_text(&mut self, text: &str, offset: usize) {
        let pending = std::mem::replace(&mut self.pending, PendingExtra::None);
        let Some(&topic) = self.stack.last() else {
            log::warn!(
                "line {}: block before the first topic is ignored",
                self.line_of(offset)
            );
            return;
        };

        match pending {
            PendingExtra::Kind(kind) => {
                let Some(content) = decode_extra_text(text) else {
                    log::warn!(
                        "line {}: undecodable {kind} payload dropped",
                        self.line_of(offset)
                    );
                    return;
                };
                match kind.make(&content) {
                    Ok(extra) => {
                        if let Ok(topic) = self.map.get_mut(topic) {
                            topic.extras.insert(kind, extra);
                        }
                    }
                    Err(e) => log::warn!("line {}: {kind} extra dropped: {e}", self.line_of(offset)),
                }
            }
            PendingExtra::Dropped => {}
            PendingExtra::None => match split_fenced(text) {
                Some(block) if !block.info.is_empty() => {
                    if let Ok(topic) = self.map.get_mut(topic) {
                        topic
                            .code_snippets
                            .insert(block.info.to_string(), block.content.to_string());
                    }
                }
                _ => log::warn!(
                    "line {}: block without a preceding extra type is ignored",
                    self.line_of(offset)
                ),
            },
        }
    }

    fn finish(mut self) -> Result<MindMap, ParseError> {
        if self.in_header {
            return Err(ParseError::MissingDelimiter);
        }
        self.map.take_events();
        Ok(self.map)
    }
}

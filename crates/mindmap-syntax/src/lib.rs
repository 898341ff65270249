//! # mindmap-syntax
//!
//! Text-level building blocks of the MMD mind map format: a resumable
//! lexer, the attribute line grammar, the fence codec for extra payloads and
//! a lossless [Rowan] syntax tree.
//!
//! [Rowan]: https://docs.rs/rowan
//!
//! ## The Format
//!
//! ````text
//! Mind Map generated by NB-MindMap     ← header lines (free text)
//! > __version__="1.1"                  ← document attributes
//! ---                                  ← delimiter, two or more '-'
//! # Root                               ← topic, one '#' per level
//! > fillColor="#FF0000"                ← topic attributes
//! - NOTE                               ← extra kind
//! ```                                  ← extra payload in a fence
//! remember the milk
//! ```
//! ## Child                             ← nested topic
//! ````
//!
//! ## Architecture Overview
//!
//! ```text
//! Source Text → Lexer → Tokens → Parser → Events → Sink → Rowan Tree
//!               (resumable)      (Grammar)        (GreenNodeBuilder)
//! ```
//!
//! The topic tree model in `mindmap-engine` consumes the token stream
//! directly; the syntax tree serves tools that need exact source ranges,
//! such as editors and the `mmd check` command which reports every
//! malformed line instead of stopping at the first.
//!
//! ## Module Structure
//!
//! ```text
//! mindmap-syntax/
//! ├── lib.rs           # This file - public API and tree tests
//! ├── lexer.rs         # Resumable line tokenizer
//! ├── attributes.rs    # Attribute map, attribute line parser (Logos) and writer
//! ├── fence.rs         # Backtick fence and <pre> codec
//! ├── syntax_kind.rs   # SyntaxKind enum (tokens + nodes) and Rowan integration
//! └── parser/
//!     ├── mod.rs       # Parser struct, Marker system, public parse() function
//!     ├── event.rs     # Event enum (Start, Token, Finish, Placeholder)
//!     ├── sink.rs      # Converts events to Rowan GreenNode
//!     └── grammar/     # Header, topic and extra rules
//! ```
//!
//! ## Quick Start
//!
//! ```
//! use mindmap_syntax::{parse, SyntaxKind};
//!
//! let tree = parse("---\n# Hello\n");
//!
//! // The tree preserves all text
//! assert_eq!(tree.text().to_string(), "---\n# Hello\n");
//!
//! let kinds: Vec<_> = tree.children().map(|n| n.kind()).collect();
//! assert_eq!(kinds, vec![SyntaxKind::HEADER, SyntaxKind::TOPIC]);
//! ```

pub mod attributes;
pub mod fence;
pub mod lexer;
pub mod parser;
pub mod syntax_kind;

pub use attributes::{
    Attributes, format_attribute_line, is_valid_attribute_name, parse_attribute_line,
};
pub use lexer::{Lexer, LexerPosition, Token, TokenType, lex, lex_with_spans};
pub use parser::parse;
pub use syntax_kind::{MindMapLang, SyntaxElement, SyntaxKind, SyntaxNode, SyntaxToken};

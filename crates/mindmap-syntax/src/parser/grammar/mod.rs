//! # Grammar Rules
//!
//! Each function takes a `&mut Parser` and uses its methods to inspect the
//! current token, consume tokens and build tree structure with markers.
//!
//! ```text
//! ROOT
//!   HEADER        head lines, header attributes, delimiter
//!   ATTRIBUTE     document attributes written after the delimiter
//!   TOPIC         depth 1
//!     ATTRIBUTE
//!     EXTRA       EXTRA_TYPE + EXTRA_TEXT
//!     EXTRA_TEXT  code snippet
//!     TOPIC       depth 2
//!   ERROR         unknown line
//! ```
//!
//! ## Error Recovery
//!
//! Grammar functions never fail. An unknown line is wrapped in an ERROR node
//! where it occurs and parsing carries on, so the tree always holds every
//! byte of the input.

mod topic;

use crate::parser::Parser;
use crate::syntax_kind::SyntaxKind;

/// Parse the root document.
pub fn root(p: &mut Parser<'_, '_>) {
    let m = p.start();

    header(p);
    while !p.at_end() {
        match p.current() {
            SyntaxKind::TOPIC_LINE => topic::topic(p),
            SyntaxKind::UNKNOWN_LINE | SyntaxKind::EXTRA_TYPE => topic::error(p),
            _ => p.bump(),
        }
    }

    m.complete(p, SyntaxKind::ROOT);
}

/// Header lines up to and including the delimiter.
fn header(p: &mut Parser<'_, '_>) {
    let m = p.start();
    let mut any = false;

    while p.at(SyntaxKind::HEAD_LINE) || p.at(SyntaxKind::ATTRIBUTE) {
        p.bump();
        any = true;
    }
    any |= p.eat(SyntaxKind::HEAD_DELIMITER);

    if any {
        m.complete(p, SyntaxKind::HEADER);
    } else {
        m.abandon(p);
    }
}

#[cfg(test)]
mod tests {
    use crate::parse;
    use crate::syntax_kind::SyntaxKind;

    #[test]
    fn header_without_delimiter_still_forms_a_node() {
        let tree = parse("just text\nmore text");
        let header = tree.children().next().unwrap();
        assert_eq!(header.kind(), SyntaxKind::HEADER);
        assert_eq!(header.text().to_string(), "just text\nmore text");
    }

    #[test]
    fn stray_extra_type_before_any_topic_is_an_error() {
        let tree = parse("--\n- NOTE\n");
        assert!(tree.children().any(|n| n.kind() == SyntaxKind::ERROR));
    }
}

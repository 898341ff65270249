//! Topic-level rules: nested topics, extras and error lines.

use crate::parser::Parser;
use crate::syntax_kind::SyntaxKind;

/// A topic node and everything that belongs to it, child topics included.
pub(super) fn topic(p: &mut Parser<'_, '_>) {
    let level = p.topic_level();
    let m = p.start();
    p.bump();

    loop {
        match p.current() {
            SyntaxKind::EOF => break,
            SyntaxKind::TOPIC_LINE => {
                if p.topic_level() > level {
                    topic(p);
                } else {
                    break;
                }
            }
            SyntaxKind::EXTRA_TYPE => extra(p),
            SyntaxKind::UNKNOWN_LINE => error(p),
            _ => p.bump(),
        }
    }

    m.complete(p, SyntaxKind::TOPIC);
}

/// `- KIND` line followed by its payload block.
fn extra(p: &mut Parser<'_, '_>) {
    let m = p.start();
    p.bump();
    while p.at(SyntaxKind::WHITESPACE) && p.nth(1) == SyntaxKind::EXTRA_TEXT {
        p.bump();
    }
    p.eat(SyntaxKind::EXTRA_TEXT);
    m.complete(p, SyntaxKind::EXTRA);
}

/// Wrap the current token in an ERROR node.
pub(super) fn error(p: &mut Parser<'_, '_>) {
    let m = p.start();
    p.bump();
    m.complete(p, SyntaxKind::ERROR);
}

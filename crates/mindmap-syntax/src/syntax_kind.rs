//! SyntaxKind enum for all tokens and nodes in the MMD CST.
//!
//! Following the rust-analyzer model, all tokens and nodes share a single enum.
//! Every byte in the source must appear as a token in the tree.

/// All syntax kinds for the MMD CST.
///
/// Tokens are whole lines or blocks as produced by the [`Lexer`](crate::lexer::Lexer);
/// nodes group them into the header and the nested topics.
///
/// We use SCREAMING_CASE following the rust-analyzer convention for SyntaxKind.
#[repr(u16)]
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
#[allow(non_camel_case_types)]
pub enum SyntaxKind {
    // === Tokens (lexer output) ===
    /// Free text line before the delimiter
    HEAD_LINE,
    /// Line of `-` ending the header
    HEAD_DELIMITER,
    /// `> key="value"` line
    ATTRIBUTE,
    /// `#` line opening a topic
    TOPIC_LINE,
    /// `- KIND` line
    EXTRA_TYPE,
    /// Fenced or `<pre>` block
    EXTRA_TEXT,
    /// Spaces and line breaks between body lines
    WHITESPACE,
    /// Body line of no known shape
    UNKNOWN_LINE,
    /// End of file marker
    EOF,

    // === Composite Nodes (parser output) ===
    /// Root document node
    ROOT,
    /// Header lines, header attributes and the delimiter
    HEADER,
    /// A topic with its attributes, extras and child topics
    TOPIC,
    /// `EXTRA_TYPE` followed by its `EXTRA_TEXT`
    EXTRA,

    /// Error recovery node
    ERROR,
}

impl SyntaxKind {
    /// Returns true if this kind represents a token (lexer output).
    pub fn is_token(self) -> bool {
        (self as u16) <= (Self::EOF as u16)
    }

    /// Returns true if this kind represents a composite node.
    pub fn is_node(self) -> bool {
        !self.is_token()
    }

    pub fn is_trivia(self) -> bool {
        self == Self::WHITESPACE
    }
}

impl From<SyntaxKind> for rowan::SyntaxKind {
    fn from(kind: SyntaxKind) -> Self {
        Self(kind as u16)
    }
}

/// Language definition for rowan.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub enum MindMapLang {}

impl rowan::Language for MindMapLang {
    type Kind = SyntaxKind;

    fn kind_from_raw(raw: rowan::SyntaxKind) -> Self::Kind {
        assert!(raw.0 <= SyntaxKind::ERROR as u16);
        // SAFETY: We check bounds above and SyntaxKind is repr(u16)
        unsafe { std::mem::transmute::<u16, SyntaxKind>(raw.0) }
    }

    fn kind_to_raw(kind: Self::Kind) -> rowan::SyntaxKind {
        kind.into()
    }
}

/// Type alias for our syntax nodes.
pub type SyntaxNode = rowan::SyntaxNode<MindMapLang>;
/// Type alias for our syntax tokens.
pub type SyntaxToken = rowan::SyntaxToken<MindMapLang>;
/// Type alias for syntax elements (node or token).
pub type SyntaxElement = rowan::SyntaxElement<MindMapLang>;

#[cfg(test)]
mod tests {
    use super::*;
    use rowan::Language;

    #[test]
    fn token_kinds_are_tokens() {
        assert!(SyntaxKind::HEAD_LINE.is_token());
        assert!(SyntaxKind::UNKNOWN_LINE.is_token());
        assert!(SyntaxKind::EOF.is_token());
    }

    #[test]
    fn node_kinds_are_nodes() {
        assert!(SyntaxKind::ROOT.is_node());
        assert!(SyntaxKind::TOPIC.is_node());
        assert!(SyntaxKind::ERROR.is_node());
    }

    #[test]
    fn trivia_detection() {
        assert!(SyntaxKind::WHITESPACE.is_trivia());
        assert!(!SyntaxKind::ATTRIBUTE.is_trivia());
    }

    #[test]
    fn rowan_conversion_roundtrip() {
        let kind = SyntaxKind::EXTRA;
        let raw: rowan::SyntaxKind = kind.into();
        let back = MindMapLang::kind_from_raw(raw);
        assert_eq!(kind, back);
    }
}

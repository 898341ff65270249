//! # Lexer - Resumable MMD Tokenizer
//!
//! This module provides the first stage of reading an MMD mind map: breaking
//! the source text into line-oriented tokens.
//!
//! ## The Lossless Guarantee
//!
//! Every byte in the input appears in exactly one token. Nothing is skipped,
//! so concatenating the token texts gives back the original:
//!
//! ```
//! use mindmap_syntax::lexer::lex;
//!
//! let input = "Header\n---\n# Root\n> fillColor=\"#FF0000\"\n";
//! let tokens = lex(input);
//!
//! let reconstructed: String = tokens.iter().map(|t| t.text).collect();
//! assert_eq!(input, reconstructed);
//! ```
//!
//! ## Two Sections, Two Modes
//!
//! An MMD file starts with a free-text header that ends at a line made only
//! of `-` characters. Inside the header everything is a [`TokenType::HeadLine`]
//! except attribute lines (`> `) and the delimiter itself. After the delimiter
//! the lexer switches to body mode where a line's first character decides
//! its token:
//!
//! ```text
//! # Topic         → TOPIC (the hash run is the nesting depth)
//! > key="value"   → ATTRIBUTE
//! - NOTE          → EXTRA_TYPE
//! fence, <pre>    → EXTRA_TEXT (runs until the matching closer)
//! spaces, \n      → WHITESPACE
//! anything else   → UNKNOWN_LINE
//! ```
//!
//! ## Resuming Mid-Token
//!
//! Editors feed text as it arrives. When the visible window ends inside a
//! token that could still grow, [`Lexer::advance`] reports it as incomplete
//! (see [`Lexer::is_token_completed`]). After the caller extends the window
//! with [`Lexer::set_buffer_end_offset`] or [`Lexer::append`], the next
//! `advance()` continues the same token from where it stopped.
//!
//! ```
//! use mindmap_syntax::lexer::{Lexer, TokenType};
//!
//! let mut lexer = Lexer::new();
//! lexer.start("Header\n---------------", 0, 10, TokenType::HeadLine);
//!
//! lexer.advance();
//! assert_eq!(lexer.token_text(), "Header\n");
//!
//! lexer.advance();
//! assert!(!lexer.is_token_completed());
//! assert_eq!(lexer.token_text(), "---");
//!
//! lexer.set_buffer_end_offset(22);
//! lexer.advance();
//! assert!(lexer.is_token_completed());
//! assert_eq!(lexer.token_type(), Some(TokenType::HeadDelimiter));
//! assert_eq!((lexer.token_start(), lexer.token_end()), (7, 22));
//! ```
//!
//! Offsets are byte offsets into the UTF-8 buffer. All structural characters
//! are ASCII, so token boundaries always fall on character boundaries.

use std::fmt;
use std::ops::Range;

use crate::syntax_kind::SyntaxKind;

const PRE_OPEN: &[u8] = b"<pre>";
const PRE_CLOSE: &[u8] = b"</pre>";

/// Token kinds produced by the [`Lexer`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum TokenType {
    /// Free text line of the header section
    HeadLine,
    /// Line of two or more `-` ending the header section
    HeadDelimiter,
    /// `> key="value", ...` line
    Attribute,
    /// `#` line, the whole line including its line ending
    Topic,
    /// `- KIND` line naming the extra that follows
    ExtraType,
    /// Fenced or `<pre>` block carrying an extra payload or a code snippet
    ExtraText,
    /// Run of whitespace between body lines
    Whitespace,
    /// Body line matching none of the shapes above
    UnknownLine,
}

impl TokenType {
    /// Upper-case name used in diagnostics and tree dumps.
    pub fn name(self) -> &'static str {
        match self {
            TokenType::HeadLine => "HEAD_LINE",
            TokenType::HeadDelimiter => "HEAD_DELIMITER",
            TokenType::Attribute => "ATTRIBUTE",
            TokenType::Topic => "TOPIC",
            TokenType::ExtraType => "EXTRA_TYPE",
            TokenType::ExtraText => "EXTRA_TEXT",
            TokenType::Whitespace => "WHITESPACE",
            TokenType::UnknownLine => "UNKNOWN_LINE",
        }
    }

    /// Convert to SyntaxKind.
    pub fn to_syntax_kind(self) -> SyntaxKind {
        match self {
            TokenType::HeadLine => SyntaxKind::HEAD_LINE,
            TokenType::HeadDelimiter => SyntaxKind::HEAD_DELIMITER,
            TokenType::Attribute => SyntaxKind::ATTRIBUTE,
            TokenType::Topic => SyntaxKind::TOPIC_LINE,
            TokenType::ExtraType => SyntaxKind::EXTRA_TYPE,
            TokenType::ExtraText => SyntaxKind::EXTRA_TEXT,
            TokenType::Whitespace => SyntaxKind::WHITESPACE,
            TokenType::UnknownLine => SyntaxKind::UNKNOWN_LINE,
        }
    }
}

impl fmt::Display for TokenType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

/// What the lexer is in the middle of scanning.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Scan {
    /// Header line up to and including `\n`
    HeadLine,
    /// Between body tokens, the next byte picks the token
    Body,
    Whitespace,
    /// Saw `>` or `-`, a space must follow
    Marker(TokenType),
    /// Rest of a line whose type is settled
    Line(TokenType),
    /// Matching the `<pre>` opener
    PreOpen,
    /// Looking for `</pre>`
    PreBody,
    /// Counting the opening backtick run
    FenceOpen(usize),
    /// Looking for a backtick run of exactly `opener` length
    Fence { opener: usize, run: usize },
}

impl Scan {
    fn pending_type(self) -> Option<TokenType> {
        match self {
            Scan::HeadLine => Some(TokenType::HeadLine),
            Scan::Body => None,
            Scan::Whitespace => Some(TokenType::Whitespace),
            Scan::Marker(kind) | Scan::Line(kind) => Some(kind),
            Scan::PreOpen | Scan::PreBody | Scan::FenceOpen(_) | Scan::Fence { .. } => {
                Some(TokenType::ExtraText)
            }
        }
    }
}

/// A snapshot of the lexer state.
///
/// Positions are plain values: an editor can keep the position taken at a
/// token boundary and [`Lexer::restore`] it later instead of lexing the
/// document from the start again.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct LexerPosition {
    offset: usize,
    token_start: usize,
    token_type: Option<TokenType>,
    completed: bool,
    scan: Scan,
}

impl LexerPosition {
    fn at(offset: usize, scan: Scan) -> Self {
        Self {
            offset,
            token_start: offset,
            token_type: None,
            completed: true,
            scan,
        }
    }

    /// Offset the next scan continues from.
    pub fn offset(&self) -> usize {
        self.offset
    }

    /// Start offset of the current token.
    pub fn token_start(&self) -> usize {
        self.token_start
    }

    /// Type of the current token, `None` when nothing is pending.
    pub fn token_type(&self) -> Option<TokenType> {
        self.token_type
    }

    pub fn is_token_completed(&self) -> bool {
        self.completed
    }
}

/// Resumable tokenizer over an owned text buffer.
///
/// The lexer only looks at `buffer[..end]` where `end` is the window end set
/// by [`start`](Lexer::start) or [`set_buffer_end_offset`](Lexer::set_buffer_end_offset).
/// A token that reaches the window end is complete only when the window end
/// is also the end of the buffer and no more input has been announced with
/// [`expect_more_input`](Lexer::expect_more_input).
#[derive(Debug, Clone)]
pub struct Lexer {
    buffer: String,
    end_offset: usize,
    more_input: bool,
    position: LexerPosition,
}

impl Default for Lexer {
    fn default() -> Self {
        Self::new()
    }
}

impl Lexer {
    pub fn new() -> Self {
        Self {
            buffer: String::new(),
            end_offset: 0,
            more_input: false,
            position: LexerPosition::at(0, Scan::HeadLine),
        }
    }

    /// Begin lexing `buffer[start..end]`.
    ///
    /// `initial` tells the lexer which section `start` lies in: pass
    /// [`TokenType::HeadLine`] at the beginning of a file, any other type to
    /// restart in the body at a token boundary.
    pub fn start(&mut self, buffer: &str, start: usize, end: usize, initial: TokenType) {
        self.buffer.clear();
        self.buffer.push_str(buffer);
        let start = floor_char_boundary(&self.buffer, start);
        let scan = if initial == TokenType::HeadLine {
            Scan::HeadLine
        } else {
            Scan::Body
        };
        self.position = LexerPosition::at(start, scan);
        self.end_offset = floor_char_boundary(&self.buffer, end).max(start);
    }

    /// Move the window end, typically after the buffer grew.
    pub fn set_buffer_end_offset(&mut self, end: usize) {
        self.end_offset = floor_char_boundary(&self.buffer, end).max(self.position.offset);
    }

    /// Append text to the buffer and extend the window to its end.
    pub fn append(&mut self, chunk: &str) {
        self.buffer.push_str(chunk);
        self.end_offset = self.buffer.len();
    }

    /// Announce whether more text will be appended later.
    ///
    /// While more input is expected no token is completed by reaching the
    /// end of the buffer.
    pub fn expect_more_input(&mut self, more: bool) {
        self.more_input = more;
    }

    pub fn buffer(&self) -> &str {
        &self.buffer
    }

    pub fn buffer_end(&self) -> usize {
        self.end_offset
    }

    pub fn current_position(&self) -> LexerPosition {
        self.position
    }

    /// Continue from a position taken with [`current_position`](Lexer::current_position).
    pub fn restore(&mut self, position: LexerPosition) {
        let mut position = position;
        position.offset = floor_char_boundary(&self.buffer, position.offset);
        position.token_start = position.token_start.min(position.offset);
        self.end_offset = self.end_offset.max(position.offset);
        self.position = position;
    }

    pub fn token_type(&self) -> Option<TokenType> {
        self.position.token_type
    }

    pub fn token_start(&self) -> usize {
        self.position.token_start
    }

    pub fn token_end(&self) -> usize {
        self.position.offset
    }

    pub fn token_text(&self) -> &str {
        self.buffer
            .get(self.position.token_start..self.position.offset)
            .unwrap_or("")
    }

    pub fn is_token_completed(&self) -> bool {
        self.position.completed
    }

    /// Scan the next token, or continue the current one if it was incomplete.
    ///
    /// After the call [`token_type`](Lexer::token_type) is `None` when the
    /// window holds no further text.
    pub fn advance(&mut self) {
        if self.position.completed {
            self.position.token_start = self.position.offset;
        }

        let completed = self.scan();
        let position = &mut self.position;
        position.completed = completed;

        if position.offset == position.token_start {
            // Nothing pending: the scan state stays as is for the next window.
            position.completed = true;
            position.token_type = None;
            return;
        }

        if completed {
            let (kind, next) = self.classify();
            self.position.token_type = Some(kind);
            self.position.scan = next;
        } else {
            self.position.token_type = self.position.scan.pending_type();
        }
    }

    fn at_final_end(&self) -> bool {
        self.end_offset >= self.buffer.len() && !self.more_input
    }

    /// Give up on a block that is still open at the window end: it stays
    /// incomplete while more text may come, otherwise it becomes an
    /// unknown line.
    fn unterminated(&mut self) -> bool {
        if self.at_final_end() {
            self.position.scan = Scan::Line(TokenType::UnknownLine);
            true
        } else {
            false
        }
    }

    /// Returns whether the token was completed.
    fn scan(&mut self) -> bool {
        let end = self.end_offset;
        loop {
            let offset = self.position.offset;
            let current = self.buffer.as_bytes().get(offset).copied().filter(|_| offset < end);

            match self.position.scan {
                Scan::HeadLine | Scan::Line(_) => return self.scan_line(),
                Scan::Body => {
                    let Some(byte) = current else {
                        return true;
                    };
                    self.position.scan = match byte {
                        b'#' => {
                            self.position.offset += 1;
                            Scan::Line(TokenType::Topic)
                        }
                        b'>' => {
                            self.position.offset += 1;
                            Scan::Marker(TokenType::Attribute)
                        }
                        b'-' => {
                            self.position.offset += 1;
                            Scan::Marker(TokenType::ExtraType)
                        }
                        b'<' => Scan::PreOpen,
                        b'`' => Scan::FenceOpen(0),
                        b if is_whitespace(b) => Scan::Whitespace,
                        _ => Scan::Line(TokenType::UnknownLine),
                    };
                }
                Scan::Whitespace => {
                    let skipped = self.buffer.as_bytes()[offset..end]
                        .iter()
                        .take_while(|b| is_whitespace(**b))
                        .count();
                    self.position.offset += skipped;
                    return self.position.offset < end || self.at_final_end();
                }
                Scan::Marker(kind) => match current {
                    None => return self.unterminated(),
                    Some(b' ') => {
                        self.position.offset += 1;
                        self.position.scan = Scan::Line(kind);
                    }
                    Some(_) => self.position.scan = Scan::Line(TokenType::UnknownLine),
                },
                Scan::PreOpen => {
                    let matched = offset - self.position.token_start;
                    if matched == PRE_OPEN.len() {
                        self.position.scan = Scan::PreBody;
                        continue;
                    }
                    match current {
                        None => return self.unterminated(),
                        Some(byte) if byte == PRE_OPEN[matched] => self.position.offset += 1,
                        Some(_) => self.position.scan = Scan::Line(TokenType::UnknownLine),
                    }
                }
                Scan::PreBody => {
                    let bytes = self.buffer.as_bytes();
                    let body_start = self.position.token_start + PRE_OPEN.len();
                    let mut cursor = offset;
                    while cursor < end {
                        cursor += 1;
                        if cursor >= body_start + PRE_CLOSE.len()
                            && &bytes[cursor - PRE_CLOSE.len()..cursor] == PRE_CLOSE
                        {
                            self.position.offset = cursor;
                            return true;
                        }
                    }
                    self.position.offset = end;
                    return self.unterminated();
                }
                Scan::FenceOpen(run) => match current {
                    None => return self.unterminated(),
                    Some(b'`') => {
                        self.position.offset += 1;
                        self.position.scan = Scan::FenceOpen(run + 1);
                    }
                    Some(_) => self.position.scan = Scan::Fence { opener: run, run: 0 },
                },
                Scan::Fence { opener, mut run } => {
                    let bytes = self.buffer.as_bytes();
                    let mut cursor = offset;
                    while cursor < end {
                        if bytes[cursor] == b'`' {
                            run += 1;
                        } else if run == opener {
                            self.position.offset = cursor;
                            self.position.scan = Scan::Fence { opener, run };
                            return true;
                        } else {
                            run = 0;
                        }
                        cursor += 1;
                    }
                    self.position.offset = end;
                    self.position.scan = Scan::Fence { opener, run };
                    if !self.at_final_end() {
                        return false;
                    }
                    if run == opener {
                        return true;
                    }
                    return self.unterminated();
                }
            }
        }
    }

    fn scan_line(&mut self) -> bool {
        let offset = self.position.offset;
        let end = self.end_offset;
        let newline = self.buffer.as_bytes()[offset..end]
            .iter()
            .position(|b| *b == b'\n');
        match newline {
            Some(index) => {
                self.position.offset = offset + index + 1;
                true
            }
            None => {
                self.position.offset = end;
                self.at_final_end()
            }
        }
    }

    /// Final type of the completed token and the scan state that follows it.
    fn classify(&self) -> (TokenType, Scan) {
        match self.position.scan {
            Scan::HeadLine => match classify_head_line(self.token_text()) {
                TokenType::HeadDelimiter => (TokenType::HeadDelimiter, Scan::Body),
                kind => (kind, Scan::HeadLine),
            },
            Scan::Whitespace => (TokenType::Whitespace, Scan::Body),
            Scan::Line(kind) => (kind, Scan::Body),
            Scan::PreBody | Scan::Fence { .. } => (TokenType::ExtraText, Scan::Body),
            Scan::Body | Scan::Marker(_) | Scan::PreOpen | Scan::FenceOpen(_) => {
                (TokenType::UnknownLine, Scan::Body)
            }
        }
    }
}

fn classify_head_line(text: &str) -> TokenType {
    let line = text.strip_suffix('\n').unwrap_or(text);
    let line = line.strip_suffix('\r').unwrap_or(line);
    if line.len() >= 2 && line.bytes().all(|b| b == b'-') {
        TokenType::HeadDelimiter
    } else if text.starts_with("> ") {
        TokenType::Attribute
    } else {
        TokenType::HeadLine
    }
}

fn is_whitespace(byte: u8) -> bool {
    byte.is_ascii_whitespace() || byte.is_ascii_control()
}

fn floor_char_boundary(text: &str, index: usize) -> usize {
    let mut index = index.min(text.len());
    while !text.is_char_boundary(index) {
        index -= 1;
    }
    index
}

/// A lexed token with its kind and text slice.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Token<'a> {
    pub kind: TokenType,
    pub text: &'a str,
}

/// Lex the whole input into a sequence of tokens.
///
/// Guarantees that all bytes from the input appear in the output tokens.
pub fn lex(input: &str) -> Vec<Token<'_>> {
    lex_with_spans(input)
        .into_iter()
        .map(|(token, _)| token)
        .collect()
}

/// Lex and return tokens along with their byte spans.
pub fn lex_with_spans(input: &str) -> Vec<(Token<'_>, Range<usize>)> {
    let mut lexer = Lexer::new();
    lexer.start(input, 0, input.len(), TokenType::HeadLine);

    let mut tokens = Vec::new();
    loop {
        lexer.advance();
        let Some(kind) = lexer.token_type() else {
            break;
        };
        let span = lexer.token_start()..lexer.token_end();
        tokens.push((
            Token {
                kind,
                text: &input[span.clone()],
            },
            span,
        ));
    }
    tokens
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;
    use rstest::rstest;

    fn spans(input: &str) -> Vec<(TokenType, &str, usize, usize)> {
        lex_with_spans(input)
            .into_iter()
            .map(|(token, span)| (token.kind, token.text, span.start, span.end))
            .collect()
    }

    /// Lex with the window first ending at `split`, then extended to the end.
    fn lex_in_two_phases(input: &str, split: usize) -> Vec<(TokenType, Range<usize>)> {
        let mut lexer = Lexer::new();
        lexer.start(input, 0, split, TokenType::HeadLine);

        let mut extended = false;
        let mut tokens = Vec::new();
        loop {
            lexer.advance();
            if lexer.is_token_completed() {
                match lexer.token_type() {
                    Some(kind) => tokens.push((kind, lexer.token_start()..lexer.token_end())),
                    None if !extended => {
                        lexer.set_buffer_end_offset(input.len());
                        extended = true;
                    }
                    None => break,
                }
            } else {
                assert!(!extended, "incomplete token at the final end of input");
                lexer.set_buffer_end_offset(input.len());
                extended = true;
            }
        }
        tokens
    }

    #[test]
    fn lex_empty_input() {
        assert!(lex("").is_empty());
    }

    #[test]
    fn whole_text_without_delimiter_is_one_head_line() {
        assert_eq!(
            spans("  hello world"),
            vec![(TokenType::HeadLine, "  hello world", 0, 13)]
        );
    }

    #[test]
    fn multiline_header() {
        assert_eq!(
            spans(" First line\nSecond line \n--\n"),
            vec![
                (TokenType::HeadLine, " First line\n", 0, 12),
                (TokenType::HeadLine, "Second line \n", 12, 25),
                (TokenType::HeadDelimiter, "--\n", 25, 28),
            ]
        );
    }

    #[rstest]
    #[case::trailing_space("-- \n")]
    #[case::single_dash("-\n")]
    #[case::mixed("-=-\n")]
    fn dash_lines_that_are_not_delimiters(#[case] input: &str) {
        assert_eq!(spans(input), vec![(TokenType::HeadLine, input, 0, input.len())]);
    }

    #[test]
    fn crlf_delimiter() {
        assert_eq!(
            spans("Header\r\n---\r\n"),
            vec![
                (TokenType::HeadLine, "Header\r\n", 0, 8),
                (TokenType::HeadDelimiter, "---\r\n", 8, 13),
            ]
        );
    }

    #[test]
    fn header_attribute_and_topic() {
        assert_eq!(
            spans("First line\n> attr='hello'\n--\n   # Topic\n"),
            vec![
                (TokenType::HeadLine, "First line\n", 0, 11),
                (TokenType::Attribute, "> attr='hello'\n", 11, 26),
                (TokenType::HeadDelimiter, "--\n", 26, 29),
                (TokenType::Whitespace, "   ", 29, 32),
                (TokenType::Topic, "# Topic\n", 32, 40),
            ]
        );
    }

    #[test]
    fn topic_with_attribute_extra_and_trailing_garbage() {
        let input =
            "Header\n--\n# Hello\n> attrs='some'\n- LINK  \n<pre>Hurraa <ugu>\nrabotaet</pre>\nhmm";
        assert_eq!(
            spans(input),
            vec![
                (TokenType::HeadLine, "Header\n", 0, 7),
                (TokenType::HeadDelimiter, "--\n", 7, 10),
                (TokenType::Topic, "# Hello\n", 10, 18),
                (TokenType::Attribute, "> attrs='some'\n", 18, 33),
                (TokenType::ExtraType, "- LINK  \n", 33, 42),
                (
                    TokenType::ExtraText,
                    "<pre>Hurraa <ugu>\nrabotaet</pre>",
                    42,
                    74
                ),
                (TokenType::Whitespace, "\n", 74, 75),
                (TokenType::UnknownLine, "hmm", 75, 78),
            ]
        );
    }

    #[test]
    fn delimiter_without_header_text() {
        assert_eq!(
            spans("---\n# Root\n"),
            vec![
                (TokenType::HeadDelimiter, "---\n", 0, 4),
                (TokenType::Topic, "# Root\n", 4, 11),
            ]
        );
    }

    #[test]
    fn fenced_block_closes_only_on_equal_run() {
        let input = "--\n- NOTE\n````\na ``` b\n`````\n````\n";
        assert_eq!(
            spans(input),
            vec![
                (TokenType::HeadDelimiter, "--\n", 0, 3),
                (TokenType::ExtraType, "- NOTE\n", 3, 10),
                (TokenType::ExtraText, "````\na ``` b\n`````\n````", 10, 33),
                (TokenType::Whitespace, "\n", 33, 34),
            ]
        );
    }

    #[test]
    fn fenced_block_closed_at_end_of_input() {
        assert_eq!(
            spans("--\n```\nx\n```"),
            vec![
                (TokenType::HeadDelimiter, "--\n", 0, 3),
                (TokenType::ExtraText, "```\nx\n```", 3, 12),
            ]
        );
    }

    #[rstest]
    #[case::unclosed_fence("--\n```\nnever closed\n", "```\nnever closed\n")]
    #[case::unclosed_pre("--\n<pre>never closed\n", "<pre>never closed\n")]
    #[case::wrong_tag("--\n<pra>Hello world</pre>", "<pra>Hello world</pre>")]
    #[case::marker_without_space("--\n>x\n", ">x\n")]
    #[case::dash_without_space("--\n-NOTE\n", "-NOTE\n")]
    #[case::lone_marker_at_end("--\n>", ">")]
    fn malformed_body_lines_are_unknown(#[case] input: &str, #[case] unknown: &str) {
        let tokens = spans(input);
        let last = tokens.last().unwrap();
        assert_eq!((last.0, last.1), (TokenType::UnknownLine, unknown));
    }

    #[test]
    fn two_phase_delimiter() {
        let mut lexer = Lexer::new();
        lexer.start("Header\n---------------", 0, 10, TokenType::HeadLine);

        lexer.advance();
        assert_eq!(lexer.token_type(), Some(TokenType::HeadLine));
        assert!(lexer.is_token_completed());

        lexer.advance();
        assert_eq!(lexer.token_type(), Some(TokenType::HeadLine));
        assert!(!lexer.is_token_completed());
        assert_eq!((lexer.token_start(), lexer.token_end()), (7, 10));

        lexer.set_buffer_end_offset(22);
        lexer.advance();
        assert_eq!(lexer.token_type(), Some(TokenType::HeadDelimiter));
        assert!(lexer.is_token_completed());
        assert_eq!((lexer.token_start(), lexer.token_end()), (7, 22));

        lexer.advance();
        assert_eq!(lexer.token_type(), None);
    }

    #[test]
    fn two_phase_header_attribute() {
        let mut lexer = Lexer::new();
        lexer.start("Header\n> hello='world'", 0, 10, TokenType::HeadLine);

        lexer.advance();
        lexer.advance();
        assert_eq!(lexer.token_type(), Some(TokenType::HeadLine));
        assert_eq!(lexer.token_text(), "> h");
        assert!(!lexer.is_token_completed());

        lexer.set_buffer_end_offset(22);
        lexer.advance();
        assert_eq!(lexer.token_type(), Some(TokenType::Attribute));
        assert_eq!((lexer.token_start(), lexer.token_end()), (7, 22));
    }

    #[test]
    fn two_phase_body_attribute() {
        let mut lexer = Lexer::new();
        lexer.start("Header\n--\n> hello='world'", 0, 11, TokenType::HeadLine);

        lexer.advance();
        lexer.advance();
        assert_eq!(lexer.token_type(), Some(TokenType::HeadDelimiter));

        lexer.advance();
        assert_eq!(lexer.token_type(), Some(TokenType::Attribute));
        assert_eq!(lexer.token_text(), ">");
        assert!(!lexer.is_token_completed());

        lexer.set_buffer_end_offset(25);
        lexer.advance();
        assert_eq!(lexer.token_type(), Some(TokenType::Attribute));
        assert_eq!(lexer.token_text(), "> hello='world'");
        assert!(lexer.is_token_completed());
    }

    #[test]
    fn two_phase_topic() {
        let mut lexer = Lexer::new();
        lexer.start("Header\n--\n#Topic name", 0, 14, TokenType::HeadLine);

        lexer.advance();
        lexer.advance();
        lexer.advance();
        assert_eq!(lexer.token_type(), Some(TokenType::Topic));
        assert_eq!(lexer.token_text(), "#Top");
        assert!(!lexer.is_token_completed());

        lexer.set_buffer_end_offset(21);
        lexer.advance();
        assert_eq!(lexer.token_type(), Some(TokenType::Topic));
        assert_eq!((lexer.token_start(), lexer.token_end()), (10, 21));
        assert!(lexer.is_token_completed());
    }

    #[rstest]
    #[case::pre("<pre>Hello world</pre>", 4, "<pre", TokenType::ExtraText)]
    #[case::wrong_tag("<pra>Hello world</pre>", 3, "<pr", TokenType::UnknownLine)]
    #[case::fence("```\nHello\n```", 2, "``", TokenType::ExtraText)]
    fn two_phase_extra_text(
        #[case] input: &str,
        #[case] split: usize,
        #[case] partial: &str,
        #[case] resolved: TokenType,
    ) {
        let mut lexer = Lexer::new();
        lexer.start(input, 0, split, TokenType::Topic);

        lexer.advance();
        assert_eq!(lexer.token_type(), Some(TokenType::ExtraText));
        assert_eq!(lexer.token_text(), partial);
        assert!(!lexer.is_token_completed());

        lexer.set_buffer_end_offset(input.len());
        lexer.advance();
        assert_eq!(lexer.token_type(), Some(resolved));
        assert_eq!(lexer.token_text(), input);
        assert!(lexer.is_token_completed());
    }

    #[test]
    fn whitespace_at_window_end_waits_for_more_input() {
        let mut lexer = Lexer::new();
        lexer.start("--\n  \n  # A", 0, 5, TokenType::HeadLine);

        lexer.advance();
        lexer.advance();
        assert_eq!(lexer.token_type(), Some(TokenType::Whitespace));
        assert!(!lexer.is_token_completed());

        lexer.set_buffer_end_offset(11);
        lexer.advance();
        assert_eq!(lexer.token_text(), "  \n  ");
        assert!(lexer.is_token_completed());
    }

    #[test]
    fn streaming_with_append() {
        let mut lexer = Lexer::new();
        lexer.start("Head", 0, 4, TokenType::HeadLine);
        lexer.expect_more_input(true);

        lexer.advance();
        assert!(!lexer.is_token_completed());
        assert_eq!(lexer.token_text(), "Head");

        lexer.append("er\n--");
        lexer.advance();
        assert!(lexer.is_token_completed());
        assert_eq!(lexer.token_text(), "Header\n");

        lexer.advance();
        assert!(!lexer.is_token_completed());

        lexer.append("--\n");
        lexer.expect_more_input(false);
        lexer.advance();
        assert_eq!(lexer.token_type(), Some(TokenType::HeadDelimiter));
        assert_eq!(lexer.token_text(), "----\n");
    }

    #[test]
    fn restore_position_relexes_from_token_boundary() {
        let input = "--\n# A\n## B\n";
        let mut lexer = Lexer::new();
        lexer.start(input, 0, input.len(), TokenType::HeadLine);

        lexer.advance();
        let after_delimiter = lexer.current_position();
        lexer.advance();
        lexer.advance();
        assert_eq!(lexer.token_text(), "## B\n");

        lexer.restore(after_delimiter);
        lexer.advance();
        assert_eq!(lexer.token_text(), "# A\n");
        assert_eq!(lexer.token_type(), Some(TokenType::Topic));
    }

    #[test]
    fn window_end_inside_multibyte_char_rounds_down() {
        let input = "--\n# é";
        let mut lexer = Lexer::new();
        lexer.start(input, 0, 6, TokenType::HeadLine);

        lexer.advance();
        lexer.advance();
        assert_eq!(lexer.token_text(), "# ");
        assert!(!lexer.is_token_completed());
    }

    #[rstest]
    #[case("Header\n--\n# Hello\n> attrs='some'\n- LINK  \n<pre>Hurraa <ugu>\nrabotaet</pre>\nhmm")]
    #[case("First line\n> attr='hello'\n--\n   # Topic\n")]
    #[case("> a=\"1\"\n-----\n# R\n## C\n- NOTE\n````\nx ``` y\n````\n\n```Java\nint a;\n```\n")]
    #[case("Header\r\n--\r\n# é ü\r\n- FILE\r\n```\r\nfile.txt\r\n```\r\n")]
    #[case("-- \n---\n  \n# A\n>x\n")]
    fn incremental_lexing_matches_one_pass(#[case] input: &str) {
        let one_pass: Vec<_> = lex_with_spans(input)
            .into_iter()
            .map(|(token, span)| (token.kind, span))
            .collect();

        for split in (0..=input.len()).filter(|i| input.is_char_boundary(*i)) {
            assert_eq!(
                lex_in_two_phases(input, split),
                one_pass,
                "split at {split} of {input:?}"
            );
        }
    }

    #[test]
    fn all_bytes_preserved() {
        let input = "Head\n> a=\"b\"\n---\n # A\n> x=`y`\n- NOTE\n<pre>&lt;</pre>\n???\n";
        let tokens = lex(input);
        let reconstructed: String = tokens.iter().map(|t| t.text).collect();
        assert_eq!(input, reconstructed);
    }
}

//! # Attribute Lines
//!
//! Topics and the document carry string attributes written on a single line:
//!
//! ```text
//! > fillColor="#FF0000", leftSide="true", note="says \"hi\""
//! ```
//!
//! The canonical value form is double quoted with `\"`, `\\`, `\n` and `\r`
//! escapes, and [`format_attribute_line`] only ever writes that form. When
//! reading, two older forms are accepted as well:
//!
//! - single quoted values with a `\'` escape: `key='value'`
//! - backtick fenced values: ``key=`value` `` where the closing run must have
//!   the same length as the opening one, so ``key=``a`b`` `` holds `` a`b ``
//!
//! Parsing is permissive. An entry without `=` or with an unterminated value
//! is skipped and parsing resumes after the next comma.

use logos::Logos;

/// Ordered string map used for topic and document attributes.
///
/// Insertion order is kept so the writer output is deterministic, but it is
/// not part of equality: two maps holding the same pairs are equal.
#[derive(Debug, Clone, Default)]
pub struct Attributes {
    entries: Vec<(String, String)>,
}

impl Attributes {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn get(&self, name: &str) -> Option<&str> {
        self.entries
            .iter()
            .find(|(key, _)| key == name)
            .map(|(_, value)| value.as_str())
    }

    pub fn contains_key(&self, name: &str) -> bool {
        self.get(name).is_some()
    }

    /// Set `name`, keeping its position when it already exists.
    ///
    /// Returns the previous value.
    pub fn insert(&mut self, name: impl Into<String>, value: impl Into<String>) -> Option<String> {
        let name = name.into();
        let value = value.into();
        match self.entries.iter_mut().find(|(key, _)| *key == name) {
            Some((_, existing)) => Some(std::mem::replace(existing, value)),
            None => {
                self.entries.push((name, value));
                None
            }
        }
    }

    pub fn remove(&mut self, name: &str) -> Option<String> {
        let index = self.entries.iter().position(|(key, _)| key == name)?;
        Some(self.entries.remove(index).1)
    }

    pub fn clear(&mut self) {
        self.entries.clear();
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    pub fn iter(&self) -> impl Iterator<Item = (&str, &str)> {
        self.entries
            .iter()
            .map(|(key, value)| (key.as_str(), value.as_str()))
    }

    pub fn keys(&self) -> impl Iterator<Item = &str> {
        self.entries.iter().map(|(key, _)| key.as_str())
    }
}

impl PartialEq for Attributes {
    fn eq(&self, other: &Self) -> bool {
        self.len() == other.len() && self.iter().all(|(key, value)| other.get(key) == Some(value))
    }
}

impl Eq for Attributes {}

impl<K: Into<String>, V: Into<String>> Extend<(K, V)> for Attributes {
    fn extend<I: IntoIterator<Item = (K, V)>>(&mut self, iter: I) {
        for (key, value) in iter {
            self.insert(key, value);
        }
    }
}

impl<K: Into<String>, V: Into<String>> FromIterator<(K, V)> for Attributes {
    fn from_iter<I: IntoIterator<Item = (K, V)>>(iter: I) -> Self {
        let mut attributes = Attributes::new();
        attributes.extend(iter);
        attributes
    }
}

impl IntoIterator for Attributes {
    type Item = (String, String);
    type IntoIter = std::vec::IntoIter<(String, String)>;

    fn into_iter(self) -> Self::IntoIter {
        self.entries.into_iter()
    }
}

/// Whether `name` can be written as an attribute key.
pub fn is_valid_attribute_name(name: &str) -> bool {
    !name.is_empty()
        && !name
            .chars()
            .any(|c| c.is_whitespace() || matches!(c, '=' | ',' | '"' | '\'' | '`'))
}

#[derive(Logos, Debug, Clone, Copy, PartialEq, Eq)]
#[logos(skip r"[ \t\r\n\f]+")]
enum AttrToken {
    #[token("=")]
    Eq,

    #[token(",")]
    Comma,

    #[regex(r#""([^"\\]|\\.)*""#)]
    DoubleQuoted,

    #[regex(r"'([^'\\]|\\.)*'")]
    SingleQuoted,

    /// Opening backtick run; the callback consumes up to the matching closer
    /// and yields the run length.
    #[regex("`+", fenced_value)]
    Fenced(usize),

    #[regex(r#"[^\s=,"'`]+"#)]
    Name,
}

fn fenced_value(lex: &mut logos::Lexer<'_, AttrToken>) -> Option<usize> {
    let run = lex.slice().len();
    let close = crate::fence::find_backtick_run(lex.remainder(), run)?;
    lex.bump(close + run);
    Some(run)
}

/// Where the attribute line parser is within one `key=value` entry.
enum Entry<'s> {
    Name,
    Eq(&'s str),
    Value(&'s str),
    Separator,
    Skip,
}

/// Parse the text after the leading `>` of an attribute line.
///
/// Later entries override earlier ones with the same key.
pub fn parse_attribute_line(text: &str) -> Attributes {
    let mut attributes = Attributes::new();
    let mut lexer = AttrToken::lexer(text);
    let mut state = Entry::Name;

    while let Some(token) = lexer.next() {
        let slice = lexer.slice();
        state = match (state, token) {
            (Entry::Name, Ok(AttrToken::Name)) => Entry::Eq(slice),
            (Entry::Eq(name), Ok(AttrToken::Eq)) => Entry::Value(name),
            (Entry::Value(name), Ok(value @ (AttrToken::DoubleQuoted
            | AttrToken::SingleQuoted
            | AttrToken::Fenced(_)))) => {
                attributes.insert(name, decode_value(value, slice));
                Entry::Separator
            }
            (Entry::Separator | Entry::Skip | Entry::Name, Ok(AttrToken::Comma)) => Entry::Name,
            (_, Ok(AttrToken::Comma)) => {
                log::debug!("skipping malformed attribute entry in {text:?}");
                Entry::Name
            }
            (Entry::Skip, _) => Entry::Skip,
            _ => {
                log::debug!("skipping malformed attribute entry in {text:?}");
                Entry::Skip
            }
        };
    }

    attributes
}

fn decode_value(token: AttrToken, slice: &str) -> String {
    match token {
        AttrToken::DoubleQuoted => unescape(&slice[1..slice.len() - 1], '"'),
        AttrToken::SingleQuoted => unescape(&slice[1..slice.len() - 1], '\''),
        AttrToken::Fenced(run) => slice[run..slice.len() - run].to_string(),
        _ => String::new(),
    }
}

fn unescape(raw: &str, quote: char) -> String {
    let mut result = String::with_capacity(raw.len());
    let mut chars = raw.chars();
    while let Some(c) = chars.next() {
        if c != '\\' {
            result.push(c);
            continue;
        }
        match chars.next() {
            Some('\\') => result.push('\\'),
            Some(q) if q == quote => result.push(q),
            Some('n') if quote == '"' => result.push('\n'),
            Some('r') if quote == '"' => result.push('\r'),
            Some(other) => {
                result.push('\\');
                result.push(other);
            }
            None => result.push('\\'),
        }
    }
    result
}

fn escape(value: &str) -> String {
    let mut result = String::with_capacity(value.len() + 2);
    for c in value.chars() {
        match c {
            '\\' => result.push_str("\\\\"),
            '"' => result.push_str("\\\""),
            '\n' => result.push_str("\\n"),
            '\r' => result.push_str("\\r"),
            c => result.push(c),
        }
    }
    result
}

/// Format attributes in the canonical `key="value", key2="value2"` form,
/// without the leading `> `.
pub fn format_attribute_line(attributes: &Attributes) -> String {
    attributes
        .iter()
        .map(|(key, value)| format!("{key}=\"{}\"", escape(value)))
        .collect::<Vec<_>>()
        .join(", ")
}

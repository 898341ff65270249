use std::fmt;
use std::str::FromStr;

use regex::Regex;
use thiserror::Error;

use super::{MmdUri, SourcePosition};

/// Errors raised while decoding an extra payload.
///
/// The parser logs these and drops the extra; they never abort a parse.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ExtraError {
    #[error("unknown extra kind: {0:?}")]
    UnknownKind(String),

    #[error("invalid URI {uri:?}: {reason}")]
    InvalidUri { uri: String, reason: String },

    #[error("invalid source position {0:?}, expected name[line:column]")]
    InvalidSourcePosition(String),

    #[error("topic link without a target uid")]
    EmptyTopicLink,
}

/// Kind of an extra, as written on the `- KIND` line.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub enum ExtraKind {
    File,
    Link,
    Note,
    Topic,
    SrcPosition,
}

impl ExtraKind {
    pub const ALL: [ExtraKind; 5] = [
        ExtraKind::File,
        ExtraKind::Link,
        ExtraKind::Note,
        ExtraKind::Topic,
        ExtraKind::SrcPosition,
    ];

    pub fn name(self) -> &'static str {
        match self {
            ExtraKind::File => "FILE",
            ExtraKind::Link => "LINK",
            ExtraKind::Note => "NOTE",
            ExtraKind::Topic => "TOPIC",
            ExtraKind::SrcPosition => "SRC_POSITION",
        }
    }

    /// Decode a block payload into an extra of this kind.
    ///
    /// URI and topic link payloads are trimmed, notes and source positions
    /// are taken as they are.
    pub fn make(self, text: &str) -> Result<Extra, ExtraError> {
        match self {
            ExtraKind::File => MmdUri::parse(text.trim()).map(Extra::File),
            ExtraKind::Link => MmdUri::parse(text.trim()).map(Extra::Link),
            ExtraKind::Note => Ok(Extra::Note(text.to_string())),
            ExtraKind::Topic => match text.trim() {
                "" => Err(ExtraError::EmptyTopicLink),
                uid => Ok(Extra::Topic(uid.to_string())),
            },
            ExtraKind::SrcPosition => text.parse().map(Extra::SrcPosition),
        }
    }
}

impl FromStr for ExtraKind {
    type Err = ExtraError;

    fn from_str(name: &str) -> Result<Self, Self::Err> {
        Self::ALL
            .into_iter()
            .find(|kind| kind.name() == name)
            .ok_or_else(|| ExtraError::UnknownKind(name.to_string()))
    }
}

impl fmt::Display for ExtraKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

/// Typed payload attached to a topic. A topic holds at most one per kind.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub enum Extra {
    File(MmdUri),
    Link(MmdUri),
    Note(String),
    /// Jump link holding the `topicLinkUID` of the target topic.
    Topic(String),
    SrcPosition(SourcePosition),
}

impl Extra {
    pub fn kind(&self) -> ExtraKind {
        match self {
            Extra::File(_) => ExtraKind::File,
            Extra::Link(_) => ExtraKind::Link,
            Extra::Note(_) => ExtraKind::Note,
            Extra::Topic(_) => ExtraKind::Topic,
            Extra::SrcPosition(_) => ExtraKind::SrcPosition,
        }
    }

    /// Text written inside the fenced block.
    pub fn content(&self) -> String {
        match self {
            Extra::File(uri) | Extra::Link(uri) => uri.to_string(),
            Extra::Note(text) | Extra::Topic(text) => text.clone(),
            Extra::SrcPosition(position) => position.to_string(),
        }
    }

    pub fn as_uri(&self) -> Option<&MmdUri> {
        match self {
            Extra::File(uri) | Extra::Link(uri) => Some(uri),
            _ => None,
        }
    }

    /// Whether a text search should report this extra. Jump links hold an
    /// opaque uid and never match.
    pub fn matches(&self, pattern: &Regex) -> bool {
        match self {
            Extra::Topic(_) => false,
            other => pattern.is_match(&other.content()),
        }
    }
}

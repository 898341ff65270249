use thiserror::Error;

use super::TopicId;

/// Errors raised by tree mutations and lookups.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum TreeError {
    #[error("topic {0:?} does not belong to this map")]
    UnknownTopic(TopicId),

    #[error("the root topic has no parent to move or clone it within")]
    RootTopic,

    #[error("topic {topic:?} cannot move below its own descendant {new_parent:?}")]
    Cycle { topic: TopicId, new_parent: TopicId },

    #[error("topics {0:?} and {1:?} do not share a parent")]
    NotSiblings(TopicId, TopicId),

    #[error("invalid attribute name: {0:?}")]
    InvalidAttributeName(String),

    #[error("invalid code snippet language: {0:?}")]
    InvalidSnippetLanguage(String),
}

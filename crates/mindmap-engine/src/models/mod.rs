pub mod error;
pub mod event;
pub mod extra;
pub mod links;
pub mod map;
pub mod shared;
pub mod source_position;
pub mod topic;
pub mod uri;

pub use error::TreeError;
pub use event::MapEvent;
pub use extra::{Extra, ExtraError, ExtraKind};
pub use links::SearchScope;
pub use map::{MindMap, Preorder};
pub use shared::{ListenerId, MapGuard, SharedMindMap};
pub use source_position::SourcePosition;
pub use topic::{StandardTopicAttribute, TOPIC_UID_ATTRIBUTE, Topic, TopicId};
pub use uri::MmdUri;

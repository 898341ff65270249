use super::TopicId;

/// Change notification recorded by a mutating [`MindMap`](super::MindMap) call.
///
/// Events queue up inside the map and are handed out by
/// [`MindMap::take_events`](super::MindMap::take_events); a
/// [`SharedMindMap`](super::SharedMindMap) delivers them to listeners once
/// its lock guard is dropped.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum MapEvent {
    /// Topics were added, removed or moved.
    StructureChanged,
    /// Text, attributes, extras or code snippets of one topic changed.
    TopicChanged(TopicId),
    /// Document-level attributes changed.
    AttributesChanged,
}

use std::collections::HashSet;
use std::sync::atomic::{AtomicU64, Ordering};

use mindmap_syntax::{Attributes, is_valid_attribute_name};

use super::{Extra, ExtraKind, MapEvent, TOPIC_UID_ATTRIBUTE, Topic, TopicId, TreeError};
use crate::parsing::{self, ParseError, normalize_line_breaks};
use crate::writing::{self, WriteOptions};

static NEXT_MAP_ID: AtomicU64 = AtomicU64::new(1);

/// A mind map document: document attributes and one tree of topics.
///
/// Topics live in an arena owned by the map and are addressed by
/// [`TopicId`]. Every mutation goes through the map, which keeps parent
/// links and child lists in agreement and queues a [`MapEvent`].
#[derive(Debug)]
pub struct MindMap {
    id: u64,
    attributes: Attributes,
    slots: Vec<Slot>,
    free: Vec<usize>,
    live: usize,
    root: TopicId,
    events: Vec<MapEvent>,
    recorded: HashSet<MapEvent>,
}

/// Arena cell. The generation moves on each time the topic in it is freed.
#[derive(Debug, Default)]
struct Slot {
    generation: u32,
    topic: Option<Topic>,
}

impl Default for MindMap {
    fn default() -> Self {
        Self::new()
    }
}

impl MindMap {
    /// Empty map with a root topic without text.
    pub fn new() -> Self {
        let id = NEXT_MAP_ID.fetch_add(1, Ordering::Relaxed);
        Self {
            id,
            attributes: Attributes::new(),
            slots: vec![Slot {
                generation: 0,
                topic: Some(Topic::new(String::new(), None)),
            }],
            free: Vec::new(),
            live: 1,
            root: TopicId {
                map: id,
                slot: 0,
                generation: 0,
            },
            events: Vec::new(),
            recorded: HashSet::new(),
        }
    }

    pub fn parse(text: &str) -> Result<Self, ParseError> {
        parsing::parse_map(text)
    }

    /// Write with [`WriteOptions::default`].
    pub fn write(&self) -> String {
        writing::write_map(self, &WriteOptions::default())
    }

    pub fn write_with(&self, options: &WriteOptions) -> String {
        writing::write_map(self, options)
    }

    pub fn root(&self) -> TopicId {
        self.root
    }

    pub fn topic(&self, id: TopicId) -> Option<&Topic> {
        if id.map != self.id {
            return None;
        }
        let slot = self.slots.get(id.slot)?;
        if slot.generation != id.generation {
            return None;
        }
        slot.topic.as_ref()
    }

    pub fn contains(&self, id: TopicId) -> bool {
        self.topic(id).is_some()
    }

    pub fn topic_count(&self) -> usize {
        self.live
    }

    pub(crate) fn get(&self, id: TopicId) -> Result<&Topic, TreeError> {
        self.topic(id).ok_or(TreeError::UnknownTopic(id))
    }

    pub(crate) fn get_mut(&mut self, id: TopicId) -> Result<&mut Topic, TreeError> {
        if id.map != self.id {
            return Err(TreeError::UnknownTopic(id));
        }
        self.slots
            .get_mut(id.slot)
            .filter(|slot| slot.generation == id.generation)
            .and_then(|slot| slot.topic.as_mut())
            .ok_or(TreeError::UnknownTopic(id))
    }

    fn alloc(&mut self, topic: Topic) -> TopicId {
        let slot = match self.free.pop() {
            Some(slot) => slot,
            None => {
                self.slots.push(Slot::default());
                self.slots.len() - 1
            }
        };
        let cell = &mut self.slots[slot];
        cell.topic = Some(topic);
        self.live += 1;
        TopicId {
            map: self.id,
            slot,
            generation: cell.generation,
        }
    }

    fn release(&mut self, id: TopicId) {
        let Some(cell) = self.slots.get_mut(id.slot) else {
            return;
        };
        if cell.generation != id.generation || cell.topic.take().is_none() {
            return;
        }
        cell.generation = cell.generation.wrapping_add(1);
        self.free.push(id.slot);
        self.live -= 1;
    }

    pub(crate) fn record(&mut self, event: MapEvent) {
        if self.recorded.insert(event) {
            self.events.push(event);
        }
    }

    /// Events recorded since the last call, oldest first, without duplicates.
    pub fn take_events(&mut self) -> Vec<MapEvent> {
        self.recorded.clear();
        std::mem::take(&mut self.events)
    }

    // Document attributes

    pub fn attributes(&self) -> &Attributes {
        &self.attributes
    }

    pub fn attribute(&self, name: &str) -> Option<&str> {
        self.attributes.get(name)
    }

    pub(crate) fn attributes_mut(&mut self) -> &mut Attributes {
        &mut self.attributes
    }

    /// Set or, with `None`, remove a document attribute. Returns whether
    /// anything changed.
    pub fn set_attribute(&mut self, name: &str, value: Option<&str>) -> Result<bool, TreeError> {
        let changed = set_or_remove(&mut self.attributes, name, value)?;
        if changed {
            self.record(MapEvent::AttributesChanged);
        }
        Ok(changed)
    }

    // Topic content

    pub fn set_text(&mut self, id: TopicId, text: impl Into<String>) -> Result<bool, TreeError> {
        let text = normalize_line_breaks(text.into());
        let topic = self.get_mut(id)?;
        if topic.text == text {
            return Ok(false);
        }
        topic.text = text;
        self.record(MapEvent::TopicChanged(id));
        Ok(true)
    }

    pub fn set_topic_attribute(
        &mut self,
        id: TopicId,
        name: &str,
        value: Option<&str>,
    ) -> Result<bool, TreeError> {
        let changed = set_or_remove(&mut self.get_mut(id)?.attributes, name, value)?;
        if changed {
            self.record(MapEvent::TopicChanged(id));
        }
        Ok(changed)
    }

    /// Attach `extra`, replacing and returning an extra of the same kind.
    pub fn set_extra(&mut self, id: TopicId, extra: Extra) -> Result<Option<Extra>, TreeError> {
        let previous = self.get_mut(id)?.extras.insert(extra.kind(), extra);
        self.record(MapEvent::TopicChanged(id));
        Ok(previous)
    }

    pub fn remove_extra(
        &mut self,
        id: TopicId,
        kind: ExtraKind,
    ) -> Result<Option<Extra>, TreeError> {
        let removed = self.get_mut(id)?.extras.remove(&kind);
        if removed.is_some() {
            self.record(MapEvent::TopicChanged(id));
        }
        Ok(removed)
    }

    /// Store `body` as the snippet for `language`, replacing an older one.
    ///
    /// The language is the fence info string, so it must be non-empty, free
    /// of surrounding whitespace and hold no line break or backtick.
    pub fn set_code_snippet(
        &mut self,
        id: TopicId,
        language: &str,
        body: impl Into<String>,
    ) -> Result<Option<String>, TreeError> {
        if language.is_empty()
            || language.trim() != language
            || language.contains(['\n', '\r', '`'])
        {
            return Err(TreeError::InvalidSnippetLanguage(language.to_string()));
        }
        let previous = self
            .get_mut(id)?
            .code_snippets
            .insert(language.to_string(), body.into());
        self.record(MapEvent::TopicChanged(id));
        Ok(previous)
    }

    pub fn remove_code_snippet(
        &mut self,
        id: TopicId,
        language: &str,
    ) -> Result<Option<String>, TreeError> {
        let removed = self.get_mut(id)?.code_snippets.remove(language);
        if removed.is_some() {
            self.record(MapEvent::TopicChanged(id));
        }
        Ok(removed)
    }

    // Structure

    /// Append a new last child of `parent`.
    pub fn add_child(
        &mut self,
        parent: TopicId,
        text: impl Into<String>,
    ) -> Result<TopicId, TreeError> {
        self.make_child(parent, text, None)
    }

    /// Create a child of `parent` right after `after`, or last when `after`
    /// is `None` or not a child of `parent`.
    pub fn make_child(
        &mut self,
        parent: TopicId,
        text: impl Into<String>,
        after: Option<TopicId>,
    ) -> Result<TopicId, TreeError> {
        self.get(parent)?;
        let id = self.alloc(Topic::new(text.into(), Some(parent)));
        let children = &mut self.get_mut(parent)?.children;
        let index = after
            .and_then(|after| children.iter().position(|c| *c == after))
            .map_or(children.len(), |i| i + 1);
        children.insert(index, id);
        self.record(MapEvent::StructureChanged);
        Ok(id)
    }

    /// Child creation for the parser; `parent` is always a live topic.
    pub(crate) fn push_child(&mut self, parent: TopicId, text: String) -> TopicId {
        let id = self.alloc(Topic::new(text, Some(parent)));
        if let Ok(topic) = self.get_mut(parent) {
            topic.children.push(id);
        }
        id
    }

    /// Remove `id` with its subtree, together with every jump link in the
    /// remaining tree that targets a removed topic.
    ///
    /// The root cannot be removed; deleting it clears its content and
    /// children instead.
    pub fn delete(&mut self, id: TopicId) -> Result<(), TreeError> {
        self.get(id)?;
        let removed: Vec<TopicId> = self.descendants(id).collect();
        let uids: HashSet<String> = removed
            .iter()
            .filter_map(|t| self.topic(*t)?.attribute(TOPIC_UID_ATTRIBUTE))
            .map(str::to_string)
            .collect();

        match self.get(id)?.parent {
            Some(parent) => {
                self.get_mut(parent)?.children.retain(|c| *c != id);
                for topic in &removed {
                    self.release(*topic);
                }
            }
            None => {
                let root = self.get_mut(id)?;
                root.text.clear();
                root.attributes.clear();
                root.extras.clear();
                root.code_snippets.clear();
                root.children.clear();
                for topic in removed.iter().skip(1) {
                    self.release(*topic);
                }
            }
        }

        self.remove_links_to(&uids);
        self.record(MapEvent::StructureChanged);
        Ok(())
    }

    fn remove_links_to(&mut self, uids: &HashSet<String>) {
        if uids.is_empty() {
            return;
        }
        let linking: Vec<TopicId> = self
            .iter()
            .filter(|id| {
                matches!(
                    self.topic(*id).and_then(|t| t.extra(ExtraKind::Topic)),
                    Some(Extra::Topic(uid)) if uids.contains(uid)
                )
            })
            .collect();
        for id in linking {
            if let Ok(topic) = self.get_mut(id) {
                topic.extras.remove(&ExtraKind::Topic);
                self.record(MapEvent::TopicChanged(id));
            }
        }
    }

    /// Move `id` to the end of `new_parent`'s children.
    ///
    /// Returns `false` when `new_parent` already is the parent.
    pub fn attach_to(&mut self, id: TopicId, new_parent: TopicId) -> Result<bool, TreeError> {
        let old_parent = self.get(id)?.parent.ok_or(TreeError::RootTopic)?;
        self.get(new_parent)?;
        if id == new_parent || self.is_ancestor(id, new_parent) {
            return Err(TreeError::Cycle {
                topic: id,
                new_parent,
            });
        }
        if old_parent == new_parent {
            return Ok(false);
        }
        self.get_mut(old_parent)?.children.retain(|c| *c != id);
        self.get_mut(new_parent)?.children.push(id);
        self.get_mut(id)?.parent = Some(new_parent);
        self.record(MapEvent::StructureChanged);
        Ok(true)
    }

    /// Whether `ancestor` lies on the path from the root to `id`, excluding
    /// `id` itself.
    pub fn is_ancestor(&self, ancestor: TopicId, id: TopicId) -> bool {
        let mut current = self.topic(id).and_then(Topic::parent);
        while let Some(topic) = current {
            if topic == ancestor {
                return true;
            }
            current = self.topic(topic).and_then(Topic::parent);
        }
        false
    }

    pub fn place_before(&mut self, id: TopicId, anchor: TopicId) -> Result<bool, TreeError> {
        self.place_next_to(id, anchor, false)
    }

    pub fn place_after(&mut self, id: TopicId, anchor: TopicId) -> Result<bool, TreeError> {
        self.place_next_to(id, anchor, true)
    }

    fn place_next_to(
        &mut self,
        id: TopicId,
        anchor: TopicId,
        after: bool,
    ) -> Result<bool, TreeError> {
        let parent = self.get(id)?.parent.ok_or(TreeError::RootTopic)?;
        if self.get(anchor)?.parent != Some(parent) {
            return Err(TreeError::NotSiblings(id, anchor));
        }
        if id == anchor {
            return Ok(false);
        }
        let children = &mut self.get_mut(parent)?.children;
        let before = children.clone();
        children.retain(|c| *c != id);
        let Some(index) = children.iter().position(|c| *c == anchor) else {
            return Err(TreeError::NotSiblings(id, anchor));
        };
        children.insert(if after { index + 1 } else { index }, id);
        let changed = *children != before;
        if changed {
            self.record(MapEvent::StructureChanged);
        }
        Ok(changed)
    }

    pub fn make_first(&mut self, id: TopicId) -> Result<bool, TreeError> {
        self.move_within_parent(id, true)
    }

    pub fn make_last(&mut self, id: TopicId) -> Result<bool, TreeError> {
        self.move_within_parent(id, false)
    }

    fn move_within_parent(&mut self, id: TopicId, first: bool) -> Result<bool, TreeError> {
        let parent = self.get(id)?.parent.ok_or(TreeError::RootTopic)?;
        let children = &mut self.get_mut(parent)?.children;
        let edge = if first { children.first() } else { children.last() };
        if edge == Some(&id) {
            return Ok(false);
        }
        children.retain(|c| *c != id);
        if first {
            children.insert(0, id);
        } else {
            children.push(id);
        }
        self.record(MapEvent::StructureChanged);
        Ok(true)
    }

    /// Copy `id` (with its subtree when `deep`) and append the copy to the
    /// same parent. Copies never carry `topicLinkUID`, so jump links keep
    /// pointing at the original.
    pub fn clone_topic(&mut self, id: TopicId, deep: bool) -> Result<TopicId, TreeError> {
        let parent = self.get(id)?.parent.ok_or(TreeError::RootTopic)?;
        let copy = self.copy_subtree(id, parent, deep)?;
        self.get_mut(parent)?.children.push(copy);

        let copied: Vec<TopicId> = self.descendants(copy).collect();
        for topic in copied {
            self.get_mut(topic)?.attributes.remove(TOPIC_UID_ATTRIBUTE);
        }
        self.record(MapEvent::StructureChanged);
        Ok(copy)
    }

    fn copy_subtree(
        &mut self,
        source: TopicId,
        parent: TopicId,
        deep: bool,
    ) -> Result<TopicId, TreeError> {
        let topic = self.get(source)?;
        let content = topic.copy_content(Some(parent));
        let children = if deep {
            topic.children.clone()
        } else {
            Vec::new()
        };

        let copy = self.alloc(content);
        for child in children {
            let child_copy = self.copy_subtree(child, copy, true)?;
            self.get_mut(copy)?.children.push(child_copy);
        }
        Ok(copy)
    }

    // Navigation

    /// Depth below the root; the root is level 0.
    pub fn level(&self, id: TopicId) -> Result<usize, TreeError> {
        Ok(self.path(id)?.len() - 1)
    }

    /// Topics from the root down to `id`, both included.
    pub fn path(&self, id: TopicId) -> Result<Vec<TopicId>, TreeError> {
        let mut path = vec![id];
        let mut current = self.get(id)?.parent;
        while let Some(topic) = current {
            path.push(topic);
            current = self.get(topic)?.parent;
        }
        path.reverse();
        Ok(path)
    }

    /// Child indexes from the root down to `id`. The first element is always
    /// 0 and stands for the root itself.
    ///
    /// Position paths address the same topic in a clone of the map.
    pub fn position_path(&self, id: TopicId) -> Result<Vec<usize>, TreeError> {
        let path = self.path(id)?;
        let mut positions = vec![0];
        for pair in path.windows(2) {
            let index = self
                .get(pair[0])?
                .children
                .iter()
                .position(|c| *c == pair[1])
                .ok_or(TreeError::UnknownTopic(pair[1]))?;
            positions.push(index);
        }
        Ok(positions)
    }

    pub fn find_for_position_path(&self, positions: &[usize]) -> Option<TopicId> {
        let (_, rest) = positions.split_first()?;
        let mut current = self.root;
        for index in rest {
            current = *self.topic(current)?.children.get(*index)?;
        }
        Some(current)
    }

    /// Preorder walk over the whole tree.
    pub fn iter(&self) -> Preorder<'_> {
        self.descendants(self.root)
    }

    /// Preorder walk over `id` and its subtree. Empty for an unknown id.
    pub fn descendants(&self, id: TopicId) -> Preorder<'_> {
        let stack = if self.contains(id) { vec![id] } else { Vec::new() };
        Preorder { map: self, stack }
    }

    /// Whether both maps hold the same document attributes and trees with
    /// equal topic content in the same order.
    pub fn content_eq(&self, other: &MindMap) -> bool {
        self.attributes == other.attributes && self.subtree_eq(self.root, other, other.root)
    }

    fn subtree_eq(&self, id: TopicId, other: &MindMap, other_id: TopicId) -> bool {
        let (Some(a), Some(b)) = (self.topic(id), other.topic(other_id)) else {
            return false;
        };
        a.same_content(b)
            && a.children.len() == b.children.len()
            && a.children
                .iter()
                .zip(&b.children)
                .all(|(x, y)| self.subtree_eq(*x, other, *y))
    }
}

impl Clone for MindMap {
    /// Independent copy with its own map identity and fresh topic uids.
    fn clone(&self) -> Self {
        let id = NEXT_MAP_ID.fetch_add(1, Ordering::Relaxed);
        let rehome = move |topic: TopicId| TopicId { map: id, ..topic };
        let slots = self
            .slots
            .iter()
            .map(|slot| Slot {
                generation: slot.generation,
                topic: slot.topic.as_ref().map(|topic| Topic {
                    children: topic.children.iter().copied().map(rehome).collect(),
                    ..topic.copy_content(topic.parent.map(rehome))
                }),
            })
            .collect();

        Self {
            id,
            attributes: self.attributes.clone(),
            slots,
            free: self.free.clone(),
            live: self.live,
            root: rehome(self.root),
            events: Vec::new(),
            recorded: HashSet::new(),
        }
    }
}

/// Preorder iterator returned by [`MindMap::iter`] and [`MindMap::descendants`].
pub struct Preorder<'a> {
    map: &'a MindMap,
    stack: Vec<TopicId>,
}

impl Iterator for Preorder<'_> {
    type Item = TopicId;

    fn next(&mut self) -> Option<TopicId> {
        let id = self.stack.pop()?;
        if let Some(topic) = self.map.topic(id) {
            self.stack.extend(topic.children.iter().rev());
        }
        Some(id)
    }
}

fn set_or_remove(
    attributes: &mut Attributes,
    name: &str,
    value: Option<&str>,
) -> Result<bool, TreeError> {
    match value {
        Some(value) => {
            if !is_valid_attribute_name(name) {
                return Err(TreeError::InvalidAttributeName(name.to_string()));
            }
            Ok(attributes.insert(name, value).as_deref() != Some(value))
        }
        None => Ok(attributes.remove(name).is_some()),
    }
}

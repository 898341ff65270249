//! Lookups across the topic tree: jump links, text search and file links.

use std::path::{Path, PathBuf};

use regex::Regex;
use uuid::Uuid;

use super::uri::normalize_path;
use super::{
    Extra, ExtraKind, MapEvent, MindMap, MmdUri, TOPIC_UID_ATTRIBUTE, Topic, TopicId, TreeError,
};

/// What [`MindMap::find_next`] and [`MindMap::find_prev`] look at.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SearchScope {
    pub in_text: bool,
    pub extras: Vec<ExtraKind>,
}

impl SearchScope {
    pub fn text_only() -> Self {
        Self {
            in_text: true,
            extras: Vec::new(),
        }
    }

    pub fn everything() -> Self {
        Self {
            in_text: true,
            extras: ExtraKind::ALL.to_vec(),
        }
    }

    fn matches(&self, topic: &Topic, pattern: &Regex) -> bool {
        (self.in_text && pattern.is_match(&topic.text))
            || self
                .extras
                .iter()
                .filter_map(|kind| topic.extra(*kind))
                .any(|extra| extra.matches(pattern))
    }
}

impl Default for SearchScope {
    fn default() -> Self {
        Self::text_only()
    }
}

impl MindMap {
    pub fn find_topic_for_uid(&self, uid: &str) -> Option<TopicId> {
        self.iter().find(|id| {
            self.topic(*id)
                .and_then(|t| t.attribute(TOPIC_UID_ATTRIBUTE))
                == Some(uid)
        })
    }

    /// Target of a TOPIC extra. `None` for a dangling link or another kind
    /// of extra.
    pub fn find_topic_for_link(&self, link: &Extra) -> Option<TopicId> {
        match link {
            Extra::Topic(uid) => self.find_topic_for_uid(uid),
            _ => None,
        }
    }

    /// TOPIC extra pointing at `target`, giving it a uid first if needed.
    pub fn make_link_to(&mut self, target: TopicId) -> Result<Extra, TreeError> {
        if let Some(uid) = self.get(target)?.attribute(TOPIC_UID_ATTRIBUTE) {
            return Ok(Extra::Topic(uid.to_string()));
        }
        let uid = loop {
            let candidate = Uuid::new_v4().simple().to_string().to_uppercase();
            if self.find_topic_for_uid(&candidate).is_none() {
                break candidate;
            }
        };
        self.get_mut(target)?
            .attributes
            .insert(TOPIC_UID_ATTRIBUTE, uid.clone());
        self.record(MapEvent::TopicChanged(target));
        Ok(Extra::Topic(uid))
    }

    pub fn find_all_topics_for_extra_kind(&self, kind: ExtraKind) -> Vec<TopicId> {
        self.iter()
            .filter(|id| self.topic(*id).is_some_and(|t| t.extra(kind).is_some()))
            .collect()
    }

    /// Value of `name` on the nearest ancestor of `id` that has it. The
    /// topic itself is not consulted.
    pub fn find_attribute_in_ancestors(&self, id: TopicId, name: &str) -> Option<&str> {
        let mut current = self.topic(id)?.parent;
        while let Some(ancestor) = current {
            let topic = self.topic(ancestor)?;
            if let Some(value) = topic.attribute(name) {
                return Some(value);
            }
            current = topic.parent;
        }
        None
    }

    /// Remove the named attributes from `id` and all its descendants.
    pub fn remove_attribute_from_subtree(
        &mut self,
        id: TopicId,
        names: &[&str],
    ) -> Result<bool, TreeError> {
        self.get(id)?;
        let subtree: Vec<TopicId> = self.descendants(id).collect();
        let mut changed = false;
        for topic in subtree {
            let attributes = &mut self.get_mut(topic)?.attributes;
            let removed = names
                .iter()
                .filter(|name| attributes.remove(name).is_some())
                .count();
            if removed > 0 {
                changed = true;
                self.record(MapEvent::TopicChanged(topic));
            }
        }
        Ok(changed)
    }

    /// Remove extras of the given kinds from `id` and all its descendants.
    pub fn remove_extra_from_subtree(
        &mut self,
        id: TopicId,
        kinds: &[ExtraKind],
    ) -> Result<bool, TreeError> {
        self.get(id)?;
        let subtree: Vec<TopicId> = self.descendants(id).collect();
        let mut changed = false;
        for topic in subtree {
            let extras = &mut self.get_mut(topic)?.extras;
            let removed = kinds
                .iter()
                .filter(|kind| extras.remove(*kind).is_some())
                .count();
            if removed > 0 {
                changed = true;
                self.record(MapEvent::TopicChanged(topic));
            }
        }
        Ok(changed)
    }

    /// First topic after `from` in preorder that matches `pattern`. Starts
    /// at the root when `from` is `None`. The search does not wrap.
    pub fn find_next(
        &self,
        from: Option<TopicId>,
        pattern: &Regex,
        scope: &SearchScope,
    ) -> Option<TopicId> {
        let order: Vec<TopicId> = self.iter().collect();
        let start = match from {
            Some(from) => order.iter().position(|id| *id == from)? + 1,
            None => 0,
        };
        order[start..]
            .iter()
            .copied()
            .find(|id| self.topic(*id).is_some_and(|t| scope.matches(t, pattern)))
    }

    /// Last topic before `from` in preorder that matches `pattern`. Starts
    /// at the last topic when `from` is `None`.
    pub fn find_prev(
        &self,
        from: Option<TopicId>,
        pattern: &Regex,
        scope: &SearchScope,
    ) -> Option<TopicId> {
        let order: Vec<TopicId> = self.iter().collect();
        let end = match from {
            Some(from) => order.iter().position(|id| *id == from)?,
            None => order.len(),
        };
        order[..end]
            .iter()
            .rev()
            .copied()
            .find(|id| self.topic(*id).is_some_and(|t| scope.matches(t, pattern)))
    }

    fn file_link_path(&self, id: TopicId, base: &Path) -> Option<PathBuf> {
        match self.topic(id)?.extra(ExtraKind::File)? {
            Extra::File(uri) => uri.to_file_path(base).map(|path| normalize_path(&path)),
            _ => None,
        }
    }

    fn topics_linking_to(&self, base: &Path, file: &Path, include_children: bool) -> Vec<TopicId> {
        let file = normalize_path(file);
        self.iter()
            .filter(|id| {
                self.file_link_path(*id, base).is_some_and(|path| {
                    path == file || (include_children && path.starts_with(&file))
                })
            })
            .collect()
    }

    /// Whether any FILE extra resolves to `file` when read relative to `base`.
    pub fn contains_file_link(&self, base: &Path, file: &Path) -> bool {
        !self.topics_linking_to(base, file, false).is_empty()
    }

    /// Remove FILE extras pointing at `file` or at anything below it.
    pub fn delete_all_links_to_file(&mut self, base: &Path, file: &Path) -> bool {
        let linking = self.topics_linking_to(base, file, true);
        for id in &linking {
            if let Ok(topic) = self.get_mut(*id) {
                topic.extras.remove(&ExtraKind::File);
                self.record(MapEvent::TopicChanged(*id));
            }
        }
        !linking.is_empty()
    }

    /// Point FILE extras that resolve to `old` at `new` instead.
    pub fn replace_all_links_to_file(&mut self, base: &Path, old: &Path, new: &MmdUri) -> bool {
        let linking = self.topics_linking_to(base, old, false);
        for id in &linking {
            if let Ok(topic) = self.get_mut(*id) {
                topic.extras.insert(ExtraKind::File, Extra::File(new.clone()));
                self.record(MapEvent::TopicChanged(*id));
            }
        }
        !linking.is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    fn linked_map() -> (MindMap, TopicId, TopicId) {
        let mut map = MindMap::new();
        let root = map.root();
        let target = map.add_child(root, "Target").unwrap();
        let source = map.add_child(root, "Source").unwrap();
        let link = map.make_link_to(target).unwrap();
        map.set_extra(source, link).unwrap();
        (map, target, source)
    }

    #[test]
    fn make_link_assigns_upper_hex_uid() {
        let (map, target, source) = linked_map();
        let uid = map
            .topic(target)
            .unwrap()
            .attribute(TOPIC_UID_ATTRIBUTE)
            .unwrap();
        assert_eq!(uid.len(), 32);
        assert!(
            uid.chars()
                .all(|c| c.is_ascii_digit() || ('A'..='F').contains(&c))
        );

        let link = map.topic(source).unwrap().extra(ExtraKind::Topic).unwrap();
        assert_eq!(map.find_topic_for_link(link), Some(target));
    }

    #[test]
    fn make_link_reuses_existing_uid() {
        let (mut map, target, _) = linked_map();
        let first = map.make_link_to(target).unwrap();
        let second = map.make_link_to(target).unwrap();
        assert_eq!(first, second);
    }

    #[test]
    fn dangling_link_resolves_to_none() {
        let map = MindMap::new();
        assert_eq!(
            map.find_topic_for_link(&Extra::Topic("MISSING".to_string())),
            None
        );
        assert_eq!(
            map.find_topic_for_link(&Extra::Note("x".to_string())),
            None
        );
    }

    #[test]
    fn deleting_target_removes_links_to_it() {
        let (mut map, target, source) = linked_map();
        map.delete(target).unwrap();
        assert_eq!(map.topic(source).unwrap().extra(ExtraKind::Topic), None);
        assert!(map.find_all_topics_for_extra_kind(ExtraKind::Topic).is_empty());
    }

    #[test]
    fn deleting_parent_of_target_removes_links() {
        let mut map = MindMap::new();
        let root = map.root();
        let parent = map.add_child(root, "Parent").unwrap();
        let target = map.add_child(parent, "Target").unwrap();
        let source = map.add_child(root, "Source").unwrap();
        let link = map.make_link_to(target).unwrap();
        map.set_extra(source, link).unwrap();

        map.delete(parent).unwrap();
        assert!(!map.topic(source).unwrap().has_extras());
    }

    #[test]
    fn attribute_inherited_from_ancestors() {
        let mut map = MindMap::new();
        let root = map.root();
        map.set_topic_attribute(root, "fillColor", Some("#111"))
            .unwrap();
        let child = map.add_child(root, "child").unwrap();
        let grandchild = map.add_child(child, "grandchild").unwrap();
        assert_eq!(
            map.find_attribute_in_ancestors(grandchild, "fillColor"),
            Some("#111")
        );
        assert_eq!(map.find_attribute_in_ancestors(root, "fillColor"), None);
    }

    #[test]
    fn remove_from_subtree() {
        let mut map = MindMap::new();
        let root = map.root();
        let a = map.add_child(root, "a").unwrap();
        let b = map.add_child(a, "b").unwrap();
        for id in [root, a, b] {
            map.set_topic_attribute(id, "collapsed", Some("true"))
                .unwrap();
            map.set_extra(id, Extra::Note("n".to_string())).unwrap();
        }
        map.take_events();

        assert!(map.remove_attribute_from_subtree(a, &["collapsed"]).unwrap());
        assert!(map.remove_extra_from_subtree(a, &[ExtraKind::Note]).unwrap());
        assert_eq!(map.topic(root).unwrap().attribute("collapsed"), Some("true"));
        assert_eq!(map.topic(b).unwrap().attribute("collapsed"), None);
        assert!(map.topic(root).unwrap().has_extras());
        assert!(!map.topic(b).unwrap().has_extras());
        assert_eq!(
            map.take_events(),
            vec![MapEvent::TopicChanged(a), MapEvent::TopicChanged(b)]
        );
        assert!(!map.remove_attribute_from_subtree(a, &["collapsed"]).unwrap());
    }

    #[test]
    fn search_forward_and_backward() {
        let mut map = MindMap::new();
        let root = map.root();
        let first = map.add_child(root, "apple").unwrap();
        let note = map.add_child(root, "banana").unwrap();
        let last = map.add_child(root, "apple pie").unwrap();
        map.set_extra(note, Extra::Note("contains apple".to_string()))
            .unwrap();
        let pattern = Regex::new("(?i)APPLE").unwrap();

        let text_only = SearchScope::text_only();
        assert_eq!(map.find_next(None, &pattern, &text_only), Some(first));
        assert_eq!(map.find_next(Some(first), &pattern, &text_only), Some(last));
        assert_eq!(map.find_next(Some(last), &pattern, &text_only), None);

        let everything = SearchScope::everything();
        assert_eq!(map.find_next(Some(first), &pattern, &everything), Some(note));
        assert_eq!(map.find_prev(None, &pattern, &everything), Some(last));
        assert_eq!(map.find_prev(Some(note), &pattern, &everything), Some(first));
        assert_eq!(map.find_prev(Some(first), &pattern, &everything), None);
    }

    #[cfg(unix)]
    #[test]
    fn file_links_follow_renames_and_deletes() {
        let base = Path::new("/maps");
        let mut map = MindMap::new();
        let root = map.root();
        let doc = map.add_child(root, "doc").unwrap();
        let nested = map.add_child(root, "nested").unwrap();
        map.set_extra(doc, Extra::File(MmdUri::parse("docs/a.txt").unwrap()))
            .unwrap();
        map.set_extra(
            nested,
            Extra::File(MmdUri::parse("file:///maps/docs/sub/b.txt").unwrap()),
        )
        .unwrap();

        assert!(map.contains_file_link(base, Path::new("/maps/docs/a.txt")));
        assert!(map.contains_file_link(base, Path::new("/maps/x/../docs/a.txt")));
        assert!(!map.contains_file_link(base, Path::new("/maps/docs")));

        let renamed = MmdUri::parse("docs/renamed.txt").unwrap();
        assert!(map.replace_all_links_to_file(base, Path::new("/maps/docs/a.txt"), &renamed));
        assert_eq!(
            map.topic(doc).unwrap().extra(ExtraKind::File),
            Some(&Extra::File(renamed))
        );

        assert!(map.delete_all_links_to_file(base, Path::new("/maps/docs")));
        assert!(map.find_all_topics_for_extra_kind(ExtraKind::File).is_empty());
    }
}

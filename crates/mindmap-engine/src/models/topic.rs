use std::collections::BTreeMap;
use std::fmt;
use std::hash::{Hash, Hasher};
use std::sync::atomic::{AtomicU64, Ordering};

use mindmap_syntax::Attributes;

use super::{Extra, ExtraKind};
use crate::parsing::normalize_line_breaks;

/// Attribute holding the uid that TOPIC extras point at.
pub const TOPIC_UID_ATTRIBUTE: &str = "topicLinkUID";

static NEXT_LOCAL_UID: AtomicU64 = AtomicU64::new(1);

/// Handle of a topic inside one [`MindMap`](super::MindMap).
///
/// Handles are only valid for the map that issued them; a clone of the map
/// has its own handles. A handle of a deleted topic stays invalid after its
/// slot is reused.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct TopicId {
    pub(crate) map: u64,
    pub(crate) slot: usize,
    pub(crate) generation: u32,
}

/// Attribute names the mind map editors understand.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum StandardTopicAttribute {
    BorderColor,
    FillColor,
    TextColor,
    LeftSide,
    Collapsed,
    TopicLinkUid,
    Emoticon,
    Image,
    ImageName,
    ImageUri,
    Align,
}

impl StandardTopicAttribute {
    pub const ALL: [StandardTopicAttribute; 11] = [
        StandardTopicAttribute::BorderColor,
        StandardTopicAttribute::FillColor,
        StandardTopicAttribute::TextColor,
        StandardTopicAttribute::LeftSide,
        StandardTopicAttribute::Collapsed,
        StandardTopicAttribute::TopicLinkUid,
        StandardTopicAttribute::Emoticon,
        StandardTopicAttribute::Image,
        StandardTopicAttribute::ImageName,
        StandardTopicAttribute::ImageUri,
        StandardTopicAttribute::Align,
    ];

    pub fn name(self) -> &'static str {
        match self {
            StandardTopicAttribute::BorderColor => "borderColor",
            StandardTopicAttribute::FillColor => "fillColor",
            StandardTopicAttribute::TextColor => "textColor",
            StandardTopicAttribute::LeftSide => "leftSide",
            StandardTopicAttribute::Collapsed => "collapsed",
            StandardTopicAttribute::TopicLinkUid => TOPIC_UID_ATTRIBUTE,
            StandardTopicAttribute::Emoticon => "mmd.emoticon",
            StandardTopicAttribute::Image => "mmd.image",
            StandardTopicAttribute::ImageName => "mmd.image.name",
            StandardTopicAttribute::ImageUri => "mmd.image.uri",
            StandardTopicAttribute::Align => "align",
        }
    }

    pub fn from_name(name: &str) -> Option<Self> {
        Self::ALL.into_iter().find(|a| a.name() == name)
    }
}

impl fmt::Display for StandardTopicAttribute {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

/// One node of the mind map.
///
/// Topics are owned by their map and changed through it. Equality is
/// identity: two topics with the same content are still different topics.
#[derive(Debug)]
pub struct Topic {
    pub(crate) local_uid: u64,
    pub(crate) text: String,
    pub(crate) attributes: Attributes,
    pub(crate) extras: BTreeMap<ExtraKind, Extra>,
    pub(crate) code_snippets: BTreeMap<String, String>,
    pub(crate) parent: Option<TopicId>,
    pub(crate) children: Vec<TopicId>,
}

impl Topic {
    pub(crate) fn new(text: String, parent: Option<TopicId>) -> Self {
        Self {
            local_uid: NEXT_LOCAL_UID.fetch_add(1, Ordering::Relaxed),
            text: normalize_line_breaks(text),
            attributes: Attributes::new(),
            extras: BTreeMap::new(),
            code_snippets: BTreeMap::new(),
            parent,
            children: Vec::new(),
        }
    }

    /// Fresh topic with the same content and no children.
    pub(crate) fn copy_content(&self, parent: Option<TopicId>) -> Self {
        Self {
            attributes: self.attributes.clone(),
            extras: self.extras.clone(),
            code_snippets: self.code_snippets.clone(),
            ..Self::new(self.text.clone(), parent)
        }
    }

    pub fn local_uid(&self) -> u64 {
        self.local_uid
    }

    pub fn text(&self) -> &str {
        &self.text
    }

    pub fn attributes(&self) -> &Attributes {
        &self.attributes
    }

    pub fn attribute(&self, name: &str) -> Option<&str> {
        self.attributes.get(name)
    }

    pub fn extras(&self) -> impl Iterator<Item = &Extra> {
        self.extras.values()
    }

    pub fn extra(&self, kind: ExtraKind) -> Option<&Extra> {
        self.extras.get(&kind)
    }

    pub fn has_extras(&self) -> bool {
        !self.extras.is_empty()
    }

    /// Code snippets by language, in language order.
    pub fn code_snippets(&self) -> impl Iterator<Item = (&str, &str)> {
        self.code_snippets
            .iter()
            .map(|(language, body)| (language.as_str(), body.as_str()))
    }

    pub fn code_snippet(&self, language: &str) -> Option<&str> {
        self.code_snippets.get(language).map(String::as_str)
    }

    pub fn parent(&self) -> Option<TopicId> {
        self.parent
    }

    pub fn children(&self) -> &[TopicId] {
        &self.children
    }

    pub fn is_root(&self) -> bool {
        self.parent.is_none()
    }

    /// Content equality: text, attributes, extras and code snippets.
    pub(crate) fn same_content(&self, other: &Topic) -> bool {
        self.text == other.text
            && self.attributes == other.attributes
            && self.extras == other.extras
            && self.code_snippets == other.code_snippets
    }
}

impl PartialEq for Topic {
    fn eq(&self, other: &Self) -> bool {
        self.local_uid == other.local_uid
    }
}

impl Eq for Topic {}

impl Hash for Topic {
    fn hash<H: Hasher>(&self, state: &mut H) {
        self.local_uid.hash(state);
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn identical_content_is_not_equal() {
        let a = Topic::new("same".to_string(), None);
        let b = Topic::new("same".to_string(), None);
        assert_ne!(a, b);
        assert!(a.same_content(&b));
    }

    #[test]
    fn copy_gets_new_identity() {
        let mut original = Topic::new("x".to_string(), None);
        original.attributes.insert("fillColor", "#FFF");
        let copy = original.copy_content(None);
        assert_ne!(copy.local_uid(), original.local_uid());
        assert_eq!(copy.attribute("fillColor"), Some("#FFF"));
    }

    #[test]
    fn standard_attribute_names() {
        for attribute in StandardTopicAttribute::ALL {
            assert_eq!(
                StandardTopicAttribute::from_name(attribute.name()),
                Some(attribute)
            );
        }
        assert_eq!(
            StandardTopicAttribute::TopicLinkUid.name(),
            TOPIC_UID_ATTRIBUTE
        );
    }
}

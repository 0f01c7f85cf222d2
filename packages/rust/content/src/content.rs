//! The conceptual content container.

use std::path::{Path, PathBuf};

use serde::Serialize;

use conceptbuild_shared::{is_valid_id, new_id};

use crate::item::{TopicItem, find_parent, remove_from};

/// Current content file format version.
pub const CONTENT_VERSION: &str = "1.0";

/// A `<category name=".." description=".."/>` entry.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Category {
    pub name: String,
    pub description: String,
}

/// The root of a conceptual topic tree plus its project-level settings.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ConceptualContent {
    /// Content id from the strict `General` property group.
    pub id: String,
    pub version: String,
    /// Source file this content was read from (or will be saved to).
    pub content_file: Option<PathBuf>,
    /// Directory relative document paths are resolved against.
    pub docs_dir: PathBuf,
    /// Authored companion files are expected beside each document.
    pub companion_files: bool,
    /// Id of the topic shown first.
    pub default_topic: Option<String>,
    pub categories: Vec<Category>,
    /// Free-form key/value properties, in authored order.
    pub properties: Vec<(String, String)>,
    items: Vec<TopicItem>,
    related: Vec<TopicItem>,
}

impl Default for ConceptualContent {
    fn default() -> Self {
        Self::new(PathBuf::new())
    }
}

impl ConceptualContent {
    pub fn new(docs_dir: impl Into<PathBuf>) -> Self {
        Self {
            id: new_id(),
            version: CONTENT_VERSION.to_string(),
            content_file: None,
            docs_dir: docs_dir.into(),
            companion_files: false,
            default_topic: None,
            categories: Vec::new(),
            properties: Vec::new(),
            items: Vec::new(),
            related: Vec::new(),
        }
    }

    /// Root items of the primary hierarchy.
    pub fn items(&self) -> &[TopicItem] {
        &self.items
    }

    pub fn items_mut(&mut self) -> &mut Vec<TopicItem> {
        &mut self.items
    }

    /// Topics tracked outside the primary hierarchy.
    pub fn related_topics(&self) -> &[TopicItem] {
        &self.related
    }

    /// Append a root item. An existing root item with the same id is
    /// replaced in place, keeping its position.
    pub fn add(&mut self, item: TopicItem) {
        let existing = self
            .items
            .iter()
            .position(|i| is_valid_id(&i.id) && i.id.eq_ignore_ascii_case(&item.id));
        match existing {
            Some(pos) => self.items[pos] = item,
            None => self.items.push(item),
        }
    }

    /// Track a related topic. Duplicate ids are ignored.
    pub fn add_related(&mut self, item: TopicItem) -> bool {
        if self.related.iter().any(|r| r.id.eq_ignore_ascii_case(&item.id)) {
            return false;
        }
        self.related.push(item);
        true
    }

    pub fn add_category(&mut self, name: impl Into<String>, description: impl Into<String>) {
        let name = name.into();
        if self.categories.iter().any(|c| c.name.eq_ignore_ascii_case(&name)) {
            return;
        }
        self.categories.push(Category {
            name,
            description: description.into(),
        });
    }

    /// Set a property, replacing an earlier value for the same key.
    pub fn set_property(&mut self, key: impl Into<String>, value: impl Into<String>) {
        let key = key.into();
        let value = value.into();
        match self.properties.iter_mut().find(|(k, _)| *k == key) {
            Some(entry) => entry.1 = value,
            None => self.properties.push((key, value)),
        }
    }

    pub fn property(&self, key: &str) -> Option<&str> {
        self.properties
            .iter()
            .find(|(k, _)| k == key)
            .map(|(_, v)| v.as_str())
    }

    /// Find an item anywhere in the hierarchy or among related topics.
    pub fn find(&self, id: &str) -> Option<&TopicItem> {
        self.items
            .iter()
            .chain(self.related.iter())
            .find_map(|i| i.find(id))
    }

    pub fn find_mut(&mut self, id: &str) -> Option<&mut TopicItem> {
        self.items
            .iter_mut()
            .chain(self.related.iter_mut())
            .find_map(|i| i.find_mut(id))
    }

    /// Parent of `id` within the primary hierarchy.
    pub fn find_parent(&self, id: &str) -> Option<&TopicItem> {
        find_parent(&self.items, id)
    }

    /// Remove an item from anywhere in the hierarchy or the related list.
    pub fn remove(&mut self, id: &str) -> Option<TopicItem> {
        remove_from(&mut self.items, id).or_else(|| remove_from(&mut self.related, id))
    }

    /// Number of non-empty items in the hierarchy (descendants included).
    pub fn topic_count(&self) -> usize {
        fn count(items: &[TopicItem]) -> usize {
            items
                .iter()
                .filter(|i| !i.is_empty())
                .map(|i| 1 + count(&i.children))
                .sum()
        }
        count(&self.items) + count(&self.related)
    }

    /// True when nothing in the tree can be emitted.
    pub fn is_empty(&self) -> bool {
        self.topic_count() == 0
    }

    /// Default topic id, falling back to the first non-empty root item.
    pub fn resolve_default_topic(&mut self) {
        let current_ok = self
            .default_topic
            .as_deref()
            .is_some_and(|id| self.find(id).is_some());
        if !current_ok {
            self.default_topic = self
                .items
                .iter()
                .find(|i| !i.is_empty())
                .map(|i| i.id.clone());
        }
    }

    /// Resolve an authored relative path against [`docs_dir`](Self::docs_dir).
    pub fn resolve(&self, relative: &str) -> PathBuf {
        self.docs_dir.join(relative.trim().replace('\\', "/"))
    }

    pub fn docs_dir(&self) -> &Path {
        &self.docs_dir
    }

    pub(crate) fn clear(&mut self) {
        self.items.clear();
        self.related.clear();
        self.categories.clear();
        self.properties.clear();
        self.default_topic = None;
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const A: &str = "aaaaaaaa-0000-0000-0000-000000000001";
    const B: &str = "bbbbbbbb-0000-0000-0000-000000000002";

    fn topic(id: &str, title: &str) -> TopicItem {
        TopicItem::topic(id, title).with_document("t.xml", Path::new("/docs"))
    }

    #[test]
    fn add_replaces_same_id_in_place() {
        let mut content = ConceptualContent::new("/docs");
        content.add(topic(A, "First"));
        content.add(topic(B, "Second"));
        content.add(topic(A, "First again"));
        let titles: Vec<&str> = content.items().iter().map(|i| i.title.as_str()).collect();
        assert_eq!(titles, vec!["First again", "Second"]);
    }

    #[test]
    fn related_topics_are_deduplicated() {
        let mut content = ConceptualContent::new("/docs");
        assert!(content.add_related(topic(A, "R")));
        assert!(!content.add_related(topic(A, "R again")));
        assert_eq!(content.related_topics().len(), 1);
        assert!(content.find(A).is_some());
    }

    #[test]
    fn default_topic_falls_back_to_first_item() {
        let mut content = ConceptualContent::new("/docs");
        content.add(topic("bad", "Empty"));
        content.add(topic(B, "Real"));
        content.default_topic = Some("cccccccc-0000-0000-0000-000000000003".into());
        content.resolve_default_topic();
        assert_eq!(content.default_topic.as_deref(), Some(B));
    }

    #[test]
    fn counts_skip_empty_items() {
        let mut content = ConceptualContent::new("/docs");
        let mut root = topic(A, "Root");
        root.add(topic(B, "Child"));
        root.add(topic("bad", "Skipped"));
        content.add(root);
        assert_eq!(content.topic_count(), 2);
        assert_eq!(content.find_parent(B).map(|p| p.id.as_str()), Some(A));
        assert!(content.remove(B).is_some());
        assert_eq!(content.topic_count(), 1);
    }

    #[test]
    fn properties_keep_order_and_replace() {
        let mut content = ConceptualContent::new("/docs");
        content.set_property("b", "1");
        content.set_property("a", "2");
        content.set_property("b", "3");
        assert_eq!(content.property("b"), Some("3"));
        assert_eq!(content.properties[0].0, "b");
    }
}

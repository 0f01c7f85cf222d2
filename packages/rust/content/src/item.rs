//! The topic item tree.
//!
//! A [`TopicItem`] is one node of the conceptual hierarchy. Parents own their
//! children outright; there are no back references, so "parent of" queries
//! search downward from a root list ([`find_parent`]).

use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};
use tracing::debug;

use conceptbuild_shared::{DEFAULT_FILE_VERSION, TopicType, derive_topic_id, is_valid_id};

use crate::document::DocumentInfo;

/// File suffix of an authored companion file beside its source document.
pub const COMPANION_SUFFIX: &str = ".cmp.xml";

// ---------------------------------------------------------------------------
// Variants and metadata
// ---------------------------------------------------------------------------

/// What kind of node a [`TopicItem`] is.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "lowercase")]
pub enum TopicKind {
    /// A regular topic bound to an authored document.
    Topic,
    /// A topic tracked outside the primary hierarchy (cross-reference target).
    Related,
    /// A placeholder redirecting to a topic elsewhere in the build.
    Marker {
        source_id: String,
        source_type: String,
    },
    /// A raw external HTML page known only by id and title.
    Html,
}

impl TopicKind {
    /// Name used in the `type` attribute of the content file.
    pub fn as_str(&self) -> &'static str {
        match self {
            TopicKind::Topic => "Topic",
            TopicKind::Related => "Related",
            TopicKind::Marker { .. } => "Marker",
            TopicKind::Html => "Html",
        }
    }

    /// `Topic` and `Related` are bound to a document; the others are not.
    pub fn has_document(&self) -> bool {
        matches!(self, TopicKind::Topic | TopicKind::Related)
    }

    pub fn is_marker(&self) -> bool {
        matches!(self, TopicKind::Marker { .. })
    }
}

/// An index keyword (`<keyword index="K" term="..."/>`).
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Keyword {
    pub index: String,
    pub term: String,
}

/// A free-form `name = value` metadata attribute.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Attribute {
    pub name: String,
    pub value: String,
}

// ---------------------------------------------------------------------------
// TopicItem
// ---------------------------------------------------------------------------

/// One node of the conceptual topic tree.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TopicItem {
    pub kind: TopicKind,
    /// Canonical 36-character GUID.
    pub id: String,
    pub title: String,
    /// Display override used by tables of contents.
    pub toc_title: Option<String>,
    pub link_text: Option<String>,
    /// Rendering hint only; invisible topics are still emitted.
    pub visible: bool,
    pub is_new: bool,
    pub revision: u32,
    /// Written as `PBM_FileVersion`.
    pub version: String,
    pub topic_type: TopicType,
    /// Document path exactly as authored (relative to the documents root).
    pub source_path: String,
    /// Resolved document path.
    pub file_path: Option<PathBuf>,
    /// Categories this topic is filed under. Only used by filters.
    pub categories: Vec<String>,
    pub keywords: Vec<Keyword>,
    pub attributes: Vec<Attribute>,
    /// The authored document already carries a `<topic id=..>` envelope.
    pub includes_topic: bool,
    pub children: Vec<TopicItem>,
    #[serde(skip)]
    initializing: bool,
}

impl TopicItem {
    pub fn new(kind: TopicKind, id: impl Into<String>, title: impl Into<String>) -> Self {
        Self {
            kind,
            id: id.into(),
            title: title.into(),
            toc_title: None,
            link_text: None,
            visible: true,
            is_new: false,
            revision: 1,
            version: DEFAULT_FILE_VERSION.to_string(),
            topic_type: TopicType::None,
            source_path: String::new(),
            file_path: None,
            categories: Vec::new(),
            keywords: Vec::new(),
            attributes: Vec::new(),
            includes_topic: false,
            children: Vec::new(),
            initializing: false,
        }
    }

    /// A regular document-bound topic.
    pub fn topic(id: impl Into<String>, title: impl Into<String>) -> Self {
        Self::new(TopicKind::Topic, id, title)
    }

    /// Bind this item to an authored document. `source_path` is kept as
    /// written, `docs_dir` resolves it.
    pub fn bind_document(&mut self, source_path: &str, docs_dir: &Path) {
        self.source_path = source_path.trim().to_string();
        let relative = self.source_path.replace('\\', "/");
        self.file_path = Some(docs_dir.join(relative));
    }

    /// Builder form of [`bind_document`](Self::bind_document).
    pub fn with_document(mut self, source_path: &str, docs_dir: &Path) -> Self {
        self.bind_document(source_path, docs_dir);
        self
    }

    /// An item is empty when it cannot be emitted: invalid id, no title, or
    /// (for document-bound kinds) no document. Empty items are skipped by
    /// every downstream stage.
    pub fn is_empty(&self) -> bool {
        if !is_valid_id(&self.id) {
            return true;
        }
        match &self.kind {
            TopicKind::Topic | TopicKind::Related => {
                self.title.trim().is_empty() || self.file_path.is_none()
            }
            TopicKind::Html => self.title.trim().is_empty(),
            TopicKind::Marker { .. } => false,
        }
    }

    /// Title shown in tables of contents.
    pub fn display_title(&self) -> &str {
        match &self.toc_title {
            Some(t) if !t.is_empty() => t,
            _ => &self.title,
        }
    }

    /// Topic type GUID, or empty when unclassified.
    pub fn topic_type_id(&self) -> &'static str {
        self.topic_type.topic_type_id()
    }

    /// Path of an authored companion file beside the source document
    /// (`intro.xml` → `intro.cmp.xml`).
    pub fn companion_source(&self) -> Option<PathBuf> {
        let path = self.file_path.as_ref()?;
        let stem = path.file_stem()?.to_string_lossy();
        Some(path.with_file_name(format!("{stem}{COMPANION_SUFFIX}")))
    }

    // -----------------------------------------------------------------------
    // Initialization
    // -----------------------------------------------------------------------

    pub fn begin_init(&mut self) {
        self.initializing = true;
    }

    /// Finish construction. For document-bound kinds this inspects the bound
    /// document: the topic type is inferred from its root tag, an existing
    /// `<topic>` envelope is recorded along with its revision, and an item
    /// without a valid id adopts the envelope id or one derived from its path.
    pub fn end_init(&mut self) {
        if !self.initializing {
            return;
        }
        self.initializing = false;

        if !self.kind.has_document() {
            return;
        }
        if let Some(path) = self.file_path.clone().filter(|p| p.is_file()) {
            match DocumentInfo::inspect(&path) {
                Ok(info) => self.apply_document_info(info),
                Err(e) => debug!(path = %path.display(), error = %e, "could not inspect document"),
            }
        }
        if !is_valid_id(&self.id) && !self.source_path.is_empty() {
            self.id = derive_topic_id(&self.source_path.replace('\\', "/"));
        }
    }

    fn apply_document_info(&mut self, info: DocumentInfo) {
        if self.topic_type.is_none() {
            self.topic_type = info.topic_type;
        }
        self.includes_topic = info.includes_topic;
        if info.includes_topic {
            if let Some(revision) = info.revision {
                self.revision = revision;
            }
            if !is_valid_id(&self.id) {
                if let Some(id) = info.id.filter(|id| is_valid_id(id)) {
                    self.id = id;
                }
            }
        }
    }

    // -----------------------------------------------------------------------
    // Tree operations
    // -----------------------------------------------------------------------

    pub fn add(&mut self, child: TopicItem) {
        self.children.push(child);
    }

    /// Find an item by id in this subtree (this item included).
    pub fn find(&self, id: &str) -> Option<&TopicItem> {
        if self.id.eq_ignore_ascii_case(id) {
            return Some(self);
        }
        self.children.iter().find_map(|c| c.find(id))
    }

    pub fn find_mut(&mut self, id: &str) -> Option<&mut TopicItem> {
        if self.id.eq_ignore_ascii_case(id) {
            return Some(self);
        }
        self.children.iter_mut().find_map(|c| c.find_mut(id))
    }

    /// Detach and return the descendant with `id`.
    pub fn remove(&mut self, id: &str) -> Option<TopicItem> {
        remove_from(&mut self.children, id)
    }

    /// Pre-order walk of this subtree, this item first.
    pub fn descendants(&self) -> Vec<&TopicItem> {
        let mut out = Vec::new();
        collect(self, &mut out);
        out
    }
}

fn collect<'a>(item: &'a TopicItem, out: &mut Vec<&'a TopicItem>) {
    out.push(item);
    for child in &item.children {
        collect(child, out);
    }
}

/// Find the parent of `id` by searching down from `roots`. Root-level items
/// have no parent.
pub fn find_parent<'a>(roots: &'a [TopicItem], id: &str) -> Option<&'a TopicItem> {
    for root in roots {
        if root.children.iter().any(|c| c.id.eq_ignore_ascii_case(id)) {
            return Some(root);
        }
        if let Some(parent) = find_parent(&root.children, id) {
            return Some(parent);
        }
    }
    None
}

/// Remove the item with `id` from anywhere below `items`.
pub fn remove_from(items: &mut Vec<TopicItem>, id: &str) -> Option<TopicItem> {
    if let Some(pos) = items.iter().position(|i| i.id.eq_ignore_ascii_case(id)) {
        return Some(items.remove(pos));
    }
    items.iter_mut().find_map(|i| remove_from(&mut i.children, id))
}

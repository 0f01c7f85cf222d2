//! Streaming reader for declarative content files.
//!
//! Two source formats are recognized by their root element (any case):
//!
//! - `conceptualContent`: the hierarchical format with `<items>`/`<item>`,
//!   categories, properties, related topics and the strict `General`
//!   property group.
//! - `files`: a flat list of `<file name=".." title="..">` entries, nested
//!   for children, without ids.
//!
//! Loading is tolerant: items with bad ids or missing documents are dropped,
//! filtered items are dropped with their subtree, and an unrecognized root
//! yields an empty tree. Only malformed XML and strict property-group
//! violations are errors.

use std::fs::File;
use std::io::{BufRead, BufReader};
use std::path::Path;

use quick_xml::Reader;
use quick_xml::events::{BytesStart, Event};
use tracing::{debug, info, instrument, warn};

use conceptbuild_shared::xml;
use conceptbuild_shared::{ConceptBuildError, Result, is_valid_id};

use crate::content::ConceptualContent;
use crate::filter::FilterChain;
use crate::item::{Attribute, Keyword, TopicItem, TopicKind};

/// Name of the strictly parsed property group.
const GENERAL_GROUP: &str = "General";

/// Reads content files into a [`ConceptualContent`] tree.
#[derive(Debug)]
pub struct ContentReader {
    filters: FilterChain,
    document_must_exist: bool,
}

impl Default for ContentReader {
    fn default() -> Self {
        Self::new()
    }
}

/// Whether an item has been let into the tree yet.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Admission {
    Pending,
    Admitted,
    Rejected,
}

impl ContentReader {
    pub fn new() -> Self {
        Self {
            filters: FilterChain::new(),
            document_must_exist: true,
        }
    }

    pub fn with_filters(mut self, filters: FilterChain) -> Self {
        self.filters = filters;
        self
    }

    /// When set (the default), items whose document does not exist are dropped.
    pub fn document_must_exist(mut self, value: bool) -> Self {
        self.document_must_exist = value;
        self
    }

    /// Read `source_file`, resolving document paths against `docs_dir`.
    ///
    /// A missing source file yields an empty tree.
    #[instrument(skip_all, fields(source = %source_file.display()))]
    pub fn read(&self, source_file: &Path, docs_dir: &Path) -> Result<ConceptualContent> {
        let mut content = ConceptualContent::new(docs_dir);
        self.read_into(&mut content, source_file)?;
        Ok(content)
    }

    /// Read `source_file` into an existing container, replacing its items.
    pub fn read_into(&self, content: &mut ConceptualContent, source_file: &Path) -> Result<()> {
        content.clear();
        content.content_file = Some(source_file.to_path_buf());
        if !source_file.is_file() {
            warn!(path = %source_file.display(), "content file not found, tree is empty");
            return Ok(());
        }
        let file = File::open(source_file).map_err(|e| ConceptBuildError::io(source_file, e))?;
        self.parse(BufReader::new(file), content)?;
        info!(topics = content.topic_count(), "content loaded");
        Ok(())
    }

    /// Read content from any buffered source.
    pub fn read_from<R: BufRead>(&self, source: R, docs_dir: &Path) -> Result<ConceptualContent> {
        let mut content = ConceptualContent::new(docs_dir);
        self.parse(source, &mut content)?;
        Ok(content)
    }

    fn parse<R: BufRead>(&self, source: R, content: &mut ConceptualContent) -> Result<()> {
        let mut reader = xml::reader(source);
        let mut buf = Vec::new();
        loop {
            buf.clear();
            match reader.read_event_into(&mut buf).map_err(ConceptBuildError::xml)? {
                Event::Start(e) => {
                    let root = xml::local_name(&e);
                    if root.eq_ignore_ascii_case("conceptualContent") {
                        if let Some(version) = xml::attribute(&e, "version")? {
                            content.version = version;
                        }
                        self.read_conceptual(&mut reader, content)?;
                    } else if root.eq_ignore_ascii_case("files") {
                        self.read_file_list(&mut reader, content)?;
                    } else {
                        debug!(root, "unrecognized content root, nothing loaded");
                    }
                    break;
                }
                Event::Empty(e) => {
                    debug!(root = %xml::local_name(&e), "empty content root");
                    break;
                }
                Event::Eof => break,
                _ => {}
            }
        }
        content.resolve_default_topic();
        Ok(())
    }

    // -----------------------------------------------------------------------
    // Format A: conceptualContent
    // -----------------------------------------------------------------------

    fn read_conceptual<R: BufRead>(
        &self,
        reader: &mut Reader<R>,
        content: &mut ConceptualContent,
    ) -> Result<()> {
        let mut buf = Vec::new();
        loop {
            buf.clear();
            match reader.read_event_into(&mut buf).map_err(ConceptBuildError::xml)? {
                Event::Start(e) => match xml::local_name(&e).as_str() {
                    "propertyGroup" => {
                        let name = xml::attribute(&e, "name")?.unwrap_or_default();
                        if name.eq_ignore_ascii_case(GENERAL_GROUP) {
                            read_general_group(reader, content)?;
                        } else {
                            debug!(group = name, "skipping property group");
                            xml::skip_element(reader)?;
                        }
                    }
                    "categories" => read_categories(reader, content)?,
                    "properties" => read_properties(reader, content)?,
                    "items" => {
                        read_default_topic(&e, content)?;
                        for item in self.read_items(reader, TopicKind::Topic, content)? {
                            content.add(item);
                        }
                    }
                    "relatedTopics" => {
                        for item in self.read_items(reader, TopicKind::Related, content)? {
                            if !content.add_related(item) {
                                debug!("duplicate related topic ignored");
                            }
                        }
                    }
                    _ => xml::skip_element(reader)?,
                },
                Event::Empty(e) => {
                    if xml::local_name(&e) == "items" {
                        read_default_topic(&e, content)?;
                    }
                }
                Event::End(_) => return Ok(()),
                Event::Eof => return Err(xml::unexpected_eof("conceptualContent")),
                _ => {}
            }
        }
    }

    /// Read the `<item>` children of an `<items>`/`<relatedTopics>` section.
    fn read_items<R: BufRead>(
        &self,
        reader: &mut Reader<R>,
        default_kind: TopicKind,
        content: &ConceptualContent,
    ) -> Result<Vec<TopicItem>> {
        let mut items = Vec::new();
        let mut buf = Vec::new();
        loop {
            buf.clear();
            match reader.read_event_into(&mut buf).map_err(ConceptBuildError::xml)? {
                Event::Start(e) if xml::local_name(&e) == "item" => {
                    items.extend(self.read_item(reader, &e, false, &default_kind, content)?);
                }
                Event::Empty(e) if xml::local_name(&e) == "item" => {
                    items.extend(self.read_item(reader, &e, true, &default_kind, content)?);
                }
                Event::Start(_) => xml::skip_element(reader)?,
                Event::End(_) => return Ok(items),
                Event::Eof => return Err(xml::unexpected_eof("items")),
                _ => {}
            }
        }
    }

    /// Read one `<item>` (start tag already consumed) and its subtree.
    fn read_item<R: BufRead>(
        &self,
        reader: &mut Reader<R>,
        start: &BytesStart<'_>,
        self_closing: bool,
        default_kind: &TopicKind,
        content: &ConceptualContent,
    ) -> Result<Option<TopicItem>> {
        let id = xml::attribute(start, "id")?.unwrap_or_default();
        if !is_valid_id(&id) {
            debug!(id, "dropping item with invalid id");
            if !self_closing {
                xml::skip_element(reader)?;
            }
            return Ok(None);
        }

        let kind = match xml::attribute(start, "type")?.as_deref() {
            Some(t) if t.eq_ignore_ascii_case("Related") => TopicKind::Related,
            Some(t) if t.eq_ignore_ascii_case("Html") => TopicKind::Html,
            Some(t) if t.eq_ignore_ascii_case("Marker") => TopicKind::Marker {
                source_id: xml::attribute(start, "sourceId")?.unwrap_or_default(),
                source_type: xml::attribute(start, "sourceType")?.unwrap_or_default(),
            },
            Some(t) if t.eq_ignore_ascii_case("Topic") => TopicKind::Topic,
            _ => default_kind.clone(),
        };

        let mut item = TopicItem::new(kind, id, "");
        item.begin_init();
        if let Some(v) = xml::attribute(start, "isNew")?.as_deref().and_then(xml::parse_bool) {
            item.is_new = v;
        }
        if let Some(v) = xml::attribute(start, "visible")?.as_deref().and_then(xml::parse_bool) {
            item.visible = v;
        }
        if let Some(rev) = xml::attribute(start, "revision")?.and_then(|r| r.trim().parse().ok()) {
            item.revision = rev;
        }
        if let Some(version) = xml::attribute(start, "version")? {
            item.version = version;
        }

        let mut admission = Admission::Pending;
        if !self_closing {
            let mut buf = Vec::new();
            loop {
                buf.clear();
                match reader.read_event_into(&mut buf).map_err(ConceptBuildError::xml)? {
                    Event::Start(e) => match xml::local_name(&e).as_str() {
                        "title" => item.title = xml::read_text(reader)?,
                        "tocTitle" => item.toc_title = Some(xml::read_text(reader)?),
                        "linkText" => item.link_text = Some(xml::read_text(reader)?),
                        "path" => {
                            item.categories = split_categories(xml::attribute(&e, "include")?);
                            let path = xml::read_text(reader)?;
                            if !path.is_empty() {
                                item.bind_document(&path, content.docs_dir());
                            }
                        }
                        "keywords" => item.keywords = read_keywords(reader)?,
                        "attributes" => item.attributes = read_attributes(reader)?,
                        "item" => {
                            if admission == Admission::Pending {
                                admission = self.admit(&item);
                            }
                            if admission == Admission::Admitted {
                                let child_kind = TopicKind::Topic;
                                item.children
                                    .extend(self.read_item(reader, &e, false, &child_kind, content)?);
                            } else {
                                xml::skip_element(reader)?;
                            }
                        }
                        _ => xml::skip_element(reader)?,
                    },
                    Event::Empty(e) => match xml::local_name(&e).as_str() {
                        "path" => {
                            item.categories = split_categories(xml::attribute(&e, "include")?);
                        }
                        "item" => {
                            if admission == Admission::Pending {
                                admission = self.admit(&item);
                            }
                            if admission == Admission::Admitted {
                                let child_kind = TopicKind::Topic;
                                item.children
                                    .extend(self.read_item(reader, &e, true, &child_kind, content)?);
                            }
                        }
                        _ => {}
                    },
                    Event::End(_) => break,
                    Event::Eof => return Err(xml::unexpected_eof("item")),
                    _ => {}
                }
            }
        }

        if admission == Admission::Pending {
            admission = self.admit(&item);
        }
        if admission == Admission::Rejected {
            return Ok(None);
        }
        item.end_init();
        Ok(Some(item))
    }

    /// Decide whether `item` enters the tree: its document must exist (when
    /// required) and no filter may exclude it.
    fn admit(&self, item: &TopicItem) -> Admission {
        if self.document_must_exist && item.kind.has_document() {
            let exists = item.file_path.as_deref().is_some_and(Path::is_file);
            if !exists {
                debug!(id = item.id, path = item.source_path, "dropping item, document not found");
                return Admission::Rejected;
            }
        }
        if let Some(filter) = self.filters.matching(item) {
            debug!(id = item.id, filter = filter.name(), "item excluded by filter");
            return Admission::Rejected;
        }
        Admission::Admitted
    }

    // -----------------------------------------------------------------------
    // Format B: files
    // -----------------------------------------------------------------------

    fn read_file_list<R: BufRead>(
        &self,
        reader: &mut Reader<R>,
        content: &mut ConceptualContent,
    ) -> Result<()> {
        let mut buf = Vec::new();
        loop {
            buf.clear();
            match reader.read_event_into(&mut buf).map_err(ConceptBuildError::xml)? {
                Event::Start(e) if xml::local_name(&e) == "file" => {
                    if let Some(item) = self.read_file(reader, &e, false, content)? {
                        content.add(item);
                    }
                }
                Event::Empty(e) if xml::local_name(&e) == "file" => {
                    if let Some(item) = self.read_file(reader, &e, true, content)? {
                        content.add(item);
                    }
                }
                Event::Start(_) => xml::skip_element(reader)?,
                Event::End(_) => return Ok(()),
                Event::Eof => return Err(xml::unexpected_eof("files")),
                _ => {}
            }
        }
    }

    fn read_file<R: BufRead>(
        &self,
        reader: &mut Reader<R>,
        start: &BytesStart<'_>,
        self_closing: bool,
        content: &ConceptualContent,
    ) -> Result<Option<TopicItem>> {
        let name = xml::attribute(start, "name")?.unwrap_or_default();
        if name.trim().is_empty() {
            debug!("dropping file entry without name");
            if !self_closing {
                xml::skip_element(reader)?;
            }
            return Ok(None);
        }
        let title = match xml::attribute(start, "title")? {
            Some(title) if !title.trim().is_empty() => title,
            _ => title_from_name(&name),
        };

        let mut item = TopicItem::topic("", title).with_document(&name, content.docs_dir());
        item.begin_init();
        if self.admit(&item) == Admission::Rejected {
            if !self_closing {
                xml::skip_element(reader)?;
            }
            return Ok(None);
        }

        if !self_closing {
            let mut buf = Vec::new();
            loop {
                buf.clear();
                match reader.read_event_into(&mut buf).map_err(ConceptBuildError::xml)? {
                    Event::Start(e) if xml::local_name(&e) == "file" => {
                        item.children
                            .extend(self.read_file(reader, &e, false, content)?);
                    }
                    Event::Empty(e) if xml::local_name(&e) == "file" => {
                        item.children
                            .extend(self.read_file(reader, &e, true, content)?);
                    }
                    Event::Start(_) => xml::skip_element(reader)?,
                    Event::End(_) => break,
                    Event::Eof => return Err(xml::unexpected_eof("file")),
                    _ => {}
                }
            }
        }

        item.end_init();
        Ok(Some(item))
    }
}

// ---------------------------------------------------------------------------
// Section helpers
// ---------------------------------------------------------------------------

fn read_default_topic(start: &BytesStart<'_>, content: &mut ConceptualContent) -> Result<()> {
    if let Some(default) = xml::attribute(start, "default")? {
        let default = default.trim();
        if default.len() == 36 {
            content.default_topic = Some(default.to_string());
        }
    }
    Ok(())
}

/// The `General` group accepts only known property names; anything else is
/// a version-skew error, not tolerable input.
fn read_general_group<R: BufRead>(
    reader: &mut Reader<R>,
    content: &mut ConceptualContent,
) -> Result<()> {
    let mut buf = Vec::new();
    loop {
        buf.clear();
        match reader.read_event_into(&mut buf).map_err(ConceptBuildError::xml)? {
            Event::Start(e) if xml::local_name(&e) == "property" => {
                let name = xml::attribute(&e, "name")?.unwrap_or_default();
                let value = xml::read_text(reader)?;
                apply_general_property(content, &name, &value)?;
            }
            Event::Empty(e) if xml::local_name(&e) == "property" => {
                let name = xml::attribute(&e, "name")?.unwrap_or_default();
                apply_general_property(content, &name, "")?;
            }
            Event::Start(e) => {
                return Err(ConceptBuildError::schema(
                    GENERAL_GROUP,
                    xml::local_name(&e),
                ));
            }
            Event::End(_) => return Ok(()),
            Event::Eof => return Err(xml::unexpected_eof("propertyGroup")),
            _ => {}
        }
    }
}

fn apply_general_property(content: &mut ConceptualContent, name: &str, value: &str) -> Result<()> {
    if name.eq_ignore_ascii_case("Id") {
        if !value.is_empty() {
            content.id = value.to_string();
        }
    } else if name.eq_ignore_ascii_case("CompanionFiles") {
        content.companion_files = xml::parse_bool(value).unwrap_or(false);
    } else {
        return Err(ConceptBuildError::schema(GENERAL_GROUP, name));
    }
    Ok(())
}

fn read_categories<R: BufRead>(reader: &mut Reader<R>, content: &mut ConceptualContent) -> Result<()> {
    let mut buf = Vec::new();
    loop {
        buf.clear();
        match reader.read_event_into(&mut buf).map_err(ConceptBuildError::xml)? {
            Event::Empty(e) if xml::local_name(&e) == "category" => {
                let name = xml::attribute(&e, "name")?.unwrap_or_default();
                let description = xml::attribute(&e, "description")?.unwrap_or_default();
                if !name.is_empty() {
                    content.add_category(name, description);
                }
            }
            Event::Start(e) if xml::local_name(&e) == "category" => {
                let name = xml::attribute(&e, "name")?.unwrap_or_default();
                let description = xml::attribute(&e, "description")?.unwrap_or_default();
                xml::skip_element(reader)?;
                if !name.is_empty() {
                    content.add_category(name, description);
                }
            }
            Event::Start(_) => xml::skip_element(reader)?,
            Event::End(_) => return Ok(()),
            Event::Eof => return Err(xml::unexpected_eof("categories")),
            _ => {}
        }
    }
}

fn read_properties<R: BufRead>(reader: &mut Reader<R>, content: &mut ConceptualContent) -> Result<()> {
    let mut buf = Vec::new();
    loop {
        buf.clear();
        match reader.read_event_into(&mut buf).map_err(ConceptBuildError::xml)? {
            Event::Empty(e) if xml::local_name(&e) == "property" => {
                if let Some(key) = xml::attribute(&e, "key")? {
                    let value = xml::attribute(&e, "value")?.unwrap_or_default();
                    content.set_property(key, value);
                }
            }
            Event::Start(e) => {
                if xml::local_name(&e) == "property" {
                    if let Some(key) = xml::attribute(&e, "key")? {
                        let value = xml::attribute(&e, "value")?.unwrap_or_default();
                        content.set_property(key, value);
                    }
                }
                xml::skip_element(reader)?;
            }
            Event::End(_) => return Ok(()),
            Event::Eof => return Err(xml::unexpected_eof("properties")),
            _ => {}
        }
    }
}

fn read_keywords<R: BufRead>(reader: &mut Reader<R>) -> Result<Vec<Keyword>> {
    let mut keywords = Vec::new();
    let mut buf = Vec::new();
    loop {
        buf.clear();
        match reader.read_event_into(&mut buf).map_err(ConceptBuildError::xml)? {
            Event::Empty(e) if xml::local_name(&e) == "keyword" => {
                let index = xml::attribute(&e, "index")?.unwrap_or_else(|| "K".into());
                if let Some(term) = xml::attribute(&e, "term")? {
                    keywords.push(Keyword { index, term });
                }
            }
            Event::Start(e) => {
                if xml::local_name(&e) == "keyword" {
                    let index = xml::attribute(&e, "index")?.unwrap_or_else(|| "K".into());
                    let term = match xml::attribute(&e, "term")? {
                        Some(term) => {
                            xml::skip_element(reader)?;
                            term
                        }
                        None => xml::read_text(reader)?,
                    };
                    if !term.is_empty() {
                        keywords.push(Keyword { index, term });
                    }
                } else {
                    xml::skip_element(reader)?;
                }
            }
            Event::End(_) => return Ok(keywords),
            Event::Eof => return Err(xml::unexpected_eof("keywords")),
            _ => {}
        }
    }
}

fn read_attributes<R: BufRead>(reader: &mut Reader<R>) -> Result<Vec<Attribute>> {
    let mut attributes = Vec::new();
    let mut buf = Vec::new();
    loop {
        buf.clear();
        match reader.read_event_into(&mut buf).map_err(ConceptBuildError::xml)? {
            Event::Empty(e) if xml::local_name(&e) == "attribute" => {
                if let Some(name) = xml::attribute(&e, "name")? {
                    let value = xml::attribute(&e, "value")?.unwrap_or_default();
                    attributes.push(Attribute { name, value });
                }
            }
            Event::Start(e) => {
                if xml::local_name(&e) == "attribute" {
                    if let Some(name) = xml::attribute(&e, "name")? {
                        let value = match xml::attribute(&e, "value")? {
                            Some(value) => {
                                xml::skip_element(reader)?;
                                value
                            }
                            None => xml::read_text(reader)?,
                        };
                        attributes.push(Attribute { name, value });
                        continue;
                    }
                }
                xml::skip_element(reader)?;
            }
            Event::End(_) => return Ok(attributes),
            Event::Eof => return Err(xml::unexpected_eof("attributes")),
            _ => {}
        }
    }
}

/// Title for a `<file>` entry that carries none: the document's file stem.
fn title_from_name(name: &str) -> String {
    Path::new(name.trim())
        .file_stem()
        .map(|stem| stem.to_string_lossy().into_owned())
        .unwrap_or_else(|| name.trim().to_string())
}

fn split_categories(include: Option<String>) -> Vec<String> {
    include
        .map(|s| {
            s.split([';', ','])
                .map(str::trim)
                .filter(|c| !c.is_empty())
                .map(str::to_string)
                .collect()
        })
        .unwrap_or_default()
}

//! Persists a [`ConceptualContent`] tree in the hierarchical content format.

use std::fs::File;
use std::io::{BufWriter, Write};
use std::path::Path;

use quick_xml::Writer;
use tracing::{debug, instrument};

use conceptbuild_shared::xml;
use conceptbuild_shared::{ConceptBuildError, DEFAULT_FILE_VERSION, Result};

use crate::content::ConceptualContent;
use crate::item::{TopicItem, TopicKind};

/// Writes `conceptualContent` files readable by [`ContentReader`](crate::ContentReader).
#[derive(Debug, Default, Clone, Copy)]
pub struct ContentWriter;

impl ContentWriter {
    /// Save `content` to `path`, creating parent directories.
    #[instrument(skip_all, fields(path = %path.display()))]
    pub fn save(&self, content: &ConceptualContent, path: &Path) -> Result<()> {
        if let Some(parent) = path.parent() {
            std::fs::create_dir_all(parent).map_err(|e| ConceptBuildError::io(parent, e))?;
        }
        let file = File::create(path).map_err(|e| ConceptBuildError::io(path, e))?;
        let mut out = BufWriter::new(file);
        self.write_to(content, &mut out)?;
        out.flush().map_err(|e| ConceptBuildError::io(path, e))?;
        debug!(items = content.items().len(), "content saved");
        Ok(())
    }

    pub fn write_to<W: Write>(&self, content: &ConceptualContent, out: W) -> Result<()> {
        let mut w = xml::writer(out);
        xml::write_decl(&mut w)?;
        xml::write_start(&mut w, "conceptualContent", &[("version", &content.version)])?;

        xml::write_start(&mut w, "propertyGroup", &[("name", "General")])?;
        xml::write_text_element(&mut w, "property", &[("name", "Id")], &content.id)?;
        let companion = if content.companion_files { "True" } else { "False" };
        xml::write_text_element(&mut w, "property", &[("name", "CompanionFiles")], companion)?;
        xml::write_end(&mut w, "propertyGroup")?;

        if !content.categories.is_empty() {
            xml::write_start(&mut w, "categories", &[])?;
            for category in &content.categories {
                xml::write_empty(
                    &mut w,
                    "category",
                    &[("name", &category.name), ("description", &category.description)],
                )?;
            }
            xml::write_end(&mut w, "categories")?;
        }

        if !content.properties.is_empty() {
            xml::write_start(&mut w, "properties", &[])?;
            for (key, value) in &content.properties {
                xml::write_empty(&mut w, "property", &[("key", key), ("value", value)])?;
            }
            xml::write_end(&mut w, "properties")?;
        }

        let default = content.default_topic.as_deref().unwrap_or("");
        xml::write_start(&mut w, "items", &[("default", default)])?;
        for item in content.items() {
            write_item(&mut w, item)?;
        }
        xml::write_end(&mut w, "items")?;

        if !content.related_topics().is_empty() {
            xml::write_start(&mut w, "relatedTopics", &[])?;
            for item in content.related_topics() {
                write_item(&mut w, item)?;
            }
            xml::write_end(&mut w, "relatedTopics")?;
        }

        xml::write_end(&mut w, "conceptualContent")
    }
}

fn write_item<W: Write>(w: &mut Writer<W>, item: &TopicItem) -> Result<()> {
    let revision = item.revision.to_string();
    let mut attrs: Vec<(&str, &str)> = vec![
        ("id", item.id.as_str()),
        ("isNew", bool_str(item.is_new)),
        ("visible", bool_str(item.visible)),
        ("revision", revision.as_str()),
    ];
    match &item.kind {
        TopicKind::Topic => {}
        TopicKind::Marker {
            source_id,
            source_type,
        } => {
            attrs.push(("type", item.kind.as_str()));
            attrs.push(("sourceId", source_id.as_str()));
            attrs.push(("sourceType", source_type.as_str()));
        }
        TopicKind::Related | TopicKind::Html => attrs.push(("type", item.kind.as_str())),
    }
    if item.version != DEFAULT_FILE_VERSION {
        attrs.push(("version", item.version.as_str()));
    }
    xml::write_start(w, "item", &attrs)?;

    if !item.title.is_empty() {
        xml::write_text_element(w, "title", &[], &item.title)?;
    }
    if let Some(toc_title) = &item.toc_title {
        xml::write_text_element(w, "tocTitle", &[], toc_title)?;
    }
    if let Some(link_text) = &item.link_text {
        xml::write_text_element(w, "linkText", &[], link_text)?;
    }
    if !item.source_path.is_empty() {
        let include = item.categories.join(";");
        xml::write_text_element(w, "path", &[("include", &include)], &item.source_path)?;
    }
    if !item.keywords.is_empty() {
        xml::write_start(w, "keywords", &[])?;
        for keyword in &item.keywords {
            xml::write_empty(
                w,
                "keyword",
                &[("index", &keyword.index), ("term", &keyword.term)],
            )?;
        }
        xml::write_end(w, "keywords")?;
    }
    if !item.attributes.is_empty() {
        xml::write_start(w, "attributes", &[])?;
        for attribute in &item.attributes {
            xml::write_empty(
                w,
                "attribute",
                &[("name", &attribute.name), ("value", &attribute.value)],
            )?;
        }
        xml::write_end(w, "attributes")?;
    }

    for child in &item.children {
        write_item(w, child)?;
    }
    xml::write_end(w, "item")
}

fn bool_str(value: bool) -> &'static str {
    if value { "true" } else { "false" }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::loader::ContentReader;

    const A: &str = "aaaaaaaa-0000-0000-0000-000000000001";
    const B: &str = "bbbbbbbb-0000-0000-0000-000000000002";
    const C: &str = "cccccccc-0000-0000-0000-000000000003";
    const D: &str = "dddddddd-0000-0000-0000-000000000004";

    fn temp_dir() -> std::path::PathBuf {
        let dir = std::env::temp_dir().join(format!("cb-writer-{}", uuid::Uuid::now_v7()));
        std::fs::create_dir_all(&dir).unwrap();
        dir
    }

    #[test]
    fn save_then_read_yields_equal_tree() {
        let dir = temp_dir();
        for name in ["a.xml", "b.xml", "c.xml", "d.xml"] {
            std::fs::write(dir.join(name), "<developerHowToDocument/>").unwrap();
        }
        let source = format!(
            r#"<conceptualContent version="1.0">
  <categories><category name="beta" description="Beta features"/></categories>
  <properties><property key="Owner" value="docs &amp; samples"/></properties>
  <items default="{B}">
    <item id="{A}" isNew="true" revision="3">
      <title>Alpha &lt;1&gt;</title>
      <tocTitle>Alpha</tocTitle>
      <path include="beta;extra">a.xml</path>
      <keywords><keyword index="K" term="first"/></keywords>
      <attributes><attribute name="TopicType" value="kbHowTo"/></attributes>
      <item id="{C}" visible="false"><title>Gamma</title><path>c.xml</path></item>
    </item>
    <item id="{B}" version="2.0.0.0"><title>Beta</title><path>b.xml</path></item>
    <item id="eeeeeeee-0000-0000-0000-000000000005" type="Marker" sourceId="N:Ns" sourceType="Namespace"/>
  </items>
  <relatedTopics>
    <item id="{D}"><title>Delta</title><path>d.xml</path></item>
  </relatedTopics>
</conceptualContent>"#
        );
        let reader = ContentReader::new();
        let first = reader.read_from(source.as_bytes(), &dir).unwrap();
        assert_eq!(first.items().len(), 3);

        let saved = dir.join("out/Content.xml");
        ContentWriter.save(&first, &saved).unwrap();
        let second = reader.read(&saved, &dir).unwrap();

        assert_eq!(first.items(), second.items());
        assert_eq!(first.related_topics(), second.related_topics());
        assert_eq!(first.categories, second.categories);
        assert_eq!(first.properties, second.properties);
        assert_eq!(first.default_topic, second.default_topic);
        assert_eq!(first.id, second.id);

        let ids: Vec<&str> = second.items().iter().map(|i| i.id.as_str()).collect();
        assert_eq!(ids[..2], [A, B]);

        let _ = std::fs::remove_dir_all(&dir);
    }

    #[test]
    fn written_xml_uses_content_vocabulary() {
        let mut content = ConceptualContent::new("/docs");
        content.add(TopicItem::topic(A, "Alpha").with_document("a.xml", Path::new("/docs")));
        let mut out = Vec::new();
        ContentWriter.write_to(&content, &mut out).unwrap();
        let text = String::from_utf8(out).unwrap();
        assert!(text.starts_with("<?xml version=\"1.0\" encoding=\"utf-8\"?>"));
        assert!(text.contains("<conceptualContent version=\"1.0\">"));
        assert!(text.contains(&format!("<item id=\"{A}\" isNew=\"false\" visible=\"true\" revision=\"1\">")));
        assert!(text.contains("<path include=\"\">a.xml</path>"));
    }
}

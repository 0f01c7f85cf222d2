//! Topic manifest adapter.
//!
//! Document topics become bare `<topic id=".."/>` records. HTML pages and
//! markers are not written here; they are collected and published into the
//! [`VisitResult`] when the adapter finishes.

use std::collections::BTreeMap;
use std::io::Write;

use quick_xml::Writer;

use conceptbuild_content::{TopicItem, TopicKind};
use conceptbuild_shared::xml;
use conceptbuild_shared::{ConceptBuildError, Result};

use super::ProjectAdapter;
use crate::visitor::VisitResult;

pub struct ManifestAdapter<W: Write> {
    writer: Writer<W>,
    html_titles: BTreeMap<String, String>,
    markers: Vec<TopicItem>,
    finished: bool,
}

impl<W: Write> ManifestAdapter<W> {
    pub fn new(out: W) -> Result<Self> {
        let mut writer = xml::writer(out);
        xml::write_decl(&mut writer)?;
        xml::write_start(&mut writer, "topics", &[])?;
        Ok(Self {
            writer,
            html_titles: BTreeMap::new(),
            markers: Vec::new(),
            finished: false,
        })
    }

    pub fn into_inner(self) -> W {
        self.writer.into_inner()
    }
}

impl<W: Write> ProjectAdapter for ManifestAdapter<W> {
    fn name(&self) -> &str {
        "manifest"
    }

    fn on_write_topic(&mut self, item: &TopicItem) -> Result<()> {
        match &item.kind {
            TopicKind::Topic | TopicKind::Related => {
                xml::write_empty(&mut self.writer, "topic", &[("id", &item.id)])
            }
            TopicKind::Html => {
                self.html_titles.insert(item.id.clone(), item.title.clone());
                Ok(())
            }
            TopicKind::Marker { .. } => {
                // Children belong to the redirect target, not the marker.
                let mut marker = item.clone();
                marker.children.clear();
                self.markers.push(marker);
                Ok(())
            }
        }
    }

    fn finish(&mut self, result: &mut VisitResult) -> Result<()> {
        if self.finished {
            return Ok(());
        }
        self.finished = true;
        result.html_titles.append(&mut self.html_titles);
        if !self.markers.is_empty() {
            result.has_markers = true;
            result.markers.append(&mut self.markers);
        }
        xml::write_end(&mut self.writer, "topics")?;
        self.writer
            .get_mut()
            .flush()
            .map_err(ConceptBuildError::xml)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::path::Path;

    #[test]
    fn routes_each_kind() {
        let mut adapter = ManifestAdapter::new(Vec::new()).unwrap();
        let topic = TopicItem::topic("T", "Topic").with_document("t.xml", Path::new("/d"));
        let mut related = TopicItem::topic("R", "Related").with_document("r.xml", Path::new("/d"));
        related.kind = TopicKind::Related;
        let html = TopicItem::new(TopicKind::Html, "H", "External page");
        let marker = TopicItem::new(
            TopicKind::Marker {
                source_id: "N:Ns".into(),
                source_type: "Namespace".into(),
            },
            "M",
            "",
        );

        for item in [&topic, &html, &marker, &related] {
            adapter.on_write_topic(item).unwrap();
        }
        let mut result = VisitResult::default();
        adapter.finish(&mut result).unwrap();

        assert_eq!(result.html_titles.get("H").map(String::as_str), Some("External page"));
        assert!(result.has_markers);
        assert_eq!(result.markers.len(), 1);
        assert_eq!(result.markers[0].id, "M");

        let out = String::from_utf8(adapter.into_inner()).unwrap();
        assert_eq!(
            out,
            "<?xml version=\"1.0\" encoding=\"utf-8\"?>\n<topics>\n  <topic id=\"T\"/>\n  <topic id=\"R\"/>\n</topics>"
        );
    }

    #[test]
    fn no_markers_leaves_flag_unset() {
        let mut adapter = ManifestAdapter::new(Vec::new()).unwrap();
        let mut result = VisitResult::default();
        adapter.finish(&mut result).unwrap();
        assert!(!result.has_markers);
        assert!(result.markers.is_empty());
    }
}

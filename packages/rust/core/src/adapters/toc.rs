//! Table-of-contents adapter: one nested `<topic>` per node.

use std::io::Write;

use quick_xml::Writer;

use conceptbuild_content::{TopicItem, TopicKind};
use conceptbuild_shared::xml;
use conceptbuild_shared::{ConceptBuildError, Result};

use super::ProjectAdapter;
use crate::visitor::VisitResult;

/// Emits `<topics><topic id=".." file="..">..</topic></topics>`, driven
/// purely by begin/end nesting. Markers and related topics get no node.
pub struct TocAdapter<W: Write> {
    writer: Writer<W>,
    /// Start tag of the innermost topic, held back until it is known
    /// whether the topic has children.
    pending: Option<String>,
    depth: usize,
    finished: bool,
}

impl<W: Write> TocAdapter<W> {
    pub fn new(out: W) -> Result<Self> {
        let mut writer = xml::writer(out);
        xml::write_decl(&mut writer)?;
        xml::write_start(&mut writer, "topics", &[])?;
        Ok(Self {
            writer,
            pending: None,
            depth: 0,
            finished: false,
        })
    }

    /// Number of currently open `<topic>` elements.
    pub fn depth(&self) -> usize {
        self.depth
    }

    pub fn into_inner(self) -> W {
        self.writer.into_inner()
    }

    fn participates(item: &TopicItem) -> bool {
        matches!(item.kind, TopicKind::Topic | TopicKind::Html)
    }

    fn flush_pending(&mut self) -> Result<()> {
        if let Some(id) = self.pending.take() {
            xml::write_start(&mut self.writer, "topic", &[("id", &id), ("file", &id)])?;
        }
        Ok(())
    }
}

impl<W: Write> ProjectAdapter for TocAdapter<W> {
    fn name(&self) -> &str {
        "toc"
    }

    fn on_begin_topic(&mut self, item: &TopicItem) -> Result<()> {
        if !Self::participates(item) {
            return Ok(());
        }
        self.flush_pending()?;
        self.pending = Some(item.id.clone());
        self.depth += 1;
        Ok(())
    }

    fn on_end_topic(&mut self, item: &TopicItem) -> Result<()> {
        if !Self::participates(item) {
            return Ok(());
        }
        match self.pending.take() {
            Some(id) => xml::write_empty(&mut self.writer, "topic", &[("id", &id), ("file", &id)])?,
            None => xml::write_end(&mut self.writer, "topic")?,
        }
        self.depth = self.depth.saturating_sub(1);
        Ok(())
    }

    fn finish(&mut self, _result: &mut VisitResult) -> Result<()> {
        if self.finished {
            return Ok(());
        }
        self.finished = true;
        // An aborted walk can leave elements open.
        self.flush_pending()?;
        while self.depth > 0 {
            xml::write_end(&mut self.writer, "topic")?;
            self.depth -= 1;
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

    fn topic(id: &str) -> TopicItem {
        TopicItem::topic(id, "T").with_document("t.xml", Path::new("/docs"))
    }

    #[test]
    fn nests_by_begin_end() {
        let mut toc = TocAdapter::new(Vec::new()).unwrap();
        let a = topic("A");
        let b = topic("B");
        let c = topic("C");
        toc.on_begin_topic(&a).unwrap();
        toc.on_begin_topic(&b).unwrap();
        assert_eq!(toc.depth(), 2);
        toc.on_end_topic(&b).unwrap();
        toc.on_end_topic(&a).unwrap();
        toc.on_begin_topic(&c).unwrap();
        toc.on_end_topic(&c).unwrap();
        assert_eq!(toc.depth(), 0);
        toc.finish(&mut VisitResult::default()).unwrap();

        let out = String::from_utf8(toc.into_inner()).unwrap();
        assert_eq!(
            out,
            "<?xml version=\"1.0\" encoding=\"utf-8\"?>\n<topics>\n  <topic id=\"A\" file=\"A\">\n    <topic id=\"B\" file=\"B\"/>\n  </topic>\n  <topic id=\"C\" file=\"C\"/>\n</topics>"
        );
    }

    #[test]
    fn markers_and_related_get_no_node() {
        let mut toc = TocAdapter::new(Vec::new()).unwrap();
        let marker = TopicItem::new(
            TopicKind::Marker {
                source_id: "N:Ns".into(),
                source_type: "Namespace".into(),
            },
            "M",
            "",
        );
        let mut related = topic("R");
        related.kind = TopicKind::Related;
        toc.on_begin_topic(&marker).unwrap();
        toc.on_begin_topic(&related).unwrap();
        assert_eq!(toc.depth(), 0);
        toc.on_end_topic(&related).unwrap();
        toc.on_end_topic(&marker).unwrap();
        toc.finish(&mut VisitResult::default()).unwrap();
        let out = String::from_utf8(toc.into_inner()).unwrap();
        assert!(!out.contains("<topic "));
    }

    #[test]
    fn finish_closes_open_elements() {
        let mut toc = TocAdapter::new(Vec::new()).unwrap();
        toc.on_begin_topic(&topic("A")).unwrap();
        toc.on_begin_topic(&topic("B")).unwrap();
        toc.finish(&mut VisitResult::default()).unwrap();
        let out = String::from_utf8(toc.into_inner()).unwrap();
        assert!(out.ends_with("</topic>\n  </topic>\n</topics>"));
    }
}

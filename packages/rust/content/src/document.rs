//! Inspection of authored topic documents.

use std::fs::File;
use std::io::BufReader;
use std::path::Path;

use quick_xml::events::Event;

use conceptbuild_shared::xml;
use conceptbuild_shared::{ConceptBuildError, Result, TopicType};

/// What the head of an authored document says about the topic.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct DocumentInfo {
    /// Local name of the element that classifies the document.
    pub document_tag: String,
    pub topic_type: TopicType,
    /// The document is wrapped in a `<topic id=".." revisionNumber="..">` envelope.
    pub includes_topic: bool,
    pub id: Option<String>,
    pub revision: Option<u32>,
}

impl DocumentInfo {
    /// Read just enough of `path` to classify it. When the root element is a
    /// `<topic>` envelope, the first element inside it names the topic type.
    pub fn inspect(path: &Path) -> Result<Self> {
        let file = File::open(path).map_err(|e| ConceptBuildError::io(path, e))?;
        let mut reader = xml::reader(BufReader::new(file));
        let mut buf = Vec::new();
        let mut info = DocumentInfo::default();

        loop {
            buf.clear();
            match reader.read_event_into(&mut buf).map_err(ConceptBuildError::xml)? {
                Event::Start(e) | Event::Empty(e) => {
                    let name = xml::local_name(&e);
                    if !info.includes_topic && name == "topic" {
                        info.includes_topic = true;
                        info.id = xml::attribute(&e, "id")?;
                        info.revision = xml::attribute(&e, "revisionNumber")?
                            .and_then(|r| r.trim().parse().ok());
                        continue;
                    }
                    info.topic_type = TopicType::from_document_tag(&name);
                    info.document_tag = name;
                    break;
                }
                Event::Eof => break,
                _ => {}
            }
        }
        Ok(info)
    }
}

/// Split serialized XML into its declaration (if any) and the remaining body.
pub fn split_declaration(text: &str) -> (Option<&str>, &str) {
    let trimmed = text.trim_start_matches('\u{feff}').trim_start();
    if trimmed.starts_with("<?xml") {
        if let Some(end) = trimmed.find("?>") {
            let (decl, body) = trimmed.split_at(end + 2);
            return (Some(decl), body.trim_start());
        }
    }
    (None, trimmed)
}

/// Strip a leading `<topic ...>` envelope from `body`, returning what it wraps.
/// A body without an envelope is returned unchanged.
pub fn strip_envelope(body: &str) -> &str {
    let trimmed = body.trim();
    let Some(rest) = trimmed.strip_prefix("<topic") else {
        return body;
    };
    if !rest.starts_with(|c: char| c.is_whitespace() || c == '>' || c == '/') {
        return body;
    }
    let Some(end) = rest.find('>') else {
        return body;
    };
    if rest[..end].ends_with('/') {
        return "";
    }
    let inner = &rest[end + 1..];
    inner.strip_suffix("</topic>").unwrap_or(inner).trim()
}

#[cfg(test)]
mod tests {
    use super::*;

    fn write_temp(content: &str) -> std::path::PathBuf {
        let dir = std::env::temp_dir().join(format!("cb-doc-{}", uuid::Uuid::now_v7()));
        std::fs::create_dir_all(&dir).unwrap();
        let path = dir.join("topic.xml");
        std::fs::write(&path, content).unwrap();
        path
    }

    #[test]
    fn plain_document_is_classified_by_root() {
        let path = write_temp(
            "<?xml version=\"1.0\" encoding=\"utf-8\"?>\n<developerWalkthroughDocument xmlns=\"http://ddue.schemas.microsoft.com/authoring/2003/5\"/>",
        );
        let info = DocumentInfo::inspect(&path).unwrap();
        assert_eq!(info.topic_type, TopicType::Walkthrough);
        assert!(!info.includes_topic);
        assert_eq!(info.id, None);
        let _ = std::fs::remove_dir_all(path.parent().unwrap());
    }

    #[test]
    fn envelope_is_recorded() {
        let path = write_temp(
            "<topic id=\"5c2d3b4a-1111-2222-3333-444455556666\" revisionNumber=\"7\">\n  <developerSampleDocument>x</developerSampleDocument>\n</topic>",
        );
        let info = DocumentInfo::inspect(&path).unwrap();
        assert!(info.includes_topic);
        assert_eq!(info.id.as_deref(), Some("5c2d3b4a-1111-2222-3333-444455556666"));
        assert_eq!(info.revision, Some(7));
        assert_eq!(info.topic_type, TopicType::Sample);
        assert_eq!(info.document_tag, "developerSampleDocument");
        let _ = std::fs::remove_dir_all(path.parent().unwrap());
    }

    #[test]
    fn unknown_root_has_no_type() {
        let path = write_temp("<html><body/></html>");
        let info = DocumentInfo::inspect(&path).unwrap();
        assert!(info.topic_type.is_none());
        let _ = std::fs::remove_dir_all(path.parent().unwrap());
    }

    #[test]
    fn declaration_split() {
        let (decl, body) = split_declaration("<?xml version=\"1.0\"?>\n<a/>");
        assert_eq!(decl, Some("<?xml version=\"1.0\"?>"));
        assert_eq!(body, "<a/>");

        let (decl, body) = split_declaration("<a/>");
        assert_eq!(decl, None);
        assert_eq!(body, "<a/>");
    }

    #[test]
    fn envelope_strip() {
        assert_eq!(
            strip_envelope("<topic id=\"x\" revisionNumber=\"2\">\n  <developerHowToDocument/>\n</topic>\n"),
            "<developerHowToDocument/>"
        );
        assert_eq!(strip_envelope("<topic id=\"x\"/>"), "");
        assert_eq!(strip_envelope("<topicIndex/>"), "<topicIndex/>");
        assert_eq!(strip_envelope("<a/>"), "<a/>");
    }
}

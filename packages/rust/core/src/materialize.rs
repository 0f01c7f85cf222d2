//! Per-topic output files: `<id>.xml` and `<id>.cmp.xml`, plus copied pages
//! for Html topics.
//!
//! Materializing always overwrites. Any earlier output for the same id is
//! removed first, so repeating the operation yields byte-identical files.

use std::fs::File;
use std::io::{BufWriter, Write};
use std::path::{Path, PathBuf};

use tracing::{debug, instrument};

use conceptbuild_content::{
    COMPANION_SUFFIX, DocumentInfo, TopicItem, TopicKind, split_declaration, strip_envelope,
};
use conceptbuild_shared::xml;
use conceptbuild_shared::{ConceptBuildError, Result};

/// Declaration written when the authored document has none.
const DEFAULT_DECLARATION: &str = r#"<?xml version="1.0" encoding="utf-8"?>"#;

/// Where a topic's files landed.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct MaterializedTopic {
    pub topic_file: PathBuf,
    pub companion_file: PathBuf,
    /// The authored document already had its envelope and was copied as is.
    pub copied_topic: bool,
    /// An authored companion file was copied instead of synthesized.
    pub copied_companion: bool,
}

/// Write `item`'s content envelope into `topics_dir` and its companion
/// metadata into `companions_dir`. Both directories are created if missing.
#[instrument(skip_all, fields(id = %item.id))]
pub fn materialize_topic(
    item: &TopicItem,
    topics_dir: &Path,
    companions_dir: &Path,
) -> Result<MaterializedTopic> {
    let source = item
        .file_path
        .as_deref()
        .ok_or_else(|| ConceptBuildError::validation(format!("topic {} has no document", item.id)))?;
    if !source.is_file() {
        return Err(ConceptBuildError::io(
            source,
            std::io::Error::new(std::io::ErrorKind::NotFound, "topic document not found"),
        ));
    }

    for dir in [topics_dir, companions_dir] {
        std::fs::create_dir_all(dir).map_err(|e| ConceptBuildError::io(dir, e))?;
    }

    let topic_file = topics_dir.join(format!("{}.xml", item.id));
    remove_existing(&topic_file)?;
    let copied_topic = item.includes_topic && envelope_matches(item, source)?;
    if copied_topic {
        std::fs::copy(source, &topic_file).map_err(|e| ConceptBuildError::io(&topic_file, e))?;
    } else {
        write_envelope(item, source, &topic_file)?;
    }

    let companion_file = companions_dir.join(format!("{}{COMPANION_SUFFIX}", item.id));
    remove_existing(&companion_file)?;
    let authored = item.companion_source().filter(|p| p.is_file());
    let copied_companion = authored.is_some();
    match authored {
        Some(path) => {
            std::fs::copy(&path, &companion_file)
                .map_err(|e| ConceptBuildError::io(&companion_file, e))?;
        }
        None => write_companion(item, &companion_file)?,
    }

    debug!(
        topic = %topic_file.display(),
        copied = copied_topic,
        "topic materialized"
    );
    Ok(MaterializedTopic {
        topic_file,
        companion_file,
        copied_topic,
        copied_companion,
    })
}

/// Copy an Html topic's authored page into `html_dir` as `<id>.<ext>`.
///
/// An Html item without a page yields `None`; one whose page has vanished
/// is an error.
#[instrument(skip_all, fields(id = %item.id))]
pub fn materialize_html(item: &TopicItem, html_dir: &Path) -> Result<Option<PathBuf>> {
    if item.kind != TopicKind::Html {
        return Err(ConceptBuildError::validation(format!(
            "topic {} is not an html topic",
            item.id
        )));
    }
    let Some(source) = item.file_path.as_deref() else {
        return Ok(None);
    };
    if !source.is_file() {
        return Err(ConceptBuildError::io(
            source,
            std::io::Error::new(std::io::ErrorKind::NotFound, "html page not found"),
        ));
    }

    std::fs::create_dir_all(html_dir).map_err(|e| ConceptBuildError::io(html_dir, e))?;
    let extension = source
        .extension()
        .map(|e| e.to_string_lossy().into_owned())
        .unwrap_or_else(|| "htm".to_string());
    let target = html_dir.join(format!("{}.{extension}", item.id));
    remove_existing(&target)?;
    std::fs::copy(source, &target).map_err(|e| ConceptBuildError::io(&target, e))?;
    debug!(page = %target.display(), "html topic copied");
    Ok(Some(target))
}

fn remove_existing(path: &Path) -> Result<()> {
    if path.exists() {
        std::fs::remove_file(path).map_err(|e| ConceptBuildError::io(path, e))?;
    }
    Ok(())
}

/// The authored envelope already names `item` and can be copied as is.
fn envelope_matches(item: &TopicItem, source: &Path) -> Result<bool> {
    let info = DocumentInfo::inspect(source)?;
    Ok(info
        .id
        .is_some_and(|id| id.trim().eq_ignore_ascii_case(&item.id)))
}

/// Wrap the authored body in `<topic id=".." revisionNumber="..">`, replacing
/// any envelope the document already carries.
fn write_envelope(item: &TopicItem, source: &Path, target: &Path) -> Result<()> {
    let text = std::fs::read_to_string(source).map_err(|e| ConceptBuildError::io(source, e))?;
    let (declaration, body) = split_declaration(&text);
    let body = strip_envelope(body);

    let file = File::create(target).map_err(|e| ConceptBuildError::io(target, e))?;
    let mut out = BufWriter::new(file);
    write!(
        out,
        "{}\n<topic id=\"{}\" revisionNumber=\"{}\">\n{}\n</topic>",
        declaration.unwrap_or(DEFAULT_DECLARATION),
        item.id,
        item.revision,
        body.trim_end()
    )
    .and_then(|_| out.flush())
    .map_err(|e| ConceptBuildError::io(target, e))
}

/// Synthesize companion metadata from the item's own fields.
fn write_companion(item: &TopicItem, target: &Path) -> Result<()> {
    let file = File::create(target).map_err(|e| ConceptBuildError::io(target, e))?;
    let mut w = xml::writer(BufWriter::new(file));
    xml::write_decl(&mut w)?;
    xml::write_start(
        &mut w,
        "metadata",
        &[("fileAssetGuid", &item.id), ("assetTypeId", "CompanionFile")],
    )?;
    xml::write_start(&mut w, "topic", &[("id", &item.id)])?;
    xml::write_text_element(&mut w, "title", &[], &item.title)?;
    if let Some(toc_title) = item.toc_title.as_deref().filter(|t| !t.is_empty()) {
        xml::write_text_element(&mut w, "tableOfContentsTitle", &[], toc_title)?;
    }
    if let Some(link_text) = item.link_text.as_deref().filter(|t| !t.is_empty()) {
        xml::write_text_element(&mut w, "linkText", &[], link_text)?;
    }
    for attribute in &item.attributes {
        xml::write_text_element(
            &mut w,
            "attribute",
            &[("name", &attribute.name)],
            &attribute.value,
        )?;
    }
    for keyword in &item.keywords {
        xml::write_empty(
            &mut w,
            "keyword",
            &[("index", &keyword.index), ("term", &keyword.term)],
        )?;
    }
    xml::write_end(&mut w, "topic")?;
    xml::write_end(&mut w, "metadata")?;
    w.into_inner()
        .flush()
        .map_err(|e| ConceptBuildError::io(target, e))
}

#[cfg(test)]
mod tests {
    use super::*;
    use conceptbuild_content::Keyword;

    const ID: &str = "aaaaaaaa-0000-0000-0000-000000000001";

    struct Fixture {
        root: PathBuf,
    }

    impl Fixture {
        fn new() -> Self {
            let root = std::env::temp_dir().join(format!("cb-mat-{}", uuid::Uuid::now_v7()));
            std::fs::create_dir_all(root.join("docs")).unwrap();
            Self { root }
        }

        fn docs(&self) -> PathBuf {
            self.root.join("docs")
        }

        fn out(&self) -> (PathBuf, PathBuf) {
            (self.root.join("DdueXml"), self.root.join("DdueXmlComp"))
        }
    }

    impl Drop for Fixture {
        fn drop(&mut self) {
            let _ = std::fs::remove_dir_all(&self.root);
        }
    }

    #[test]
    fn wraps_plain_document_in_envelope() {
        let fx = Fixture::new();
        std::fs::write(
            fx.docs().join("intro.xml"),
            "<?xml version=\"1.0\" encoding=\"utf-8\"?>\n<developerConceptualDocument>\n  <summary/>\n</developerConceptualDocument>\n",
        )
        .unwrap();
        let mut item = TopicItem::topic(ID, "Intro").with_document("intro.xml", &fx.docs());
        item.revision = 2;
        item.keywords.push(Keyword {
            index: "K".into(),
            term: "start".into(),
        });
        let (topics, comps) = fx.out();

        let result = materialize_topic(&item, &topics, &comps).unwrap();
        assert!(!result.copied_topic);
        assert!(!result.copied_companion);

        let topic = std::fs::read_to_string(&result.topic_file).unwrap();
        assert_eq!(
            topic,
            format!(
                "<?xml version=\"1.0\" encoding=\"utf-8\"?>\n<topic id=\"{ID}\" revisionNumber=\"2\">\n<developerConceptualDocument>\n  <summary/>\n</developerConceptualDocument>\n</topic>"
            )
        );

        let companion = std::fs::read_to_string(&result.companion_file).unwrap();
        assert!(companion.contains(&format!(
            "<metadata fileAssetGuid=\"{ID}\" assetTypeId=\"CompanionFile\">"
        )));
        assert!(companion.contains("<title>Intro</title>"));
        assert!(companion.contains("<keyword index=\"K\" term=\"start\"/>"));
    }

    #[test]
    fn copies_enveloped_document_and_authored_companion() {
        let fx = Fixture::new();
        let enveloped = format!("<topic id=\"{ID}\" revisionNumber=\"5\"><developerHowToDocument/></topic>");
        std::fs::write(fx.docs().join("how.xml"), &enveloped).unwrap();
        std::fs::write(fx.docs().join("how.cmp.xml"), "<metadata>authored</metadata>").unwrap();

        let mut item = TopicItem::topic(ID, "How").with_document("how.xml", &fx.docs());
        item.begin_init();
        item.end_init();
        assert!(item.includes_topic);
        let (topics, comps) = fx.out();

        let result = materialize_topic(&item, &topics, &comps).unwrap();
        assert!(result.copied_topic);
        assert!(result.copied_companion);
        assert_eq!(std::fs::read_to_string(&result.topic_file).unwrap(), enveloped);
        assert_eq!(
            std::fs::read_to_string(&result.companion_file).unwrap(),
            "<metadata>authored</metadata>"
        );
    }

    #[test]
    fn mismatched_envelope_is_rewrapped() {
        let fx = Fixture::new();
        let other = "bbbbbbbb-0000-0000-0000-000000000009";
        std::fs::write(
            fx.docs().join("m.xml"),
            format!("<topic id=\"{other}\" revisionNumber=\"3\"><developerHowToDocument/></topic>"),
        )
        .unwrap();

        let mut item = TopicItem::topic(ID, "M").with_document("m.xml", &fx.docs());
        item.begin_init();
        item.end_init();
        assert_eq!(item.id, ID);
        assert!(item.includes_topic);
        let (topics, comps) = fx.out();

        let result = materialize_topic(&item, &topics, &comps).unwrap();
        assert!(!result.copied_topic);
        assert_eq!(
            std::fs::read_to_string(&result.topic_file).unwrap(),
            format!(
                "{DEFAULT_DECLARATION}\n<topic id=\"{ID}\" revisionNumber=\"3\">\n<developerHowToDocument/>\n</topic>"
            )
        );
    }

    #[test]
    fn materializing_twice_is_byte_identical() {
        let fx = Fixture::new();
        std::fs::write(fx.docs().join("a.xml"), "<developerSampleDocument/>").unwrap();
        let mut item = TopicItem::topic(ID, "A").with_document("a.xml", &fx.docs());
        item.toc_title = Some("Short A".into());
        let (topics, comps) = fx.out();

        let first = materialize_topic(&item, &topics, &comps).unwrap();
        let topic_1 = std::fs::read(&first.topic_file).unwrap();
        let comp_1 = std::fs::read(&first.companion_file).unwrap();

        let second = materialize_topic(&item, &topics, &comps).unwrap();
        assert_eq!(std::fs::read(&second.topic_file).unwrap(), topic_1);
        assert_eq!(std::fs::read(&second.companion_file).unwrap(), comp_1);
        assert!(String::from_utf8(topic_1).unwrap().starts_with(DEFAULT_DECLARATION));
    }

    #[test]
    fn html_page_is_copied_under_its_id() {
        let fx = Fixture::new();
        std::fs::write(fx.docs().join("page.html"), "<html><body>hi</body></html>").unwrap();
        let html_dir = fx.root.join("DdueHtml");

        let mut page = TopicItem::new(TopicKind::Html, ID, "Page").with_document("page.html", &fx.docs());
        let copied = materialize_html(&page, &html_dir).unwrap().unwrap();
        assert_eq!(copied, html_dir.join(format!("{ID}.html")));
        assert_eq!(
            std::fs::read_to_string(&copied).unwrap(),
            "<html><body>hi</body></html>"
        );

        page.file_path = None;
        assert_eq!(materialize_html(&page, &html_dir).unwrap(), None);

        let gone = TopicItem::new(TopicKind::Html, ID, "Gone").with_document("gone.htm", &fx.docs());
        let err = materialize_html(&gone, &html_dir).unwrap_err();
        assert!(matches!(err, ConceptBuildError::Io { .. }));
    }

    #[test]
    fn vanished_source_is_an_error() {
        let fx = Fixture::new();
        let item = TopicItem::topic(ID, "Gone").with_document("gone.xml", &fx.docs());
        let (topics, comps) = fx.out();
        let err = materialize_topic(&item, &topics, &comps).unwrap_err();
        assert!(matches!(err, ConceptBuildError::Io { .. }));
    }
}

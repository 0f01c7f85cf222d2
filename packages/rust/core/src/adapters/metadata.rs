//! Content metadata adapter: one flat `<topic>` record per document topic.

use std::io::Write;

use quick_xml::Writer;

use conceptbuild_content::TopicItem;
use conceptbuild_shared::xml;
use conceptbuild_shared::{ConceptBuildError, DEFAULT_FILE_VERSION, Result, TopicType};

use super::ProjectAdapter;
use crate::visitor::VisitResult;

pub struct MetadataAdapter<W: Write> {
    writer: Writer<W>,
    file_version: String,
    finished: bool,
}

impl<W: Write> MetadataAdapter<W> {
    /// `file_asset_guid` identifies the metadata document itself;
    /// `file_version` replaces the default `PBM_FileVersion` of items.
    pub fn new(out: W, file_asset_guid: &str, file_version: &str) -> Result<Self> {
        let mut writer = xml::writer(out);
        xml::write_decl(&mut writer)?;
        xml::write_start(
            &mut writer,
            "metadata",
            &[
                ("fileAssetGuid", file_asset_guid),
                ("assetTypeId", "ContentMetadata"),
            ],
        )?;
        Ok(Self {
            writer,
            file_version: file_version.to_string(),
            finished: false,
        })
    }

    pub fn into_inner(self) -> W {
        self.writer.into_inner()
    }
}

impl<W: Write> ProjectAdapter for MetadataAdapter<W> {
    fn name(&self) -> &str {
        "metadata"
    }

    fn on_write_topic(&mut self, item: &TopicItem) -> Result<()> {
        if !item.kind.has_document() {
            return Ok(());
        }
        let w = &mut self.writer;
        let revision = item.revision.to_string();
        xml::write_start(
            w,
            "topic",
            &[("id", &item.id), ("revisionNumber", &revision)],
        )?;

        let version = if item.version == DEFAULT_FILE_VERSION && !self.file_version.is_empty() {
            &self.file_version
        } else {
            &item.version
        };
        xml::write_text_element(w, "item", &[("id", "PBM_FileVersion")], version)?;
        xml::write_text_element(w, "title", &[], &item.title)?;
        if let Some(toc_title) = item.toc_title.as_deref().filter(|t| !t.is_empty()) {
            xml::write_text_element(w, "tableOfContentsTitle", &[], toc_title)?;
        }
        xml::write_empty(w, "runningHeaderText", &[("uscid", "runningHeaderText")])?;

        let type_id = match item.topic_type_id() {
            "" => TopicType::Conceptual.topic_type_id(),
            id => id,
        };
        xml::write_empty(w, "topicType", &[("id", type_id)])?;
        xml::write_end(w, "topic")
    }

    fn finish(&mut self, _result: &mut VisitResult) -> Result<()> {
        if self.finished {
            return Ok(());
        }
        self.finished = true;
        xml::write_end(&mut self.writer, "metadata")?;
        self.writer
            .get_mut()
            .flush()
            .map_err(ConceptBuildError::xml)
    }
}

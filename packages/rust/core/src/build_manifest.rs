//! The flat pre-assembly build manifest.
//!
//! Unlike the visitor's adapters this writer does its own walk: every
//! document topic yields two `<fileAsset>` records (the topic, then in a
//! second pass its companion file), followed by six fixed project assets.

use std::io::Write;
use std::path::{Path, PathBuf};

use chrono::{DateTime, Utc};
use quick_xml::Writer;
use quick_xml::events::{BytesText, Event};
use tracing::{debug, instrument};

use conceptbuild_content::{COMPANION_SUFFIX, TopicItem};
use conceptbuild_shared::xml;
use conceptbuild_shared::{ConceptBuildError, Result, TopicType};

use crate::adapters::create_output;
use crate::group::{BuildContext, ConceptualGroup};

const ASSET_TYPES: [&str; 14] = [
    "MNamespace",
    "MType",
    "Topic",
    "CompanionFile",
    "ProjSupportFile",
    "ContentMetadata",
    "MRefMetadata",
    "Toc",
    "ProjSettings",
    "ProjSettingsLoc",
    "BldManifestProj",
    "TocTechReview",
    "BldManifestArt",
    "BldManifestGroup",
];

const SOURCE_CATEGORIES: [(&str, &str); 4] = [
    ("BM", "Manifest"),
    ("PE", "Project Extracted Files"),
    ("PS", "Project Support Files"),
    ("Con", "Content"),
];

const TEAM_NAME: &str = "DevDiv UE";

/// Date format of `dataAsOfDateUtc` and `contentModifiedDateUtc`.
const DATE_FORMAT: &str = "%-m/%-d/%Y %-I:%M:%S %p";

#[derive(Clone, Copy, PartialEq, Eq)]
enum Pass {
    Topics,
    Companions,
}

/// Writes `TopicsBuildManifest{n}.proj.xml` for one group.
pub struct BuildManifestWriter<'a> {
    context: &'a BuildContext,
    data_as_of: DateTime<Utc>,
}

impl<'a> BuildManifestWriter<'a> {
    pub fn new(context: &'a BuildContext) -> Self {
        Self {
            context,
            data_as_of: Utc::now(),
        }
    }

    /// Pin the `dataAsOfDateUtc` stamp.
    pub fn with_timestamp(mut self, data_as_of: DateTime<Utc>) -> Self {
        self.data_as_of = data_as_of;
        self
    }

    /// Write the manifest into the working directory, replacing any earlier
    /// one, and return its path.
    #[instrument(skip_all, fields(group = %group.name))]
    pub fn write(&self, group: &ConceptualGroup) -> Result<PathBuf> {
        let path = self.context.path(&self.context.layout.build_manifest_file);
        let out = create_output(&path)?;
        self.write_to(group, out)?;
        debug!(path = %path.display(), "build manifest written");
        Ok(path)
    }

    pub fn write_to<W: Write>(&self, group: &ConceptualGroup, out: W) -> Result<()> {
        let dirs = AssetDirs::new(&group.project_name, self.context.lcid);
        let working_dir = self.context.working_dir().display().to_string();
        let lcid = self.context.lcid.to_string();
        let data_as_of = self.data_as_of.format(DATE_FORMAT).to_string();

        let mut w = xml::writer(out);
        xml::write_decl(&mut w)?;
        xml::write_start(
            &mut w,
            "manifest",
            &[
                ("fileAssetGuid", &group.document_id),
                ("assetTypeId", "BldManifestProj"),
            ],
        )?;
        xml::write_start(
            &mut w,
            "manifestExecution",
            &[
                ("manifestExecutionGuid", &group.document_id),
                ("buildLocType", "Build"),
                ("lcid", &lcid),
                ("includeOptions", "113"),
                ("buildSourceRootPath", &working_dir),
                ("buildSourceMainPath", &working_dir),
                ("dataAsOfDateUtc", &data_as_of),
                ("buildLocHandoffBy", ""),
                ("buildLocHandoffHost", "DOCBUILD9"),
                ("sourceControlOptions", "Default"),
                ("publishTargetName", ""),
                ("resultsCode", "DataGathered"),
            ],
        )?;

        xml::write_empty(
            &mut w,
            "requestedProjects",
            &[
                ("projectGuid", &group.project_id),
                ("projectName", &group.project_name),
            ],
        )?;
        xml::write_empty(&mut w, "requestedLcids", &[])?;

        xml::write_start(&mut w, "assetTypes", &[])?;
        for asset_type in ASSET_TYPES {
            xml::write_empty(&mut w, "assetType", &[("assetTypeId", asset_type)])?;
        }
        xml::write_end(&mut w, "assetTypes")?;

        xml::write_start(&mut w, "buildSourceCategories", &[])?;
        for (code, name) in SOURCE_CATEGORIES {
            xml::write_empty(
                &mut w,
                "buildSourceCategory",
                &[("categoryCode", code), ("categoryName", name)],
            )?;
        }
        xml::write_end(&mut w, "buildSourceCategories")?;

        xml::write_start(&mut w, "assetParents", &[])?;
        xml::write_empty(
            &mut w,
            "assetParent",
            &[
                ("assetParentGuid", &group.project_id),
                ("assetParentName", &group.project_name),
                ("assetParentLevel", "Project"),
            ],
        )?;
        xml::write_end(&mut w, "assetParents")?;

        xml::write_start(&mut w, "assetDetail", &[])?;
        let assets = AssetWriter {
            group,
            dirs: &dirs,
            lcid: &lcid,
        };
        write_comment(&mut w, "The topics manifest...")?;
        assets.write_topics(&mut w, Pass::Topics)?;
        write_comment(&mut w, "The companion file manifest...")?;
        assets.write_topics(&mut w, Pass::Companions)?;
        write_comment(&mut w, "The assets manifest...")?;
        let layout = &self.context.layout;
        for (asset_type, file_name) in [
            ("ContentMetadata", &layout.metadata_file),
            ("Toc", &layout.build_toc_file),
            ("ProjSettings", &layout.project_settings_file),
            ("ProjSettingsLoc", &layout.project_settings_loc_file),
            ("BldManifestProj", &layout.build_manifest_file),
            ("TocTechReview", &layout.toc_tech_review_file),
        ] {
            assets.write_fixed_asset(&mut w, asset_type, file_name)?;
        }
        xml::write_end(&mut w, "assetDetail")?;

        xml::write_end(&mut w, "manifestExecution")?;
        xml::write_end(&mut w, "manifest")?;
        w.get_mut().flush().map_err(ConceptBuildError::xml)
    }
}

fn write_comment<W: Write>(w: &mut Writer<W>, text: &str) -> Result<()> {
    w.write_event(Event::Comment(BytesText::from_escaped(text)))
        .map_err(ConceptBuildError::xml)
}

/// Relative directories of the three asset families.
struct AssetDirs {
    topics: String,
    companions: String,
    extracted: String,
    lcid: u32,
}

impl AssetDirs {
    fn new(project_name: &str, lcid: u32) -> Self {
        Self {
            topics: format!("Content\\{project_name}\\Content"),
            companions: format!("Content\\{project_name}\\XmlComp"),
            extracted: format!("Content\\{project_name}\\ExtractedFiles"),
            lcid,
        }
    }

    fn root_relative(&self, dir: &str, file_name: &str) -> String {
        format!("{}\\{dir}\\{file_name}", self.lcid)
    }
}

struct AssetWriter<'g> {
    group: &'g ConceptualGroup,
    dirs: &'g AssetDirs,
    lcid: &'g str,
}

impl AssetWriter<'_> {
    fn write_topics<W: Write>(&self, w: &mut Writer<W>, pass: Pass) -> Result<()> {
        let content = &self.group.content;
        for item in content.items().iter().chain(content.related_topics()) {
            self.write_topic(w, item, pass)?;
        }
        Ok(())
    }

    /// One record per document-bound item and pass. Html and Marker items
    /// have no `<id>.xml` or `<id>.cmp.xml` for the Content and XmlComp
    /// directories, so they get no record, but their children are still walked.
    fn write_topic<W: Write>(&self, w: &mut Writer<W>, item: &TopicItem, pass: Pass) -> Result<()> {
        if item.is_empty() {
            return Ok(());
        }
        if item.kind.has_document() {
            let (asset_type, dir, file_name) = match pass {
                Pass::Topics => ("Topic", &self.dirs.topics, format!("{}.xml", item.id)),
                Pass::Companions => (
                    "CompanionFile",
                    &self.dirs.companions,
                    format!("{}{COMPANION_SUFFIX}", item.id),
                ),
            };
            let topic_type = if item.topic_type.is_none() {
                TopicType::Conceptual
            } else {
                item.topic_type
            };
            let schema_id = topic_type.schema_id();
            let revision = item.revision.to_string();
            let modified = item
                .file_path
                .as_deref()
                .and_then(modified_date)
                .unwrap_or_default();
            let root_relative = self.dirs.root_relative(dir, &file_name);

            xml::write_start(
                w,
                "fileAsset",
                &[
                    ("fileAssetGuid", &item.id),
                    ("assetType", asset_type),
                    ("assetParentGuid", &self.group.project_id),
                    ("assetParentName", &self.group.project_name),
                    ("projectGuid", &self.group.project_id),
                    ("projectName", &self.group.project_name),
                    ("revisionNumber", &revision),
                    ("fileAssetRepositoryGuid", &self.group.repository_id),
                    ("fileRelativeDirectory", dir),
                    ("fileName", &file_name),
                    ("assetTitle", &item.title),
                    ("topicSchemaId", &schema_id),
                    ("topicSchemaName", topic_type.name()),
                    ("ueTeamName", TEAM_NAME),
                    ("crc32", ""),
                    ("contentModifiedDateUtc", &modified),
                    ("recycledStatusName", "New"),
                    ("localizable", "False"),
                    ("supportFileComment", ""),
                ],
            )?;
            self.write_language_detail(w, &root_relative)?;
            xml::write_end(w, "fileAsset")?;
        }
        for child in &item.children {
            self.write_topic(w, child, pass)?;
        }
        Ok(())
    }

    fn write_fixed_asset<W: Write>(
        &self,
        w: &mut Writer<W>,
        asset_type: &str,
        file_name: &str,
    ) -> Result<()> {
        let dir = &self.dirs.extracted;
        let root_relative = self.dirs.root_relative(dir, file_name);
        xml::write_start(
            w,
            "fileAsset",
            &[
                ("fileAssetGuid", &self.group.document_id),
                ("assetType", asset_type),
                ("assetParentGuid", &self.group.project_id),
                ("assetParentName", &self.group.project_name),
                ("projectGuid", &self.group.project_id),
                ("projectName", &self.group.project_name),
                ("revisionNumber", ""),
                ("fileAssetRepositoryGuid", ""),
                ("fileRelativeDirectory", dir),
                ("fileName", file_name),
                ("assetTitle", ""),
                ("topicSchemaId", ""),
                ("topicSchemaName", ""),
                ("ueTeamName", ""),
                ("crc32", ""),
                ("contentModifiedDateUtc", ""),
                ("recycledStatusName", ""),
                ("localizable", "False"),
                ("supportFileComment", ""),
            ],
        )?;
        self.write_language_detail(w, &root_relative)?;
        xml::write_end(w, "fileAsset")
    }

    // Single locale only.
    fn write_language_detail<W: Write>(&self, w: &mut Writer<W>, root_relative: &str) -> Result<()> {
        xml::write_start(w, "languageDetail", &[])?;
        xml::write_empty(
            w,
            "assetLanguageUnit",
            &[("lcid", self.lcid), ("rootRelativePath", root_relative)],
        )?;
        xml::write_end(w, "languageDetail")
    }
}

fn modified_date(path: &Path) -> Option<String> {
    let modified = std::fs::metadata(path).and_then(|m| m.modified()).ok()?;
    Some(DateTime::<Utc>::from(modified).format(DATE_FORMAT).to_string())
}

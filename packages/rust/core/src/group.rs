//! Build groups, their on-disk layout, and the build context.

use std::path::{Path, PathBuf};

use serde::Serialize;
use tracing::debug;

use conceptbuild_content::ConceptualContent;
use conceptbuild_shared::{BuildSettings, ConceptBuildError, DEFAULT_FILE_VERSION, Result, new_id};

// ---------------------------------------------------------------------------
// ConceptualGroup
// ---------------------------------------------------------------------------

/// One unit of conceptual content going through the build, together with
/// the identities stamped into its manifests.
#[derive(Debug, Clone)]
pub struct ConceptualGroup {
    pub name: String,
    pub id: String,
    pub content: ConceptualContent,
    /// Asset id of the group's metadata and build manifest documents.
    pub document_id: String,
    pub project_id: String,
    pub repository_id: String,
    pub project_name: String,
    pub project_title: String,
    pub file_version: String,
}

impl ConceptualGroup {
    pub fn new(name: impl Into<String>, content: ConceptualContent) -> Self {
        let name = name.into();
        Self {
            id: new_id(),
            content,
            document_id: new_id(),
            project_id: new_id(),
            repository_id: new_id(),
            project_name: name.clone(),
            project_title: name.clone(),
            file_version: DEFAULT_FILE_VERSION.to_string(),
            name,
        }
    }

    /// Apply project identity from build settings.
    pub fn with_settings(mut self, settings: &BuildSettings) -> Self {
        if !settings.project_name.is_empty() {
            self.project_name = settings.project_name.clone();
        }
        self.project_title = if settings.project_title.is_empty() {
            self.project_name.clone()
        } else {
            settings.project_title.clone()
        };
        if !settings.file_version.is_empty() {
            self.file_version = settings.file_version.clone();
        }
        self
    }
}

// ---------------------------------------------------------------------------
// GroupLayout
// ---------------------------------------------------------------------------

/// File and directory names of one group's outputs, relative to the
/// working directory.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct GroupLayout {
    pub toc_file: String,
    pub manifest_file: String,
    pub metadata_file: String,
    pub build_manifest_file: String,
    pub build_toc_file: String,
    pub project_settings_file: String,
    pub project_settings_loc_file: String,
    pub toc_tech_review_file: String,
    pub topics_dir: String,
    pub companions_dir: String,
    /// Copies of Html topics' authored pages.
    pub html_dir: String,
}

impl GroupLayout {
    /// Names for the group at `index`. A lone group (`None`) gets unnumbered
    /// names; numbered groups are suffixed with their index.
    pub fn for_index(index: Option<usize>) -> Self {
        let n = index.map(|i| i.to_string()).unwrap_or_default();
        Self {
            toc_file: format!("TopicsToc{n}.xml"),
            manifest_file: format!("TopicsManifest{n}.xml"),
            metadata_file: format!("TopicsMetadata{n}.xml"),
            build_manifest_file: format!("TopicsBuildManifest{n}.proj.xml"),
            build_toc_file: format!("TopicsBuildToc{n}.xml"),
            project_settings_file: format!("TopicsProjectSettings{n}.xml"),
            project_settings_loc_file: format!("TopicsProjectSettings{n}.loc.xml"),
            toc_tech_review_file: format!("TopicsTocTechReview{n}.xml"),
            topics_dir: format!("DdueXml{n}"),
            companions_dir: format!("DdueXmlComp{n}"),
            html_dir: format!("DdueHtml{n}"),
        }
    }
}

impl Default for GroupLayout {
    fn default() -> Self {
        Self::for_index(None)
    }
}

// ---------------------------------------------------------------------------
// BuildContext
// ---------------------------------------------------------------------------

/// Where and how a group is built.
#[derive(Debug, Clone)]
pub struct BuildContext {
    working_dir: PathBuf,
    pub lcid: u32,
    pub layout: GroupLayout,
    /// Materialize `<id>.xml` / `<id>.cmp.xml` during the visit.
    pub output_topics: bool,
    /// Drive the TOC, metadata and manifest adapters during the visit.
    pub apply_adapters: bool,
}

impl BuildContext {
    /// Create a context rooted at `working_dir`, creating it if needed.
    /// An empty or uncreatable directory is fatal.
    pub fn new(working_dir: impl Into<PathBuf>, lcid: u32, layout: GroupLayout) -> Result<Self> {
        let working_dir = working_dir.into();
        if working_dir.as_os_str().is_empty() {
            return Err(ConceptBuildError::context("no working directory configured"));
        }
        std::fs::create_dir_all(&working_dir).map_err(|e| {
            ConceptBuildError::context(format!(
                "cannot create working directory {}: {e}",
                working_dir.display()
            ))
        })?;
        debug!(path = %working_dir.display(), "build context ready");
        Ok(Self {
            working_dir,
            lcid,
            layout,
            output_topics: true,
            apply_adapters: true,
        })
    }

    pub fn from_settings(settings: &BuildSettings, layout: GroupLayout) -> Result<Self> {
        let mut context = Self::new(&settings.working_dir, settings.lcid, layout)?;
        context.output_topics = settings.output_topics;
        context.apply_adapters = settings.apply_adapters;
        Ok(context)
    }

    pub fn working_dir(&self) -> &Path {
        &self.working_dir
    }

    /// Absolute path of a layout file name.
    pub fn path(&self, file_name: &str) -> PathBuf {
        self.working_dir.join(file_name)
    }

    pub fn topics_dir(&self) -> PathBuf {
        self.path(&self.layout.topics_dir)
    }

    pub fn companions_dir(&self) -> PathBuf {
        self.path(&self.layout.companions_dir)
    }

    pub fn html_dir(&self) -> PathBuf {
        self.path(&self.layout.html_dir)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn single_group_layout_is_unnumbered() {
        let layout = GroupLayout::for_index(None);
        assert_eq!(layout.toc_file, "TopicsToc.xml");
        assert_eq!(layout.project_settings_loc_file, "TopicsProjectSettings.loc.xml");
        assert_eq!(layout.topics_dir, "DdueXml");
        assert_eq!(layout, GroupLayout::default());
    }

    #[test]
    fn numbered_group_layout() {
        let layout = GroupLayout::for_index(Some(2));
        assert_eq!(layout.metadata_file, "TopicsMetadata2.xml");
        assert_eq!(layout.build_manifest_file, "TopicsBuildManifest2.proj.xml");
        assert_eq!(layout.companions_dir, "DdueXmlComp2");
        assert_eq!(layout.html_dir, "DdueHtml2");
    }

    #[test]
    fn context_requires_working_dir() {
        let err = BuildContext::new("", 1033, GroupLayout::default()).unwrap_err();
        assert!(matches!(err, ConceptBuildError::Context { .. }));
    }

    #[test]
    fn context_creates_working_dir() {
        let dir = std::env::temp_dir()
            .join(format!("cb-group-{}", uuid::Uuid::now_v7()))
            .join("nested");
        let context = BuildContext::new(&dir, 1033, GroupLayout::default()).unwrap();
        assert!(dir.is_dir());
        assert_eq!(context.topics_dir(), dir.join("DdueXml"));
        assert_eq!(context.html_dir(), dir.join("DdueHtml"));
        let _ = std::fs::remove_dir_all(dir.parent().unwrap());
    }

    #[test]
    fn group_takes_project_identity_from_settings() {
        let mut settings = BuildSettings::default();
        settings.project_name = "Guide".into();
        settings.project_title = String::new();
        settings.file_version = "2.1.0.0".into();
        let group = ConceptualGroup::new("Group", ConceptualContent::default()).with_settings(&settings);
        assert_eq!(group.project_name, "Guide");
        assert_eq!(group.project_title, "Guide");
        assert_eq!(group.file_version, "2.1.0.0");
        assert_ne!(group.project_id, group.document_id);
    }
}

//! End-to-end group build: load → visit → build manifest.

use std::path::PathBuf;
use std::time::{Duration, Instant};

use serde::Serialize;
use tracing::{info, instrument, warn};

use conceptbuild_content::{ContentReader, FilterChain};
use conceptbuild_shared::{BuildSettings, ConceptBuildError, Result};

use crate::build_manifest::BuildManifestWriter;
use crate::group::{BuildContext, ConceptualGroup, GroupLayout};
use crate::visitor::{ProjectVisitor, VisitResult};

/// Configuration for [`build_group`].
#[derive(Debug, Clone)]
pub struct BuildGroupConfig {
    /// The content description file (`conceptualContent` or `files`).
    pub content_file: PathBuf,
    /// Directory the authored documents are resolved against. Defaults to
    /// the directory holding the content file.
    pub docs_dir: Option<PathBuf>,
    /// Group name; defaults to the content file stem.
    pub group_name: Option<String>,
    /// Index used to number the group's output files.
    pub group_index: Option<usize>,
    pub settings: BuildSettings,
}

impl BuildGroupConfig {
    pub fn new(content_file: impl Into<PathBuf>, settings: BuildSettings) -> Self {
        Self {
            content_file: content_file.into(),
            docs_dir: None,
            group_name: None,
            group_index: None,
            settings,
        }
    }

    fn docs_dir(&self) -> PathBuf {
        self.docs_dir.clone().unwrap_or_else(|| {
            self.content_file
                .parent()
                .map(PathBuf::from)
                .unwrap_or_default()
        })
    }

    fn group_name(&self) -> String {
        self.group_name.clone().unwrap_or_else(|| {
            self.content_file
                .file_stem()
                .map(|s| s.to_string_lossy().into_owned())
                .unwrap_or_else(|| "Conceptual".to_string())
        })
    }
}

/// Result of [`build_group`].
#[derive(Debug, Serialize)]
pub struct BuildGroupResult {
    pub group_name: String,
    pub working_dir: PathBuf,
    /// Non-empty topics in the loaded tree.
    pub topic_count: usize,
    pub visit: VisitResult,
    pub build_manifest_file: PathBuf,
    pub elapsed: Duration,
}

/// Progress callback for reporting pipeline status.
pub trait ProgressReporter: Send + Sync {
    /// Called when entering a new phase.
    fn phase(&self, name: &str);
    /// Called once the content tree is loaded.
    fn content_loaded(&self, topic_count: usize);
    /// Called when the pipeline completes.
    fn done(&self, result: &BuildGroupResult);
}

/// No-op progress reporter for headless/test usage.
pub struct SilentProgress;

impl ProgressReporter for SilentProgress {
    fn phase(&self, _name: &str) {}
    fn content_loaded(&self, _topic_count: usize) {}
    fn done(&self, _result: &BuildGroupResult) {}
}

/// Build one conceptual group.
///
/// 1. Load and filter the content description
/// 2. Visit the tree: TOC, metadata, manifest and topic files
/// 3. Write the build manifest
#[instrument(skip_all, fields(content = %config.content_file.display()))]
pub fn build_group(
    config: &BuildGroupConfig,
    progress: &dyn ProgressReporter,
) -> Result<BuildGroupResult> {
    let start = Instant::now();
    let settings = &config.settings;

    // --- Phase 1: Load ---
    progress.phase("Loading content");
    if !config.content_file.is_file() {
        return Err(ConceptBuildError::io(
            &config.content_file,
            std::io::Error::new(std::io::ErrorKind::NotFound, "content file not found"),
        ));
    }
    let reader = ContentReader::new()
        .with_filters(FilterChain::from_config(&settings.filters))
        .document_must_exist(settings.document_must_exist);
    let content = reader.read(&config.content_file, &config.docs_dir())?;
    let topic_count = content.topic_count();
    progress.content_loaded(topic_count);
    if content.is_empty() {
        warn!("content has no topics, outputs will be empty");
    }

    let group = ConceptualGroup::new(config.group_name(), content).with_settings(settings);
    let context = BuildContext::from_settings(settings, GroupLayout::for_index(config.group_index))?;

    // --- Phase 2: Visit ---
    progress.phase("Writing topics");
    let visit = ProjectVisitor::new(&context).visit(&group)?;

    // --- Phase 3: Build manifest ---
    progress.phase("Writing build manifest");
    let build_manifest_file = BuildManifestWriter::new(&context).write(&group)?;

    let result = BuildGroupResult {
        group_name: group.name.clone(),
        working_dir: context.working_dir().to_path_buf(),
        topic_count,
        visit,
        build_manifest_file,
        elapsed: start.elapsed(),
    };
    progress.done(&result);

    info!(
        group = %result.group_name,
        topics = result.topic_count,
        materialized = result.visit.materialized,
        failed = result.visit.failed.len(),
        elapsed_ms = result.elapsed.as_millis() as u64,
        "build complete"
    );
    Ok(result)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn defaults_come_from_content_file() {
        let config = BuildGroupConfig::new("/work/docs/Guide.content", BuildSettings::default());
        assert_eq!(config.docs_dir(), PathBuf::from("/work/docs"));
        assert_eq!(config.group_name(), "Guide");
    }

    #[test]
    fn missing_content_file_is_fatal() {
        let dir = std::env::temp_dir().join(format!("cb-pipe-{}", uuid::Uuid::now_v7()));
        let mut settings = BuildSettings::default();
        settings.working_dir = dir.join("out");
        let config = BuildGroupConfig::new(dir.join("missing.content"), settings);
        let err = build_group(&config, &SilentProgress).unwrap_err();
        assert!(matches!(err, ConceptBuildError::Io { .. }));
        assert!(!dir.join("out").exists());
    }
}

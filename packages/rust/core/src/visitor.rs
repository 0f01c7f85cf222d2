//! The project visitor.
//!
//! One depth-first walk over a group's content drives every registered
//! adapter and, optionally, materializes each topic's files (Html topics
//! get a copy of their page). For each node:
//! begin on all adapters, write on all adapters, materialize, recurse into
//! the non-empty children, end on all adapters. Begin and end therefore nest
//! exactly like the tree.

use std::collections::BTreeMap;
use std::path::PathBuf;

use serde::Serialize;
use tracing::{debug, info, instrument, warn};

use conceptbuild_content::{TopicItem, TopicKind};
use conceptbuild_shared::Result;

use crate::adapters::{ProjectAdapter, standard_adapters};
use crate::group::{BuildContext, ConceptualGroup};
use crate::materialize::{materialize_html, materialize_topic};

/// Everything a visit produced, including what adapters publish on finish.
#[derive(Debug, Clone, Default, Serialize)]
pub struct VisitResult {
    pub toc_file: Option<PathBuf>,
    pub metadata_file: Option<PathBuf>,
    pub manifest_file: Option<PathBuf>,
    /// HTML page id → title.
    pub html_titles: BTreeMap<String, String>,
    /// Marker topics found during the walk, for a later TOC rewrite.
    pub markers: Vec<TopicItem>,
    pub has_markers: bool,
    /// Nodes visited.
    pub visited: usize,
    /// Topics whose files were written.
    pub materialized: usize,
    /// Ids of topics whose files could not be written.
    pub failed: Vec<String>,
}

/// Walks a group's content tree once.
pub struct ProjectVisitor<'a> {
    context: &'a BuildContext,
}

impl<'a> ProjectVisitor<'a> {
    pub fn new(context: &'a BuildContext) -> Self {
        Self { context }
    }

    /// Visit `group` with the standard TOC, metadata and manifest adapters
    /// (when enabled), writing to the context's layout files.
    #[instrument(skip_all, fields(group = %group.name))]
    pub fn visit(&self, group: &ConceptualGroup) -> Result<VisitResult> {
        let mut adapters = if self.context.apply_adapters {
            standard_adapters(self.context, group)?
        } else {
            Vec::new()
        };
        let mut result = self.visit_with(group, &mut adapters)?;
        if self.context.apply_adapters {
            let layout = &self.context.layout;
            result.toc_file = Some(self.context.path(&layout.toc_file));
            result.metadata_file = Some(self.context.path(&layout.metadata_file));
            result.manifest_file = Some(self.context.path(&layout.manifest_file));
        }
        info!(
            visited = result.visited,
            materialized = result.materialized,
            failed = result.failed.len(),
            "project visit complete"
        );
        Ok(result)
    }

    /// Visit `group` with caller-supplied adapters. Every adapter is
    /// finished exactly once, whether or not the walk succeeded.
    pub fn visit_with(
        &self,
        group: &ConceptualGroup,
        adapters: &mut [Box<dyn ProjectAdapter + '_>],
    ) -> Result<VisitResult> {
        let mut result = VisitResult::default();

        let walked = self.walk(group, adapters, &mut result);

        let mut finished = Ok(());
        for adapter in adapters.iter_mut() {
            if let Err(e) = adapter.finish(&mut result) {
                warn!(adapter = adapter.name(), error = %e, "adapter failed to finish");
                if finished.is_ok() {
                    finished = Err(e);
                }
            }
        }

        walked?;
        finished?;
        Ok(result)
    }

    fn walk(
        &self,
        group: &ConceptualGroup,
        adapters: &mut [Box<dyn ProjectAdapter + '_>],
        result: &mut VisitResult,
    ) -> Result<()> {
        let content = &group.content;
        for item in content.items().iter().chain(content.related_topics()) {
            if item.is_empty() {
                debug!(id = item.id, "skipping empty item");
                continue;
            }
            self.write_topic(item, adapters, result)?;
        }
        Ok(())
    }

    /// Write the item's own files. Failures are recorded, never raised.
    fn materialize(&self, item: &TopicItem, result: &mut VisitResult) {
        let outcome = if item.kind.has_document() {
            materialize_topic(item, &self.context.topics_dir(), &self.context.companions_dir())
                .map(|_| true)
        } else if item.kind == TopicKind::Html {
            materialize_html(item, &self.context.html_dir()).map(|page| page.is_some())
        } else {
            Ok(false)
        };
        match outcome {
            Ok(true) => result.materialized += 1,
            Ok(false) => {}
            Err(e) => {
                warn!(id = item.id, error = %e, "could not materialize topic");
                result.failed.push(item.id.clone());
            }
        }
    }

    fn write_topic(
        &self,
        item: &TopicItem,
        adapters: &mut [Box<dyn ProjectAdapter + '_>],
        result: &mut VisitResult,
    ) -> Result<()> {
        result.visited += 1;
        for adapter in adapters.iter_mut() {
            adapter.on_begin_topic(item)?;
        }
        for adapter in adapters.iter_mut() {
            adapter.on_write_topic(item)?;
        }

        if self.context.output_topics {
            self.materialize(item, result);
        }

        for child in item.children.iter().filter(|c| !c.is_empty()) {
            self.write_topic(child, adapters, result)?;
        }

        for adapter in adapters.iter_mut() {
            adapter.on_end_topic(item)?;
        }
        Ok(())
    }
}

//! Output adapters driven by the project visitor.
//!
//! Each adapter owns exactly one output stream for the lifetime of a visit.
//! The visitor calls `on_begin_topic`, `on_write_topic` and `on_end_topic`
//! for every node, in tree order, on every adapter in registration order;
//! `finish` is always called once at the end, even when the walk failed.

mod manifest;
mod metadata;
mod toc;

use std::fs::File;
use std::io::BufWriter;
use std::path::Path;

use conceptbuild_content::TopicItem;
use conceptbuild_shared::{ConceptBuildError, Result};

use crate::visitor::VisitResult;

pub use manifest::ManifestAdapter;
pub use metadata::MetadataAdapter;
pub use toc::TocAdapter;

// ---------------------------------------------------------------------------
// Trait
// ---------------------------------------------------------------------------

/// A stateful writer fed by the project visitor.
pub trait ProjectAdapter {
    /// Human-readable adapter name for tracing.
    fn name(&self) -> &str;

    /// A node is entered. Begin/end calls nest exactly like the tree.
    fn on_begin_topic(&mut self, _item: &TopicItem) -> Result<()> {
        Ok(())
    }

    /// Emit this node's record.
    fn on_write_topic(&mut self, _item: &TopicItem) -> Result<()> {
        Ok(())
    }

    /// A node and all of its children are done.
    fn on_end_topic(&mut self, _item: &TopicItem) -> Result<()> {
        Ok(())
    }

    /// Close the output and publish anything collected into `result`.
    fn finish(&mut self, result: &mut VisitResult) -> Result<()>;
}

/// Open a buffered output file, replacing any previous one.
pub(crate) fn create_output(path: &Path) -> Result<BufWriter<File>> {
    if let Some(parent) = path.parent() {
        std::fs::create_dir_all(parent).map_err(|e| ConceptBuildError::io(parent, e))?;
    }
    let file = File::create(path).map_err(|e| ConceptBuildError::io(path, e))?;
    Ok(BufWriter::new(file))
}

/// The three standard adapters, in their fixed order, writing to the
/// layout's files under the working directory.
pub fn standard_adapters(
    context: &crate::group::BuildContext,
    group: &crate::group::ConceptualGroup,
) -> Result<Vec<Box<dyn ProjectAdapter>>> {
    let toc = TocAdapter::new(create_output(&context.path(&context.layout.toc_file))?)?;
    let metadata = MetadataAdapter::new(
        create_output(&context.path(&context.layout.metadata_file))?,
        &group.document_id,
        &group.file_version,
    )?;
    let manifest =
        ManifestAdapter::new(create_output(&context.path(&context.layout.manifest_file))?)?;
    Ok(vec![Box::new(toc), Box::new(metadata), Box::new(manifest)])
}

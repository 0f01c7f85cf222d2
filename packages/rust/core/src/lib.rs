//! Build orchestration for conceptual documentation groups.
//!
//! A group's content tree is walked once by the [`visitor::ProjectVisitor`],
//! which drives the TOC, metadata and manifest adapters and materializes each
//! topic's files. The [`build_manifest::BuildManifestWriter`] then writes the
//! flat pre-assembly manifest. [`pipeline::build_group`] runs the whole thing.

pub mod adapters;
pub mod build_manifest;
pub mod group;
pub mod materialize;
pub mod pipeline;
pub mod visitor;

pub use adapters::{ManifestAdapter, MetadataAdapter, ProjectAdapter, TocAdapter, standard_adapters};
pub use build_manifest::BuildManifestWriter;
pub use group::{BuildContext, ConceptualGroup, GroupLayout};
pub use materialize::{MaterializedTopic, materialize_html, materialize_topic};
pub use pipeline::{BuildGroupConfig, BuildGroupResult, ProgressReporter, SilentProgress, build_group};
pub use visitor::{ProjectVisitor, VisitResult};

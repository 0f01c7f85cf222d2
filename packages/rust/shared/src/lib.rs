//! Shared error model, configuration, identity and XML helpers for ConceptBuild.
//!
//! This crate is the foundation depended on by all other ConceptBuild crates.
//! It provides:
//! - [`ConceptBuildError`]: the unified error type
//! - Identity utilities ([`is_valid_id`], [`TopicType`])
//! - Configuration ([`AppConfig`], [`BuildSettings`], config loading)
//! - `quick-xml` reader/writer helpers ([`xml`])

pub mod config;
pub mod error;
pub mod ids;
pub mod xml;

// Re-export public API at crate root for ergonomic imports.
pub use config::{
    AppConfig, BuildSettings, DEFAULT_FILE_VERSION, DEFAULT_LCID, DefaultsConfig, FilterConfig,
    FilterKind, ProjectConfig, config_dir, config_file_path, default_config_toml, init_config,
    load_config, load_config_from,
};
pub use error::{ConceptBuildError, Result};
pub use ids::{
    TopicType, derive_topic_id, is_valid_document_tag, is_valid_id, is_valid_topic_type_id,
    new_id, to_topic_type_id,
};

//! The conceptual topic tree and its declarative source format.
//!
//! - [`TopicItem`] / [`TopicKind`]: one node of the hierarchy
//! - [`ConceptualContent`]: root items, related topics, categories, properties
//! - [`ContentFilter`] / [`FilterChain`]: load-time exclusion
//! - [`ContentReader`] / [`ContentWriter`]: streaming load and save
//! - [`DocumentInfo`]: what an authored document says about itself

pub mod content;
pub mod document;
pub mod filter;
pub mod item;
pub mod loader;
pub mod writer;

pub use content::{CONTENT_VERSION, Category, ConceptualContent};
pub use document::{DocumentInfo, split_declaration, strip_envelope};
pub use filter::{CategoryFilter, ContentFilter, FilterChain, PatternField, PatternFilter};
pub use item::{Attribute, COMPANION_SUFFIX, Keyword, TopicItem, TopicKind, find_parent};
pub use loader::ContentReader;
pub use writer::ContentWriter;

//! Error types for ConceptBuild.
//!
//! Library crates use [`ConceptBuildError`] via `thiserror`.
//! The CLI wraps this with `color-eyre` for rich diagnostics.
//!
//! Parse-time tree problems (bad ids, missing documents, unknown roots) are
//! not errors at all: the loader turns them into absent items. Everything
//! here is for conditions that must stop the operation.

use std::path::PathBuf;

/// Top-level error type for all ConceptBuild operations.
#[derive(Debug, thiserror::Error)]
pub enum ConceptBuildError {
    /// Configuration loading or validation error.
    #[error("config error: {message}")]
    Config { message: String },

    /// Content source could not be parsed.
    #[error("parse error: {message}")]
    Parse { message: String },

    /// Low-level XML reader/writer failure.
    #[error("xml error: {message}")]
    Xml { message: String },

    /// Filesystem I/O error.
    #[error("I/O error at {path:?}: {source}")]
    Io {
        path: PathBuf,
        source: std::io::Error,
    },

    /// Data validation error (invalid id, broken invariant, etc.).
    #[error("validation error: {message}")]
    Validation { message: String },

    /// A collaborator the build requires is missing or unusable.
    #[error("build context error: {message}")]
    Context { message: String },

    /// Unknown property in a strictly parsed property group.
    #[error("unknown property '{name}' in property group '{section}'")]
    Schema { section: String, name: String },
}

/// Convenience alias used throughout the codebase.
pub type Result<T> = std::result::Result<T, ConceptBuildError>;

impl ConceptBuildError {
    /// Create a config error from any displayable message.
    pub fn config(msg: impl Into<String>) -> Self {
        Self::Config {
            message: msg.into(),
        }
    }

    /// Create a parse error from any displayable message.
    pub fn parse(msg: impl Into<String>) -> Self {
        Self::Parse {
            message: msg.into(),
        }
    }

    /// Create an XML error from any displayable value.
    pub fn xml(err: impl std::fmt::Display) -> Self {
        Self::Xml {
            message: err.to_string(),
        }
    }

    /// Create a validation error from any displayable message.
    pub fn validation(msg: impl Into<String>) -> Self {
        Self::Validation {
            message: msg.into(),
        }
    }

    /// Create a build context error from any displayable message.
    pub fn context(msg: impl Into<String>) -> Self {
        Self::Context {
            message: msg.into(),
        }
    }

    /// Create a strict-schema error for an unrecognized property.
    pub fn schema(section: impl Into<String>, name: impl Into<String>) -> Self {
        Self::Schema {
            section: section.into(),
            name: name.into(),
        }
    }

    /// Wrap a `std::io::Error` with a path for context.
    pub fn io(path: impl Into<PathBuf>, source: std::io::Error) -> Self {
        Self::Io {
            path: path.into(),
            source,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn error_display_formatting() {
        let err = ConceptBuildError::config("missing working directory");
        assert_eq!(err.to_string(), "config error: missing working directory");

        let err = ConceptBuildError::schema("General", "Colour");
        assert_eq!(
            err.to_string(),
            "unknown property 'Colour' in property group 'General'"
        );

        let err = ConceptBuildError::context("no output directory");
        assert!(err.to_string().contains("no output directory"));
    }

    #[test]
    fn io_error_keeps_path() {
        let source = std::io::Error::new(std::io::ErrorKind::NotFound, "gone");
        let err = ConceptBuildError::io("/tmp/topic.xml", source);
        assert!(err.to_string().contains("/tmp/topic.xml"));
        assert!(err.to_string().contains("gone"));
    }
}

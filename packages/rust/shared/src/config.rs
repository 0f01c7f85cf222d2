//! Application configuration for ConceptBuild.
//!
//! User config lives at `~/.conceptbuild/conceptbuild.toml`.
//! CLI flags override config file values, which override defaults.

use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};

use crate::error::{ConceptBuildError, Result};

/// Default configuration file name.
const CONFIG_FILE_NAME: &str = "conceptbuild.toml";

/// Default config directory name under the user's home.
const CONFIG_DIR_NAME: &str = ".conceptbuild";

/// Locale id used when nothing else is configured (en-US).
pub const DEFAULT_LCID: u32 = 1033;

/// Default `PBM_FileVersion` stamped on topics.
pub const DEFAULT_FILE_VERSION: &str = "1.0.0.0";

// ---------------------------------------------------------------------------
// Config structs (matching conceptbuild.toml schema)
// ---------------------------------------------------------------------------

/// Top-level application config, deserialized from TOML.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct AppConfig {
    /// Global defaults.
    #[serde(default)]
    pub defaults: DefaultsConfig,

    /// Project identity stamped into the generated manifests.
    #[serde(default)]
    pub project: ProjectConfig,

    /// Content exclusion filters, evaluated in order.
    #[serde(default)]
    pub filters: Vec<FilterConfig>,
}

/// `[defaults]` section.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DefaultsConfig {
    /// Build working directory (outputs land here).
    #[serde(default = "default_working_dir")]
    pub working_dir: String,

    /// Locale id carried through every output.
    #[serde(default = "default_lcid")]
    pub lcid: u32,

    /// Drop items whose authored document is missing.
    #[serde(default = "default_true")]
    pub document_must_exist: bool,

    /// Materialize `<id>.xml` / `<id>.cmp.xml` for every topic.
    #[serde(default = "default_true")]
    pub output_topics: bool,

    /// Drive the TOC, metadata and manifest writers during the visit.
    #[serde(default = "default_true")]
    pub apply_adapters: bool,
}

impl Default for DefaultsConfig {
    fn default() -> Self {
        Self {
            working_dir: default_working_dir(),
            lcid: DEFAULT_LCID,
            document_must_exist: true,
            output_topics: true,
            apply_adapters: true,
        }
    }
}

fn default_working_dir() -> String {
    "./conceptbuild-out".into()
}
fn default_lcid() -> u32 {
    DEFAULT_LCID
}
fn default_true() -> bool {
    true
}

/// `[project]` section.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ProjectConfig {
    /// Short project name (used in manifest paths).
    #[serde(default = "default_project_name")]
    pub name: String,

    /// Human-readable project title.
    #[serde(default)]
    pub title: String,

    /// Version string written as `PBM_FileVersion`.
    #[serde(default = "default_file_version")]
    pub file_version: String,
}

impl Default for ProjectConfig {
    fn default() -> Self {
        Self {
            name: default_project_name(),
            title: String::new(),
            file_version: default_file_version(),
        }
    }
}

fn default_project_name() -> String {
    "Conceptual".into()
}
fn default_file_version() -> String {
    DEFAULT_FILE_VERSION.into()
}

/// What a configured filter matches against.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum FilterKind {
    /// Item is filed under one of the listed categories.
    Category,
    /// Item title matches one of the listed regexes.
    Title,
    /// Authored relative path matches one of the listed regexes.
    Path,
}

/// `[[filters]]` entry.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct FilterConfig {
    pub kind: FilterKind,
    #[serde(default)]
    pub values: Vec<String>,
    #[serde(default = "default_true")]
    pub enabled: bool,
}

// ---------------------------------------------------------------------------
// Build settings (runtime, merged from config + CLI flags)
// ---------------------------------------------------------------------------

/// Runtime build configuration, merged from config file + CLI flags.
#[derive(Debug, Clone)]
pub struct BuildSettings {
    /// Directory all group outputs are written under.
    pub working_dir: PathBuf,
    /// Locale id.
    pub lcid: u32,
    /// Drop items whose document is missing instead of keeping them.
    pub document_must_exist: bool,
    /// Materialize per-topic files.
    pub output_topics: bool,
    /// Drive the output adapters.
    pub apply_adapters: bool,
    /// Project name.
    pub project_name: String,
    /// Project title (falls back to the name when empty).
    pub project_title: String,
    /// `PBM_FileVersion` value.
    pub file_version: String,
    /// Content filters.
    pub filters: Vec<FilterConfig>,
}

impl From<&AppConfig> for BuildSettings {
    fn from(config: &AppConfig) -> Self {
        Self {
            working_dir: expand_home(&config.defaults.working_dir),
            lcid: config.defaults.lcid,
            document_must_exist: config.defaults.document_must_exist,
            output_topics: config.defaults.output_topics,
            apply_adapters: config.defaults.apply_adapters,
            project_name: config.project.name.clone(),
            project_title: config.project.title.clone(),
            file_version: config.project.file_version.clone(),
            filters: config.filters.clone(),
        }
    }
}

impl Default for BuildSettings {
    fn default() -> Self {
        Self::from(&AppConfig::default())
    }
}

/// Expand a leading `~/` against the user's home directory.
pub fn expand_home(path: &str) -> PathBuf {
    match path.strip_prefix("~/") {
        Some(rest) => dirs::home_dir()
            .map(|home| home.join(rest))
            .unwrap_or_else(|| PathBuf::from(path)),
        None => PathBuf::from(path),
    }
}

// ---------------------------------------------------------------------------
// Config loading
// ---------------------------------------------------------------------------

/// Get the path to the config directory (`~/.conceptbuild/`).
pub fn config_dir() -> Result<PathBuf> {
    let home = dirs::home_dir()
        .ok_or_else(|| ConceptBuildError::config("could not determine home directory"))?;
    Ok(home.join(CONFIG_DIR_NAME))
}

/// Get the path to the config file (`~/.conceptbuild/conceptbuild.toml`).
pub fn config_file_path() -> Result<PathBuf> {
    Ok(config_dir()?.join(CONFIG_FILE_NAME))
}

/// Load the application config from disk. Returns defaults if the file does not exist.
pub fn load_config() -> Result<AppConfig> {
    let path = config_file_path()?;

    if !path.exists() {
        tracing::debug!(?path, "config file not found, using defaults");
        return Ok(AppConfig::default());
    }

    load_config_from(&path)
}

/// Load the application config from a specific file path.
pub fn load_config_from(path: &Path) -> Result<AppConfig> {
    let content = std::fs::read_to_string(path).map_err(|e| ConceptBuildError::io(path, e))?;

    toml::from_str(&content).map_err(|e| {
        ConceptBuildError::config(format!("failed to parse {}: {e}", path.display()))
    })
}

/// Create the config directory and write a default config file.
/// Returns the path to the created file.
pub fn init_config() -> Result<PathBuf> {
    let dir = config_dir()?;
    std::fs::create_dir_all(&dir).map_err(|e| ConceptBuildError::io(&dir, e))?;

    let path = dir.join(CONFIG_FILE_NAME);
    let content = default_config_toml()?;

    std::fs::write(&path, content).map_err(|e| ConceptBuildError::io(&path, e))?;
    tracing::info!(?path, "created default config file");

    Ok(path)
}

/// Render the default config as pretty TOML.
pub fn default_config_toml() -> Result<String> {
    toml::to_string_pretty(&AppConfig::default())
        .map_err(|e| ConceptBuildError::config(e.to_string()))
}

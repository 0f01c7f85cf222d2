//! CLI command definitions, routing, and tracing setup.

use std::path::{Path, PathBuf};

use clap::{Parser, Subcommand};
use color_eyre::eyre::{Result, eyre};
use conceptbuild_content::{ConceptualContent, ContentReader, FilterChain, TopicItem};
use conceptbuild_core::pipeline::{
    BuildGroupConfig, BuildGroupResult, ProgressReporter, build_group,
};
use conceptbuild_shared::{AppConfig, BuildSettings, TopicType, init_config, load_config};
use indicatif::{ProgressBar, ProgressStyle};
use tracing::info;

// ---------------------------------------------------------------------------
// CLI structure
// ---------------------------------------------------------------------------

/// conceptbuild: prepare conceptual topics for a documentation build.
#[derive(Parser)]
#[command(
    name = "conceptbuild",
    version,
    about = "Turn a conceptual content description into TOC, metadata, manifest and topic files.",
    long_about = None,
)]
pub(crate) struct Cli {
    /// Log format: text (default) or json.
    #[arg(long, default_value = "text", global = true)]
    pub log_format: LogFormat,

    /// Verbosity level (-v, -vv, -vvv).
    #[arg(short, long, action = clap::ArgAction::Count, global = true)]
    pub verbose: u8,

    #[command(subcommand)]
    pub command: Command,
}

/// Log output format.
#[derive(Clone, Debug, clap::ValueEnum)]
pub(crate) enum LogFormat {
    Text,
    Json,
}

/// Top-level CLI subcommands.
#[derive(Subcommand)]
pub(crate) enum Command {
    /// Build one content group into the working directory.
    Build {
        /// Content description file (conceptualContent or files format).
        content: PathBuf,

        /// Directory topic paths are resolved against (defaults to the
        /// content file's directory).
        #[arg(long)]
        docs: Option<PathBuf>,

        /// Output working directory.
        #[arg(short, long, env = "CONCEPTBUILD_OUT")]
        out: Option<PathBuf>,

        /// Project name stamped into the manifests.
        #[arg(short, long)]
        project: Option<String>,

        /// Locale id.
        #[arg(long)]
        lcid: Option<u32>,

        /// Keep topics whose document does not exist.
        #[arg(long)]
        allow_missing: bool,

        /// Skip writing per-topic files.
        #[arg(long)]
        no_topics: bool,
    },

    /// Load a content description and print its topic tree.
    Inspect {
        /// Content description file.
        content: PathBuf,

        /// Directory topic paths are resolved against.
        #[arg(long)]
        docs: Option<PathBuf>,

        /// Print the tree as JSON.
        #[arg(long)]
        json: bool,
    },

    /// Look up a topic type by document tag or GUID.
    TopicType {
        /// A document root tag (e.g. developerHowToDocument) or a topic type GUID.
        key: String,
    },

    /// Configuration management.
    Config {
        /// Config subcommand.
        #[command(subcommand)]
        action: ConfigAction,
    },
}

/// Config subcommands.
#[derive(Subcommand)]
pub(crate) enum ConfigAction {
    /// Initialize config file with defaults.
    Init,
    /// Show resolved configuration.
    Show,
}

// ---------------------------------------------------------------------------
// Tracing setup
// ---------------------------------------------------------------------------

/// Initialize tracing based on CLI flags.
pub(crate) fn init_tracing(cli: &Cli) {
    use tracing_subscriber::{EnvFilter, fmt};

    let filter = match cli.verbose {
        0 => "conceptbuild=info",
        1 => "conceptbuild=debug",
        _ => "conceptbuild=trace",
    };

    let env_filter = EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| EnvFilter::new(filter));

    match cli.log_format {
        LogFormat::Text => {
            fmt()
                .with_env_filter(env_filter)
                .with_target(false)
                .with_writer(std::io::stderr)
                .init();
        }
        LogFormat::Json => {
            fmt()
                .json()
                .with_env_filter(env_filter)
                .with_writer(std::io::stderr)
                .init();
        }
    }
}

// ---------------------------------------------------------------------------
// Command dispatch
// ---------------------------------------------------------------------------

/// Run the CLI command.
pub(crate) fn run(cli: Cli) -> Result<()> {
    match cli.command {
        Command::Build {
            content,
            docs,
            out,
            project,
            lcid,
            allow_missing,
            no_topics,
        } => {
            let mut settings = BuildSettings::from(&load_config()?);
            if let Some(out) = out {
                settings.working_dir = out;
            }
            if let Some(project) = project {
                settings.project_name = project;
            }
            if let Some(lcid) = lcid {
                settings.lcid = lcid;
            }
            if allow_missing {
                settings.document_must_exist = false;
            }
            if no_topics {
                settings.output_topics = false;
            }
            cmd_build(&content, docs, settings)
        }
        Command::Inspect {
            content,
            docs,
            json,
        } => cmd_inspect(&content, docs.as_deref(), json),
        Command::TopicType { key } => cmd_topic_type(&key),
        Command::Config { action } => match action {
            ConfigAction::Init => cmd_config_init(),
            ConfigAction::Show => cmd_config_show(),
        },
    }
}

// ---------------------------------------------------------------------------
// Command handlers
// ---------------------------------------------------------------------------

fn cmd_build(content: &Path, docs: Option<PathBuf>, settings: BuildSettings) -> Result<()> {
    info!(
        content = %content.display(),
        out = %settings.working_dir.display(),
        project = %settings.project_name,
        "building conceptual group"
    );

    let mut config = BuildGroupConfig::new(content, settings);
    config.docs_dir = docs;

    let reporter = CliProgress::new();
    let result = build_group(&config, &reporter)?;

    println!();
    println!("  Group built successfully!");
    println!("  Group:     {}", result.group_name);
    println!("  Topics:    {}", result.topic_count);
    println!("  Written:   {}", result.visit.materialized);
    if !result.visit.failed.is_empty() {
        println!("  Failed:    {}", result.visit.failed.join(", "));
    }
    if result.visit.has_markers {
        println!("  Markers:   {}", result.visit.markers.len());
    }
    println!("  Output:    {}", result.working_dir.display());
    println!("  Manifest:  {}", result.build_manifest_file.display());
    println!("  Time:      {:.1}s", result.elapsed.as_secs_f64());
    println!();
    Ok(())
}

fn cmd_inspect(content_file: &Path, docs: Option<&Path>, json: bool) -> Result<()> {
    let config = load_config()?;
    let settings = BuildSettings::from(&config);
    let docs_dir = docs
        .map(Path::to_path_buf)
        .or_else(|| content_file.parent().map(Path::to_path_buf))
        .unwrap_or_default();

    let content = ContentReader::new()
        .with_filters(FilterChain::from_config(&settings.filters))
        .document_must_exist(settings.document_must_exist)
        .read(content_file, &docs_dir)?;

    if json {
        println!("{}", serde_json::to_string_pretty(&content)?);
        return Ok(());
    }
    print_tree(&content);
    Ok(())
}

fn print_tree(content: &ConceptualContent) {
    println!("{} ({} topics)", content.id, content.topic_count());
    for item in content.items() {
        print_item(item, 1);
    }
    if !content.related_topics().is_empty() {
        println!("  related:");
        for item in content.related_topics() {
            print_item(item, 2);
        }
    }
}

fn print_item(item: &TopicItem, depth: usize) {
    let indent = "  ".repeat(depth);
    let hidden = if item.visible { "" } else { " [hidden]" };
    println!(
        "{indent}{} {} ({}, {}){hidden}",
        item.id,
        item.display_title(),
        item.kind.as_str(),
        item.topic_type.name()
    );
    for child in &item.children {
        print_item(child, depth + 1);
    }
}

fn cmd_topic_type(key: &str) -> Result<()> {
    let by_tag = TopicType::from_document_tag(key);
    let topic_type = if by_tag.is_none() {
        TopicType::from_topic_type_id(key)
    } else {
        by_tag
    };
    if topic_type.is_none() {
        return Err(eyre!("unknown document tag or topic type id '{key}'"));
    }
    println!("  Name: {}", topic_type.name());
    println!("  Tag:  {}", topic_type.document_tag());
    println!("  Id:   {}", topic_type.topic_type_id());
    Ok(())
}

fn cmd_config_init() -> Result<()> {
    let path = init_config()?;
    println!("Config initialized at: {}", path.display());
    Ok(())
}

fn cmd_config_show() -> Result<()> {
    let config: AppConfig = load_config()?;
    let toml_str = toml::to_string_pretty(&config)?;
    println!("{toml_str}");
    Ok(())
}

// ---------------------------------------------------------------------------
// CLI progress reporter
// ---------------------------------------------------------------------------

/// CLI progress reporter using an indicatif spinner.
struct CliProgress {
    spinner: ProgressBar,
}

impl CliProgress {
    fn new() -> Self {
        let spinner = ProgressBar::new_spinner();
        spinner.set_style(
            ProgressStyle::with_template("{spinner:.cyan} {msg}")
                .unwrap_or_else(|_| ProgressStyle::default_spinner())
                .tick_strings(&["⠋", "⠙", "⠹", "⠸", "⠼", "⠴", "⠦", "⠧", "⠇", "⠏"]),
        );
        spinner.enable_steady_tick(std::time::Duration::from_millis(80));
        Self { spinner }
    }
}

impl ProgressReporter for CliProgress {
    fn phase(&self, name: &str) {
        self.spinner.set_message(name.to_string());
    }

    fn content_loaded(&self, topic_count: usize) {
        self.spinner
            .set_message(format!("Loaded {topic_count} topics"));
    }

    fn done(&self, _result: &BuildGroupResult) {
        self.spinner.finish_and_clear();
    }
}

impl Drop for CliProgress {
    fn drop(&mut self) {
        if !self.spinner.is_finished() {
            self.spinner.finish_and_clear();
        }
    }
}

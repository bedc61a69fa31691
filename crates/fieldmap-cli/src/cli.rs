//! Command-line interface argument parsing and definitions
//!
//! This module defines the CLI structure using clap's derive API,
//! providing a type-safe and well-documented command interface.

use clap::{Parser, Subcommand, ValueEnum};
use fieldmap_core::export::ExportFormat;
use fieldmap_core::FieldKind;
use is_terminal::IsTerminal;
use std::path::PathBuf;

/// Fieldmap CLI - Field compatibility, transformations and cache benchmarks
///
/// Inspect which source field kinds can feed the case-study schema, apply
/// value transformations, validate mapping configurations and measure how
/// much the transformation cache helps.
#[derive(Parser, Debug)]
#[command(
    name = "fieldmap",
    version,
    author,
    about,
    long_about = None,
    propagate_version = true,
    arg_required_else_help = true
)]
pub struct Cli {
    /// Enable verbose output (can be used multiple times for increased verbosity)
    #[arg(short, long, action = clap::ArgAction::Count, global = true)]
    pub verbose: u8,

    /// Suppress all non-essential output
    #[arg(short, long, global = true, conflicts_with = "verbose")]
    pub quiet: bool,

    /// Path to configuration file
    #[arg(short, long, global = true, env = "FIELDMAP_CONFIG")]
    pub config: Option<PathBuf>,

    /// Output format for results
    #[arg(short, long, value_enum, global = true, default_value = "human")]
    pub output: OutputFormat,

    /// Disable colored output
    #[arg(long, global = true)]
    pub no_color: bool,

    /// The subcommand to run
    #[command(subcommand)]
    pub command: Commands,
}

/// Available subcommands
#[derive(Subcommand, Debug)]
pub enum Commands {
    /// List the registered transformations
    Transformations(TransformationsArgs),

    /// Classify a destination/source field kind pair
    Classify(ClassifyArgs),

    /// Show how every source kind relates to one destination kind
    Matrix(MatrixArgs),

    /// Apply a transformation to a single value
    Apply(ApplyArgs),

    /// Benchmark transformations with and without the cache
    Bench(BenchArgs),

    /// Validate a mapping configuration against a source schema
    Validate(ValidateArgs),

    /// Map one source record with a mapping configuration
    Map(MapArgs),

    /// Manage configuration files and settings
    Config(ConfigArgs),

    /// Generate shell completions for the specified shell
    Completions(CompletionsArgs),
}

/// Arguments for the transformations command
#[derive(Parser, Debug)]
pub struct TransformationsArgs {
    /// Only list transformations from this kind
    #[arg(long, value_parser = parse_kind)]
    pub from: Option<FieldKind>,

    /// Only list transformations into this kind
    #[arg(long, value_parser = parse_kind)]
    pub to: Option<FieldKind>,

    /// Include each transformation's example input and output
    #[arg(long)]
    pub examples: bool,
}

/// Arguments for the classify command
#[derive(Parser, Debug)]
pub struct ClassifyArgs {
    /// Destination field kind (e.g. text, image)
    #[arg(value_name = "DEST", value_parser = parse_kind)]
    pub dest: FieldKind,

    /// Source field kind (e.g. rich_text, files)
    #[arg(value_name = "SOURCE", value_parser = parse_kind)]
    pub source: FieldKind,
}

/// Arguments for the matrix command
#[derive(Parser, Debug)]
pub struct MatrixArgs {
    /// Destination field kind
    #[arg(value_name = "DEST", value_parser = parse_kind)]
    pub dest: FieldKind,

    /// Hide incompatible source kinds
    #[arg(long)]
    pub mappable_only: bool,
}

/// Arguments for the apply command
#[derive(Parser, Debug)]
pub struct ApplyArgs {
    /// Source field kind
    #[arg(long, value_parser = parse_kind)]
    pub from: FieldKind,

    /// Destination field kind
    #[arg(long, value_parser = parse_kind)]
    pub to: FieldKind,

    /// Value to transform; parsed as JSON, or taken as a plain string otherwise
    #[arg(long, allow_hyphen_values = true)]
    pub value: String,

    /// Transformation options as a JSON object or comma-separated key=value pairs
    #[arg(long)]
    pub options: Option<String>,

    /// Use this transformation instead of the one registered for the pair
    #[arg(short, long)]
    pub transformation: Option<String>,
}

/// Arguments for the bench command
#[derive(Parser, Debug)]
pub struct BenchArgs {
    /// Benchmark a single transformation
    #[arg(short, long, conflicts_with = "all")]
    pub transformation: Option<String>,

    /// Benchmark every benchmarkable transformation (default)
    #[arg(long)]
    pub all: bool,

    /// Iterations per run (defaults to the configured value)
    #[arg(short, long)]
    pub iterations: Option<usize>,

    /// Sample values per iteration (defaults to the configured value)
    #[arg(short, long)]
    pub samples: Option<usize>,

    /// Export results and analysis to this file
    #[arg(long, value_name = "PATH")]
    pub export: Option<PathBuf>,

    /// Export format (inferred from the export path when omitted)
    #[arg(long, value_enum)]
    pub format: Option<ExportFormatArg>,

    /// Apply the recommended capacity and TTL increases after the run
    #[arg(long)]
    pub auto_optimize: bool,
}

/// Arguments for the validate command
#[derive(Parser, Debug)]
pub struct ValidateArgs {
    /// Path to the mapping configuration (JSON or YAML)
    #[arg(value_name = "MAPPING_CONFIG")]
    pub mapping_config: PathBuf,

    /// Path to the source field definitions (JSON array)
    #[arg(long, value_name = "FIELDS_JSON")]
    pub source_schema: PathBuf,

    /// Path to destination field definitions (defaults to the case-study schema)
    #[arg(long, value_name = "FIELDS_JSON")]
    pub destination_schema: Option<PathBuf>,
}

/// Arguments for the map command
#[derive(Parser, Debug)]
pub struct MapArgs {
    /// Path to the mapping configuration (JSON or YAML)
    #[arg(value_name = "MAPPING_CONFIG")]
    pub mapping_config: PathBuf,

    /// Path to the source field definitions (JSON array)
    #[arg(long, value_name = "FIELDS_JSON")]
    pub source_schema: PathBuf,

    /// Path to destination field definitions (defaults to the case-study schema)
    #[arg(long, value_name = "FIELDS_JSON")]
    pub destination_schema: Option<PathBuf>,

    /// Path to the source record (JSON object keyed by source field id)
    #[arg(long, value_name = "RECORD_JSON")]
    pub record: PathBuf,
}

/// Arguments for the config command
#[derive(Parser, Debug)]
pub struct ConfigArgs {
    #[command(subcommand)]
    pub action: ConfigAction,
}

/// Configuration management actions
#[derive(Subcommand, Debug)]
pub enum ConfigAction {
    /// Write a configuration file with default values
    Init(ConfigInitArgs),

    /// Show the effective configuration
    Show(ConfigShowArgs),
}

/// Arguments for config init
#[derive(Parser, Debug)]
pub struct ConfigInitArgs {
    /// Where to write the file (defaults to .fieldmap.toml)
    #[arg(value_name = "PATH")]
    pub path: Option<PathBuf>,

    /// Write to the user config directory instead
    #[arg(long, conflicts_with = "path")]
    pub user: bool,

    /// Force overwrite an existing file
    #[arg(long)]
    pub force: bool,
}

/// Arguments for config show
#[derive(Parser, Debug)]
pub struct ConfigShowArgs {
    /// Show configuration in specified format
    #[arg(short, long, value_enum, default_value = "toml")]
    pub format: ConfigFormat,
}

/// Configuration file formats
#[derive(Copy, Clone, Debug, PartialEq, Eq, ValueEnum)]
pub enum ConfigFormat {
    /// TOML format
    Toml,
    /// JSON format
    Json,
    /// YAML format
    Yaml,
}

/// Arguments for generating shell completions
#[derive(Parser, Debug)]
pub struct CompletionsArgs {
    /// Shell to generate completions for
    #[arg(value_enum)]
    pub shell: Shell,
}

/// Output format options
#[derive(Copy, Clone, Debug, PartialEq, Eq, ValueEnum)]
pub enum OutputFormat {
    /// Human-readable formatted output
    Human,
    /// JSON output
    Json,
    /// YAML output
    Yaml,
    /// Pretty-printed JSON output
    JsonPretty,
}

/// Benchmark export formats
#[derive(Copy, Clone, Debug, PartialEq, Eq, ValueEnum)]
pub enum ExportFormatArg {
    /// JSON envelope with results and analysis
    Json,
    /// One CSV row per benchmark run
    Csv,
}

/// Supported shells for completion generation
#[derive(Copy, Clone, Debug, PartialEq, Eq, ValueEnum)]
pub enum Shell {
    /// Bash shell
    Bash,
    /// Zsh shell
    Zsh,
    /// Fish shell
    Fish,
    /// PowerShell
    PowerShell,
    /// Elvish shell
    Elvish,
}

impl Cli {
    /// Parse command-line arguments
    pub fn parse_args() -> Self {
        Self::parse()
    }

    /// Get the effective verbosity level (considering quiet flag)
    pub fn verbosity_level(&self) -> u8 {
        if self.quiet {
            0
        } else {
            self.verbose
        }
    }

    /// Check if colored output should be used
    pub fn use_color(&self) -> bool {
        !self.no_color && std::io::stdout().is_terminal()
    }
}

/// Parse a field kind by its snake_case name
fn parse_kind(s: &str) -> Result<FieldKind, String> {
    s.parse::<FieldKind>().map_err(|e| e.to_string())
}

impl From<ExportFormatArg> for ExportFormat {
    fn from(format: ExportFormatArg) -> Self {
        match format {
            ExportFormatArg::Json => ExportFormat::Json,
            ExportFormatArg::Csv => ExportFormat::Csv,
        }
    }
}

impl Shell {
    /// Convert to clap_complete shell type
    pub fn to_clap_shell(self) -> clap_complete::Shell {
        match self {
            Shell::Bash => clap_complete::Shell::Bash,
            Shell::Zsh => clap_complete::Shell::Zsh,
            Shell::Fish => clap_complete::Shell::Fish,
            Shell::PowerShell => clap_complete::Shell::PowerShell,
            Shell::Elvish => clap_complete::Shell::Elvish,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use clap::CommandFactory;

    #[test]
    fn verify_cli() {
        Cli::command().debug_assert();
    }

    #[test]
    fn test_verbosity_level() {
        let cli = Cli::parse_from(["fieldmap", "-vv", "classify", "text", "rich_text"]);
        assert_eq!(cli.verbosity_level(), 2);

        let quiet = Cli::parse_from(["fieldmap", "--quiet", "classify", "text", "rich_text"]);
        assert_eq!(quiet.verbosity_level(), 0);
    }

    #[test]
    fn test_kind_arguments() {
        let cli = Cli::parse_from(["fieldmap", "classify", "image", "files"]);
        match cli.command {
            Commands::Classify(args) => {
                assert_eq!(args.dest, FieldKind::Image);
                assert_eq!(args.source, FieldKind::Files);
            }
            other => panic!("unexpected command {:?}", other),
        }

        assert!(Cli::try_parse_from(["fieldmap", "classify", "image", "spreadsheet"]).is_err());
    }

    #[test]
    fn test_bench_arguments() {
        let cli = Cli::parse_from([
            "fieldmap",
            "bench",
            "--transformation",
            "date_to_text",
            "--iterations",
            "5",
            "--export",
            "out.csv",
            "--auto-optimize",
        ]);
        match cli.command {
            Commands::Bench(args) => {
                assert_eq!(args.transformation.as_deref(), Some("date_to_text"));
                assert_eq!(args.iterations, Some(5));
                assert_eq!(args.export, Some(PathBuf::from("out.csv")));
                assert!(args.auto_optimize);
                assert!(args.format.is_none());
            }
            other => panic!("unexpected command {:?}", other),
        }

        assert!(Cli::try_parse_from(["fieldmap", "bench", "--all", "--transformation", "x"]).is_err());
    }

    #[test]
    fn test_apply_accepts_negative_values() {
        let cli = Cli::parse_from(["fieldmap", "apply", "--from", "number", "--to", "text", "--value", "-3.5"]);
        match cli.command {
            Commands::Apply(args) => assert_eq!(args.value, "-3.5"),
            other => panic!("unexpected command {:?}", other),
        }
    }
}

//! Command-line interface argument parsing and definitions
//!
//! This module defines the CLI structure using clap's derive API.

use clap::{Parser, Subcommand, ValueEnum};
use is_terminal::IsTerminal;
use std::path::PathBuf;

/// Wikimap CLI - Transform Omeka S values for Wikidata
///
/// Preview block chains on sample values, apply exported mappings to Omeka S
/// items and check mapping documents for blocks that would not run.
#[derive(Parser, Debug)]
#[command(
    name = "wikimap",
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
    #[arg(short, long, global = true, env = "WIKIMAP_CONFIG")]
    pub config: Option<PathBuf>,

    /// Output format for results [default: from config, else human]
    #[arg(short, long, value_enum, global = true)]
    pub output: Option<OutputFormat>,

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
    /// Run a block chain over a value and show every step
    Preview(PreviewArgs),

    /// Apply a mapping document to Omeka S items
    Apply(ApplyArgs),

    /// List the available block types and their default configs
    Blocks(BlocksArgs),

    /// Resolve a field path against a JSON record
    Resolve(ResolveArgs),

    /// Check a mapping document for blocks that would not run cleanly
    Validate(ValidateArgs),

    /// Manage configuration files and settings
    Config(ConfigArgs),

    /// Generate shell completions for the specified shell
    Completions(CompletionsArgs),
}

/// Arguments for the preview command
#[derive(Parser, Debug)]
pub struct PreviewArgs {
    /// Value to transform
    #[arg(value_name = "VALUE")]
    pub value: String,

    /// Blocks to run: a JSON/YAML list of blocks or a single mapping entry
    #[arg(short, long, value_name = "FILE")]
    pub blocks: PathBuf,

    /// Record that `{{field:...}}` tokens resolve against
    #[arg(short, long, value_name = "FILE")]
    pub source: Option<PathBuf>,

    /// Output file path (stdout if not specified)
    #[arg(long = "save-to")]
    pub output_file: Option<PathBuf>,
}

/// Arguments for the apply command
#[derive(Parser, Debug)]
pub struct ApplyArgs {
    /// Mapping document path, or a name looked up in the mappings directory
    #[arg(short, long, value_name = "NAME_OR_FILE")]
    pub mapping: String,

    /// Omeka S items: a single item or a JSON array of items
    #[arg(short, long, value_name = "FILE")]
    pub items: PathBuf,

    /// Keep values whose display string is empty
    #[arg(long)]
    pub keep_empty: bool,

    /// Save the results to a file
    #[arg(long = "save-to", value_name = "OUTPUT_FILE")]
    pub save_to: Option<PathBuf>,
}

/// Arguments for the blocks command
#[derive(Parser, Debug)]
pub struct BlocksArgs {
    /// Show only this block type (e.g. findReplace)
    #[arg(short = 't', long = "type", value_name = "TYPE")]
    pub block_type: Option<String>,
}

/// Arguments for the resolve command
#[derive(Parser, Debug)]
pub struct ResolveArgs {
    /// JSON or YAML record
    #[arg(value_name = "FILE")]
    pub record: PathBuf,

    /// Dot-separated path, e.g. `dcterms:creator.0.@value`
    #[arg(value_name = "PATH")]
    pub path: String,

    /// Use the type-aware display conversion on the resolved node
    #[arg(long)]
    pub display: bool,
}

/// Arguments for the validate command
#[derive(Parser, Debug)]
pub struct ValidateArgs {
    /// Path to the mapping document
    #[arg(value_name = "MAPPING")]
    pub mapping: PathBuf,

    /// Treat warnings as failures
    #[arg(long)]
    pub strict: bool,
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
    /// Write a default configuration file
    Init(ConfigInitArgs),

    /// Show current configuration values
    Show(ConfigShowArgs),

    /// Print the configuration file locations that are searched
    Path,
}

/// Arguments for config init
#[derive(Parser, Debug)]
pub struct ConfigInitArgs {
    /// Where to write the file (defaults to the user config directory)
    #[arg(value_name = "FILE")]
    pub path: Option<PathBuf>,

    /// Directory searched for mappings given by name
    #[arg(long, value_name = "DIR")]
    pub mappings_dir: Option<PathBuf>,

    /// Write logs to this file instead of stderr
    #[arg(long, value_name = "FILE")]
    pub log_file: Option<PathBuf>,

    /// Keep empty values when applying mappings
    #[arg(long)]
    pub keep_empty: bool,

    /// Force overwrite existing config files
    #[arg(long)]
    pub force: bool,
}

/// Arguments for config show
#[derive(Parser, Debug)]
pub struct ConfigShowArgs {
    /// Show configuration in specified format
    #[arg(short, long, value_enum, default_value = "yaml")]
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

    /// The `--output` flag, falling back to the config file's format name
    pub fn output_format(&self, configured: &str) -> OutputFormat {
        self.output
            .or_else(|| OutputFormat::from_str(configured, true).ok())
            .unwrap_or(OutputFormat::Human)
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
        // Verify that the CLI structure is valid
        Cli::command().debug_assert();
    }

    #[test]
    fn test_verbosity_level() {
        let cli = Cli {
            verbose: 2,
            quiet: false,
            config: None,
            output: None,
            no_color: false,
            command: Commands::Blocks(BlocksArgs { block_type: None }),
        };
        assert_eq!(cli.verbosity_level(), 2);

        let quiet_cli = Cli {
            verbose: 2,
            quiet: true,
            ..cli
        };
        assert_eq!(quiet_cli.verbosity_level(), 0);
    }

    #[test]
    fn test_parse_preview() {
        let cli = Cli::parse_from([
            "wikimap", "-o", "json", "preview", "John Smith", "--blocks", "chain.json", "--source", "item.json",
        ]);
        assert_eq!(cli.output_format("yaml"), OutputFormat::Json);
        match cli.command {
            Commands::Preview(args) => {
                assert_eq!(args.value, "John Smith");
                assert_eq!(args.blocks, PathBuf::from("chain.json"));
                assert_eq!(args.source, Some(PathBuf::from("item.json")));
            }
            other => panic!("unexpected command: {:?}", other),
        }
    }

    #[test]
    fn test_parse_apply_and_resolve() {
        let cli = Cli::parse_from(["wikimap", "-vv", "apply", "--mapping", "paintings", "--items", "items.json"]);
        assert_eq!(cli.verbosity_level(), 2);
        assert!(matches!(cli.command, Commands::Apply(ref args) if args.mapping == "paintings" && !args.keep_empty));

        let cli = Cli::parse_from(["wikimap", "resolve", "item.json", "dcterms:title.0", "--display"]);
        assert!(matches!(cli.command, Commands::Resolve(ref args) if args.display && args.path == "dcterms:title.0"));
    }

    #[test]
    fn test_output_format_falls_back_to_config() {
        let cli = Cli::parse_from(["wikimap", "blocks"]);
        assert_eq!(cli.output_format("json-pretty"), OutputFormat::JsonPretty);
        assert_eq!(cli.output_format("YAML"), OutputFormat::Yaml);
        assert_eq!(cli.output_format("nonsense"), OutputFormat::Human);
    }

    #[test]
    fn test_parse_config_init() {
        let cli = Cli::parse_from(["wikimap", "config", "init", "wm.toml", "--mappings-dir", "maps", "--force"]);
        match cli.command {
            Commands::Config(ConfigArgs { action: ConfigAction::Init(args) }) => {
                assert_eq!(args.path, Some(PathBuf::from("wm.toml")));
                assert_eq!(args.mappings_dir, Some(PathBuf::from("maps")));
                assert!(args.force && !args.keep_empty);
            }
            other => panic!("unexpected command: {:?}", other),
        }
    }

    #[test]
    fn test_quiet_conflicts_with_verbose() {
        let result = Cli::try_parse_from(["wikimap", "-q", "-v", "blocks"]);
        assert!(result.is_err());
    }
}

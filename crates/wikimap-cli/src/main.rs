//! Wikimap CLI - Command-line interface for Omeka S to Wikidata value mapping
//!
//! This is the main entry point for the Wikimap CLI application, providing
//! commands for previewing block chains, applying exported mappings to items
//! and validating mapping documents.

mod cli;
mod config;
mod error;
mod handlers;
mod logging;
mod output;

use cli::{Cli, Commands};
use colored::control;
use config::Config;
use error::Result;
use logging::{timing::Timer, LoggingConfig};
use output::OutputWriter;
use std::process;
use tracing::instrument;
use tracing_appender::non_blocking::WorkerGuard;

fn main() {
    // Parse command-line arguments
    let cli = Cli::parse_args();

    // The config file can set the log level, so it is read before logging starts
    let config = match Config::load_with_file(cli.config.as_deref()) {
        Ok(config) => config,
        Err(e) => exit_with(&e, cli.use_color()),
    };

    let use_color = cli.use_color() && config.output.color;
    control::set_override(use_color);

    // Keep the guard alive until exit so file logs are flushed
    let guard = match init_logging(&cli, &config) {
        Ok(guard) => guard,
        Err(e) => {
            eprintln!("Failed to initialize logging: {}", e);
            None
        }
    };

    let code = match run(cli, config, use_color) {
        Ok(()) => 0,
        Err(e) => report(&e, use_color),
    };

    drop(guard);
    process::exit(code);
}

/// Print an error and return its exit code
fn report(e: &error::Error, use_color: bool) -> i32 {
    eprintln!("{}", error::format_error(e, use_color));

    if e.should_show_help() {
        eprintln!("\nFor more information, try '--help'");
    }

    e.exit_code()
}

fn exit_with(e: &error::Error, use_color: bool) -> ! {
    process::exit(report(e, use_color))
}

/// Main application logic
#[instrument(skip_all, fields(command = ?cli.command))]
fn run(cli: Cli, config: Config, use_color: bool) -> Result<()> {
    let _timer = Timer::new("cli_execution");

    let format = cli.output_format(&config.output.format);
    let mut output = OutputWriter::new(format, use_color, cli.quiet, cli.verbosity_level());
    if !config.output.progress {
        output.disable_progress();
    }

    tracing::info!(
        verbosity = cli.verbosity_level(),
        format = ?format,
        "Executing command"
    );
    output.debug(&format!("Mappings directory: {}", config.paths.mappings_dir.display()))?;

    match cli.command {
        Commands::Preview(args) => handlers::handle_preview(args, &mut output),
        Commands::Apply(args) => handlers::handle_apply(args, &config, &mut output),
        Commands::Blocks(args) => handlers::handle_blocks(args, &mut output),
        Commands::Resolve(args) => handlers::handle_resolve(args, &mut output),
        Commands::Validate(args) => handlers::handle_validate(args, &mut output),
        Commands::Config(args) => handlers::handle_config(args, &config, &mut output),
        Commands::Completions(args) => handlers::handle_completions(args),
    }
}

/// Build the logging config from flags, the config file and the environment
fn logging_config(cli: &Cli, config: &Config) -> LoggingConfig {
    let verbosity = cli.verbosity_level();
    let mut logging_config = LoggingConfig::from_verbosity(verbosity);
    logging_config.merge_with_file(&config.logging, verbosity);

    // Apply environment overrides
    logging_config.merge_with_env();

    // If quiet mode, only log errors
    if cli.quiet {
        logging_config.level = "error".to_string();
        logging_config.console = false;
    }

    logging_config
}

/// Initialize the logging system
fn init_logging(cli: &Cli, config: &Config) -> Result<Option<WorkerGuard>> {
    logging::init_logging(logging_config(cli, config))
}

//! Fieldmap CLI - Command-line interface for the field-mapping engine
//!
//! Inspects field-kind compatibility, applies value transformations,
//! validates mapping configurations and benchmarks the transformation cache.

mod cli;
mod config;
mod error;
mod handlers;
mod logging;
mod output;

use cli::{Cli, Commands};
use colored::control;
use config::Config;
use error::{Error, Result};
use logging::{timing::Timer, LoggingConfig};
use output::OutputWriter;
use std::process;
use tracing::instrument;
use tracing_appender::non_blocking::WorkerGuard;

#[tokio::main]
async fn main() {
    let cli = Cli::parse_args();

    control::set_override(cli.use_color());

    // Logging reads its file settings from the configuration
    let config = match Config::load_with_file(cli.config.as_deref()) {
        Ok(config) => config,
        Err(e) => exit_with(e),
    };

    let guard = match init_logging(&cli, &config) {
        Ok(guard) => guard,
        Err(e) => {
            eprintln!("Failed to initialize logging: {}", e);
            None
        }
    };

    let result = run(cli, config).await;

    // Flush buffered log lines before exiting
    drop(guard);

    match result {
        Ok(()) => process::exit(0),
        Err(e) => exit_with(e),
    }
}

fn exit_with(error: Error) -> ! {
    eprintln!(
        "{}",
        error::format_error(&error, control::SHOULD_COLORIZE.should_colorize())
    );

    if error.should_show_help() {
        eprintln!("\nFor more information, try '--help'");
    }

    process::exit(error.exit_code());
}

/// Main application logic
#[instrument(skip_all, fields(command = ?cli.command))]
async fn run(cli: Cli, config: Config) -> Result<()> {
    let _timer = Timer::new("cli_execution");

    let mut output = OutputWriter::new(cli.output, cli.use_color() && config.output.color, cli.quiet);
    if !config.output.progress {
        output.disable_progress();
    }

    tracing::info!(
        command = ?cli.command,
        verbosity = cli.verbosity_level(),
        "Executing command"
    );

    match cli.command {
        Commands::Transformations(args) => handlers::handle_transformations(args, &mut output).await,
        Commands::Classify(args) => handlers::handle_classify(args, &mut output).await,
        Commands::Matrix(args) => handlers::handle_matrix(args, &mut output).await,
        Commands::Apply(args) => handlers::handle_apply(args, &config, &mut output).await,
        Commands::Bench(args) => handlers::handle_bench(args, &config, &mut output).await,
        Commands::Validate(args) => handlers::handle_validate(args, &mut output).await,
        Commands::Map(args) => handlers::handle_map(args, &config, &mut output).await,
        Commands::Config(args) => handlers::handle_config(args, &config, &mut output).await,
        Commands::Completions(args) => handlers::handle_completions(args),
    }
}

/// Initialize the logging system
fn init_logging(cli: &Cli, config: &Config) -> Result<Option<WorkerGuard>> {
    let verbosity = cli.verbosity_level();
    let mut logging_config = LoggingConfig::from_verbosity(verbosity);
    logging_config.merge_with_file_config(&config.logging, verbosity);
    logging_config.merge_with_env();

    // If quiet mode, only log errors
    if cli.quiet {
        logging_config.level = "error".to_string();
        logging_config.console = false;
    }

    logging::init_logging(logging_config)
}

//! Configuration command handlers

use crate::cli::{ConfigAction, ConfigArgs, ConfigFormat, ConfigInitArgs, ConfigShowArgs};
use crate::config::Config;
use crate::error::{Error, Result};
use crate::output::OutputWriter;
use std::path::PathBuf;

/// Project configuration file written by `config init` without a path
const PROJECT_CONFIG_FILE: &str = ".fieldmap.toml";

/// Handle the config command
pub async fn handle_config(args: ConfigArgs, config: &Config, output: &mut OutputWriter) -> Result<()> {
    match args.action {
        ConfigAction::Init(init_args) => handle_config_init(init_args, output).await,
        ConfigAction::Show(show_args) => handle_config_show(show_args, config, output).await,
    }
}

/// Handle config init subcommand
async fn handle_config_init(args: ConfigInitArgs, output: &mut OutputWriter) -> Result<()> {
    let path = if args.user {
        Config::user_config_path()
            .ok_or_else(|| Error::config("Unable to determine user config directory"))?
    } else {
        args.path.unwrap_or_else(|| PathBuf::from(PROJECT_CONFIG_FILE))
    };

    if path.exists() && !args.force {
        return Err(Error::config(format!(
            "{} already exists (use --force to overwrite)",
            path.display()
        )));
    }

    Config::default().save(&path)?;
    tracing::info!(path = %path.display(), "Wrote default configuration");
    output.success(&format!("✓ Created config at {}", path.display()))?;
    output.info("Edit it to customize cache, benchmark and logging settings.")?;
    Ok(())
}

/// Handle config show subcommand
async fn handle_config_show(args: ConfigShowArgs, config: &Config, output: &mut OutputWriter) -> Result<()> {
    let content = render(config, args.format)?;
    output.writeln(content.trim_end())
}

fn render(config: &Config, format: ConfigFormat) -> Result<String> {
    Ok(match format {
        ConfigFormat::Toml => config.to_toml()?,
        ConfigFormat::Json => serde_json::to_string_pretty(config)?,
        ConfigFormat::Yaml => serde_yaml::to_string(config)?,
    })
}

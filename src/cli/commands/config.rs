use anyhow::{Context, Result};
use clap::Subcommand;
use std::process::Command;

use crate::cli::output::{Formatter, get_formatter};
use crate::models::{Config, OutputFormat};

const MASK: &str = "********";

#[derive(Debug, Subcommand)]
pub enum ConfigCommand {
    #[command(about = "Write a default configuration file")]
    Init {
        #[arg(long, help = "Force overwrite existing config")]
        force: bool,
    },
    #[command(about = "Show the effective configuration (file, .env and environment)")]
    Show,
    #[command(about = "Show configuration and data paths")]
    Path,
    #[command(about = "Edit configuration file")]
    Edit,
}

pub async fn handle_config(cmd: ConfigCommand, format: OutputFormat, _verbose: bool) -> Result<()> {
    let formatter = get_formatter(format);

    match cmd {
        ConfigCommand::Init { force } => handle_init(force, formatter.as_ref()),
        ConfigCommand::Show => handle_show(format),
        ConfigCommand::Path => handle_path(),
        ConfigCommand::Edit => handle_edit(formatter.as_ref()),
    }
}

fn handle_init(force: bool, formatter: &dyn Formatter) -> Result<()> {
    let config_path =
        Config::config_path().ok_or_else(|| anyhow::anyhow!("could not determine config directory"))?;

    if config_path.exists() && !force {
        anyhow::bail!(
            "Config already exists at: {}\nUse --force to overwrite.",
            config_path.display()
        );
    }

    let path = Config::default().save().context("failed to write config")?;
    println!(
        "{}",
        formatter.format_message(&format!("Created config at: {}", path.display()))
    );
    Ok(())
}

/// Copy of the config safe to print.
fn redacted(config: &Config) -> Config {
    let mut config = config.clone();
    if config.vector_store.api_key.is_some() {
        config.vector_store.api_key = Some(MASK.to_string());
    }
    if config.generation.api_key.is_some() {
        config.generation.api_key = Some(MASK.to_string());
    }
    config
}

fn handle_show(format: OutputFormat) -> Result<()> {
    let config = redacted(&Config::load()?);

    if format == OutputFormat::Json {
        println!("{}", serde_json::to_string_pretty(&config)?);
        return Ok(());
    }

    if let Some(path) = Config::config_path().filter(|p| p.exists()) {
        println!("# Config file: {}", path.display());
    } else {
        println!("# No config file, showing defaults");
    }
    println!();
    print!("{}", toml::to_string_pretty(&config)?);
    Ok(())
}

fn handle_path() -> Result<()> {
    println!("Configuration paths:");
    println!();

    if let Some(path) = Config::config_path() {
        let state = if path.exists() { "active" } else { "would be" };
        println!("Config file ({}): {}", state, path.display());
    }
    if let Ok(cwd) = std::env::current_dir() {
        let env_path = cwd.join(".env");
        let state = if env_path.exists() { "active" } else { "would be" };
        println!(".env file ({}): {}", state, env_path.display());
    }
    if let Some(dir) = Config::models_dir() {
        println!("Models directory: {}", dir.display());
    }
    if let Some(path) = Config::metrics_db_path() {
        println!("Metrics database: {}", path.display());
    }

    Ok(())
}

fn handle_edit(formatter: &dyn Formatter) -> Result<()> {
    let config_path =
        Config::config_path().ok_or_else(|| anyhow::anyhow!("could not determine config directory"))?;

    if !config_path.exists() {
        Config::default().save().context("failed to write config")?;
        println!(
            "{}",
            formatter.format_message(&format!("Created config at: {}", config_path.display()))
        );
    }

    let editor = std::env::var("EDITOR")
        .unwrap_or_else(|_| std::env::var("VISUAL").unwrap_or_else(|_| "vim".into()));

    Command::new(&editor)
        .arg(&config_path)
        .status()
        .context(format!("failed to open editor: {}", editor))?;

    Ok(())
}

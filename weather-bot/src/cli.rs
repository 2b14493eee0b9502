use anyhow::Context;
use clap::{Parser, Subcommand};
use inquire::{Password, PasswordDisplayMode, Text};
use std::path::PathBuf;
use weather_bot_core::{Config, Dispatcher, Reply};

use crate::telegram;

/// Top-level CLI struct.
#[derive(Debug, Parser)]
#[command(name = "weather-bot", version, about = "Telegram weather bot")]
pub struct Cli {
    /// Path to the config file; defaults to the platform config directory.
    #[arg(long, global = true)]
    pub config: Option<PathBuf>,

    /// Log filter, e.g. "debug" or "weather_bot_core=trace". Overrides RUST_LOG.
    #[arg(long, global = true)]
    pub log_level: Option<String>,

    #[command(subcommand)]
    pub command: Command,
}

#[derive(Debug, Subcommand)]
pub enum Command {
    /// Start the bot and answer Telegram messages until interrupted.
    Run,

    /// Answer a single message locally and print the reply.
    Show {
        /// City (or country) name, exactly as a user would type it.
        location: String,
    },

    /// Interactively store credentials in the config file.
    Configure,
}

impl Cli {
    pub async fn run(self) -> anyhow::Result<()> {
        match self.command {
            Command::Run => {
                let config = Config::load(self.config.as_deref())?;
                telegram::run(&config).await
            }
            Command::Show { location } => {
                let config = Config::load(self.config.as_deref())?;
                let dispatcher = Dispatcher::from_config(&config)?;
                let reply = dispatcher.handle(&location).await?;
                println!("{}", render_for_terminal(&reply));
                Ok(())
            }
            Command::Configure => configure(self.config),
        }
    }
}

fn render_for_terminal(reply: &Reply) -> String {
    let mut out = reply.text().to_string();
    for (i, option) in reply.options().iter().enumerate() {
        out.push_str(&format!("\n  {}. {option}", i + 1));
    }
    out
}

fn configure(path: Option<PathBuf>) -> anyhow::Result<()> {
    // Only the file is edited; environment overrides are not persisted.
    let path = match path {
        Some(p) => p,
        None => Config::config_file_path()?,
    };
    let mut config = Config::load_file(&path)?;

    let api_key = prompt_secret("OpenWeatherMap API key:", config.weather_api_key.is_some())?;
    if !api_key.is_empty() {
        config.weather_api_key = Some(api_key);
    }

    let username = Text::new("GeoNames username:")
        .with_default(config.geonames_username.as_deref().unwrap_or_default())
        .prompt()
        .context("Failed to read GeoNames username")?;
    if !username.trim().is_empty() {
        config.geonames_username = Some(username.trim().to_string());
    }

    let token = prompt_secret("Telegram bot token:", config.bot_token.is_some())?;
    if !token.is_empty() {
        config.bot_token = Some(token);
    }

    let written = config.save(Some(&path))?;
    println!("Configuration saved to {}", written.display());
    Ok(())
}

fn prompt_secret(message: &str, has_existing: bool) -> anyhow::Result<String> {
    let mut prompt = Password::new(message)
        .without_confirmation()
        .with_display_mode(PasswordDisplayMode::Masked);
    if has_existing {
        prompt = prompt.with_help_message("leave empty to keep the current value");
    }

    let value = prompt
        .prompt()
        .with_context(|| format!("Failed to read {message}"))?;
    Ok(value.trim().to_string())
}

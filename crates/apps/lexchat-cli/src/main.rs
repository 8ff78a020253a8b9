//! LexChat - A terminal client for the legal assistant service
//!
//! This is the main entry point for the `lexchat` command.

use anyhow::Result;
use clap::Parser;
use lexchat::{ClientSettings, SendMode};
use log::{error, warn};
use std::path::PathBuf;

mod args;
mod commands;
mod repl;

use args::{Cli, Command};
use commands::App;

fn main() -> Result<()> {
    // Initialize logging
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("warn"))
        .format_timestamp_millis()
        .init();

    // Bootstrap config directory
    if let Err(e) = config::init() {
        error!("Failed to initialize config directory: {}", e);
    }

    let cli = Cli::parse();

    let mut settings = ClientSettings::load().unwrap_or_else(|e| {
        warn!("Ignoring unreadable settings: {:#}", e);
        if let Some(path) = ClientSettings::default_settings_path() {
            warn!("Fix or remove {} to configure LexChat", path.display());
        }
        ClientSettings::default()
    });
    if let Some(url) = cli.api_url {
        settings.base_url = url;
    }
    if cli.no_speak {
        settings.auto_speak = false;
    }

    let command = cli.command.unwrap_or(Command::Chat);
    if let Command::Settings { save } = command {
        println!("{}", serde_json::to_string_pretty(&settings)?);
        if save {
            let path = settings.save()?;
            println!("Saved to {}", path.display());
        }
        return Ok(());
    }

    let mut app = App::open(&settings)?;

    match command {
        Command::New => app.new_thread()?,
        Command::List => app.list(),
        Command::Select { id } => app.select(&id)?,
        Command::Delete { id } => app.delete(&id)?,
        Command::Show => app.show(),
        Command::Ask { text } => app.send(SendMode::Chat, &text.join(" "), None)?,
        Command::Generate { document_type, text } => {
            app.send(SendMode::DocumentGeneration, &text.join(" "), document_type)?
        }
        Command::Upload { path } => app.upload(&path)?,
        Command::Export { dir } => app.export(&dir.unwrap_or_else(|| PathBuf::from(".")))?,
        Command::Record { action } => {
            app.record(action);
        }
        Command::Languages => app.languages()?,
        Command::Documents => app.documents()?,
        Command::Chat => repl::run(&mut app)?,
        Command::Settings { .. } => {}
    }

    app.finish();
    Ok(())
}

mod cli;
mod render;
mod repl;

use std::path::PathBuf;
use std::sync::Arc;

use anyhow::{Context, Result, bail};
use clap::Parser;
use ecochat_core::settings::{SettingsJsonRepository, SettingsRepository};
use ecochat_core::models::MessageId;
use ecochat_core::{AssistantSettings, ChatSession, StoreJsonRepository};
use tracing::{info, warn};

use cli::{Cli, Command, ConfigArgs};

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();

    // Logs go to stderr so they never interleave with replies on stdout
    let level = if cli.verbose {
        tracing::Level::DEBUG
    } else {
        tracing::Level::INFO
    };
    tracing_subscriber::fmt()
        .with_env_filter(tracing_subscriber::EnvFilter::from_default_env().add_directive(level.into()))
        .with_writer(std::io::stderr)
        .init();

    let settings = load_settings().await;
    if !settings.has_api_key() {
        warn!("No API key configured; set ECOCHAT_API_KEY or FIREWORKS_API_KEY");
    }

    let repository = match cli.data_file {
        Some(path) => StoreJsonRepository::with_path(path),
        None => StoreJsonRepository::new().context("Failed to locate the thread store")?,
    };
    info!(path = %repository.file_path().display(), "Using thread store");

    let session = ChatSession::from_settings(&settings, Arc::new(repository)).await;
    run(&session, cli.command.unwrap_or(Command::Chat)).await
}

async fn load_settings() -> AssistantSettings {
    let from_file = match SettingsJsonRepository::new() {
        Ok(repository) => repository.load().await.unwrap_or_else(|e| {
            warn!(error = ?e, "Failed to load settings, using defaults");
            AssistantSettings::default()
        }),
        Err(e) => {
            warn!(error = ?e, "Cannot locate settings file, using defaults");
            AssistantSettings::default()
        }
    };
    from_file.with_env_overrides()
}

async fn run(session: &ChatSession, command: Command) -> Result<()> {
    match command {
        Command::Ask { query } => {
            let reply = session.submit_text(&query.join(" ")).await?;
            print!("{}", render::message(&reply));
        }
        Command::Image { prompt } => {
            let message = session.submit_image(&prompt.join(" ")).await?;
            print!("{}", render::message(&message));
        }
        Command::Threads => {
            print!("{}", render::thread_list(&session.snapshot().await));
        }
        Command::Show { thread_id } => {
            let store = session.snapshot().await;
            let thread = match thread_id {
                Some(id) => store.find_thread(id),
                None => store.active_thread(),
            };
            match thread {
                Some(thread) => print!("{}", render::thread(thread)),
                None => bail!("No such thread"),
            }
        }
        Command::New => {
            let id = session.new_thread().await;
            println!("Started thread {id}");
        }
        Command::Switch { thread_id } => {
            session.switch_thread(thread_id).await?;
            println!("Switched to thread {thread_id}");
        }
        Command::Delete { thread_id } => {
            session.delete_thread(thread_id).await?;
            println!("Deleted thread {thread_id}");
        }
        Command::ExportImage { message_id, path } => {
            let written = export_image(session, message_id, path).await?;
            println!("Wrote {}", written.display());
        }
        Command::Chat => repl::run(session).await?,
        Command::Config(args) => configure(args).await?,
    }
    Ok(())
}

/// Write an image message to `path`, adding the matching extension when the
/// path has none.
async fn export_image(session: &ChatSession, message_id: MessageId, mut path: PathBuf) -> Result<PathBuf> {
    let store = session.snapshot().await;
    let Some((_, message)) = store.find_message(message_id) else {
        bail!("No message with id {message_id}");
    };
    let Some(image) = message.image_ref() else {
        bail!("Message {message_id} is not an image");
    };

    if path.extension().is_none() {
        path.set_extension(image.extension());
    }

    let bytes = image.resolve().context("Stored image is not decodable")?;
    tokio::fs::write(&path, bytes)
        .await
        .with_context(|| format!("Failed to write {}", path.display()))?;
    Ok(path)
}

/// Print the settings file, first saving any field given on the command line.
/// Environment overrides are not written back.
async fn configure(args: ConfigArgs) -> Result<()> {
    let repository = SettingsJsonRepository::new().context("Failed to locate the settings file")?;
    let mut settings = repository.load().await.context("Failed to read settings")?;

    if args.apply(&mut settings) {
        repository
            .save(settings.clone())
            .await
            .context("Failed to write settings")?;
        println!("Saved {}", repository.file_path().display());
    }
    println!("{settings:#?}");
    Ok(())
}

use std::path::PathBuf;

use clap::{Args, Parser, Subcommand};
use ecochat_core::{AssistantSettings, ThreadId};
use ecochat_core::models::MessageId;

#[derive(Debug, Parser)]
#[command(
    name = "ecochat",
    version,
    about = "Recycling and sustainability assistant"
)]
pub struct Cli {
    /// Store file to use instead of the one in the config directory.
    #[arg(long, global = true)]
    pub data_file: Option<PathBuf>,

    /// Log at debug level unless RUST_LOG says otherwise.
    #[arg(short, long, global = true)]
    pub verbose: bool,

    #[command(subcommand)]
    pub command: Option<Command>,
}

#[derive(Debug, Subcommand)]
pub enum Command {
    /// Ask a question in the active thread.
    Ask {
        #[arg(required = true)]
        query: Vec<String>,
    },

    /// Generate an illustration in the active thread.
    Image {
        #[arg(required = true)]
        prompt: Vec<String>,
    },

    /// List threads, newest first.
    Threads,

    /// Print a thread's messages (the active thread by default).
    Show { thread_id: Option<ThreadId> },

    /// Start a new empty thread.
    New,

    /// Make a thread active.
    Switch { thread_id: ThreadId },

    /// Remove a thread.
    Delete { thread_id: ThreadId },

    /// Write the bytes of an image message to a file.
    ExportImage { message_id: MessageId, path: PathBuf },

    /// Interactive conversation (the default).
    Chat,

    /// Show the settings file, updating any field given.
    Config(ConfigArgs),
}

#[derive(Debug, Default, Args)]
pub struct ConfigArgs {
    /// Bearer key for the completion and image endpoints.
    #[arg(long)]
    pub api_key: Option<String>,

    #[arg(long)]
    pub completion_url: Option<String>,

    #[arg(long)]
    pub model: Option<String>,

    #[arg(long)]
    pub image_url: Option<String>,
}

impl ConfigArgs {
    /// Copy the given fields into `settings`. Returns whether anything was set.
    pub fn apply(self, settings: &mut AssistantSettings) -> bool {
        let mut changed = false;
        if let Some(key) = self.api_key {
            settings.api_key = Some(key);
            changed = true;
        }
        if let Some(url) = self.completion_url {
            settings.completion_url = url;
            changed = true;
        }
        if let Some(model) = self.model {
            settings.completion_model = model;
            changed = true;
        }
        if let Some(url) = self.image_url {
            settings.image_url = url;
            changed = true;
        }
        changed
    }
}

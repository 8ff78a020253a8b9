//! CLI argument definitions.

use clap::{Parser, Subcommand, ValueEnum};
use std::path::PathBuf;

/// LexChat - Ask the legal assistant from your terminal
#[derive(Parser, Debug)]
#[command(name = "lexchat")]
#[command(author, version, about, long_about = None)]
pub struct Cli {
    /// Do not read answers aloud
    #[arg(long, global = true)]
    pub no_speak: bool,

    /// Service URL (overrides settings and LEXCHAT_API_URL)
    #[arg(long, global = true)]
    pub api_url: Option<String>,

    /// Subcommand to execute (defaults to the interactive chat)
    #[command(subcommand)]
    pub command: Option<Command>,
}

#[derive(Subcommand, Debug)]
pub enum Command {
    /// Start a new chat thread and make it active
    New,

    /// List chat threads, newest first
    List,

    /// Make a thread active (a unique id prefix is enough)
    Select { id: String },

    /// Delete a thread (a unique id prefix is enough)
    Delete { id: String },

    /// Print the active thread's conversation
    Show,

    /// Ask a legal question in the active thread
    Ask {
        #[arg(required = true, trailing_var_arg = true)]
        text: Vec<String>,
    },

    /// Draft a legal document from a case description
    Generate {
        /// Preferred document type, e.g. legal_notice or affidavit
        #[arg(long = "type")]
        document_type: Option<String>,

        #[arg(required = true, trailing_var_arg = true)]
        text: Vec<String>,
    },

    /// Upload a document for the assistant to use
    Upload { path: PathBuf },

    /// Save the latest answer of the active thread to a text file
    Export {
        /// Target directory (defaults to the current directory)
        #[arg(long)]
        dir: Option<PathBuf>,
    },

    /// Control server-side voice recording
    Record {
        #[arg(value_enum)]
        action: RecordAction,
    },

    /// List languages supported for speech recognition
    Languages,

    /// List documents the service holds
    Documents,

    /// Print the effective settings
    Settings {
        /// Write them to the settings file
        #[arg(long)]
        save: bool,
    },

    /// Interactive chat session
    Chat,
}

#[derive(ValueEnum, Clone, Copy, Debug, PartialEq, Eq)]
pub enum RecordAction {
    Start,
    Stop,
}

//! Interactive chat REPL

use std::borrow::Cow::{self, Borrowed, Owned};
use std::path::Path;

use anyhow::Result;
use colored::Colorize;
use rustyline::completion::{Completer, Pair};
use rustyline::error::ReadlineError;
use rustyline::highlight::Highlighter;
use rustyline::hint::Hinter;
use rustyline::history::DefaultHistory;
use rustyline::validate::Validator;
use rustyline::{Context, Editor, Helper};

use lexchat::SendMode;

use crate::args::RecordAction;
use crate::commands::App;

const COMMANDS: &[&str] = &[
    "/new", "/list", "/select", "/delete", "/show", "/generate", "/upload", "/export", "/record",
    "/help", "/quit",
];

/// Completion, highlighting and hints for slash commands
struct ChatHelper;

impl Helper for ChatHelper {}

impl Completer for ChatHelper {
    type Candidate = Pair;

    fn complete(&self, line: &str, pos: usize, _ctx: &Context<'_>) -> rustyline::Result<(usize, Vec<Pair>)> {
        let line = &line[..pos];
        if !line.starts_with('/') || line.contains(' ') {
            return Ok((0, vec![]));
        }

        let candidates = COMMANDS
            .iter()
            .filter(|cmd| cmd.starts_with(line))
            .map(|cmd| Pair {
                display: cmd.to_string(),
                replacement: cmd.to_string(),
            })
            .collect();
        Ok((0, candidates))
    }
}

impl Highlighter for ChatHelper {
    fn highlight<'l>(&self, line: &'l str, _pos: usize) -> Cow<'l, str> {
        if line.starts_with('/') {
            Owned(line.bright_cyan().to_string())
        } else {
            Borrowed(line)
        }
    }

    fn highlight_char(&self, _line: &str, _pos: usize, _forced: bool) -> bool {
        true
    }
}

impl Hinter for ChatHelper {
    type Hint = String;

    fn hint(&self, line: &str, pos: usize, _ctx: &Context<'_>) -> Option<String> {
        let line = &line[..pos];
        if !line.starts_with('/') || line.contains(' ') {
            return None;
        }
        COMMANDS
            .iter()
            .find(|cmd| cmd.starts_with(line) && cmd.len() > line.len())
            .map(|cmd| cmd[line.len()..].to_string())
    }
}

impl Validator for ChatHelper {}

/// A parsed line of REPL input
#[derive(Debug, PartialEq, Eq)]
enum Input<'a> {
    Message(&'a str),
    New,
    List,
    Select(&'a str),
    Delete(&'a str),
    Show,
    Generate {
        document_type: Option<&'a str>,
        text: &'a str,
    },
    Upload(&'a str),
    Export(Option<&'a str>),
    Record(Option<RecordAction>),
    Help,
    Quit,
    Unknown(&'a str),
}

fn parse_input(line: &str) -> Input<'_> {
    let line = line.trim();
    if !line.starts_with('/') {
        return Input::Message(line);
    }

    let (command, rest) = match line.split_once(char::is_whitespace) {
        Some((command, rest)) => (command, rest.trim()),
        None => (line, ""),
    };

    match command {
        "/new" => Input::New,
        "/list" => Input::List,
        "/select" => Input::Select(rest),
        "/delete" => Input::Delete(rest),
        "/show" => Input::Show,
        "/generate" => match rest.strip_prefix("--type") {
            Some(after) => {
                let after = after.trim_start();
                match after.split_once(char::is_whitespace) {
                    Some((kind, text)) => Input::Generate {
                        document_type: Some(kind),
                        text: text.trim(),
                    },
                    None => Input::Generate {
                        document_type: Some(after).filter(|k| !k.is_empty()),
                        text: "",
                    },
                }
            }
            None => Input::Generate {
                document_type: None,
                text: rest,
            },
        },
        "/upload" => Input::Upload(rest),
        "/export" => Input::Export(Some(rest).filter(|d| !d.is_empty())),
        "/record" => Input::Record(match rest {
            "start" => Some(RecordAction::Start),
            "stop" => Some(RecordAction::Stop),
            _ => None,
        }),
        "/help" => Input::Help,
        "/quit" | "/exit" => Input::Quit,
        other => Input::Unknown(other),
    }
}

fn print_help() {
    let lines = [
        ("/new", "start a new chat"),
        ("/list", "list chats"),
        ("/select <id>", "switch to a chat"),
        ("/delete <id>", "delete a chat"),
        ("/show", "print the active chat"),
        ("/generate [--type T] <description>", "draft a legal document"),
        ("/upload <path>", "upload a document"),
        ("/export [dir]", "save the latest answer"),
        ("/record start|stop", "voice input"),
        ("/quit", "leave"),
    ];
    for (command, help) in lines {
        println!("  {:<38} {}", command.bright_cyan(), help.bright_black());
    }
}

/// Run one REPL command. Returns false when the user asked to leave.
fn handle(app: &mut App, input: Input<'_>, pending: &mut String) -> Result<bool> {
    match input {
        Input::Message("") => {}
        Input::Message(text) => app.send(SendMode::Chat, text, None)?,
        Input::New => app.new_thread()?,
        Input::List => app.list(),
        Input::Select(id) => app.select(id)?,
        Input::Delete(id) => app.delete(id)?,
        Input::Show => app.show(),
        Input::Generate { text: "", .. } => {
            println!("{}", "Usage: /generate [--type T] <description>".yellow())
        }
        Input::Generate { document_type, text } => {
            app.send(SendMode::DocumentGeneration, text, document_type.map(str::to_string))?
        }
        Input::Upload("") => println!("{}", "Usage: /upload <path>".yellow()),
        Input::Upload(path) => app.upload(Path::new(path))?,
        Input::Export(dir) => app.export(Path::new(dir.unwrap_or(".")))?,
        Input::Record(None) => println!("{}", "Usage: /record start|stop".yellow()),
        Input::Record(Some(action)) => {
            if let Some(text) = app.record(action) {
                *pending = text;
            }
        }
        Input::Help => print_help(),
        Input::Quit => return Ok(false),
        Input::Unknown(command) => {
            println!("{}", format!("Unknown command {} (try /help)", command).bright_black())
        }
    }
    Ok(true)
}

/// Run the interactive chat until the user quits
pub fn run(app: &mut App) -> Result<()> {
    let mut rl: Editor<ChatHelper, DefaultHistory> = Editor::new()?;
    rl.set_helper(Some(ChatHelper));

    println!("{}", "=== LexChat ===".bright_magenta().bold());
    println!("{}", "Ask a legal question, or type /help for commands.".bright_black());
    if let Some(thread) = app.session.active_thread() {
        println!("{} {}", "Continuing:".bright_black(), thread.title);
    }
    println!();

    // Transcribed speech is offered as editable input on the next prompt
    let mut pending = String::new();

    loop {
        let readline = if pending.is_empty() {
            rl.readline("lexchat> ")
        } else {
            let initial = std::mem::take(&mut pending);
            rl.readline_with_initial("lexchat> ", (&initial, ""))
        };

        match readline {
            Ok(line) => {
                if line.trim().is_empty() {
                    continue;
                }
                let _ = rl.add_history_entry(line.as_str());

                match handle(app, parse_input(&line), &mut pending) {
                    Ok(true) => {}
                    Ok(false) => break,
                    Err(e) => eprintln!("{}", format!("Error: {:#}", e).red()),
                }
            }
            Err(ReadlineError::Interrupted) => {
                println!("{}", "CTRL-C detected. Type /quit to exit.".yellow());
            }
            Err(ReadlineError::Eof) => break,
            Err(err) => {
                eprintln!("{}", format!("Error: {:?}", err).red());
                break;
            }
        }
    }

    println!("{}", "Goodbye!".bright_green());
    Ok(())
}

use std::path::PathBuf;

use clap::Parser;
use colored::Colorize;
use rustyline::error::ReadlineError;
use rustyline::DefaultEditor;
use supportdesk_cli::{format_history, ChatSession, Cli, CliClient, CliError, Commands};

#[derive(Debug, Clone, PartialEq, Eq)]
enum ReplCommand {
    Message(String),
    History,
    Session,
    Help,
    Exit,
    Empty,
}

fn parse_command(line: &str) -> ReplCommand {
    match line.trim() {
        "" => ReplCommand::Empty,
        "/exit" | "/quit" => ReplCommand::Exit,
        "/history" => ReplCommand::History,
        "/session" => ReplCommand::Session,
        "/help" | "?" => ReplCommand::Help,
        message => ReplCommand::Message(message.to_string()),
    }
}

fn help_text() -> &'static str {
    "Type a message to talk to support.\n\
     /history  show this session's messages\n\
     /session  show the session id\n\
     /exit     leave the chat"
}

#[tokio::main]
async fn main() {
    let Cli { server, command } = Cli::parse();
    let session = match command {
        Commands::Chat { session } => session,
        command => {
            match supportdesk_cli::run(Cli { server, command }).await {
                Ok(output) => println!("{output}"),
                Err(err) => {
                    eprintln!("error: {err}");
                    std::process::exit(1);
                }
            }
            return;
        }
    };

    let client = match CliClient::new(server) {
        Ok(client) => client,
        Err(err) => {
            eprintln!("error: {err}");
            std::process::exit(1);
        }
    };
    let mut chat = ChatSession::new(client, session);

    let mut editor = match DefaultEditor::new() {
        Ok(editor) => editor,
        Err(err) => {
            eprintln!("error: failed to start REPL: {err}");
            std::process::exit(1);
        }
    };
    let history = history_file();
    let _ = editor.load_history(&history);

    println!(
        "{}",
        "SupportDesk chat. Type `/help` for commands.".bright_green()
    );
    loop {
        match editor.readline("you> ") {
            Ok(line) => {
                let trimmed = line.trim();
                if trimmed.is_empty() {
                    continue;
                }
                let _ = editor.add_history_entry(trimmed);
                match run_repl_command(&mut chat, parse_command(trimmed)).await {
                    Ok(true) => break,
                    Ok(false) => {}
                    Err(err) => eprintln!("{} {}", "error:".red(), err),
                }
            }
            Err(ReadlineError::Interrupted) | Err(ReadlineError::Eof) => {
                println!();
                break;
            }
            Err(err) => {
                eprintln!("{} {err}", "error:".red());
                break;
            }
        }
    }

    if let Err(err) = editor.save_history(&history) {
        eprintln!("{} failed to save history: {err}", "warning:".yellow());
    }
}

/// Returns `true` when the loop should stop.
async fn run_repl_command(chat: &mut ChatSession, command: ReplCommand) -> Result<bool, CliError> {
    match command {
        ReplCommand::Message(message) => {
            let reply = chat.send(&message).await?;
            println!("{} {}", "support>".bright_magenta(), reply);
        }
        ReplCommand::History => {
            let turns = chat.history().await?;
            println!("{}", format_history(&turns));
        }
        ReplCommand::Session => match chat.session_id() {
            Some(id) => println!("{} {}", "session:".green(), id.cyan()),
            None => println!("{}", "no session yet; send a message first".yellow()),
        },
        ReplCommand::Help => println!("{}", help_text().bright_blue()),
        ReplCommand::Exit => {
            println!("{}", "bye".bright_green());
            return Ok(true);
        }
        ReplCommand::Empty => {}
    }
    Ok(false)
}

fn history_file() -> PathBuf {
    if let Ok(home) = std::env::var("HOME") {
        return PathBuf::from(home).join(".supportdesk-history");
    }
    PathBuf::from(".supportdesk-history")
}

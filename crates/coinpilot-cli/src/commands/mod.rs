//! Slash commands for interactive mode

mod model;

pub use model::ModelCommand;

use coinpilot_ai::Model;
use coinpilot_chat::{ChatSession, Exchange};
use uuid::Uuid;

use crate::utils::preview;

/// Result of executing a slash command
pub enum CommandResult {
    /// Clear the conversation
    Clear,
    /// Resubmit a failed exchange
    Retry(Uuid),
    /// Change the model
    ChangeModel(Model),
    /// Show a message to the user (not sent to the model)
    Message(String),
    /// Exit the application
    Exit,
    /// Unknown command
    Unknown(String),
}

/// Parse and execute a slash command
pub fn execute_command(
    input: &str,
    session: &ChatSession,
    available_models: &[Model],
) -> Option<CommandResult> {
    let input = input.trim();

    let rest = input.strip_prefix('/')?;
    let parts: Vec<&str> = rest.splitn(2, ' ').collect();
    let command = parts[0].to_lowercase();
    let args = parts.get(1).map(|s| s.trim()).unwrap_or("");

    Some(match command.as_str() {
        "help" | "h" | "?" => CommandResult::Message(help_message()),

        "clear" | "c" => CommandResult::Clear,

        "quit" | "exit" | "q" => CommandResult::Exit,

        "history" => CommandResult::Message(history_text(session.exchanges())),

        "retry" | "r" => match last_failed(session.exchanges()) {
            Some(id) => CommandResult::Retry(id),
            None => CommandResult::Message("Nothing to retry.".to_string()),
        },

        "model" | "m" => {
            ModelCommand::execute(args, &session.config().model, available_models)
        }

        _ => CommandResult::Unknown(command),
    })
}

/// Most recent exchange that failed
fn last_failed(exchanges: &[Exchange]) -> Option<Uuid> {
    exchanges.iter().rev().find(|e| e.is_failed()).map(|e| e.id)
}

fn history_text(exchanges: &[Exchange]) -> String {
    if exchanges.is_empty() {
        return "No messages yet.".to_string();
    }

    let mut output = String::new();
    for (i, exchange) in exchanges.iter().enumerate() {
        let attachments = match exchange.user_attachments.len() {
            0 => String::new(),
            n => format!(" [{} image(s)]", n),
        };
        output.push_str(&format!(
            "{}: you{}: {}\n",
            i,
            attachments,
            preview(&exchange.user_text, 60)
        ));
        let reply = preview(&exchange.response_text, 60);
        match &exchange.error {
            Some(error) => output.push_str(&format!("   failed: {} ({})\n", reply, error)),
            None => output.push_str(&format!("   coinpilot: {}\n", reply)),
        }
    }
    output.trim_end().to_string()
}

fn help_message() -> String {
    r#"Available commands:
  /help, /h, /?        Show this help message
  /history             List the messages in this conversation
  /retry, /r           Resend the last message that failed
  /model, /m [name]    List models or switch to a model
  /clear, /c           Clear conversation history
  /quit, /exit, /q     Exit coinpilot

Press Ctrl-C while a reply is streaming to cancel it."#
        .to_string()
}

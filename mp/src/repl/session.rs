//! REPL session management

use colored::Colorize;
use eyre::Result;
use rustyline::DefaultEditor;
use rustyline::error::ReadlineError;
use tracing::debug;

use crate::assistant::AssistantCore;
use crate::clipboard::exchange_copy_key;
use crate::session::{Applied, ChatExchange};

/// Interactive chat session
pub struct ReplSession {
    core: AssistantCore,
    base_url: String,
}

impl ReplSession {
    pub fn new(core: AssistantCore, base_url: impl Into<String>) -> Self {
        Self {
            core,
            base_url: base_url.into(),
        }
    }

    /// Run the REPL main loop
    pub async fn run(&mut self) -> Result<()> {
        self.print_welcome();

        // Create readline editor for proper line editing
        let mut rl = DefaultEditor::new().map_err(|e| eyre::eyre!("Failed to initialize readline: {}", e))?;

        loop {
            if let Some(notice) = self.core.notice() {
                println!("{} {}", "!".red().bold(), notice.red());
            }

            // A rolled-back message comes back pre-filled for editing
            let draft = self.core.draft().to_string();
            let readline = rl.readline_with_initial(&format!("{} ", ">".bright_green()), (draft.as_str(), ""));

            match readline {
                Ok(line) => {
                    let input = line.trim();
                    if input.is_empty() {
                        self.core.set_draft("");
                        continue;
                    }

                    let _ = rl.add_history_entry(input);

                    if input.starts_with('/') {
                        match self.handle_slash_command(input).await {
                            SlashResult::Continue => continue,
                            SlashResult::Quit => break,
                        }
                    } else {
                        self.core.set_draft(input);
                        self.send_draft().await;
                    }
                }
                Err(ReadlineError::Interrupted) => {
                    // Ctrl+C - just show new prompt
                    println!("^C");
                    continue;
                }
                Err(ReadlineError::Eof) => {
                    // Ctrl+D - exit
                    println!();
                    break;
                }
                Err(err) => {
                    return Err(eyre::eyre!("Readline error: {}", err));
                }
            }
        }

        println!("Goodbye!");
        Ok(())
    }

    fn print_welcome(&self) {
        println!();
        println!("{}", "MedPrompt Health Assistant".bright_cyan().bold());
        println!("Backend: {}", self.base_url);
        println!("Type {} for help, {} to quit", "/help".yellow(), "/quit".yellow());
        println!();
    }

    /// Send the draft and wait for the reply; Ctrl+C cancels
    async fn send_draft(&mut self) {
        let id = match self.core.send() {
            Ok(id) => id,
            Err(e) => {
                println!("{} {}", "!".red().bold(), e.to_string().red());
                return;
            }
        };
        debug!(%id, "send_draft: waiting for reply");
        println!("{}", crate::session::PENDING_MARKER.dimmed());

        let applied = tokio::select! {
            biased;
            _ = tokio::signal::ctrl_c() => {
                self.core.cancel_pending();
                println!("{}", "Cancelled. Your message is back in the draft.".dimmed());
                return;
            }
            applied = self.core.drive() => applied,
        };

        match applied {
            Some(Applied::Settled(id)) => {
                if let Some(exchange) = self.core.session().exchange(id) {
                    println!();
                    println!("{}", exchange.assistant);
                    println!();
                }
            }
            Some(Applied::RolledBack { .. }) => {
                println!("{}", "Not sent. Your message is back in the draft.".dimmed());
            }
            Some(Applied::Stale(_)) | None => {}
        }
    }

    /// Handle slash commands
    async fn handle_slash_command(&mut self, input: &str) -> SlashResult {
        let parts: Vec<&str> = input.split_whitespace().collect();
        let cmd = parts.first().copied().unwrap_or("");

        match cmd {
            "/help" | "/h" => {
                self.print_help();
                SlashResult::Continue
            }
            "/quit" | "/q" | "/exit" => SlashResult::Quit,
            "/clear" | "/c" => {
                self.core.clear();
                println!("{}", "Conversation cleared.".dimmed());
                SlashResult::Continue
            }
            "/retry" | "/r" => {
                match self.core.retry_last() {
                    Some(exchange) => println!("{} {}", "Editing:".dimmed(), exchange.user_text),
                    None => println!("{}", "Nothing to retry.".dimmed()),
                }
                SlashResult::Continue
            }
            "/history" => {
                self.print_history();
                SlashResult::Continue
            }
            "/copy" => {
                self.copy(parts.get(1).copied());
                SlashResult::Continue
            }
            "/voice" | "/v" => {
                self.dictate().await;
                SlashResult::Continue
            }
            "/draft" => {
                let draft = self.core.draft();
                if draft.is_empty() {
                    println!("{}", "Draft is empty.".dimmed());
                } else {
                    println!("{} {}", "Draft:".dimmed(), draft);
                }
                SlashResult::Continue
            }
            _ => {
                println!("{} Unknown command: {}", "?".yellow(), cmd);
                println!("Type {} for available commands", "/help".yellow());
                SlashResult::Continue
            }
        }
    }

    fn print_help(&self) {
        println!();
        println!("{}", "Available Commands:".bright_cyan());
        println!("  {:14} Show this help", "/help".yellow());
        println!("  {:14} Exit", "/quit".yellow());
        println!("  {:14} Clear the conversation", "/clear".yellow());
        println!("  {:14} Take back the last message to edit and resend", "/retry".yellow());
        println!("  {:14} Show the conversation", "/history".yellow());
        println!("  {:14} Copy reply N (default: last) to the clipboard", "/copy [N]".yellow());
        println!("  {:14} Dictate into the draft", "/voice".yellow());
        println!("  {:14} Show the current draft", "/draft".yellow());
        println!();
        println!("Ctrl+C cancels a pending reply or dictation.");
        println!();
    }

    fn print_history(&self) {
        let exchanges = self.core.exchanges();
        if exchanges.is_empty() {
            println!("{}", "No conversation history.".dimmed());
            return;
        }

        println!();
        println!("{}", "Conversation History:".bright_cyan());
        for (i, exchange) in exchanges.iter().enumerate() {
            let copied = if self.core.is_copied(&exchange_copy_key(exchange.id)) {
                " (copied)".green().to_string()
            } else {
                String::new()
            };
            println!("  {}. {}: {}", i + 1, "You".bright_green(), exchange.user_text);
            println!("     {}: {}{}", "Assistant".bright_blue(), preview(exchange), copied);
        }
        println!();
    }

    fn copy(&mut self, arg: Option<&str>) {
        let exchanges = self.core.exchanges();
        let index = match arg.map(str::parse::<usize>) {
            None => exchanges.len(),
            Some(Ok(n)) => n,
            Some(Err(_)) => {
                println!("{} Usage: /copy [N]", "?".yellow());
                return;
            }
        };

        let Some(id) = index.checked_sub(1).and_then(|i| exchanges.get(i)).map(|e| e.id) else {
            println!("{}", "No such reply.".dimmed());
            return;
        };

        match self.core.copy_exchange(id) {
            Ok(true) => println!("{}", "Copied!".green()),
            Ok(false) => println!("{}", "That reply has not arrived yet.".dimmed()),
            // notice is shown before the next prompt
            Err(_) => {}
        }
    }

    async fn dictate(&mut self) {
        if self.core.start_dictation().is_err() {
            return;
        }
        println!("{}", "Listening... (Ctrl+C to stop)".bright_magenta());

        let outcome = tokio::select! {
            biased;
            _ = tokio::signal::ctrl_c() => {
                self.core.stop_dictation();
                println!("{}", "Stopped listening.".dimmed());
                return;
            }
            outcome = self.core.dictate() => outcome,
        };

        if let Some(Ok(transcript)) = outcome {
            println!("{} {}", "Heard:".dimmed(), transcript);
        }
        debug!(state = ?self.core.dictation_state(), "dictate: finished");
        self.core.stop_dictation();
    }
}

/// Reply text shortened for the history listing
fn preview(exchange: &ChatExchange) -> String {
    let text = exchange.assistant.to_string();
    let preview: String = text.chars().take(60).collect();
    if text.chars().count() > 60 {
        format!("{}...", preview)
    } else {
        preview
    }
}

/// Result of handling a slash command
enum SlashResult {
    Continue,
    Quit,
}

//! Interactive chat REPL for MedPrompt
//!
//! Line-edited chat with slash commands, dictation and copy support on top
//! of [`AssistantCore`].

mod session;

pub use session::ReplSession;

use eyre::Result;

use crate::assistant::AssistantCore;
use crate::config::Config;

/// Run the interactive REPL
///
/// This is the main entry point for `mp chat`.
pub async fn run_interactive(config: &Config) -> Result<()> {
    let core = AssistantCore::from_config(config).map_err(|e| eyre::eyre!("Failed to create backend: {}", e))?;

    let mut session = ReplSession::new(core, config.backend.base_url.clone());
    session.run().await
}

//! Local chat mode: talk to the bot on the terminal
//!
//! Runs the real engine against an in-process gateway and the dry-run
//! messaging client, with a throwaway session snapshot. Useful for trying
//! the conversation flow without a bot token or a relay.

use eyre::Result;
use rustyline::DefaultEditor;
use rustyline::error::ReadlineError;
use std::sync::Arc;
use std::time::Duration;

use crate::config::Config;
use crate::dispatch::Dispatcher;
use crate::engine::Engine;
use crate::gateway::{ChannelGateway, Inbound};
use crate::sender::DryRunClient;
use crate::state::StateManager;

/// Conversation key for the local chat
const LOCAL_CHAT: &str = "local";

/// Operator identity for the local chat
const LOCAL_OPERATOR: &str = "local-operator";

pub async fn run(config: &Config) -> Result<()> {
    // Throwaway snapshot per process; the chat is not meant to persist
    let snapshot = std::env::temp_dir().join(format!("mailbot-chat-{}.json", std::process::id()));

    let state = StateManager::spawn(&snapshot)?;
    let dispatcher = Dispatcher::new(Arc::new(DryRunClient::new()), config.sender.pacing());
    let (gateway, inbound_tx, mut outbound_rx) = ChannelGateway::pair(64);

    let printer = tokio::spawn(async move {
        while let Some(out) = outbound_rx.recv().await {
            if out.reply.options.is_empty() {
                println!("bot> {}", out.reply.text);
            } else {
                println!("bot> {} [{}]", out.reply.text, out.reply.options.join(" / "));
            }
        }
    });

    let engine_task = tokio::spawn(Engine::new(state, dispatcher).run(gateway));

    println!("Chatting with mailbot locally; mailings are dry-run. Ctrl-D to quit.");

    let mut editor = DefaultEditor::new()?;
    loop {
        // rustyline blocks, so it runs off the async runtime
        let (returned, line) = tokio::task::spawn_blocking(move || {
            let line = editor.readline("you> ");
            (editor, line)
        })
        .await?;
        editor = returned;

        match line {
            Ok(text) => {
                let event = Inbound {
                    chat: LOCAL_CHAT.to_string(),
                    operator: Some(LOCAL_OPERATOR.to_string()),
                    text: Some(text),
                };
                if inbound_tx.send(event).await.is_err() {
                    break;
                }
                // Let the replies land before the next prompt
                tokio::time::sleep(Duration::from_millis(150)).await;
            }
            Err(ReadlineError::Eof) | Err(ReadlineError::Interrupted) => break,
            Err(e) => return Err(e.into()),
        }
    }

    drop(inbound_tx);
    engine_task.await??;
    let _ = printer.await;

    let _ = std::fs::remove_file(&snapshot);
    Ok(())
}

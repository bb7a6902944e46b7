//! Per-conversation worker: read, step, flush, reply, maybe mail
//!
//! One worker per conversation key guarantees the read-modify-write-flush
//! cycle never runs concurrently for the same record.

use std::sync::Arc;
use tokio::sync::mpsc;
use tracing::{debug, error, info, warn};

use crate::flow::{self, Conversation, MailingRequest, Reply};
use crate::gateway::{Inbound, Outbound};
use crate::prompts;

use super::Context;

pub(super) async fn run(chat: String, mut rx: mpsc::Receiver<Inbound>, ctx: Arc<Context>) {
    debug!(%chat, "Conversation worker started");
    while let Some(event) = rx.recv().await {
        if let Err(e) = handle_event(&chat, event, &ctx).await {
            // Not-committed: no replies for this transition were sent
            error!(%chat, error = %e, "Event not committed");
        }
    }
    debug!(%chat, "Conversation worker stopped");
}

/// Apply one inbound event to the stored record.
///
/// The mutated record is flushed before any reply goes out; a persistence
/// failure aborts the event with nothing delivered.
async fn handle_event(chat: &str, event: Inbound, ctx: &Context) -> eyre::Result<()> {
    let record = ctx.state.get(chat).await?.unwrap_or_else(Conversation::initial);

    // An event whose sender cannot be resolved is stepped as text-absent,
    // which forces the reset route
    if event.operator.is_none() {
        warn!(%chat, "Could not resolve sender identity, resetting conversation");
    }
    let text = match &event.operator {
        Some(_) => event.text.as_deref(),
        None => None,
    };

    let step = flow::step(&record, text);
    debug!(%chat, from = %record.state, to = %step.next.state, "Applied transition");

    ctx.state.put(chat, step.next).await?;

    for reply in step.replies {
        deliver(ctx, chat, reply).await;
    }

    if let Some(mailing) = step.mailing
        && let Some(operator) = event.operator.as_deref()
    {
        run_mailing(chat, operator, mailing, ctx).await;
    }

    Ok(())
}

async fn deliver(ctx: &Context, chat: &str, reply: Reply) {
    if let Err(e) = ctx
        .outbox
        .deliver(Outbound {
            chat: chat.to_string(),
            reply,
        })
        .await
    {
        warn!(%chat, error = %e, "Failed to deliver reply");
    }
}

/// Run one mailing, forwarding its progress notices back to the operator.
///
/// The record was already flushed back to `start` before this runs, so a
/// crash mid-mailing cannot re-offer the same send after restart.
async fn run_mailing(chat: &str, operator: &str, request: MailingRequest, ctx: &Context) {
    let (progress_tx, mut progress_rx) = mpsc::channel::<Reply>(32);

    let outbox = ctx.outbox.clone();
    let chat_owned = chat.to_string();
    let forwarder = tokio::spawn(async move {
        while let Some(reply) = progress_rx.recv().await {
            if let Err(e) = outbox
                .deliver(Outbound {
                    chat: chat_owned.clone(),
                    reply,
                })
                .await
            {
                warn!(chat = %chat_owned, error = %e, "Failed to deliver progress notice");
            }
        }
    });

    let result = ctx
        .dispatcher
        .dispatch(operator, &request.recipients, &request.body, &progress_tx)
        .await;

    drop(progress_tx);
    let _ = forwarder.await;

    match result {
        Ok(report) => {
            info!(
                %chat,
                mailing = %report.id,
                delivered = report.delivered(),
                failed = report.failed(),
                "Mailing finished"
            );
        }
        Err(e) => {
            error!(%chat, error = %e, "Mailing could not start");
            deliver(ctx, chat, Reply::text(prompts::MAILING_FAILED)).await;
        }
    }
}

use std::collections::HashSet;

use clap::{Args, Subcommand};
use crewboard::domain::{Conversation, ConversationId, Message, UserId};
use crewboard::error::AppError;
use crewboard::screens::{MessageComposer, SendOutcome};
use crewboard::sync::SyncError;
use serde::Serialize;
use tracing::warn;

use crate::cli::{into_data, Context};
use crate::output::{or_dash, print_rows, truncate, OutputFormat, Row};

#[derive(Subcommand, Debug)]
pub(crate) enum MessagesCommand {
    /// List your conversations
    Inbox {
        #[arg(long, value_enum, default_value_t = OutputFormat::Table)]
        format: OutputFormat,
    },
    /// Print a conversation and mark it read
    Show(ShowArgs),
    /// Open (or reuse) a conversation with a user
    Start { user: u64 },
    /// Send a message to a conversation
    Send { conversation: u64, text: String },
    /// Follow a conversation, printing new messages until interrupted
    Watch { conversation: u64 },
}

#[derive(Args, Debug)]
pub(crate) struct ShowArgs {
    conversation: u64,
    #[arg(long, default_value_t = 1)]
    page: u32,
}

#[derive(Debug, Serialize)]
struct ConversationRow {
    id: u64,
    with: String,
    kind: &'static str,
    unread: u32,
    last_message: String,
    updated: String,
}

impl From<&Conversation> for ConversationRow {
    fn from(conversation: &Conversation) -> Self {
        Self {
            id: conversation.id.0,
            with: conversation.other_party.name.clone(),
            kind: conversation.other_party.kind.label(),
            unread: conversation.unread_count,
            last_message: or_dash(conversation.last_message.as_deref()),
            updated: conversation
                .updated_at
                .map(|at| at.format("%Y-%m-%d %H:%M").to_string())
                .unwrap_or_else(|| "-".to_string()),
        }
    }
}

impl Row for ConversationRow {
    const HEADERS: &'static [&'static str] =
        &["ID", "WITH", "KIND", "UNREAD", "LAST MESSAGE", "UPDATED"];

    fn cells(&self) -> Vec<String> {
        vec![
            self.id.to_string(),
            self.with.clone(),
            self.kind.to_string(),
            self.unread.to_string(),
            truncate(&self.last_message, 48),
            self.updated.clone(),
        ]
    }
}

fn print_message(message: &Message) {
    println!(
        "[{}] {}: {}",
        message.created_at.format("%Y-%m-%d %H:%M"),
        message.sender.name,
        message.content
    );
}

pub(crate) async fn run(ctx: &Context, command: MessagesCommand) -> Result<(), AppError> {
    match command {
        MessagesCommand::Inbox { format } => inbox(ctx, format).await,
        MessagesCommand::Show(args) => show(ctx, args).await,
        MessagesCommand::Start { user } => start(ctx, UserId(user)).await,
        MessagesCommand::Send { conversation, text } => {
            send(ctx, ConversationId(conversation), text).await
        }
        MessagesCommand::Watch { conversation } => watch(ctx, ConversationId(conversation)).await,
    }
}

pub(crate) async fn unread(ctx: &Context) -> Result<(), AppError> {
    let count = into_data(ctx.sync.unread_count(ctx.token()).await)?;
    println!("{}", count.unread_count);
    Ok(())
}

async fn inbox(ctx: &Context, format: OutputFormat) -> Result<(), AppError> {
    let page = into_data(ctx.sync.conversations(ctx.token()).await)?;
    let rows: Vec<ConversationRow> = page.results.iter().map(ConversationRow::from).collect();
    print_rows(&rows, format)
}

async fn show(ctx: &Context, args: ShowArgs) -> Result<(), AppError> {
    let conversation_id = ConversationId(args.conversation);
    let state = ctx
        .sync
        .conversation_messages(ctx.token(), conversation_id, args.page.max(1))
        .await;
    let page = into_data(state)?;

    if page.results.is_empty() {
        println!("(no messages)");
    }
    for message in &page.results {
        print_message(message);
    }

    if page.results.iter().any(|message| !message.is_read) {
        ctx.sync
            .mark_conversation_read(ctx.token(), conversation_id)
            .await?;
    }
    Ok(())
}

async fn start(ctx: &Context, user_id: UserId) -> Result<(), AppError> {
    let conversation = ctx
        .sync
        .get_or_create_conversation(ctx.token(), user_id)
        .await?;
    println!(
        "Conversation {} with {}",
        conversation.id, conversation.other_party.name
    );
    Ok(())
}

async fn send(ctx: &Context, conversation_id: ConversationId, text: String) -> Result<(), AppError> {
    let composer = MessageComposer::new(ctx.sync.clone(), ctx.session.clone(), conversation_id);
    composer.set_draft(text);

    match composer.send().await? {
        SendOutcome::Sent(message) => print_message(&message),
        SendOutcome::Blocked => return Err(SyncError::EmptyMessage.into()),
    }
    Ok(())
}

async fn watch(ctx: &Context, conversation_id: ConversationId) -> Result<(), AppError> {
    if ctx.token().is_none() {
        return Err(SyncError::Unauthenticated.into());
    }

    let mut subscription = ctx
        .sync
        .watch_conversation_messages(ctx.token(), conversation_id, 1);
    let mut seen = HashSet::new();
    eprintln!("Watching conversation {conversation_id}; press Ctrl-C to stop.");

    loop {
        tokio::select! {
            state = subscription.changed() => {
                let Some(state) = state else { break };
                if let Some(error) = &state.error {
                    warn!(%conversation_id, error = %error, "refresh failed");
                }
                if let Some(page) = &state.data {
                    for message in page.results.iter().filter(|message| seen.insert(message.id)) {
                        print_message(message);
                    }
                }
            }
            _ = tokio::signal::ctrl_c() => break,
        }
    }
    Ok(())
}

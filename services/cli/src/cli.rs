use std::sync::Arc;

use clap::{Parser, Subcommand, ValueEnum};
use crewboard::config::{ApiConfig, ClientConfig};
use crewboard::domain::AccountKind;
use crewboard::error::AppError;
use crewboard::listing::PagedFeed;
use crewboard::query::QueryState;
use crewboard::screens::Session;
use crewboard::sync::{MarketplaceSync, SyncError};
use crewboard::telemetry;
use tracing::debug;

use crate::applications::ApplicationsCommand;
use crate::jobs::JobsCommand;
use crate::messages::MessagesCommand;
use crate::workers::WorkersCommand;

#[derive(Parser, Debug)]
#[command(
    name = "crewboard",
    about = "Browse jobs, manage applications, and message crews from the terminal",
    version
)]
pub(crate) struct Cli {
    /// Override CREWBOARD_API_URL
    #[arg(long, global = true)]
    api_url: Option<String>,
    /// Override CREWBOARD_TOKEN
    #[arg(long, global = true)]
    token: Option<String>,
    /// Account type used for client-side decisions such as the role picker
    #[arg(long, global = true, value_enum, default_value_t = AccountArg::Individual)]
    account: AccountArg,
    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand, Debug)]
enum Command {
    /// Search and apply to job postings
    Jobs {
        #[command(subcommand)]
        command: JobsCommand,
    },
    /// Applications you sent or received
    Applications {
        #[command(subcommand)]
        command: ApplicationsCommand,
    },
    /// Browse workers and companies
    Workers {
        #[command(subcommand)]
        command: WorkersCommand,
    },
    /// Conversations and messages
    Messages {
        #[command(subcommand)]
        command: MessagesCommand,
    },
    /// Print the unread message count
    Unread,
}

#[derive(ValueEnum, Debug, Clone, Copy, PartialEq, Eq)]
enum AccountArg {
    Individual,
    Company,
}

impl From<AccountArg> for AccountKind {
    fn from(value: AccountArg) -> Self {
        match value {
            AccountArg::Individual => AccountKind::Individual,
            AccountArg::Company => AccountKind::Company,
        }
    }
}

/// Everything a command handler needs.
pub(crate) struct Context {
    pub(crate) sync: MarketplaceSync,
    pub(crate) session: Session,
}

impl Context {
    pub(crate) fn token(&self) -> Option<&str> {
        self.session.token()
    }
}

pub(crate) async fn run() -> Result<(), AppError> {
    let cli = Cli::parse();

    let mut config = ClientConfig::load()?;
    if let Some(api_url) = cli.api_url.as_deref() {
        config.api.base_url = ApiConfig::parse_base_url(api_url)?;
    }
    if let Some(token) = cli.token.filter(|token| !token.trim().is_empty()) {
        config.api.token = Some(token);
    }

    telemetry::init(&config.telemetry)?;
    debug!(environment = ?config.environment, base_url = %config.api.base_url, "client configured");

    let ctx = Context {
        sync: crewboard::connect(&config)?,
        session: Session {
            token: config.api.token.clone(),
            account: Some(cli.account.into()),
        },
    };

    match cli.command {
        Command::Jobs { command } => crate::jobs::run(&ctx, command).await,
        Command::Applications { command } => crate::applications::run(&ctx, command).await,
        Command::Workers { command } => crate::workers::run(&ctx, command).await,
        Command::Messages { command } => crate::messages::run(&ctx, command).await,
        Command::Unread => crate::messages::unread(&ctx).await,
    }
}

/// Unwrap a query result. A query with neither data nor error was disabled for lack of a token.
pub(crate) fn into_data<T>(state: QueryState<T>) -> Result<Arc<T>, AppError> {
    match (state.data, state.error) {
        (_, Some(error)) => Err(error.into()),
        (Some(data), None) => Ok(data),
        (None, None) => Err(SyncError::Unauthenticated.into()),
    }
}

pub(crate) fn feed_error<T, F>(feed: &PagedFeed<T, F>) -> Result<(), AppError>
where
    T: Clone + Send + 'static,
    F: Clone + Send + Sync + 'static,
{
    match feed.inspect(|state| state.error().cloned()) {
        Some(error) => Err(error.into()),
        None => Ok(()),
    }
}

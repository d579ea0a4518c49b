use clap::{Args, Subcommand};
use crewboard::domain::{WorkerFilters, WorkerProfile};
use crewboard::error::AppError;
use crewboard::screens::WorkerDirectory;
use serde::Serialize;

use crate::cli::{feed_error, Context};
use crate::output::{or_dash, print_rows, OutputFormat, Row};

#[derive(Subcommand, Debug)]
pub(crate) enum WorkersCommand {
    /// Browse worker and company profiles
    List(WorkerListArgs),
}

#[derive(Args, Debug)]
pub(crate) struct WorkerListArgs {
    #[arg(long)]
    search: Option<String>,
    #[arg(long)]
    trade: Option<String>,
    #[arg(long)]
    location: Option<String>,
    /// Follow pagination to the last page
    #[arg(long)]
    all: bool,
    #[arg(long, value_enum, default_value_t = OutputFormat::Table)]
    format: OutputFormat,
}

#[derive(Debug, Serialize)]
struct WorkerRow {
    id: u64,
    name: String,
    kind: &'static str,
    trade: String,
    location: String,
    hourly_rate: Option<f64>,
    rating: Option<f32>,
}

impl From<&WorkerProfile> for WorkerRow {
    fn from(worker: &WorkerProfile) -> Self {
        Self {
            id: worker.id.0,
            name: worker.name.clone(),
            kind: worker.kind.label(),
            trade: or_dash(worker.trade.as_deref()),
            location: or_dash(worker.location.as_deref()),
            hourly_rate: worker.hourly_rate,
            rating: worker.rating,
        }
    }
}

impl Row for WorkerRow {
    const HEADERS: &'static [&'static str] =
        &["ID", "NAME", "KIND", "TRADE", "LOCATION", "RATE", "RATING"];

    fn cells(&self) -> Vec<String> {
        vec![
            self.id.to_string(),
            self.name.clone(),
            self.kind.to_string(),
            self.trade.clone(),
            self.location.clone(),
            self.hourly_rate
                .map_or_else(|| "-".to_string(), |rate| format!("{rate:.2}/h")),
            self.rating
                .map_or_else(|| "-".to_string(), |rating| format!("{rating:.1}")),
        ]
    }
}

pub(crate) async fn run(ctx: &Context, command: WorkersCommand) -> Result<(), AppError> {
    match command {
        WorkersCommand::List(args) => list(ctx, args).await,
    }
}

async fn list(ctx: &Context, args: WorkerListArgs) -> Result<(), AppError> {
    let directory = WorkerDirectory::new(ctx.sync.clone(), ctx.session.clone());
    directory
        .search(WorkerFilters {
            search: args.search,
            trade: args.trade,
            location: args.location,
            kind: None,
        })
        .await;
    feed_error(directory.feed())?;

    if args.all {
        while directory.load_more().await.is_some() {
            feed_error(directory.feed())?;
        }
    }

    let rows: Vec<WorkerRow> = directory.workers().iter().map(WorkerRow::from).collect();
    print_rows(&rows, args.format)
}

use clap::{Args, Subcommand};
use crewboard::api::MarketplaceApi;
use crewboard::domain::{Job, JobFilters, JobId};
use crewboard::error::AppError;
use crewboard::screens::{ApplyOutcome, JobBoard};
use serde::Serialize;

use crate::cli::{feed_error, Context};
use crate::output::{or_dash, print_rows, truncate, OutputFormat, Row};

#[derive(Subcommand, Debug)]
pub(crate) enum JobsCommand {
    /// Search published jobs
    List(JobListArgs),
    /// Apply to a job
    Apply(ApplyArgs),
}

#[derive(Args, Debug)]
pub(crate) struct JobListArgs {
    /// Free-text search over titles and descriptions
    #[arg(long)]
    search: Option<String>,
    #[arg(long)]
    category: Option<String>,
    #[arg(long)]
    location: Option<String>,
    /// Page to fetch
    #[arg(long, default_value_t = 1)]
    page: u32,
    /// Follow pagination to the last page
    #[arg(long, conflicts_with = "page")]
    all: bool,
    #[arg(long, value_enum, default_value_t = OutputFormat::Table)]
    format: OutputFormat,
}

#[derive(Args, Debug)]
pub(crate) struct ApplyArgs {
    job: u64,
    /// Role to apply for on multi-role jobs
    #[arg(long)]
    role: Option<String>,
    #[arg(long)]
    cover_letter: Option<String>,
}

#[derive(Debug, Serialize)]
struct JobRow {
    id: u64,
    title: String,
    category: String,
    location: String,
    roles: String,
    budget: String,
    payment: &'static str,
    applied: bool,
}

impl From<&Job> for JobRow {
    fn from(job: &Job) -> Self {
        let roles = job
            .roles
            .iter()
            .map(|role| match role.quantity {
                1 => role.role_name.clone(),
                n => format!("{} x{n}", role.role_name),
            })
            .collect::<Vec<_>>()
            .join(", ");
        Self {
            id: job.id.0,
            title: job.title.clone(),
            category: or_dash(job.category.as_deref()),
            location: or_dash(job.location.as_deref()),
            roles: if roles.is_empty() { "-".to_string() } else { roles },
            budget: job.budget_label(),
            payment: job.payment_type.label(),
            applied: job.has_applied,
        }
    }
}

impl Row for JobRow {
    const HEADERS: &'static [&'static str] = &[
        "ID", "TITLE", "CATEGORY", "LOCATION", "ROLES", "BUDGET", "PAYMENT", "APPLIED",
    ];

    fn cells(&self) -> Vec<String> {
        vec![
            self.id.to_string(),
            truncate(&self.title, 40),
            self.category.clone(),
            self.location.clone(),
            truncate(&self.roles, 32),
            self.budget.clone(),
            self.payment.to_string(),
            if self.applied { "yes" } else { "" }.to_string(),
        ]
    }
}

pub(crate) async fn run(ctx: &Context, command: JobsCommand) -> Result<(), AppError> {
    match command {
        JobsCommand::List(args) => list(ctx, args).await,
        JobsCommand::Apply(args) => apply(ctx, args).await,
    }
}

async fn list(ctx: &Context, args: JobListArgs) -> Result<(), AppError> {
    let filters = JobFilters {
        search: args.search,
        category: args.category,
        location: args.location,
        ..JobFilters::default()
    };

    let jobs = if args.all {
        let board = JobBoard::new(ctx.sync.clone(), ctx.session.clone());
        board.search(filters).await;
        feed_error(board.feed())?;
        while board.load_more().await.is_some() {
            feed_error(board.feed())?;
        }
        board.jobs()
    } else {
        ctx.sync
            .api()
            .list_jobs(ctx.token(), &filters, args.page.max(1))
            .await?
            .results
    };

    let rows: Vec<JobRow> = jobs.iter().map(JobRow::from).collect();
    print_rows(&rows, args.format)
}

async fn apply(ctx: &Context, args: ApplyArgs) -> Result<(), AppError> {
    let board = JobBoard::new(ctx.sync.clone(), ctx.session.clone());
    let job_id = JobId(args.job);
    let cover_letter = args.cover_letter.unwrap_or_default();

    match board
        .apply(job_id, args.role.as_deref(), &cover_letter)
        .await?
    {
        ApplyOutcome::Applied(application) => println!(
            "Applied to job {job_id} (application {}, {})",
            application.id, application.status
        ),
        ApplyOutcome::AlreadyApplied => println!("You have already applied to job {job_id}."),
        ApplyOutcome::InFlight => println!("An application to job {job_id} is already in progress."),
        ApplyOutcome::PickRole(roles) => println!(
            "Job {job_id} has several roles. Choose one with --role: {}",
            roles.join(", ")
        ),
    }
    Ok(())
}

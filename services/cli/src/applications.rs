use clap::{Args, Subcommand};
use crewboard::domain::{Application, ApplicationId, ApplicationStatus, JobId};
use crewboard::error::AppError;
use crewboard::screens::{ApplicationsDashboard, WithdrawOutcome};
use serde::Serialize;

use crate::cli::{into_data, Context};
use crate::output::{or_dash, print_rows, OutputFormat, Row};

#[derive(Subcommand, Debug)]
pub(crate) enum ApplicationsCommand {
    /// Applications you have sent
    Mine(MineArgs),
    /// Applications received for one of your jobs
    ForJob(ForJobArgs),
    /// Withdraw one of your applications
    Withdraw { application: u64 },
    /// Move a received application to a new status
    SetStatus {
        job: u64,
        application: u64,
        status: ApplicationStatus,
    },
}

#[derive(Args, Debug)]
pub(crate) struct MineArgs {
    #[arg(long)]
    status: Option<ApplicationStatus>,
    #[arg(long, default_value_t = 1)]
    page: u32,
    #[arg(long, value_enum, default_value_t = OutputFormat::Table)]
    format: OutputFormat,
}

#[derive(Args, Debug)]
pub(crate) struct ForJobArgs {
    job: u64,
    #[arg(long)]
    status: Option<ApplicationStatus>,
    #[arg(long, default_value_t = 1)]
    page: u32,
    #[arg(long, value_enum, default_value_t = OutputFormat::Table)]
    format: OutputFormat,
}

#[derive(Debug, Serialize)]
struct ApplicationRow {
    id: u64,
    job: u64,
    job_title: String,
    applicant: String,
    role: String,
    status: &'static str,
    applied_on: String,
}

impl From<&Application> for ApplicationRow {
    fn from(application: &Application) -> Self {
        Self {
            id: application.id.0,
            job: application.job.0,
            job_title: or_dash(application.job_title.as_deref()),
            applicant: or_dash(application.applicant_name.as_deref()),
            role: or_dash(application.role_name.as_deref()),
            status: application.status.label(),
            applied_on: application.created_at.format("%Y-%m-%d").to_string(),
        }
    }
}

impl Row for ApplicationRow {
    const HEADERS: &'static [&'static str] =
        &["ID", "JOB", "TITLE", "APPLICANT", "ROLE", "STATUS", "APPLIED"];

    fn cells(&self) -> Vec<String> {
        vec![
            self.id.to_string(),
            self.job.to_string(),
            self.job_title.clone(),
            self.applicant.clone(),
            self.role.clone(),
            self.status.to_string(),
            self.applied_on.clone(),
        ]
    }
}

pub(crate) async fn run(ctx: &Context, command: ApplicationsCommand) -> Result<(), AppError> {
    match command {
        ApplicationsCommand::Mine(args) => mine(ctx, args).await,
        ApplicationsCommand::ForJob(args) => for_job(ctx, args).await,
        ApplicationsCommand::Withdraw { application } => {
            withdraw(ctx, ApplicationId(application)).await
        }
        ApplicationsCommand::SetStatus {
            job,
            application,
            status,
        } => set_status(ctx, JobId(job), ApplicationId(application), status).await,
    }
}

async fn mine(ctx: &Context, args: MineArgs) -> Result<(), AppError> {
    let mut dashboard = ApplicationsDashboard::new(ctx.sync.clone(), ctx.session.clone());
    dashboard.select_status(args.status);
    let page = into_data(dashboard.applications(args.page.max(1)).await)?;

    let rows: Vec<ApplicationRow> = page.results.iter().map(ApplicationRow::from).collect();
    print_rows(&rows, args.format)?;

    if args.format == OutputFormat::Table {
        if let Some(summary) = dashboard.summary().await {
            eprintln!(
                "{} applications: {} active, {} closed",
                summary.total, summary.active, summary.closed
            );
        }
    }
    Ok(())
}

async fn for_job(ctx: &Context, args: ForJobArgs) -> Result<(), AppError> {
    let state = ctx
        .sync
        .job_applications(ctx.token(), JobId(args.job), args.status, args.page.max(1))
        .await;
    let page = into_data(state)?;

    let rows: Vec<ApplicationRow> = page.results.iter().map(ApplicationRow::from).collect();
    print_rows(&rows, args.format)
}

async fn withdraw(ctx: &Context, application_id: ApplicationId) -> Result<(), AppError> {
    let dashboard = ApplicationsDashboard::new(ctx.sync.clone(), ctx.session.clone());

    // Check the client-side rule when the application is on the first page.
    let known = into_data(dashboard.applications(1).await)?
        .results
        .iter()
        .find(|application| application.id == application_id)
        .cloned();

    let ack = match known {
        Some(application) => match dashboard.withdraw(&application).await? {
            WithdrawOutcome::Withdrawn(ack) => ack,
            WithdrawOutcome::NotAllowed => {
                println!(
                    "Application {application_id} is already {} and cannot be withdrawn.",
                    application.status
                );
                return Ok(());
            }
        },
        None => {
            ctx.sync
                .withdraw_application(ctx.token(), application_id)
                .await?
        }
    };

    println!(
        "{}",
        ack.message
            .unwrap_or_else(|| format!("Application {application_id} withdrawn."))
    );
    Ok(())
}

async fn set_status(
    ctx: &Context,
    job_id: JobId,
    application_id: ApplicationId,
    status: ApplicationStatus,
) -> Result<(), AppError> {
    let application = ctx
        .sync
        .update_application_status(ctx.token(), job_id, application_id, status)
        .await?;
    println!(
        "Application {} for job {job_id} is now {}.",
        application.id, application.status
    );
    Ok(())
}

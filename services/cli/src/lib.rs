mod applications;
mod cli;
mod jobs;
mod messages;
mod output;
mod workers;

use crewboard::error::AppError;

pub async fn run() -> Result<(), AppError> {
    cli::run().await
}

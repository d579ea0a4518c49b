use crewboard_cli::run;

#[tokio::main]
async fn main() {
    if let Err(err) = run().await {
        eprintln!("crewboard: {err}");
        std::process::exit(err.exit_code());
    }
}

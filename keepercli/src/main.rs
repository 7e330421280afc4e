use clap::Parser;
use dotenv::dotenv;
use keepercli::cli::Cli;
use tracing_subscriber::EnvFilter;

#[tokio::main]
async fn main() {
    dotenv().ok();

    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("warn")),
        )
        .with_target(false)
        .with_writer(std::io::stderr)
        .init();

    let cli = Cli::parse();

    if let Err(e) = keepercli::commands::execute(cli).await {
        eprintln!("error: {}", e);
        std::process::exit(1);
    }
}

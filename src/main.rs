use clap::Parser;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

use todo_tracker::cli::Cli;
use todo_tracker::cmd;
use todo_tracker::config::Config;

/// Log to stderr so stdout carries only command output.
fn init_tracing() {
    let filter = tracing_subscriber::EnvFilter::new(
        std::env::var("RUST_LOG").unwrap_or_else(|_| "todo_tracker=warn".into()),
    );
    tracing_subscriber::registry()
        .with(filter)
        .with(tracing_subscriber::fmt::layer().with_writer(std::io::stderr))
        .init();
}

fn main() {
    let cli = Cli::parse();
    init_tracing();

    let config = Config::from_cli(&cli);
    tracing::debug!(?config, "resolved configuration");

    if let Err(e) = cmd::run(cli.command, &config) {
        eprintln!("Error: {e}");
        std::process::exit(1);
    }
}

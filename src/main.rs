use clap::Parser;
use tracing_subscriber::EnvFilter;

use gitgroup::presentation::cli::{Cli, CliApp};

#[tokio::main]
async fn main() {
    let cli = Cli::parse();

    // Logs go to stderr so stdout stays clean for `goto` and `--json`
    let filter = if cli.verbose {
        EnvFilter::new("gitgroup=debug")
    } else {
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("warn"))
    };
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .with_target(false)
        .init();

    let code = CliApp::from_cli(cli).run().await;
    std::process::exit(code);
}

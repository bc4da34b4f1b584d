mod cli;
mod prompt;

use clap::Parser;
use cli::Cli;
use prompt::TerminalPrompter;
use std::process;
use tracing_subscriber::EnvFilter;
use vmstrap::{GithubArtifactClient, InstallContext, InstallPipeline, SystemProbe, SystemRunner};

fn main() {
    let cli = Cli::parse();
    init_tracing(cli.verbose);

    if let Err(e) = run(&cli) {
        eprintln!("Error: {e:#}");
        process::exit(1);
    }
}

fn init_tracing(verbose: bool) {
    let default_level = if verbose { "debug" } else { "info" };
    let filter =
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(default_level));

    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .with_target(false)
        .init();
}

fn run(cli: &Cli) -> anyhow::Result<()> {
    let options = cli.install_options()?;

    let probe = SystemProbe;
    let source = GithubArtifactClient::new(options.artifact.api_url.clone())?;
    let runner = SystemRunner::new();
    let prompter = TerminalPrompter;

    let report = InstallPipeline::new(InstallContext {
        probe: &probe,
        source: &source,
        runner: &runner,
        prompter: &prompter,
        options: &options,
    })
    .run()?;

    tracing::info!(
        hostname = %report.hostname,
        username = %report.username,
        device = %options.device.display(),
        total_ms = report.metrics.total_duration_ms,
        "Installation finished"
    );
    println!("Installation complete. Please reboot.");
    Ok(())
}

use clap::Parser;
use tracing_subscriber::EnvFilter;

mod cli;
mod core;
mod labeling;
mod matching;
mod parsing;
mod pipeline;
mod reconcile;
mod utils;

fn main() -> anyhow::Result<()> {
    let cli = cli::Cli::parse();

    // Initialize logging based on verbosity flag
    let filter = if cli.verbose {
        EnvFilter::new("ortho_solver=debug,info")
    } else {
        EnvFilter::new("ortho_solver=warn")
    };

    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .with_target(false)
        .without_time()
        .init();

    match cli.command {
        cli::Commands::Reconcile(args) => {
            cli::reconcile::run(args, cli.format, cli.verbose)?;
        }
        cli::Commands::Label(args) => {
            cli::label::run(args, cli.format, cli.verbose)?;
        }
    }

    Ok(())
}

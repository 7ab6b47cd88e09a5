mod cli;

use clap::Parser;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

use crate::cli::{Cli, Commands};

fn main() -> anyhow::Result<()> {
    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "crate_index=info".into()),
        )
        .with(
            tracing_subscriber::fmt::layer()
                .with_target(false)
                .with_writer(std::io::stderr),
        )
        .init();

    let cli = Cli::parse();

    match cli.command {
        Commands::Analyze {
            crate_path,
            output,
            overwrite,
            include_private,
            format,
        } => {
            cli::analyze(&crate_path, &output, overwrite, include_private, &format)?;
        }
        Commands::Show { kind, path, cache } => {
            cli::show(&kind, &path, &cache)?;
        }
        Commands::List {
            kind,
            prefix,
            children,
            cache,
        } => {
            cli::list(&kind, &prefix, children, &cache)?;
        }
    }

    Ok(())
}

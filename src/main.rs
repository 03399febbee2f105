// OIDC discovery aggregator - main entry point

use clap::Parser;

use oidc_aggregator::cli::Cli;
use oidc_aggregator::config::Config;
use oidc_aggregator::server::Server;

#[actix_web::main]
async fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();

    let default_filter = if cli.verbose {
        "debug"
    } else if cli.quiet {
        "error"
    } else {
        "info"
    };
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new(default_filter)),
        )
        .init();

    let mut config = Config::load(cli.config.as_deref())?;
    config.apply_cli(&cli);

    let server = Server::new(config)?;
    server.run().await?;

    Ok(())
}

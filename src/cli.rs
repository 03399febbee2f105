// CLI argument definitions

use clap::Parser;
use std::path::PathBuf;

/// OIDC discovery aggregator: one issuer endpoint publishing the union of
/// many upstream issuers' signing keys
#[derive(Parser, Debug)]
#[command(name = "oidc-aggregator")]
#[command(author, version, about, long_about = None)]
pub struct Cli {
    /// Issuer URL advertised in the discovery document
    /// (trailing / required if the URL has no path segment;
    /// default https://localhost:8080/)
    #[arg(long, env = "OIDC_AGGREGATOR_ISSUER")]
    pub issuer: Option<String>,

    /// Listen port (default 8080)
    #[arg(short, long, env = "OIDC_AGGREGATOR_PORT")]
    pub port: Option<u16>,

    /// Trusted upstream issuer URL, may be repeated; appended to the static
    /// catalog from the configuration file
    #[arg(long = "issuers", value_name = "URL")]
    pub issuers: Vec<String>,

    /// Path to configuration file
    #[arg(short, long, env = "OIDC_AGGREGATOR_CONFIG")]
    pub config: Option<PathBuf>,

    /// Enable verbose logging
    #[arg(short, long, conflicts_with = "quiet")]
    pub verbose: bool,

    /// Suppress non-error output
    #[arg(short, long)]
    pub quiet: bool,
}

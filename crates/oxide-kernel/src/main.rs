//! oxide-routes CLI
//!
//! Inspect a route configuration: list routes, match a request, or
//! generate a URL.

use std::path::PathBuf;

use anyhow::Context;
use clap::{Parser, Subcommand};
use tracing::{debug, Level};
use tracing_subscriber::FmtSubscriber;

use oxide_kernel::{Kernel, KernelConfig};
use oxide_router::{GrantedPermissions, Params};

/// Route table inspector for oxide applications.
#[derive(Parser)]
#[command(name = "oxide-routes")]
#[command(author, version, about, long_about = None)]
struct Cli {
    /// Kernel configuration file (JSON).
    #[arg(short, long, env = "OXIDE_CONFIG", default_value = "routes.json")]
    config: PathBuf,

    /// Base URL, overriding the configuration file.
    #[arg(short, long, env = "OXIDE_BASE_URL")]
    base_url: Option<String>,

    /// Path prefix stripped before matching, overriding the one taken
    /// from the base URL.
    #[arg(short = 'p', long, env = "OXIDE_BASE_PATH")]
    base_path: Option<String>,

    /// Permission granted when generating URLs (repeatable).
    #[arg(short, long = "grant")]
    grants: Vec<String>,

    /// Enable verbose output.
    #[arg(short, long)]
    verbose: bool,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// List all routes in registration order.
    List,

    /// Show which route a request matches.
    Match {
        /// HTTP method.
        method: String,

        /// Request path, optionally with a query string.
        path: String,
    },

    /// Generate the URL of a named route.
    Url {
        /// Route name.
        name: String,

        /// Route parameters as key=value.
        params: Vec<String>,
    },
}

fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();

    // Setup logging
    let log_level = if cli.verbose {
        Level::DEBUG
    } else {
        Level::INFO
    };
    let subscriber = FmtSubscriber::builder()
        .with_max_level(log_level)
        .with_target(false)
        .without_time()
        .finish();
    tracing::subscriber::set_global_default(subscriber)?;

    let mut config = KernelConfig::load(&cli.config)
        .with_context(|| format!("failed to load {}", cli.config.display()))?;
    if let Some(base_url) = cli.base_url {
        config.base_url = base_url;
    }
    if let Some(base_path) = cli.base_path {
        config.base_path = Some(base_path);
    }
    debug!(grants = ?cli.grants, "access grants");
    let kernel =
        Kernel::new(config)?.with_access_check(GrantedPermissions::new(cli.grants));

    match cli.command {
        Commands::List => list_routes(&kernel),
        Commands::Match { method, path } => match_route(&kernel, &method, &path)?,
        Commands::Url { name, params } => {
            let params = parse_params(&params)?;
            println!("{}", kernel.url(&name, &params)?);
        }
    }

    Ok(())
}

fn list_routes(kernel: &Kernel) {
    let router = kernel.router();
    if router.is_empty() {
        println!("No routes configured.");
        return;
    }

    println!("{:<12} {:<32} {:<20} TARGET", "METHOD", "ROUTE", "NAME");
    println!("{}", "-".repeat(80));
    for route in router.routes() {
        let target: Vec<String> = route
            .target
            .iter()
            .map(|(k, v)| format!("{k}={v}"))
            .collect();
        println!(
            "{:<12} {:<32} {:<20} {}",
            route.methods.to_string(),
            route.pattern.raw(),
            route.name.as_deref().unwrap_or("-"),
            target.join(" ")
        );
    }
}

fn match_route(kernel: &Kernel, method: &str, path: &str) -> anyhow::Result<()> {
    let matched = kernel.match_request(method, path)?;
    println!("Route:  {}", matched.route_name.as_deref().unwrap_or("-"));
    for (role, value) in matched.target.iter() {
        println!("  {role}: {value}");
    }
    if !matched.params.is_empty() {
        println!("Params:");
        for (key, value) in matched.params.iter() {
            println!("  {key} = {value}");
        }
    }
    if matched.is_ajax {
        println!("Ajax:   yes");
    }
    Ok(())
}

fn parse_params(pairs: &[String]) -> anyhow::Result<Params> {
    pairs
        .iter()
        .map(|pair| {
            pair.split_once('=')
                .map(|(k, v)| (k.to_string(), v.to_string()))
                .with_context(|| format!("expected key=value, got '{pair}'"))
        })
        .collect()
}

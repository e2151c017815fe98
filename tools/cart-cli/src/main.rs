//! Cart CLI - Command line client for the storefront shopping cart.
//!
//! Commands:
//! - `cart show` - Print the saved cart
//! - `cart add <ID>` - Add one unit of a product
//! - `cart remove <ID>` - Drop a product from the cart
//! - `cart set <ID> <AMOUNT>` - Set a product's quantity
//! - `cart config` - Manage configuration

mod commands;
mod config;
mod context;
mod output;

use anyhow::Result;
use cart_commerce::CartError;
use clap::{Parser, Subcommand};
use tracing_subscriber::EnvFilter;

use commands::{ConfigArgs, ProductArgs, SetArgs};

/// Cart CLI - Manage a stock-checked shopping cart
#[derive(Parser)]
#[command(name = "cart")]
#[command(author, version, about, long_about = None)]
#[command(propagate_version = true)]
struct Cli {
    /// Enable verbose output
    #[arg(short, long, global = true)]
    verbose: bool,

    /// Use JSON output format
    #[arg(long, global = true)]
    json: bool,

    /// Config file path
    #[arg(short, long, global = true)]
    config: Option<String>,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Print the saved cart
    Show,

    /// Add one unit of a product
    Add(ProductArgs),

    /// Drop a product from the cart
    Remove(ProductArgs),

    /// Set a product's quantity
    Set(SetArgs),

    /// Manage configuration
    Config(ConfigArgs),
}

fn init_tracing(verbose: bool) {
    let default_level = if verbose { "debug" } else { "warn" };
    let filter =
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(default_level));
    let _ = tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .with_target(false)
        .try_init();
}

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();
    init_tracing(cli.verbose);

    // Setup output formatting
    let output = output::Output::new(cli.verbose, cli.json);

    // Load config
    let config_path = cli.config.as_deref();
    let ctx = context::Context::load(config_path, output)?;

    // Execute command
    let result = match cli.command {
        Commands::Show => commands::cart::show(&ctx).await,
        Commands::Add(args) => commands::cart::add(args, &ctx).await,
        Commands::Remove(args) => commands::cart::remove(args, &ctx).await,
        Commands::Set(args) => commands::cart::set(args, &ctx).await,
        Commands::Config(args) => commands::config::run(args, &ctx).await,
    };

    if let Err(e) = result {
        match e.downcast_ref::<CartError>() {
            // The store's notifier already showed the notice.
            Some(cart_err) => {
                if ctx.output.is_json() {
                    ctx.output.json(&serde_json::json!({
                        "error": cart_err.notice().message(),
                        "product_id": cart_err.product_id(),
                    }));
                } else {
                    ctx.output.debug(&format!("{:#}", e));
                }
            }
            None => ctx.output.error(&format!("{:#}", e)),
        }
        std::process::exit(1);
    }

    Ok(())
}

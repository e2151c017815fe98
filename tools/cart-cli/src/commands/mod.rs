//! CLI command implementations.

pub mod cart;
pub mod config;

use cart_commerce::ProductId;
use clap::{Args, Subcommand};

/// Arguments naming a single product.
#[derive(Args)]
pub struct ProductArgs {
    /// Product id.
    pub id: ProductId,
}

/// Arguments for the set command.
#[derive(Args)]
pub struct SetArgs {
    /// Product id.
    pub id: ProductId,

    /// New quantity. Values below 1 leave the cart unchanged.
    #[arg(allow_negative_numbers = true)]
    pub amount: i64,
}

/// Arguments for the config command.
#[derive(Args)]
pub struct ConfigArgs {
    #[command(subcommand)]
    pub command: ConfigCommand,
}

#[derive(Subcommand)]
pub enum ConfigCommand {
    /// Show current configuration.
    Show,
    /// Initialize a new config file.
    Init {
        /// Force overwrite existing config.
        #[arg(short, long)]
        force: bool,
    },
}

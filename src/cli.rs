use clap::{Parser, Subcommand};
use std::path::PathBuf;

#[derive(Parser, Debug)]
#[command(author, version, about, long_about = None)]
pub struct Cli {
    /// Path to the configuration file
    #[arg(short, long)]
    pub config: Option<PathBuf>,

    /// Enable debug logging
    #[arg(short, long)]
    pub debug: bool,

    #[command(subcommand)]
    pub command: Command,
}

#[derive(Subcommand, Debug)]
pub enum Command {
    /// Quote a swap against a bonding curve
    Quote {
        /// Bonding curve contract address
        curve: String,
        /// Amount in ether units
        amount: String,
        /// Quote a sell instead of a buy
        #[arg(long)]
        sell: bool,
    },
    /// Buy tokens from a bonding curve
    Buy {
        curve: String,
        /// Native amount to spend, in ether units
        amount: String,
    },
    /// Sell tokens back to a bonding curve
    Sell {
        curve: String,
        /// Token amount to sell, in ether units
        amount: String,
    },
    /// Show sale progress and market stats for a bonding curve
    Progress { curve: String },
    /// Launch a new token through the launchpad factory
    Launch {
        name: String,
        ticker: String,
        /// Metadata URI for the new token
        #[arg(long, default_value = "")]
        token_uri: String,
        /// Initial buy amount in ether units
        #[arg(long, default_value = "0.001")]
        initial_buy: String,
    },
    /// List trending agent tokens
    Trending,
    /// Search agent tokens by name or ticker
    Search { query: String },
    /// Print chart bars for a bonding curve over a block range
    Bars {
        curve: String,
        from_block: u64,
        to_block: u64,
    },
}

use anyhow::{Context, Result};
use clap::Parser;
use log::info;

use overdive_sdk::chart::bonding_curve::BondingCurveFeed;
use overdive_sdk::chart::Datafeed;
use overdive_sdk::cli::{Cli, Command};
use overdive_sdk::config::Config;
use overdive_sdk::contract::bonding_curve::BondingCurveClient;
use overdive_sdk::contract::factory::LaunchpadFactory;
use overdive_sdk::contract::state::BondingCurveStateReader;
use overdive_sdk::contract::parse_address;
use overdive_sdk::api::PersonaClient;

const PRIVATE_KEY_ENV: &str = "OVERDIVE_PRIVATE_KEY";
const LOG_FILE_ENV: &str = "OVERDIVE_LOG_FILE";

#[tokio::main]
async fn main() -> Result<()> {
    dotenv::dotenv().ok();
    let cli = Cli::parse();

    if let Ok(log_file) = std::env::var(LOG_FILE_ENV) {
        overdive_sdk::logging::init(&log_file)
            .with_context(|| format!("Failed to open log file {}", log_file))?;
    } else if cli.debug {
        env_logger::Builder::from_default_env()
            .filter_level(log::LevelFilter::Debug)
            .init();
    } else {
        env_logger::init();
    }

    let config = match &cli.config {
        Some(path) => Config::load(path)
            .with_context(|| format!("Failed to load configuration from {:?}", path))?,
        None => {
            let mut config = Config::default();
            config.apply_env_overrides();
            config
        }
    };

    match cli.command {
        Command::Quote {
            curve,
            amount,
            sell,
        } => {
            let address = parse_address(&curve)?;
            let client = BondingCurveClient::read_only(address, &config.evm.rpc_url)?;
            let quote = client.quote_swap_amount(&amount, !sell).await?;
            println!(
                "estimated: {}  required: {}  fee: {}",
                quote.estimated_amount, quote.required_amount, quote.native_fee
            );
        }
        Command::Buy { curve, amount } => {
            let address = parse_address(&curve)?;
            let client = BondingCurveClient::with_signer(
                address,
                &config.evm.rpc_url,
                &private_key()?,
                config.evm.chain_id,
            )?;
            let receipt = client.buy_tokens(&amount).await?;
            println!("buy confirmed: {:?}", receipt.transaction_hash);
        }
        Command::Sell { curve, amount } => {
            let address = parse_address(&curve)?;
            let client = BondingCurveClient::with_signer(
                address,
                &config.evm.rpc_url,
                &private_key()?,
                config.evm.chain_id,
            )?;
            let receipt = client.sell_tokens(&amount).await?;
            println!("sell confirmed: {:?}", receipt.transaction_hash);
        }
        Command::Progress { curve } => {
            let address = parse_address(&curve)?;
            let client = BondingCurveClient::read_only(address, &config.evm.rpc_url)?;
            let reader = BondingCurveStateReader::new(client);
            let progress = reader.curve_progress().await;
            println!(
                "sold: {:.0}  progress: {:.2}%",
                progress.progress,
                progress.percent()
            );
        }
        Command::Launch {
            name,
            ticker,
            token_uri,
            initial_buy,
        } => {
            let factory_address = parse_address(&config.evm.factory_address)?;
            let factory = LaunchpadFactory::with_signer(
                factory_address,
                &config.evm.rpc_url,
                &private_key()?,
                config.evm.chain_id,
            )?;
            let created = factory
                .create_launchpad(&name, &ticker, &token_uri, &initial_buy, false)
                .await?;
            println!(
                "launched {}: curve={} token={}",
                ticker, created.bonding_curve_address, created.token_address
            );
        }
        Command::Trending => {
            let client = PersonaClient::new(&config.api.base_url);
            let trending = client.trending_tokens().await?;
            info!("Fetched {} trending tokens", trending.results.len());
            for entry in &trending.results {
                println!(
                    "{:<10} {:<24} vol24h={:?}",
                    entry.agent_token.token_ticker,
                    entry.agent_token.token_name,
                    entry.agent_token.volume_24h
                );
            }
        }
        Command::Search { query } => {
            let client = PersonaClient::new(&config.api.base_url);
            let results = client.search_agent_token(&query).await?;
            for entry in &results.results {
                println!(
                    "{:<10} {}",
                    entry.agent_token.token_ticker, entry.agent_token.token_name
                );
            }
        }
        Command::Bars {
            curve,
            from_block,
            to_block,
        } => {
            let address = parse_address(&curve)?;
            let client = BondingCurveClient::read_only(address, &config.evm.rpc_url)?;
            let feed = BondingCurveFeed::new(client, curve);
            let series = feed.get_bars(from_block, to_block).await?;
            if series.no_data {
                println!("no data for range");
            }
            for bar in &series.bars {
                println!(
                    "{} o={:.8} h={:.8} l={:.8} c={:.8} v={:.4}",
                    bar.time, bar.open, bar.high, bar.low, bar.close, bar.volume
                );
            }
        }
    }

    Ok(())
}

fn private_key() -> Result<String> {
    std::env::var(PRIVATE_KEY_ENV)
        .with_context(|| format!("{} is not set in the environment", PRIVATE_KEY_ENV))
}

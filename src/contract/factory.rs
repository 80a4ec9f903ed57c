use std::sync::Arc;

use ethers::abi::RawLog;
use ethers::contract::EthLogDecode;
use ethers::middleware::SignerMiddleware;
use ethers::providers::{Http, Provider};
use ethers::signers::{LocalWallet, Signer};
use ethers::types::{Address, H256, U256, U64};
use ethers::utils::{format_ether, parse_ether};
use log::{error, info};

use crate::contract::abi::{BondingCurveCreatedFilter, LaunchFactory};
use crate::contract::{contract_error, SignerClient};
use crate::error::{Error, Result};

/// Fixed gas limit for launchpad creation.
const CREATE_GAS_LIMIT: u64 = 3_000_000;

/// Result of a successful launchpad creation, extracted from the
/// BondingCurveCreated event in the receipt logs.
#[derive(Debug, Clone)]
pub struct LaunchpadCreated {
    pub bonding_curve_address: Address,
    pub token_address: Address,
    pub total_supply: String,
    pub sale_amount: String,
    pub end_market_cap: String,
    pub init_market_cap: String,
    pub tx_hash: H256,
}

/// One-shot client for launching a new bonding curve + token pair.
/// Creation is a state change, so this always requires a signer.
#[derive(Debug, Clone)]
pub struct LaunchpadFactory {
    contract: LaunchFactory<SignerClient>,
    client: Arc<SignerClient>,
}

impl LaunchpadFactory {
    pub fn new(address: Address, client: Arc<SignerClient>) -> Self {
        Self {
            contract: LaunchFactory::new(address, client.clone()),
            client,
        }
    }

    pub fn with_signer(
        address: Address,
        rpc_url: &str,
        private_key: &str,
        chain_id: u64,
    ) -> Result<Self> {
        let provider = Provider::<Http>::try_from(rpc_url)
            .map_err(|e| Error::ConfigError(format!("Invalid RPC url {}: {}", rpc_url, e)))?;
        let wallet = private_key
            .parse::<LocalWallet>()
            .map_err(|e| Error::ConfigError(format!("Invalid private key: {}", e)))?
            .with_chain_id(chain_id);
        Ok(Self::new(
            address,
            Arc::new(SignerMiddleware::new(provider, wallet)),
        ))
    }

    /// Launch a new curve + token. The submitted value is the initial buy
    /// plus the factory fee derived from its current rate and basis
    /// points. The new contract addresses come from the creation event;
    /// a receipt without that event is reported as an explicit error
    /// rather than returning half-empty data.
    pub async fn create_launchpad(
        &self,
        name: &str,
        symbol: &str,
        token_uri: &str,
        amount: &str,
        amount_is_out: bool,
    ) -> Result<LaunchpadCreated> {
        crate::validation::validate_ticker(symbol)?;
        crate::validation::validate_amount(amount)?;

        let initial_buy =
            parse_ether(amount).map_err(|e| Error::ParseError(format!("Invalid amount: {}", e)))?;

        let fee = self
            .contract
            .swap_fee()
            .call()
            .await
            .map_err(|e| contract_error("factory fee", e))?;
        let basis_points = self
            .contract
            .basis_points()
            .call()
            .await
            .map_err(|e| contract_error("basis points", e))?;
        if basis_points.is_zero() {
            return Err(Error::ContractError(
                "Factory reported zero basis points".to_string(),
            ));
        }

        let fee_amount = Self::fee_for(initial_buy, fee, basis_points);
        let total_amount = initial_buy + fee_amount;
        let creator = self.client.signer().address();

        info!(
            "Creating launchpad {} ({}): initial_buy={} fee={} total={}",
            name,
            symbol,
            format_ether(initial_buy),
            format_ether(fee_amount),
            format_ether(total_amount)
        );

        let token_data = (
            name.to_string(),
            symbol.to_string(),
            token_uri.to_string(),
            creator,
        );

        let call = self
            .contract
            .create_launchpad(initial_buy, amount_is_out, token_data)
            .value(total_amount)
            .gas(CREATE_GAS_LIMIT);

        let pending = call
            .send()
            .await
            .map_err(|e| contract_error("create launchpad", e))?;
        info!("Launchpad transaction sent: {:?}", pending.tx_hash());

        let receipt = pending
            .await
            .map_err(|e| Error::TransactionFailed(format!("creation confirmation: {}", e)))?
            .ok_or_else(|| {
                Error::TransactionFailed(
                    "creation transaction dropped before confirmation".to_string(),
                )
            })?;
        if receipt.status != Some(U64::from(1u64)) {
            error!(
                "Launchpad creation reverted: {:?}",
                receipt.transaction_hash
            );
            return Err(Error::TransactionFailed(format!(
                "creation reverted in tx {:?}",
                receipt.transaction_hash
            )));
        }

        let event = receipt
            .logs
            .iter()
            .find_map(|log| {
                BondingCurveCreatedFilter::decode_log(&RawLog::from(log.clone())).ok()
            })
            .ok_or_else(|| {
                Error::MissingCreationEvent(format!("{:?}", receipt.transaction_hash))
            })?;

        let created = LaunchpadCreated {
            bonding_curve_address: event.bonding_curve,
            token_address: event.token,
            total_supply: format_ether(event.total_supply),
            sale_amount: format_ether(event.sale_amount),
            end_market_cap: format_ether(event.end_market_cap),
            init_market_cap: format_ether(event.init_market_cap),
            tx_hash: receipt.transaction_hash,
        };
        info!(
            "Launchpad created: curve={:?} token={:?}",
            created.bonding_curve_address, created.token_address
        );
        Ok(created)
    }

    fn fee_for(initial_buy: U256, fee: U256, basis_points: U256) -> U256 {
        initial_buy * fee / basis_points
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn fee_uses_basis_point_arithmetic() {
        // 1% fee at 10000 basis points
        let initial = parse_ether("0.001").unwrap();
        let fee = LaunchpadFactory::fee_for(initial, U256::from(100u64), U256::from(10_000u64));
        assert_eq!(fee, parse_ether("0.00001").unwrap());
    }

    #[test]
    fn zero_fee_costs_nothing() {
        let initial = parse_ether("1").unwrap();
        let fee = LaunchpadFactory::fee_for(initial, U256::zero(), U256::from(10_000u64));
        assert_eq!(fee, U256::zero());
    }
}

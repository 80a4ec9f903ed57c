use ethers::middleware::SignerMiddleware;
use ethers::providers::{Http, Middleware, Provider};
use ethers::signers::LocalWallet;
use ethers::types::{Address, U256};
use ethers::utils::format_ether;
use serde::{Deserialize, Serialize};

use crate::error::{Error, Result};

pub mod abi;
pub mod bonding_curve;
pub mod factory;
pub mod state;

pub use abi::{
    BondingCurve, BondingCurveCreatedFilter, CurveToken, LaunchFactory, ReserveUpdateFilter,
    SwapFilter, TokenPurchaseFilter,
};
pub use bonding_curve::BondingCurveClient;
pub use factory::{LaunchpadCreated, LaunchpadFactory};
pub use state::BondingCurveStateReader;

/// Provider bound to a read-only JSON-RPC endpoint.
pub type ReadProvider = Provider<Http>;
/// Provider bound to a local wallet; required for state-changing calls.
pub type SignerClient = SignerMiddleware<Provider<Http>, LocalWallet>;

/// Deployed bonding curve addresses per network.
pub const BONDING_CURVE_ADDRESSES: [(&str, &str); 2] = [
    ("mainnet", "0xF1d9E186365ACb95249E05cc7273329135eEB039"),
    ("testnet", "0xF1d9E186365ACb95249E05cc7273329135eEB039"),
];

/// Factory deployment used when no FACTORY_ADDRESS override is present.
pub const DEFAULT_FACTORY_ADDRESS: &str = "0xd9Ebdc29deC126279A4C0b4e85A60Cd77e230fb3";

pub fn bonding_curve_address(network: &str) -> Result<Address> {
    let (_, address) = BONDING_CURVE_ADDRESSES
        .iter()
        .find(|(name, _)| *name == network)
        .ok_or_else(|| Error::ConfigError(format!("Unknown network: {}", network)))?;
    parse_address(address)
}

pub fn parse_address(address: &str) -> Result<Address> {
    address
        .parse::<Address>()
        .map_err(|e| Error::InvalidInput(format!("Invalid address {}: {}", address, e)))
}

/// Phases of the two-transaction sell path. Approval and swap are separate
/// on-chain transactions with no atomicity between them; a failure reports
/// the phase it happened in so the caller can re-invoke sell and resume
/// from the approved state.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum SellPhase {
    NeedsApproval,
    Approving,
    ReadyToSwap,
    Swapping,
    Done,
    Failed,
}

/// Decide whether a sell must approve first. Pure so the two-phase
/// behavior is checkable without a chain.
pub fn sell_plan(allowance: U256, amount: U256) -> SellPhase {
    if allowance < amount {
        SellPhase::NeedsApproval
    } else {
        SellPhase::ReadyToSwap
    }
}

/// Minimum-receive floor at 95% of the quoted output. Fixed 5% slippage
/// tolerance, floor division.
pub fn min_receive(estimated: U256) -> U256 {
    estimated * U256::from(95u64) / U256::from(100u64)
}

/// Wei to a floating point ether value, for display and bar synthesis.
pub fn wei_to_f64(value: U256) -> f64 {
    format_ether(value).parse().unwrap_or(0.0)
}

pub(crate) fn contract_error<M: Middleware>(
    context: &str,
    err: ethers::contract::ContractError<M>,
) -> Error {
    // Surface the decoded revert reason when the node returned one
    match err.decode_revert::<String>() {
        Some(reason) => Error::ContractError(format!("{}: revert: {}", context, reason)),
        None => Error::ContractError(format!("{}: {}", context, err)),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use ethers::utils::parse_ether;

    #[test]
    fn min_receive_is_exactly_95_percent_floored() {
        assert_eq!(min_receive(U256::from(100u64)), U256::from(95u64));
        assert_eq!(min_receive(U256::from(1000u64)), U256::from(950u64));
        // 99 * 95 = 9405, floor(9405 / 100) = 94
        assert_eq!(min_receive(U256::from(99u64)), U256::from(94u64));
        assert_eq!(min_receive(U256::zero()), U256::zero());
    }

    #[test]
    fn sell_plan_requires_approval_only_below_amount() {
        let amount = parse_ether("10").unwrap();
        assert_eq!(sell_plan(U256::zero(), amount), SellPhase::NeedsApproval);
        assert_eq!(
            sell_plan(parse_ether("9").unwrap(), amount),
            SellPhase::NeedsApproval
        );
        assert_eq!(sell_plan(amount, amount), SellPhase::ReadyToSwap);
        assert_eq!(
            sell_plan(parse_ether("11").unwrap(), amount),
            SellPhase::ReadyToSwap
        );
    }

    #[test]
    fn known_networks_resolve_addresses() {
        assert!(bonding_curve_address("mainnet").is_ok());
        assert!(bonding_curve_address("testnet").is_ok());
        assert!(bonding_curve_address("devnet").is_err());
    }

    #[test]
    fn wei_conversion_matches_ether_units() {
        assert_eq!(wei_to_f64(parse_ether("1.5").unwrap()), 1.5);
        assert_eq!(wei_to_f64(U256::zero()), 0.0);
    }
}

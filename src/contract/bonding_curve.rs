use std::sync::Arc;
use std::time::Duration;

use ethers::middleware::SignerMiddleware;
use ethers::providers::{Http, Middleware, Provider};
use ethers::signers::{LocalWallet, Signer};
use ethers::types::{Address, TransactionReceipt, U256, U64};
use ethers::utils::{format_ether, parse_ether};
use log::{error, info, warn};

use crate::chart::Subscription;
use crate::contract::abi::{BondingCurve, CurveToken};
use crate::contract::{contract_error, min_receive, sell_plan, wei_to_f64, SellPhase, SignerClient};
use crate::error::{Error, Result};
use crate::models::market::{PriceEvent, SwapQuote, TokenInfo};

/// Fixed gas limit for swap transactions.
const SWAP_GAS_LIMIT: u64 = 500_000;
/// Block windows for rolling statistics, assuming 3s block time.
/// These are documented approximations, not measured values.
const BLOCKS_24H: u64 = 28_800;
const BLOCKS_1H: u64 = 1_200;

/// A completed swap observed on the curve.
#[derive(Debug, Clone, Copy)]
pub struct SwapEvent {
    pub sender: Address,
    pub amount_in: f64,
    pub amount_out: f64,
    pub is_buy: bool,
}

/// Typed facade over one deployed bonding curve contract. The middleware
/// capability (read-only provider or signer) is fixed at construction;
/// state-changing operations only exist on the signer-bound variant.
#[derive(Debug)]
pub struct BondingCurveClient<M: Middleware> {
    contract: BondingCurve<M>,
    client: Arc<M>,
}

// Manual impl: `derive(Clone)` would require `M: Clone`, but both fields are
// Arc-backed and clonable for any middleware.
impl<M: Middleware> Clone for BondingCurveClient<M> {
    fn clone(&self) -> Self {
        Self {
            contract: self.contract.clone(),
            client: self.client.clone(),
        }
    }
}

impl<M: Middleware + 'static> BondingCurveClient<M> {
    pub fn new(address: Address, client: Arc<M>) -> Self {
        Self {
            contract: BondingCurve::new(address, client.clone()),
            client,
        }
    }

    pub fn address(&self) -> Address {
        self.contract.address()
    }

    pub async fn token_info(&self) -> Result<TokenInfo> {
        let (token, reserve_token, reserve_native) = self
            .contract
            .token_info()
            .call()
            .await
            .map_err(|e| contract_error("token info", e))?;

        Ok(TokenInfo {
            token_address: format!("{:?}", token),
            reserve_token: format_ether(reserve_token),
            reserve_native: format_ether(reserve_native),
        })
    }

    /// Quote a swap of `amount` (decimal ether string) in the given
    /// direction. Pure read; the quote is stale as soon as any trade lands.
    pub async fn quote_swap_amount(&self, amount: &str, is_buy: bool) -> Result<SwapQuote> {
        let amount_wei = parse_amount(amount)?;
        let (estimated, required, native_fee) = self
            .contract
            .quote_amount_out(amount_wei, is_buy)
            .call()
            .await
            .map_err(|e| contract_error("quote", e))?;

        Ok(SwapQuote {
            estimated_amount: format_ether(estimated),
            required_amount: format_ether(required),
            native_fee: format_ether(native_fee),
        })
    }

    /// Price of a single token, derived from a one-token buy quote.
    pub async fn current_price(&self) -> Result<f64> {
        let one_token = parse_ether("1").map_err(|e| Error::ParseError(e.to_string()))?;
        let (_, required, _) = self
            .contract
            .quote_amount_out(one_token, true)
            .call()
            .await
            .map_err(|e| contract_error("price", e))?;
        Ok(wei_to_f64(required))
    }

    /// Completed swaps in a block window.
    pub async fn swap_events(&self, from_block: u64, to_block: u64) -> Result<Vec<SwapEvent>> {
        let events = self
            .contract
            .swap_filter()
            .from_block(from_block)
            .to_block(to_block)
            .query()
            .await
            .map_err(|e| contract_error("swap events", e))?;

        Ok(events
            .into_iter()
            .map(|ev| SwapEvent {
                sender: ev.sender,
                amount_in: wei_to_f64(ev.amount_in),
                amount_out: wei_to_f64(ev.amount_out),
                is_buy: ev.is_buy,
            })
            .collect())
    }

    /// Sum of Swap amountIn over roughly the last 24 hours of blocks.
    pub async fn volume_24h(&self) -> Result<String> {
        let head = self.block_number().await?;
        let from = head.saturating_sub(BLOCKS_24H);

        let events = self
            .contract
            .swap_filter()
            .from_block(from)
            .to_block(head)
            .query()
            .await
            .map_err(|e| contract_error("volume window", e))?;

        let volume = events
            .iter()
            .fold(U256::zero(), |acc, ev| acc + ev.amount_in);
        Ok(format_ether(volume))
    }

    /// Percent price change over roughly the last hour, comparing the
    /// current quote against the reserve ratio recorded an hour of blocks
    /// ago. Returns 0.0 when no reference event exists or the read fails;
    /// a chart header showing no change beats an error panel here.
    pub async fn price_change_1h(&self) -> f64 {
        match self.price_change_1h_inner().await {
            Ok(change) => change,
            Err(e) => {
                warn!("Price change lookup failed, defaulting to 0%: {}", e);
                0.0
            }
        }
    }

    async fn price_change_1h_inner(&self) -> Result<f64> {
        let head = self.block_number().await?;
        let past = head.saturating_sub(BLOCKS_1H);

        let current_price = self.current_price().await?;

        let events = self
            .contract
            .reserve_update_filter()
            .from_block(past)
            .to_block(past + 1)
            .query()
            .await
            .map_err(|e| contract_error("reserve history", e))?;

        let reference = match events.first() {
            Some(ev) => ev,
            None => return Ok(0.0),
        };
        if reference.reserve_token.is_zero() {
            return Ok(0.0);
        }

        let past_price = wei_to_f64(reference.reserve_native) / wei_to_f64(reference.reserve_token);
        if past_price == 0.0 {
            return Ok(0.0);
        }

        let change = (current_price - past_price) / past_price * 100.0;
        Ok((change * 100.0).round() / 100.0)
    }

    /// Purchase events in a block window, for bar synthesis.
    pub async fn purchase_events(&self, from_block: u64, to_block: u64) -> Result<Vec<PriceEvent>> {
        let events = self
            .contract
            .token_purchase_filter()
            .from_block(from_block)
            .to_block(to_block)
            .query()
            .await
            .map_err(|e| contract_error("purchase events", e))?;

        Ok(events
            .into_iter()
            .map(|ev| PriceEvent {
                timestamp: ev.timestamp.as_u64() as i64 * 1000,
                price: wei_to_f64(ev.price),
                amount: wei_to_f64(ev.amount),
            })
            .collect())
    }

    /// Poll for new Swap events and invoke the handler for each. The
    /// returned handle owns the poll task; dropping or cancelling it stops
    /// the watch.
    pub fn watch_swaps<F>(&self, poll_interval: Duration, on_swap: F) -> Subscription
    where
        F: Fn(SwapEvent) + Send + Sync + 'static,
    {
        let contract = self.contract.clone();
        let client = self.client.clone();

        let handle = tokio::spawn(async move {
            let mut last_block = match client.get_block_number().await {
                Ok(block) => block.as_u64(),
                Err(e) => {
                    error!("Swap watch could not read head block: {}", e);
                    return;
                }
            };
            let mut ticker = tokio::time::interval(poll_interval);
            ticker.tick().await;

            loop {
                ticker.tick().await;
                let head = match client.get_block_number().await {
                    Ok(block) => block.as_u64(),
                    Err(e) => {
                        warn!("Swap watch block read failed: {}", e);
                        continue;
                    }
                };
                if head <= last_block {
                    continue;
                }

                match contract
                    .swap_filter()
                    .from_block(last_block + 1)
                    .to_block(head)
                    .query()
                    .await
                {
                    Ok(events) => {
                        for ev in events {
                            on_swap(SwapEvent {
                                sender: ev.sender,
                                amount_in: wei_to_f64(ev.amount_in),
                                amount_out: wei_to_f64(ev.amount_out),
                                is_buy: ev.is_buy,
                            });
                        }
                        last_block = head;
                    }
                    Err(e) => warn!("Swap watch query failed: {}", e),
                }
            }
        });

        Subscription::new(handle)
    }

    pub(crate) fn middleware(&self) -> Arc<M> {
        self.client.clone()
    }

    async fn block_number(&self) -> Result<u64> {
        let head = self
            .client
            .get_block_number()
            .await
            .map_err(|e| Error::ContractError(format!("block number: {}", e)))?;
        Ok(head.as_u64())
    }
}

impl BondingCurveClient<Provider<Http>> {
    /// Read-only client; quoting and event queries only.
    pub fn read_only(address: Address, rpc_url: &str) -> Result<Self> {
        let provider = Provider::<Http>::try_from(rpc_url)
            .map_err(|e| Error::ConfigError(format!("Invalid RPC url {}: {}", rpc_url, e)))?;
        Ok(Self::new(address, Arc::new(provider)))
    }
}

impl BondingCurveClient<SignerClient> {
    /// Signing client; enables buys, sells and approvals.
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

    fn signer_address(&self) -> Address {
        self.client.signer().address()
    }

    /// Buy tokens with `amount` ether of native currency. Fails fast when
    /// trading is not yet enabled. The submitted value covers the quoted
    /// cost plus protocol fee; output is floored at 95% of the quote.
    pub async fn buy_tokens(&self, amount: &str) -> Result<TransactionReceipt> {
        let amount_wei = parse_amount(amount)?;

        let enabled = self
            .contract
            .trading_enabled()
            .call()
            .await
            .map_err(|e| contract_error("trading status", e))?;
        if !enabled {
            return Err(Error::TradingDisabled);
        }

        let (estimated, required, native_fee) = self
            .contract
            .quote_amount_out(amount_wei, true)
            .call()
            .await
            .map_err(|e| contract_error("buy quote", e))?;
        let total_needed = required + native_fee;

        info!(
            "Buying: in={} required={} fee={} total={}",
            format_ether(amount_wei),
            format_ether(required),
            format_ether(native_fee),
            format_ether(total_needed)
        );

        let receipt = self
            .submit_swap(amount_wei, min_receive(estimated), true, total_needed)
            .await?;
        info!("Buy confirmed: {:?}", receipt.transaction_hash);
        Ok(receipt)
    }

    /// Sell `amount` tokens back to the curve. When the curve's allowance
    /// is insufficient this first submits an approval transaction, then
    /// the swap; the two are not atomic, and errors carry the phase they
    /// interrupted so a retry resumes instead of starting over blind.
    pub async fn sell_tokens(&self, amount: &str) -> Result<TransactionReceipt> {
        let amount_wei = parse_amount(amount)?;
        let seller = self.signer_address();

        let (token_address, _, _) = self
            .contract
            .token_info()
            .call()
            .await
            .map_err(|e| contract_error("token info", e))?;
        let token = CurveToken::new(token_address, self.client.clone());

        let allowance = token
            .allowance(seller, self.contract.address())
            .call()
            .await
            .map_err(|e| contract_error("allowance", e))?;

        if sell_plan(allowance, amount_wei) == SellPhase::NeedsApproval {
            info!(
                "Allowance {} below sell amount {}, approving first",
                format_ether(allowance),
                format_ether(amount_wei)
            );
            self.approve_tokens(amount)
                .await
                .map_err(|e| Error::SellInterrupted {
                    phase: SellPhase::Approving,
                    reason: e.to_string(),
                })?;
        }

        let (estimated, required, native_fee) = self
            .contract
            .quote_amount_out(amount_wei, false)
            .call()
            .await
            .map_err(|e| Error::SellInterrupted {
                phase: SellPhase::ReadyToSwap,
                reason: contract_error("sell quote", e).to_string(),
            })?;

        info!(
            "Selling: amount={} estimated={} required={} fee={}",
            format_ether(amount_wei),
            format_ether(estimated),
            format_ether(required),
            format_ether(native_fee)
        );

        let receipt = self
            .submit_swap(amount_wei, min_receive(estimated), false, U256::zero())
            .await
            .map_err(|e| Error::SellInterrupted {
                phase: SellPhase::Swapping,
                reason: e.to_string(),
            })?;
        info!("Sell confirmed: {:?}", receipt.transaction_hash);
        Ok(receipt)
    }

    /// Approve the curve to spend `amount` of the curve token.
    pub async fn approve_tokens(&self, amount: &str) -> Result<TransactionReceipt> {
        let amount_wei = parse_amount(amount)?;

        let (token_address, _, _) = self
            .contract
            .token_info()
            .call()
            .await
            .map_err(|e| contract_error("token info", e))?;
        let token = CurveToken::new(token_address, self.client.clone());

        info!(
            "Approving {} for spender {:?} on token {:?}",
            format_ether(amount_wei),
            self.contract.address(),
            token_address
        );

        let call = token.approve(self.contract.address(), amount_wei);
        let pending = call
            .send()
            .await
            .map_err(|e| contract_error("approve", e))?;
        let receipt = pending
            .await
            .map_err(|e| Error::TransactionFailed(format!("approve confirmation: {}", e)))?
            .ok_or_else(|| {
                Error::TransactionFailed("approve transaction dropped before confirmation".into())
            })?;
        check_receipt_status(&receipt, "approve")?;
        info!("Approve confirmed: {:?}", receipt.transaction_hash);
        Ok(receipt)
    }

    async fn submit_swap(
        &self,
        amount_in: U256,
        min_out: U256,
        is_buy: bool,
        value: U256,
    ) -> Result<TransactionReceipt> {
        let recipient = self.signer_address();
        let call = self
            .contract
            .swap_exact_in(amount_in, min_out, is_buy, recipient)
            .value(value)
            .gas(SWAP_GAS_LIMIT);

        let pending = call
            .send()
            .await
            .map_err(|e| contract_error("swap", e))?;
        info!("Swap transaction sent: {:?}", pending.tx_hash());

        let receipt = pending
            .await
            .map_err(|e| Error::TransactionFailed(format!("swap confirmation: {}", e)))?
            .ok_or_else(|| {
                Error::TransactionFailed("swap transaction dropped before confirmation".into())
            })?;
        check_receipt_status(&receipt, "swap")?;
        Ok(receipt)
    }
}

fn parse_amount(amount: &str) -> Result<U256> {
    crate::validation::validate_amount(amount)?;
    parse_ether(amount).map_err(|e| Error::ParseError(format!("Invalid amount {}: {}", amount, e)))
}

fn check_receipt_status(receipt: &TransactionReceipt, context: &str) -> Result<()> {
    if receipt.status != Some(U64::from(1u64)) {
        error!(
            "{} transaction reverted: {:?}",
            context, receipt.transaction_hash
        );
        return Err(Error::TransactionFailed(format!(
            "{} reverted in tx {:?}",
            context, receipt.transaction_hash
        )));
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn amounts_are_validated_before_parsing() {
        assert!(parse_amount("1.5").is_ok());
        assert!(matches!(
            parse_amount("0"),
            Err(Error::ValidationError(_))
        ));
        assert!(matches!(
            parse_amount("-2"),
            Err(Error::ValidationError(_))
        ));
        assert!(parse_amount("not a number").is_err());
    }

    #[test]
    fn parsed_amounts_use_ether_units() {
        assert_eq!(parse_amount("1").unwrap(), parse_ether("1").unwrap());
        assert_eq!(
            parse_amount("0.001").unwrap(),
            parse_ether("0.001").unwrap()
        );
    }
}

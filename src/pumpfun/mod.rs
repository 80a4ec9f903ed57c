use std::str::FromStr;
use std::sync::Arc;

use log::{error, info, warn};
use reqwest::multipart::{Form, Part};
use reqwest::Client;
use serde::Deserialize;
use serde_json::json;
use solana_client::nonblocking::rpc_client::RpcClient;
use solana_sdk::pubkey::Pubkey;
use solana_sdk::signature::Keypair;
use solana_sdk::signer::Signer;
use solana_sdk::transaction::VersionedTransaction;
use spl_associated_token_account::get_associated_token_address;

use crate::config::PumpFunConfig;
use crate::error::{Error, Result};
use crate::models::market::TradeSide;

/// Assumed cap when the mint account does not report one.
const DEFAULT_MAX_SUPPLY: u64 = 800_000_000;
const DEFAULT_DECIMALS: u8 = 9;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Pool {
    Pump,
    Raydium,
}

impl Pool {
    pub fn as_str(&self) -> &'static str {
        match self {
            Pool::Pump => "pump",
            Pool::Raydium => "raydium",
        }
    }
}

#[derive(Debug, Clone)]
pub struct TradeOptions {
    pub denominated_in_sol: bool,
    pub slippage: f64,
    pub priority_fee: f64,
    pub pool: Pool,
}

impl Default for TradeOptions {
    fn default() -> Self {
        Self {
            denominated_in_sol: true,
            slippage: 5.0,
            priority_fee: 0.00001,
            pool: Pool::Pump,
        }
    }
}

#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct TradeQuote {
    pub estimated_amount: f64,
    pub price_impact: f64,
    pub fee: f64,
}

#[derive(Debug, Clone, Default)]
pub struct LaunchOptions {
    pub twitter: Option<String>,
    pub telegram: Option<String>,
    pub website: Option<String>,
    pub initial_liquidity_sol: f64,
    pub slippage_bps: u16,
    pub priority_fee: f64,
}

#[derive(Debug, Clone, Default)]
pub struct BundleLaunchOptions {
    pub twitter: Option<String>,
    pub telegram: Option<String>,
    pub website: Option<String>,
    pub initial_amount: f64,
    pub buy_amount: f64,
    pub slippage: f64,
    pub priority_fee: f64,
}

#[derive(Debug, Clone)]
pub struct LaunchResult {
    pub mint: String,
    pub signature: String,
}

#[derive(Debug, Clone)]
pub struct BundleLaunchResult {
    pub mint: String,
    pub signatures: Vec<String>,
}

#[derive(Debug, Clone, Copy)]
pub struct TokenSupply {
    pub current_supply: u64,
    pub max_supply: u64,
    pub decimals: u8,
}

#[derive(Debug, Deserialize)]
struct BalanceResponse {
    balance: f64,
}

#[derive(Debug, Deserialize)]
struct IpfsMetadata {
    name: String,
    symbol: String,
}

#[derive(Debug, Deserialize)]
struct IpfsResponse {
    #[serde(rename = "metadataUri")]
    metadata_uri: Option<String>,
    #[serde(default)]
    metadata: Option<IpfsMetadata>,
}

/// Client for the pump.fun trading API with local Solana transaction
/// signing. Launches are multi-step sequences of dependent round-trips
/// with no compensating action on partial failure; nothing is retried.
pub struct PumpFunClient {
    http: Client,
    rpc: Arc<RpcClient>,
    portal_url: String,
    ipfs_url: String,
    jito_url: String,
}

impl PumpFunClient {
    pub fn new(rpc_url: &str, config: &PumpFunConfig) -> Self {
        Self {
            http: Client::new(),
            rpc: Arc::new(RpcClient::new(rpc_url.to_string())),
            portal_url: config.portal_url.clone(),
            ipfs_url: config.ipfs_url.clone(),
            jito_url: config.jito_url.clone(),
        }
    }

    pub async fn get_trade_quote(
        &self,
        mint: &str,
        side: TradeSide,
        amount: f64,
        denominated_in_sol: bool,
    ) -> Result<TradeQuote> {
        crate::validation::validate_amount(&amount.to_string())?;
        let response = self
            .http
            .post(format!("{}/api/quote", self.portal_url))
            .json(&json!({
                "mint": mint,
                "action": side.as_str(),
                "amount": amount,
                "denominatedInSol": denominated_in_sol,
            }))
            .send()
            .await?;

        if !response.status().is_success() {
            return Err(Error::ApiError(format!(
                "Failed to get quote: {}",
                response.status()
            )));
        }
        Ok(response.json::<TradeQuote>().await?)
    }

    /// Request an unsigned trade transaction for the given wallet.
    pub async fn create_trade_transaction(
        &self,
        public_key: &str,
        mint: &str,
        side: TradeSide,
        amount: f64,
        options: &TradeOptions,
    ) -> Result<VersionedTransaction> {
        crate::validation::validate_solana_pubkey(public_key)?;
        let response = self
            .http
            .post(format!("{}/api/trade-local", self.portal_url))
            .json(&json!({
                "publicKey": public_key,
                "action": side.as_str(),
                "mint": mint,
                "denominatedInSol": options.denominated_in_sol,
                "amount": amount,
                "slippage": options.slippage,
                "priorityFee": options.priority_fee,
                "pool": options.pool.as_str(),
            }))
            .send()
            .await?;

        if !response.status().is_success() {
            return Err(Error::ApiError(format!(
                "Failed to create transaction: {}",
                response.status()
            )));
        }

        let bytes = response.bytes().await?;
        let transaction: VersionedTransaction = bincode::deserialize(&bytes)?;
        Ok(transaction)
    }

    pub async fn get_token_balance(&self, mint: &str, public_key: &str) -> Result<f64> {
        crate::validation::validate_solana_pubkey(mint)?;
        crate::validation::validate_solana_pubkey(public_key)?;
        let response = self
            .http
            .get(format!(
                "{}/api/balance/{}/{}",
                self.portal_url, mint, public_key
            ))
            .send()
            .await?;

        if !response.status().is_success() {
            return Err(Error::ApiError(format!(
                "Failed to get balance: {}",
                response.status()
            )));
        }
        Ok(response.json::<BalanceResponse>().await?.balance)
    }

    /// Mint supply as reported by the chain. Falls back to assumed
    /// defaults when the account cannot be read, so token info panels
    /// degrade instead of failing.
    pub async fn token_supply(&self, mint: &str) -> TokenSupply {
        let fallback = TokenSupply {
            current_supply: 0,
            max_supply: DEFAULT_MAX_SUPPLY,
            decimals: DEFAULT_DECIMALS,
        };

        let mint_pubkey = match Pubkey::from_str(mint) {
            Ok(pubkey) => pubkey,
            Err(e) => {
                warn!("Invalid mint address {}: {}", mint, e);
                return fallback;
            }
        };

        match self.rpc.get_token_supply(&mint_pubkey).await {
            Ok(supply) => TokenSupply {
                current_supply: supply.amount.parse().unwrap_or(0),
                max_supply: DEFAULT_MAX_SUPPLY,
                decimals: supply.decimals,
            },
            Err(e) => {
                warn!("Token supply read failed for {}: {}", mint, e);
                fallback
            }
        }
    }

    /// SPL token balance of a wallet through its associated token
    /// account. A missing account means a zero balance, not an error.
    pub async fn wallet_token_balance(&self, owner: &str, mint: &str) -> Result<u64> {
        let owner_pubkey = Pubkey::from_str(owner)
            .map_err(|e| Error::InvalidInput(format!("Invalid owner address {}: {}", owner, e)))?;
        let mint_pubkey = Pubkey::from_str(mint)
            .map_err(|e| Error::InvalidInput(format!("Invalid mint address {}: {}", mint, e)))?;

        let ata = get_associated_token_address(&owner_pubkey, &mint_pubkey);
        match self.rpc.get_token_account_balance(&ata).await {
            Ok(amount) => amount
                .amount
                .parse::<u64>()
                .map_err(|_| Error::SolanaRpcError("Unparseable token balance".to_string())),
            Err(e) => {
                let message = e.to_string();
                if message.contains("AccountNotFound") || message.contains("could not find account")
                {
                    info!("Token account {} not found, assuming zero balance", ata);
                    Ok(0)
                } else {
                    Err(Error::SolanaRpcError(format!(
                        "Failed to get token balance for {}: {}",
                        ata, e
                    )))
                }
            }
        }
    }

    pub async fn send_transaction(&self, transaction: &VersionedTransaction) -> Result<String> {
        let signature = self
            .rpc
            .send_transaction(transaction)
            .await
            .map_err(|e| Error::SolanaRpcError(format!("Failed to send transaction: {}", e)))?;
        self.rpc
            .confirm_transaction(&signature)
            .await
            .map_err(|e| Error::SolanaRpcError(format!("Failed to confirm transaction: {}", e)))?;
        Ok(signature.to_string())
    }

    /// Launch a new token: upload metadata to IPFS, request the create
    /// transaction, sign it with a fresh mint keypair and submit it.
    pub async fn launch_token(
        &self,
        public_key: &str,
        name: &str,
        ticker: &str,
        description: &str,
        profile_image_url: Option<&str>,
        options: &LaunchOptions,
    ) -> Result<LaunchResult> {
        crate::validation::validate_ticker(ticker)?;
        crate::validation::validate_solana_pubkey(public_key)?;

        let ipfs = self
            .upload_metadata(name, ticker, description, profile_image_url, 
                options.twitter.as_deref(),
                options.telegram.as_deref(),
                options.website.as_deref(),
            )
            .await?;
        let metadata_uri = ipfs.metadata_uri.clone().ok_or_else(|| {
            Error::ApiInvalidData("IPFS response is missing the metadata URI".to_string())
        })?;

        let (metadata_name, metadata_symbol) = match &ipfs.metadata {
            Some(metadata) => (metadata.name.clone(), metadata.symbol.clone()),
            None => (name.to_string(), ticker.to_string()),
        };

        let mint_keypair = Keypair::new();
        let mint = mint_keypair.pubkey().to_string();
        info!("Launching token {} with mint {}", ticker, mint);

        let response = self
            .http
            .post(format!("{}/api/trade-local", self.portal_url))
            .json(&json!({
                "publicKey": public_key,
                "action": "create",
                "tokenMetadata": {
                    "name": metadata_name,
                    "symbol": metadata_symbol,
                    "uri": metadata_uri,
                },
                "mint": mint,
                "denominatedInSol": true,
                "amount": options.initial_liquidity_sol,
                "slippage": options.slippage_bps as f64 / 100.0,
                "priorityFee": options.priority_fee,
                "pool": "pump",
            }))
            .send()
            .await?;

        if !response.status().is_success() {
            return Err(Error::ApiError(format!(
                "Failed to create token: {}",
                response.status()
            )));
        }

        let bytes = response.bytes().await?;
        let mut transaction: VersionedTransaction = bincode::deserialize(&bytes)?;
        sign_with_keypair(&mut transaction, &mint_keypair)?;

        let signature = self.send_transaction(&transaction).await?;
        info!("Token {} launched: {}", mint, signature);
        Ok(LaunchResult { mint, signature })
    }

    /// Launch plus an immediate follow-up buy as a Jito bundle, shielding
    /// the pair from MEV. The first signer creates, the second buys.
    pub async fn launch_token_bundle(
        &self,
        signer_public_keys: &[String],
        name: &str,
        ticker: &str,
        description: &str,
        profile_image_url: Option<&str>,
        options: &BundleLaunchOptions,
    ) -> Result<BundleLaunchResult> {
        crate::validation::validate_ticker(ticker)?;
        if signer_public_keys.len() < 2 {
            return Err(Error::ValidationError(
                "Bundle launch requires a creator and a buyer key".to_string(),
            ));
        }

        let ipfs = self
            .upload_metadata(name, ticker, description, profile_image_url,
                options.twitter.as_deref(),
                options.telegram.as_deref(),
                options.website.as_deref(),
            )
            .await?;
        let metadata_uri = ipfs.metadata_uri.ok_or_else(|| {
            Error::ApiInvalidData("IPFS response is missing the metadata URI".to_string())
        })?;

        let mint_keypair = Keypair::new();
        let mint = mint_keypair.pubkey().to_string();

        let bundled_args = json!([
            {
                "publicKey": signer_public_keys[0],
                "action": "create",
                "tokenMetadata": {
                    "name": name,
                    "symbol": ticker,
                    "uri": metadata_uri,
                },
                "mint": mint,
                "denominatedInSol": false,
                "amount": options.initial_amount,
                "slippage": options.slippage,
                "priorityFee": options.priority_fee,
                "pool": "pump",
            },
            {
                "publicKey": signer_public_keys[1],
                "action": "buy",
                "mint": mint,
                "denominatedInSol": false,
                "amount": options.buy_amount,
                "slippage": options.slippage,
                "priorityFee": options.priority_fee / 2.0,
                "pool": "pump",
            }
        ]);

        let response = self
            .http
            .post(format!("{}/api/trade-local", self.portal_url))
            .json(&bundled_args)
            .send()
            .await?;
        if !response.status().is_success() {
            return Err(Error::ApiError(format!(
                "Failed to create bundle: {}",
                response.status()
            )));
        }
        let encoded: Vec<String> = response.json().await?;

        let mut signed_transactions = Vec::with_capacity(encoded.len());
        let mut signatures = Vec::with_capacity(encoded.len());
        for (index, encoded_tx) in encoded.iter().enumerate() {
            let bytes = bs58::decode(encoded_tx).into_vec()?;
            let mut transaction: VersionedTransaction = bincode::deserialize(&bytes)?;
            // Only the create transaction needs the mint signature
            if index == 0 {
                sign_with_keypair(&mut transaction, &mint_keypair)?;
            }
            let serialized = bincode::serialize(&transaction)?;
            signed_transactions.push(bs58::encode(serialized).into_string());
            let first = transaction.signatures.first().ok_or_else(|| {
                Error::ApiInvalidData("Bundle transaction carries no signatures".to_string())
            })?;
            signatures.push(bs58::encode(first.as_ref()).into_string());
        }

        self.send_jito_bundle(&signed_transactions).await?;
        info!("Bundle for mint {} submitted to Jito", mint);
        Ok(BundleLaunchResult { mint, signatures })
    }

    async fn send_jito_bundle(&self, transactions: &[String]) -> Result<()> {
        let response = self
            .http
            .post(&self.jito_url)
            .json(&json!({
                "jsonrpc": "2.0",
                "id": 1,
                "method": "sendBundle",
                "params": [transactions],
            }))
            .send()
            .await?;
        if !response.status().is_success() {
            error!("Jito bundle submission failed: {}", response.status());
            return Err(Error::ApiError(format!(
                "Bundle submission failed: {}",
                response.status()
            )));
        }
        Ok(())
    }

    async fn upload_metadata(
        &self,
        name: &str,
        ticker: &str,
        description: &str,
        profile_image_url: Option<&str>,
        twitter: Option<&str>,
        telegram: Option<&str>,
        website: Option<&str>,
    ) -> Result<IpfsResponse> {
        let mut form = Form::new()
            .text("name", name.to_string())
            .text("symbol", ticker.to_string())
            .text("description", description.to_string())
            .text("twitter", twitter.unwrap_or_default().to_string())
            .text("telegram", telegram.unwrap_or_default().to_string())
            .text("website", website.unwrap_or_default().to_string())
            .text("showName", "true");

        if let Some(url) = profile_image_url {
            info!("Fetching profile image from {}", url);
            let image_response = self.http.get(url).send().await?;
            if !image_response.status().is_success() {
                return Err(Error::ApiError(format!(
                    "Profile image fetch failed: {}",
                    image_response.status()
                )));
            }
            let bytes = image_response.bytes().await?;
            form = form.part("file", Part::bytes(bytes.to_vec()).file_name("image.png"));
        }

        let response = self.http.post(&self.ipfs_url).multipart(form).send().await?;
        if !response.status().is_success() {
            error!(
                "IPFS metadata upload failed for {}: {}",
                ticker,
                response.status()
            );
            return Err(Error::ApiError(format!(
                "Metadata upload failed: {}",
                response.status()
            )));
        }

        let ipfs = response.json::<IpfsResponse>().await.map_err(|e| {
            Error::ApiInvalidFormat(format!("Malformed IPFS response: {}", e))
        })?;
        Ok(ipfs)
    }
}

/// Place the keypair's signature into the transaction's signature slot.
/// The transaction arrives with placeholder signatures; other required
/// signers (the user's wallet) sign elsewhere.
fn sign_with_keypair(transaction: &mut VersionedTransaction, keypair: &Keypair) -> Result<()> {
    let message_bytes = transaction.message.serialize();
    let position = transaction
        .message
        .static_account_keys()
        .iter()
        .position(|key| *key == keypair.pubkey())
        .ok_or_else(|| {
            Error::InvalidInput("Keypair is not a required signer of this transaction".to_string())
        })?;
    if position >= transaction.signatures.len() {
        return Err(Error::InvalidInput(
            "Keypair is not within the transaction's signer section".to_string(),
        ));
    }
    transaction.signatures[position] = keypair.sign_message(&message_bytes);
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use solana_sdk::message::{v0, VersionedMessage};

    #[test]
    fn trade_quote_parses_camel_case() {
        let body = r#"{"estimatedAmount": 12.5, "priceImpact": 0.8, "fee": 0.01}"#;
        let quote: TradeQuote = serde_json::from_str(body).unwrap();
        assert_eq!(quote.estimated_amount, 12.5);
        assert_eq!(quote.price_impact, 0.8);
        assert_eq!(quote.fee, 0.01);
    }

    #[test]
    fn default_trade_options_match_platform_defaults() {
        let options = TradeOptions::default();
        assert!(options.denominated_in_sol);
        assert_eq!(options.slippage, 5.0);
        assert_eq!(options.priority_fee, 0.00001);
        assert_eq!(options.pool, Pool::Pump);
    }

    #[test]
    fn pool_names_match_api_values() {
        assert_eq!(Pool::Pump.as_str(), "pump");
        assert_eq!(Pool::Raydium.as_str(), "raydium");
    }

    #[tokio::test]
    async fn balance_rejects_malformed_keys_before_any_request() {
        let config = PumpFunConfig {
            portal_url: "http://localhost:1".to_string(),
            ipfs_url: "http://localhost:1".to_string(),
            jito_url: "http://localhost:1".to_string(),
        };
        let client = PumpFunClient::new("http://localhost:1", &config);

        let result = client.get_token_balance("not-base58!!", "also-bad!!").await;
        assert!(matches!(result, Err(Error::ValidationError(_))));
    }

    #[test]
    fn signing_requires_the_keypair_in_the_signer_section() {
        let payer = Keypair::new();
        let outsider = Keypair::new();
        let message = v0::Message {
            header: solana_sdk::message::MessageHeader {
                num_required_signatures: 1,
                num_readonly_signed_accounts: 0,
                num_readonly_unsigned_accounts: 0,
            },
            account_keys: vec![payer.pubkey()],
            ..v0::Message::default()
        };
        let mut transaction = VersionedTransaction {
            signatures: vec![solana_sdk::signature::Signature::default()],
            message: VersionedMessage::V0(message),
        };

        assert!(sign_with_keypair(&mut transaction, &outsider).is_err());
        assert!(sign_with_keypair(&mut transaction, &payer).is_ok());
        assert_ne!(
            transaction.signatures[0],
            solana_sdk::signature::Signature::default()
        );
    }
}

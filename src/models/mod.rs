use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

pub mod market;

/// Persona record as returned by the platform backend.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Persona {
    #[serde(default)]
    pub id: Option<i64>,
    pub name: String,
    #[serde(default)]
    pub personaname: Option<String>,
    #[serde(default)]
    pub description: Option<String>,
    #[serde(default)]
    pub profile_image: Option<String>,
    #[serde(default)]
    pub cover_image: Option<String>,
    #[serde(default)]
    pub created_at: Option<DateTime<Utc>>,
}

/// Token half of an agent persona record.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AgentToken {
    pub token_name: String,
    pub token_ticker: String,
    #[serde(default)]
    pub contract_address: Option<String>,
    #[serde(default)]
    pub bonding_curve_address: Option<String>,
    #[serde(default)]
    pub max_supply: Option<String>,
    #[serde(default)]
    pub mainnet: Option<String>,
    #[serde(default)]
    pub twitter_link: Option<String>,
    #[serde(default)]
    pub website_link: Option<String>,
    #[serde(default)]
    pub discord_link: Option<String>,
    #[serde(default)]
    pub telegram_link: Option<String>,
    #[serde(default)]
    pub overdive_link: Option<String>,
    // Enrichment present on trending listings only
    #[serde(default)]
    pub price: Option<f64>,
    #[serde(default)]
    pub volume_24h: Option<f64>,
    #[serde(default)]
    pub trades_count: Option<u64>,
    #[serde(default)]
    pub unique_traders: Option<u64>,
    #[serde(default)]
    pub holders_count: Option<u64>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AgentPersona {
    pub persona: Persona,
    pub agent_token: AgentToken,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AgentPersonaList {
    pub count: i64,
    pub results: Vec<AgentPersona>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TrendingToken {
    pub persona: Persona,
    pub agent_token: AgentToken,
    #[serde(default)]
    pub detailed_info: Option<serde_json::Value>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TrendingTokens {
    pub count: i64,
    pub results: Vec<TrendingToken>,
    #[serde(default)]
    pub has_transactions: bool,
    #[serde(default)]
    pub timestamp: Option<String>,
}

/// Utilities an agent token can unlock for its holders.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Utility {
    Twitter,
    Discord,
    Telegram,
    Overdive,
}

/// Image payload attached to a persona creation request.
#[derive(Debug, Clone)]
pub struct ImageFile {
    pub file_name: String,
    pub bytes: Vec<u8>,
}

/// Input for creating a new agent persona with its token.
#[derive(Debug, Clone, Default)]
pub struct NewAgentPersona {
    pub name: String,
    pub ticker: String,
    pub description: Option<String>,
    pub personality: Option<String>,
    pub manner: Option<String>,
    pub contract_address: Option<String>,
    pub bonding_curve_address: Option<String>,
    pub utilities: Vec<Utility>,
    pub twitter: Option<String>,
    pub website: Option<String>,
    pub discord: Option<String>,
    pub telegram: Option<String>,
    pub overdive: Option<String>,
    pub profile_image: Option<ImageFile>,
    pub cover_image: Option<ImageFile>,
}

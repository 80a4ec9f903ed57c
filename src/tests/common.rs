use crate::config::Config;
use crate::models::market::PriceEvent;
use crate::models::{ImageFile, NewAgentPersona, Utility};

// Helper to create a default test config
pub fn create_test_config() -> Config {
    let mut config = Config::default();
    config.api.base_url = "http://localhost:8000".to_string();
    config.evm.rpc_url = "http://localhost:8545".to_string();
    config.solana.rpc_url = "http://localhost:8899".to_string();
    config
}

// Three buys with rising prices, deliberately out of order
pub fn sample_price_events() -> Vec<PriceEvent> {
    vec![
        PriceEvent {
            timestamp: 1_700_000_120_000,
            price: 0.00032,
            amount: 250.0,
        },
        PriceEvent {
            timestamp: 1_700_000_000_000,
            price: 0.00030,
            amount: 100.0,
        },
        PriceEvent {
            timestamp: 1_700_000_060_000,
            price: 0.00031,
            amount: 40.0,
        },
    ]
}

pub fn sample_new_persona() -> NewAgentPersona {
    NewAgentPersona {
        name: "Dive Bot".to_string(),
        ticker: "DIVE".to_string(),
        description: Some("A test persona".to_string()),
        personality: Some("helpful".to_string()),
        manner: Some("calm".to_string()),
        contract_address: Some("0x0000000000000000000000000000000000000001".to_string()),
        bonding_curve_address: Some("0x0000000000000000000000000000000000000002".to_string()),
        utilities: vec![Utility::Twitter, Utility::Overdive],
        twitter: Some("https://x.com/divebot".to_string()),
        website: None,
        discord: None,
        telegram: None,
        overdive: None,
        profile_image: Some(ImageFile {
            file_name: "profile.png".to_string(),
            bytes: vec![0x89, 0x50, 0x4e, 0x47],
        }),
        cover_image: None,
    }
}

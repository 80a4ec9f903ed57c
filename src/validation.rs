use crate::error::{Error, Result};

const TICKER_MIN_LEN: usize = 3;
const TICKER_MAX_LEN: usize = 8;

/// Ticker symbols are 3 to 8 uppercase ASCII letters or digits.
pub fn validate_ticker(ticker: &str) -> Result<()> {
    if ticker.len() < TICKER_MIN_LEN || ticker.len() > TICKER_MAX_LEN {
        return Err(Error::ValidationError(format!(
            "Ticker must be {} to {} characters, got {}",
            TICKER_MIN_LEN,
            TICKER_MAX_LEN,
            ticker.len()
        )));
    }
    if !ticker
        .chars()
        .all(|c| c.is_ascii_uppercase() || c.is_ascii_digit())
    {
        return Err(Error::ValidationError(
            "Ticker must contain only uppercase letters and digits".to_string(),
        ));
    }
    Ok(())
}

/// Ether amounts arrive as decimal strings from user input; they must
/// parse to a positive finite number before they hit the chain.
pub fn validate_amount(amount: &str) -> Result<f64> {
    let value: f64 = amount
        .trim()
        .parse()
        .map_err(|_| Error::ValidationError(format!("Amount is not a number: {}", amount)))?;
    if !value.is_finite() {
        return Err(Error::ValidationError("Amount must be finite".to_string()));
    }
    if value <= 0.0 {
        return Err(Error::ValidationError("Amount must be positive".to_string()));
    }
    Ok(value)
}

pub fn validate_evm_address(address: &str) -> Result<()> {
    let hex = address
        .strip_prefix("0x")
        .ok_or_else(|| Error::ValidationError("Address must start with 0x".to_string()))?;
    if hex.len() != 40 || !hex.chars().all(|c| c.is_ascii_hexdigit()) {
        return Err(Error::ValidationError(format!(
            "Invalid contract address: {}",
            address
        )));
    }
    Ok(())
}

/// Solana pubkeys are base58 strings decoding to exactly 32 bytes.
pub fn validate_solana_pubkey(pubkey: &str) -> Result<()> {
    let bytes = bs58::decode(pubkey)
        .into_vec()
        .map_err(|_| Error::ValidationError(format!("Invalid Solana pubkey: {}", pubkey)))?;
    if bytes.len() != 32 {
        return Err(Error::ValidationError(format!(
            "Invalid Solana pubkey length: {}",
            pubkey
        )));
    }
    Ok(())
}

pub fn validate_url(url: &str) -> Result<()> {
    if url.starts_with("http://") || url.starts_with("https://") {
        Ok(())
    } else {
        Err(Error::ValidationError(format!("Invalid URL: {}", url)))
    }
}

/// Search queries must be non-empty; the check runs before any request
/// is issued.
pub fn validate_search_query(query: &str) -> Result<()> {
    if query.trim().is_empty() {
        return Err(Error::ValidationError(
            "Search query cannot be empty".to_string(),
        ));
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn ticker_accepts_uppercase_alphanumerics() {
        assert!(validate_ticker("ABC").is_ok());
        assert!(validate_ticker("DOGE42").is_ok());
        assert!(validate_ticker("ABCDEFGH").is_ok());
    }

    #[test]
    fn ticker_rejects_lowercase_length_and_punctuation() {
        assert!(validate_ticker("abc").is_err());
        assert!(validate_ticker("AB").is_err());
        assert!(validate_ticker("ABCDEFGHI").is_err());
        assert!(validate_ticker("AB-C").is_err());
        assert!(validate_ticker("").is_err());
    }

    #[test]
    fn amount_rejects_non_positive_and_garbage() {
        assert!(validate_amount("0").is_err());
        assert!(validate_amount("-1.5").is_err());
        assert!(validate_amount("abc").is_err());
        assert!(validate_amount("inf").is_err());
        assert_eq!(validate_amount("0.001").unwrap(), 0.001);
    }

    #[test]
    fn evm_address_shape() {
        assert!(validate_evm_address("0xF1d9E186365ACb95249E05cc7273329135eEB039").is_ok());
        assert!(validate_evm_address("F1d9E186365ACb95249E05cc7273329135eEB039").is_err());
        assert!(validate_evm_address("0x1234").is_err());
        assert!(validate_evm_address("0xZZd9E186365ACb95249E05cc7273329135eEB039").is_err());
    }

    #[test]
    fn solana_pubkey_must_be_32_byte_base58() {
        assert!(validate_solana_pubkey("So11111111111111111111111111111111111111112").is_ok());
        assert!(validate_solana_pubkey("notbase58!!!").is_err());
        assert!(validate_solana_pubkey("abc").is_err());
    }

    #[test]
    fn search_query_must_not_be_empty() {
        assert!(validate_search_query("").is_err());
        assert!(validate_search_query("   ").is_err());
        assert!(validate_search_query("pepe").is_ok());
    }
}

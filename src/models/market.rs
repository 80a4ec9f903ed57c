use serde::{Deserialize, Serialize};

/// Total token supply of a launched agent token (1 billion units).
pub const TOTAL_SUPPLY: f64 = 1_000_000_000.0;
/// The portion of supply sellable through the bonding curve (800 million units).
pub const CURVE_SUPPLY: f64 = 800_000_000.0;

/// Raw reserve figures read from the bonding curve contract.
/// Reserve values are formatted ether strings, valid only at read time.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TokenInfo {
    pub token_address: String,
    pub reserve_token: String,
    pub reserve_native: String,
}

/// Quote for one swap, valid only for the instant it was fetched.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SwapQuote {
    pub estimated_amount: String,
    pub required_amount: String,
    pub native_fee: String,
}

/// Trade direction against the curve or the pump.fun pool.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum TradeSide {
    Buy,
    Sell,
}

impl TradeSide {
    pub fn as_str(&self) -> &'static str {
        match self {
            TradeSide::Buy => "buy",
            TradeSide::Sell => "sell",
        }
    }

    pub fn is_buy(&self) -> bool {
        matches!(self, TradeSide::Buy)
    }
}

/// Sold amount out of the fixed curve-sellable supply.
#[derive(Debug, Clone, Copy, Serialize, Deserialize)]
pub struct CurveProgress {
    pub progress: f64,
    pub total: f64,
}

impl CurveProgress {
    /// Derive progress from the curve's remaining token reserve,
    /// clamped so the result always satisfies 0 <= progress <= total.
    pub fn from_reserve(reserve_token: f64) -> Self {
        let sold = (CURVE_SUPPLY - reserve_token).clamp(0.0, CURVE_SUPPLY);
        Self {
            progress: sold,
            total: CURVE_SUPPLY,
        }
    }

    /// Fallback reported when the reserve read fails, so progress
    /// consumers never hard-fail.
    pub fn empty() -> Self {
        Self {
            progress: 0.0,
            total: CURVE_SUPPLY,
        }
    }

    pub fn percent(&self) -> f64 {
        if self.total <= 0.0 {
            return 0.0;
        }
        (self.progress / self.total) * 100.0
    }
}

/// One observed trade/price sample, milliseconds since epoch.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct PriceEvent {
    pub timestamp: i64,
    pub price: f64,
    pub amount: f64,
}

/// OHLCV bar, time in milliseconds since epoch.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct PriceBar {
    pub time: i64,
    pub open: f64,
    pub high: f64,
    pub low: f64,
    pub close: f64,
    pub volume: f64,
}

impl PriceBar {
    /// A degenerate bar where open == close, used when a window holds no
    /// trades so charts still render something at the current price.
    pub fn flat(time: i64, price: f64) -> Self {
        Self {
            time,
            open: price,
            high: price,
            low: price,
            close: price,
            volume: 0.0,
        }
    }
}

/// Bar series handed to a chart consumer.
#[derive(Debug, Clone)]
pub struct BarSeries {
    pub bars: Vec<PriceBar>,
    pub no_data: bool,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn progress_at_full_reserve_is_zero() {
        let p = CurveProgress::from_reserve(800_000_000.0);
        assert_eq!(p.progress, 0.0);
        assert_eq!(p.total, CURVE_SUPPLY);
        assert_eq!(p.percent(), 0.0);
    }

    #[test]
    fn progress_at_half_reserve_is_fifty_percent() {
        let p = CurveProgress::from_reserve(400_000_000.0);
        assert_eq!(p.progress, 400_000_000.0);
        assert_eq!(p.percent(), 50.0);
    }

    #[test]
    fn progress_is_clamped_to_curve_supply() {
        // Reserve above the sellable supply cannot report negative progress
        let over = CurveProgress::from_reserve(900_000_000.0);
        assert_eq!(over.progress, 0.0);

        // Reserve below zero cannot report more than total
        let under = CurveProgress::from_reserve(-5.0);
        assert_eq!(under.progress, CURVE_SUPPLY);
        assert!(under.progress <= under.total);
    }

    #[test]
    fn empty_progress_never_fails_ui() {
        let p = CurveProgress::empty();
        assert_eq!(p.progress, 0.0);
        assert_eq!(p.total, CURVE_SUPPLY);
    }

    #[test]
    fn flat_bar_has_zero_volume_and_equal_ohlc() {
        let bar = PriceBar::flat(1_700_000_000_000, 0.25);
        assert_eq!(bar.open, bar.close);
        assert_eq!(bar.high, bar.low);
        assert_eq!(bar.volume, 0.0);
    }
}

use std::sync::Arc;

use async_trait::async_trait;
use tokio::task::JoinHandle;

use crate::error::Result;
use crate::models::market::{BarSeries, PriceBar, PriceEvent};

pub mod bonding_curve;
pub mod market_data;

pub use bonding_curve::BondingCurveFeed;
pub use market_data::CoinGeckoFeed;

/// Callback invoked with each live bar.
pub type BarHandler = Arc<dyn Fn(PriceBar) + Send + Sync>;

/// Handle for a live bar subscription. The handle owns the poll task;
/// cancelling (or dropping) it stops the task, so timers and listeners
/// cannot outlive their chart.
#[derive(Debug)]
pub struct Subscription {
    handle: JoinHandle<()>,
}

impl Subscription {
    pub(crate) fn new(handle: JoinHandle<()>) -> Self {
        Self { handle }
    }

    pub fn cancel(&self) {
        self.handle.abort();
    }

    pub fn is_active(&self) -> bool {
        !self.handle.is_finished()
    }
}

impl Drop for Subscription {
    fn drop(&mut self) {
        self.handle.abort();
    }
}

/// Descriptor the charting widget needs to configure a symbol.
#[derive(Debug, Clone)]
pub struct SymbolMeta {
    pub name: String,
    pub description: String,
    pub session: &'static str,
    pub timezone: &'static str,
    pub pricescale: u64,
    pub volume_precision: u32,
    pub supported_resolutions: Vec<&'static str>,
    pub has_intraday: bool,
    pub has_daily: bool,
    pub data_status: &'static str,
}

/// Common contract the chart consumes, implemented by both the on-chain
/// and the market-data feed. `from`/`to` are feed-specific: block numbers
/// for the on-chain feed, unix seconds for the market-data feed.
#[async_trait]
pub trait Datafeed: Send + Sync {
    fn symbol_meta(&self, symbol: &str) -> SymbolMeta;
    async fn get_bars(&self, from: u64, to: u64) -> Result<BarSeries>;
    fn subscribe(&self, on_bar: BarHandler) -> Subscription;
}

/// Fold trade events into OHLC bars. Events are sorted by timestamp
/// first; each bar opens at the previous event's price (the first at its
/// own), so close always carries forward into the next open. Bar times
/// are non-decreasing: two trades mined in the same block keep their
/// shared timestamp and fold into separate chained bars, matching the
/// on-chain event order.
pub fn fold_price_events(mut events: Vec<PriceEvent>) -> Vec<PriceBar> {
    events.sort_by_key(|ev| ev.timestamp);

    let mut bars = Vec::with_capacity(events.len());
    let mut prev_close: Option<f64> = None;
    for ev in events {
        let open = prev_close.unwrap_or(ev.price);
        bars.push(PriceBar {
            time: ev.timestamp,
            open,
            high: open.max(ev.price),
            low: open.min(ev.price),
            close: ev.price,
            volume: ev.amount,
        });
        prev_close = Some(ev.price);
    }
    bars
}

/// Fold a price series with index-aligned volumes into bars, with the
/// same previous-close-becomes-open convention. Missing volume entries
/// count as zero.
pub fn fold_price_samples(prices: &[(i64, f64)], volumes: &[(i64, f64)]) -> Vec<PriceBar> {
    let mut bars = Vec::with_capacity(prices.len());
    let mut prev_close: Option<f64> = None;
    for (index, &(time, close)) in prices.iter().enumerate() {
        let open = prev_close.unwrap_or(close);
        let volume = volumes.get(index).map(|&(_, v)| v).unwrap_or(0.0);
        bars.push(PriceBar {
            time,
            open,
            high: open.max(close),
            low: open.min(close),
            close,
            volume,
        });
        prev_close = Some(close);
    }
    bars
}

#[cfg(test)]
mod tests {
    use super::*;

    fn event(timestamp: i64, price: f64, amount: f64) -> PriceEvent {
        PriceEvent {
            timestamp,
            price,
            amount,
        }
    }

    #[test]
    fn folded_events_carry_close_into_next_open() {
        let bars = fold_price_events(vec![
            event(1_000, 0.10, 5.0),
            event(2_000, 0.12, 3.0),
            event(3_000, 0.11, 1.0),
        ]);

        assert_eq!(bars.len(), 3);
        assert_eq!(bars[0].open, bars[0].close);
        for pair in bars.windows(2) {
            assert!(pair[1].time > pair[0].time);
            assert_eq!(pair[1].open, pair[0].close);
        }
        assert_eq!(bars[1].high, 0.12);
        assert_eq!(bars[2].low, 0.11);
        assert_eq!(bars[2].high, 0.12);
    }

    #[test]
    fn unsorted_events_are_sorted_before_folding() {
        let bars = fold_price_events(vec![
            event(3_000, 0.30, 1.0),
            event(1_000, 0.10, 1.0),
            event(2_000, 0.20, 1.0),
        ]);

        let times: Vec<i64> = bars.iter().map(|b| b.time).collect();
        assert_eq!(times, vec![1_000, 2_000, 3_000]);
        assert_eq!(bars[0].close, 0.10);
        assert_eq!(bars[1].open, 0.10);
        assert_eq!(bars[2].open, 0.20);
    }

    #[test]
    fn same_block_events_keep_shared_time_and_stay_chained() {
        let bars = fold_price_events(vec![
            event(1_000, 0.10, 2.0),
            event(2_000, 0.12, 1.0),
            event(2_000, 0.14, 1.0),
        ]);

        assert_eq!(bars.len(), 3);
        assert_eq!(bars[1].time, bars[2].time);
        assert_eq!(bars[2].open, bars[1].close);
        for pair in bars.windows(2) {
            assert!(pair[1].time >= pair[0].time);
        }
    }

    #[test]
    fn empty_event_list_folds_to_no_bars() {
        assert!(fold_price_events(Vec::new()).is_empty());
    }

    #[test]
    fn samples_fold_with_index_aligned_volumes() {
        let prices = [(1_000i64, 1.0), (2_000, 2.0), (3_000, 1.5)];
        let volumes = [(1_000i64, 10.0), (2_000, 20.0)];
        let bars = fold_price_samples(&prices, &volumes);

        assert_eq!(bars.len(), 3);
        assert_eq!(bars[0].open, 1.0);
        assert_eq!(bars[1].open, 1.0);
        assert_eq!(bars[1].high, 2.0);
        assert_eq!(bars[2].open, 2.0);
        assert_eq!(bars[2].low, 1.5);
        assert_eq!(bars[0].volume, 10.0);
        // Missing volume entry defaults to zero
        assert_eq!(bars[2].volume, 0.0);
    }
}

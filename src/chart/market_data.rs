use std::sync::Arc;
use std::time::Duration;

use async_trait::async_trait;
use chrono::Utc;
use log::{error, warn};
use reqwest::Client;
use serde::Deserialize;
use tokio::sync::Mutex;

use crate::chart::{fold_price_samples, BarHandler, Datafeed, Subscription, SymbolMeta};
use crate::error::{Error, Result};
use crate::models::market::{BarSeries, PriceBar};

const API_BASE_URL: &str = "https://api.coingecko.com/api/v3";
const POLL_INTERVAL: Duration = Duration::from_secs(10);

#[derive(Debug, Deserialize)]
struct MarketChart {
    #[serde(default)]
    prices: Vec<(f64, f64)>,
    #[serde(default)]
    total_volumes: Vec<(f64, f64)>,
}

impl MarketChart {
    fn into_bars(self) -> Vec<PriceBar> {
        let prices: Vec<(i64, f64)> = self
            .prices
            .iter()
            .map(|&(time, price)| (time as i64, price))
            .collect();
        let volumes: Vec<(i64, f64)> = self
            .total_volumes
            .iter()
            .map(|&(time, volume)| (time as i64, volume))
            .collect();
        fold_price_samples(&prices, &volumes)
    }
}

/// Chart feed backed by the public CoinGecko market chart API. Live
/// updates poll on a fixed timer; the API has no push channel.
pub struct CoinGeckoFeed {
    http: Client,
    coin_id: String,
    base_url: String,
    poll_interval: Duration,
    last_bar: Arc<Mutex<Option<PriceBar>>>,
}

impl CoinGeckoFeed {
    pub fn new(coin_id: impl Into<String>) -> Self {
        Self {
            http: Client::new(),
            coin_id: coin_id.into(),
            base_url: API_BASE_URL.to_string(),
            poll_interval: POLL_INTERVAL,
            last_bar: Arc::new(Mutex::new(None)),
        }
    }

    pub fn with_base_url(mut self, base_url: impl Into<String>) -> Self {
        self.base_url = base_url.into();
        self
    }

    async fn fetch_range(&self, from_secs: i64, to_secs: i64) -> Result<MarketChart> {
        let url = format!(
            "{}/coins/{}/market_chart/range?vs_currency=usd&from={}&to={}",
            self.base_url, self.coin_id, from_secs, to_secs
        );
        let response = self.http.get(&url).send().await?;
        if !response.status().is_success() {
            return Err(Error::ApiError(format!(
                "Market chart request failed with status: {}",
                response.status()
            )));
        }
        let chart = response.json::<MarketChart>().await.map_err(|e| {
            Error::ApiInvalidFormat(format!("Failed to parse market chart: {}", e))
        })?;
        Ok(chart)
    }

    /// Whether the API has any recent price series for this coin.
    pub async fn check_data_availability(&self) -> bool {
        let url = format!(
            "{}/coins/{}/market_chart?vs_currency=usd&days=1",
            self.base_url, self.coin_id
        );
        let result = async {
            let response = self.http.get(&url).send().await?;
            response.json::<MarketChart>().await
        }
        .await;

        match result {
            Ok(chart) => !chart.prices.is_empty(),
            Err(e) => {
                warn!("Data availability check failed for {}: {}", self.coin_id, e);
                false
            }
        }
    }
}

#[async_trait]
impl Datafeed for CoinGeckoFeed {
    fn symbol_meta(&self, symbol: &str) -> SymbolMeta {
        SymbolMeta {
            name: symbol.to_string(),
            description: String::new(),
            session: "24x7",
            timezone: "Etc/UTC",
            pricescale: 100_000_000,
            volume_precision: 8,
            supported_resolutions: vec!["1", "5", "15", "30", "60", "240", "1D"],
            has_intraday: true,
            has_daily: true,
            data_status: "streaming",
        }
    }

    /// `from`/`to` are unix seconds. An empty or failed response yields a
    /// no-data series.
    async fn get_bars(&self, from: u64, to: u64) -> Result<BarSeries> {
        let chart = match self.fetch_range(from as i64, to as i64).await {
            Ok(chart) => chart,
            Err(e) => {
                error!("Historical data fetch failed for {}: {}", self.coin_id, e);
                return Ok(BarSeries {
                    bars: Vec::new(),
                    no_data: true,
                });
            }
        };

        if chart.prices.is_empty() {
            return Ok(BarSeries {
                bars: Vec::new(),
                no_data: true,
            });
        }

        let bars = chart.into_bars();
        if let Some(last) = bars.last() {
            *self.last_bar.lock().await = Some(*last);
        }
        Ok(BarSeries {
            bars,
            no_data: false,
        })
    }

    /// Poll the same endpoint on a fixed timer, emitting only when the
    /// newest sample is strictly later than the last seen bar so repeated
    /// polls cannot produce duplicates.
    fn subscribe(&self, on_bar: BarHandler) -> Subscription {
        let http = self.http.clone();
        let coin_id = self.coin_id.clone();
        let base_url = self.base_url.clone();
        let last_bar = self.last_bar.clone();
        let poll_interval = self.poll_interval;

        let handle = tokio::spawn(async move {
            let mut ticker = tokio::time::interval(poll_interval);
            ticker.tick().await;

            loop {
                ticker.tick().await;

                let since = match *last_bar.lock().await {
                    Some(bar) => bar.time,
                    // History has not primed the feed yet
                    None => continue,
                };

                let url = format!(
                    "{}/coins/{}/market_chart/range?vs_currency=usd&from={}&to={}",
                    base_url,
                    coin_id,
                    since / 1000,
                    Utc::now().timestamp()
                );
                let chart = match http.get(&url).send().await {
                    Ok(response) => match response.json::<MarketChart>().await {
                        Ok(chart) => chart,
                        Err(e) => {
                            warn!("Realtime parse failed for {}: {}", coin_id, e);
                            continue;
                        }
                    },
                    Err(e) => {
                        warn!("Realtime update failed for {}: {}", coin_id, e);
                        continue;
                    }
                };

                let bars = chart.into_bars();
                if let Some(&latest) = bars.last() {
                    let mut guard = last_bar.lock().await;
                    let seen = guard.map(|bar| bar.time).unwrap_or(i64::MIN);
                    if latest.time > seen {
                        *guard = Some(latest);
                        drop(guard);
                        on_bar(latest);
                    }
                }
            }
        });

        Subscription::new(handle)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn market_chart_parses_coingecko_shape() {
        let body = r#"{
            "prices": [[1700000000000, 0.5], [1700000600000, 0.6]],
            "total_volumes": [[1700000000000, 120.0], [1700000600000, 80.0]]
        }"#;
        let chart: MarketChart = serde_json::from_str(body).unwrap();
        let bars = chart.into_bars();

        assert_eq!(bars.len(), 2);
        assert_eq!(bars[0].time, 1_700_000_000_000);
        assert_eq!(bars[0].open, 0.5);
        assert_eq!(bars[1].open, 0.5);
        assert_eq!(bars[1].close, 0.6);
        assert_eq!(bars[1].volume, 80.0);
    }

    #[test]
    fn missing_volume_array_defaults_empty() {
        let chart: MarketChart = serde_json::from_str(r#"{"prices": [[1, 2.0]]}"#).unwrap();
        let bars = chart.into_bars();
        assert_eq!(bars.len(), 1);
        assert_eq!(bars[0].volume, 0.0);
    }
}

pub mod common;

use crate::chart::fold_price_events;
use crate::models::market::CurveProgress;
use crate::validation;

#[test]
fn test_config_is_internally_consistent() {
    let config = common::create_test_config();
    assert!(config.api.base_url.starts_with("http"));
    assert!(validation::validate_evm_address(&config.evm.factory_address).is_ok());
    assert!(config.chart.poll_interval_secs > 0);
}

#[test]
fn sample_events_fold_into_linked_bars() {
    let bars = fold_price_events(common::sample_price_events());
    assert_eq!(bars.len(), 3);
    for pair in bars.windows(2) {
        assert_eq!(pair[1].open, pair[0].close);
        assert!(pair[1].time > pair[0].time);
    }
}

#[test]
fn fresh_curve_reports_zero_progress() {
    let progress = CurveProgress::from_reserve(800_000_000.0);
    assert_eq!(progress.percent(), 0.0);
}

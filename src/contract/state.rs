use ethers::providers::Middleware;
use log::warn;

use crate::contract::bonding_curve::BondingCurveClient;
use crate::models::market::CurveProgress;

/// Derives the sold-out progress of a bonding curve from its raw reserve
/// figures. Read failures degrade to zero progress instead of erroring,
/// so progress displays stay visible when the node is flaky.
#[derive(Debug, Clone)]
pub struct BondingCurveStateReader<M: Middleware> {
    client: BondingCurveClient<M>,
}

impl<M: Middleware + 'static> BondingCurveStateReader<M> {
    pub fn new(client: BondingCurveClient<M>) -> Self {
        Self { client }
    }

    pub async fn curve_progress(&self) -> CurveProgress {
        match self.client.token_info().await {
            Ok(info) => match info.reserve_token.parse::<f64>() {
                Ok(reserve) => CurveProgress::from_reserve(reserve),
                Err(e) => {
                    warn!("Unparseable reserve {}: {}", info.reserve_token, e);
                    CurveProgress::empty()
                }
            },
            Err(e) => {
                warn!("Curve progress read failed, reporting zero: {}", e);
                CurveProgress::empty()
            }
        }
    }
}

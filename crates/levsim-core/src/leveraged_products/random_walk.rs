use rand::rngs::StdRng;
use rand::Rng;
use rand::SeedableRng;
use rust_decimal::prelude::FromPrimitive;
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use statrs::distribution::Normal;

use crate::error::LevSimError;
use crate::leveraged_products::scenario::{DailyChanges, MAX_HORIZON_DAYS};
use crate::LevSimResult;

/// Floor for a generated daily move, in percent.
const MIN_DAILY_MOVE_PCT: f64 = -99.99;

/// Normally distributed daily moves for exercising the path simulator.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RandomWalkParams {
    pub days: u32,
    /// Mean daily move in percent.
    #[serde(default)]
    pub drift_pct: f64,
    /// Standard deviation of the daily move in percent.
    pub volatility_pct: f64,
    /// Optional seed for reproducibility.
    #[serde(default)]
    pub seed: Option<u64>,
}

impl DailyChanges {
    /// Draw `params.days` moves, rounded to 4 dp and floored above -100%.
    pub fn random_walk(params: &RandomWalkParams) -> LevSimResult<DailyChanges> {
        if params.days > MAX_HORIZON_DAYS {
            return Err(LevSimError::InvalidInput {
                field: "days".into(),
                reason: format!("must not exceed {MAX_HORIZON_DAYS}"),
            });
        }
        if !params.drift_pct.is_finite() {
            return Err(LevSimError::InvalidInput {
                field: "drift_pct".into(),
                reason: "must be finite".into(),
            });
        }
        if !params.volatility_pct.is_finite() || params.volatility_pct < 0.0 {
            return Err(LevSimError::InvalidInput {
                field: "volatility_pct".into(),
                reason: "must be finite and non-negative".into(),
            });
        }

        let mut rng = match params.seed {
            Some(s) => StdRng::seed_from_u64(s),
            None => StdRng::from_entropy(),
        };

        let draws: Vec<f64> = if params.volatility_pct == 0.0 {
            vec![params.drift_pct; params.days as usize]
        } else {
            let normal = Normal::new(params.drift_pct, params.volatility_pct).map_err(|e| {
                LevSimError::InvalidInput {
                    field: "volatility_pct".into(),
                    reason: format!("Invalid Normal parameters: {e}"),
                }
            })?;
            (0..params.days).map(|_| rng.sample(&normal)).collect()
        };

        let changes = draws
            .into_iter()
            .map(|x| {
                Decimal::from_f64(x.max(MIN_DAILY_MOVE_PCT))
                    .map(|d| d.round_dp(4))
                    .ok_or_else(|| LevSimError::InvalidInput {
                        field: "drift_pct".into(),
                        reason: format!("daily move {x} is not representable"),
                    })
            })
            .collect::<LevSimResult<Vec<Decimal>>>()?;

        DailyChanges::new(changes)
    }
}

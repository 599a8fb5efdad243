use chrono::{Duration, NaiveDate};
use rust_decimal::Decimal;
use rust_decimal_macros::dec;
use serde::{Deserialize, Serialize};
use std::time::Instant;
use tracing::{debug, warn};

use crate::compounding::{is_saturated, saturating_div};
use crate::error::LevSimError;
use crate::leveraged_products::scenario::{DailyChanges, Direction, ProductType, Scenario};
use crate::types::{with_metadata, ComputationOutput, Money, Rate};
use crate::LevSimResult;

// ---------------------------------------------------------------------------
// Types
// ---------------------------------------------------------------------------

/// Scenario plus an explicit sequence of daily moves.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PathInput {
    pub scenario: Scenario,
    pub daily_changes: DailyChanges,
    /// Labels day 0; day `n` is `start_date + n` calendar days.
    #[serde(default)]
    pub start_date: Option<NaiveDate>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TrajectoryPoint {
    pub day: u32,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub date: Option<NaiveDate>,
    /// Move applied to reach this day, in percent (0 on day 0).
    pub change_pct: Decimal,
    pub underlying_price: Money,
    pub product_value: Money,
}

/// Day-by-day trajectory. `product_values` and `underlying_prices` are
/// index-aligned and hold `len(daily_changes) + 1` entries.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DailyTrajectory {
    pub product_type: ProductType,
    pub direction: Direction,
    pub leverage: Decimal,
    pub product_values: Vec<Money>,
    pub underlying_prices: Vec<Money>,
    pub final_product_value: Money,
    pub final_underlying_price: Money,
    pub underlying_return: Rate,
    pub product_return: Rate,
    /// What a single leveraged bet on the whole-period move would have returned.
    pub naive_leveraged_return: Rate,
    /// `naive_leveraged_return - product_return`; positive means the daily
    /// reset cost the holder.
    pub volatility_decay: Rate,
    pub trajectory: Vec<TrajectoryPoint>,
}

// ---------------------------------------------------------------------------
// Simulation
// ---------------------------------------------------------------------------

/// Compound the daily-reset rule once per supplied day.
pub fn simulate_path(
    scenario: &Scenario,
    changes: &DailyChanges,
) -> LevSimResult<ComputationOutput<DailyTrajectory>> {
    simulate_dated_path(scenario, changes, None)
}

/// As [`simulate_path`], labelling each day with a calendar date.
pub fn simulate_dated_path(
    scenario: &Scenario,
    changes: &DailyChanges,
    start_date: Option<NaiveDate>,
) -> LevSimResult<ComputationOutput<DailyTrajectory>> {
    let start = Instant::now();
    let product = scenario.product_type();

    if !product.is_daily_reset() {
        warn!(product = ?product, "daily path requested for non daily-reset product");
        return Err(LevSimError::UnsupportedProduct {
            product: product.to_string(),
            operation: "daily path simulation".into(),
        });
    }
    debug!(
        product = ?product,
        direction = ?scenario.direction(),
        days = changes.len(),
        "simulating daily path"
    );

    let mut warnings: Vec<String> = scenario.notes().to_vec();
    let exposure = scenario.leverage() * scenario.direction().sign();

    let n = changes.len();
    let mut product_values = Vec::with_capacity(n + 1);
    let mut underlying_prices = Vec::with_capacity(n + 1);
    let mut trajectory = Vec::with_capacity(n + 1);

    let mut price = scenario.start_price();
    let mut value = scenario.investment();
    product_values.push(value);
    underlying_prices.push(price);
    trajectory.push(TrajectoryPoint {
        day: 0,
        date: start_date,
        change_pct: Decimal::ZERO,
        underlying_price: price,
        product_value: value,
    });

    for (i, change_pct) in changes.changes_pct().iter().enumerate() {
        let move_ = *change_pct / dec!(100);
        price = price.saturating_mul(Decimal::ONE + move_);
        value = value.saturating_mul(Decimal::ONE + exposure * move_);

        let day = i as u32 + 1;
        product_values.push(value);
        underlying_prices.push(price);
        trajectory.push(TrajectoryPoint {
            day,
            date: start_date.map(|d| d + Duration::days(i64::from(day))),
            change_pct: *change_pct,
            underlying_price: price,
            product_value: value,
        });
    }

    if product_values.iter().any(|v| is_saturated(*v))
        || underlying_prices.iter().any(|p| is_saturated(*p))
    {
        warnings.push(
            "Path exceeds the representable range; values are clamped to the decimal limit"
                .into(),
        );
    }
    if product_values.iter().any(|v| *v < Decimal::ZERO) {
        warnings.push(
            "Product value turned negative: a single day's leveraged loss exceeded 100%".into(),
        );
    }

    let underlying_return =
        saturating_div(price, scenario.start_price()).saturating_sub(Decimal::ONE);
    let product_return =
        saturating_div(value, scenario.investment()).saturating_sub(Decimal::ONE);
    let naive_leveraged_return = exposure.saturating_mul(underlying_return);
    let volatility_decay = naive_leveraged_return.saturating_sub(product_return);

    let output = DailyTrajectory {
        product_type: product,
        direction: scenario.direction(),
        leverage: scenario.leverage(),
        product_values,
        underlying_prices,
        final_product_value: value,
        final_underlying_price: price,
        underlying_return,
        product_return,
        naive_leveraged_return,
        volatility_decay,
        trajectory,
    };

    let elapsed = start.elapsed().as_micros() as u64;
    Ok(with_metadata(
        "Daily-reset leverage compounded over explicit daily moves",
        &serde_json::json!({
            "scenario": scenario,
            "days": n,
            "start_date": start_date,
        }),
        warnings,
        elapsed,
        output,
    ))
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------

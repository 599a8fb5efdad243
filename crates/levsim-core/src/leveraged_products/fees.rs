use rust_decimal::Decimal;
use rust_decimal_macros::dec;
use serde::{Deserialize, Serialize};
use std::time::Instant;
use tracing::debug;

use crate::compounding::saturating_div;
use crate::error::LevSimError;
use crate::leveraged_products::payoff::curve_values;
use crate::leveraged_products::scenario::{PriceRange, ProductType, Scenario};
use crate::types::{with_metadata, ComputationOutput, Money, Rate};
use crate::LevSimResult;

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct FeeDifference {
    pub underlying_price: Money,
    pub value_without_fee: Money,
    pub value_with_fee: Money,
    pub fee_loss: Money,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct FeeImpact {
    pub product_type: ProductType,
    pub daily_cost_rate: Rate,
    pub horizon_days: u32,
    /// Median of the per-price fee losses.
    pub expected_fee_loss: Money,
    pub mean_fee_loss: Money,
    pub max_fee_loss: Money,
    /// `expected_fee_loss` as a fraction of the investment.
    pub expected_fee_loss_pct: Rate,
    pub differences: Vec<FeeDifference>,
}

/// Median of an unsorted slice; mean of the two middle values for even lengths.
fn median(values: &[Decimal]) -> Option<Decimal> {
    if values.is_empty() {
        return None;
    }
    let mut sorted = values.to_vec();
    sorted.sort();
    let mid = sorted.len() / 2;
    if sorted.len() % 2 == 0 {
        Some(sorted[mid - 1].saturating_add(sorted[mid]) / dec!(2))
    } else {
        Some(sorted[mid])
    }
}

/// Value lost to the holding cost: median over the price range of
/// `value_without_fee - value_with_fee`.
pub fn estimate_fee_impact(
    scenario: &Scenario,
    prices: &PriceRange,
) -> LevSimResult<ComputationOutput<FeeImpact>> {
    let start = Instant::now();

    if prices.is_empty() {
        return Err(LevSimError::InsufficientData(
            "fee impact requires at least one price".into(),
        ));
    }
    debug!(
        product = ?scenario.product_type(),
        daily_cost_rate = %scenario.daily_cost_rate(),
        points = prices.len(),
        "estimating fee impact"
    );

    let mut warnings: Vec<String> = scenario.notes().to_vec();
    if scenario.daily_cost_rate().is_zero() {
        warnings.push("No holding cost configured; fee impact is zero".into());
    }

    let with_fee = curve_values(scenario, prices);
    let without_fee = curve_values(&scenario.without_holding_cost(), prices);

    let differences: Vec<FeeDifference> = prices
        .iter()
        .zip(without_fee.iter().zip(with_fee.iter()))
        .map(|(price, (no_fee, fee))| FeeDifference {
            underlying_price: *price,
            value_without_fee: *no_fee,
            value_with_fee: *fee,
            fee_loss: no_fee.saturating_sub(*fee),
        })
        .collect();

    let losses: Vec<Money> = differences.iter().map(|d| d.fee_loss).collect();
    let expected_fee_loss = median(&losses).unwrap_or(Decimal::ZERO);
    let mean_fee_loss = losses
        .iter()
        .fold(Decimal::ZERO, |acc, l| acc.saturating_add(*l))
        / Decimal::from(losses.len());
    let max_fee_loss = losses.iter().copied().max().unwrap_or(Decimal::ZERO);

    let zeroed = with_fee.iter().filter(|v| v.is_zero()).count();
    if zeroed * 2 > with_fee.len() {
        warnings.push(
            "More than half of the price range values to zero; the median loss is understated"
                .into(),
        );
    }

    let output = FeeImpact {
        product_type: scenario.product_type(),
        daily_cost_rate: scenario.daily_cost_rate(),
        horizon_days: scenario.horizon_days(),
        expected_fee_loss,
        mean_fee_loss,
        max_fee_loss,
        expected_fee_loss_pct: saturating_div(expected_fee_loss, scenario.investment()),
        differences,
    };

    let elapsed = start.elapsed().as_micros() as u64;
    Ok(with_metadata(
        "Median value difference between zero-cost and costed payoff curves",
        &serde_json::json!({
            "scenario": scenario,
            "price_points": prices.len(),
        }),
        warnings,
        elapsed,
        output,
    ))
}

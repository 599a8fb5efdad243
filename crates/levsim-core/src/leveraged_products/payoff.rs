use rust_decimal::Decimal;
use rust_decimal_macros::dec;
use serde::{Deserialize, Serialize};
use std::time::Instant;
use tracing::{debug, trace};

use crate::compounding::{
    compound, cost_decay, implied_periodic_return, is_saturated, saturating_div,
};
use crate::leveraged_products::scenario::{Direction, PriceRange, ProductType, Scenario};
use crate::types::{with_metadata, ComputationOutput, Money, Rate};
use crate::LevSimResult;

/// Warrant strikes sit 5% out of the money.
const WARRANT_OTM: Decimal = dec!(0.05);

/// Instrument values index-aligned with the `PriceRange` they were computed on.
pub type PayoffCurve = Vec<Money>;

// ---------------------------------------------------------------------------
// Output types
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PayoffPoint {
    pub underlying_price: Money,
    pub value: Money,
    pub profit: Money,
    pub knocked_out: bool,
}

/// Derived warrant terms, returned with the curve instead of kept as state.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct WarrantTerms {
    pub strike: Money,
    /// Underlying units of intrinsic exposure bought by the investment.
    pub count: Decimal,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PayoffCurveOutput {
    pub product_name: String,
    pub product_type: ProductType,
    pub direction: Direction,
    pub investment: Money,
    pub effective_leverage: Decimal,
    /// Barrier for turbos; absent for every other family.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub knockout_level: Option<Money>,
    /// Financing level carried by a mini future. Not a knockout.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub financing_level: Option<Money>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub warrant: Option<WarrantTerms>,
    /// `(1 - cost)^days` where the family applies the cost once per horizon.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub cost_decay_factor: Option<Rate>,
    pub max_value: Option<Money>,
    pub min_value: Option<Money>,
    pub break_even_prices: Vec<Money>,
    pub knocked_out_points: usize,
    pub payoff_table: Vec<PayoffPoint>,
}

impl PayoffCurveOutput {
    pub fn values(&self) -> PayoffCurve {
        self.payoff_table.iter().map(|p| p.value).collect()
    }
}

// ---------------------------------------------------------------------------
// Formula families
// ---------------------------------------------------------------------------

/// Daily-reset certificate: compound the constant daily return implied by the
/// end price, `horizon_days` times.
fn daily_reset_value(s: &Scenario, price: Money) -> Money {
    let days = s.horizon_days();
    if days == 0 {
        return s.investment();
    }
    let r = implied_periodic_return(s.start_price(), price, days);
    s.investment().saturating_mul(compound(leveraged_step(s, r), days))
}

/// One day's growth factor `1 + leverage * r * sign`.
fn leveraged_step(s: &Scenario, r: Rate) -> Decimal {
    Decimal::ONE.saturating_add(
        s.leverage()
            .saturating_mul(r)
            .saturating_mul(s.direction().sign()),
    )
}

/// Turbo / unlimited turbo. Barrier test first, then simple leveraged return
/// discounted once by the holding cost over the horizon.
fn barrier_value(s: &Scenario, price: Money) -> (Money, bool) {
    if let Some(barrier) = s.knockout_level() {
        if s.direction().is_knocked_out(price, barrier) {
            trace!(%price, %barrier, "knocked out");
            return (Decimal::ZERO, true);
        }
    }
    let ret = saturating_div(price - s.start_price(), s.start_price());
    let value = s
        .investment()
        .saturating_mul(leveraged_step(s, ret))
        .saturating_mul(cost_decay(s.daily_cost_rate(), s.horizon_days()));
    (value, false)
}

/// Mini future: step a running reference price toward the end price, paying
/// the financing cost once per simulated day.
fn mini_future_value(s: &Scenario, price: Money) -> Money {
    let days = s.horizon_days();
    if days == 0 {
        return s.investment();
    }
    if price.is_zero() {
        return Decimal::ZERO;
    }
    let carry = Decimal::ONE - s.daily_cost_rate();
    let mut value = s.investment();
    let mut reference = s.start_price();
    for _ in 0..days {
        if reference.is_zero() {
            return Decimal::ZERO;
        }
        let r = implied_periodic_return(reference, price, days);
        value = value.saturating_mul(leveraged_step(s, r)).saturating_mul(carry);
        if is_saturated(value) {
            return value;
        }
        reference = reference.saturating_mul(Decimal::ONE.saturating_add(r));
    }
    value
}

fn warrant_strike(s: &Scenario) -> Money {
    match s.direction() {
        Direction::Long => s.start_price() * (Decimal::ONE + WARRANT_OTM),
        Direction::Short => s.start_price() * (Decimal::ONE - WARRANT_OTM),
    }
}

fn warrant_terms(s: &Scenario) -> WarrantTerms {
    WarrantTerms {
        strike: warrant_strike(s),
        count: saturating_div(s.investment().saturating_mul(s.leverage()), s.start_price()),
    }
}

/// Intrinsic value only, no time value.
fn warrant_value(s: &Scenario, price: Money, strike: Money) -> Money {
    let intrinsic = match s.direction() {
        Direction::Long => (price - strike).max(Decimal::ZERO),
        Direction::Short => (strike - price).max(Decimal::ZERO),
    };
    s.investment()
        .saturating_mul(s.leverage())
        .saturating_mul(saturating_div(intrinsic, s.start_price()))
}

fn tracker_value(s: &Scenario, price: Money) -> Money {
    s.investment()
        .saturating_mul(saturating_div(price, s.start_price()))
        .saturating_mul(cost_decay(s.daily_cost_rate(), s.horizon_days()))
}

/// Value of the instrument at one candidate end price, and whether the
/// barrier extinguished it.
pub fn value_at(scenario: &Scenario, price: Money) -> (Money, bool) {
    match scenario.product_type() {
        ProductType::BullBear | ProductType::Cfd => (daily_reset_value(scenario, price), false),
        ProductType::Turbo | ProductType::UnlimitedTurbo => barrier_value(scenario, price),
        ProductType::MiniFuture => (mini_future_value(scenario, price), false),
        ProductType::Warrant => (warrant_value(scenario, price, warrant_strike(scenario)), false),
        ProductType::Tracker => (tracker_value(scenario, price), false),
    }
}

/// Instrument value at every price of the range, in the same order.
pub fn curve_values(scenario: &Scenario, prices: &PriceRange) -> PayoffCurve {
    prices.iter().map(|p| value_at(scenario, *p).0).collect()
}

// ---------------------------------------------------------------------------
// Curve analytics
// ---------------------------------------------------------------------------

fn build_payoff_table(scenario: &Scenario, prices: &PriceRange) -> Vec<PayoffPoint> {
    prices
        .iter()
        .map(|price| {
            let (value, knocked_out) = value_at(scenario, *price);
            PayoffPoint {
                underlying_price: *price,
                value,
                profit: value.saturating_sub(scenario.investment()),
                knocked_out,
            }
        })
        .collect()
}

/// Prices where profit crosses zero, by linear interpolation between
/// neighbouring points; exact zeros are included as-is.
fn find_break_evens(table: &[PayoffPoint]) -> Vec<Money> {
    let mut break_evens = Vec::new();

    for i in 0..table.len() {
        if table[i].profit.is_zero() {
            let price = table[i].underlying_price;
            if !break_evens.contains(&price) {
                break_evens.push(price);
            }
            continue;
        }
        if i == 0 {
            continue;
        }

        let prev = &table[i - 1];
        let curr = &table[i];
        if prev.profit.is_zero() {
            continue;
        }
        if (prev.profit > Decimal::ZERO) != (curr.profit > Decimal::ZERO) {
            let denom = curr.profit.saturating_sub(prev.profit);
            if !denom.is_zero() {
                let t = -prev.profit / denom;
                let be =
                    prev.underlying_price + t * (curr.underlying_price - prev.underlying_price);
                if !break_evens.contains(&be) {
                    break_evens.push(be);
                }
            }
        }
    }

    break_evens.sort();
    break_evens
}

fn methodology(product: ProductType) -> &'static str {
    match product {
        ProductType::BullBear | ProductType::Cfd => {
            "Daily-reset leverage compounded over the implied constant daily return"
        }
        ProductType::Turbo | ProductType::UnlimitedTurbo => {
            "Inclusive knockout barrier, simple leveraged return, holding cost over horizon"
        }
        ProductType::MiniFuture => {
            "Stepwise financed position against a moving reference, daily financing cost"
        }
        ProductType::Warrant => "Intrinsic value at a 5% out-of-the-money strike, no time value",
        ProductType::Tracker => "Unlevered pass-through with holding cost over horizon",
    }
}

// ---------------------------------------------------------------------------
// Public API
// ---------------------------------------------------------------------------

/// Value the instrument across a price scenario.
pub fn compute_curve(
    scenario: &Scenario,
    prices: &PriceRange,
) -> LevSimResult<ComputationOutput<PayoffCurveOutput>> {
    let start = Instant::now();
    let product = scenario.product_type();
    debug!(
        product = ?product,
        direction = ?scenario.direction(),
        points = prices.len(),
        "computing payoff curve"
    );

    let mut warnings: Vec<String> = scenario.notes().to_vec();

    let payoff_table = build_payoff_table(scenario, prices);
    let break_even_prices = find_break_evens(&payoff_table);
    let knocked_out_points = payoff_table.iter().filter(|p| p.knocked_out).count();
    let max_value = payoff_table.iter().map(|p| p.value).max();
    let min_value = payoff_table.iter().map(|p| p.value).min();

    if !payoff_table.is_empty() && knocked_out_points == payoff_table.len() {
        warnings.push("Every price in the range is at or beyond the knockout level".into());
    }
    if payoff_table.iter().any(|p| is_saturated(p.value)) {
        warnings.push(
            "Some values exceed the representable range and are clamped to the decimal limit"
                .into(),
        );
    }
    if min_value.is_some_and(|v| v < Decimal::ZERO) {
        warnings.push(
            "Some values are negative: the leveraged move exceeds -100% of the investment".into(),
        );
    }

    let cost_decay_factor = match product {
        ProductType::Turbo | ProductType::UnlimitedTurbo | ProductType::Tracker => Some(
            cost_decay(scenario.daily_cost_rate(), scenario.horizon_days()),
        ),
        _ => None,
    };
    let warrant = (product == ProductType::Warrant).then(|| warrant_terms(scenario));

    let output = PayoffCurveOutput {
        product_name: product.to_string(),
        product_type: product,
        direction: scenario.direction(),
        investment: scenario.investment(),
        effective_leverage: scenario.leverage(),
        knockout_level: scenario
            .knockout_level()
            .filter(|_| product != ProductType::MiniFuture),
        financing_level: scenario
            .knockout_level()
            .filter(|_| product == ProductType::MiniFuture),
        warrant,
        cost_decay_factor,
        max_value,
        min_value,
        break_even_prices,
        knocked_out_points,
        payoff_table,
    };

    let (low, high) = match (prices.prices().first(), prices.prices().last()) {
        (Some(l), Some(h)) => (l.to_string(), h.to_string()),
        _ => (String::new(), String::new()),
    };

    let elapsed = start.elapsed().as_micros() as u64;
    Ok(with_metadata(
        methodology(product),
        &serde_json::json!({
            "scenario": scenario,
            "price_range": format!("{} - {}", low, high),
            "price_points": prices.len(),
        }),
        warnings,
        elapsed,
        output,
    ))
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------

use levsim_core::leveraged_products::fees::estimate_fee_impact;
use levsim_core::leveraged_products::path::{simulate_path, PathInput};
use levsim_core::leveraged_products::payoff::{compute_curve, curve_values};
use levsim_core::leveraged_products::{
    CurveInput, DailyChanges, Direction, PriceRange, ProductType, Scenario, ScenarioInput,
};
use levsim_core::LevSimError;
use pretty_assertions::assert_eq;
use rust_decimal::Decimal;
use rust_decimal_macros::dec;

// ===========================================================================
// End-to-end checks through the public API, mirroring how the CLI and the
// bindings drive the engine: JSON in, validated scenario, curve/path out.
// ===========================================================================

fn scenario(
    product_type: ProductType,
    direction: Direction,
    horizon_days: i64,
    daily_cost_rate: Decimal,
    knockout_level: Option<Decimal>,
) -> Scenario {
    Scenario::try_from(ScenarioInput {
        product_type,
        direction,
        start_price: dec!(100),
        leverage: dec!(5),
        investment: dec!(10000),
        horizon_days,
        daily_cost_rate,
        knockout_level,
    })
    .unwrap()
}

// ---------------------------------------------------------------------------
// Reference scenarios
// ---------------------------------------------------------------------------

#[test]
fn test_turbo_reference_points() {
    let s = scenario(
        ProductType::Turbo,
        Direction::Long,
        20,
        Decimal::ZERO,
        Some(dec!(85)),
    );
    let range = PriceRange::new(vec![dec!(80), dec!(120)]).unwrap();
    let curve = curve_values(&s, &range);
    assert_eq!(curve, vec![Decimal::ZERO, dec!(20000)]);
}

#[test]
fn test_tracker_reference_point() {
    let range = PriceRange::new(vec![dec!(110)]).unwrap();
    for days in [0, 7, 90] {
        let s = scenario(ProductType::Tracker, Direction::Long, days, Decimal::ZERO, None);
        assert_eq!(curve_values(&s, &range), vec![dec!(11000)]);
    }
}

// ---------------------------------------------------------------------------
// Properties
// ---------------------------------------------------------------------------

#[test]
fn test_bull_bear_start_price_returns_investment() {
    let range = PriceRange::new(vec![dec!(100)]).unwrap();
    for product in [ProductType::BullBear, ProductType::Cfd] {
        for direction in [Direction::Long, Direction::Short] {
            for days in [0, 1, 10, 250] {
                let s = scenario(product, direction, days, Decimal::ZERO, None);
                assert_eq!(curve_values(&s, &range), vec![dec!(10000)]);
            }
        }
    }
}

#[test]
fn test_zero_horizon_decay_is_identity() {
    let range = PriceRange::linspace(dec!(86), dec!(130), 45).unwrap();
    for product in [
        ProductType::Turbo,
        ProductType::UnlimitedTurbo,
        ProductType::Tracker,
    ] {
        let costed = scenario(product, Direction::Long, 0, dec!(0.01), None);
        assert_eq!(
            curve_values(&costed, &range),
            curve_values(&costed.without_holding_cost(), &range)
        );
    }
    for product in [ProductType::BullBear, ProductType::Cfd] {
        let s = scenario(product, Direction::Long, 0, Decimal::ZERO, None);
        assert!(curve_values(&s, &range).iter().all(|v| *v == dec!(10000)));
    }
}

#[test]
fn test_knockout_monotonicity_long_and_short() {
    let range = PriceRange::linspace(dec!(70), dec!(130), 121).unwrap();

    let long = scenario(ProductType::Turbo, Direction::Long, 5, Decimal::ZERO, None);
    let out = compute_curve(&long, &range).unwrap().result;
    for p in &out.payoff_table {
        if p.underlying_price <= dec!(85) {
            assert!(p.knocked_out);
            assert_eq!(p.value, Decimal::ZERO);
        } else {
            assert!(!p.knocked_out);
            assert!(p.value > Decimal::ZERO);
        }
    }

    let short = scenario(
        ProductType::UnlimitedTurbo,
        Direction::Short,
        5,
        Decimal::ZERO,
        Some(dec!(112)),
    );
    let out = compute_curve(&short, &range).unwrap().result;
    for p in &out.payoff_table {
        assert_eq!(p.knocked_out, p.underlying_price >= dec!(112));
        if p.knocked_out {
            assert_eq!(p.value, Decimal::ZERO);
        }
    }
}

#[test]
fn test_flat_daily_path() {
    let s = scenario(ProductType::BullBear, Direction::Short, 0, Decimal::ZERO, None);
    let changes = DailyChanges::new(vec![Decimal::ZERO; 10]).unwrap();
    let out = simulate_path(&s, &changes).unwrap().result;
    assert_eq!(out.product_values, vec![dec!(10000); 11]);
    assert_eq!(out.underlying_prices, vec![dec!(100); 11]);
}

#[test]
fn test_fee_impact_zero_without_cost_and_positive_with() {
    let range = PriceRange::linspace(dec!(90), dec!(120), 31).unwrap();
    let free = scenario(ProductType::Turbo, Direction::Long, 30, Decimal::ZERO, None);
    assert_eq!(
        estimate_fee_impact(&free, &range).unwrap().result.expected_fee_loss,
        Decimal::ZERO
    );

    let costed = scenario(ProductType::Turbo, Direction::Long, 30, dec!(0.0005), None);
    let impact = estimate_fee_impact(&costed, &range).unwrap().result;
    assert!(impact.expected_fee_loss > Decimal::ZERO);
    assert!(impact.max_fee_loss >= impact.expected_fee_loss);
}

// ---------------------------------------------------------------------------
// JSON boundary
// ---------------------------------------------------------------------------

#[test]
fn test_curve_input_from_json_with_default_window() {
    let json = r#"{
        "scenario": {
            "product_type": "Turbo",
            "direction": "Long",
            "start_price": 100,
            "leverage": 5,
            "investment": 10000,
            "horizon_days": 20
        }
    }"#;
    let input: CurveInput = serde_json::from_str(json).unwrap();
    let range = input.resolve_prices().unwrap();
    assert_eq!(range.len(), 300);
    let out = compute_curve(&input.scenario, &range).unwrap();
    assert_eq!(out.result.payoff_table.len(), 300);
    assert_eq!(out.result.knockout_level, Some(dec!(85)));
}

#[test]
fn test_curve_input_explicit_prices() {
    let json = r#"{
        "scenario": {"product_type": "Warrant", "start_price": "100", "investment": "1000"},
        "price_range": ["100", "110", "120"]
    }"#;
    let input: CurveInput = serde_json::from_str(json).unwrap();
    let range = input.resolve_prices().unwrap();
    let out = compute_curve(&input.scenario, &range).unwrap();
    assert_eq!(out.result.values(), vec![Decimal::ZERO, dec!(50), dec!(150)]);
}

#[test]
fn test_path_input_rejects_bad_change() {
    let json = r#"{
        "scenario": {"product_type": "BullBear", "start_price": 100, "investment": 1000},
        "daily_changes": [1.5, -120]
    }"#;
    assert!(serde_json::from_str::<PathInput>(json).is_err());
}

#[test]
fn test_path_unsupported_for_turbo() {
    let s = scenario(ProductType::Turbo, Direction::Long, 0, Decimal::ZERO, None);
    let changes = DailyChanges::new(vec![dec!(1)]).unwrap();
    let err = simulate_path(&s, &changes).unwrap_err();
    assert!(matches!(err, LevSimError::UnsupportedProduct { .. }));
}

#[test]
fn test_negative_range_rejected_in_json() {
    let json = r#"{
        "scenario": {"product_type": "Tracker", "start_price": 100, "investment": 1000},
        "price_range": [10, -5]
    }"#;
    assert!(serde_json::from_str::<CurveInput>(json).is_err());
}

// ---------------------------------------------------------------------------
// Range limits
// ---------------------------------------------------------------------------

#[test]
fn test_price_zero_curve_clamps_instead_of_overflowing() {
    let json = r#"{
        "scenario": {
            "product_type": "BullBear",
            "direction": "Short",
            "start_price": 100,
            "leverage": 5,
            "investment": 10000,
            "horizon_days": 40
        },
        "price_range": [0, 50, 100]
    }"#;
    let input: CurveInput = serde_json::from_str(json).unwrap();
    let range = input.resolve_prices().unwrap();
    let out = compute_curve(&input.scenario, &range).unwrap();
    assert_eq!(out.result.payoff_table[0].value, Decimal::MAX);
    assert_eq!(out.result.payoff_table[2].value, dec!(10000));
    assert!(out.warnings.iter().any(|w| w.contains("clamped")));
}

#[test]
fn test_runaway_daily_path_clamps() {
    let s = Scenario::try_from(ScenarioInput {
        product_type: ProductType::Cfd,
        direction: Direction::Long,
        start_price: dec!(100),
        leverage: dec!(20),
        investment: dec!(10000),
        horizon_days: 0,
        daily_cost_rate: Decimal::ZERO,
        knockout_level: None,
    })
    .unwrap();
    let changes = DailyChanges::new(vec![dec!(50); 30]).unwrap();
    let out = simulate_path(&s, &changes).unwrap();
    assert_eq!(out.result.final_product_value, Decimal::MAX);
    assert!(!out.warnings.is_empty());
}

#[test]
fn test_oversized_point_count_rejected() {
    assert!(PriceRange::linspace(dec!(70), dec!(130), 4_000_000_000).is_err());
}

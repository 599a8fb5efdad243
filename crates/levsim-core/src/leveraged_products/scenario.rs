use rust_decimal::Decimal;
use rust_decimal_macros::dec;
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;
use tracing::warn;

use crate::error::LevSimError;
use crate::types::{Money, Multiple, Rate};
use crate::LevSimResult;

/// Knockout levels must sit below this multiple of the start price.
const MAX_KNOCKOUT_MULTIPLE: Decimal = dec!(10);

/// Upper bound on simulated holding periods and daily-change sequences.
pub const MAX_HORIZON_DAYS: u32 = 3650;

/// Upper bound on start prices, candidate prices and investments.
pub const MAX_AMOUNT: Decimal = dec!(1_000_000_000_000_000);

pub const MAX_LEVERAGE: Decimal = dec!(1000);

/// Largest single-day move, in percent.
pub const MAX_DAILY_CHANGE_PCT: Decimal = dec!(10000);

/// Upper bound on the number of prices in a generated range.
pub const MAX_PRICE_POINTS: u32 = 100_000;

// ---------------------------------------------------------------------------
// Enums
// ---------------------------------------------------------------------------

/// Product family. Selects the valuation formula.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum ProductType {
    /// Daily-reset leveraged certificate.
    BullBear,
    /// Contract for difference, valued like a daily-reset certificate.
    #[serde(alias = "CFD")]
    Cfd,
    Turbo,
    UnlimitedTurbo,
    MiniFuture,
    Warrant,
    Tracker,
}

impl ProductType {
    pub const ALL: [ProductType; 7] = [
        ProductType::BullBear,
        ProductType::Cfd,
        ProductType::Turbo,
        ProductType::UnlimitedTurbo,
        ProductType::MiniFuture,
        ProductType::Warrant,
        ProductType::Tracker,
    ];

    /// Families that carry a knockout / financing level.
    pub fn has_barrier(self) -> bool {
        matches!(
            self,
            ProductType::Turbo | ProductType::UnlimitedTurbo | ProductType::MiniFuture
        )
    }

    /// Families whose value is discounted by the daily holding cost.
    pub fn bears_holding_cost(self) -> bool {
        matches!(
            self,
            ProductType::Turbo
                | ProductType::UnlimitedTurbo
                | ProductType::MiniFuture
                | ProductType::Tracker
        )
    }

    /// Families where leverage is pinned to 1.
    pub fn is_unlevered(self) -> bool {
        matches!(self, ProductType::Warrant | ProductType::Tracker)
    }

    /// Families valued by compounding a daily-reset leveraged return.
    pub fn is_daily_reset(self) -> bool {
        matches!(self, ProductType::BullBear | ProductType::Cfd)
    }
}

impl fmt::Display for ProductType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ProductType::BullBear => write!(f, "Bull/Bear Certificate"),
            ProductType::Cfd => write!(f, "CFD"),
            ProductType::Turbo => write!(f, "Turbo Certificate"),
            ProductType::UnlimitedTurbo => write!(f, "Unlimited Turbo"),
            ProductType::MiniFuture => write!(f, "Mini Future"),
            ProductType::Warrant => write!(f, "Warrant"),
            ProductType::Tracker => write!(f, "Tracker Certificate"),
        }
    }
}

impl FromStr for ProductType {
    type Err = LevSimError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let key: String = s
            .chars()
            .filter(|c| !matches!(c, '-' | '_' | ' ' | '/'))
            .collect::<String>()
            .to_lowercase();
        match key.as_str() {
            "bullbear" => Ok(ProductType::BullBear),
            "cfd" | "cfds" => Ok(ProductType::Cfd),
            "turbo" => Ok(ProductType::Turbo),
            "unlimitedturbo" => Ok(ProductType::UnlimitedTurbo),
            "minifuture" | "minifutures" => Ok(ProductType::MiniFuture),
            "warrant" | "warrants" => Ok(ProductType::Warrant),
            "tracker" => Ok(ProductType::Tracker),
            _ => Err(LevSimError::InvalidInput {
                field: "product_type".into(),
                reason: format!(
                    "unknown product '{s}'; use bull-bear, cfd, turbo, unlimited-turbo, \
                     mini-future, warrant or tracker"
                ),
            }),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
pub enum Direction {
    #[default]
    Long,
    Short,
}

impl Direction {
    /// +1 for long, -1 for short.
    pub fn sign(self) -> Decimal {
        match self {
            Direction::Long => Decimal::ONE,
            Direction::Short => Decimal::NEGATIVE_ONE,
        }
    }

    /// Inclusive barrier test: touching the level extinguishes the position.
    pub fn is_knocked_out(self, price: Money, barrier: Money) -> bool {
        match self {
            Direction::Long => price <= barrier,
            Direction::Short => price >= barrier,
        }
    }

    /// Conventional knockout when none is supplied: 85% of start for long,
    /// 115% for short.
    pub fn default_knockout(self, start_price: Money) -> Money {
        match self {
            Direction::Long => start_price * dec!(0.85),
            Direction::Short => start_price * dec!(1.15),
        }
    }
}

impl fmt::Display for Direction {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Direction::Long => write!(f, "Long"),
            Direction::Short => write!(f, "Short"),
        }
    }
}

impl FromStr for Direction {
    type Err = LevSimError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_lowercase().as_str() {
            "long" | "bull" => Ok(Direction::Long),
            "short" | "bear" => Ok(Direction::Short),
            _ => Err(LevSimError::InvalidInput {
                field: "direction".into(),
                reason: format!("unknown direction '{s}'; use long or short"),
            }),
        }
    }
}

// ---------------------------------------------------------------------------
// Scenario
// ---------------------------------------------------------------------------

fn default_leverage() -> Multiple {
    Decimal::ONE
}

/// Raw, unvalidated scenario parameters as supplied by a caller.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ScenarioInput {
    pub product_type: ProductType,
    #[serde(default)]
    pub direction: Direction,
    pub start_price: Money,
    #[serde(default = "default_leverage")]
    pub leverage: Multiple,
    pub investment: Money,
    #[serde(default)]
    pub horizon_days: i64,
    #[serde(default)]
    pub daily_cost_rate: Rate,
    #[serde(default)]
    pub knockout_level: Option<Money>,
}

/// Validated instrument parameters. Only constructible through
/// `TryFrom<ScenarioInput>`, so every valuation runs on a checked scenario.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(try_from = "ScenarioInput", into = "ScenarioInput")]
pub struct Scenario {
    product_type: ProductType,
    direction: Direction,
    start_price: Money,
    leverage: Multiple,
    investment: Money,
    horizon_days: u32,
    daily_cost_rate: Rate,
    knockout_level: Option<Money>,
    notes: Vec<String>,
}

fn invalid(field: &str, reason: impl Into<String>) -> LevSimError {
    let reason = reason.into();
    warn!(field, %reason, "rejected scenario input");
    LevSimError::InvalidInput {
        field: field.into(),
        reason,
    }
}

impl TryFrom<ScenarioInput> for Scenario {
    type Error = LevSimError;

    fn try_from(input: ScenarioInput) -> Result<Self, Self::Error> {
        let mut notes = Vec::new();

        if input.start_price <= Decimal::ZERO || input.start_price > MAX_AMOUNT {
            return Err(invalid(
                "start_price",
                format!("must be positive and at most {MAX_AMOUNT}"),
            ));
        }
        if input.investment <= Decimal::ZERO || input.investment > MAX_AMOUNT {
            return Err(invalid(
                "investment",
                format!("must be positive and at most {MAX_AMOUNT}"),
            ));
        }
        if input.leverage < Decimal::ONE || input.leverage > MAX_LEVERAGE {
            return Err(invalid(
                "leverage",
                format!("must be between 1 and {MAX_LEVERAGE}"),
            ));
        }
        if input.horizon_days < 0 {
            return Err(invalid("horizon_days", "must not be negative"));
        }
        if input.horizon_days > i64::from(MAX_HORIZON_DAYS) {
            return Err(invalid(
                "horizon_days",
                format!("must not exceed {MAX_HORIZON_DAYS}"),
            ));
        }
        if input.daily_cost_rate < Decimal::ZERO || input.daily_cost_rate >= Decimal::ONE {
            return Err(invalid("daily_cost_rate", "must be in [0, 1)"));
        }
        if let Some(level) = input.knockout_level {
            let ceiling = input.start_price * MAX_KNOCKOUT_MULTIPLE;
            if level <= Decimal::ZERO || level >= ceiling {
                return Err(invalid(
                    "knockout_level",
                    format!("must lie strictly between 0 and {ceiling}"),
                ));
            }
        }

        let product = input.product_type;

        let leverage = if product.is_unlevered() {
            if input.leverage != Decimal::ONE {
                notes.push(format!(
                    "Leverage {} ignored: {} is valued unlevered",
                    input.leverage, product
                ));
            }
            Decimal::ONE
        } else {
            input.leverage
        };

        let knockout_level = if product.has_barrier() {
            Some(
                input
                    .knockout_level
                    .unwrap_or_else(|| input.direction.default_knockout(input.start_price)),
            )
        } else {
            if input.knockout_level.is_some() {
                notes.push(format!("knockout_level ignored: {product} has no barrier"));
            }
            None
        };

        if input.daily_cost_rate > Decimal::ZERO && !product.bears_holding_cost() {
            notes.push(format!(
                "daily_cost_rate ignored: {product} carries no holding cost"
            ));
        }
        if product == ProductType::Tracker && input.direction == Direction::Short {
            notes.push("Tracker certificates track the underlying long; direction has no effect".into());
        }

        Ok(Scenario {
            product_type: product,
            direction: input.direction,
            start_price: input.start_price,
            leverage,
            investment: input.investment,
            horizon_days: input.horizon_days as u32,
            daily_cost_rate: input.daily_cost_rate,
            knockout_level,
            notes,
        })
    }
}

impl From<Scenario> for ScenarioInput {
    fn from(s: Scenario) -> Self {
        ScenarioInput {
            product_type: s.product_type,
            direction: s.direction,
            start_price: s.start_price,
            leverage: s.leverage,
            investment: s.investment,
            horizon_days: i64::from(s.horizon_days),
            daily_cost_rate: s.daily_cost_rate,
            knockout_level: s.knockout_level,
        }
    }
}

impl Scenario {
    pub fn product_type(&self) -> ProductType {
        self.product_type
    }

    pub fn direction(&self) -> Direction {
        self.direction
    }

    pub fn start_price(&self) -> Money {
        self.start_price
    }

    /// Effective leverage (1 for unlevered families).
    pub fn leverage(&self) -> Multiple {
        self.leverage
    }

    pub fn investment(&self) -> Money {
        self.investment
    }

    pub fn horizon_days(&self) -> u32 {
        self.horizon_days
    }

    pub fn daily_cost_rate(&self) -> Rate {
        self.daily_cost_rate
    }

    /// Resolved barrier for Turbo, UnlimitedTurbo and MiniFuture; `None` otherwise.
    pub fn knockout_level(&self) -> Option<Money> {
        self.knockout_level
    }

    /// Normalisations applied during validation, surfaced as warnings.
    pub fn notes(&self) -> &[String] {
        &self.notes
    }

    /// The same scenario with the holding cost removed.
    pub fn without_holding_cost(&self) -> Scenario {
        Scenario {
            daily_cost_rate: Decimal::ZERO,
            notes: Vec::new(),
            ..self.clone()
        }
    }
}

// ---------------------------------------------------------------------------
// Price range
// ---------------------------------------------------------------------------

/// Ordered candidate end prices for the underlying.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(try_from = "Vec<Money>", into = "Vec<Money>")]
pub struct PriceRange(Vec<Money>);

impl PriceRange {
    pub fn new(prices: Vec<Money>) -> LevSimResult<Self> {
        if let Some(p) = prices.iter().find(|p| **p < Decimal::ZERO) {
            return Err(invalid("price_range", format!("price {p} is negative")));
        }
        if let Some(p) = prices.iter().find(|p| **p > MAX_AMOUNT) {
            return Err(invalid(
                "price_range",
                format!("price {p} exceeds {MAX_AMOUNT}"),
            ));
        }
        Ok(PriceRange(prices))
    }

    /// `points` evenly spaced prices from `low` to `high`, both inclusive.
    pub fn linspace(low: Money, high: Money, points: u32) -> LevSimResult<Self> {
        if low < Decimal::ZERO {
            return Err(invalid("price_range", "low price must not be negative"));
        }
        if low > high {
            return Err(invalid(
                "price_range",
                "low price must not exceed high price",
            ));
        }
        if high > MAX_AMOUNT {
            return Err(invalid(
                "price_range",
                format!("high price must not exceed {MAX_AMOUNT}"),
            ));
        }
        if points == 0 || points > MAX_PRICE_POINTS {
            return Err(invalid(
                "price_range",
                format!("must have between 1 and {MAX_PRICE_POINTS} points"),
            ));
        }
        if points == 1 {
            return Ok(PriceRange(vec![low]));
        }
        let step = (high - low) / Decimal::from(points - 1);
        let mut prices: Vec<Money> = (0..points - 1)
            .map(|i| low + step * Decimal::from(i))
            .collect();
        prices.push(high);
        Ok(PriceRange(prices))
    }

    /// Window of `start_price * low_pct ..= start_price * high_pct`.
    pub fn around(
        start_price: Money,
        low_pct: Rate,
        high_pct: Rate,
        points: u32,
    ) -> LevSimResult<Self> {
        if start_price <= Decimal::ZERO || start_price > MAX_AMOUNT {
            return Err(invalid("start_price", "must be positive"));
        }
        Self::linspace(start_price * low_pct, start_price * high_pct, points)
    }

    pub fn prices(&self) -> &[Money] {
        &self.0
    }

    pub fn len(&self) -> usize {
        self.0.len()
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    pub fn iter(&self) -> impl Iterator<Item = &Money> {
        self.0.iter()
    }
}

impl TryFrom<Vec<Money>> for PriceRange {
    type Error = LevSimError;

    fn try_from(prices: Vec<Money>) -> Result<Self, Self::Error> {
        PriceRange::new(prices)
    }
}

impl From<PriceRange> for Vec<Money> {
    fn from(range: PriceRange) -> Self {
        range.0
    }
}

/// Price window relative to the start price, used when no explicit range is given.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PriceWindow {
    #[serde(default = "PriceWindow::default_low_pct")]
    pub low_pct: Rate,
    #[serde(default = "PriceWindow::default_high_pct")]
    pub high_pct: Rate,
    #[serde(default = "PriceWindow::default_points")]
    pub points: u32,
}

impl PriceWindow {
    fn default_low_pct() -> Rate {
        dec!(0.7)
    }

    fn default_high_pct() -> Rate {
        dec!(1.3)
    }

    fn default_points() -> u32 {
        300
    }

    pub fn to_range(&self, start_price: Money) -> LevSimResult<PriceRange> {
        PriceRange::around(start_price, self.low_pct, self.high_pct, self.points)
    }
}

impl Default for PriceWindow {
    fn default() -> Self {
        PriceWindow {
            low_pct: Self::default_low_pct(),
            high_pct: Self::default_high_pct(),
            points: Self::default_points(),
        }
    }
}

/// Scenario plus the prices to value it at. Either an explicit `price_range`
/// or a `window` around the start price.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CurveInput {
    pub scenario: Scenario,
    #[serde(default)]
    pub price_range: Option<PriceRange>,
    #[serde(default)]
    pub window: PriceWindow,
}

impl CurveInput {
    pub fn resolve_prices(&self) -> LevSimResult<PriceRange> {
        match &self.price_range {
            Some(range) => Ok(range.clone()),
            None => self.window.to_range(self.scenario.start_price()),
        }
    }
}

// ---------------------------------------------------------------------------
// Daily changes
// ---------------------------------------------------------------------------

/// Ordered per-day percentage moves of the underlying (2.5 = +2.5%).
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(try_from = "Vec<Decimal>", into = "Vec<Decimal>")]
pub struct DailyChanges(Vec<Decimal>);

impl DailyChanges {
    pub fn new(changes_pct: Vec<Decimal>) -> LevSimResult<Self> {
        if changes_pct.len() > MAX_HORIZON_DAYS as usize {
            return Err(invalid(
                "daily_changes",
                format!("at most {MAX_HORIZON_DAYS} days are supported"),
            ));
        }
        if let Some((day, c)) = changes_pct
            .iter()
            .enumerate()
            .find(|(_, c)| **c < dec!(-100))
        {
            return Err(invalid(
                "daily_changes",
                format!("day {} move of {c}% would make the price negative", day + 1),
            ));
        }
        if let Some((day, c)) = changes_pct
            .iter()
            .enumerate()
            .find(|(_, c)| **c > MAX_DAILY_CHANGE_PCT)
        {
            return Err(invalid(
                "daily_changes",
                format!("day {} move of {c}% exceeds {MAX_DAILY_CHANGE_PCT}%", day + 1),
            ));
        }
        Ok(DailyChanges(changes_pct))
    }

    pub fn changes_pct(&self) -> &[Decimal] {
        &self.0
    }

    pub fn len(&self) -> usize {
        self.0.len()
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }
}

impl TryFrom<Vec<Decimal>> for DailyChanges {
    type Error = LevSimError;

    fn try_from(changes: Vec<Decimal>) -> Result<Self, Self::Error> {
        DailyChanges::new(changes)
    }
}

impl From<DailyChanges> for Vec<Decimal> {
    fn from(changes: DailyChanges) -> Self {
        changes.0
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------

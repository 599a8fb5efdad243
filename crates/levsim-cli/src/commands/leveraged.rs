use chrono::NaiveDate;
use clap::Args;
use rust_decimal::Decimal;
use serde_json::Value;
use tracing::{debug, info};

use levsim_core::leveraged_products::fees;
use levsim_core::leveraged_products::path::{self, PathInput};
use levsim_core::leveraged_products::payoff;
use levsim_core::leveraged_products::random_walk::RandomWalkParams;
use levsim_core::leveraged_products::{
    CurveInput, DailyChanges, Direction, PriceRange, PriceWindow, ProductType, Scenario,
    ScenarioInput,
};
use levsim_core::market::{self, StaticQuotes};

use crate::input;

/// Instrument parameters given as flags
#[derive(Args)]
pub struct ScenarioArgs {
    /// Product: bull-bear, cfd, turbo, unlimited-turbo, mini-future, warrant, tracker
    #[arg(long, default_value = "bull-bear")]
    pub product: ProductType,

    /// Position direction: long or short
    #[arg(long, default_value = "long")]
    pub direction: Direction,

    /// Leverage multiple (pinned to 1 for warrants and trackers)
    #[arg(long, default_value = "5")]
    pub leverage: Decimal,

    /// Start price of the underlying; fallback when --asset has no quote
    #[arg(long, default_value = "100")]
    pub start_price: Decimal,

    /// Amount invested
    #[arg(long, default_value = "10000")]
    pub investment: Decimal,

    /// Holding period in days
    #[arg(long, default_value = "0", allow_negative_numbers = true)]
    pub horizon_days: i64,

    /// Daily holding cost as a fraction (e.g. 0.0002)
    #[arg(long, default_value = "0")]
    pub daily_cost_rate: Decimal,

    /// Knockout level for turbos and mini futures (default 85% / 115% of start)
    #[arg(long)]
    pub knockout: Option<Decimal>,

    /// JSON file mapping asset names to current prices
    #[arg(long, requires = "asset")]
    pub quotes: Option<String>,

    /// Asset to look up in --quotes
    #[arg(long)]
    pub asset: Option<String>,
}

impl ScenarioArgs {
    fn start_price(&self) -> Result<Decimal, Box<dyn std::error::Error>> {
        match (&self.quotes, &self.asset) {
            (Some(path), Some(asset)) => {
                let quotes: StaticQuotes = input::file::read_input(path)?;
                let resolved = market::resolve_start_price(&quotes, asset, self.start_price)?;
                info!(
                    asset = %resolved.asset,
                    price = %resolved.price,
                    origin = ?resolved.origin,
                    "resolved start price"
                );
                Ok(resolved.price)
            }
            _ => Ok(self.start_price),
        }
    }

    fn to_scenario(&self) -> Result<Scenario, Box<dyn std::error::Error>> {
        let scenario = Scenario::try_from(ScenarioInput {
            product_type: self.product,
            direction: self.direction,
            start_price: self.start_price()?,
            leverage: self.leverage,
            investment: self.investment,
            horizon_days: self.horizon_days,
            daily_cost_rate: self.daily_cost_rate,
            knockout_level: self.knockout,
        })?;
        Ok(scenario)
    }
}

/// Price scenario given as flags
#[derive(Args)]
pub struct WindowArgs {
    /// Lowest candidate end price (default 70% of start)
    #[arg(long, requires = "price_high")]
    pub price_low: Option<Decimal>,

    /// Highest candidate end price (default 130% of start)
    #[arg(long, requires = "price_low")]
    pub price_high: Option<Decimal>,

    /// Number of evenly spaced prices
    #[arg(long, default_value = "300")]
    pub points: u32,
}

impl WindowArgs {
    fn to_range(&self, start_price: Decimal) -> Result<PriceRange, Box<dyn std::error::Error>> {
        let range = match (self.price_low, self.price_high) {
            (Some(low), Some(high)) => PriceRange::linspace(low, high, self.points)?,
            _ => PriceWindow {
                points: self.points,
                ..PriceWindow::default()
            }
            .to_range(start_price)?,
        };
        Ok(range)
    }
}

/// Arguments for payoff curves and fee impact
#[derive(Args)]
pub struct CurveArgs {
    /// Path to JSON/YAML request file (overrides flags)
    #[arg(long)]
    pub input: Option<String>,

    #[command(flatten)]
    pub scenario: ScenarioArgs,

    #[command(flatten)]
    pub window: WindowArgs,
}

/// Arguments for the daily path simulation
#[derive(Args)]
pub struct PathArgs {
    /// Path to JSON/YAML request file (overrides flags)
    #[arg(long)]
    pub input: Option<String>,

    #[command(flatten)]
    pub scenario: ScenarioArgs,

    /// Comma-separated daily moves in percent (e.g. "2,-1.5,3")
    #[arg(long, value_delimiter = ',', allow_hyphen_values = true, conflicts_with = "random_days")]
    pub changes: Option<Vec<Decimal>>,

    /// Generate this many normally distributed daily moves instead of --changes
    #[arg(long)]
    pub random_days: Option<u32>,

    /// Mean daily move in percent for --random-days
    #[arg(long, default_value = "0", allow_negative_numbers = true)]
    pub drift_pct: f64,

    /// Daily move standard deviation in percent for --random-days
    #[arg(long, default_value = "2")]
    pub volatility_pct: f64,

    /// Seed for --random-days
    #[arg(long)]
    pub seed: Option<u64>,

    /// Date of day 0 (YYYY-MM-DD)
    #[arg(long)]
    pub start_date: Option<NaiveDate>,
}

fn curve_request(args: &CurveArgs) -> Result<(Scenario, PriceRange), Box<dyn std::error::Error>> {
    let request: Option<CurveInput> = if let Some(ref path) = args.input {
        Some(input::file::read_input(path)?)
    } else if let Some(data) = input::stdin::read_stdin()? {
        Some(serde_json::from_value(data)?)
    } else {
        None
    };

    match request {
        Some(req) => {
            debug!("scenario read from request document");
            let range = req.resolve_prices()?;
            Ok((req.scenario, range))
        }
        None => {
            let scenario = args.scenario.to_scenario()?;
            let range = args.window.to_range(scenario.start_price())?;
            Ok((scenario, range))
        }
    }
}

pub fn run_curve(args: CurveArgs) -> Result<Value, Box<dyn std::error::Error>> {
    let (scenario, range) = curve_request(&args)?;
    let result = payoff::compute_curve(&scenario, &range)?;
    Ok(serde_json::to_value(result)?)
}

pub fn run_fee_impact(args: CurveArgs) -> Result<Value, Box<dyn std::error::Error>> {
    let (scenario, range) = curve_request(&args)?;
    let result = fees::estimate_fee_impact(&scenario, &range)?;
    Ok(serde_json::to_value(result)?)
}

pub fn run_path(args: PathArgs) -> Result<Value, Box<dyn std::error::Error>> {
    let request: PathInput = if let Some(ref path) = args.input {
        input::file::read_input(path)?
    } else if let Some(data) = input::stdin::read_stdin()? {
        serde_json::from_value(data)?
    } else {
        let daily_changes = match (&args.changes, args.random_days) {
            (Some(changes), _) => DailyChanges::new(changes.clone())?,
            (None, Some(days)) => DailyChanges::random_walk(&RandomWalkParams {
                days,
                drift_pct: args.drift_pct,
                volatility_pct: args.volatility_pct,
                seed: args.seed,
            })?,
            (None, None) => {
                return Err(
                    "--changes, --random-days, --input <file> or stdin required for path simulation"
                        .into(),
                )
            }
        };
        PathInput {
            scenario: args.scenario.to_scenario()?,
            daily_changes,
            start_date: args.start_date,
        }
    };

    let result =
        path::simulate_dated_path(&request.scenario, &request.daily_changes, request.start_date)?;
    Ok(serde_json::to_value(result)?)
}

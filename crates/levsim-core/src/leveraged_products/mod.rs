pub mod scenario;

#[cfg(feature = "payoff_curve")]
pub mod payoff;

#[cfg(feature = "daily_path")]
pub mod path;

#[cfg(feature = "fee_impact")]
pub mod fees;

#[cfg(feature = "scenarios")]
pub mod random_walk;

pub use scenario::{
    CurveInput, DailyChanges, Direction, PriceRange, PriceWindow, ProductType, Scenario,
    ScenarioInput,
};

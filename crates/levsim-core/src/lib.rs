pub mod compounding;
pub mod error;
pub mod leveraged_products;
pub mod market;
pub mod types;

pub use error::LevSimError;
pub use types::*;

/// Standard result type for all levsim operations
pub type LevSimResult<T> = Result<T, LevSimError>;

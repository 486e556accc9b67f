pub mod error;
pub mod time_value;
pub mod types;

#[cfg(feature = "financing")]
pub mod financing;

#[cfg(feature = "cashflow")]
pub mod cashflow;

pub use error::RentalReturnsError;
pub use types::*;

/// Standard result type for all rental-returns operations
pub type RentalReturnsResult<T> = Result<T, RentalReturnsError>;

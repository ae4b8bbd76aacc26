//! SQLite backend for the Le Yellowjack repository.
//!
//! Money and rates are stored as TEXT decimal strings and parsed back
//! into [`rust_decimal::Decimal`] so no value ever passes through
//! floating point. Timestamps are TEXT in `%Y-%m-%d %H:%M:%S`.

mod factory;
mod repository;

pub use factory::SqliteRepositoryFactory;
pub use repository::SqliteRepository;

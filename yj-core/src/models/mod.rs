mod config_entry;
mod facts;
mod fraction;
mod performance_record;
mod role;
mod tax_bracket;
mod week_record;

pub use config_entry::ConfigEntry;
pub use facts::{CleaningTotals, SalesTotals};
pub use fraction::{Fraction, FractionError};
pub use performance_record::PerformanceRecord;
pub use role::Role;
pub use tax_bracket::{BracketContribution, TaxBracket};
pub use week_record::WeekRecord;

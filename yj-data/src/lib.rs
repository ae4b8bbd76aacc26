//! CSV import for the progressive tax schedule.

mod loader;

pub use loader::{BracketRecord, ScheduleLoader, ScheduleLoaderError};

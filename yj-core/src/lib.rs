pub mod calculations;
pub mod db;
pub mod engine;
pub mod models;

pub use db::repository::{RepositoryError, YellowjackRepository};
pub use models::*;

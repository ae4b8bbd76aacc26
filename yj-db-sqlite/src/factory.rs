use async_trait::async_trait;

use yj_core::db::{DbConfig, RepositoryError, RepositoryFactory};
use yj_core::YellowjackRepository;

use crate::repository::SqliteRepository;

/// [`RepositoryFactory`] for SQLite.
///
/// Register this with a [`yj_core::db::RepositoryRegistry`] to make
/// the `"sqlite"` backend available:
///
/// ```rust,no_run
/// use yj_core::db::RepositoryRegistry;
/// use yj_db_sqlite::SqliteRepositoryFactory;
///
/// let mut registry = RepositoryRegistry::new();
/// registry.register(Box::new(SqliteRepositoryFactory));
/// ```
pub struct SqliteRepositoryFactory;

#[async_trait]
impl RepositoryFactory for SqliteRepositoryFactory {
    fn backend_name(&self) -> &'static str {
        "sqlite"
    }

    /// Open the database described by `config.connection_string` and
    /// bring its schema up to date.
    ///
    /// The connection string is a sqlx SQLite URL:
    /// * `sqlite:yellowjack.db?mode=rwc` — a file, created on demand;
    /// * `sqlite::memory:` — an ephemeral in-memory database.
    async fn create(
        &self,
        config: &DbConfig,
    ) -> Result<Box<dyn YellowjackRepository>, RepositoryError> {
        let repo = SqliteRepository::new(&config.connection_string).await?;
        repo.run_migrations().await?;
        Ok(Box::new(repo))
    }
}

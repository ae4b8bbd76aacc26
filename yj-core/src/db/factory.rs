use std::collections::HashMap;

use async_trait::async_trait;

use super::repository::{RepositoryError, YellowjackRepository};

/// Backend-agnostic connection configuration.
///
/// `backend` must match the [`RepositoryFactory::backend_name`] of a
/// registered factory. `connection_string` is passed through to that
/// factory unchanged; its meaning is entirely backend-specific (for
/// `sqlite`: a sqlx URL such as `sqlite:yellowjack.db?mode=rwc` or
/// `sqlite::memory:`).
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DbConfig {
    pub backend: String,
    pub connection_string: String,
}

impl Default for DbConfig {
    fn default() -> Self {
        Self {
            backend: "sqlite".to_string(),
            connection_string: "sqlite::memory:".to_string(),
        }
    }
}

/// One implementation per database backend. Each backend crate exports
/// a unit struct implementing this trait and registers it with a
/// [`RepositoryRegistry`] at startup.
#[async_trait]
pub trait RepositoryFactory: Send + Sync {
    /// Unique, lowercase identifier for this backend.
    fn backend_name(&self) -> &'static str;

    /// Open (or create) a connection and return a ready-to-use
    /// repository. Implementations may run migrations here.
    async fn create(
        &self,
        config: &DbConfig,
    ) -> Result<Box<dyn YellowjackRepository>, RepositoryError>;
}

/// Registry of [`RepositoryFactory`] instances, keyed by backend name.
pub struct RepositoryRegistry {
    factories: HashMap<&'static str, Box<dyn RepositoryFactory>>,
}

impl RepositoryRegistry {
    pub fn new() -> Self {
        Self {
            factories: HashMap::new(),
        }
    }

    /// Registers a backend factory, replacing any previous factory
    /// with the same name.
    pub fn register(&mut self, factory: Box<dyn RepositoryFactory>) {
        self.factories.insert(factory.backend_name(), factory);
    }

    /// Names of every registered backend, sorted alphabetically.
    pub fn available_backends(&self) -> Vec<&'static str> {
        let mut names: Vec<_> = self.factories.keys().copied().collect();
        names.sort_unstable();
        names
    }

    /// Dispatches to the factory matching `config.backend`.
    ///
    /// # Errors
    ///
    /// * [`RepositoryError::Configuration`] — no factory is registered
    ///   for the requested backend name.
    /// * Any error the chosen factory itself returns.
    pub async fn create(
        &self,
        config: &DbConfig,
    ) -> Result<Box<dyn YellowjackRepository>, RepositoryError> {
        let factory = self.factories.get(config.backend.as_str()).ok_or_else(|| {
            RepositoryError::Configuration(format!(
                "unknown backend '{}'; available: {:?}",
                config.backend,
                self.available_backends()
            ))
        })?;

        factory.create(config).await
    }
}

impl Default for RepositoryRegistry {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use std::sync::Arc;
    use std::sync::atomic::{AtomicBool, Ordering};

    use async_trait::async_trait;
    use chrono::{DateTime, NaiveDate, NaiveDateTime, Utc};

    use crate::models::{
        CleaningTotals, ConfigEntry, PerformanceRecord, SalesTotals, TaxBracket, WeekRecord,
    };

    use super::{
        DbConfig, RepositoryError, RepositoryFactory, RepositoryRegistry, YellowjackRepository,
    };

    // Stub repository: the registry tests only verify routing, so no
    // method is ever called.
    struct StubRepository;

    #[async_trait]
    impl YellowjackRepository for StubRepository {
        async fn list_config_entries(&self) -> Result<Vec<ConfigEntry>, RepositoryError> {
            unimplemented!()
        }
        async fn upsert_config_entry(&self, _entry: &ConfigEntry) -> Result<(), RepositoryError> {
            unimplemented!()
        }
        async fn get_tax_brackets(&self) -> Result<Vec<TaxBracket>, RepositoryError> {
            unimplemented!()
        }
        async fn replace_tax_brackets(
            &self,
            _brackets: &[TaxBracket],
        ) -> Result<(), RepositoryError> {
            unimplemented!()
        }
        async fn list_open_weeks(&self) -> Result<Vec<WeekRecord>, RepositoryError> {
            unimplemented!()
        }
        async fn find_week(
            &self,
            _week_start: NaiveDate,
        ) -> Result<Option<WeekRecord>, RepositoryError> {
            unimplemented!()
        }
        async fn insert_week(
            &self,
            _week_start: NaiveDate,
            _week_end: NaiveDate,
        ) -> Result<WeekRecord, RepositoryError> {
            unimplemented!()
        }
        async fn reopen_week(&self, _week_start: NaiveDate) -> Result<(), RepositoryError> {
            unimplemented!()
        }
        async fn update_week_totals(&self, _week: &WeekRecord) -> Result<(), RepositoryError> {
            unimplemented!()
        }
        async fn finalize_week(
            &self,
            _week_start: NaiveDate,
            _finalized_at: DateTime<Utc>,
        ) -> Result<(), RepositoryError> {
            unimplemented!()
        }
        async fn list_performance(
            &self,
            _week_start: NaiveDate,
        ) -> Result<Vec<PerformanceRecord>, RepositoryError> {
            unimplemented!()
        }
        async fn seed_performance(
            &self,
            _week_start: NaiveDate,
            _user_ids: &[i64],
        ) -> Result<(), RepositoryError> {
            unimplemented!()
        }
        async fn upsert_performance(
            &self,
            _record: &PerformanceRecord,
        ) -> Result<(), RepositoryError> {
            unimplemented!()
        }
        async fn finalize_performance(&self, _week_start: NaiveDate) -> Result<(), RepositoryError> {
            unimplemented!()
        }
        async fn list_active_employees(&self) -> Result<Vec<i64>, RepositoryError> {
            unimplemented!()
        }
        async fn sales_totals(
            &self,
            _from: NaiveDateTime,
            _to: NaiveDateTime,
            _user_id: Option<i64>,
        ) -> Result<SalesTotals, RepositoryError> {
            unimplemented!()
        }
        async fn cleaning_totals(
            &self,
            _from: NaiveDateTime,
            _to: NaiveDateTime,
            _user_id: Option<i64>,
        ) -> Result<CleaningTotals, RepositoryError> {
            unimplemented!()
        }
        async fn delete_finalized_weeks_before(
            &self,
            _cutoff: NaiveDate,
        ) -> Result<u64, RepositoryError> {
            unimplemented!()
        }
    }

    /// Flips an `AtomicBool` on `create` so tests can prove the
    /// registry reached the right factory.
    struct StubFactory {
        name: &'static str,
        called: Arc<AtomicBool>,
    }

    #[async_trait]
    impl RepositoryFactory for StubFactory {
        fn backend_name(&self) -> &'static str {
            self.name
        }
        async fn create(
            &self,
            _config: &DbConfig,
        ) -> Result<Box<dyn YellowjackRepository>, RepositoryError> {
            self.called.store(true, Ordering::SeqCst);
            Ok(Box::new(StubRepository))
        }
    }

    struct FailingFactory;

    #[async_trait]
    impl RepositoryFactory for FailingFactory {
        fn backend_name(&self) -> &'static str {
            "failing"
        }
        async fn create(
            &self,
            _config: &DbConfig,
        ) -> Result<Box<dyn YellowjackRepository>, RepositoryError> {
            Err(RepositoryError::Connection(
                "intentional failure".to_string(),
            ))
        }
    }

    fn stub_factory(name: &'static str) -> (Box<dyn RepositoryFactory>, Arc<AtomicBool>) {
        let flag = Arc::new(AtomicBool::new(false));
        (
            Box::new(StubFactory {
                name,
                called: flag.clone(),
            }),
            flag,
        )
    }

    #[test]
    fn new_registry_has_no_backends() {
        assert!(RepositoryRegistry::new().available_backends().is_empty());
    }

    #[test]
    fn available_backends_is_sorted() {
        let mut reg = RepositoryRegistry::new();
        let (f1, _) = stub_factory("sqlite");
        let (f2, _) = stub_factory("postgres");
        reg.register(f1);
        reg.register(f2);
        assert_eq!(reg.available_backends(), vec!["postgres", "sqlite"]);
    }

    #[test]
    fn duplicate_registration_replaces_previous() {
        let mut reg = RepositoryRegistry::new();
        let (old, _) = stub_factory("sqlite");
        let (new, _) = stub_factory("sqlite");
        reg.register(old);
        reg.register(new);
        assert_eq!(reg.available_backends(), vec!["sqlite"]);
    }

    #[tokio::test]
    async fn create_calls_matching_factory() {
        let mut reg = RepositoryRegistry::new();
        let (factory, called) = stub_factory("sqlite");
        reg.register(factory);

        let result = reg.create(&DbConfig::default()).await;

        assert!(result.is_ok(), "expected Ok, got {:#?}", result.err());
        assert!(called.load(Ordering::SeqCst), "factory was not invoked");
    }

    #[tokio::test]
    async fn unknown_backend_is_a_configuration_error() {
        let mut reg = RepositoryRegistry::new();
        let (f, _) = stub_factory("sqlite");
        reg.register(f);

        let config = DbConfig {
            backend: "postgres".to_string(),
            connection_string: "x".to_string(),
        };

        match reg.create(&config).await {
            Err(RepositoryError::Configuration(msg)) => {
                assert!(msg.contains("postgres"), "names the requested backend");
                assert!(msg.contains("sqlite"), "lists available backends");
            }
            other => panic!("expected Configuration error, got {:#?}", other.err()),
        }
    }

    #[tokio::test]
    async fn create_propagates_factory_errors() {
        let mut reg = RepositoryRegistry::new();
        reg.register(Box::new(FailingFactory));

        let config = DbConfig {
            backend: "failing".to_string(),
            connection_string: "x".to_string(),
        };

        let err = reg.create(&config).await.err();
        assert_eq!(
            err,
            Some(RepositoryError::Connection(
                "intentional failure".to_string()
            ))
        );
    }
}

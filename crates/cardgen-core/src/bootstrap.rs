//! Application assembly.
//!
//! [`Application`] loads the configuration, populates a [`ServiceRegistry`]
//! with the well-known services and exposes typed accessors for them.

use std::io::Read;
use std::sync::Arc;

use log::{debug, info, warn};

use crate::config::{Config, ConfigLoader, EnvSource, ProcessEnv, StorageType};
use crate::error::{CardgenError, Result};
use crate::generator::{CardGenerator, PngCardGenerator};
use crate::parser::{CardReader, CardReaderFactory};
use crate::registry::{Recipe, ServiceRegistry};
use crate::storage::{CardStore, MemoryStore};

/// Registry name of the configuration record.
pub const CONFIG_SERVICE: &str = "config";
/// Registry name of the card store.
pub const CARD_STORE_SERVICE: &str = "cardStore";
/// Registry name of the image generator.
pub const CARD_GENERATOR_SERVICE: &str = "cardGenerator";
/// Registry name of the record reader factory.
pub const CARD_READER_FACTORY_SERVICE: &str = "csvParserFactory";

/// Card store as held in the registry.
pub type SharedCardStore = Arc<dyn CardStore>;
/// Image generator as held in the registry.
pub type SharedCardGenerator = Arc<dyn CardGenerator>;

/// A configured application with its service registry.
#[derive(Debug)]
pub struct Application {
    config: Arc<Config>,
    registry: ServiceRegistry,
}

impl Application {
    /// Load configuration for `environment` from the process environment and
    /// assemble the application.
    pub fn new(environment: Option<&str>) -> Result<Self> {
        Self::with_env(environment, ProcessEnv)
    }

    /// Like [`new`](Self::new), reading variables from `env`.
    pub fn with_env<E: EnvSource>(environment: Option<&str>, env: E) -> Result<Self> {
        let config = ConfigLoader::new(env)
            .load(environment)
            .map_err(|err| CardgenError::downstream("Failed to load configuration", err))?;
        Self::from_config(config)
    }

    /// Assemble an application around an already loaded configuration.
    ///
    /// # Errors
    ///
    /// Each registration failure is wrapped with the service it was
    /// registering; an unimplemented storage backend surfaces as
    /// `UnsupportedStorageType` under "Failed to register storage".
    /// Registration stops at the first failure.
    pub fn from_config(config: Config) -> Result<Self> {
        let config = Arc::new(config);
        let registry = ServiceRegistry::new();

        let shared = Arc::clone(&config);
        registry
            .register_shared(CONFIG_SERVICE, Recipe::new(move || Config::clone(&shared)))
            .map_err(|err| CardgenError::downstream("Failed to register configuration", err))?;

        store_recipe(config.storage.storage_type)
            .and_then(|recipe| registry.register_shared(CARD_STORE_SERVICE, recipe))
            .map_err(|err| CardgenError::downstream("Failed to register storage", err))?;

        let shared = Arc::clone(&config);
        registry
            .register_shared(
                CARD_GENERATOR_SERVICE,
                Recipe::fallible(move || {
                    PngCardGenerator::new(&shared.generator)
                        .map(|generator| Arc::new(generator) as SharedCardGenerator)
                }),
            )
            .map_err(|err| CardgenError::downstream("Failed to register card generator", err))?;

        registry
            .register_fresh(CARD_READER_FACTORY_SERVICE, Recipe::new(CardReaderFactory::new))
            .map_err(|err| CardgenError::downstream("Failed to register reader factory", err))?;

        info!(
            "Application assembled (environment: {}, storage: {})",
            config.server.environment, config.storage.storage_type
        );
        Ok(Self { config, registry })
    }

    pub fn config(&self) -> &Config {
        &self.config
    }

    pub fn registry(&self) -> &ServiceRegistry {
        &self.registry
    }

    /// Configuration record as registered under [`CONFIG_SERVICE`].
    pub fn resolved_config(&self) -> Result<Arc<Config>> {
        self.registry.resolve_as::<Config>(CONFIG_SERVICE)
    }

    pub fn card_store(&self) -> Result<SharedCardStore> {
        self.registry
            .resolve_as::<SharedCardStore>(CARD_STORE_SERVICE)
            .map(|store| Arc::clone(&*store))
    }

    pub fn card_generator(&self) -> Result<SharedCardGenerator> {
        self.registry
            .resolve_as::<SharedCardGenerator>(CARD_GENERATOR_SERVICE)
            .map(|generator| Arc::clone(&*generator))
    }

    /// A new reader factory on every call.
    pub fn card_reader_factory(&self) -> Result<Arc<CardReaderFactory>> {
        self.registry
            .resolve_as::<CardReaderFactory>(CARD_READER_FACTORY_SERVICE)
    }

    /// Open a materializer over `input`.
    pub fn card_reader<R: Read>(&self, input: R) -> Result<CardReader<R>> {
        self.card_reader_factory()?.reader(input)
    }

    /// Release the store and generator, then clear the registry.
    ///
    /// Every close is attempted even if an earlier one fails; the first
    /// failure is returned after the registry has been cleared.
    pub fn shutdown(&self) -> Result<()> {
        info!("Shutting down application");
        let mut first_error: Option<CardgenError> = None;

        match self.card_store() {
            Ok(store) => {
                if let Err(err) = store.close() {
                    warn!("Failed to close card store: {}", err);
                    first_error.get_or_insert(CardgenError::downstream(
                        "Failed to close card store",
                        err,
                    ));
                }
            }
            Err(err) => warn!("Card store unavailable during shutdown: {}", err),
        }

        match self.card_generator() {
            Ok(generator) => {
                if let Err(err) = generator.close() {
                    warn!("Failed to close card generator: {}", err);
                    first_error.get_or_insert(CardgenError::downstream(
                        "Failed to close card generator",
                        err,
                    ));
                }
            }
            Err(err) => warn!("Card generator unavailable during shutdown: {}", err),
        }

        self.registry.clear();
        debug!("Registry cleared");

        match first_error {
            Some(err) => Err(err),
            None => Ok(()),
        }
    }
}

fn store_recipe(storage_type: StorageType) -> Result<Recipe> {
    match storage_type {
        StorageType::Memory => {}
        StorageType::File => warn!(
            "Storage type '{}' has no dedicated backend, using in-memory store",
            storage_type
        ),
        StorageType::S3 | StorageType::Gcs => {
            return Err(CardgenError::UnsupportedStorageType(
                storage_type.to_string(),
            ))
        }
    }
    Ok(Recipe::new(|| Arc::new(MemoryStore::new()) as SharedCardStore))
}

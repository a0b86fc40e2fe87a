//! Named service registry with shared and fresh lifetimes.
//!
//! A [`ServiceRegistry`] maps names to [`Recipe`]s. Resolving a name invokes
//! the recipe and hands back a type-erased [`Product`]; typed callers use
//! [`ServiceRegistry::resolve_as`] to project it back to a concrete type.
//!
//! Recipes take no arguments. A recipe that needs another service captures
//! it (or a handle to the registry) when it is built.
//!
//! Locking discipline:
//! - lookups and enumeration take the read lock;
//! - register, cache installation and clear take the write lock;
//! - recipes always run with no lock held, so they may re-enter the registry.
//!
//! Two threads may race to construct the same shared product. The first one
//! to install its product wins and the loser returns the installed product,
//! so every caller observes a single shared instance.

use std::any::{type_name, Any, TypeId};
use std::collections::HashMap;
use std::fmt;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::{Arc, PoisonError, RwLock, RwLockReadGuard, RwLockWriteGuard};

use log::debug;

use crate::error::{CardgenError, Result};

/// A type-erased service instance.
pub type Product = Arc<dyn Any + Send + Sync>;

type BuildFn = dyn Fn() -> Result<Product> + Send + Sync;

/// How long a resolved product lives.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Lifetime {
    /// First resolution constructs; later resolutions return the cached product.
    Shared,
    /// Every resolution constructs a new product.
    Fresh,
}

/// A construction recipe for a service.
#[derive(Clone)]
pub struct Recipe {
    build: Arc<BuildFn>,
    output: TypeId,
    output_name: &'static str,
}

impl Recipe {
    /// Build a recipe from an infallible constructor.
    pub fn new<T, F>(constructor: F) -> Self
    where
        T: Any + Send + Sync,
        F: Fn() -> T + Send + Sync + 'static,
    {
        Self {
            build: Arc::new(move || Ok(Arc::new(constructor()) as Product)),
            output: TypeId::of::<T>(),
            output_name: type_name::<T>(),
        }
    }

    /// Build a recipe from a constructor that may fail.
    pub fn fallible<T, E, F>(constructor: F) -> Self
    where
        T: Any + Send + Sync,
        E: Into<CardgenError>,
        F: Fn() -> std::result::Result<T, E> + Send + Sync + 'static,
    {
        Self {
            build: Arc::new(move || {
                constructor()
                    .map(|value| Arc::new(value) as Product)
                    .map_err(Into::into)
            }),
            output: TypeId::of::<T>(),
            output_name: type_name::<T>(),
        }
    }

    /// Name of the type this recipe produces.
    pub fn output_type(&self) -> &'static str {
        self.output_name
    }

    fn validate(&self, name: &str) -> Result<()> {
        if self.output == TypeId::of::<()>() {
            return Err(CardgenError::InvalidRecipe {
                name: name.to_string(),
                reason: "recipe must produce a value".to_string(),
            });
        }
        Ok(())
    }

    fn invoke(&self) -> Result<Product> {
        (self.build)()
    }
}

impl fmt::Debug for Recipe {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Recipe")
            .field("output", &self.output_name)
            .finish()
    }
}

struct Descriptor {
    recipe: Recipe,
    lifetime: Lifetime,
    instance: Option<Product>,
    // Bumped on every registration so a slow construction cannot install
    // its product into a descriptor that replaced the one it started from.
    generation: u64,
}

/// Thread-safe registry of named service recipes.
#[derive(Default)]
pub struct ServiceRegistry {
    services: RwLock<HashMap<String, Descriptor>>,
    generations: AtomicU64,
}

impl ServiceRegistry {
    /// Create an empty registry.
    pub fn new() -> Self {
        Self::default()
    }

    /// Register a recipe whose product is constructed once and then cached.
    ///
    /// Replaces any previous registration under `name`, discarding its
    /// cached product.
    ///
    /// # Errors
    ///
    /// Returns `CardgenError::InvalidRecipe` if the recipe produces no value.
    pub fn register_shared(&self, name: impl Into<String>, recipe: Recipe) -> Result<()> {
        self.register(name.into(), recipe, Lifetime::Shared)
    }

    /// Register a recipe that is invoked on every resolution.
    ///
    /// # Errors
    ///
    /// Returns `CardgenError::InvalidRecipe` if the recipe produces no value.
    pub fn register_fresh(&self, name: impl Into<String>, recipe: Recipe) -> Result<()> {
        self.register(name.into(), recipe, Lifetime::Fresh)
    }

    fn register(&self, name: String, recipe: Recipe, lifetime: Lifetime) -> Result<()> {
        recipe.validate(&name)?;
        let generation = self.generations.fetch_add(1, Ordering::Relaxed);
        debug!(
            "registering {:?} service {} ({})",
            lifetime,
            name,
            recipe.output_type()
        );
        self.write().insert(
            name,
            Descriptor {
                recipe,
                lifetime,
                instance: None,
                generation,
            },
        );
        Ok(())
    }

    /// Resolve a service by name.
    ///
    /// # Errors
    ///
    /// Returns `CardgenError::Unregistered` for unknown names and
    /// `CardgenError::Service` when the recipe fails. A failed resolution
    /// leaves the registry unchanged.
    pub fn resolve(&self, name: &str) -> Result<Product> {
        self.resolve_entry(name).map(|(product, _)| product)
    }

    /// Resolve a service and project it to `T`.
    ///
    /// # Errors
    ///
    /// In addition to the errors of [`resolve`](Self::resolve), returns
    /// `CardgenError::TypeMismatch` when the product is not a `T`.
    pub fn resolve_as<T>(&self, name: &str) -> Result<Arc<T>>
    where
        T: Any + Send + Sync,
    {
        let (product, actual) = self.resolve_entry(name)?;
        product
            .downcast::<T>()
            .map_err(|_| CardgenError::TypeMismatch {
                name: name.to_string(),
                expected: type_name::<T>(),
                actual,
            })
    }

    /// Resolve a service and store it in `destination`.
    ///
    /// `destination` is only written on success.
    pub fn resolve_into<T>(&self, name: &str, destination: &mut Option<Arc<T>>) -> Result<()>
    where
        T: Any + Send + Sync,
    {
        let product = self.resolve_as::<T>(name)?;
        *destination = Some(product);
        Ok(())
    }

    fn resolve_entry(&self, name: &str) -> Result<(Product, &'static str)> {
        let (recipe, lifetime, generation) = {
            let services = self.read();
            let descriptor = services
                .get(name)
                .ok_or_else(|| CardgenError::Unregistered(name.to_string()))?;
            if let Some(instance) = &descriptor.instance {
                return Ok((Arc::clone(instance), descriptor.recipe.output_type()));
            }
            (
                descriptor.recipe.clone(),
                descriptor.lifetime,
                descriptor.generation,
            )
        };

        debug!("constructing service {}", name);
        let instance = recipe.invoke().map_err(|err| CardgenError::Service {
            name: name.to_string(),
            source: Box::new(err),
        })?;

        if lifetime == Lifetime::Shared {
            let mut services = self.write();
            if let Some(descriptor) = services.get_mut(name) {
                if descriptor.generation == generation {
                    match &descriptor.instance {
                        Some(existing) => {
                            return Ok((Arc::clone(existing), recipe.output_type()));
                        }
                        None => descriptor.instance = Some(Arc::clone(&instance)),
                    }
                }
            }
        }

        Ok((instance, recipe.output_type()))
    }

    /// Names of all registered services, in no particular order.
    pub fn list_registered(&self) -> Vec<String> {
        self.read().keys().cloned().collect()
    }

    /// Check whether `name` is registered.
    pub fn is_registered(&self, name: &str) -> bool {
        self.read().contains_key(name)
    }

    /// Lifetime of the service registered under `name`.
    pub fn lifetime(&self, name: &str) -> Option<Lifetime> {
        self.read().get(name).map(|d| d.lifetime)
    }

    /// Remove every registration and cached product.
    pub fn clear(&self) {
        let mut services = self.write();
        debug!("clearing {} registered services", services.len());
        services.clear();
    }

    fn read(&self) -> RwLockReadGuard<'_, HashMap<String, Descriptor>> {
        self.services.read().unwrap_or_else(PoisonError::into_inner)
    }

    fn write(&self) -> RwLockWriteGuard<'_, HashMap<String, Descriptor>> {
        self.services.write().unwrap_or_else(PoisonError::into_inner)
    }
}

impl fmt::Debug for ServiceRegistry {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let mut names = self.list_registered();
        names.sort();
        f.debug_struct("ServiceRegistry")
            .field("services", &names)
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::atomic::AtomicUsize;

    #[derive(Debug)]
    struct Counter(usize);

    fn counting_recipe(calls: &Arc<AtomicUsize>) -> Recipe {
        let calls = Arc::clone(calls);
        Recipe::new(move || Counter(calls.fetch_add(1, Ordering::SeqCst)))
    }

    #[test]
    fn test_shared_returns_same_instance() {
        let registry = ServiceRegistry::new();
        let calls = Arc::new(AtomicUsize::new(0));
        registry
            .register_shared("svc", counting_recipe(&calls))
            .unwrap();

        let first = registry.resolve("svc").unwrap();
        let second = registry.resolve("svc").unwrap();

        assert!(Arc::ptr_eq(&first, &second));
        assert_eq!(calls.load(Ordering::SeqCst), 1);
    }

    #[test]
    fn test_fresh_returns_distinct_instances() {
        let registry = ServiceRegistry::new();
        let calls = Arc::new(AtomicUsize::new(0));
        registry
            .register_fresh("svc", counting_recipe(&calls))
            .unwrap();

        let first = registry.resolve_as::<Counter>("svc").unwrap();
        let second = registry.resolve_as::<Counter>("svc").unwrap();

        assert!(!Arc::ptr_eq(&first, &second));
        assert_eq!(first.0, 0);
        assert_eq!(second.0, 1);
        assert_eq!(registry.lifetime("svc"), Some(Lifetime::Fresh));
    }

    #[test]
    fn test_reregistration_discards_cached_instance() {
        let registry = ServiceRegistry::new();
        let calls = Arc::new(AtomicUsize::new(0));
        registry
            .register_shared("svc", counting_recipe(&calls))
            .unwrap();

        let first = registry.resolve("svc").unwrap();
        let second = registry.resolve("svc").unwrap();
        registry
            .register_shared("svc", counting_recipe(&calls))
            .unwrap();
        let third = registry.resolve("svc").unwrap();

        assert!(Arc::ptr_eq(&first, &second));
        assert!(!Arc::ptr_eq(&first, &third));
        assert_eq!(registry.list_registered(), vec!["svc".to_string()]);
    }

    #[test]
    fn test_unregistered_name_creates_no_state() {
        let registry = ServiceRegistry::new();

        let err = registry.resolve("missing").unwrap_err();

        assert!(matches!(err, CardgenError::Unregistered(ref name) if name == "missing"));
        assert!(registry.list_registered().is_empty());
        assert!(!registry.is_registered("missing"));
    }

    #[test]
    fn test_recipe_without_value_is_rejected() {
        let registry = ServiceRegistry::new();

        let err = registry
            .register_shared("unit", Recipe::new(|| ()))
            .unwrap_err();
        assert!(matches!(err, CardgenError::InvalidRecipe { .. }));

        let err = registry
            .register_fresh(
                "unit",
                Recipe::fallible(|| Ok::<(), CardgenError>(())),
            )
            .unwrap_err();
        assert!(matches!(err, CardgenError::InvalidRecipe { .. }));
        assert!(!registry.is_registered("unit"));
    }

    #[test]
    fn test_recipe_failure_is_prefixed_with_service_name() {
        let registry = ServiceRegistry::new();
        registry
            .register_shared(
                "broken",
                Recipe::fallible(|| {
                    Err::<Counter, _>(CardgenError::Storage("unavailable".to_string()))
                }),
            )
            .unwrap();

        let err = registry.resolve("broken").unwrap_err();

        match err {
            CardgenError::Service { name, source } => {
                assert_eq!(name, "broken");
                assert!(matches!(*source, CardgenError::Storage(_)));
            }
            other => panic!("unexpected error: {other:?}"),
        }

        // A failed resolution must not poison later attempts with a cache.
        assert!(registry.resolve("broken").is_err());
    }

    #[test]
    fn test_resolve_as_reports_type_mismatch() {
        let registry = ServiceRegistry::new();
        registry
            .register_shared("number", Recipe::new(|| 42_u32))
            .unwrap();

        let err = registry.resolve_as::<String>("number").unwrap_err();

        match err {
            CardgenError::TypeMismatch {
                expected, actual, ..
            } => {
                assert_eq!(expected, type_name::<String>());
                assert_eq!(actual, type_name::<u32>());
            }
            other => panic!("unexpected error: {other:?}"),
        }
    }

    #[test]
    fn test_resolve_into_writes_destination_only_on_success() {
        let registry = ServiceRegistry::new();
        registry
            .register_shared("greeting", Recipe::new(|| String::from("hello")))
            .unwrap();

        let mut destination: Option<Arc<String>> = None;
        registry.resolve_into("greeting", &mut destination).unwrap();
        assert_eq!(destination.as_deref().map(String::as_str), Some("hello"));

        let mut wrong: Option<Arc<u64>> = None;
        assert!(registry.resolve_into("greeting", &mut wrong).is_err());
        assert!(wrong.is_none());
    }

    #[test]
    fn test_clear_removes_everything() {
        let registry = ServiceRegistry::new();
        registry
            .register_shared("a", Recipe::new(|| 1_i32))
            .unwrap();
        registry
            .register_fresh("b", Recipe::new(|| 2_i32))
            .unwrap();
        registry.resolve("a").unwrap();

        registry.clear();

        assert!(registry.list_registered().is_empty());
        assert!(matches!(
            registry.resolve("a"),
            Err(CardgenError::Unregistered(_))
        ));
    }

    #[test]
    fn test_recipe_may_reenter_registry() {
        let registry = Arc::new(ServiceRegistry::new());
        registry
            .register_shared("base", Recipe::new(|| 20_i64))
            .unwrap();

        let handle = Arc::clone(&registry);
        registry
            .register_shared(
                "derived",
                Recipe::fallible(move || -> Result<i64> {
                    let base = handle.resolve_as::<i64>("base")?;
                    Ok(*base + 1)
                }),
            )
            .unwrap();

        let derived = registry.resolve_as::<i64>("derived").unwrap();
        assert_eq!(*derived, 21);
    }

    #[test]
    fn test_concurrent_resolution_shares_one_instance() {
        let registry = ServiceRegistry::new();
        let calls = Arc::new(AtomicUsize::new(0));
        registry
            .register_shared("svc", counting_recipe(&calls))
            .unwrap();

        let products: Vec<Product> = std::thread::scope(|scope| {
            let handles: Vec<_> = (0..8)
                .map(|_| scope.spawn(|| registry.resolve("svc").unwrap()))
                .collect();
            handles.into_iter().map(|h| h.join().unwrap()).collect()
        });

        for product in &products[1..] {
            assert!(Arc::ptr_eq(&products[0], product));
        }
        assert!(calls.load(Ordering::SeqCst) >= 1);
    }
}

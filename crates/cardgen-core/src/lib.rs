//! # Cardgen Core
//!
//! Core library for Cardgen, a batch generator that turns delimited card
//! definitions into stored cards, rendered images and a JSON catalog.
//!
//! This crate provides the domain model, service wiring and pipeline,
//! independent of the CLI interface.
//!
//! ## Architecture
//!
//! - **registry**: Named service registry with shared and fresh lifetimes
//! - **config**: Layered configuration (defaults, TOML file, environment)
//! - **bootstrap**: Application assembly and teardown
//! - **card**: Card variants, derived fields and transport form
//! - **parser**: Record-to-card materializer
//! - **storage**: Card store trait and in-memory backend
//! - **generator**: Card image generation
//! - **catalog**: Batch pipeline and catalog output

pub mod bootstrap;
pub mod card;
pub mod catalog;
pub mod config;
pub mod error;
pub mod fs;
pub mod generator;
pub mod parser;
pub mod registry;
pub mod storage;

pub use bootstrap::Application;
pub use card::{Card, CardDto, CardType};
pub use config::Config;
pub use error::{CardgenError, Result};
pub use registry::{Lifetime, Recipe, ServiceRegistry};
pub use storage::CardStore;

/// Core version information
pub const VERSION: &str = env!("CARGO_PKG_VERSION");

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_version() {
        assert!(!VERSION.is_empty());
    }
}

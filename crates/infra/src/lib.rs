//! Infrastructure layer: persistence ports, in-memory adapters, configuration.

pub mod config;
pub mod seed;
pub mod store;

pub use config::{AppConfig, ConfigError};
pub use seed::{Seed, SeedError};
pub use store::{InMemoryLedger, InMemorySessionStore, LedgerStore, SessionStore, StoreError};

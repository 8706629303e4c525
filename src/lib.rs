//! Account record store: credentials, profile fields, and the append-only
//! association from an account to its auth tokens.
//!
//! This is a library-level component consumed by a calling service; it owns
//! no HTTP surface or CLI. See [`Store`] for the entry point.

pub mod config;
pub mod db;
pub mod entities;
pub mod models;

pub use config::{Config, SecurityConfig};
pub use db::{Store, StoreError};
pub use models::account::{
    Account, AccountInfo, AccountPatch, AccountSelector, NewAccount, PROTECTED_FIELDS,
    is_admin_username,
};

use tracing_subscriber::EnvFilter;

/// Install a `tracing` subscriber for consumers that do not bring their
/// own. `RUST_LOG` wins over the configured level.
pub fn init_logging(log_level: &str) {
    use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

    let env_filter =
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(log_level));

    tracing_subscriber::registry()
        .with(env_filter)
        .with(tracing_subscriber::fmt::layer())
        .init();
}

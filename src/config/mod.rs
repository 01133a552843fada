//! Configuration management subsystem.
//!
//! # Data Flow
//! ```text
//! config file (TOML, optional)
//!     → loader.rs (parse & deserialize)
//!     → env.rs (RETURN_429, AZURE_OPENAI_* overrides)
//!     → validation.rs (semantic checks)
//!     → GatewayConfig (validated, immutable)
//!     → shared via Arc<ArcSwap<_>> with request handlers
//!
//! On file change:
//!     watcher.rs detects change
//!     → loader.rs loads new config
//!     → atomic swap of the snapshot
//!     → the next request observes it
//! ```
//!
//! # Design Decisions
//! - A snapshot is immutable once loaded; each request reads exactly one
//! - All fields have defaults to allow minimal configs
//! - Validation separates syntactic (serde) from semantic checks

pub mod env;
pub mod loader;
pub mod schema;
pub mod validation;
pub mod watcher;

pub use loader::{load_config, load_from_env, ConfigError};
pub use schema::{
    BackendConfig, GatewayConfig, LimitsConfig, ListenerConfig, ObservabilityConfig,
    OverloadConfig, TimeoutConfig,
};

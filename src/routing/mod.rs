//! Routing subsystem.
//!
//! # Data Flow
//! ```text
//! Matched axum route
//!     → variant.rs (which shape: chat or legacy completions)
//!     → url.rs (deployment + api-version → backend URL)
//!     → Return: absolute backend URL or UrlBuildError
//! ```
//!
//! # Design Decisions
//! - Route shapes are a closed enum, not string templates
//! - Deterministic: same config and parameters always give the same URL
//! - No escaping is left to callers; the builder owns it

pub mod url;
pub mod variant;

pub use self::url::{api_version_from_query, build_backend_url, UrlBuildError, API_VERSION_PARAM};
pub use self::variant::RouteVariant;

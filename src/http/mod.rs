//! HTTP protocol handling subsystem.
//!
//! # Data Flow
//! ```text
//! Axum route match (chat or legacy completions)
//!     → request.rs (overload, credential, body checks)
//!     → [routing::url builds the backend URL]
//!     → forward.rs (one POST on the shared client)
//!     → response.rs (relay status + body, or plain-text error)
//!     → Send to client
//! ```

pub mod error;
pub mod forward;
pub mod request;
pub mod response;
pub mod server;

pub use error::ProxyError;
pub use forward::{BackendResponse, Forwarder, OutboundRequest};
pub use request::{Credential, InboundRequest, Rejection, API_KEY_HEADER};
pub use server::GatewayServer;

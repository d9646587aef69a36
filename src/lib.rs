//! # Connector Auth Library
//!
//! Obtains, caches and refreshes third-party OAuth access tokens on behalf of
//! api connectors. Tokens are looked up in memory, then in a shared cache
//! segment keyed by a hash of the connector configuration, and only then
//! refreshed against the OAuth endpoint.
//!
//! Modules:
//! - `config`: YAML configuration, defaults and validation
//! - `connector`: cache key hashing, token state and the acquisition chain
//! - `cache`: cache segments (memory, file, http)
//! - `transport`: requests to OAuth token endpoints
//! - `connections`: registry of configured connectors

pub mod cache;
pub mod config;
pub mod connections;
pub mod connector;
pub mod error;
pub mod helpers;
pub mod observability;
pub mod tests;
pub mod transport;
pub mod utils;


pub use crate::config::connectors::*;
pub use crate::connections::Connections;
pub use crate::connector::{Connector, SharedConnector};
pub use crate::error::{ConnectorError, TransportError};

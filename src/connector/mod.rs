//! Connector token lifecycle: cache key derivation, token state and the
//! memory → cache → network acquisition chain.

pub mod connector;
pub mod hash;
pub mod response;
pub mod shared;
pub mod token_state;

pub use connector::Connector;
pub use shared::SharedConnector;

//! HTTP plumbing used to reach OAuth token endpoints.

pub mod client;
pub mod requester;

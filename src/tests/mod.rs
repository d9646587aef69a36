#[cfg(test)]
pub mod common;
pub mod oauth_token_endpoint;

//! Chat Gateway — HTTP façade over a managed identity provider, NLU
//! service, and realtime database.

pub mod config;
pub mod error;
pub mod identity;
pub mod relay;
pub mod routes;
pub mod store;

//! Adapter implementations
//!
//! Adapters implement the port traits with concrete technologies:
//! - DuckDB for the AccountRepository port
//! - Crypto service HTTP client (or the plaintext cipher) for IdentityCipher
//! - Expenses API HTTP client for LedgerProvider
//! - Face match service HTTP client for FaceMatcher
//! - `Unconfigured` for any collaborator whose settings are missing

pub mod crypto_service;
pub mod duckdb;
pub mod expenses_api;
pub mod face_service;
mod http;
pub mod unconfigured;

#[cfg(test)]
pub mod mock_server;

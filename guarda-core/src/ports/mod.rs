//! Port definitions (hexagonal architecture)
//!
//! Ports define the interfaces for external dependencies. The core domain
//! depends only on these traits, not on concrete implementations.

mod cipher;
mod face_matcher;
mod ledger;
mod repository;

pub use cipher::{CipherOutcome, IdentityCipher};
pub use face_matcher::FaceMatcher;
pub use ledger::LedgerProvider;
pub use repository::AccountRepository;

//! Core domain entities
//!
//! All business entities are defined here. These are pure data structures
//! with validation logic - no I/O or external dependencies.

mod account;
mod biometric;
mod credentials;
mod document;
mod expense;
mod identity;
pub mod result;
pub mod validation;

pub use account::{
    Account, AccountProfile, BalanceView, BankingDetails, LoginOutcome, LoginRequest,
    Registration, DEFAULT_CURRENCY,
};
pub use biometric::{Biometric, BiometricStatus, BiometricSubject};
pub use credentials::{Argon2Params, PasswordCredential};
pub use document::{Document, DocumentType, FilePayload};
pub use expense::{ExpenseCategory, ExpenseRecord, NewExpense};
pub use identity::{IdentityField, IdentityValues, LoginIdentifier};

//! Identity cipher port
//!
//! Reversible encryption of identity fields, performed by a collaborator.

use crate::domain::result::Result;

/// Outcome of a cipher call that reached the collaborator
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum CipherOutcome {
    Value(String),
    /// The collaborator rejected the input as unprocessable
    Rejected,
}

/// Reversible cipher for identity fields
///
/// Transport failures and malformed responses are returned as errors; an
/// explicit rejection of the input is `CipherOutcome::Rejected`.
pub trait IdentityCipher: Send + Sync {
    /// Cipher name for diagnostics (e.g., "remote", "plaintext")
    fn name(&self) -> &str;

    fn encrypt(&self, plaintext: &str) -> Result<CipherOutcome>;

    fn decrypt(&self, ciphertext: &str) -> Result<CipherOutcome>;
}

//! Identity encryption gateway
//!
//! Wraps the configured `IdentityCipher`. Absent or empty input
//! short-circuits to `None` without touching the cipher; a rejection by the
//! cipher also yields `None`; every other failure propagates.

use std::sync::Arc;

use crate::domain::result::Result;
use crate::domain::IdentityValues;
use crate::ports::{CipherOutcome, IdentityCipher};

#[derive(Clone)]
pub struct EncryptionGateway {
    cipher: Arc<dyn IdentityCipher>,
}

impl EncryptionGateway {
    pub fn new(cipher: Arc<dyn IdentityCipher>) -> Self {
        Self { cipher }
    }

    pub fn encrypt(&self, plaintext: Option<&str>) -> Result<Option<String>> {
        match plaintext {
            None | Some("") => Ok(None),
            Some(value) => Ok(into_value(self.cipher.encrypt(value)?)),
        }
    }

    pub fn decrypt(&self, ciphertext: Option<&str>) -> Result<Option<String>> {
        match ciphertext {
            None | Some("") => Ok(None),
            Some(value) => Ok(into_value(self.cipher.decrypt(value)?)),
        }
    }

    /// Encrypt every present field
    pub fn encrypt_values(&self, plaintext: &IdentityValues) -> Result<IdentityValues> {
        let mut encrypted = IdentityValues::default();
        for (field, value) in plaintext.present() {
            encrypted.set(field, self.encrypt(Some(value))?);
        }
        Ok(encrypted)
    }

    /// Decrypt every present field
    pub fn decrypt_values(&self, ciphertext: &IdentityValues) -> Result<IdentityValues> {
        let mut decrypted = IdentityValues::default();
        for (field, value) in ciphertext.present() {
            decrypted.set(field, self.decrypt(Some(value))?);
        }
        Ok(decrypted)
    }
}

fn into_value(outcome: CipherOutcome) -> Option<String> {
    match outcome {
        CipherOutcome::Value(v) if !v.is_empty() => Some(v),
        _ => None,
    }
}

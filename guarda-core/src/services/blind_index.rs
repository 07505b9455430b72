//! Deterministic blind indexes for identity fields
//!
//! The index is an HMAC-SHA256 keyed by the pepper over the field kind and
//! the exact plaintext value, so equal values of the same field collide and
//! nothing else does. The store enforces uniqueness on these columns.

use hmac::{Hmac, Mac};
use sha2::Sha256;

use crate::domain::result::{Error, Result};
use crate::domain::{IdentityField, IdentityValues};

type HmacSha256 = Hmac<Sha256>;

#[derive(Clone)]
pub struct IdentityIndexer {
    pepper: String,
}

impl std::fmt::Debug for IdentityIndexer {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("IdentityIndexer").finish_non_exhaustive()
    }
}

impl IdentityIndexer {
    pub fn new(pepper: impl Into<String>) -> Self {
        Self {
            pepper: pepper.into(),
        }
    }

    pub fn index(&self, field: IdentityField, value: &str) -> Result<String> {
        let mut mac = <HmacSha256 as Mac>::new_from_slice(self.pepper.as_bytes())
            .map_err(|e| Error::Other(format!("HMAC initialization failed: {}", e)))?;
        // Field kinds never contain NUL, so the separator keeps messages distinct
        mac.update(field.as_str().as_bytes());
        mac.update(&[0u8]);
        mac.update(value.as_bytes());
        Ok(hex::encode(mac.finalize().into_bytes()))
    }

    /// Indexes for every present field of a plaintext candidate
    pub fn index_all(&self, plaintext: &IdentityValues) -> Result<IdentityValues> {
        let mut indexes = IdentityValues::default();
        for (field, value) in plaintext.present() {
            indexes.set(field, Some(self.index(field, value)?));
        }
        Ok(indexes)
    }
}

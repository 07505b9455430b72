//! Credential hasher - salted Argon2id password digests
//!
//! Passwords are never stored reversibly. `hash` draws a fresh random salt
//! per call and records the costs it used; `verify` recomputes the digest
//! with the stored salt and costs, so changing the configured costs only
//! affects new credentials.

use base64::Engine;
use rand::Rng;
use subtle::ConstantTimeEq;

use crate::domain::result::{Error, Result};
use crate::domain::{Argon2Params, PasswordCredential};

/// Salt length in bytes
const SALT_LEN: usize = 16;

/// One-way salted password hashing and verification
#[derive(Debug, Clone, Default)]
pub struct CredentialHasher {
    params: Argon2Params,
}

impl CredentialHasher {
    pub fn new(params: Argon2Params) -> Self {
        Self { params }
    }

    fn derive(&self, password: &str, salt: &[u8], params: &Argon2Params) -> Result<Vec<u8>> {
        let argon2_params = argon2::Params::new(
            params.memory_cost,
            params.time_cost,
            params.parallelism,
            Some(params.hash_len as usize),
        )
        .map_err(|e| Error::Other(format!("Failed to create argon2 params: {:?}", e)))?;

        let argon2 = argon2::Argon2::new(
            argon2::Algorithm::Argon2id,
            argon2::Version::V0x13,
            argon2_params,
        );

        let mut digest = vec![0u8; params.hash_len as usize];
        argon2
            .hash_password_into(password.as_bytes(), salt, &mut digest)
            .map_err(|e| Error::Other(format!("Failed to hash password: {:?}", e)))?;
        Ok(digest)
    }

    /// Hash a password under a fresh random salt
    pub fn hash(&self, password: &str) -> Result<PasswordCredential> {
        let salt: [u8; SALT_LEN] = rand::thread_rng().gen();
        let digest = self.derive(password, &salt, &self.params)?;

        Ok(PasswordCredential {
            digest: hex::encode(digest),
            salt: base64::engine::general_purpose::STANDARD.encode(salt),
            params: self.params.clone(),
        })
    }

    /// Check a password against a stored credential.
    ///
    /// Malformed salt or digest material fails verification. The costs
    /// come from the credential and the digest length from the stored
    /// digest, never from the current settings.
    pub fn verify(&self, password: &str, credential: &PasswordCredential) -> bool {
        let Ok(salt) = base64::engine::general_purpose::STANDARD.decode(&credential.salt) else {
            return false;
        };
        let Ok(expected) = hex::decode(&credential.digest) else {
            return false;
        };
        if expected.is_empty() {
            return false;
        }

        let params = Argon2Params {
            hash_len: expected.len() as u32,
            ..credential.params.clone()
        };
        match self.derive(password, &salt, &params) {
            Ok(actual) => actual.ct_eq(&expected).into(),
            Err(_) => false,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    /// Cheap parameters so tests stay fast
    fn cheap() -> Argon2Params {
        Argon2Params {
            time_cost: 1,
            memory_cost: 1024,
            parallelism: 1,
            hash_len: 32,
        }
    }

    fn hasher() -> CredentialHasher {
        CredentialHasher::new(cheap())
    }

    #[test]
    fn test_hash_then_verify() {
        let hasher = hasher();
        let credential = hasher.hash("Senha123!").unwrap();

        assert!(hasher.verify("Senha123!", &credential));
        assert!(!hasher.verify("Senha123?", &credential));
        assert!(!hasher.verify("", &credential));
        assert_eq!(credential.digest.len(), 64);
    }

    #[test]
    fn test_salts_are_random() {
        let hasher = hasher();
        let first = hasher.hash("Senha123!").unwrap();
        let second = hasher.hash("Senha123!").unwrap();
        assert_ne!(first.salt, second.salt);
        assert_ne!(first.digest, second.digest);
    }

    #[test]
    fn test_malformed_material_fails_verification() {
        let hasher = hasher();
        let good = hasher.hash("Senha123!").unwrap();

        let bad_salt = PasswordCredential {
            salt: "not base64!!".to_string(),
            ..good.clone()
        };
        assert!(!hasher.verify("Senha123!", &bad_salt));

        let bad_digest = PasswordCredential {
            digest: "zz".to_string(),
            ..good.clone()
        };
        assert!(!hasher.verify("Senha123!", &bad_digest));

        let empty_digest = PasswordCredential {
            digest: String::new(),
            ..good.clone()
        };
        assert!(!hasher.verify("Senha123!", &empty_digest));

        // Too short a salt is rejected by argon2 itself
        let short_salt = PasswordCredential {
            salt: "YQ==".to_string(),
            ..good
        };
        assert!(!hasher.verify("Senha123!", &short_salt));
    }

    #[test]
    fn test_credentials_survive_cost_changes() {
        let credential = hasher().hash("Senha123!").unwrap();
        assert_eq!(credential.params.time_cost, 1);

        let raised_params = Argon2Params {
            time_cost: 2,
            parallelism: 2,
            hash_len: 16,
            ..cheap()
        };
        let raised = CredentialHasher::new(raised_params.clone());
        assert!(raised.verify("Senha123!", &credential));
        assert!(!raised.verify("Senha123?", &credential));

        // New credentials pick up the raised costs
        let fresh = raised.hash("Senha123!").unwrap();
        assert_eq!(fresh.params, raised_params);
        assert_eq!(fresh.digest.len(), 32);
        assert!(hasher().verify("Senha123!", &fresh));
    }
}

//! Crypto service client
//!
//! Reversible RSA encryption of identity fields through the remote crypto
//! service:
//! - POST /rsa/encrypt `{message, public_key}` returns `{encrypted_message}`
//! - POST /rsa/decrypt `{message, private_key}` returns `{decrypted_message}`
//!
//! A 422 means the service refused the input; it is reported as
//! `CipherOutcome::Rejected`, not as a failure.

use anyhow::{Context, Result};
use reqwest::blocking::Client;
use serde::Serialize;
use serde_json::Value as JsonValue;

use super::http;
use crate::domain::result::{Collaborator, Error as DomainError, Result as DomainResult};
use crate::ports::{CipherOutcome, IdentityCipher};

const SERVICE_NAME: &str = "crypto service";

#[derive(Serialize)]
struct EncryptRequest<'a> {
    message: &'a str,
    public_key: &'a str,
}

#[derive(Serialize)]
struct DecryptRequest<'a> {
    message: &'a str,
    private_key: &'a str,
}

/// Crypto service API client
#[derive(Debug)]
pub struct CryptoServiceClient {
    client: Client,
    base_url: String,
    public_key: String,
    private_key: String,
    timeout_secs: u64,
}

impl CryptoServiceClient {
    pub fn new(
        base_url: &str,
        public_key: &str,
        private_key: &str,
        timeout_secs: u64,
    ) -> Result<Self> {
        if public_key.is_empty() || private_key.is_empty() {
            anyhow::bail!("Crypto service keys cannot be empty");
        }

        Ok(Self {
            client: http::build_client(timeout_secs)?,
            base_url: http::normalize_base_url(base_url)?,
            public_key: public_key.to_string(),
            private_key: private_key.to_string(),
            timeout_secs,
        })
    }

    pub fn encrypt(&self, message: &str) -> Result<CipherOutcome> {
        let body = EncryptRequest {
            message,
            public_key: &self.public_key,
        };
        self.call("rsa/encrypt", &body, "encrypted_message")
    }

    pub fn decrypt(&self, message: &str) -> Result<CipherOutcome> {
        let body = DecryptRequest {
            message,
            private_key: &self.private_key,
        };
        self.call("rsa/decrypt", &body, "decrypted_message")
    }

    fn call<B: Serialize>(&self, path: &str, body: &B, field: &str) -> Result<CipherOutcome> {
        let url = format!("{}/{}", self.base_url, path);

        let response = self
            .client
            .post(&url)
            .json(body)
            .send()
            .map_err(|e| http::map_request_error(SERVICE_NAME, self.timeout_secs, e))?;

        match response.status().as_u16() {
            422 => Ok(CipherOutcome::Rejected),
            200 => {
                let data: JsonValue = response
                    .json()
                    .context("Failed to parse crypto service response")?;
                data.get(field)
                    .and_then(|v| v.as_str())
                    .filter(|v| !v.is_empty())
                    .map(|v| CipherOutcome::Value(v.to_string()))
                    .with_context(|| format!("Invalid crypto service response: missing '{}'", field))
            }
            status => anyhow::bail!("Crypto service error: HTTP {}", status),
        }
    }
}

impl IdentityCipher for CryptoServiceClient {
    fn name(&self) -> &str {
        "remote"
    }

    fn encrypt(&self, plaintext: &str) -> DomainResult<CipherOutcome> {
        CryptoServiceClient::encrypt(self, plaintext)
            .map_err(|e| DomainError::upstream(Collaborator::Crypto, e.to_string()))
    }

    fn decrypt(&self, ciphertext: &str) -> DomainResult<CipherOutcome> {
        CryptoServiceClient::decrypt(self, ciphertext)
            .map_err(|e| DomainError::upstream(Collaborator::Crypto, e.to_string()))
    }
}

/// Identity transform cipher for deployments without the crypto service
#[derive(Debug, Default, Clone, Copy)]
pub struct PlaintextCipher;

impl IdentityCipher for PlaintextCipher {
    fn name(&self) -> &str {
        "plaintext"
    }

    fn encrypt(&self, plaintext: &str) -> DomainResult<CipherOutcome> {
        Ok(CipherOutcome::Value(plaintext.to_string()))
    }

    fn decrypt(&self, ciphertext: &str) -> DomainResult<CipherOutcome> {
        Ok(CipherOutcome::Value(ciphertext.to_string()))
    }
}

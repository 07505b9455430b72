//! Configuration management
//!
//! Settings live in `settings.json` inside the guarda directory:
//! ```json
//! {
//!   "crypto": { "url": "...", "publicKey": "...", "privateKey": "...", "enabled": true },
//!   "ledger": { "url": "...", "email": "...", "password": "..." },
//!   "faceMatch": { "url": "..." },
//!   "security": { "identityPepper": "...", "argon2": { ... } },
//!   "requestTimeoutSecs": 30
//! }
//! ```
//! Every collaborator setting can be overridden from the environment.

use std::collections::HashMap;
use std::path::Path;

use anyhow::Result;
use rand::Rng;
use serde::{Deserialize, Serialize};

use crate::domain::Argon2Params;

/// Bytes of randomness in a generated identity pepper
const IDENTITY_PEPPER_LEN: usize = 32;

/// Default transport timeout for collaborator calls
pub const DEFAULT_REQUEST_TIMEOUT_SECS: u64 = 30;

pub const CRYPTO_URL_ENV: &str = "GUARDA_CRYPTO_URL";
pub const CRYPTO_PUBLIC_KEY_ENV: &str = "GUARDA_CRYPTO_PUBLIC_KEY";
pub const CRYPTO_PRIVATE_KEY_ENV: &str = "GUARDA_CRYPTO_PRIVATE_KEY";
pub const PLAINTEXT_IDENTITY_ENV: &str = "GUARDA_PLAINTEXT_IDENTITY";
pub const LEDGER_URL_ENV: &str = "GUARDA_LEDGER_URL";
pub const LEDGER_EMAIL_ENV: &str = "GUARDA_LEDGER_EMAIL";
pub const LEDGER_PASSWORD_ENV: &str = "GUARDA_LEDGER_PASSWORD";
pub const FACE_MATCH_URL_ENV: &str = "GUARDA_FACE_MATCH_URL";
pub const IDENTITY_PEPPER_ENV: &str = "GUARDA_IDENTITY_PEPPER";

/// Crypto service settings
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CryptoSettings {
    #[serde(default)]
    pub url: Option<String>,
    #[serde(default)]
    pub public_key: Option<String>,
    #[serde(default)]
    pub private_key: Option<String>,
    /// When false, identity fields are stored through the plaintext cipher
    #[serde(default = "default_true")]
    pub enabled: bool,
}

impl Default for CryptoSettings {
    fn default() -> Self {
        Self {
            url: None,
            public_key: None,
            private_key: None,
            enabled: true,
        }
    }
}

/// Expense ledger settings
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct LedgerSettings {
    #[serde(default)]
    pub url: Option<String>,
    /// Service credentials used for `/auth`
    #[serde(default)]
    pub email: Option<String>,
    #[serde(default)]
    pub password: Option<String>,
}

/// Face match service settings
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct FaceMatchSettings {
    #[serde(default)]
    pub url: Option<String>,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SecuritySettings {
    /// Key mixed into identity blind indexes
    #[serde(default)]
    pub identity_pepper: String,
    #[serde(default)]
    pub argon2: Argon2Params,
}

/// Raw settings.json structure
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
struct SettingsFile {
    #[serde(default)]
    crypto: CryptoSettings,
    #[serde(default)]
    ledger: LedgerSettings,
    #[serde(default)]
    face_match: FaceMatchSettings,
    #[serde(default)]
    security: SecuritySettings,
    #[serde(default)]
    request_timeout_secs: Option<u64>,
    /// Settings this crate does not manage, preserved on save
    #[serde(flatten)]
    other: HashMap<String, serde_json::Value>,
}

fn default_true() -> bool {
    true
}

/// Guarda configuration
#[derive(Debug, Clone)]
pub struct Config {
    pub crypto: CryptoSettings,
    pub ledger: LedgerSettings,
    pub face_match: FaceMatchSettings,
    pub security: SecuritySettings,
    pub request_timeout_secs: u64,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            crypto: CryptoSettings::default(),
            ledger: LedgerSettings::default(),
            face_match: FaceMatchSettings::default(),
            security: SecuritySettings::default(),
            request_timeout_secs: DEFAULT_REQUEST_TIMEOUT_SECS,
        }
    }
}

impl Config {
    /// Load config from the guarda directory, then apply env overrides.
    ///
    /// A missing settings file yields defaults.
    pub fn load(guarda_dir: &Path) -> Result<Self> {
        let raw = read_settings(guarda_dir)?;

        let mut config = Self {
            crypto: raw.crypto,
            ledger: raw.ledger,
            face_match: raw.face_match,
            security: raw.security,
            request_timeout_secs: raw
                .request_timeout_secs
                .unwrap_or(DEFAULT_REQUEST_TIMEOUT_SECS),
        };
        config.apply_env_overrides();
        Ok(config)
    }

    fn apply_env_overrides(&mut self) {
        override_from_env(&mut self.crypto.url, CRYPTO_URL_ENV);
        override_from_env(&mut self.crypto.public_key, CRYPTO_PUBLIC_KEY_ENV);
        override_from_env(&mut self.crypto.private_key, CRYPTO_PRIVATE_KEY_ENV);
        match std::env::var(PLAINTEXT_IDENTITY_ENV).ok().as_deref() {
            Some("true" | "1" | "yes" | "TRUE" | "YES") => self.crypto.enabled = false,
            Some("false" | "0" | "no" | "FALSE" | "NO") => self.crypto.enabled = true,
            _ => {}
        }
        override_from_env(&mut self.ledger.url, LEDGER_URL_ENV);
        override_from_env(&mut self.ledger.email, LEDGER_EMAIL_ENV);
        override_from_env(&mut self.ledger.password, LEDGER_PASSWORD_ENV);
        override_from_env(&mut self.face_match.url, FACE_MATCH_URL_ENV);
        if let Ok(pepper) = std::env::var(IDENTITY_PEPPER_ENV) {
            self.security.identity_pepper = pepper;
        }
    }

    /// Generate an identity pepper and record it in settings.json.
    ///
    /// Only the pepper is written; every other key in the file, including
    /// settings this crate does not manage, is kept as it was.
    pub fn persist_new_identity_pepper(&mut self, guarda_dir: &Path) -> Result<()> {
        let key: [u8; IDENTITY_PEPPER_LEN] = rand::thread_rng().gen();
        let pepper = hex::encode(key);

        let mut settings = read_settings(guarda_dir)?;
        settings.security.identity_pepper = pepper.clone();
        let content = serde_json::to_string_pretty(&settings)?;
        std::fs::write(guarda_dir.join("settings.json"), content)?;

        self.security.identity_pepper = pepper;
        Ok(())
    }
}

fn read_settings(guarda_dir: &Path) -> Result<SettingsFile> {
    let settings_path = guarda_dir.join("settings.json");
    if !settings_path.exists() {
        return Ok(SettingsFile::default());
    }
    let content = std::fs::read_to_string(&settings_path)?;
    Ok(serde_json::from_str(&content)?)
}

fn override_from_env(slot: &mut Option<String>, var: &str) {
    if let Ok(value) = std::env::var(var) {
        if !value.is_empty() {
            *slot = Some(value);
        }
    }
}

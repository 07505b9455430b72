//! Guarda Core - identity and account management
//!
//! This crate implements the core domain logic following hexagonal architecture:
//!
//! - **domain**: Core entities (Account, Document, Biometric, etc.)
//! - **ports**: Trait definitions for external dependencies (store, cipher, ledger, face matcher)
//! - **services**: Business logic orchestration
//! - **adapters**: Concrete implementations (DuckDB, crypto service, expenses API, face service)

pub mod adapters;
pub mod config;
pub mod domain;
pub mod log_migrations;
pub mod migrations;
pub mod ports;
pub mod services;

use std::path::Path;
use std::sync::Arc;

use anyhow::{Context, Result};

use adapters::crypto_service::{CryptoServiceClient, PlaintextCipher};
use adapters::duckdb::DuckDbRepository;
use adapters::expenses_api::ExpensesApiClient;
use adapters::face_service::FaceServiceClient;
use adapters::unconfigured::Unconfigured;
use config::Config;
use ports::{FaceMatcher, IdentityCipher, LedgerProvider};
use services::{AccountService, CredentialHasher, IdentityIndexer};

// Re-export commonly used types at crate root
pub use domain::result::{Error, Operation, OperationResult};
pub use domain::{
    AccountProfile, BalanceView, BiometricStatus, BiometricSubject, Document, DocumentType,
    FilePayload, LoginOutcome, LoginRequest, NewExpense, Registration,
};
pub use services::{EntryPoint, FailureSummary, LogEntry, LogEvent, LoggingService};

/// Name of the account store inside the guarda directory
pub const DATABASE_FILE: &str = "guarda.duckdb";

/// Main context for Guarda operations
///
/// Holds the configuration, the account store and the account service
/// wired to the configured collaborators.
pub struct GuardaContext {
    pub config: Config,
    pub repository: Arc<DuckDbRepository>,
    pub accounts: AccountService,
}

impl GuardaContext {
    /// Open the store in `guarda_dir` and wire collaborators from config
    ///
    /// A store without an identity pepper gets a generated one, recorded in
    /// settings.json. A store that already holds accounts never does, since
    /// their blind indexes would stop matching.
    pub fn new(guarda_dir: &Path) -> Result<Self> {
        let mut config = Config::load(guarda_dir)?;

        let repository = Arc::new(DuckDbRepository::new(&guarda_dir.join(DATABASE_FILE))?);
        repository.ensure_schema()?;

        if config.security.identity_pepper.is_empty() {
            if repository.count_accounts()? > 0 {
                anyhow::bail!(
                    "security.identityPepper is not set but {} already holds accounts",
                    DATABASE_FILE
                );
            }
            config
                .persist_new_identity_pepper(guarda_dir)
                .context("Failed to record a generated identity pepper")?;
        }

        let cipher = build_cipher(&config)?;
        let ledger = build_ledger(&config)?;
        let matcher = build_matcher(&config)?;

        Ok(Self::with_collaborators(config, repository, cipher, ledger, matcher))
    }

    /// Assemble a context from already-built collaborators
    pub fn with_collaborators(
        config: Config,
        repository: Arc<DuckDbRepository>,
        cipher: Arc<dyn IdentityCipher>,
        ledger: Arc<dyn LedgerProvider>,
        matcher: Arc<dyn FaceMatcher>,
    ) -> Self {
        let accounts = AccountService::new(
            repository.clone(),
            cipher,
            ledger,
            matcher,
            CredentialHasher::new(config.security.argon2.clone()),
            IdentityIndexer::new(config.security.identity_pepper.clone()),
        );

        Self {
            config,
            repository,
            accounts,
        }
    }

    /// Record account events through `logger`
    pub fn with_logger(self, logger: Arc<LoggingService>) -> Self {
        Self {
            accounts: self.accounts.with_logger(logger),
            ..self
        }
    }
}

fn build_cipher(config: &Config) -> Result<Arc<dyn IdentityCipher>> {
    let crypto = &config.crypto;
    if !crypto.enabled {
        return Ok(Arc::new(PlaintextCipher));
    }

    match (&crypto.url, &crypto.public_key, &crypto.private_key) {
        (Some(url), Some(public_key), Some(private_key)) => {
            let client =
                CryptoServiceClient::new(url, public_key, private_key, config.request_timeout_secs)
                    .context("Invalid crypto service settings")?;
            Ok(Arc::new(client))
        }
        (None, _, _) => Ok(Arc::new(Unconfigured::new("crypto.url"))),
        _ => Ok(Arc::new(Unconfigured::new("crypto.publicKey / crypto.privateKey"))),
    }
}

fn build_ledger(config: &Config) -> Result<Arc<dyn LedgerProvider>> {
    let ledger = &config.ledger;
    let Some(url) = &ledger.url else {
        return Ok(Arc::new(Unconfigured::new("ledger.url")));
    };

    let client = ExpensesApiClient::new(
        url,
        ledger.email.as_deref().unwrap_or_default(),
        ledger.password.as_deref().unwrap_or_default(),
        config.request_timeout_secs,
    )
    .context("Invalid ledger settings")?;
    Ok(Arc::new(client))
}

fn build_matcher(config: &Config) -> Result<Arc<dyn FaceMatcher>> {
    let Some(url) = &config.face_match.url else {
        return Ok(Arc::new(Unconfigured::new("faceMatch.url")));
    };

    let client = FaceServiceClient::new(url, config.request_timeout_secs)
        .context("Invalid face match settings")?;
    Ok(Arc::new(client))
}

//! Integration tests for guarda-core services
//!
//! These tests run the account service against a real DuckDB file.
//! Collaborators (cipher, ledger, face matcher) are mocked at the trait level.
//!
//! Run with: cargo test --test integration_tests -- --nocapture

use std::sync::atomic::{AtomicBool, AtomicUsize, Ordering};
use std::sync::{Arc, Mutex};

use chrono::Utc;
use rust_decimal::Decimal;
use serde_json::json;
use tempfile::TempDir;
use uuid::Uuid;

use guarda_core::adapters::duckdb::DuckDbRepository;
use guarda_core::config::Config;
use guarda_core::domain::result::{Collaborator, Resource, Result};
use guarda_core::domain::{
    Account, Argon2Params, BankingDetails, ExpenseCategory, ExpenseRecord, IdentityField,
    IdentityValues, PasswordCredential,
};
use guarda_core::ports::{AccountRepository, CipherOutcome, FaceMatcher, IdentityCipher, LedgerProvider};
use guarda_core::services::{EncryptionGateway, IdentityIndexer};
use guarda_core::{
    BiometricSubject, EntryPoint, Error, FilePayload, GuardaContext, LoggingService, LoginRequest,
    NewExpense, Operation, OperationResult, Registration,
};

// ============================================================================
// Mock collaborators
// ============================================================================

/// Non-deterministic reversible cipher: a fresh nonce per call, value reversed.
/// Refuses any value containing "recusado".
#[derive(Default)]
struct NonceCipher {
    decrypts: AtomicUsize,
}

impl IdentityCipher for NonceCipher {
    fn name(&self) -> &str {
        "nonce"
    }

    fn encrypt(&self, plaintext: &str) -> Result<CipherOutcome> {
        if plaintext.contains("recusado") {
            return Ok(CipherOutcome::Rejected);
        }
        let reversed: String = plaintext.chars().rev().collect();
        Ok(CipherOutcome::Value(format!("{}|{}", Uuid::new_v4(), reversed)))
    }

    fn decrypt(&self, ciphertext: &str) -> Result<CipherOutcome> {
        self.decrypts.fetch_add(1, Ordering::SeqCst);
        match ciphertext.split_once('|') {
            Some((_, reversed)) => Ok(CipherOutcome::Value(reversed.chars().rev().collect())),
            None => Ok(CipherOutcome::Rejected),
        }
    }
}

#[derive(Default)]
struct MockLedger {
    registrations: AtomicUsize,
    down: AtomicBool,
    expenses: Mutex<Vec<(String, String)>>,
}

impl LedgerProvider for MockLedger {
    fn name(&self) -> &str {
        "mock-ledger"
    }

    fn auth(&self) -> Result<()> {
        if self.down.load(Ordering::SeqCst) {
            return Err(Error::upstream(Collaborator::Ledger, "connection refused"));
        }
        Ok(())
    }

    fn register(&self, _login: &str, _password: &str) -> Result<String> {
        let n = self.registrations.fetch_add(1, Ordering::SeqCst) + 1;
        Ok(n.to_string())
    }

    fn create_expense(&self, external_id: &str, expense: &NewExpense) -> Result<ExpenseRecord> {
        self.expenses
            .lock()
            .unwrap()
            .push((external_id.to_string(), expense.reason.clone()));
        Ok(json!({ "id": 1, "name": expense.reason, "user": external_id }))
    }

    fn list_expenses(&self, external_id: &str) -> Result<Vec<ExpenseRecord>> {
        Ok(self
            .expenses
            .lock()
            .unwrap()
            .iter()
            .filter(|(owner, _)| owner == external_id)
            .map(|(_, reason)| json!({ "name": reason }))
            .collect())
    }

    fn list_expense_categories(&self) -> Result<Vec<ExpenseCategory>> {
        Ok(vec![ExpenseCategory {
            id: "1".to_string(),
            name: "Alimentação".to_string(),
            description: None,
        }])
    }
}

/// Matches identical images; an image without a face is a comparator failure
struct MockMatcher;

impl FaceMatcher for MockMatcher {
    fn compare(&self, probe: &FilePayload, reference: &FilePayload) -> Result<bool> {
        if probe.decode()? == b"no face" {
            return Err(Error::upstream(Collaborator::FaceMatch, "no face detected"));
        }
        Ok(probe.file_b64 == reference.file_b64)
    }
}

// ============================================================================
// Test Helpers
// ============================================================================

struct Harness {
    _dir: TempDir,
    ctx: GuardaContext,
    cipher: Arc<NonceCipher>,
    ledger: Arc<MockLedger>,
}

fn test_config() -> Config {
    let mut config = Config::default();
    config.security.identity_pepper = "integration-pepper".to_string();
    config.security.argon2 = Argon2Params {
        time_cost: 1,
        memory_cost: 1024,
        parallelism: 1,
        hash_len: 32,
    };
    config
}

/// Create a context over a fresh DuckDB file with mocked collaborators
fn harness() -> Harness {
    let dir = TempDir::new().unwrap();
    let repository = Arc::new(DuckDbRepository::new(&dir.path().join("test.duckdb")).unwrap());
    repository.ensure_schema().unwrap();

    let cipher = Arc::new(NonceCipher::default());
    let ledger = Arc::new(MockLedger::default());
    let ctx = GuardaContext::with_collaborators(
        test_config(),
        repository,
        cipher.clone(),
        ledger.clone(),
        Arc::new(MockMatcher),
    );

    Harness {
        _dir: dir,
        ctx,
        cipher,
        ledger,
    }
}

fn registration(email: Option<&str>, cpf: Option<&str>) -> Registration {
    Registration {
        name: "Fulano de Tal".to_string(),
        cellphone: "11999999999".to_string(),
        email: email.map(String::from),
        cpf: cpf.map(String::from),
        password: "Senha123!".to_string(),
        ..Default::default()
    }
}

fn login(email: &str, password: &str) -> LoginRequest {
    LoginRequest {
        email: Some(email.to_string()),
        password: password.to_string(),
        ..Default::default()
    }
}

fn image(bytes: &[u8]) -> FilePayload {
    FilePayload::from_bytes(bytes, "image/png")
}

// ============================================================================
// End-to-end scenario
// ============================================================================

#[test]
fn test_account_scenario() {
    let h = harness();
    let accounts = &h.ctx.accounts;

    let profile = accounts.register(registration(Some("a@x.com"), None)).unwrap();

    let dup = accounts.register(registration(Some("a@x.com"), None)).unwrap_err();
    assert!(matches!(dup, Error::AlreadyExists(IdentityField::Email)));

    let outcome = accounts.login(&login("a@x.com", "Senha123!")).unwrap();
    assert_eq!(outcome.account_id, profile.id);

    let wrong = accounts.login(&login("a@x.com", "wrong")).unwrap_err();
    assert!(matches!(wrong, Error::InvalidCredentials));

    let subject = BiometricSubject::Owned(profile.id);
    accounts.submit_biometric(profile.id, image(b"face B")).unwrap();
    assert!(accounts.validate_biometric(&subject, &image(b"face B")).is_ok());
    assert!(matches!(
        accounts.validate_biometric(&subject, &image(b"unrelated")),
        Err(Error::BiometricMismatch)
    ));
}

// ============================================================================
// Uniqueness
// ============================================================================

#[test]
fn test_same_email_collides_regardless_of_tax_id() {
    let h = harness();
    let accounts = &h.ctx.accounts;
    accounts
        .register(registration(Some("a@x.com"), Some("529.982.247-25")))
        .unwrap();

    let err = accounts
        .register(registration(Some("a@x.com"), Some("111.444.777-35")))
        .unwrap_err();
    assert!(matches!(err, Error::AlreadyExists(IdentityField::Email)));
    assert_eq!(err.status(), 409);
    assert_eq!(err.to_string(), "Email já está cadastrado");
}

#[test]
fn test_first_colliding_field_wins() {
    let h = harness();
    let accounts = &h.ctx.accounts;
    accounts
        .register(registration(Some("a@x.com"), Some("529.982.247-25")))
        .unwrap();

    // Email and CPF both collide; only email is reported
    let both = accounts
        .register(registration(Some("a@x.com"), Some("529.982.247-25")))
        .unwrap_err();
    assert!(matches!(both, Error::AlreadyExists(IdentityField::Email)));

    let cpf_only = accounts
        .register(registration(Some("b@x.com"), Some("529.982.247-25")))
        .unwrap_err();
    assert!(matches!(cpf_only, Error::AlreadyExists(IdentityField::Cpf)));
}

#[test]
fn test_absent_fields_are_not_decrypted() {
    let h = harness();
    let accounts = &h.ctx.accounts;
    accounts
        .register(registration(Some("a@x.com"), Some("529.982.247-25")))
        .unwrap();
    h.cipher.decrypts.store(0, Ordering::SeqCst);

    // Candidate carries only a CPF: one decrypt per stored account
    accounts
        .register(registration(None, Some("111.444.777-35")))
        .unwrap();
    assert_eq!(h.cipher.decrypts.load(Ordering::SeqCst), 1);
}

#[test]
fn test_rejected_identity_field_fails_validation() {
    let h = harness();
    let err = h
        .ctx
        .accounts
        .register(registration(Some("recusado@x.com"), None))
        .unwrap_err();
    assert!(matches!(err, Error::Validation(_)));
    assert_eq!(h.ledger.registrations.load(Ordering::SeqCst), 0);
}

#[test]
fn test_blind_index_backstops_a_raced_registration() {
    let h = harness();
    let indexer = IdentityIndexer::new("integration-pepper");

    // A row committed by a concurrent registration the scan cannot see
    let now = Utc::now();
    let raced = Account {
        id: Uuid::new_v4(),
        name: "Concorrente".to_string(),
        cellphone: "11988888888".to_string(),
        identity: IdentityValues::default(),
        identity_index: IdentityValues::new(
            Some(indexer.index(IdentityField::Email, "a@x.com").unwrap()),
            None,
            None,
        ),
        credential: PasswordCredential {
            digest: "00".to_string(),
            salt: "AA==".to_string(),
            params: Argon2Params::default(),
        },
        balance: Decimal::ZERO,
        currency: "BRL".to_string(),
        banking: BankingDetails::default(),
        external_id: "0".to_string(),
        created_at: now,
        updated_at: now,
    };
    h.ctx.repository.insert_account(&raced).unwrap();

    let err = h
        .ctx
        .accounts
        .register(registration(Some("a@x.com"), None))
        .unwrap_err();
    assert!(matches!(err, Error::AlreadyExists(IdentityField::Email)));
    assert_eq!(h.ctx.repository.count_accounts().unwrap(), 1);
}

// ============================================================================
// Login
// ============================================================================

#[test]
fn test_login_errors_are_identical() {
    let h = harness();
    let accounts = &h.ctx.accounts;
    accounts.register(registration(Some("a@x.com"), None)).unwrap();

    let wrong_password = accounts.login(&login("a@x.com", "Errada123!")).unwrap_err();
    let unknown = accounts.login(&login("b@x.com", "Senha123!")).unwrap_err();

    let a = OperationResult::<()>::from_result(Operation::Login, Err(wrong_password));
    let b = OperationResult::<()>::from_result(Operation::Login, Err(unknown));
    assert_eq!(a.status, b.status);
    assert_eq!(a.message, b.message);
    assert_eq!(a.message.as_deref(), Some("Usuário ou senha inválido"));
}

#[test]
fn test_login_uses_first_identifier_only() {
    let h = harness();
    let accounts = &h.ctx.accounts;
    let profile = accounts
        .register(registration(None, Some("529.982.247-25")))
        .unwrap();

    let by_cpf = LoginRequest {
        cpf: Some("529.982.247-25".to_string()),
        password: "Senha123!".to_string(),
        ..Default::default()
    };
    assert_eq!(accounts.login(&by_cpf).unwrap().account_id, profile.id);

    // An unknown email is not retried with the CPF
    let email_first = LoginRequest {
        email: Some("a@x.com".to_string()),
        ..by_cpf
    };
    assert!(matches!(
        accounts.login(&email_first),
        Err(Error::InvalidCredentials)
    ));
}

// ============================================================================
// Balance
// ============================================================================

#[test]
fn test_balance_update_on_missing_account_mutates_nothing() {
    let h = harness();
    let accounts = &h.ctx.accounts;
    let profile = accounts.register(registration(Some("a@x.com"), None)).unwrap();

    let err = accounts
        .update_balance(Uuid::new_v4(), Decimal::new(99_999, 2))
        .unwrap_err();
    assert!(matches!(err, Error::NotFound(Resource::Account)));
    assert_eq!(err.status(), 404);

    let stored = h.ctx.repository.list_accounts().unwrap();
    assert_eq!(stored.len(), 1);
    assert_eq!(stored[0].balance, Decimal::ZERO);
    assert_eq!(accounts.get_balance(profile.id).unwrap().balance, Decimal::ZERO);
}

#[test]
fn test_balance_rejects_invalid_amounts() {
    let h = harness();
    let accounts = &h.ctx.accounts;
    let profile = accounts.register(registration(Some("a@x.com"), None)).unwrap();

    assert!(matches!(
        accounts.update_balance(profile.id, Decimal::new(-100, 2)),
        Err(Error::Validation(_))
    ));
    assert!(matches!(
        accounts.update_balance(profile.id, Decimal::new(1001, 3)),
        Err(Error::Validation(_))
    ));

    let view = accounts.update_balance(profile.id, Decimal::new(123_456, 2)).unwrap();
    assert_eq!(view.balance, Decimal::new(123_456, 2));
    assert_eq!(view.currency, "BRL");
}

// ============================================================================
// Biometrics
// ============================================================================

#[test]
fn test_biometric_not_found_is_not_mismatch() {
    let h = harness();
    let accounts = &h.ctx.accounts;
    let profile = accounts.register(registration(Some("a@x.com"), None)).unwrap();
    let subject = BiometricSubject::Owned(profile.id);

    let err = accounts.validate_biometric(&subject, &image(b"face")).unwrap_err();
    assert!(matches!(err, Error::NotFound(Resource::Biometric)));
    assert_eq!(err.to_string(), "Biometria não encontrada.");
    assert_eq!(err.status(), 404);
}

#[test]
fn test_comparator_failure_is_not_mismatch() {
    let h = harness();
    let accounts = &h.ctx.accounts;
    let profile = accounts.register(registration(Some("a@x.com"), None)).unwrap();
    accounts.submit_biometric(profile.id, image(b"face")).unwrap();

    let err = accounts
        .validate_biometric(&BiometricSubject::Owned(profile.id), &image(b"no face"))
        .unwrap_err();
    assert!(matches!(err, Error::Upstream(Collaborator::FaceMatch, _)));
    assert_eq!(err.status(), 502);
}

#[test]
fn test_partner_biometric_flow() {
    let h = harness();
    let accounts = &h.ctx.accounts;

    let status = accounts.submit_partner_biometric(image(b"partner")).unwrap();
    assert_eq!(status.subject.kind(), "partner");
    assert_eq!(accounts.biometric_status(&status.subject).unwrap().content_type, "image/png");
    assert!(accounts.validate_biometric(&status.subject, &image(b"partner")).is_ok());
}

// ============================================================================
// Storage round trip
// ============================================================================

#[test]
fn test_identity_is_encrypted_at_rest_and_round_trips() {
    let h = harness();
    let accounts = &h.ctx.accounts;
    let profile = accounts
        .register(registration(Some("a@x.com"), Some("529.982.247-25")))
        .unwrap();

    let stored = h.ctx.repository.get_account(profile.id).unwrap().unwrap();
    let stored_email = stored.identity.get(IdentityField::Email).unwrap();
    assert_ne!(stored_email, "a@x.com");
    assert!(stored.identity.get(IdentityField::Cnpj).is_none());

    let gateway = EncryptionGateway::new(h.cipher.clone());
    let decrypted = gateway.decrypt_values(&stored.identity).unwrap();
    assert_eq!(decrypted.get(IdentityField::Email), Some("a@x.com"));
    assert_eq!(decrypted.get(IdentityField::Cpf), Some("529.982.247-25"));

    let fetched = accounts.get_account(profile.id).unwrap();
    assert_eq!(fetched.email.as_deref(), Some("a@x.com"));
    assert_eq!(fetched.cnpj, None);
}

#[test]
fn test_accounts_survive_reopen_with_raised_password_costs() {
    let dir = TempDir::new().unwrap();
    let db_path = dir.path().join("test.duckdb");
    let ledger = Arc::new(MockLedger::default());

    let id = {
        let repository = Arc::new(DuckDbRepository::new(&db_path).unwrap());
        repository.ensure_schema().unwrap();
        let ctx = GuardaContext::with_collaborators(
            test_config(),
            repository,
            Arc::new(NonceCipher::default()),
            ledger.clone(),
            Arc::new(MockMatcher),
        );
        ctx.accounts.register(registration(Some("a@x.com"), None)).unwrap().id
    };

    // Raising the configured costs must not lock out existing accounts
    let mut raised = test_config();
    raised.security.argon2.time_cost = 2;
    raised.security.argon2.parallelism = 2;

    let repository = Arc::new(DuckDbRepository::new(&db_path).unwrap());
    repository.ensure_schema().unwrap();
    let ctx = GuardaContext::with_collaborators(
        raised,
        repository,
        Arc::new(NonceCipher::default()),
        ledger,
        Arc::new(MockMatcher),
    );
    assert_eq!(ctx.accounts.login(&login("a@x.com", "Senha123!")).unwrap().account_id, id);
}

// ============================================================================
// Ledger delegation
// ============================================================================

#[test]
fn test_ledger_outage_surfaces_as_upstream() {
    let h = harness();
    h.ledger.down.store(true, Ordering::SeqCst);

    let err = h
        .ctx
        .accounts
        .register(registration(Some("a@x.com"), None))
        .unwrap_err();
    let rendered = OperationResult::<()>::from_result(Operation::Register, Err(err));
    assert_eq!(rendered.status, 502);
    assert_eq!(
        rendered.message.as_deref(),
        Some("Não foi possível comunicar com o servidor de despesas")
    );
    assert_eq!(h.ctx.repository.count_accounts().unwrap(), 0);
}

#[test]
fn test_expenses_are_keyed_by_external_id() {
    let h = harness();
    let accounts = &h.ctx.accounts;
    let first = accounts.register(registration(Some("a@x.com"), None)).unwrap();
    let second = accounts.register(registration(Some("b@x.com"), None)).unwrap();

    let expense = NewExpense {
        reason: "Mercado".to_string(),
        amount: Decimal::new(5000, 2),
        category: "1".to_string(),
    };
    accounts.create_expense(first.id, &expense).unwrap();

    assert_eq!(accounts.list_expenses(first.id).unwrap().len(), 1);
    assert!(accounts.list_expenses(second.id).unwrap().is_empty());
    assert_eq!(accounts.list_expense_categories().unwrap()[0].name, "Alimentação");
}

// ============================================================================
// Logging
// ============================================================================

#[test]
fn test_events_are_logged_without_identity_values() {
    let h = harness();
    let log_dir = TempDir::new().unwrap();
    let logger = Arc::new(LoggingService::new(log_dir.path(), EntryPoint::Service, "test").unwrap());
    let ctx = h.ctx.with_logger(logger.clone());

    ctx.accounts.register(registration(Some("a@x.com"), None)).unwrap();
    let _ = ctx.accounts.login(&login("a@x.com", "Errada123!"));

    let entries = logger.get_recent(10).unwrap();
    let events: Vec<_> = entries.iter().map(|e| e.event.as_str()).collect();
    assert!(events.contains(&"account_registered"));
    assert!(events.contains(&"login_rejected"));

    let dump = serde_json::to_string(&entries).unwrap();
    assert!(!dump.contains("a@x.com"));
    assert!(!dump.contains("Errada123!"));
}

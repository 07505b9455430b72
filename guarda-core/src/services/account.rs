//! Account lifecycle service
//!
//! Orchestrates registration, login, balance, documents, biometrics and
//! expense delegation over the store, the identity cipher, the ledger and
//! the face matcher. An account is terminal once created: every later
//! operation reads it or mutates a field or sub-resource in place.

use std::sync::Arc;

use chrono::Utc;
use rand::distributions::Alphanumeric;
use rand::Rng;
use rust_decimal::Decimal;
use uuid::Uuid;

use crate::domain::result::{Error, Operation, Resource, Result};
use crate::domain::{
    validation, Account, AccountProfile, BalanceView, BiometricStatus, BiometricSubject, Document,
    DocumentType, ExpenseCategory, ExpenseRecord, FilePayload, IdentityField, IdentityValues,
    LoginOutcome, LoginRequest, NewExpense, Registration, DEFAULT_CURRENCY,
};
use crate::ports::{AccountRepository, FaceMatcher, IdentityCipher, LedgerProvider};

use super::biometric::BiometricGate;
use super::blind_index::IdentityIndexer;
use super::credentials::CredentialHasher;
use super::gateway::EncryptionGateway;
use super::logging::{LogEvent, LoggingService};
use super::uniqueness::UniquenessResolver;

/// Length of the random password given to the ledger's mirror user
const LEDGER_PASSWORD_LEN: usize = 24;

pub struct AccountService {
    repository: Arc<dyn AccountRepository>,
    gateway: EncryptionGateway,
    uniqueness: UniquenessResolver,
    hasher: CredentialHasher,
    indexer: IdentityIndexer,
    ledger: Arc<dyn LedgerProvider>,
    biometrics: BiometricGate,
    logger: Option<Arc<LoggingService>>,
}

impl AccountService {
    pub fn new(
        repository: Arc<dyn AccountRepository>,
        cipher: Arc<dyn IdentityCipher>,
        ledger: Arc<dyn LedgerProvider>,
        matcher: Arc<dyn FaceMatcher>,
        hasher: CredentialHasher,
        indexer: IdentityIndexer,
    ) -> Self {
        let gateway = EncryptionGateway::new(cipher);
        Self {
            uniqueness: UniquenessResolver::new(Arc::clone(&repository), gateway.clone()),
            biometrics: BiometricGate::new(Arc::clone(&repository), matcher),
            repository,
            gateway,
            hasher,
            indexer,
            ledger,
            logger: None,
        }
    }

    /// Record lifecycle events through the given logger
    pub fn with_logger(mut self, logger: Arc<LoggingService>) -> Self {
        self.logger = Some(logger);
        self
    }

    /// Logging failures never break an operation
    fn record(&self, event: LogEvent) {
        if let Some(logger) = &self.logger {
            let _ = logger.log(event);
        }
    }

    /// Pass a result through, logging collaborator failures
    fn observe<T>(&self, operation: Operation, result: Result<T>) -> Result<T> {
        match &result {
            Err(Error::Upstream(collaborator, detail)) => self.record(
                LogEvent::new("upstream_failure")
                    .with_operation(operation.as_str())
                    .with_collaborator(collaborator.as_str())
                    .with_error(detail.clone()),
            ),
            Err(e) if e.is_internal() => self.record(
                LogEvent::new("operation_failed")
                    .with_operation(operation.as_str())
                    .with_error(e.to_string()),
            ),
            _ => {}
        }
        result
    }

    fn require_account(&self, id: Uuid) -> Result<Account> {
        self.repository
            .get_account(id)?
            .ok_or(Error::NotFound(Resource::Account))
    }

    // === Registration and login ===

    /// Create an account and its ledger counterpart
    pub fn register(&self, registration: Registration) -> Result<AccountProfile> {
        let result = self.register_inner(registration);
        self.observe(Operation::Register, result)
    }

    fn register_inner(&self, registration: Registration) -> Result<AccountProfile> {
        registration.validate()?;
        let plaintext = registration.identity();

        let encrypted = self.gateway.encrypt_values(&plaintext)?;
        for (field, _) in plaintext.present() {
            if encrypted.get(field).is_none() {
                return Err(Error::validation(format!("{} inválido", field.label())));
            }
        }

        self.uniqueness.ensure_unique(&plaintext)?;

        // Email is the ledger login when present, else the first tax id
        let login = plaintext
            .present()
            .next()
            .map(|(_, value)| value.to_string())
            .ok_or_else(|| Error::validation("É necessário fornecer um email, cpf ou cnpj"))?;
        self.ledger.auth()?;
        let external_id = self.ledger.register(&login, &ledger_password())?;

        let credential = self.hasher.hash(&registration.password)?;
        let now = Utc::now();
        let account = Account {
            id: Uuid::new_v4(),
            name: registration.name.trim().to_string(),
            cellphone: registration.cellphone.trim().to_string(),
            identity: encrypted,
            identity_index: self.indexer.index_all(&plaintext)?,
            credential,
            balance: registration.balance.unwrap_or(Decimal::ZERO),
            currency: Account::normalize_currency(
                registration.currency.as_deref().unwrap_or(DEFAULT_CURRENCY),
            ),
            banking: registration.banking.unwrap_or_default(),
            external_id,
            created_at: now,
            updated_at: now,
        };

        // The store's unique blind indexes catch a registration that raced
        // past the scan
        self.repository.insert_account(&account)?;
        self.record(LogEvent::new("account_registered").with_operation(Operation::Register.as_str()));

        Ok(profile(&account, present_only(&plaintext)))
    }

    /// Check a password against the account resolved by the first supplied
    /// identifier. An unknown identifier and a wrong password are the same
    /// failure.
    pub fn login(&self, request: &LoginRequest) -> Result<LoginOutcome> {
        let result = self.login_inner(request);
        self.observe(Operation::Login, result)
    }

    fn login_inner(&self, request: &LoginRequest) -> Result<LoginOutcome> {
        request.validate()?;
        let identifier = request.identifier()?;
        let index = self.indexer.index(identifier.field, &identifier.value)?;

        match self.repository.find_account_by_index(identifier.field, &index)? {
            Some(account) if self.hasher.verify(&request.password, &account.credential) => {
                Ok(LoginOutcome {
                    account_id: account.id,
                })
            }
            _ => {
                self.record(
                    LogEvent::new("login_rejected").with_operation(Operation::Login.as_str()),
                );
                Err(Error::InvalidCredentials)
            }
        }
    }

    // === Account reads ===

    pub fn get_account(&self, id: Uuid) -> Result<AccountProfile> {
        let result = self.require_account(id).and_then(|account| {
            let identity = self.gateway.decrypt_values(&account.identity)?;
            Ok(profile(&account, identity))
        });
        self.observe(Operation::GetAccount, result)
    }

    pub fn get_balance(&self, id: Uuid) -> Result<BalanceView> {
        let result = self.require_account(id).map(|account| BalanceView {
            balance: account.balance,
            currency: account.currency,
        });
        self.observe(Operation::GetBalance, result)
    }

    /// Replace the balance. The account must exist before anything is written.
    pub fn update_balance(&self, id: Uuid, balance: Decimal) -> Result<BalanceView> {
        let result = validation::validate_balance(balance)
            .and_then(|_| self.require_account(id))
            .and_then(|account| {
                // An untouched row is still a successful write
                self.repository.update_balance(id, balance)?;
                Ok(BalanceView {
                    balance,
                    currency: account.currency,
                })
            });
        self.observe(Operation::UpdateBalance, result)
    }

    // === Documents ===

    pub fn add_document(
        &self,
        account_id: Uuid,
        document_type: DocumentType,
        file: FilePayload,
    ) -> Result<Document> {
        let result = file
            .validate()
            .and_then(|_| self.require_account(account_id))
            .and_then(|_| {
                let document = Document::new(account_id, document_type, file);
                self.repository.append_document(&document)?;
                Ok(document)
            });
        self.observe(Operation::SaveDocument, result)
    }

    pub fn list_documents(&self, account_id: Uuid) -> Result<Vec<Document>> {
        let result = self
            .require_account(account_id)
            .and_then(|_| self.repository.list_documents(account_id));
        self.observe(Operation::ListDocuments, result)
    }

    // === Biometrics ===

    pub fn submit_biometric(&self, account_id: Uuid, file: FilePayload) -> Result<BiometricStatus> {
        let result = self.biometrics.submit(account_id, file);
        self.observe(Operation::SaveBiometric, result)
    }

    /// Store a standalone partner biometric; the returned subject carries
    /// the new submission id
    pub fn submit_partner_biometric(&self, file: FilePayload) -> Result<BiometricStatus> {
        let result = self.biometrics.submit_partner(file);
        self.observe(Operation::SaveBiometric, result)
    }

    pub fn biometric_status(&self, subject: &BiometricSubject) -> Result<BiometricStatus> {
        let result = self.biometrics.status(subject);
        self.observe(Operation::GetBiometric, result)
    }

    pub fn validate_biometric(&self, subject: &BiometricSubject, probe: &FilePayload) -> Result<()> {
        let result = self.biometrics.validate(subject, probe);
        if matches!(result, Err(Error::BiometricMismatch)) {
            self.record(
                LogEvent::new("biometric_rejected")
                    .with_operation(Operation::ValidateBiometric.as_str()),
            );
        }
        self.observe(Operation::ValidateBiometric, result)
    }

    // === Expenses ===

    pub fn create_expense(&self, account_id: Uuid, expense: &NewExpense) -> Result<ExpenseRecord> {
        let result = expense
            .validate()
            .and_then(|_| self.require_account(account_id))
            .and_then(|account| self.ledger.create_expense(&account.external_id, expense));
        self.observe(Operation::CreateExpense, result)
    }

    pub fn list_expenses(&self, account_id: Uuid) -> Result<Vec<ExpenseRecord>> {
        let result = self
            .require_account(account_id)
            .and_then(|account| self.ledger.list_expenses(&account.external_id));
        self.observe(Operation::ListExpenses, result)
    }

    pub fn list_expense_categories(&self) -> Result<Vec<ExpenseCategory>> {
        let result = self.ledger.list_expense_categories();
        self.observe(Operation::ListExpenseCategories, result)
    }
}

fn ledger_password() -> String {
    rand::thread_rng()
        .sample_iter(&Alphanumeric)
        .take(LEDGER_PASSWORD_LEN)
        .map(char::from)
        .collect()
}

/// Drop empty strings so absent fields render as null
fn present_only(values: &IdentityValues) -> IdentityValues {
    let mut out = IdentityValues::default();
    for (field, value) in values.present() {
        out.set(field, Some(value.to_string()));
    }
    out
}

fn profile(account: &Account, identity: IdentityValues) -> AccountProfile {
    AccountProfile {
        id: account.id,
        name: account.name.clone(),
        cellphone: account.cellphone.clone(),
        email: identity.get(IdentityField::Email).map(String::from),
        cpf: identity.get(IdentityField::Cpf).map(String::from),
        cnpj: identity.get(IdentityField::Cnpj).map(String::from),
        balance: account.balance,
        currency: account.currency.clone(),
        banking: account.banking.clone(),
        external_id: account.external_id.clone(),
        created_at: account.created_at,
        updated_at: account.updated_at,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::adapters::crypto_service::PlaintextCipher;
    use crate::adapters::duckdb::DuckDbRepository;
    use crate::domain::result::Collaborator;
    use crate::domain::{Argon2Params, BankingDetails};
    use serde_json::json;
    use std::sync::Mutex;

    #[derive(Default)]
    struct MockLedger {
        registered: Mutex<Vec<String>>,
        down: bool,
    }

    impl LedgerProvider for MockLedger {
        fn name(&self) -> &str {
            "mock"
        }

        fn auth(&self) -> Result<()> {
            if self.down {
                return Err(Error::upstream(Collaborator::Ledger, "connection refused"));
            }
            Ok(())
        }

        fn register(&self, login: &str, _password: &str) -> Result<String> {
            let mut registered = self.registered.lock().unwrap();
            registered.push(login.to_string());
            Ok(format!("ext-{}", registered.len()))
        }

        fn create_expense(&self, external_id: &str, expense: &NewExpense) -> Result<ExpenseRecord> {
            Ok(json!({ "user": external_id, "name": expense.reason }))
        }

        fn list_expenses(&self, external_id: &str) -> Result<Vec<ExpenseRecord>> {
            Ok(vec![json!({ "user": external_id })])
        }

        fn list_expense_categories(&self) -> Result<Vec<ExpenseCategory>> {
            Ok(vec![])
        }
    }

    struct AlwaysMatch;

    impl FaceMatcher for AlwaysMatch {
        fn compare(&self, _probe: &FilePayload, _reference: &FilePayload) -> Result<bool> {
            Ok(true)
        }
    }

    fn light_hasher() -> CredentialHasher {
        CredentialHasher::new(Argon2Params {
            time_cost: 1,
            memory_cost: 1024,
            parallelism: 1,
            hash_len: 32,
        })
    }

    fn service_with(ledger: Arc<MockLedger>) -> AccountService {
        let repository = Arc::new(DuckDbRepository::in_memory().unwrap());
        repository.ensure_schema().unwrap();
        AccountService::new(
            repository,
            Arc::new(PlaintextCipher),
            ledger,
            Arc::new(AlwaysMatch),
            light_hasher(),
            IdentityIndexer::new("test-pepper"),
        )
    }

    fn registration() -> Registration {
        Registration {
            name: "Fulano de Tal".to_string(),
            cellphone: "+5511999999999".to_string(),
            email: Some("fulano@example.com".to_string()),
            cpf: Some("529.982.247-25".to_string()),
            password: "Senha123!".to_string(),
            ..Default::default()
        }
    }

    #[test]
    fn test_register_applies_defaults() {
        let ledger = Arc::new(MockLedger::default());
        let service = service_with(ledger.clone());

        let profile = service.register(registration()).unwrap();
        assert_eq!(profile.email.as_deref(), Some("fulano@example.com"));
        assert_eq!(profile.cnpj, None);
        assert_eq!(profile.balance, Decimal::ZERO);
        assert_eq!(profile.currency, "BRL");
        assert_eq!(profile.banking, BankingDetails::default());
        assert_eq!(profile.external_id, "ext-1");
        assert_eq!(*ledger.registered.lock().unwrap(), vec!["fulano@example.com"]);
    }

    #[test]
    fn test_ledger_login_falls_back_to_tax_id() {
        let ledger = Arc::new(MockLedger::default());
        let service = service_with(ledger.clone());

        let mut reg = registration();
        reg.email = None;
        service.register(reg).unwrap();
        assert_eq!(*ledger.registered.lock().unwrap(), vec!["529.982.247-25"]);
    }

    #[test]
    fn test_duplicate_stops_before_ledger() {
        let ledger = Arc::new(MockLedger::default());
        let service = service_with(ledger.clone());
        service.register(registration()).unwrap();

        let mut dup = registration();
        dup.email = Some("outro@example.com".to_string());
        let err = service.register(dup).unwrap_err();
        assert!(matches!(err, Error::AlreadyExists(IdentityField::Cpf)));
        assert_eq!(ledger.registered.lock().unwrap().len(), 1);
    }

    #[test]
    fn test_ledger_failure_persists_nothing() {
        let ledger = Arc::new(MockLedger {
            down: true,
            ..Default::default()
        });
        let service = service_with(ledger);

        let err = service.register(registration()).unwrap_err();
        assert_eq!(err.status(), 502);
        assert!(service.repository.list_accounts().unwrap().is_empty());
    }

    #[test]
    fn test_login_failures_are_indistinguishable() {
        let service = service_with(Arc::new(MockLedger::default()));
        let profile = service.register(registration()).unwrap();

        let ok = service
            .login(&LoginRequest {
                email: Some("fulano@example.com".to_string()),
                password: "Senha123!".to_string(),
                ..Default::default()
            })
            .unwrap();
        assert_eq!(ok.account_id, profile.id);

        let wrong_password = service
            .login(&LoginRequest {
                email: Some("fulano@example.com".to_string()),
                password: "Errada123!".to_string(),
                ..Default::default()
            })
            .unwrap_err();
        let unknown = service
            .login(&LoginRequest {
                email: Some("ninguem@example.com".to_string()),
                password: "Senha123!".to_string(),
                ..Default::default()
            })
            .unwrap_err();

        assert!(matches!(wrong_password, Error::InvalidCredentials));
        assert!(matches!(unknown, Error::InvalidCredentials));
        assert_eq!(wrong_password.to_string(), unknown.to_string());
    }

    #[test]
    fn test_balance_update_requires_account() {
        let service = service_with(Arc::new(MockLedger::default()));
        let err = service
            .update_balance(Uuid::new_v4(), Decimal::new(1000, 2))
            .unwrap_err();
        assert!(matches!(err, Error::NotFound(Resource::Account)));

        let profile = service.register(registration()).unwrap();
        let view = service.update_balance(profile.id, Decimal::new(1050, 2)).unwrap();
        assert_eq!(view.balance, Decimal::new(1050, 2));

        // Writing the same value again is still a success
        assert!(service.update_balance(profile.id, Decimal::new(1050, 2)).is_ok());
        assert_eq!(service.get_balance(profile.id).unwrap().balance, Decimal::new(1050, 2));
    }

    #[test]
    fn test_expenses_use_external_id() {
        let service = service_with(Arc::new(MockLedger::default()));
        let profile = service.register(registration()).unwrap();

        let record = service
            .create_expense(
                profile.id,
                &NewExpense {
                    reason: "Mercado".to_string(),
                    amount: Decimal::new(2500, 2),
                    category: "c1".to_string(),
                },
            )
            .unwrap();
        assert_eq!(record["user"], "ext-1");
        assert_eq!(service.list_expenses(profile.id).unwrap()[0]["user"], "ext-1");

        assert!(matches!(
            service.list_expenses(Uuid::new_v4()),
            Err(Error::NotFound(Resource::Account))
        ));
    }

    #[test]
    fn test_documents_append() {
        let service = service_with(Arc::new(MockLedger::default()));
        let profile = service.register(registration()).unwrap();
        let file = FilePayload::from_bytes(b"scan", "image/jpeg");

        service.add_document(profile.id, DocumentType::Rg, file.clone()).unwrap();
        service.add_document(profile.id, DocumentType::Rg, file).unwrap();

        let documents = service.list_documents(profile.id).unwrap();
        assert_eq!(documents.len(), 2);
        assert!(documents.iter().all(|d| d.document_type == DocumentType::Rg));
    }
}

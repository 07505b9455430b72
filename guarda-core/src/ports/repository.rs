//! Repository port - account store abstraction

use rust_decimal::Decimal;
use uuid::Uuid;

use crate::domain::result::Result;
use crate::domain::{Account, Biometric, BiometricSubject, Document, IdentityField};

/// Account store abstraction
///
/// Implementations must keep accounts in registration order and enforce
/// uniqueness of the blind index columns, reporting a violation as
/// `Error::AlreadyExists` for the offending field.
pub trait AccountRepository: Send + Sync {
    // === Accounts ===

    /// Insert a new account
    fn insert_account(&self, account: &Account) -> Result<()>;

    /// All accounts, in registration order
    fn list_accounts(&self) -> Result<Vec<Account>>;

    /// Get account by ID
    fn get_account(&self, id: Uuid) -> Result<Option<Account>>;

    /// Get account by the blind index of one of its identity fields
    fn find_account_by_index(&self, field: IdentityField, index: &str) -> Result<Option<Account>>;

    /// Overwrite the balance. Returns false if the account does not exist.
    fn update_balance(&self, id: Uuid, balance: Decimal) -> Result<bool>;

    // === Documents ===

    /// Append a document to an account
    fn append_document(&self, document: &Document) -> Result<()>;

    /// Documents of an account, oldest first
    fn list_documents(&self, account_id: Uuid) -> Result<Vec<Document>>;

    // === Biometrics ===

    /// Insert or replace the reference biometric of a subject
    fn upsert_biometric(&self, biometric: &Biometric) -> Result<()>;

    /// Reference biometric of a subject
    fn get_biometric(&self, subject: &BiometricSubject) -> Result<Option<Biometric>>;
}

//! DuckDB account store implementation

use std::path::{Path, PathBuf};
use std::str::FromStr;
use std::sync::{Mutex, MutexGuard};
use std::thread;
use std::time::Duration;

use chrono::{DateTime, Utc};
use duckdb::{params, Connection, OptionalExt};
use rust_decimal::Decimal;
use uuid::Uuid;

use crate::domain::result::{Error, Result};
use crate::domain::{
    Account, BankingDetails, Biometric, BiometricSubject, Document, DocumentType, FilePayload,
    Argon2Params, IdentityField, IdentityValues, PasswordCredential,
};
use crate::ports::AccountRepository;
use crate::services::{MigrationResult, MigrationService};

/// Maximum number of retries when database file is locked
const MAX_RETRIES: u32 = 5;

/// Initial retry delay in milliseconds (doubles each retry: 50, 100, 200, 400, 800ms)
const INITIAL_RETRY_DELAY_MS: u64 = 50;

const ACCOUNT_COLUMNS: &str = "account_id, name, cellphone, email, cpf, cnpj,
    email_index, cpf_index, cnpj_index, password_digest, password_salt,
    password_time_cost, password_memory_cost, password_parallelism, password_hash_len,
    balance::VARCHAR, currency, agency, institution, account_number, external_id,
    created_at, updated_at";

impl From<duckdb::Error> for Error {
    fn from(e: duckdb::Error) -> Self {
        Error::Database(e.to_string())
    }
}

/// Check if an error message indicates a file locking issue that should be retried
fn is_retryable_error(err_msg: &str) -> bool {
    let lower = err_msg.to_lowercase();
    // Windows error messages
    lower.contains("being used by another process")
        || lower.contains("cannot access the file")
        // Unix/macOS error messages
        || lower.contains("resource temporarily unavailable")
        || lower.contains("database is locked")
        || lower.contains("file is already open")
}

/// Identify which identity field a unique-constraint violation is about.
///
/// Returns None when the message is not a uniqueness violation. A violation
/// that names no identity index column is attributed to email.
fn constraint_violation_field(err_msg: &str) -> Option<IdentityField> {
    let lower = err_msg.to_lowercase();
    if !(lower.contains("duplicate key") || lower.contains("unique constraint")) {
        return None;
    }
    let field = IdentityField::ALL
        .into_iter()
        .find(|field| lower.contains(&format!("{}_index", field.as_str())))
        .unwrap_or(IdentityField::Email);
    Some(field)
}

/// Raw account row as read from sys_accounts, before parsing
struct AccountRow {
    id: String,
    name: String,
    cellphone: String,
    identity: [Option<String>; 3],
    index: [Option<String>; 3],
    digest: String,
    salt: String,
    params: [i64; 4],
    balance: String,
    currency: String,
    agency: String,
    institution: String,
    account_number: String,
    external_id: String,
    created_at: String,
    updated_at: String,
}

impl AccountRow {
    fn read(row: &duckdb::Row) -> duckdb::Result<Self> {
        Ok(Self {
            id: row.get(0)?,
            name: row.get(1)?,
            cellphone: row.get(2)?,
            identity: [row.get(3)?, row.get(4)?, row.get(5)?],
            index: [row.get(6)?, row.get(7)?, row.get(8)?],
            digest: row.get(9)?,
            salt: row.get(10)?,
            params: [row.get(11)?, row.get(12)?, row.get(13)?, row.get(14)?],
            balance: row.get(15)?,
            currency: row.get(16)?,
            agency: row.get(17)?,
            institution: row.get(18)?,
            account_number: row.get(19)?,
            external_id: row.get(20)?,
            created_at: row.get(21)?,
            updated_at: row.get(22)?,
        })
    }

    fn into_account(self) -> Result<Account> {
        let [email, cpf, cnpj] = self.identity;
        let [email_index, cpf_index, cnpj_index] = self.index;
        let [time_cost, memory_cost, parallelism, hash_len] = self.params.map(stored_cost);
        Ok(Account {
            id: parse_uuid(&self.id)?,
            name: self.name,
            cellphone: self.cellphone,
            identity: IdentityValues::new(email, cpf, cnpj),
            identity_index: IdentityValues::new(email_index, cpf_index, cnpj_index),
            credential: PasswordCredential {
                digest: self.digest,
                salt: self.salt,
                params: Argon2Params {
                    time_cost: time_cost?,
                    memory_cost: memory_cost?,
                    parallelism: parallelism?,
                    hash_len: hash_len?,
                },
            },
            balance: Decimal::from_str_exact(&self.balance)
                .map_err(|e| Error::database(format!("Invalid stored balance: {}", e)))?,
            currency: self.currency,
            banking: BankingDetails {
                agency: self.agency,
                institution: self.institution,
                account_number: self.account_number,
            },
            external_id: self.external_id,
            created_at: parse_timestamp(&self.created_at),
            updated_at: parse_timestamp(&self.updated_at),
        })
    }
}

/// DuckDB account store
pub struct DuckDbRepository {
    conn: Mutex<Connection>,
    db_path: PathBuf,
}

impl DuckDbRepository {
    /// Open (or create) the store at `db_path`
    ///
    /// Includes retry logic with exponential backoff for file locking errors,
    /// which can occur when several processes open the same store at once.
    pub fn new(db_path: &Path) -> Result<Self> {
        let mut last_error = None;

        for attempt in 0..MAX_RETRIES {
            match Self::try_open_connection(db_path) {
                Ok(conn) => {
                    return Ok(Self {
                        conn: Mutex::new(conn),
                        db_path: db_path.to_path_buf(),
                    });
                }
                Err(e) => {
                    let err_msg = e.to_string();
                    if is_retryable_error(&err_msg) && attempt < MAX_RETRIES - 1 {
                        let delay =
                            Duration::from_millis(INITIAL_RETRY_DELAY_MS * 2u64.pow(attempt));
                        eprintln!(
                            "[guarda] Database busy, retrying in {}ms (attempt {}/{}): {}",
                            delay.as_millis(),
                            attempt + 1,
                            MAX_RETRIES,
                            err_msg
                        );
                        thread::sleep(delay);
                        last_error = Some(e);
                        continue;
                    }
                    return Err(e);
                }
            }
        }

        Err(last_error.unwrap_or_else(|| {
            Error::database(format!("Failed to open database after {} retries", MAX_RETRIES))
        }))
    }

    /// In-memory store, used by tests and throwaway runs
    pub fn in_memory() -> Result<Self> {
        let config = duckdb::Config::default().enable_autoload_extension(false)?;
        let conn = Connection::open_in_memory_with_flags(config)?;
        Ok(Self {
            conn: Mutex::new(conn),
            db_path: PathBuf::from(":memory:"),
        })
    }

    fn try_open_connection(db_path: &Path) -> Result<Connection> {
        // Extension autoloading stays off; nothing here needs an extension
        let config = duckdb::Config::default().enable_autoload_extension(false)?;
        Ok(Connection::open_with_flags(db_path, config)?)
    }

    fn conn(&self) -> Result<MutexGuard<'_, Connection>> {
        self.conn
            .lock()
            .map_err(|e| Error::database(format!("Lock poisoned: {}", e)))
    }

    /// Run database migrations using the MigrationService
    pub fn run_migrations(&self) -> Result<MigrationResult> {
        let conn = self.conn()?;
        MigrationService::new(&conn)
            .run_pending()
            .map_err(|e| Error::database(format!("Migration failed: {}", e)))
    }

    /// Ensure database schema exists (runs pending migrations)
    pub fn ensure_schema(&self) -> Result<()> {
        self.run_migrations()?;
        Ok(())
    }

    pub fn db_path(&self) -> &Path {
        &self.db_path
    }

    /// Number of registered accounts
    pub fn count_accounts(&self) -> Result<i64> {
        let conn = self.conn()?;
        let count: i64 = conn.query_row("SELECT COUNT(*) FROM sys_accounts", [], |row| row.get(0))?;
        Ok(count)
    }

    fn query_accounts(
        &self,
        where_clause: &str,
        param: Option<&str>,
    ) -> Result<Vec<Account>> {
        let conn = self.conn()?;
        let sql = format!(
            "SELECT {} FROM sys_accounts {} ORDER BY registration_seq",
            ACCOUNT_COLUMNS, where_clause
        );
        let mut stmt = conn.prepare(&sql)?;
        let rows = match param {
            Some(p) => stmt
                .query_map([p], AccountRow::read)?
                .collect::<duckdb::Result<Vec<_>>>()?,
            None => stmt
                .query_map([], AccountRow::read)?
                .collect::<duckdb::Result<Vec<_>>>()?,
        };
        rows.into_iter().map(AccountRow::into_account).collect()
    }
}

impl AccountRepository for DuckDbRepository {
    fn insert_account(&self, account: &Account) -> Result<()> {
        let conn = self.conn()?;
        let result = conn.execute(
            "INSERT INTO sys_accounts (account_id, name, cellphone, email, cpf, cnpj,
                                       email_index, cpf_index, cnpj_index,
                                       password_digest, password_salt,
                                       password_time_cost, password_memory_cost,
                                       password_parallelism, password_hash_len,
                                       balance, currency,
                                       agency, institution, account_number, external_id,
                                       created_at, updated_at)
             VALUES (?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?,
                     CAST(? AS DECIMAL(18, 2)), ?, ?, ?, ?, ?, ?, ?)",
            params![
                account.id.to_string(),
                account.name,
                account.cellphone,
                account.identity.get(IdentityField::Email),
                account.identity.get(IdentityField::Cpf),
                account.identity.get(IdentityField::Cnpj),
                account.identity_index.get(IdentityField::Email),
                account.identity_index.get(IdentityField::Cpf),
                account.identity_index.get(IdentityField::Cnpj),
                account.credential.digest,
                account.credential.salt,
                i64::from(account.credential.params.time_cost),
                i64::from(account.credential.params.memory_cost),
                i64::from(account.credential.params.parallelism),
                i64::from(account.credential.params.hash_len),
                account.balance.to_string(),
                account.currency,
                account.banking.agency,
                account.banking.institution,
                account.banking.account_number,
                account.external_id,
                account.created_at.to_rfc3339(),
                account.updated_at.to_rfc3339(),
            ],
        );

        match result {
            Ok(_) => Ok(()),
            Err(e) => match constraint_violation_field(&e.to_string()) {
                Some(field) => Err(Error::AlreadyExists(field)),
                None => Err(e.into()),
            },
        }
    }

    fn list_accounts(&self) -> Result<Vec<Account>> {
        self.query_accounts("", None)
    }

    fn get_account(&self, id: Uuid) -> Result<Option<Account>> {
        let id = id.to_string();
        let mut accounts = self.query_accounts("WHERE account_id = ?", Some(&id))?;
        Ok(accounts.pop())
    }

    fn find_account_by_index(&self, field: IdentityField, index: &str) -> Result<Option<Account>> {
        // Column name comes from a closed enum, never from input
        let where_clause = format!("WHERE {}_index = ?", field.as_str());
        let mut accounts = self.query_accounts(&where_clause, Some(index))?;
        Ok(accounts.pop())
    }

    fn update_balance(&self, id: Uuid, balance: Decimal) -> Result<bool> {
        let conn = self.conn()?;
        let updated = conn.execute(
            "UPDATE sys_accounts
             SET balance = CAST(? AS DECIMAL(18, 2)), updated_at = ?
             WHERE account_id = ?",
            params![balance.to_string(), Utc::now().to_rfc3339(), id.to_string()],
        )?;
        Ok(updated > 0)
    }

    fn append_document(&self, document: &Document) -> Result<()> {
        let conn = self.conn()?;
        conn.execute(
            "INSERT INTO sys_documents (document_id, account_id, document_type, file_b64,
                                        content_type, created_at, attachment_seq)
             VALUES (?, ?, ?, ?, ?, ?, nextval('document_attachment_seq'))",
            params![
                document.id.to_string(),
                document.account_id.to_string(),
                document.document_type.as_str(),
                document.file.file_b64,
                document.file.content_type,
                document.created_at.to_rfc3339(),
            ],
        )?;
        Ok(())
    }

    fn list_documents(&self, account_id: Uuid) -> Result<Vec<Document>> {
        let conn = self.conn()?;
        let mut stmt = conn.prepare(
            "SELECT document_id, account_id, document_type, file_b64, content_type, created_at
             FROM sys_documents
             WHERE account_id = ?
             ORDER BY attachment_seq NULLS FIRST, created_at, document_id",
        )?;
        let rows = stmt
            .query_map([account_id.to_string()], |row| {
                Ok((
                    row.get::<_, String>(0)?,
                    row.get::<_, String>(1)?,
                    row.get::<_, String>(2)?,
                    row.get::<_, String>(3)?,
                    row.get::<_, String>(4)?,
                    row.get::<_, String>(5)?,
                ))
            })?
            .collect::<duckdb::Result<Vec<_>>>()?;

        rows.into_iter()
            .map(|(id, account_id, doc_type, file_b64, content_type, created_at)| {
                Ok(Document {
                    id: parse_uuid(&id)?,
                    account_id: parse_uuid(&account_id)?,
                    document_type: DocumentType::from_str(&doc_type)?,
                    file: FilePayload::new(file_b64, content_type),
                    created_at: parse_timestamp(&created_at),
                })
            })
            .collect()
    }

    fn upsert_biometric(&self, biometric: &Biometric) -> Result<()> {
        let conn = self.conn()?;
        conn.execute(
            "INSERT INTO sys_biometrics (subject_kind, subject_id, file_b64, content_type,
                                         created_at, updated_at)
             VALUES (?, ?, ?, ?, ?, ?)
             ON CONFLICT (subject_kind, subject_id) DO UPDATE SET
                file_b64 = EXCLUDED.file_b64,
                content_type = EXCLUDED.content_type,
                updated_at = EXCLUDED.updated_at",
            params![
                biometric.subject.kind(),
                biometric.subject.id().to_string(),
                biometric.file.file_b64,
                biometric.file.content_type,
                biometric.created_at.to_rfc3339(),
                biometric.updated_at.to_rfc3339(),
            ],
        )?;
        Ok(())
    }

    fn get_biometric(&self, subject: &BiometricSubject) -> Result<Option<Biometric>> {
        let conn = self.conn()?;
        let row = conn
            .query_row(
                "SELECT file_b64, content_type, created_at, updated_at
                 FROM sys_biometrics
                 WHERE subject_kind = ? AND subject_id = ?",
                params![subject.kind(), subject.id().to_string()],
                |row| {
                    Ok((
                        row.get::<_, String>(0)?,
                        row.get::<_, String>(1)?,
                        row.get::<_, String>(2)?,
                        row.get::<_, String>(3)?,
                    ))
                },
            )
            .optional()?;

        Ok(row.map(|(file_b64, content_type, created_at, updated_at)| Biometric {
            subject: *subject,
            file: FilePayload::new(file_b64, content_type),
            created_at: parse_timestamp(&created_at),
            updated_at: parse_timestamp(&updated_at),
        }))
    }
}

// Helper functions

fn parse_uuid(s: &str) -> Result<Uuid> {
    Uuid::parse_str(s).map_err(|e| Error::database(format!("Invalid stored id '{}': {}", s, e)))
}

fn stored_cost(value: i64) -> Result<u32> {
    u32::try_from(value)
        .map_err(|_| Error::database(format!("Invalid stored password cost: {}", value)))
}

fn parse_timestamp(s: &str) -> DateTime<Utc> {
    DateTime::parse_from_rfc3339(s)
        .map(|dt| dt.with_timezone(&Utc))
        .unwrap_or_else(|_| Utc::now())
}

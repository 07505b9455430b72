//! External ledger port
//!
//! The ledger keeps a mirror user per account and stores its expenses.

use crate::domain::result::Result;
use crate::domain::{ExpenseCategory, ExpenseRecord, NewExpense};

/// External expense ledger
pub trait LedgerProvider: Send + Sync {
    /// Provider name (e.g., "expenses-api")
    fn name(&self) -> &str;

    /// Authenticate the service against the ledger
    fn auth(&self) -> Result<()>;

    /// Create a mirror user and return its ledger identifier
    fn register(&self, login: &str, password: &str) -> Result<String>;

    /// Create an expense for a ledger user
    fn create_expense(&self, external_id: &str, expense: &NewExpense) -> Result<ExpenseRecord>;

    /// Expenses of a ledger user
    fn list_expenses(&self, external_id: &str) -> Result<Vec<ExpenseRecord>>;

    /// Categories available for new expenses
    fn list_expense_categories(&self) -> Result<Vec<ExpenseCategory>>;
}

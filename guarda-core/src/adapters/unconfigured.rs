//! Stand-in for a collaborator whose settings are missing
//!
//! Lets the context come up without every service configured; commands that
//! never reach the collaborator keep working, the rest fail with a
//! configuration error naming the missing setting.

use crate::domain::result::{Error, Result};
use crate::domain::{ExpenseCategory, ExpenseRecord, FilePayload, NewExpense};
use crate::ports::{CipherOutcome, FaceMatcher, IdentityCipher, LedgerProvider};

#[derive(Debug, Clone)]
pub struct Unconfigured {
    setting: &'static str,
}

impl Unconfigured {
    pub fn new(setting: &'static str) -> Self {
        Self { setting }
    }

    fn fail<T>(&self) -> Result<T> {
        Err(Error::Config(format!("{} is not set", self.setting)))
    }
}

impl IdentityCipher for Unconfigured {
    fn name(&self) -> &str {
        "unconfigured"
    }

    fn encrypt(&self, _plaintext: &str) -> Result<CipherOutcome> {
        self.fail()
    }

    fn decrypt(&self, _ciphertext: &str) -> Result<CipherOutcome> {
        self.fail()
    }
}

impl LedgerProvider for Unconfigured {
    fn name(&self) -> &str {
        "unconfigured"
    }

    fn auth(&self) -> Result<()> {
        self.fail()
    }

    fn register(&self, _login: &str, _password: &str) -> Result<String> {
        self.fail()
    }

    fn create_expense(&self, _external_id: &str, _expense: &NewExpense) -> Result<ExpenseRecord> {
        self.fail()
    }

    fn list_expenses(&self, _external_id: &str) -> Result<Vec<ExpenseRecord>> {
        self.fail()
    }

    fn list_expense_categories(&self) -> Result<Vec<ExpenseCategory>> {
        self.fail()
    }
}

impl FaceMatcher for Unconfigured {
    fn compare(&self, _probe: &FilePayload, _reference: &FilePayload) -> Result<bool> {
        self.fail()
    }
}

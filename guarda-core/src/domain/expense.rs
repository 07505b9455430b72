//! Expense records kept by the external ledger

use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use serde_json::Value as JsonValue;

use super::result::{Error, Result};

/// Expense record as returned by the ledger, passed through unchanged
pub type ExpenseRecord = JsonValue;

/// Request to create an expense on the ledger
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct NewExpense {
    pub reason: String,
    pub amount: Decimal,
    /// Ledger category id
    pub category: String,
}

impl NewExpense {
    pub fn validate(&self) -> Result<()> {
        if self.reason.trim().is_empty() {
            return Err(Error::validation("O motivo da despesa é obrigatório"));
        }
        if self.amount <= Decimal::ZERO {
            return Err(Error::validation("O valor da despesa deve ser positivo"));
        }
        if self.category.trim().is_empty() {
            return Err(Error::validation("A categoria da despesa é obrigatória"));
        }
        Ok(())
    }
}

/// Expense category offered by the ledger
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ExpenseCategory {
    pub id: String,
    pub name: String,
    #[serde(default)]
    pub description: Option<String>,
}

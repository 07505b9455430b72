//! Account domain model

use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use super::credentials::PasswordCredential;
use super::identity::{IdentityField, IdentityValues, LoginIdentifier};
use super::result::{Error, Result};
use super::validation;

/// Default currency for new accounts
pub const DEFAULT_CURRENCY: &str = "BRL";

/// Banking metadata, treated as opaque strings
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct BankingDetails {
    pub agency: String,
    pub institution: String,
    pub account_number: String,
}

impl Default for BankingDetails {
    fn default() -> Self {
        Self {
            agency: "0001".to_string(),
            institution: "001".to_string(),
            account_number: "000".to_string(),
        }
    }
}

/// An identity record as persisted
///
/// `identity` holds the values as stored at rest (ciphertext under the
/// remote cipher). `identity_index` holds deterministic blind indexes of the
/// plaintext values, used by the store's unique constraints.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Account {
    pub id: Uuid,
    pub name: String,
    pub cellphone: String,
    pub identity: IdentityValues,
    pub identity_index: IdentityValues,
    pub credential: PasswordCredential,
    pub balance: Decimal,
    /// ISO 4217 currency code, normalized to uppercase
    pub currency: String,
    pub banking: BankingDetails,
    /// Identifier issued by the external ledger
    pub external_id: String,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl Account {
    /// Normalize currency code to uppercase
    pub fn normalize_currency(currency: &str) -> String {
        currency.trim().to_uppercase()
    }
}

/// Incoming registration payload
#[derive(Clone, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Registration {
    pub name: String,
    pub cellphone: String,
    #[serde(default)]
    pub email: Option<String>,
    #[serde(default)]
    pub cpf: Option<String>,
    #[serde(default)]
    pub cnpj: Option<String>,
    pub password: String,
    #[serde(default)]
    pub currency: Option<String>,
    #[serde(default)]
    pub balance: Option<Decimal>,
    #[serde(default)]
    pub banking: Option<BankingDetails>,
}

impl std::fmt::Debug for Registration {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Registration")
            .field("name", &self.name)
            .field("has_email", &self.email.is_some())
            .field("has_cpf", &self.cpf.is_some())
            .field("has_cnpj", &self.cnpj.is_some())
            .finish_non_exhaustive()
    }
}

impl Registration {
    /// Candidate identity values (plaintext)
    pub fn identity(&self) -> IdentityValues {
        IdentityValues::new(self.email.clone(), self.cpf.clone(), self.cnpj.clone())
    }

    /// Validate the payload shape
    pub fn validate(&self) -> Result<()> {
        if self.name.trim().is_empty() {
            return Err(Error::validation("O nome completo é obrigatório"));
        }
        validation::validate_cellphone(&self.cellphone)?;

        let identity = self.identity();
        if identity.is_empty() {
            return Err(Error::validation(
                "É necessário fornecer um email, cpf ou cnpj",
            ));
        }
        if let Some(email) = identity.get(IdentityField::Email) {
            validation::validate_email(email)?;
        }
        if let Some(cpf) = identity.get(IdentityField::Cpf) {
            validation::validate_cpf(cpf)?;
        }
        if let Some(cnpj) = identity.get(IdentityField::Cnpj) {
            validation::validate_cnpj(cnpj)?;
        }

        validation::validate_password_complexity(&self.password)?;

        if let Some(balance) = self.balance {
            validation::validate_balance(balance)?;
        }
        if let Some(currency) = &self.currency {
            if currency.trim().is_empty() {
                return Err(Error::validation("A moeda não pode ser vazia"));
            }
        }
        Ok(())
    }
}

/// Incoming login payload
#[derive(Clone, Default, Deserialize)]
pub struct LoginRequest {
    #[serde(default)]
    pub email: Option<String>,
    #[serde(default)]
    pub cpf: Option<String>,
    #[serde(default)]
    pub cnpj: Option<String>,
    pub password: String,
}

impl std::fmt::Debug for LoginRequest {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("LoginRequest")
            .field("identifier", &self.identifier().ok().map(|i| i.field))
            .finish_non_exhaustive()
    }
}

impl LoginRequest {
    /// The identifier to resolve by: email, else CPF, else CNPJ.
    /// Only the first present one is used.
    pub fn identifier(&self) -> Result<LoginIdentifier> {
        let values = IdentityValues::new(self.email.clone(), self.cpf.clone(), self.cnpj.clone());
        let identifier = values
            .present()
            .next()
            .map(|(field, value)| LoginIdentifier {
                field,
                value: value.to_string(),
            })
            .ok_or_else(|| {
                Error::validation(
                    "É necessário fornecer pelo menos um endereço de e-mail ou cpf/cnpj",
                )
            });
        identifier
    }

    pub fn validate(&self) -> Result<()> {
        if self.password.is_empty() {
            return Err(Error::validation("A senha é obrigatória"));
        }
        self.identifier().map(|_| ())
    }
}

/// Account view returned to callers: decrypted identity, no credential material
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct AccountProfile {
    pub id: Uuid,
    pub name: String,
    pub cellphone: String,
    pub email: Option<String>,
    pub cpf: Option<String>,
    pub cnpj: Option<String>,
    pub balance: Decimal,
    pub currency: String,
    pub banking: BankingDetails,
    pub external_id: String,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

/// Balance and currency of an account
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct BalanceView {
    pub balance: Decimal,
    pub currency: String,
}

/// Outcome of an accepted login
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct LoginOutcome {
    pub account_id: Uuid,
}

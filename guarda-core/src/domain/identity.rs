//! Identity fields used both as login keys and uniqueness keys

use serde::{Deserialize, Serialize};

/// One of the identity fields an account can carry
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum IdentityField {
    Email,
    /// National tax ID for individuals
    Cpf,
    /// National tax ID for entities
    Cnpj,
}

impl IdentityField {
    /// Scan order used by uniqueness checks and login resolution
    pub const ALL: [IdentityField; 3] = [IdentityField::Email, IdentityField::Cpf, IdentityField::Cnpj];

    pub fn as_str(&self) -> &'static str {
        match self {
            IdentityField::Email => "email",
            IdentityField::Cpf => "cpf",
            IdentityField::Cnpj => "cnpj",
        }
    }

    /// Human-readable label used in messages
    pub fn label(&self) -> &'static str {
        match self {
            IdentityField::Email => "Email",
            IdentityField::Cpf => "CPF",
            IdentityField::Cnpj => "CNPJ",
        }
    }
}

/// A value per identity field, each optional
///
/// Used for plaintext candidates, stored ciphertexts and blind indexes alike.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct IdentityValues {
    #[serde(default)]
    pub email: Option<String>,
    #[serde(default)]
    pub cpf: Option<String>,
    #[serde(default)]
    pub cnpj: Option<String>,
}

impl IdentityValues {
    pub fn new(email: Option<String>, cpf: Option<String>, cnpj: Option<String>) -> Self {
        Self { email, cpf, cnpj }
    }

    /// Value for a field, treating empty strings as absent
    pub fn get(&self, field: IdentityField) -> Option<&str> {
        let value = match field {
            IdentityField::Email => self.email.as_deref(),
            IdentityField::Cpf => self.cpf.as_deref(),
            IdentityField::Cnpj => self.cnpj.as_deref(),
        };
        value.filter(|v| !v.is_empty())
    }

    pub fn set(&mut self, field: IdentityField, value: Option<String>) {
        match field {
            IdentityField::Email => self.email = value,
            IdentityField::Cpf => self.cpf = value,
            IdentityField::Cnpj => self.cnpj = value,
        }
    }

    /// Present fields in scan order
    pub fn present(&self) -> impl Iterator<Item = (IdentityField, &str)> + '_ {
        IdentityField::ALL
            .into_iter()
            .filter_map(move |field| self.get(field).map(|v| (field, v)))
    }

    pub fn is_empty(&self) -> bool {
        self.present().next().is_none()
    }
}

/// The identifier a login request resolves its candidate by
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct LoginIdentifier {
    pub field: IdentityField,
    pub value: String,
}

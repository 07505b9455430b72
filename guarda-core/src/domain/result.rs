//! Result and error types for the core library

use serde::{Deserialize, Serialize};
use thiserror::Error;

use super::identity::IdentityField;

/// Resource that a lookup failed to find
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Resource {
    Account,
    Biometric,
}

/// External collaborator the core talks to
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Collaborator {
    Crypto,
    Ledger,
    FaceMatch,
}

impl Collaborator {
    pub fn as_str(&self) -> &'static str {
        match self {
            Collaborator::Crypto => "crypto",
            Collaborator::Ledger => "ledger",
            Collaborator::FaceMatch => "face_match",
        }
    }

    fn unreachable_message(&self) -> &'static str {
        match self {
            Collaborator::Crypto => "Não foi possível comunicar com o servidor de criptografia",
            Collaborator::Ledger => "Não foi possível comunicar com o servidor de despesas",
            Collaborator::FaceMatch => "Não foi possível comunicar com o servidor de biometria",
        }
    }
}

/// Core library error type
///
/// The first six variants are the caller-facing taxonomy; everything else
/// is an internal failure and renders as a generic message at the boundary.
#[derive(Error, Debug)]
pub enum Error {
    #[error("{} já está cadastrado", .0.label())]
    AlreadyExists(IdentityField),

    #[error("Usuário ou senha inválido")]
    InvalidCredentials,

    #[error("{}", not_found_message(.0))]
    NotFound(Resource),

    #[error("Biometria inválida.")]
    BiometricMismatch,

    #[error("{}: {}", .0.unreachable_message(), .1)]
    Upstream(Collaborator, String),

    #[error("{0}")]
    Validation(String),

    #[error("Database error: {0}")]
    Database(String),

    #[error("Configuration error: {0}")]
    Config(String),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    #[error("{0}")]
    Other(String),
}

fn not_found_message(resource: &Resource) -> &'static str {
    match resource {
        Resource::Account => "Usuário não encontrado",
        Resource::Biometric => "Biometria não encontrada.",
    }
}

impl Error {
    /// Create a database error
    pub fn database(msg: impl Into<String>) -> Self {
        Self::Database(msg.into())
    }

    /// Create a validation error
    pub fn validation(msg: impl Into<String>) -> Self {
        Self::Validation(msg.into())
    }

    /// Create an upstream (collaborator) failure
    pub fn upstream(collaborator: Collaborator, detail: impl Into<String>) -> Self {
        Self::Upstream(collaborator, detail.into())
    }

    /// Status classification used by the outer boundary
    pub fn status(&self) -> u16 {
        match self {
            Error::AlreadyExists(_) => 409,
            Error::InvalidCredentials => 400,
            Error::NotFound(_) => 404,
            Error::BiometricMismatch => 400,
            Error::Upstream(..) => 502,
            Error::Validation(_) => 422,
            _ => 500,
        }
    }

    /// Whether the error belongs to the caller-facing taxonomy
    pub fn is_internal(&self) -> bool {
        self.status() == 500
    }

    /// Message safe to show to the caller.
    ///
    /// Upstream failures drop the transport detail; internal failures are
    /// replaced by `fallback`.
    pub fn public_message(&self, fallback: &str) -> String {
        match self {
            Error::Upstream(collaborator, _) => collaborator.unreachable_message().to_string(),
            e if e.is_internal() => fallback.to_string(),
            e => e.to_string(),
        }
    }
}

/// Core library result type
pub type Result<T> = std::result::Result<T, Error>;

/// Operation performed at the boundary, used to pick the generic failure message
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Operation {
    Register,
    Login,
    GetAccount,
    SaveDocument,
    ListDocuments,
    UpdateBalance,
    GetBalance,
    SaveBiometric,
    GetBiometric,
    ValidateBiometric,
    CreateExpense,
    ListExpenses,
    ListExpenseCategories,
}

impl Operation {
    pub fn as_str(&self) -> &'static str {
        match self {
            Operation::Register => "register",
            Operation::Login => "login",
            Operation::GetAccount => "get_account",
            Operation::SaveDocument => "save_document",
            Operation::ListDocuments => "list_documents",
            Operation::UpdateBalance => "update_balance",
            Operation::GetBalance => "get_balance",
            Operation::SaveBiometric => "save_biometric",
            Operation::GetBiometric => "get_biometric",
            Operation::ValidateBiometric => "validate_biometric",
            Operation::CreateExpense => "create_expense",
            Operation::ListExpenses => "list_expenses",
            Operation::ListExpenseCategories => "list_expense_categories",
        }
    }

    pub fn failure_message(&self) -> &'static str {
        match self {
            Operation::Register => "Erro ao criar usuário",
            Operation::Login => "Erro ao logar",
            Operation::GetAccount => "Erro ao buscar usuário",
            Operation::SaveDocument => "Erro ao salvar documento",
            Operation::ListDocuments => "Erro ao buscar documentos",
            Operation::UpdateBalance => "Erro ao salvar saldo",
            Operation::GetBalance => "Erro ao buscar saldo",
            Operation::SaveBiometric => "Erro ao salvar biometria",
            Operation::GetBiometric => "Erro ao buscar biometria",
            Operation::ValidateBiometric => "Erro ao validar biometria",
            Operation::CreateExpense => "Erro gerar despesa",
            Operation::ListExpenses => "Erro buscar despesa",
            Operation::ListExpenseCategories => "Erro ao buscar categorias de despesas",
        }
    }
}

/// Structured response envelope rendered at the boundary
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct OperationResult<T> {
    pub success: bool,
    pub status: u16,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub message: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub data: Option<T>,
}

impl<T> OperationResult<T> {
    /// Create a successful result
    pub fn ok(data: T) -> Self {
        Self {
            success: true,
            status: 200,
            message: None,
            data: Some(data),
        }
    }

    /// Create a failed result
    pub fn fail(status: u16, message: impl Into<String>) -> Self {
        Self {
            success: false,
            status,
            message: Some(message.into()),
            data: None,
        }
    }

    /// Render a core result for the given operation
    pub fn from_result(operation: Operation, result: Result<T>) -> Self {
        match result {
            Ok(data) => Self::ok(data),
            Err(e) => Self::fail(e.status(), e.public_message(operation.failure_message())),
        }
    }
}

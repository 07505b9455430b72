//! Identity document domain model

use std::fmt;
use std::str::FromStr;

use base64::Engine;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use super::result::{Error, Result};
use super::validation;

/// Kind of identity document an account can attach
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum DocumentType {
    /// Driver's license
    Cnh,
    /// Foreigner registration
    Rne,
    /// General registration (national ID card)
    Rg,
}

impl DocumentType {
    pub fn as_str(&self) -> &'static str {
        match self {
            DocumentType::Cnh => "cnh",
            DocumentType::Rne => "rne",
            DocumentType::Rg => "rg",
        }
    }
}

impl fmt::Display for DocumentType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for DocumentType {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self> {
        match s.trim().to_lowercase().as_str() {
            "cnh" => Ok(DocumentType::Cnh),
            "rne" => Ok(DocumentType::Rne),
            "rg" => Ok(DocumentType::Rg),
            other => Err(Error::validation(format!(
                "Tipo de documento inválido: '{}' (esperado cnh, rne ou rg)",
                other
            ))),
        }
    }
}

/// A base64 file payload with its content type
#[derive(Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct FilePayload {
    pub file_b64: String,
    pub content_type: String,
}

impl fmt::Debug for FilePayload {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("FilePayload")
            .field("content_type", &self.content_type)
            .field("len", &self.file_b64.len())
            .finish()
    }
}

impl FilePayload {
    pub fn new(file_b64: impl Into<String>, content_type: impl Into<String>) -> Self {
        Self {
            file_b64: file_b64.into(),
            content_type: content_type.into(),
        }
    }

    /// Encode raw bytes as a payload
    pub fn from_bytes(bytes: &[u8], content_type: impl Into<String>) -> Self {
        Self::new(
            base64::engine::general_purpose::STANDARD.encode(bytes),
            content_type,
        )
    }

    /// Decode the payload back to raw bytes
    pub fn decode(&self) -> Result<Vec<u8>> {
        base64::engine::general_purpose::STANDARD
            .decode(&self.file_b64)
            .map_err(|e| Error::validation(format!("Arquivo inválido: {}", e)))
    }

    pub fn validate(&self) -> Result<()> {
        validation::validate_file(&self.file_b64, &self.content_type)
    }
}

/// An identity document attached to an account. Append-only.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Document {
    pub id: Uuid,
    pub account_id: Uuid,
    pub document_type: DocumentType,
    pub file: FilePayload,
    pub created_at: DateTime<Utc>,
}

impl Document {
    pub fn new(account_id: Uuid, document_type: DocumentType, file: FilePayload) -> Self {
        Self {
            id: Uuid::new_v4(),
            account_id,
            document_type,
            file,
            created_at: Utc::now(),
        }
    }
}

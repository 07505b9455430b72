//! Reference biometric domain model

use std::fmt;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use super::document::FilePayload;

/// Who a reference biometric belongs to
///
/// Owned subjects are keyed by an existing account; partner subjects are
/// keyed by the submission id issued when the partner stored the image and
/// have no account behind them.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(tag = "kind", content = "id", rename_all = "lowercase")]
pub enum BiometricSubject {
    Owned(Uuid),
    Partner(Uuid),
}

impl BiometricSubject {
    pub fn kind(&self) -> &'static str {
        match self {
            BiometricSubject::Owned(_) => "account",
            BiometricSubject::Partner(_) => "partner",
        }
    }

    pub fn id(&self) -> Uuid {
        match self {
            BiometricSubject::Owned(id) | BiometricSubject::Partner(id) => *id,
        }
    }

    /// Rebuild a subject from its stored (kind, id) pair
    pub fn from_parts(kind: &str, id: Uuid) -> Option<Self> {
        match kind {
            "account" => Some(BiometricSubject::Owned(id)),
            "partner" => Some(BiometricSubject::Partner(id)),
            _ => None,
        }
    }
}

impl fmt::Display for BiometricSubject {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}:{}", self.kind(), self.id())
    }
}

/// The current reference face image of a subject. Overwritten on resubmission.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Biometric {
    pub subject: BiometricSubject,
    pub file: FilePayload,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl Biometric {
    pub fn new(subject: BiometricSubject, file: FilePayload) -> Self {
        let now = Utc::now();
        Self {
            subject,
            file,
            created_at: now,
            updated_at: now,
        }
    }
}

/// Whether a subject has a reference biometric on file
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct BiometricStatus {
    pub subject: BiometricSubject,
    pub content_type: String,
    pub updated_at: DateTime<Utc>,
}

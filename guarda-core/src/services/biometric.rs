//! Biometric matcher gate
//!
//! Enforces the preconditions of a face comparison before the matcher runs:
//! owned subjects need an existing account, every subject needs a reference
//! biometric on file. Missing either is `NotFound`; a comparison that ran
//! and said no is `BiometricMismatch`; a comparator failure stays a failure.

use std::sync::Arc;

use uuid::Uuid;

use crate::domain::result::{Error, Resource, Result};
use crate::domain::{Biometric, BiometricStatus, BiometricSubject, FilePayload};
use crate::ports::{AccountRepository, FaceMatcher};

pub struct BiometricGate {
    repository: Arc<dyn AccountRepository>,
    matcher: Arc<dyn FaceMatcher>,
}

impl BiometricGate {
    pub fn new(repository: Arc<dyn AccountRepository>, matcher: Arc<dyn FaceMatcher>) -> Self {
        Self {
            repository,
            matcher,
        }
    }

    fn ensure_subject(&self, subject: &BiometricSubject) -> Result<()> {
        match subject {
            BiometricSubject::Owned(account_id) => {
                if self.repository.get_account(*account_id)?.is_none() {
                    return Err(Error::NotFound(Resource::Account));
                }
                Ok(())
            }
            // Partner submissions have no account behind them
            BiometricSubject::Partner(_) => Ok(()),
        }
    }

    /// Reference biometric of a subject, after the subject checks
    pub fn reference(&self, subject: &BiometricSubject) -> Result<Biometric> {
        self.ensure_subject(subject)?;
        self.repository
            .get_biometric(subject)?
            .ok_or(Error::NotFound(Resource::Biometric))
    }

    /// Store (or replace) the reference biometric of an account
    pub fn submit(&self, account_id: Uuid, file: FilePayload) -> Result<BiometricStatus> {
        file.validate()?;
        let subject = BiometricSubject::Owned(account_id);
        self.ensure_subject(&subject)?;
        self.store(subject, file)
    }

    /// Store a standalone partner biometric under a fresh submission id
    pub fn submit_partner(&self, file: FilePayload) -> Result<BiometricStatus> {
        file.validate()?;
        self.store(BiometricSubject::Partner(Uuid::new_v4()), file)
    }

    fn store(&self, subject: BiometricSubject, file: FilePayload) -> Result<BiometricStatus> {
        let mut biometric = Biometric::new(subject, file);
        if let Some(existing) = self.repository.get_biometric(&subject)? {
            biometric.created_at = existing.created_at;
        }
        self.repository.upsert_biometric(&biometric)?;
        Ok(status_of(&biometric))
    }

    pub fn status(&self, subject: &BiometricSubject) -> Result<BiometricStatus> {
        self.reference(subject).map(|b| status_of(&b))
    }

    /// Compare a probe image against the subject's reference
    pub fn validate(&self, subject: &BiometricSubject, probe: &FilePayload) -> Result<()> {
        probe.validate()?;
        let reference = self.reference(subject)?;

        if self.matcher.compare(probe, &reference.file)? {
            Ok(())
        } else {
            Err(Error::BiometricMismatch)
        }
    }
}

fn status_of(biometric: &Biometric) -> BiometricStatus {
    BiometricStatus {
        subject: biometric.subject,
        content_type: biometric.file.content_type.clone(),
        updated_at: biometric.updated_at,
    }
}

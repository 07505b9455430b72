//! Uniqueness resolver
//!
//! Scans existing accounts in registration order and compares their
//! decrypted identity fields against a candidate. The first collision wins:
//! within one account email is checked before CPF before CNPJ.

use std::sync::Arc;

use crate::domain::result::{Error, Result};
use crate::domain::{Account, IdentityField, IdentityValues};
use crate::ports::AccountRepository;

use super::gateway::EncryptionGateway;

pub struct UniquenessResolver {
    repository: Arc<dyn AccountRepository>,
    gateway: EncryptionGateway,
}

impl UniquenessResolver {
    pub fn new(repository: Arc<dyn AccountRepository>, gateway: EncryptionGateway) -> Self {
        Self {
            repository,
            gateway,
        }
    }

    /// Fail with `AlreadyExists(field)` on the first collision with `candidate`
    pub fn ensure_unique(&self, candidate: &IdentityValues) -> Result<()> {
        if candidate.is_empty() {
            return Ok(());
        }

        let accounts = self.repository.list_accounts()?;
        match self.first_collision(candidate, &accounts)? {
            Some(field) => Err(Error::AlreadyExists(field)),
            None => Ok(()),
        }
    }

    /// First colliding field across `accounts`, in scan order
    pub fn first_collision(
        &self,
        candidate: &IdentityValues,
        accounts: &[Account],
    ) -> Result<Option<IdentityField>> {
        for account in accounts {
            for (field, wanted) in candidate.present() {
                // Fields the candidate lacks contribute nothing, so their
                // stored counterparts are never decrypted
                let stored = self.gateway.decrypt(account.identity.get(field))?;
                if stored.as_deref() == Some(wanted) {
                    return Ok(Some(field));
                }
            }
        }
        Ok(None)
    }
}

//! Face matcher port

use crate::domain::result::Result;
use crate::domain::FilePayload;

/// Decides whether two face images show the same person
pub trait FaceMatcher: Send + Sync {
    /// Returns Ok(true) on match, Ok(false) on a definite mismatch, and an
    /// error when no decision could be obtained.
    fn compare(&self, probe: &FilePayload, reference: &FilePayload) -> Result<bool>;
}

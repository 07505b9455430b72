//! Service layer - business logic orchestration
//!
//! Services coordinate domain logic and port interactions. `AccountService`
//! is the entry point; the others are the pieces it is assembled from.

mod account;
mod biometric;
mod blind_index;
mod credentials;
mod gateway;
pub mod logging;
pub mod migration;
mod uniqueness;

pub use account::AccountService;
pub use biometric::BiometricGate;
pub use blind_index::IdentityIndexer;
pub use credentials::CredentialHasher;
pub use gateway::EncryptionGateway;
pub use logging::{EntryPoint, FailureSummary, LogEntry, LogEvent, LoggingService};
pub use migration::{MigrationResult, MigrationService};
pub use uniqueness::UniquenessResolver;

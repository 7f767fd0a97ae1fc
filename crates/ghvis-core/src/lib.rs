//! ghvis-core - Credential vault and batch visibility orchestration.
//!
//! Operators keep several named GitHub credentials per tenant, select one as
//! active, and change repository visibility one at a time or in bounded
//! batches. Persistence and the remote API are collaborators behind the
//! traits in [`traits`].

pub mod batch;
pub mod cipher;
pub mod error;
pub mod memory;
pub mod ratelimit;
pub mod records;
pub mod repo;
pub mod secret;
pub mod traits;
pub mod types;
pub mod vault;

pub use batch::{
    BatchItem, BatchOrchestrator, BatchPolicy, BatchReport, BatchRequest, ItemOutcome,
};
pub use cipher::Cipher;
pub use error::Error;
pub use memory::MemoryStore;
pub use ratelimit::RateLimiter;
pub use records::{
    AuditEntry, AuditStatus, Credential, CredentialInfo, RepoStatus, StoredCredential, UserRecord,
};
pub use repo::RepositoryInfo;
pub use secret::BearerToken;
pub use traits::{
    AuditStore, CredentialStore, RateLimitStore, RepoStatusStore, UserStore, VisibilityRemote,
};
pub use types::{ApiUrl, BatchMode, CredentialName, RepoRef, TenantId, Visibility};
pub use vault::Vault;

/// Result type alias using the crate's Error type.
pub type Result<T> = std::result::Result<T, Error>;

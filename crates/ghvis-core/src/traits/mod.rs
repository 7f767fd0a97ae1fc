//! Collaborator traits for persistence and the remote service.

mod remote;
mod store;

pub use remote::VisibilityRemote;
pub use store::{AuditStore, CredentialStore, RateLimitStore, RepoStatusStore, UserStore};

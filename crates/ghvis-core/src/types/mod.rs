//! Core ghvis types.
//!
//! These types enforce identifier invariants at construction time,
//! ensuring invalid repository and credential names are unrepresentable.

mod api_url;
mod credential_name;
mod repo_ref;
mod tenant;
mod visibility;

pub use api_url::{ApiUrl, DEFAULT_API_BASE};
pub use credential_name::{CredentialName, MAX_CREDENTIAL_NAME_LEN};
pub use repo_ref::RepoRef;
pub use tenant::TenantId;
pub use visibility::{BatchMode, Visibility};

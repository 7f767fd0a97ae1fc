//! Remote visibility client trait.

use async_trait::async_trait;

use crate::Result;
use crate::repo::RepositoryInfo;
use crate::types::RepoRef;

/// The remote operations the orchestrator needs, bound to one credential.
///
/// Each call is independent; implementations hold no session state beyond
/// transport-level pooling.
#[async_trait]
pub trait VisibilityRemote: Send + Sync {
    /// Confirm the credential authenticates and return the remote login.
    ///
    /// A rejected token surfaces as [`Error::Remote`](crate::Error::Remote)
    /// carrying the remote message.
    async fn validate(&self) -> Result<String>;

    /// Fetch repository metadata.
    ///
    /// Returns `Ok(None)` when the remote reports the repository does not
    /// exist. Any other non-success response is an error, so callers can tell
    /// "doesn't exist" from "transient failure".
    async fn get_repository(&self, repo: &RepoRef) -> Result<Option<RepositoryInfo>>;

    /// Change repository visibility. Returns a human-readable confirmation.
    ///
    /// Failures carry the remote-reported reason verbatim.
    async fn set_visibility(&self, repo: &RepoRef, make_private: bool) -> Result<String>;
}

//! Persisting batch side effects.

use chrono::Utc;
use tracing::{debug, warn};

use super::report::BatchReport;
use crate::Result;
use crate::records::{AuditEntry, AuditStatus, RepoStatus};
use crate::traits::{AuditStore, RepoStatusStore};
use crate::types::TenantId;

/// Record the outcomes of a batch.
///
/// Upserts the status cache for every changed repository and appends one
/// `batch_<mode>` audit entry per repository, in report order. A failed
/// write does not stop the others; every item is attempted and the first
/// failure is returned afterwards.
pub async fn record_batch<S>(store: &S, tenant: TenantId, report: &BatchReport) -> Result<()>
where
    S: RepoStatusStore + AuditStore + ?Sized,
{
    let action = report.mode.audit_action();
    let mut first_error = None;
    let mut failures = 0;

    for item in report.iter() {
        if let Some(visibility) = item.outcome.resulting_visibility() {
            let status = RepoStatus {
                repo: item.repo.clone(),
                visibility,
                last_modified: Utc::now(),
            };
            if let Err(e) = store.upsert_repo_status(tenant, status).await {
                warn!(repo = %item.repo, error = %e, "failed to cache repository status");
                failures += 1;
                first_error.get_or_insert(e);
            }
        }

        let entry = AuditEntry::now(
            tenant,
            action.as_str(),
            item.repo.to_string(),
            AuditStatus::from_success(item.outcome.success()),
        );
        if let Err(e) = store.append_audit_entry(entry).await {
            warn!(repo = %item.repo, error = %e, "failed to append audit entry");
            failures += 1;
            first_error.get_or_insert(e);
        }
    }

    debug!(tenant = %tenant, items = report.len(), failures, "batch recorded");
    match first_error {
        Some(e) => Err(e),
        None => Ok(()),
    }
}

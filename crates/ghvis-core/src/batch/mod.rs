//! Bounded-concurrency batch visibility changes.
//!
//! A batch applies one [`BatchMode`] to a list of repositories using a single
//! remote client. Work is admitted through a semaphore of width
//! [`BatchPolicy::max_concurrent`]; each operation holds its slot for an extra
//! [`BatchPolicy::pacing`] delay after it finishes. All units run as futures
//! joined inside the calling task.
//!
//! Individual failures, including panics inside a unit, become
//! [`ItemOutcome::Failed`] entries. Nothing is rolled back and nothing is
//! retried.

mod parse;
mod record;
mod report;

use std::collections::HashSet;
use std::panic::AssertUnwindSafe;
use std::time::Duration;

use futures_util::FutureExt;
use futures_util::future::join_all;
use tokio::sync::Semaphore;
use tracing::{debug, info, instrument, warn};

use crate::Result;
use crate::error::{Error, ValidationError};
use crate::traits::VisibilityRemote;
use crate::types::{BatchMode, RepoRef, Visibility};

pub use parse::parse_repository_list;
pub use record::record_batch;
pub use report::{BatchItem, BatchReport, ItemOutcome, NOT_FOUND_MESSAGE};

/// Default maximum number of distinct repositories per batch.
pub const DEFAULT_MAX_REPOSITORIES: usize = 10;

/// Default number of operations in flight.
pub const DEFAULT_MAX_CONCURRENT: usize = 3;

/// Default delay held after each operation.
pub const DEFAULT_PACING: Duration = Duration::from_millis(200);

/// Limits applied to a batch run.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct BatchPolicy {
    /// Maximum distinct repositories, counted after duplicates collapse.
    pub max_repositories: usize,

    /// Maximum operations in flight. Zero is treated as one.
    pub max_concurrent: usize,

    /// Delay after each operation before its slot is released.
    pub pacing: Duration,
}

impl Default for BatchPolicy {
    fn default() -> Self {
        Self {
            max_repositories: DEFAULT_MAX_REPOSITORIES,
            max_concurrent: DEFAULT_MAX_CONCURRENT,
            pacing: DEFAULT_PACING,
        }
    }
}

/// What to change, and where.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct BatchRequest {
    pub mode: BatchMode,
    /// Repositories in operator order; may contain duplicates.
    pub repositories: Vec<RepoRef>,
}

impl BatchRequest {
    /// Request `mode` for `repositories`, duplicates included.
    pub fn new(mode: BatchMode, repositories: impl IntoIterator<Item = RepoRef>) -> Self {
        Self {
            mode,
            repositories: repositories.into_iter().collect(),
        }
    }
}

/// Runs batches under a [`BatchPolicy`].
#[derive(Debug, Clone, Default)]
pub struct BatchOrchestrator {
    policy: BatchPolicy,
}

impl BatchOrchestrator {
    /// Orchestrator enforcing `policy`.
    pub fn new(policy: BatchPolicy) -> Self {
        Self { policy }
    }

    /// The limits this orchestrator enforces.
    pub fn policy(&self) -> &BatchPolicy {
        &self.policy
    }

    /// Collapse duplicates and check the batch size.
    ///
    /// Owner and name compare ASCII case-insensitively, as GitHub does.
    /// Returns the distinct repositories in first-occurrence order, each
    /// spelled as it first appeared.
    ///
    /// # Errors
    ///
    /// [`ValidationError::EmptyBatch`] for an empty list and
    /// [`ValidationError::BatchTooLarge`] when more than
    /// `max_repositories` distinct repositories remain.
    pub fn prepare(&self, request: &BatchRequest) -> Result<Vec<RepoRef>> {
        let mut seen = HashSet::new();
        let distinct: Vec<RepoRef> = request
            .repositories
            .iter()
            .filter(|repo| seen.insert(dedup_key(repo)))
            .cloned()
            .collect();

        if distinct.is_empty() {
            return Err(ValidationError::EmptyBatch.into());
        }
        if distinct.len() > self.policy.max_repositories {
            return Err(ValidationError::BatchTooLarge {
                count: distinct.len(),
                max: self.policy.max_repositories,
            }
            .into());
        }

        Ok(distinct)
    }

    /// Apply the request with the given remote client.
    ///
    /// Validation happens before any remote call. Once the batch starts,
    /// every distinct repository receives exactly one outcome.
    #[instrument(skip_all, fields(mode = %request.mode, requested = request.repositories.len()))]
    pub async fn run<R>(&self, remote: &R, request: &BatchRequest) -> Result<BatchReport>
    where
        R: VisibilityRemote + ?Sized,
    {
        let repositories = self.prepare(request)?;
        let mode = request.mode;
        let gate = Semaphore::new(self.policy.max_concurrent.max(1));
        let pacing = self.policy.pacing;

        debug!(distinct = repositories.len(), "batch prepared");

        let units = repositories.into_iter().map(|repo| {
            let gate = &gate;
            async move {
                let outcome = match gate.acquire().await {
                    Ok(_permit) => {
                        let outcome = AssertUnwindSafe(apply(remote, mode, &repo))
                            .catch_unwind()
                            .await
                            .unwrap_or_else(|_| {
                                warn!(repo = %repo, "batch operation panicked");
                                ItemOutcome::Failed {
                                    message: "internal error".to_string(),
                                    target: mode.target(),
                                }
                            });
                        tokio::time::sleep(pacing).await;
                        outcome
                    }
                    Err(_) => ItemOutcome::Failed {
                        message: "batch gate closed".to_string(),
                        target: mode.target(),
                    },
                };
                BatchItem { repo, outcome }
            }
        });

        let report = BatchReport {
            mode,
            items: join_all(units).await,
        };

        info!(
            succeeded = report.succeeded(),
            failed = report.failed(),
            "batch finished"
        );
        Ok(report)
    }
}

fn dedup_key(repo: &RepoRef) -> (String, String) {
    (
        repo.owner().to_ascii_lowercase(),
        repo.name().to_ascii_lowercase(),
    )
}

async fn apply<R>(remote: &R, mode: BatchMode, repo: &RepoRef) -> ItemOutcome
where
    R: VisibilityRemote + ?Sized,
{
    let make_private = match mode.target() {
        Some(target) => target.is_private(),
        None => match remote.get_repository(repo).await {
            Ok(Some(info)) => !info.private,
            Ok(None) => return ItemOutcome::NotFound,
            Err(e) => {
                return ItemOutcome::Failed {
                    message: failure_message(e),
                    target: None,
                };
            }
        },
    };

    let target = Visibility::from_private(make_private);
    match remote.set_visibility(repo, make_private).await {
        Ok(message) => {
            debug!(repo = %repo, visibility = %target, "visibility changed");
            ItemOutcome::Changed {
                visibility: target,
                message,
            }
        }
        Err(Error::Remote(e)) if e.is_not_found() => ItemOutcome::NotFound,
        Err(e) => {
            debug!(repo = %repo, error = %e, "visibility change failed");
            ItemOutcome::Failed {
                message: failure_message(e),
                target: Some(target),
            }
        }
    }
}

// Remote failures keep the remote's own wording.
fn failure_message(err: Error) -> String {
    match err {
        Error::Remote(e) => e.message,
        other => other.to_string(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::RemoteError;
    use crate::repo::RepositoryInfo;
    use async_trait::async_trait;
    use std::collections::HashMap;
    use std::sync::Mutex;
    use std::sync::atomic::{AtomicUsize, Ordering};
    use tokio::time::Instant;

    #[derive(Clone, Copy)]
    enum Behavior {
        Ok,
        Fail(u16),
        Missing,
        Panic,
    }

    #[derive(Default)]
    struct MockRemote {
        current_private: HashMap<String, bool>,
        behavior: HashMap<String, Behavior>,
        delay: Duration,
        set_calls: Mutex<Vec<(String, bool)>>,
        get_calls: AtomicUsize,
        in_flight: AtomicUsize,
        max_in_flight: AtomicUsize,
    }

    impl MockRemote {
        fn with(mut self, repo: &str, behavior: Behavior) -> Self {
            self.behavior.insert(repo.to_string(), behavior);
            self
        }

        fn private(mut self, repo: &str, private: bool) -> Self {
            self.current_private.insert(repo.to_string(), private);
            self
        }

        fn set_calls(&self) -> Vec<(String, bool)> {
            self.set_calls.lock().unwrap().clone()
        }

        fn behavior(&self, repo: &RepoRef) -> Behavior {
            self.behavior
                .get(&repo.to_string())
                .copied()
                .unwrap_or(Behavior::Ok)
        }
    }

    #[async_trait]
    impl VisibilityRemote for MockRemote {
        async fn validate(&self) -> Result<String> {
            Ok("octocat".to_string())
        }

        async fn get_repository(&self, repo: &RepoRef) -> Result<Option<RepositoryInfo>> {
            self.get_calls.fetch_add(1, Ordering::SeqCst);
            match self.behavior(repo) {
                Behavior::Missing => Ok(None),
                _ => Ok(Some(RepositoryInfo {
                    name: repo.name().to_string(),
                    full_name: repo.to_string(),
                    owner: repo.owner().to_string(),
                    private: self
                        .current_private
                        .get(&repo.to_string())
                        .copied()
                        .unwrap_or(false),
                    description: None,
                    html_url: format!("https://github.com/{}", repo),
                    language: None,
                    size: 0,
                    created_at: "2024-01-01T00:00:00Z".to_string(),
                    updated_at: "2024-01-01T00:00:00Z".to_string(),
                })),
            }
        }

        async fn set_visibility(&self, repo: &RepoRef, make_private: bool) -> Result<String> {
            let now = self.in_flight.fetch_add(1, Ordering::SeqCst) + 1;
            self.max_in_flight.fetch_max(now, Ordering::SeqCst);
            self.set_calls
                .lock()
                .unwrap()
                .push((repo.to_string(), make_private));
            tokio::time::sleep(self.delay).await;
            self.in_flight.fetch_sub(1, Ordering::SeqCst);

            match self.behavior(repo) {
                Behavior::Ok => Ok(format!(
                    "Repository {} is now {}",
                    repo.name(),
                    Visibility::from_private(make_private)
                )),
                Behavior::Fail(status) => {
                    Err(RemoteError::new(status, "Must have admin rights to Repository.").into())
                }
                Behavior::Missing => Err(RemoteError::new(404, "Not Found").into()),
                Behavior::Panic => panic!("remote exploded"),
            }
        }
    }

    fn repos(names: &[&str]) -> Vec<RepoRef> {
        names.iter().map(|n| RepoRef::new(n).unwrap()).collect()
    }

    fn fast() -> BatchOrchestrator {
        BatchOrchestrator::new(BatchPolicy {
            pacing: Duration::ZERO,
            ..BatchPolicy::default()
        })
    }

    #[tokio::test]
    async fn duplicates_collapse_in_first_occurrence_order() {
        let remote = MockRemote::default();
        let request = BatchRequest::new(BatchMode::MakePrivate, repos(&["a/x", "a/x", "b/y"]));

        let report = fast().run(&remote, &request).await.unwrap();

        let order: Vec<_> = report.iter().map(|i| i.repo.to_string()).collect();
        assert_eq!(order, ["a/x", "b/y"]);
        assert_eq!(remote.set_calls().len(), 2);
        assert!(report.iter().all(|i| i.outcome.success()));
    }

    #[tokio::test]
    async fn duplicates_differing_only_in_case_collapse() {
        let remote = MockRemote::default();
        let request = BatchRequest::new(
            BatchMode::MakePrivate,
            repos(&["Octocat/Hello", "octocat/hello", "OCTOCAT/HELLO"]),
        );

        let report = fast().run(&remote, &request).await.unwrap();

        assert_eq!(report.len(), 1);
        assert_eq!(report.items[0].repo.to_string(), "Octocat/Hello");
        assert_eq!(remote.set_calls(), [("Octocat/Hello".to_string(), true)]);
    }

    #[tokio::test]
    async fn partial_failure_keeps_siblings() {
        let remote = MockRemote::default().with("a/b", Behavior::Fail(403));
        let request = BatchRequest::new(BatchMode::MakePublic, repos(&["a/ok1", "a/b", "a/ok2"]));

        let report = fast().run(&remote, &request).await.unwrap();

        assert_eq!(report.len(), 3);
        assert_eq!(report.succeeded(), 2);
        let failed = report.get(&RepoRef::new("a/b").unwrap()).unwrap();
        assert!(!failed.success());
        assert_eq!(failed.message(), "Must have admin rights to Repository.");
        assert_eq!(failed.resulting_visibility_label(), "unknown");
        assert_eq!(
            failed,
            &ItemOutcome::Failed {
                message: "Must have admin rights to Repository.".to_string(),
                target: Some(Visibility::Public),
            }
        );
    }

    #[tokio::test]
    async fn panic_in_one_unit_is_contained() {
        let remote = MockRemote::default().with("a/boom", Behavior::Panic);
        let request = BatchRequest::new(BatchMode::MakePrivate, repos(&["a/boom", "a/fine"]));

        let report = fast().run(&remote, &request).await.unwrap();

        assert!(!report.get(&RepoRef::new("a/boom").unwrap()).unwrap().success());
        assert!(report.get(&RepoRef::new("a/fine").unwrap()).unwrap().success());
    }

    #[tokio::test]
    async fn auto_toggle_flips_public_to_private() {
        let remote = MockRemote::default().private("a/pub", false).private("a/priv", true);
        let request = BatchRequest::new(BatchMode::AutoToggle, repos(&["a/pub", "a/priv"]));

        let report = fast().run(&remote, &request).await.unwrap();

        let calls = remote.set_calls();
        assert!(calls.contains(&("a/pub".to_string(), true)));
        assert!(calls.contains(&("a/priv".to_string(), false)));
        let public = report.get(&RepoRef::new("a/pub").unwrap()).unwrap();
        assert_eq!(public.resulting_visibility_label(), "private");
        let private = report.get(&RepoRef::new("a/priv").unwrap()).unwrap();
        assert_eq!(private.resulting_visibility(), Some(Visibility::Public));
    }

    #[tokio::test]
    async fn auto_toggle_missing_repo_skips_change() {
        let remote = MockRemote::default().with("a/gone", Behavior::Missing);
        let request = BatchRequest::new(BatchMode::AutoToggle, repos(&["a/gone"]));

        let report = fast().run(&remote, &request).await.unwrap();

        assert_eq!(
            report.get(&RepoRef::new("a/gone").unwrap()),
            Some(&ItemOutcome::NotFound)
        );
        assert!(remote.set_calls().is_empty());
    }

    #[tokio::test]
    async fn fixed_mode_404_is_not_found() {
        let remote = MockRemote::default().with("a/gone", Behavior::Missing);
        let request = BatchRequest::new(BatchMode::MakePrivate, repos(&["a/gone"]));

        let report = fast().run(&remote, &request).await.unwrap();

        assert_eq!(report.items[0].outcome, ItemOutcome::NotFound);
        assert_eq!(remote.get_calls.load(Ordering::SeqCst), 0);
    }

    #[tokio::test]
    async fn oversized_batch_rejected_before_remote_calls() {
        let remote = MockRemote::default();
        let names: Vec<String> = (0..11).map(|i| format!("a/repo{}", i)).collect();
        let request = BatchRequest::new(
            BatchMode::MakePrivate,
            names.iter().map(|n| RepoRef::new(n).unwrap()),
        );

        let err = fast().run(&remote, &request).await.unwrap_err();

        assert!(matches!(
            err,
            Error::Validation(ValidationError::BatchTooLarge { count: 11, max: 10 })
        ));
        assert!(remote.set_calls().is_empty());
    }

    #[tokio::test]
    async fn cap_counts_distinct_repositories() {
        let remote = MockRemote::default();
        let mut list = repos(&["a/r0", "a/r1", "a/r2", "a/r3", "a/r4"]);
        list.extend(repos(&["a/r5", "a/r6", "a/r7", "a/r8", "a/r9", "a/r0"]));
        let request = BatchRequest::new(BatchMode::MakePrivate, list);

        let report = fast().run(&remote, &request).await.unwrap();
        assert_eq!(report.len(), 10);
    }

    #[tokio::test]
    async fn empty_batch_rejected() {
        let remote = MockRemote::default();
        let request = BatchRequest::new(BatchMode::MakePrivate, Vec::new());
        let err = fast().run(&remote, &request).await.unwrap_err();
        assert!(matches!(err, Error::Validation(ValidationError::EmptyBatch)));
    }

    #[tokio::test(start_paused = true)]
    async fn concurrency_is_bounded_and_paced() {
        let remote = MockRemote {
            delay: Duration::from_millis(100),
            ..MockRemote::default()
        };
        let orchestrator = BatchOrchestrator::new(BatchPolicy {
            max_repositories: 10,
            max_concurrent: 3,
            pacing: Duration::from_millis(200),
        });
        let request = BatchRequest::new(
            BatchMode::MakePrivate,
            repos(&["a/1", "a/2", "a/3", "a/4", "a/5", "a/6"]),
        );

        let start = Instant::now();
        let report = orchestrator.run(&remote, &request).await.unwrap();
        let elapsed = start.elapsed();

        assert_eq!(report.succeeded(), 6);
        assert_eq!(remote.max_in_flight.load(Ordering::SeqCst), 3);
        // Two waves of (100ms call + 200ms pacing).
        assert!(elapsed >= Duration::from_millis(600), "{:?}", elapsed);
        assert!(elapsed < Duration::from_millis(900), "{:?}", elapsed);
    }
}

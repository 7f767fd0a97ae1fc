//! Per-repository batch outcomes.

use serde::Serialize;

use crate::types::{BatchMode, RepoRef, Visibility};

/// Message recorded for repositories the remote reports as missing.
pub const NOT_FOUND_MESSAGE: &str = "Repository not found";

/// Outcome of one repository within a batch.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(tag = "outcome", rename_all = "snake_case")]
pub enum ItemOutcome {
    /// The remote accepted the change.
    Changed {
        visibility: Visibility,
        message: String,
    },

    /// The remote reports the repository does not exist.
    NotFound,

    /// The read or the change failed. `target` is the visibility that was
    /// attempted, when one was computed.
    Failed {
        message: String,
        target: Option<Visibility>,
    },
}

impl ItemOutcome {
    /// True only when the remote accepted the change.
    pub fn success(&self) -> bool {
        matches!(self, ItemOutcome::Changed { .. })
    }

    /// Human-readable message: the remote confirmation or failure reason.
    pub fn message(&self) -> &str {
        match self {
            ItemOutcome::Changed { message, .. } | ItemOutcome::Failed { message, .. } => message,
            ItemOutcome::NotFound => NOT_FOUND_MESSAGE,
        }
    }

    /// The visibility the repository now has, known only after a change.
    pub fn resulting_visibility(&self) -> Option<Visibility> {
        match self {
            ItemOutcome::Changed { visibility, .. } => Some(*visibility),
            _ => None,
        }
    }

    /// [`resulting_visibility`](Self::resulting_visibility) as text,
    /// `"unknown"` when not changed.
    pub fn resulting_visibility_label(&self) -> &'static str {
        self.resulting_visibility()
            .map(Visibility::as_str)
            .unwrap_or("unknown")
    }
}

/// A repository and its outcome.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct BatchItem {
    pub repo: RepoRef,
    #[serde(flatten)]
    pub outcome: ItemOutcome,
}

/// Result of one batch run.
///
/// Holds exactly one item per distinct repository, in the order each
/// repository first appeared in the request.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct BatchReport {
    pub mode: BatchMode,
    pub items: Vec<BatchItem>,
}

impl BatchReport {
    /// Outcome for a repository, if it was part of the batch.
    pub fn get(&self, repo: &RepoRef) -> Option<&ItemOutcome> {
        self.items
            .iter()
            .find(|item| &item.repo == repo)
            .map(|item| &item.outcome)
    }

    /// Number of repositories changed successfully.
    pub fn succeeded(&self) -> usize {
        self.items.iter().filter(|i| i.outcome.success()).count()
    }

    /// Number of repositories not changed.
    pub fn failed(&self) -> usize {
        self.items.len() - self.succeeded()
    }

    /// Number of distinct repositories in the batch.
    pub fn len(&self) -> usize {
        self.items.len()
    }

    /// True if the report holds no items.
    pub fn is_empty(&self) -> bool {
        self.items.is_empty()
    }

    /// Items in request order.
    pub fn iter(&self) -> impl Iterator<Item = &BatchItem> {
        self.items.iter()
    }
}

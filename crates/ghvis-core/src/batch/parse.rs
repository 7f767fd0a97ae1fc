//! Parsing of operator-supplied repository lists.

use crate::Result;
use crate::types::RepoRef;

/// Parse a comma-separated list of repositories.
///
/// Entries are trimmed and empty entries skipped. Entries without an owner
/// (`hello` rather than `octocat/hello`) are qualified with `default_owner`,
/// usually the login of the active credential. Duplicates are kept; the
/// orchestrator collapses them.
///
/// # Errors
///
/// Returns a validation error for the first malformed entry.
///
/// # Example
///
/// ```
/// use ghvis_core::batch::parse_repository_list;
///
/// let repos = parse_repository_list("hello, octo-org/tools", "octocat").unwrap();
/// assert_eq!(repos[0].to_string(), "octocat/hello");
/// assert_eq!(repos[1].to_string(), "octo-org/tools");
/// ```
pub fn parse_repository_list(input: &str, default_owner: &str) -> Result<Vec<RepoRef>> {
    input
        .split(',')
        .map(str::trim)
        .filter(|entry| !entry.is_empty())
        .map(|entry| {
            if entry.contains('/') {
                RepoRef::new(entry)
            } else {
                RepoRef::from_parts(default_owner, entry)
            }
        })
        .collect()
}

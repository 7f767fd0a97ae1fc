//! Remote repository types.
//!
//! This module defines what the remote reports about a repository.
//! The operations themselves are methods on [`VisibilityRemote`](crate::VisibilityRemote).

mod types;

pub use types::RepositoryInfo;

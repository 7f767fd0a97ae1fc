//! ghvis-github - GitHub REST implementation of the visibility remote.
//!
//! [`GithubClient`] is built from one decrypted credential and an API base
//! and implements [`ghvis_core::VisibilityRemote`].

mod client;
mod endpoints;

pub use client::GithubClient;

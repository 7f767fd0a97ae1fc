//! ghvis-file - Filesystem-backed persistence for ghvis.
//!
//! [`FileStore`] implements every persistence trait of `ghvis-core` on plain
//! JSON files guarded by advisory locks, so several `ghvis` processes can
//! share one data directory.

mod store;

pub use store::FileStore;

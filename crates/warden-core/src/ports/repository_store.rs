//! RepositoryStore port - the persistent record store.
//!
//! The scheduler treats the store as an opaque keyed store that is
//! synchronised on its own. It never serialises updates itself: the
//! one-task-per-url guarantee of the queue already keeps two runners from
//! writing the same record at once.

use async_trait::async_trait;

use crate::domain::{RepoUrl, RepositoryRecord, RepositoryUpdate, StoreError};

#[async_trait]
pub trait RepositoryStore: Send + Sync {
    /// Case-insensitive lookup by canonical url.
    async fn find_by_url(&self, url: &RepoUrl) -> Result<Option<RepositoryRecord>, StoreError>;

    /// Insert a bare `uninitialised` record if none exists and return the
    /// stored record. Concurrent creates for the same url must not fail.
    async fn create(&self, url: &RepoUrl) -> Result<RepositoryRecord, StoreError>;

    /// Write the outcome of one completed check.
    async fn update(&self, url: &RepoUrl, update: RepositoryUpdate) -> Result<(), StoreError>;

    async fn is_registered(&self, url: &RepoUrl) -> Result<bool, StoreError>;
}

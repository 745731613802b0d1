//! InMemoryRepositoryStore - 開発用・テスト用の record store

use std::collections::{HashMap, HashSet};
use std::sync::{PoisonError, RwLock};

use async_trait::async_trait;

use crate::domain::{RepoUrl, RepositoryRecord, RepositoryUpdate, StoreError};
use crate::ports::RepositoryStore;

/// Records and registrations keyed by the lowercase url.
#[derive(Default)]
pub struct InMemoryRepositoryStore {
    records: RwLock<HashMap<String, RepositoryRecord>>,
    registered: RwLock<HashSet<String>>,
}

impl InMemoryRepositoryStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Pre-register repositories (for `require_registration`).
    pub fn with_registered<'a>(self, urls: impl IntoIterator<Item = &'a RepoUrl>) -> Self {
        for url in urls {
            self.register(url);
        }
        self
    }

    pub fn register(&self, url: &RepoUrl) -> bool {
        self.registered
            .write()
            .unwrap_or_else(PoisonError::into_inner)
            .insert(url.key().to_string())
    }

    /// Insert or replace a record as is.
    pub fn insert(&self, record: RepositoryRecord) {
        self.records
            .write()
            .unwrap_or_else(PoisonError::into_inner)
            .insert(record.url.key().to_string(), record);
    }

    pub fn get(&self, url: &RepoUrl) -> Option<RepositoryRecord> {
        self.records
            .read()
            .unwrap_or_else(PoisonError::into_inner)
            .get(url.key())
            .cloned()
    }

    pub fn len(&self) -> usize {
        self.records
            .read()
            .unwrap_or_else(PoisonError::into_inner)
            .len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// All records, sorted by url.
    pub fn records(&self) -> Vec<RepositoryRecord> {
        let mut records: Vec<RepositoryRecord> = self
            .records
            .read()
            .unwrap_or_else(PoisonError::into_inner)
            .values()
            .cloned()
            .collect();
        records.sort_by(|a, b| a.url.key().cmp(b.url.key()));
        records
    }
}

#[async_trait]
impl RepositoryStore for InMemoryRepositoryStore {
    async fn find_by_url(&self, url: &RepoUrl) -> Result<Option<RepositoryRecord>, StoreError> {
        Ok(self.get(url))
    }

    async fn create(&self, url: &RepoUrl) -> Result<RepositoryRecord, StoreError> {
        let mut records = self.records.write().unwrap_or_else(PoisonError::into_inner);
        let record = records
            .entry(url.key().to_string())
            .or_insert_with(|| RepositoryRecord::new(url.clone()));
        Ok(record.clone())
    }

    async fn update(&self, url: &RepoUrl, update: RepositoryUpdate) -> Result<(), StoreError> {
        let mut records = self.records.write().unwrap_or_else(PoisonError::into_inner);
        let record = records
            .get_mut(url.key())
            .ok_or_else(|| StoreError::NotFound(url.clone()))?;
        record.apply(update);
        Ok(())
    }

    async fn is_registered(&self, url: &RepoUrl) -> Result<bool, StoreError> {
        Ok(self
            .registered
            .read()
            .unwrap_or_else(PoisonError::into_inner)
            .contains(url.key()))
    }
}

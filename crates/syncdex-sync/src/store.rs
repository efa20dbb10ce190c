//! In-memory [`DocumentStore`].
//!
//! Keeps records ordered by id and records the cursors and id lookups it
//! receives. Ids that both parse as integers compare numerically; anything
//! else compares as text.

use std::cmp::Ordering;
use std::sync::{PoisonError, RwLock, RwLockReadGuard, RwLockWriteGuard};

use async_trait::async_trait;
use syncdex_core::{DocumentStore, Indexable, Result};

/// Ordering used for record ids.
pub fn compare_ids(a: &str, b: &str) -> Ordering {
    match (a.parse::<u64>(), b.parse::<u64>()) {
        (Ok(x), Ok(y)) => x.cmp(&y),
        _ => a.cmp(b),
    }
}

#[derive(Debug)]
struct Inner<T> {
    records: Vec<T>,
    cursors: Vec<Option<String>>,
    lookups: Vec<Vec<String>>,
}

/// Primary store held in memory.
#[derive(Debug)]
pub struct MemoryStore<T> {
    inner: RwLock<Inner<T>>,
}

impl<T> MemoryStore<T>
where
    T: Indexable + Clone,
{
    /// Empty store.
    pub fn new() -> Self {
        Self {
            inner: RwLock::new(Inner {
                records: Vec::new(),
                cursors: Vec::new(),
                lookups: Vec::new(),
            }),
        }
    }

    /// Store holding the given records.
    pub fn from_records(records: impl IntoIterator<Item = T>) -> Self {
        let store = Self::new();
        for record in records {
            store.insert(record);
        }
        store
    }

    fn read(&self) -> RwLockReadGuard<'_, Inner<T>> {
        self.inner.read().unwrap_or_else(PoisonError::into_inner)
    }

    fn write(&self) -> RwLockWriteGuard<'_, Inner<T>> {
        self.inner.write().unwrap_or_else(PoisonError::into_inner)
    }

    /// Insert or replace a record.
    pub fn insert(&self, record: T) {
        let id = record.id();
        let mut inner = self.write();
        match inner
            .records
            .binary_search_by(|r| compare_ids(&r.id(), &id))
        {
            Ok(pos) => inner.records[pos] = record,
            Err(pos) => inner.records.insert(pos, record),
        }
    }

    /// Remove a record by id.
    pub fn remove(&self, id: &str) -> Option<T> {
        let mut inner = self.write();
        let pos = inner.records.iter().position(|r| r.id() == id)?;
        Some(inner.records.remove(pos))
    }

    /// Record by id.
    pub fn get(&self, id: &str) -> Option<T> {
        self.read().records.iter().find(|r| r.id() == id).cloned()
    }

    /// Number of records.
    pub fn len(&self) -> usize {
        self.read().records.len()
    }

    /// Whether the store is empty.
    pub fn is_empty(&self) -> bool {
        self.read().records.is_empty()
    }

    /// Cursors passed to `page_after`, in call order.
    pub fn cursors(&self) -> Vec<Option<String>> {
        self.read().cursors.clone()
    }

    /// Id lists passed to `find_many`, in call order.
    pub fn lookups(&self) -> Vec<Vec<String>> {
        self.read().lookups.clone()
    }
}

impl<T> Default for MemoryStore<T>
where
    T: Indexable + Clone,
{
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait]
impl<T> DocumentStore<T> for MemoryStore<T>
where
    T: Indexable + Clone + 'static,
{
    async fn count(&self) -> Result<u64> {
        Ok(self.read().records.len() as u64)
    }

    async fn page_after(&self, last_id: Option<&str>, limit: usize) -> Result<Vec<T>> {
        let mut inner = self.write();
        inner.cursors.push(last_id.map(str::to_string));
        Ok(inner
            .records
            .iter()
            .filter(|r| last_id.is_none_or(|last| compare_ids(&r.id(), last) == Ordering::Greater))
            .take(limit)
            .cloned()
            .collect())
    }

    async fn find_many(&self, ids: &[String]) -> Result<Vec<T>> {
        let mut inner = self.write();
        inner.lookups.push(ids.to_vec());
        Ok(inner
            .records
            .iter()
            .filter(|r| ids.contains(&r.id()))
            .cloned()
            .collect())
    }
}

// ============================================================================
// Tests
// ============================================================================

use std::collections::HashSet;
use std::sync::atomic::{AtomicBool, AtomicUsize, Ordering};

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use tokio::sync::Mutex;
use uuid::Uuid;

use crate::core::task::{Category, NewTask, TaskPatch};

use super::{StoreError, TaskRow, TaskStore};

/// Store double that keeps rows in process memory.
///
/// Rows come back the way the real service returns them, sorted by order key
/// with ties in insertion order. The call counters and failure switches let
/// tests script write errors without a server.
#[derive(Default)]
pub struct MemoryStore {
    rows: Mutex<Vec<MemoryRow>>,
    select_calls: AtomicUsize,
    insert_calls: AtomicUsize,
    update_calls: AtomicUsize,
    delete_calls: AtomicUsize,
    fail_reads: AtomicBool,
    fail_writes: AtomicBool,
    fail_update_ids: Mutex<HashSet<Uuid>>,
}

#[derive(Debug, Clone)]
struct MemoryRow {
    id: Uuid,
    title: String,
    is_done: bool,
    category: Category,
    created_at: DateTime<Utc>,
    order_index: i64,
}

impl MemoryStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Insert a row directly, bypassing the failure switches. Returns the id.
    pub async fn seed(
        &self,
        title: &str,
        category: Category,
        is_done: bool,
        order_index: i64,
    ) -> Uuid {
        let id = Uuid::new_v4();
        self.rows.lock().await.push(MemoryRow {
            id,
            title: title.to_string(),
            is_done,
            category,
            created_at: Utc::now(),
            order_index,
        });
        id
    }

    /// Current rows in service order, for assertions.
    pub async fn snapshot(&self) -> Vec<TaskRow> {
        let mut rows = self.rows.lock().await.clone();
        rows.sort_by_key(|r| r.order_index);
        rows.into_iter().map(row_to_wire).collect()
    }

    pub fn select_calls(&self) -> usize {
        self.select_calls.load(Ordering::Relaxed)
    }

    pub fn insert_calls(&self) -> usize {
        self.insert_calls.load(Ordering::Relaxed)
    }

    pub fn update_calls(&self) -> usize {
        self.update_calls.load(Ordering::Relaxed)
    }

    pub fn delete_calls(&self) -> usize {
        self.delete_calls.load(Ordering::Relaxed)
    }

    /// Make every select fail until cleared.
    pub fn set_fail_reads(&self, enabled: bool) {
        self.fail_reads.store(enabled, Ordering::Relaxed);
    }

    /// Make every write fail until cleared.
    pub fn set_fail_writes(&self, enabled: bool) {
        self.fail_writes.store(enabled, Ordering::Relaxed);
    }

    /// Make updates for one row fail while the rest keep working.
    pub async fn fail_updates_for(&self, id: Uuid) {
        self.fail_update_ids.lock().await.insert(id);
    }

    fn injected(&self, what: &str) -> StoreError {
        StoreError::Http {
            status: 500,
            message: format!("injected {} failure", what),
            code: None,
        }
    }
}

fn row_to_wire(row: MemoryRow) -> TaskRow {
    TaskRow {
        id: row.id,
        title: row.title,
        is_done: Some(row.is_done),
        category: Some(row.category.as_str().to_string()),
        created_at: Some(row.created_at),
        order_index: Some(row.order_index),
    }
}

#[async_trait]
impl TaskStore for MemoryStore {
    async fn select_all(&self) -> Result<Vec<TaskRow>, StoreError> {
        self.select_calls.fetch_add(1, Ordering::Relaxed);
        if self.fail_reads.load(Ordering::Relaxed) {
            return Err(self.injected("select"));
        }
        Ok(self.snapshot().await)
    }

    async fn insert(&self, task: &NewTask) -> Result<(), StoreError> {
        self.insert_calls.fetch_add(1, Ordering::Relaxed);
        if self.fail_writes.load(Ordering::Relaxed) {
            return Err(self.injected("insert"));
        }
        self.rows.lock().await.push(MemoryRow {
            id: Uuid::new_v4(),
            title: task.title.clone(),
            is_done: task.is_done,
            category: task.category,
            created_at: Utc::now(),
            order_index: task.order_index,
        });
        Ok(())
    }

    async fn update(&self, id: Uuid, patch: &TaskPatch) -> Result<(), StoreError> {
        self.update_calls.fetch_add(1, Ordering::Relaxed);
        if self.fail_writes.load(Ordering::Relaxed)
            || self.fail_update_ids.lock().await.contains(&id)
        {
            return Err(self.injected("update"));
        }
        let mut rows = self.rows.lock().await;
        if let Some(row) = rows.iter_mut().find(|r| r.id == id) {
            if let Some(done) = patch.is_done {
                row.is_done = done;
            }
            if let Some(order_index) = patch.order_index {
                row.order_index = order_index;
            }
        }
        Ok(())
    }

    async fn delete(&self, id: Uuid) -> Result<(), StoreError> {
        self.delete_calls.fetch_add(1, Ordering::Relaxed);
        if self.fail_writes.load(Ordering::Relaxed) {
            return Err(self.injected("delete"));
        }
        self.rows.lock().await.retain(|r| r.id != id);
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn rows_come_back_sorted_by_order_key() {
        let store = MemoryStore::new();
        store.seed("second", Category::Work, false, 200).await;
        store.seed("first", Category::Life, false, 100).await;
        let rows = store.select_all().await.unwrap();
        assert_eq!(rows[0].title, "first");
        assert_eq!(rows[1].title, "second");
        assert_eq!(store.select_calls(), 1);
    }

    #[tokio::test]
    async fn update_touches_only_set_fields() {
        let store = MemoryStore::new();
        let id = store.seed("task", Category::Life, false, 5).await;
        store.update(id, &TaskPatch::done(true)).await.unwrap();
        let rows = store.snapshot().await;
        assert_eq!(rows[0].is_done, Some(true));
        assert_eq!(rows[0].order_index, Some(5));
        assert_eq!(rows[0].category.as_deref(), Some("life"));
    }

    #[tokio::test]
    async fn update_for_missing_id_is_ok() {
        let store = MemoryStore::new();
        store
            .update(Uuid::new_v4(), &TaskPatch::order(1))
            .await
            .unwrap();
        assert_eq!(store.update_calls(), 1);
    }

    #[tokio::test]
    async fn scripted_update_failure_only_hits_that_row() {
        let store = MemoryStore::new();
        let poisoned = store.seed("poisoned", Category::Work, false, 0).await;
        let healthy = store.seed("healthy", Category::Work, false, 1).await;
        store.fail_updates_for(poisoned).await;
        assert!(store.update(poisoned, &TaskPatch::order(9)).await.is_err());
        assert!(store.update(healthy, &TaskPatch::order(9)).await.is_ok());
    }

    #[tokio::test]
    async fn delete_is_idempotent() {
        let store = MemoryStore::new();
        let id = store.seed("gone", Category::Work, false, 0).await;
        store.delete(id).await.unwrap();
        store.delete(id).await.unwrap();
        assert!(store.snapshot().await.is_empty());
        assert_eq!(store.delete_calls(), 2);
    }
}

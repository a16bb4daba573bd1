pub mod memory;
pub mod supabase;

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use serde::Deserialize;
use uuid::Uuid;

use crate::core::task::{Category, NewTask, Task, TaskPatch};

/// One row of the task table, as the service returns it.
///
/// Nullable columns stay optional here; [`TaskRow::into_task`] applies the
/// display defaults so one odd row cannot take down the whole list.
#[derive(Debug, Clone, Deserialize)]
pub struct TaskRow {
    pub id: Uuid,
    pub title: String,
    pub is_done: Option<bool>,
    pub category: Option<String>,
    pub created_at: Option<DateTime<Utc>>,
    pub order_index: Option<i64>,
}

impl TaskRow {
    /// Lossy read into the domain type: null `is_done` reads as not done,
    /// an unknown category reads as Work, a missing order key reads as 0.
    pub fn into_task(self) -> Task {
        Task {
            id: self.id,
            title: self.title,
            category: Category::from_str_lossy(self.category.as_deref().unwrap_or("")),
            done: self.is_done.unwrap_or(false),
            order_index: self.order_index.unwrap_or(0),
            created_at: self.created_at,
        }
    }
}

#[derive(Debug, Clone, thiserror::Error)]
pub enum StoreError {
    /// The service answered with an error body.
    #[error("store error {status}: {message}")]
    Http {
        status: u16,
        message: String,
        code: Option<String>,
    },
    #[error("store request failed: {0}")]
    Transport(String),
    #[error("invalid store response: {0}")]
    Decode(String),
}

/// Persistence seam for the task table. The board only calls through this
/// trait, so tests swap in [`memory::MemoryStore`] without touching the rest.
#[async_trait]
pub trait TaskStore: Send + Sync {
    /// Every row for the signed-in user, ascending by order key.
    async fn select_all(&self) -> Result<Vec<TaskRow>, StoreError>;

    async fn insert(&self, task: &NewTask) -> Result<(), StoreError>;

    /// Apply the set fields of `patch` to the row with `id`. Matching no row
    /// is a success, the same as a filtered update against the service.
    async fn update(&self, id: Uuid, patch: &TaskPatch) -> Result<(), StoreError>;

    /// Safe to call for an id that is already gone.
    async fn delete(&self, id: Uuid) -> Result<(), StoreError>;
}

#[cfg(test)]
mod tests {
    use super::*;

    fn row(title: &str) -> TaskRow {
        TaskRow {
            id: Uuid::new_v4(),
            title: title.to_string(),
            is_done: None,
            category: None,
            created_at: None,
            order_index: None,
        }
    }

    #[test]
    fn row_defaults_apply() {
        let task = row("untagged").into_task();
        assert!(!task.done);
        assert_eq!(task.category, Category::Work);
        assert_eq!(task.order_index, 0);
        assert!(task.created_at.is_none());
    }

    #[test]
    fn row_with_unknown_category_reads_as_work() {
        let mut r = row("odd");
        r.category = Some("chores".to_string());
        assert_eq!(r.into_task().category, Category::Work);
    }

    #[test]
    fn row_fields_carry_over() {
        let mut r = row("carried");
        r.is_done = Some(true);
        r.category = Some("life".to_string());
        r.order_index = Some(300);
        let task = r.into_task();
        assert!(task.done);
        assert_eq!(task.category, Category::Life);
        assert_eq!(task.order_index, 300);
    }

    #[test]
    fn rows_parse_from_service_json() {
        let json = r#"[
            {"id":"b5f9d9a2-7c4e-4df0-9f2f-0a2d2d5f6e71","title":"Pay rent","is_done":false,"category":"life","created_at":"2026-02-01T08:30:00+00:00","order_index":0},
            {"id":"6e011710-3a77-4f4e-9f05-1df79a52cc29","title":"Ship report","is_done":null,"category":"work","created_at":null,"order_index":100}
        ]"#;
        let rows: Vec<TaskRow> = serde_json::from_str(json).unwrap();
        assert_eq!(rows.len(), 2);
        assert_eq!(rows[0].title, "Pay rent");
        assert!(rows[0].created_at.is_some());
        assert_eq!(rows[1].is_done, None);
        let second = rows[1].clone().into_task();
        assert!(!second.done);
        assert_eq!(second.order_index, 100);
    }
}

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Category {
    Work,
    Life,
}

impl Category {
    /// Column value stored by the backend.
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Work => "work",
            Self::Life => "life",
        }
    }

    /// Tolerant read of a stored column value: anything other than exactly
    /// "life" reads as Work.
    pub fn from_str_lossy(s: &str) -> Self {
        if s == "life" { Self::Life } else { Self::Work }
    }

    pub fn label(&self) -> &'static str {
        match self {
            Self::Work => "Work",
            Self::Life => "Life",
        }
    }
}

/// Category tab over the full list; All shows every task.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CategoryFilter {
    All,
    Work,
    Life,
}

impl CategoryFilter {
    pub fn matches(&self, category: Category) -> bool {
        match self {
            Self::All => true,
            Self::Work => category == Category::Work,
            Self::Life => category == Category::Life,
        }
    }

    /// Category a task added under this tab gets; the All tab adds as Work.
    pub fn add_category(&self) -> Category {
        match self {
            Self::Life => Category::Life,
            _ => Category::Work,
        }
    }

    pub fn label(&self) -> &'static str {
        match self {
            Self::All => "All",
            Self::Work => "Work",
            Self::Life => "Life",
        }
    }
}

impl Default for CategoryFilter {
    fn default() -> Self {
        Self::All
    }
}

impl From<Category> for CategoryFilter {
    fn from(category: Category) -> Self {
        match category {
            Category::Work => Self::Work,
            Category::Life => Self::Life,
        }
    }
}

/// Category tab of the inbox view, which has no All tab.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum InboxTab {
    Work,
    Life,
}

impl InboxTab {
    pub fn category(&self) -> Category {
        match self {
            Self::Work => Category::Work,
            Self::Life => Category::Life,
        }
    }
}

impl Default for InboxTab {
    fn default() -> Self {
        Self::Work
    }
}

impl From<InboxTab> for CategoryFilter {
    fn from(tab: InboxTab) -> Self {
        Self::from(tab.category())
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Task {
    pub id: Uuid,
    pub title: String,
    pub category: Category,
    pub done: bool,
    /// Display position in the order space shared by both categories.
    /// Gaps are fine; ties break by arrival order.
    pub order_index: i64,
    /// Informational only, never used for ordering.
    pub created_at: Option<DateTime<Utc>>,
}

impl Task {
    pub fn new(title: impl Into<String>, category: Category) -> Self {
        Self {
            id: Uuid::new_v4(),
            title: title.into(),
            category,
            done: false,
            order_index: 0,
            created_at: None,
        }
    }
}

/// Insert payload; the backend assigns id and created_at.
#[derive(Debug, Clone, Serialize)]
pub struct NewTask {
    pub title: String,
    pub category: Category,
    pub is_done: bool,
    pub order_index: i64,
}

impl NewTask {
    pub fn new(title: impl Into<String>, category: Category, order_index: i64) -> Self {
        Self {
            title: title.into(),
            category,
            is_done: false,
            order_index,
        }
    }
}

/// Partial update; only the set fields are written.
#[derive(Debug, Clone, Default, Serialize)]
pub struct TaskPatch {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub is_done: Option<bool>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub order_index: Option<i64>,
}

impl TaskPatch {
    pub fn done(value: bool) -> Self {
        Self {
            is_done: Some(value),
            ..Self::default()
        }
    }

    pub fn order(value: i64) -> Self {
        Self {
            order_index: Some(value),
            ..Self::default()
        }
    }
}

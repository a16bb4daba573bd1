use uuid::Uuid;

use crate::core::order;
use crate::core::task::{Category, CategoryFilter, InboxTab, NewTask, Task, TaskPatch};
use crate::store::{StoreError, TaskStore};

/// Outcome of the most recent full fetch, shown banner-style by the UI.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum FetchStatus {
    Loading,
    Ready,
    Failed(String),
}

impl Default for FetchStatus {
    fn default() -> Self {
        Self::Loading
    }
}

/// The ordered task list plus the two tab contexts over it.
///
/// Local state is a cache of the store: mutations write through and then
/// re-fetch. Reorder is the one optimistic exception, see [`Self::reorder`].
pub struct TaskBoard<S> {
    store: S,
    tasks: Vec<Task>,
    fetch: FetchStatus,
    inbox_tab: InboxTab,
    today_tab: CategoryFilter,
}

impl<S: TaskStore> TaskBoard<S> {
    pub fn new(store: S) -> Self {
        Self {
            store,
            tasks: Vec::new(),
            fetch: FetchStatus::Loading,
            inbox_tab: InboxTab::default(),
            today_tab: CategoryFilter::default(),
        }
    }

    pub fn store(&self) -> &S {
        &self.store
    }

    pub fn fetch_status(&self) -> &FetchStatus {
        &self.fetch
    }

    /// All tasks, ascending by order key.
    pub fn tasks(&self) -> &[Task] {
        &self.tasks
    }

    pub fn visible(&self, filter: CategoryFilter) -> Vec<Task> {
        order::filter_tasks(&self.tasks, filter)
    }

    pub fn inbox_tab(&self) -> InboxTab {
        self.inbox_tab
    }

    pub fn set_inbox_tab(&mut self, tab: InboxTab) {
        self.inbox_tab = tab;
    }

    pub fn inbox_tasks(&self) -> Vec<Task> {
        self.visible(self.inbox_tab.into())
    }

    pub fn today_tab(&self) -> CategoryFilter {
        self.today_tab
    }

    pub fn set_today_tab(&mut self, tab: CategoryFilter) {
        self.today_tab = tab;
    }

    pub fn today_tasks(&self) -> Vec<Task> {
        self.visible(self.today_tab)
    }

    /// Replace local state with the store's rows. On failure the previous
    /// list stays and the status carries the message.
    pub async fn reload(&mut self) {
        match self.store.select_all().await {
            Ok(rows) => {
                let mut tasks: Vec<Task> = rows.into_iter().map(|r| r.into_task()).collect();
                order::sort_by_order(&mut tasks);
                self.tasks = tasks;
                self.fetch = FetchStatus::Ready;
            }
            Err(e) => {
                log::error!("Failed to fetch tasks: {}", e);
                self.fetch = FetchStatus::Failed(e.to_string());
            }
        }
    }

    /// Add a task at the end of the shared order. Titles are trimmed; an
    /// empty result drops the request without calling the store.
    pub async fn add(&mut self, title: &str, category: Category) -> Result<(), StoreError> {
        let title = title.trim();
        if title.is_empty() {
            return Ok(());
        }

        let task = NewTask::new(title, category, order::next_order_index(&self.tasks));
        if let Err(e) = self.store.insert(&task).await {
            log::error!("Failed to add task: {}", e);
            return Err(e);
        }
        self.reload().await;
        Ok(())
    }

    /// Add under the inbox's current tab.
    pub async fn add_to_inbox(&mut self, title: &str) -> Result<(), StoreError> {
        self.add(title, self.inbox_tab.category()).await
    }

    /// Add under the today view's current tab; the All tab adds as Work.
    pub async fn add_to_today(&mut self, title: &str) -> Result<(), StoreError> {
        self.add(title, self.today_tab.add_category()).await
    }

    /// Flip completion for `id`. Unknown ids are ignored.
    pub async fn toggle(&mut self, id: Uuid) -> Result<(), StoreError> {
        let Some(task) = self.tasks.iter().find(|t| t.id == id) else {
            return Ok(());
        };
        let patch = TaskPatch::done(!task.done);
        if let Err(e) = self.store.update(id, &patch).await {
            log::error!("Failed to toggle task: {}", e);
            return Err(e);
        }
        self.reload().await;
        Ok(())
    }

    /// Delete `id` from the store; deleting an absent id is fine.
    pub async fn remove(&mut self, id: Uuid) -> Result<(), StoreError> {
        if let Err(e) = self.store.delete(id).await {
            log::error!("Failed to remove task: {}", e);
            return Err(e);
        }
        self.reload().await;
        Ok(())
    }

    /// Move a task from `from` to `to` within the view under `filter`, then
    /// persist every changed order key.
    ///
    /// Local state updates first and stays even when writes fail; the whole
    /// batch is attempted either way and the next reload reconciles. Returns
    /// how many writes failed. Out-of-range positions and `from == to` are
    /// no-ops.
    pub async fn reorder(&mut self, filter: CategoryFilter, from: usize, to: usize) -> usize {
        let Some(next) = order::move_in_filtered(&self.tasks, filter, from, to) else {
            return 0;
        };
        let changes = order::order_changes(&self.tasks, &next);
        self.tasks = next;

        let store = &self.store;
        let results = futures::future::join_all(changes.iter().map(|&(id, key)| {
            let patch = TaskPatch::order(key);
            async move { (id, store.update(id, &patch).await) }
        }))
        .await;

        let mut failed = 0;
        for (id, result) in results {
            if let Err(e) = result {
                log::warn!("Failed to persist order for {}: {}", id, e);
                failed += 1;
            }
        }
        if failed > 0 {
            log::warn!(
                "{} of {} order writes failed, keeping local order until next reload",
                failed,
                changes.len()
            );
        }
        failed
    }
}

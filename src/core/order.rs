use std::collections::HashMap;

use uuid::Uuid;

use super::task::{CategoryFilter, Task};

/// Gap left between appended tasks so a single insert never renumbers the
/// whole list.
pub const ORDER_STEP: i64 = 100;

/// Stable ascending sort on the shared order key; ties keep arrival order.
pub fn sort_by_order(tasks: &mut [Task]) {
    tasks.sort_by_key(|t| t.order_index);
}

/// Order-preserving subsequence of `tasks` visible under `filter`.
pub fn filter_tasks(tasks: &[Task], filter: CategoryFilter) -> Vec<Task> {
    tasks
        .iter()
        .filter(|t| filter.matches(t.category))
        .cloned()
        .collect()
}

/// Order key for a task appended at the end, across both categories.
/// Saturates at the top of the key space.
pub fn next_order_index(tasks: &[Task]) -> i64 {
    tasks
        .iter()
        .map(|t| t.order_index)
        .max()
        .map_or(0, |max| max.saturating_add(ORDER_STEP))
}

/// Move one task within the subsequence visible under `filter`, then splice
/// the result back into the full list.
///
/// The reordered members land in the slots members occupied before, so tasks
/// outside the filter keep both their positions and their relative order.
/// The returned list is renumbered 0, 1, 2, … front to back.
///
/// Returns None when `from == to` or either position falls outside the
/// filtered view; callers treat that as a no-op.
pub fn move_in_filtered(
    tasks: &[Task],
    filter: CategoryFilter,
    from: usize,
    to: usize,
) -> Option<Vec<Task>> {
    if from == to {
        return None;
    }
    let mut view = filter_tasks(tasks, filter);
    if from >= view.len() || to >= view.len() {
        return None;
    }
    let moved = view.remove(from);
    view.insert(to, moved);

    let mut slots = view.into_iter();
    let mut next: Vec<Task> = Vec::with_capacity(tasks.len());
    for task in tasks {
        if filter.matches(task.category) {
            if let Some(member) = slots.next() {
                next.push(member);
            }
        } else {
            next.push(task.clone());
        }
    }

    for (position, task) in next.iter_mut().enumerate() {
        task.order_index = position as i64;
    }
    Some(next)
}

/// Ids whose order key differs between the two lists, with the new key.
pub fn order_changes(before: &[Task], after: &[Task]) -> Vec<(Uuid, i64)> {
    let old: HashMap<Uuid, i64> = before.iter().map(|t| (t.id, t.order_index)).collect();
    after
        .iter()
        .filter(|t| old.get(&t.id) != Some(&t.order_index))
        .map(|t| (t.id, t.order_index))
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::task::Category;

    fn task(title: &str, category: Category, order_index: i64) -> Task {
        let mut t = Task::new(title, category);
        t.order_index = order_index;
        t
    }

    fn titles(tasks: &[Task]) -> Vec<&str> {
        tasks.iter().map(|t| t.title.as_str()).collect()
    }

    #[test]
    fn sort_is_stable_on_ties() {
        let mut tasks = vec![
            task("first", Category::Work, 5),
            task("second", Category::Life, 5),
            task("earlier", Category::Work, 1),
        ];
        sort_by_order(&mut tasks);
        assert_eq!(titles(&tasks), vec!["earlier", "first", "second"]);
    }

    #[test]
    fn filter_preserves_order() {
        let tasks = vec![
            task("a", Category::Work, 0),
            task("b", Category::Life, 1),
            task("c", Category::Work, 2),
        ];
        let work = filter_tasks(&tasks, CategoryFilter::Work);
        assert_eq!(titles(&work), vec!["a", "c"]);
        let life = filter_tasks(&tasks, CategoryFilter::Life);
        assert_eq!(titles(&life), vec!["b"]);
        let all = filter_tasks(&tasks, CategoryFilter::All);
        assert_eq!(titles(&all), vec!["a", "b", "c"]);
    }

    #[test]
    fn work_and_life_partition_all() {
        let tasks = vec![
            task("a", Category::Work, 0),
            task("b", Category::Life, 1),
            task("c", Category::Work, 2),
            task("d", Category::Life, 3),
        ];
        let work = filter_tasks(&tasks, CategoryFilter::Work);
        let life = filter_tasks(&tasks, CategoryFilter::Life);
        let mut union: Vec<Uuid> = work.iter().chain(life.iter()).map(|t| t.id).collect();
        union.sort();
        let mut all: Vec<Uuid> = filter_tasks(&tasks, CategoryFilter::All)
            .iter()
            .map(|t| t.id)
            .collect();
        all.sort();
        assert_eq!(union, all);
    }

    #[test]
    fn append_key_for_empty_list_is_zero() {
        assert_eq!(next_order_index(&[]), 0);
    }

    #[test]
    fn append_key_steps_past_the_max() {
        let tasks = vec![
            task("x", Category::Work, 0),
            task("y", Category::Life, 100),
        ];
        assert_eq!(next_order_index(&tasks), 200);
    }

    #[test]
    fn append_key_ignores_category() {
        let tasks = vec![task("only life", Category::Life, 700)];
        assert_eq!(next_order_index(&tasks), 800);
    }

    #[test]
    fn append_key_saturates_at_the_numeric_ceiling() {
        let tasks = vec![task("ceiling", Category::Work, i64::MAX)];
        assert_eq!(next_order_index(&tasks), i64::MAX);

        let tasks = vec![task("near ceiling", Category::Life, i64::MAX - 40)];
        assert_eq!(next_order_index(&tasks), i64::MAX);
    }

    #[test]
    fn move_within_work_leaves_life_slots_alone() {
        let tasks = vec![
            task("a", Category::Work, 0),
            task("b", Category::Life, 1),
            task("c", Category::Work, 2),
            task("d", Category::Life, 3),
        ];
        // Work view is [a, c]; move c before a.
        let moved = move_in_filtered(&tasks, CategoryFilter::Work, 1, 0).unwrap();
        assert_eq!(titles(&moved), vec!["c", "b", "a", "d"]);
        let keys: Vec<i64> = moved.iter().map(|t| t.order_index).collect();
        assert_eq!(keys, vec![0, 1, 2, 3]);
    }

    #[test]
    fn move_within_life_view() {
        let tasks = vec![
            task("a", Category::Work, 0),
            task("b", Category::Life, 10),
            task("c", Category::Life, 20),
            task("d", Category::Work, 30),
            task("e", Category::Life, 40),
        ];
        // Life view is [b, c, e]; move e to the front.
        let moved = move_in_filtered(&tasks, CategoryFilter::Life, 2, 0).unwrap();
        assert_eq!(titles(&moved), vec!["a", "e", "b", "d", "c"]);
        // Work members stay in slots 0 and 3.
        assert_eq!(moved[0].title, "a");
        assert_eq!(moved[3].title, "d");
    }

    #[test]
    fn move_renumbers_densely_from_gappy_keys() {
        let tasks = vec![
            task("a", Category::Work, 0),
            task("b", Category::Work, 100),
            task("c", Category::Work, 200),
        ];
        let moved = move_in_filtered(&tasks, CategoryFilter::All, 2, 0).unwrap();
        assert_eq!(titles(&moved), vec!["c", "a", "b"]);
        let keys: Vec<i64> = moved.iter().map(|t| t.order_index).collect();
        assert_eq!(keys, vec![0, 1, 2]);
    }

    #[test]
    fn move_to_same_position_is_none() {
        let tasks = vec![task("a", Category::Work, 0), task("b", Category::Work, 1)];
        assert!(move_in_filtered(&tasks, CategoryFilter::All, 1, 1).is_none());
    }

    #[test]
    fn move_out_of_bounds_is_none() {
        let tasks = vec![task("a", Category::Work, 0), task("b", Category::Life, 1)];
        // The work view holds a single element.
        assert!(move_in_filtered(&tasks, CategoryFilter::Work, 0, 1).is_none());
        assert!(move_in_filtered(&tasks, CategoryFilter::Work, 1, 0).is_none());
        assert!(move_in_filtered(&tasks, CategoryFilter::All, 5, 0).is_none());
    }

    #[test]
    fn order_changes_lists_only_shifted_rows() {
        let before = vec![
            task("a", Category::Work, 0),
            task("b", Category::Life, 1),
            task("c", Category::Work, 2),
            task("d", Category::Life, 3),
        ];
        let after = move_in_filtered(&before, CategoryFilter::Work, 1, 0).unwrap();
        let changes = order_changes(&before, &after);
        // a and c swapped keys; b and d kept theirs.
        assert_eq!(changes.len(), 2);
        assert!(changes.contains(&(before[0].id, 2)));
        assert!(changes.contains(&(before[2].id, 0)));
    }

    #[test]
    fn order_changes_empty_when_nothing_moved() {
        let tasks = vec![
            task("a", Category::Work, 0),
            task("b", Category::Life, 1),
        ];
        assert!(order_changes(&tasks, &tasks).is_empty());
    }
}

use chrono::NaiveDate;
use strum::{AsRefStr, Display, EnumIter, EnumString};

use crate::models::{Task, TaskPatch};
use crate::routes;

/// Cross-list task views reachable from the sidebar.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, AsRefStr, Display, EnumIter, EnumString)]
#[strum(serialize_all = "lowercase")]
pub enum TaskView {
    Today,
    Priority,
    Completed,
    #[strum(serialize = "notcomplete")]
    NotComplete,
}

impl TaskView {
    pub fn path(self) -> &'static str {
        match self {
            Self::Today => routes::TODAY,
            Self::Priority => routes::PRIORITY,
            Self::Completed => routes::COMPLETED,
            Self::NotComplete => routes::NOT_COMPLETE,
        }
    }

    pub fn title(self) -> &'static str {
        match self {
            Self::Today => "Today",
            Self::Priority => "Priority",
            Self::Completed => "Completed",
            Self::NotComplete => "Not completed",
        }
    }

    pub fn empty_message(self) -> &'static str {
        match self {
            Self::Today => "Nothing due today.",
            Self::Priority => "No open priority tasks.",
            Self::Completed => "No completed tasks yet.",
            Self::NotComplete => "Everything is done.",
        }
    }

    pub fn matches(self, task: &Task, today: NaiveDate) -> bool {
        if task.is_deleted {
            return false;
        }
        match self {
            Self::Today => task.due_on() == Some(today),
            Self::Priority => task.is_priority && !task.is_completed,
            Self::Completed => task.is_completed,
            Self::NotComplete => !task.is_completed,
        }
    }
}

pub fn filter_tasks(tasks: &[Task], view: TaskView, today: NaiveDate) -> Vec<Task> {
    let mut out: Vec<Task> = tasks
        .iter()
        .filter(|t| view.matches(t, today))
        .cloned()
        .collect();
    sort_tasks(&mut out);
    out
}

/// Open tasks first, priority before the rest, then oldest first.
pub fn sort_tasks(tasks: &mut [Task]) {
    tasks.sort_by(|a, b| {
        a.is_completed
            .cmp(&b.is_completed)
            .then(b.is_priority.cmp(&a.is_priority))
            .then_with(|| a.created_at.cmp(&b.created_at))
    });
}

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum TaskToggle {
    Completed,
    Priority,
}

impl TaskToggle {
    pub fn value(self, task: &Task) -> bool {
        match self {
            Self::Completed => task.is_completed,
            Self::Priority => task.is_priority,
        }
    }

    /// Flip the flag on `task`, stamping `completed_at` for completion.
    pub fn apply(self, task: &mut Task, now_rfc3339: &str) {
        match self {
            Self::Completed => {
                task.is_completed = !task.is_completed;
                task.completed_at = task.is_completed.then(|| now_rfc3339.to_string());
            }
            Self::Priority => task.is_priority = !task.is_priority,
        }
    }

    /// Patch that persists the state of `task` after [`TaskToggle::apply`].
    pub fn patch(self, task: &Task) -> TaskPatch {
        match self {
            Self::Completed => TaskPatch {
                is_completed: Some(task.is_completed),
                completed_at: Some(task.completed_at.clone()),
                ..Default::default()
            },
            Self::Priority => TaskPatch {
                is_priority: Some(task.is_priority),
                ..Default::default()
            },
        }
    }
}

/// Flip a flag on the task with `id`, returning the record as it was before.
pub fn toggle_in_place(
    tasks: &mut [Task],
    id: &str,
    toggle: TaskToggle,
    now_rfc3339: &str,
) -> Option<Task> {
    let task = tasks.iter_mut().find(|t| t.id == id)?;
    let before = task.clone();
    toggle.apply(task, now_rfc3339);
    Some(before)
}

/// Put a task snapshot back, leaving other rows alone.
pub fn restore(tasks: &mut [Task], snapshot: &Task) {
    if let Some(task) = tasks.iter_mut().find(|t| t.id == snapshot.id) {
        *task = snapshot.clone();
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use strum::IntoEnumIterator;

    fn task(id: &str) -> Task {
        Task {
            id: id.to_string(),
            text: format!("task {id}"),
            description: None,
            created_at: format!("2024-01-0{id}T00:00:00Z"),
            due_date: None,
            completed_at: None,
            is_completed: false,
            is_priority: false,
            is_deleted: false,
            collection_id: "c1".to_string(),
            list_id: Some("l1".to_string()),
            user_id: Some("u1".to_string()),
        }
    }

    fn today() -> NaiveDate {
        NaiveDate::from_ymd_opt(2024, 5, 1).unwrap()
    }

    #[test]
    fn today_view_matches_due_date_only() {
        let mut due = task("1");
        due.due_date = Some("2024-05-01".into());
        let mut later = task("2");
        later.due_date = Some("2024-05-02".into());
        let mut deleted = task("3");
        deleted.due_date = Some("2024-05-01".into());
        deleted.is_deleted = true;

        let out = filter_tasks(&[due, later, deleted], TaskView::Today, today());
        assert_eq!(out.len(), 1);
        assert_eq!(out[0].id, "1");
    }

    #[test]
    fn priority_view_excludes_completed() {
        let mut open = task("1");
        open.is_priority = true;
        let mut done = task("2");
        done.is_priority = true;
        done.is_completed = true;
        let out = filter_tasks(&[open, done], TaskView::Priority, today());
        assert_eq!(out.iter().map(|t| t.id.as_str()).collect::<Vec<_>>(), ["1"]);
    }

    #[test]
    fn completed_and_not_complete_partition_tasks() {
        let mut done = task("1");
        done.is_completed = true;
        let open = task("2");
        let all = [done, open];
        assert_eq!(filter_tasks(&all, TaskView::Completed, today())[0].id, "1");
        assert_eq!(filter_tasks(&all, TaskView::NotComplete, today())[0].id, "2");
    }

    #[test]
    fn sort_puts_open_priority_first() {
        let mut a = task("1");
        a.is_completed = true;
        let b = task("2");
        let mut c = task("3");
        c.is_priority = true;
        let mut all = vec![a, b, c];
        sort_tasks(&mut all);
        assert_eq!(
            all.iter().map(|t| t.id.as_str()).collect::<Vec<_>>(),
            ["3", "2", "1"]
        );
    }

    #[test]
    fn completion_toggle_stamps_and_clears_completed_at() {
        let mut tasks = vec![task("1")];
        let before = toggle_in_place(&mut tasks, "1", TaskToggle::Completed, "NOW").unwrap();
        assert!(!before.is_completed);
        assert!(tasks[0].is_completed);
        assert_eq!(tasks[0].completed_at.as_deref(), Some("NOW"));
        assert_eq!(
            TaskToggle::Completed.patch(&tasks[0]).completed_at,
            Some(Some("NOW".to_string()))
        );

        toggle_in_place(&mut tasks, "1", TaskToggle::Completed, "LATER");
        assert!(!tasks[0].is_completed);
        assert_eq!(tasks[0].completed_at, None);
    }

    #[test]
    fn restore_reverts_only_the_snapshot_row() {
        let mut tasks = vec![task("1"), task("2")];
        let before = toggle_in_place(&mut tasks, "1", TaskToggle::Priority, "NOW").unwrap();
        toggle_in_place(&mut tasks, "2", TaskToggle::Priority, "NOW");
        restore(&mut tasks, &before);
        assert!(!tasks[0].is_priority);
        assert!(tasks[1].is_priority);
    }

    #[test]
    fn unknown_id_is_not_toggled() {
        let mut tasks = vec![task("1")];
        assert!(toggle_in_place(&mut tasks, "nope", TaskToggle::Priority, "NOW").is_none());
    }

    #[test]
    fn views_round_trip_through_paths() {
        for view in TaskView::iter() {
            let slug = view.path().trim_start_matches('/');
            assert_eq!(slug.parse::<TaskView>().unwrap(), view);
        }
    }
}

use leptos::logging::warn;
use leptos::prelude::*;
use leptos::task::spawn_local;
use listit_core::models::{NewTask, Task, TaskPatch};
use listit_core::mutation::{optimistic, MutationResult};
use listit_core::tasks::{restore, sort_tasks, toggle_in_place, TaskToggle};
use listit_core::validation::validate_name;

use super::InFlight;
use crate::api::ApiClient;
use crate::util::now_rfc3339;

/// Tasks on screen plus the bookkeeping for in-flight writes.
#[derive(Clone, Copy)]
pub(crate) struct TaskStore {
    pub tasks: RwSignal<Vec<Task>>,
    /// Ids with a write in flight; further clicks on them are ignored.
    pub updating: InFlight,
    pub error: RwSignal<Option<String>>,
}

impl TaskStore {
    pub fn new() -> Self {
        Self {
            tasks: RwSignal::new(vec![]),
            updating: InFlight::new(),
            error: RwSignal::new(None),
        }
    }

    pub fn set_all(self, mut tasks: Vec<Task>) {
        sort_tasks(&mut tasks);
        self.tasks.set(tasks);
    }

    pub fn is_updating(self, id: &str) -> bool {
        self.updating.contains(id)
    }

    fn begin(self, id: &str) -> bool {
        self.updating.begin(id)
    }

    fn finish(self, id: &str) {
        self.updating.finish(id);
    }

    fn replace(self, task: Task) {
        self.tasks.update(|ts| {
            if let Some(existing) = ts.iter_mut().find(|t| t.id == task.id) {
                *existing = task;
            }
            sort_tasks(ts);
        });
    }

    pub fn create(self, client: ApiClient, row: NewTask) {
        let text = match validate_name("Task", &row.text) {
            Ok(text) => text,
            Err(e) => {
                self.error.set(Some(e.to_string()));
                return;
            }
        };
        let row = NewTask { text, ..row };
        self.error.set(None);
        spawn_local(async move {
            match client.create_task(&row).await {
                Ok(task) => self.tasks.update(|ts| {
                    ts.push(task);
                    sort_tasks(ts);
                }),
                Err(e) => {
                    warn!("Failed to create task: {e}");
                    self.error.set(Some(e.message));
                }
            }
        });
    }

    /// Flip completion or priority immediately; the row snaps back if the
    /// backend refuses.
    pub fn toggle(self, client: ApiClient, id: String, toggle: TaskToggle) {
        if !self.begin(&id) {
            return;
        }
        self.error.set(None);

        spawn_local(async move {
            let now = now_rfc3339();
            let remote_id = id.clone();
            let outcome = optimistic(
                || {
                    let mut snapshot = None;
                    self.tasks
                        .update(|ts| snapshot = toggle_in_place(ts, &id, toggle, &now));
                    snapshot
                },
                || {
                    let patch = self
                        .tasks
                        .with_untracked(|ts| {
                            ts.iter().find(|t| t.id == remote_id).map(|t| toggle.patch(t))
                        })
                        .unwrap_or_default();
                    async move { client.update_task(&remote_id, &patch).await }
                },
                |snapshot: Task| self.tasks.update(|ts| restore(ts, &snapshot)),
            )
            .await;

            match outcome {
                Some(MutationResult::Committed(saved)) => self.replace(saved),
                Some(MutationResult::RolledBack(e)) => {
                    warn!("Task {toggle:?} toggle rolled back: {e}");
                    self.error.set(Some(e.message));
                }
                None => {}
            }
            self.finish(&id);
        });
    }

    pub fn edit_text(self, client: ApiClient, id: String, text: String) {
        let text = match validate_name("Task", &text) {
            Ok(text) => text,
            Err(e) => {
                self.error.set(Some(e.to_string()));
                return;
            }
        };
        if !self.begin(&id) {
            return;
        }
        spawn_local(async move {
            let patch = TaskPatch {
                text: Some(text),
                ..Default::default()
            };
            match client.update_task(&id, &patch).await {
                Ok(saved) => self.replace(saved),
                Err(e) => {
                    warn!("Failed to rename task {id}: {e}");
                    self.error.set(Some(e.message));
                }
            }
            self.finish(&id);
        });
    }

    /// Removed from view at once, put back at the same position on failure.
    pub fn delete(self, client: ApiClient, id: String) {
        if !self.begin(&id) {
            return;
        }
        spawn_local(async move {
            let remote_id = id.clone();
            let outcome = optimistic(
                || {
                    let mut removed = None;
                    self.tasks.update(|ts| {
                        if let Some(pos) = ts.iter().position(|t| t.id == id) {
                            removed = Some((pos, ts.remove(pos)));
                        }
                    });
                    removed
                },
                || async move { client.delete_task(&remote_id).await },
                |(pos, task): (usize, Task)| {
                    self.tasks.update(|ts| ts.insert(pos.min(ts.len()), task));
                },
            )
            .await;

            if let Some(MutationResult::RolledBack(e)) = outcome {
                warn!("Task delete rolled back: {e}");
                self.error.set(Some(e.message));
            }
            self.finish(&id);
        });
    }
}

impl Default for TaskStore {
    fn default() -> Self {
        Self::new()
    }
}

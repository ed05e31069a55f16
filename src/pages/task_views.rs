use leptos::logging::warn;
use leptos::prelude::*;
use leptos::task::spawn_local;
use listit_core::models::{List, Task};
use listit_core::tasks::{filter_tasks, TaskToggle, TaskView};

use crate::components::task_item::TaskItem;
use crate::components::ui::{FormError, Spinner};
use crate::state::{AppContext, AuthService, TaskStore};
use crate::util::today_local;

fn list_name(lists: &[List], list_id: Option<&str>) -> Option<String> {
    let id = list_id?;
    lists.iter().find(|l| l.id == id).map(|l| l.name.clone())
}

/// Tasks from every list that match one of the fixed views.
#[component]
pub fn TaskViewPage(task_view: TaskView) -> impl IntoView {
    let app_state = expect_context::<AppContext>();
    let auth = expect_context::<AuthService>();

    let store = TaskStore::new();
    let loading: RwSignal<bool> = RwSignal::new(true);
    let today = today_local();

    Effect::new(move |_| {
        // Reload when the signed-in user changes.
        let Some(user_id) = auth.user.with(|u| u.as_ref().map(|u| u.id.clone())) else {
            return;
        };
        let client = app_state.0.api_client.get_untracked();
        loading.set(true);
        spawn_local(async move {
            match client.get_user_tasks(&user_id).await {
                Ok(tasks) => store.set_all(tasks),
                Err(e) => {
                    warn!("Failed to load tasks for {}: {e}", task_view.path());
                    store.error.set(Some(e.message));
                }
            }
            loading.set(false);
        });
    });

    let visible = move || store.tasks.with(|ts| filter_tasks(ts, task_view, today));

    let row = move |task: Task| {
        let id = task.id.clone();
        let context = app_state
            .0
            .lists
            .with_untracked(|ls| list_name(ls, task.list_id.as_deref()));
        let busy = {
            let id = id.clone();
            Signal::derive(move || store.is_updating(&id))
        };
        let (toggle_id, edit_id, delete_id) = (id.clone(), id.clone(), id);
        let client = move || app_state.0.api_client.get_untracked();
        view! {
            <TaskItem
                task=task
                today=today
                busy=busy
                context=context
                on_toggle=Callback::new(move |toggle: TaskToggle| store.toggle(client(), toggle_id.clone(), toggle))
                on_edit=Callback::new(move |text: String| store.edit_text(client(), edit_id.clone(), text))
                on_delete=Callback::new(move |_| store.delete(client(), delete_id.clone()))
            />
        }
    };

    view! {
        <div class="mx-auto w-full max-w-3xl space-y-4">
            <h1 class="text-xl font-semibold">{task_view.title()}</h1>

            <FormError error=store.error />

            <Show
                when=move || !(loading.get() && store.tasks.with(Vec::is_empty))
                fallback=|| view! {
                    <div class="flex items-center gap-2 text-sm text-muted-foreground">
                        <Spinner />
                        "Loading tasks..."
                    </div>
                }
            >
                <Show
                    when=move || !visible().is_empty()
                    fallback=move || view! {
                        <div class="py-10 text-center text-sm text-muted-foreground">{task_view.empty_message()}</div>
                    }
                >
                    <div class="space-y-0.5 rounded-lg border border-border p-2">
                        <For
                            each=visible
                            key=|t| (t.id.clone(), t.text.clone(), t.is_completed, t.is_priority, t.due_date.clone())
                            children=row
                        />
                    </div>
                </Show>
            </Show>
        </div>
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn context_label_names_the_owning_list() {
        let lists = vec![List {
            id: "l1".to_string(),
            name: "Groceries".to_string(),
            bg_color: String::new(),
            created_at: String::new(),
            is_default: true,
            is_pinned: false,
            user_id: "u1".to_string(),
        }];
        assert_eq!(list_name(&lists, Some("l1")), Some("Groceries".to_string()));
        assert_eq!(list_name(&lists, Some("gone")), None);
        assert_eq!(list_name(&lists, None), None);
    }
}

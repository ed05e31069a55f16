use icons::Plus;
use leptos::logging::warn;
use leptos::prelude::*;
use leptos::task::spawn_local;
use listit_core::models::{List, ListPatch};
use listit_core::mutation::{optimistic, MutationResult};

use crate::components::list_card::ListCard;
use crate::components::ui::{FormError, Spinner};
use crate::state::{AppContext, AuthService, InFlight, ListUiActions};

/// Pinned first, then oldest first.
fn dashboard_order(mut lists: Vec<List>) -> Vec<List> {
    lists.sort_by(|a, b| {
        b.is_pinned
            .cmp(&a.is_pinned)
            .then_with(|| a.created_at.cmp(&b.created_at))
    });
    lists
}

fn greeting(name: Option<String>) -> String {
    match name {
        Some(name) if !name.trim().is_empty() => format!("Welcome back, {}", name.trim()),
        _ => "Welcome back".to_string(),
    }
}

#[component]
pub fn DashboardPage() -> impl IntoView {
    let app_state = expect_context::<AppContext>();
    let auth = expect_context::<AuthService>();
    let actions = expect_context::<ListUiActions>();

    let lists = app_state.0.lists;
    let pin_error: RwSignal<Option<String>> = RwSignal::new(None);
    let pinning = InFlight::new();

    let toggle_pin = Callback::new(move |list: List| {
        if !pinning.begin(&list.id) {
            return;
        }
        let client = app_state.0.api_client.get_untracked();
        pin_error.set(None);
        spawn_local(async move {
            let pinned = !list.is_pinned;
            let id = list.id.clone();
            let outcome = optimistic(
                || {
                    let mut before = None;
                    lists.update(|ls| {
                        if let Some(l) = ls.iter_mut().find(|l| l.id == id) {
                            before = Some(l.clone());
                            l.is_pinned = pinned;
                        }
                    });
                    before
                },
                || {
                    let patch = ListPatch {
                        is_pinned: Some(pinned),
                        ..Default::default()
                    };
                    let id = list.id.clone();
                    async move { client.update_list(&id, &patch).await }
                },
                |before: List| app_state.0.upsert_list(before),
            )
            .await;

            match outcome {
                Some(MutationResult::Committed(saved)) => app_state.0.upsert_list(saved),
                Some(MutationResult::RolledBack(e)) => {
                    warn!("Pin toggle rolled back: {e}");
                    pin_error.set(Some(e.message));
                }
                None => {}
            }
            pinning.finish(&list.id);
        });
    });

    let user_name = move || {
        auth.user
            .get()
            .and_then(|u| u.display_name.or(u.email))
    };

    view! {
        <div class="mx-auto w-full max-w-5xl space-y-6">
            <div class="space-y-1">
                <h1 class="text-xl font-semibold">{move || greeting(user_name())}</h1>
                <p class="text-sm text-muted-foreground">"Pick a list or start a new one."</p>
            </div>

            <FormError error=pin_error />
            <FormError error=app_state.0.lists_error />

            <Show
                when=move || !(app_state.0.lists_loading.get() && lists.with(Vec::is_empty))
                fallback=|| view! {
                    <div class="flex items-center gap-2 text-sm text-muted-foreground">
                        <Spinner />
                        "Loading lists..."
                    </div>
                }
            >
                <div class="grid gap-4 sm:grid-cols-2 lg:grid-cols-3">
                    <For
                        each=move || dashboard_order(lists.get())
                        key=|l| (l.id.clone(), l.name.clone(), l.bg_color.clone(), l.is_pinned, l.is_default)
                        children=move |list| view! {
                            <ListCard list=list on_edit=actions.open_edit on_toggle_pin=toggle_pin />
                        }
                    />
                    <button
                        type="button"
                        class="flex h-28 flex-col items-center justify-center gap-1 rounded-lg border border-dashed border-border text-sm text-muted-foreground hover:border-primary hover:text-foreground"
                        on:click=move |_| actions.open_create.run(())
                    >
                        <Plus class="size-5" />
                        "New list"
                    </button>
                </div>
            </Show>
        </div>
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn list(id: &str, created_at: &str, pinned: bool) -> List {
        List {
            id: id.to_string(),
            name: id.to_string(),
            bg_color: String::new(),
            created_at: created_at.to_string(),
            is_default: false,
            is_pinned: pinned,
            user_id: "u1".to_string(),
        }
    }

    #[test]
    fn pinned_lists_lead_then_creation_order() {
        let ordered = dashboard_order(vec![
            list("b", "2024-02-01", false),
            list("a", "2024-01-01", false),
            list("c", "2024-03-01", true),
        ]);
        let ids: Vec<_> = ordered.iter().map(|l| l.id.as_str()).collect();
        assert_eq!(ids, vec!["c", "a", "b"]);
    }

    #[test]
    fn greeting_uses_name_when_present() {
        assert_eq!(greeting(Some(" Ada ".to_string())), "Welcome back, Ada");
        assert_eq!(greeting(Some(String::new())), "Welcome back");
        assert_eq!(greeting(None), "Welcome back");
    }
}

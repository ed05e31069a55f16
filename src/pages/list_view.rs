use icons::{Pencil, Plus};
use leptos::logging::warn;
use leptos::prelude::*;
use leptos::task::spawn_local;
use leptos_router::hooks::use_params_map;
use listit_core::collections::{mark_default, sort_collections};
use listit_core::models::{Collection, List, NewTask, Note, NotePatch, Task};
use listit_core::mutation::{optimistic, MutationResult};
use listit_core::routes::DASHBOARD;
use listit_core::tasks::TaskToggle;

use crate::api::{ApiClient, ApiResult};
use crate::components::collection_panel::CollectionPanel;
use crate::components::ui::{Button, ButtonSize, ButtonVariant, FormError, Spinner};
use crate::popups::{CollectionPopup, DeleteCollectionPopup, NotePopup};
use crate::state::{
    AppContext, AuthService, BoardActions, InFlight, ListUiActions, TaskStore,
};
use crate::util::today_local;

/// Everything shown on one list page.
struct Board {
    list: List,
    collections: Vec<Collection>,
    tasks: Vec<Task>,
    notes: Vec<Note>,
}

async fn load_board(client: &ApiClient, list_id: &str) -> ApiResult<Option<Board>> {
    let Some(list) = client.get_list(list_id).await? else {
        return Ok(None);
    };
    let mut collections = client.get_collections(list_id).await?;
    sort_collections(&mut collections);

    let ids: Vec<String> = collections.iter().map(|c| c.id.clone()).collect();
    let tasks = client.get_tasks_in(&ids).await?;
    let mut notes = client.get_notes_in(&ids).await?;
    sort_notes(&mut notes);

    Ok(Some(Board {
        list,
        collections,
        tasks,
        notes,
    }))
}

/// Pinned notes first, then creation order.
fn sort_notes(notes: &mut [Note]) {
    notes.sort_by(|a, b| {
        b.is_pinned
            .cmp(&a.is_pinned)
            .then_with(|| a.created_at.cmp(&b.created_at))
    });
}

fn upsert_collection(collections: &mut Vec<Collection>, saved: Collection) {
    if saved.is_default {
        mark_default(collections, &saved.list_id, &saved.id);
    }
    match collections.iter_mut().find(|c| c.id == saved.id) {
        Some(existing) => *existing = saved,
        None => collections.push(saved),
    }
    sort_collections(collections);
}

fn upsert_note(notes: &mut Vec<Note>, saved: Note) {
    match notes.iter_mut().find(|n| n.id == saved.id) {
        Some(existing) => *existing = saved,
        None => notes.push(saved),
    }
    sort_notes(notes);
}

#[component]
pub fn ListViewPage() -> impl IntoView {
    let app_state = expect_context::<AppContext>();
    let auth = expect_context::<AuthService>();
    let list_actions = expect_context::<ListUiActions>();
    let params = use_params_map();

    // Use closures so params access happens inside a reactive tracking context.
    let list_id = move || params.with(|p| p.get("id")).unwrap_or_default();

    let fetched_list: RwSignal<Option<List>> = RwSignal::new(None);
    let collections: RwSignal<Vec<Collection>> = RwSignal::new(vec![]);
    let notes: RwSignal<Vec<Note>> = RwSignal::new(vec![]);
    let store = TaskStore::new();
    let loading: RwSignal<bool> = RwSignal::new(false);
    let load_error: RwSignal<Option<String>> = RwSignal::new(None);
    let not_found: RwSignal<bool> = RwSignal::new(false);
    let note_error: RwSignal<Option<String>> = RwSignal::new(None);
    let note_busy = InFlight::new();
    let request_id: RwSignal<u64> = RwSignal::new(0);

    let collection_open: RwSignal<bool> = RwSignal::new(false);
    let collection_editing: RwSignal<Option<Collection>> = RwSignal::new(None);
    let note_open: RwSignal<bool> = RwSignal::new(false);
    let note_collection: RwSignal<String> = RwSignal::new(String::new());
    let note_editing: RwSignal<Option<Note>> = RwSignal::new(None);
    let delete_open: RwSignal<bool> = RwSignal::new(false);
    let delete_target: RwSignal<Option<Collection>> = RwSignal::new(None);

    let today = today_local();

    Effect::new(move |_| {
        let id = list_id();
        if id.is_empty() {
            return;
        }
        let client = app_state.0.api_client.get_untracked();
        let req = request_id.get_untracked() + 1;
        request_id.set(req);
        loading.set(true);
        load_error.set(None);
        not_found.set(false);

        spawn_local(async move {
            let result = load_board(&client, &id).await;
            if request_id.get_untracked() != req {
                return;
            }
            match result {
                Ok(Some(board)) => {
                    fetched_list.set(Some(board.list));
                    collections.set(board.collections);
                    store.set_all(board.tasks);
                    notes.set(board.notes);
                }
                Ok(None) => {
                    fetched_list.set(None);
                    collections.set(vec![]);
                    store.set_all(vec![]);
                    notes.set(vec![]);
                    not_found.set(true);
                }
                Err(e) => {
                    warn!("Failed to load list {id}: {e}");
                    load_error.set(Some(e.message));
                }
            }
            loading.set(false);
        });
    });

    // The layout's list popup edits the shared copy; prefer it when present.
    let current_list = move || {
        let id = list_id();
        app_state
            .0
            .lists
            .with(|ls| ls.iter().find(|l| l.id == id).cloned())
            .or_else(|| fetched_list.get())
    };

    provide_context(BoardActions {
        add_task: Callback::new(move |(collection_id, text, due_date): (String, String, Option<String>)| {
            let Some(user_id) = auth.user_id() else {
                return;
            };
            let row = NewTask {
                text,
                description: None,
                due_date,
                is_completed: false,
                is_priority: false,
                collection_id,
                list_id: list_id(),
                user_id,
            };
            store.create(app_state.0.api_client.get_untracked(), row);
        }),
        toggle_task: Callback::new(move |(id, toggle): (String, TaskToggle)| {
            store.toggle(app_state.0.api_client.get_untracked(), id, toggle);
        }),
        edit_task: Callback::new(move |(id, text): (String, String)| {
            store.edit_text(app_state.0.api_client.get_untracked(), id, text);
        }),
        delete_task: Callback::new(move |id: String| {
            store.delete(app_state.0.api_client.get_untracked(), id);
        }),
        edit_collection: Callback::new(move |collection: Collection| {
            collection_editing.set(Some(collection));
            collection_open.set(true);
        }),
        delete_collection: Callback::new(move |collection: Collection| {
            delete_target.set(Some(collection));
            delete_open.set(true);
        }),
        new_note: Callback::new(move |collection_id: String| {
            note_collection.set(collection_id);
            note_editing.set(None);
            note_open.set(true);
        }),
        edit_note: Callback::new(move |note: Note| {
            note_collection.set(note.collection_id.clone());
            note_editing.set(Some(note));
            note_open.set(true);
        }),
        toggle_note_pin: Callback::new(move |note: Note| {
            if !note_busy.begin(&note.id) {
                return;
            }
            let client = app_state.0.api_client.get_untracked();
            note_error.set(None);
            spawn_local(async move {
                let pinned = !note.is_pinned;
                let outcome = optimistic(
                    || {
                        let mut before = None;
                        notes.update(|ns| {
                            if let Some(n) = ns.iter_mut().find(|n| n.id == note.id) {
                                before = Some(n.clone());
                                n.is_pinned = pinned;
                            }
                            sort_notes(ns);
                        });
                        before
                    },
                    || {
                        let patch = NotePatch {
                            is_pinned: Some(pinned),
                            ..Default::default()
                        };
                        let id = note.id.clone();
                        async move { client.update_note(&id, &patch).await }
                    },
                    |before: Note| notes.update(|ns| upsert_note(ns, before)),
                )
                .await;
                match outcome {
                    Some(MutationResult::Committed(saved)) => notes.update(|ns| upsert_note(ns, saved)),
                    Some(MutationResult::RolledBack(e)) => {
                        warn!("Note pin rolled back: {e}");
                        note_error.set(Some(e.message));
                    }
                    None => {}
                }
                note_busy.finish(&note.id);
            });
        }),
        delete_note: Callback::new(move |note: Note| {
            if !note_busy.begin(&note.id) {
                return;
            }
            let client = app_state.0.api_client.get_untracked();
            note_error.set(None);
            spawn_local(async move {
                let outcome = optimistic(
                    || {
                        let mut removed = None;
                        notes.update(|ns| {
                            if let Some(pos) = ns.iter().position(|n| n.id == note.id) {
                                removed = Some(ns.remove(pos));
                            }
                        });
                        removed
                    },
                    || {
                        let id = note.id.clone();
                        async move { client.delete_note(&id).await }
                    },
                    |removed: Note| notes.update(|ns| upsert_note(ns, removed)),
                )
                .await;
                if let Some(MutationResult::RolledBack(e)) = outcome {
                    warn!("Note delete rolled back: {e}");
                    note_error.set(Some(e.message));
                }
                note_busy.finish(&note.id);
            });
        }),
    });

    let on_collection_saved = Callback::new(move |saved: Collection| {
        collections.update(|cs| upsert_collection(cs, saved));
    });

    let on_collection_deleted = Callback::new(move |id: String| {
        collections.update(|cs| cs.retain(|c| c.id != id));
        store.tasks.update(|ts| ts.retain(|t| t.collection_id != id));
        notes.update(|ns| ns.retain(|n| n.collection_id != id));
    });

    let on_note_saved = Callback::new(move |saved: Note| {
        notes.update(|ns| upsert_note(ns, saved));
    });

    let open_new_collection = move |_| {
        collection_editing.set(None);
        collection_open.set(true);
    };

    let collection_siblings = Signal::derive(move || {
        let cid = note_collection.get();
        notes.with(|ns| ns.iter().filter(|n| n.collection_id == cid).cloned().collect::<Vec<_>>())
    });

    view! {
        <div class="mx-auto w-full max-w-6xl space-y-4">
            <Show
                when=move || !not_found.get()
                fallback=|| view! {
                    <div class="space-y-2 py-10 text-center">
                        <div class="text-sm font-medium">"List not found"</div>
                        <a href=DASHBOARD class="text-xs text-primary underline underline-offset-4">
                            "Back to dashboard"
                        </a>
                    </div>
                }
            >
                <div class="flex items-center justify-between gap-2">
                    <div class="flex min-w-0 items-center gap-2">
                        {move || current_list().map(|list| {
                            let target = list.clone();
                            view! {
                                <span
                                    class="size-3 shrink-0 rounded-full border border-border"
                                    style=format!("background-color: {}", list.bg_color)
                                ></span>
                                <h1 class="truncate text-xl font-semibold">{list.name.clone()}</h1>
                                <Button
                                    variant=ButtonVariant::Ghost
                                    size=ButtonSize::IconSm
                                    attr:title="Edit list"
                                    on:click=move |_| list_actions.open_edit.run(target.clone())
                                >
                                    <Pencil />
                                </Button>
                            }
                        })}
                    </div>
                    <Button size=ButtonSize::Sm on:click=open_new_collection>
                        <Plus />
                        "New collection"
                    </Button>
                </div>

                <FormError error=load_error />
                <FormError error=store.error />
                <FormError error=note_error />

                <Show when=move || loading.get() && collections.with(Vec::is_empty) fallback=|| ().into_view()>
                    <div class="flex items-center gap-2 text-sm text-muted-foreground">
                        <Spinner />
                        "Loading..."
                    </div>
                </Show>

                <Show
                    when=move || loading.get() || !collections.with(Vec::is_empty)
                    fallback=|| view! {
                        <div class="py-10 text-center text-sm text-muted-foreground">
                            "This list has no collections yet."
                        </div>
                    }
                >
                    <div class="grid items-start gap-4 lg:grid-cols-2">
                        <For
                            each=move || collections.get()
                            key=|c| (c.id.clone(), c.name.clone(), c.bg_color.clone(), c.is_default)
                            children=move |collection| {
                                let cid = collection.id.clone();
                                let panel_notes = Signal::derive(move || {
                                    notes.with(|ns| {
                                        ns.iter().filter(|n| n.collection_id == cid).cloned().collect::<Vec<_>>()
                                    })
                                });
                                view! {
                                    <CollectionPanel collection=collection store=store notes=panel_notes today=today />
                                }
                            }
                        />
                    </div>
                </Show>
            </Show>

            <CollectionPopup
                open=collection_open
                list_id=Signal::derive(list_id)
                editing=collection_editing
                known=collections
                on_saved=on_collection_saved
            />
            <NotePopup
                open=note_open
                collection_id=note_collection
                editing=note_editing
                siblings=collection_siblings
                on_saved=on_note_saved
            />
            <DeleteCollectionPopup
                open=delete_open
                target=delete_target
                on_deleted=on_collection_deleted
            />
        </div>
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn collection(id: &str, created_at: &str, is_default: bool) -> Collection {
        Collection {
            id: id.to_string(),
            name: id.to_string(),
            bg_color: String::new(),
            created_at: created_at.to_string(),
            is_default,
            list_id: "l1".to_string(),
        }
    }

    fn note(id: &str, created_at: &str, pinned: bool) -> Note {
        Note {
            id: id.to_string(),
            title: id.to_string(),
            description: None,
            created_at: created_at.to_string(),
            is_pinned: pinned,
            is_deleted: false,
            bg_color: String::new(),
            collection_id: "c1".to_string(),
        }
    }

    #[test]
    fn saving_a_new_default_demotes_the_old_one() {
        let mut cs = vec![collection("general", "2024-01-01", true), collection("work", "2024-01-02", false)];
        upsert_collection(&mut cs, collection("work", "2024-01-02", true));
        let defaults: Vec<_> = cs.iter().filter(|c| c.is_default).map(|c| c.id.as_str()).collect();
        assert_eq!(defaults, vec!["work"]);
        assert_eq!(cs[0].id, "work");
    }

    #[test]
    fn new_collection_is_appended_after_existing_ones() {
        let mut cs = vec![collection("general", "2024-01-01", true)];
        upsert_collection(&mut cs, collection("errands", "2024-02-01", false));
        let ids: Vec<_> = cs.iter().map(|c| c.id.as_str()).collect();
        assert_eq!(ids, vec!["general", "errands"]);
    }

    #[test]
    fn pinned_notes_float_up() {
        let mut ns = vec![note("a", "2024-01-01", false), note("b", "2024-01-02", true)];
        upsert_note(&mut ns, note("c", "2024-01-03", false));
        let ids: Vec<_> = ns.iter().map(|n| n.id.as_str()).collect();
        assert_eq!(ids, vec!["b", "a", "c"]);
    }
}

use chrono::NaiveDate;
use icons::{Pencil, Plus, Trash2};
use leptos::prelude::*;
use listit_core::models::{Collection, Note, Task};
use listit_core::validation::MAX_NAME_LEN;

use crate::components::note_card::NoteCard;
use crate::components::task_item::TaskItem;
use crate::components::ui::{Button, ButtonSize, ButtonVariant, Input};
use crate::state::{BoardActions, TaskStore};
use crate::util::parse_due_input;

/// A collection on the list board: its tasks, an inline add form and its notes.
#[component]
pub fn CollectionPanel(
    collection: Collection,
    store: TaskStore,
    #[prop(into)] notes: Signal<Vec<Note>>,
    today: NaiveDate,
) -> impl IntoView {
    let actions = expect_context::<BoardActions>();

    let new_text: RwSignal<String> = RwSignal::new(String::new());
    let new_due: RwSignal<String> = RwSignal::new(String::new());
    let show_completed: RwSignal<bool> = RwSignal::new(false);

    let collection_id = collection.id.clone();
    let mine = {
        let collection_id = collection_id.clone();
        move |t: &Task| t.collection_id == collection_id
    };
    let open_tasks = {
        let mine = mine.clone();
        move || {
            store
                .tasks
                .with(|ts| ts.iter().filter(|t| mine(*t) && !t.is_completed).cloned().collect::<Vec<_>>())
        }
    };
    let done_tasks = move || {
        store
            .tasks
            .with(|ts| ts.iter().filter(|t| mine(*t) && t.is_completed).cloned().collect::<Vec<_>>())
    };
    let done_tasks = StoredValue::new(done_tasks);
    let has_tasks = {
        let collection_id = collection_id.clone();
        move || store.tasks.with(|ts| ts.iter().any(|t| t.collection_id == collection_id))
    };

    let submit = {
        let collection_id = collection_id.clone();
        move || {
            let text = new_text.get_untracked();
            if text.trim().is_empty() {
                return;
            }
            let due = parse_due_input(&new_due.get_untracked());
            actions.add_task.run((collection_id.clone(), text, due));
            new_text.set(String::new());
            new_due.set(String::new());
        }
    };
    let submit = StoredValue::new(submit);

    let task_row = move |task: Task| {
        let id = task.id.clone();
        let busy = {
            let id = id.clone();
            Signal::derive(move || store.is_updating(&id))
        };
        let (toggle_id, edit_id, delete_id) = (id.clone(), id.clone(), id);
        view! {
            <TaskItem
                task=task
                today=today
                busy=busy
                on_toggle=Callback::new(move |toggle| actions.toggle_task.run((toggle_id.clone(), toggle)))
                on_edit=Callback::new(move |text| actions.edit_task.run((edit_id.clone(), text)))
                on_delete=Callback::new(move |_| actions.delete_task.run(delete_id.clone()))
            />
        }
    };

    let (edit_target, delete_target) = (collection.clone(), collection.clone());
    let note_target = collection_id.clone();
    let is_default = collection.is_default;

    view! {
        <section class="flex w-full flex-col gap-3 rounded-lg border border-border bg-background p-3 shadow-xs">
            <header
                class="-mx-3 -mt-3 flex items-center justify-between gap-2 rounded-t-lg px-3 py-2 text-zinc-900"
                style=format!("background-color: {}", collection.bg_color)
            >
                <div class="flex min-w-0 items-center gap-2">
                    <h2 class="truncate text-sm font-semibold">{collection.name.clone()}</h2>
                    <Show when=move || is_default fallback=|| ().into_view()>
                        <span class="rounded bg-black/5 px-1.5 py-0.5 text-[10px]">"Default"</span>
                    </Show>
                </div>
                <div class="flex shrink-0 items-center gap-0.5">
                    <Button
                        variant=ButtonVariant::Ghost
                        size=ButtonSize::IconSm
                        class="text-zinc-700"
                        attr:title="Edit collection"
                        on:click=move |_| actions.edit_collection.run(edit_target.clone())
                    >
                        <Pencil />
                    </Button>
                    <Show when=move || !is_default fallback=|| ().into_view()>
                        <Button
                            variant=ButtonVariant::Ghost
                            size=ButtonSize::IconSm
                            class="text-zinc-700"
                            attr:title="Delete collection"
                            on:click={
                                let target = delete_target.clone();
                                move |_| actions.delete_collection.run(target.clone())
                            }
                        >
                            <Trash2 />
                        </Button>
                    </Show>
                </div>
            </header>

            <div class="flex items-center gap-2">
                <Input
                    bind_value=new_text
                    placeholder="Add a task"
                    maxlength=MAX_NAME_LEN
                    class="h-8 text-sm"
                    on_enter=Callback::new(move |_| submit.with_value(|f| f()))
                />
                <Input r#type="date" bind_value=new_due class="h-8 w-36 text-sm" />
                <Button
                    size=ButtonSize::IconSm
                    attr:title="Add task"
                    on:click=move |_| submit.with_value(|f| f())
                >
                    <Plus />
                </Button>
            </div>

            <div class="space-y-0.5">
                <For
                    each=open_tasks
                    key=|t| (t.id.clone(), t.text.clone(), t.is_completed, t.is_priority, t.due_date.clone())
                    children=task_row
                />
                <Show when=move || !has_tasks() fallback=|| ().into_view()>
                    <div class="px-2 py-1 text-xs text-muted-foreground">"No tasks yet."</div>
                </Show>
            </div>

            <Show when=move || !done_tasks.with_value(|f| f().is_empty()) fallback=|| ().into_view()>
                <div class="space-y-0.5">
                    <button
                        type="button"
                        class="px-2 text-xs text-muted-foreground hover:text-foreground"
                        on:click=move |_| show_completed.update(|v| *v = !*v)
                    >
                        {move || {
                            let n = done_tasks.with_value(|f| f().len());
                            if show_completed.get() { format!("Hide completed ({n})") } else { format!("Show completed ({n})") }
                        }}
                    </button>
                    <Show when=move || show_completed.get() fallback=|| ().into_view()>
                        <For
                            each=move || done_tasks.with_value(|f| f())
                            key=|t| (t.id.clone(), t.text.clone(), t.is_completed, t.is_priority, t.due_date.clone())
                            children=task_row
                        />
                    </Show>
                </div>
            </Show>

            <div class="space-y-2 border-t border-border pt-2">
                <div class="flex items-center justify-between">
                    <span class="text-xs font-medium uppercase tracking-wide text-muted-foreground">"Notes"</span>
                    <Button
                        variant=ButtonVariant::Ghost
                        size=ButtonSize::IconSm
                        attr:title="New note"
                        on:click=move |_| actions.new_note.run(note_target.clone())
                    >
                        <Plus />
                    </Button>
                </div>
                <div class="grid gap-2 sm:grid-cols-2">
                    <For
                        each=move || notes.get()
                        key=|n| (n.id.clone(), n.title.clone(), n.description.clone(), n.bg_color.clone(), n.is_pinned)
                        children=|note| view! { <NoteCard note=note /> }
                    />
                </div>
            </div>
        </section>
    }
}


use chrono::NaiveDate;
use icons::{Check, Pencil, Star, Trash2, X};
use leptos::prelude::*;
use listit_core::models::Task;
use listit_core::tasks::TaskToggle;
use listit_core::validation::MAX_NAME_LEN;

use crate::components::ui::{Button, ButtonSize, ButtonVariant, Input};
use crate::util::due_label;

fn checkbox_class(done: bool) -> &'static str {
    if done {
        "flex size-5 shrink-0 items-center justify-center rounded-full border border-primary bg-primary text-primary-foreground"
    } else {
        "flex size-5 shrink-0 items-center justify-center rounded-full border border-border hover:border-primary"
    }
}

/// One task row: completion checkbox, text, due date and row actions.
#[component]
pub fn TaskItem(
    task: Task,
    today: NaiveDate,
    #[prop(into)] busy: Signal<bool>,
    on_toggle: Callback<TaskToggle>,
    on_edit: Callback<String>,
    on_delete: Callback<()>,
    /// Shown under the text on the cross-list views.
    #[prop(default = None)]
    context: Option<String>,
) -> impl IntoView {
    let editing: RwSignal<bool> = RwSignal::new(false);
    let draft: RwSignal<String> = RwSignal::new(task.text.clone());

    let done = task.is_completed;
    let priority = task.is_priority;
    let overdue = !done && task.due_on().is_some_and(|d| d < today);
    let due = task.due_on().map(|d| due_label(d, today));
    let text = task.text.clone();

    let save = move || {
        let value = draft.get_untracked();
        editing.set(false);
        if value.trim() != text.trim() {
            on_edit.run(value);
        }
    };
    let save = StoredValue::new(save);

    let text_class = if done {
        "truncate text-sm text-muted-foreground line-through"
    } else {
        "truncate text-sm"
    };

    view! {
        <div class="group flex items-center gap-2 rounded-md px-2 py-1.5 hover:bg-surface-hover">
            <button
                type="button"
                class=checkbox_class(done)
                title=if done { "Mark as not complete" } else { "Mark as complete" }
                disabled=move || busy.get()
                on:click=move |_| on_toggle.run(TaskToggle::Completed)
            >
                <Show when=move || done fallback=|| ().into_view()>
                    <Check class="size-3" />
                </Show>
            </button>

            <div class="min-w-0 flex-1">
                <Show
                    when=move || editing.get()
                    fallback={
                        let text = task.text.clone();
                        move || view! {
                            <div class=text_class on:dblclick=move |_| editing.set(true)>{text.clone()}</div>
                        }
                    }
                >
                    <Input
                        bind_value=draft
                        maxlength=MAX_NAME_LEN
                        autofocus=true
                        class="h-7 text-sm"
                        on_enter=Callback::new(move |_| save.with_value(|f| f()))
                    />
                </Show>
                <div class="flex items-center gap-2 text-[11px] text-muted-foreground">
                    {due.map(|label| view! {
                        <span class=if overdue { "text-destructive" } else { "" }>{label}</span>
                    })}
                    {context.map(|c| view! { <span class="truncate">{c}</span> })}
                </div>
            </div>

            <Show
                when=move || editing.get()
                fallback=move || view! {
                    <div class="flex shrink-0 items-center gap-0.5 opacity-0 transition-opacity group-hover:opacity-100 focus-within:opacity-100">
                        <Button
                            variant=ButtonVariant::Ghost
                            size=ButtonSize::IconSm
                            attr:title="Edit task"
                            on:click=move |_| editing.set(true)
                        >
                            <Pencil />
                        </Button>
                        <Button
                            variant=ButtonVariant::Ghost
                            size=ButtonSize::IconSm
                            attr:title="Delete task"
                            attr:disabled=move || busy.get()
                            on:click=move |_| on_delete.run(())
                        >
                            <Trash2 />
                        </Button>
                    </div>
                }
            >
                <Button
                    variant=ButtonVariant::Ghost
                    size=ButtonSize::IconSm
                    attr:title="Save"
                    on:click=move |_| save.with_value(|f| f())
                >
                    <Check />
                </Button>
                <Button
                    variant=ButtonVariant::Ghost
                    size=ButtonSize::IconSm
                    attr:title="Cancel"
                    on:click=move |_| editing.set(false)
                >
                    <X />
                </Button>
            </Show>

            <button
                type="button"
                class=if priority { "shrink-0 text-amber-500" } else { "shrink-0 text-muted-foreground hover:text-amber-500" }
                title=if priority { "Remove priority" } else { "Mark as priority" }
                disabled=move || busy.get()
                on:click=move |_| on_toggle.run(TaskToggle::Priority)
            >
                <Star class="size-4" />
            </button>
        </div>
    }
}

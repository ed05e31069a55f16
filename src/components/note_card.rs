use icons::{Pencil, Pin, Trash2};
use leptos::prelude::*;
use listit_core::models::Note;

use crate::components::ui::{Button, ButtonSize, ButtonVariant};
use crate::state::BoardActions;

#[component]
pub fn NoteCard(note: Note) -> impl IntoView {
    let actions = expect_context::<BoardActions>();
    let pinned = note.is_pinned;
    let (edit_target, pin_target, delete_target) = (note.clone(), note.clone(), note.clone());

    view! {
        <div
            class="group rounded-md border border-border p-3 text-zinc-900 shadow-xs"
            style=format!("background-color: {}", note.bg_color)
        >
            <div class="flex items-start justify-between gap-2">
                <div class="min-w-0 break-words text-sm font-medium">{note.title.clone()}</div>
                <div class="flex shrink-0 items-center gap-0.5">
                    <Button
                        variant=ButtonVariant::Ghost
                        size=ButtonSize::IconSm
                        class=if pinned { "text-zinc-900" } else { "text-zinc-600 opacity-0 group-hover:opacity-100" }
                        attr:title=if pinned { "Unpin note" } else { "Pin note" }
                        on:click=move |_| actions.toggle_note_pin.run(pin_target.clone())
                    >
                        <Pin />
                    </Button>
                    <Button
                        variant=ButtonVariant::Ghost
                        size=ButtonSize::IconSm
                        class="text-zinc-600 opacity-0 group-hover:opacity-100"
                        attr:title="Edit note"
                        on:click=move |_| actions.edit_note.run(edit_target.clone())
                    >
                        <Pencil />
                    </Button>
                    <Button
                        variant=ButtonVariant::Ghost
                        size=ButtonSize::IconSm
                        class="text-zinc-600 opacity-0 group-hover:opacity-100"
                        attr:title="Delete note"
                        on:click=move |_| actions.delete_note.run(delete_target.clone())
                    >
                        <Trash2 />
                    </Button>
                </div>
            </div>
            {note.description.clone().filter(|d| !d.trim().is_empty()).map(|d| view! {
                <p class="mt-1 whitespace-pre-wrap break-words text-xs text-zinc-700">{d}</p>
            })}
        </div>
    }
}

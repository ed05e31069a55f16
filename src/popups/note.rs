use leptos::logging::warn;
use leptos::prelude::*;
use leptos::task::spawn_local;
use listit_core::models::{NewNote, Note, NotePatch, DEFAULT_BG_COLOR};
use listit_core::validation::{ensure_unique_name, validate_name, MAX_NAME_LEN};

use crate::components::color_picker::ColorPicker;
use crate::components::modal::{Modal, ModalActions};
use crate::components::ui::{FormError, Input, Label, Textarea};
use crate::state::AppContext;

fn optional_text(raw: &str) -> Option<String> {
    let trimmed = raw.trim();
    (!trimmed.is_empty()).then(|| trimmed.to_string())
}

/// Create a note in `collection_id` (`editing` is `None`) or edit one.
/// Titles are unique within the collection.
#[component]
pub fn NotePopup(
    open: RwSignal<bool>,
    #[prop(into)] collection_id: Signal<String>,
    #[prop(into)] editing: Signal<Option<Note>>,
    #[prop(into)] siblings: Signal<Vec<Note>>,
    on_saved: Callback<Note>,
) -> impl IntoView {
    let app_state = expect_context::<AppContext>();

    let title: RwSignal<String> = RwSignal::new(String::new());
    let description: RwSignal<String> = RwSignal::new(String::new());
    let color: RwSignal<String> = RwSignal::new(DEFAULT_BG_COLOR.to_string());
    let pinned: RwSignal<bool> = RwSignal::new(false);
    let error: RwSignal<Option<String>> = RwSignal::new(None);
    let busy: RwSignal<bool> = RwSignal::new(false);

    Effect::new(move |_| {
        if !open.get() {
            return;
        }
        let current = editing.get_untracked();
        title.set(current.as_ref().map(|n| n.title.clone()).unwrap_or_default());
        description.set(
            current
                .as_ref()
                .and_then(|n| n.description.clone())
                .unwrap_or_default(),
        );
        color.set(
            current
                .as_ref()
                .map(|n| n.bg_color.clone())
                .unwrap_or_else(|| DEFAULT_BG_COLOR.to_string()),
        );
        pinned.set(current.as_ref().is_some_and(|n| n.is_pinned));
        error.set(None);
    });

    let heading = Signal::derive(move || {
        if editing.with(Option::is_some) {
            "Edit note".to_string()
        } else {
            "New note".to_string()
        }
    });

    let submit = move || {
        if busy.get_untracked() {
            return;
        }
        let current = editing.get_untracked();
        let editing_id = current.as_ref().map(|n| n.id.clone());
        let checked = validate_name("Note title", &title.get_untracked()).and_then(|t| {
            siblings.with_untracked(|notes| {
                ensure_unique_name(
                    "note",
                    &t,
                    notes.iter().map(|n| (n.id.as_str(), n.title.as_str())),
                    editing_id.as_deref(),
                )
            })?;
            Ok(t)
        });
        let note_title = match checked {
            Ok(t) => t,
            Err(e) => {
                error.set(Some(e.to_string()));
                return;
            }
        };

        let client = app_state.0.api_client.get_untracked();
        let text = optional_text(&description.get_untracked());
        let bg_color = color.get_untracked();
        let is_pinned = pinned.get_untracked();
        let collection_id = collection_id.get_untracked();
        busy.set(true);
        error.set(None);

        spawn_local(async move {
            let result = match current {
                Some(note) => {
                    let patch = NotePatch {
                        title: Some(note_title),
                        description: Some(text),
                        bg_color: Some(bg_color),
                        is_pinned: Some(is_pinned),
                    };
                    client.update_note(&note.id, &patch).await
                }
                None => {
                    let row = NewNote {
                        title: note_title,
                        description: text,
                        bg_color,
                        is_pinned,
                        collection_id,
                    };
                    client.create_note(&row).await
                }
            };
            match result {
                Ok(note) => {
                    on_saved.run(note);
                    open.set(false);
                }
                Err(e) => {
                    warn!("Failed to save note: {e}");
                    error.set(Some(e.message));
                }
            }
            busy.set(false);
        });
    };

    view! {
        <Modal open=open title=heading>
            <div class="space-y-1">
                <Label html_for="note-title" class="text-xs">"Title"</Label>
                <Input
                    id="note-title"
                    bind_value=title
                    maxlength=MAX_NAME_LEN
                    autofocus=true
                    class="h-8 text-sm"
                />
            </div>
            <div class="space-y-1">
                <Label html_for="note-description" class="text-xs">"Description (optional)"</Label>
                <Textarea id="note-description" bind_value=description rows=5 class="text-sm" />
            </div>
            <div class="space-y-1">
                <Label class="text-xs">"Color"</Label>
                <ColorPicker selected=color />
            </div>
            <label class="flex items-center gap-2 text-xs">
                <input
                    type="checkbox"
                    prop:checked=move || pinned.get()
                    on:change=move |_| pinned.update(|v| *v = !*v)
                />
                "Pin note"
            </label>

            <FormError error=error />

            <ModalActions
                busy=busy
                on_cancel=Callback::new(move |_| open.set(false))
                on_submit=Callback::new(move |_| submit())
                idle="Save"
                working="Saving..."
            />
        </Modal>
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn blank_description_is_stored_as_null() {
        assert_eq!(optional_text("   \n"), None);
        assert_eq!(optional_text(" buy milk "), Some("buy milk".to_string()));
    }
}

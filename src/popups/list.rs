use leptos::logging::warn;
use leptos::prelude::*;
use leptos::task::spawn_local;
use listit_core::models::{List, ListPatch, NewList, DEFAULT_BG_COLOR};
use listit_core::validation::{ensure_unique_name, validate_name, MAX_NAME_LEN};

use crate::components::color_picker::ColorPicker;
use crate::components::modal::{Modal, ModalActions};
use crate::components::ui::{Button, ButtonSize, ButtonVariant, FormError, Input, Label};
use crate::state::{AppContext, AuthService};

/// Create a list (`editing` is `None`) or edit one.
#[component]
pub fn ListPopup(
    open: RwSignal<bool>,
    #[prop(into)] editing: Signal<Option<List>>,
    on_saved: Callback<List>,
    on_deleted: Callback<String>,
) -> impl IntoView {
    let app_state = expect_context::<AppContext>();
    let auth = expect_context::<AuthService>();

    let name: RwSignal<String> = RwSignal::new(String::new());
    let color: RwSignal<String> = RwSignal::new(DEFAULT_BG_COLOR.to_string());
    let pinned: RwSignal<bool> = RwSignal::new(false);
    let error: RwSignal<Option<String>> = RwSignal::new(None);
    let busy: RwSignal<bool> = RwSignal::new(false);
    let confirm_delete: RwSignal<bool> = RwSignal::new(false);

    Effect::new(move |_| {
        if !open.get() {
            return;
        }
        let current = editing.get_untracked();
        name.set(current.as_ref().map(|l| l.name.clone()).unwrap_or_default());
        color.set(
            current
                .as_ref()
                .map(|l| l.bg_color.clone())
                .unwrap_or_else(|| DEFAULT_BG_COLOR.to_string()),
        );
        pinned.set(current.as_ref().is_some_and(|l| l.is_pinned));
        error.set(None);
        confirm_delete.set(false);
    });

    let title = Signal::derive(move || {
        if editing.with(Option::is_some) {
            "Edit list".to_string()
        } else {
            "New list".to_string()
        }
    });

    let submit = move || {
        if busy.get_untracked() {
            return;
        }
        let current = editing.get_untracked();
        let editing_id = current.as_ref().map(|l| l.id.clone());

        let checked = validate_name("List name", &name.get_untracked()).and_then(|n| {
            app_state.0.lists.with_untracked(|lists| {
                ensure_unique_name(
                    "list",
                    &n,
                    lists.iter().map(|l| (l.id.as_str(), l.name.as_str())),
                    editing_id.as_deref(),
                )
            })?;
            Ok(n)
        });
        let list_name = match checked {
            Ok(n) => n,
            Err(e) => {
                error.set(Some(e.to_string()));
                return;
            }
        };

        let client = app_state.0.api_client.get_untracked();
        let bg_color = color.get_untracked();
        let is_pinned = pinned.get_untracked();
        busy.set(true);
        error.set(None);

        spawn_local(async move {
            let result = match current {
                Some(list) => {
                    let patch = ListPatch {
                        name: Some(list_name),
                        bg_color: Some(bg_color),
                        is_pinned: Some(is_pinned),
                    };
                    client.update_list(&list.id, &patch).await
                }
                None => match auth.user_id() {
                    Some(user_id) => {
                        let row = NewList {
                            name: list_name,
                            bg_color,
                            is_default: app_state.0.lists.with_untracked(Vec::is_empty),
                            is_pinned,
                            user_id,
                        };
                        client.create_list(&row).await.map(|(list, _general)| list)
                    }
                    None => Err(crate::api::ApiError::unauthorized("Sign in to create lists")),
                },
            };
            match result {
                Ok(list) => {
                    on_saved.run(list);
                    open.set(false);
                }
                Err(e) => {
                    warn!("Failed to save list: {e}");
                    error.set(Some(e.message));
                }
            }
            busy.set(false);
        });
    };

    let delete = move || {
        let Some(list) = editing.get_untracked() else {
            return;
        };
        if !confirm_delete.get_untracked() {
            confirm_delete.set(true);
            return;
        }
        let client = app_state.0.api_client.get_untracked();
        busy.set(true);
        error.set(None);
        spawn_local(async move {
            match client.delete_list(&list.id).await {
                Ok(()) => {
                    on_deleted.run(list.id);
                    open.set(false);
                }
                Err(e) => {
                    warn!("Failed to delete list {}: {e}", list.id);
                    error.set(Some(e.message));
                }
            }
            busy.set(false);
        });
    };

    view! {
        <Modal open=open title=title>
            <div class="space-y-1">
                <Label html_for="list-name" class="text-xs">"Name"</Label>
                <Input
                    id="list-name"
                    bind_value=name
                    maxlength=MAX_NAME_LEN
                    autofocus=true
                    class="h-8 text-sm"
                    on_enter=Callback::new(move |_| submit())
                />
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
                "Pin to the top"
            </label>

            <FormError error=error />

            <Show when=move || editing.with(Option::is_some) fallback=|| ().into_view()>
                <Button
                    variant=ButtonVariant::Ghost
                    size=ButtonSize::Sm
                    class="px-0 text-destructive"
                    attr:disabled=move || busy.get()
                    on:click=move |_| delete()
                >
                    {move || if confirm_delete.get() { "Click again to delete this list and everything in it" } else { "Delete list" }}
                </Button>
            </Show>

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

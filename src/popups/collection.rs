use leptos::logging::warn;
use leptos::prelude::*;
use leptos::task::spawn_local;
use listit_core::models::{Collection, CollectionPatch, NewCollection, DEFAULT_BG_COLOR};
use listit_core::validation::{ensure_unique_name, validate_name, MAX_NAME_LEN};

use crate::api::{ApiClient, ApiResult};
use crate::components::color_picker::ColorPicker;
use crate::components::modal::{Modal, ModalActions};
use crate::components::ui::{FormError, Input, Label};
use crate::state::AppContext;

/// Names already taken in the list: the ones on screen plus whatever the
/// backend knows about under the same name.
async fn name_taken(
    client: &ApiClient,
    list_id: &str,
    name: &str,
    known: &[Collection],
    editing_id: Option<&str>,
) -> ApiResult<Option<String>> {
    let on_screen = ensure_unique_name(
        "collection",
        name,
        known.iter().map(|c| (c.id.as_str(), c.name.as_str())),
        editing_id,
    );
    if let Err(e) = on_screen {
        return Ok(Some(e.to_string()));
    }
    let stored = client.find_collections_named(list_id, name).await?;
    Ok(ensure_unique_name(
        "collection",
        name,
        stored.iter().map(|c| (c.id.as_str(), c.name.as_str())),
        editing_id,
    )
    .err()
    .map(|e| e.to_string()))
}

/// The row to hand back after a save, plus the message to show when the
/// save went through but the default switch did not.
fn after_default_switch(
    saved: Collection,
    switched: Option<ApiResult<Collection>>,
) -> (Collection, Option<String>) {
    match switched {
        None => (saved, None),
        Some(Ok(defaulted)) => (defaulted, None),
        Some(Err(e)) => (
            saved,
            Some(format!("Saved, but it could not be made the default: {}", e.message)),
        ),
    }
}

/// Create a collection in `list_id` (`editing` is `None`) or edit one.
///
/// `on_saved` receives the saved collection; when it became the default the
/// caller is expected to clear the flag on the others it shows.
#[component]
pub fn CollectionPopup(
    open: RwSignal<bool>,
    #[prop(into)] list_id: Signal<String>,
    #[prop(into)] editing: Signal<Option<Collection>>,
    #[prop(into)] known: Signal<Vec<Collection>>,
    on_saved: Callback<Collection>,
) -> impl IntoView {
    let app_state = expect_context::<AppContext>();

    let name: RwSignal<String> = RwSignal::new(String::new());
    let color: RwSignal<String> = RwSignal::new(DEFAULT_BG_COLOR.to_string());
    let make_default: RwSignal<bool> = RwSignal::new(false);
    let error: RwSignal<Option<String>> = RwSignal::new(None);
    let busy: RwSignal<bool> = RwSignal::new(false);
    // A collection created during this opening; retries edit it instead of
    // inserting a second one.
    let created: RwSignal<Option<Collection>> = RwSignal::new(None);

    Effect::new(move |_| {
        if !open.get() {
            return;
        }
        created.set(None);
        let current = editing.get_untracked();
        name.set(current.as_ref().map(|c| c.name.clone()).unwrap_or_default());
        color.set(
            current
                .as_ref()
                .map(|c| c.bg_color.clone())
                .unwrap_or_else(|| DEFAULT_BG_COLOR.to_string()),
        );
        make_default.set(current.as_ref().is_some_and(|c| c.is_default));
        error.set(None);
    });

    let was_default = move || editing.with(|c| c.as_ref().is_some_and(|c| c.is_default));
    let title = Signal::derive(move || {
        if editing.with(Option::is_some) || created.with(Option::is_some) {
            "Edit collection".to_string()
        } else {
            "New collection".to_string()
        }
    });

    let submit = move || {
        if busy.get_untracked() {
            return;
        }
        let collection_name = match validate_name("Collection name", &name.get_untracked()) {
            Ok(n) => n,
            Err(e) => {
                error.set(Some(e.to_string()));
                return;
            }
        };
        let current = created.get_untracked().or_else(|| editing.get_untracked());
        let list_id = list_id.get_untracked();
        let known = known.get_untracked();
        let bg_color = color.get_untracked();
        let wants_default = make_default.get_untracked();
        let client = app_state.0.api_client.get_untracked();

        busy.set(true);
        error.set(None);

        spawn_local(async move {
            let editing_id = current.as_ref().map(|c| c.id.as_str());
            match name_taken(&client, &list_id, &collection_name, &known, editing_id).await {
                Ok(Some(message)) => {
                    error.set(Some(message));
                    busy.set(false);
                    return;
                }
                Ok(None) => {}
                Err(e) => warn!("Collection name lookup failed, relying on local check: {e}"),
            }

            let saved = match &current {
                Some(existing) => {
                    let patch = CollectionPatch {
                        name: Some(collection_name),
                        bg_color: Some(bg_color),
                        is_default: None,
                    };
                    client.update_collection(&existing.id, &patch).await
                }
                None => {
                    let row = NewCollection {
                        name: collection_name,
                        bg_color,
                        is_default: false,
                        list_id: list_id.clone(),
                    };
                    client.create_collection(&row).await
                }
            };

            let saved = match saved {
                Ok(c) => c,
                Err(e) => {
                    warn!("Failed to save collection: {e}");
                    error.set(Some(e.message));
                    busy.set(false);
                    return;
                }
            };
            let switched = if wants_default && !saved.is_default {
                Some(client.make_default_collection(&known, &list_id, &saved.id).await)
            } else {
                None
            };

            let (collection, default_error) = after_default_switch(saved, switched);
            on_saved.run(collection.clone());
            match default_error {
                None => open.set(false),
                Some(message) => {
                    warn!("{message}");
                    created.set(Some(collection));
                    error.set(Some(message));
                }
            }
            busy.set(false);
        });
    };

    view! {
        <Modal open=open title=title>
            <div class="space-y-1">
                <Label html_for="collection-name" class="text-xs">"Name"</Label>
                <Input
                    id="collection-name"
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
                    // The default can move elsewhere but not be dropped.
                    disabled=was_default
                    prop:checked=move || make_default.get()
                    on:change=move |_| make_default.update(|v| *v = !*v)
                />
                "Default collection of this list"
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
    use crate::api::ApiError;

    fn collection(is_default: bool) -> Collection {
        Collection {
            id: "c1".to_string(),
            name: "Errands".to_string(),
            bg_color: DEFAULT_BG_COLOR.to_string(),
            created_at: String::new(),
            is_default,
            list_id: "l1".to_string(),
        }
    }

    #[test]
    fn failed_default_switch_still_reports_the_saved_row() {
        let (row, message) = after_default_switch(
            collection(false),
            Some(Err(ApiError::unauthorized("permission denied"))),
        );
        assert_eq!(row, collection(false));
        assert!(message.is_some_and(|m| m.contains("permission denied")));
    }

    #[test]
    fn successful_default_switch_reports_the_new_default() {
        let (row, message) = after_default_switch(collection(false), Some(Ok(collection(true))));
        assert!(row.is_default);
        assert!(message.is_none());

        let (row, message) = after_default_switch(collection(false), None);
        assert!(!row.is_default);
        assert!(message.is_none());
    }
}

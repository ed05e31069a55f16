use leptos::logging::warn;
use leptos::prelude::*;
use leptos::task::spawn_local;
use listit_core::models::Collection;

use crate::components::modal::{Modal, ModalActions};
use crate::components::ui::FormError;
use crate::state::AppContext;

const DEFAULT_REFUSAL: &str = "The default collection cannot be deleted. Make another collection the default first.";

/// Delete a collection with its tasks and notes. The default collection is
/// refused before any request is made.
#[component]
pub fn DeleteCollectionPopup(
    open: RwSignal<bool>,
    #[prop(into)] target: Signal<Option<Collection>>,
    on_deleted: Callback<String>,
) -> impl IntoView {
    let app_state = expect_context::<AppContext>();
    let error: RwSignal<Option<String>> = RwSignal::new(None);
    let busy: RwSignal<bool> = RwSignal::new(false);

    Effect::new(move |_| {
        if open.get() {
            error.set(None);
        }
    });

    let is_default = Signal::derive(move || target.with(|c| c.as_ref().is_some_and(|c| c.is_default)));
    let name = move || target.with(|c| c.as_ref().map(|c| c.name.clone()).unwrap_or_default());

    let submit = move || {
        if busy.get_untracked() {
            return;
        }
        let Some(collection) = target.get_untracked() else {
            return;
        };
        if collection.is_default {
            error.set(Some(DEFAULT_REFUSAL.to_string()));
            return;
        }

        let client = app_state.0.api_client.get_untracked();
        busy.set(true);
        error.set(None);
        spawn_local(async move {
            match client.delete_collection(&collection.id).await {
                Ok(()) => {
                    on_deleted.run(collection.id);
                    open.set(false);
                }
                Err(e) => {
                    warn!("Failed to delete collection {}: {e}", collection.id);
                    error.set(Some(e.message));
                }
            }
            busy.set(false);
        });
    };

    view! {
        <Modal
            open=open
            title="Delete collection"
            description="Its tasks and notes are deleted too. This cannot be undone."
            destructive=true
        >
            <div class="rounded-md border border-border bg-muted px-3 py-2 text-sm">{name}</div>
            <Show when=move || is_default.get() fallback=|| ().into_view()>
                <div class="text-xs text-muted-foreground">{DEFAULT_REFUSAL}</div>
            </Show>

            <FormError error=error />

            <ModalActions
                busy=busy
                on_cancel=Callback::new(move |_| open.set(false))
                on_submit=Callback::new(move |_| submit())
                idle="Delete"
                working="Deleting..."
                destructive=true
                blocked=is_default
            />
        </Modal>
    }
}

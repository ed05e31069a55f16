use leptos::logging::{error, log};
use leptos::prelude::*;
use leptos::task::spawn_local;

use crate::components::modal::{Modal, ModalActions};
use crate::components::ui::{FormError, Input, Label};
use crate::state::{AppContext, AuthService};

const CONFIRM_PHRASE: &str = "DELETE";

fn confirmed(typed: &str) -> bool {
    typed.trim() == CONFIRM_PHRASE
}

/// Permanently removes the account and all of its data, then signs out.
#[component]
pub fn DeleteAccountPopup(open: RwSignal<bool>) -> impl IntoView {
    let app_state = expect_context::<AppContext>();
    let auth = expect_context::<AuthService>();

    let typed: RwSignal<String> = RwSignal::new(String::new());
    let failure: RwSignal<Option<String>> = RwSignal::new(None);
    let busy: RwSignal<bool> = RwSignal::new(false);

    Effect::new(move |_| {
        if open.get() {
            typed.set(String::new());
            failure.set(None);
        }
    });

    let unconfirmed = Signal::derive(move || !typed.with(|t| confirmed(t)));

    let submit = move || {
        if busy.get_untracked() || !confirmed(&typed.get_untracked()) {
            return;
        }
        let Some(user_id) = auth.user_id() else {
            failure.set(Some("You are not signed in".to_string()));
            return;
        };

        let client = app_state.0.api_client.get_untracked();
        busy.set(true);
        failure.set(None);
        spawn_local(async move {
            match client.delete_account(&user_id).await {
                Ok(()) => {
                    log!("Account {user_id} deleted, signing out");
                    auth.logout().await;
                }
                Err(e) => {
                    error!("Account deletion failed: {e}");
                    failure.set(Some(e.message));
                    busy.set(false);
                }
            }
        });
    };

    view! {
        <Modal
            open=open
            title="Delete account"
            description="All lists, collections, tasks and notes are removed permanently."
            destructive=true
        >
            <div class="space-y-1">
                <Label html_for="delete-confirm" class="text-xs">
                    {format!("Type {CONFIRM_PHRASE} to confirm")}
                </Label>
                <Input
                    id="delete-confirm"
                    bind_value=typed
                    placeholder=CONFIRM_PHRASE
                    autocomplete="off"
                    class="h-8 text-sm"
                />
            </div>

            <FormError error=failure />

            <ModalActions
                busy=busy
                on_cancel=Callback::new(move |_| open.set(false))
                on_submit=Callback::new(move |_| submit())
                idle="Delete account"
                working="Deleting..."
                destructive=true
                blocked=unconfirmed
            />
        </Modal>
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn confirmation_must_match_exactly() {
        assert!(confirmed("DELETE"));
        assert!(confirmed("  DELETE "));
        assert!(!confirmed("delete"));
        assert!(!confirmed(""));
    }
}

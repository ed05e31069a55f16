mod auth;
mod in_flight;
mod sidebar;
mod tasks;
mod theme;

pub(crate) use auth::{parse_fragment, AuthEvent, AuthService};
pub(crate) use in_flight::InFlight;
pub(crate) use sidebar::SidebarService;
pub(crate) use tasks::TaskStore;
pub(crate) use theme::ThemeService;

use crate::api::ApiClient;
use leptos::logging::warn;
use leptos::prelude::*;
use leptos::task::spawn_local;
use listit_core::models::{Collection, List, Note};
use listit_core::tasks::TaskToggle;

#[derive(Clone, Copy)]
pub(crate) struct AppState {
    pub api_client: RwSignal<ApiClient>,

    /// Lists of the signed-in user, shown in the sidebar and on the dashboard.
    pub lists: RwSignal<Vec<List>>,
    pub lists_loading: RwSignal<bool>,
    pub lists_error: RwSignal<Option<String>>,

    /// Ignore responses from an earlier load that finish late.
    pub lists_request_id: RwSignal<u64>,
}

impl AppState {
    pub fn new() -> Self {
        Self {
            api_client: RwSignal::new(ApiClient::load_from_storage()),
            lists: RwSignal::new(vec![]),
            lists_loading: RwSignal::new(false),
            lists_error: RwSignal::new(None),
            lists_request_id: RwSignal::new(0),
        }
    }

    pub fn reload_lists(self) {
        let client = self.api_client.get_untracked();
        let Some(user_id) = client.user_id() else {
            self.lists.set(vec![]);
            return;
        };

        let request_id = self.lists_request_id.get_untracked() + 1;
        self.lists_request_id.set(request_id);
        self.lists_loading.set(true);
        self.lists_error.set(None);

        spawn_local(async move {
            let result = client.get_lists(&user_id).await;
            if self.lists_request_id.get_untracked() != request_id {
                return;
            }
            match result {
                Ok(lists) => self.lists.set(lists),
                Err(e) => {
                    warn!("Failed to load lists: {e}");
                    self.lists_error.set(Some(e.message));
                }
            }
            self.lists_loading.set(false);
        });
    }

    pub fn upsert_list(self, list: List) {
        self.lists.update(|lists| {
            match lists.iter_mut().find(|l| l.id == list.id) {
                Some(existing) => *existing = list,
                None => lists.push(list),
            }
        });
    }

    pub fn remove_list(self, list_id: &str) {
        self.lists.update(|lists| lists.retain(|l| l.id != list_id));
    }
}

impl Default for AppState {
    fn default() -> Self {
        Self::new()
    }
}

#[derive(Clone)]
pub(crate) struct AppContext(pub AppState);

/// Popups owned by the layout, opened from any page.
#[derive(Clone, Copy)]
pub(crate) struct ListUiActions {
    pub open_create: Callback<()>,
    pub open_edit: Callback<List>,
    pub open_delete_account: Callback<()>,
}

/// Actions of the open list board, shared by its collection panels.
#[derive(Clone, Copy)]
pub(crate) struct BoardActions {
    /// (collection id, text, due date)
    pub add_task: Callback<(String, String, Option<String>)>,
    pub toggle_task: Callback<(String, TaskToggle)>,
    pub edit_task: Callback<(String, String)>,
    pub delete_task: Callback<String>,
    pub edit_collection: Callback<Collection>,
    pub delete_collection: Callback<Collection>,
    /// Opens the note popup for the given collection id.
    pub new_note: Callback<String>,
    pub edit_note: Callback<Note>,
    pub toggle_note_pin: Callback<Note>,
    pub delete_note: Callback<Note>,
}

//! Client-side counterpart of the server route middleware, plus the shell
//! every signed-in page renders in.

use leptos::prelude::*;
use leptos_router::hooks::{use_location, use_navigate};
use leptos_router::NavigateOptions;
use listit_core::models::List;
use listit_core::routes::{
    classify, decide, list_path, RouteDecision, SessionState, DASHBOARD, LIST_PREFIX,
};
use listit_core::tasks::TaskView;

use crate::components::navbar::Navbar;
use crate::components::sidebar::Sidebar;
use crate::components::ui::Spinner;
use crate::popups::{DeleteAccountPopup, ListPopup};
use crate::state::{AppContext, AuthEvent, AuthService, ListUiActions, SidebarService};

/// Same policy the server applies, fed with what the browser knows.
pub(crate) fn navigation_decision(
    path: &str,
    logged_in: bool,
    referrer: Option<&str>,
) -> RouteDecision {
    let session = if logged_in {
        SessionState::Active
    } else {
        SessionState::Missing
    };
    decide(classify(path, None), path, session, referrer)
}

fn document_referrer() -> Option<String> {
    let referrer = document().referrer();
    (!referrer.is_empty()).then_some(referrer)
}

/// Header text for the signed-in shell.
pub(crate) fn page_title(path: &str, lists: &[List]) -> String {
    if path == DASHBOARD {
        return "Dashboard".to_string();
    }
    if let Some(view) = [
        TaskView::Today,
        TaskView::Priority,
        TaskView::Completed,
        TaskView::NotComplete,
    ]
    .into_iter()
    .find(|v| v.path() == path)
    {
        return view.title().to_string();
    }
    if path.starts_with(LIST_PREFIX) {
        return lists
            .iter()
            .find(|l| list_path(&l.id) == path)
            .map(|l| l.name.clone())
            .unwrap_or_else(|| "List".to_string());
    }
    "LIST IT".to_string()
}

#[component]
fn FullPageSpinner() -> impl IntoView {
    view! {
        <div class="flex min-h-screen items-center justify-center bg-background text-muted-foreground">
            <Spinner class="size-6" />
        </div>
    }
}

/// Renders `children` inside the app shell once a session exists; otherwise
/// sends the visitor to the login page.
#[component]
pub fn RootAuthed(children: ChildrenFn) -> impl IntoView {
    let auth = expect_context::<AuthService>();
    let location = use_location();
    let navigate = StoredValue::new(use_navigate());

    Effect::new(move |_| {
        if auth.loading.get() && !auth.is_logged_in.get() {
            return;
        }
        let path = location.pathname.get();
        if let RouteDecision::Redirect { location: to, .. } =
            navigation_decision(&path, auth.is_logged_in.get(), None)
        {
            navigate.with_value(|nav| {
                nav(
                    to,
                    NavigateOptions {
                        replace: true,
                        ..Default::default()
                    },
                )
            });
        }
    });

    // Store children so the view macro sees an `Fn` (not an `FnOnce`).
    let children = StoredValue::new(children);

    view! {
        <Show when=move || auth.is_logged_in.get() fallback=|| view! { <FullPageSpinner /> }>
            <AppLayout>
                {move || children.with_value(|c| c())}
            </AppLayout>
        </Show>
    }
}

/// Login and register: a signed-in visitor arriving from another page goes
/// to the dashboard instead.
#[component]
pub fn AuthOnly(children: ChildrenFn) -> impl IntoView {
    let auth = expect_context::<AuthService>();
    let location = use_location();
    let navigate = StoredValue::new(use_navigate());

    Effect::new(move |_| {
        if auth.loading.get() || !auth.is_logged_in.get() {
            return;
        }
        let path = location.pathname.get();
        let referrer = document_referrer();
        if let RouteDecision::Redirect { location: to, .. } =
            navigation_decision(&path, true, referrer.as_deref())
        {
            navigate.with_value(|nav| nav(to, Default::default()));
        }
    });

    let children = StoredValue::new(children);
    view! { {move || children.with_value(|c| c())} }
}

#[component]
pub fn AppLayout(children: ChildrenFn) -> impl IntoView {
    let app_state = expect_context::<AppContext>();
    let auth = expect_context::<AuthService>();
    let sidebar = expect_context::<SidebarService>();
    let location = use_location();
    let navigate = StoredValue::new(use_navigate());

    let list_popup_open: RwSignal<bool> = RwSignal::new(false);
    let list_editing: RwSignal<Option<List>> = RwSignal::new(None);
    let delete_account_open: RwSignal<bool> = RwSignal::new(false);

    provide_context(ListUiActions {
        open_create: Callback::new(move |_| {
            list_editing.set(None);
            list_popup_open.set(true);
        }),
        open_edit: Callback::new(move |list| {
            list_editing.set(Some(list));
            list_popup_open.set(true);
        }),
        open_delete_account: Callback::new(move |_| delete_account_open.set(true)),
    });

    // Load lists on entry and again whenever another session takes over.
    Effect::new(move |_| {
        let event = auth.last_event.get();
        if auth.is_logged_in.get_untracked() && event != Some(AuthEvent::SignedOut) {
            app_state.0.reload_lists();
        }
    });

    let on_list_saved = Callback::new(move |list: List| {
        let created = list_editing.with_untracked(Option::is_none);
        let id = list.id.clone();
        app_state.0.upsert_list(list);
        if created {
            sidebar.open();
            navigate.with_value(|nav| nav(&list_path(&id), Default::default()));
        }
    });

    let on_list_deleted = Callback::new(move |id: String| {
        app_state.0.remove_list(&id);
        if location.pathname.get_untracked() == list_path(&id) {
            navigate.with_value(|nav| nav(DASHBOARD, Default::default()));
        }
    });

    let title = Signal::derive(move || {
        let path = location.pathname.get();
        app_state.0.lists.with(|lists| page_title(&path, lists))
    });

    view! {
        <div class="min-h-screen bg-background text-foreground">
            <Navbar title=title />
            <div class="flex">
                <Sidebar />
                <main class="min-w-0 flex-1 px-4 py-6">{children()}</main>
            </div>

            <ListPopup
                open=list_popup_open
                editing=list_editing
                on_saved=on_list_saved
                on_deleted=on_list_deleted
            />
            <DeleteAccountPopup open=delete_account_open />
        </div>
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use listit_core::routes::LOGIN;

    fn list(id: &str, name: &str) -> List {
        List {
            id: id.to_string(),
            name: name.to_string(),
            bg_color: String::new(),
            created_at: String::new(),
            is_default: false,
            is_pinned: false,
            user_id: "u1".to_string(),
        }
    }

    #[test]
    fn signed_out_visitor_is_sent_to_login() {
        assert_eq!(
            navigation_decision("/today", false, None),
            RouteDecision::Redirect {
                location: LOGIN,
                clear_cookies: false
            }
        );
    }

    #[test]
    fn signed_in_visitor_skips_login_unless_reloading_it() {
        assert_eq!(
            navigation_decision(LOGIN, true, Some("https://listit.app/aboutus")),
            RouteDecision::Redirect {
                location: DASHBOARD,
                clear_cookies: false
            }
        );
        assert_eq!(
            navigation_decision(LOGIN, true, Some("https://listit.app/login")),
            RouteDecision::Continue { logged_in: true }
        );
    }

    #[test]
    fn titles_follow_the_route() {
        let lists = vec![list("l1", "Groceries")];
        assert_eq!(page_title(DASHBOARD, &lists), "Dashboard");
        assert_eq!(page_title("/List/l1", &lists), "Groceries");
        assert_eq!(page_title("/List/missing", &lists), "List");
        assert_eq!(page_title(TaskView::Priority.path(), &lists), TaskView::Priority.title());
    }
}

use icons::{Plus, Star};
use leptos::prelude::*;
use leptos_router::hooks::use_location;
use listit_core::models::List;
use listit_core::routes::{list_path, DASHBOARD};
use listit_core::tasks::TaskView;

use crate::components::ui::{Button, ButtonSize, ButtonVariant};
use crate::state::{AppContext, ListUiActions, SidebarService};

const VIEWS: [TaskView; 4] = [
    TaskView::Today,
    TaskView::Priority,
    TaskView::Completed,
    TaskView::NotComplete,
];

fn link_class(active: bool) -> &'static str {
    if active {
        "flex items-center gap-2 truncate rounded-md bg-surface-hover px-2 py-1.5 text-sm font-medium"
    } else {
        "flex items-center gap-2 truncate rounded-md px-2 py-1.5 text-sm text-muted-foreground hover:bg-surface-hover hover:text-foreground"
    }
}

const NARROW_VIEWPORT_PX: f64 = 768.0;

fn is_narrow_viewport() -> bool {
    web_sys::window()
        .and_then(|w| w.inner_width().ok())
        .and_then(|w| w.as_f64())
        .is_some_and(|w| w < NARROW_VIEWPORT_PX)
}

/// Pinned lists first, then by name.
fn sidebar_order(mut lists: Vec<List>) -> Vec<List> {
    lists.sort_by(|a, b| {
        b.is_pinned
            .cmp(&a.is_pinned)
            .then_with(|| a.name.to_lowercase().cmp(&b.name.to_lowercase()))
    });
    lists
}

#[component]
pub fn Sidebar() -> impl IntoView {
    let app_state = expect_context::<AppContext>();
    let sidebar = expect_context::<SidebarService>();
    let actions = expect_context::<ListUiActions>();
    let location = use_location();
    let pathname = move || location.pathname.get();

    let lists = app_state.0.lists;
    // On phones the sidebar covers the page; following a link hides it.
    let close_if_narrow = move |_: web_sys::MouseEvent| {
        if is_narrow_viewport() {
            sidebar.close();
        }
    };

    view! {
        <Show when=move || sidebar.is_open.get() fallback=|| ().into_view()>
            <aside class="w-60 shrink-0 border-r border-border bg-background">
                <div class="sticky top-12 flex max-h-[calc(100vh-3rem)] flex-col gap-4 overflow-y-auto p-3">
                    <nav class="space-y-0.5" on:click=close_if_narrow>
                        <a href=DASHBOARD class=move || link_class(pathname() == DASHBOARD)>"Dashboard"</a>
                        {VIEWS
                            .into_iter()
                            .map(|view| {
                                view! {
                                    <a href=view.path() class=move || link_class(pathname() == view.path())>
                                        {view.title()}
                                    </a>
                                }
                            })
                            .collect_view()}
                    </nav>

                    <div class="space-y-1">
                        <div class="flex items-center justify-between px-2">
                            <span class="text-xs font-medium uppercase tracking-wide text-muted-foreground">"Lists"</span>
                            <Button
                                variant=ButtonVariant::Ghost
                                size=ButtonSize::IconSm
                                attr:title="New list"
                                on:click=move |_| actions.open_create.run(())
                            >
                                <Plus />
                            </Button>
                        </div>

                        <Show when=move || app_state.0.lists_error.get().is_some() fallback=|| ().into_view()>
                            {move || app_state.0.lists_error.get().map(|e| view! {
                                <div class="px-2 text-[11px] text-destructive">{e}</div>
                            })}
                        </Show>

                        <Show
                            when=move || !lists.with(Vec::is_empty)
                            fallback=move || view! {
                                <div class="px-2 text-xs text-muted-foreground">
                                    {move || if app_state.0.lists_loading.get() { "Loading..." } else { "No lists yet." }}
                                </div>
                            }
                        >
                            <div class="space-y-0.5" on:click=close_if_narrow>
                                <For
                                    each=move || sidebar_order(lists.get())
                                    key=|l| (l.id.clone(), l.name.clone(), l.bg_color.clone(), l.is_pinned)
                                    children=move |list| {
                                        let href = list_path(&list.id);
                                        let href_active = href.clone();
                                        view! {
                                            <a href=href class=move || link_class(pathname() == href_active)>
                                                <span
                                                    class="size-2.5 shrink-0 rounded-full border border-border"
                                                    style=format!("background-color: {}", list.bg_color)
                                                ></span>
                                                <span class="min-w-0 flex-1 truncate">{list.name.clone()}</span>
                                                <Show when=move || list.is_pinned fallback=|| ().into_view()>
                                                    <Star class="size-3 text-amber-500" />
                                                </Show>
                                            </a>
                                        }
                                    }
                                />
                            </div>
                        </Show>
                    </div>

                    <div class="mt-auto border-t border-border pt-3">
                        <button
                            type="button"
                            class="w-full rounded-md px-2 py-1.5 text-left text-xs text-destructive hover:bg-destructive/10"
                            on:click=move |_| actions.open_delete_account.run(())
                        >
                            "Delete account"
                        </button>
                    </div>
                </div>
            </aside>
        </Show>
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn list(id: &str, name: &str, pinned: bool) -> List {
        List {
            id: id.to_string(),
            name: name.to_string(),
            bg_color: String::new(),
            created_at: String::new(),
            is_default: false,
            is_pinned: pinned,
            user_id: "u1".to_string(),
        }
    }

    #[test]
    fn pinned_lists_come_first() {
        let ordered = sidebar_order(vec![
            list("1", "groceries", false),
            list("2", "Work", true),
            list("3", "Books", false),
        ]);
        let names: Vec<_> = ordered.iter().map(|l| l.name.as_str()).collect();
        assert_eq!(names, vec!["Work", "Books", "groceries"]);
    }
}

use icons::{LogOut, Menu, Moon, Sun};
use leptos::prelude::*;
use leptos::task::spawn_local;
use listit_core::routes::{ABOUT, DASHBOARD, LANDING, LOGIN, REGISTER};

use crate::components::ui::{Button, ButtonSize, ButtonVariant};
use crate::state::{AuthService, SidebarService, ThemeService};

const LINK_BUTTON: &str = "inline-flex h-8 items-center rounded-md bg-primary px-3 text-sm font-medium text-primary-foreground hover:bg-primary/90";

#[component]
fn ThemeToggle() -> impl IntoView {
    let theme = expect_context::<ThemeService>();

    view! {
        <Button
            variant=ButtonVariant::Ghost
            size=ButtonSize::Icon
            class="h-8 w-8"
            attr:title=move || if theme.is_dark() { "Light mode" } else { "Dark mode" }
            on:click=move |_| theme.toggle()
        >
            <Show when=move || theme.is_dark() fallback=|| view! { <Moon /> }>
                <Sun />
            </Show>
        </Button>
    }
}

/// Header of the signed-in shell.
#[component]
pub fn Navbar(#[prop(into)] title: Signal<String>) -> impl IntoView {
    let auth = expect_context::<AuthService>();
    let sidebar = expect_context::<SidebarService>();
    let signing_out: RwSignal<bool> = RwSignal::new(false);

    let user_label = move || auth.user.get().map(|u| u.label()).unwrap_or_default();

    let on_logout = move |_| {
        if signing_out.get_untracked() {
            return;
        }
        signing_out.set(true);
        spawn_local(async move {
            auth.logout().await;
        });
    };

    view! {
        <header class="sticky top-0 z-40 flex h-12 items-center justify-between gap-2 border-b border-border bg-background/95 px-3 backdrop-blur">
            <div class="flex min-w-0 items-center gap-2">
                <Button
                    variant=ButtonVariant::Ghost
                    size=ButtonSize::Icon
                    class="h-8 w-8"
                    attr:title="Toggle sidebar"
                    on:click=move |_| sidebar.toggle()
                >
                    <Menu />
                </Button>
                <div class="truncate text-sm font-medium">{move || title.get()}</div>
            </div>

            <div class="flex shrink-0 items-center gap-1">
                <span class="hidden max-w-[12rem] truncate text-xs text-muted-foreground sm:inline">
                    {user_label}
                </span>
                <ThemeToggle />
                <Button
                    variant=ButtonVariant::Ghost
                    size=ButtonSize::Icon
                    class="h-8 w-8"
                    attr:title="Log out"
                    attr:disabled=move || signing_out.get()
                    on:click=on_logout
                >
                    <LogOut />
                </Button>
            </div>
        </header>
    }
}

/// Header of the public pages.
#[component]
pub fn PublicNavbar() -> impl IntoView {
    let auth = expect_context::<AuthService>();

    view! {
        <header class="flex h-14 items-center justify-between border-b border-border px-4">
            <a href=LANDING class="text-sm font-semibold tracking-wide">"LIST IT"</a>
            <nav class="flex items-center gap-3 text-sm">
                <a href=ABOUT class="text-muted-foreground hover:text-foreground">"About us"</a>
                <Show
                    when=move || auth.is_logged_in.get()
                    fallback=|| view! {
                        <a href=LOGIN class="text-muted-foreground hover:text-foreground">"Log in"</a>
                        <a href=REGISTER class=LINK_BUTTON>"Sign up"</a>
                    }
                >
                    <a href=DASHBOARD class=LINK_BUTTON>"Dashboard"</a>
                </Show>
                <ThemeToggle />
            </nav>
        </header>
    }
}

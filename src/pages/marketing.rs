use leptos::prelude::*;
use listit_core::routes::{ABOUT, DASHBOARD, LOGIN, REGISTER};

use crate::components::navbar::PublicNavbar;
use crate::components::ui::{Card, CardContent, CardDescription, CardHeader, CardTitle};
use crate::state::AuthService;

const FEATURES: [(&str, &str); 4] = [
    ("Lists", "Group everything that belongs together, pin the ones you use most."),
    ("Collections", "Split a list into sections, each with its own tasks and notes."),
    ("Focused views", "Today, priority, completed and open tasks across every list."),
    ("Notes", "Keep the context next to the work, color coded and pinnable."),
];

#[component]
pub fn LandingPage() -> impl IntoView {
    let auth = expect_context::<AuthService>();

    view! {
        <div class="min-h-screen bg-background text-foreground">
            <PublicNavbar />
            <main class="mx-auto w-full max-w-5xl px-4 py-16">
                <section class="mx-auto max-w-2xl space-y-5 text-center">
                    <h1 class="text-4xl font-semibold tracking-tight sm:text-5xl">"LIST IT"</h1>
                    <p class="text-base text-muted-foreground">
                        "Lists, collections, tasks and notes in one calm place. Plan the day, mark what matters, finish it."
                    </p>
                    <div class="flex items-center justify-center gap-3">
                        <Show
                            when=move || auth.is_logged_in.get()
                            fallback=|| view! {
                                <a href=REGISTER class="inline-flex h-10 items-center rounded-md bg-primary px-6 text-sm font-medium text-primary-foreground hover:bg-primary/90">
                                    "Get started"
                                </a>
                                <a href=LOGIN class="inline-flex h-10 items-center rounded-md border border-border px-6 text-sm font-medium hover:bg-surface-hover">
                                    "Log in"
                                </a>
                            }
                        >
                            <a href=DASHBOARD class="inline-flex h-10 items-center rounded-md bg-primary px-6 text-sm font-medium text-primary-foreground hover:bg-primary/90">
                                "Open dashboard"
                            </a>
                        </Show>
                    </div>
                </section>

                <section class="mt-16 grid gap-4 sm:grid-cols-2">
                    {FEATURES
                        .into_iter()
                        .map(|(title, body)| view! {
                            <Card>
                                <CardHeader>
                                    <CardTitle class="text-base">{title}</CardTitle>
                                    <CardDescription>{body}</CardDescription>
                                </CardHeader>
                            </Card>
                        })
                        .collect_view()}
                </section>

                <p class="mt-12 text-center text-xs text-muted-foreground">
                    <a href=ABOUT class="underline underline-offset-4">"Who builds LIST IT?"</a>
                </p>
            </main>
        </div>
    }
}

#[component]
pub fn AboutPage() -> impl IntoView {
    view! {
        <div class="min-h-screen bg-background text-foreground">
            <PublicNavbar />
            <main class="mx-auto w-full max-w-2xl space-y-6 px-4 py-16">
                <h1 class="text-3xl font-semibold tracking-tight">"About us"</h1>
                <Card>
                    <CardContent class="space-y-3 text-sm leading-relaxed text-muted-foreground">
                        <p>
                            "LIST IT started as a small tool for keeping groceries, chores and project work apart without juggling three apps."
                        </p>
                        <p>
                            "Every list holds collections, and every collection holds tasks and notes. Due dates feed the Today view, stars feed the Priority view, and nothing else gets in the way."
                        </p>
                        <p>"Your data stays in your account. Deleting the account removes all of it."</p>
                    </CardContent>
                </Card>
                <a href=REGISTER class="inline-flex h-9 items-center rounded-md bg-primary px-4 text-sm font-medium text-primary-foreground hover:bg-primary/90">
                    "Create an account"
                </a>
            </main>
        </div>
    }
}

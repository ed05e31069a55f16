use leptos::prelude::*;
use leptos_ui::clx;

mod components {
    use super::*;
    clx! {Alert, div, "relative w-full rounded-lg border px-4 py-3 text-sm"}
    clx! {AlertDescription, p, "text-sm [&_p]:leading-relaxed"}
}

pub use components::*;

/// Inline error line for forms and popups; renders nothing while `error` is `None`.
#[component]
pub fn FormError(#[prop(into)] error: Signal<Option<String>>) -> impl IntoView {
    view! {
        <Show when=move || error.get().is_some() fallback=|| ().into_view()>
            {move || error.get().map(|e| view! {
                <Alert class="border-destructive/30" attr:role="alert">
                    <AlertDescription class="text-destructive text-xs">{e}</AlertDescription>
                </Alert>
            })}
        </Show>
    }
}

/// Confirmation banner, e.g. after a reset email was sent.
#[component]
pub fn FormNotice(#[prop(into)] notice: Signal<Option<String>>) -> impl IntoView {
    view! {
        <Show when=move || notice.get().is_some() fallback=|| ().into_view()>
            {move || notice.get().map(|n| view! {
                <Alert class="border-emerald-500/30" attr:role="status">
                    <AlertDescription class="text-emerald-700 dark:text-emerald-400 text-xs">{n}</AlertDescription>
                </Alert>
            })}
        </Show>
    }
}

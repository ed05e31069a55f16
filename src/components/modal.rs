use leptos::prelude::*;

use crate::components::ui::{BusyLabel, Button, ButtonSize, ButtonVariant};

/// Centered overlay used by every popup. Renders nothing while closed.
#[component]
pub fn Modal(
    #[prop(into)] open: Signal<bool>,
    #[prop(into)] title: Signal<String>,
    #[prop(optional)] description: Option<&'static str>,
    #[prop(optional)] destructive: bool,
    children: ChildrenFn,
) -> impl IntoView {
    let children = StoredValue::new(children);
    let title_class = if destructive {
        "text-sm font-medium text-destructive"
    } else {
        "text-sm font-medium"
    };

    view! {
        <Show when=move || open.get() fallback=|| ().into_view()>
            <div
                class="fixed inset-0 z-50 flex items-center justify-center bg-black/30 px-4"
                role="dialog"
                aria-modal="true"
            >
                <div class="w-full max-w-sm rounded-md border border-border bg-background p-4 shadow-lg">
                    <div class="mb-3 space-y-1">
                        <div class=title_class>{move || title.get()}</div>
                        {description.map(|d| view! {
                            <div class="text-xs text-muted-foreground">{d}</div>
                        })}
                    </div>
                    <div class="space-y-2">{move || children.with_value(|c| c())}</div>
                </div>
            </div>
        </Show>
    }
}

/// Cancel + submit row at the bottom of a popup.
#[component]
pub fn ModalActions(
    #[prop(into)] busy: Signal<bool>,
    on_cancel: Callback<()>,
    on_submit: Callback<()>,
    idle: &'static str,
    working: &'static str,
    #[prop(optional)] destructive: bool,
    /// Extra condition that keeps submit disabled, e.g. an unconfirmed delete.
    #[prop(optional, into)]
    blocked: Option<Signal<bool>>,
) -> impl IntoView {
    let submit_disabled = move || busy.get() || blocked.is_some_and(|b| b.get());

    view! {
        <div class="flex items-center justify-end gap-2 pt-2">
            <Button
                variant=ButtonVariant::Outline
                size=ButtonSize::Sm
                attr:disabled=move || busy.get()
                on:click=move |_| on_cancel.run(())
            >
                "Cancel"
            </Button>
            <Button
                variant=if destructive { ButtonVariant::Destructive } else { ButtonVariant::Default }
                size=ButtonSize::Sm
                attr:disabled=submit_disabled
                on:click=move |_| on_submit.run(())
            >
                <BusyLabel busy=busy idle=idle working=working />
            </Button>
        </div>
    }
}

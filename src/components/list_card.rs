use icons::{Pencil, Star};
use leptos::prelude::*;
use listit_core::models::List;
use listit_core::routes::list_path;

use crate::components::ui::{Button, ButtonSize, ButtonVariant};

#[component]
pub fn ListCard(list: List, on_edit: Callback<List>, on_toggle_pin: Callback<List>) -> impl IntoView {
    let href = list_path(&list.id);
    let pinned = list.is_pinned;
    let edit_target = list.clone();
    let pin_target = list.clone();

    view! {
        <div
            class="group relative flex h-28 flex-col justify-between rounded-lg border border-border p-4 shadow-xs transition-shadow hover:shadow-md"
            style=format!("background-color: {}", list.bg_color)
        >
            <a href=href class="absolute inset-0 rounded-lg" aria-label=list.name.clone()></a>
            <div class="flex items-start justify-between gap-2">
                <div class="min-w-0 truncate text-sm font-medium text-zinc-900">{list.name.clone()}</div>
                <div class="relative z-10 flex items-center gap-0.5">
                    <Button
                        variant=ButtonVariant::Ghost
                        size=ButtonSize::IconSm
                        class="text-zinc-700 opacity-0 group-hover:opacity-100"
                        attr:title="Edit list"
                        on:click=move |_| on_edit.run(edit_target.clone())
                    >
                        <Pencil />
                    </Button>
                    <Button
                        variant=ButtonVariant::Ghost
                        size=ButtonSize::IconSm
                        class=if pinned { "text-amber-500" } else { "text-zinc-700 opacity-0 group-hover:opacity-100" }
                        attr:title=if pinned { "Unpin" } else { "Pin" }
                        on:click=move |_| on_toggle_pin.run(pin_target.clone())
                    >
                        <Star />
                    </Button>
                </div>
            </div>
            <Show when=move || list.is_default fallback=|| ().into_view()>
                <span class="w-fit rounded bg-black/5 px-1.5 py-0.5 text-[10px] text-zinc-700">"Default"</span>
            </Show>
        </div>
    }
}

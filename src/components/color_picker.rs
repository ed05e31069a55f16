use leptos::prelude::*;
use listit_core::models::BG_PALETTE;

fn swatch_class(selected: bool) -> &'static str {
    if selected {
        "size-7 rounded-full border-2 border-foreground shadow-sm"
    } else {
        "size-7 rounded-full border border-border hover:scale-110 transition-transform"
    }
}

/// Background color choice for lists, collections and notes.
#[component]
pub fn ColorPicker(selected: RwSignal<String>) -> impl IntoView {
    view! {
        <div class="flex flex-wrap gap-2" role="radiogroup" aria-label="Background color">
            {BG_PALETTE
                .iter()
                .map(|&color| {
                    let is_selected = move || selected.with(|c| c.eq_ignore_ascii_case(color));
                    view! {
                        <button
                            type="button"
                            role="radio"
                            class=move || swatch_class(is_selected())
                            style=format!("background-color: {color}")
                            title=color
                            aria-checked=move || is_selected().to_string()
                            on:click=move |_| selected.set(color.to_string())
                        ></button>
                    }
                })
                .collect_view()}
        </div>
    }
}

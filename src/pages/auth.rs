//! Login, registration and the email-link pages.

use gloo_timers::future::TimeoutFuture;
use leptos::prelude::*;
use leptos::task::spawn_local;
use leptos_router::hooks::{use_navigate, use_query_map};
use listit_core::gotrue::OtpType;
use listit_core::routes::{DASHBOARD, FORGOT_PASSWORD, LANDING, LOGIN, REGISTER, VERIFICATION};
use listit_core::validation::{parse_wait_seconds, validate_new_password};

use crate::components::ui::{
    BusyLabel, Button, ButtonSize, ButtonVariant, Card, CardContent, CardDescription, CardHeader,
    CardTitle, FormError, FormNotice, Input, Label,
};
use crate::state::{parse_fragment, AuthService};

/// Seconds before another reset email may be requested.
const RESEND_COOLDOWN_SECS: u32 = 60;

#[component]
fn AuthShell(
    title: &'static str,
    description: &'static str,
    children: Children,
) -> impl IntoView {
    view! {
        <div class="min-h-screen bg-background">
            <div class="mx-auto flex min-h-screen w-full max-w-sm flex-col justify-center px-4 py-10">
                <div class="mb-6 flex items-center justify-center">
                    <a href=LANDING class="text-sm font-semibold tracking-wide text-foreground">"LIST IT"</a>
                </div>

                <Card>
                    <CardHeader>
                        <CardTitle class="text-lg">{title}</CardTitle>
                        <CardDescription class="text-xs">{description}</CardDescription>
                    </CardHeader>
                    <CardContent>{children()}</CardContent>
                </Card>
            </div>
        </div>
    }
}

fn query_value(key: &'static str) -> impl Fn() -> Option<String> + Copy {
    let query = use_query_map();
    move || query.with(|q| q.get(key)).filter(|v| !v.is_empty())
}

#[component]
pub fn LoginPage() -> impl IntoView {
    let auth = expect_context::<AuthService>();

    let email: RwSignal<String> = RwSignal::new(String::new());
    let password: RwSignal<String> = RwSignal::new(String::new());
    let error: RwSignal<Option<String>> = RwSignal::new(None);
    let loading: RwSignal<bool> = RwSignal::new(false);

    // Set by the OAuth callback when the code exchange fails.
    let callback_error = query_value("error");
    Effect::new(move |_| {
        if let Some(e) = callback_error() {
            error.set(Some(e));
        }
    });
    let logged_out = query_value("logout");
    let notice = Signal::derive(move || {
        logged_out()
            .is_some()
            .then(|| "You have been signed out.".to_string())
    });

    let on_submit = move |ev: web_sys::SubmitEvent| {
        ev.prevent_default();
        if loading.get_untracked() {
            return;
        }

        let email_val = email.get_untracked();
        let password_val = password.get_untracked();
        loading.set(true);
        error.set(None);

        spawn_local(async move {
            let outcome = auth.login(email_val, password_val).await;
            if !outcome.success {
                error.set(outcome.error);
            }
            loading.set(false);
        });
    };

    let oauth = move |result: Result<(), String>| {
        if let Err(e) = result {
            error.set(Some(e));
        }
    };

    view! {
        <AuthShell title="Log in" description="Use your email and password to continue.">
            <div class="flex flex-col gap-3">
                <form class="flex flex-col gap-3" on:submit=on_submit>
                    <FormNotice notice=notice />

                    <div class="flex flex-col gap-1.5">
                        <Label html_for="email" class="text-xs">"Email"</Label>
                        <Input
                            id="email"
                            r#type="email"
                            placeholder="you@example.com"
                            autocomplete="email"
                            bind_value=email
                            required=true
                            class="h-8 text-sm"
                        />
                    </div>

                    <div class="flex flex-col gap-1.5">
                        <div class="flex items-center justify-between">
                            <Label html_for="password" class="text-xs">"Password"</Label>
                            <a class="text-xs text-muted-foreground hover:underline" href=FORGOT_PASSWORD>
                                "Forgot password?"
                            </a>
                        </div>
                        <Input
                            id="password"
                            r#type="password"
                            placeholder="••••••••"
                            autocomplete="current-password"
                            bind_value=password
                            required=true
                            class="h-8 text-sm"
                        />
                    </div>

                    <FormError error=error />

                    <Button class="w-full" size=ButtonSize::Sm attr:disabled=move || loading.get()>
                        <BusyLabel busy=loading idle="Continue" working="Signing in..." />
                    </Button>
                </form>

                <div class="flex items-center gap-2 py-1 text-[11px] text-muted-foreground">
                    <span class="h-px flex-1 bg-border"></span>
                    "or"
                    <span class="h-px flex-1 bg-border"></span>
                </div>

                <Button
                    variant=ButtonVariant::Outline
                    size=ButtonSize::Sm
                    class="w-full"
                    on:click=move |_| oauth(auth.login_with_google())
                >
                    "Continue with Google"
                </Button>
                <Button
                    variant=ButtonVariant::Outline
                    size=ButtonSize::Sm
                    class="w-full"
                    on:click=move |_| oauth(auth.login_with_apple())
                >
                    "Continue with Apple"
                </Button>

                <div class="pt-1 text-xs text-muted-foreground">
                    "No account? "
                    <a class="text-primary underline underline-offset-4" href=REGISTER>"Sign up"</a>
                </div>
            </div>
        </AuthShell>
    }
}

#[component]
pub fn RegisterPage() -> impl IntoView {
    let auth = expect_context::<AuthService>();
    let navigate = StoredValue::new(use_navigate());

    let display_name: RwSignal<String> = RwSignal::new(String::new());
    let email: RwSignal<String> = RwSignal::new(String::new());
    let password: RwSignal<String> = RwSignal::new(String::new());
    let confirm: RwSignal<String> = RwSignal::new(String::new());
    let error: RwSignal<Option<String>> = RwSignal::new(None);
    let loading: RwSignal<bool> = RwSignal::new(false);

    let on_submit = move |ev: web_sys::SubmitEvent| {
        ev.prevent_default();
        if loading.get_untracked() {
            return;
        }

        let password_val = password.get_untracked();
        if let Err(e) = validate_new_password(&password_val, &confirm.get_untracked()) {
            error.set(Some(e.to_string()));
            return;
        }
        let email_val = email.get_untracked();
        let name_val = display_name.get_untracked();
        loading.set(true);
        error.set(None);

        spawn_local(async move {
            match auth.register(email_val.clone(), password_val, name_val).await {
                Ok(true) => {
                    let next = format!("{VERIFICATION}?email={}", urlencoding::encode(email_val.trim()));
                    navigate.with_value(|nav| nav(&next, Default::default()));
                }
                Ok(false) => {
                    let _ = window().location().set_href(DASHBOARD);
                }
                Err(e) => error.set(Some(e)),
            }
            loading.set(false);
        });
    };

    view! {
        <AuthShell title="Create account" description="Start organizing with LIST IT.">
            <form class="flex flex-col gap-3" on:submit=on_submit>
                <div class="flex flex-col gap-1.5">
                    <Label html_for="display-name" class="text-xs">"Name"</Label>
                    <Input
                        id="display-name"
                        placeholder="Your name"
                        autocomplete="name"
                        bind_value=display_name
                        class="h-8 text-sm"
                    />
                </div>
                <div class="flex flex-col gap-1.5">
                    <Label html_for="email" class="text-xs">"Email"</Label>
                    <Input
                        id="email"
                        r#type="email"
                        placeholder="you@example.com"
                        autocomplete="email"
                        bind_value=email
                        required=true
                        class="h-8 text-sm"
                    />
                </div>
                <div class="flex flex-col gap-1.5">
                    <Label html_for="password" class="text-xs">"Password"</Label>
                    <Input
                        id="password"
                        r#type="password"
                        autocomplete="new-password"
                        bind_value=password
                        required=true
                        class="h-8 text-sm"
                    />
                </div>
                <div class="flex flex-col gap-1.5">
                    <Label html_for="confirm-password" class="text-xs">"Confirm password"</Label>
                    <Input
                        id="confirm-password"
                        r#type="password"
                        autocomplete="new-password"
                        bind_value=confirm
                        required=true
                        class="h-8 text-sm"
                    />
                </div>

                <FormError error=error />

                <Button class="w-full" size=ButtonSize::Sm attr:disabled=move || loading.get()>
                    <BusyLabel busy=loading idle="Create account" working="Creating..." />
                </Button>

                <div class="pt-1 text-xs text-muted-foreground">
                    "Already have an account? "
                    <a class="text-primary underline underline-offset-4" href=LOGIN>"Log in"</a>
                </div>
            </form>
        </AuthShell>
    }
}

/// Count `cooldown` down to zero, one second at a time. Stops early when the
/// page that owns the signal is gone.
fn start_cooldown(cooldown: RwSignal<u32>, seconds: u32) {
    if seconds == 0 || cooldown.get_untracked() > 0 {
        cooldown.set(cooldown.get_untracked().max(seconds));
        return;
    }
    cooldown.set(seconds);
    spawn_local(async move {
        loop {
            TimeoutFuture::new(1_000).await;
            let remaining = cooldown.try_update(|s| {
                *s = s.saturating_sub(1);
                *s
            });
            if !matches!(remaining, Some(s) if s > 0) {
                break;
            }
        }
    });
}

#[component]
pub fn ForgotPasswordPage() -> impl IntoView {
    let auth = expect_context::<AuthService>();

    let email: RwSignal<String> = RwSignal::new(String::new());
    let error: RwSignal<Option<String>> = RwSignal::new(None);
    let notice: RwSignal<Option<String>> = RwSignal::new(None);
    let loading: RwSignal<bool> = RwSignal::new(false);
    let cooldown: RwSignal<u32> = RwSignal::new(0);

    let on_submit = move |ev: web_sys::SubmitEvent| {
        ev.prevent_default();
        if loading.get_untracked() || cooldown.get_untracked() > 0 {
            return;
        }

        let email_val = email.get_untracked();
        loading.set(true);
        error.set(None);
        notice.set(None);

        spawn_local(async move {
            let outcome = auth.reset_password(email_val).await;
            if outcome.success {
                notice.set(Some(
                    "If an account exists for that address, a reset link is on its way.".to_string(),
                ));
                start_cooldown(cooldown, RESEND_COOLDOWN_SECS);
            } else {
                let message = outcome.error.unwrap_or_default();
                if let Some(wait) = parse_wait_seconds(&message) {
                    start_cooldown(cooldown, wait);
                }
                error.set(Some(message));
            }
            loading.set(false);
        });
    };

    let button_label = move || match cooldown.get() {
        0 if loading.get() => "Sending...".to_string(),
        0 => "Send reset link".to_string(),
        s => format!("Try again in {s}s"),
    };

    view! {
        <AuthShell title="Reset password" description="We will email you a link to choose a new password.">
            <form class="flex flex-col gap-3" on:submit=on_submit>
                <div class="flex flex-col gap-1.5">
                    <Label html_for="email" class="text-xs">"Email"</Label>
                    <Input
                        id="email"
                        r#type="email"
                        placeholder="you@example.com"
                        autocomplete="email"
                        bind_value=email
                        required=true
                        class="h-8 text-sm"
                    />
                </div>

                <FormNotice notice=notice />
                <FormError error=error />

                <Button
                    class="w-full"
                    size=ButtonSize::Sm
                    attr:disabled=move || { loading.get() || cooldown.get() > 0 }
                >
                    {button_label}
                </Button>

                <div class="pt-1 text-xs text-muted-foreground">
                    <a class="text-primary underline underline-offset-4" href=LOGIN>"Back to login"</a>
                </div>
            </form>
        </AuthShell>
    }
}

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
enum LinkState {
    Checking,
    Ready,
    Invalid,
    Done,
}

fn location_hash() -> String {
    window().location().hash().unwrap_or_default()
}

/// Tokens in the fragment are single use; drop them from the address bar.
fn clear_hash() {
    let _ = window().location().set_hash("");
}

#[component]
pub fn ResetPasswordPage() -> impl IntoView {
    let auth = expect_context::<AuthService>();

    let password: RwSignal<String> = RwSignal::new(String::new());
    let confirm: RwSignal<String> = RwSignal::new(String::new());
    let error: RwSignal<Option<String>> = RwSignal::new(None);
    let loading: RwSignal<bool> = RwSignal::new(false);
    let state: RwSignal<LinkState> = RwSignal::new(LinkState::Checking);

    let link_error = query_value("error_description");
    match parse_fragment(&location_hash()) {
        Some(tokens) => spawn_local(async move {
            let outcome = auth.adopt_fragment(tokens).await;
            clear_hash();
            if outcome.success {
                state.set(LinkState::Ready);
            } else {
                error.set(outcome.error);
                state.set(LinkState::Invalid);
            }
        }),
        None if auth.is_logged_in.get_untracked() => state.set(LinkState::Ready),
        None => {
            error.set(Some(
                link_error().unwrap_or_else(|| "This reset link is invalid or has expired.".to_string()),
            ));
            state.set(LinkState::Invalid);
        }
    }

    let on_submit = move |ev: web_sys::SubmitEvent| {
        ev.prevent_default();
        if loading.get_untracked() {
            return;
        }
        let password_val = password.get_untracked();
        let confirm_val = confirm.get_untracked();
        loading.set(true);
        error.set(None);

        spawn_local(async move {
            let outcome = auth.update_password(password_val, confirm_val).await;
            if outcome.success {
                state.set(LinkState::Done);
            } else {
                error.set(outcome.error);
            }
            loading.set(false);
        });
    };

    view! {
        <AuthShell title="Choose a new password" description="Pick something you have not used before.">
            {move || match state.get() {
                LinkState::Checking => view! {
                    <div class="text-xs text-muted-foreground">"Checking your link..."</div>
                }
                .into_any(),
                LinkState::Invalid => view! {
                    <div class="flex flex-col gap-3">
                        <FormError error=error />
                        <a class="text-xs text-primary underline underline-offset-4" href=FORGOT_PASSWORD>
                            "Request a new link"
                        </a>
                    </div>
                }
                .into_any(),
                LinkState::Done => view! {
                    <div class="flex flex-col gap-3">
                        <FormNotice notice=Signal::derive(|| Some("Your password has been updated.".to_string())) />
                        <a class="text-xs text-primary underline underline-offset-4" href=DASHBOARD>
                            "Go to your dashboard"
                        </a>
                    </div>
                }
                .into_any(),
                LinkState::Ready => view! {
                    <form class="flex flex-col gap-3" on:submit=on_submit>
                        <div class="flex flex-col gap-1.5">
                            <Label html_for="password" class="text-xs">"New password"</Label>
                            <Input
                                id="password"
                                r#type="password"
                                autocomplete="new-password"
                                bind_value=password
                                required=true
                                class="h-8 text-sm"
                            />
                        </div>
                        <div class="flex flex-col gap-1.5">
                            <Label html_for="confirm-password" class="text-xs">"Confirm password"</Label>
                            <Input
                                id="confirm-password"
                                r#type="password"
                                autocomplete="new-password"
                                bind_value=confirm
                                required=true
                                class="h-8 text-sm"
                            />
                        </div>

                        <FormError error=error />

                        <Button class="w-full" size=ButtonSize::Sm attr:disabled=move || loading.get()>
                            <BusyLabel busy=loading idle="Update password" working="Updating..." />
                        </Button>
                    </form>
                }
                .into_any(),
            }}
        </AuthShell>
    }
}

#[component]
pub fn VerificationPage() -> impl IntoView {
    let auth = expect_context::<AuthService>();

    let error: RwSignal<Option<String>> = RwSignal::new(None);
    let state: RwSignal<LinkState> = RwSignal::new(LinkState::Checking);

    let token_hash = query_value("token_hash");
    let kind = query_value("type");
    let link_error = query_value("error_description");
    let pending_email = query_value("email");

    let finish = move |success: bool, message: Option<String>| {
        if success {
            state.set(LinkState::Done);
        } else {
            error.set(message);
            state.set(LinkState::Invalid);
        }
    };

    if let Some(message) = link_error() {
        finish(false, Some(message));
    } else if let Some(hash) = token_hash() {
        let kind = kind()
            .and_then(|k| k.parse::<OtpType>().ok())
            .unwrap_or(OtpType::Email);
        spawn_local(async move {
            let outcome = auth.verify_otp(hash, kind).await;
            finish(outcome.success, outcome.error);
        });
    } else if let Some(tokens) = parse_fragment(&location_hash()) {
        spawn_local(async move {
            let outcome = auth.adopt_fragment(tokens).await;
            clear_hash();
            finish(outcome.success, outcome.error);
        });
    } else {
        // Arrived straight after sign-up: nothing to verify yet.
        state.set(LinkState::Ready);
    }

    view! {
        <AuthShell title="Verify your email" description="Confirm your address to finish setting up LIST IT.">
            {move || match state.get() {
                LinkState::Checking => view! {
                    <div class="text-xs text-muted-foreground">"Verifying..."</div>
                }
                .into_any(),
                LinkState::Ready => view! {
                    <div class="space-y-2 text-sm text-muted-foreground">
                        <p>
                            {move || match pending_email() {
                                Some(email) => format!("We sent a confirmation link to {email}."),
                                None => "We sent you a confirmation link.".to_string(),
                            }}
                        </p>
                        <p class="text-xs">"Open it on this device to sign in."</p>
                    </div>
                }
                .into_any(),
                LinkState::Done => view! {
                    <div class="flex flex-col gap-3">
                        <FormNotice notice=Signal::derive(|| Some("Your email is verified.".to_string())) />
                        <a class="text-xs text-primary underline underline-offset-4" href=DASHBOARD>
                            "Go to your dashboard"
                        </a>
                    </div>
                }
                .into_any(),
                LinkState::Invalid => view! {
                    <div class="flex flex-col gap-3">
                        <FormError error=error />
                        <a class="text-xs text-primary underline underline-offset-4" href=LOGIN>
                            "Back to login"
                        </a>
                    </div>
                }
                .into_any(),
            }}
        </AuthShell>
    }
}

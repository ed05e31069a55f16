use crate::pages::{
    AboutPage, AuthOnly, DashboardPage, ForgotPasswordPage, LandingPage, ListViewPage, LoginPage,
    RegisterPage, ResetPasswordPage, RootAuthed, TaskViewPage, VerificationPage,
};
use crate::state::{AppContext, AppState, AuthService, SidebarService, ThemeService};
use leptos::prelude::*;
use leptos_router::components::{Route, Router, Routes};
use leptos_router::path;
use listit_core::tasks::TaskView;

#[component]
pub fn App() -> impl IntoView {
    let app_state = AppState::new();
    provide_context(AppContext(app_state));

    let auth = AuthService::new(app_state.api_client);
    provide_context(auth);
    auth.init();

    let theme = ThemeService::new();
    provide_context(theme);
    theme.init();

    provide_context(SidebarService::new());

    // Paths are case-sensitive and must match `listit_core::routes`, which
    // the server middleware guards with the same names.
    view! {
        <Router>
            <Routes fallback=|| view! { <div class="px-4 py-8 text-xs text-muted-foreground">"Not found"</div> }>
                <Route path=path!("") view=LandingPage />
                <Route path=path!("landingpage") view=LandingPage />
                <Route path=path!("aboutus") view=AboutPage />
                <Route path=path!("login") view=move || view! {
                    <AuthOnly>
                        <LoginPage />
                    </AuthOnly>
                } />
                <Route path=path!("register") view=move || view! {
                    <AuthOnly>
                        <RegisterPage />
                    </AuthOnly>
                } />
                <Route path=path!("forgotPassword") view=ForgotPasswordPage />
                <Route path=path!("resetPassword") view=ResetPasswordPage />
                <Route path=path!("verification") view=VerificationPage />
                <Route path=path!("dashboard") view=move || view! {
                    <RootAuthed>
                        <DashboardPage />
                    </RootAuthed>
                } />
                <Route path=path!("List/:id") view=move || view! {
                    <RootAuthed>
                        <ListViewPage />
                    </RootAuthed>
                } />
                <Route path=path!("today") view=move || view! {
                    <RootAuthed>
                        <TaskViewPage task_view=TaskView::Today />
                    </RootAuthed>
                } />
                <Route path=path!("priority") view=move || view! {
                    <RootAuthed>
                        <TaskViewPage task_view=TaskView::Priority />
                    </RootAuthed>
                } />
                <Route path=path!("completed") view=move || view! {
                    <RootAuthed>
                        <TaskViewPage task_view=TaskView::Completed />
                    </RootAuthed>
                } />
                <Route path=path!("notcomplete") view=move || view! {
                    <RootAuthed>
                        <TaskViewPage task_view=TaskView::NotComplete />
                    </RootAuthed>
                } />
            </Routes>
        </Router>
    }
}

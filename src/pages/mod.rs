mod auth;
mod dashboard;
mod guard;
mod list_view;
mod marketing;
mod task_views;

pub use auth::{
    ForgotPasswordPage, LoginPage, RegisterPage, ResetPasswordPage, VerificationPage,
};
pub use dashboard::DashboardPage;
pub use guard::{AppLayout, AuthOnly, RootAuthed};
pub use list_view::ListViewPage;
pub use marketing::{AboutPage, LandingPage};
pub use task_views::TaskViewPage;

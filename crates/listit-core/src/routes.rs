//! Route table and the redirect policy applied on every navigation.
//!
//! The server middleware runs [`classify`] and [`decide`] per request; the
//! frontend guard runs the same two steps on client-side navigation so the
//! behavior does not depend on whether the router or the server saw the URL.

pub const HOME: &str = "/";
pub const LANDING: &str = "/landingpage";
pub const ABOUT: &str = "/aboutus";
pub const LOGIN: &str = "/login";
pub const REGISTER: &str = "/register";
pub const FORGOT_PASSWORD: &str = "/forgotPassword";
pub const RESET_PASSWORD: &str = "/resetPassword";
pub const VERIFICATION: &str = "/verification";
pub const DASHBOARD: &str = "/dashboard";
pub const LIST_PREFIX: &str = "/List";
pub const TODAY: &str = "/today";
pub const PRIORITY: &str = "/priority";
pub const COMPLETED: &str = "/completed";
pub const NOT_COMPLETE: &str = "/notcomplete";
pub const AUTH_CALLBACK: &str = "/auth/callback";
pub const DELETE_ACCOUNT_API: &str = "/api/delete-account";

/// Where a logout lands; the middleware strips cookies for this exact request.
pub const LOGOUT_REDIRECT: &str = "/login?logout=true";

const PROTECTED: &[&str] = &[DASHBOARD, LIST_PREFIX, TODAY, PRIORITY, COMPLETED, NOT_COMPLETE];
const AUTH_ONLY: &[&str] = &[LOGIN, REGISTER];
const SKIPPED_PREFIXES: &[&str] = &["/api/", "/pkg/", "/assets/", "/static/", "/_next/"];

pub fn list_path(list_id: &str) -> String {
    format!("{LIST_PREFIX}/{}", urlencoding::encode(list_id))
}

fn matches_route(path: &str, route: &str) -> bool {
    path == route
        || path
            .strip_prefix(route)
            .is_some_and(|rest| rest.starts_with('/'))
}

pub fn is_protected(path: &str) -> bool {
    PROTECTED.iter().any(|r| matches_route(path, r))
}

pub fn is_auth_route(path: &str) -> bool {
    AUTH_ONLY.iter().any(|r| matches_route(path, r))
}

/// Assets, API and the OAuth callback bypass the session policy entirely.
pub fn is_skipped(path: &str) -> bool {
    if path == "/api" || SKIPPED_PREFIXES.iter().any(|p| path.starts_with(p)) {
        return true;
    }
    if matches_route(path, AUTH_CALLBACK) {
        return true;
    }
    // Files such as /favicon.ico or /listit_bg.wasm.
    path.rsplit('/')
        .next()
        .is_some_and(|last| last.contains('.'))
}

pub fn is_logout_request(path: &str, query: Option<&str>) -> bool {
    path == LOGIN
        && query.is_some_and(|q| {
            q.split('&')
                .any(|pair| pair == "logout=true" || pair == "logout=1")
        })
}

/// Path component of a `Referer` header value.
pub fn referer_path(referer: &str) -> &str {
    let without_scheme = referer
        .split_once("://")
        .map_or(referer, |(_, rest)| rest);
    let path_start = if referer.contains("://") {
        without_scheme.find('/').map_or("/", |i| &without_scheme[i..])
    } else {
        without_scheme
    };
    path_start
        .split(['?', '#'])
        .next()
        .filter(|p| !p.is_empty())
        .unwrap_or("/")
}

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum RouteClass {
    Logout,
    Skipped,
    Protected,
    AuthOnly,
    Public,
}

pub fn classify(path: &str, query: Option<&str>) -> RouteClass {
    if is_logout_request(path, query) {
        RouteClass::Logout
    } else if is_skipped(path) {
        RouteClass::Skipped
    } else if is_protected(path) {
        RouteClass::Protected
    } else if is_auth_route(path) {
        RouteClass::AuthOnly
    } else {
        RouteClass::Public
    }
}

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum SessionState {
    Active,
    Missing,
    /// Session lookup raised an error (malformed cookie, failed refresh).
    Failed,
}

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum RouteDecision {
    /// Serve the request untouched.
    PassThrough,
    /// Serve the request with every auth cookie expired.
    ClearCookies,
    Redirect {
        location: &'static str,
        clear_cookies: bool,
    },
    /// Serve the request and refresh the session mirror cookies.
    Continue { logged_in: bool },
}

/// Decide what to do with a navigation.
///
/// `referer` is the raw `Referer` header (or the previous client-side path);
/// an authenticated visit to an auth-only page only redirects when it came
/// from a different page.
pub fn decide(
    class: RouteClass,
    path: &str,
    session: SessionState,
    referer: Option<&str>,
) -> RouteDecision {
    match class {
        RouteClass::Logout => RouteDecision::ClearCookies,
        RouteClass::Skipped => RouteDecision::PassThrough,
        _ => match session {
            SessionState::Failed if class == RouteClass::Protected => RouteDecision::Redirect {
                location: LOGIN,
                clear_cookies: true,
            },
            SessionState::Failed => RouteDecision::ClearCookies,
            SessionState::Missing if class == RouteClass::Protected => RouteDecision::Redirect {
                location: LOGIN,
                clear_cookies: false,
            },
            SessionState::Missing => RouteDecision::Continue { logged_in: false },
            SessionState::Active
                if class == RouteClass::AuthOnly
                    && referer.map(referer_path) != Some(path) =>
            {
                RouteDecision::Redirect {
                    location: DASHBOARD,
                    clear_cookies: false,
                }
            }
            SessionState::Active => RouteDecision::Continue { logged_in: true },
        },
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn route(path: &str, session: SessionState, referer: Option<&str>) -> RouteDecision {
        let (path, query) = path.split_once('?').map_or((path, None), |(p, q)| (p, Some(q)));
        decide(classify(path, query), path, session, referer)
    }

    #[test]
    fn unauthenticated_dashboard_redirects_to_login() {
        assert_eq!(
            route("/dashboard", SessionState::Missing, None),
            RouteDecision::Redirect {
                location: LOGIN,
                clear_cookies: false
            }
        );
    }

    #[test]
    fn list_pages_are_protected() {
        assert!(is_protected("/List/abc"));
        assert!(is_protected("/List"));
        assert!(!is_protected("/Listing"));
        assert!(!is_protected("/landingpage"));
    }

    #[test]
    fn authenticated_login_with_other_referer_goes_to_dashboard() {
        assert_eq!(
            route(
                "/login",
                SessionState::Active,
                Some("https://listit.app/aboutus")
            ),
            RouteDecision::Redirect {
                location: DASHBOARD,
                clear_cookies: false
            }
        );
    }

    #[test]
    fn authenticated_login_without_referer_redirects() {
        assert!(matches!(
            route("/register", SessionState::Active, None),
            RouteDecision::Redirect {
                location: DASHBOARD,
                ..
            }
        ));
    }

    #[test]
    fn authenticated_login_from_itself_stays() {
        assert_eq!(
            route(
                "/login",
                SessionState::Active,
                Some("https://listit.app/login?x=1")
            ),
            RouteDecision::Continue { logged_in: true }
        );
    }

    #[test]
    fn api_and_asset_paths_pass_through() {
        for p in [
            "/api/delete-account",
            "/_next/static/chunk.js",
            "/pkg/listit_bg.wasm",
            "/favicon.ico",
            "/auth/callback",
        ] {
            assert_eq!(
                route(p, SessionState::Missing, None),
                RouteDecision::PassThrough,
                "{p}"
            );
        }
    }

    #[test]
    fn logout_request_clears_cookies_even_with_session() {
        assert_eq!(
            route("/login?logout=true", SessionState::Active, None),
            RouteDecision::ClearCookies
        );
    }

    #[test]
    fn failed_session_on_protected_route_redirects_and_clears() {
        assert_eq!(
            route("/today", SessionState::Failed, None),
            RouteDecision::Redirect {
                location: LOGIN,
                clear_cookies: true
            }
        );
        assert_eq!(
            route("/aboutus", SessionState::Failed, None),
            RouteDecision::ClearCookies
        );
    }

    #[test]
    fn public_pages_mirror_session_state() {
        assert_eq!(
            route("/", SessionState::Active, None),
            RouteDecision::Continue { logged_in: true }
        );
        assert_eq!(
            route("/aboutus", SessionState::Missing, None),
            RouteDecision::Continue { logged_in: false }
        );
    }

    #[test]
    fn referer_path_extraction() {
        assert_eq!(referer_path("https://a.b/login?x=1"), "/login");
        assert_eq!(referer_path("http://a.b"), "/");
        assert_eq!(referer_path("/dashboard#top"), "/dashboard");
    }

    #[test]
    fn list_path_encodes_id() {
        assert_eq!(list_path("a b"), "/List/a%20b");
    }
}

mod api;
mod app;
mod components;
mod pages;
mod popups;
mod state;
mod storage;
mod util;

pub use app::App;

use leptos::prelude::*;

// Needed for `#[wasm_bindgen(start)]` on the wasm entrypoint.
#[cfg(all(target_arch = "wasm32", not(test)))]
use wasm_bindgen::prelude::wasm_bindgen;

// WASM-only tests (run with `cargo test --target wasm32-unknown-unknown` + wasm-bindgen-test-runner)
#[cfg(all(test, target_arch = "wasm32"))]
mod wasm_tests {
    use crate::api::ApiClient;
    use crate::storage::{
        clear_auth_storage, is_secure_origin, load_flag, load_session, local_storage,
        save_session, write_cookie, SESSION_KEY, SIGNED_OUT_KEY, THEME_KEY,
    };
    use listit_core::session::{
        cookie_value, session_cookies, CookieTokens, ACCESS_TOKEN_COOKIE, LOGGED_IN_COOKIE,
    };
    use listit_core::{AuthSession, AuthUser};
    use wasm_bindgen::JsCast;
    use wasm_bindgen_test::*;

    wasm_bindgen_test_configure!(run_in_browser);

    fn read_cookie(name: &str) -> Option<String> {
        let doc = web_sys::window()?
            .document()?
            .dyn_into::<web_sys::HtmlDocument>()
            .ok()?;
        cookie_value(&doc.cookie().ok()?, name)
    }

    fn session() -> AuthSession {
        AuthSession {
            access_token: "access-1".to_string(),
            refresh_token: "refresh-1".to_string(),
            expires_at: 4_102_444_800,
            user: AuthUser {
                id: "user-1".to_string(),
                email: Some("u@example.com".to_string()),
                display_name: None,
                avatar_url: None,
            },
        }
    }

    #[wasm_bindgen_test]
    fn test_session_storage_roundtrip() {
        clear_auth_storage();
        assert!(load_session().is_none());

        save_session(&session());
        let client = ApiClient::load_from_storage();
        assert!(client.is_authenticated());
        assert_eq!(client.user_id().as_deref(), Some("user-1"));
        assert_eq!(read_cookie(ACCESS_TOKEN_COOKIE).as_deref(), Some("access-1"));
        assert_eq!(read_cookie(LOGGED_IN_COOKIE).as_deref(), Some("true"));
    }

    #[wasm_bindgen_test]
    fn test_clear_auth_storage_keeps_preferences() {
        let storage = local_storage().expect("localStorage available");
        storage.set_item(THEME_KEY, "dark").expect("set theme");
        storage
            .set_item("sb-demo-auth-token", "{}")
            .expect("set foreign auth key");
        save_session(&session());

        let removed = clear_auth_storage();
        assert!(removed >= 2);
        assert!(storage.get_item(SESSION_KEY).ok().flatten().is_none());
        assert!(storage.get_item("sb-demo-auth-token").ok().flatten().is_none());
        assert_eq!(storage.get_item(THEME_KEY).ok().flatten().as_deref(), Some("dark"));
        assert!(read_cookie(ACCESS_TOKEN_COOKIE).is_none());

        // A stored session is not resurrected after sign-out.
        storage
            .set_item(SESSION_KEY, &serde_json::to_string(&session()).expect("serialize"))
            .expect("set session");
        assert!(load_session().is_none());
    }

    // Header and signature are not checked; only the claims are read.
    const OAUTH_ACCESS_TOKEN: &str = "eyJhbGciOiJIUzI1NiJ9.eyJzdWIiOiJ1c2VyLTIiLCJleHAiOjQxMDI0NDQ4MDAsImVtYWlsIjoib0BleGFtcGxlLmNvbSJ9.sig";

    #[wasm_bindgen_test]
    fn test_oauth_callback_cookies_sign_the_client_in() {
        // A previous logout leaves the signed-out marker behind.
        clear_auth_storage();
        assert_eq!(load_flag(SIGNED_OUT_KEY), Some(true));

        let tokens = CookieTokens {
            access_token: OAUTH_ACCESS_TOKEN.to_string(),
            refresh_token: Some("refresh-2".to_string()),
        };
        for cookie in session_cookies(&tokens, is_secure_origin()) {
            write_cookie(&cookie);
        }

        assert!(load_session().is_none());
        let client = ApiClient::load_from_storage();
        assert!(client.is_authenticated());
        assert_eq!(client.user_id().as_deref(), Some("user-2"));
        let session = client.session.expect("cookie session");
        assert_eq!(session.refresh_token, "refresh-2");
        assert_eq!(session.expires_at, 4_102_444_800);

        // Persisting it, as the bootstrap does after fetching the profile,
        // lifts the marker.
        save_session(&session);
        assert_eq!(load_flag(SIGNED_OUT_KEY), Some(false));
        assert!(load_session().is_some());
        clear_auth_storage();
    }
}

// Only register the WASM start function for normal builds (not for tests),
// otherwise wasm-bindgen-test will end up with multiple entry symbols.
#[cfg_attr(all(target_arch = "wasm32", not(test)), wasm_bindgen(start))]
pub fn main() {
    console_error_panic_hook::set_once();
    mount_to_body(App);
}

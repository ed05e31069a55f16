use listit_core::session::{
    cleared_auth_cookies, is_auth_storage_key, session_cookies, session_from_cookies,
    CookieTokens,
};
use listit_core::AuthSession;
use serde::{Deserialize, Serialize};
use wasm_bindgen::JsCast;

pub(crate) const THEME_KEY: &str = "listit_theme";
pub(crate) const SIDEBAR_OPEN_KEY: &str = "listit_sidebar_open";
pub(crate) const SESSION_KEY: &str = "listit_session";
/// Set after logout so a stale tab does not resurrect the session.
pub(crate) const SIGNED_OUT_KEY: &str = "listit_signed_out";

pub(crate) fn local_storage() -> Option<web_sys::Storage> {
    web_sys::window().and_then(|w| w.local_storage().ok().flatten())
}

fn session_storage() -> Option<web_sys::Storage> {
    web_sys::window().and_then(|w| w.session_storage().ok().flatten())
}

pub(crate) fn load_json_from_storage<T: for<'de> Deserialize<'de>>(key: &str) -> Option<T> {
    let storage = local_storage()?;
    let json = storage.get_item(key).ok().flatten()?;
    serde_json::from_str(&json).ok()
}

pub(crate) fn save_json_to_storage<T: Serialize>(key: &str, value: &T) {
    if let Ok(json) = serde_json::to_string(value) {
        if let Some(storage) = local_storage() {
            let _ = storage.set_item(key, &json);
        }
    }
}

pub(crate) fn load_flag(key: &str) -> Option<bool> {
    let value = local_storage()?.get_item(key).ok().flatten()?;
    Some(value == "1" || value == "true")
}

pub(crate) fn save_flag(key: &str, value: bool) {
    if let Some(storage) = local_storage() {
        let _ = storage.set_item(key, if value { "1" } else { "0" });
    }
}

pub(crate) fn load_session() -> Option<AuthSession> {
    if load_flag(SIGNED_OUT_KEY).unwrap_or(false) {
        return None;
    }
    load_json_from_storage(SESSION_KEY)
}

/// Session left in cookies by the server's OAuth callback. Logout expires
/// these cookies, so they are trusted even when the signed-out marker is set.
pub(crate) fn load_cookie_session() -> Option<AuthSession> {
    let header = html_document()?.cookie().ok()?;
    session_from_cookies(&header).ok().flatten()
}

/// Persist the session and mirror it into cookies for the server guard.
pub(crate) fn save_session(session: &AuthSession) {
    save_json_to_storage(SESSION_KEY, session);
    save_flag(SIGNED_OUT_KEY, false);
    let tokens = CookieTokens {
        access_token: session.access_token.clone(),
        refresh_token: Some(session.refresh_token.clone()),
    };
    for cookie in session_cookies(&tokens, is_secure_origin()) {
        write_cookie(&cookie);
    }
}

fn html_document() -> Option<web_sys::HtmlDocument> {
    web_sys::window()
        .and_then(|w| w.document())
        .and_then(|d| d.dyn_into::<web_sys::HtmlDocument>().ok())
}

pub(crate) fn is_secure_origin() -> bool {
    web_sys::window()
        .and_then(|w| w.location().protocol().ok())
        .is_some_and(|p| p == "https:")
}

pub(crate) fn write_cookie(cookie: &str) {
    if let Some(doc) = html_document() {
        let _ = doc.set_cookie(cookie);
    }
}

/// Keys that look like auth state.
pub(crate) fn auth_keys<I: IntoIterator<Item = String>>(keys: I) -> Vec<String> {
    keys.into_iter().filter(|k| is_auth_storage_key(k)).collect()
}

fn storage_keys(storage: &web_sys::Storage) -> Vec<String> {
    let len = storage.length().unwrap_or(0);
    (0..len)
        .filter_map(|i| storage.key(i).ok().flatten())
        .collect()
}

/// Expire every auth cookie and drop auth-looking keys from both storages.
/// Returns how many storage keys were removed.
pub(crate) fn clear_auth_storage() -> usize {
    for cookie in cleared_auth_cookies() {
        write_cookie(&cookie);
    }

    let mut removed = 0;
    for storage in [local_storage(), session_storage()].into_iter().flatten() {
        for key in auth_keys(storage_keys(&storage)) {
            if storage.remove_item(&key).is_ok() {
                removed += 1;
            }
        }
    }
    save_flag(SIGNED_OUT_KEY, true);
    removed
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn auth_keys_match_known_markers() {
        let keys = vec![
            SESSION_KEY.to_string(),
            "sb-demo-auth-token".to_string(),
            THEME_KEY.to_string(),
            SIDEBAR_OPEN_KEY.to_string(),
            "supabase.auth.token".to_string(),
        ];
        assert_eq!(
            auth_keys(keys),
            vec![
                SESSION_KEY.to_string(),
                "sb-demo-auth-token".to_string(),
                "supabase.auth.token".to_string(),
            ]
        );
    }

    #[test]
    fn signed_out_marker_survives_cleanup() {
        assert!(auth_keys(vec![SIGNED_OUT_KEY.to_string()]).is_empty());
    }
}

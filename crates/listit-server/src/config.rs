use std::collections::HashMap;
use std::env;
use std::fmt;
use std::path::PathBuf;

use thiserror::Error;

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("Missing required environment variable: {0}")]
    MissingVar(&'static str),
    #[error("Invalid configuration: {0}")]
    Invalid(String),
}

#[derive(Clone)]
pub struct ServerConfig {
    pub bind_addr: String,
    pub supabase_url: String,
    pub supabase_anon_key: String,
    /// Only needed by account deletion; the server starts without it.
    pub service_role_key: Option<String>,
    pub site_url: String,
    pub static_dir: PathBuf,
}

impl fmt::Debug for ServerConfig {
    fn fmt(&self, formatter: &mut fmt::Formatter<'_>) -> fmt::Result {
        formatter
            .debug_struct("ServerConfig")
            .field("bind_addr", &self.bind_addr)
            .field("supabase_url", &self.supabase_url)
            .field("supabase_anon_key", &self.supabase_anon_key)
            .field(
                "service_role_key",
                &self.service_role_key.as_ref().map(|_| "[REDACTED]"),
            )
            .field("site_url", &self.site_url)
            .field("static_dir", &self.static_dir)
            .finish()
    }
}

impl ServerConfig {
    pub fn from_env() -> Result<Self, ConfigError> {
        let values: HashMap<String, String> = env::vars().collect();
        Self::from_lookup(|name| values.get(name).cloned())
    }

    pub(crate) fn from_lookup(lookup: impl Fn(&str) -> Option<String>) -> Result<Self, ConfigError> {
        let bind_addr = value_or_default(&lookup, "LISTIT_BIND_ADDR", "127.0.0.1:3000");

        let supabase_url = required_trimmed(&lookup, "SUPABASE_URL")?;
        if !is_http_url(&supabase_url) {
            return Err(ConfigError::Invalid(
                "SUPABASE_URL must start with http:// or https://".to_string(),
            ));
        }
        let supabase_anon_key = required_trimmed(&lookup, "SUPABASE_ANON_KEY")?;
        let service_role_key = optional_trimmed(&lookup, "SUPABASE_SERVICE_ROLE_KEY");

        let default_site = format!("http://{bind_addr}");
        let site_url = value_or_default(&lookup, "SITE_URL", &default_site);
        if !is_http_url(&site_url) {
            return Err(ConfigError::Invalid(
                "SITE_URL must start with http:// or https://".to_string(),
            ));
        }

        let static_dir = PathBuf::from(value_or_default(&lookup, "LISTIT_STATIC_DIR", "dist"));

        Ok(Self {
            bind_addr,
            supabase_url: trim_trailing(&supabase_url).to_string(),
            supabase_anon_key,
            service_role_key,
            site_url: trim_trailing(&site_url).to_string(),
            static_dir,
        })
    }

    /// Cookies get `Secure` when the site is served over TLS.
    pub fn secure_cookies(&self) -> bool {
        self.site_url.starts_with("https://")
    }
}

fn optional_trimmed(lookup: &impl Fn(&str) -> Option<String>, name: &str) -> Option<String> {
    lookup(name)
        .map(|v| v.trim().to_string())
        .filter(|v| !v.is_empty())
}

fn required_trimmed(
    lookup: &impl Fn(&str) -> Option<String>,
    name: &'static str,
) -> Result<String, ConfigError> {
    optional_trimmed(lookup, name).ok_or(ConfigError::MissingVar(name))
}

fn value_or_default(lookup: &impl Fn(&str) -> Option<String>, name: &str, default: &str) -> String {
    optional_trimmed(lookup, name).unwrap_or_else(|| default.to_string())
}

fn is_http_url(value: &str) -> bool {
    value.starts_with("http://") || value.starts_with("https://")
}

fn trim_trailing(value: &str) -> &str {
    value.trim_end_matches('/')
}

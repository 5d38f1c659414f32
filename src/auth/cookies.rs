//! Cookie access seam.
//!
//! The transport owns the cookie store and sends cookies implicitly; this
//! crate only ever needs to *read* the script-readable anti-forgery cookie.
//! The value is read fresh on every call, never cached, because the server
//! may rotate it when the session is renewed.

use std::sync::Arc;

use reqwest::cookie::{CookieStore, Jar};
use reqwest::Url;

/// Read-only view of the cookie jar shared with the transport.
pub trait CookieSource: Send + Sync {
    /// Current value of the named cookie, if set.
    fn get(&self, name: &str) -> Option<String>;
}

/// `CookieSource` backed by the same `reqwest` jar the client sends from,
/// scoped to one origin.
pub struct JarCookies {
    jar: Arc<Jar>,
    origin: Url,
}

impl JarCookies {
    pub fn new(jar: Arc<Jar>, origin: Url) -> Self {
        Self { jar, origin }
    }
}

impl CookieSource for JarCookies {
    fn get(&self, name: &str) -> Option<String> {
        let header = self.jar.cookies(&self.origin)?;
        let raw = header.to_str().ok()?;
        raw.split(';')
            .filter_map(|pair| pair.trim().split_once('='))
            .find(|(key, _)| *key == name)
            .map(|(_, value)| value.to_string())
    }
}

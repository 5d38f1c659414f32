//! Client configuration.
//!
//! This module defines the immutable configuration supplied when the client
//! is constructed: the set of backend services, route overrides, service
//! rules, header/cookie names, and the fixed auth endpoints.
//!
//! Configuration can be built programmatically or loaded from a JSON file.

use std::collections::HashMap;
use std::path::Path;

use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};

// ============================================================================
// Constants
// ============================================================================

/// Path prefix under which the API is already mounted locally.
/// Endpoints starting with this prefix are passed through unrouted.
const DEFAULT_API_ROOT: &str = "/api";

/// Script-readable cookie holding the anti-forgery token.
const DEFAULT_CSRF_COOKIE: &str = "csrfToken";

/// Header the anti-forgery token is echoed back in.
const DEFAULT_CSRF_HEADER: &str = "x-csrf-token";

/// Endpoint that exchanges the session-continuation cookie for a new token.
const DEFAULT_REFRESH_PATH: &str = "/auth/refresh";

/// Endpoint that invalidates the current access token server-side.
const DEFAULT_LOGOUT_PATH: &str = "/auth/logout";

/// Endpoint that revokes the session-continuation artifact server-side.
const DEFAULT_REVOKE_PATH: &str = "/auth/revoke";

/// HTTP request timeout in seconds.
/// 30s allows for slow API responses while failing fast enough for good UX.
const DEFAULT_TIMEOUT_SECS: u64 = 30;

/// A named backend service cluster.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Service {
    pub name: String,
    pub base_url: String,
    /// Optional version segment appended after the base URL (e.g. "v2").
    #[serde(default)]
    pub api_version: Option<String>,
}

/// Routes any logical path matching `pattern` to the named service.
/// Rules are tested in order; the first match wins.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ServiceRule {
    pub pattern: String,
    pub service: String,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ClientConfig {
    /// All known service clusters. Must contain `default_service`.
    pub services: Vec<Service>,
    pub default_service: String,
    /// Exact logical-path to physical-path rewrites, checked before routing.
    #[serde(default)]
    pub route_overrides: HashMap<String, String>,
    #[serde(default)]
    pub service_rules: Vec<ServiceRule>,
    #[serde(default = "default_api_root")]
    pub api_root: String,
    #[serde(default = "default_csrf_cookie")]
    pub csrf_cookie: String,
    #[serde(default = "default_csrf_header")]
    pub csrf_header: String,
    /// Optional deployment tag sent as `X-Environment` on every request.
    #[serde(default)]
    pub environment: Option<String>,
    /// Setting this to `null` disables token renewal entirely; a 401 is then
    /// surfaced to the caller as an ordinary error.
    #[serde(default = "default_refresh_path")]
    pub refresh_path: Option<String>,
    #[serde(default = "default_logout_path")]
    pub logout_path: String,
    #[serde(default = "default_revoke_path")]
    pub revoke_path: String,
    #[serde(default = "default_timeout_secs")]
    pub timeout_secs: u64,
}

fn default_api_root() -> String {
    DEFAULT_API_ROOT.to_string()
}

fn default_csrf_cookie() -> String {
    DEFAULT_CSRF_COOKIE.to_string()
}

fn default_csrf_header() -> String {
    DEFAULT_CSRF_HEADER.to_string()
}

fn default_refresh_path() -> Option<String> {
    Some(DEFAULT_REFRESH_PATH.to_string())
}

fn default_logout_path() -> String {
    DEFAULT_LOGOUT_PATH.to_string()
}

fn default_revoke_path() -> String {
    DEFAULT_REVOKE_PATH.to_string()
}

fn default_timeout_secs() -> u64 {
    DEFAULT_TIMEOUT_SECS
}

impl ClientConfig {
    /// Create a configuration with a single service and default endpoints.
    pub fn new(name: impl Into<String>, base_url: impl Into<String>) -> Self {
        let name = name.into();
        Self {
            services: vec![Service {
                name: name.clone(),
                base_url: base_url.into(),
                api_version: None,
            }],
            default_service: name,
            route_overrides: HashMap::new(),
            service_rules: Vec::new(),
            api_root: default_api_root(),
            csrf_cookie: default_csrf_cookie(),
            csrf_header: default_csrf_header(),
            environment: None,
            refresh_path: default_refresh_path(),
            logout_path: default_logout_path(),
            revoke_path: default_revoke_path(),
            timeout_secs: DEFAULT_TIMEOUT_SECS,
        }
    }

    pub fn load(path: impl AsRef<Path>) -> Result<Self> {
        let contents = std::fs::read_to_string(path.as_ref())
            .context("Failed to read client config file")?;
        serde_json::from_str(&contents).context("Failed to parse client config file")
    }

    pub fn service(&self, name: &str) -> Option<&Service> {
        self.services.iter().find(|s| s.name == name)
    }
}

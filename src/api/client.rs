//! API client: request pipeline, unauthorized-retry handling, token renewal,
//! and session teardown.
//!
//! A logical call is routed to a physical URL, gets its headers built at send
//! time (environment tag, bearer token, anti-forgery token, then caller
//! headers), and its response parsed into the canonical envelope. A 401 with
//! renewal configured triggers exactly one single-flight renewal followed by
//! exactly one retry; everything else surfaces as a typed [`ApiError`].

use std::sync::Arc;
use std::time::Duration;

use anyhow::{Context, Result};
use reqwest::cookie::Jar;
use reqwest::header::{HeaderMap, HeaderName, HeaderValue, AUTHORIZATION, CONTENT_TYPE};
use reqwest::{Client, Method, StatusCode, Url};
use serde::de::DeserializeOwned;
use serde::{Deserialize, Serialize};
use tracing::{debug, warn};

use crate::auth::{
    CookieSource, JarCookies, RenewalCoordinator, SignInNavigator, StaySignedIn, TokenStore,
};
use crate::config::ClientConfig;

use super::envelope::{is_no_content_status, Envelope};
use super::router::ServiceRouter;
use super::ApiError;

/// Header carrying the configured deployment tag.
const ENVIRONMENT_HEADER: &str = "x-environment";

/// Request body, constructed per call.
#[derive(Debug, Clone, Default)]
pub enum Body {
    #[default]
    None,
    /// Serialized as JSON with the backend's content type.
    Json(serde_json::Value),
    /// Sent as-is. No content type is set unless the caller supplies one, so
    /// multipart and binary uploads keep whatever framing they carry.
    Raw {
        bytes: Vec<u8>,
        content_type: Option<String>,
    },
}

/// Per-call options. `Default` gives a bare request with no body.
#[derive(Debug, Clone, Default)]
pub struct RequestOptions {
    pub body: Body,
    /// Caller headers, applied last so they override the generated set.
    pub headers: Vec<(String, String)>,
    /// Explicit service cluster, bypassing the pattern rules.
    pub service: Option<String>,
    /// Treat the endpoint as a fully-formed URL.
    pub absolute: bool,
}

/// Async API client with service routing and transparent token renewal.
pub struct ApiClient {
    http: Client,
    config: Arc<ClientConfig>,
    router: ServiceRouter,
    /// Origin of the default service; relative physical paths (route
    /// overrides, local API paths) resolve against it.
    origin: Url,
    tokens: TokenStore,
    cookies: Arc<dyn CookieSource>,
    renewal: RenewalCoordinator,
    stay_signed_in: Option<Arc<dyn StaySignedIn>>,
    navigator: Option<Arc<dyn SignInNavigator>>,
}

impl ApiClient {
    /// Create a client over the given configuration. The transport owns a
    /// cookie jar shared with the anti-forgery reader, so the
    /// session-continuation cookie is sent implicitly and never read here.
    pub fn new(config: ClientConfig) -> Result<Self> {
        let router = ServiceRouter::new(&config)?;
        let origin: Url = config
            .service(&config.default_service)
            .with_context(|| format!("Default service '{}' is not configured", config.default_service))?
            .base_url
            .parse()
            .context("Default service base URL is not a valid URL")?;

        let jar = Arc::new(Jar::default());
        let http = Client::builder()
            .timeout(Duration::from_secs(config.timeout_secs))
            .cookie_provider(Arc::clone(&jar))
            .build()
            .context("Failed to build HTTP client")?;
        let cookies: Arc<dyn CookieSource> = Arc::new(JarCookies::new(jar, origin.clone()));

        Ok(Self {
            http,
            config: Arc::new(config),
            router,
            origin,
            tokens: TokenStore::new(),
            cookies,
            renewal: RenewalCoordinator::new(),
            stay_signed_in: None,
            navigator: None,
        })
    }

    /// Swap the token store, e.g. to share one cell across clients in tests.
    pub fn with_token_store(mut self, tokens: TokenStore) -> Self {
        self.tokens = tokens;
        self
    }

    pub fn with_cookie_source(mut self, cookies: Arc<dyn CookieSource>) -> Self {
        self.cookies = cookies;
        self
    }

    pub fn with_stay_signed_in(mut self, flag: Arc<dyn StaySignedIn>) -> Self {
        self.stay_signed_in = Some(flag);
        self
    }

    pub fn with_navigator(mut self, navigator: Arc<dyn SignInNavigator>) -> Self {
        self.navigator = Some(navigator);
        self
    }

    pub fn tokens(&self) -> &TokenStore {
        &self.tokens
    }

    // ===== Request pipeline =====

    pub async fn get<T: DeserializeOwned>(&self, endpoint: &str) -> Result<Envelope<T>, ApiError> {
        self.request(Method::GET, endpoint, RequestOptions::default()).await
    }

    pub async fn post<T: DeserializeOwned, B: Serialize>(
        &self,
        endpoint: &str,
        body: &B,
    ) -> Result<Envelope<T>, ApiError> {
        self.request(Method::POST, endpoint, Self::json_options(body)?).await
    }

    pub async fn put<T: DeserializeOwned, B: Serialize>(
        &self,
        endpoint: &str,
        body: &B,
    ) -> Result<Envelope<T>, ApiError> {
        self.request(Method::PUT, endpoint, Self::json_options(body)?).await
    }

    pub async fn delete<T: DeserializeOwned>(&self, endpoint: &str) -> Result<Envelope<T>, ApiError> {
        self.request(Method::DELETE, endpoint, RequestOptions::default()).await
    }

    fn json_options<B: Serialize>(body: &B) -> Result<RequestOptions, ApiError> {
        let value = serde_json::to_value(body)
            .map_err(|e| ApiError::InvalidRequest(format!("Unserializable body: {}", e)))?;
        Ok(RequestOptions {
            body: Body::Json(value),
            ..Default::default()
        })
    }

    /// Issue a request and parse the response envelope.
    ///
    /// A 401 triggers renewal and a single retry only when a refresh path is
    /// configured; the retry's outcome is surfaced verbatim, so a second 401
    /// becomes an ordinary error rather than a second renewal.
    pub async fn request<T: DeserializeOwned>(
        &self,
        method: Method,
        endpoint: &str,
        options: RequestOptions,
    ) -> Result<Envelope<T>, ApiError> {
        let service = self.router.resolve(endpoint, options.service.as_deref())?;
        let url = self.router.physical_url(endpoint, service, options.absolute);
        let caller_headers = parse_headers(&options.headers)?;

        let response = self
            .send(method.clone(), &url, &options.body, &caller_headers)
            .await?;

        if response.status() == StatusCode::UNAUTHORIZED && self.config.refresh_path.is_some() {
            debug!(url = %url, "Unauthorized response, attempting token renewal");
            if self.renew().await.is_none() {
                return Err(ApiError::SessionExpired);
            }
            // Headers are rebuilt from scratch, so the retry carries the
            // renewed token and whatever anti-forgery value is now set.
            let retry = self.send(method, &url, &options.body, &caller_headers).await?;
            return Self::parse(retry).await;
        }

        Self::parse(response).await
    }

    /// Build headers and dispatch one request. The token store and the
    /// anti-forgery cookie are read here, at send time, never earlier.
    async fn send(
        &self,
        method: Method,
        url: &str,
        body: &Body,
        caller_headers: &HeaderMap,
    ) -> Result<reqwest::Response, ApiError> {
        let url = self.absolute_url(url)?;

        let mut headers = HeaderMap::new();
        if let Some(tag) = &self.config.environment {
            headers.insert(
                HeaderName::from_static(ENVIRONMENT_HEADER),
                HeaderValue::from_str(tag)
                    .map_err(|e| ApiError::InvalidRequest(format!("Invalid environment tag: {}", e)))?,
            );
        }
        if let Some(token) = self.tokens.get() {
            headers.insert(
                AUTHORIZATION,
                HeaderValue::from_str(&format!("Bearer {}", token))
                    .map_err(|e| ApiError::InvalidRequest(format!("Invalid bearer token: {}", e)))?,
            );
        }
        if let Some(csrf) = self.cookies.get(&self.config.csrf_cookie) {
            let name = HeaderName::from_bytes(self.config.csrf_header.as_bytes())
                .map_err(|e| ApiError::InvalidRequest(format!("Invalid CSRF header name: {}", e)))?;
            headers.insert(
                name,
                HeaderValue::from_str(&csrf)
                    .map_err(|e| ApiError::InvalidRequest(format!("Invalid CSRF token: {}", e)))?,
            );
        }
        for (name, value) in caller_headers.iter() {
            headers.insert(name, value.clone());
        }

        let mut request = self.http.request(method, url).headers(headers);
        request = match body {
            Body::None => request,
            Body::Json(value) => request.json(value),
            Body::Raw { bytes, content_type } => {
                let request = request.body(bytes.clone());
                match content_type {
                    Some(ct) => request.header(CONTENT_TYPE, ct.as_str()),
                    None => request,
                }
            }
        };

        Ok(request.send().await?)
    }

    async fn parse<T: DeserializeOwned>(response: reqwest::Response) -> Result<Envelope<T>, ApiError> {
        let status = response.status();
        if is_no_content_status(status.as_u16()) {
            return Ok(Envelope::no_content(status.as_u16()));
        }

        let body = response.text().await?;
        if !status.is_success() {
            return Err(ApiError::from_status(status, &body));
        }
        if body.is_empty() {
            return Ok(Envelope::no_content(status.as_u16()));
        }
        serde_json::from_str(&body)
            .map_err(|e| ApiError::InvalidResponse(format!("Malformed response envelope: {}", e)))
    }

    /// Relative physical paths resolve against the default service's origin,
    /// the way a browser resolves them against the page origin.
    fn absolute_url(&self, physical: &str) -> Result<Url, ApiError> {
        let resolved = if physical.starts_with("http://") || physical.starts_with("https://") {
            Url::parse(physical)
        } else {
            self.origin.join(physical)
        };
        resolved.map_err(|e| ApiError::InvalidRequest(format!("Invalid URL '{}': {}", physical, e)))
    }

    // ===== Token renewal =====

    /// Renew the access token. Concurrent callers join the one in-flight
    /// renewal and all observe its outcome; `None` means the session could
    /// not be continued (the store is cleared when the backend rejects it).
    ///
    /// Also callable directly, e.g. on cold start when the surrounding app
    /// decides to resume a remembered session.
    pub async fn renew(&self) -> Option<String> {
        let refresh_path = self.config.refresh_path.as_deref()?;
        let service = match self.router.resolve(refresh_path, None) {
            Ok(s) => s,
            Err(e) => {
                warn!(error = %e, "Cannot route the refresh endpoint");
                return None;
            }
        };
        let url = match self.absolute_url(&self.router.physical_url(refresh_path, service, false)) {
            Ok(u) => u,
            Err(e) => {
                warn!(error = %e, "Cannot build the refresh URL");
                return None;
            }
        };

        let http = self.http.clone();
        let tokens = self.tokens.clone();
        let cookies = Arc::clone(&self.cookies);
        let csrf_cookie = self.config.csrf_cookie.clone();
        let csrf_header = self.config.csrf_header.clone();

        self.renewal
            .run(move || refresh_once(http, url, csrf_cookie, csrf_header, cookies, tokens))
            .await
    }

    // ===== Session teardown =====

    /// Tear down the session. Never fails: the revoke and logout calls are
    /// best-effort and logged, while the local cleanup (token cleared,
    /// stay-signed-in flag cleared, navigation to sign-in) always runs.
    pub async fn logout(&self) {
        let revoke_path = self.config.revoke_path.clone();
        if let Err(e) = self.post_teardown(&revoke_path).await {
            warn!(error = %e, "Session revoke failed during logout");
        }

        let logout_path = self.config.logout_path.clone();
        if let Err(e) = self.post_teardown(&logout_path).await {
            warn!(error = %e, "Logout call failed");
        }

        self.tokens.clear();
        if let Some(flag) = &self.stay_signed_in {
            flag.clear();
        }
        if let Some(navigator) = &self.navigator {
            navigator.to_sign_in();
        }
        debug!("Session torn down");
    }

    /// One teardown POST. Carries the bearer token while the store still
    /// holds one; never enters the renewal path.
    async fn post_teardown(&self, path: &str) -> Result<(), ApiError> {
        let service = self.router.resolve(path, None)?;
        let url = self.router.physical_url(path, service, false);
        let response = self
            .send(Method::POST, &url, &Body::None, &HeaderMap::new())
            .await?;
        let status = response.status();
        if status.is_success() {
            Ok(())
        } else {
            let body = response.text().await.unwrap_or_default();
            Err(ApiError::from_status(status, &body))
        }
    }
}

/// Shape of the refresh endpoint's `data` payload.
#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct RenewedCredential {
    #[serde(default)]
    access_token: Option<String>,
}

/// The one physical renewal call. The session-continuation cookie rides along
/// implicitly via the shared jar; only the anti-forgery token is attached by
/// hand. Clears the token store when the backend rejects the session.
async fn refresh_once(
    http: Client,
    url: Url,
    csrf_cookie: String,
    csrf_header: String,
    cookies: Arc<dyn CookieSource>,
    tokens: TokenStore,
) -> Option<String> {
    let mut request = http.post(url);
    if let Some(csrf) = cookies.get(&csrf_cookie) {
        match (
            HeaderName::from_bytes(csrf_header.as_bytes()),
            HeaderValue::from_str(&csrf),
        ) {
            (Ok(name), Ok(value)) => {
                request = request.header(name, value);
            }
            _ => warn!("Dropping unencodable CSRF header from refresh request"),
        }
    }

    let response = match request.send().await {
        Ok(r) => r,
        Err(e) => {
            warn!(error = %e, "Token renewal request failed");
            tokens.clear();
            return None;
        }
    };

    if !response.status().is_success() {
        warn!(status = %response.status(), "Token renewal rejected");
        tokens.clear();
        return None;
    }

    let envelope: Envelope<RenewedCredential> = match response.json().await {
        Ok(e) => e,
        Err(e) => {
            warn!(error = %e, "Unparseable renewal response");
            return None;
        }
    };

    match envelope
        .data
        .and_then(|d| d.access_token)
        .filter(|t| !t.trim().is_empty())
    {
        Some(token) => {
            tokens.set(token.clone());
            debug!("Access token renewed");
            Some(token)
        }
        None => {
            warn!("Renewal response carried no access token");
            None
        }
    }
}

fn parse_headers(headers: &[(String, String)]) -> Result<HeaderMap, ApiError> {
    let mut map = HeaderMap::with_capacity(headers.len());
    for (name, value) in headers {
        let name = HeaderName::from_bytes(name.as_bytes())
            .map_err(|e| ApiError::InvalidRequest(format!("Invalid header name '{}': {}", name, e)))?;
        let value = HeaderValue::from_str(value)
            .map_err(|e| ApiError::InvalidRequest(format!("Invalid header value: {}", e)))?;
        map.insert(name, value);
    }
    Ok(map)
}

//! Portside - an async API client with service routing and single-flight
//! token renewal.
//!
//! The client issues authenticated requests against a set of configured
//! backend services, attaches the bearer token and anti-forgery header at
//! send time, and recovers from expired credentials by renewing them through
//! the refresh endpoint. Concurrent renewals collapse into one network call,
//! a 401-triggered retry happens at most once per request, and logout tears
//! the session down deterministically even when the backend is unreachable.

pub mod api;
pub mod auth;
pub mod config;

pub use api::{ApiClient, ApiError, Body, Envelope, RequestOptions, NO_CONTENT};
pub use reqwest::Method;
pub use auth::{CookieSource, RenewalCoordinator, SignInNavigator, StaySignedIn, TokenStore};
pub use config::{ClientConfig, Service, ServiceRule};

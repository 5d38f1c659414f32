//! REST API client module.
//!
//! This module provides the `ApiClient` for issuing authenticated requests
//! against the configured backend services, the router that maps logical
//! endpoints to physical URLs, the canonical response envelope, and the
//! typed error surfaced to callers.
//!
//! Authentication uses a short-lived bearer token that is renewed
//! transparently on 401 through the refresh endpoint.

pub mod client;
pub mod envelope;
pub mod error;
pub mod router;

pub use client::{ApiClient, Body, RequestOptions};
pub use envelope::{Envelope, NO_CONTENT};
pub use error::ApiError;
pub use router::ServiceRouter;

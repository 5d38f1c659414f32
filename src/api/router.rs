//! Service routing: maps a logical endpoint path to a physical URL.
//!
//! Resolution order for the target service: explicit caller override, then
//! the first matching service rule, then the configured default. Resolution
//! order for the path: pass-through (absolute URL or already-local API path),
//! then the exact route override table, then base URL concatenation.
//!
//! Routing is pure configuration: identical inputs always produce the
//! identical URL.

use std::collections::HashMap;

use anyhow::{Context, Result};
use regex::{Regex, RegexBuilder};

use crate::config::{ClientConfig, Service};

use super::ApiError;

pub struct ServiceRouter {
    services: Vec<Service>,
    default_service: String,
    /// Compiled service rules, kept in configuration order.
    rules: Vec<(Regex, String)>,
    overrides: HashMap<String, String>,
    api_root: String,
}

impl ServiceRouter {
    pub fn new(config: &ClientConfig) -> Result<Self> {
        config
            .service(&config.default_service)
            .with_context(|| format!("Default service '{}' is not configured", config.default_service))?;

        let mut rules = Vec::with_capacity(config.service_rules.len());
        for rule in &config.service_rules {
            config
                .service(&rule.service)
                .with_context(|| format!("Service rule targets unknown service '{}'", rule.service))?;
            // Observed rule patterns are case-insensitive (e.g. /^\/admin(\/|$)/i)
            let pattern = RegexBuilder::new(&rule.pattern)
                .case_insensitive(true)
                .build()
                .with_context(|| format!("Invalid service rule pattern '{}'", rule.pattern))?;
            rules.push((pattern, rule.service.clone()));
        }

        Ok(Self {
            services: config.services.clone(),
            default_service: config.default_service.clone(),
            rules,
            overrides: config.route_overrides.clone(),
            api_root: config.api_root.clone(),
        })
    }

    /// Pick the service for a logical endpoint. An explicit service name
    /// bypasses the pattern rules entirely.
    pub fn resolve(&self, endpoint: &str, explicit: Option<&str>) -> Result<&Service, ApiError> {
        if let Some(name) = explicit {
            return self
                .service(name)
                .ok_or_else(|| ApiError::UnknownService(name.to_string()));
        }

        let path = normalize(endpoint);
        let name = self
            .rules
            .iter()
            .find(|(pattern, _)| pattern.is_match(&path))
            .map(|(_, service)| service.as_str())
            .unwrap_or(&self.default_service);

        // Rule targets and the default are validated at construction.
        self.service(name)
            .ok_or_else(|| ApiError::UnknownService(name.to_string()))
    }

    /// Build the physical URL for an endpoint.
    ///
    /// Route overrides apply even when the caller picked the service
    /// explicitly: overrides rewrite paths, they do not select clusters.
    pub fn physical_url(&self, endpoint: &str, service: &Service, absolute: bool) -> String {
        if absolute || is_external(endpoint) {
            return endpoint.to_string();
        }

        let path = normalize(endpoint);
        if self.is_local_api_path(&path) {
            return path;
        }
        if let Some(rewritten) = self.overrides.get(&path) {
            return rewritten.clone();
        }

        let base = service.base_url.trim_end_matches('/');
        match &service.api_version {
            Some(version) => format!("{}/{}{}", base, version, path),
            None => format!("{}{}", base, path),
        }
    }

    /// Whether the path is already mounted under the local API root.
    fn is_local_api_path(&self, path: &str) -> bool {
        path == self.api_root || path.starts_with(&format!("{}/", self.api_root))
    }

    fn service(&self, name: &str) -> Option<&Service> {
        self.services.iter().find(|s| s.name == name)
    }
}

/// Ensure a single leading separator.
fn normalize(endpoint: &str) -> String {
    format!("/{}", endpoint.trim_start_matches('/'))
}

fn is_external(endpoint: &str) -> bool {
    endpoint.starts_with("http://") || endpoint.starts_with("https://")
}

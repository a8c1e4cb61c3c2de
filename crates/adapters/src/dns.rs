// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! DNS adapter: keeps the instance hostname pointed at the current address.

use crate::http;
use async_trait::async_trait;
use reqwest::Method;
use serde::de::DeserializeOwned;
use serde::Deserialize;
use serde_json::json;
use thiserror::Error;

pub const CLOUDFLARE_API_BASE: &str = "https://api.cloudflare.com/client/v4";
const RECORD_TTL_SECS: u32 = 60;

/// Errors from DNS operations
#[derive(Debug, Error)]
pub enum DnsError {
    #[error("DNS request failed: {0}")]
    Http(#[from] reqwest::Error),
    #[error("DNS API error: {0}")]
    Api(String),
}

/// Current A record for the instance hostname.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DnsRecord {
    pub id: String,
    pub address: String,
}

/// Adapter for the instance's DNS record
#[async_trait]
pub trait DnsAdapter: Clone + Send + Sync + 'static {
    /// Create or update the A record to point at `address`.
    async fn update_record(&self, address: &str) -> Result<(), DnsError>;

    async fn current_record(&self) -> Result<Option<DnsRecord>, DnsError>;
}

/// Used when no DNS provider is configured.
#[derive(Clone, Copy, Debug, Default)]
pub struct NoOpDns;

#[async_trait]
impl DnsAdapter for NoOpDns {
    async fn update_record(&self, address: &str) -> Result<(), DnsError> {
        tracing::debug!(address, "DNS not configured, skipping update");
        Ok(())
    }

    async fn current_record(&self) -> Result<Option<DnsRecord>, DnsError> {
        Ok(None)
    }
}

/// Zone and credentials for the Cloudflare client.
#[derive(Debug, Clone)]
pub struct CloudflareConfig {
    pub api_token: String,
    pub zone_id: String,
    /// Record name as written (e.g. `bloom`)
    pub record_name: String,
    /// Fully qualified name used for lookups (e.g. `bloom.example.com`)
    pub hostname: String,
    pub api_base: String,
}

impl CloudflareConfig {
    pub fn new(
        api_token: impl Into<String>,
        zone_id: impl Into<String>,
        hostname: impl Into<String>,
    ) -> Self {
        let hostname = hostname.into();
        let record_name = hostname.split('.').next().unwrap_or_default().to_string();
        Self {
            api_token: api_token.into(),
            zone_id: zone_id.into(),
            record_name,
            hostname,
            api_base: CLOUDFLARE_API_BASE.to_string(),
        }
    }
}

#[derive(Debug, Deserialize)]
struct Envelope<T> {
    success: bool,
    #[serde(default)]
    errors: serde_json::Value,
    result: Option<T>,
}

#[derive(Debug, Deserialize)]
struct ApiRecord {
    id: String,
    content: String,
}

/// DNS adapter backed by the Cloudflare API
#[derive(Clone)]
pub struct CloudflareDns {
    client: reqwest::Client,
    config: CloudflareConfig,
}

impl CloudflareDns {
    pub fn new(config: CloudflareConfig) -> Result<Self, DnsError> {
        Ok(Self { client: http::client()?, config })
    }

    fn request(&self, method: Method, path: &str) -> reqwest::RequestBuilder {
        let url = format!(
            "{}/zones/{}{}",
            self.config.api_base.trim_end_matches('/'),
            self.config.zone_id,
            path
        );
        self.client.request(method, url).bearer_auth(&self.config.api_token)
    }

    /// Cloudflare reports failures in the envelope, sometimes with a 200.
    async fn send<T: DeserializeOwned>(
        &self,
        builder: reqwest::RequestBuilder,
    ) -> Result<Option<T>, DnsError> {
        let response = builder.send().await?;
        let status = response.status();
        let body = response.text().await?;
        let envelope: Envelope<T> = serde_json::from_str(&body).map_err(|_| {
            DnsError::Api(format!("status {}: {}", status.as_u16(), http::truncate_body(&body)))
        })?;
        if !envelope.success {
            return Err(DnsError::Api(envelope.errors.to_string()));
        }
        Ok(envelope.result)
    }

    fn record_body(&self, address: &str) -> serde_json::Value {
        json!({
            "type": "A",
            "name": self.config.record_name,
            "content": address,
            "ttl": RECORD_TTL_SECS,
            "proxied": false,
        })
    }
}

#[async_trait]
impl DnsAdapter for CloudflareDns {
    async fn update_record(&self, address: &str) -> Result<(), DnsError> {
        let body = self.record_body(address);
        match self.current_record().await? {
            Some(existing) => {
                let path = format!("/dns_records/{}", existing.id);
                self.send::<serde_json::Value>(self.request(Method::PATCH, &path).json(&body))
                    .await?;
            }
            None => {
                self.send::<serde_json::Value>(
                    self.request(Method::POST, "/dns_records").json(&body),
                )
                .await?;
            }
        }
        tracing::info!(hostname = %self.config.hostname, address, "DNS record updated");
        Ok(())
    }

    async fn current_record(&self) -> Result<Option<DnsRecord>, DnsError> {
        let builder = self
            .request(Method::GET, "/dns_records")
            .query(&[("type", "A"), ("name", self.config.hostname.as_str())]);
        let records: Vec<ApiRecord> = self.send(builder).await?.unwrap_or_default();
        Ok(records.into_iter().next().map(|r| DnsRecord { id: r.id, address: r.content }))
    }
}

/// The DNS adapter chosen at startup.
#[derive(Clone)]
pub enum DnsClient {
    Cloudflare(CloudflareDns),
    NoOp(NoOpDns),
}

#[async_trait]
impl DnsAdapter for DnsClient {
    async fn update_record(&self, address: &str) -> Result<(), DnsError> {
        match self {
            DnsClient::Cloudflare(dns) => dns.update_record(address).await,
            DnsClient::NoOp(dns) => dns.update_record(address).await,
        }
    }

    async fn current_record(&self) -> Result<Option<DnsRecord>, DnsError> {
        match self {
            DnsClient::Cloudflare(dns) => dns.current_record().await,
            DnsClient::NoOp(dns) => dns.current_record().await,
        }
    }
}

#[cfg(any(test, feature = "test-support"))]
#[cfg_attr(coverage_nightly, coverage(off))]
mod fake {
    use super::{DnsAdapter, DnsError, DnsRecord};
    use async_trait::async_trait;
    use parking_lot::Mutex;
    use std::sync::Arc;

    #[derive(Default)]
    struct FakeDnsState {
        updates: Vec<String>,
        fail: Option<String>,
    }

    /// Fake DNS adapter for testing
    #[derive(Clone, Default)]
    pub struct FakeDnsAdapter {
        inner: Arc<Mutex<FakeDnsState>>,
    }

    impl FakeDnsAdapter {
        pub fn new() -> Self {
            Self::default()
        }

        /// Make every subsequent update fail with `message`.
        pub fn fail_with(&self, message: &str) {
            self.inner.lock().fail = Some(message.to_string());
        }

        /// Addresses passed to `update_record`, including failed attempts.
        pub fn updates(&self) -> Vec<String> {
            self.inner.lock().updates.clone()
        }
    }

    #[async_trait]
    impl DnsAdapter for FakeDnsAdapter {
        async fn update_record(&self, address: &str) -> Result<(), DnsError> {
            let mut inner = self.inner.lock();
            inner.updates.push(address.to_string());
            match &inner.fail {
                Some(message) => Err(DnsError::Api(message.clone())),
                None => Ok(()),
            }
        }

        async fn current_record(&self) -> Result<Option<DnsRecord>, DnsError> {
            let inner = self.inner.lock();
            if inner.fail.is_some() {
                return Ok(None);
            }
            Ok(inner
                .updates
                .last()
                .map(|address| DnsRecord { id: "fake".to_string(), address: address.clone() }))
        }
    }
}

#[cfg(any(test, feature = "test-support"))]
pub use fake::FakeDnsAdapter;

#[cfg(test)]
#[path = "dns_tests.rs"]
mod tests;

// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Hetzner Cloud provider client.

use super::cloud_init::CloudInit;
use super::{ProvisionAdapter, ProvisionError, ProvisionRequest, ProvisionedServer, ServerInfo};
use crate::http;
use async_trait::async_trait;
use reqwest::{Method, StatusCode};
use serde::de::DeserializeOwned;
use serde::Deserialize;
use serde_json::json;

pub const HETZNER_API_BASE: &str = "https://api.hetzner.cloud/v1";
const IMAGE: &str = "ubuntu-24.04";
const PROJECT_LABEL: &str = "grove-bloom";

/// Credentials and boot settings for the provider client.
#[derive(Debug, Clone)]
pub struct HetznerConfig {
    pub api_token: String,
    /// SSH key registered with the provider, if any
    pub ssh_key_id: Option<String>,
    /// Public base URL the instance posts its webhooks to
    pub webhook_url: String,
    pub webhook_secret: String,
    pub api_base: String,
}

impl HetznerConfig {
    pub fn new(
        api_token: impl Into<String>,
        webhook_url: impl Into<String>,
        webhook_secret: impl Into<String>,
    ) -> Self {
        Self {
            api_token: api_token.into(),
            ssh_key_id: None,
            webhook_url: webhook_url.into(),
            webhook_secret: webhook_secret.into(),
            api_base: HETZNER_API_BASE.to_string(),
        }
    }
}

#[derive(Debug, Deserialize)]
struct ServerEnvelope {
    server: ApiServer,
}

#[derive(Debug, Deserialize)]
struct ApiServer {
    id: u64,
    name: String,
    #[serde(default)]
    status: String,
    #[serde(default)]
    public_net: Option<PublicNet>,
}

#[derive(Debug, Deserialize)]
struct PublicNet {
    ipv4: Option<Ipv4>,
}

#[derive(Debug, Deserialize)]
struct Ipv4 {
    ip: String,
}

impl From<ApiServer> for ServerInfo {
    fn from(s: ApiServer) -> Self {
        ServerInfo {
            instance_id: s.id.to_string(),
            name: s.name,
            status: s.status,
            address: s.public_net.and_then(|n| n.ipv4).map(|v| v.ip),
        }
    }
}

/// Provider adapter backed by the Hetzner Cloud API
#[derive(Clone)]
pub struct HetznerProvisioner {
    client: reqwest::Client,
    config: HetznerConfig,
}

impl HetznerProvisioner {
    pub fn new(config: HetznerConfig) -> Result<Self, ProvisionError> {
        Ok(Self { client: http::client()?, config })
    }

    fn request(&self, method: Method, path: &str) -> reqwest::RequestBuilder {
        let url = format!("{}{}", self.config.api_base.trim_end_matches('/'), path);
        self.client.request(method, url).bearer_auth(&self.config.api_token)
    }

    async fn send<T: DeserializeOwned>(
        &self,
        builder: reqwest::RequestBuilder,
    ) -> Result<T, ProvisionError> {
        let response = builder.send().await?;
        let status = response.status();
        if !status.is_success() {
            let body = response.text().await.unwrap_or_default();
            return Err(ProvisionError::Api {
                status: status.as_u16(),
                message: http::truncate_body(&body),
            });
        }
        response.json().await.map_err(|e| ProvisionError::InvalidResponse(e.to_string()))
    }

    fn create_body(&self, request: &ProvisionRequest) -> serde_json::Value {
        let spec = request.region.spec();
        let user_data = CloudInit {
            session_id: &request.session_id,
            webhook_url: &self.config.webhook_url,
            webhook_secret: &self.config.webhook_secret,
            idle_timeout_secs: request.idle_timeout_secs,
        }
        .render();
        let ssh_keys: Vec<&str> = self.config.ssh_key_id.iter().map(String::as_str).collect();
        json!({
            "name": format!("bloom-{}", request.session_id),
            "server_type": spec.server_type,
            "datacenter": spec.datacenter,
            "image": IMAGE,
            "ssh_keys": ssh_keys,
            "user_data": user_data,
            "labels": {
                "project": PROJECT_LABEL,
                "session": request.session_id.as_str(),
            },
        })
    }
}

#[async_trait]
impl ProvisionAdapter for HetznerProvisioner {
    async fn create(&self, request: &ProvisionRequest) -> Result<ProvisionedServer, ProvisionError> {
        let body = self.create_body(request);
        let envelope: ServerEnvelope =
            self.send(self.request(Method::POST, "/servers").json(&body)).await?;
        tracing::info!(
            session_id = %request.session_id,
            instance_id = envelope.server.id,
            region = %request.region,
            "instance created"
        );
        Ok(ProvisionedServer {
            instance_id: envelope.server.id.to_string(),
            name: envelope.server.name,
        })
    }

    async fn delete(&self, instance_id: &str) -> Result<(), ProvisionError> {
        let response =
            self.request(Method::DELETE, &format!("/servers/{instance_id}")).send().await?;
        match response.status() {
            s if s.is_success() => {
                tracing::info!(instance_id, "instance deleted");
                Ok(())
            }
            StatusCode::NOT_FOUND => {
                tracing::info!(instance_id, "instance already gone");
                Ok(())
            }
            s => {
                let body = response.text().await.unwrap_or_default();
                Err(ProvisionError::Api { status: s.as_u16(), message: http::truncate_body(&body) })
            }
        }
    }

    async fn get(&self, instance_id: &str) -> Result<Option<ServerInfo>, ProvisionError> {
        match self
            .send::<ServerEnvelope>(self.request(Method::GET, &format!("/servers/{instance_id}")))
            .await
        {
            Ok(envelope) => Ok(Some(envelope.server.into())),
            Err(ProvisionError::Api { status: 404, .. }) => Ok(None),
            Err(e) => Err(e),
        }
    }
}

#[cfg(test)]
#[path = "hetzner_tests.rs"]
mod tests;

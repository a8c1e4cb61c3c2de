// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Compute provider adapter

mod cloud_init;
mod hetzner;

pub use hetzner::{HetznerConfig, HetznerProvisioner};

use async_trait::async_trait;
use bloom_core::{Region, SessionId};
use thiserror::Error;

/// Errors from provider operations
#[derive(Debug, Error)]
pub enum ProvisionError {
    #[error("provider request failed: {0}")]
    Http(#[from] reqwest::Error),
    #[error("provider API error ({status}): {message}")]
    Api { status: u16, message: String },
    #[error("unexpected provider response: {0}")]
    InvalidResponse(String),
}

/// Everything the provider needs to boot an instance for a session.
#[derive(Debug, Clone, PartialEq)]
pub struct ProvisionRequest {
    pub session_id: SessionId,
    pub region: Region,
    pub idle_timeout_secs: u64,
}

/// Handle to a freshly created instance.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ProvisionedServer {
    /// Provider handle, used for deletion
    pub instance_id: String,
    pub name: String,
}

/// Provider view of an existing instance.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ServerInfo {
    pub instance_id: String,
    pub name: String,
    pub status: String,
    pub address: Option<String>,
}

/// Adapter for creating and destroying instances
#[async_trait]
pub trait ProvisionAdapter: Clone + Send + Sync + 'static {
    /// Create an instance. It reports readiness on its own once booted.
    async fn create(&self, request: &ProvisionRequest) -> Result<ProvisionedServer, ProvisionError>;

    /// Delete an instance. Deleting one that no longer exists succeeds.
    async fn delete(&self, instance_id: &str) -> Result<(), ProvisionError>;

    /// Look up an instance, `None` if the provider does not know it.
    async fn get(&self, instance_id: &str) -> Result<Option<ServerInfo>, ProvisionError>;
}

#[cfg(any(test, feature = "test-support"))]
#[cfg_attr(coverage_nightly, coverage(off))]
mod fake {
    use super::{ProvisionAdapter, ProvisionError, ProvisionRequest, ProvisionedServer, ServerInfo};
    use async_trait::async_trait;
    use parking_lot::Mutex;
    use std::collections::BTreeMap;
    use std::sync::Arc;

    /// Recorded provider call
    #[derive(Debug, Clone, PartialEq)]
    pub enum ProvisionCall {
        Create(ProvisionRequest),
        Delete(String),
    }

    #[derive(Default)]
    struct FakeProvisionState {
        calls: Vec<ProvisionCall>,
        servers: BTreeMap<String, ServerInfo>,
        next_id: u64,
        create_error: Option<String>,
        delete_error: Option<String>,
    }

    /// In-memory provider for tests
    #[derive(Clone, Default)]
    pub struct FakeProvisionAdapter {
        inner: Arc<Mutex<FakeProvisionState>>,
    }

    impl FakeProvisionAdapter {
        pub fn new() -> Self {
            Self::default()
        }

        /// Make every subsequent create fail with `message`.
        pub fn fail_create(&self, message: &str) {
            self.inner.lock().create_error = Some(message.to_string());
        }

        /// Make every subsequent delete fail with `message`.
        pub fn fail_delete(&self, message: &str) {
            self.inner.lock().delete_error = Some(message.to_string());
        }

        pub fn calls(&self) -> Vec<ProvisionCall> {
            self.inner.lock().calls.clone()
        }

        pub fn deleted(&self) -> Vec<String> {
            self.calls()
                .into_iter()
                .filter_map(|c| match c {
                    ProvisionCall::Delete(id) => Some(id),
                    ProvisionCall::Create(_) => None,
                })
                .collect()
        }

        /// Ids of instances created and not yet deleted.
        pub fn live(&self) -> Vec<String> {
            self.inner.lock().servers.keys().cloned().collect()
        }
    }

    #[async_trait]
    impl ProvisionAdapter for FakeProvisionAdapter {
        async fn create(
            &self,
            request: &ProvisionRequest,
        ) -> Result<ProvisionedServer, ProvisionError> {
            let mut inner = self.inner.lock();
            inner.calls.push(ProvisionCall::Create(request.clone()));
            if let Some(message) = inner.create_error.clone() {
                return Err(ProvisionError::Api { status: 503, message });
            }
            inner.next_id += 1;
            let instance_id = (1000 + inner.next_id).to_string();
            let name = format!("bloom-{}", request.session_id);
            inner.servers.insert(
                instance_id.clone(),
                ServerInfo {
                    instance_id: instance_id.clone(),
                    name: name.clone(),
                    status: "initializing".to_string(),
                    address: None,
                },
            );
            Ok(ProvisionedServer { instance_id, name })
        }

        async fn delete(&self, instance_id: &str) -> Result<(), ProvisionError> {
            let mut inner = self.inner.lock();
            inner.calls.push(ProvisionCall::Delete(instance_id.to_string()));
            if let Some(message) = inner.delete_error.clone() {
                return Err(ProvisionError::Api { status: 500, message });
            }
            inner.servers.remove(instance_id);
            Ok(())
        }

        async fn get(&self, instance_id: &str) -> Result<Option<ServerInfo>, ProvisionError> {
            Ok(self.inner.lock().servers.get(instance_id).cloned())
        }
    }
}

#[cfg(any(test, feature = "test-support"))]
pub use fake::{FakeProvisionAdapter, ProvisionCall};

#[cfg(test)]
#[path = "mod_tests.rs"]
mod tests;

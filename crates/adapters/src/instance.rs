// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Messaging the agent that runs on the instance.

use crate::http;
use async_trait::async_trait;
use bloom_core::{TaskId, TaskMode};
use serde::Serialize;
use thiserror::Error;

/// Port the instance agent listens on
pub const AGENT_PORT: u16 = 8080;

/// Errors from instance agent calls
#[derive(Debug, Error)]
pub enum InstanceError {
    #[error("instance request failed: {0}")]
    Http(#[from] reqwest::Error),
    #[error("instance rejected {endpoint} ({status})")]
    Rejected { endpoint: &'static str, status: u16 },
}

/// A task as delivered to the instance.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct TaskDelivery {
    pub task_id: TaskId,
    /// Sanitized task text with the verification token appended
    #[serde(rename = "task")]
    pub payload: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub mode: Option<TaskMode>,
    /// The instance requests teardown when the task completes
    pub auto_shutdown_on_complete: bool,
}

/// Adapter for the instance agent
#[async_trait]
pub trait InstanceAdapter: Clone + Send + Sync + 'static {
    /// Ask the instance to push its working state to durable storage.
    async fn trigger_sync(&self, address: &str, commit_pending: bool) -> Result<(), InstanceError>;

    async fn send_task(&self, address: &str, task: &TaskDelivery) -> Result<(), InstanceError>;
}

#[derive(Serialize)]
#[serde(rename_all = "camelCase")]
struct SyncBody {
    commit_pending: bool,
}

/// Instance adapter speaking plain HTTP with a bearer secret
#[derive(Clone)]
pub struct HttpInstance {
    client: reqwest::Client,
    secret: String,
    port: u16,
}

impl HttpInstance {
    pub fn new(secret: impl Into<String>) -> Result<Self, InstanceError> {
        Ok(Self { client: http::client()?, secret: secret.into(), port: AGENT_PORT })
    }

    pub fn with_port(mut self, port: u16) -> Self {
        self.port = port;
        self
    }

    async fn post<B: Serialize + Sync>(
        &self,
        address: &str,
        endpoint: &'static str,
        body: &B,
    ) -> Result<(), InstanceError> {
        let url = format!("http://{}:{}/{}", address, self.port, endpoint);
        let response = self.client.post(url).bearer_auth(&self.secret).json(body).send().await?;
        let status = response.status();
        if !status.is_success() {
            return Err(InstanceError::Rejected { endpoint, status: status.as_u16() });
        }
        Ok(())
    }
}

#[async_trait]
impl InstanceAdapter for HttpInstance {
    async fn trigger_sync(&self, address: &str, commit_pending: bool) -> Result<(), InstanceError> {
        self.post(address, "sync", &SyncBody { commit_pending }).await
    }

    async fn send_task(&self, address: &str, task: &TaskDelivery) -> Result<(), InstanceError> {
        self.post(address, "task", task).await
    }
}

#[cfg(any(test, feature = "test-support"))]
#[cfg_attr(coverage_nightly, coverage(off))]
mod fake {
    use super::{InstanceAdapter, InstanceError, TaskDelivery};
    use async_trait::async_trait;
    use parking_lot::Mutex;
    use std::sync::Arc;

    /// Recorded instance call
    #[derive(Debug, Clone, PartialEq)]
    pub enum InstanceCall {
        Sync { address: String, commit_pending: bool },
        Task { address: String, task: TaskDelivery },
    }

    #[derive(Default)]
    struct FakeInstanceState {
        calls: Vec<InstanceCall>,
        fail_sync: bool,
        fail_task: bool,
    }

    /// Fake instance agent for testing
    #[derive(Clone, Default)]
    pub struct FakeInstanceAdapter {
        inner: Arc<Mutex<FakeInstanceState>>,
    }

    impl FakeInstanceAdapter {
        pub fn new() -> Self {
            Self::default()
        }

        pub fn fail_sync(&self) {
            self.inner.lock().fail_sync = true;
        }

        pub fn fail_task(&self) {
            self.inner.lock().fail_task = true;
        }

        pub fn calls(&self) -> Vec<InstanceCall> {
            self.inner.lock().calls.clone()
        }

        /// Tasks delivered, including failed attempts.
        pub fn tasks(&self) -> Vec<TaskDelivery> {
            self.calls()
                .into_iter()
                .filter_map(|c| match c {
                    InstanceCall::Task { task, .. } => Some(task),
                    InstanceCall::Sync { .. } => None,
                })
                .collect()
        }

        pub fn sync_count(&self) -> usize {
            self.calls().iter().filter(|c| matches!(c, InstanceCall::Sync { .. })).count()
        }
    }

    #[async_trait]
    impl InstanceAdapter for FakeInstanceAdapter {
        async fn trigger_sync(
            &self,
            address: &str,
            commit_pending: bool,
        ) -> Result<(), InstanceError> {
            let mut inner = self.inner.lock();
            inner.calls.push(InstanceCall::Sync { address: address.to_string(), commit_pending });
            if inner.fail_sync {
                return Err(InstanceError::Rejected { endpoint: "sync", status: 503 });
            }
            Ok(())
        }

        async fn send_task(&self, address: &str, task: &TaskDelivery) -> Result<(), InstanceError> {
            let mut inner = self.inner.lock();
            inner.calls.push(InstanceCall::Task { address: address.to_string(), task: task.clone() });
            if inner.fail_task {
                return Err(InstanceError::Rejected { endpoint: "task", status: 503 });
            }
            Ok(())
        }
    }
}

#[cfg(any(test, feature = "test-support"))]
pub use fake::{FakeInstanceAdapter, InstanceCall};

#[cfg(test)]
#[path = "instance_tests.rs"]
mod tests;

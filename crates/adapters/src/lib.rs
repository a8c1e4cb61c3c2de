// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

// Allow panic!/unwrap/expect in test code
#![cfg_attr(test, allow(clippy::panic))]
#![cfg_attr(test, allow(clippy::unwrap_used))]
#![cfg_attr(test, allow(clippy::expect_used))]

//! Adapters for the systems the control plane drives: the compute
//! provider, DNS and the agent running on the instance.

pub mod dns;
pub mod instance;
pub mod provision;

mod http;

#[cfg(test)]
mod mock_http;

pub use dns::{CloudflareConfig, CloudflareDns, DnsAdapter, DnsClient, DnsError, DnsRecord, NoOpDns};
pub use instance::{HttpInstance, InstanceAdapter, InstanceError, TaskDelivery, AGENT_PORT};
pub use provision::{
    HetznerConfig, HetznerProvisioner, ProvisionAdapter, ProvisionError, ProvisionRequest,
    ProvisionedServer, ServerInfo,
};

#[cfg(any(test, feature = "test-support"))]
pub use dns::FakeDnsAdapter;
#[cfg(any(test, feature = "test-support"))]
pub use instance::{FakeInstanceAdapter, InstanceCall};
#[cfg(any(test, feature = "test-support"))]
pub use provision::{FakeProvisionAdapter, ProvisionCall};

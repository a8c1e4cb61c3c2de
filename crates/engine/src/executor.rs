// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Effect executor

use bloom_adapters::{
    DnsAdapter, DnsError, InstanceAdapter, InstanceError, ProvisionAdapter, ProvisionError,
    ProvisionRequest, TaskDelivery,
};
use bloom_core::Effect;
use thiserror::Error;

/// Errors that can occur during effect execution
#[derive(Debug, Error)]
pub enum ExecuteError {
    #[error("provider error: {0}")]
    Provision(#[from] ProvisionError),
    #[error("dns error: {0}")]
    Dns(#[from] DnsError),
    #[error("instance error: {0}")]
    Instance(#[from] InstanceError),
    #[error("provider returned no instance handle")]
    MissingHandle,
}

/// What an effect produced, if anything the orchestrator needs back.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum EffectOutcome {
    Provisioned { instance_id: String },
    Completed,
}

/// Executes effects using the configured adapters
#[derive(Clone)]
pub struct Executor<P, D, I> {
    provisioner: P,
    dns: D,
    instance: I,
}

impl<P, D, I> Executor<P, D, I>
where
    P: ProvisionAdapter,
    D: DnsAdapter,
    I: InstanceAdapter,
{
    pub fn new(provisioner: P, dns: D, instance: I) -> Self {
        Self { provisioner, dns, instance }
    }

    /// Execute a single effect with tracing
    pub async fn execute(&self, effect: Effect) -> Result<EffectOutcome, ExecuteError> {
        // Format the fields as `key=val`
        let info = {
            let fields = effect.fields();
            let cap = fields.iter().map(|(a, b)| a.len() + b.len() + 2).sum();
            let mut fmt = String::with_capacity(cap);
            for (key, val) in fields {
                fmt.push_str(key);
                fmt.push('=');
                fmt.push_str(&val);
                fmt.push(' ');
            }
            fmt.pop();
            fmt
        };
        let op = effect.name();

        let start = std::time::Instant::now();
        let result = self.execute_inner(effect).await;
        let elapsed_ms = start.elapsed().as_millis() as u64;
        match &result {
            Ok(_) => tracing::info!(elapsed_ms, "executed effect={} {}", op, info),
            Err(e) => tracing::error!(error = %e, elapsed_ms, "error effect={} {}", op, info),
        }
        result
    }

    async fn execute_inner(&self, effect: Effect) -> Result<EffectOutcome, ExecuteError> {
        match effect {
            Effect::Provision { session_id, region, idle_timeout_secs } => {
                let request = ProvisionRequest { session_id, region, idle_timeout_secs };
                let server = self.provisioner.create(&request).await?;
                Ok(EffectOutcome::Provisioned { instance_id: server.instance_id })
            }

            Effect::Deprovision { instance_id } => {
                self.provisioner.delete(&instance_id).await?;
                Ok(EffectOutcome::Completed)
            }

            Effect::UpdateDns { address } => {
                self.dns.update_record(&address).await?;
                Ok(EffectOutcome::Completed)
            }

            Effect::TriggerSync { address, commit_pending } => {
                self.instance.trigger_sync(&address, commit_pending).await?;
                Ok(EffectOutcome::Completed)
            }

            Effect::SendTask { address, task_id, payload, mode, shutdown_on_complete } => {
                let delivery = TaskDelivery {
                    task_id,
                    payload,
                    mode,
                    auto_shutdown_on_complete: shutdown_on_complete,
                };
                self.instance.send_task(&address, &delivery).await?;
                Ok(EffectOutcome::Completed)
            }
        }
    }
}

#[cfg(test)]
#[path = "executor_tests.rs"]
mod tests;

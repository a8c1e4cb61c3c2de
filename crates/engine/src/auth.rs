// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Shared-secret authentication for instance webhooks.

use sha2::{Digest, Sha256};
use std::fmt;

/// The webhook secret, held only as its SHA-256 digest.
///
/// Verification compares digests with a full-length fold so the time taken
/// does not depend on where the first differing byte is.
#[derive(Clone)]
pub struct WebhookSecret {
    digest: [u8; 32],
    configured: bool,
}

impl WebhookSecret {
    pub fn new(secret: &str) -> Self {
        Self { digest: digest(secret), configured: !secret.is_empty() }
    }

    /// Whether `presented` matches. An empty configured secret matches nothing.
    pub fn verify(&self, presented: Option<&str>) -> bool {
        let Some(presented) = presented else {
            return false;
        };
        let candidate = digest(presented);
        let diff = candidate.iter().zip(self.digest.iter()).fold(0u8, |acc, (a, b)| acc | (a ^ b));
        self.configured && diff == 0
    }
}

impl fmt::Debug for WebhookSecret {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("WebhookSecret").field("configured", &self.configured).finish()
    }
}

fn digest(value: &str) -> [u8; 32] {
    Sha256::digest(value.as_bytes()).into()
}

#[cfg(test)]
#[path = "auth_tests.rs"]
mod tests;

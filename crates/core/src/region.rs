// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Provisioning regions and their pricing.

use serde::{Deserialize, Serialize};
use std::str::FromStr;
use thiserror::Error;

/// Region an instance can be provisioned in.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Region {
    #[default]
    Eu,
    Us,
}

/// Provider placement and price for a region.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct RegionSpec {
    pub datacenter: &'static str,
    pub server_type: &'static str,
    /// Hourly price in USD
    pub hourly_rate: f64,
}

const EU: RegionSpec = RegionSpec { datacenter: "fsn1-dc14", server_type: "cx32", hourly_rate: 0.0085 };
const US: RegionSpec = RegionSpec { datacenter: "ash-dc1", server_type: "cpx31", hourly_rate: 0.022 };

impl Region {
    pub const ALL: [Region; 2] = [Region::Eu, Region::Us];

    pub fn spec(self) -> RegionSpec {
        match self {
            Region::Eu => EU,
            Region::Us => US,
        }
    }

    pub fn hourly_rate(self) -> f64 {
        self.spec().hourly_rate
    }

    pub fn server_type(self) -> &'static str {
        self.spec().server_type
    }

    pub fn as_str(self) -> &'static str {
        match self {
            Region::Eu => "eu",
            Region::Us => "us",
        }
    }
}

crate::simple_display! {
    Region {
        Eu => "eu",
        Us => "us",
    }
}

#[derive(Debug, Error, PartialEq, Eq)]
#[error("unknown region: {0}")]
pub struct UnknownRegion(pub String);

impl FromStr for Region {
    type Err = UnknownRegion;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "eu" => Ok(Region::Eu),
            "us" => Ok(Region::Us),
            other => Err(UnknownRegion(other.to_string())),
        }
    }
}

/// Cost in USD of running for `elapsed_secs` at `hourly_rate`.
///
/// Rounded to four decimal places; hourly rates are fractions of a cent.
pub fn session_cost(elapsed_secs: u64, hourly_rate: f64) -> f64 {
    let raw = elapsed_secs as f64 / 3600.0 * hourly_rate;
    (raw * 10_000.0).round() / 10_000.0
}

#[cfg(test)]
#[path = "region_tests.rs"]
mod tests;

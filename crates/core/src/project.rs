// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Repositories synced onto the instance.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ProjectRecord {
    pub id: u64,
    pub name: String,
    pub url: String,
    pub branch: String,
    pub path: String,
    pub enabled: bool,
    #[serde(default)]
    pub last_sync: Option<DateTime<Utc>>,
    pub created_at: DateTime<Utc>,
}

/// Request to register a project.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct NewProject {
    pub name: String,
    pub url: String,
    #[serde(default)]
    pub branch: Option<String>,
    #[serde(default)]
    pub path: Option<String>,
}

impl NewProject {
    /// Check required fields, returning a reason on failure.
    pub fn validate(&self) -> Result<(), String> {
        if self.name.trim().is_empty() {
            return Err("project name is required".to_string());
        }
        if self.url.trim().is_empty() {
            return Err("project url is required".to_string());
        }
        if self.name.contains('/') || self.name.contains("..") {
            return Err(format!("invalid project name: {}", self.name));
        }
        Ok(())
    }

    /// Materialize with store-assigned id and creation time.
    ///
    /// Branch defaults to `main`; the checkout path defaults to `projects/{name}`.
    pub fn into_record(self, id: u64, created_at: DateTime<Utc>) -> ProjectRecord {
        let name = self.name.trim().to_string();
        let path = self.path.unwrap_or_else(|| format!("projects/{name}"));
        ProjectRecord {
            id,
            url: self.url.trim().to_string(),
            branch: self.branch.unwrap_or_else(|| "main".to_string()),
            path,
            name,
            enabled: true,
            last_sync: None,
            created_at,
        }
    }
}

#[cfg(test)]
#[path = "project_tests.rs"]
mod tests;

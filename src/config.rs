// Copyright 2026, Jeroen van Erp <jeroen@geeko.me>
// SPDX-License-Identifier: Apache-2.0
use crate::constants::{names, poll};
use crate::converge::PollSettings;
use anyhow::{Context, Result};
use std::env;
use std::time::Duration;

/// Validation run configuration loaded from environment variables
#[derive(Debug, Clone)]
pub struct Config {
    /// Cluster the scenarios run against
    pub cluster_id: String,
    /// Namespace holding provisioning clusters on the management cluster
    pub fleet_namespace: String,
    pub poll: PollSettings,
    pub testing_mode: bool,
}

impl Config {
    /// Load configuration from environment variables
    pub fn from_env() -> Result<Self> {
        Self::from_lookup(|key| env::var(key).ok())
    }

    fn from_lookup(lookup: impl Fn(&str) -> Option<String>) -> Result<Self> {
        let cluster_id =
            lookup("CLUSTER_ID").unwrap_or_else(|| names::LOCAL_CLUSTER_ID.to_string());
        let fleet_namespace =
            lookup("FLEET_NAMESPACE").unwrap_or_else(|| names::FLEET_NAMESPACE.to_string());

        let interval_ms: u64 = match lookup("POLL_INTERVAL_MS") {
            Some(v) => v
                .parse()
                .with_context(|| format!("POLL_INTERVAL_MS is not a number: {}", v))?,
            None => poll::INTERVAL_MS,
        };
        let timeout_secs: u64 = match lookup("POLL_TIMEOUT_SECS") {
            Some(v) => v
                .parse()
                .with_context(|| format!("POLL_TIMEOUT_SECS is not a number: {}", v))?,
            None => poll::TIMEOUT_SECS,
        };
        let poll = PollSettings::new(
            Duration::from_millis(interval_ms),
            Duration::from_secs(timeout_secs),
        )?;

        // For testing, uses the KUBECONFIG env var to create downstream clients
        // instead of fetching kubeconfig from secrets
        let testing_mode: bool = lookup("TESTING_MODE")
            .and_then(|v| v.parse().ok())
            .unwrap_or(false);

        Ok(Config {
            cluster_id,
            fleet_namespace,
            poll,
            testing_mode,
        })
    }
}

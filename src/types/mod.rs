// Copyright 2026, Jeroen van Erp <jeroen@geeko.me>
// SPDX-License-Identifier: Apache-2.0

//! Rancher custom resources used by the checks.

pub mod cluster;
pub mod project;

pub use cluster::Cluster;
pub use project::{ContainerResourceLimit, Project, ProjectSpec, ResourceQuotaLimit};

/// Append a random lowercase suffix to `prefix`, e.g. `testns-3f9a1`
pub fn append_random_string(prefix: &str) -> String {
    let id = uuid::Uuid::new_v4().simple().to_string();
    format!("{}{}", prefix, &id[..5])
}

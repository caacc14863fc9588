// Copyright 2026, Jeroen van Erp <jeroen@geeko.me>
// SPDX-License-Identifier: Apache-2.0

/// Rancher annotation and label keys inspected by the checks
pub mod annotations {
    /// Namespace resource quota requested through the project, as JSON
    pub const RESOURCE_QUOTA: &str = "field.cattle.io/resourceQuota";
    /// Container default resource limits inherited from the project, as JSON
    pub const CONTAINER_DEFAULT_LIMIT: &str = "field.cattle.io/containerDefaultResourceLimit";
    /// Rancher status conditions of a namespace, as JSON
    pub const STATUS: &str = "cattle.io/status";
    /// `<cluster-id>:<project-name>` of the owning project
    pub const PROJECT_ID: &str = "field.cattle.io/projectId";
}

/// Condition types reported in the `cattle.io/status` annotation
pub mod conditions {
    pub const RESOURCE_QUOTA_VALIDATED: &str = "ResourceQuotaValidated";
}

/// Names and prefixes used for generated test objects
pub mod names {
    /// Cluster ID of the Rancher management cluster
    pub const LOCAL_CLUSTER_ID: &str = "local";
    pub const PROJECT_PREFIX: &str = "testproject-";
    pub const NAMESPACE_PREFIX: &str = "testns-";
    pub const PRTB_PREFIX: &str = "prtb-";
    /// Namespace holding provisioning clusters
    pub const FLEET_NAMESPACE: &str = "fleet-default";
}

/// Default convergence polling
pub mod poll {
    pub const INTERVAL_MS: u64 = 500;
    pub const TIMEOUT_SECS: u64 = 10;
}

// Copyright 2026, Jeroen van Erp <jeroen@geeko.me>
// SPDX-License-Identifier: Apache-2.0
use crate::constants::names;
use crate::types::append_random_string;
use kube::api::ObjectMeta;
use kube::CustomResource;
use serde::{Deserialize, Serialize};

/// A Rancher project, living in the management cluster namespace named after its cluster ID.
#[derive(CustomResource, Serialize, Deserialize, Clone, Debug, Default, schemars::JsonSchema)]
#[kube(group = "management.cattle.io", version = "v3", kind = "Project")]
#[kube(namespaced)]
#[serde(rename_all = "camelCase")]
pub struct ProjectSpec {
    pub cluster_name: String,
    pub display_name: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub resource_quota: Option<ProjectResourceQuota>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub namespace_default_resource_quota: Option<NamespaceResourceQuota>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub container_default_resource_limit: Option<ContainerResourceLimit>,
}

#[derive(Serialize, Deserialize, Clone, Debug, Default, PartialEq, Eq, schemars::JsonSchema)]
#[serde(rename_all = "camelCase")]
pub struct ProjectResourceQuota {
    #[serde(default)]
    pub limit: ResourceQuotaLimit,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub used_limit: Option<ResourceQuotaLimit>,
}

#[derive(Serialize, Deserialize, Clone, Debug, Default, PartialEq, Eq, schemars::JsonSchema)]
#[serde(rename_all = "camelCase")]
pub struct NamespaceResourceQuota {
    #[serde(default)]
    pub limit: ResourceQuotaLimit,
}

/// Quantities as strings, exactly as Rancher stores them
#[derive(Serialize, Deserialize, Clone, Debug, Default, PartialEq, Eq, schemars::JsonSchema)]
#[serde(rename_all = "camelCase")]
pub struct ResourceQuotaLimit {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub pods: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub services: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub secrets: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub config_maps: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub persistent_volume_claims: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub requests_cpu: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub requests_memory: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub limits_cpu: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub limits_memory: Option<String>,
}

/// Default limits and requests applied to every container of the project's namespaces
#[derive(Serialize, Deserialize, Clone, Debug, Default, PartialEq, Eq, schemars::JsonSchema)]
#[serde(rename_all = "camelCase")]
pub struct ContainerResourceLimit {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub limits_cpu: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub requests_cpu: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub limits_memory: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub requests_memory: Option<String>,
}

fn non_empty(value: &str) -> Option<String> {
    (!value.is_empty()).then(|| value.to_string())
}

impl ContainerResourceLimit {
    /// Empty strings mean "not set"
    pub fn new(
        cpu_limit: &str,
        cpu_reservation: &str,
        memory_limit: &str,
        memory_reservation: &str,
    ) -> Self {
        Self {
            limits_cpu: non_empty(cpu_limit),
            requests_cpu: non_empty(cpu_reservation),
            limits_memory: non_empty(memory_limit),
            requests_memory: non_empty(memory_reservation),
        }
    }
}

impl Project {
    /// A project to be created in `cluster_id` with a generated name and display name
    pub fn template(cluster_id: &str) -> Self {
        Project {
            metadata: ObjectMeta {
                generate_name: Some(names::PROJECT_PREFIX.to_string()),
                namespace: Some(cluster_id.to_string()),
                ..Default::default()
            },
            spec: ProjectSpec {
                cluster_name: cluster_id.to_string(),
                display_name: append_random_string(names::PROJECT_PREFIX),
                ..Default::default()
            },
        }
    }

    /// Set the pod limit of the project and the default pod limit of its namespaces
    pub fn with_pod_quotas(mut self, namespace_pod_limit: &str, project_pod_limit: &str) -> Self {
        self.spec
            .namespace_default_resource_quota
            .get_or_insert_with(Default::default)
            .limit
            .pods = non_empty(namespace_pod_limit);
        self.spec
            .resource_quota
            .get_or_insert_with(Default::default)
            .limit
            .pods = non_empty(project_pod_limit);
        self
    }

    pub fn with_container_limits(mut self, limits: &ContainerResourceLimit) -> Self {
        self.spec.container_default_resource_limit = Some(limits.clone());
        self
    }

    /// `<cluster-id>:<project-name>`, the value of the namespace project annotation
    pub fn project_id(&self) -> String {
        format!(
            "{}:{}",
            self.spec.cluster_name,
            self.metadata.name.as_deref().unwrap_or_default()
        )
    }
}

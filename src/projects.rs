// Copyright 2026, Jeroen van Erp <jeroen@geeko.me>
// SPDX-License-Identifier: Apache-2.0

//! Project and namespace setup for scenarios

use crate::constants::names;
use crate::error::{Result, ValidationError};
use crate::fixtures::{prtb_resource, project_role_template_binding};
use crate::kubernetes::{create_project_namespace, RancherClient};
use crate::types::{append_random_string, ContainerResourceLimit, Project};
use k8s_openapi::api::core::v1::Namespace;
use kube::{
    api::{DynamicObject, PostParams},
    Api, ResourceExt,
};
use tracing::{info, instrument};

/// Create a project on the management cluster
#[instrument(skip(rancher, project), fields(cluster = %project.spec.cluster_name))]
pub async fn create_project(rancher: &RancherClient, project: &Project) -> Result<Project> {
    let namespace = project
        .namespace()
        .unwrap_or_else(|| project.spec.cluster_name.clone());
    let projects: Api<Project> = Api::namespaced(rancher.management().clone(), &namespace);

    let created = projects.create(&PostParams::default(), project).await?;
    info!(
        "Created project {} ({})",
        created.name_any(),
        created.spec.display_name
    );
    Ok(created)
}

/// Create the project and one `testns-` namespace in it
#[instrument(skip(rancher, project))]
pub async fn create_project_and_namespace(
    rancher: &RancherClient,
    cluster_id: &str,
    project: &Project,
) -> Result<(Project, Namespace)> {
    let created_project = create_project(rancher, project).await?;

    let client = rancher.cluster_client(cluster_id).await?;
    let namespace_name = append_random_string(names::NAMESPACE_PREFIX);
    let created_namespace =
        create_project_namespace(&client, cluster_id, &created_project.name_any(), &namespace_name)
            .await?;

    Ok((created_project, created_namespace))
}

pub async fn create_project_and_namespace_with_quotas(
    rancher: &RancherClient,
    cluster_id: &str,
    namespace_pod_limit: &str,
    project_pod_limit: &str,
) -> Result<(Project, Namespace)> {
    let project =
        Project::template(cluster_id).with_pod_quotas(namespace_pod_limit, project_pod_limit);
    create_project_and_namespace(rancher, cluster_id, &project).await
}

pub async fn create_project_and_namespace_with_limits(
    rancher: &RancherClient,
    cluster_id: &str,
    limits: &ContainerResourceLimit,
) -> Result<(Project, Namespace)> {
    let project = Project::template(cluster_id).with_container_limits(limits);
    create_project_and_namespace(rancher, cluster_id, &project).await
}

/// Replace the container default limits of an existing project
#[instrument(skip(rancher, existing, limits), fields(project = %existing.name_any()))]
pub async fn update_project_container_resource_limit(
    rancher: &RancherClient,
    existing: &Project,
    limits: &ContainerResourceLimit,
) -> Result<Project> {
    let namespace = existing
        .namespace()
        .unwrap_or_else(|| existing.spec.cluster_name.clone());
    let projects: Api<Project> = Api::namespaced(rancher.management().clone(), &namespace);

    let updated = existing.clone().with_container_limits(limits);
    let replaced = projects
        .replace(&existing.name_any(), &PostParams::default(), &updated)
        .await?;
    info!("Updated container default limits of project {}", replaced.name_any());
    Ok(replaced)
}

/// Create `count` namespaces in the project; the first failure aborts the rest
#[instrument(skip(rancher))]
pub async fn create_namespaces_in_project(
    rancher: &RancherClient,
    cluster_id: &str,
    project_name: &str,
    count: usize,
) -> Result<Vec<Namespace>> {
    let client = rancher.cluster_client(cluster_id).await?;
    let mut namespaces = Vec::with_capacity(count);

    for _ in 0..count {
        let name = append_random_string(names::NAMESPACE_PREFIX);
        let ns = create_project_namespace(&client, cluster_id, project_name, &name)
            .await
            .map_err(|e| {
                ValidationError::NamespaceError(format!(
                    "failed to create {} namespaces: {}",
                    count, e
                ))
            })?;
        namespaces.push(ns);
    }

    Ok(namespaces)
}

/// Grant `role_template` on the project to `user_principal`
#[instrument(skip(rancher, project), fields(project = %project.name_any()))]
pub async fn create_project_role_template_binding(
    rancher: &RancherClient,
    project: &Project,
    role_template: &str,
    user_principal: &str,
) -> Result<DynamicObject> {
    let prtb = project_role_template_binding(project, role_template, user_principal);
    let bindings: Api<DynamicObject> =
        Api::namespaced_with(rancher.management().clone(), &project.name_any(), &prtb_resource());

    Ok(bindings.create(&PostParams::default(), &prtb).await?)
}

// Copyright 2026, Jeroen van Erp <jeroen@geeko.me>
// SPDX-License-Identifier: Apache-2.0
use anyhow::Result;
use futures::future::try_join_all;
use kube::{Client, ResourceExt};
use tracing::info;

use project_checks::checks::{
    wait_for_namespace_resource_quota, wait_for_namespace_resource_quota_validation_status,
};
use project_checks::config::Config;
use project_checks::converge::PollSettings;
use project_checks::kubernetes::RancherClient;
use project_checks::projects::{
    create_namespaces_in_project, create_project_and_namespace_with_quotas,
};

const NAMESPACE_POD_LIMIT: &str = "2";
const PROJECT_POD_LIMIT: &str = "10";
const EXTRA_NAMESPACES: usize = 2;

/// Every namespace of the project gets its own quota with the default pod limit
async fn verify_namespace(client: &Client, namespace: &str, poll: &PollSettings) -> Result<()> {
    let pod_limit: i64 = NAMESPACE_POD_LIMIT.parse()?;
    wait_for_namespace_resource_quota(client, namespace, pod_limit, poll).await?;
    wait_for_namespace_resource_quota_validation_status(
        client,
        namespace,
        NAMESPACE_POD_LIMIT,
        true,
        "",
        poll,
    )
    .await?;
    info!("Namespace {} converged", namespace);
    Ok(())
}

#[tokio::main]
async fn main() -> Result<()> {
    tracing_subscriber::fmt::init();

    info!("Starting project quota validation");

    let config = Config::from_env()?;
    info!(
        "Configuration loaded: cluster_id={}, poll={:?}",
        config.cluster_id, config.poll
    );

    let client = Client::try_default().await?;
    info!("Connected to Rancher management cluster");

    let rancher = RancherClient::new(client, config);
    let cluster_id = rancher.config().cluster_id.as_str();
    let poll = &rancher.config().poll;

    let (project, namespace) = create_project_and_namespace_with_quotas(
        &rancher,
        cluster_id,
        NAMESPACE_POD_LIMIT,
        PROJECT_POD_LIMIT,
    )
    .await?;
    let extra =
        create_namespaces_in_project(&rancher, cluster_id, &project.name_any(), EXTRA_NAMESPACES)
            .await?;

    let downstream = rancher.cluster_client(cluster_id).await?;
    let names: Vec<String> = std::iter::once(namespace)
        .chain(extra)
        .map(|ns| ns.name_any())
        .collect();

    // Namespaces are independent, verify them concurrently
    try_join_all(
        names
            .iter()
            .map(|name| verify_namespace(&downstream, name, poll)),
    )
    .await?;

    info!(
        "Project {} and its {} namespaces converged",
        project.name_any(),
        names.len()
    );
    Ok(())
}

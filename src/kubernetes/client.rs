// Copyright 2026, Jeroen van Erp <jeroen@geeko.me>
// SPDX-License-Identifier: Apache-2.0

//! Management and downstream cluster clients

use crate::config::Config;
use crate::constants::names::LOCAL_CLUSTER_ID;
use crate::error::{Result, ValidationError};
use crate::types::cluster::Cluster;
use http::Uri;
use k8s_openapi::api::core::v1::Secret;
use kube::{
    api::ListParams, config::KubeConfigOptions, Api, Client, Config as KConfig, ResourceExt,
};
use tracing::{debug, info, instrument};

/// Entry point of every scenario: the Rancher management cluster plus a way to
/// reach the downstream clusters it manages.
#[derive(Clone)]
pub struct RancherClient {
    management: Client,
    config: Config,
}

impl RancherClient {
    pub fn new(management: Client, config: Config) -> Self {
        Self { management, config }
    }

    /// Client for the Rancher management cluster, where projects live
    pub fn management(&self) -> &Client {
        &self.management
    }

    pub fn config(&self) -> &Config {
        &self.config
    }

    /// Client for the cluster with the given management cluster ID
    #[instrument(skip(self))]
    pub async fn cluster_client(&self, cluster_id: &str) -> Result<Client> {
        if cluster_id == LOCAL_CLUSTER_ID {
            return Ok(self.management.clone());
        }

        let cluster = self.find_cluster(cluster_id).await?;
        if !cluster.is_ready() {
            return Err(ValidationError::ClusterNotReady(cluster_id.to_string()));
        }

        if self.config.testing_mode {
            create_testing_client(cluster_id).await
        } else {
            let kubeconfig = get_cluster_kubeconfig(&self.management, &cluster).await?;
            create_client_from_kubeconfig(&kubeconfig).await
        }
    }

    async fn find_cluster(&self, cluster_id: &str) -> Result<Cluster> {
        let clusters: Api<Cluster> =
            Api::namespaced(self.management.clone(), &self.config.fleet_namespace);
        let cluster_list = clusters.list(&ListParams::default()).await?;

        cluster_list
            .items
            .into_iter()
            .find(|c| c.cluster_id() == Some(cluster_id))
            .ok_or_else(|| ValidationError::NotFound(format!("cluster {}", cluster_id)))
    }
}

/// Point a `.../clusters/local` proxy URL at `cluster_id`; other URLs are left alone
fn testing_cluster_url(url: &Uri, cluster_id: &str) -> Option<String> {
    let (parent, last) = url.path().trim_end_matches('/').rsplit_once('/')?;
    if last != LOCAL_CLUSTER_ID {
        return None;
    }
    let scheme = url.scheme_str().unwrap_or("https");
    Some(format!("{}://{}{}/{}", scheme, url.authority()?, parent, cluster_id))
}

/// Create a client for testing mode (points the inferred config at the cluster proxy)
async fn create_testing_client(cluster_id: &str) -> Result<Client> {
    let mut c = KConfig::infer()
        .await
        .map_err(|e| ValidationError::KubeconfigError(format!("Failed to infer config: {}", e)))?;

    if let Some(new_url) = testing_cluster_url(&c.cluster_url, cluster_id) {
        debug!("Testing mode: modifying cluster URL from {} to {}", c.cluster_url, new_url);
        c.cluster_url = new_url
            .parse()
            .map_err(|e| ValidationError::KubeconfigError(format!("Invalid URL: {}", e)))?;
    }

    Client::try_from(c)
        .map_err(|e| ValidationError::KubeconfigError(format!("Failed to create client: {}", e)))
}

/// Get the kubeconfig stored for a downstream cluster
#[instrument(skip(client, cluster), fields(cluster = %cluster.name_any()))]
async fn get_cluster_kubeconfig(client: &Client, cluster: &Cluster) -> Result<String> {
    let cluster_name = cluster.name_any();
    let secret_name = cluster.kubeconfig_secret_name();
    let namespace = cluster
        .namespace()
        .unwrap_or_else(|| crate::constants::names::FLEET_NAMESPACE.to_string());
    let secrets: Api<Secret> = Api::namespaced(client.clone(), &namespace);

    info!(
        "Getting kubeconfig secret '{}/{}' for cluster '{}'...",
        namespace, secret_name, cluster_name
    );

    let secret = secrets.get(&secret_name).await.map_err(|e| {
        ValidationError::KubeconfigError(format!(
            "Failed to get kubeconfig secret for cluster {}: {}",
            cluster_name, e
        ))
    })?;

    let Some(kubeconfig_data) = secret.data.as_ref().and_then(|d| d.get("value")) else {
        return Err(ValidationError::KubeconfigError(format!(
            "Kubeconfig secret for cluster {} does not contain 'value' key",
            cluster_name
        )));
    };

    String::from_utf8(kubeconfig_data.0.clone()).map_err(|e| {
        ValidationError::KubeconfigError(format!(
            "Failed to decode kubeconfig for cluster {}: {}",
            cluster_name, e
        ))
    })
}

async fn create_client_from_kubeconfig(kubeconfig: &str) -> Result<Client> {
    use kube::config::Kubeconfig;

    let kubeconfig_parsed: Kubeconfig = serde_yaml::from_str(kubeconfig).map_err(|e| {
        ValidationError::KubeconfigError(format!("Failed to parse kubeconfig: {}", e))
    })?;

    let client_config =
        kube::Config::from_custom_kubeconfig(kubeconfig_parsed, &KubeConfigOptions::default())
            .await
            .map_err(|e| {
                ValidationError::KubeconfigError(format!("Failed to create config: {}", e))
            })?;

    Client::try_from(client_config)
        .map_err(|e| ValidationError::KubeconfigError(format!("Failed to create client: {}", e)))
}

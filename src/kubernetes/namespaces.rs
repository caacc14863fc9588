// Copyright 2026, Jeroen van Erp <jeroen@geeko.me>
// SPDX-License-Identifier: Apache-2.0

//! Namespace management utilities

use crate::constants::annotations;
use crate::error::{Result, ValidationError};
use k8s_openapi::api::core::v1::Namespace;
use kube::{
    api::{ObjectMeta, PostParams},
    Api, Client,
};
use std::collections::BTreeMap;
use tracing::{debug, info, instrument};

/// Create a namespace assigned to a project of the given cluster
#[instrument(skip(client))]
pub async fn create_project_namespace(
    client: &Client,
    cluster_id: &str,
    project_name: &str,
    name: &str,
) -> Result<Namespace> {
    let namespaces: Api<Namespace> = Api::all(client.clone());
    let project_id = format!("{}:{}", cluster_id, project_name);

    let ns = Namespace {
        metadata: ObjectMeta {
            name: Some(name.to_string()),
            annotations: Some(BTreeMap::from([(
                annotations::PROJECT_ID.to_string(),
                project_id.clone(),
            )])),
            labels: Some(BTreeMap::from([(
                annotations::PROJECT_ID.to_string(),
                project_name.to_string(),
            )])),
            ..Default::default()
        },
        ..Default::default()
    };

    info!("Creating namespace {} in project {}", name, project_id);
    let created = namespaces
        .create(&PostParams::default(), &ns)
        .await
        .map_err(|e| {
            ValidationError::NamespaceError(format!("Failed to create namespace {}: {}", name, e))
        })?;
    debug!("Namespace {} created", name);

    Ok(created)
}

/// Get a namespace, `None` if it does not exist (yet)
pub async fn get_namespace(client: &Client, name: &str) -> Result<Option<Namespace>> {
    let namespaces: Api<Namespace> = Api::all(client.clone());
    Ok(namespaces.get_opt(name).await?)
}

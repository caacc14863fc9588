// Copyright 2026, Jeroen van Erp <jeroen@geeko.me>
// SPDX-License-Identifier: Apache-2.0

//! Deployment status checks

use super::ConvergeResult;
use crate::converge::{
    ensure_converged, verify_converged, DesiredState, ObservedState, PollSettings,
};
use crate::error::{Result, ValidationError};
use k8s_openapi::api::apps::v1::{Deployment, DeploymentCondition};
use kube::{api::ListParams, Api, Client, ResourceExt};
use tracing::instrument;

pub const CONDITION_MESSAGE: &str = "conditionMessage";
pub const CONDITION_REASON: &str = "conditionReason";
pub const READY_REPLICAS: &str = "readyReplicas";

/// Message and reason of a deployment condition
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct ConditionSummary {
    pub message: String,
    pub reason: String,
}

/// The most recently updated condition of the given type, if the deployment has one.
///
/// Only a strictly newer `lastUpdateTime` replaces a candidate, so among equal
/// timestamps the first listed condition wins and an untimestamped condition
/// never beats a timestamped one.
pub fn latest_status_condition(
    deployment: &Deployment,
    condition_type: &str,
) -> Option<ConditionSummary> {
    let updated = |c: &DeploymentCondition| c.last_update_time.as_ref().map(|t| t.0);
    deployment
        .status
        .as_ref()
        .and_then(|s| s.conditions.as_ref())?
        .iter()
        .filter(|c| c.type_ == condition_type)
        .reduce(|latest, c| if updated(c) > updated(latest) { c } else { latest })
        .map(|c| ConditionSummary {
            message: c.message.clone().unwrap_or_default(),
            reason: c.reason.clone().unwrap_or_default(),
        })
}

/// What a deployment is expected to report once the project's quota applied
#[derive(Clone, Debug)]
pub struct ExpectedDeploymentStatus {
    pub condition_type: String,
    /// Substring of the condition reason
    pub reason: String,
    /// Substring of the condition message
    pub message: String,
    pub ready_replicas: i32,
}

impl ExpectedDeploymentStatus {
    fn desired(&self) -> DesiredState {
        DesiredState::new()
            .contains(CONDITION_REASON, self.reason.as_str())
            .contains(CONDITION_MESSAGE, self.message.as_str())
            .equals(READY_REPLICAS, self.ready_replicas)
    }
}

/// A deployment lacking the condition leaves its fields out, so they show up as missing
pub fn deployment_status_state(deployment: &Deployment, condition_type: &str) -> ObservedState {
    let ready = deployment
        .status
        .as_ref()
        .and_then(|s| s.ready_replicas)
        .unwrap_or(0);
    let mut state = ObservedState::new().with(READY_REPLICAS, ready);

    if let Some(condition) = latest_status_condition(deployment, condition_type) {
        state.set(CONDITION_MESSAGE, condition.message);
        state.set(CONDITION_REASON, condition.reason);
    }

    state
}

async fn find_deployment(
    client: &Client,
    namespace: &str,
    name: &str,
) -> Result<Option<Deployment>> {
    let deployments: Api<Deployment> = Api::namespaced(client.clone(), namespace);
    let list = deployments
        .list(&ListParams::default().fields(&format!("metadata.name={}", name)))
        .await?;
    Ok(list.items.into_iter().next())
}

/// Re-read a deployment from the cluster
#[instrument(skip(client, deployment), fields(deployment = %deployment.name_any()))]
pub async fn get_deployment(client: &Client, deployment: &Deployment) -> Result<Deployment> {
    let namespace = deployment.namespace().unwrap_or_default();
    let deployments: Api<Deployment> = Api::namespaced(client.clone(), &namespace);
    deployments
        .get_opt(&deployment.name_any())
        .await?
        .ok_or_else(|| {
            ValidationError::NotFound(format!("deployment {}/{}", namespace, deployment.name_any()))
        })
}

#[instrument(skip(client, expected))]
pub async fn check_deployment_status(
    client: &Client,
    namespace: &str,
    deployment_name: &str,
    expected: &ExpectedDeploymentStatus,
) -> Result<()> {
    let deployment = find_deployment(client, namespace, deployment_name)
        .await?
        .ok_or_else(|| ValidationError::NotFound(format!("deployment {}", deployment_name)))?;

    ensure_converged(
        &expected.desired(),
        &deployment_status_state(&deployment, &expected.condition_type),
    )
}

#[instrument(skip(client, expected, settings))]
pub async fn wait_for_deployment_status(
    client: &Client,
    namespace: &str,
    deployment_name: &str,
    expected: &ExpectedDeploymentStatus,
    settings: &PollSettings,
) -> ConvergeResult {
    let desired = expected.desired();
    verify_converged(
        || async {
            let deployment = find_deployment(client, namespace, deployment_name).await?;
            Ok::<_, ValidationError>(
                deployment
                    .map(|d| deployment_status_state(&d, &expected.condition_type))
                    .unwrap_or_default(),
            )
        },
        |observed| desired.diff(observed),
        settings,
    )
    .await
}

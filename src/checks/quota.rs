// Copyright 2026, Jeroen van Erp <jeroen@geeko.me>
// SPDX-License-Identifier: Apache-2.0

//! ResourceQuota checks

use super::ConvergeResult;
use crate::converge::{
    ensure_converged, verify_converged, DesiredState, FieldValue, ObservedState, PollSettings,
};
use crate::error::{Result, ValidationError};
use k8s_openapi::api::core::v1::ResourceQuota;
use kube::{api::ListParams, Api, Client};
use tracing::instrument;

pub const QUOTA_COUNT: &str = "resourceQuotaCount";
pub const PODS: &str = "pods";

/// Number of quotas in the namespace and, when there is exactly one, its hard pod limit
pub fn resource_quota_state(quotas: &[ResourceQuota]) -> ObservedState {
    let mut state = ObservedState::new().with(QUOTA_COUNT, quotas.len() as i64);

    if let [quota] = quotas {
        let pods = quota
            .spec
            .as_ref()
            .and_then(|s| s.hard.as_ref())
            .and_then(|hard| hard.get(PODS))
            .map(|q| match q.0.parse::<i64>() {
                Ok(n) => FieldValue::Number(n),
                Err(_) => FieldValue::Text(q.0.clone()),
            });
        state.set_opt(PODS, pods);
    }

    state
}

fn expected_resource_quota(expected_pod_limit: i64) -> DesiredState {
    DesiredState::new()
        .equals(QUOTA_COUNT, 1i64)
        .equals(PODS, expected_pod_limit)
}

async fn list_resource_quotas(client: &Client, namespace: &str) -> Result<Vec<ResourceQuota>> {
    let quotas: Api<ResourceQuota> = Api::namespaced(client.clone(), namespace);
    Ok(quotas.list(&ListParams::default()).await?.items)
}

/// The namespace has exactly one ResourceQuota limiting pods to `expected_pod_limit`
#[instrument(skip(client))]
pub async fn check_namespace_resource_quota(
    client: &Client,
    namespace: &str,
    expected_pod_limit: i64,
) -> Result<()> {
    let quotas = list_resource_quotas(client, namespace).await?;
    ensure_converged(
        &expected_resource_quota(expected_pod_limit),
        &resource_quota_state(&quotas),
    )
}

#[instrument(skip(client, settings))]
pub async fn wait_for_namespace_resource_quota(
    client: &Client,
    namespace: &str,
    expected_pod_limit: i64,
    settings: &PollSettings,
) -> ConvergeResult {
    let desired = expected_resource_quota(expected_pod_limit);
    verify_converged(
        || async {
            let quotas = list_resource_quotas(client, namespace).await?;
            Ok::<_, ValidationError>(resource_quota_state(&quotas))
        },
        |observed| desired.diff(observed),
        settings,
    )
    .await
}

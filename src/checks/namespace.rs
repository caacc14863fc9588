// Copyright 2026, Jeroen van Erp <jeroen@geeko.me>
// SPDX-License-Identifier: Apache-2.0

//! Namespace annotation checks

use super::ConvergeResult;
use crate::annotations::{self, namespace_limit, pod_limit, status_condition};
use crate::constants::{annotations::RESOURCE_QUOTA, annotations::STATUS, conditions};
use crate::converge::{
    ensure_converged, verify_converged, DesiredState, ObservedState, PollSettings,
};
use crate::error::{Result, ValidationError};
use crate::kubernetes::get_namespace;
use k8s_openapi::api::core::v1::Namespace;
use kube::Client;
use tracing::instrument;

pub const POD_LIMIT: &str = "podLimit";
pub const QUOTA_VALIDATED: &str = "quotaValidated";
pub const QUOTA_MESSAGE: &str = "quotaMessage";

fn annotation_field(key: &str) -> String {
    format!("annotation[{}]", key)
}

async fn require_namespace(client: &Client, name: &str) -> Result<Namespace> {
    get_namespace(client, name)
        .await?
        .ok_or_else(|| ValidationError::NotFound(format!("namespace {}", name)))
}

pub fn annotation_state(namespace: &Namespace, key: &str) -> ObservedState {
    ObservedState::new().with(annotation_field(key), annotations::has_annotation(namespace, key))
}

fn expected_annotation(key: &str, expected_existence: bool) -> DesiredState {
    DesiredState::new().equals(annotation_field(key), expected_existence)
}

#[instrument(skip(client))]
pub async fn check_annotation_exists_in_namespace(
    client: &Client,
    namespace: &str,
    annotation_key: &str,
    expected_existence: bool,
) -> Result<()> {
    let ns = require_namespace(client, namespace).await?;
    ensure_converged(
        &expected_annotation(annotation_key, expected_existence),
        &annotation_state(&ns, annotation_key),
    )
}

#[instrument(skip(client, settings))]
pub async fn wait_for_annotation_in_namespace(
    client: &Client,
    namespace: &str,
    annotation_key: &str,
    expected_existence: bool,
    settings: &PollSettings,
) -> ConvergeResult {
    let desired = expected_annotation(annotation_key, expected_existence);
    verify_converged(
        || async {
            let ns = get_namespace(client, namespace).await?;
            Ok::<_, ValidationError>(
                ns.map(|ns| annotation_state(&ns, annotation_key))
                    .unwrap_or_default(),
            )
        },
        |observed| desired.diff(observed),
        settings,
    )
    .await
}

/// Pod limit requested for the namespace and the `ResourceQuotaValidated` condition.
///
/// Annotations Rancher has not written yet leave their fields out. Malformed
/// annotations are errors.
pub fn quota_validation_state(namespace: &Namespace) -> Result<ObservedState> {
    let mut state = ObservedState::new();

    match namespace_limit(namespace, RESOURCE_QUOTA) {
        Ok(limit) => state.set_opt(POD_LIMIT, pod_limit(&limit)),
        Err(ValidationError::AnnotationNotFound(_)) => {}
        Err(e) => return Err(e),
    }

    if let Some(raw) = annotations::annotation(namespace, STATUS) {
        match status_condition(raw, conditions::RESOURCE_QUOTA_VALIDATED) {
            Ok(condition) => {
                state.set(QUOTA_VALIDATED, condition.is_true());
                state.set(QUOTA_MESSAGE, condition.message);
            }
            Err(ValidationError::NotFound(_)) => {}
            Err(e) => return Err(e),
        }
    }

    Ok(state)
}

fn expected_quota_validation(
    namespace_pod_limit: &str,
    expected_status: bool,
    expected_error_message: &str,
) -> DesiredState {
    DesiredState::new()
        .equals(POD_LIMIT, namespace_pod_limit)
        .equals(QUOTA_VALIDATED, expected_status)
        .contains(QUOTA_MESSAGE, expected_error_message)
}

#[instrument(skip(client))]
pub async fn check_namespace_resource_quota_validation_status(
    client: &Client,
    namespace: &str,
    namespace_pod_limit: &str,
    expected_status: bool,
    expected_error_message: &str,
) -> Result<()> {
    let ns = require_namespace(client, namespace).await?;
    ensure_converged(
        &expected_quota_validation(namespace_pod_limit, expected_status, expected_error_message),
        &quota_validation_state(&ns)?,
    )
}

#[instrument(skip(client, settings))]
pub async fn wait_for_namespace_resource_quota_validation_status(
    client: &Client,
    namespace: &str,
    namespace_pod_limit: &str,
    expected_status: bool,
    expected_error_message: &str,
    settings: &PollSettings,
) -> ConvergeResult {
    let desired =
        expected_quota_validation(namespace_pod_limit, expected_status, expected_error_message);
    verify_converged(
        || async {
            match get_namespace(client, namespace).await? {
                Some(ns) => quota_validation_state(&ns),
                None => Ok(ObservedState::default()),
            }
        },
        |observed| desired.diff(observed),
        settings,
    )
    .await
}

// Copyright 2026, Jeroen van Erp <jeroen@geeko.me>
// SPDX-License-Identifier: Apache-2.0

//! LimitRange and container resource checks

use super::ConvergeResult;
use crate::converge::{
    ensure_converged, verify_converged, DesiredState, ObservedState, PollSettings,
};
use crate::error::{Result, ValidationError};
use crate::types::ContainerResourceLimit;
use k8s_openapi::api::apps::v1::Deployment;
use k8s_openapi::api::core::v1::{LimitRange, Pod};
use k8s_openapi::apimachinery::pkg::api::resource::Quantity;
use k8s_openapi::apimachinery::pkg::apis::meta::v1::LabelSelector;
use kube::{api::ListParams, Api, Client};
use std::collections::BTreeMap;
use tracing::{debug, instrument};

pub const LIMIT_RANGE_COUNT: &str = "limitRangeCount";
pub const CPU_LIMIT: &str = "cpuLimit";
pub const CPU_REQUEST: &str = "cpuRequest";
pub const MEMORY_LIMIT: &str = "memoryLimit";
pub const MEMORY_REQUEST: &str = "memoryRequest";

fn quantity(resources: Option<&BTreeMap<String, Quantity>>, name: &str) -> Option<String> {
    resources.and_then(|r| r.get(name)).map(|q| q.0.clone())
}

/// Number of LimitRanges and, when there is exactly one, the defaults of its first item
pub fn limit_range_state(ranges: &[LimitRange]) -> ObservedState {
    let mut state = ObservedState::new().with(LIMIT_RANGE_COUNT, ranges.len() as i64);

    let item = match ranges {
        [range] => range.spec.as_ref().and_then(|s| s.limits.first()),
        _ => None,
    };
    if let Some(item) = item {
        state.set_opt(CPU_LIMIT, quantity(item.default.as_ref(), "cpu"));
        state.set_opt(MEMORY_LIMIT, quantity(item.default.as_ref(), "memory"));
        state.set_opt(CPU_REQUEST, quantity(item.default_request.as_ref(), "cpu"));
        state.set_opt(MEMORY_REQUEST, quantity(item.default_request.as_ref(), "memory"));
    }

    state
}

fn expected_limit_range(limits: &ContainerResourceLimit) -> DesiredState {
    let text = |v: &Option<String>| v.clone().unwrap_or_default();
    DesiredState::new()
        .equals(LIMIT_RANGE_COUNT, 1i64)
        .equals(CPU_LIMIT, text(&limits.limits_cpu))
        .equals(CPU_REQUEST, text(&limits.requests_cpu))
        .equals(MEMORY_LIMIT, text(&limits.limits_memory))
        .equals(MEMORY_REQUEST, text(&limits.requests_memory))
}

async fn list_limit_ranges(client: &Client, namespace: &str) -> Result<Vec<LimitRange>> {
    let ranges: Api<LimitRange> = Api::namespaced(client.clone(), namespace);
    Ok(ranges.list(&ListParams::default()).await?.items)
}

/// The namespace has exactly one LimitRange carrying the project's container defaults
#[instrument(skip(client))]
pub async fn check_limit_range(
    client: &Client,
    namespace: &str,
    expected: &ContainerResourceLimit,
) -> Result<()> {
    let ranges = list_limit_ranges(client, namespace).await?;
    ensure_converged(&expected_limit_range(expected), &limit_range_state(&ranges))
}

#[instrument(skip(client, settings))]
pub async fn wait_for_limit_range(
    client: &Client,
    namespace: &str,
    expected: &ContainerResourceLimit,
    settings: &PollSettings,
) -> ConvergeResult {
    let desired = expected_limit_range(expected);
    verify_converged(
        || async {
            let ranges = list_limit_ranges(client, namespace).await?;
            Ok::<_, ValidationError>(limit_range_state(&ranges))
        },
        |observed| desired.diff(observed),
        settings,
    )
    .await
}

/// Resources of the pod's first container; unset quantities read as `"0"`
pub fn container_resources_state(pod: &Pod) -> ObservedState {
    let mut state = ObservedState::new();
    let Some(container) = pod.spec.as_ref().and_then(|s| s.containers.first()) else {
        return state;
    };

    let resources = container.resources.as_ref();
    let limits = resources.and_then(|r| r.limits.as_ref());
    let requests = resources.and_then(|r| r.requests.as_ref());
    let value = |r: Option<&BTreeMap<String, Quantity>>, name: &str| {
        quantity(r, name).unwrap_or_else(|| "0".to_string())
    };

    state.set(CPU_LIMIT, value(limits, "cpu"));
    state.set(CPU_REQUEST, value(requests, "cpu"));
    state.set(MEMORY_LIMIT, value(limits, "memory"));
    state.set(MEMORY_REQUEST, value(requests, "memory"));
    state
}

fn expected_container_resources(limits: &ContainerResourceLimit) -> DesiredState {
    let normalized = |v: &Option<String>| match v.as_deref() {
        None | Some("") => "0".to_string(),
        Some(s) => s.to_string(),
    };
    DesiredState::new()
        .equals(CPU_LIMIT, normalized(&limits.limits_cpu))
        .equals(CPU_REQUEST, normalized(&limits.requests_cpu))
        .equals(MEMORY_LIMIT, normalized(&limits.limits_memory))
        .equals(MEMORY_REQUEST, normalized(&limits.requests_memory))
}

/// Label selector in list query syntax, `None` when it selects nothing in particular
fn label_selector_query(selector: &LabelSelector) -> Option<String> {
    let mut terms: Vec<String> = selector
        .match_labels
        .iter()
        .flatten()
        .map(|(k, v)| format!("{}={}", k, v))
        .collect();

    for expr in selector.match_expressions.iter().flatten() {
        let values = expr.values.as_deref().unwrap_or_default().join(",");
        terms.push(match expr.operator.as_str() {
            "In" => format!("{} in ({})", expr.key, values),
            "NotIn" => format!("{} notin ({})", expr.key, values),
            "Exists" => expr.key.clone(),
            "DoesNotExist" => format!("!{}", expr.key),
            _ => return None,
        });
    }

    (!terms.is_empty()).then(|| terms.join(","))
}

/// First pod selected by the deployment, `None` while the deployment or its pods are missing
async fn first_deployment_pod(
    client: &Client,
    namespace: &str,
    deployment_name: &str,
) -> Result<Option<Pod>> {
    let deployments: Api<Deployment> = Api::namespaced(client.clone(), namespace);
    let Some(deployment) = deployments.get_opt(deployment_name).await? else {
        return Ok(None);
    };

    let selector = deployment
        .spec
        .as_ref()
        .and_then(|s| label_selector_query(&s.selector))
        .ok_or_else(|| {
            ValidationError::NotFound(format!("label selector of deployment {}", deployment_name))
        })?;
    debug!("Listing pods of deployment {} with selector {}", deployment_name, selector);

    let pods: Api<Pod> = Api::namespaced(client.clone(), namespace);
    let mut items = pods.list(&ListParams::default().labels(&selector)).await?.items;
    items.sort_by(|a, b| a.metadata.name.cmp(&b.metadata.name));
    Ok(items.into_iter().next())
}

/// The first container of the deployment's first pod got the expected defaults
#[instrument(skip(client))]
pub async fn check_container_resources(
    client: &Client,
    namespace: &str,
    deployment_name: &str,
    expected: &ContainerResourceLimit,
) -> Result<()> {
    let pod = first_deployment_pod(client, namespace, deployment_name)
        .await?
        .ok_or_else(|| {
            ValidationError::NotFound(format!("pods of deployment {}", deployment_name))
        })?;

    if pod.spec.as_ref().map_or(true, |s| s.containers.is_empty()) {
        return Err(ValidationError::NotFound(format!(
            "containers in pod {}",
            pod.metadata.name.as_deref().unwrap_or_default()
        )));
    }

    ensure_converged(
        &expected_container_resources(expected),
        &container_resources_state(&pod),
    )
}

#[instrument(skip(client, settings))]
pub async fn wait_for_container_resources(
    client: &Client,
    namespace: &str,
    deployment_name: &str,
    expected: &ContainerResourceLimit,
    settings: &PollSettings,
) -> ConvergeResult {
    let desired = expected_container_resources(expected);
    verify_converged(
        || async {
            let pod = first_deployment_pod(client, namespace, deployment_name).await?;
            Ok::<_, ValidationError>(
                pod.map(|p| container_resources_state(&p)).unwrap_or_default(),
            )
        },
        |observed| desired.diff(observed),
        settings,
    )
    .await
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::converge::FieldValue;
    use crate::test_utils::{fast_poll, list_json, MockService};
    use serde_json::json;

    const LIMIT_RANGES_PATH: &str = "/api/v1/namespaces/testns-abcde/limitranges";
    const DEPLOYMENT_PATH: &str = "/apis/apps/v1/namespaces/testns-abcde/deployments/web";
    const PODS_PATH: &str = "/api/v1/namespaces/testns-abcde/pods";

    fn limit_range() -> serde_json::Value {
        json!({
            "apiVersion": "v1",
            "kind": "LimitRange",
            "metadata": {"name": "testns-abcde", "namespace": "testns-abcde"},
            "spec": {"limits": [{
                "type": "Container",
                "default": {"cpu": "100m", "memory": "64Mi"},
                "defaultRequest": {"cpu": "50m", "memory": "32Mi"}
            }]}
        })
    }

    fn deployment_json() -> String {
        json!({
            "apiVersion": "apps/v1",
            "kind": "Deployment",
            "metadata": {"name": "web", "namespace": "testns-abcde"},
            "spec": {
                "selector": {"matchLabels": {"app": "web"}},
                "template": {
                    "metadata": {"labels": {"app": "web"}},
                    "spec": {"containers": [{"name": "nginx"}]}
                }
            }
        })
        .to_string()
    }

    fn pod(name: &str, resources: serde_json::Value) -> serde_json::Value {
        json!({
            "apiVersion": "v1",
            "kind": "Pod",
            "metadata": {"name": name, "namespace": "testns-abcde", "labels": {"app": "web"}},
            "spec": {"containers": [{"name": "nginx", "image": "nginx", "resources": resources}]}
        })
    }

    #[tokio::test]
    async fn test_limit_range_matches() {
        let client = MockService::new()
            .on_get(LIMIT_RANGES_PATH, 200, &list_json("v1", "LimitRange", vec![limit_range()]))
            .into_client();
        let expected = ContainerResourceLimit::new("100m", "50m", "64Mi", "32Mi");

        check_limit_range(&client, "testns-abcde", &expected).await.unwrap();
    }

    #[tokio::test]
    async fn test_limit_range_missing() {
        let client = MockService::new()
            .on_get(LIMIT_RANGES_PATH, 200, &list_json("v1", "LimitRange", vec![]))
            .into_client();
        let expected = ContainerResourceLimit::new("100m", "50m", "64Mi", "32Mi");

        let err = check_limit_range(&client, "testns-abcde", &expected)
            .await
            .unwrap_err();

        match err {
            ValidationError::Mismatch(mismatches) => {
                assert_eq!(mismatches.len(), 5);
                assert!(mismatches.iter().any(|m| {
                    m.field == LIMIT_RANGE_COUNT && m.actual == Some(FieldValue::Number(0))
                }));
            }
            other => panic!("expected mismatches, got {:?}", other),
        }
    }

    #[tokio::test(start_paused = true)]
    async fn test_wait_for_updated_limit_range() {
        let client = MockService::new()
            .on_get(LIMIT_RANGES_PATH, 200, &list_json("v1", "LimitRange", vec![limit_range()]))
            .into_client();
        let expected = ContainerResourceLimit::new("200m", "50m", "64Mi", "32Mi");

        let err = wait_for_limit_range(&client, "testns-abcde", &expected, &fast_poll())
            .await
            .unwrap_err();

        let mismatches = err.mismatches().unwrap();
        assert_eq!(mismatches.len(), 1);
        assert_eq!(mismatches[0].field, CPU_LIMIT);
        assert_eq!(mismatches[0].actual, Some(FieldValue::from("100m")));
    }

    #[tokio::test]
    async fn test_container_resources_report_every_field() {
        let pods = list_json(
            "v1",
            "Pod",
            vec![pod("web-1", json!({"limits": {"cpu": "100m"}}))],
        );
        let client = MockService::new()
            .on_get(DEPLOYMENT_PATH, 200, &deployment_json())
            .on_get(PODS_PATH, 200, &pods)
            .into_client();
        let expected = ContainerResourceLimit::new("100m", "50m", "64Mi", "");

        let err = check_container_resources(&client, "testns-abcde", "web", &expected)
            .await
            .unwrap_err();

        match err {
            ValidationError::Mismatch(mismatches) => {
                let fields: Vec<_> = mismatches.iter().map(|m| m.field.as_str()).collect();
                assert_eq!(fields, vec![CPU_REQUEST, MEMORY_LIMIT]);
                assert_eq!(mismatches[0].actual, Some(FieldValue::from("0")));
            }
            other => panic!("expected mismatches, got {:?}", other),
        }
    }

    #[tokio::test]
    async fn test_container_resources_without_pods() {
        let client = MockService::new()
            .on_get(DEPLOYMENT_PATH, 200, &deployment_json())
            .on_get(PODS_PATH, 200, &list_json("v1", "Pod", vec![]))
            .into_client();

        let err = check_container_resources(
            &client,
            "testns-abcde",
            "web",
            &ContainerResourceLimit::default(),
        )
        .await
        .unwrap_err();

        assert!(matches!(
            err,
            ValidationError::NotFound(ref s) if s.contains("pods of deployment web")
        ));
    }

    #[tokio::test(start_paused = true)]
    async fn test_wait_for_container_resources_after_rollout() {
        let before = list_json("v1", "Pod", vec![pod("web-1", json!({}))]);
        let after = list_json(
            "v1",
            "Pod",
            vec![pod(
                "web-2",
                json!({
                    "limits": {"cpu": "100m", "memory": "64Mi"},
                    "requests": {"cpu": "50m", "memory": "32Mi"}
                }),
            )],
        );
        let client = MockService::new()
            .on_get(DEPLOYMENT_PATH, 200, &deployment_json())
            .on_get(PODS_PATH, 200, &before)
            .on_get(PODS_PATH, 200, &after)
            .into_client();
        let expected = ContainerResourceLimit::new("100m", "50m", "64Mi", "32Mi");

        wait_for_container_resources(&client, "testns-abcde", "web", &expected, &fast_poll())
            .await
            .unwrap();
    }

    fn selector(value: serde_json::Value) -> LabelSelector {
        serde_json::from_value(value).unwrap()
    }

    #[test]
    fn test_label_selector_query() {
        let query = label_selector_query(&selector(json!({
            "matchLabels": {"app": "web"},
            "matchExpressions": [
                {"key": "tier", "operator": "In", "values": ["front", "edge"]},
                {"key": "canary", "operator": "DoesNotExist"}
            ]
        })));
        assert_eq!(query.as_deref(), Some("app=web,tier in (front,edge),!canary"));

        let query = label_selector_query(&selector(json!({
            "matchExpressions": [{"key": "app", "operator": "Exists"}]
        })));
        assert_eq!(query.as_deref(), Some("app"));
    }

    #[test]
    fn test_empty_label_selector_selects_nothing() {
        assert_eq!(label_selector_query(&selector(json!({}))), None);
        assert_eq!(label_selector_query(&selector(json!({"matchLabels": {}}))), None);
    }

    #[tokio::test]
    async fn test_container_resources_with_expression_selector() {
        let deployment = json!({
            "apiVersion": "apps/v1",
            "kind": "Deployment",
            "metadata": {"name": "web", "namespace": "testns-abcde"},
            "spec": {
                "selector": {
                    "matchExpressions": [{"key": "app", "operator": "In", "values": ["web"]}]
                },
                "template": {"metadata": {"labels": {"app": "web"}}, "spec": {"containers": []}}
            }
        })
        .to_string();
        let pods = list_json("v1", "Pod", vec![pod("web-1", json!({"limits": {"cpu": "100m"}}))]);
        let client = MockService::new()
            .on_get(DEPLOYMENT_PATH, 200, &deployment)
            .on_get(PODS_PATH, 200, &pods)
            .into_client();

        check_container_resources(
            &client,
            "testns-abcde",
            "web",
            &ContainerResourceLimit::new("100m", "", "", ""),
        )
        .await
        .unwrap();
    }
}

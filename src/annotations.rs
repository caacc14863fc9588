// Copyright 2026, Jeroen van Erp <jeroen@geeko.me>
// SPDX-License-Identifier: Apache-2.0

//! Parsing of the JSON documents Rancher stores in namespace annotations

use crate::error::{Result, ValidationError};
use k8s_openapi::api::core::v1::Namespace;
use serde::Deserialize;
use serde_json::{Map, Value};

/// A condition entry of the `cattle.io/status` annotation
#[derive(Deserialize, Clone, Debug, PartialEq, Eq)]
pub struct StatusCondition {
    #[serde(rename = "Type")]
    pub condition_type: String,
    #[serde(rename = "Status", default)]
    pub status: String,
    #[serde(rename = "Message", default)]
    pub message: String,
}

impl StatusCondition {
    pub fn is_true(&self) -> bool {
        self.status == "True"
    }
}

#[derive(Deserialize)]
struct StatusAnnotation {
    #[serde(rename = "Conditions")]
    conditions: Option<Vec<StatusCondition>>,
}

/// Get an annotation value of a namespace
pub fn annotation<'a>(namespace: &'a Namespace, key: &str) -> Option<&'a str> {
    namespace
        .metadata
        .annotations
        .as_ref()
        .and_then(|a| a.get(key))
        .map(|v| v.as_str())
}

pub fn has_annotation(namespace: &Namespace, key: &str) -> bool {
    annotation(namespace, key).is_some()
}

/// Parse the JSON object stored under `key`, e.g. the project quota or container limits
pub fn namespace_limit(namespace: &Namespace, key: &str) -> Result<Map<String, Value>> {
    let raw = annotation(namespace, key)
        .filter(|v| !v.is_empty())
        .ok_or_else(|| ValidationError::AnnotationNotFound(key.to_string()))?;

    serde_json::from_str(raw)
        .map_err(|e| ValidationError::InvalidAnnotation(format!("{}: {}", key, e)))
}

/// Pod limit requested in the `field.cattle.io/resourceQuota` document
pub fn pod_limit(limit: &Map<String, Value>) -> Option<&str> {
    limit
        .get("limit")
        .and_then(|l| l.get("pods"))
        .and_then(Value::as_str)
}

/// Find a condition of the given type in a `cattle.io/status` annotation value
pub fn status_condition(annotation: &str, condition_type: &str) -> Result<StatusCondition> {
    let parsed: StatusAnnotation = serde_json::from_str(annotation)
        .map_err(|e| ValidationError::InvalidAnnotation(format!("error parsing JSON: {}", e)))?;

    let conditions = parsed.conditions.ok_or_else(|| {
        ValidationError::InvalidAnnotation("no 'Conditions' found in annotation".to_string())
    })?;

    conditions
        .into_iter()
        .find(|c| c.condition_type == condition_type)
        .ok_or_else(|| ValidationError::NotFound(format!("condition of type '{}'", condition_type)))
}

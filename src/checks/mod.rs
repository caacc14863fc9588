// Copyright 2026, Jeroen van Erp <jeroen@geeko.me>
// SPDX-License-Identifier: Apache-2.0

//! Assertions against the objects Rancher derives from a project.
//!
//! Every assertion comes in three parts: a pure `*_state` projection of the
//! fetched object(s) into an [`ObservedState`](crate::converge::ObservedState),
//! a one-shot `check_*` and a polling `wait_for_*` built on
//! [`verify_converged`](crate::converge::verify_converged). All of them take a
//! client for the downstream cluster holding the namespace.

pub mod deployment;
pub mod limits;
pub mod namespace;
pub mod quota;

use crate::converge::ConvergeError;
use crate::error::ValidationError;

/// Outcome of a `wait_for_*` assertion
pub type ConvergeResult = std::result::Result<(), ConvergeError<ValidationError>>;

pub use deployment::{
    check_deployment_status, get_deployment, latest_status_condition, wait_for_deployment_status,
    ConditionSummary, ExpectedDeploymentStatus,
};
pub use limits::{
    check_container_resources, check_limit_range, wait_for_container_resources,
    wait_for_limit_range,
};
pub use namespace::{
    check_annotation_exists_in_namespace, check_namespace_resource_quota_validation_status,
    wait_for_annotation_in_namespace, wait_for_namespace_resource_quota_validation_status,
};
pub use quota::{check_namespace_resource_quota, wait_for_namespace_resource_quota};

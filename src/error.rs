// Copyright 2026, Jeroen van Erp <jeroen@geeko.me>
// SPDX-License-Identifier: Apache-2.0
use crate::converge::{render_mismatches, Mismatch};
use thiserror::Error;

#[derive(Error, Debug)]
pub enum ValidationError {
    #[error("Kubernetes API error: {0}")]
    KubeError(#[from] kube::Error),

    #[error("Failed to parse kubeconfig: {0}")]
    KubeconfigError(String),

    #[error("Cluster not ready: {0}")]
    ClusterNotReady(String),

    #[error("{0} not found")]
    NotFound(String),

    #[error("Namespace creation failed: {0}")]
    NamespaceError(String),

    #[error("Annotation '{0}' not found")]
    AnnotationNotFound(String),

    #[error("Invalid annotation: {0}")]
    InvalidAnnotation(String),

    #[error("Invalid poll settings: {0}")]
    InvalidPollSettings(String),

    #[error("Unexpected state:\n{}", render_mismatches(.0))]
    Mismatch(Vec<Mismatch>),
}

pub type Result<T> = std::result::Result<T, ValidationError>;

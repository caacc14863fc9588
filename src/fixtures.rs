// Copyright 2026, Jeroen van Erp <jeroen@geeko.me>
// SPDX-License-Identifier: Apache-2.0

//! Factories for objects scenarios create; every call builds a fresh value.

use crate::constants::names;
use crate::types::{append_random_string, Project};
use k8s_openapi::api::core::v1::Secret;
use k8s_openapi::ByteString;
use kube::api::{ApiResource, DynamicObject, GroupVersionKind, ObjectMeta};
use kube::ResourceExt;
use serde_json::json;
use std::collections::BTreeMap;

pub fn opaque_secret_data() -> BTreeMap<String, ByteString> {
    BTreeMap::from([("hello".to_string(), ByteString(b"world".to_vec()))])
}

pub fn opaque_secret(namespace: &str, name: &str) -> Secret {
    Secret {
        metadata: ObjectMeta {
            name: Some(name.to_string()),
            namespace: Some(namespace.to_string()),
            ..Default::default()
        },
        data: Some(opaque_secret_data()),
        type_: Some("Opaque".to_string()),
        ..Default::default()
    }
}

/// `management.cattle.io/v3` ProjectRoleTemplateBinding; its fields live at the
/// top level, not under `spec`
pub fn prtb_resource() -> ApiResource {
    ApiResource::from_gvk_with_plural(
        &GroupVersionKind::gvk("management.cattle.io", "v3", "ProjectRoleTemplateBinding"),
        "projectroletemplatebindings",
    )
}

/// Binding of `role_template` to `user_principal` in `project`, created in the project's namespace
pub fn project_role_template_binding(
    project: &Project,
    role_template: &str,
    user_principal: &str,
) -> DynamicObject {
    DynamicObject::new(&append_random_string(names::PRTB_PREFIX), &prtb_resource())
        .within(&project.name_any())
        .data(json!({
            "projectName": project.project_id(),
            "roleTemplateName": role_template,
            "userPrincipalName": user_principal,
        }))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_opaque_secret_is_fresh_per_call() {
        let mut first = opaque_secret("testns-abcde", "s1");
        first
            .data
            .as_mut()
            .unwrap()
            .insert("extra".to_string(), ByteString(vec![1]));

        let second = opaque_secret("testns-abcde", "s1");

        assert_eq!(second.data, Some(opaque_secret_data()));
        assert_eq!(second.type_.as_deref(), Some("Opaque"));
    }

    #[test]
    fn test_project_role_template_binding() {
        let mut project = Project::template("c-m-abcde");
        project.metadata.name = Some("p-xyz12".to_string());

        let prtb = project_role_template_binding(&project, "project-member", "local://u-abc");

        assert_eq!(prtb.namespace().as_deref(), Some("p-xyz12"));
        assert!(prtb.name_any().starts_with("prtb-"));
        assert_eq!(prtb.data["projectName"], "c-m-abcde:p-xyz12");
        assert_eq!(prtb.data["roleTemplateName"], "project-member");
        assert_eq!(
            prtb.types.as_ref().map(|t| t.kind.as_str()),
            Some("ProjectRoleTemplateBinding")
        );
    }
}

//! GitHub toolchain tool data source
//!
//! Read-only lookup of one tool integration by toolchain id + tool id.
//! The remote parameter block is copied through a declared per-field
//! mapping table instead of a dynamic rename helper, so a drift between
//! the local and remote field sets is caught by the table's tests.

use std::collections::HashMap;

use chrono::SecondsFormat;

use vela_core::provider::{ProviderError, ProviderResult};
use vela_core::resource::{ResourceId, State, Value};

use crate::provider::IbmProvider;

pub const TOOLCHAIN_TOOL_GITHUB_TYPE: &str = "cd_toolchain_tool_github";

/// Integration type tag the remote aggregate must report
pub const GITHUB_TOOL_TYPE_ID: &str = "githubconsolidated";

/// Parameter mapping: (local attribute name, remote parameter name)
pub const GITHUB_PARAMETER_FIELDS: &[(&str, &str)] = &[
    ("git_id", "git_id"),
    ("api_root_url", "api_root_url"),
    ("default_branch", "default_branch"),
    ("owner_id", "owner_id"),
    ("repo_name", "repo_name"),
    ("repo_url", "repo_url"),
    ("source_repo_url", "source_repo_url"),
    ("token_url", "token_url"),
    ("type", "type"),
    ("private_repo", "private_repo"),
    ("auto_init", "auto_init"),
    ("enable_traceability", "enable_traceability"),
    ("integration_owner", "integration_owner"),
    ("project_id", "project_id"),
    ("toolchain_issues_enabled", "has_issues"),
];

/// Copy a remote parameter block into the local attribute shape using a
/// declared mapping table
pub(crate) fn parameters_from_read(
    parameters: &serde_json::Map<String, serde_json::Value>,
    fields: &[(&str, &str)],
) -> HashMap<String, Value> {
    let mut out = HashMap::new();
    for (local, remote) in fields {
        if let Some(value) = parameters.get(*remote)
            && let Some(value) = json_to_value(value)
        {
            out.insert((*local).to_string(), value);
        }
    }
    out
}

fn json_to_value(value: &serde_json::Value) -> Option<Value> {
    match value {
        serde_json::Value::String(s) => Some(Value::String(s.clone())),
        serde_json::Value::Bool(b) => Some(Value::Bool(*b)),
        serde_json::Value::Number(n) => n.as_i64().map(Value::Int),
        serde_json::Value::Array(arr) => {
            let items: Vec<Value> = arr.iter().filter_map(json_to_value).collect();
            Some(Value::List(items))
        }
        _ => None,
    }
}

impl IbmProvider {
    pub(crate) async fn read_toolchain_tool_github(
        &self,
        id: &ResourceId,
        toolchain_id: &str,
        tool_id: &str,
    ) -> ProviderResult<State> {
        let api = self.session().toolchain_api().map_err(|e| {
            let message = e.to_string();
            ProviderError::new(message)
                .for_resource(id.clone())
                .with_cause(e)
        })?;

        let tool = api.get_tool_by_id(toolchain_id, tool_id).await.map_err(|e| {
            let message = format!("get tool by id failed: {}", e);
            ProviderError::new(message)
                .for_resource(id.clone())
                .with_cause(e)
        })?;

        if tool.tool_type_id != GITHUB_TOOL_TYPE_ID {
            return Err(ProviderError::new(format!(
                "retrieved tool is not the correct type: {}",
                tool.tool_type_id
            ))
            .for_resource(id.clone()));
        }

        let mut attrs = HashMap::new();
        attrs.insert(
            "toolchain_id".to_string(),
            Value::String(toolchain_id.to_string()),
        );
        attrs.insert("tool_id".to_string(), Value::String(tool_id.to_string()));
        if let Some(v) = &tool.resource_group_id {
            attrs.insert("resource_group_id".to_string(), Value::String(v.clone()));
        }
        if let Some(v) = &tool.crn {
            attrs.insert("crn".to_string(), Value::String(v.clone()));
        }
        if let Some(v) = &tool.toolchain_crn {
            attrs.insert("toolchain_crn".to_string(), Value::String(v.clone()));
        }
        if let Some(v) = &tool.href {
            attrs.insert("href".to_string(), Value::String(v.clone()));
        }
        if let Some(v) = &tool.name {
            attrs.insert("name".to_string(), Value::String(v.clone()));
        }
        if let Some(v) = &tool.updated_at {
            attrs.insert(
                "updated_at".to_string(),
                Value::String(v.to_rfc3339_opts(SecondsFormat::Secs, true)),
            );
        }

        // A single-element list when the referent is present, never null
        let mut referent = Vec::new();
        if let Some(r) = &tool.referent {
            let mut map = HashMap::new();
            if let Some(ui_href) = &r.ui_href {
                map.insert("ui_href".to_string(), Value::String(ui_href.clone()));
            }
            if let Some(api_href) = &r.api_href {
                map.insert("api_href".to_string(), Value::String(api_href.clone()));
            }
            referent.push(Value::Map(map));
        }
        attrs.insert("referent".to_string(), Value::List(referent));

        let mut parameters = Vec::new();
        if !tool.parameters.is_empty() {
            parameters.push(Value::Map(parameters_from_read(
                &tool.parameters,
                GITHUB_PARAMETER_FIELDS,
            )));
        }
        attrs.insert("parameters".to_string(), Value::List(parameters));

        if let Some(v) = &tool.state {
            attrs.insert("state".to_string(), Value::String(v.clone()));
        }

        Ok(State::existing(id.clone(), attrs)
            .with_identifier(format!("{}/{}", toolchain_id, tool_id)))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashSet;
    use std::sync::Arc;

    use serde_json::json;

    use crate::api::{ToolReferent, ToolchainTool};
    use crate::endpoints::EndpointType;
    use crate::testing::{MockSession, MockToolchain};

    fn github_tool() -> ToolchainTool {
        ToolchainTool {
            id: "tool-1".to_string(),
            tool_type_id: GITHUB_TOOL_TYPE_ID.to_string(),
            resource_group_id: Some("rg-1".to_string()),
            crn: Some("crn:v1:bluemix:public:toolchain:us-south:a/xyz:tc-1:tool:tool-1".to_string()),
            toolchain_id: Some("tc-1".to_string()),
            toolchain_crn: Some("crn:v1:bluemix:public:toolchain:us-south:a/xyz:tc-1::".to_string()),
            href: Some("https://api.us-south.devops.cloud.ibm.com/toolchain/v2/toolchains/tc-1/tools/tool-1".to_string()),
            referent: Some(ToolReferent {
                ui_href: Some("https://cloud.ibm.com/devops/ui".to_string()),
                api_href: Some("https://api.us-south.devops.cloud.ibm.com".to_string()),
            }),
            name: Some("my-repo".to_string()),
            updated_at: None,
            parameters: json!({
                "git_id": "github",
                "repo_url": "https://github.com/org/repo",
                "private_repo": true,
                "has_issues": true,
            })
            .as_object()
            .unwrap()
            .clone(),
            state: Some("configured".to_string()),
        }
    }

    fn provider(tool: ToolchainTool) -> IbmProvider {
        IbmProvider::with_session(
            Arc::new(MockSession::with_toolchain(Arc::new(MockToolchain::new(
                tool,
            )))),
            EndpointType::Public,
        )
    }

    fn resource_id() -> ResourceId {
        ResourceId::new(TOOLCHAIN_TOOL_GITHUB_TYPE, "repo")
    }

    #[tokio::test]
    async fn read_assigns_the_compound_identifier() {
        let state = provider(github_tool())
            .read_toolchain_tool_github(&resource_id(), "tc-1", "tool-1")
            .await
            .unwrap();

        assert!(state.exists);
        assert_eq!(state.identifier, Some("tc-1/tool-1".to_string()));
        assert_eq!(state.get_str("name"), Some("my-repo"));
        assert_eq!(state.get_str("state"), Some("configured"));
        assert_eq!(state.get_str("resource_group_id"), Some("rg-1"));
    }

    #[tokio::test]
    async fn wrong_tool_type_fails_without_setting_state() {
        let mut tool = github_tool();
        tool.tool_type_id = "jenkins".to_string();

        let err = provider(tool)
            .read_toolchain_tool_github(&resource_id(), "tc-1", "tool-1")
            .await
            .unwrap_err();
        assert!(err.to_string().contains("not the correct type: jenkins"));
    }

    #[tokio::test]
    async fn present_referent_becomes_a_single_element_list() {
        let state = provider(github_tool())
            .read_toolchain_tool_github(&resource_id(), "tc-1", "tool-1")
            .await
            .unwrap();

        match state.attributes.get("referent") {
            Some(Value::List(items)) => {
                assert_eq!(items.len(), 1);
                match &items[0] {
                    Value::Map(map) => {
                        assert_eq!(
                            map.get("ui_href"),
                            Some(&Value::String("https://cloud.ibm.com/devops/ui".to_string()))
                        );
                    }
                    other => panic!("expected a map element, got {:?}", other),
                }
            }
            other => panic!("expected a list, got {:?}", other),
        }
    }

    #[tokio::test]
    async fn absent_referent_becomes_an_empty_list() {
        let mut tool = github_tool();
        tool.referent = None;

        let state = provider(tool)
            .read_toolchain_tool_github(&resource_id(), "tc-1", "tool-1")
            .await
            .unwrap();
        assert_eq!(state.attributes.get("referent"), Some(&Value::List(vec![])));
    }

    #[tokio::test]
    async fn parameters_are_remapped_through_the_declared_table() {
        let state = provider(github_tool())
            .read_toolchain_tool_github(&resource_id(), "tc-1", "tool-1")
            .await
            .unwrap();

        let parameters = match state.attributes.get("parameters") {
            Some(Value::List(items)) if items.len() == 1 => match &items[0] {
                Value::Map(map) => map.clone(),
                other => panic!("expected a map element, got {:?}", other),
            },
            other => panic!("expected a single-element list, got {:?}", other),
        };

        // Remote "has_issues" lands under the local name
        assert_eq!(
            parameters.get("toolchain_issues_enabled"),
            Some(&Value::Bool(true))
        );
        assert!(!parameters.contains_key("has_issues"));
        assert_eq!(
            parameters.get("repo_url"),
            Some(&Value::String("https://github.com/org/repo".to_string()))
        );
        assert_eq!(parameters.get("private_repo"), Some(&Value::Bool(true)));
    }

    #[tokio::test]
    async fn remote_failure_is_fatal_and_embeds_the_upstream_error() {
        let session = MockSession::with_toolchain(Arc::new(MockToolchain {
            tool: std::sync::Mutex::new(None),
        }));
        let provider = IbmProvider::with_session(Arc::new(session), EndpointType::Public);

        let err = provider
            .read_toolchain_tool_github(&resource_id(), "tc-1", "tool-1")
            .await
            .unwrap_err();
        assert!(err.to_string().contains("get tool by id failed"));
        assert!(err.to_string().contains("not found"));
    }

    #[test]
    fn mapping_table_is_consistent() {
        let locals: HashSet<&str> = GITHUB_PARAMETER_FIELDS.iter().map(|(l, _)| *l).collect();
        let remotes: HashSet<&str> = GITHUB_PARAMETER_FIELDS.iter().map(|(_, r)| *r).collect();
        assert_eq!(locals.len(), GITHUB_PARAMETER_FIELDS.len());
        assert_eq!(remotes.len(), GITHUB_PARAMETER_FIELDS.len());

        // The only rename in the table is the issues toggle
        for (local, remote) in GITHUB_PARAMETER_FIELDS {
            if *local == "toolchain_issues_enabled" {
                assert_eq!(*remote, "has_issues");
            } else {
                assert_eq!(local, remote);
            }
        }
    }
}

//! IBM Cloud Provider implementation
//!
//! Dispatches the generic lifecycle operations onto the per-resource
//! implementations in `kms_key` and `toolchain_tool`.

use std::sync::Arc;

use vela_core::provider::{
    BoxFuture, Provider, ProviderError, ProviderResult, ResourceType,
};
use vela_core::resource::{Resource, ResourceId, State};
use vela_core::schema::ResourceSchema;

use crate::api::KeyManagementApi;
use crate::endpoints::EndpointType;
use crate::kms_key::KMS_KEY_TYPE;
use crate::schemas;
use crate::session::{ClientSession, IbmSession, SessionConfig};
use crate::toolchain_tool::TOOLCHAIN_TOOL_GITHUB_TYPE;

/// Managed encryption key resource type
pub struct KmsKeyType;

impl ResourceType for KmsKeyType {
    fn name(&self) -> &'static str {
        KMS_KEY_TYPE
    }

    fn schema(&self) -> ResourceSchema {
        schemas::kms_key::kms_key_schema()
    }
}

/// GitHub toolchain tool data source type
pub struct CdToolchainToolGithubType;

impl ResourceType for CdToolchainToolGithubType {
    fn name(&self) -> &'static str {
        TOOLCHAIN_TOOL_GITHUB_TYPE
    }

    fn schema(&self) -> ResourceSchema {
        schemas::toolchain_tool::toolchain_tool_github_schema()
    }

    fn is_data_source(&self) -> bool {
        true
    }
}

/// IBM Cloud Provider
pub struct IbmProvider {
    session: Arc<dyn ClientSession>,
    default_endpoint_type: EndpointType,
}

impl IbmProvider {
    /// Create a provider backed by the real IBM Cloud endpoints
    pub fn new(config: SessionConfig) -> Self {
        let default_endpoint_type = config.endpoint_type;
        Self {
            session: Arc::new(IbmSession::new(config)),
            default_endpoint_type,
        }
    }

    /// Create with a specific session (for testing)
    pub fn with_session(
        session: Arc<dyn ClientSession>,
        default_endpoint_type: EndpointType,
    ) -> Self {
        Self {
            session,
            default_endpoint_type,
        }
    }

    pub(crate) fn session(&self) -> &Arc<dyn ClientSession> {
        &self.session
    }

    pub(crate) fn default_endpoint_type(&self) -> EndpointType {
        self.default_endpoint_type
    }

    /// Key-management client for an instance, with session failures
    /// wrapped into a provider error
    pub(crate) async fn kms_api(
        &self,
        instance_id: &str,
        endpoint_type: EndpointType,
        key_ring: Option<&str>,
        id: &ResourceId,
    ) -> ProviderResult<Arc<dyn KeyManagementApi>> {
        self.session
            .key_management_api(instance_id, endpoint_type, key_ring)
            .await
            .map_err(|e| {
                let message = e.to_string();
                ProviderError::new(message)
                    .for_resource(id.clone())
                    .with_cause(e)
            })
    }

    fn unknown_resource_type(id: &ResourceId) -> ProviderError {
        ProviderError::new(format!("Unknown resource type: {}", id.resource_type))
            .for_resource(id.clone())
    }

    fn read_only(id: &ResourceId) -> ProviderError {
        ProviderError::new("data source is read-only").for_resource(id.clone())
    }
}

impl Provider for IbmProvider {
    fn name(&self) -> &'static str {
        "ibm"
    }

    fn resource_types(&self) -> Vec<Box<dyn ResourceType>> {
        vec![Box::new(KmsKeyType), Box::new(CdToolchainToolGithubType)]
    }

    fn read(
        &self,
        id: &ResourceId,
        identifier: Option<&str>,
    ) -> BoxFuture<'_, ProviderResult<State>> {
        let id = id.clone();
        let identifier = identifier.map(String::from);
        Box::pin(async move {
            let Some(identifier) = identifier else {
                return Ok(State::not_found(id));
            };
            match id.resource_type.as_str() {
                KMS_KEY_TYPE => self.read_kms_key(&id, &identifier).await,
                TOOLCHAIN_TOOL_GITHUB_TYPE => {
                    // Import format: "<toolchainID>/<toolID>"
                    let Some((toolchain_id, tool_id)) = identifier.split_once('/') else {
                        return Err(ProviderError::new(format!(
                            "invalid tool identifier '{}', expected 'toolchainID/toolID'",
                            identifier
                        ))
                        .for_resource(id.clone()));
                    };
                    self.read_toolchain_tool_github(&id, toolchain_id, tool_id)
                        .await
                }
                _ => Err(Self::unknown_resource_type(&id)),
            }
        })
    }

    fn read_data_source(&self, resource: &Resource) -> BoxFuture<'_, ProviderResult<State>> {
        let resource = resource.clone();
        Box::pin(async move {
            match resource.id.resource_type.as_str() {
                TOOLCHAIN_TOOL_GITHUB_TYPE => {
                    let toolchain_id = resource.get_str("toolchain_id").ok_or_else(|| {
                        ProviderError::for_attribute("toolchain_id", "required string")
                            .for_resource(resource.id.clone())
                    })?;
                    let tool_id = resource.get_str("tool_id").ok_or_else(|| {
                        ProviderError::for_attribute("tool_id", "required string")
                            .for_resource(resource.id.clone())
                    })?;
                    self.read_toolchain_tool_github(&resource.id, toolchain_id, tool_id)
                        .await
                }
                _ => Err(Self::unknown_resource_type(&resource.id)),
            }
        })
    }

    fn create(&self, resource: &Resource) -> BoxFuture<'_, ProviderResult<State>> {
        let resource = resource.clone();
        Box::pin(async move {
            match resource.id.resource_type.as_str() {
                KMS_KEY_TYPE => self.create_kms_key(&resource).await,
                TOOLCHAIN_TOOL_GITHUB_TYPE => Err(Self::read_only(&resource.id)),
                _ => Err(Self::unknown_resource_type(&resource.id)),
            }
        })
    }

    fn update(
        &self,
        id: &ResourceId,
        identifier: &str,
        _from: &State,
        to: &Resource,
    ) -> BoxFuture<'_, ProviderResult<State>> {
        let id = id.clone();
        let identifier = identifier.to_string();
        let to = to.clone();
        Box::pin(async move {
            match id.resource_type.as_str() {
                KMS_KEY_TYPE => self.update_kms_key(&id, &identifier, &to).await,
                TOOLCHAIN_TOOL_GITHUB_TYPE => Err(Self::read_only(&id)),
                _ => Err(Self::unknown_resource_type(&id)),
            }
        })
    }

    fn delete(
        &self,
        id: &ResourceId,
        identifier: &str,
        from: &State,
    ) -> BoxFuture<'_, ProviderResult<()>> {
        let id = id.clone();
        let identifier = identifier.to_string();
        let from = from.clone();
        Box::pin(async move {
            match id.resource_type.as_str() {
                KMS_KEY_TYPE => self.delete_kms_key(&id, &identifier, &from).await,
                TOOLCHAIN_TOOL_GITHUB_TYPE => Err(Self::read_only(&id)),
                _ => Err(Self::unknown_resource_type(&id)),
            }
        })
    }

    fn exists(&self, id: &ResourceId, identifier: &str) -> BoxFuture<'_, ProviderResult<bool>> {
        let id = id.clone();
        let identifier = identifier.to_string();
        Box::pin(async move {
            match id.resource_type.as_str() {
                KMS_KEY_TYPE => self.kms_key_exists(&id, &identifier).await,
                _ => {
                    let state = self.read(&id, Some(&identifier)).await?;
                    Ok(state.exists)
                }
            }
        })
    }
}

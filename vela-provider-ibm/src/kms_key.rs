//! Managed encryption key lifecycle
//!
//! The key CRN is the persisted identifier; every lifecycle call parses
//! it back, rebuilds the key-management client for the owning instance
//! and performs a fresh remote call. Key material, name and ring are
//! immutable post-creation, so Update only re-applies the force_delete
//! flag before delegating to Read.

use std::collections::HashMap;

use chrono::{DateTime, SecondsFormat, Utc};
use url::Url;

use vela_core::provider::{ProviderError, ProviderResult};
use vela_core::resource::{Resource, ResourceId, State, Value};

use crate::api::{Key, KEY_STATE_DELETED};
use crate::crn::{self, KeyCrn};
use crate::endpoints::{self, EndpointType};
use crate::provider::IbmProvider;

pub const KMS_KEY_TYPE: &str = "kms_key";

/// Typed input configuration decoded from the host attribute map
#[derive(Debug, Clone)]
pub struct KmsKeyConfig {
    pub instance_id: String,
    pub key_name: String,
    pub key_ring_id: String,
    pub standard_key: bool,
    pub endpoint_type: Option<EndpointType>,
    pub expiration_date: Option<String>,
    pub payload: Option<String>,
    pub encrypted_nonce: Option<String>,
    pub iv_value: Option<String>,
    pub force_delete: bool,
}

impl KmsKeyConfig {
    pub fn from_attributes(resource: &Resource) -> Result<Self, ProviderError> {
        let instance_id = resource
            .get_str("instance_id")
            .ok_or_else(|| ProviderError::for_attribute("instance_id", "required string"))?
            .to_string();
        let key_name = resource
            .get_str("key_name")
            .ok_or_else(|| ProviderError::for_attribute("key_name", "required string"))?
            .to_string();

        let endpoint_type = match resource.get_str("endpoint_type") {
            Some(s) if !s.is_empty() => Some(EndpointType::parse(s).ok_or_else(|| {
                ProviderError::for_attribute(
                    "endpoint_type",
                    format!("must be one of: {}", EndpointType::ALLOWED.join(", ")),
                )
            })?),
            _ => None,
        };

        Ok(Self {
            instance_id,
            key_name,
            key_ring_id: non_empty(resource.get_str("key_ring_id"))
                .unwrap_or("default")
                .to_string(),
            standard_key: resource.get_bool_or("standard_key", false),
            endpoint_type,
            expiration_date: non_empty(resource.get_str("expiration_date")).map(String::from),
            payload: non_empty(resource.get_str("payload")).map(String::from),
            encrypted_nonce: non_empty(resource.get_str("encrypted_nonce")).map(String::from),
            iv_value: non_empty(resource.get_str("iv_value")).map(String::from),
            force_delete: resource.get_bool_or("force_delete", false),
        })
    }

    /// Parsed expiration timestamp; a malformed value is a fatal input
    /// error raised before any remote call
    pub fn expiration(&self) -> Result<Option<DateTime<Utc>>, ProviderError> {
        match self.expiration_date.as_deref() {
            Some(s) => DateTime::parse_from_rfc3339(s)
                .map(|t| Some(t.with_timezone(&Utc)))
                .map_err(|e| {
                    ProviderError::for_attribute(
                        "expiration_date",
                        format!("invalid time format (the date format follows RFC 3339): {}", e),
                    )
                }),
            None => Ok(None),
        }
    }
}

fn non_empty(value: Option<&str>) -> Option<&str> {
    value.filter(|s| !s.is_empty())
}

impl IbmProvider {
    pub(crate) async fn create_kms_key(&self, resource: &Resource) -> ProviderResult<State> {
        let id = resource.id.clone();
        let config =
            KmsKeyConfig::from_attributes(resource).map_err(|e| e.for_resource(id.clone()))?;
        let expiration = config.expiration().map_err(|e| e.for_resource(id.clone()))?;

        let instance_id = crn::instance_id_from_crn(&config.instance_id).to_string();
        let endpoint_type = config.endpoint_type.unwrap_or(self.default_endpoint_type());
        let api = self
            .kms_api(&instance_id, endpoint_type, Some(&config.key_ring_id), &id)
            .await?;

        let created = match (config.standard_key, config.payload.as_deref()) {
            (true, Some(payload)) => api
                .create_imported_standard_key(&config.key_name, expiration, payload)
                .await
                .map_err(|e| ("error while creating standard key with payload", e)),
            (true, None) => api
                .create_standard_key(&config.key_name, expiration)
                .await
                .map_err(|e| ("error while creating standard key", e)),
            (false, Some(payload)) => api
                .create_imported_root_key(
                    &config.key_name,
                    expiration,
                    payload,
                    config.encrypted_nonce.as_deref().unwrap_or(""),
                    config.iv_value.as_deref().unwrap_or(""),
                )
                .await
                .map_err(|e| ("error while creating root key with payload", e)),
            (false, None) => api
                .create_root_key(&config.key_name, expiration)
                .await
                .map_err(|e| ("error while creating root key", e)),
        };
        let key = created.map_err(|(context, e)| {
            let message = format!("{}: {}", context, e);
            ProviderError::new(message)
                .for_resource(id.clone())
                .with_cause(e)
        })?;

        // Update normalizes every computed field right after creation
        let key_crn = key.crn.clone();
        self.update_kms_key(&id, &key_crn, resource).await
    }

    pub(crate) async fn update_kms_key(
        &self,
        id: &ResourceId,
        identifier: &str,
        to: &Resource,
    ) -> ProviderResult<State> {
        let force_delete = to.get_bool_or("force_delete", false);
        let endpoint_type = to
            .get_str("endpoint_type")
            .and_then(EndpointType::parse)
            .unwrap_or(self.default_endpoint_type());

        let mut state = self.read_kms_key_with(id, identifier, endpoint_type).await?;
        if state.exists {
            state
                .attributes
                .insert("force_delete".to_string(), Value::Bool(force_delete));
        }
        Ok(state)
    }

    pub(crate) async fn read_kms_key(
        &self,
        id: &ResourceId,
        identifier: &str,
    ) -> ProviderResult<State> {
        self.read_kms_key_with(id, identifier, self.default_endpoint_type())
            .await
    }

    async fn read_kms_key_with(
        &self,
        id: &ResourceId,
        identifier: &str,
        endpoint_type: EndpointType,
    ) -> ProviderResult<State> {
        let key_crn = parse_identifier(identifier, id)?;
        let api = self
            .kms_api(&key_crn.instance_id, endpoint_type, None, id)
            .await?;

        let key = match api.get_key(&key_crn.key_id).await {
            Ok(key) => key,
            // Both "not found" and "conflict" mean the key is gone or in a
            // terminal state; the host schedules recreation
            Err(e) if matches!(e.status(), Some(404 | 409)) => {
                return Ok(State::not_found(id.clone()));
            }
            Err(e) => {
                let message = format!("get key failed while reading key {}: {}", key_crn.key_id, e);
                return Err(ProviderError::new(message)
                    .for_resource(id.clone())
                    .with_cause(e));
            }
        };
        if key.state == KEY_STATE_DELETED {
            return Ok(State::not_found(id.clone()));
        }

        let attributes = key_state_attributes(&key_crn, &key, api.endpoint());
        Ok(State::existing(id.clone(), attributes).with_identifier(key_crn.as_str()))
    }

    pub(crate) async fn delete_kms_key(
        &self,
        id: &ResourceId,
        identifier: &str,
        from: &State,
    ) -> ProviderResult<()> {
        let key_crn = parse_identifier(identifier, id)?;
        let endpoint_type = from
            .get_str("endpoint_type")
            .and_then(EndpointType::parse)
            .unwrap_or(self.default_endpoint_type());
        let force = match from.attributes.get("force_delete") {
            Some(Value::Bool(b)) => *b,
            _ => false,
        };

        let api = self
            .kms_api(&key_crn.instance_id, endpoint_type, None, id)
            .await?;
        api.delete_key(&key_crn.key_id, force).await.map_err(|e| {
            let message = format!("error while deleting key {}: {}", key_crn.key_id, e);
            ProviderError::new(message)
                .for_resource(id.clone())
                .with_cause(e)
        })?;
        Ok(())
    }

    pub(crate) async fn kms_key_exists(
        &self,
        id: &ResourceId,
        identifier: &str,
    ) -> ProviderResult<bool> {
        let key_crn = parse_identifier(identifier, id)?;
        let api = self
            .kms_api(&key_crn.instance_id, self.default_endpoint_type(), None, id)
            .await?;

        match api.get_key(&key_crn.key_id).await {
            Ok(_) => Ok(true),
            Err(e) if e.is_not_found() => Ok(false),
            Err(e) => {
                let message = format!("get key failed for key {}: {}", key_crn.key_id, e);
                Err(ProviderError::new(message)
                    .for_resource(id.clone())
                    .with_cause(e))
            }
        }
    }
}

fn parse_identifier(identifier: &str, id: &ResourceId) -> ProviderResult<KeyCrn> {
    KeyCrn::parse(identifier).map_err(|e| {
        ProviderError::new(format!("invalid key identifier: {}", e)).for_resource(id.clone())
    })
}

/// Copy every remote key field into the declared schema shape
fn key_state_attributes(key_crn: &KeyCrn, key: &Key, endpoint: &Url) -> HashMap<String, Value> {
    let mut attrs = HashMap::new();
    attrs.insert(
        "instance_id".to_string(),
        Value::String(key_crn.instance_id.clone()),
    );
    attrs.insert(
        "instance_crn".to_string(),
        Value::String(key_crn.instance_crn()),
    );
    attrs.insert("key_id".to_string(), Value::String(key.id.clone()));
    attrs.insert("standard_key".to_string(), Value::Bool(key.extractable));
    if let Some(payload) = &key.payload {
        attrs.insert("payload".to_string(), Value::String(payload.clone()));
    }
    if let Some(nonce) = &key.encrypted_nonce {
        attrs.insert("encrypted_nonce".to_string(), Value::String(nonce.clone()));
    }
    if let Some(iv) = &key.iv {
        attrs.insert("iv_value".to_string(), Value::String(iv.clone()));
    }
    attrs.insert("key_name".to_string(), Value::String(key.name.clone()));
    attrs.insert("crn".to_string(), Value::String(key.crn.clone()));

    let endpoint_type = if endpoint.as_str().contains("private") {
        EndpointType::Private
    } else {
        EndpointType::Public
    };
    attrs.insert(
        "endpoint_type".to_string(),
        Value::String(endpoint_type.as_str().to_string()),
    );
    attrs.insert("type".to_string(), Value::String(key_crn.service.clone()));
    attrs.insert(
        "key_ring_id".to_string(),
        Value::String(key.key_ring_id.clone()),
    );

    let expiration_date = match &key.expiration {
        Some(t) => t.to_rfc3339_opts(SecondsFormat::Secs, true),
        None => String::new(),
    };
    attrs.insert("expiration_date".to_string(), Value::String(expiration_date));

    attrs.insert("resource_name".to_string(), Value::String(key.name.clone()));
    attrs.insert("resource_crn".to_string(), Value::String(key.crn.clone()));
    attrs.insert(
        "resource_status".to_string(),
        Value::String(key.state.to_string()),
    );
    attrs.insert(
        "resource_controller_url".to_string(),
        Value::String(endpoints::key_console_url(
            &endpoints::console_url(),
            &key.crn,
            &key.id,
        )),
    );

    attrs
}

//! Service endpoint resolution
//!
//! The key-management API base URL lives in the owning resource
//! instance's `extensions.endpoints` blob and differs between the public
//! and private networks. An environment override replaces the computed
//! base URL entirely; the `/api/v2/keys` suffix is enforced either way.

use percent_encoding::{utf8_percent_encode, AsciiSet, NON_ALPHANUMERIC};
use thiserror::Error;
use url::Url;

pub const KMS_KEYS_PATH: &str = "/api/v2/keys";

/// Replaces the computed key-management base URL when set
pub const KMS_ENDPOINT_ENV: &str = "VELA_KMS_ENDPOINT";

/// Overrides the console base URL when set
pub const CONSOLE_URL_ENV: &str = "VELA_CONSOLE_URL";

const DEFAULT_CONSOLE_URL: &str = "https://cloud.ibm.com";

/// Unreserved characters stay literal; everything else is escaped
const CRN_ESCAPE: &AsciiSet = &NON_ALPHANUMERIC
    .remove(b'-')
    .remove(b'_')
    .remove(b'.')
    .remove(b'~');

/// Which network a service endpoint is reachable on
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum EndpointType {
    #[default]
    Public,
    Private,
}

impl EndpointType {
    pub const ALLOWED: [&'static str; 2] = ["public", "private"];

    pub fn parse(s: &str) -> Option<Self> {
        match s {
            "public" => Some(EndpointType::Public),
            "private" => Some(EndpointType::Private),
            _ => None,
        }
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            EndpointType::Public => "public",
            EndpointType::Private => "private",
        }
    }
}

#[derive(Debug, Error)]
pub enum EndpointError {
    #[error("resource instance extensions carry no {0} key management endpoint")]
    MissingEndpoint(&'static str),

    #[error("error parsing key management endpoint URL: {0}")]
    InvalidUrl(#[from] url::ParseError),
}

/// Resolve the key-management API endpoint for an instance.
///
/// A `base_url_hint` already pointing at a private endpoint switches
/// selection to the private URL regardless of the requested type. The
/// environment override takes precedence over both.
pub fn kms_endpoint_url(
    extensions: &serde_json::Value,
    endpoint_type: EndpointType,
    base_url_hint: &str,
) -> Result<Url, EndpointError> {
    kms_endpoint_url_with_override(
        extensions,
        endpoint_type,
        base_url_hint,
        std::env::var(KMS_ENDPOINT_ENV).ok(),
    )
}

pub(crate) fn kms_endpoint_url_with_override(
    extensions: &serde_json::Value,
    endpoint_type: EndpointType,
    base_url_hint: &str,
    override_url: Option<String>,
) -> Result<Url, EndpointError> {
    let visibility: &'static str =
        if endpoint_type == EndpointType::Private || base_url_hint.contains("private") {
            "private"
        } else {
            "public"
        };

    let mut endpoint = match override_url {
        Some(override_url) => override_url,
        None => {
            let service_url = extensions
                .get("endpoints")
                .and_then(|e| e.get(visibility))
                .and_then(|u| u.as_str())
                .ok_or(EndpointError::MissingEndpoint(visibility))?;
            format!("{}{}", service_url, KMS_KEYS_PATH)
        }
    };
    if !endpoint.ends_with(KMS_KEYS_PATH) {
        endpoint.push_str(KMS_KEYS_PATH);
    }

    tracing::debug!(%endpoint, visibility, "resolved key management endpoint");
    Ok(Url::parse(&endpoint)?)
}

/// Console base URL for deriving resource dashboard links
pub fn console_url() -> String {
    std::env::var(CONSOLE_URL_ENV).unwrap_or_else(|_| DEFAULT_CONSOLE_URL.to_string())
}

/// Dashboard URL for a key: the owning instance CRN (key suffix
/// stripped), percent-encoded, with an encoded trailing `::`
pub fn key_console_url(console_base: &str, key_crn: &str, key_id: &str) -> String {
    let suffix = format!(":key:{}", key_id);
    let instance_crn = key_crn.strip_suffix(suffix.as_str()).unwrap_or(key_crn);
    format!(
        "{}/services/kms/{}%3A%3A",
        console_base,
        utf8_percent_encode(instance_crn, CRN_ESCAPE)
    )
}

//! Typed parsing of colon-delimited CRNs

use thiserror::Error;

/// Segments of a canonical key CRN:
/// `crn:version:cname:ctype:service:region:scope:instance:key:id`
const MIN_KEY_CRN_SEGMENTS: usize = 8;

/// Offset of the service tag from the start of the CRN
const SERVICE_SEGMENT: usize = 4;

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum CrnError {
    #[error("CRN '{crn}' has {found} segments, expected at least {min}")]
    TooFewSegments {
        crn: String,
        found: usize,
        min: usize,
    },

    #[error("CRN '{0}' does not name a key")]
    NotAKeyCrn(String),
}

/// Structured identifier parsed from a key CRN.
///
/// The key id is the last segment and the instance id the third from the
/// end; interior segments vary between deployments, so offsets anchor on
/// the ends rather than on a fixed total count.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct KeyCrn {
    raw: String,
    /// GUID of the owning key-management instance
    pub instance_id: String,
    /// Identifier of the key inside the instance
    pub key_id: String,
    /// Service tag ("kms" or "hs-crypto")
    pub service: String,
}

impl KeyCrn {
    pub fn parse(crn: &str) -> Result<Self, CrnError> {
        let segments: Vec<&str> = crn.split(':').collect();
        if segments.len() < MIN_KEY_CRN_SEGMENTS {
            return Err(CrnError::TooFewSegments {
                crn: crn.to_string(),
                found: segments.len(),
                min: MIN_KEY_CRN_SEGMENTS,
            });
        }
        if segments[segments.len() - 2] != "key" {
            return Err(CrnError::NotAKeyCrn(crn.to_string()));
        }

        Ok(Self {
            raw: crn.to_string(),
            instance_id: segments[segments.len() - 3].to_string(),
            key_id: segments[segments.len() - 1].to_string(),
            service: segments[SERVICE_SEGMENT].to_string(),
        })
    }

    /// CRN of the owning service instance, with an empty trailing
    /// resource path
    pub fn instance_crn(&self) -> String {
        match self.raw.split_once(":key:") {
            Some((prefix, _)) => format!("{}::", prefix),
            None => self.raw.clone(),
        }
    }

    pub fn as_str(&self) -> &str {
        &self.raw
    }
}

/// Reduce an instance CRN to its GUID segment; bare GUIDs pass through
/// unchanged
pub fn instance_id_from_crn(value: &str) -> &str {
    let segments: Vec<&str> = value.split(':').collect();
    if segments.len() > 3 {
        segments[segments.len() - 3]
    } else {
        value
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const KEY_CRN: &str = "crn:v1:bluemix:public:kms:us-south:a/xyz:INSTANCEID:key:KEYID";

    #[test]
    fn parse_recovers_instance_and_key_segments() {
        let crn = KeyCrn::parse(KEY_CRN).unwrap();
        assert_eq!(crn.instance_id, "INSTANCEID");
        assert_eq!(crn.key_id, "KEYID");
        assert_eq!(crn.service, "kms");
        assert_eq!(
            crn.instance_crn(),
            "crn:v1:bluemix:public:kms:us-south:a/xyz:INSTANCEID::"
        );
        assert_eq!(crn.as_str(), KEY_CRN);
    }

    #[test]
    fn parse_handles_hs_crypto_service_tag() {
        let crn = KeyCrn::parse("crn:v1:bluemix:public:hs-crypto:us-south:a/xyz:inst:key:k1")
            .unwrap();
        assert_eq!(crn.service, "hs-crypto");
    }

    #[test]
    fn parse_rejects_short_input() {
        let err = KeyCrn::parse("not-a-crn").unwrap_err();
        assert!(matches!(err, CrnError::TooFewSegments { found: 1, .. }));
    }

    #[test]
    fn parse_rejects_non_key_crns() {
        let err =
            KeyCrn::parse("crn:v1:bluemix:public:kms:us-south:a/xyz:INSTANCEID:ring:RINGID")
                .unwrap_err();
        assert!(matches!(err, CrnError::NotAKeyCrn(_)));
    }

    #[test]
    fn instance_id_from_crn_extracts_guid() {
        assert_eq!(
            instance_id_from_crn("crn:v1:bluemix:public:kms:us-south:a/xyz:INSTANCEID::"),
            "INSTANCEID"
        );
    }

    #[test]
    fn instance_id_from_crn_passes_guids_through() {
        assert_eq!(
            instance_id_from_crn("8e9e2af2-4fbf-4f0f-bd2c-fd26fc4dc856"),
            "8e9e2af2-4fbf-4f0f-bd2c-fd26fc4dc856"
        );
    }
}

//! Identity and attestation types shared by the server and plugins

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::collections::HashMap;

use crate::entry::RegistrationEntry;
use crate::error::{CoreError, Result};

const SPIFFE_SCHEME: &str = "spiffe://";

/// A SPIFFE ID (`spiffe://<trust-domain>[/path]`)
///
/// Validated on construction and then treated as an opaque join key.
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(try_from = "String", into = "String")]
pub struct SpiffeId(String);

impl SpiffeId {
    /// Parse and validate a SPIFFE ID
    pub fn parse(id: impl Into<String>) -> Result<Self> {
        let id = id.into();
        let invalid = |reason: &str| CoreError::InvalidSpiffeId {
            id: id.clone(),
            reason: reason.to_string(),
        };

        let rest = id
            .strip_prefix(SPIFFE_SCHEME)
            .ok_or_else(|| invalid("scheme must be spiffe://"))?;

        let trust_domain = rest.split('/').next().unwrap_or_default();
        if trust_domain.is_empty() {
            return Err(invalid("trust domain is empty"));
        }
        if trust_domain.contains(':') || trust_domain.contains('@') {
            return Err(invalid("trust domain must not contain a port or userinfo"));
        }
        if rest.contains('?') || rest.contains('#') {
            return Err(invalid("query and fragment are not allowed"));
        }
        if rest.ends_with('/') {
            return Err(invalid("trailing slash is not allowed"));
        }

        Ok(Self(id))
    }

    /// Build the ID of a trust domain itself (`spiffe://<td>`)
    pub fn trust_domain_id(trust_domain: &str) -> Result<Self> {
        Self::parse(format!("{SPIFFE_SCHEME}{trust_domain}"))
    }

    /// The trust domain component
    pub fn trust_domain(&self) -> &str {
        let rest = &self.0[SPIFFE_SCHEME.len()..];
        rest.split('/').next().unwrap_or_default()
    }

    /// The path component (empty for a trust-domain ID)
    pub fn path(&self) -> &str {
        let rest = &self.0[SPIFFE_SCHEME.len()..];
        match rest.find('/') {
            Some(idx) => &rest[idx..],
            None => "",
        }
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl std::fmt::Display for SpiffeId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(&self.0)
    }
}

impl std::str::FromStr for SpiffeId {
    type Err = CoreError;

    fn from_str(s: &str) -> Result<Self> {
        Self::parse(s)
    }
}

impl TryFrom<String> for SpiffeId {
    type Error = CoreError;

    fn try_from(value: String) -> Result<Self> {
        Self::parse(value)
    }
}

impl From<SpiffeId> for String {
    fn from(id: SpiffeId) -> Self {
        id.0
    }
}

/// Node attestation methods known to the server
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum AttestationType {
    /// One-time join token issued out of band
    JoinToken,
    /// Mock attestation (for testing)
    Mock,
}

impl AttestationType {
    pub fn as_str(&self) -> &'static str {
        match self {
            AttestationType::JoinToken => "join_token",
            AttestationType::Mock => "mock",
        }
    }
}

impl std::fmt::Display for AttestationType {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

impl std::str::FromStr for AttestationType {
    type Err = CoreError;

    fn from_str(s: &str) -> Result<Self> {
        match s.to_lowercase().as_str() {
            "join_token" | "join-token" | "jointoken" => Ok(AttestationType::JoinToken),
            "mock" => Ok(AttestationType::Mock),
            _ => Err(CoreError::UnknownAttestationType(s.to_string())),
        }
    }
}

/// Attestation evidence submitted by a node
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct AttestedData {
    /// Method that produced the evidence
    #[serde(rename = "type")]
    pub attestation_type: AttestationType,

    /// Method-specific payload
    pub data: Vec<u8>,
}

impl AttestedData {
    pub fn new(attestation_type: AttestationType, data: impl Into<Vec<u8>>) -> Self {
        Self {
            attestation_type,
            data: data.into(),
        }
    }
}

/// Stored record of a node that has completed attestation
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AttestedNode {
    /// Base SPIFFE ID of the node
    pub spiffe_id: SpiffeId,
    /// Attestation method used on first attestation; never changes afterwards
    pub attestation_type: AttestationType,
    /// DER of the most recently issued base SVID
    pub certificate: Vec<u8>,
    /// When the node first attested
    pub attested_at: DateTime<Utc>,
    /// When the stored certificate was last replaced
    pub updated_at: DateTime<Utc>,
}

/// A signed SVID and the TTL the agent should honor for it
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Svid {
    /// DER-encoded X.509 certificate
    pub cert: Vec<u8>,
    /// Time to live in seconds
    pub ttl: i32,
}

/// Result of a base-SVID or SVID fetch
///
/// Every key in `svids` is either the bootstrapped node ID or an ID granted
/// by one of `registration_entries`.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct SvidUpdate {
    /// Signed SVIDs keyed by SPIFFE ID
    pub svids: HashMap<SpiffeId, Svid>,
    /// Every registration entry the caller is entitled to
    pub registration_entries: Vec<RegistrationEntry>,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_valid_ids() {
        let id = SpiffeId::parse("spiffe://example.org/node/A").unwrap();
        assert_eq!(id.trust_domain(), "example.org");
        assert_eq!(id.path(), "/node/A");
        assert_eq!(id.to_string(), "spiffe://example.org/node/A");

        let td = SpiffeId::trust_domain_id("example.org").unwrap();
        assert_eq!(td.trust_domain(), "example.org");
        assert_eq!(td.path(), "");
    }

    #[test]
    fn test_parse_invalid_ids() {
        for bad in [
            "https://example.org/node",
            "spiffe://",
            "spiffe:///path",
            "spiffe://example.org:8080/node",
            "spiffe://example.org/node?x=1",
            "spiffe://example.org/node#frag",
            "spiffe://example.org/node/",
        ] {
            assert!(SpiffeId::parse(bad).is_err(), "{bad} should be rejected");
        }
    }

    #[test]
    fn test_spiffe_id_serde_validates() {
        let ok: SpiffeId = serde_json::from_str("\"spiffe://example.org/a\"").unwrap();
        assert_eq!(ok.as_str(), "spiffe://example.org/a");

        let bad: std::result::Result<SpiffeId, _> = serde_json::from_str("\"not-a-spiffe-id\"");
        assert!(bad.is_err());
    }

    #[test]
    fn test_attestation_type_parsing() {
        assert_eq!(
            "join_token".parse::<AttestationType>().unwrap(),
            AttestationType::JoinToken
        );
        assert_eq!(
            "join-token".parse::<AttestationType>().unwrap(),
            AttestationType::JoinToken
        );
        assert_eq!("mock".parse::<AttestationType>().unwrap(), AttestationType::Mock);
        assert!("aws_iid".parse::<AttestationType>().is_err());
    }
}

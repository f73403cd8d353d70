//! Join Token Node Attestor
//!
//! A join token is a one-time secret handed to a node out of band. Presenting
//! it proves the ID `spiffe://<trust-domain>/spire/agent/join_token/<token>`.
//! The token itself stays registered; the node's attested record is what
//! makes it single use. Once a node for the token ID has been recorded, every
//! later presentation arrives with `attested_before = true` and is rejected.
//! A bootstrap that fails before the record is written can be retried with
//! the same token.

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use std::collections::HashMap;
use std::sync::RwLock;
use tracing::{debug, warn};

use svid_core::{AttestationType, AttestedData, SpiffeId};

use crate::attestor::NodeAttestor;
use crate::error::{PluginError, Result};
use crate::types::AttestResponse;

/// A registered join token
#[derive(Debug, Clone)]
pub struct JoinToken {
    pub token: String,
    /// When the token stops being accepted (if ever)
    pub expires_at: Option<DateTime<Utc>>,
}

impl JoinToken {
    pub fn new(token: impl Into<String>) -> Self {
        Self {
            token: token.into(),
            expires_at: None,
        }
    }

    pub fn with_expires_at(mut self, expires_at: DateTime<Utc>) -> Self {
        self.expires_at = Some(expires_at);
        self
    }

    fn is_expired(&self) -> bool {
        self.expires_at.map(|exp| exp < Utc::now()).unwrap_or(false)
    }
}

/// Attestor for one-time join tokens
pub struct JoinTokenAttestor {
    trust_domain: String,
    tokens: RwLock<HashMap<String, JoinToken>>,
}

impl JoinTokenAttestor {
    /// Create an attestor for a trust domain with no tokens
    pub fn new(trust_domain: impl Into<String>) -> Self {
        Self {
            trust_domain: trust_domain.into(),
            tokens: RwLock::new(HashMap::new()),
        }
    }

    /// Add a token (builder style)
    pub fn with_token(self, token: impl Into<String>) -> Self {
        self.add_token(JoinToken::new(token));
        self
    }

    /// Register a token
    pub fn add_token(&self, token: JoinToken) {
        let mut tokens = self.tokens.write().unwrap();
        tokens.insert(token.token.clone(), token);
    }

    /// Number of registered tokens
    pub fn token_count(&self) -> usize {
        self.tokens.read().unwrap().len()
    }

    /// The SPIFFE ID a token proves
    pub fn spiffe_id_for(&self, token: &str) -> Result<SpiffeId> {
        Ok(SpiffeId::parse(format!(
            "spiffe://{}/spire/agent/join_token/{}",
            self.trust_domain, token
        ))?)
    }
}

#[async_trait]
impl NodeAttestor for JoinTokenAttestor {
    fn attestation_type(&self) -> AttestationType {
        AttestationType::JoinToken
    }

    fn description(&self) -> &str {
        "join token attestor"
    }

    async fn attest(&self, data: &AttestedData, attested_before: bool) -> Result<AttestResponse> {
        let token = std::str::from_utf8(&data.data)
            .map_err(|e| PluginError::InvalidData(format!("join token is not UTF-8: {}", e)))?;

        if token.is_empty() || token.contains('/') {
            return Err(PluginError::InvalidData("malformed join token".into()));
        }

        // A join token proves an identity exactly once.
        if attested_before {
            warn!("Join token presented for an already attested node");
            return Ok(AttestResponse::invalid());
        }

        let tokens = self.tokens.read().unwrap();
        let entry = match tokens.get(token) {
            Some(entry) => entry,
            None => {
                debug!("Unknown join token");
                return Ok(AttestResponse::invalid());
            }
        };

        if entry.is_expired() {
            warn!(expires_at = ?entry.expires_at, "Expired join token");
            return Ok(AttestResponse::invalid());
        }

        Ok(AttestResponse::valid(self.spiffe_id_for(token)?))
    }
}

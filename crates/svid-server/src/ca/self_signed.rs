//! In-process self-signed CA
//!
//! Generates a P-256 root at startup and signs CSRs for its own trust domain.
//! Suitable for development and single-instance deployments; the root key is
//! lost on restart.

use async_trait::async_trait;
use rcgen::{
    BasicConstraints, CertificateParams, DistinguishedName, DnType, ExtendedKeyUsagePurpose, IsCa,
    Issuer, KeyPair, KeyUsagePurpose, PublicKeyData, SanType, SignatureAlgorithm,
};
use std::time::Duration;
use time::{Duration as TimeDuration, OffsetDateTime};
use tracing::{info, warn};
use x509_parser::certification_request::X509CertificationRequest;
use x509_parser::oid_registry::asn1_rs::oid;
use x509_parser::prelude::FromDer;
use x509_parser::x509::AlgorithmIdentifier;

use svid_core::{spiffe_id_from_csr, verify_csr_signature, SpiffeId};

use super::{CaError, ServerCa};

/// Default lifetime of issued certificates
pub const DEFAULT_CERT_TTL: Duration = Duration::from_secs(3600);

/// Self-signed certificate authority for one trust domain
pub struct SelfSignedCa {
    trust_domain: String,
    root_key: KeyPair,
    root_params: CertificateParams,
    root_der: Vec<u8>,
    cert_ttl: Duration,
}

impl SelfSignedCa {
    /// Create a CA with a fresh root for `trust_domain`
    pub fn new(trust_domain: impl Into<String>) -> Result<Self, CaError> {
        let trust_domain = trust_domain.into();
        let root_id = SpiffeId::trust_domain_id(&trust_domain)
            .map_err(|e| CaError::Signing(format!("invalid trust domain: {e}")))?;

        let root_key = KeyPair::generate_for(&rcgen::PKCS_ECDSA_P256_SHA256)
            .map_err(|e| CaError::Signing(format!("root key generation failed: {e}")))?;

        let mut params = CertificateParams::new(vec![])
            .map_err(|e| CaError::Signing(format!("failed to create params: {e}")))?;

        let mut dn = DistinguishedName::new();
        dn.push(DnType::CommonName, format!("SVID Root CA - {trust_domain}"));
        params.distinguished_name = dn;

        let now = OffsetDateTime::now_utc();
        params.not_before = now;
        params.not_after = now + TimeDuration::days(3650);
        params.is_ca = IsCa::Ca(BasicConstraints::Constrained(1));
        params.key_usages = vec![KeyUsagePurpose::KeyCertSign, KeyUsagePurpose::CrlSign];

        let san = rcgen::string::Ia5String::try_from(root_id.to_string())
            .map_err(|e| CaError::Signing(format!("invalid CA SAN: {e}")))?;
        params.subject_alt_names = vec![SanType::URI(san)];

        let root_cert = params
            .clone()
            .self_signed(&root_key)
            .map_err(|e| CaError::Signing(format!("root cert generation failed: {e}")))?;

        info!(trust_domain = %trust_domain, "Generated self-signed root CA");

        Ok(Self {
            trust_domain,
            root_key,
            root_params: params,
            root_der: root_cert.der().to_vec(),
            cert_ttl: DEFAULT_CERT_TTL,
        })
    }

    /// Set the lifetime of issued certificates
    ///
    /// Every leaf gets this validity. It is independent of the TTL reported
    /// alongside the certificate in `Svid::ttl`, which comes from the service
    /// configuration or the registration entry.
    pub fn with_cert_ttl(mut self, ttl: Duration) -> Self {
        self.cert_ttl = ttl;
        self
    }

    /// DER of the root certificate
    pub fn root_der(&self) -> &[u8] {
        &self.root_der
    }

    fn sign_with_public_key(
        &self,
        public_key: &CsrPublicKey,
        spiffe_id: &SpiffeId,
    ) -> Result<Vec<u8>, CaError> {
        let mut params = CertificateParams::new(vec![])
            .map_err(|e| CaError::Signing(format!("failed to create params: {e}")))?;

        let mut dn = DistinguishedName::new();
        dn.push(DnType::CommonName, spiffe_id.path().trim_start_matches('/'));
        params.distinguished_name = dn;

        let san = rcgen::string::Ia5String::try_from(spiffe_id.to_string())
            .map_err(|e| CaError::InvalidCsr(format!("invalid SAN: {e}")))?;
        params.subject_alt_names = vec![SanType::URI(san)];

        params.is_ca = IsCa::NoCa;
        params.key_usages = vec![
            KeyUsagePurpose::DigitalSignature,
            KeyUsagePurpose::KeyEncipherment,
        ];
        params.extended_key_usages = vec![
            ExtendedKeyUsagePurpose::ServerAuth,
            ExtendedKeyUsagePurpose::ClientAuth,
        ];

        let now = OffsetDateTime::now_utc();
        params.not_before = now;
        let ttl_secs = i64::try_from(self.cert_ttl.as_secs())
            .map_err(|_| CaError::Signing(format!("certificate TTL out of range: {:?}", self.cert_ttl)))?;
        params.not_after = now
            .checked_add(TimeDuration::seconds(ttl_secs))
            .ok_or_else(|| CaError::Signing(format!("certificate TTL out of range: {:?}", self.cert_ttl)))?;

        let issuer = Issuer::from_params(&self.root_params, &self.root_key);
        let cert = params
            .signed_by(public_key, &issuer)
            .map_err(|e| CaError::Signing(format!("failed to sign certificate: {e}")))?;

        Ok(cert.der().to_vec())
    }
}

impl std::fmt::Debug for SelfSignedCa {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("SelfSignedCa")
            .field("trust_domain", &self.trust_domain)
            .field("cert_ttl", &self.cert_ttl)
            .finish_non_exhaustive()
    }
}

#[async_trait]
impl ServerCa for SelfSignedCa {
    async fn sign_csr(&self, csr: &[u8]) -> Result<Vec<u8>, CaError> {
        verify_csr_signature(csr).map_err(|e| CaError::InvalidCsr(e.to_string()))?;
        let spiffe_id = spiffe_id_from_csr(csr).map_err(|e| CaError::InvalidCsr(e.to_string()))?;

        if spiffe_id.trust_domain() != self.trust_domain {
            warn!(spiffe_id = %spiffe_id, "CSR names a foreign trust domain");
            return Err(CaError::TrustDomainMismatch {
                expected: self.trust_domain.clone(),
                actual: spiffe_id.trust_domain().to_string(),
            });
        }

        let (_, parsed) = X509CertificationRequest::from_der(csr)
            .map_err(|e| CaError::InvalidCsr(e.to_string()))?;
        let spki = &parsed.certification_request_info.subject_pki;
        let algorithm = detect_algorithm(&spki.algorithm).ok_or(CaError::UnsupportedAlgorithm)?;
        let public_key = CsrPublicKey {
            key_bytes: spki.subject_public_key.data.to_vec(),
            algorithm,
        };

        let cert = self.sign_with_public_key(&public_key, &spiffe_id)?;
        info!(spiffe_id = %spiffe_id, ttl_secs = self.cert_ttl.as_secs(), "Signed certificate");
        Ok(cert)
    }

    fn bundle(&self) -> Vec<Vec<u8>> {
        vec![self.root_der.clone()]
    }

    fn trust_domain(&self) -> &str {
        &self.trust_domain
    }
}

/// Public key taken from a CSR, signable without the private half
struct CsrPublicKey {
    key_bytes: Vec<u8>,
    algorithm: &'static SignatureAlgorithm,
}

impl PublicKeyData for CsrPublicKey {
    fn der_bytes(&self) -> &[u8] {
        &self.key_bytes
    }

    fn algorithm(&self) -> &'static SignatureAlgorithm {
        self.algorithm
    }
}

fn detect_algorithm(alg: &AlgorithmIdentifier<'_>) -> Option<&'static SignatureAlgorithm> {
    let rsa_oid = oid!(1.2.840 .113549 .1 .1 .1);
    let ec_oid = oid!(1.2.840 .10045 .2 .1);
    let ed25519_oid = oid!(1.3.101 .112);
    let secp256r1_oid = oid!(1.2.840 .10045 .3 .1 .7);
    let secp384r1_oid = oid!(1.3.132 .0 .34);

    if alg.algorithm == ed25519_oid {
        return Some(&rcgen::PKCS_ED25519);
    }
    if alg.algorithm == rsa_oid {
        return Some(&rcgen::PKCS_RSA_SHA256);
    }
    if alg.algorithm == ec_oid {
        let curve = alg.parameters.as_ref()?.as_oid().ok()?;
        if curve == secp256r1_oid {
            return Some(&rcgen::PKCS_ECDSA_P256_SHA256);
        }
        if curve == secp384r1_oid {
            return Some(&rcgen::PKCS_ECDSA_P384_SHA384);
        }
    }

    None
}

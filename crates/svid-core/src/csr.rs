//! PKCS#10 certificate signing request inspection
//!
//! A CSR proposes exactly one SPIFFE ID as a URI SAN in its extension
//! request. The proposal is never authoritative by itself: callers must still
//! check attestation or registration-entry entitlement.

use x509_parser::certification_request::X509CertificationRequest;
use x509_parser::extensions::{GeneralName, ParsedExtension};
use x509_parser::prelude::FromDer;

use crate::error::{CoreError, Result};
use crate::types::SpiffeId;

fn parse(der: &[u8]) -> Result<X509CertificationRequest<'_>> {
    let (rest, csr) = X509CertificationRequest::from_der(der)
        .map_err(|e| CoreError::MalformedCsr(e.to_string()))?;
    if !rest.is_empty() {
        return Err(CoreError::MalformedCsr(format!(
            "{} trailing bytes after request",
            rest.len()
        )));
    }
    Ok(csr)
}

/// Extract the SPIFFE ID a DER-encoded CSR asks for
pub fn spiffe_id_from_csr(der: &[u8]) -> Result<SpiffeId> {
    let csr = parse(der)?;

    let mut uris = Vec::new();
    if let Some(extensions) = csr.requested_extensions() {
        for ext in extensions {
            if let ParsedExtension::SubjectAlternativeName(san) = ext {
                for name in &san.general_names {
                    if let GeneralName::URI(uri) = name {
                        uris.push(*uri);
                    }
                }
            }
        }
    }

    if uris.len() != 1 {
        return Err(CoreError::UriSanCount(uris.len()));
    }

    SpiffeId::parse(uris[0])
}

/// Verify the CSR's self-signature (proof of possession of the private key)
pub fn verify_csr_signature(der: &[u8]) -> Result<()> {
    let csr = parse(der)?;
    csr.verify_signature()
        .map_err(|e| CoreError::CsrSignature(e.to_string()))
}

#[cfg(test)]
mod tests {
    use super::*;
    use rcgen::{CertificateParams, KeyPair, SanType};

    fn csr_with_uris(uris: &[&str]) -> Vec<u8> {
        let key = KeyPair::generate().unwrap();
        let mut params = CertificateParams::new(vec![]).unwrap();
        params.subject_alt_names = uris
            .iter()
            .map(|u| SanType::URI(rcgen::string::Ia5String::try_from(*u).unwrap()))
            .collect();
        params.serialize_request(&key).unwrap().der().to_vec()
    }

    #[test]
    fn test_extracts_spiffe_id() {
        let der = csr_with_uris(&["spiffe://example.org/node/A"]);

        let id = spiffe_id_from_csr(&der).unwrap();
        assert_eq!(id.as_str(), "spiffe://example.org/node/A");
    }

    #[test]
    fn test_rejects_missing_uri_san() {
        let der = csr_with_uris(&[]);

        assert_eq!(spiffe_id_from_csr(&der), Err(CoreError::UriSanCount(0)));
    }

    #[test]
    fn test_rejects_multiple_uri_sans() {
        let der = csr_with_uris(&["spiffe://example.org/a", "spiffe://example.org/b"]);

        assert_eq!(spiffe_id_from_csr(&der), Err(CoreError::UriSanCount(2)));
    }

    #[test]
    fn test_rejects_non_spiffe_uri() {
        let der = csr_with_uris(&["https://example.org/a"]);

        assert!(matches!(
            spiffe_id_from_csr(&der),
            Err(CoreError::InvalidSpiffeId { .. })
        ));
    }

    #[test]
    fn test_rejects_garbage() {
        assert!(matches!(
            spiffe_id_from_csr(b"bogus data"),
            Err(CoreError::MalformedCsr(_))
        ));
    }

    #[test]
    fn test_signature_verifies() {
        let der = csr_with_uris(&["spiffe://example.org/node/A"]);
        assert!(verify_csr_signature(&der).is_ok());
    }
}

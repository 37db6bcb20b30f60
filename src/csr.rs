use const_oid::AssociatedOid;
use der::asn1::{AnyRef, BitStringRef};
use der::{Decode, Encode, Sequence};
use x509_cert::name::Name;
use x509_cert::request::{CertReq, ExtensionReq};
use x509_cert::spki::SubjectPublicKeyInfoOwned;

use crate::cert::SignatureAlgorithm;
use crate::cert::extensions::{SubjectAltName, ToAndFromX509Extension};
use crate::cert::params::{DistinguishedName, ExtensionParam};
use crate::error::{DevCertError, Result};
use crate::key::PublicKey;
use crate::pem_utils;

/// Outer structure of a PKCS#10 request with the signed part left undecoded, so
/// the signature can be checked over the exact bytes that were signed.
#[derive(Sequence)]
struct RawCertReq<'a> {
    info: AnyRef<'a>,
    algorithm: AnyRef<'a>,
    signature: BitStringRef<'a>,
}

/// A decoded PKCS#10 certificate signing request.
#[derive(Debug, Clone)]
pub struct CertificateRequest {
    pub inner: CertReq,
    signed_bytes: Vec<u8>,
}

impl CertificateRequest {
    pub fn from_der(der: &[u8]) -> Result<Self> {
        let raw = RawCertReq::from_der(der)?;
        Ok(Self {
            signed_bytes: raw.info.to_der()?,
            inner: CertReq::from_der(der)?,
        })
    }

    /// Decodes a `CERTIFICATE REQUEST` or `NEW CERTIFICATE REQUEST` PEM block.
    pub fn from_pem(pem_str: &str) -> Result<Self> {
        let der = pem_utils::pem_to_der(pem_str, &pem_utils::CSR_LABELS)?;
        Self::from_der(&der)
    }

    /// Checks the request's signature against its own public key.
    pub fn verify(&self) -> Result<()> {
        let algorithm = SignatureAlgorithm::from_oid(self.inner.algorithm.oid)?;
        let signature = self.inner.signature.as_bytes().ok_or_else(|| {
            DevCertError::ParseError("CSR signature has unused bits".to_string())
        })?;
        PublicKey::from_x509spki(self.public_key_info())?
            .verify(&algorithm, &self.signed_bytes, signature)
            .map_err(|e| DevCertError::ValidationError(format!("invalid CSR signature: {e}")))
    }

    pub fn subject(&self) -> &Name {
        &self.inner.info.subject
    }

    pub fn common_name(&self) -> Option<String> {
        DistinguishedName::from_x509_name(self.subject()).common_name
    }

    pub fn public_key_info(&self) -> &SubjectPublicKeyInfoOwned {
        &self.inner.info.public_key
    }

    /// Extensions requested through the PKCS#9 `extensionRequest` attribute.
    pub fn extensions(&self) -> Result<Vec<ExtensionParam>> {
        let mut extensions = Vec::new();
        for attribute in self.inner.info.attributes.iter() {
            if attribute.oid != ExtensionReq::OID {
                continue;
            }
            for value in attribute.values.iter() {
                let requested = ExtensionReq::from_der(&value.to_der()?)?;
                extensions.extend(requested.0.iter().map(ExtensionParam::from_x509));
            }
        }
        Ok(extensions)
    }

    /// The requested Subject Alternative Name, if any.
    pub fn subject_alt_name(&self) -> Result<Option<SubjectAltName>> {
        self.extensions()?
            .iter()
            .find(|ext| ext.oid == SubjectAltName::OID)
            .map(ExtensionParam::to_extension::<SubjectAltName>)
            .transpose()
    }
}

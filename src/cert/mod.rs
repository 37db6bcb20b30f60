pub mod extensions;
pub mod params;

use const_oid::db::{rfc5912, rfc8410};
use der::asn1::Any;
use der::oid::ObjectIdentifier;
use der::{Decode, Encode};
use extensions::{SubjectKeyIdentifier, ToAndFromX509Extension};
use params::DistinguishedName;
use time::OffsetDateTime;
use x509_cert::name::Name;
use x509_cert::spki::{AlgorithmIdentifierOwned, SubjectPublicKeyInfoOwned};

use crate::error::{DevCertError, Result};
use crate::key::PublicKey;
use crate::pem_utils;

/// Represents the supported signature algorithms for certificates.
///
/// This enum provides a mapping to the corresponding OIDs for each algorithm.
/// Only the first three are ever produced by the CA; the rest are accepted when
/// verifying certificate signing requests.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SignatureAlgorithm {
    /// SHA-256 with RSA encryption (PKCS#1 v1.5).
    Sha256WithRSA,
    /// SHA-256 with ECDSA.
    Sha256WithECDSA,
    /// SHA-384 with ECDSA.
    Sha384WithECDSA,
    /// SHA-384 with RSA encryption (PKCS#1 v1.5).
    Sha384WithRSA,
    /// SHA-512 with RSA encryption (PKCS#1 v1.5).
    Sha512WithRSA,
    /// SHA-512 with ECDSA.
    Sha512WithECDSA,
    /// Pure EdDSA over Curve25519.
    Ed25519,
}

impl SignatureAlgorithm {
    pub fn oid(&self) -> ObjectIdentifier {
        match self {
            SignatureAlgorithm::Sha256WithRSA => rfc5912::SHA_256_WITH_RSA_ENCRYPTION,
            SignatureAlgorithm::Sha384WithRSA => rfc5912::SHA_384_WITH_RSA_ENCRYPTION,
            SignatureAlgorithm::Sha512WithRSA => rfc5912::SHA_512_WITH_RSA_ENCRYPTION,
            SignatureAlgorithm::Sha256WithECDSA => rfc5912::ECDSA_WITH_SHA_256,
            SignatureAlgorithm::Sha384WithECDSA => rfc5912::ECDSA_WITH_SHA_384,
            SignatureAlgorithm::Sha512WithECDSA => rfc5912::ECDSA_WITH_SHA_512,
            SignatureAlgorithm::Ed25519 => rfc8410::ID_ED_25519,
        }
    }

    /// Maps a signature algorithm identifier back to the enum.
    pub fn from_oid(oid: ObjectIdentifier) -> Result<Self> {
        match oid {
            rfc5912::SHA_256_WITH_RSA_ENCRYPTION => Ok(SignatureAlgorithm::Sha256WithRSA),
            rfc5912::SHA_384_WITH_RSA_ENCRYPTION => Ok(SignatureAlgorithm::Sha384WithRSA),
            rfc5912::SHA_512_WITH_RSA_ENCRYPTION => Ok(SignatureAlgorithm::Sha512WithRSA),
            rfc5912::ECDSA_WITH_SHA_256 => Ok(SignatureAlgorithm::Sha256WithECDSA),
            rfc5912::ECDSA_WITH_SHA_384 => Ok(SignatureAlgorithm::Sha384WithECDSA),
            rfc5912::ECDSA_WITH_SHA_512 => Ok(SignatureAlgorithm::Sha512WithECDSA),
            rfc8410::ID_ED_25519 => Ok(SignatureAlgorithm::Ed25519),
            other => Err(DevCertError::ParseError(format!(
                "unsupported signature algorithm {other}"
            ))),
        }
    }
}

impl From<SignatureAlgorithm> for AlgorithmIdentifierOwned {
    /// Converts a `SignatureAlgorithm` into an `AlgorithmIdentifierOwned`.
    ///
    /// RSA identifiers carry an explicit NULL parameter (RFC 4055); ECDSA and
    /// EdDSA identifiers omit it (RFC 5758, RFC 8410).
    fn from(value: SignatureAlgorithm) -> Self {
        let parameters = match value {
            SignatureAlgorithm::Sha256WithRSA
            | SignatureAlgorithm::Sha384WithRSA
            | SignatureAlgorithm::Sha512WithRSA => Some(Any::null()),
            _ => None,
        };
        AlgorithmIdentifierOwned {
            oid: value.oid(),
            parameters,
        }
    }
}

/// Represents an X.509 certificate.
///
/// This struct provides methods to encode the certificate into DER or PEM formats
/// and read back the fields the CA cares about.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Certificate {
    /// The inner representation of the certificate.
    pub inner: x509_cert::Certificate,
}

impl Certificate {
    /// Encodes the certificate into DER format.
    pub fn to_der(&self) -> Result<Vec<u8>> {
        self.inner
            .to_der()
            .map_err(|e| DevCertError::EncodingError(e.to_string()))
    }

    /// Encodes the certificate into a `CERTIFICATE` PEM block.
    pub fn to_pem(&self) -> Result<String> {
        Ok(pem_utils::der_to_pem(
            &self.to_der()?,
            pem_utils::CERTIFICATE_LABEL,
        ))
    }

    pub fn from_der(der: &[u8]) -> Result<Self> {
        Ok(Self {
            inner: x509_cert::Certificate::from_der(der)?,
        })
    }

    /// Decodes the first PEM block, which must be labelled `CERTIFICATE`.
    pub fn from_pem(pem_str: &str) -> Result<Self> {
        let der = pem_utils::pem_to_der(pem_str, &[pem_utils::CERTIFICATE_LABEL])?;
        Self::from_der(&der)
    }

    pub fn not_before(&self) -> OffsetDateTime {
        params::from_x509_time(&self.inner.tbs_certificate.validity.not_before)
    }

    pub fn not_after(&self) -> OffsetDateTime {
        params::from_x509_time(&self.inner.tbs_certificate.validity.not_after)
    }

    pub fn subject_name(&self) -> &Name {
        &self.inner.tbs_certificate.subject
    }

    pub fn issuer_name(&self) -> &Name {
        &self.inner.tbs_certificate.issuer
    }

    /// The subject's C, O, OU and CN attributes.
    pub fn subject(&self) -> DistinguishedName {
        DistinguishedName::from_x509_name(self.subject_name())
    }

    pub fn public_key_info(&self) -> &SubjectPublicKeyInfoOwned {
        &self.inner.tbs_certificate.subject_public_key_info
    }

    /// Subject and issuer are the same name.
    pub fn is_self_issued(&self) -> bool {
        self.subject_name() == self.issuer_name()
    }

    /// Decodes the extension of type `E`, if the certificate carries one.
    pub fn extension<E: ToAndFromX509Extension>(&self) -> Result<Option<E>> {
        let Some(extensions) = &self.inner.tbs_certificate.extensions else {
            return Ok(None);
        };
        extensions
            .iter()
            .find(|ext| ext.extn_id == E::OID)
            .map(|ext| E::from_x509_extension_value(ext.extn_value.as_bytes()))
            .transpose()
    }

    /// Returns the raw extension with the given OID.
    pub fn raw_extension(&self, oid: ObjectIdentifier) -> Option<&x509_cert::ext::Extension> {
        self.inner
            .tbs_certificate
            .extensions
            .as_ref()?
            .iter()
            .find(|ext| ext.extn_id == oid)
    }

    pub fn subject_key_identifier(&self) -> Result<Option<Vec<u8>>> {
        Ok(self.extension::<SubjectKeyIdentifier>()?.map(|ski| ski.0))
    }

    /// Checks that this certificate's signature was made by `issuer`'s key.
    pub fn verify_signed_by(&self, issuer: &Certificate) -> Result<()> {
        let algorithm = SignatureAlgorithm::from_oid(self.inner.signature_algorithm.oid)?;
        let tbs = self.inner.tbs_certificate.to_der()?;
        let signature = self.inner.signature.as_bytes().ok_or_else(|| {
            DevCertError::ParseError("signature has unused bits".to_string())
        })?;
        PublicKey::from_x509spki(issuer.public_key_info())?.verify(&algorithm, &tbs, signature)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_rsa_identifiers_carry_null_parameters() {
        let rsa: AlgorithmIdentifierOwned = SignatureAlgorithm::Sha256WithRSA.into();
        assert_eq!(rsa.parameters, Some(Any::null()));
        let ecdsa: AlgorithmIdentifierOwned = SignatureAlgorithm::Sha384WithECDSA.into();
        assert_eq!(ecdsa.oid, rfc5912::ECDSA_WITH_SHA_384);
        assert!(ecdsa.parameters.is_none());
    }

    #[test]
    fn test_oid_mapping_is_reversible() {
        for algorithm in [
            SignatureAlgorithm::Sha256WithRSA,
            SignatureAlgorithm::Sha384WithRSA,
            SignatureAlgorithm::Sha512WithRSA,
            SignatureAlgorithm::Sha256WithECDSA,
            SignatureAlgorithm::Sha384WithECDSA,
            SignatureAlgorithm::Sha512WithECDSA,
            SignatureAlgorithm::Ed25519,
        ] {
            assert_eq!(
                SignatureAlgorithm::from_oid(algorithm.oid()).unwrap(),
                algorithm
            );
        }
        assert!(SignatureAlgorithm::from_oid(rfc5912::ID_KP_SERVER_AUTH).is_err());
    }

    #[test]
    fn test_from_pem_rejects_other_labels() {
        let pem = pem_utils::der_to_pem(&[0x30, 0x00], pem_utils::PRIVATE_KEY_LABEL);
        assert!(matches!(
            Certificate::from_pem(&pem),
            Err(DevCertError::ParseError(_))
        ));
    }
}

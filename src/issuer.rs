use der::Encode;
use der::asn1::BitString;
use time::OffsetDateTime;
use x509_cert::name::Name;

use crate::cert::Certificate;
use crate::error::{DevCertError, Result};
use crate::key::KeyPair;
use crate::store::CaMaterial;
use crate::tbs_certificate::CertificateTemplate;
use crate::template::subject_key_identifier;

/// Represents an entity capable of issuing certificates.
///
/// This trait provides methods to retrieve issuer details and issue certificates.
pub trait Issuer {
    /// Returns the name placed in the issued certificate's issuer field.
    fn issuer_name(&self) -> &Name;

    /// Returns the signing key of the issuer, or `SigningKeyUnavailable`.
    fn signing_key(&self) -> Result<&KeyPair>;

    /// Key identifier copied into the issued certificate's AKI, if any.
    fn authority_key_identifier(&self) -> Result<Option<Vec<u8>>>;

    /// End of the issuer's own validity. `None` when there is no parent to outlive.
    fn not_after(&self) -> Option<OffsetDateTime>;

    /// Signs a template.
    ///
    /// # Arguments
    /// * `template` - The certificate to issue.
    ///
    /// # Returns
    /// The signed certificate, or an error when the issuer cannot sign or the
    /// template outlives the issuer.
    fn issue(&self, template: &CertificateTemplate) -> Result<Certificate> {
        let key = self.signing_key()?;

        if let Some(limit) = self.not_after() {
            if template.validity.not_after > limit {
                return Err(DevCertError::ValidationError(format!(
                    "certificate would expire at {}, after its issuer ({limit})",
                    template.validity.not_after
                )));
            }
        }

        let signature_algorithm = key.signature_algorithm();
        let authority_key_identifier = self.authority_key_identifier()?;
        let tbs_certificate = template.to_tbs_certificate_inner(
            self.issuer_name(),
            signature_algorithm,
            authority_key_identifier.as_deref(),
        )?;

        let signature = key.sign_data(&tbs_certificate.to_der()?)?;
        log::debug!(
            "signed certificate serial {} with {}",
            template.serial_number,
            key.describe()
        );

        Ok(Certificate {
            inner: x509_cert::Certificate {
                tbs_certificate,
                signature_algorithm: signature_algorithm.into(),
                signature: BitString::from_bytes(&signature)?,
            },
        })
    }
}

/// Issuer for a self-signed certificate: the subject signs itself with its own
/// fresh key.
pub struct SelfSigned<'a> {
    name: &'a Name,
    key: &'a KeyPair,
}

impl<'a> SelfSigned<'a> {
    pub fn new(name: &'a Name, key: &'a KeyPair) -> Self {
        Self { name, key }
    }
}

impl Issuer for SelfSigned<'_> {
    fn issuer_name(&self) -> &Name {
        self.name
    }

    fn signing_key(&self) -> Result<&KeyPair> {
        Ok(self.key)
    }

    fn authority_key_identifier(&self) -> Result<Option<Vec<u8>>> {
        Ok(None)
    }

    fn not_after(&self) -> Option<OffsetDateTime> {
        None
    }
}

impl Issuer for CaMaterial {
    fn issuer_name(&self) -> &Name {
        // The name of the issuer is the subject of the certificate
        self.cert.subject_name()
    }

    fn signing_key(&self) -> Result<&KeyPair> {
        self.key.as_ref().ok_or(DevCertError::SigningKeyUnavailable)
    }

    fn authority_key_identifier(&self) -> Result<Option<Vec<u8>>> {
        match self.cert.subject_key_identifier()? {
            Some(ski) => Ok(Some(ski)),
            None => Ok(Some(subject_key_identifier(self.cert.public_key_info()))),
        }
    }

    fn not_after(&self) -> Option<OffsetDateTime> {
        Some(self.cert.not_after())
    }
}

#[cfg(test)]
mod tests {
    use time::macros::datetime;

    use super::*;
    use crate::cert::extensions::{AuthorityKeyIdentifier, SubjectKeyIdentifier};
    use crate::cert::params::{DistinguishedName, Validity};
    use crate::host::classify_hosts;
    use crate::key::{KeyAlgorithm, KeyTier};
    use crate::template;

    fn root_material(key: KeyPair) -> CaMaterial {
        let subject = DistinguishedName::builder()
            .organization("Test CA")
            .common_name("Test Root")
            .build();
        let tpl = template::root(
            &subject,
            key.public_key_info().unwrap(),
            Validity {
                not_before: datetime!(2025-01-01 00:00 UTC),
                not_after: datetime!(2035-01-01 00:00 UTC),
            },
        )
        .unwrap();
        let cert = SelfSigned::new(&tpl.subject, &key).issue(&tpl).unwrap();
        CaMaterial {
            cert,
            key: Some(key),
        }
    }

    fn leaf_template(not_after: OffsetDateTime) -> CertificateTemplate {
        let hosts = classify_hosts(&["localhost"]).unwrap();
        let key = KeyPair::generate(KeyTier::Leaf, KeyAlgorithm::Ecdsa).unwrap();
        template::leaf(
            &hosts,
            "localhost",
            false,
            key.public_key_info().unwrap(),
            Validity {
                not_before: datetime!(2025-01-01 00:00 UTC),
                not_after,
            },
        )
        .unwrap()
    }

    #[test]
    fn test_root_is_self_signed() {
        let root = root_material(KeyPair::generate_ecdsa_p384());
        assert!(root.cert.is_self_issued());
        root.cert.verify_signed_by(&root.cert).unwrap();
        assert!(
            root.cert
                .extension::<AuthorityKeyIdentifier>()
                .unwrap()
                .is_none()
        );
    }

    #[test]
    fn test_leaf_links_to_parent() {
        let root = root_material(KeyPair::generate_ecdsa_p384());
        let leaf = root
            .issue(&leaf_template(datetime!(2026-01-01 00:00 UTC)))
            .unwrap();
        leaf.verify_signed_by(&root.cert).unwrap();
        assert_eq!(leaf.issuer_name(), root.cert.subject_name());

        let aki = leaf.extension::<AuthorityKeyIdentifier>().unwrap().unwrap();
        let ski = root.cert.extension::<SubjectKeyIdentifier>().unwrap().unwrap();
        assert_eq!(aki.key_identifier, ski.0);
    }

    #[test]
    fn test_rsa_root_signs() {
        let root = root_material(KeyPair::generate_rsa(2048).unwrap());
        let leaf = root
            .issue(&leaf_template(datetime!(2026-01-01 00:00 UTC)))
            .unwrap();
        leaf.verify_signed_by(&root.cert).unwrap();
    }

    #[test]
    fn test_keyless_cannot_sign() {
        let mut root = root_material(KeyPair::generate_ecdsa_p384());
        root.key = None;
        let err = root
            .issue(&leaf_template(datetime!(2026-01-01 00:00 UTC)))
            .unwrap_err();
        assert!(matches!(err, DevCertError::SigningKeyUnavailable));
    }

    #[test]
    fn test_outliving_parent_rejected() {
        let root = root_material(KeyPair::generate_ecdsa_p384());
        let err = root
            .issue(&leaf_template(datetime!(2036-01-01 00:00 UTC)))
            .unwrap_err();
        assert!(matches!(err, DevCertError::ValidationError(_)));
    }
}

use bon::Builder;
use x509_cert::Version;
use x509_cert::certificate::TbsCertificateInner;
use x509_cert::name::Name;
use x509_cert::spki::SubjectPublicKeyInfoOwned;

use crate::cert::SignatureAlgorithm;
use crate::cert::extensions::{
    AuthorityKeyIdentifier, BasicConstraints, ExtendedKeyUsage, ExtendedKeyUsageOption, KeyUsage,
    SubjectAltName, SubjectKeyIdentifier,
};
use crate::cert::params::{ExtensionParam, Validity};
use crate::error::Result;
use crate::serial::SerialNumber;

/// Unsigned description of a certificate, built fresh for every issuance.
///
/// # Fields
/// * `serial_number` - Random serial of the new certificate.
/// * `subject` - Subject name, kept as an encoded X.509 name so CSR subjects pass through unchanged.
/// * `subject_public_key_info` - The key being certified.
/// * `validity` - The `[notBefore, notAfter)` window.
/// * `key_usage` - Key usage bits, emitted as a critical extension.
/// * `extended_key_usage` - Extended key usages in emission order; omitted when empty.
/// * `subject_alt_name` - SAN lists; omitted when empty, critical when the subject is empty.
/// * `basic_constraints` - Present on CA certificates only.
/// * `subject_key_identifier` - Key identifier for CA certificates.
/// * `extra_extensions` - Extensions copied verbatim; replace generated ones with the same OID.
#[derive(Debug, Clone, Builder)]
pub struct CertificateTemplate {
    pub serial_number: SerialNumber,
    pub subject: Name,
    pub subject_public_key_info: SubjectPublicKeyInfoOwned,
    pub validity: Validity,
    pub key_usage: Option<KeyUsage>,
    #[builder(default)]
    pub extended_key_usage: Vec<ExtendedKeyUsageOption>,
    #[builder(default)]
    pub subject_alt_name: SubjectAltName,
    pub basic_constraints: Option<BasicConstraints>,
    pub subject_key_identifier: Option<Vec<u8>>,
    #[builder(default)]
    pub extra_extensions: Vec<ExtensionParam>,
}

impl CertificateTemplate {
    /// The extensions the certificate will carry, in encoding order.
    pub fn extensions(&self, authority_key_identifier: Option<&[u8]>) -> Result<Vec<ExtensionParam>> {
        let mut extensions = Vec::new();
        if let Some(key_usage) = &self.key_usage {
            extensions.push(ExtensionParam::from_extension(key_usage, true)?);
        }
        if !self.extended_key_usage.is_empty() {
            let eku = ExtendedKeyUsage {
                usage: self.extended_key_usage.clone(),
            };
            extensions.push(ExtensionParam::from_extension(&eku, false)?);
        }
        if let Some(basic_constraints) = &self.basic_constraints {
            extensions.push(ExtensionParam::from_extension(basic_constraints, true)?);
        }
        if let Some(ski) = &self.subject_key_identifier {
            extensions.push(ExtensionParam::from_extension(
                &SubjectKeyIdentifier(ski.clone()),
                false,
            )?);
        }
        if let Some(key_identifier) = authority_key_identifier {
            let aki = AuthorityKeyIdentifier {
                key_identifier: key_identifier.to_vec(),
            };
            extensions.push(ExtensionParam::from_extension(&aki, false)?);
        }
        if !self.subject_alt_name.is_empty() {
            let critical = self.subject.0.is_empty();
            extensions.push(ExtensionParam::from_extension(
                &self.subject_alt_name,
                critical,
            )?);
        }

        for extra in &self.extra_extensions {
            match extensions.iter_mut().find(|ext| ext.oid == extra.oid) {
                Some(existing) => *existing = extra.clone(),
                None => extensions.push(extra.clone()),
            }
        }
        Ok(extensions)
    }

    /// Converts the template into a `TbsCertificateInner` for DER encoding and signing.
    ///
    /// # Arguments
    /// * `issuer` - Subject name of the signing certificate.
    /// * `signature_algorithm` - Algorithm of the signing key.
    /// * `authority_key_identifier` - The signer's key identifier, `None` for self-signed roots.
    pub fn to_tbs_certificate_inner(
        &self,
        issuer: &Name,
        signature_algorithm: SignatureAlgorithm,
        authority_key_identifier: Option<&[u8]>,
    ) -> Result<TbsCertificateInner> {
        let extensions = self
            .extensions(authority_key_identifier)?
            .iter()
            .map(ExtensionParam::to_x509)
            .collect::<Result<Vec<_>>>()?;

        Ok(TbsCertificateInner {
            version: Version::V3,
            serial_number: self.serial_number.to_x509()?,
            signature: signature_algorithm.into(),
            issuer: issuer.clone(),
            validity: self.validity.to_x509_validity()?,
            subject: self.subject.clone(),
            subject_public_key_info: self.subject_public_key_info.clone(),
            issuer_unique_id: None,
            subject_unique_id: None,
            extensions: (!extensions.is_empty()).then_some(extensions),
        })
    }
}

#[cfg(test)]
mod tests {
    use time::macros::datetime;
    use x509_cert::name::RdnSequence;

    use super::*;
    use crate::cert::extensions::{KeyUsages, ToAndFromX509Extension};
    use crate::key::KeyPair;

    fn template(subject: Name) -> CertificateTemplate {
        let key = KeyPair::generate_ecdsa_p256();
        CertificateTemplate::builder()
            .serial_number(SerialNumber(42))
            .subject(subject)
            .subject_public_key_info(key.public_key_info().unwrap())
            .validity(Validity {
                not_before: datetime!(2025-01-01 00:00 UTC),
                not_after: datetime!(2026-01-01 00:00 UTC),
            })
            .key_usage(KeyUsage(
                KeyUsages::DigitalSignature | KeyUsages::KeyEncipherment,
            ))
            .extended_key_usage(vec![ExtendedKeyUsageOption::ServerAuth])
            .subject_alt_name(SubjectAltName {
                dns_names: vec!["example.com".to_string()],
                ..Default::default()
            })
            .build()
    }

    #[test]
    fn test_san_critical_only_for_empty_subject() {
        let empty = template(RdnSequence(Vec::new()));
        let exts = empty.extensions(None).unwrap();
        let san = exts
            .iter()
            .find(|ext| ext.oid == SubjectAltName::OID)
            .unwrap();
        assert!(san.critical);

        let named = template(
            crate::cert::params::with_common_name(RdnSequence(Vec::new()), "example.com").unwrap(),
        );
        let exts = named.extensions(None).unwrap();
        let san = exts
            .iter()
            .find(|ext| ext.oid == SubjectAltName::OID)
            .unwrap();
        assert!(!san.critical);
    }

    #[test]
    fn test_extra_extension_replaces_generated() {
        let mut tpl = template(RdnSequence(Vec::new()));
        let requested = SubjectAltName {
            dns_names: vec!["requested.example".to_string()],
            ..Default::default()
        };
        tpl.extra_extensions = vec![ExtensionParam::from_extension(&requested, false).unwrap()];

        let exts = tpl.extensions(Some(&[1, 2, 3])).unwrap();
        let sans: Vec<_> = exts
            .iter()
            .filter(|ext| ext.oid == SubjectAltName::OID)
            .collect();
        assert_eq!(sans.len(), 1);
        assert_eq!(sans[0].to_extension::<SubjectAltName>().unwrap(), requested);
        assert!(exts.iter().any(|ext| ext.oid == AuthorityKeyIdentifier::OID));
    }

    #[test]
    fn test_no_extensions_field_when_empty() {
        let key = KeyPair::generate_ecdsa_p256();
        let tpl = CertificateTemplate::builder()
            .serial_number(SerialNumber(1))
            .subject(RdnSequence(Vec::new()))
            .subject_public_key_info(key.public_key_info().unwrap())
            .validity(Validity {
                not_before: datetime!(2025-01-01 00:00 UTC),
                not_after: datetime!(2026-01-01 00:00 UTC),
            })
            .build();
        let tbs = tpl
            .to_tbs_certificate_inner(&RdnSequence(Vec::new()), key.signature_algorithm(), None)
            .unwrap();
        assert!(tbs.extensions.is_none());
        assert_eq!(tbs.version, Version::V3);
    }
}

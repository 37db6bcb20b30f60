//! Templates for the four kinds of certificate the CA issues.
//!
//! * Root: self-signed CA, path length 2.
//! * Intermediate: CA signed by the root, path length 1, subject inherited from the root.
//! * Leaf from a host list: server, client and/or email certificate for the given names.
//! * Leaf from a CSR: subject and extensions taken from a verified signing request.

use const_oid::ObjectIdentifier;
use sha1::{Digest, Sha1};
use x509_cert::name::RdnSequence;
use x509_cert::spki::SubjectPublicKeyInfoOwned;

use crate::cert::Certificate;
use crate::cert::extensions::{
    AuthorityKeyIdentifier, BasicConstraints, ExtendedKeyUsage, ExtendedKeyUsageOption, KeyUsage,
    KeyUsages, SubjectAltName, SubjectKeyIdentifier, ToAndFromX509Extension,
};
use crate::cert::params::{
    COUNTRY_OID, DistinguishedName, ORGANIZATION_OID, ORGANIZATIONAL_UNIT_OID, Validity,
    filter_name, with_common_name,
};
use crate::csr::CertificateRequest;
use crate::error::{DevCertError, Result};
use crate::host::HostEntry;
use crate::serial::SerialNumber;
use crate::tbs_certificate::CertificateTemplate;

pub const ROOT_PATH_LENGTH: u8 = 2;
pub const INTERMEDIATE_PATH_LENGTH: u8 = 1;

/// CSR extensions the CA always decides itself.
const CONTROLLED_EXTENSIONS: [ObjectIdentifier; 5] = [
    KeyUsage::OID,
    ExtendedKeyUsage::OID,
    BasicConstraints::OID,
    SubjectKeyIdentifier::OID,
    AuthorityKeyIdentifier::OID,
];

/// SHA-1 over the subjectPublicKey bit string (RFC 5280 section 4.2.1.2, method 1).
pub fn subject_key_identifier(spki: &SubjectPublicKeyInfoOwned) -> Vec<u8> {
    Sha1::digest(spki.subject_public_key.raw_bytes()).to_vec()
}

fn leaf_key_usage() -> KeyUsage {
    KeyUsage(KeyUsages::KeyEncipherment | KeyUsages::DigitalSignature)
}

/// Self-signed root CA template.
pub fn root(
    subject: &DistinguishedName,
    spki: SubjectPublicKeyInfoOwned,
    validity: Validity,
) -> Result<CertificateTemplate> {
    Ok(CertificateTemplate::builder()
        .serial_number(SerialNumber::random()?)
        .subject(subject.as_x509_name()?)
        .subject_key_identifier(subject_key_identifier(&spki))
        .subject_public_key_info(spki)
        .validity(validity)
        .key_usage(KeyUsage(KeyUsages::KeyCertSign.into()))
        .basic_constraints(BasicConstraints {
            is_ca: true,
            max_path_length: Some(ROOT_PATH_LENGTH),
        })
        .build())
}

/// Intermediate CA template below `root`.
///
/// Country, organization and organizational unit are copied from the root as
/// encoded; the common name is `common_name`. Fails when `root` is not itself a
/// root certificate, which keeps the hierarchy at most two levels deep.
pub fn intermediate(
    root: &Certificate,
    common_name: &str,
    spki: SubjectPublicKeyInfoOwned,
    validity: Validity,
) -> Result<CertificateTemplate> {
    if !root.is_self_issued() {
        return Err(DevCertError::ValidationError(format!(
            "\"{}\" is not a root certificate; intermediates can only be issued by the root",
            root.subject_name()
        )));
    }
    let inherited = filter_name(
        root.subject_name(),
        &[COUNTRY_OID, ORGANIZATION_OID, ORGANIZATIONAL_UNIT_OID],
    );

    Ok(CertificateTemplate::builder()
        .serial_number(SerialNumber::random()?)
        .subject(with_common_name(inherited, common_name)?)
        .subject_key_identifier(subject_key_identifier(&spki))
        .subject_public_key_info(spki)
        .validity(validity)
        .key_usage(KeyUsage(KeyUsages::KeyCertSign.into()))
        .basic_constraints(BasicConstraints {
            is_ca: true,
            max_path_length: Some(INTERMEDIATE_PATH_LENGTH),
        })
        .build())
}

/// End-entity template for a classified host list.
///
/// `common_name` is the first host as the user wrote it, which is also what
/// PKCS#12 consumers display. EKUs are clientAuth when `client` is set, serverAuth when any
/// DNS/IP/URI name is present and emailProtection when any email is present.
pub fn leaf(
    hosts: &[HostEntry],
    common_name: &str,
    client: bool,
    spki: SubjectPublicKeyInfoOwned,
    validity: Validity,
) -> Result<CertificateTemplate> {
    if hosts.is_empty() {
        return Err(DevCertError::ValidationError(
            "at least one host is required".to_string(),
        ));
    }
    let san = SubjectAltName::from_hosts(hosts);

    let mut usages = Vec::new();
    if client {
        usages.push(ExtendedKeyUsageOption::ClientAuth);
    }
    if hosts.iter().any(HostEntry::is_server_name) {
        usages.push(ExtendedKeyUsageOption::ServerAuth);
    }
    if !san.email_addresses.is_empty() {
        usages.push(ExtendedKeyUsageOption::EmailProtection);
    }

    Ok(CertificateTemplate::builder()
        .serial_number(SerialNumber::random()?)
        .subject(with_common_name(RdnSequence(Vec::new()), common_name)?)
        .subject_public_key_info(spki)
        .validity(validity)
        .key_usage(leaf_key_usage())
        .extended_key_usage(usages)
        .subject_alt_name(san)
        .build())
}

/// End-entity template for a certificate signing request.
///
/// The request signature is verified first. Subject and requested extensions are
/// carried over, except key usage, extended key usage, basic constraints and key
/// identifiers, which are always set by the CA. A request without a SAN gets a
/// DNS name equal to its common name.
pub fn from_csr(
    csr: &CertificateRequest,
    client: bool,
    validity: Validity,
) -> Result<CertificateTemplate> {
    csr.verify()?;

    let san = match csr.subject_alt_name()? {
        Some(san) => san,
        None => {
            let common_name = csr
                .common_name()
                .filter(|cn| !cn.is_empty())
                .ok_or_else(|| {
                    DevCertError::ValidationError(
                        "the CSR has neither a SAN extension nor a common name".to_string(),
                    )
                })?;
            SubjectAltName {
                dns_names: vec![common_name],
                ..Default::default()
            }
        }
    };

    let mut usages = vec![ExtendedKeyUsageOption::ServerAuth];
    if client {
        usages.push(ExtendedKeyUsageOption::ClientAuth);
    }
    if !san.email_addresses.is_empty() {
        usages.push(ExtendedKeyUsageOption::EmailProtection);
    }

    let requested = csr
        .extensions()?
        .into_iter()
        .filter(|ext| !CONTROLLED_EXTENSIONS.contains(&ext.oid))
        .collect();

    Ok(CertificateTemplate::builder()
        .serial_number(SerialNumber::random()?)
        .subject(csr.subject().clone())
        .subject_public_key_info(csr.public_key_info().clone())
        .validity(validity)
        .key_usage(leaf_key_usage())
        .extended_key_usage(usages)
        .subject_alt_name(san)
        .extra_extensions(requested)
        .build())
}

#[cfg(test)]
mod tests {
    use time::macros::datetime;

    use super::*;
    use crate::host::classify_hosts;
    use crate::key::KeyPair;

    fn validity() -> Validity {
        Validity {
            not_before: datetime!(2025-01-01 00:00 UTC),
            not_after: datetime!(2026-02-01 00:00 UTC),
        }
    }

    fn spki() -> SubjectPublicKeyInfoOwned {
        KeyPair::generate_ecdsa_p256().public_key_info().unwrap()
    }

    #[test]
    fn test_host_list_leaf() {
        let hosts = classify_hosts(&[
            "example.com",
            "*.example.com",
            "example.test",
            "localhost",
            "127.0.0.1",
            "::1",
        ])
        .unwrap();
        let tpl = leaf(&hosts, "example.com", false, spki(), validity()).unwrap();

        assert_eq!(
            DistinguishedName::from_x509_name(&tpl.subject).common_name.as_deref(),
            Some("example.com")
        );
        assert_eq!(
            tpl.subject_alt_name.dns_names,
            vec!["example.com", "*.example.com", "example.test", "localhost"]
        );
        assert_eq!(tpl.subject_alt_name.ip_addresses.len(), 2);
        assert_eq!(tpl.extended_key_usage, vec![ExtendedKeyUsageOption::ServerAuth]);
        assert!(tpl.basic_constraints.is_none());
        assert_eq!(tpl.key_usage, Some(leaf_key_usage()));
    }

    #[test]
    fn test_email_only_leaf() {
        let hosts = classify_hosts(&["filippo@example.com"]).unwrap();
        let tpl = leaf(&hosts, "filippo@example.com", false, spki(), validity()).unwrap();
        assert_eq!(
            tpl.extended_key_usage,
            vec![ExtendedKeyUsageOption::EmailProtection]
        );
    }

    #[test]
    fn test_client_leaf_usage_order() {
        let hosts = classify_hosts(&["localhost", "me@example.com"]).unwrap();
        let tpl = leaf(&hosts, "localhost", true, spki(), validity()).unwrap();
        assert_eq!(
            tpl.extended_key_usage,
            vec![
                ExtendedKeyUsageOption::ClientAuth,
                ExtendedKeyUsageOption::ServerAuth,
                ExtendedKeyUsageOption::EmailProtection
            ]
        );
    }

    #[test]
    fn test_root_template() {
        let subject = DistinguishedName::builder()
            .country("DE")
            .organization("Jane Doe CA")
            .common_name("Jane Doe - ECC Root")
            .build();
        let key_info = spki();
        let tpl = root(&subject, key_info.clone(), validity()).unwrap();
        assert_eq!(
            tpl.basic_constraints,
            Some(BasicConstraints {
                is_ca: true,
                max_path_length: Some(2)
            })
        );
        assert_eq!(tpl.key_usage, Some(KeyUsage(KeyUsages::KeyCertSign.into())));
        assert_eq!(tpl.subject_key_identifier, Some(subject_key_identifier(&key_info)));
        assert_eq!(tpl.subject_key_identifier.as_ref().map(Vec::len), Some(20));
        assert!(tpl.subject_alt_name.is_empty());
        assert!(tpl.extended_key_usage.is_empty());
    }
}

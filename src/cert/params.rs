use bon::Builder;
use const_oid::ObjectIdentifier;
use der::{Tag, Tagged};
use der::asn1::{Any, PrintableStringRef, SetOfVec};
use time::OffsetDateTime;
use x509_cert::attr::AttributeTypeAndValue;
use x509_cert::name::{Name, RdnSequence, RelativeDistinguishedName};

use super::extensions::ToAndFromX509Extension;
use crate::error::{DevCertError, Result};

pub const COUNTRY_OID: ObjectIdentifier = ObjectIdentifier::new_unwrap("2.5.4.6");
pub const ORGANIZATION_OID: ObjectIdentifier = ObjectIdentifier::new_unwrap("2.5.4.10");
pub const ORGANIZATIONAL_UNIT_OID: ObjectIdentifier = ObjectIdentifier::new_unwrap("2.5.4.11");
pub const COMMON_NAME_OID: ObjectIdentifier = ObjectIdentifier::new_unwrap("2.5.4.3");

/// Distinguished name fields used by the local CA.
///
/// # Fields
/// * `common_name` - The common name (CN).
/// * `country` - The country (C).
/// * `organization` - The organization (O).
/// * `organization_unit` - The organizational unit (OU).
#[derive(Clone, Debug, Builder, Default, PartialEq, Eq)]
pub struct DistinguishedName {
    #[builder(into)]
    pub common_name: Option<String>,
    #[builder(into)]
    pub country: Option<String>,
    #[builder(into)]
    pub organization: Option<String>,
    #[builder(into)]
    pub organization_unit: Option<String>,
}

impl DistinguishedName {
    /// Converts the distinguished name to an X.509 name.
    ///
    /// Attributes are emitted in C, O, OU, CN order, one per RDN; absent fields are skipped.
    /// The country is a PrintableString, everything else a UTF8String.
    pub fn as_x509_name(&self) -> Result<Name> {
        let mut rdns = Vec::new();
        if let Some(country) = &self.country {
            PrintableStringRef::new(country).map_err(|_| {
                DevCertError::ValidationError(format!("invalid country code {country:?}"))
            })?;
            rdns.push(single_attribute_rdn(
                COUNTRY_OID,
                Any::new(Tag::PrintableString, country.as_bytes())?,
            )?);
        }
        for (oid, value) in [
            (ORGANIZATION_OID, &self.organization),
            (ORGANIZATIONAL_UNIT_OID, &self.organization_unit),
            (COMMON_NAME_OID, &self.common_name),
        ] {
            if let Some(value) = value {
                rdns.push(single_attribute_rdn(
                    oid,
                    Any::new(Tag::Utf8String, value.as_bytes())?,
                )?);
            }
        }
        Ok(RdnSequence(rdns))
    }

    /// Extracts the supported fields from an X.509 name.
    ///
    /// String attributes of any of the common ASN.1 string types are accepted; other
    /// attributes are ignored.
    pub fn from_x509_name(x509dn: &Name) -> Self {
        let mut dn = DistinguishedName::default();
        for rdn in x509dn.0.iter() {
            for attr in rdn.0.iter() {
                let Some(value) = attribute_string(attr) else {
                    continue;
                };
                match attr.oid {
                    COMMON_NAME_OID => dn.common_name = Some(value),
                    COUNTRY_OID => dn.country = Some(value),
                    ORGANIZATION_OID => dn.organization = Some(value),
                    ORGANIZATIONAL_UNIT_OID => dn.organization_unit = Some(value),
                    _ => {}
                }
            }
        }
        dn
    }
}

fn single_attribute_rdn(oid: ObjectIdentifier, value: Any) -> Result<RelativeDistinguishedName> {
    let attribute = AttributeTypeAndValue { oid, value };
    Ok(RelativeDistinguishedName(SetOfVec::try_from(vec![
        attribute,
    ])?))
}

fn attribute_string(attr: &AttributeTypeAndValue) -> Option<String> {
    match attr.value.tag() {
        Tag::Utf8String | Tag::PrintableString | Tag::Ia5String | Tag::TeletexString => {
            std::str::from_utf8(attr.value.value()).ok().map(str::to_string)
        }
        _ => None,
    }
}

/// Returns a name keeping only the RDNs whose attributes are all in `oids`, in their
/// original order and encoding.
pub fn filter_name(name: &Name, oids: &[ObjectIdentifier]) -> Name {
    RdnSequence(
        name.0
            .iter()
            .filter(|rdn| rdn.0.iter().all(|attr| oids.contains(&attr.oid)))
            .cloned()
            .collect(),
    )
}

/// Appends a UTF8String common name RDN to `name`.
pub fn with_common_name(mut name: Name, common_name: &str) -> Result<Name> {
    name.0.push(single_attribute_rdn(
        COMMON_NAME_OID,
        Any::new(Tag::Utf8String, common_name.as_bytes())?,
    )?);
    Ok(name)
}

/// Certificate validity period.
///
/// This struct represents the `notBefore` and `notAfter` fields in a certificate.
///
/// # Fields
/// * `not_before` - The start of the validity period.
/// * `not_after` - The end of the validity period.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct Validity {
    pub not_before: OffsetDateTime,
    pub not_after: OffsetDateTime,
}

impl Validity {
    /// Converts to the X.509 representation.
    ///
    /// Dates before 2050 use UTCTime and later ones GeneralizedTime, as RFC 5280 requires.
    pub fn to_x509_validity(&self) -> Result<x509_cert::time::Validity> {
        Ok(x509_cert::time::Validity {
            not_before: to_x509_time(self.not_before)?,
            not_after: to_x509_time(self.not_after)?,
        })
    }
}

fn to_x509_time(at: OffsetDateTime) -> Result<x509_cert::time::Time> {
    let seconds = u64::try_from(at.unix_timestamp()).map_err(|_| {
        DevCertError::ValidationError(format!("time {at} predates the Unix epoch"))
    })?;
    let since_epoch = std::time::Duration::from_secs(seconds);
    if at.year() < 2050 {
        Ok(x509_cert::time::Time::UtcTime(
            der::asn1::UtcTime::from_unix_duration(since_epoch)?,
        ))
    } else {
        Ok(x509_cert::time::Time::GeneralTime(
            der::asn1::GeneralizedTime::from_unix_duration(since_epoch)?,
        ))
    }
}

/// Converts an X.509 time to `OffsetDateTime`.
pub fn from_x509_time(time: &x509_cert::time::Time) -> OffsetDateTime {
    OffsetDateTime::from(time.to_system_time())
}

/// Represents an X.509 extension.
///
/// This struct contains the OID, criticality, and value of an extension.
///
/// # Fields
/// * `oid` - The object identifier of the extension.
/// * `critical` - Indicates if the extension is critical.
/// * `value` - The DER-encoded value of the extension.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct ExtensionParam {
    pub oid: ObjectIdentifier,
    pub critical: bool,
    /// DER-encoded extension value
    pub value: Vec<u8>,
}

impl ExtensionParam {
    /// Creates an `ExtensionParam` from a specific extension.
    ///
    /// # Arguments
    /// * `extension` - The extension to encode.
    /// * `critical` - Indicates if the extension is critical.
    pub fn from_extension<E: ToAndFromX509Extension>(extension: &E, critical: bool) -> Result<Self> {
        Ok(Self {
            oid: E::OID,
            critical,
            value: extension.to_x509_extension_value()?,
        })
    }

    /// Copies an extension as found in a certificate or request.
    pub fn from_x509(extension: &x509_cert::ext::Extension) -> Self {
        Self {
            oid: extension.extn_id,
            critical: extension.critical,
            value: extension.extn_value.as_bytes().to_vec(),
        }
    }

    /// Decodes an `ExtensionParam` into a specific extension.
    pub fn to_extension<E: ToAndFromX509Extension>(&self) -> Result<E> {
        E::from_x509_extension_value(&self.value)
    }

    pub fn to_x509(&self) -> Result<x509_cert::ext::Extension> {
        Ok(x509_cert::ext::Extension {
            extn_id: self.oid,
            critical: self.critical,
            extn_value: der::asn1::OctetString::new(self.value.clone())?,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_name_round_trip() {
        let dn = DistinguishedName::builder()
            .country("DE")
            .organization("Jane Doe CA")
            .organization_unit("Dev, Ops")
            .common_name("Jane Doe - ECC Root")
            .build();
        let name = dn.as_x509_name().unwrap();
        assert_eq!(name.0.len(), 4);
        assert_eq!(DistinguishedName::from_x509_name(&name), dn);
    }

    #[test]
    fn test_absent_fields_skipped() {
        let dn = DistinguishedName::builder().common_name("example.com").build();
        let name = dn.as_x509_name().unwrap();
        assert_eq!(name.0.len(), 1);
        assert_eq!(name.to_string(), "CN=example.com");
    }

    #[test]
    fn test_invalid_country_rejected() {
        let dn = DistinguishedName::builder().country("D@").build();
        assert!(matches!(
            dn.as_x509_name(),
            Err(DevCertError::ValidationError(_))
        ));
    }

    #[test]
    fn test_filter_keeps_order() {
        let dn = DistinguishedName::builder()
            .country("DE")
            .organization("Org")
            .common_name("Root")
            .build();
        let name = dn.as_x509_name().unwrap();
        let filtered = filter_name(&name, &[COUNTRY_OID, ORGANIZATION_OID]);
        let inter = with_common_name(filtered, "Inter").unwrap();
        let parsed = DistinguishedName::from_x509_name(&inter);
        assert_eq!(parsed.country.as_deref(), Some("DE"));
        assert_eq!(parsed.organization.as_deref(), Some("Org"));
        assert_eq!(parsed.common_name.as_deref(), Some("Inter"));
        assert_eq!(inter.0[0], name.0[0]);
    }

    #[test]
    fn test_time_encoding_switches_after_2049() {
        let early = OffsetDateTime::from_unix_timestamp(2_000_000_000).unwrap();
        assert!(matches!(
            to_x509_time(early).unwrap(),
            x509_cert::time::Time::UtcTime(_)
        ));
        let late = OffsetDateTime::from_unix_timestamp(2_600_000_000).unwrap();
        let encoded = to_x509_time(late).unwrap();
        assert!(matches!(encoded, x509_cert::time::Time::GeneralTime(_)));
        assert_eq!(from_x509_time(&encoded), late);
    }
}

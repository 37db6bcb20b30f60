//! Per-operation options, normally filled in from command line flags.

use std::path::PathBuf;

use bon::Builder;

use crate::cert::params::DistinguishedName;
use crate::identity::{SystemIdentity, default_organization, display_name};
use crate::key::KeyAlgorithm;
use crate::lifetime::LifetimeRequest;
use crate::naming::PathOverrides;
use crate::output::OutputFormat;

/// Country placed in new roots when none is configured.
pub const DEFAULT_COUNTRY: &str = "DE";

/// Options for loading or creating the root CA.
#[derive(Debug, Clone, Default, Builder)]
pub struct RootOptions {
    #[builder(into)]
    pub country: Option<String>,
    #[builder(into)]
    pub organization: Option<String>,
    #[builder(into)]
    pub organizational_unit: Option<String>,
    #[builder(into)]
    pub common_name: Option<String>,
    /// Root lifetime in years; ten when unset.
    pub validity_years: Option<u32>,
    /// Replace an existing root, keeping the old files as backups.
    #[builder(default)]
    pub force_new: bool,
    #[builder(default)]
    pub key_algorithm: KeyAlgorithm,
}

impl RootOptions {
    /// Whether any setting only used when creating a root was given.
    pub fn has_custom_subject(&self) -> bool {
        self.country.is_some()
            || self.organization.is_some()
            || self.organizational_unit.is_some()
            || self.common_name.is_some()
            || self.validity_years.is_some()
    }

    /// Subject of a new root: configured values, else identity based defaults.
    pub fn subject(&self, identity: &dyn SystemIdentity) -> DistinguishedName {
        let common_name = self.common_name.clone().unwrap_or_else(|| {
            let suffix = match self.key_algorithm {
                KeyAlgorithm::Ecdsa => "ECC Root",
                KeyAlgorithm::Rsa => "RSA Root",
            };
            format!("{} - {suffix}", display_name(identity))
        });
        DistinguishedName {
            country: Some(
                self.country
                    .clone()
                    .unwrap_or_else(|| DEFAULT_COUNTRY.to_string()),
            ),
            organization: Some(
                self.organization
                    .clone()
                    .unwrap_or_else(|| default_organization(identity)),
            ),
            organization_unit: self.organizational_unit.clone(),
            common_name: Some(common_name),
        }
    }
}

/// Options for a leaf certificate issued for a list of hosts.
#[derive(Debug, Clone, Default, Builder)]
pub struct LeafOptions {
    /// Add clientAuth to the extended key usages.
    #[builder(default)]
    pub client: bool,
    #[builder(default)]
    pub key_algorithm: KeyAlgorithm,
    #[builder(default)]
    pub format: OutputFormat,
    #[builder(into)]
    pub cert_file: Option<PathBuf>,
    #[builder(into)]
    pub key_file: Option<PathBuf>,
    #[builder(into)]
    pub p12_file: Option<PathBuf>,
    #[builder(default)]
    pub lifetime: LifetimeRequest,
}

impl LeafOptions {
    pub fn path_overrides(&self) -> PathOverrides {
        PathOverrides {
            cert_file: self.cert_file.clone(),
            key_file: self.key_file.clone(),
            p12_file: self.p12_file.clone(),
        }
    }
}

/// Options for an intermediate CA.
#[derive(Debug, Clone, Default, Builder)]
pub struct IntermediateOptions {
    /// Defaults to `<organization> - Intermediate`.
    #[builder(into)]
    pub common_name: Option<String>,
    #[builder(default)]
    pub key_algorithm: KeyAlgorithm,
    #[builder(default)]
    pub lifetime: LifetimeRequest,
}

impl IntermediateOptions {
    pub fn common_name(&self, identity: &dyn SystemIdentity) -> String {
        self.common_name
            .clone()
            .unwrap_or_else(|| format!("{} - Intermediate", default_organization(identity)))
    }
}

/// Options for a leaf certificate issued from a CSR.
#[derive(Debug, Clone, Default, Builder)]
pub struct CsrOptions {
    #[builder(default)]
    pub client: bool,
    #[builder(into)]
    pub cert_file: Option<PathBuf>,
    #[builder(default)]
    pub lifetime: LifetimeRequest,
}

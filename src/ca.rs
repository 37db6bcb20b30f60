use std::fs;
use std::path::{Path, PathBuf};

use log::{info, warn};
use time::OffsetDateTime;

use crate::cert::extensions::SubjectAltName;
use crate::config::{CsrOptions, IntermediateOptions, LeafOptions, RootOptions};
use crate::csr::CertificateRequest;
use crate::error::{DevCertError, Result};
use crate::host::{classify_hosts, display_names, host_hints};
use crate::identity::SystemIdentity;
use crate::issuer::Issuer;
use crate::key::{KeyPair, KeyTier};
use crate::lifetime::{ClampedValidity, IssuedTier, LifetimeRequest, issued_validity};
use crate::naming::{PathOverrides, intermediate_paths, output_paths};
use crate::output::{self, OutputFormat, WrittenFiles};
use crate::report::{IssuanceReport, PolicyWarning};
use crate::store::{CaMaterial, CaStore};
use crate::template;

/// A local CA ready to issue certificates into an output directory.
///
/// Leaves are signed by whatever material the CA holds: the root loaded from a
/// [`CaStore`], or an intermediate loaded with [`CaMaterial::from_files`].
#[derive(Debug, Clone)]
pub struct LocalCa {
    signer: CaMaterial,
    output_dir: PathBuf,
}

impl LocalCa {
    /// Loads (or creates) the root in `store`.
    pub fn new(store: &CaStore, options: &RootOptions, identity: &dyn SystemIdentity) -> Result<Self> {
        Ok(Self::from_material(store.load(options, identity)?))
    }

    pub fn from_material(signer: CaMaterial) -> Self {
        Self {
            signer,
            output_dir: PathBuf::from("."),
        }
    }

    /// Directory for files whose path is not given explicitly. Defaults to `.`.
    pub fn with_output_dir(mut self, output_dir: impl Into<PathBuf>) -> Self {
        self.output_dir = output_dir.into();
        self
    }

    pub fn material(&self) -> &CaMaterial {
        &self.signer
    }

    fn clamp(
        &self,
        tier: IssuedTier,
        request: &LifetimeRequest,
    ) -> Result<(ClampedValidity, Vec<PolicyWarning>)> {
        let clamped = issued_validity(
            OffsetDateTime::now_utc(),
            tier,
            request,
            self.signer.cert.not_after(),
        )?;
        let mut warnings = Vec::new();
        if clamped.reduced {
            let warning = PolicyWarning::ReducedValidity {
                not_after: clamped.validity.not_after,
            };
            warn!("{warning}");
            warnings.push(warning);
        }
        Ok((clamped, warnings))
    }

    /// Issues a leaf for `hosts` and writes it in the requested format.
    pub fn issue_leaf<S: AsRef<str>>(&self, hosts: &[S], options: &LeafOptions) -> Result<IssuanceReport> {
        self.signer.signing_key()?;
        let entries = classify_hosts(hosts)?;
        let names = display_names(hosts, &entries);

        let key = KeyPair::generate(KeyTier::Leaf, options.key_algorithm)?;
        let (clamped, warnings) = self.clamp(IssuedTier::Leaf, &options.lifetime)?;
        let tpl = template::leaf(
            &entries,
            names.first().map(String::as_str).unwrap_or_default(),
            options.client,
            key.public_key_info()?,
            clamped.validity,
        )?;
        let certificate = self.signer.issue(&tpl)?;

        let paths = output_paths(&self.output_dir, &names, options.client, &options.path_overrides())?;
        let files = match options.format {
            OutputFormat::Pem => output::write_pem(&certificate, &key, &paths.cert, &paths.key)?,
            OutputFormat::Pkcs12 => {
                output::write_pkcs12(&certificate, &key, &self.signer.cert, &paths.p12)?
            }
        };

        let hints = host_hints(&entries);
        for hint in &hints {
            warn!("{hint}");
        }
        info!(
            "Created a new certificate valid for {names:?}, expiring {}",
            clamped.validity.not_after.date()
        );
        log_files(&files);

        Ok(IssuanceReport {
            certificate,
            hosts: names,
            files,
            warnings,
            hints,
        })
    }

    /// Issues an intermediate CA below the root and writes it as `<cn>.pem` and `<cn>.key`.
    pub fn issue_intermediate(
        &self,
        options: &IntermediateOptions,
        identity: &dyn SystemIdentity,
    ) -> Result<IssuanceReport> {
        self.signer.signing_key()?;
        let common_name = options.common_name(identity);

        let key = KeyPair::generate(KeyTier::Ca, options.key_algorithm)?;
        let (clamped, warnings) = self.clamp(IssuedTier::Intermediate, &options.lifetime)?;
        let tpl = template::intermediate(
            &self.signer.cert,
            &common_name,
            key.public_key_info()?,
            clamped.validity,
        )?;
        let certificate = self.signer.issue(&tpl)?;

        let (cert_path, key_path) = intermediate_paths(&self.output_dir, &common_name);
        let intermediate = CaMaterial {
            cert: certificate,
            key: Some(key),
        };
        intermediate.save(&cert_path, &key_path)?;
        let files = WrittenFiles::Pem {
            cert: cert_path,
            key: key_path,
        };
        info!(
            "Created a new intermediate certificate \"{common_name}\", expiring {}",
            clamped.validity.not_after.date()
        );
        log_files(&files);

        Ok(IssuanceReport {
            certificate: intermediate.cert,
            hosts: Vec::new(),
            files,
            warnings,
            hints: Vec::new(),
        })
    }

    /// Issues a leaf for the CSR at `csr_path`; only the certificate is written.
    pub fn issue_from_csr(&self, csr_path: &Path, options: &CsrOptions) -> Result<IssuanceReport> {
        self.signer.signing_key()?;
        let csr_pem =
            fs::read_to_string(csr_path).map_err(DevCertError::io("read the CSR", csr_path))?;
        let csr = CertificateRequest::from_pem(&csr_pem)?;

        let (clamped, warnings) = self.clamp(IssuedTier::Leaf, &options.lifetime)?;
        let tpl = template::from_csr(&csr, options.client, clamped.validity)?;
        let certificate = self.signer.issue(&tpl)?;

        let hosts = certificate
            .extension::<SubjectAltName>()?
            .map(|san| san.hosts())
            .unwrap_or_default();
        let overrides = PathOverrides {
            cert_file: options.cert_file.clone(),
            ..Default::default()
        };
        let paths = output_paths(&self.output_dir, &hosts, options.client, &overrides)?;
        let files = output::write_certificate(&certificate, &paths.cert)?;
        info!(
            "Created a new certificate from \"{}\" valid for {hosts:?}, expiring {}",
            csr_path.display(),
            clamped.validity.not_after.date()
        );
        log_files(&files);

        Ok(IssuanceReport {
            certificate,
            hosts,
            files,
            warnings,
            hints: Vec::new(),
        })
    }
}

fn log_files(files: &WrittenFiles) {
    match files {
        WrittenFiles::Pem { cert, key } => info!(
            "The certificate is at \"{}\" and the key at \"{}\"",
            cert.display(),
            key.display()
        ),
        WrittenFiles::Combined(path) => {
            info!("The certificate and key are at \"{}\"", path.display())
        }
        WrittenFiles::Pkcs12(path) => info!(
            "The PKCS#12 bundle is at \"{}\" (password \"{}\")",
            path.display(),
            output::PKCS12_PASSWORD
        ),
        WrittenFiles::CertificateOnly(path) => {
            info!("The certificate is at \"{}\"", path.display())
        }
    }
}

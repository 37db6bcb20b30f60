use std::fs;
use std::path::{Path, PathBuf};

use log::{info, warn};
use time::OffsetDateTime;

use crate::cert::Certificate;
use crate::config::RootOptions;
use crate::error::{DevCertError, Result};
use crate::identity::SystemIdentity;
use crate::issuer::{Issuer, SelfSigned};
use crate::key::{KeyPair, KeyTier};
use crate::lifetime;
use crate::output::{CA_KEY_MODE, CERT_MODE, write_file};
use crate::serial::SerialNumber;
use crate::template;

pub const ROOT_CERT_FILE: &str = "rootCA.pem";
pub const ROOT_KEY_FILE: &str = "rootCA.key";
/// Appended to root files moved aside by a rotation.
pub const BACKUP_SUFFIX: &str = "-old.bak";

/// Position of a CA certificate in the hierarchy.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CaTier {
    Root,
    Intermediate,
}

/// A CA certificate and, unless the CA is keyless, its private key.
#[derive(Debug, Clone)]
pub struct CaMaterial {
    pub cert: Certificate,
    pub key: Option<KeyPair>,
}

impl CaMaterial {
    /// A keyless CA can be trusted but cannot sign.
    pub fn is_keyless(&self) -> bool {
        self.key.is_none()
    }

    pub fn tier(&self) -> CaTier {
        if self.cert.is_self_issued() {
            CaTier::Root
        } else {
            CaTier::Intermediate
        }
    }

    /// Nickname used when installing into trust stores: `<organization> - RootCA<serial>`.
    pub fn unique_name(&self) -> Result<String> {
        let serial = SerialNumber::from_x509(&self.cert.inner.tbs_certificate.serial_number)?;
        let organization = self.cert.subject().organization.unwrap_or_default();
        Ok(format!("{organization} - RootCA{serial}"))
    }

    /// Loads a PEM certificate and, when `key_path` is given, its PKCS#8 key.
    pub fn from_files(cert_path: &Path, key_path: Option<&Path>) -> Result<Self> {
        let cert_pem = fs::read_to_string(cert_path)
            .map_err(DevCertError::io("read the CA certificate", cert_path))?;
        let cert = Certificate::from_pem(&cert_pem)?;
        let key = match key_path {
            Some(key_path) => {
                let key_pem = fs::read_to_string(key_path)
                    .map_err(DevCertError::io("read the CA key", key_path))?;
                let key = KeyPair::from_pkcs8_pem(&key_pem)?;
                check_key_matches(&cert, &key)?;
                Some(key)
            }
            None => None,
        };
        Ok(Self { cert, key })
    }

    /// Writes the key read-only for the owner and the certificate world readable.
    pub fn save(&self, cert_path: &Path, key_path: &Path) -> Result<()> {
        if let Some(key) = &self.key {
            write_file(key_path, key.to_pkcs8_pem()?.as_bytes(), CA_KEY_MODE)?;
        }
        write_file(cert_path, self.cert.to_pem()?.as_bytes(), CERT_MODE)
    }
}

fn check_key_matches(cert: &Certificate, key: &KeyPair) -> Result<()> {
    let from_key = key.public_key_info()?;
    if from_key.subject_public_key != cert.public_key_info().subject_public_key {
        return Err(DevCertError::ValidationError(
            "the CA key does not match the CA certificate".to_string(),
        ));
    }
    Ok(())
}

/// The directory holding the root CA.
#[derive(Debug, Clone)]
pub struct CaStore {
    root_dir: PathBuf,
}

impl CaStore {
    pub fn new(root_dir: impl Into<PathBuf>) -> Self {
        Self {
            root_dir: root_dir.into(),
        }
    }

    /// Resolves the directory through `identity` and creates it if needed.
    pub fn open(identity: &dyn SystemIdentity) -> Result<Self> {
        let root_dir = identity.ca_root().ok_or_else(|| {
            DevCertError::ConfigError(
                "set the CAROOT environment variable or configure a data directory".to_string(),
            )
        })?;
        let mut builder = fs::DirBuilder::new();
        builder.recursive(true);
        // Only directories created here get the mode; existing ones are left alone.
        #[cfg(unix)]
        {
            use std::os::unix::fs::DirBuilderExt;
            builder.mode(0o755);
        }
        builder
            .create(&root_dir)
            .map_err(DevCertError::io("create the CA folder", &root_dir))?;
        Ok(Self::new(root_dir))
    }

    pub fn root_dir(&self) -> &Path {
        &self.root_dir
    }

    pub fn cert_path(&self) -> PathBuf {
        self.root_dir.join(ROOT_CERT_FILE)
    }

    pub fn key_path(&self) -> PathBuf {
        self.root_dir.join(ROOT_KEY_FILE)
    }

    /// Loads the root CA, creating it first when absent or when `force_new` is set.
    ///
    /// An expired root is an error; only a forced rotation replaces it. A missing
    /// key file gives a keyless CA.
    pub fn load(&self, options: &RootOptions, identity: &dyn SystemIdentity) -> Result<CaMaterial> {
        let cert_path = self.cert_path();
        let key_path = self.key_path();

        if !cert_path.exists() || options.force_new {
            self.generate_new_root(options, identity)?;
        } else if options.has_custom_subject() {
            warn!(
                "A root CA already exists at \"{}\"; the custom root options are ignored unless a new root is forced",
                cert_path.display()
            );
        }

        let key_path = key_path.exists().then_some(key_path);
        let material = CaMaterial::from_files(&cert_path, key_path.as_deref())?;

        let not_after = material.cert.not_after();
        if not_after < OffsetDateTime::now_utc() {
            return Err(DevCertError::ValidationError(format!(
                "the root certificate expired on {}; force a new root to replace it",
                not_after.date()
            )));
        }
        if material.is_keyless() {
            info!(
                "The CA key ({ROOT_KEY_FILE}) is missing; only trust store operations are possible"
            );
        }
        Ok(material)
    }

    /// Creates a new root CA, moving any existing root files aside first.
    pub fn generate_new_root(
        &self,
        options: &RootOptions,
        identity: &dyn SystemIdentity,
    ) -> Result<CaMaterial> {
        let key = KeyPair::generate(KeyTier::Ca, options.key_algorithm)?;
        let subject = options.subject(identity);
        let validity = lifetime::root_validity(OffsetDateTime::now_utc(), options.validity_years)?;
        let tpl = template::root(&subject, key.public_key_info()?, validity)?;
        let cert = SelfSigned::new(&tpl.subject, &key).issue(&tpl)?;

        for (path, what) in [
            (self.key_path(), "root CA key"),
            (self.cert_path(), "root CA certificate"),
        ] {
            if path.exists() {
                let backup = backup_path(&path);
                fs::rename(&path, &backup).map_err(DevCertError::io("move aside", &path))?;
                info!("Moved old {what} to \"{}\"", backup.display());
            }
        }

        let material = CaMaterial {
            cert,
            key: Some(key),
        };
        material.save(&self.cert_path(), &self.key_path())?;
        info!(
            "Created a new local CA \"{}\" ({}) at \"{}\"",
            subject.common_name.unwrap_or_default(),
            material.key.as_ref().map(KeyPair::describe).unwrap_or_default(),
            self.root_dir.display()
        );
        Ok(material)
    }
}

fn backup_path(path: &Path) -> PathBuf {
    let mut backup = path.as_os_str().to_owned();
    backup.push(BACKUP_SUFFIX);
    PathBuf::from(backup)
}

use std::io::Write;
use std::path::{Path, PathBuf};

use tempfile::NamedTempFile;

use crate::cert::Certificate;
use crate::error::{DevCertError, Result};
use crate::key::KeyPair;

/// Password of every PKCS#12 bundle. Many Java and Windows tools assume it, so it
/// is not a secret.
pub const PKCS12_PASSWORD: &str = "changeit";

pub const CERT_MODE: u32 = 0o644;
pub const KEY_MODE: u32 = 0o600;
pub const CA_KEY_MODE: u32 = 0o400;

/// How a leaf certificate and its key are written. The two are exclusive.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub enum OutputFormat {
    /// Certificate and key as PEM, in two files or one combined file.
    #[default]
    Pem,
    /// A single PKCS#12 bundle with the issuing CA certificate included.
    Pkcs12,
}

/// Files produced by one write.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum WrittenFiles {
    Pem { cert: PathBuf, key: PathBuf },
    /// Key followed by certificate in a single file.
    Combined(PathBuf),
    Pkcs12(PathBuf),
    CertificateOnly(PathBuf),
}

/// Writes `contents` to `path` through a temporary file in the same directory,
/// so a crash never leaves a half written file behind.
pub(crate) fn write_file(path: &Path, contents: &[u8], mode: u32) -> Result<()> {
    let dir = match path.parent() {
        Some(parent) if !parent.as_os_str().is_empty() => parent,
        _ => Path::new("."),
    };
    let mut file =
        NamedTempFile::new_in(dir).map_err(DevCertError::io("create a temporary file in", dir))?;
    file.write_all(contents)
        .map_err(DevCertError::io("write", path))?;
    #[cfg(unix)]
    {
        use std::os::unix::fs::PermissionsExt;
        file.as_file()
            .set_permissions(std::fs::Permissions::from_mode(mode))
            .map_err(DevCertError::io("set permissions on", path))?;
    }
    #[cfg(not(unix))]
    let _ = mode;
    file.as_file()
        .sync_all()
        .map_err(DevCertError::io("write", path))?;
    file.persist(path)
        .map_err(|e| DevCertError::io("write", path)(e.error))?;
    Ok(())
}

/// Writes a PEM certificate and key.
///
/// When both paths are the same a single `0600` file holds the key then the
/// certificate; otherwise the certificate is `0644` and the key `0600`.
pub fn write_pem(
    cert: &Certificate,
    key: &KeyPair,
    cert_path: &Path,
    key_path: &Path,
) -> Result<WrittenFiles> {
    let cert_pem = cert.to_pem()?;
    let key_pem = key.to_pkcs8_pem()?;

    if cert_path == key_path {
        let combined = format!("{key_pem}{cert_pem}");
        write_file(key_path, combined.as_bytes(), KEY_MODE)?;
        return Ok(WrittenFiles::Combined(key_path.to_path_buf()));
    }

    write_file(key_path, key_pem.as_bytes(), KEY_MODE)?;
    if let Err(e) = write_file(cert_path, cert_pem.as_bytes(), CERT_MODE) {
        let _ = std::fs::remove_file(key_path);
        return Err(e);
    }
    Ok(WrittenFiles::Pem {
        cert: cert_path.to_path_buf(),
        key: key_path.to_path_buf(),
    })
}

/// Bundles the certificate, its key and the issuing CA certificate.
pub fn encode_pkcs12(cert: &Certificate, key: &KeyPair, ca_cert: &Certificate) -> Result<Vec<u8>> {
    let cert_der = cert.to_der()?;
    let key_der = key.to_pkcs8_der()?;
    let ca_der = ca_cert.to_der()?;

    let pfx = p12::PFX::new(
        &cert_der,
        key_der.as_bytes(),
        Some(&ca_der),
        PKCS12_PASSWORD,
        "",
    )
    .ok_or_else(|| DevCertError::EncodingError("failed to build the PKCS#12 bundle".to_string()))?;
    Ok(pfx.to_der())
}

/// Writes a PKCS#12 bundle, world readable.
pub fn write_pkcs12(
    cert: &Certificate,
    key: &KeyPair,
    ca_cert: &Certificate,
    p12_path: &Path,
) -> Result<WrittenFiles> {
    let pfx = encode_pkcs12(cert, key, ca_cert)?;
    write_file(p12_path, &pfx, CERT_MODE)?;
    Ok(WrittenFiles::Pkcs12(p12_path.to_path_buf()))
}

/// Writes only a certificate, for leaves whose key the caller already holds.
pub fn write_certificate(cert: &Certificate, cert_path: &Path) -> Result<WrittenFiles> {
    write_file(cert_path, cert.to_pem()?.as_bytes(), CERT_MODE)?;
    Ok(WrittenFiles::CertificateOnly(cert_path.to_path_buf()))
}

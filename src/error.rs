//! use devcert::error::DevCertError;

use std::path::{Path, PathBuf};

use thiserror::Error;

/// Represents errors that can occur while managing the local CA or issuing certificates.
///
/// Every variant is fatal to the operation that produced it. Non-fatal conditions,
/// such as a validity window reduced to fit the parent, are reported through
/// [`crate::report::PolicyWarning`] instead.
#[derive(Debug, Error)]
pub enum DevCertError {
    /// The CA storage location could not be resolved.
    #[error("Failed to find the CA location: {0}")]
    ConfigError(String),

    /// Reading or writing a file failed.
    #[error("Failed to {context} \"{}\": {source}", path.display())]
    IoError {
        context: &'static str,
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    /// Malformed PEM, DER, key or CSR input.
    #[error("Failed to decode data: {0}")]
    ParseError(String),

    /// Error during data encoding.
    #[error("Failed to encode data: {0}")]
    EncodingError(String),

    /// Key generation, randomness or signing failure.
    #[error("Cryptographic operation failed: {0}")]
    CryptoError(String),

    /// The CA is in keyless mode and cannot sign.
    #[error("Can't sign new certificates because the CA key (rootCA.key) is missing")]
    SigningKeyUnavailable,

    /// Input rejected by policy: bad hosts, bad CSR signature, expired root, validity limits.
    #[error("Invalid input: {0}")]
    ValidationError(String),
}

pub type Result<T> = std::result::Result<T, DevCertError>;

impl DevCertError {
    /// Returns a closure wrapping an `io::Error` with the operation and path that failed.
    pub(crate) fn io(
        context: &'static str,
        path: &Path,
    ) -> impl FnOnce(std::io::Error) -> DevCertError {
        let path = path.to_path_buf();
        move |source| DevCertError::IoError {
            context,
            path,
            source,
        }
    }
}

impl From<der::Error> for DevCertError {
    /// Converts a `der::Error` into a `DevCertError`.
    fn from(err: der::Error) -> Self {
        DevCertError::ParseError(err.to_string())
    }
}

impl From<pem::PemError> for DevCertError {
    fn from(err: pem::PemError) -> Self {
        DevCertError::ParseError(err.to_string())
    }
}

impl From<pkcs8::Error> for DevCertError {
    fn from(err: pkcs8::Error) -> Self {
        DevCertError::ParseError(err.to_string())
    }
}

impl From<pkcs8::spki::Error> for DevCertError {
    fn from(err: pkcs8::spki::Error) -> Self {
        DevCertError::ParseError(err.to_string())
    }
}

impl From<rsa::Error> for DevCertError {
    fn from(err: rsa::Error) -> Self {
        DevCertError::CryptoError(err.to_string())
    }
}

impl From<ecdsa::signature::Error> for DevCertError {
    fn from(err: ecdsa::signature::Error) -> Self {
        DevCertError::CryptoError(err.to_string())
    }
}

use std::fmt;

use rand::TryRngCore;
use rand::rngs::OsRng;

use crate::error::{DevCertError, Result};

/// A certificate serial number drawn uniformly from `[0, 2^128)`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct SerialNumber(pub u128);

impl SerialNumber {
    /// Draws a fresh serial from the operating system CSPRNG.
    pub fn random() -> Result<Self> {
        let mut bytes = [0u8; 16];
        OsRng
            .try_fill_bytes(&mut bytes)
            .map_err(|e| DevCertError::CryptoError(format!("failed to generate serial number: {e}")))?;
        Ok(SerialNumber(u128::from_be_bytes(bytes)))
    }

    /// Converts to the DER serial number type, dropping leading zero octets.
    pub fn to_x509(&self) -> Result<x509_cert::serial_number::SerialNumber> {
        Ok(x509_cert::serial_number::SerialNumber::new(
            &self.0.to_be_bytes(),
        )?)
    }

    /// Reads a serial back from its DER form.
    pub fn from_x509(serial: &x509_cert::serial_number::SerialNumber) -> Result<Self> {
        let bytes = serial.as_bytes();
        let first = bytes.iter().position(|b| *b != 0).unwrap_or(bytes.len());
        let significant = &bytes[first..];
        if significant.len() > 16 {
            return Err(DevCertError::ParseError(format!(
                "serial number of {} octets does not fit 128 bits",
                significant.len()
            )));
        }
        let mut padded = [0u8; 16];
        padded[16 - significant.len()..].copy_from_slice(significant);
        Ok(SerialNumber(u128::from_be_bytes(padded)))
    }
}

impl fmt::Display for SerialNumber {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

use crate::error::{DevCertError, Result};

pub const CERTIFICATE_LABEL: &str = "CERTIFICATE";
pub const PRIVATE_KEY_LABEL: &str = "PRIVATE KEY";
/// Both labels found in the wild for PKCS#10 requests.
pub const CSR_LABELS: [&str; 2] = ["CERTIFICATE REQUEST", "NEW CERTIFICATE REQUEST"];

/// Convert DER‑encoded data into a PEM‑encoded string with the provided label.
pub fn der_to_pem(der: &[u8], label: &str) -> String {
    let pem = pem::Pem::new(label, der);
    pem::encode_config(
        &pem,
        pem::EncodeConfig::new().set_line_ending(pem::LineEnding::LF),
    )
}

/// Convert the first block of a PEM‑encoded string to DER‑encoded bytes.
///
/// The block label must be one of `expected`.
pub fn pem_to_der(pem_str: &str, expected: &[&str]) -> Result<Vec<u8>> {
    let pem = pem::parse(pem_str)?;
    if !expected.contains(&pem.tag()) {
        return Err(DevCertError::ParseError(format!(
            "expected {}, got {}",
            expected.join(" or "),
            pem.tag()
        )));
    }
    Ok(pem.contents().to_vec())
}

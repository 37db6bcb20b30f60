use std::fmt::Display;
use std::path::{Path, PathBuf};

use bon::Builder;

use crate::error::{DevCertError, Result};

/// Where the artifacts of one leaf issuance go.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct OutputPaths {
    pub cert: PathBuf,
    pub key: PathBuf,
    pub p12: PathBuf,
}

/// Caller supplied paths; each one replaces the derived default on its own.
#[derive(Debug, Clone, Default, Builder, PartialEq, Eq)]
pub struct PathOverrides {
    #[builder(into)]
    pub cert_file: Option<PathBuf>,
    #[builder(into)]
    pub key_file: Option<PathBuf>,
    #[builder(into)]
    pub p12_file: Option<PathBuf>,
}

/// Derives the file base name from the first host.
///
/// `:` becomes `_`, `*` becomes `_wildcard`, path separators become `_`. `+N` is
/// appended when N more hosts follow and `-client` for client certificates.
pub fn default_base_name<H: Display>(hosts: &[H], client: bool) -> Result<String> {
    let first = hosts.first().ok_or_else(|| {
        DevCertError::ValidationError("no host names to derive a file name from".to_string())
    })?;
    let mut name = sanitize(&first.to_string()).replace('*', "_wildcard");
    if hosts.len() > 1 {
        name.push_str(&format!("+{}", hosts.len() - 1));
    }
    if client {
        name.push_str("-client");
    }
    Ok(name)
}

fn sanitize(name: &str) -> String {
    name.replace([':', '/', '\\'], "_")
}

/// Resolves the certificate, key and PKCS#12 paths for a leaf.
pub fn output_paths<H: Display>(
    output_dir: &Path,
    hosts: &[H],
    client: bool,
    overrides: &PathOverrides,
) -> Result<OutputPaths> {
    let base = match overrides {
        PathOverrides {
            cert_file: Some(_),
            key_file: Some(_),
            p12_file: Some(_),
        } => String::new(),
        _ => default_base_name(hosts, client)?,
    };
    let pick = |explicit: &Option<PathBuf>, extension: &str| {
        explicit
            .clone()
            .unwrap_or_else(|| output_dir.join(format!("{base}.{extension}")))
    };
    Ok(OutputPaths {
        cert: pick(&overrides.cert_file, "pem"),
        key: pick(&overrides.key_file, "key"),
        p12: pick(&overrides.p12_file, "p12"),
    })
}

/// Certificate and key paths for an intermediate, named after its common name.
pub fn intermediate_paths(output_dir: &Path, common_name: &str) -> (PathBuf, PathBuf) {
    let base = sanitize(common_name);
    (
        output_dir.join(format!("{base}.pem")),
        output_dir.join(format!("{base}.key")),
    )
}

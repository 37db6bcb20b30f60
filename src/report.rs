use std::fmt;

use time::OffsetDateTime;

use crate::cert::Certificate;
use crate::host::HostHint;
use crate::output::WrittenFiles;

/// A non-fatal condition met while issuing.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum PolicyWarning {
    /// The requested validity ran past the issuer's and was cut back to it.
    ReducedValidity { not_after: OffsetDateTime },
}

impl fmt::Display for PolicyWarning {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            PolicyWarning::ReducedValidity { not_after } => write!(
                f,
                "the planned validity is longer than the issuer's, reduced to {}",
                not_after.date()
            ),
        }
    }
}

/// What one issuance produced.
#[derive(Debug, Clone)]
pub struct IssuanceReport {
    pub certificate: Certificate,
    /// Names the certificate is valid for, as displayed to the user.
    pub hosts: Vec<String>,
    pub files: WrittenFiles,
    pub warnings: Vec<PolicyWarning>,
    pub hints: Vec<HostHint>,
}

impl IssuanceReport {
    pub fn not_after(&self) -> OffsetDateTime {
        self.certificate.not_after()
    }

    pub fn reduced_validity(&self) -> bool {
        self.warnings
            .iter()
            .any(|w| matches!(w, PolicyWarning::ReducedValidity { .. }))
    }
}

/// A flag that goes from unset to set exactly once.
#[derive(Debug, Default)]
pub struct WarningLatch {
    fired: bool,
}

impl WarningLatch {
    pub fn new() -> Self {
        Self::default()
    }

    /// Returns `true` the first time it is called and `false` afterwards.
    pub fn fire(&mut self) -> bool {
        !std::mem::replace(&mut self.fired, true)
    }

    pub fn has_fired(&self) -> bool {
        self.fired
    }
}

//! Facts about the machine and user that feed CA defaults.

use std::path::PathBuf;

use bon::Builder;

/// Environment variable that overrides the CA directory.
pub const CAROOT_ENV: &str = "CAROOT";

/// Name used when the operating system does not report one.
const FALLBACK_NAME: &str = "devcert";

/// Source of the user's display name and the CA storage directory.
pub trait SystemIdentity {
    /// The user's full name, if known.
    fn full_name(&self) -> Option<String>;

    /// Directory holding `rootCA.pem` and `rootCA.key`, if one can be determined.
    fn ca_root(&self) -> Option<PathBuf>;
}

/// Reads identity from the running system.
///
/// The full name is the first GECOS field of the current user (falling back to the
/// login name). The CA root is `$CAROOT` when set, else `devcert` inside the
/// platform's local data directory.
#[derive(Debug, Clone, Copy, Default)]
pub struct OsIdentity;

impl SystemIdentity for OsIdentity {
    #[cfg(unix)]
    fn full_name(&self) -> Option<String> {
        let user = nix::unistd::User::from_uid(nix::unistd::Uid::current())
            .ok()
            .flatten()?;
        let gecos = user.gecos.to_string_lossy();
        let full_name = gecos.split(',').next().unwrap_or_default().trim();
        if full_name.is_empty() {
            Some(user.name).filter(|name| !name.is_empty())
        } else {
            Some(full_name.to_string())
        }
    }

    #[cfg(not(unix))]
    fn full_name(&self) -> Option<String> {
        std::env::var("USERNAME").ok().filter(|name| !name.is_empty())
    }

    fn ca_root(&self) -> Option<PathBuf> {
        if let Some(dir) = std::env::var_os(CAROOT_ENV).filter(|dir| !dir.is_empty()) {
            return Some(PathBuf::from(dir));
        }
        dirs::data_local_dir().map(|dir| dir.join("devcert"))
    }
}

/// A fixed identity, for tests and embedding.
#[derive(Debug, Clone, Default, Builder)]
pub struct FixedIdentity {
    #[builder(into)]
    pub full_name: Option<String>,
    #[builder(into)]
    pub ca_root: Option<PathBuf>,
}

impl SystemIdentity for FixedIdentity {
    fn full_name(&self) -> Option<String> {
        self.full_name.clone()
    }

    fn ca_root(&self) -> Option<PathBuf> {
        self.ca_root.clone()
    }
}

/// The full name, or a generic name when the system has none.
pub fn display_name(identity: &dyn SystemIdentity) -> String {
    identity
        .full_name()
        .unwrap_or_else(|| FALLBACK_NAME.to_string())
}

/// `<full name> CA`
pub fn default_organization(identity: &dyn SystemIdentity) -> String {
    format!("{} CA", display_name(identity))
}

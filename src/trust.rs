//! Interface to trust stores (system, NSS, Java). Installers live outside this crate.

use crate::error::Result;
use crate::report::WarningLatch;
use crate::store::CaMaterial;

/// Comma separated list of store names to operate on; unset means all.
pub const TRUST_STORES_ENV: &str = "TRUST_STORES";

/// A place the root certificate can be installed into.
pub trait TrustStore {
    /// Short name matched against the `TRUST_STORES` selection, e.g. `system`, `nss`, `java`.
    fn name(&self) -> &str;

    /// Whether `ca` is already trusted by this store.
    fn check(&self, ca: &CaMaterial) -> bool;

    fn install(&self, ca: &CaMaterial, latch: &mut WarningLatch) -> Result<()>;

    fn uninstall(&self, ca: &CaMaterial, latch: &mut WarningLatch) -> Result<()>;
}

/// Whether `name` is selected. `None` or an empty selection enables every store.
pub fn store_enabled(selection: Option<&str>, name: &str) -> bool {
    match selection {
        None | Some("") => true,
        Some(stores) => stores.split(',').any(|store| store == name),
    }
}

/// Reads the selection from the environment.
pub fn selection_from_env() -> Option<String> {
    std::env::var(TRUST_STORES_ENV).ok()
}

/// Warns, once per latch, that privileged commands are unavailable.
pub fn warn_missing_privilege_helper(latch: &mut WarningLatch, helper: &str) {
    if latch.fire() {
        log::warn!(
            "\"{helper}\" is not available and the process is not privileged; the operation might fail"
        );
    }
}

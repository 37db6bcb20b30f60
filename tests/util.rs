#![allow(dead_code)]

use std::path::Path;

use devcert::ca::LocalCa;
use devcert::cert::Certificate;
use devcert::config::RootOptions;
use devcert::identity::FixedIdentity;
use devcert::store::CaStore;
use tempfile::TempDir;

pub fn init_logging() {
    let _ = env_logger::builder().is_test(true).try_init();
}

pub fn identity(ca_root: &Path) -> FixedIdentity {
    FixedIdentity::builder()
        .full_name("Jane Doe")
        .ca_root(ca_root)
        .build()
}

/// A fresh CA store and output directory, both removed when dropped.
pub struct TestCa {
    pub ca_dir: TempDir,
    pub out_dir: TempDir,
    pub identity: FixedIdentity,
    pub store: CaStore,
}

impl TestCa {
    pub fn new() -> Self {
        init_logging();
        let ca_dir = tempfile::tempdir().unwrap();
        let out_dir = tempfile::tempdir().unwrap();
        let identity = identity(ca_dir.path());
        let store = CaStore::open(&identity).unwrap();
        Self {
            ca_dir,
            out_dir,
            identity,
            store,
        }
    }

    pub fn local_ca(&self, options: &RootOptions) -> LocalCa {
        LocalCa::new(&self.store, options, &self.identity)
            .unwrap()
            .with_output_dir(self.out_dir.path())
    }

    pub fn root(&self) -> Certificate {
        read_cert(&self.store.cert_path())
    }
}

pub fn read_cert(path: &Path) -> Certificate {
    Certificate::from_pem(&std::fs::read_to_string(path).unwrap()).unwrap()
}

#[cfg(unix)]
pub fn mode(path: &Path) -> u32 {
    use std::os::unix::fs::PermissionsExt;
    std::fs::metadata(path).unwrap().permissions().mode() & 0o777
}

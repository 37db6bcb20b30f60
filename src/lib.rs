//! # devcert - Locally-Trusted Development Certificates in Pure Rust
//!
//! devcert runs a small certificate authority for development machines, built entirely
//! with rustcrypto libraries. It creates and rotates a root CA, optionally one
//! intermediate, and issues leaf certificates for host names, IP addresses, email
//! addresses and URIs, or for an existing certificate signing request.
//!
//! ## Supported Key Types
//!
//! - **ECDSA** (default): P-384 for CA keys, P-256 for leaf keys
//! - **RSA**: 4096-bit CA keys, 2048-bit leaf keys
//! - **Ed25519**: accepted in signing requests
//!
//! ## Output Formats
//!
//! - **PEM**: certificate and PKCS#8 key, in two files or one combined file
//! - **PKCS#12**: leaf, key and CA certificate in one bundle, password `changeit`
//!
//! ## Certificate Classes
//!
//! - **Root**: self-signed, path length 2, valid ten years by default
//! - **Intermediate**: signed by the root, path length 1, inherits the root's organization
//! - **Leaf from hosts**: SANs classified from the host list, EKUs derived from them
//! - **Leaf from CSR**: subject and extensions from a verified request, usages set by the CA
//!
//! Issued certificates never outlive their issuer; a validity that would is cut back
//! and reported as a [`report::PolicyWarning`].
//!
//! ## Quick Start
//!
//! ```rust,no_run
//! use devcert::{
//!     ca::LocalCa,
//!     config::{LeafOptions, RootOptions},
//!     identity::OsIdentity,
//!     store::CaStore,
//! };
//!
//! # fn main() -> Result<(), devcert::error::DevCertError> {
//! let store = CaStore::open(&OsIdentity)?;
//! let ca = LocalCa::new(&store, &RootOptions::default(), &OsIdentity)?;
//!
//! let report = ca.issue_leaf(&["example.com", "localhost", "127.0.0.1"], &LeafOptions::default())?;
//! println!("valid until {}", report.not_after());
//! # Ok(())
//! # }
//! ```
//!
//! ### Client Certificates in a PKCS#12 Bundle
//!
//! ```rust,no_run
//! use devcert::{
//!     ca::LocalCa,
//!     config::{LeafOptions, RootOptions},
//!     identity::OsIdentity,
//!     output::OutputFormat,
//!     store::CaStore,
//! };
//!
//! # fn main() -> Result<(), devcert::error::DevCertError> {
//! let store = CaStore::open(&OsIdentity)?;
//! let ca = LocalCa::new(&store, &RootOptions::default(), &OsIdentity)?.with_output_dir("certs");
//!
//! let options = LeafOptions::builder()
//!     .client(true)
//!     .format(OutputFormat::Pkcs12)
//!     .build();
//! ca.issue_leaf(&["me@example.com"], &options)?;
//! # Ok(())
//! # }
//! ```
//!
//! ## Error Handling
//!
//! Every failure aborts the operation with a [`error::DevCertError`]:
//!
//! ```rust
//! use devcert::{error::DevCertError, host::HostEntry};
//!
//! match HostEntry::classify("not a host!") {
//!     Ok(entry) => println!("classified as {entry:?}"),
//!     Err(DevCertError::ValidationError(msg)) => println!("rejected: {msg}"),
//!     Err(e) => println!("other error: {e}"),
//! }
//! ```
//!
//! ## Module Organization
//!
//! - [`ca`]: The issuance pipeline for leaves, intermediates and CSRs
//! - [`store`]: Root CA persistence, rotation and keyless mode
//! - [`key`]: Key generation, PKCS#8 import/export and signatures
//! - [`cert`]: Certificate wrapper, names and X.509 extensions
//! - [`template`]: Templates for the four certificate classes
//! - [`issuer`]: Certificate signing
//! - [`lifetime`]: Validity windows and clamping
//! - [`host`]: Host string classification
//! - [`output`]: PEM and PKCS#12 files
//! - [`error`]: Error types

pub mod ca;
pub mod cert;
pub mod config;
pub mod csr;
pub mod error;
pub mod host;
pub mod identity;
pub mod issuer;
pub mod key;
pub mod lifetime;
pub mod naming;
pub mod output;
pub mod pem_utils;
pub mod report;
pub mod serial;
pub mod store;
pub mod tbs_certificate;
pub mod template;
pub mod trust;

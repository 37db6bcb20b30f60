use const_oid::db::{rfc5912, rfc8410};
use der::{Decode, Encode};
use ecdsa::signature::hazmat::PrehashVerifier;
use ecdsa::signature::{SignatureEncoding, Signer, Verifier};
use ed25519_dalek::VerifyingKey as Ed25519VerifyingKey;
use p256::ecdsa::{SigningKey as P256SigningKey, VerifyingKey as P256VerifyingKey};
use p384::ecdsa::{SigningKey as P384SigningKey, VerifyingKey as P384VerifyingKey};
use pkcs8::{DecodePrivateKey, DecodePublicKey, EncodePrivateKey, EncodePublicKey};
use rsa::{RsaPrivateKey, RsaPublicKey, pkcs1v15};
use sha2::{Digest, Sha256, Sha384, Sha512};
use x509_cert::spki::SubjectPublicKeyInfoOwned;

use crate::cert::SignatureAlgorithm;
use crate::error::{DevCertError, Result};

/// Key algorithm family requested for newly generated keys.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub enum KeyAlgorithm {
    #[default]
    Ecdsa,
    Rsa,
}

/// Which end of the hierarchy a key is generated for.
///
/// CA keys live far longer than leaf keys, so they get the larger parameter set.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum KeyTier {
    /// Root and intermediate keys: RSA-4096 or P-384.
    Ca,
    /// End-entity keys: RSA-2048 or P-256.
    Leaf,
}

/// Private keys the CA can generate, persist and sign with.
#[derive(Debug, Clone)]
pub enum KeyPair {
    Rsa(Box<RsaPrivateKey>),
    EcdsaP256(P256SigningKey),
    EcdsaP384(P384SigningKey),
}

impl KeyPair {
    /// Generate a key pair following the tier policy.
    pub fn generate(tier: KeyTier, algorithm: KeyAlgorithm) -> Result<Self> {
        match (tier, algorithm) {
            (KeyTier::Ca, KeyAlgorithm::Rsa) => Self::generate_rsa(4096),
            (KeyTier::Ca, KeyAlgorithm::Ecdsa) => Ok(Self::generate_ecdsa_p384()),
            (KeyTier::Leaf, KeyAlgorithm::Rsa) => Self::generate_rsa(2048),
            (KeyTier::Leaf, KeyAlgorithm::Ecdsa) => Ok(Self::generate_ecdsa_p256()),
        }
    }

    /// Generate an RSA key pair with the specified number of bits.
    pub fn generate_rsa(bits: usize) -> Result<Self> {
        let mut rng = rand_core::OsRng;
        let private = RsaPrivateKey::new(&mut rng, bits)?;
        Ok(KeyPair::Rsa(Box::new(private)))
    }

    /// Generate an ECDSA P-256 key pair.
    pub fn generate_ecdsa_p256() -> Self {
        let mut rng = rand_core::OsRng;
        KeyPair::EcdsaP256(P256SigningKey::random(&mut rng))
    }

    /// Generate an ECDSA P-384 key pair.
    pub fn generate_ecdsa_p384() -> Self {
        let mut rng = rand_core::OsRng;
        KeyPair::EcdsaP384(P384SigningKey::random(&mut rng))
    }

    pub fn algorithm(&self) -> KeyAlgorithm {
        match self {
            KeyPair::Rsa(_) => KeyAlgorithm::Rsa,
            KeyPair::EcdsaP256(_) | KeyPair::EcdsaP384(_) => KeyAlgorithm::Ecdsa,
        }
    }

    /// Human readable key description, used in log output.
    pub fn describe(&self) -> String {
        match self {
            KeyPair::Rsa(private) => {
                use rsa::traits::PublicKeyParts;
                format!("RSA-{}", private.n().bits())
            }
            KeyPair::EcdsaP256(_) => "ECDSA P-256".to_string(),
            KeyPair::EcdsaP384(_) => "ECDSA P-384".to_string(),
        }
    }

    /// The signature algorithm this key produces.
    pub fn signature_algorithm(&self) -> SignatureAlgorithm {
        match self {
            KeyPair::Rsa(_) => SignatureAlgorithm::Sha256WithRSA,
            KeyPair::EcdsaP256(_) => SignatureAlgorithm::Sha256WithECDSA,
            KeyPair::EcdsaP384(_) => SignatureAlgorithm::Sha384WithECDSA,
        }
    }

    /// Returns the SubjectPublicKeyInfo for the public half of the key.
    pub fn public_key_info(&self) -> Result<SubjectPublicKeyInfoOwned> {
        let document = match self {
            KeyPair::Rsa(private) => private.to_public_key().to_public_key_der()?,
            KeyPair::EcdsaP256(signing_key) => signing_key.verifying_key().to_public_key_der()?,
            KeyPair::EcdsaP384(signing_key) => signing_key.verifying_key().to_public_key_der()?,
        };
        Ok(SubjectPublicKeyInfoOwned::from_der(document.as_bytes())?)
    }

    /// Signs `data` and returns the signature in its X.509 encoding
    /// (PKCS#1 v1.5 for RSA, DER `Ecdsa-Sig-Value` for ECDSA).
    pub fn sign_data(&self, data: &[u8]) -> Result<Vec<u8>> {
        match self {
            KeyPair::Rsa(private) => {
                let signing_key = pkcs1v15::SigningKey::<Sha256>::new((**private).clone());
                let signature = signing_key.try_sign(data)?;
                Ok(signature.to_vec())
            }
            KeyPair::EcdsaP256(signing_key) => {
                let signature: p256::ecdsa::Signature = signing_key.try_sign(data)?;
                Ok(signature.to_der().as_bytes().to_vec())
            }
            KeyPair::EcdsaP384(signing_key) => {
                let signature: p384::ecdsa::Signature = signing_key.try_sign(data)?;
                Ok(signature.to_der().as_bytes().to_vec())
            }
        }
    }

    /// Encodes the private key as PKCS#8 DER.
    pub fn to_pkcs8_der(&self) -> Result<pkcs8::SecretDocument> {
        let document = match self {
            KeyPair::Rsa(private) => private.to_pkcs8_der(),
            KeyPair::EcdsaP256(signing_key) => signing_key.to_pkcs8_der(),
            KeyPair::EcdsaP384(signing_key) => signing_key.to_pkcs8_der(),
        };
        document.map_err(|e| DevCertError::EncodingError(e.to_string()))
    }

    /// Encodes the private key as a `PRIVATE KEY` PEM block.
    pub fn to_pkcs8_pem(&self) -> Result<String> {
        let der = self.to_pkcs8_der()?;
        Ok(crate::pem_utils::der_to_pem(
            der.as_bytes(),
            crate::pem_utils::PRIVATE_KEY_LABEL,
        ))
    }

    /// Imports an RSA, P-256 or P-384 private key from PKCS#8 DER.
    pub fn from_pkcs8_der(der: &[u8]) -> Result<Self> {
        let info = pkcs8::PrivateKeyInfo::try_from(der)?;
        match info.algorithm.oid {
            rfc5912::RSA_ENCRYPTION => {
                let private = RsaPrivateKey::from_pkcs8_der(der)?;
                Ok(KeyPair::Rsa(Box::new(private)))
            }
            rfc5912::ID_EC_PUBLIC_KEY => match info.algorithm.parameters_oid()? {
                rfc5912::SECP_256_R_1 => Ok(KeyPair::EcdsaP256(P256SigningKey::from_pkcs8_der(
                    der,
                )?)),
                rfc5912::SECP_384_R_1 => Ok(KeyPair::EcdsaP384(P384SigningKey::from_pkcs8_der(
                    der,
                )?)),
                curve => Err(DevCertError::ParseError(format!(
                    "unsupported elliptic curve {curve}"
                ))),
            },
            other => Err(DevCertError::ParseError(format!(
                "unsupported private key algorithm {other}"
            ))),
        }
    }

    /// Imports a private key from a `PRIVATE KEY` PEM block.
    pub fn from_pkcs8_pem(pem_str: &str) -> Result<Self> {
        let der = crate::pem_utils::pem_to_der(pem_str, &[crate::pem_utils::PRIVATE_KEY_LABEL])?;
        Self::from_pkcs8_der(&der)
    }
}

/// Public keys that may appear in a certificate signing request.
#[derive(Debug, Clone)]
pub enum PublicKey {
    Rsa(RsaPublicKey),
    EcdsaP256(P256VerifyingKey),
    EcdsaP384(P384VerifyingKey),
    Ed25519(Ed25519VerifyingKey),
}

impl PublicKey {
    /// Returns the public half of a key pair.
    pub fn from_key_pair(key_pair: &KeyPair) -> Self {
        match key_pair {
            KeyPair::Rsa(private) => PublicKey::Rsa(private.to_public_key()),
            KeyPair::EcdsaP256(signing_key) => PublicKey::EcdsaP256(*signing_key.verifying_key()),
            KeyPair::EcdsaP384(signing_key) => PublicKey::EcdsaP384(*signing_key.verifying_key()),
        }
    }

    /// Decodes a SubjectPublicKeyInfo.
    pub fn from_x509spki(spki: &SubjectPublicKeyInfoOwned) -> Result<Self> {
        let der = spki.to_der()?;
        match spki.algorithm.oid {
            rfc5912::RSA_ENCRYPTION => Ok(PublicKey::Rsa(RsaPublicKey::from_public_key_der(&der)?)),
            rfc5912::ID_EC_PUBLIC_KEY => {
                if let Ok(key) = P256VerifyingKey::from_public_key_der(&der) {
                    return Ok(PublicKey::EcdsaP256(key));
                }
                Ok(PublicKey::EcdsaP384(P384VerifyingKey::from_public_key_der(
                    &der,
                )?))
            }
            rfc8410::ID_ED_25519 => Ok(PublicKey::Ed25519(
                Ed25519VerifyingKey::from_public_key_der(&der)?,
            )),
            other => Err(DevCertError::ParseError(format!(
                "unsupported public key algorithm {other}"
            ))),
        }
    }

    /// Verifies `signature` over `message`.
    ///
    /// A signature that does not verify, or an algorithm that does not match the
    /// key type, is a `ValidationError`.
    pub fn verify(
        &self,
        algorithm: &SignatureAlgorithm,
        message: &[u8],
        signature: &[u8],
    ) -> Result<()> {
        let mismatch = || {
            DevCertError::ValidationError(format!(
                "signature algorithm {algorithm:?} does not match the public key"
            ))
        };
        let invalid = |e: ecdsa::signature::Error| {
            DevCertError::ValidationError(format!("invalid signature: {e}"))
        };

        match self {
            PublicKey::Rsa(public) => {
                let signature = pkcs1v15::Signature::try_from(signature).map_err(invalid)?;
                let verified = match algorithm {
                    SignatureAlgorithm::Sha256WithRSA => {
                        pkcs1v15::VerifyingKey::<Sha256>::new(public.clone())
                            .verify(message, &signature)
                    }
                    SignatureAlgorithm::Sha384WithRSA => {
                        pkcs1v15::VerifyingKey::<Sha384>::new(public.clone())
                            .verify(message, &signature)
                    }
                    SignatureAlgorithm::Sha512WithRSA => {
                        pkcs1v15::VerifyingKey::<Sha512>::new(public.clone())
                            .verify(message, &signature)
                    }
                    _ => return Err(mismatch()),
                };
                verified.map_err(invalid)
            }
            PublicKey::EcdsaP256(verifying_key) => {
                let digest = ecdsa_prehash(algorithm, message).ok_or_else(mismatch)?;
                let signature = p256::ecdsa::Signature::from_der(signature).map_err(invalid)?;
                verifying_key
                    .verify_prehash(&digest, &signature)
                    .map_err(invalid)
            }
            PublicKey::EcdsaP384(verifying_key) => {
                let digest = ecdsa_prehash(algorithm, message).ok_or_else(mismatch)?;
                let signature = p384::ecdsa::Signature::from_der(signature).map_err(invalid)?;
                verifying_key
                    .verify_prehash(&digest, &signature)
                    .map_err(invalid)
            }
            PublicKey::Ed25519(verifying_key) => {
                if *algorithm != SignatureAlgorithm::Ed25519 {
                    return Err(mismatch());
                }
                let signature = ed25519_dalek::Signature::from_slice(signature).map_err(invalid)?;
                verifying_key.verify(message, &signature).map_err(invalid)
            }
        }
    }
}

fn ecdsa_prehash(algorithm: &SignatureAlgorithm, message: &[u8]) -> Option<Vec<u8>> {
    match algorithm {
        SignatureAlgorithm::Sha256WithECDSA => Some(Sha256::digest(message).to_vec()),
        SignatureAlgorithm::Sha384WithECDSA => Some(Sha384::digest(message).to_vec()),
        SignatureAlgorithm::Sha512WithECDSA => Some(Sha512::digest(message).to_vec()),
        _ => None,
    }
}

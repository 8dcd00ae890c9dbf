use std::convert::TryFrom;

use ed25519_dalek::{Keypair, Signer, Verifier};

use proto::crypto::{Address, PrivateKey, PublicKey, Signature, PUBLIC_KEY_LEN, SIGNATURE_LEN};

use crate::hash::hash_buffer;
use crate::CryptoError;

/// A generic interface for signing messages.
pub trait Identity {
    /// Create a signature for a given message using private key.
    /// The resulting signature also carries our public key.
    fn sign(&self, message: &[u8]) -> Signature;
    /// Get our public identity
    fn get_public_key(&self) -> PublicKey;
    /// Get our ledger address
    fn get_address(&self) -> Address {
        public_key_to_address(&self.get_public_key())
    }
}

pub struct SoftwareEd25519Identity {
    key_pair: Keypair,
}

impl SoftwareEd25519Identity {
    pub fn from_private_key(private_key: &PrivateKey) -> Result<Self, CryptoError> {
        let secret = ed25519_dalek::SecretKey::from_bytes(private_key)?;
        let public = ed25519_dalek::PublicKey::from(&secret);
        Ok(SoftwareEd25519Identity {
            key_pair: Keypair { secret, public },
        })
    }
}

impl Identity for SoftwareEd25519Identity {
    fn sign(&self, message: &[u8]) -> Signature {
        let mut sig_array = [0; SIGNATURE_LEN];
        sig_array[..PUBLIC_KEY_LEN].copy_from_slice(self.key_pair.public.as_bytes());
        sig_array[PUBLIC_KEY_LEN..].copy_from_slice(&self.key_pair.sign(message).to_bytes());
        Signature::from(&sig_array)
    }

    fn get_public_key(&self) -> PublicKey {
        PublicKey::from(self.key_pair.public.as_bytes())
    }
}

/// Derive the ledger address of a public key.
/// The address is the last `ADDRESS_LEN` bytes of the public key's hash.
pub fn public_key_to_address(public_key: &PublicKey) -> Address {
    let hash = hash_buffer(public_key);
    let offset = hash.len() - Address::len();
    // Lengths are constant, this conversion can not fail:
    Address::try_from(&hash[offset..]).unwrap_or_default()
}

/// Split a signature into the signer's public key and the raw ed25519 signature.
fn split_signature(signature: &Signature) -> (PublicKey, &[u8]) {
    let public_key = PublicKey::try_from(&signature[..PUBLIC_KEY_LEN]).unwrap_or_default();
    (public_key, &signature[PUBLIC_KEY_LEN..])
}

/// Verify a signature of a given message, made by `public_key`.
pub fn verify_signature(message: &[u8], public_key: &PublicKey, signature: &Signature) -> bool {
    match recover_public_key(message, signature) {
        Some(signer_public_key) => &signer_public_key == public_key,
        None => false,
    }
}

/// Recover the public key that signed `message`.
/// Returns `None` if the signature is invalid.
pub fn recover_public_key(message: &[u8], signature: &Signature) -> Option<PublicKey> {
    let (public_key, raw_signature) = split_signature(signature);
    let dalek_public_key = ed25519_dalek::PublicKey::from_bytes(&public_key).ok()?;
    let dalek_signature = ed25519_dalek::Signature::try_from(raw_signature).ok()?;
    dalek_public_key
        .verify(message, &dalek_signature)
        .ok()
        .map(|_| public_key)
}

/// Recover the address that signed `message`.
/// Returns `None` if the signature is invalid.
pub fn recover_address(message: &[u8], signature: &Signature) -> Option<Address> {
    recover_public_key(message, signature).map(|public_key| public_key_to_address(&public_key))
}

//! # Recoverable ECDSA (secp256k1)
//!
//! Provider authentication and node signing. Signatures are the 65-byte
//! Ethereum wire layout `r ∥ s ∥ v`; the signer is identified by recovering
//! the public key from the digest and taking the last 20 bytes of its
//! keccak256 hash.
//!
//! There is no time-domain binding here: replay protection comes from the
//! provider nonce committed inside every signed digest.

use k256::ecdsa::{RecoveryId, Signature, SigningKey, VerifyingKey};
use sha3::{Digest, Keccak256};
use shared_types::{Address, Hash, RecoverableSignature};

use crate::errors::CryptoError;

/// Keccak256 hash function (address derivation only; content addressing is
/// SHA-256 throughout).
pub fn keccak256(data: &[u8]) -> Hash {
    let mut hasher = Keccak256::new();
    hasher.update(data);
    hasher.finalize().into()
}

/// Derive the Ethereum-style address of a verifying key: last 20 bytes of
/// keccak256 over the uncompressed point without its 0x04 prefix.
pub fn address_from_pubkey(public_key: &VerifyingKey) -> Address {
    let encoded = public_key.to_encoded_point(false);
    let digest = keccak256(&encoded.as_bytes()[1..]);
    let mut address = [0u8; 20];
    address.copy_from_slice(&digest[12..]);
    Address(address)
}

/// Map a wire recovery byte onto a `RecoveryId`. Valid values: 0, 1, 27, 28.
fn parse_recovery_id(v: u8) -> Result<RecoveryId, CryptoError> {
    let id = match v {
        0 | 27 => 0,
        1 | 28 => 1,
        _ => return Err(CryptoError::InvalidRecoveryId(v)),
    };
    RecoveryId::try_from(id).map_err(|_| CryptoError::InvalidRecoveryId(v))
}

/// Recover the signer's address from a 65-byte signature over `digest`.
pub fn recover_address(
    digest: &Hash,
    signature: &RecoverableSignature,
) -> Result<Address, CryptoError> {
    let recovery_id = parse_recovery_id(signature[64])?;
    let sig =
        Signature::from_slice(&signature[..64]).map_err(|_| CryptoError::InvalidSignature)?;

    let recovered = VerifyingKey::recover_from_prehash(digest, &sig, recovery_id)
        .map_err(|_| CryptoError::RecoveryFailed)?;

    Ok(address_from_pubkey(&recovered))
}

/// Recover the signer and compare against the address the caller claims.
///
/// Returns `Ok(())` only when the signature is well-formed AND the recovered
/// address matches; every other outcome is an authentication failure.
pub fn verify_signer(
    digest: &Hash,
    signature: &RecoverableSignature,
    expected: &Address,
) -> Result<(), CryptoError> {
    let recovered = recover_address(digest, signature)?;
    if recovered != *expected {
        return Err(CryptoError::RecoveryFailed);
    }
    Ok(())
}

/// Sign a 32-byte digest, producing the 65-byte wire layout with
/// `v ∈ {27, 28}`. Low-S normalization is applied by the signer.
pub fn sign_digest(digest: &Hash, key: &SigningKey) -> Result<RecoverableSignature, CryptoError> {
    let (sig, recovery_id) = key
        .sign_prehash_recoverable(digest)
        .map_err(|_| CryptoError::SigningFailed)?;

    let mut out = [0u8; 65];
    out[..64].copy_from_slice(&sig.to_bytes());
    out[64] = recovery_id.to_byte() + 27;
    Ok(out)
}

/// Parse a signing key from its raw 32-byte scalar.
pub fn signing_key_from_bytes(bytes: &[u8]) -> Result<SigningKey, CryptoError> {
    SigningKey::from_slice(bytes).map_err(|_| CryptoError::InvalidSigningKey)
}

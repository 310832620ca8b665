//! Cryptographic Operations Module
//!
//! This module manages the escrow operator's secp256k1 key: loading it from
//! configuration, signing transaction hashes for chain submission, and
//! deriving the operator's Ethereum address.
//!
//! ## Security Requirements
//!
//! **CRITICAL**: The operator key signs every state-changing transaction the
//! engine submits. It must never be exposed or logged.

use anyhow::Result;
use k256::ecdsa::{
    Signature as EcdsaSignature, SigningKey as EcdsaSigningKey, VerifyingKey as EcdsaVerifyingKey,
};
use sha3::{Digest, Keccak256};
use tracing::info;

use crate::config::Config;

// ============================================================================
// OPERATOR SIGNER IMPLEMENTATION
// ============================================================================

/// Holds the operator's ECDSA signing key and derived address.
///
/// Construction cross-checks the configured operator address against the
/// address derived from the private key, so a copy-paste mismatch between the
/// two config fields fails at startup rather than at first submission.
pub struct OperatorSigner {
    /// ECDSA signing key (secp256k1)
    signing_key: EcdsaSigningKey,
    /// Ethereum address derived from the key
    address: String,
}

impl OperatorSigner {
    /// Creates an operator signer from configuration.
    ///
    /// Loads the hex-encoded private key, derives the Ethereum address, and
    /// verifies it matches the configured operator address.
    pub fn new(config: &Config) -> Result<Self> {
        let key_hex = config
            .operator
            .private_key
            .strip_prefix("0x")
            .unwrap_or(&config.operator.private_key);
        let key_bytes = hex::decode(key_hex)?;

        if key_bytes.len() != 32 {
            return Err(anyhow::anyhow!(
                "Invalid operator private key length: expected 32 bytes, got {}",
                key_bytes.len()
            ));
        }

        let key_array: [u8; 32] = key_bytes
            .try_into()
            .map_err(|_| anyhow::anyhow!("Failed to convert private key to array"))?;
        let signing_key = EcdsaSigningKey::from_bytes(&key_array.into())
            .map_err(|e| anyhow::anyhow!("Failed to create ECDSA signing key: {}", e))?;

        let address = derive_ethereum_address(&signing_key)?;

        let expected = config.operator.address.to_lowercase();
        if address != expected {
            return Err(anyhow::anyhow!(
                "Operator address mismatch: config has {}, but private key corresponds to {}",
                expected,
                address
            ));
        }

        info!("Operator signer initialized for address {}", address);

        Ok(Self {
            signing_key,
            address,
        })
    }

    /// Returns the operator's Ethereum address (lowercase, 0x-prefixed).
    pub fn address(&self) -> &str {
        &self.address
    }

    /// Signs a raw EVM transaction hash with the ECDSA key.
    ///
    /// This does NOT apply the Ethereum signed message prefix — the caller is
    /// expected to pass the keccak256 hash of an RLP-encoded transaction.
    ///
    /// # Returns
    ///
    /// * `Ok((r, s, recovery_id))` — r and s are 32-byte big-endian,
    ///   recovery_id is 0 or 1
    pub fn sign_transaction_hash(&self, tx_hash: &[u8; 32]) -> Result<([u8; 32], [u8; 32], u8)> {
        use k256::ecdsa::signature::hazmat::PrehashSigner;
        let signature: EcdsaSignature = self
            .signing_key
            .sign_prehash(tx_hash)
            .map_err(|e| anyhow::anyhow!("Failed to sign transaction hash: {}", e))?;

        let sig_bytes = signature.to_bytes();
        let mut r = [0u8; 32];
        let mut s = [0u8; 32];
        r.copy_from_slice(&sig_bytes[..32]);
        s.copy_from_slice(&sig_bytes[32..64]);

        // Determine the recovery ID by recovering with 0 and comparing keys
        let verifying_key = self.signing_key.verifying_key();
        let public_key_point = verifying_key.to_encoded_point(false);
        let public_key_bytes = public_key_point.as_bytes();

        let recovery_id_0 = k256::ecdsa::RecoveryId::try_from(0u8).unwrap();
        let recovery_id = if let Ok(recovered) =
            EcdsaVerifyingKey::recover_from_prehash(tx_hash, &signature, recovery_id_0)
        {
            let recovered_point = recovered.to_encoded_point(false);
            if recovered_point.as_bytes() == public_key_bytes {
                0u8
            } else {
                1u8
            }
        } else {
            1u8
        };

        Ok((r, s, recovery_id))
    }
}

/// Derives the Ethereum address for a hex-encoded secp256k1 private key.
///
/// Used by tooling (and tests) to compute the operator address that belongs
/// in the config next to the key.
pub fn address_for_private_key(key_hex: &str) -> Result<String> {
    let clean = key_hex.strip_prefix("0x").unwrap_or(key_hex);
    let key_bytes = hex::decode(clean)?;
    let key_array: [u8; 32] = key_bytes
        .try_into()
        .map_err(|_| anyhow::anyhow!("Invalid private key length: expected 32 bytes"))?;
    let signing_key = EcdsaSigningKey::from_bytes(&key_array.into())
        .map_err(|e| anyhow::anyhow!("Failed to create ECDSA signing key: {}", e))?;
    derive_ethereum_address(&signing_key)
}

/// Derives the Ethereum address from an ECDSA signing key.
///
/// The address is keccak256(uncompressed_public_key)[12..32], hex encoded.
fn derive_ethereum_address(signing_key: &EcdsaSigningKey) -> Result<String> {
    let verifying_key = signing_key.verifying_key();
    let public_key_point = verifying_key.to_encoded_point(false); // Uncompressed format
    let public_key_bytes = public_key_point.as_bytes();

    // Uncompressed format: 0x04 || x (32 bytes) || y (32 bytes) = 65 bytes total
    if public_key_bytes.len() != 65 || public_key_bytes[0] != 0x04 {
        return Err(anyhow::anyhow!(
            "Invalid public key format: expected 65 bytes with 0x04 prefix"
        ));
    }

    let mut hasher = Keccak256::new();
    hasher.update(&public_key_bytes[1..]);
    let hash = hasher.finalize();

    Ok(format!("0x{}", hex::encode(&hash[12..32])))
}

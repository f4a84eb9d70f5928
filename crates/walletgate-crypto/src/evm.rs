use k256::ecdsa::{RecoveryId, Signature, VerifyingKey};
use sha3::{Digest, Keccak256};
use thiserror::Error;

#[derive(Debug, Error)]
pub enum RecoverError {
    #[error("invalid recovery id: {0}")]
    InvalidRecoveryId(u8),
    #[error("malformed signature")]
    MalformedSignature,
    #[error("public key recovery failed")]
    RecoveryFailed,
}

/// Verify an EIP-191 personal_sign signature against the claimed address.
///
/// `signature` is the 65-byte r || s || v form, hex encoded, 0x prefix
/// optional. The recovered address is compared case-insensitively so
/// checksummed and lower-cased submissions both match.
pub fn verify(address: &str, message: &str, signature: &str) -> bool {
    let Some(sig) = decode_signature(signature) else {
        return false;
    };

    let hash = personal_message_hash(message);
    match recover_address(&hash, &sig) {
        Ok(recovered) => recovered.eq_ignore_ascii_case(address),
        Err(_) => false,
    }
}

/// Recover the signer's address from a 65-byte signature over `message_hash`.
///
/// Accepts both recovery id conventions: 0/1 and the legacy 27/28.
/// Returns the address in lowercase with 0x prefix.
pub fn recover_address(
    message_hash: &[u8; 32],
    signature: &[u8; 65],
) -> Result<String, RecoverError> {
    let v = signature[64];
    let v_normalized = if v >= 27 { v - 27 } else { v };
    if v_normalized > 1 {
        return Err(RecoverError::InvalidRecoveryId(v));
    }

    let recovery_id =
        RecoveryId::try_from(v_normalized).map_err(|_| RecoverError::InvalidRecoveryId(v))?;

    let sig = Signature::try_from(&signature[..64])
        .map_err(|_| RecoverError::MalformedSignature)?;

    let verifying_key = VerifyingKey::recover_from_prehash(message_hash, &sig, recovery_id)
        .map_err(|_| RecoverError::RecoveryFailed)?;

    Ok(pubkey_to_address(&verifying_key))
}

/// Hash `message` with the EIP-191 personal-message prefix:
/// "\x19Ethereum Signed Message:\n" + len(message) + message
pub fn personal_message_hash(message: &str) -> [u8; 32] {
    let prefixed = format!("\x19Ethereum Signed Message:\n{}{}", message.len(), message);
    keccak256(prefixed.as_bytes())
}

/// Ethereum address of a public key: last 20 bytes of
/// keccak256(uncompressed point without the 0x04 prefix byte).
pub fn pubkey_to_address(key: &VerifyingKey) -> String {
    let point = key.to_encoded_point(false);
    let hash = keccak256(&point.as_bytes()[1..]);
    format!("0x{}", hex::encode(&hash[12..]))
}

pub fn keccak256(data: &[u8]) -> [u8; 32] {
    let mut hasher = Keccak256::new();
    hasher.update(data);
    hasher.finalize().into()
}

fn decode_signature(signature: &str) -> Option<[u8; 65]> {
    let hex_part = signature.strip_prefix("0x").unwrap_or(signature);
    let bytes = hex::decode(hex_part).ok()?;
    bytes.try_into().ok()
}

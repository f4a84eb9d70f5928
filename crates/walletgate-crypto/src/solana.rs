use ed25519_dalek::{Signature, Verifier, VerifyingKey};

/// Verify an ed25519 signature over the raw UTF-8 bytes of `message`.
///
/// In Solana, wallet addresses ARE the public keys (base58 encoded);
/// `signature` is the 64-byte signature, also base58 encoded.
pub fn verify(address: &str, message: &str, signature: &str) -> bool {
    let Some(verifying_key) = decode_pubkey(address) else {
        return false;
    };
    let Some(sig) = decode_signature(signature) else {
        return false;
    };

    verifying_key.verify(message.as_bytes(), &sig).is_ok()
}

/// Decode a base58 address into a verifying key. None if the string is
/// not base58, not 32 bytes, or not a valid curve point.
fn decode_pubkey(address: &str) -> Option<VerifyingKey> {
    let bytes = bs58::decode(address).into_vec().ok()?;
    let bytes: [u8; 32] = bytes.try_into().ok()?;
    VerifyingKey::from_bytes(&bytes).ok()
}

fn decode_signature(signature: &str) -> Option<Signature> {
    let bytes = bs58::decode(signature).into_vec().ok()?;
    let bytes: [u8; 64] = bytes.try_into().ok()?;
    Some(Signature::from_bytes(&bytes))
}

#[cfg(test)]
mod tests {
    use super::*;
    use ed25519_dalek::{Signer, SigningKey};
    use rand_core::OsRng;

    fn keypair() -> (SigningKey, String) {
        let key = SigningKey::generate(&mut OsRng);
        let address = bs58::encode(key.verifying_key().to_bytes()).into_string();
        (key, address)
    }

    fn sign(key: &SigningKey, message: &str) -> String {
        bs58::encode(key.sign(message.as_bytes()).to_bytes()).into_string()
    }

    #[test]
    fn sign_and_verify_round_trip() {
        let (key, address) = keypair();
        let message = "Sign in with nonce xyz789";

        let signature = sign(&key, message);
        assert!(verify(&address, message, &signature));
    }

    #[test]
    fn flipped_bit_rejected() {
        let (key, address) = keypair();
        let message = "Sign in with nonce xyz789";

        let mut sig_bytes = key.sign(message.as_bytes()).to_bytes();
        sig_bytes[10] ^= 0x01;
        let signature = bs58::encode(sig_bytes).into_string();

        assert!(!verify(&address, message, &signature));
    }

    #[test]
    fn different_signer_rejected() {
        let (key, _) = keypair();
        let (_, other_address) = keypair();
        let message = "Sign in with nonce xyz789";

        let signature = sign(&key, message);
        assert!(!verify(&other_address, message, &signature));
    }

    #[test]
    fn tampered_message_rejected() {
        let (key, address) = keypair();

        let signature = sign(&key, "Sign in with nonce xyz789");
        assert!(!verify(&address, "Sign in with nonce xyz790", &signature));
    }

    #[test]
    fn malformed_inputs_rejected() {
        let (key, address) = keypair();
        let message = "test message";
        let signature = sign(&key, message);

        // address with characters outside the base58 alphabet
        assert!(!verify("0OIl0OIl0OIl0OIl0OIl0OIl0OIl0OIl", message, &signature));
        // address decoding to the wrong length
        assert!(!verify("111111", message, &signature));
        // signature of the wrong length
        assert!(!verify(&address, message, &bs58::encode([0u8; 32]).into_string()));
        // signature that is not base58 at all
        assert!(!verify(&address, message, "not+base58!"));
    }
}

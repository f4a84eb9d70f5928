use thiserror::Error;
use walletgate_types::network::{Network, SignatureScheme};

#[derive(Debug, Error)]
pub enum AddressError {
    #[error("EVM address must start with 0x")]
    MissingHexPrefix,
    #[error("EVM address must be 42 characters, got {0}")]
    EvmLength(usize),
    #[error("invalid hex characters in EVM address")]
    EvmHex,
    #[error("Solana address must be 32-44 characters, got {0}")]
    SolanaLength(usize),
    #[error("invalid base58 encoding")]
    SolanaBase58,
    #[error("Solana address must decode to 32 bytes, got {0}")]
    SolanaKeyLength(usize),
}

/// Validate `address` for `network` and return its normalized form:
/// lower-cased hex for EVM networks, canonical base58 for Solana.
///
/// The normalized form is the unique identity key, so checksummed and
/// lower-cased submissions of the same EVM address collapse to one user.
pub fn normalize_address(network: Network, address: &str) -> Result<String, AddressError> {
    let addr = address.trim();
    match network.scheme() {
        SignatureScheme::EvmPersonalSign => {
            if !addr.starts_with("0x") && !addr.starts_with("0X") {
                return Err(AddressError::MissingHexPrefix);
            }
            if addr.len() != 42 {
                return Err(AddressError::EvmLength(addr.len()));
            }
            hex::decode(&addr[2..]).map_err(|_| AddressError::EvmHex)?;
            Ok(addr.to_lowercase())
        }
        SignatureScheme::Ed25519 => {
            if addr.len() < 32 || addr.len() > 44 {
                return Err(AddressError::SolanaLength(addr.len()));
            }
            let bytes = bs58::decode(addr)
                .into_vec()
                .map_err(|_| AddressError::SolanaBase58)?;
            if bytes.len() != 32 {
                return Err(AddressError::SolanaKeyLength(bytes.len()));
            }
            Ok(bs58::encode(bytes).into_string())
        }
    }
}

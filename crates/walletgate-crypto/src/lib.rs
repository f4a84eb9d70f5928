/// Walletgate signature verification.
///
/// One polymorphic entry point keyed by network; each scheme lives in
/// its own module and is independently testable:
/// - EVM networks (ethereum, fantom): secp256k1 recovery over the
///   EIP-191 personal-message hash
/// - Solana: ed25519 over the raw message bytes
///
/// Verification is a pure cryptographic check. No chain RPC is involved.
pub mod address;
pub mod evm;
pub mod solana;

pub use address::{AddressError, normalize_address};

use walletgate_types::network::{Network, SignatureScheme};

/// Verify `signature` over `message` against the claimed `address`.
///
/// Malformed input of any kind (bad hex or base58, wrong lengths,
/// invalid recovery id, off-curve public key) is a verification
/// failure, never a panic or an escaping error.
pub fn verify_wallet_signature(
    network: Network,
    address: &str,
    message: &str,
    signature: &str,
) -> bool {
    match network.scheme() {
        SignatureScheme::EvmPersonalSign => evm::verify(address, message, signature),
        SignatureScheme::Ed25519 => solana::verify(address, message, signature),
    }
}

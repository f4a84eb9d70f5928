use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};

/// Blockchain networks a wallet can authenticate from.
///
/// Fantom is EVM-compatible and shares ethereum's signature conventions,
/// so both map to the same verification scheme.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Network {
    Ethereum,
    Fantom,
    Solana,
}

/// Signature scheme implied by a network.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SignatureScheme {
    /// secp256k1 ECDSA over the EIP-191 personal-message hash
    EvmPersonalSign,
    /// ed25519 over the raw message bytes
    Ed25519,
}

impl Network {
    pub fn scheme(self) -> SignatureScheme {
        match self {
            Network::Ethereum | Network::Fantom => SignatureScheme::EvmPersonalSign,
            Network::Solana => SignatureScheme::Ed25519,
        }
    }

    pub fn is_evm(self) -> bool {
        self.scheme() == SignatureScheme::EvmPersonalSign
    }

    pub fn as_str(self) -> &'static str {
        match self {
            Network::Ethereum => "ethereum",
            Network::Fantom => "fantom",
            Network::Solana => "solana",
        }
    }
}

impl fmt::Display for Network {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

#[derive(Debug, Clone)]
pub struct UnknownNetwork(pub String);

impl fmt::Display for UnknownNetwork {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "unknown network: {}", self.0)
    }
}

impl std::error::Error for UnknownNetwork {}

impl FromStr for Network {
    type Err = UnknownNetwork;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "ethereum" => Ok(Network::Ethereum),
            "fantom" => Ok(Network::Fantom),
            "solana" => Ok(Network::Solana),
            other => Err(UnknownNetwork(other.to_string())),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn scheme_dispatch() {
        assert_eq!(Network::Ethereum.scheme(), SignatureScheme::EvmPersonalSign);
        assert_eq!(Network::Fantom.scheme(), SignatureScheme::EvmPersonalSign);
        assert_eq!(Network::Solana.scheme(), SignatureScheme::Ed25519);
        assert!(Network::Fantom.is_evm());
        assert!(!Network::Solana.is_evm());
    }

    #[test]
    fn string_round_trip() {
        for net in [Network::Ethereum, Network::Fantom, Network::Solana] {
            assert_eq!(net.as_str().parse::<Network>().unwrap(), net);
        }
        assert!("bitcoin".parse::<Network>().is_err());
    }

    #[test]
    fn serde_uses_lowercase() {
        assert_eq!(serde_json::to_string(&Network::Fantom).unwrap(), "\"fantom\"");
        let net: Network = serde_json::from_str("\"solana\"").unwrap();
        assert_eq!(net, Network::Solana);
    }
}

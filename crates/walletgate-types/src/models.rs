use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::network::Network;

/// A wallet-backed user identity.
///
/// `wallet_address` is the unique natural key, stored normalized
/// (lower-cased hex for EVM networks, canonical base58 for Solana).
/// One identity per address, created on first successful authentication.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Identity {
    pub id: Uuid,
    pub wallet_address: String,
    pub network: Network,
    pub display_name: String,
    pub created_at: DateTime<Utc>,
}

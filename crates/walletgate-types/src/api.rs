use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::models::Identity;
use crate::network::Network;

// -- JWT Claims --

/// JWT claims shared between walletgate-api (token issuance) and the
/// auth middleware. Canonical definition lives here in walletgate-types
/// to eliminate duplication.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Claims {
    pub sub: Uuid,
    pub wallet: String,
    /// Token id, checked against the server-side revocation list on
    /// every authenticated request.
    pub jti: Uuid,
    pub exp: usize,
}

// -- Challenge --

#[derive(Debug, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct ChallengeRequest {
    pub address: String,
    pub network: Network,
}

#[derive(Debug, Serialize)]
pub struct ChallengeResponse {
    pub nonce: String,
    pub message: String,
    pub expires_at: DateTime<Utc>,
}

// -- Authenticate --

#[derive(Debug, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct AuthenticateRequest {
    pub wallet_address: String,
    pub network: Network,
    pub signature: String,
    pub nonce: String,
}

#[derive(Debug, Serialize)]
pub struct AuthenticateResponse {
    pub user: Identity,
    pub token: String,
    #[serde(rename = "redirectUrl")]
    pub redirect_url: String,
}

// -- Logout --

#[derive(Debug, Serialize)]
pub struct LogoutResponse {
    pub success: bool,
}

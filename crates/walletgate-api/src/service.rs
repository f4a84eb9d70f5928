use anyhow::anyhow;
use chrono::{DateTime, Duration, Utc};
use rand_core::{OsRng, RngCore};
use uuid::Uuid;

use walletgate_crypto::{normalize_address, verify_wallet_signature};
use walletgate_db::Database;
use walletgate_db::models::{ChallengeRow, IdentityRow};
use walletgate_types::api::AuthenticateRequest;
use walletgate_types::models::Identity;
use walletgate_types::network::Network;

use crate::error::AuthError;

/// Challenges are short-lived; a client signs and submits immediately.
pub const CHALLENGE_TTL_MINUTES: i64 = 5;

const NONCE_BYTES: usize = 16;

/// Issue a one-time challenge for `address` to sign.
///
/// The address is validated and normalized up front so the challenge is
/// keyed the same way the later authenticate call will look it up.
pub fn request_challenge(
    db: &Database,
    domain: &str,
    address: &str,
    network: Network,
) -> Result<ChallengeRow, AuthError> {
    let address = normalize_address(network, address).map_err(|e| AuthError::InvalidInput {
        field: "address",
        reason: e.to_string(),
    })?;

    let nonce = generate_nonce();
    let issued_at = Utc::now();
    let expires_at = issued_at + Duration::minutes(CHALLENGE_TTL_MINUTES);

    let row = ChallengeRow {
        message: challenge_message(domain, network, &address, &nonce, issued_at),
        address,
        network: network.as_str().to_string(),
        nonce,
        issued_at: walletgate_db::format_ts(issued_at),
        expires_at: walletgate_db::format_ts(expires_at),
        consumed: false,
    };
    db.insert_challenge(&row)?;

    Ok(row)
}

/// Authenticate a signed challenge: validate input shape, consume the
/// nonce, verify the signature over the stored message, then upsert the
/// identity. No identity row is created or read if any earlier step
/// fails.
pub fn authenticate(db: &Database, req: &AuthenticateRequest) -> Result<Identity, AuthError> {
    if req.signature.trim().is_empty() {
        return Err(AuthError::InvalidInput {
            field: "signature",
            reason: "The signature field is required.".to_string(),
        });
    }
    if req.nonce.trim().is_empty() {
        return Err(AuthError::InvalidInput {
            field: "nonce",
            reason: "The nonce field is required.".to_string(),
        });
    }

    let address =
        normalize_address(req.network, &req.wallet_address).map_err(|e| AuthError::InvalidInput {
            field: "wallet_address",
            reason: e.to_string(),
        })?;

    let challenge = db.consume_challenge(&address, req.network.as_str(), &req.nonce, Utc::now())?;

    // The signature must cover the stored message, not one the client
    // supplies.
    if !verify_wallet_signature(req.network, &address, &challenge.message, &req.signature) {
        return Err(AuthError::SignatureMismatch);
    }

    let row = db.upsert_identity(
        &Uuid::new_v4().to_string(),
        &address,
        req.network.as_str(),
        &generate_display_name(),
        &walletgate_db::format_ts(Utc::now()),
    )?;

    identity_from_row(row)
}

pub fn identity_from_row(row: IdentityRow) -> Result<Identity, AuthError> {
    let id = row
        .id
        .parse::<Uuid>()
        .map_err(|e| AuthError::Infrastructure(anyhow!("bad identity id {}: {}", row.id, e)))?;
    let network = row
        .network
        .parse::<Network>()
        .map_err(|e| AuthError::Infrastructure(anyhow!(e)))?;
    let created_at = walletgate_db::parse_ts(&row.created_at)?;

    Ok(Identity {
        id,
        wallet_address: row.wallet_address,
        network,
        display_name: row.display_name,
        created_at,
    })
}

/// Deterministic sign-in message shown in the wallet prompt. Embeds the
/// domain, network, address, nonce and issuance time.
fn challenge_message(
    domain: &str,
    network: Network,
    address: &str,
    nonce: &str,
    issued_at: DateTime<Utc>,
) -> String {
    format!(
        "{} wants you to sign in with your {} account:\n{}\n\nNonce: {}\nIssued At: {}",
        domain,
        network,
        address,
        nonce,
        walletgate_db::format_ts(issued_at),
    )
}

fn generate_nonce() -> String {
    let mut bytes = [0u8; NONCE_BYTES];
    OsRng.fill_bytes(&mut bytes);
    hex::encode(bytes)
}

fn generate_display_name() -> String {
    let mut bytes = [0u8; 3];
    OsRng.fill_bytes(&mut bytes);
    format!("User_{}", hex::encode(bytes))
}

use std::sync::Arc;

use anyhow::anyhow;
use axum::{Extension, Json, extract::State, http::StatusCode, response::IntoResponse};
use chrono::{DateTime, Utc};
use jsonwebtoken::{EncodingKey, Header, encode};
use uuid::Uuid;

use walletgate_db::Database;
use walletgate_types::api::{
    AuthenticateRequest, AuthenticateResponse, ChallengeRequest, ChallengeResponse, Claims,
    LogoutResponse,
};
use walletgate_types::models::Identity;

use crate::error::AuthError;
use crate::service;

pub type AppState = Arc<AppStateInner>;

pub struct AppStateInner {
    pub db: Database,
    pub jwt_secret: String,
    /// Domain embedded in challenge messages so wallets show who is
    /// asking for the signature.
    pub domain: String,
}

/// POST /auth/web3/challenge
pub async fn challenge(
    State(state): State<AppState>,
    Json(req): Json<ChallengeRequest>,
) -> Result<impl IntoResponse, AuthError> {
    let row = service::request_challenge(&state.db, &state.domain, &req.address, req.network)?;
    let expires_at = walletgate_db::parse_ts(&row.expires_at).map_err(AuthError::Infrastructure)?;

    Ok(Json(ChallengeResponse {
        nonce: row.nonce,
        message: row.message,
        expires_at,
    }))
}

/// POST /auth/web3
pub async fn authenticate(
    State(state): State<AppState>,
    Json(req): Json<AuthenticateRequest>,
) -> Result<impl IntoResponse, AuthError> {
    let user = service::authenticate(&state.db, &req)?;
    let token = create_token(&state.jwt_secret, &user).map_err(AuthError::Infrastructure)?;

    Ok(Json(AuthenticateResponse {
        user,
        token,
        redirect_url: "/dashboard".to_string(),
    }))
}

/// POST /auth/web3/logout
///
/// Revokes the token's jti server-side; the revocation outlives any
/// copy of the token until the token itself expires.
pub async fn logout(
    State(state): State<AppState>,
    Extension(claims): Extension<Claims>,
) -> Result<impl IntoResponse, AuthError> {
    let token_exp = DateTime::<Utc>::from_timestamp(claims.exp as i64, 0)
        .ok_or_else(|| AuthError::Infrastructure(anyhow!("bad exp claim: {}", claims.exp)))?;

    state
        .db
        .revoke_session(&claims.jti.to_string(), &walletgate_db::format_ts(token_exp))?;

    Ok(Json(LogoutResponse { success: true }))
}

/// GET /user
pub async fn current_user(
    State(state): State<AppState>,
    Extension(claims): Extension<Claims>,
) -> Result<Json<Identity>, StatusCode> {
    let row = state
        .db
        .get_identity_by_id(&claims.sub.to_string())
        .map_err(|_| StatusCode::INTERNAL_SERVER_ERROR)?
        .ok_or(StatusCode::UNAUTHORIZED)?;

    let user =
        service::identity_from_row(row).map_err(|_| StatusCode::INTERNAL_SERVER_ERROR)?;
    Ok(Json(user))
}

fn create_token(secret: &str, user: &Identity) -> anyhow::Result<String> {
    let claims = Claims {
        sub: user.id,
        wallet: user.wallet_address.clone(),
        jti: Uuid::new_v4(),
        exp: (chrono::Utc::now() + chrono::Duration::days(30)).timestamp() as usize,
    };

    let token = encode(
        &Header::default(),
        &claims,
        &EncodingKey::from_secret(secret.as_bytes()),
    )?;

    Ok(token)
}

#[cfg(test)]
mod tests {
    use super::*;
    use jsonwebtoken::{DecodingKey, Validation, decode};

    #[test]
    fn token_round_trips_through_decode() {
        let user = Identity {
            id: Uuid::new_v4(),
            wallet_address: "0x742d35cc6634c0532925a3b844bc9e7595f0beb4".to_string(),
            network: walletgate_types::network::Network::Ethereum,
            display_name: "User_abc123".to_string(),
            created_at: Utc::now(),
        };

        let token = create_token("test-secret", &user).unwrap();
        let decoded = decode::<Claims>(
            &token,
            &DecodingKey::from_secret(b"test-secret"),
            &Validation::default(),
        )
        .unwrap();

        assert_eq!(decoded.claims.sub, user.id);
        assert_eq!(decoded.claims.wallet, user.wallet_address);
    }
}

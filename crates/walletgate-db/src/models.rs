/// Database row types. These map directly to SQLite rows and stay
/// string-typed; the API layer converts them into walletgate-types
/// models, keeping the DB layer independent.

pub struct IdentityRow {
    pub id: String,
    pub wallet_address: String,
    pub network: String,
    pub display_name: String,
    pub created_at: String,
}

pub struct ChallengeRow {
    pub address: String,
    pub network: String,
    pub nonce: String,
    pub message: String,
    pub issued_at: String,
    pub expires_at: String,
    pub consumed: bool,
}

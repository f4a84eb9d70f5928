use anyhow::Result;
use rusqlite::Connection;
use tracing::info;

pub fn run(conn: &Connection) -> Result<()> {
    conn.execute_batch(
        "
        CREATE TABLE IF NOT EXISTS identities (
            id              TEXT PRIMARY KEY,
            wallet_address  TEXT NOT NULL UNIQUE,
            network         TEXT NOT NULL,
            display_name    TEXT NOT NULL,
            created_at      TEXT NOT NULL
        );

        CREATE TABLE IF NOT EXISTS challenges (
            address     TEXT NOT NULL,
            network     TEXT NOT NULL,
            nonce       TEXT NOT NULL,
            message     TEXT NOT NULL,
            issued_at   TEXT NOT NULL,
            expires_at  TEXT NOT NULL,
            consumed    INTEGER NOT NULL DEFAULT 0,
            PRIMARY KEY (address, network, nonce)
        );

        CREATE INDEX IF NOT EXISTS idx_challenges_expiry
            ON challenges(expires_at);

        CREATE TABLE IF NOT EXISTS revoked_sessions (
            jti         TEXT PRIMARY KEY,
            expires_at  TEXT NOT NULL
        );

        CREATE INDEX IF NOT EXISTS idx_revoked_sessions_expiry
            ON revoked_sessions(expires_at);
        ",
    )?;

    info!("Database migrations complete");
    Ok(())
}

use crate::models::{ChallengeRow, IdentityRow};
use crate::Database;
use anyhow::{Result, anyhow};
use chrono::{DateTime, Utc};
use rusqlite::Connection;
use thiserror::Error;

/// Outcome of a failed challenge consume. `Storage` is infrastructure;
/// the other three mean the client must request a fresh challenge.
#[derive(Debug, Error)]
pub enum ConsumeError {
    #[error("challenge not found")]
    NotFound,
    #[error("challenge expired")]
    Expired,
    #[error("challenge already consumed")]
    AlreadyConsumed,
    #[error(transparent)]
    Storage(#[from] anyhow::Error),
}

impl Database {
    // -- Identities --

    /// Insert-or-read keyed by the normalized wallet address. A second
    /// authentication for the same address returns the existing row
    /// untouched; the candidate id and display name are only used on
    /// first creation.
    pub fn upsert_identity(
        &self,
        id: &str,
        wallet_address: &str,
        network: &str,
        display_name: &str,
        created_at: &str,
    ) -> Result<IdentityRow> {
        self.with_conn_mut(|conn| {
            conn.execute(
                "INSERT INTO identities (id, wallet_address, network, display_name, created_at)
                 VALUES (?1, ?2, ?3, ?4, ?5)
                 ON CONFLICT(wallet_address) DO NOTHING",
                (id, wallet_address, network, display_name, created_at),
            )?;

            query_identity_by_address(conn, wallet_address)?
                .ok_or_else(|| anyhow!("identity missing after upsert: {}", wallet_address))
        })
    }

    pub fn get_identity_by_address(&self, wallet_address: &str) -> Result<Option<IdentityRow>> {
        self.with_conn(|conn| query_identity_by_address(conn, wallet_address))
    }

    pub fn get_identity_by_id(&self, id: &str) -> Result<Option<IdentityRow>> {
        self.with_conn(|conn| {
            let mut stmt = conn.prepare(
                "SELECT id, wallet_address, network, display_name, created_at
                 FROM identities WHERE id = ?1",
            )?;

            let row = stmt.query_row([id], map_identity_row).optional()?;
            Ok(row)
        })
    }

    // -- Challenges --

    pub fn insert_challenge(&self, challenge: &ChallengeRow) -> Result<()> {
        self.with_conn_mut(|conn| {
            conn.execute(
                "INSERT INTO challenges (address, network, nonce, message, issued_at, expires_at, consumed)
                 VALUES (?1, ?2, ?3, ?4, ?5, ?6, 0)",
                (
                    &challenge.address,
                    &challenge.network,
                    &challenge.nonce,
                    &challenge.message,
                    &challenge.issued_at,
                    &challenge.expires_at,
                ),
            )?;
            Ok(())
        })
    }

    /// Atomically find and mark-consume a challenge. At most one caller
    /// can observe a successful consume for a given key: the UPDATE is
    /// guarded by `consumed = 0` and the connection lock is held for
    /// the whole read-check-update sequence.
    pub fn consume_challenge(
        &self,
        address: &str,
        network: &str,
        nonce: &str,
        now: DateTime<Utc>,
    ) -> Result<ChallengeRow, ConsumeError> {
        self.with_conn_mut(|conn| {
            let Some(row) = query_challenge(conn, address, network, nonce)? else {
                return Ok(Err(ConsumeError::NotFound));
            };

            // Passive expiry: entries past their TTL count as unusable
            // even while the sweeper has not reclaimed them yet.
            let expires_at = crate::parse_ts(&row.expires_at)?;
            if now > expires_at {
                return Ok(Err(ConsumeError::Expired));
            }

            if row.consumed {
                return Ok(Err(ConsumeError::AlreadyConsumed));
            }

            let changed = conn.execute(
                "UPDATE challenges SET consumed = 1
                 WHERE address = ?1 AND network = ?2 AND nonce = ?3 AND consumed = 0",
                (address, network, nonce),
            )?;
            if changed == 0 {
                return Ok(Err(ConsumeError::AlreadyConsumed));
            }

            Ok(Ok(row))
        })?
    }

    /// Storage reclamation for the background sweeper. Correctness does
    /// not depend on this; `consume_challenge` treats expired rows as
    /// absent either way.
    pub fn delete_expired_challenges(&self, now: DateTime<Utc>) -> Result<usize> {
        self.with_conn_mut(|conn| {
            let deleted = conn.execute(
                "DELETE FROM challenges WHERE expires_at < ?1",
                [crate::format_ts(now)],
            )?;
            Ok(deleted)
        })
    }

    // -- Sessions --

    pub fn revoke_session(&self, jti: &str, expires_at: &str) -> Result<()> {
        self.with_conn_mut(|conn| {
            conn.execute(
                "INSERT OR IGNORE INTO revoked_sessions (jti, expires_at) VALUES (?1, ?2)",
                (jti, expires_at),
            )?;
            Ok(())
        })
    }

    pub fn is_session_revoked(&self, jti: &str) -> Result<bool> {
        self.with_conn(|conn| {
            let found: Option<String> = conn
                .query_row(
                    "SELECT jti FROM revoked_sessions WHERE jti = ?1",
                    [jti],
                    |row| row.get(0),
                )
                .optional()?;
            Ok(found.is_some())
        })
    }

    /// Revocations only matter until the token itself expires.
    pub fn delete_expired_revocations(&self, now: DateTime<Utc>) -> Result<usize> {
        self.with_conn_mut(|conn| {
            let deleted = conn.execute(
                "DELETE FROM revoked_sessions WHERE expires_at < ?1",
                [crate::format_ts(now)],
            )?;
            Ok(deleted)
        })
    }
}

fn query_identity_by_address(conn: &Connection, wallet_address: &str) -> Result<Option<IdentityRow>> {
    let mut stmt = conn.prepare(
        "SELECT id, wallet_address, network, display_name, created_at
         FROM identities WHERE wallet_address = ?1",
    )?;

    let row = stmt.query_row([wallet_address], map_identity_row).optional()?;
    Ok(row)
}

fn map_identity_row(row: &rusqlite::Row<'_>) -> std::result::Result<IdentityRow, rusqlite::Error> {
    Ok(IdentityRow {
        id: row.get(0)?,
        wallet_address: row.get(1)?,
        network: row.get(2)?,
        display_name: row.get(3)?,
        created_at: row.get(4)?,
    })
}

fn query_challenge(
    conn: &Connection,
    address: &str,
    network: &str,
    nonce: &str,
) -> Result<Option<ChallengeRow>> {
    let mut stmt = conn.prepare(
        "SELECT address, network, nonce, message, issued_at, expires_at, consumed
         FROM challenges WHERE address = ?1 AND network = ?2 AND nonce = ?3",
    )?;

    let row = stmt
        .query_row((address, network, nonce), |row| {
            Ok(ChallengeRow {
                address: row.get(0)?,
                network: row.get(1)?,
                nonce: row.get(2)?,
                message: row.get(3)?,
                issued_at: row.get(4)?,
                expires_at: row.get(5)?,
                consumed: row.get::<_, i64>(6)? != 0,
            })
        })
        .optional()?;

    Ok(row)
}

/// Extension trait for optional query results
trait OptionalExt<T> {
    fn optional(self) -> Result<Option<T>>;
}

impl<T> OptionalExt<T> for std::result::Result<T, rusqlite::Error> {
    fn optional(self) -> Result<Option<T>> {
        match self {
            Ok(val) => Ok(Some(val)),
            Err(rusqlite::Error::QueryReturnedNoRows) => Ok(None),
            Err(e) => Err(e.into()),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::Duration;

    fn challenge(address: &str, nonce: &str, issued_at: DateTime<Utc>, ttl: Duration) -> ChallengeRow {
        ChallengeRow {
            address: address.to_string(),
            network: "ethereum".to_string(),
            nonce: nonce.to_string(),
            message: format!("Sign in with nonce {}", nonce),
            issued_at: crate::format_ts(issued_at),
            expires_at: crate::format_ts(issued_at + ttl),
            consumed: false,
        }
    }

    #[test]
    fn consume_succeeds_once() {
        let db = Database::open_in_memory().unwrap();
        let now = Utc::now();
        db.insert_challenge(&challenge("0xabc", "n1", now, Duration::minutes(5)))
            .unwrap();

        let row = db.consume_challenge("0xabc", "ethereum", "n1", now).unwrap();
        assert_eq!(row.nonce, "n1");

        // replay is rejected
        assert!(matches!(
            db.consume_challenge("0xabc", "ethereum", "n1", now),
            Err(ConsumeError::AlreadyConsumed)
        ));
    }

    #[test]
    fn consume_unknown_nonce() {
        let db = Database::open_in_memory().unwrap();
        assert!(matches!(
            db.consume_challenge("0xabc", "ethereum", "missing", Utc::now()),
            Err(ConsumeError::NotFound)
        ));
    }

    #[test]
    fn consume_scoped_by_key() {
        let db = Database::open_in_memory().unwrap();
        let now = Utc::now();
        db.insert_challenge(&challenge("0xabc", "n1", now, Duration::minutes(5)))
            .unwrap();

        // same nonce, different address or network, is a different key
        assert!(matches!(
            db.consume_challenge("0xdef", "ethereum", "n1", now),
            Err(ConsumeError::NotFound)
        ));
        assert!(matches!(
            db.consume_challenge("0xabc", "fantom", "n1", now),
            Err(ConsumeError::NotFound)
        ));
    }

    #[test]
    fn consume_expired_challenge() {
        let db = Database::open_in_memory().unwrap();
        let issued = Utc::now() - Duration::minutes(10);
        db.insert_challenge(&challenge("0xabc", "n1", issued, Duration::minutes(5)))
            .unwrap();

        assert!(matches!(
            db.consume_challenge("0xabc", "ethereum", "n1", Utc::now()),
            Err(ConsumeError::Expired)
        ));
    }

    #[test]
    fn concurrent_consume_has_one_winner() {
        use std::sync::Arc;

        let db = Arc::new(Database::open_in_memory().unwrap());
        let now = Utc::now();
        db.insert_challenge(&challenge("0xabc", "n1", now, Duration::minutes(5)))
            .unwrap();

        let handles: Vec<_> = (0..4)
            .map(|_| {
                let db = db.clone();
                std::thread::spawn(move || {
                    db.consume_challenge("0xabc", "ethereum", "n1", now).is_ok()
                })
            })
            .collect();

        let results: Vec<bool> = handles.into_iter().map(|h| h.join().unwrap()).collect();
        assert_eq!(results.iter().filter(|&&won| won).count(), 1);
    }

    #[test]
    fn sweep_removes_expired_rows() {
        let db = Database::open_in_memory().unwrap();
        let now = Utc::now();
        db.insert_challenge(&challenge("0xabc", "old", now - Duration::minutes(10), Duration::minutes(5)))
            .unwrap();
        db.insert_challenge(&challenge("0xabc", "fresh", now, Duration::minutes(5)))
            .unwrap();

        assert_eq!(db.delete_expired_challenges(now).unwrap(), 1);

        // the live challenge is still consumable
        assert!(db.consume_challenge("0xabc", "ethereum", "fresh", now).is_ok());
    }

    #[test]
    fn upsert_is_idempotent() {
        let db = Database::open_in_memory().unwrap();
        let created = crate::format_ts(Utc::now());

        let first = db
            .upsert_identity("id-1", "0xabc", "ethereum", "User_aaa111", &created)
            .unwrap();
        let second = db
            .upsert_identity("id-2", "0xabc", "ethereum", "User_bbb222", &created)
            .unwrap();

        // second call reads the existing row, never creates another
        assert_eq!(first.id, "id-1");
        assert_eq!(second.id, "id-1");
        assert_eq!(second.display_name, "User_aaa111");
    }

    #[test]
    fn session_revocation_round_trip() {
        let db = Database::open_in_memory().unwrap();
        let now = Utc::now();
        let exp = crate::format_ts(now + Duration::days(30));

        assert!(!db.is_session_revoked("jti-1").unwrap());
        db.revoke_session("jti-1", &exp).unwrap();
        assert!(db.is_session_revoked("jti-1").unwrap());

        // pruned only after the token expiry passes
        assert_eq!(db.delete_expired_revocations(now).unwrap(), 0);
        assert_eq!(
            db.delete_expired_revocations(now + Duration::days(31)).unwrap(),
            1
        );
        assert!(!db.is_session_revoked("jti-1").unwrap());
    }
}

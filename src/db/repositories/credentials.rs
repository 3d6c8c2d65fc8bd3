use anyhow::{bail, Context, Result};
use chrono::Utc;
use rusqlite::{params, OptionalExtension};

use crate::db::{
    helpers::parse_datetime,
    models::{LockCredential, LockKind},
    Database,
};

const LOCK_PASSWORD_KEY: &str = "lockPassword";

impl Database {
    /// The stored lock-screen credential, if the user has set one.
    pub async fn lock_credential(&self) -> Result<Option<LockCredential>> {
        self.execute(|conn| {
            let row = conn
                .query_row(
                    "SELECT kind, hash, updated_at FROM credentials WHERE key = ?1",
                    params![LOCK_PASSWORD_KEY],
                    |row| {
                        Ok((
                            row.get::<_, String>(0)?,
                            row.get::<_, String>(1)?,
                            row.get::<_, String>(2)?,
                        ))
                    },
                )
                .optional()
                .context("failed to read lock credential")?;

            match row {
                Some((kind, hash, updated_at)) => Ok(Some(LockCredential {
                    kind: LockKind::parse(&kind)?,
                    hash,
                    updated_at: parse_datetime(&updated_at, "updated_at")?,
                })),
                None => Ok(None),
            }
        })
        .await
    }

    pub async fn set_lock_credential(&self, kind: LockKind, hash: String) -> Result<LockCredential> {
        if hash.is_empty() || !hash.chars().all(|c| matches!(c, '0'..='9' | 'a'..='f')) {
            bail!("lock credential hash must be lowercase hex");
        }

        self.execute(move |conn| {
            let now = Utc::now();
            conn.execute(
                "INSERT INTO credentials (key, kind, hash, updated_at)
                 VALUES (?1, ?2, ?3, ?4)
                 ON CONFLICT(key) DO UPDATE SET
                     kind = excluded.kind,
                     hash = excluded.hash,
                     updated_at = excluded.updated_at",
                params![LOCK_PASSWORD_KEY, kind.as_str(), hash, now.to_rfc3339()],
            )
            .context("failed to store lock credential")?;

            Ok(LockCredential {
                kind,
                hash,
                updated_at: now,
            })
        })
        .await
    }

    /// Returns whether a credential was removed.
    pub async fn clear_lock_credential(&self) -> Result<bool> {
        self.execute(|conn| {
            let removed = conn
                .execute(
                    "DELETE FROM credentials WHERE key = ?1",
                    params![LOCK_PASSWORD_KEY],
                )
                .context("failed to clear lock credential")?;
            Ok(removed > 0)
        })
        .await
    }
}

//! Lock-screen credential.
//!
//! The shell only stores and hands back the digest; hashing and comparison
//! belong to the lock screen.

use anyhow::{bail, Result};
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub enum LockKind {
    Pin,
    Pattern,
}

impl LockKind {
    pub fn as_str(self) -> &'static str {
        match self {
            LockKind::Pin => "pin",
            LockKind::Pattern => "pattern",
        }
    }

    pub fn parse(value: &str) -> Result<Self> {
        match value {
            "pin" => Ok(LockKind::Pin),
            "pattern" => Ok(LockKind::Pattern),
            other => bail!("unknown lock kind {other}"),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct LockCredential {
    pub kind: LockKind,
    /// Lowercase hex digest.
    pub hash: String,
    pub updated_at: DateTime<Utc>,
}

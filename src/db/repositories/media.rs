use anyhow::{Context, Result};
use chrono::Utc;
use rusqlite::{params, Row};
use uuid::Uuid;

use crate::db::{helpers::parse_datetime, models::MediaRecord, Database};

fn row_to_media(row: &Row) -> Result<MediaRecord> {
    let created_at: String = row.get("created_at")?;

    Ok(MediaRecord {
        id: row.get("id")?,
        media_type: row.get("media_type")?,
        mime: row.get("mime")?,
        data: row.get("data")?,
        created_at: parse_datetime(&created_at, "created_at")?,
    })
}

impl Database {
    pub async fn insert_media(
        &self,
        media_type: &str,
        mime: &str,
        data: Vec<u8>,
    ) -> Result<MediaRecord> {
        let record = MediaRecord {
            id: format!("media_{}", Uuid::new_v4()),
            media_type: media_type.to_string(),
            mime: mime.to_string(),
            data,
            created_at: Utc::now(),
        };

        self.execute(move |conn| {
            conn.execute(
                "INSERT INTO media (id, media_type, mime, data, created_at)
                 VALUES (?1, ?2, ?3, ?4, ?5)",
                params![
                    record.id,
                    record.media_type,
                    record.mime,
                    record.data,
                    record.created_at.to_rfc3339(),
                ],
            )
            .with_context(|| format!("failed to insert {} media", record.media_type))?;
            Ok(record)
        })
        .await
    }

    /// All media of one type, oldest first.
    pub async fn media_by_type(&self, media_type: &str) -> Result<Vec<MediaRecord>> {
        let media_type = media_type.to_string();
        self.execute(move |conn| {
            let mut stmt = conn.prepare(
                "SELECT id, media_type, mime, data, created_at
                 FROM media
                 WHERE media_type = ?1
                 ORDER BY created_at ASC, id ASC",
            )?;

            let mut rows = stmt.query(params![media_type])?;
            let mut records = Vec::new();
            while let Some(row) = rows.next()? {
                records.push(row_to_media(row)?);
            }
            Ok(records)
        })
        .await
    }
}

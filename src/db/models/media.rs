use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

pub const PHOTO_MEDIA_TYPE: &str = "photo";

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct MediaRecord {
    pub id: String,
    pub media_type: String,
    pub mime: String,
    #[serde(skip)]
    pub data: Vec<u8>,
    pub created_at: DateTime<Utc>,
}

use anyhow::Result;
use rand::seq::SliceRandom;

use crate::db::{
    models::{MediaRecord, PHOTO_MEDIA_TYPE},
    Database,
};

/// Picks the photo shown by the home-screen gallery widget.
pub async fn random_photo(db: &Database) -> Result<Option<MediaRecord>> {
    let photos = db.media_by_type(PHOTO_MEDIA_TYPE).await?;
    Ok(photos.choose(&mut rand::thread_rng()).cloned())
}

pub mod credential;
pub mod media;

pub use credential::{LockCredential, LockKind};
pub use media::{MediaRecord, PHOTO_MEDIA_TYPE};

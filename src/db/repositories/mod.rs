pub mod credentials;
pub mod media;

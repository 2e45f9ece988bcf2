pub mod gallery;
pub mod health;
pub mod media_get;
pub mod root;
pub mod upload;

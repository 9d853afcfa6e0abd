//! Image hosting for review cover images.
//!
//! Uploads take the inline payload the client sent (a data URL or a base64
//! string) and return a durable URL plus an opaque deletion handle that is
//! stored with the review.

use async_trait::async_trait;

use crate::error::ImageHostError;

mod cloudinary;
mod memory;

pub use cloudinary::{CloudinaryConfig, CloudinaryHost, CLOUDINARY_API_BASE};
pub use memory::MemoryImageHost;

/// Result of a successful upload.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct UploadedImage {
    /// Durable HTTPS URL of the stored image
    pub url: String,
    /// Opaque handle accepted by [`ImageHost::destroy`]
    pub delete_handle: String,
}

/// External image host.
#[async_trait]
pub trait ImageHost: Send + Sync {
    /// Store an inline image payload.
    async fn upload(&self, payload: &str) -> Result<UploadedImage, ImageHostError>;

    /// Remove a previously uploaded image.
    async fn destroy(&self, delete_handle: &str) -> Result<(), ImageHostError>;
}

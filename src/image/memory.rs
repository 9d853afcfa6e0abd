//! Process-local image host used when no Cloudinary account is configured.

use std::collections::HashMap;

use async_trait::async_trait;
use tokio::sync::RwLock;
use uuid::Uuid;

use crate::error::ImageHostError;

use super::{ImageHost, UploadedImage};

/// Keeps uploaded payloads in memory and hands out `memory://` URLs.
#[derive(Default)]
pub struct MemoryImageHost {
    images: RwLock<HashMap<String, String>>,
}

impl MemoryImageHost {
    pub fn new() -> Self {
        Self::default()
    }

    /// Whether an image with this handle is currently stored.
    pub async fn contains(&self, delete_handle: &str) -> bool {
        self.images.read().await.contains_key(delete_handle)
    }

    pub async fn len(&self) -> usize {
        self.images.read().await.len()
    }

    pub async fn is_empty(&self) -> bool {
        self.images.read().await.is_empty()
    }
}

#[async_trait]
impl ImageHost for MemoryImageHost {
    async fn upload(&self, payload: &str) -> Result<UploadedImage, ImageHostError> {
        let handle = format!("covers/{}", Uuid::new_v4().simple());
        self.images
            .write()
            .await
            .insert(handle.clone(), payload.to_string());

        Ok(UploadedImage {
            url: format!("memory://images/{}", handle),
            delete_handle: handle,
        })
    }

    async fn destroy(&self, delete_handle: &str) -> Result<(), ImageHostError> {
        match self.images.write().await.remove(delete_handle) {
            Some(_) => Ok(()),
            None => Err(ImageHostError::NotFound(delete_handle.to_string())),
        }
    }
}

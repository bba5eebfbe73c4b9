//! # Uploads
//!
//! Media bytes become a `src` string outside the editing core. The editor
//! only ever sees the final string; how it was obtained is up to the
//! [`Uploader`].

use crate::errors::UploadError;
use base64::{engine::general_purpose::STANDARD, Engine};
use serde::{Deserialize, Serialize};

/// A file picked by the user
#[derive(Debug, Clone, PartialEq)]
pub struct Blob {
    pub name: String,
    pub mime_type: String,
    pub data: Vec<u8>,
}

impl Blob {
    pub fn new(name: impl Into<String>, mime_type: impl Into<String>, data: Vec<u8>) -> Self {
        Self {
            name: name.into(),
            mime_type: mime_type.into(),
            data,
        }
    }
}

/// Where an uploaded file ends up in the document
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub enum MediaKind {
    MainImage,
    Image,
    Video,
    Audio,
}

impl MediaKind {
    /// MIME type prefix accepted for this kind
    pub fn mime_prefix(self) -> &'static str {
        match self {
            MediaKind::MainImage | MediaKind::Image => "image/",
            MediaKind::Video => "video/",
            MediaKind::Audio => "audio/",
        }
    }

    pub fn accepts(self, mime_type: &str) -> bool {
        mime_type.starts_with(self.mime_prefix())
    }
}

pub trait Uploader {
    /// Stores `blob` and returns a `src` usable by a media node
    fn upload(&self, blob: &Blob) -> Result<String, UploadError>;
}

/// Inlines the file as a base64 `data:` URL. Used when no upload service
/// is configured.
#[derive(Debug, Clone, Copy, Default)]
pub struct DataUrlUploader;

impl Uploader for DataUrlUploader {
    fn upload(&self, blob: &Blob) -> Result<String, UploadError> {
        if blob.data.is_empty() {
            return Err(UploadError::Empty);
        }
        let mime_type = if blob.mime_type.is_empty() {
            "application/octet-stream"
        } else {
            &blob.mime_type
        };
        Ok(format!("data:{};base64,{}", mime_type, STANDARD.encode(&blob.data)))
    }
}

impl<F> Uploader for F
where
    F: Fn(&Blob) -> Result<String, UploadError>,
{
    fn upload(&self, blob: &Blob) -> Result<String, UploadError> {
        self(blob)
    }
}

//! Upload intake: the checks an uploaded proof-of-payment file must pass
//! before any bytes are sent to the image host.
//!
//! Files are buffered in memory only. The content type is the one the client
//! declared for the multipart part; it is compared case-sensitively against
//! [`ALLOWED_IMAGE_TYPES`].

use bytes::Bytes;

use crate::error::ValidationError;

/// Content types accepted for proof-of-payment images.
pub const ALLOWED_IMAGE_TYPES: &[&str] = &["image/jpeg", "image/png", "image/jpg"];

/// Size ceiling for an uploaded image (5 MiB).
pub const MAX_IMAGE_BYTES: usize = 5 * 1024 * 1024;

/// An uploaded file that passed intake.
#[derive(Debug, Clone)]
pub struct UploadedFile {
    file_name: Option<String>,
    content_type: String,
    data: Bytes,
}

impl UploadedFile {
    /// Run intake on a fully buffered file.
    pub fn accept(
        file_name: Option<String>,
        content_type: Option<&str>,
        data: Bytes,
    ) -> Result<Self, ValidationError> {
        let content_type = check_content_type(content_type)?;
        check_size(data.len())?;

        Ok(Self {
            file_name,
            content_type: content_type.to_string(),
            data,
        })
    }

    /// Original file name as sent by the client, if any.
    pub fn file_name(&self) -> Option<&str> {
        self.file_name.as_deref()
    }

    /// Declared content type (one of [`ALLOWED_IMAGE_TYPES`]).
    pub fn content_type(&self) -> &str {
        &self.content_type
    }

    /// File contents.
    pub fn data(&self) -> &Bytes {
        &self.data
    }

    /// Size in bytes.
    pub fn size(&self) -> usize {
        self.data.len()
    }
}

/// Check a declared content type against the allow-list.
///
/// A part with no declared type is rejected like any other unsupported type.
pub fn check_content_type(content_type: Option<&str>) -> Result<&str, ValidationError> {
    match content_type {
        Some(ct) if ALLOWED_IMAGE_TYPES.contains(&ct) => Ok(ct),
        other => Err(ValidationError::UnsupportedImageType {
            content_type: other.map(str::to_string),
        }),
    }
}

/// Check a byte count against [`MAX_IMAGE_BYTES`].
///
/// Also used while a file is still streaming in, so oversized uploads are
/// rejected without buffering the whole part.
pub fn check_size(size: usize) -> Result<(), ValidationError> {
    if size > MAX_IMAGE_BYTES {
        return Err(ValidationError::ImageTooLarge {
            size,
            max: MAX_IMAGE_BYTES,
        });
    }
    Ok(())
}

/// File extension for an accepted content type.
pub fn extension_for(content_type: &str) -> &'static str {
    match content_type {
        "image/png" => "png",
        _ => "jpg",
    }
}

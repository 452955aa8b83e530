//! Multipart form collection for the image-bearing entities.

use std::collections::HashMap;

use axum::extract::Multipart;
use bytes::Bytes;

use crate::application::media::{ImageChange, InboundImage};
use crate::infra::http::error::ApiError;

const IMAGE_FIELD: &str = "image";
const IMAGE_URL_FIELD: &str = "image_url";

/// Text fields plus at most one inbound image binary.
pub struct MultipartForm {
    fields: HashMap<String, String>,
    image: Option<InboundImage>,
}

impl MultipartForm {
    pub async fn read(mut multipart: Multipart) -> Result<Self, ApiError> {
        let mut fields = HashMap::new();
        let mut image = None;

        while let Some(field) = multipart
            .next_field()
            .await
            .map_err(|err| ApiError::bad_request(format!("malformed multipart body: {err}")))?
        {
            let Some(name) = field.name().map(str::to_string) else {
                continue;
            };

            if name == IMAGE_FIELD && field.file_name().is_some() {
                let filename = field.file_name().unwrap_or("upload").to_string();
                let content_type = field
                    .content_type()
                    .unwrap_or("application/octet-stream")
                    .to_string();
                let data: Bytes = field.bytes().await.map_err(|err| {
                    ApiError::bad_request(format!("failed to read image field: {err}"))
                })?;
                image = Some(InboundImage {
                    filename,
                    content_type,
                    data,
                });
            } else {
                let value = field.text().await.map_err(|err| {
                    ApiError::bad_request(format!("failed to read field `{name}`: {err}"))
                })?;
                fields.insert(name, value);
            }
        }

        Ok(Self { fields, image })
    }

    pub fn text(&self, name: &str) -> Option<&str> {
        self.fields.get(name).map(String::as_str)
    }

    pub fn required(&self, name: &str) -> Result<String, ApiError> {
        self.text(name)
            .map(str::to_string)
            .ok_or_else(|| ApiError::bad_request(format!("missing field `{name}`")))
    }

    pub fn optional(&self, name: &str) -> Option<String> {
        self.text(name)
            .map(str::trim)
            .filter(|value| !value.is_empty())
            .map(str::to_string)
    }

    pub fn flag(&self, name: &str) -> bool {
        matches!(self.text(name), Some("true") | Some("1"))
    }

    pub fn int(&self, name: &str) -> Result<i32, ApiError> {
        self.required(name)?
            .parse()
            .map_err(|_| ApiError::bad_request(format!("field `{name}` must be an integer")))
    }

    /// A list field: a JSON array when it parses as one, otherwise
    /// comma-separated text.
    pub fn list(&self, name: &str) -> Vec<String> {
        let Some(raw) = self.text(name) else {
            return Vec::new();
        };

        if let Ok(items) = serde_json::from_str::<Vec<String>>(raw) {
            return items;
        }

        raw.split(',')
            .map(str::trim)
            .filter(|item| !item.is_empty())
            .map(str::to_string)
            .collect()
    }

    pub fn take_image(&mut self) -> Option<InboundImage> {
        self.image.take()
    }

    /// The update-time image intent: a new binary replaces, an explicitly
    /// blanked `image_url` clears, anything else keeps the current asset.
    pub fn image_change(&mut self) -> ImageChange {
        if let Some(image) = self.image.take() {
            return ImageChange::Replace(image);
        }
        match self.text(IMAGE_URL_FIELD) {
            Some(value) if value.trim().is_empty() => ImageChange::Clear,
            _ => ImageChange::Keep,
        }
    }
}

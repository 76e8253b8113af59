//! Multipart intake for property forms and coercion of the text fields into typed input.

use std::collections::HashMap;
use std::str::FromStr;

use axum::extract::Multipart;

use crate::attachments::{check_upload, AttachmentStore, StoredUpload, MAX_FILES_PER_REQUEST};
use crate::error::{Error, Result};
use crate::models::{PropertyChanges, PropertyDraft};
use crate::store::codec::split_tag_values;

const AMBIENTES_KEYS: &[&str] = &["ambiente", "ambientes"];
const SERVICES_KEYS: &[&str] = &["servicio", "services"];

/// Text fields of a form, keeping every value of repeated keys in arrival order.
#[derive(Debug, Clone, Default)]
pub struct FormFields(HashMap<String, Vec<String>>);

/// A fully received multipart request: text fields plus files already on disk.
#[derive(Debug)]
pub struct PropertyForm {
    pub fields: FormFields,
    pub uploads: Vec<StoredUpload>,
}

/// Reads the whole multipart body, storing accepted files as they arrive. If anything is
/// rejected, files stored so far are discarded before the error is returned.
pub async fn read_property_form(
    mut multipart: Multipart,
    attachments: &AttachmentStore,
) -> Result<PropertyForm> {
    let mut fields = FormFields::default();
    let mut uploads = Vec::new();

    if let Err(e) = collect(&mut multipart, attachments, &mut fields, &mut uploads).await {
        attachments.discard(&uploads).await;
        return Err(e);
    }

    Ok(PropertyForm { fields, uploads })
}

async fn collect(
    multipart: &mut Multipart,
    attachments: &AttachmentStore,
    fields: &mut FormFields,
    uploads: &mut Vec<StoredUpload>,
) -> Result<()> {
    while let Some(mut field) = multipart.next_field().await.map_err(malformed)? {
        let name = field.name().unwrap_or_default().to_string();

        let Some(original_name) = field.file_name().map(str::to_string) else {
            let text = field.text().await.map_err(malformed)?;
            fields.push(name, text);
            continue;
        };
        // Browsers send an empty part for an untouched file input.
        if original_name.is_empty() {
            continue;
        }

        if uploads.len() >= MAX_FILES_PER_REQUEST {
            return Err(Error::validation(format!(
                "At most {MAX_FILES_PER_REQUEST} files may be uploaded at once."
            )));
        }
        let mime_type = field.content_type().unwrap_or_default().to_string();
        check_upload(&name, &original_name, &mime_type, 0)?;

        let mut bytes = Vec::new();
        while let Some(chunk) = field.chunk().await.map_err(malformed)? {
            check_upload(&name, &original_name, &mime_type, bytes.len() + chunk.len())?;
            bytes.extend_from_slice(&chunk);
        }

        let upload = attachments
            .save(&name, &original_name, &mime_type, &bytes)
            .await?;
        uploads.push(upload);
    }

    Ok(())
}

fn malformed(e: axum::extract::multipart::MultipartError) -> Error {
    Error::validation(format!("Malformed multipart body: {}", e.body_text()))
}

impl FormFields {
    pub fn push(&mut self, key: impl Into<String>, value: impl Into<String>) {
        self.0.entry(key.into()).or_default().push(value.into());
    }

    /// First non-blank value of `key`.
    pub fn text(&self, key: &str) -> Option<String> {
        self.0
            .get(key)?
            .iter()
            .find(|v| !v.trim().is_empty())
            .cloned()
    }

    fn number<T: FromStr>(&self, key: &str, kind: &str) -> Result<Option<T>> {
        match self.text(key) {
            Some(raw) => raw
                .trim()
                .parse()
                .map(Some)
                .map_err(|_| Error::validation(format!("Field '{key}' must be {kind}."))),
            None => Ok(None),
        }
    }

    fn decimal(&self, key: &str) -> Result<Option<f64>> {
        let value: Option<f64> = self.number(key, "a number")?;
        match value {
            Some(v) if !v.is_finite() => Err(Error::validation(format!(
                "Field '{key}' must be a number."
            ))),
            other => Ok(other),
        }
    }

    fn integer(&self, key: &str) -> Result<Option<i64>> {
        self.number(key, "a whole number")
    }

    /// Tags from any of `keys`, or `None` when none of them was sent.
    fn tags(&self, keys: &[&str]) -> Option<Vec<String>> {
        let mut present = false;
        let mut values = Vec::new();
        for key in keys {
            if let Some(v) = self.0.get(*key) {
                present = true;
                values.extend(v.iter().map(String::as_str));
            }
        }
        present.then(|| split_tag_values(values))
    }

    /// Coerces a create form. `userId` names the owner; otherwise `default_owner` is used.
    pub fn to_draft(&self, default_owner: i64) -> Result<PropertyDraft> {
        Ok(PropertyDraft {
            property_type: self.text("type"),
            price: self.decimal("price")?,
            barrio: self.text("barrio"),
            street_type: self.text("streetType"),
            city: self.text("city"),
            province: self.text("province"),
            zonificacion: self.text("zonificacion"),
            condition: self.text("condition"),
            situation: self.text("situation"),
            antiquity: self.integer("antiquity")?,
            surface: self.decimal("surface")?,
            covered_surface: self.decimal("coveredSurface")?,
            urbanization: self.text("urbanization"),
            security: self.text("security"),
            description: self.text("description"),
            ambientes: self.tags(AMBIENTES_KEYS).unwrap_or_default(),
            services: self.tags(SERVICES_KEYS).unwrap_or_default(),
            user_id: self.integer("userId")?.unwrap_or(default_owner),
        })
    }

    /// Coerces an update form. `userId` is ignored: owners never change.
    pub fn to_changes(&self) -> Result<PropertyChanges> {
        Ok(PropertyChanges {
            property_type: self.text("type"),
            price: self.decimal("price")?,
            barrio: self.text("barrio"),
            street_type: self.text("streetType"),
            city: self.text("city"),
            province: self.text("province"),
            zonificacion: self.text("zonificacion"),
            condition: self.text("condition"),
            situation: self.text("situation"),
            antiquity: self.integer("antiquity")?,
            surface: self.decimal("surface")?,
            covered_surface: self.decimal("coveredSurface")?,
            urbanization: self.text("urbanization"),
            security: self.text("security"),
            description: self.text("description"),
            ambientes: self.tags(AMBIENTES_KEYS),
            services: self.tags(SERVICES_KEYS),
            existing_media: self.text("mediaUrls"),
        })
    }
}

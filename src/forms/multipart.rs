use std::collections::HashMap;

use axum::extract::Multipart;
use bytes::Bytes;

use crate::error::AppResult;

#[derive(Debug, Clone)]
pub struct UploadedFile {
    pub field: String,
    pub file_name: String,
    pub data: Bytes,
}

impl UploadedFile {
    pub fn size(&self) -> usize {
        self.data.len()
    }
}

/// A multipart body split into its text fields and file parts.
#[derive(Debug, Default)]
pub struct MultipartData {
    fields: HashMap<String, Vec<String>>,
    files: Vec<UploadedFile>,
}

impl MultipartData {
    /// Drain the request body. File inputs that were left empty by the browser
    /// (no file name, no bytes) are skipped.
    pub async fn collect(mut multipart: Multipart) -> AppResult<Self> {
        let mut data = MultipartData::default();

        while let Some(field) = multipart.next_field().await? {
            let name = field.name().unwrap_or_default().to_string();
            match field.file_name().map(str::to_string) {
                Some(file_name) => {
                    let bytes = field.bytes().await?;
                    if file_name.is_empty() && bytes.is_empty() {
                        continue;
                    }
                    data.files.push(UploadedFile {
                        field: name,
                        file_name,
                        data: bytes,
                    });
                }
                None => {
                    let text = field.text().await?;
                    data.fields.entry(name).or_default().push(text);
                }
            }
        }

        Ok(data)
    }

    /// First value of a text field, empty when absent.
    pub fn text(&self, name: &str) -> String {
        self.fields
            .get(name)
            .and_then(|values| values.first())
            .cloned()
            .unwrap_or_default()
    }

    pub fn checked(&self, name: &str) -> bool {
        self.fields.contains_key(name)
    }

    pub fn files(&self, field: &str) -> Vec<UploadedFile> {
        self.files
            .iter()
            .filter(|f| f.field == field)
            .cloned()
            .collect()
    }

    pub fn file(&self, field: &str) -> Option<UploadedFile> {
        self.files.iter().find(|f| f.field == field).cloned()
    }

    #[cfg(test)]
    pub fn from_parts(fields: &[(&str, &str)], files: Vec<UploadedFile>) -> Self {
        let mut data = MultipartData {
            files,
            ..Default::default()
        };
        for (name, value) in fields {
            data.fields
                .entry(name.to_string())
                .or_default()
                .push(value.to_string());
        }
        data
    }
}

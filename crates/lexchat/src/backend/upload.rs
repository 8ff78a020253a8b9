//! Files selected for upload and their multipart form

use anyhow::{Context, Result};
use std::path::Path;
use ureq::unversioned::multipart::{Form, Part};

/// A file chosen by the user, held in memory for upload
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct UploadFile {
    /// Display name, e.g. `contract.pdf`
    pub name: String,
    pub bytes: Vec<u8>,
}

impl UploadFile {
    pub fn new(name: impl Into<String>, bytes: Vec<u8>) -> Self {
        Self {
            name: name.into(),
            bytes,
        }
    }

    /// Read a file from disk, using its file name as the display name
    pub fn from_path(path: impl AsRef<Path>) -> Result<Self> {
        let path = path.as_ref();
        let name = path
            .file_name()
            .map(|n| n.to_string_lossy().into_owned())
            .with_context(|| format!("Not a file path: {}", path.display()))?;
        let bytes = std::fs::read(path).with_context(|| format!("Failed to read {}", path.display()))?;
        Ok(Self { name, bytes })
    }

    /// MIME type guessed from the file extension
    pub fn content_type(&self) -> String {
        mime_guess::from_path(&self.name)
            .first_or_octet_stream()
            .essence_str()
            .to_string()
    }

    /// File name as sent in the part header
    ///
    /// Quotes and line breaks would end the header early.
    pub fn header_file_name(&self) -> String {
        self.name
            .chars()
            .map(|c| match c {
                '"' => '\'',
                '\r' | '\n' => ' ',
                c => c,
            })
            .collect()
    }

    /// Single-part `multipart/form-data` form carrying this file under `field`
    pub(crate) fn multipart_form<'a>(&'a self, field: &'a str) -> Result<Form<'a>> {
        let part = Part::bytes(&self.bytes)
            .file_name(&self.header_file_name())
            .mime_str(&self.content_type())
            .with_context(|| format!("Unusable content type for {}", self.name))?;
        Ok(Form::new().part(field, part))
    }
}

//! Upload intake.
//!
//! Streams the `person` and `cloth` multipart fields of an incoming request
//! into uniquely named files under the upload directory. Each stored file is
//! owned by an [`UploadedPart`]; dropping the part removes the file, and
//! [`Uploads::cleanup`] removes them explicitly so failures can be logged.

use std::path::Path;

use axum::extract::multipart::{Field, MultipartError};
use axum::extract::{FromRequest, Multipart, Request};
use tempfile::TempPath;
use tokio::io::AsyncWriteExt;

use crate::observability::metrics;
use crate::relay::error::RelayError;

pub const PERSON_FIELD: &str = "person";
pub const CLOTH_FIELD: &str = "cloth";

/// The two recognised upload fields.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PartKind {
    Person,
    Cloth,
}

impl PartKind {
    pub fn from_field(name: &str) -> Option<Self> {
        match name {
            PERSON_FIELD => Some(PartKind::Person),
            CLOTH_FIELD => Some(PartKind::Cloth),
            _ => None,
        }
    }

    pub fn field_name(&self) -> &'static str {
        match self {
            PartKind::Person => PERSON_FIELD,
            PartKind::Cloth => CLOTH_FIELD,
        }
    }
}

/// One received file, stored on disk for the duration of the request.
#[derive(Debug)]
pub struct UploadedPart {
    kind: PartKind,
    file_name: String,
    content_type: Option<String>,
    size: u64,
    path: TempPath,
}

impl UploadedPart {
    pub fn kind(&self) -> PartKind {
        self.kind
    }

    /// Client-supplied filename, or the field name when none was sent.
    pub fn file_name(&self) -> &str {
        &self.file_name
    }

    pub fn content_type(&self) -> Option<&str> {
        self.content_type.as_deref()
    }

    pub fn size(&self) -> u64 {
        self.size
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    fn discard(self) -> std::io::Result<()> {
        self.path.close()
    }
}

/// Uploads received by a single request.
#[derive(Debug, Default)]
pub struct Uploads {
    person: Option<UploadedPart>,
    cloth: Option<UploadedPart>,
}

impl Uploads {
    pub fn get(&self, kind: PartKind) -> Option<&UploadedPart> {
        match kind {
            PartKind::Person => self.person.as_ref(),
            PartKind::Cloth => self.cloth.as_ref(),
        }
    }

    /// Both parts, or `None` if either is missing.
    pub fn pair(&self) -> Option<(&UploadedPart, &UploadedPart)> {
        Some((self.person.as_ref()?, self.cloth.as_ref()?))
    }

    pub fn len(&self) -> usize {
        self.person.is_some() as usize + self.cloth.is_some() as usize
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    fn insert(&mut self, part: UploadedPart) {
        match part.kind {
            PartKind::Person => self.person = Some(part),
            PartKind::Cloth => self.cloth = Some(part),
        }
    }

    /// Delete every stored file. Failures are logged and otherwise ignored.
    pub fn cleanup(self) {
        for part in [self.person, self.cloth].into_iter().flatten() {
            let path = part.path().to_path_buf();
            let field = part.kind.field_name();
            match part.discard() {
                Ok(()) => tracing::trace!(field, path = ?path, "Removed temporary upload"),
                Err(e) => tracing::warn!(field, path = ?path, error = %e, "Failed to remove temporary upload"),
            }
        }
    }
}

/// Read the multipart body of `request` into temporary files under `dir`.
///
/// A request whose body is not multipart yields no uploads rather than an
/// error; the caller decides whether missing parts are acceptable. On
/// failure every file written so far is removed before returning.
pub async fn collect_uploads(request: Request, dir: &Path) -> Result<Uploads, RelayError> {
    let mut multipart = match Multipart::from_request(request, &()).await {
        Ok(multipart) => multipart,
        Err(rejection) => {
            tracing::debug!(reason = %rejection, "Request body is not multipart, no uploads received");
            return Ok(Uploads::default());
        }
    };

    let mut uploads = Uploads::default();
    match read_parts(&mut multipart, dir, &mut uploads).await {
        Ok(()) => Ok(uploads),
        Err(e) => {
            uploads.cleanup();
            Err(e)
        }
    }
}

async fn read_parts(multipart: &mut Multipart, dir: &Path, uploads: &mut Uploads) -> Result<(), RelayError> {
    while let Some(field) = multipart.next_field().await.map_err(invalid_multipart)? {
        let Some(kind) = field.name().and_then(PartKind::from_field) else {
            continue;
        };
        if uploads.get(kind).is_some() {
            tracing::debug!(field = kind.field_name(), "Ignoring duplicate upload field");
            continue;
        }
        let part = store_field(kind, field, dir).await?;
        uploads.insert(part);
    }
    Ok(())
}

async fn store_field(kind: PartKind, mut field: Field<'_>, dir: &Path) -> Result<UploadedPart, RelayError> {
    let file_name = field
        .file_name()
        .filter(|name| !name.is_empty())
        .unwrap_or(kind.field_name())
        .to_string();
    let content_type = field.content_type().map(str::to_string);

    let (file, path) = tempfile::Builder::new()
        .prefix("upload-")
        .tempfile_in(dir)
        .map_err(RelayError::TempStorage)?
        .into_parts();
    let mut file = tokio::fs::File::from_std(file);

    let mut size = 0u64;
    while let Some(chunk) = field.chunk().await.map_err(invalid_multipart)? {
        size += chunk.len() as u64;
        file.write_all(&chunk).await.map_err(RelayError::TempStorage)?;
    }
    file.flush().await.map_err(RelayError::TempStorage)?;

    tracing::debug!(
        field = kind.field_name(),
        file_name = %file_name,
        size,
        path = ?path,
        "Stored upload"
    );
    metrics::record_upload(kind.field_name(), size);

    Ok(UploadedPart {
        kind,
        file_name,
        content_type,
        size,
        path,
    })
}

fn invalid_multipart(e: MultipartError) -> RelayError {
    RelayError::InvalidMultipart {
        status: e.status(),
        message: format!("invalid multipart body: {}", e.body_text()),
    }
}

//! Local file ingestion: images and videos become data URIs in the document.
//!
//! Reading happens in an [`IngestTask`] the host drives to completion; the
//! result goes back through [`Editor::complete_ingest`](crate::Editor::complete_ingest),
//! which inserts the node in one step. Every task holds a child of the
//! editor's lifetime token, so tearing the editor down (or replacing its
//! content) turns outstanding tasks into no-ops.

use std::future::Future;
use std::io;
use std::path::{Path, PathBuf};

use base64::{Engine, engine::general_purpose::STANDARD};
use bytes::Bytes;
use mime_sniffer::MimeTypeSniffer;
use tokio_util::sync::CancellationToken;

use crate::error::MediaError;

/// A file the user picked.
pub trait MediaSource {
    /// Display name, used in error messages.
    fn name(&self) -> &str;

    /// MIME type declared by the picker, if any.
    fn mime_type(&self) -> Option<&str>;

    fn read(&self) -> impl Future<Output = io::Result<Bytes>>;
}

/// A file already held in memory.
#[derive(Clone, Debug)]
pub struct InMemoryFile {
    name: String,
    mime_type: Option<String>,
    data: Bytes,
}

impl InMemoryFile {
    pub fn new(name: impl Into<String>, data: impl Into<Bytes>) -> Self {
        Self {
            name: name.into(),
            mime_type: None,
            data: data.into(),
        }
    }

    pub fn with_mime_type(mut self, mime_type: impl Into<String>) -> Self {
        self.mime_type = Some(mime_type.into());
        self
    }
}

impl MediaSource for InMemoryFile {
    fn name(&self) -> &str {
        &self.name
    }

    fn mime_type(&self) -> Option<&str> {
        self.mime_type.as_deref()
    }

    async fn read(&self) -> io::Result<Bytes> {
        Ok(self.data.clone())
    }
}

/// A file on disk. The declared type is guessed from the extension.
#[derive(Clone, Debug)]
pub struct FsFile {
    path: PathBuf,
    name: String,
    mime_type: Option<String>,
}

impl FsFile {
    pub fn new(path: impl AsRef<Path>) -> Self {
        let path = path.as_ref().to_owned();
        let name = path
            .file_name()
            .map(|n| n.to_string_lossy().into_owned())
            .unwrap_or_else(|| path.display().to_string());
        let mime_type = mime_guess::from_path(&path).first_raw().map(str::to_owned);
        Self {
            path,
            name,
            mime_type,
        }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }
}

impl MediaSource for FsFile {
    fn name(&self) -> &str {
        &self.name
    }

    fn mime_type(&self) -> Option<&str> {
        self.mime_type.as_deref()
    }

    async fn read(&self) -> io::Result<Bytes> {
        tokio::fs::read(&self.path).await.map(Bytes::from)
    }
}

/// Which node a finished read turns into.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum MediaKind {
    Image,
    Video,
}

/// Encode bytes as a `data:` URI.
pub fn data_uri(mime_type: &str, data: &[u8]) -> String {
    format!("data:{};base64,{}", mime_type, STANDARD.encode(data))
}

/// The declared type, or whatever the bytes look like.
fn resolve_mime_type(declared: Option<&str>, data: &Bytes) -> String {
    declared
        .filter(|m| !m.trim().is_empty())
        .or_else(|| data.sniff_mime_type())
        .unwrap_or("application/octet-stream")
        .to_string()
}

/// An in-flight file read.
#[derive(Debug)]
pub struct IngestTask<S> {
    kind: MediaKind,
    source: S,
    token: CancellationToken,
}

impl<S: MediaSource> IngestTask<S> {
    pub(crate) fn new(kind: MediaKind, source: S, token: CancellationToken) -> Self {
        Self {
            kind,
            source,
            token,
        }
    }

    pub fn kind(&self) -> MediaKind {
        self.kind
    }

    /// Read the file. Resolves to [`MediaError::Cancelled`] as soon as the
    /// owning editor is torn down.
    pub async fn run(self) -> Result<Ingested, MediaError> {
        let read = tokio::select! {
            biased;
            _ = self.token.cancelled() => return Err(MediaError::Cancelled),
            read = self.source.read() => read,
        };
        let data = read.map_err(|source| MediaError::Read {
            name: self.source.name().to_owned(),
            source,
        })?;

        let mime_type = resolve_mime_type(self.source.mime_type(), &data);
        tracing::debug!(
            name = self.source.name(),
            mime_type,
            bytes = data.len(),
            "media file read"
        );
        Ok(Ingested {
            kind: self.kind,
            name: self.source.name().to_owned(),
            src: data_uri(&mime_type, &data),
            token: self.token,
        })
    }
}

/// A finished read waiting to be inserted.
#[derive(Debug)]
pub struct Ingested {
    pub(crate) kind: MediaKind,
    pub(crate) name: String,
    pub(crate) src: String,
    pub(crate) token: CancellationToken,
}

impl Ingested {
    pub fn kind(&self) -> MediaKind {
        self.kind
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    /// The data URI that will become the node's `src`.
    pub fn src(&self) -> &str {
        &self.src
    }

    pub fn is_cancelled(&self) -> bool {
        self.token.is_cancelled()
    }
}

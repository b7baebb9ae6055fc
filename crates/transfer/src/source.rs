use std::io::SeekFrom;
use std::path::{Path, PathBuf};

use bytes::Bytes;
use partwise_protocol::constants::DEFAULT_CONTENT_TYPE;
use tokio::io::{AsyncReadExt, AsyncSeekExt};

use crate::TransferError;
use crate::plan::PartSpec;

/// The bytes behind an upload: a file on disk or an in-memory buffer.
#[derive(Debug, Clone)]
pub struct UploadSource {
    file_name: String,
    content_type: String,
    size: u64,
    data: SourceData,
}

#[derive(Debug, Clone)]
enum SourceData {
    File(PathBuf),
    Memory(Bytes),
}

impl UploadSource {
    /// Opens a file source. The size is captured now and every part read
    /// is checked against it.
    pub async fn open(path: &Path) -> Result<Self, TransferError> {
        let metadata = tokio::fs::metadata(path).await?;
        if !metadata.is_file() {
            return Err(TransferError::Io(std::io::Error::new(
                std::io::ErrorKind::InvalidInput,
                format!("not a regular file: {}", path.display()),
            )));
        }

        let file_name = path
            .file_name()
            .map(|n| n.to_string_lossy().into_owned())
            .unwrap_or_default();
        let content_type = detect_content_type(&file_name).to_string();

        Ok(Self {
            file_name,
            content_type,
            size: metadata.len(),
            data: SourceData::File(path.to_path_buf()),
        })
    }

    /// Wraps an in-memory buffer.
    pub fn from_bytes(
        file_name: impl Into<String>,
        content_type: impl Into<String>,
        data: impl Into<Bytes>,
    ) -> Self {
        let data = data.into();
        Self {
            file_name: file_name.into(),
            content_type: content_type.into(),
            size: data.len() as u64,
            data: SourceData::Memory(data),
        }
    }

    /// Overrides the detected content type.
    pub fn with_content_type(mut self, content_type: impl Into<String>) -> Self {
        self.content_type = content_type.into();
        self
    }

    pub fn file_name(&self) -> &str {
        &self.file_name
    }

    pub fn content_type(&self) -> &str {
        &self.content_type
    }

    /// Total size in bytes.
    pub fn size(&self) -> u64 {
        self.size
    }

    /// Reads exactly the bytes `[offset, offset + length)` of `part`.
    pub async fn read_part(&self, part: &PartSpec) -> Result<Bytes, TransferError> {
        if part.end() > self.size {
            return Err(TransferError::OutOfRange {
                part_number: part.part_number,
                size: self.size,
            });
        }

        match &self.data {
            SourceData::Memory(data) => Ok(data.slice(part.offset as usize..part.end() as usize)),
            SourceData::File(path) => {
                let mut file = tokio::fs::File::open(path).await?;
                file.seek(SeekFrom::Start(part.offset)).await?;
                let mut buf = vec![0u8; part.length as usize];
                // A file that shrank since `open` surfaces as UnexpectedEof.
                file.read_exact(&mut buf).await?;
                Ok(Bytes::from(buf))
            }
        }
    }
}

/// Guesses a MIME type from a file name's extension.
pub fn detect_content_type(path: &str) -> &'static str {
    let ext = Path::new(path)
        .extension()
        .and_then(|e| e.to_str())
        .map(|e| e.to_lowercase());

    match ext.as_deref() {
        Some("mp4" | "m4v") => "video/mp4",
        Some("mov") => "video/quicktime",
        Some("webm") => "video/webm",
        Some("mkv") => "video/x-matroska",
        Some("avi") => "video/x-msvideo",
        Some("mpeg" | "mpg") => "video/mpeg",
        Some("png") => "image/png",
        Some("jpg" | "jpeg") => "image/jpeg",
        Some("gif") => "image/gif",
        Some("zip") => "application/zip",
        _ => DEFAULT_CONTENT_TYPE,
    }
}

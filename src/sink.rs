//! Output delivery for assembled containers.
//!
//! Both operations borrow a finished [`ContainerBuffer`] and never mutate
//! it, so one assembly can be saved locally and transmitted any number of
//! times. Only a successful [`AnimMux::assemble`](crate::AnimMux::assemble)
//! produces a [`ContainerBuffer`], so neither operation can observe an
//! unfinished container.

use std::fs;
use std::io;
use std::path::Path;

use thiserror::Error;
use tracing::debug;

use crate::assemble::ContainerBuffer;

/// Errors from persisting or transmitting a container.
#[derive(Debug, Error)]
#[non_exhaustive]
pub enum SinkError {
    /// Filesystem write failed.
    #[error("Write failed: {0}")]
    Io(#[from] io::Error),

    /// The HTTP request could not be completed.
    #[cfg(feature = "upload")]
    #[error("Upload failed: {0}")]
    Http(#[from] reqwest::Error),

    /// The server answered with a non-success status.
    #[cfg(feature = "upload")]
    #[error("Upload rejected with status {status}")]
    BadStatus {
        /// HTTP status code of the rejection.
        status: u16,
        /// Response body text, as far as it could be read.
        body: String,
    },
}

/// Write the container to a local file.
pub fn persist(buffer: &ContainerBuffer, path: impl AsRef<Path>) -> Result<(), SinkError> {
    let path = path.as_ref();
    fs::write(path, buffer.as_bytes())?;
    debug!(bytes = buffer.len(), path = %path.display(), "container persisted");
    Ok(())
}

/// Destination and form layout for a multipart upload.
#[cfg(feature = "upload")]
#[derive(Debug, Clone)]
pub struct UploadRequest {
    /// Target URL.
    pub destination: String,
    /// Multipart field name carrying the container.
    pub field_name: String,
    /// File name reported for the container part.
    pub file_name: String,
    /// Additional plain form fields sent alongside the file.
    pub extra_fields: Vec<(String, String)>,
}

#[cfg(feature = "upload")]
impl UploadRequest {
    /// A request for the given destination with the field name `file` and
    /// the file name `animation.webp`.
    pub fn new(destination: impl Into<String>) -> Self {
        Self {
            destination: destination.into(),
            field_name: "file".into(),
            file_name: "animation.webp".into(),
            extra_fields: Vec::new(),
        }
    }

    /// Set the multipart field name carrying the container.
    pub fn field_name(mut self, name: impl Into<String>) -> Self {
        self.field_name = name.into();
        self
    }

    /// Set the file name reported for the container part.
    pub fn file_name(mut self, name: impl Into<String>) -> Self {
        self.file_name = name.into();
        self
    }

    /// Add a plain form field.
    pub fn field(mut self, key: impl Into<String>, value: impl Into<String>) -> Self {
        self.extra_fields.push((key.into(), value.into()));
        self
    }
}

/// Server response to a completed upload.
#[cfg(feature = "upload")]
#[derive(Debug, Clone)]
pub struct UploadReceipt {
    /// HTTP status code.
    pub status: u16,
    /// Response body text.
    pub body: String,
}

/// Reader adapter that reports the fraction of bytes handed to the
/// transport.
#[cfg(feature = "upload")]
struct ProgressReader<F> {
    cursor: io::Cursor<Vec<u8>>,
    total: u64,
    sent: u64,
    on_progress: F,
}

#[cfg(feature = "upload")]
impl<F: FnMut(f32)> io::Read for ProgressReader<F> {
    fn read(&mut self, buf: &mut [u8]) -> io::Result<usize> {
        let n = io::Read::read(&mut self.cursor, buf)?;
        self.sent += n as u64;
        (self.on_progress)(self.sent as f32 / self.total as f32);
        Ok(n)
    }
}

/// Upload the container as one multipart POST.
///
/// `on_progress` observes the fraction of container bytes handed to the
/// transport, monotonically non-decreasing and ending at `1.0`. Success and
/// failure surface through the returned result; a non-2xx response is an
/// error carrying the status and response body.
#[cfg(feature = "upload")]
pub fn transmit<F>(
    buffer: &ContainerBuffer,
    request: &UploadRequest,
    on_progress: F,
) -> Result<UploadReceipt, SinkError>
where
    F: FnMut(f32) + Send + 'static,
{
    use reqwest::blocking::multipart::{Form, Part};

    let total = buffer.len() as u64;
    let reader = ProgressReader {
        cursor: io::Cursor::new(buffer.as_bytes().to_vec()),
        total: total.max(1),
        sent: 0,
        on_progress,
    };

    let part = Part::reader_with_length(reader, total)
        .file_name(request.file_name.clone())
        .mime_str("image/webp")?;

    let mut form = Form::new().part(request.field_name.clone(), part);
    for (key, value) in &request.extra_fields {
        form = form.text(key.clone(), value.clone());
    }

    let client = reqwest::blocking::Client::builder().build()?;
    let response = client.post(&request.destination).multipart(form).send()?;

    let status = response.status();
    let body = response.text()?;
    if !status.is_success() {
        return Err(SinkError::BadStatus {
            status: status.as_u16(),
            body,
        });
    }

    debug!(bytes = total, status = status.as_u16(), "container transmitted");
    Ok(UploadReceipt {
        status: status.as_u16(),
        body,
    })
}

use std::ffi::OsStr;
use std::path::Path;

use axum::body::Body;
use axum::http::{header, Request};
use bytes::BytesMut;
use futures_util::TryStreamExt;
use multer::{Constraints, Multipart, SizeLimit};
use serde::Serialize;
use thiserror::Error;
use tokio::io::AsyncWriteExt;

use crate::error::ToolkitError;
use crate::files::create_dir_if_not_exist;
use crate::random::secure_token;
use crate::sniff::{detect_content_type, SNIFF_LEN};
use crate::Toolkit;

/// Length of the random token used when uploads are renamed on store.
const RENAME_TOKEN_LEN: usize = 25;

/// One accepted file from a multipart upload.
#[derive(Debug, Clone, Serialize)]
pub struct UploadedFile {
    /// Name the file was stored under in the destination directory.
    pub new_name: String,
    /// Filename the client supplied.
    pub original_name: String,
    /// Exact number of bytes written to disk.
    pub size: u64,
}

/// An upload batch failure, carrying the records that were already stored.
///
/// The batch is all-or-nothing past the first failing file, but files
/// written before the failure stay on disk; `stored` tells the caller which
/// ones, so it can clean up or keep them. A non-empty `stored` with an error
/// always means the upload set is incomplete.
#[derive(Debug, Error)]
#[error("{source}")]
pub struct UploadError {
    pub stored: Vec<UploadedFile>,
    #[source]
    pub source: ToolkitError,
}

impl Toolkit {
    /// Stores every file part of a `multipart/form-data` request into
    /// `upload_dir`, creating the directory if needed.
    ///
    /// The whole request body is capped at the configured upload limit and
    /// each file's content type is sniffed from its first 512 bytes before
    /// anything is written. With `rename` set, files are stored under a
    /// 25-character random token plus the original extension; otherwise the
    /// client filename is used verbatim and the caller accepts the collision
    /// and traversal risk that implies.
    ///
    /// Processing stops at the first failing file.
    pub async fn upload_files(
        &self,
        req: Request<Body>,
        upload_dir: impl AsRef<Path>,
        rename: bool,
    ) -> Result<Vec<UploadedFile>, UploadError> {
        let mut stored = Vec::new();
        match self
            .run_upload(req, upload_dir.as_ref(), rename, &mut stored)
            .await
        {
            Ok(()) => Ok(stored),
            Err(source) => Err(UploadError { stored, source }),
        }
    }

    /// Single-file convenience wrapper around [`Toolkit::upload_files`].
    ///
    /// Returns the first stored record, or an error when the request holds
    /// no file part at all.
    pub async fn upload_file(
        &self,
        req: Request<Body>,
        upload_dir: impl AsRef<Path>,
        rename: bool,
    ) -> Result<UploadedFile, UploadError> {
        let mut files = self.upload_files(req, upload_dir, rename).await?;
        if files.is_empty() {
            return Err(UploadError {
                stored: files,
                source: ToolkitError::NoFileInRequest,
            });
        }
        Ok(files.remove(0))
    }

    async fn run_upload(
        &self,
        req: Request<Body>,
        upload_dir: &Path,
        rename: bool,
        stored: &mut Vec<UploadedFile>,
    ) -> Result<(), ToolkitError> {
        let boundary = req
            .headers()
            .get(header::CONTENT_TYPE)
            .and_then(|ct| ct.to_str().ok())
            .and_then(|ct| multer::parse_boundary(ct).ok())
            .ok_or(ToolkitError::InvalidMultipartBoundary)?;

        create_dir_if_not_exist(upload_dir).await?;

        let limit = self.config.effective_max_upload_bytes();
        let stream = req
            .into_body()
            .into_data_stream()
            .map_err(|err| std::io::Error::new(std::io::ErrorKind::Other, err));
        let constraints =
            Constraints::new().size_limit(SizeLimit::new().whole_stream(limit));
        let mut multipart = Multipart::with_constraints(stream, boundary, constraints);

        while let Some(mut field) = multipart
            .next_field()
            .await
            .map_err(|err| map_multer_error(err, limit))?
        {
            // Only fields carrying a filename are file parts.
            let Some(original_name) = field.file_name().map(str::to_owned) else {
                continue;
            };

            // Buffer enough of the part to sniff its real content type
            // before anything touches the disk.
            let mut head = BytesMut::with_capacity(SNIFF_LEN);
            while head.len() < SNIFF_LEN {
                match field
                    .chunk()
                    .await
                    .map_err(|err| map_multer_error(err, limit))?
                {
                    Some(chunk) => head.extend_from_slice(&chunk),
                    None => break,
                }
            }

            let detected = detect_content_type(&head);
            if !self.config.is_mime_allowed(detected) {
                return Err(ToolkitError::FileTypeNotAllowed {
                    detected: detected.to_string(),
                });
            }

            let new_name = stored_file_name(&original_name, rename);
            let dest = upload_dir.join(&new_name);
            let mut outfile = tokio::fs::File::create(&dest).await?;

            // A failure mid-copy leaves a truncated file with no record;
            // remove it before surfacing the error.
            let size = match copy_field(&mut field, &mut outfile, &head, limit).await {
                Ok(size) => size,
                Err(err) => {
                    drop(outfile);
                    if let Err(remove_err) = tokio::fs::remove_file(&dest).await {
                        tracing::warn!(
                            "failed to remove partial upload {}: {}",
                            dest.display(),
                            remove_err
                        );
                    }
                    return Err(err);
                }
            };

            tracing::debug!(
                "stored uploaded file {} ({} bytes) as {}",
                original_name,
                size,
                dest.display()
            );

            stored.push(UploadedFile {
                new_name,
                original_name,
                size,
            });
        }

        Ok(())
    }
}

async fn copy_field(
    field: &mut multer::Field<'_>,
    outfile: &mut tokio::fs::File,
    head: &[u8],
    limit: u64,
) -> Result<u64, ToolkitError> {
    outfile.write_all(head).await?;
    let mut size = head.len() as u64;
    while let Some(chunk) = field
        .chunk()
        .await
        .map_err(|err| map_multer_error(err, limit))?
    {
        outfile.write_all(&chunk).await?;
        size += chunk.len() as u64;
    }
    outfile.flush().await?;
    Ok(size)
}

fn stored_file_name(original_name: &str, rename: bool) -> String {
    if !rename {
        return original_name.to_string();
    }
    match Path::new(original_name).extension().and_then(OsStr::to_str) {
        Some(ext) => format!("{}.{}", secure_token(RENAME_TOKEN_LEN), ext),
        None => secure_token(RENAME_TOKEN_LEN),
    }
}

fn map_multer_error(err: multer::Error, limit: u64) -> ToolkitError {
    match err {
        multer::Error::StreamSizeExceeded { .. } => ToolkitError::UploadTooLarge { limit },
        other => ToolkitError::Multipart(other),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn verbatim_name_when_rename_is_off() {
        assert_eq!(stored_file_name("photo.png", false), "photo.png");
    }

    #[test]
    fn renamed_file_keeps_the_extension() {
        let name = stored_file_name("photo.png", true);
        assert_ne!(name, "photo.png");
        assert!(name.ends_with(".png"));
        assert_eq!(name.len(), RENAME_TOKEN_LEN + ".png".len());
    }

    #[test]
    fn renamed_file_without_extension_is_a_bare_token() {
        let name = stored_file_name("README", true);
        assert_eq!(name.len(), RENAME_TOKEN_LEN);
        assert!(!name.contains('.'));
    }
}

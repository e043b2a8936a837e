//! Multipart file uploads.
//!
//! The whole body is buffered through the size cap before any part is looked
//! at, so an oversized request never leaves a file behind. Each file part is
//! then sniffed, checked against the allow-list and streamed to disk.
//!
//! A call either stores every file part or none: when a part fails, the files
//! already written by the same call are removed before the error is returned.

use std::convert::Infallible;
use std::path::{Path, PathBuf};
use std::time::{SystemTime, UNIX_EPOCH};

use bytes::Bytes;
use http::header::CONTENT_TYPE;
use http::Request;
use http_body::Body;
use multer::{Field, Multipart};
use serde::Serialize;
use tokio::fs::File;
use tokio::io::AsyncWriteExt;
use tracing::{debug, warn};

use crate::config::Tools;
use crate::error::UploadError;
use crate::fs::create_directory_if_not_exist;
use crate::random::random_string;
use crate::request::{BodyError, collect_limited};
use crate::sniff::{SNIFF_LEN, detect_content_type};

/// Length of the random part of a generated file name.
pub const RANDOM_NAME_LEN: usize = 20;

/// One stored file.
#[derive(Clone, Debug, PartialEq, Eq, Serialize)]
pub struct UploadedFile {
    /// Name on disk inside the upload directory.
    pub new_file_name: String,
    /// Name exactly as the client sent it.
    pub original_file_name: String,
    pub file_size: u64,
}

impl Tools {
    /// Stores every file part of a `multipart/form-data` request in `dir`.
    ///
    /// With `rename`, files are saved as `<unix-seconds>_<random><ext>`;
    /// otherwise under the final component of the client's file name. Plain
    /// form fields and file inputs sent without a file name are skipped.
    pub async fn upload_files<B>(
        &self,
        req: Request<B>,
        dir: impl AsRef<Path>,
        rename: bool,
    ) -> Result<Vec<UploadedFile>, UploadError>
    where
        B: Body,
        B::Error: Into<Box<dyn std::error::Error + Send + Sync>>,
    {
        let dir = dir.as_ref();
        create_directory_if_not_exist(dir).await?;

        let content_type = req
            .headers()
            .get(CONTENT_TYPE)
            .and_then(|v| v.to_str().ok())
            .unwrap_or_default();
        let boundary = multer::parse_boundary(content_type).map_err(UploadError::NotMultipart)?;

        let limit = self.upload_limit();
        let cap = usize::try_from(limit).unwrap_or(usize::MAX);
        let body = collect_limited(req.into_body(), cap).await.map_err(|e| match e {
            BodyError::TooLarge => UploadError::TooLarge { limit },
            BodyError::Other(msg) => UploadError::Body(msg),
        })?;

        let stream = futures::stream::once(async move { Ok::<Bytes, Infallible>(body) });
        let mut multipart = Multipart::new(stream, boundary);

        let mut stored = Vec::new();
        let mut written = Vec::new();
        match self.store_parts(&mut multipart, dir, rename, &mut stored, &mut written).await {
            Ok(()) => Ok(stored),
            Err(e) => {
                warn!(error = %e, removed = written.len(), "upload failed, removing stored files");
                discard(&written).await;
                Err(e)
            }
        }
    }

    /// Like [`upload_files`](Tools::upload_files), returning only the first file.
    ///
    /// Fails with [`UploadError::NoFile`] when the request has no file part.
    pub async fn upload_one_file<B>(
        &self,
        req: Request<B>,
        dir: impl AsRef<Path>,
        rename: bool,
    ) -> Result<UploadedFile, UploadError>
    where
        B: Body,
        B::Error: Into<Box<dyn std::error::Error + Send + Sync>>,
    {
        self.upload_files(req, dir, rename)
            .await?
            .into_iter()
            .next()
            .ok_or(UploadError::NoFile)
    }

    // `written` gets every path before its file is created, so a failure
    // halfway through a copy is cleaned up as well.
    async fn store_parts(
        &self,
        multipart: &mut Multipart<'_>,
        dir: &Path,
        rename: bool,
        stored: &mut Vec<UploadedFile>,
        written: &mut Vec<PathBuf>,
    ) -> Result<(), UploadError> {
        while let Some(mut field) = multipart.next_field().await? {
            // an empty file input arrives as `filename=""`
            let Some(original) = field.file_name().filter(|n| !n.is_empty()).map(str::to_owned)
            else {
                continue;
            };

            let head = read_head(&mut field).await?;
            let detected = detect_content_type(&head);
            if !self.is_permitted(detected) {
                return Err(UploadError::TypeNotPermitted { detected: detected.to_owned() });
            }

            let base = base_name(&original);
            let new_name = if rename {
                generated_name(base)
            } else {
                checked_name(base)?
            };
            let path = dir.join(&new_name);
            written.push(path.clone());

            let mut file = File::create(&path).await?;
            file.write_all(&head).await?;
            let mut size = head.len() as u64;
            while let Some(chunk) = field.chunk().await? {
                file.write_all(&chunk).await?;
                size += chunk.len() as u64;
            }
            file.flush().await?;

            debug!(file = %new_name, original = %original, bytes = size, mime = detected, "stored upload");
            stored.push(UploadedFile {
                new_file_name: new_name,
                original_file_name: original,
                file_size: size,
            });
        }
        Ok(())
    }

    /// Empty allow-list accepts everything. Entries match the full detected
    /// type or its essence (`text/plain` for `text/plain; charset=utf-8`),
    /// ignoring ASCII case.
    fn is_permitted(&self, detected: &str) -> bool {
        if self.allowed_file_types.is_empty() {
            return true;
        }
        let essence = detected.split(';').next().unwrap_or(detected).trim();
        self.allowed_file_types.iter().any(|allowed| {
            let allowed = allowed.trim();
            allowed.eq_ignore_ascii_case(detected) || allowed.eq_ignore_ascii_case(essence)
        })
    }
}

/// Reads until at least [`SNIFF_LEN`] bytes are buffered or the part ends.
async fn read_head(field: &mut Field<'_>) -> Result<Vec<u8>, UploadError> {
    let mut head = Vec::with_capacity(SNIFF_LEN);
    while head.len() < SNIFF_LEN {
        match field.chunk().await? {
            Some(chunk) => head.extend_from_slice(&chunk),
            None => break,
        }
    }
    Ok(head)
}

// Clients may send `C:\\Users\\me\\photo.jpg` or `../photo.jpg`.
fn base_name(name: &str) -> &str {
    name.rsplit(['/', '\\']).next().unwrap_or(name)
}

fn checked_name(name: &str) -> Result<String, UploadError> {
    match name {
        "" | "." | ".." => Err(UploadError::InvalidFileName(name.to_owned())),
        _ => Ok(name.to_owned()),
    }
}

fn generated_name(original: &str) -> String {
    let secs = SystemTime::now()
        .duration_since(UNIX_EPOCH)
        .map(|d| d.as_secs())
        .unwrap_or_default();
    format!("{secs}_{}{}", random_string(RANDOM_NAME_LEN), extension(original))
}

/// Extension including the dot, or empty.
fn extension(name: &str) -> &str {
    match name.rfind('.') {
        Some(0) | None => "",
        Some(i) => &name[i..],
    }
}

async fn discard(paths: &[PathBuf]) {
    for path in paths {
        if let Err(e) = tokio::fs::remove_file(path).await {
            warn!(path = %path.display(), error = %e, "failed to remove upload");
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn base_name_strips_directories() {
        assert_eq!(base_name("./testdata/img.jpg"), "img.jpg");
        assert_eq!(base_name(r"C:\Users\me\img.jpg"), "img.jpg");
        assert_eq!(base_name("img.jpg"), "img.jpg");
        assert_eq!(base_name("dir/"), "");
    }

    #[test]
    fn unusable_names_are_rejected() {
        assert!(checked_name("..").is_err());
        assert!(checked_name("").is_err());
        assert_eq!(checked_name("a.png").unwrap(), "a.png");
    }

    #[test]
    fn extension_keeps_the_dot() {
        assert_eq!(extension("photo.jpg"), ".jpg");
        assert_eq!(extension("archive.tar.gz"), ".gz");
        assert_eq!(extension("README"), "");
        assert_eq!(extension(".bashrc"), "");
    }

    #[test]
    fn generated_name_shape() {
        let name = generated_name("photo.jpg");
        let (secs, rest) = name.split_once('_').unwrap();
        assert!(secs.parse::<u64>().unwrap() > 0);
        assert!(rest.ends_with(".jpg"));
        assert_eq!(rest.len(), RANDOM_NAME_LEN + ".jpg".len());
    }

    #[test]
    fn allow_list_matching() {
        assert!(Tools::default().is_permitted("image/jpeg"));

        let tools = Tools::new().with_allowed_file_types(["IMAGE/JPEG", "text/plain"]);
        assert!(tools.is_permitted("image/jpeg"));
        assert!(tools.is_permitted("text/plain; charset=utf-8"));
        assert!(!tools.is_permitted("image/png"));
    }
}

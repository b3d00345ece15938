use std::path::{Path, PathBuf};

use futures_util::StreamExt;
use reqwest::header::CONTENT_DISPOSITION;
use reqwest::multipart::{Form, Part};
use reqwest::Method;
use serde::de::DeserializeOwned;
use serde::{Deserialize, Serialize};
use sha2::{Digest, Sha256};
use shelf_core::{TransportError, TransportErrorKind};
use shelf_logging::{shelf_debug, shelf_info, shelf_warn};
use thiserror::Error;
use url::Url;

use crate::client::{map_reqwest_error, ReqwestClient};
use crate::download::{disposition_file_name, AtomicDownload, PersistError};

/// A document in the library as listed by `GET /files`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct FileItem {
    pub id: String,
    pub title: String,
    #[serde(default)]
    pub subject: Option<String>,
    #[serde(default)]
    pub tags: Option<Vec<String>>,
    #[serde(default)]
    pub size: Option<u64>,
    #[serde(default)]
    pub mime_type: Option<String>,
    #[serde(default)]
    pub original_filename: Option<String>,
    #[serde(default)]
    pub download_url: Option<String>,
    #[serde(default)]
    pub created_at: Option<String>,
    #[serde(default)]
    pub file_hash: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SearchResult {
    #[serde(flatten)]
    pub file: FileItem,
    #[serde(default)]
    pub score: Option<f64>,
    #[serde(default)]
    pub preview: Option<String>,
    #[serde(default)]
    pub matched_in: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct UploadRequest {
    pub path: PathBuf,
    pub title: Option<String>,
    pub subject: Option<String>,
    pub tags: Vec<String>,
    /// Upload even when the backend already holds identical content.
    pub force: bool,
}

impl UploadRequest {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self {
            path: path.into(),
            ..Self::default()
        }
    }

    /// Explicit title, or the file name without its extension.
    pub fn resolved_title(&self) -> Option<String> {
        self.title
            .as_deref()
            .map(str::trim)
            .filter(|title| !title.is_empty())
            .map(str::to_string)
            .or_else(|| {
                self.path
                    .file_stem()
                    .and_then(|stem| stem.to_str())
                    .map(str::to_string)
            })
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Downloaded {
    pub path: PathBuf,
    pub bytes: u64,
}

#[derive(Debug, Error)]
pub enum LibraryError {
    #[error(transparent)]
    Transport(#[from] TransportError),
    /// The backend already holds this content; retry with `force`.
    #[error("duplicate upload: {detail}")]
    Duplicate { detail: String, local_hash: String },
    #[error("cannot read {path}: {source}")]
    ReadUpload {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
    #[error(transparent)]
    Persist(#[from] PersistError),
}

impl ReqwestClient {
    pub async fn list_files(&self) -> Result<Vec<FileItem>, LibraryError> {
        let files: Vec<FileItem> = self.get_json(self.endpoint(&["files"])).await?;
        shelf_debug!("listed {} files", files.len());
        Ok(files)
    }

    pub async fn search(&self, query: &str) -> Result<Vec<SearchResult>, LibraryError> {
        let url = self.endpoint_with_query(&["search"], query);
        Ok(self.get_json(url).await?)
    }

    pub async fn semantic_search(&self, query: &str) -> Result<Vec<SearchResult>, LibraryError> {
        let url = self.endpoint_with_query(&["semantic-search"], query);
        Ok(self.get_json(url).await?)
    }

    /// Multipart upload. A 409 comes back as [`LibraryError::Duplicate`]
    /// carrying the SHA-256 of the local file.
    pub async fn upload(&self, request: &UploadRequest) -> Result<FileItem, LibraryError> {
        let content = std::fs::read(&request.path).map_err(|source| LibraryError::ReadUpload {
            path: request.path.clone(),
            source,
        })?;
        let local_hash = sha256_hex(&content);
        let file_name = request
            .path
            .file_name()
            .and_then(|name| name.to_str())
            .unwrap_or("upload")
            .to_string();

        let mut form = Form::new().part("file", Part::bytes(content).file_name(file_name));
        if let Some(title) = request.resolved_title() {
            form = form.text("title", title);
        }
        if let Some(subject) = request.subject.as_deref().filter(|s| !s.trim().is_empty()) {
            form = form.text("subject", subject.to_string());
        }
        if !request.tags.is_empty() {
            form = form.text("tags", request.tags.join(","));
        }
        if request.force {
            form = form.text("force", "true");
        }

        let builder = self
            .request(Method::POST, self.endpoint(&["upload"]))
            .multipart(form);
        match self.send(builder).await {
            Ok(response) => {
                let item: FileItem = decode_json(&read_body(response).await?)?;
                shelf_info!("uploaded {} as {}", request.path.display(), item.id);
                Ok(item)
            }
            Err(err) if err.status_code() == Some(409) => {
                shelf_warn!("duplicate upload {}: {}", request.path.display(), err.message);
                Err(LibraryError::Duplicate {
                    detail: err.message,
                    local_hash,
                })
            }
            Err(err) => Err(err.into()),
        }
    }

    pub async fn delete_file(&self, id: &str) -> Result<(), LibraryError> {
        let builder = self.request(Method::DELETE, self.endpoint(&["files", id]));
        self.send(builder).await?;
        shelf_info!("deleted {id}");
        Ok(())
    }

    pub fn download_url(&self, id: &str) -> Url {
        self.endpoint(&["files", id, "download"])
    }

    /// Streams a document into `dir`. The name comes from `filename`, then
    /// the response's `Content-Disposition`, then the document id.
    pub async fn download(
        &self,
        id: &str,
        dir: &Path,
        filename: Option<&str>,
    ) -> Result<Downloaded, LibraryError> {
        let builder = self.request(Method::GET, self.download_url(id));
        let response = self.send(builder).await?;
        let name = match filename {
            Some(name) => name.to_string(),
            None => response
                .headers()
                .get(CONTENT_DISPOSITION)
                .and_then(|value| value.to_str().ok())
                .and_then(disposition_file_name)
                .unwrap_or(id)
                .to_string(),
        };

        let mut sink = AtomicDownload::create(dir, &name)?;
        let mut stream = response.bytes_stream();
        while let Some(chunk) = stream.next().await {
            let chunk = chunk.map_err(map_reqwest_error)?;
            sink.write_chunk(&chunk)?;
        }
        let (path, bytes) = sink.finish()?;
        shelf_info!("downloaded {id} to {} ({bytes} bytes)", path.display());
        Ok(Downloaded { path, bytes })
    }

    async fn get_json<T: DeserializeOwned>(&self, url: Url) -> Result<T, TransportError> {
        let response = self.send(self.request(Method::GET, url)).await?;
        decode_json(&read_body(response).await?)
    }
}

async fn read_body(response: reqwest::Response) -> Result<Vec<u8>, TransportError> {
    let body = response.bytes().await.map_err(map_reqwest_error)?;
    Ok(body.to_vec())
}

fn decode_json<T: DeserializeOwned>(body: &[u8]) -> Result<T, TransportError> {
    serde_json::from_slice(body)
        .map_err(|err| TransportError::new(TransportErrorKind::Decode, err.to_string()))
}

pub fn sha256_hex(content: &[u8]) -> String {
    format!("{:x}", Sha256::digest(content))
}

/// The listed document whose stored hash matches `hash`, if any.
pub fn find_duplicate<'a>(files: &'a [FileItem], hash: &str) -> Option<&'a FileItem> {
    files
        .iter()
        .find(|file| file.file_hash.as_deref().is_some_and(|h| h.eq_ignore_ascii_case(hash)))
}

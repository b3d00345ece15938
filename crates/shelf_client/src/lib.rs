//! StudyShelf client: HTTP access to the document backend and the engine
//! thread that executes core effects.
mod client;
mod download;
mod engine;
mod library;
mod types;
mod wire;

pub use client::{ClientSettings, JobClient, ReqwestClient, DEFAULT_API_BASE};
pub use download::{ensure_dir, AtomicDownload, PersistError};
pub use engine::EngineHandle;
pub use library::{
    find_duplicate, sha256_hex, Downloaded, FileItem, LibraryError, SearchResult, UploadRequest,
};
pub use types::EngineEvent;

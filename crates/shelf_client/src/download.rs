use std::fs;
use std::io::{self, Write};
use std::path::{Path, PathBuf};

use tempfile::NamedTempFile;
use thiserror::Error;

#[derive(Debug, Error)]
pub enum PersistError {
    #[error("download directory missing or not writable: {0}")]
    TargetDir(String),
    #[error("unusable file name {0:?}")]
    FileName(String),
    #[error("io error: {0}")]
    Io(#[from] io::Error),
}

/// Ensure the download directory exists; create if missing.
pub fn ensure_dir(dir: &Path) -> Result<(), PersistError> {
    if dir.exists() {
        let meta = fs::metadata(dir).map_err(|e| PersistError::TargetDir(e.to_string()))?;
        if !meta.is_dir() {
            return Err(PersistError::TargetDir("path is not a directory".into()));
        }
    } else {
        fs::create_dir_all(dir).map_err(|e| PersistError::TargetDir(e.to_string()))?;
    }
    Ok(())
}

/// Reduces a server-provided name to a bare file name inside the target dir.
pub(crate) fn sanitize_file_name(raw: &str) -> Result<String, PersistError> {
    let trimmed = raw.trim().trim_matches('"');
    Path::new(trimmed)
        .file_name()
        .and_then(|name| name.to_str())
        .filter(|name| !name.is_empty())
        .map(str::to_string)
        .ok_or_else(|| PersistError::FileName(raw.to_string()))
}

/// Pulls the `filename` parameter out of a `Content-Disposition` header.
pub(crate) fn disposition_file_name(header: &str) -> Option<&str> {
    header
        .split(';')
        .map(str::trim)
        .find_map(|part| part.strip_prefix("filename="))
        .map(|name| name.trim_matches('"'))
        .filter(|name| !name.is_empty())
}

/// Streams chunks into a temp file next to `{dir}/{filename}` and renames it
/// into place on [`AtomicDownload::finish`]. Dropping it unfinished leaves no
/// partial file behind.
pub struct AtomicDownload {
    target: PathBuf,
    tmp: NamedTempFile,
    written: u64,
}

impl AtomicDownload {
    pub fn create(dir: &Path, filename: &str) -> Result<Self, PersistError> {
        ensure_dir(dir)?;
        let target = dir.join(sanitize_file_name(filename)?);
        let tmp = NamedTempFile::new_in(dir).map_err(|e| PersistError::TargetDir(e.to_string()))?;
        Ok(Self {
            target,
            tmp,
            written: 0,
        })
    }

    pub fn write_chunk(&mut self, chunk: &[u8]) -> Result<(), PersistError> {
        self.tmp.write_all(chunk)?;
        self.written += chunk.len() as u64;
        Ok(())
    }

    pub fn finish(mut self) -> Result<(PathBuf, u64), PersistError> {
        self.tmp.flush()?;
        self.tmp.as_file_mut().sync_all()?;
        if self.target.exists() {
            fs::remove_file(&self.target)?;
        }
        self.tmp
            .persist(&self.target)
            .map_err(|e| PersistError::Io(e.error))?;
        Ok((self.target, self.written))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn file_names_are_reduced_to_their_last_component() {
        assert_eq!(sanitize_file_name("notes.pdf").unwrap(), "notes.pdf");
        assert_eq!(sanitize_file_name("../../etc/passwd").unwrap(), "passwd");
        assert!(sanitize_file_name("  ").is_err());
        assert!(sanitize_file_name("..").is_err());
    }

    #[test]
    fn disposition_header_yields_quoted_name() {
        assert_eq!(
            disposition_file_name(r#"attachment; filename="Chapter 1.pdf""#),
            Some("Chapter 1.pdf")
        );
        assert_eq!(disposition_file_name("inline"), None);
    }

    #[test]
    fn finish_replaces_existing_file() {
        let dir = tempfile::tempdir().unwrap();
        std::fs::write(dir.path().join("a.txt"), "old").unwrap();

        let mut download = AtomicDownload::create(dir.path(), "a.txt").unwrap();
        download.write_chunk(b"ne").unwrap();
        download.write_chunk(b"w").unwrap();
        let (path, written) = download.finish().unwrap();

        assert_eq!(written, 3);
        assert_eq!(std::fs::read_to_string(path).unwrap(), "new");
    }

    #[test]
    fn abandoned_download_leaves_nothing_behind() {
        let dir = tempfile::tempdir().unwrap();
        {
            let mut download = AtomicDownload::create(dir.path(), "b.bin").unwrap();
            download.write_chunk(b"partial").unwrap();
        }
        assert_eq!(std::fs::read_dir(dir.path()).unwrap().count(), 0);
    }
}

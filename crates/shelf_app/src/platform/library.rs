use std::path::Path;

use anyhow::{anyhow, Context, Result};
use shelf_client::{find_duplicate, FileItem, LibraryError, ReqwestClient, UploadRequest};
use shelf_logging::shelf_warn;
use tokio::runtime::Runtime;

use super::render;

/// Library commands run one request at a time on a current-thread runtime.
pub(crate) struct Library {
    client: ReqwestClient,
    runtime: Runtime,
}

impl Library {
    pub(crate) fn new(client: ReqwestClient) -> Result<Self> {
        let runtime = tokio::runtime::Builder::new_current_thread()
            .enable_all()
            .build()
            .context("starting runtime")?;
        Ok(Self { client, runtime })
    }

    pub(crate) fn files(&self) -> Result<String> {
        let files = self.runtime.block_on(self.client.list_files())?;
        Ok(render::file_list(&files))
    }

    pub(crate) fn search(&self, query: &str, semantic: bool) -> Result<String> {
        let results = if semantic {
            self.runtime.block_on(self.client.semantic_search(query))?
        } else {
            self.runtime.block_on(self.client.search(query))?
        };
        Ok(render::search_results(&results))
    }

    pub(crate) fn upload(&self, request: &UploadRequest) -> Result<String> {
        match self.runtime.block_on(self.client.upload(request)) {
            Ok(item) => Ok(format!("Uploaded {} as {}\n", item.title, item.id)),
            Err(LibraryError::Duplicate { detail, local_hash }) => {
                let files = match self.runtime.block_on(self.client.list_files()) {
                    Ok(files) => files,
                    Err(err) => {
                        shelf_warn!("could not list files to match duplicate: {err}");
                        Vec::new()
                    }
                };
                Err(anyhow!(duplicate_report(
                    &detail,
                    find_duplicate(&files, &local_hash)
                )))
            }
            Err(err) => Err(err.into()),
        }
    }

    pub(crate) fn delete(&self, id: &str) -> Result<String> {
        self.runtime.block_on(self.client.delete_file(id))?;
        Ok(format!("Deleted {id}\n"))
    }

    pub(crate) fn download(&self, id: &str, dir: &Path) -> Result<String> {
        let downloaded = self
            .runtime
            .block_on(self.client.download(id, dir, None))
            .with_context(|| format!("downloading {id} from {}", self.client.download_url(id)))?;
        Ok(format!(
            "Saved {} ({})\n",
            downloaded.path.display(),
            render::human_size(downloaded.bytes)
        ))
    }
}

pub(crate) fn duplicate_report(detail: &str, existing: Option<&FileItem>) -> String {
    let found = match existing {
        Some(file) => format!("It matches \"{}\" ({}). ", file.title, file.id),
        None => String::new(),
    };
    format!("Duplicate detected: {detail}. {found}Re-run with --force to upload anyway.")
}

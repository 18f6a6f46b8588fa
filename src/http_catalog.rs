use anyhow::anyhow;
use async_trait::async_trait;
use bytes::Bytes;
use serde::Deserialize;

use crate::media::MediaKind;
use crate::remote::{CatalogError, CatalogResult, FolderRef, RemoteCatalog, RemoteFile};

#[derive(Debug, Deserialize)]
struct ListResponse<T> {
    items: Vec<T>,
}

#[derive(Debug, Deserialize)]
struct FolderRecord {
    id: String,
    name: String,
}

#[derive(Debug, Deserialize)]
struct FileRecord {
    id: String,
    name: String,
}

/// JSON-over-HTTP catalog client.
///
/// Endpoints, relative to the configured base URL:
/// - `GET /api/folders?name=<name>` — folders matching a display name
/// - `GET /api/folders/<id>/files?kind=<image|video>` — per-kind listing
/// - `GET /api/folders/<id>/files?name=<name>` — exact-name lookup
/// - `GET /api/files/<id>/content` — raw bytes
pub struct HttpCatalog {
    client: reqwest::Client,
    base_url: String,
    token: Option<String>,
}

impl HttpCatalog {
    pub fn new(base_url: impl Into<String>, token: Option<String>) -> Self {
        Self {
            client: reqwest::Client::new(),
            base_url: base_url.into().trim_end_matches('/').to_string(),
            token,
        }
    }

    fn get(&self, path: &str) -> reqwest::RequestBuilder {
        let mut request = self.client.get(format!("{}{}", self.base_url, path));
        if let Some(token) = &self.token {
            request = request.bearer_auth(token);
        }
        request
    }

    async fn list<T>(&self, request: reqwest::RequestBuilder) -> CatalogResult<Vec<T>>
    where
        T: for<'de> Deserialize<'de>,
    {
        let response = request
            .send()
            .await
            .map_err(unavailable)?
            .error_for_status()
            .map_err(unavailable)?;
        let parsed: ListResponse<T> = response.json().await.map_err(unavailable)?;
        Ok(parsed.items)
    }
}

fn unavailable(err: reqwest::Error) -> CatalogError {
    CatalogError::Unavailable(anyhow!(err))
}

#[async_trait]
impl RemoteCatalog for HttpCatalog {
    async fn find_folder(&self, name: &str) -> CatalogResult<Option<FolderRef>> {
        let request = self.get("/api/folders").query(&[("name", name)]);
        let folders: Vec<FolderRecord> = self.list(request).await?;
        Ok(folders
            .into_iter()
            .next()
            .map(|f| FolderRef { id: f.id, name: f.name }))
    }

    async fn list_files(
        &self,
        folder: &FolderRef,
        kind: MediaKind,
    ) -> CatalogResult<Vec<RemoteFile>> {
        let request = self
            .get(&format!("/api/folders/{}/files", folder.id))
            .query(&[("kind", kind.as_str())]);
        let files: Vec<FileRecord> = self.list(request).await?;
        Ok(files
            .into_iter()
            .map(|f| RemoteFile { id: f.id, name: f.name })
            .collect())
    }

    async fn find_file(&self, folder: &FolderRef, name: &str) -> CatalogResult<Option<RemoteFile>> {
        let request = self
            .get(&format!("/api/folders/{}/files", folder.id))
            .query(&[("name", name)]);
        let files: Vec<FileRecord> = self.list(request).await?;
        Ok(files
            .into_iter()
            .find(|f| f.name == name)
            .map(|f| RemoteFile { id: f.id, name: f.name }))
    }

    async fn download(&self, file: &RemoteFile) -> CatalogResult<Bytes> {
        let response = self
            .get(&format!("/api/files/{}/content", file.id))
            .send()
            .await
            .map_err(unavailable)?;

        if response.status() == reqwest::StatusCode::NOT_FOUND {
            return Err(CatalogError::NotFound(file.name.clone()));
        }
        let response = response.error_for_status().map_err(unavailable)?;
        response.bytes().await.map_err(unavailable)
    }
}

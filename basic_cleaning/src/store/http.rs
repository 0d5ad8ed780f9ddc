//! REST artifact store client.
//!
//! # Endpoints
//!
//! | Method | Path                                   | Description                  |
//! |--------|----------------------------------------|------------------------------|
//! | GET    | `/artifacts/{name}/{version}`          | Manifest of a version        |
//! | GET    | `/artifacts/{name}/{version}/file`     | File content of a version    |
//! | POST   | `/artifacts/{name}`                    | Register a new version       |
//!
//! `{version}` is `latest` or `vN`. Registration is a multipart form with a
//! `metadata` part (JSON) and a `file` part. Downloads are cached under
//! `<cache_dir>/<name>/v<N>/<file_name>`. No request is retried.

use std::path::{Path, PathBuf};

use reqwest::multipart::{Form, Part};
use reqwest::{RequestBuilder, Response, StatusCode, Url};
use serde::Deserialize;
use tracing::{debug, info};

use super::{
    validate_name, ArtifactManifest, ArtifactRef, ArtifactStore, NewArtifact, ResolvedArtifact,
    VersionSpec,
};
use crate::error::{StoreError, StoreResult};

/// Error body returned by the store.
#[derive(Debug, Deserialize)]
struct ApiErrorBody {
    error: String,
}

/// Client for a remote artifact store.
#[derive(Debug, Clone)]
pub struct HttpStore {
    client: reqwest::Client,
    base_url: String,
    token: Option<String>,
    cache_dir: PathBuf,
}

impl HttpStore {
    pub fn new(base_url: Url, token: Option<String>, cache_dir: impl AsRef<Path>) -> StoreResult<Self> {
        let client = reqwest::Client::builder()
            .user_agent(concat!("basic_cleaning/", env!("CARGO_PKG_VERSION")))
            .build()?;

        Ok(Self {
            client,
            base_url: base_url.as_str().trim_end_matches('/').to_string(),
            token,
            cache_dir: cache_dir.as_ref().to_path_buf(),
        })
    }

    fn url(&self, path: &str) -> String {
        format!("{}/artifacts/{}", self.base_url, path)
    }

    fn authorize(&self, request: RequestBuilder) -> RequestBuilder {
        match &self.token {
            Some(token) => request.bearer_auth(token),
            None => request,
        }
    }

    /// Turn non-success statuses into errors.
    async fn check(response: Response, reference: &ArtifactRef) -> StoreResult<Response> {
        let status = response.status();
        if status.is_success() {
            return Ok(response);
        }
        if status == StatusCode::NOT_FOUND {
            return Err(StoreError::NotFound {
                name: reference.name.clone(),
                version: reference.version.to_string(),
            });
        }

        let body = response.text().await.unwrap_or_default();
        let message = serde_json::from_str::<ApiErrorBody>(&body)
            .map(|e| e.error)
            .unwrap_or(body);
        Err(StoreError::Api {
            status: status.as_u16(),
            message,
        })
    }

    async fn fetch_manifest(&self, reference: &ArtifactRef) -> StoreResult<ArtifactManifest> {
        let url = self.url(&format!("{}/{}", reference.name, reference.version));
        debug!(%url, "fetching manifest");

        let response = self.authorize(self.client.get(&url)).send().await?;
        let body = Self::check(response, reference).await?.text().await?;
        let manifest: ArtifactManifest = serde_json::from_str(&body)?;
        validate_name(&manifest.name)?;
        validate_name(&manifest.file_name)?;

        // Name and version end up in the file URL and the cache path.
        let version_matches = match reference.version {
            VersionSpec::Latest => true,
            VersionSpec::Exact(n) => manifest.version == n,
        };
        if manifest.name != reference.name || !version_matches {
            return Err(StoreError::ManifestMismatch {
                requested: reference.to_string(),
                returned: manifest.reference().to_string(),
            });
        }
        Ok(manifest)
    }
}

impl ArtifactStore for HttpStore {
    async fn resolve(&self, reference: &ArtifactRef) -> StoreResult<ResolvedArtifact> {
        let manifest = self.fetch_manifest(reference).await?;
        let concrete = manifest.reference();

        let url = self.url(&format!("{}/{}/file", concrete.name, concrete.version));
        let response = self.authorize(self.client.get(&url)).send().await?;
        let bytes = Self::check(response, &concrete).await?.bytes().await?;

        let dir = self
            .cache_dir
            .join(&concrete.name)
            .join(concrete.version.to_string());
        tokio::fs::create_dir_all(&dir).await?;
        let local_path = dir.join(&manifest.file_name);
        tokio::fs::write(&local_path, &bytes).await?;

        info!(artifact = %concrete, bytes = bytes.len(), "downloaded artifact");
        Ok(ResolvedArtifact { manifest, local_path })
    }

    async fn register(&self, artifact: NewArtifact) -> StoreResult<ArtifactManifest> {
        validate_name(&artifact.name)?;
        let metadata = artifact.metadata()?;
        let bytes = tokio::fs::read(&artifact.path).await?;

        let form = Form::new()
            .text("metadata", serde_json::to_string(&metadata)?)
            .part("file", Part::bytes(bytes).file_name(metadata.file_name.clone()));

        let url = self.url(&artifact.name);
        debug!(%url, "registering artifact");
        let response = self
            .authorize(self.client.post(&url))
            .multipart(form)
            .send()
            .await?;

        let reference = ArtifactRef::latest(artifact.name.as_str())?;
        let body = Self::check(response, &reference).await?.text().await?;
        Ok(serde_json::from_str(&body)?)
    }
}

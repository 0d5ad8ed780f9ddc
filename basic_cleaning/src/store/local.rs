//! Directory-backed artifact store.
//!
//! Layout under the root directory:
//!
//! ```text
//! <root>/<name>/v0/manifest.json
//! <root>/<name>/v0/<file_name>
//! <root>/<name>/v1/...
//! ```
//!
//! `latest` is the highest `vN` holding a manifest. Registering copies the
//! file into a new `v<N+1>` directory, numbered past every existing `vN`
//! directory; existing versions are never modified.

use std::fs;
use std::path::{Path, PathBuf};

use tracing::debug;

use super::{
    file_size, validate_name, ArtifactManifest, ArtifactRef, ArtifactStore, NewArtifact,
    ResolvedArtifact, VersionSpec,
};
use crate::error::{StoreError, StoreResult};

const MANIFEST_FILE: &str = "manifest.json";

/// Artifact store kept in a local directory.
#[derive(Debug, Clone)]
pub struct LocalStore {
    root: PathBuf,
}

impl LocalStore {
    pub fn new(root: impl AsRef<Path>) -> Self {
        Self {
            root: root.as_ref().to_path_buf(),
        }
    }

    pub fn root(&self) -> &Path {
        &self.root
    }

    fn artifact_dir(&self, name: &str) -> PathBuf {
        self.root.join(name)
    }

    fn version_dir(&self, name: &str, version: u32) -> PathBuf {
        self.artifact_dir(name).join(format!("v{}", version))
    }

    /// All versions registered under `name`, ascending.
    pub fn versions(&self, name: &str) -> StoreResult<Vec<u32>> {
        self.scan_versions(name, true)
    }

    /// Every `vN` directory under `name`, including ones left without a
    /// manifest by an interrupted registration.
    fn scan_versions(&self, name: &str, registered_only: bool) -> StoreResult<Vec<u32>> {
        let dir = self.artifact_dir(name);
        if !dir.is_dir() {
            return Ok(Vec::new());
        }

        let mut versions: Vec<u32> = fs::read_dir(&dir)?
            .flatten()
            .filter(|entry| entry.path().is_dir())
            .filter(|entry| !registered_only || entry.path().join(MANIFEST_FILE).is_file())
            .filter_map(|entry| {
                entry
                    .file_name()
                    .to_str()
                    .and_then(|n| n.strip_prefix('v'))
                    .and_then(|n| n.parse().ok())
            })
            .collect();
        versions.sort_unstable();
        Ok(versions)
    }

    fn read_manifest(&self, name: &str, version: u32) -> StoreResult<ArtifactManifest> {
        let path = self.version_dir(name, version).join(MANIFEST_FILE);
        if !path.is_file() {
            return Err(StoreError::NotFound {
                name: name.to_string(),
                version: VersionSpec::Exact(version).to_string(),
            });
        }
        let content = fs::read_to_string(&path)?;
        Ok(serde_json::from_str(&content)?)
    }
}

impl ArtifactStore for LocalStore {
    async fn resolve(&self, reference: &ArtifactRef) -> StoreResult<ResolvedArtifact> {
        let version = match reference.version {
            VersionSpec::Exact(n) => n,
            VersionSpec::Latest => {
                self.versions(&reference.name)?
                    .last()
                    .copied()
                    .ok_or_else(|| StoreError::NotFound {
                        name: reference.name.clone(),
                        version: reference.version.to_string(),
                    })?
            }
        };

        let manifest = self.read_manifest(&reference.name, version)?;
        let local_path = self
            .version_dir(&reference.name, version)
            .join(&manifest.file_name);
        if !local_path.is_file() {
            return Err(StoreError::NotFound {
                name: reference.name.clone(),
                version: format!("v{} ({} is missing)", version, manifest.file_name),
            });
        }

        debug!(artifact = %manifest.reference(), path = %local_path.display(), "resolved local artifact");
        Ok(ResolvedArtifact { manifest, local_path })
    }

    async fn register(&self, artifact: NewArtifact) -> StoreResult<ArtifactManifest> {
        validate_name(&artifact.name)?;
        let metadata = artifact.metadata()?;
        file_size(&artifact.path)?;

        // Orphaned directories still take up their version number.
        let version = self
            .scan_versions(&artifact.name, false)?
            .last()
            .map_or(0, |v| v + 1);
        let dir = self.version_dir(&artifact.name, version);
        fs::create_dir_all(self.artifact_dir(&artifact.name))?;
        fs::create_dir(&dir)?;

        let stored_path = dir.join(&metadata.file_name);
        fs::copy(&artifact.path, &stored_path)?;

        let manifest = ArtifactManifest {
            name: metadata.name,
            version,
            artifact_type: metadata.artifact_type,
            description: metadata.description,
            file_name: metadata.file_name,
            size_bytes: file_size(&stored_path)?,
            created_at: chrono::Utc::now().to_rfc3339(),
            parent: metadata.parent,
            producer: metadata.producer,
        };

        let content = serde_json::to_string_pretty(&manifest)?;
        fs::write(dir.join(MANIFEST_FILE), content)?;

        debug!(artifact = %manifest.reference(), "registered local artifact");
        Ok(manifest)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::tempdir;

    fn new_artifact(path: PathBuf, name: &str) -> NewArtifact {
        NewArtifact {
            path,
            name: name.to_string(),
            artifact_type: "raw_data".to_string(),
            description: "Raw listings".to_string(),
            parent: None,
            producer: None,
        }
    }

    #[tokio::test]
    async fn test_register_then_resolve_latest() {
        let dir = tempdir().unwrap();
        let store = LocalStore::new(dir.path().join("store"));

        let file = dir.path().join("sample.csv");
        fs::write(&file, "price\n10\n").unwrap();
        let first = store.register(new_artifact(file.clone(), "sample.csv")).await.unwrap();
        assert_eq!(first.version, 0);
        assert_eq!(first.size_bytes, 9);

        fs::write(&file, "price\n20\n").unwrap();
        let second = store.register(new_artifact(file, "sample.csv")).await.unwrap();
        assert_eq!(second.version, 1);

        let resolved = store.resolve(&"sample.csv".parse().unwrap()).await.unwrap();
        assert_eq!(resolved.manifest.version, 1);
        assert_eq!(fs::read_to_string(&resolved.local_path).unwrap(), "price\n20\n");

        let pinned = store.resolve(&"sample.csv:v0".parse().unwrap()).await.unwrap();
        assert_eq!(fs::read_to_string(&pinned.local_path).unwrap(), "price\n10\n");
        assert_eq!(store.versions("sample.csv").unwrap(), vec![0, 1]);
    }

    #[tokio::test]
    async fn test_unknown_artifact_not_found() {
        let dir = tempdir().unwrap();
        let store = LocalStore::new(dir.path());

        let err = store.resolve(&"missing.csv".parse().unwrap()).await.unwrap_err();
        assert!(matches!(err, StoreError::NotFound { .. }));
        assert_eq!(err.to_string(), "Artifact not found: missing.csv:latest");
    }

    #[tokio::test]
    async fn test_unknown_version_not_found() {
        let dir = tempdir().unwrap();
        let store = LocalStore::new(dir.path().join("store"));
        let file = dir.path().join("sample.csv");
        fs::write(&file, "price\n").unwrap();
        store.register(new_artifact(file, "sample.csv")).await.unwrap();

        let err = store.resolve(&"sample.csv:v7".parse().unwrap()).await.unwrap_err();
        assert!(matches!(err, StoreError::NotFound { ref version, .. } if version == "v7"));
    }

    #[tokio::test]
    async fn test_register_missing_file_fails() {
        let dir = tempdir().unwrap();
        let store = LocalStore::new(dir.path());
        let err = store
            .register(new_artifact(dir.path().join("nope.csv"), "nope.csv"))
            .await
            .unwrap_err();
        assert!(matches!(err, StoreError::Io(_)));
    }

    #[tokio::test]
    async fn test_register_skips_orphaned_version_dir() {
        let dir = tempdir().unwrap();
        let store = LocalStore::new(dir.path().join("store"));
        fs::create_dir_all(dir.path().join("store/clean.csv/v0")).unwrap();

        let file = dir.path().join("clean.csv");
        fs::write(&file, "price\n10\n").unwrap();
        let manifest = store.register(new_artifact(file, "clean.csv")).await.unwrap();
        assert_eq!(manifest.version, 1);

        let resolved = store.resolve(&"clean.csv".parse().unwrap()).await.unwrap();
        assert_eq!(resolved.manifest.version, 1);
        assert_eq!(store.versions("clean.csv").unwrap(), vec![1]);

        let err = store.resolve(&"clean.csv:v0".parse().unwrap()).await.unwrap_err();
        assert!(matches!(err, StoreError::NotFound { .. }));
    }

    #[tokio::test]
    async fn test_lineage_is_stored() {
        let dir = tempdir().unwrap();
        let store = LocalStore::new(dir.path().join("store"));
        let file = dir.path().join("clean_sample.csv");
        fs::write(&file, "price\n").unwrap();

        let mut artifact = new_artifact(file, "clean_sample.csv");
        artifact.parent = Some(ArtifactRef::exact("sample.csv", 4).unwrap());
        store.register(artifact).await.unwrap();

        let resolved = store.resolve(&"clean_sample.csv".parse().unwrap()).await.unwrap();
        assert_eq!(resolved.manifest.parent.as_deref(), Some("sample.csv:v4"));
        assert_eq!(resolved.manifest.artifact_type, "raw_data");
    }
}

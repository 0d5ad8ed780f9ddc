//! Artifact store access.
//!
//! The job needs exactly two operations from a store: turn a reference into a
//! local file ([`ArtifactStore::resolve`]) and publish a local file as a new
//! artifact version ([`ArtifactStore::register`]).
//!
//! Backends:
//! - [`LocalStore`] - versioned artifacts in a directory tree
//! - [`HttpStore`] - a REST artifact service
//!
//! [`Store`] picks one of them from [`StoreConfig`].

pub mod http;
pub mod local;

use std::fmt;
use std::path::{Path, PathBuf};
use std::str::FromStr;

use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

use crate::config::{StoreBackend, StoreConfig};
use crate::error::{StoreError, StoreResult};

pub use http::HttpStore;
pub use local::LocalStore;

// =============================================================================
// References
// =============================================================================

/// Which version of an artifact a reference points to.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum VersionSpec {
    /// Highest registered version.
    Latest,
    /// A specific version `vN`.
    Exact(u32),
}

impl fmt::Display for VersionSpec {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            VersionSpec::Latest => f.write_str("latest"),
            VersionSpec::Exact(n) => write!(f, "v{}", n),
        }
    }
}

impl FromStr for VersionSpec {
    type Err = StoreError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        if s == "latest" {
            return Ok(VersionSpec::Latest);
        }
        s.strip_prefix('v')
            .and_then(|n| n.parse::<u32>().ok())
            .map(VersionSpec::Exact)
            .ok_or_else(|| StoreError::InvalidReference(s.to_string()))
    }
}

/// `name[:version]` reference to an artifact.
///
/// ```
/// use basic_cleaning::store::{ArtifactRef, VersionSpec};
///
/// let r: ArtifactRef = "sample.csv:v2".parse().unwrap();
/// assert_eq!(r.name, "sample.csv");
/// assert_eq!(r.version, VersionSpec::Exact(2));
///
/// let r: ArtifactRef = "sample.csv".parse().unwrap();
/// assert_eq!(r.version, VersionSpec::Latest);
/// ```
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct ArtifactRef {
    pub name: String,
    pub version: VersionSpec,
}

impl ArtifactRef {
    pub fn latest(name: impl Into<String>) -> StoreResult<Self> {
        let name = name.into();
        validate_name(&name)?;
        Ok(Self { name, version: VersionSpec::Latest })
    }

    pub fn exact(name: impl Into<String>, version: u32) -> StoreResult<Self> {
        let name = name.into();
        validate_name(&name)?;
        Ok(Self { name, version: VersionSpec::Exact(version) })
    }
}

impl fmt::Display for ArtifactRef {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}:{}", self.name, self.version)
    }
}

impl FromStr for ArtifactRef {
    type Err = StoreError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let (name, version) = match s.split_once(':') {
            Some((name, version)) => {
                let version = version
                    .parse()
                    .map_err(|_| StoreError::InvalidReference(s.to_string()))?;
                (name, version)
            }
            None => (s, VersionSpec::Latest),
        };
        validate_name(name).map_err(|_| StoreError::InvalidReference(s.to_string()))?;
        Ok(Self { name: name.to_string(), version })
    }
}

/// Check that `name` is usable as an artifact name (and as a path segment).
pub fn validate_name(name: &str) -> StoreResult<()> {
    let valid_chars = name
        .chars()
        .all(|c| c.is_ascii_alphanumeric() || matches!(c, '-' | '_' | '.'));
    if name.is_empty() || name == "." || name == ".." || !valid_chars {
        return Err(StoreError::InvalidReference(name.to_string()));
    }
    Ok(())
}

// =============================================================================
// Metadata
// =============================================================================

/// The run that produced an artifact.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RunInfo {
    pub id: String,
    pub job_type: String,
    /// Job parameters, as given on the command line.
    #[serde(default)]
    pub config: Map<String, Value>,
    pub started_at: String,
}

impl RunInfo {
    /// Start a new run record with a fresh id.
    pub fn start(job_type: impl Into<String>, config: Map<String, Value>) -> Self {
        Self {
            id: uuid::Uuid::new_v4().to_string(),
            job_type: job_type.into(),
            config,
            started_at: chrono::Utc::now().to_rfc3339(),
        }
    }
}

/// Stored description of one artifact version.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ArtifactManifest {
    pub name: String,
    pub version: u32,
    #[serde(rename = "type")]
    pub artifact_type: String,
    #[serde(default)]
    pub description: String,
    pub file_name: String,
    pub size_bytes: u64,
    pub created_at: String,
    /// Concrete reference of the artifact this one was derived from.
    #[serde(default)]
    pub parent: Option<String>,
    #[serde(default)]
    pub producer: Option<RunInfo>,
}

impl ArtifactManifest {
    /// Concrete `name:vN` reference of this version.
    pub fn reference(&self) -> ArtifactRef {
        ArtifactRef {
            name: self.name.clone(),
            version: VersionSpec::Exact(self.version),
        }
    }
}

/// A resolved artifact, downloaded (or located) on local disk.
#[derive(Debug, Clone)]
pub struct ResolvedArtifact {
    pub manifest: ArtifactManifest,
    pub local_path: PathBuf,
}

impl ResolvedArtifact {
    pub fn reference(&self) -> ArtifactRef {
        self.manifest.reference()
    }
}

/// Metadata sent with a [`NewArtifact`], i.e. everything except the file.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct NewArtifactMetadata {
    pub name: String,
    #[serde(rename = "type")]
    pub artifact_type: String,
    pub description: String,
    pub file_name: String,
    pub parent: Option<String>,
    pub producer: Option<RunInfo>,
}

/// A local file to be registered as a new artifact version.
#[derive(Debug, Clone)]
pub struct NewArtifact {
    pub path: PathBuf,
    pub name: String,
    pub artifact_type: String,
    pub description: String,
    pub parent: Option<ArtifactRef>,
    pub producer: Option<RunInfo>,
}

impl NewArtifact {
    /// File name the artifact is stored under: the local file's name.
    pub fn file_name(&self) -> StoreResult<String> {
        self.path
            .file_name()
            .and_then(|n| n.to_str())
            .map(str::to_string)
            .ok_or_else(|| {
                StoreError::InvalidReference(format!("no file name in {}", self.path.display()))
            })
    }

    pub fn metadata(&self) -> StoreResult<NewArtifactMetadata> {
        Ok(NewArtifactMetadata {
            name: self.name.clone(),
            artifact_type: self.artifact_type.clone(),
            description: self.description.clone(),
            file_name: self.file_name()?,
            parent: self.parent.as_ref().map(ToString::to_string),
            producer: self.producer.clone(),
        })
    }
}

// =============================================================================
// Store trait
// =============================================================================

/// An external artifact store.
#[allow(async_fn_in_trait)]
pub trait ArtifactStore {
    /// Resolve `reference` to a concrete version available as a local file.
    async fn resolve(&self, reference: &ArtifactRef) -> StoreResult<ResolvedArtifact>;

    /// Register `artifact` as the next version of its name.
    async fn register(&self, artifact: NewArtifact) -> StoreResult<ArtifactManifest>;
}

/// The store selected by configuration.
#[derive(Debug, Clone)]
pub enum Store {
    Local(LocalStore),
    Http(HttpStore),
}

impl Store {
    pub fn from_config(config: &StoreConfig) -> StoreResult<Self> {
        match &config.backend {
            StoreBackend::Local { root } => Ok(Store::Local(LocalStore::new(root))),
            StoreBackend::Http { base_url, token, cache_dir } => Ok(Store::Http(HttpStore::new(
                base_url.clone(),
                token.clone(),
                cache_dir,
            )?)),
        }
    }
}

impl ArtifactStore for Store {
    async fn resolve(&self, reference: &ArtifactRef) -> StoreResult<ResolvedArtifact> {
        match self {
            Store::Local(store) => store.resolve(reference).await,
            Store::Http(store) => store.resolve(reference).await,
        }
    }

    async fn register(&self, artifact: NewArtifact) -> StoreResult<ArtifactManifest> {
        match self {
            Store::Local(store) => store.register(artifact).await,
            Store::Http(store) => store.register(artifact).await,
        }
    }
}

/// Size of a local file in bytes.
fn file_size(path: &Path) -> StoreResult<u64> {
    Ok(std::fs::metadata(path)?.len())
}

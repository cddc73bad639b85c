pub mod models;

use std::collections::BTreeMap;
use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};
use tokio::sync::Mutex;

use crate::models::Instance;

/// Instance records keyed by [`Instance::id`].
pub type InstanceMap = BTreeMap<String, Instance>;

#[derive(Debug, thiserror::Error)]
pub enum Error {
    #[error("reading state file {}: {source}", path.display())]
    Read {
        path: PathBuf,
        source: std::io::Error,
    },

    #[error("writing state file {}: {source}", path.display())]
    Write {
        path: PathBuf,
        source: std::io::Error,
    },

    #[error("decoding state file {}: {source}", path.display())]
    Decode {
        path: PathBuf,
        source: serde_json::Error,
    },

    #[error("encoding state: {0}")]
    Encode(#[from] serde_json::Error),
}

pub type Result<T> = std::result::Result<T, Error>;

#[derive(Default, Deserialize)]
struct StateFile {
    #[serde(default)]
    instances: InstanceMap,
}

#[derive(Serialize)]
struct StateFileRef<'a> {
    instances: &'a InstanceMap,
}

/// Process-wide instance store.
///
/// Reads hand out a snapshot; writes go through [`LocalState::modify_instances`],
/// which applies a mutation exclusively and persists it before returning.
/// Share it as `Arc<LocalState>`.
pub struct LocalState {
    path: Option<PathBuf>,
    instances: Mutex<InstanceMap>,
}

impl LocalState {
    /// Store with no backing file. Mutations are never persisted.
    pub fn in_memory() -> Self {
        Self::with_instances(InstanceMap::new())
    }

    /// In-memory store seeded with `instances`.
    pub fn with_instances(instances: InstanceMap) -> Self {
        Self {
            path: None,
            instances: Mutex::new(instances),
        }
    }

    /// Open the state file at `path`, starting empty if it does not exist yet.
    pub async fn open(path: impl Into<PathBuf>) -> Result<Self> {
        let path = path.into();

        let state = match tokio::fs::read(&path).await {
            Ok(bytes) => serde_json::from_slice::<StateFile>(&bytes).map_err(|source| {
                Error::Decode {
                    path: path.clone(),
                    source,
                }
            })?,
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => {
                tracing::debug!(path = %path.display(), "no state file yet, starting empty");
                StateFile::default()
            }
            Err(source) => return Err(Error::Read { path, source }),
        };

        tracing::info!(
            path = %path.display(),
            instances = state.instances.len(),
            "loaded instance state"
        );

        Ok(Self {
            path: Some(path),
            instances: Mutex::new(state.instances),
        })
    }

    /// Point-in-time copy of every known instance.
    pub async fn instances(&self) -> InstanceMap {
        self.instances.lock().await.clone()
    }

    /// Apply `mutate` under the store lock, persist the result, and hand
    /// back whatever `mutate` returned.
    ///
    /// `mutate` sees the current records, not a caller's earlier snapshot.
    /// It runs against a working copy; memory is only updated once the write
    /// has landed, so a failed persist changes nothing.
    pub async fn modify_instances<F, R>(&self, mutate: F) -> Result<R>
    where
        F: FnOnce(&mut InstanceMap) -> R,
    {
        let mut guard = self.instances.lock().await;

        let mut working = guard.clone();
        let out = mutate(&mut working);

        if let Some(path) = &self.path {
            persist(path, &working).await?;
        }

        *guard = working;
        Ok(out)
    }
}

/// Write via a sibling temp file and rename, so readers never see a torn file.
async fn persist(path: &Path, instances: &InstanceMap) -> Result<()> {
    let bytes = serde_json::to_vec_pretty(&StateFileRef { instances })?;

    let mut tmp = path.as_os_str().to_owned();
    tmp.push(".tmp");
    let tmp = PathBuf::from(tmp);

    tokio::fs::write(&tmp, &bytes)
        .await
        .map_err(|source| Error::Write {
            path: tmp.clone(),
            source,
        })?;

    tokio::fs::rename(&tmp, path)
        .await
        .map_err(|source| Error::Write {
            path: path.to_path_buf(),
            source,
        })?;

    tracing::debug!(path = %path.display(), instances = instances.len(), "persisted instance state");
    Ok(())
}

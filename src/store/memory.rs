use crate::core::cache::{Artifact, ArtifactStore, Resource};
use async_trait::async_trait;
use std::collections::HashMap;
use std::io;
use std::sync::Arc;
use std::time::SystemTime;
use tokio::sync::Mutex;
use tracing::debug;

/// In-memory artifact store. Nothing survives a restart.
#[derive(Clone, Default)]
pub struct MemoryStore {
    inner: Arc<Mutex<HashMap<Resource, Artifact>>>,
}

impl MemoryStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Backdates (or forwards) an existing artifact's mtime. Returns false
    /// when the artifact is absent.
    pub async fn set_modified(&self, resource: Resource, modified: SystemTime) -> bool {
        let mut artifacts = self.inner.lock().await;
        match artifacts.get_mut(&resource) {
            Some(artifact) => {
                artifact.modified = modified;
                true
            }
            None => false,
        }
    }

    /// Seeds an artifact with an explicit mtime.
    pub async fn insert(&self, resource: Resource, bytes: Vec<u8>, modified: SystemTime) {
        self.inner
            .lock()
            .await
            .insert(resource, Artifact { bytes, modified });
    }
}

fn not_found(resource: Resource) -> io::Error {
    io::Error::new(
        io::ErrorKind::NotFound,
        format!("no cached {resource} artifact"),
    )
}

#[async_trait]
impl ArtifactStore for MemoryStore {
    async fn load(&self, resource: Resource) -> io::Result<Artifact> {
        let artifacts = self.inner.lock().await;
        match artifacts.get(&resource) {
            Some(artifact) => {
                debug!(%resource, "Cache HIT");
                Ok(artifact.clone())
            }
            None => {
                debug!(%resource, "Cache MISS");
                Err(not_found(resource))
            }
        }
    }

    async fn store(&self, resource: Resource, bytes: Vec<u8>) -> io::Result<()> {
        debug!(%resource, "Cache PUT");
        self.insert(resource, bytes, SystemTime::now()).await;
        Ok(())
    }

    async fn modified(&self, resource: Resource) -> io::Result<SystemTime> {
        let artifacts = self.inner.lock().await;
        artifacts
            .get(&resource)
            .map(|artifact| artifact.modified)
            .ok_or_else(|| not_found(resource))
    }
}

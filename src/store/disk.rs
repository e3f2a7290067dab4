use crate::core::cache::{Artifact, ArtifactStore, Resource};
use async_trait::async_trait;
use std::io::{self, Write};
use std::path::{Path, PathBuf};
use std::time::SystemTime;
use tokio::io::AsyncReadExt;
use tracing::debug;

/// File-backed artifact store. Each resource lives in one file under `dir`
/// and its mtime doubles as the freshness clock.
#[derive(Debug, Clone)]
pub struct DiskStore {
    dir: PathBuf,
}

impl DiskStore {
    /// Opens the store, creating `dir` (mode 0755 on unix) if it is missing.
    pub fn open(dir: impl Into<PathBuf>) -> io::Result<Self> {
        let dir = dir.into();
        let mut builder = std::fs::DirBuilder::new();
        builder.recursive(true);
        #[cfg(unix)]
        {
            use std::os::unix::fs::DirBuilderExt;
            builder.mode(0o755);
        }
        builder.create(&dir)?;
        debug!(dir = %dir.display(), "Opened cache directory");
        Ok(Self { dir })
    }

    pub fn dir(&self) -> &Path {
        &self.dir
    }

    pub fn path(&self, resource: Resource) -> PathBuf {
        self.dir.join(resource.file_name())
    }
}

/// Writes `bytes` to a temp file beside `target` and renames it into place.
fn replace_atomically(dir: &Path, target: &Path, bytes: &[u8]) -> io::Result<()> {
    let mut tmp = tempfile::Builder::new()
        .prefix(".fxgate-")
        .suffix(".tmp")
        .tempfile_in(dir)?;
    tmp.write_all(bytes)?;
    tmp.as_file().sync_all()?;
    #[cfg(unix)]
    {
        use std::os::unix::fs::PermissionsExt;
        tmp.as_file()
            .set_permissions(std::fs::Permissions::from_mode(0o644))?;
    }
    tmp.persist(target).map_err(|e| e.error)?;
    Ok(())
}

#[async_trait]
impl ArtifactStore for DiskStore {
    async fn load(&self, resource: Resource) -> io::Result<Artifact> {
        // One handle for both, so a concurrent rename cannot mix generations
        let mut file = tokio::fs::File::open(self.path(resource)).await?;
        let modified = file.metadata().await?.modified()?;
        let mut bytes = Vec::new();
        file.read_to_end(&mut bytes).await?;
        debug!(%resource, len = bytes.len(), "Cache READ");
        Ok(Artifact { bytes, modified })
    }

    async fn store(&self, resource: Resource, bytes: Vec<u8>) -> io::Result<()> {
        let dir = self.dir.clone();
        let target = self.path(resource);
        let len = bytes.len();
        tokio::task::spawn_blocking(move || replace_atomically(&dir, &target, &bytes))
            .await
            .map_err(io::Error::other)??;
        debug!(%resource, len, "Cache WRITE");
        Ok(())
    }

    async fn modified(&self, resource: Resource) -> io::Result<SystemTime> {
        tokio::fs::metadata(self.path(resource)).await?.modified()
    }
}

use async_trait::async_trait;
use std::fmt::Display;
use std::io;
use std::time::SystemTime;

/// The two artifacts the service caches.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Resource {
    Rates,
    Symbols,
}

impl Resource {
    /// Canonical file name inside the data directory.
    pub fn file_name(&self) -> &'static str {
        match self {
            Resource::Rates => "rates.json",
            Resource::Symbols => "currencies.json",
        }
    }
}

impl Display for Resource {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(
            f,
            "{}",
            match self {
                Resource::Rates => "rates",
                Resource::Symbols => "symbols",
            }
        )
    }
}

/// Persisted bytes together with their modification time.
#[derive(Debug, Clone, PartialEq)]
pub struct Artifact {
    pub bytes: Vec<u8>,
    pub modified: SystemTime,
}

/// Storage for cached artifacts. A missing artifact is reported as an
/// [`io::ErrorKind::NotFound`] error.
#[async_trait]
pub trait ArtifactStore: Send + Sync {
    async fn load(&self, resource: Resource) -> io::Result<Artifact>;

    /// Replaces the artifact. Readers see either the old or the new bytes.
    async fn store(&self, resource: Resource, bytes: Vec<u8>) -> io::Result<()>;

    async fn modified(&self, resource: Resource) -> io::Result<SystemTime>;
}

use std::{future::Future, io::ErrorKind, path::PathBuf};

use anyhow::Result;
use fs4::tokio::AsyncFileExt;
use tokio::{
    fs::File,
    io::{AsyncReadExt, AsyncWriteExt, BufReader},
};
use tracing::{debug, warn};

use super::entities::StatsDocument;

/// Interface for abstracting persistence of the stats document.
pub trait StatsStorage {
    /// Reads the whole document. A storage that was never written to reads
    /// as an empty document.
    fn load(&self) -> impl Future<Output = Result<StatsDocument>> + Send;

    /// Replaces the whole document.
    fn store(&self, document: &StatsDocument) -> impl Future<Output = Result<()>> + Send;
}

/// The main realization of [StatsStorage]: one JSON file, guarded with
/// advisory file locks so a CLI read never observes a half-written document.
pub struct JsonStatsStorage {
    path: PathBuf,
}

impl JsonStatsStorage {
    pub fn new(path: PathBuf) -> Result<Self, std::io::Error> {
        if let Some(parent) = path.parent() {
            std::fs::create_dir_all(parent)?;
        }
        Ok(Self { path })
    }

    async fn write_document(file: &mut File, document: &StatsDocument) -> Result<()> {
        let buffer = serde_json::to_vec(document)?;
        file.set_len(0).await?;
        file.write_all(&buffer).await?;
        file.flush().await?;
        Ok(())
    }
}

impl StatsStorage for JsonStatsStorage {
    async fn load(&self) -> Result<StatsDocument> {
        debug!("Loading stats document from {:?}", self.path);
        let file = match File::open(&self.path).await {
            Ok(v) => v,
            Err(e) if e.kind() == ErrorKind::NotFound => return Ok(StatsDocument::default()),
            Err(e) => return Err(e.into()),
        };
        file.lock_shared()?;
        let mut reader = BufReader::new(file);
        let mut contents = String::new();
        reader.read_to_string(&mut contents).await?;
        reader.into_inner().unlock_async().await?;

        match serde_json::from_str(&contents) {
            Ok(document) => Ok(document),
            Err(e) => {
                // Might happen after a shutdown cut a write short.
                warn!(
                    "Stats document at {:?} is corrupted, starting from an empty one: {e}",
                    self.path
                );
                Ok(StatsDocument::default())
            }
        }
    }

    async fn store(&self, document: &StatsDocument) -> Result<()> {
        let mut file = File::options()
            .write(true)
            .create(true)
            .truncate(false)
            .open(&self.path)
            .await?;

        // Semi-safe acquire-release for the file
        file.lock_exclusive()?;
        let result = Self::write_document(&mut file, document).await;
        file.unlock_async().await?;
        result
    }
}

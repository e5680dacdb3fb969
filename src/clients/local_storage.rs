use log::{debug, info, warn};
use std::path::{Path, PathBuf};

use crate::clients::errors::Error;
use crate::library::SongCollection;

const LIBRARY_FILE: &str = "my_music.json";
const LIBRARY_ENV: &str = "RSHUFFLE_LIBRARY";

/// JSON file holding the song library. Read once and overwritten once per run.
pub struct LocalStorage {
    path: PathBuf,
}

impl LocalStorage {
    /// Storage backed by the file at `path`
    pub fn new(path: impl Into<PathBuf>) -> Self {
        LocalStorage { path: path.into() }
    }

    /// Library location from RSHUFFLE_LIBRARY, falling back to the local data directory
    pub fn try_default() -> Result<Self, Error> {
        if let Ok(path) = std::env::var(LIBRARY_ENV) {
            if path.trim().is_empty() {
                return Err(Error::ConfigurationError(format!(
                    "{LIBRARY_ENV} is set but empty"
                )));
            }
            debug!("Using library file from {LIBRARY_ENV}: {path}");
            return Ok(LocalStorage::new(path));
        }
        let path = dirs::data_local_dir()
            .unwrap_or_else(|| PathBuf::from(".")) // Fallback to cwd if data directory can't be determined
            .join("rshuffle")
            .join(LIBRARY_FILE);
        Ok(LocalStorage::new(path))
    }

    /// Location of the library file
    pub fn path(&self) -> &Path {
        &self.path
    }

    /// A missing or unreadable library is the first-run case, not a failure
    pub async fn load(&self) -> SongCollection {
        let contents = match tokio::fs::read_to_string(&self.path).await {
            Ok(contents) => contents,
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => {
                info!(
                    "Library {:?} not found, starting with an empty library",
                    self.path
                );
                return SongCollection::new();
            }
            Err(e) => {
                warn!("Failed to read library {:?}: {e}", self.path);
                return SongCollection::new();
            }
        };

        match serde_json::from_str::<SongCollection>(&contents) {
            Ok(collection) => {
                debug!("Loaded {} songs from {:?}", collection.len(), self.path);
                collection
            }
            Err(e) => {
                warn!(
                    "Library {:?} is malformed ({e}), starting with an empty library",
                    self.path
                );
                SongCollection::new()
            }
        }
    }

    /// Overwrites the library file, creating its directory if needed
    pub async fn save(&self, collection: &SongCollection) -> Result<(), Error> {
        if let Some(parent) = self.path.parent()
            && !parent.as_os_str().is_empty()
        {
            tokio::fs::create_dir_all(parent).await?;
        }
        let json = serde_json::to_string_pretty(collection)?;
        tokio::fs::write(&self.path, json).await?;
        info!("Saved {} songs to {:?}", collection.len(), self.path);
        Ok(())
    }
}

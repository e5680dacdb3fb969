use log::{info, warn};
use rand::SeedableRng;
use rand::rngs::StdRng;
use rshuffle::clients::{
    LocalStorage, SpotifyClient,
    errors::{Error, Result},
};
use rshuffle::library::{DEFAULT_AUDIO_FEATURE, Song, SongCollection, merge_fetch};
use rshuffle::shuffle::{PLAYLIST_LIMIT, SampleMode, WeightConfig, WeightPolicy, build_playlist};
use std::path::PathBuf;

const AUDIO_FEATURES_ENV: &str = "RSHUFFLE_AUDIO_FEATURES";

// Features tracked per song, from RSHUFFLE_AUDIO_FEATURES (comma separated)
fn tracked_features_from_env() -> Vec<String> {
    match std::env::var(AUDIO_FEATURES_ENV) {
        Ok(raw) => raw
            .split(',')
            .map(str::trim)
            .filter(|f| !f.is_empty())
            .map(String::from)
            .collect(),
        Err(_) => vec![DEFAULT_AUDIO_FEATURE.to_string()],
    }
}

// Configuration for the Shuffler struct
pub struct Config {
    pub spotify: Option<SpotifyClient>,
    pub storage: LocalStorage,
    pub audio_features: Vec<String>,
    pub playlist_limit: usize,
    pub dry_run: bool,
}

pub struct ConfigBuilder {
    library: Option<PathBuf>,
    playlist_limit: Option<usize>,
    offline: bool,
    dry_run: bool,
}

impl ConfigBuilder {
    pub fn new() -> Self {
        Self {
            library: None,
            playlist_limit: None, // Defaults to PLAYLIST_LIMIT
            offline: false,
            dry_run: false,
        }
    }

    pub fn library(mut self, path: Option<PathBuf>) -> Self {
        self.library = path;
        self
    }

    pub fn playlist_limit(mut self, limit: Option<usize>) -> Self {
        self.playlist_limit = limit;
        self
    }

    // Skip the Spotify client entirely, only the local library is available
    pub fn offline(mut self, offline: bool) -> Self {
        self.offline = offline;
        self
    }

    // Print playlists instead of creating them
    pub fn dry_run(mut self, dry_run: bool) -> Self {
        self.dry_run = dry_run;
        self
    }

    pub fn build(self) -> Result<Config> {
        let storage = match self.library {
            Some(path) => LocalStorage::new(path),
            None => LocalStorage::try_default()?,
        };
        let spotify = if self.offline {
            None
        } else {
            Some(SpotifyClient::try_default()?)
        };
        Ok(Config {
            spotify,
            storage,
            audio_features: tracked_features_from_env(),
            playlist_limit: self.playlist_limit.unwrap_or(PLAYLIST_LIMIT),
            dry_run: self.dry_run,
        })
    }
}

pub struct ShuffleRequest<'a> {
    pub playlist_name: &'a str,
    pub policy: &'a dyn WeightPolicy,
    pub weights: WeightConfig,
    pub mode: SampleMode,
    pub seed: Option<u64>,
    pub pull: bool,
}

// The main Shuffler struct that owns one run
pub struct Shuffler {
    config: Config,
}

impl Shuffler {
    pub fn new(config: Config) -> Self {
        Shuffler { config }
    }

    fn spotify(&self) -> Result<&SpotifyClient> {
        self.config.spotify.as_ref().ok_or_else(|| {
            Error::ConfigurationError("Spotify client is not configured for this command".into())
        })
    }

    pub async fn authorize(&self) -> Result<()> {
        info!("Authorizing Spotify client ...");
        // CLI prompt may be shown here
        self.spotify()?.authorize_client().await
    }

    /// Pulls liked songs into the library file and returns the merged library
    pub async fn update(&self, prune: bool) -> Result<SongCollection> {
        info!("Syncing with liked songs ...");
        let existing = self.config.storage.load().await;
        let fetched = self
            .spotify()?
            .get_liked_songs(self.config.audio_features.as_slice())
            .await?;

        match merge_fetch(existing, fetched, prune) {
            Some(merged) => {
                self.config.storage.save(&merged).await?;
                Ok(merged)
            }
            None => {
                warn!("Spotify returned no liked songs, library left unchanged");
                Ok(self.config.storage.load().await)
            }
        }
    }

    async fn library(&self, pull: bool) -> Result<SongCollection> {
        let library = self.config.storage.load().await;
        if !(library.is_empty() || pull) {
            return Ok(library);
        }
        if self.config.spotify.is_none() {
            // Offline dry runs can't fill an empty library
            return Err(Error::EmptyLibrary(
                self.config.storage.path().display().to_string(),
            ));
        }
        self.update(false).await
    }

    /// Builds a playlist from the library and publishes it (or prints it on dry runs)
    pub async fn shuffle(&self, request: ShuffleRequest<'_>) -> Result<Vec<String>> {
        let library = self.library(request.pull).await?;
        let songs: Vec<Song> = library.songs().cloned().collect();

        let mut rng = match request.seed {
            Some(seed) => StdRng::seed_from_u64(seed),
            None => StdRng::from_os_rng(),
        };

        let track_ids = build_playlist(
            &songs,
            request.policy,
            &request.weights,
            request.mode,
            self.config.playlist_limit,
            &mut rng,
        )?;

        self.publish(request.playlist_name, &track_ids).await?;
        Ok(track_ids)
    }

    async fn publish(&self, name: &str, track_ids: &[String]) -> Result<()> {
        if self.config.dry_run {
            info!("Dry run, '{name}' would hold {} tracks", track_ids.len());
            for id in track_ids {
                println!("{id}");
            }
            return Ok(());
        }
        let description = format!("Generated playlist with {} Songs", track_ids.len());
        self.spotify()?
            .create_playlist_from_ids(name, &description, track_ids)
            .await?;
        Ok(())
    }

    /// Sets the stars of one song, found by track ID or "Name - Artist"
    pub async fn rate(&self, query: &str, stars: i32) -> Result<()> {
        let mut library = self.config.storage.load().await;
        let previous = library.set_stars(query, stars)?;
        info!("Rated {query}: {previous} -> {stars} stars");
        self.config.storage.save(&library).await
    }
}

use std::collections::{HashMap, HashSet};
use std::path::PathBuf;

use log::{debug, info, warn};

use crate::clients::errors::{Error, Result};
use crate::library::Song;
use futures::stream::TryStreamExt;
use rspotify::{
    AuthCodeSpotify, Config, Credentials, OAuth,
    model::{ArtistId, AudioFeatures, FullPlaylist, PlayableId, SavedTrack, TrackId},
    prelude::*,
    scopes,
};

// Spotify batch limits
const FEATURES_BATCH: usize = 100;
const ARTISTS_BATCH: usize = 50;
const PLAYLIST_ITEMS_BATCH: usize = 100;

// Liked track converted to a Song, plus its primary artist for the genre lookup
struct FetchedTrack {
    song: Song,
    artist_id: Option<ArtistId<'static>>,
}

impl FetchedTrack {
    // Local files have no Spotify ID and can't be cached
    fn from_saved<S: AsRef<str>>(saved: SavedTrack, tracked_features: &[S]) -> Option<Self> {
        let track = saved.track;
        let Some(id) = track.id else {
            debug!("Skipping liked track without Spotify ID: {}", track.name);
            return None;
        };
        let (artist_name, artist_id) = track
            .artists
            .into_iter()
            .next()
            .map_or_else(|| (String::new(), None), |a| (a.name, a.id));

        let mut song = Song::new(id.id(), track.name, artist_name, track.album.name)
            .with_tracked_features(tracked_features);
        song.date_added = saved.added_at.date_naive();
        Some(FetchedTrack { song, artist_id })
    }
}

fn feature_value(features: &AudioFeatures, name: &str) -> Option<f64> {
    let value = match name {
        "acousticness" => f64::from(features.acousticness),
        "danceability" => f64::from(features.danceability),
        "energy" => f64::from(features.energy),
        "instrumentalness" => f64::from(features.instrumentalness),
        "key" => f64::from(features.key),
        "liveness" => f64::from(features.liveness),
        "loudness" => f64::from(features.loudness),
        "speechiness" => f64::from(features.speechiness),
        "tempo" => f64::from(features.tempo),
        "time_signature" => f64::from(features.time_signature),
        "valence" => f64::from(features.valence),
        _ => return None,
    };
    Some(value)
}

/// Authenticated access to the Spotify Web API for one run
pub struct SpotifyClient {
    /// Underlying rspotify client
    pub spotify: AuthCodeSpotify,
}

impl SpotifyClient {
    /// Wraps an already configured rspotify client
    pub fn new(spotify: AuthCodeSpotify) -> Self {
        SpotifyClient { spotify }
    }

    /// Fetches every liked song, with the tracked audio features and the
    /// primary artist's genres filled in where Spotify provides them
    pub async fn get_liked_songs<S: AsRef<str>>(&self, tracked_features: &[S]) -> Result<Vec<Song>> {
        let stream = self.spotify.current_user_saved_tracks(None);
        let saved: Vec<SavedTrack> = stream.try_collect().await?;
        debug!("Fetched {} liked tracks from Spotify", saved.len());

        let mut fetched: Vec<FetchedTrack> = saved
            .into_iter()
            .filter_map(|s| FetchedTrack::from_saved(s, tracked_features))
            .collect();

        if !tracked_features.is_empty() {
            self.fill_audio_features(&mut fetched).await;
        }
        self.fill_genres(&mut fetched).await;

        info!("Loaded {} liked songs", fetched.len());
        Ok(fetched.into_iter().map(|f| f.song).collect())
    }

    // Audio features are restricted for many apps (403). Missing features are
    // left empty instead of failing the fetch.
    async fn fill_audio_features(&self, fetched: &mut [FetchedTrack]) {
        let index: HashMap<String, usize> = fetched
            .iter()
            .enumerate()
            .map(|(i, f)| (f.song.id.clone(), i))
            .collect();
        let mut track_ids = Vec::with_capacity(fetched.len());
        for f in fetched.iter() {
            match TrackId::from_id(f.song.id.clone()) {
                Ok(id) => track_ids.push(id),
                Err(e) => warn!("Skipping audio features for {}: {e}", f.song.id),
            }
        }

        for chunk in track_ids.chunks(FEATURES_BATCH) {
            let features = match self.spotify.tracks_features(chunk.to_vec()).await {
                Ok(Some(features)) => features,
                Ok(None) => continue,
                Err(e) => {
                    warn!("Failed to fetch audio features, continuing without them: {e}");
                    return;
                }
            };
            for feature_set in features {
                let Some(&i) = index.get(feature_set.id.id()) else {
                    continue;
                };
                let song = &mut fetched[i].song;
                let tracked: Vec<String> = song.audio_features.keys().cloned().collect();
                for name in tracked {
                    if let Some(value) = feature_value(&feature_set, &name) {
                        song.set_audio_feature(&name, value);
                    }
                }
            }
        }
    }

    async fn fill_genres(&self, fetched: &mut [FetchedTrack]) {
        let artist_ids: Vec<ArtistId<'static>> = fetched
            .iter()
            .filter_map(|f| f.artist_id.clone())
            .collect::<HashSet<_>>()
            .into_iter()
            .collect();

        let mut genres: HashMap<String, Vec<String>> = HashMap::new();
        for chunk in artist_ids.chunks(ARTISTS_BATCH) {
            match self.spotify.artists(chunk.to_vec()).await {
                Ok(artists) => {
                    for artist in artists {
                        genres.insert(artist.id.id().to_string(), artist.genres);
                    }
                }
                Err(e) => {
                    warn!("Failed to fetch artist genres, continuing without them: {e}");
                    break;
                }
            }
        }

        for f in fetched.iter_mut() {
            if let Some(artist_genres) = f.artist_id.as_ref().and_then(|id| genres.get(id.id())) {
                f.song.add_genres(artist_genres.iter().cloned());
            }
        }
    }

    /// Creates a private playlist holding `track_ids` in order
    pub async fn create_playlist_from_ids(
        &self,
        name: &str,
        description: &str,
        track_ids: &[String],
    ) -> Result<FullPlaylist> {
        let items = track_ids
            .iter()
            .map(|id| TrackId::from_id(id.clone()).map(PlayableId::Track))
            .collect::<std::result::Result<Vec<_>, _>>()?;

        let user = self.spotify.me().await?;
        let playlist = self
            .spotify
            .user_playlist_create(user.id, name, Some(false), Some(false), Some(description))
            .await?;
        debug!("Created playlist {:?}", playlist.id);

        if items.is_empty() {
            warn!("Creating empty playlist '{name}'");
        }
        for chunk in items.chunks(PLAYLIST_ITEMS_BATCH) {
            self.spotify
                .playlist_add_items(playlist.id.clone(), chunk.to_vec(), None)
                .await?;
        }

        info!("Created playlist '{name}' with {} tracks", items.len());
        if let Some(url) = playlist.external_urls.get("spotify") {
            info!("{url}");
        }
        Ok(playlist)
    }

    /// Authorize the Spotify client via CLI prompt and OAuth flow
    // This function requires the `cli` feature enabled.
    pub async fn authorize_client(&self) -> Result<()> {
        debug!("Starting Spotify authorization ...");
        let url = self.spotify.get_authorize_url(false)?;
        // Opens the browser unless a cached token is still valid
        self.spotify.prompt_for_token(&url).await?;
        let user = self.spotify.me().await?;
        info!("Authenticated as: {:?}", user.display_name);
        Ok(())
    }

    /// Create a SpotifyClient from environment variables or raise a configuration error
    pub fn try_default() -> Result<Self> {
        let creds = Credentials::from_env()
        .ok_or_else(|| Error::ConfigurationError("Missing Spotify credentials, set RSPOTIFY_CLIENT_ID and RSPOTIFY_CLIENT_SECRET".into()))?;
        let oauth = OAuth::from_env(scopes!(
            "user-library-read",
            "user-read-private",
            "playlist-read-private",
            "playlist-modify-public",
            "playlist-modify-private"
        ))
        .ok_or_else(|| Error::ConfigurationError("Missing Spotify OAuth configuration, set RSPOTIFY_REDIRECT_URI".into()))?;

        let cache_path = dirs::cache_dir()
            .unwrap_or_else(|| PathBuf::from("/tmp")) // Fallback to /tmp if cache directory can't be determined
            .join(".rshuffle_token_cache");

        let spotify = AuthCodeSpotify::with_config(
            creds,
            oauth,
            Config {
                token_cached: true,
                token_refreshing: true,
                cache_path,
                ..Default::default()
            },
        );

        Ok(Self::new(spotify))
    }
}


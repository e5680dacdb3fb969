use std::collections::{BTreeMap, HashMap, HashSet};

use log::{debug, info};
use serde::{Deserialize, Deserializer, Serialize, Serializer};

use crate::clients::errors::{Error, Result};
use crate::library::song::{DEFAULT_STARS, Song};

/// Songs keyed by Spotify track ID.
///
/// Serialized as a JSON object keyed by ID. A `BTreeMap` keeps the file
/// sorted so consecutive saves diff cleanly.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct SongCollection {
    songs: BTreeMap<String, Song>,
}

impl SongCollection {
    /// Empty library
    pub fn new() -> Self {
        Self::default()
    }

    /// Number of songs
    pub fn len(&self) -> usize {
        self.songs.len()
    }

    /// True when no song is stored
    pub fn is_empty(&self) -> bool {
        self.songs.is_empty()
    }

    /// Song by track ID
    pub fn get(&self, id: &str) -> Option<&Song> {
        self.songs.get(id)
    }

    /// True when the track ID is stored
    pub fn contains(&self, id: &str) -> bool {
        self.songs.contains_key(id)
    }

    /// Inserts or replaces a song under its own ID
    pub fn insert(&mut self, song: Song) -> Option<Song> {
        self.songs.insert(song.id.clone(), song)
    }

    /// Songs in track ID order
    pub fn songs(&self) -> impl Iterator<Item = &Song> {
        self.songs.values()
    }

    /// Track IDs in order
    pub fn ids(&self) -> impl Iterator<Item = &str> {
        self.songs.keys().map(String::as_str)
    }

    /// Maps "Name - Artist" to the track IDs carrying it.
    ///
    /// Single and album versions often share a name, so one key can hold
    /// several IDs.
    pub fn name_index(&self) -> HashMap<String, Vec<String>> {
        let mut index: HashMap<String, Vec<String>> = HashMap::new();
        for (id, song) in &self.songs {
            index.entry(song.display_name()).or_default().push(id.clone());
        }
        index
    }

    /// Every song matching a track ID, or else every song named "Name - Artist"
    pub fn matches(&self, query: &str) -> Vec<&Song> {
        if let Some(song) = self.songs.get(query) {
            return vec![song];
        }
        self.songs
            .values()
            .filter(|song| song.display_name() == query)
            .collect()
    }

    /// Looks a song up by track ID first, then by "Name - Artist".
    /// `None` when nothing or more than one song matches.
    pub fn find(&self, query: &str) -> Option<&Song> {
        match self.matches(query).as_slice() {
            [song] => Some(*song),
            _ => None,
        }
    }

    /// Manual rating edit. Returns the previous rating.
    pub fn set_stars(&mut self, query: &str, stars: i32) -> Result<i32> {
        let id = match self.matches(query).as_slice() {
            [] => return Err(Error::UnknownSong(query.to_string())),
            [song] => song.id.clone(),
            candidates => {
                return Err(Error::AmbiguousSong {
                    query: query.to_string(),
                    candidates: candidates.iter().map(|song| song.id.clone()).collect(),
                });
            }
        };
        let song = self
            .songs
            .get_mut(&id)
            .ok_or_else(|| Error::UnknownSong(query.to_string()))?;
        let previous = song.stars;
        song.stars = stars;
        Ok(previous)
    }

    /// Drops every song whose ID is not in `keep`. Returns the removed songs.
    pub fn prune(&mut self, keep: &HashSet<String>) -> Vec<Song> {
        let removed_ids: Vec<String> = self
            .songs
            .keys()
            .filter(|id| !keep.contains(*id))
            .cloned()
            .collect();
        removed_ids
            .into_iter()
            .filter_map(|id| self.songs.remove(&id))
            .collect()
    }
}

impl FromIterator<Song> for SongCollection {
    fn from_iter<I: IntoIterator<Item = Song>>(iter: I) -> Self {
        let mut collection = SongCollection::new();
        for song in iter {
            collection.insert(song);
        }
        collection
    }
}

impl Serialize for SongCollection {
    fn serialize<S: Serializer>(&self, serializer: S) -> std::result::Result<S::Ok, S::Error> {
        self.songs.serialize(serializer)
    }
}

impl<'de> Deserialize<'de> for SongCollection {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> std::result::Result<Self, D::Error> {
        let mut songs = BTreeMap::<String, Song>::deserialize(deserializer)?;
        // IDs live in the keys only
        for (id, song) in &mut songs {
            song.id.clone_from(id);
        }
        Ok(SongCollection { songs })
    }
}

/// Merges a fresh fetch into the stored library.
///
/// New songs are inserted unrated. Songs already in the library keep their
/// stars and `date_added` while Spotify-owned fields are refreshed. Songs
/// missing from `fetched` are left alone, and an empty fetch changes nothing.
pub fn reconcile<I>(existing: SongCollection, fetched: I) -> SongCollection
where
    I: IntoIterator<Item = Song>,
{
    let mut merged = existing;
    let mut added = 0usize;
    let mut refreshed = 0usize;

    for fresh in fetched {
        if let Some(current) = merged.songs.get_mut(&fresh.id) {
            current.refresh_from(fresh);
            refreshed += 1;
        } else {
            let mut song = fresh;
            song.stars = DEFAULT_STARS;
            merged.insert(song);
            added += 1;
        }
    }

    debug!("Reconciled library: {added} new songs, {refreshed} refreshed");
    merged
}

/// Applies one fetch to the stored library.
///
/// Returns `None` when the fetch is empty: there is nothing to merge, nothing
/// to prune and nothing to save. Otherwise the fetch is reconciled and, with
/// `prune`, songs that are no longer liked are dropped.
pub fn merge_fetch(
    existing: SongCollection,
    fetched: Vec<Song>,
    prune: bool,
) -> Option<SongCollection> {
    if fetched.is_empty() {
        return None;
    }

    let liked_ids: HashSet<String> = fetched.iter().map(|s| s.id.clone()).collect();
    let before = existing.len();
    let mut merged = reconcile(existing, fetched);
    info!(
        "Library has {} songs ({} new)",
        merged.len(),
        merged.len() - before
    );

    if prune {
        let removed = merged.prune(&liked_ids);
        info!("Pruned {} songs that are no longer liked", removed.len());
        for song in &removed {
            debug!("Pruned {}", song.display_name());
        }
    }
    Some(merged)
}

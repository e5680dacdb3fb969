use std::collections::{BTreeMap, BTreeSet};

use chrono::{Local, NaiveDate};
use serde::{Deserialize, Serialize};

/// Rating given to songs the user never rated
pub const DEFAULT_STARS: i32 = 5;

/// Audio feature tracked when nothing else is configured
pub const DEFAULT_AUDIO_FEATURE: &str = "instrumentalness";

fn default_stars() -> i32 {
    DEFAULT_STARS
}

fn today() -> NaiveDate {
    Local::now().date_naive()
}

/// A liked track as stored in the local library.
///
/// `name`, `artist`, `album`, `genres`, `audio_features` and `last_updated`
/// belong to Spotify and are refreshed on every fetch. `stars` and
/// `date_added` belong to the library and survive re-fetches.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Song {
    /// Spotify track ID. Stored as the key of the JSON object, not in the record.
    #[serde(skip)]
    pub id: String,
    /// Track title
    pub name: String,
    /// Primary artist only
    pub artist: String,
    /// Album the track was liked from
    #[serde(default)]
    pub album: String,
    /// User rating, 5 when unrated
    #[serde(default = "default_stars")]
    pub stars: i32,
    /// Genres of the primary artist
    #[serde(default)]
    pub genres: BTreeSet<String>,
    /// Tracked features. `None` until Spotify returns a value.
    #[serde(default)]
    pub audio_features: BTreeMap<String, Option<f64>>,
    /// Day the song was liked on Spotify
    #[serde(with = "day_format", default = "today")]
    pub date_added: NaiveDate,
    /// Day of the last fetch that refreshed this record
    #[serde(with = "day_format", default = "today")]
    pub last_updated: NaiveDate,
}

impl Song {
    /// Unrated song added and updated today, tracking no features
    pub fn new(
        id: impl Into<String>,
        name: impl Into<String>,
        artist: impl Into<String>,
        album: impl Into<String>,
    ) -> Self {
        let now = today();
        Song {
            id: id.into(),
            name: name.into(),
            artist: artist.into(),
            album: album.into(),
            stars: DEFAULT_STARS,
            genres: BTreeSet::new(),
            audio_features: BTreeMap::new(),
            date_added: now,
            last_updated: now,
        }
    }

    /// Registers the features to track, leaving them empty until populated
    #[must_use]
    pub fn with_tracked_features<S: AsRef<str>>(mut self, features: &[S]) -> Self {
        for feature in features {
            self.audio_features
                .entry(feature.as_ref().to_string())
                .or_insert(None);
        }
        self
    }

    /// Sets a tracked feature. Features that were never registered are ignored.
    pub fn set_audio_feature(&mut self, feature: &str, value: f64) {
        if let Some(slot) = self.audio_features.get_mut(feature) {
            *slot = Some(value);
        }
    }

    /// Value of a tracked feature, if Spotify populated it
    pub fn audio_feature(&self, feature: &str) -> Option<f64> {
        self.audio_features.get(feature).copied().flatten()
    }

    /// Adds genres, keeping the ones already known
    pub fn add_genres<I: IntoIterator<Item = String>>(&mut self, genres: I) {
        self.genres.extend(genres);
    }

    /// "Name - Artist", the human-readable key used to look songs up
    pub fn display_name(&self) -> String {
        format!("{} - {}", self.name, self.artist)
    }

    /// Whole days between `date_added` and `reference`, never negative
    pub fn days_since_added(&self, reference: NaiveDate) -> i64 {
        (reference - self.date_added).num_days().max(0)
    }

    // Refresh the fields Spotify owns from a newer fetch of the same track
    pub(crate) fn refresh_from(&mut self, fresh: Song) {
        self.name = fresh.name;
        self.artist = fresh.artist;
        self.album = fresh.album;
        self.last_updated = fresh.last_updated;
        self.genres.extend(fresh.genres);
        for (feature, value) in fresh.audio_features {
            match value {
                Some(v) => {
                    self.audio_features.insert(feature, Some(v));
                }
                // Fetch left it empty, keep whatever we had
                None => {
                    self.audio_features.entry(feature).or_insert(None);
                }
            }
        }
    }
}

mod day_format {
    use chrono::NaiveDate;
    use serde::{Deserialize, Deserializer, Serializer};

    const FORMAT: &str = "%d/%m/%Y";

    pub fn serialize<S: Serializer>(date: &NaiveDate, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.serialize_str(&date.format(FORMAT).to_string())
    }

    pub fn deserialize<'de, D: Deserializer<'de>>(deserializer: D) -> Result<NaiveDate, D::Error> {
        let raw = String::deserialize(deserializer)?;
        NaiveDate::parse_from_str(&raw, FORMAT).map_err(serde::de::Error::custom)
    }
}

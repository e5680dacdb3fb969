/// The song collection and the reconciliation of fresh fetches into it
pub mod collection;
/// A single liked track
pub mod song;

pub use collection::{SongCollection, merge_fetch, reconcile};
pub use song::{DEFAULT_AUDIO_FEATURE, DEFAULT_STARS, Song};

/// Error types and result aliases
pub mod errors;
/// Local storage of the song library as JSON
pub mod local_storage;
/// Spotify API client
pub mod spotify;

pub use local_storage::LocalStorage;
pub use spotify::SpotifyClient;

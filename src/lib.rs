//! Rshuffle - Shuffled and weighted playlists from Spotify liked songs
//!
//! Liked songs are cached in a local JSON library where the user can rate
//! them with stars. Playlists are drawn from that library, either uniformly
//! or weighted by stars and by how recently a song was liked.

/// Client modules for interacting with Spotify and local storage
pub mod clients;
/// The local song library and its reconciliation with Spotify
pub mod library;
/// Weight policies and weighted sampling
pub mod shuffle;

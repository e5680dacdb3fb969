use chrono::NaiveDate;
use rshuffle::clients::errors::Error;
use rshuffle::library::{DEFAULT_STARS, Song, SongCollection, merge_fetch, reconcile};
use std::collections::HashSet;

// Helper function to create a song as a fetch would return it
fn fetched_song(id: &str, name: &str, artist: &str) -> Song {
    let mut song = Song::new(id, name, artist, "Album").with_tracked_features(&["energy"]);
    song.date_added = NaiveDate::from_ymd_opt(2024, 1, 1).unwrap();
    song.last_updated = NaiveDate::from_ymd_opt(2025, 6, 1).unwrap();
    song
}

// Helper function to create a stored song with a rating
fn stored_song(id: &str, name: &str, stars: i32) -> Song {
    let mut song = fetched_song(id, name, "Artist");
    song.stars = stars;
    song.last_updated = NaiveDate::from_ymd_opt(2023, 1, 1).unwrap();
    song
}

fn collection(songs: Vec<Song>) -> SongCollection {
    songs.into_iter().collect()
}

#[test]
fn test_reconcile_merge_example() {
    let existing = collection(vec![stored_song("A", "Old", 5), stored_song("B", "Kept", 7)]);
    let fetched = vec![fetched_song("A", "X", "Artist"), fetched_song("C", "Y", "Artist")];

    let merged = reconcile(existing, fetched);

    assert_eq!(merged.len(), 3);
    let a = merged.get("A").unwrap();
    assert_eq!(a.stars, 5);
    assert_eq!(a.name, "X");
    let b = merged.get("B").unwrap();
    assert_eq!(b.stars, 7);
    assert_eq!(b.name, "Kept");
    let c = merged.get("C").unwrap();
    assert_eq!(c.stars, DEFAULT_STARS);
    assert_eq!(c.name, "Y");
}

#[test]
fn test_reconcile_preserves_manual_edits() {
    let mut stored = stored_song("A", "Song", 9);
    stored.date_added = NaiveDate::from_ymd_opt(2020, 2, 2).unwrap();
    let existing = collection(vec![stored]);

    let mut fresh = fetched_song("A", "Song (Remastered)", "New Artist");
    fresh.album = "Deluxe".to_string();

    let merged = reconcile(existing, vec![fresh]);
    let song = merged.get("A").unwrap();

    assert_eq!(song.stars, 9);
    assert_eq!(song.date_added, NaiveDate::from_ymd_opt(2020, 2, 2).unwrap());
    assert_eq!(song.name, "Song (Remastered)");
    assert_eq!(song.artist, "New Artist");
    assert_eq!(song.album, "Deluxe");
    assert_eq!(song.last_updated, NaiveDate::from_ymd_opt(2025, 6, 1).unwrap());
}

#[test]
fn test_reconcile_new_songs_start_unrated() {
    let mut fresh = fetched_song("N", "New", "Artist");
    fresh.stars = 10;

    let merged = reconcile(SongCollection::new(), vec![fresh]);

    assert_eq!(merged.get("N").unwrap().stars, DEFAULT_STARS);
}

#[test]
fn test_reconcile_is_idempotent() {
    let existing = collection(vec![stored_song("A", "Old", 3), stored_song("B", "Kept", 7)]);
    let mut a = fetched_song("A", "X", "Artist");
    a.set_audio_feature("energy", 0.4);
    a.add_genres(vec!["shoegaze".to_string()]);
    let fetched = vec![a, fetched_song("C", "Y", "Artist")];

    let once = reconcile(existing, fetched.clone());
    let twice = reconcile(once.clone(), fetched);

    assert_eq!(once, twice);
}

#[test]
fn test_reconcile_never_drops_songs() {
    let existing = collection(vec![
        stored_song("A", "One", 5),
        stored_song("B", "Two", 6),
        stored_song("C", "Three", 4),
    ]);
    let fetched = vec![fetched_song("B", "Two", "Artist")];

    let merged = reconcile(existing.clone(), fetched);

    assert!(merged.len() >= existing.len());
    for id in existing.ids() {
        assert!(merged.contains(id), "{id} was dropped");
    }
}

#[test]
fn test_reconcile_empty_fetch_is_noop() {
    let existing = collection(vec![stored_song("A", "One", 8)]);

    let merged = reconcile(existing.clone(), Vec::new());

    assert_eq!(merged, existing);
}

#[test]
fn test_reconcile_tolerates_missing_audio_features() {
    let mut stored = stored_song("A", "Song", 6);
    stored.set_audio_feature("energy", 0.9);
    let existing = collection(vec![stored]);

    // Features failed to populate on this fetch
    let fresh = fetched_song("A", "Song", "Artist");
    assert_eq!(fresh.audio_feature("energy"), None);

    let merged = reconcile(existing, vec![fresh]);
    assert_eq!(merged.get("A").unwrap().audio_feature("energy"), Some(0.9));

    // A populated value replaces the stored one
    let mut newer = fetched_song("A", "Song", "Artist");
    newer.set_audio_feature("energy", 0.3);
    let merged = reconcile(merged, vec![newer]);
    assert_eq!(merged.get("A").unwrap().audio_feature("energy"), Some(0.3));
}

#[test]
fn test_reconcile_unions_genres() {
    let mut stored = stored_song("A", "Song", 5);
    stored.add_genres(vec!["indie".to_string()]);
    let mut fresh = fetched_song("A", "Song", "Artist");
    fresh.add_genres(vec!["dream pop".to_string()]);

    let merged = reconcile(collection(vec![stored]), vec![fresh]);
    let genres: Vec<&str> = merged
        .get("A")
        .unwrap()
        .genres
        .iter()
        .map(String::as_str)
        .collect();

    assert_eq!(genres, vec!["dream pop", "indie"]);
}

#[test]
fn test_prune_removes_unliked_songs() {
    let mut library = collection(vec![
        stored_song("A", "One", 5),
        stored_song("B", "Two", 6),
    ]);
    let liked: HashSet<String> = ["B".to_string()].into_iter().collect();

    let removed = library.prune(&liked);

    assert_eq!(removed.len(), 1);
    assert_eq!(removed[0].id, "A");
    assert!(!library.contains("A"));
    assert!(library.contains("B"));
}

#[test]
fn test_set_stars_by_id_and_display_name() {
    let mut library = collection(vec![
        stored_song("A", "One", 5),
        fetched_song("B", "Two", "Band"),
    ]);

    assert_eq!(library.set_stars("A", 8).unwrap(), 5);
    assert_eq!(library.get("A").unwrap().stars, 8);

    assert_eq!(library.set_stars("Two - Band", 2).unwrap(), DEFAULT_STARS);
    assert_eq!(library.get("B").unwrap().stars, 2);

    assert!(matches!(
        library.set_stars("Missing - Nobody", 3),
        Err(Error::UnknownSong(_))
    ));
}

#[test]
fn test_set_stars_ambiguous_name_lists_candidates() {
    let mut library = collection(vec![
        stored_song("single", "Same", 6),
        stored_song("album", "Same", 4),
    ]);

    match library.set_stars("Same - Artist", 9) {
        Err(Error::AmbiguousSong { query, candidates }) => {
            assert_eq!(query, "Same - Artist");
            assert_eq!(candidates, vec!["album".to_string(), "single".to_string()]);
        }
        other => panic!("expected an ambiguity error, got {other:?}"),
    }
    assert_eq!(library.get("single").unwrap().stars, 6);
    assert_eq!(library.get("album").unwrap().stars, 4);
    assert!(library.find("Same - Artist").is_none());

    // A track ID still picks one of them
    assert_eq!(library.set_stars("album", 9).unwrap(), 4);
    assert_eq!(library.get("single").unwrap().stars, 6);
}

#[test]
fn test_name_index_maps_display_names() {
    let library = collection(vec![
        fetched_song("B", "Two", "Band"),
        fetched_song("C", "Two", "Band"),
        fetched_song("D", "Three", "Band"),
    ]);
    let index = library.name_index();

    let mut two = index.get("Two - Band").cloned().unwrap();
    two.sort();
    assert_eq!(two, vec!["B".to_string(), "C".to_string()]);
    assert_eq!(index.get("Three - Band"), Some(&vec!["D".to_string()]));
}

#[test]
fn test_merge_fetch_empty_fetch_with_prune_keeps_library() {
    let existing = collection(vec![stored_song("A", "One", 8), stored_song("B", "Two", 3)]);

    assert!(merge_fetch(existing.clone(), Vec::new(), true).is_none());
    assert!(merge_fetch(existing.clone(), Vec::new(), false).is_none());
    assert_eq!(existing.len(), 2);
}

#[test]
fn test_merge_fetch_prunes_unliked_songs() {
    let existing = collection(vec![stored_song("A", "One", 8), stored_song("B", "Two", 3)]);
    let fetched = vec![fetched_song("A", "One", "Artist"), fetched_song("C", "New", "Artist")];

    let merged = merge_fetch(existing, fetched, true).unwrap();

    assert_eq!(merged.len(), 2);
    assert!(!merged.contains("B"));
    assert_eq!(merged.get("A").unwrap().stars, 8);
    assert_eq!(merged.get("C").unwrap().stars, DEFAULT_STARS);
}

#[test]
fn test_merge_fetch_without_prune_keeps_unliked_songs() {
    let existing = collection(vec![stored_song("A", "One", 8), stored_song("B", "Two", 3)]);
    let fetched = vec![fetched_song("C", "New", "Artist")];

    let merged = merge_fetch(existing, fetched, false).unwrap();

    assert_eq!(merged.len(), 3);
    assert_eq!(merged.get("B").unwrap().stars, 3);
}

#[test]
fn test_collection_json_restores_ids() {
    let library = collection(vec![stored_song("A", "One", 7)]);

    let json = serde_json::to_string(&library).unwrap();
    let loaded: SongCollection = serde_json::from_str(&json).unwrap();

    assert_eq!(loaded.get("A").unwrap().id, "A");
    assert_eq!(loaded, library);
}

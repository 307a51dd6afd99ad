//! Favorites.
//!
//! A persisted set of favorited tracks with display fields captured at
//! toggle-time, so the favorites page renders without the catalog.

use serde::{Deserialize, Serialize};
use tracing::warn;

use crate::{
    catalog::{Track, TrackId},
    store::{self, BlobStore, keys},
};

/// A favorited track snapshot.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct FavoriteEntry {
    /// Track this entry is for.
    pub track_id: TrackId,

    /// Title snapshot.
    pub title: String,

    /// Creator snapshot.
    pub creator: String,

    /// Artwork URL snapshot.
    pub artwork: String,
}

impl FavoriteEntry {
    /// Capture a favorite entry from a catalog track.
    pub fn from_track(track: &Track) -> Self {
        FavoriteEntry {
            track_id: track.id,
            title: track.title.clone(),
            creator: track.creator.clone(),
            artwork: track.artwork.clone(),
        }
    }
}

/// The session's favorited tracks, persisted on every change.
#[derive(Debug)]
pub struct Favorites<S: BlobStore> {
    store: S,
    entries: Vec<FavoriteEntry>,
}

impl<S: BlobStore> Favorites<S> {
    /// Hydrate favorites from the store.
    ///
    /// Missing or corrupt records fail open to an empty set.
    pub fn new(store: S) -> Self {
        let entries = store::load_record(&store, keys::FAVORITES);

        Favorites { store, entries }
    }

    /// Flip a track's membership and return the new state: `true` when the
    /// track is now favorited, `false` when it was removed.
    #[tracing::instrument(skip_all, fields(track_id = %track.id))]
    pub fn toggle(&mut self, track: &Track) -> bool {
        let favorited = if self.is_favorite(track.id) {
            self.entries.retain(|entry| entry.track_id != track.id);
            false
        } else {
            self.entries.push(FavoriteEntry::from_track(track));
            true
        };

        if let Err(error) = store::save_record(&mut self.store, keys::FAVORITES, &self.entries) {
            warn!(%error, "failed to persist favorites");
        }

        favorited
    }

    /// Whether the track is currently favorited.
    pub fn is_favorite(&self, track_id: TrackId) -> bool {
        self.entries.iter().any(|entry| entry.track_id == track_id)
    }

    /// All favorites, oldest first.
    pub fn all(&self) -> &[FavoriteEntry] {
        &self.entries
    }
}

//! Media backend port.

use rustc_hash::FxHashMap;
use thiserror::Error;

use crate::catalog::TrackId;

/// Errors related to resolving media.
#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum MediaError {
    /// No streamable source is known for the track.
    #[error("no media source for track {0}")]
    NotFound(TrackId),
}

/// A streamable source resolved from a track.
#[derive(Debug, Clone, PartialEq)]
pub struct MediaSource {
    /// Playable URI.
    pub uri: String,

    /// Total duration in seconds.
    pub duration_seconds: f64,
}

/// Capability that resolves a track id to a streamable source.
pub trait MediaBackend {
    /// Resolve the track to a playable source.
    ///
    /// # Errors
    ///
    /// - [`MediaError::NotFound`]: the backend has no source for the track.
    fn resolve(&self, track_id: TrackId) -> Result<MediaSource, MediaError>;
}

/// In-memory [`MediaBackend`] over a fixed id-to-source map.
///
/// The default backend for demos and tests; a streaming client is a drop-in
/// replacement behind the same contract.
#[derive(Debug, Clone, Default)]
pub struct StaticMedia {
    sources: FxHashMap<TrackId, MediaSource>,
}

impl StaticMedia {
    /// An empty backend that resolves nothing.
    pub fn new() -> Self {
        Self::default()
    }

    /// Register (or replace) the source for a track.
    pub fn insert(&mut self, track_id: TrackId, source: MediaSource) {
        self.sources.insert(track_id, source);
    }

    /// Builder-style [`StaticMedia::insert`].
    #[must_use]
    pub fn with_source(mut self, track_id: TrackId, source: MediaSource) -> Self {
        self.insert(track_id, source);
        self
    }

    /// Remove a track's source, simulating media that became unavailable.
    pub fn remove(&mut self, track_id: TrackId) {
        self.sources.remove(&track_id);
    }
}

impl MediaBackend for StaticMedia {
    fn resolve(&self, track_id: TrackId) -> Result<MediaSource, MediaError> {
        self.sources
            .get(&track_id)
            .cloned()
            .ok_or(MediaError::NotFound(track_id))
    }
}

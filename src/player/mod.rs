//! Playback engine.
//!
//! Drives the single globally-active audio session and exposes deterministic
//! transport controls. The session is ephemeral: only the volume preference
//! is written through the persistence port; position and active track never
//! survive a restart.

mod media;

use std::fmt::{Debug, Formatter, Result as FmtResult};

use serde::{Deserialize, Serialize};
use thiserror::Error;
use tracing::{debug, warn};

use crate::{
    catalog::{Track, TrackId},
    store::{self, BlobStore, keys},
};

pub use media::{MediaBackend, MediaError, MediaSource, StaticMedia};

/// Volume used when no preference has been saved yet.
pub const DEFAULT_VOLUME: f64 = 0.7;

/// Errors related to playback.
#[derive(Debug, Error)]
pub enum PlaybackError {
    /// The media backend could not resolve the track. Recoverable: the
    /// session stays on the requested track but does not play.
    #[error("media unavailable for track {track_id}: {source}")]
    MediaUnavailable {
        /// Track whose media could not be resolved.
        track_id: TrackId,

        /// The underlying resolution error.
        source: MediaError,
    },
}

/// Persisted playback preferences.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Preferences {
    /// Volume in `[0, 1]`.
    pub volume: f64,
}

impl Default for Preferences {
    fn default() -> Self {
        Preferences {
            volume: DEFAULT_VOLUME,
        }
    }
}

/// Notifications emitted by the engine as the session changes.
#[derive(Debug, Clone, PartialEq)]
pub enum PlayerEvent {
    /// The active track was replaced.
    TrackChanged {
        /// The newly active track.
        track_id: TrackId,
    },

    /// The transport flipped between playing and not playing.
    StateChanged {
        /// Whether the session is now playing.
        playing: bool,
    },
}

/// The singleton audio session.
///
/// At most one track is active at a time, and `playing` implies an active
/// track.
#[derive(Debug, Clone)]
pub struct PlaybackSession {
    /// Track currently loaded into the session, if any.
    pub active_track: Option<Track>,

    /// Playhead position in seconds, within `[0, duration_seconds]`.
    pub position_seconds: f64,

    /// Duration of the active track in seconds; `0` until media resolves.
    pub duration_seconds: f64,

    /// Volume in `[0, 1]`.
    pub volume: f64,

    /// Whether the session is currently playing.
    pub playing: bool,
}

impl Default for PlaybackSession {
    fn default() -> Self {
        PlaybackSession {
            active_track: None,
            position_seconds: 0.0,
            duration_seconds: 0.0,
            volume: DEFAULT_VOLUME,
            playing: false,
        }
    }
}

type Observer = Box<dyn FnMut(&PlayerEvent)>;

/// Transport controls over the singleton [`PlaybackSession`].
pub struct Player<M: MediaBackend, S: BlobStore> {
    media: M,
    store: S,
    session: PlaybackSession,
    source: Option<MediaSource>,
    observers: Vec<Observer>,
}

impl<M: MediaBackend + Debug, S: BlobStore + Debug> Debug for Player<M, S> {
    fn fmt(&self, f: &mut Formatter<'_>) -> FmtResult {
        f.debug_struct("Player")
            .field("media", &self.media)
            .field("store", &self.store)
            .field("session", &self.session)
            .finish_non_exhaustive()
    }
}

impl<M: MediaBackend, S: BlobStore> Player<M, S> {
    /// Create an idle session over the given media backend and store.
    ///
    /// The saved volume preference is applied; everything else starts empty.
    pub fn new(media: M, store: S) -> Self {
        let preferences: Preferences = store::load_record(&store, keys::PREFERENCES);

        let session = PlaybackSession {
            volume: preferences.volume.clamp(0.0, 1.0),
            ..PlaybackSession::default()
        };

        Player {
            media,
            store,
            session,
            source: None,
            observers: Vec::new(),
        }
    }

    /// Register an observer for [`PlayerEvent`]s.
    pub fn subscribe<F>(&mut self, observer: F)
    where
        F: FnMut(&PlayerEvent) + 'static,
    {
        self.observers.push(Box::new(observer));
    }

    /// Read-only view of the session.
    pub fn session(&self) -> &PlaybackSession {
        &self.session
    }

    /// Start playing a track.
    ///
    /// Requesting the track that is already playing toggles to pause (the
    /// "click the same row" affordance). Any other request replaces the
    /// active track, rewinds to the start, resolves media and begins
    /// playback, emitting [`PlayerEvent::TrackChanged`] when the active track
    /// actually changed.
    ///
    /// # Errors
    ///
    /// - [`PlaybackError::MediaUnavailable`]: the backend has no source; the
    ///   session keeps the requested track but is left not playing.
    #[tracing::instrument(skip_all, fields(track_id = %track.id))]
    pub fn play(&mut self, track: &Track) -> Result<(), PlaybackError> {
        let was_playing = self.session.playing;
        let same_track = self
            .session
            .active_track
            .as_ref()
            .is_some_and(|active| active.id == track.id);

        if same_track && was_playing {
            self.pause();
            return Ok(());
        }

        if !same_track {
            self.session.active_track = Some(track.clone());
            self.emit(&PlayerEvent::TrackChanged { track_id: track.id });
        }

        self.session.position_seconds = 0.0;
        self.source = None;

        match self.media.resolve(track.id) {
            Ok(source) => {
                self.session.duration_seconds = source.duration_seconds;
                self.source = Some(source);
                self.session.playing = true;

                if !was_playing {
                    self.emit(&PlayerEvent::StateChanged { playing: true });
                }

                Ok(())
            }
            Err(error) => {
                self.session.duration_seconds = 0.0;
                self.session.playing = false;

                if was_playing {
                    self.emit(&PlayerEvent::StateChanged { playing: false });
                }

                warn!(%error, "failed to resolve media");

                Err(PlaybackError::MediaUnavailable {
                    track_id: track.id,
                    source: error,
                })
            }
        }
    }

    /// Stop the clock without unloading the track. No-op when not playing.
    pub fn pause(&mut self) {
        if !self.session.playing {
            return;
        }

        self.session.playing = false;
        self.emit(&PlayerEvent::StateChanged { playing: false });
    }

    /// Continue a paused session. No-op when already playing.
    ///
    /// Fails silently when there is nothing to resume or the media cannot be
    /// resolved: the failure is logged and the session stays paused.
    pub fn resume(&mut self) {
        if self.session.playing {
            return;
        }

        let Some(track_id) = self.session.active_track.as_ref().map(|track| track.id) else {
            debug!("resume without an active track");
            return;
        };

        if self.source.is_none() {
            match self.media.resolve(track_id) {
                Ok(source) => {
                    self.session.duration_seconds = source.duration_seconds;
                    self.source = Some(source);
                }
                Err(error) => {
                    warn!(%track_id, %error, "cannot resume playback");
                    return;
                }
            }
        }

        self.session.playing = true;
        self.emit(&PlayerEvent::StateChanged { playing: true });
    }

    /// Pause when playing, resume when paused.
    pub fn toggle(&mut self) {
        if self.session.playing {
            self.pause();
        } else {
            self.resume();
        }
    }

    /// Move the playhead. Out-of-range positions are clamped to
    /// `[0, duration]`, never rejected.
    pub fn seek(&mut self, position_seconds: f64) {
        self.session.position_seconds = position_seconds
            .max(0.0)
            .min(self.session.duration_seconds);
    }

    /// Set the volume, clamped to `[0, 1]`, and persist it as the session
    /// preference.
    pub fn set_volume(&mut self, volume: f64) {
        let clamped = volume.clamp(0.0, 1.0);
        self.session.volume = clamped;

        let preferences = Preferences { volume: clamped };
        if let Err(error) = store::save_record(&mut self.store, keys::PREFERENCES, &preferences) {
            warn!(%error, "failed to persist preferences");
        }
    }

    /// Play the track after the active one in `playlist`, wrapping from last
    /// to first. No-op when the playlist is empty or the active track is not
    /// a member.
    ///
    /// # Errors
    ///
    /// - [`PlaybackError::MediaUnavailable`]: the next track's media could
    ///   not be resolved.
    pub fn next(&mut self, playlist: &[Track]) -> Result<(), PlaybackError> {
        let Some(index) = self.playlist_index(playlist) else {
            return Ok(());
        };

        match playlist.get((index + 1) % playlist.len()) {
            Some(track) => self.play(track),
            None => Ok(()),
        }
    }

    /// Play the track before the active one in `playlist`, wrapping from
    /// first to last. No-op when the playlist is empty or the active track is
    /// not a member.
    ///
    /// # Errors
    ///
    /// - [`PlaybackError::MediaUnavailable`]: the previous track's media
    ///   could not be resolved.
    pub fn previous(&mut self, playlist: &[Track]) -> Result<(), PlaybackError> {
        let Some(index) = self.playlist_index(playlist) else {
            return Ok(());
        };

        match playlist.get((index + playlist.len() - 1) % playlist.len()) {
            Some(track) => self.play(track),
            None => Ok(()),
        }
    }

    /// Advance the playback clock by `elapsed_seconds`.
    ///
    /// No-op while paused. Reaching the end of the track stops the session
    /// and rewinds to the start; it does not auto-advance to another track,
    /// since no such contract exists. Never errors, by design of the clock
    /// loop.
    pub fn advance(&mut self, elapsed_seconds: f64) {
        if !self.session.playing {
            return;
        }

        let position = self.session.position_seconds + elapsed_seconds.max(0.0);
        let duration = self.session.duration_seconds;

        if duration > 0.0 && position >= duration {
            self.session.position_seconds = 0.0;
            self.session.playing = false;
            debug!("playback reached the end of the track");
            self.emit(&PlayerEvent::StateChanged { playing: false });
        } else {
            self.session.position_seconds = position;
        }
    }

    fn playlist_index(&self, playlist: &[Track]) -> Option<usize> {
        if playlist.is_empty() {
            return None;
        }

        let active = self.session.active_track.as_ref()?;

        playlist.iter().position(|track| track.id == active.id)
    }

    fn emit(&mut self, event: &PlayerEvent) {
        debug!(?event, "player event");

        for observer in &mut self.observers {
            observer(event);
        }
    }
}

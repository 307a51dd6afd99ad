//! Track catalog.
//!
//! Read-only reference data supplied by the storefront backend. The core never
//! mutates [`Track`]s; the ledger copies fields into its own snapshots so that
//! catalog changes do not retroactively corrupt history.

use std::fmt::{Display, Formatter, Result as FmtResult};

use rustc_hash::FxHashMap;
use rusty_money::{Money, iso::Currency};
use serde::{Deserialize, Serialize};
use thiserror::Error;

/// Errors related to catalog construction.
#[derive(Debug, Error, PartialEq, Eq)]
pub enum CatalogError {
    /// Two tracks share the same id.
    #[error("duplicate track id {0}")]
    DuplicateTrack(TrackId),

    /// A track carries a negative price.
    #[error("track {0} has a negative price ({1} minor units)")]
    NegativePrice(TrackId, i64),
}

/// Identifier of a catalog track.
#[derive(
    Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize, Default,
)]
pub struct TrackId(pub u32);

impl Display for TrackId {
    fn fmt(&self, f: &mut Formatter<'_>) -> FmtResult {
        Display::fmt(&self.0, f)
    }
}

/// A purchasable audio item in the catalog.
#[derive(Debug, Clone, PartialEq)]
pub struct Track {
    /// Catalog-unique identifier.
    pub id: TrackId,

    /// Display title.
    pub title: String,

    /// Creator (producer) name.
    pub creator: String,

    /// Price in minor units of the catalog currency.
    pub price_minor: i64,

    /// Reference the media backend resolves into a streamable source.
    pub media_ref: String,

    /// Duration in seconds; unknown until the media backend resolves it.
    pub duration_seconds: Option<f64>,

    /// Tempo label, e.g. "150 BPM".
    pub bpm: String,

    /// Musical key label, e.g. "D Major".
    pub key: String,

    /// Search and display tags.
    pub tags: Vec<String>,

    /// Artwork image URL.
    pub artwork: String,
}

impl Track {
    /// Returns the price as money in the given currency.
    pub fn price(&self, currency: &'static Currency) -> Money<'static, Currency> {
        Money::from_minor(self.price_minor, currency)
    }
}

/// The full set of purchasable tracks, priced in a single currency.
#[derive(Debug, Clone)]
pub struct Catalog {
    tracks: Vec<Track>,
    index: FxHashMap<TrackId, usize>,
    currency: &'static Currency,
}

impl Catalog {
    /// Create a catalog from the given tracks.
    ///
    /// # Errors
    ///
    /// - [`CatalogError::DuplicateTrack`]: two tracks share an id.
    /// - [`CatalogError::NegativePrice`]: a track's price is below zero.
    pub fn new(
        tracks: impl Into<Vec<Track>>,
        currency: &'static Currency,
    ) -> Result<Self, CatalogError> {
        let tracks = tracks.into();
        let mut index = FxHashMap::default();

        for (position, track) in tracks.iter().enumerate() {
            if track.price_minor < 0 {
                return Err(CatalogError::NegativePrice(track.id, track.price_minor));
            }

            if index.insert(track.id, position).is_some() {
                return Err(CatalogError::DuplicateTrack(track.id));
            }
        }

        Ok(Catalog {
            tracks,
            index,
            currency,
        })
    }

    /// Look up a track by id.
    pub fn get(&self, id: TrackId) -> Option<&Track> {
        self.index
            .get(&id)
            .and_then(|position| self.tracks.get(*position))
    }

    /// All tracks, in catalog order.
    pub fn tracks(&self) -> &[Track] {
        &self.tracks
    }

    /// The currency every track is priced in.
    pub fn currency(&self) -> &'static Currency {
        self.currency
    }

    /// Number of tracks in the catalog.
    pub fn len(&self) -> usize {
        self.tracks.len()
    }

    /// Check if the catalog is empty.
    pub fn is_empty(&self) -> bool {
        self.tracks.is_empty()
    }
}

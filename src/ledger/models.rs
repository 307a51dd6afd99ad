//! Ledger models.

use std::fmt::{Display, Formatter, Result as FmtResult};

use jiff::Timestamp;
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::catalog::{Track, TrackId};

/// Identifier of a single purchase.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct PurchaseId(Uuid);

impl PurchaseId {
    /// Generate a fresh id.
    pub fn generate() -> Self {
        Self(Uuid::now_v7())
    }

    /// The wrapped UUID.
    pub const fn into_uuid(self) -> Uuid {
        self.0
    }
}

impl Display for PurchaseId {
    fn fmt(&self, f: &mut Formatter<'_>) -> FmtResult {
        Display::fmt(&self.0, f)
    }
}

/// Groups the purchases created in a single checkout; the unit of idempotence
/// for duplicate submissions.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct OrderId(Uuid);

impl OrderId {
    /// Generate a fresh id.
    pub fn generate() -> Self {
        Self(Uuid::now_v7())
    }

    /// The wrapped UUID.
    pub const fn into_uuid(self) -> Uuid {
        self.0
    }
}

impl Display for OrderId {
    fn fmt(&self, f: &mut Formatter<'_>) -> FmtResult {
        Display::fmt(&self.0, f)
    }
}

/// A track pending checkout, with its price and display fields captured at
/// add-time so the cart renders offline and survives catalog changes.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CartEntry {
    /// Track this entry is for; at most one entry per track id.
    pub track_id: TrackId,

    /// Price in minor units, captured when the entry was added.
    pub price_minor: i64,

    /// Title snapshot.
    pub title: String,

    /// Creator snapshot.
    pub creator: String,

    /// Artwork URL snapshot.
    pub artwork: String,
}

impl CartEntry {
    /// Capture a cart entry from a catalog track.
    pub fn from_track(track: &Track) -> Self {
        CartEntry {
            track_id: track.id,
            price_minor: track.price_minor,
            title: track.title.clone(),
            creator: track.creator.clone(),
            artwork: track.artwork.clone(),
        }
    }
}

/// An immutable record that a track was paid for, granting download rights.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Purchase {
    /// Unique id of this purchase.
    pub id: PurchaseId,

    /// Checkout this purchase was created in.
    pub order_id: OrderId,

    /// Track that was bought.
    pub track_id: TrackId,

    /// Price paid in minor units.
    pub price_minor: i64,

    /// Title snapshot.
    pub title: String,

    /// Creator snapshot.
    pub creator: String,

    /// Artwork URL snapshot.
    pub artwork: String,

    /// When the payment settled.
    pub purchased_at: Timestamp,

    /// Reference handed to the download action.
    pub download_ref: String,
}

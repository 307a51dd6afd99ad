//! Jukebox prelude.
//!
//! Convenience exports for common library consumers.

pub use crate::{
    catalog::{Catalog, CatalogError, Track, TrackId},
    checkout::{
        CheckoutError, CheckoutFlow, CheckoutOutcome, CheckoutState, GatewayVerdict, Payer,
        PaymentGateway, PaymentIntent, Receipt, SimulatedGateway,
    },
    favorites::{FavoriteEntry, Favorites},
    ledger::{CartEntry, Ledger, LedgerError, OrderId, Purchase, PurchaseId},
    player::{
        DEFAULT_VOLUME, MediaBackend, MediaError, MediaSource, PlaybackError, PlaybackSession,
        Player, PlayerEvent, Preferences, StaticMedia,
    },
    store::{BlobStore, FileStore, MemoryStore, StoreError},
};

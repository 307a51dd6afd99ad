//! Commerce ledger.
//!
//! Owns cart membership and the append-only purchase record set, and is the
//! single authority for whether a track can be downloaded. Every mutation is
//! persisted through the [`BlobStore`] before the call returns, so a crash
//! immediately after a successful call cannot silently lose the effect.

mod models;

use rustc_hash::FxHashSet;
use thiserror::Error;
use tracing::{debug, warn};

use crate::{
    catalog::{Track, TrackId},
    store::{self, BlobStore, keys},
};

pub use models::{CartEntry, OrderId, Purchase, PurchaseId};

/// Errors related to recording orders.
#[derive(Debug, Error, PartialEq, Eq)]
pub enum LedgerError {
    /// The purchases submitted as one order carry more than one order id.
    #[error("purchases in one order must share a single order id")]
    MixedOrder,
}

/// Cart and purchase state for one storefront session.
#[derive(Debug)]
pub struct Ledger<S: BlobStore> {
    store: S,
    cart: Vec<CartEntry>,
    purchases: Vec<Purchase>,
    orders: FxHashSet<OrderId>,
}

impl<S: BlobStore> Ledger<S> {
    /// Hydrate a ledger from the store.
    ///
    /// Missing or corrupt records fail open to empty collections.
    pub fn new(store: S) -> Self {
        let cart: Vec<CartEntry> = store::load_record(&store, keys::CART);
        let purchases: Vec<Purchase> = store::load_record(&store, keys::PURCHASES);
        let orders = purchases.iter().map(|purchase| purchase.order_id).collect();

        Ledger {
            store,
            cart,
            purchases,
            orders,
        }
    }

    /// Add a track to the cart, capturing its price and display fields.
    ///
    /// Idempotent: returns `false` without touching the existing entry (no
    /// duplicate lines, no price re-capture) when the track is already carted.
    #[tracing::instrument(skip_all, fields(track_id = %track.id))]
    pub fn add_to_cart(&mut self, track: &Track) -> bool {
        if self.is_in_cart(track.id) {
            debug!("track already in cart");
            return false;
        }

        self.cart.push(CartEntry::from_track(track));
        self.persist_cart();

        true
    }

    /// Remove a track's cart entry, if present.
    #[tracing::instrument(skip(self), fields(track_id = %track_id))]
    pub fn remove_from_cart(&mut self, track_id: TrackId) -> bool {
        let before = self.cart.len();
        self.cart.retain(|entry| entry.track_id != track_id);

        if self.cart.len() == before {
            return false;
        }

        self.persist_cart();

        true
    }

    /// Empty the cart.
    #[tracing::instrument(skip(self))]
    pub fn clear_cart(&mut self) {
        if self.cart.is_empty() {
            return;
        }

        self.cart.clear();
        self.persist_cart();
    }

    /// Check whether a track has a cart entry.
    pub fn is_in_cart(&self, track_id: TrackId) -> bool {
        self.cart.iter().any(|entry| entry.track_id == track_id)
    }

    /// Sum of captured prices over all current entries, in minor units.
    ///
    /// `0` for an empty cart.
    pub fn cart_total(&self) -> i64 {
        self.cart.iter().map(|entry| entry.price_minor).sum()
    }

    /// Current cart entries, in insertion order.
    pub fn cart_entries(&self) -> &[CartEntry] {
        &self.cart
    }

    /// Number of cart entries.
    pub fn cart_len(&self) -> usize {
        self.cart.len()
    }

    /// Record the purchases created in one checkout, atomically.
    ///
    /// All purchases must share one order id; that id is the unit of
    /// idempotence, so a duplicate submission (retried call, double-click) is
    /// a no-op and returns `false`. On a fresh order id every purchase is
    /// appended and any cart entry for the same tracks is consumed.
    ///
    /// # Errors
    ///
    /// - [`LedgerError::MixedOrder`]: the purchases disagree on order id.
    #[tracing::instrument(skip_all, fields(purchase_count = purchases.len()))]
    pub fn record_order(&mut self, purchases: Vec<Purchase>) -> Result<bool, LedgerError> {
        let Some(first) = purchases.first() else {
            return Ok(false);
        };

        let order_id = first.order_id;

        if purchases
            .iter()
            .any(|purchase| purchase.order_id != order_id)
        {
            return Err(LedgerError::MixedOrder);
        }

        if !self.orders.insert(order_id) {
            debug!(%order_id, "order already recorded");
            return Ok(false);
        }

        let mut cart_changed = false;

        for purchase in purchases {
            let track_id = purchase.track_id;
            self.purchases.push(purchase);

            let before = self.cart.len();
            self.cart.retain(|entry| entry.track_id != track_id);
            cart_changed |= self.cart.len() != before;
        }

        self.persist_purchases();

        if cart_changed {
            self.persist_cart();
        }

        debug!(%order_id, "order recorded");

        Ok(true)
    }

    /// Record a single purchase; see [`Ledger::record_order`].
    ///
    /// # Errors
    ///
    /// Never fails for a single purchase; the `Result` mirrors
    /// [`Ledger::record_order`].
    pub fn record_purchase(&mut self, purchase: Purchase) -> Result<bool, LedgerError> {
        self.record_order(vec![purchase])
    }

    /// Whether a purchase exists for the track.
    ///
    /// The single authority consulted before exposing a download action; never
    /// derived from cart state.
    pub fn can_download(&self, track_id: TrackId) -> bool {
        self.purchases
            .iter()
            .any(|purchase| purchase.track_id == track_id)
    }

    /// The purchase granting download rights for the track, if any.
    pub fn purchase_for(&self, track_id: TrackId) -> Option<&Purchase> {
        self.purchases
            .iter()
            .find(|purchase| purchase.track_id == track_id)
    }

    /// All recorded purchases, oldest first.
    pub fn purchases(&self) -> &[Purchase] {
        &self.purchases
    }

    fn persist_cart(&mut self) {
        if let Err(error) = store::save_record(&mut self.store, keys::CART, &self.cart) {
            warn!(%error, "failed to persist cart");
        }
    }

    fn persist_purchases(&mut self) {
        if let Err(error) = store::save_record(&mut self.store, keys::PURCHASES, &self.purchases) {
            warn!(%error, "failed to persist purchases");
        }
    }
}

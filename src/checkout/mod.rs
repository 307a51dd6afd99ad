//! Checkout flow.
//!
//! A short-lived state machine that turns a purchase intent into ledger
//! purchases: `Idle → IntentCreated → AwaitingConfirmation → Settled` or
//! `→ Cancelled`. Settling is the only path that mutates the ledger's
//! purchase set, and the gateway hand-off inside it is the only point where
//! the core suspends.

mod gateway;

use jiff::Timestamp;
use rustc_hash::FxHashSet;
use rusty_money::{Money, iso::Currency};
use thiserror::Error;
use tracing::{debug, info};

use crate::{
    catalog::{Catalog, Track, TrackId},
    ledger::{Ledger, LedgerError, OrderId, Purchase, PurchaseId},
    store::BlobStore,
};

pub use gateway::{GatewayVerdict, PaymentGateway, SimulatedGateway};

/// Errors related to driving a checkout attempt.
#[derive(Debug, Error)]
pub enum CheckoutError {
    /// The intent would contain no purchasable tracks (empty selection, or
    /// every selected track is already owned). Rejected before any side
    /// effect.
    #[error("invalid payment intent: no purchasable tracks")]
    EmptyIntent,

    /// The computed total is not positive. Rejected before any side effect.
    #[error("invalid payment intent: amount {0} is not positive")]
    NonPositiveAmount(i64),

    /// A selected track does not exist in the catalog.
    #[error("invalid payment intent: unknown track {0}")]
    UnknownTrack(TrackId),

    /// The operation is not valid in the flow's current state.
    #[error("operation not valid in checkout state {0:?}")]
    WrongState(CheckoutState),

    /// The ledger rejected the order commit.
    #[error(transparent)]
    Ledger(#[from] LedgerError),
}

/// Lifecycle of one checkout attempt.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum CheckoutState {
    /// No intent exists yet.
    #[default]
    Idle,

    /// An intent has been created and awaits settlement.
    IntentCreated,

    /// The intent has been handed to the gateway; the core is suspended.
    AwaitingConfirmation,

    /// Terminal: the payment settled and purchases are recorded.
    Settled,

    /// Terminal: the payer cancelled or the gateway failed; nothing recorded.
    Cancelled,
}

/// The payer identity attached to a payment intent.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Payer {
    /// Account id with the storefront.
    pub id: String,

    /// Display name, prefilled into the gateway confirmation.
    pub name: String,

    /// Email address, prefilled into the gateway confirmation.
    pub email: String,
}

/// Transient description of a checkout attempt before settlement.
///
/// Exists only for the duration of the attempt and is never persisted; it
/// either settles into recorded purchases or is discarded.
#[derive(Debug, Clone)]
pub struct PaymentIntent {
    amount_minor: i64,
    currency: &'static Currency,
    tracks: Vec<Track>,
    payer: Payer,
}

impl PaymentIntent {
    /// Total to charge, in minor units. Always positive.
    pub fn amount_minor(&self) -> i64 {
        self.amount_minor
    }

    /// Total to charge as money.
    pub fn amount(&self) -> Money<'static, Currency> {
        Money::from_minor(self.amount_minor, self.currency)
    }

    /// ISO code of the charged currency.
    pub fn currency_code(&self) -> &'static str {
        self.currency.iso_alpha_code
    }

    /// Tracks being bought, with the prices the amount was computed from.
    pub fn tracks(&self) -> &[Track] {
        &self.tracks
    }

    /// Identity the payment is made by.
    pub fn payer(&self) -> &Payer {
        &self.payer
    }
}

/// Proof of a settled checkout, returned to the caller.
#[derive(Debug, Clone)]
pub struct Receipt {
    /// Order id shared by every purchase of this checkout.
    pub order_id: OrderId,

    /// Total charged, in minor units.
    pub total_minor: i64,

    /// Currency the total was charged in.
    pub currency: &'static Currency,

    /// Ids of the purchases created, one per track.
    pub purchase_ids: Vec<PurchaseId>,

    /// Gateway-side reference for the captured payment.
    pub payment_ref: String,
}

impl Receipt {
    /// Total charged as money.
    pub fn total(&self) -> Money<'static, Currency> {
        Money::from_minor(self.total_minor, self.currency)
    }
}

/// How a driven checkout attempt ended.
///
/// Cancellation is an expected outcome, not an error: callers can tell "the
/// payer changed their mind" apart from "the payment actually failed" without
/// inspecting error strings.
#[derive(Debug, Clone)]
pub enum CheckoutOutcome {
    /// The payment settled; purchases are recorded in the ledger.
    Settled(Receipt),

    /// The payer backed out before confirming. The ledger was not touched.
    Cancelled,

    /// The gateway reported a failure, surfaced verbatim. The ledger was not
    /// touched.
    Failed(String),
}

/// State machine driving one checkout attempt.
///
/// A flow never retries on its own; after a terminal state a new flow must be
/// started explicitly, which keeps duplicate charging impossible by
/// construction.
#[derive(Debug, Default)]
pub struct CheckoutFlow {
    state: CheckoutState,
    intent: Option<PaymentIntent>,
}

impl CheckoutFlow {
    /// A fresh flow in the `Idle` state.
    pub fn new() -> Self {
        Self::default()
    }

    /// Current position in the lifecycle.
    pub fn state(&self) -> CheckoutState {
        self.state
    }

    /// Build a payment intent from current catalog prices.
    ///
    /// Already-owned tracks are silently dropped from the selection (re-buying
    /// is idempotent), and duplicate ids collapse to one line. The total is
    /// computed from the catalog, never from the ledger's captured cart
    /// prices.
    ///
    /// # Errors
    ///
    /// - [`CheckoutError::WrongState`]: the flow has left `Idle`.
    /// - [`CheckoutError::UnknownTrack`]: a selected id is not in the catalog.
    /// - [`CheckoutError::EmptyIntent`]: nothing purchasable was selected.
    /// - [`CheckoutError::NonPositiveAmount`]: the selection totals zero.
    #[tracing::instrument(skip_all, fields(track_count = track_ids.len()))]
    pub fn create_intent<S: BlobStore>(
        &mut self,
        catalog: &Catalog,
        track_ids: &[TrackId],
        payer: Payer,
        ledger: &Ledger<S>,
    ) -> Result<&PaymentIntent, CheckoutError> {
        if self.state != CheckoutState::Idle {
            return Err(CheckoutError::WrongState(self.state));
        }

        let mut seen = FxHashSet::default();
        let mut tracks = Vec::new();

        for &track_id in track_ids {
            let track = catalog
                .get(track_id)
                .ok_or(CheckoutError::UnknownTrack(track_id))?;

            if !seen.insert(track_id) {
                continue;
            }

            if ledger.can_download(track_id) {
                debug!(%track_id, "dropping already-owned track from intent");
                continue;
            }

            tracks.push(track.clone());
        }

        if tracks.is_empty() {
            return Err(CheckoutError::EmptyIntent);
        }

        let amount_minor = tracks.iter().map(|track| track.price_minor).sum();

        if amount_minor <= 0 {
            return Err(CheckoutError::NonPositiveAmount(amount_minor));
        }

        info!(
            amount_minor,
            currency = catalog.currency().iso_alpha_code,
            "payment intent created"
        );

        self.state = CheckoutState::IntentCreated;
        self.intent = Some(PaymentIntent {
            amount_minor,
            currency: catalog.currency(),
            tracks,
            payer,
        });

        self.intent
            .as_ref()
            .ok_or(CheckoutError::WrongState(self.state))
    }

    /// The pending intent, while one exists.
    pub fn intent(&self) -> Option<&PaymentIntent> {
        self.intent.as_ref()
    }

    /// Hand the intent to the gateway and drive the flow to a terminal state.
    ///
    /// This is the core's single suspension point: the call blocks in
    /// `AwaitingConfirmation` until the gateway answers, with no timeout
    /// imposed; a gateway that never returns parks the flow here. On
    /// approval, one purchase per track is committed under one fresh order id
    /// and the matching cart entries are consumed. On cancellation or gateway
    /// failure the intent is discarded and the ledger is untouched.
    ///
    /// # Errors
    ///
    /// - [`CheckoutError::WrongState`]: no intent is pending (the flow is
    ///   `Idle` or already terminal).
    /// - [`CheckoutError::Ledger`]: the ledger rejected the order commit.
    #[tracing::instrument(skip_all)]
    pub fn settle<G, S>(
        &mut self,
        gateway: &mut G,
        ledger: &mut Ledger<S>,
    ) -> Result<CheckoutOutcome, CheckoutError>
    where
        G: PaymentGateway,
        S: BlobStore,
    {
        if self.state != CheckoutState::IntentCreated {
            return Err(CheckoutError::WrongState(self.state));
        }

        let Some(intent) = self.intent.take() else {
            return Err(CheckoutError::WrongState(self.state));
        };

        self.state = CheckoutState::AwaitingConfirmation;
        info!("awaiting payment confirmation");

        match gateway.initiate(&intent) {
            GatewayVerdict::Approved { payment_ref } => {
                let receipt = self.commit(&intent, payment_ref, ledger)?;
                Ok(CheckoutOutcome::Settled(receipt))
            }
            GatewayVerdict::Cancelled => {
                self.state = CheckoutState::Cancelled;
                info!("payment cancelled by payer");
                Ok(CheckoutOutcome::Cancelled)
            }
            GatewayVerdict::Failed(reason) => {
                self.state = CheckoutState::Cancelled;
                info!(reason, "payment failed");
                Ok(CheckoutOutcome::Failed(reason))
            }
        }
    }

    fn commit<S: BlobStore>(
        &mut self,
        intent: &PaymentIntent,
        payment_ref: String,
        ledger: &mut Ledger<S>,
    ) -> Result<Receipt, CheckoutError> {
        let order_id = OrderId::generate();
        let purchased_at = Timestamp::now();

        let purchases: Vec<Purchase> = intent
            .tracks
            .iter()
            .map(|track| Purchase {
                id: PurchaseId::generate(),
                order_id,
                track_id: track.id,
                price_minor: track.price_minor,
                title: track.title.clone(),
                creator: track.creator.clone(),
                artwork: track.artwork.clone(),
                purchased_at,
                download_ref: download_ref_for(track.id),
            })
            .collect();

        let purchase_ids = purchases.iter().map(|purchase| purchase.id).collect();

        ledger.record_order(purchases)?;

        self.state = CheckoutState::Settled;
        info!(%order_id, amount_minor = intent.amount_minor, "payment settled");

        Ok(Receipt {
            order_id,
            total_minor: intent.amount_minor,
            currency: intent.currency,
            purchase_ids,
            payment_ref,
        })
    }
}

fn download_ref_for(track_id: TrackId) -> String {
    format!("https://example.com/download/{track_id}")
}

#[cfg(test)]
mod tests {
    use rusty_money::iso;
    use testresult::TestResult;

    use crate::store::MemoryStore;

    use super::*;

    fn track(id: u32, price_minor: i64) -> Track {
        Track {
            id: TrackId(id),
            title: format!("Track {id}"),
            creator: "Producer".to_string(),
            price_minor,
            media_ref: format!("https://media.example/{id}.mp3"),
            duration_seconds: None,
            bpm: "120 BPM".to_string(),
            key: "C Major".to_string(),
            tags: Vec::new(),
            artwork: format!("https://images.example/{id}.jpg"),
        }
    }

    fn payer() -> Payer {
        Payer {
            id: "user_1".to_string(),
            name: "Asha".to_string(),
            email: "asha@example.com".to_string(),
        }
    }

    fn catalog() -> Catalog {
        match Catalog::new([track(1, 69_900), track(2, 59_900), track(3, 0)], iso::INR) {
            Ok(catalog) => catalog,
            Err(error) => panic!("fixture catalog must build: {error}"),
        }
    }

    #[test]
    fn create_intent_totals_current_catalog_prices() -> TestResult {
        let catalog = catalog();
        let ledger = Ledger::new(MemoryStore::new());
        let mut flow = CheckoutFlow::new();

        let intent =
            flow.create_intent(&catalog, &[TrackId(1), TrackId(2)], payer(), &ledger)?;

        assert_eq!(intent.amount_minor(), 129_800);
        assert_eq!(intent.currency_code(), "INR");
        assert_eq!(flow.state(), CheckoutState::IntentCreated);

        Ok(())
    }

    #[test]
    fn create_intent_rejects_empty_selection() {
        let catalog = catalog();
        let ledger = Ledger::new(MemoryStore::new());
        let mut flow = CheckoutFlow::new();

        let result = flow.create_intent(&catalog, &[], payer(), &ledger);

        assert!(
            matches!(result, Err(CheckoutError::EmptyIntent)),
            "expected EmptyIntent, got {result:?}"
        );
        assert_eq!(flow.state(), CheckoutState::Idle);
    }

    #[test]
    fn create_intent_rejects_zero_amount() {
        let catalog = catalog();
        let ledger = Ledger::new(MemoryStore::new());
        let mut flow = CheckoutFlow::new();

        let result = flow.create_intent(&catalog, &[TrackId(3)], payer(), &ledger);

        assert!(
            matches!(result, Err(CheckoutError::NonPositiveAmount(0))),
            "expected NonPositiveAmount, got {result:?}"
        );
    }

    #[test]
    fn create_intent_rejects_unknown_tracks() {
        let catalog = catalog();
        let ledger = Ledger::new(MemoryStore::new());
        let mut flow = CheckoutFlow::new();

        let result = flow.create_intent(&catalog, &[TrackId(9)], payer(), &ledger);

        assert!(
            matches!(result, Err(CheckoutError::UnknownTrack(TrackId(9)))),
            "expected UnknownTrack, got {result:?}"
        );
    }

    #[test]
    fn create_intent_collapses_duplicate_ids() -> TestResult {
        let catalog = catalog();
        let ledger = Ledger::new(MemoryStore::new());
        let mut flow = CheckoutFlow::new();

        let intent =
            flow.create_intent(&catalog, &[TrackId(1), TrackId(1)], payer(), &ledger)?;

        assert_eq!(intent.tracks().len(), 1);
        assert_eq!(intent.amount_minor(), 69_900);

        Ok(())
    }

    #[test]
    fn create_intent_drops_already_owned_tracks() -> TestResult {
        let catalog = catalog();
        let mut ledger = Ledger::new(MemoryStore::new());
        let mut gateway = SimulatedGateway::approving();

        let mut first = CheckoutFlow::new();
        first.create_intent(&catalog, &[TrackId(1)], payer(), &ledger)?;
        first.settle(&mut gateway, &mut ledger)?;

        let mut second = CheckoutFlow::new();
        let intent =
            second.create_intent(&catalog, &[TrackId(1), TrackId(2)], payer(), &ledger)?;

        assert_eq!(intent.amount_minor(), 59_900);

        let mut third = CheckoutFlow::new();
        let all_owned = third.create_intent(&catalog, &[TrackId(1)], payer(), &ledger);

        assert!(
            matches!(all_owned, Err(CheckoutError::EmptyIntent)),
            "expected EmptyIntent for fully-owned selection, got {all_owned:?}"
        );

        Ok(())
    }

    #[test]
    fn settle_records_one_purchase_per_track_under_one_order() -> TestResult {
        let catalog = catalog();
        let mut ledger = Ledger::new(MemoryStore::new());
        let mut gateway = SimulatedGateway::approving();
        let mut flow = CheckoutFlow::new();

        flow.create_intent(&catalog, &[TrackId(1), TrackId(2)], payer(), &ledger)?;
        let outcome = flow.settle(&mut gateway, &mut ledger)?;

        let CheckoutOutcome::Settled(receipt) = outcome else {
            panic!("expected Settled, got {outcome:?}");
        };

        assert_eq!(receipt.purchase_ids.len(), 2);
        assert_eq!(receipt.total_minor, 129_800);
        assert_eq!(ledger.purchases().len(), 2);
        assert!(
            ledger
                .purchases()
                .iter()
                .all(|purchase| purchase.order_id == receipt.order_id),
            "all purchases should share the receipt's order id"
        );
        assert_eq!(flow.state(), CheckoutState::Settled);

        Ok(())
    }

    #[test]
    fn cancellation_is_inert() -> TestResult {
        let catalog = catalog();
        let mut ledger = Ledger::new(MemoryStore::new());
        ledger.add_to_cart(&track(1, 69_900));

        let mut gateway = SimulatedGateway::cancelling();
        let mut flow = CheckoutFlow::new();

        flow.create_intent(&catalog, &[TrackId(1)], payer(), &ledger)?;
        let outcome = flow.settle(&mut gateway, &mut ledger)?;

        assert!(
            matches!(outcome, CheckoutOutcome::Cancelled),
            "expected Cancelled, got {outcome:?}"
        );
        assert!(!ledger.can_download(TrackId(1)));
        assert!(ledger.is_in_cart(TrackId(1)));
        assert_eq!(flow.state(), CheckoutState::Cancelled);

        Ok(())
    }

    #[test]
    fn gateway_failure_reason_is_surfaced_verbatim() -> TestResult {
        let catalog = catalog();
        let mut ledger = Ledger::new(MemoryStore::new());
        let mut gateway = SimulatedGateway::failing("card declined");
        let mut flow = CheckoutFlow::new();

        flow.create_intent(&catalog, &[TrackId(1)], payer(), &ledger)?;
        let outcome = flow.settle(&mut gateway, &mut ledger)?;

        let CheckoutOutcome::Failed(reason) = outcome else {
            panic!("expected Failed, got {outcome:?}");
        };

        assert_eq!(reason, "card declined");
        assert!(ledger.purchases().is_empty());

        Ok(())
    }

    #[test]
    fn settled_flow_rejects_another_settle() -> TestResult {
        let catalog = catalog();
        let mut ledger = Ledger::new(MemoryStore::new());
        let mut gateway = SimulatedGateway::approving();
        let mut flow = CheckoutFlow::new();

        flow.create_intent(&catalog, &[TrackId(1)], payer(), &ledger)?;
        flow.settle(&mut gateway, &mut ledger)?;

        let result = flow.settle(&mut gateway, &mut ledger);

        assert!(
            matches!(result, Err(CheckoutError::WrongState(CheckoutState::Settled))),
            "expected WrongState, got {result:?}"
        );
        assert_eq!(gateway.initiated_count(), 1);

        Ok(())
    }

    #[test]
    fn flow_performs_no_automatic_retries() -> TestResult {
        let catalog = catalog();
        let mut ledger = Ledger::new(MemoryStore::new());
        let mut gateway = SimulatedGateway::failing("network error");
        let mut flow = CheckoutFlow::new();

        flow.create_intent(&catalog, &[TrackId(1)], payer(), &ledger)?;
        flow.settle(&mut gateway, &mut ledger)?;

        assert_eq!(gateway.initiated_count(), 1);

        let result = flow.settle(&mut gateway, &mut ledger);

        assert!(
            matches!(
                result,
                Err(CheckoutError::WrongState(CheckoutState::Cancelled))
            ),
            "expected WrongState after failure, got {result:?}"
        );
        assert_eq!(gateway.initiated_count(), 1);

        Ok(())
    }
}

//! Storefront Example
//!
//! Walks one session through the whole core: preview a beat, cart two beats,
//! settle a simulated checkout, and resolve the download. State is persisted
//! to a temporary directory so a re-run starts clean.

use anyhow::Result;
use rusty_money::Money;
use tracing_subscriber::EnvFilter;

use jukebox::prelude::*;

/// Storefront Example
#[expect(clippy::print_stdout, reason = "Example code")]
pub fn main() -> Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::from_default_env())
        .init();

    let session_dir = tempfile::tempdir()?;

    let catalog = jukebox::fixtures::catalog()?;
    let currency = catalog.currency();

    let mut player = Player::new(
        jukebox::fixtures::media(),
        FileStore::open(session_dir.path())?,
    );
    let mut ledger = Ledger::new(FileStore::open(session_dir.path())?);

    player.subscribe(|event| println!("  [player] {event:?}"));

    // Browse the catalog.
    println!("Catalog:");
    for track in catalog.tracks() {
        println!(
            "  #{} {:24} {:16} {}",
            track.id,
            track.title,
            track.creator,
            track.price(currency)
        );
    }

    // Preview the first beat for a few seconds.
    let Some(preview) = catalog.tracks().first() else {
        return Ok(());
    };
    println!("\nPreviewing {:?}:", preview.title);
    player.play(preview)?;
    player.advance(5.0);
    player.pause();

    // Cart two beats and check out.
    for id in [TrackId(1), TrackId(3)] {
        if let Some(track) = catalog.get(id) {
            ledger.add_to_cart(track);
        }
    }
    println!(
        "\nCart: {} tracks, total {}",
        ledger.cart_len(),
        Money::from_minor(ledger.cart_total(), currency)
    );

    let payer = Payer {
        id: "demo_user".to_string(),
        name: "Demo User".to_string(),
        email: "demo@example.com".to_string(),
    };

    let mut flow = CheckoutFlow::new();
    flow.create_intent(&catalog, &[TrackId(1), TrackId(3)], payer, &ledger)?;

    let mut gateway = SimulatedGateway::approving();
    match flow.settle(&mut gateway, &mut ledger)? {
        CheckoutOutcome::Settled(receipt) => {
            println!(
                "\nOrder {} settled for {} ({} purchases, ref {})",
                receipt.order_id,
                receipt.total(),
                receipt.purchase_ids.len(),
                receipt.payment_ref
            );
        }
        CheckoutOutcome::Cancelled => println!("\nCheckout cancelled"),
        CheckoutOutcome::Failed(reason) => println!("\nCheckout failed: {reason}"),
    }

    // Downloads are gated by the ledger, never the cart.
    println!("\nDownloads:");
    for track in catalog.tracks() {
        match ledger.purchase_for(track.id) {
            Some(purchase) => println!("  #{} {}", track.id, purchase.download_ref),
            None => println!("  #{} locked", track.id),
        }
    }

    Ok(())
}

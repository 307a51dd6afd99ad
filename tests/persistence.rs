//! Durability scenarios over the file-backed store.
//!
//! The engines must come back from a restart exactly as they were left:
//! the ledger rehydrates its cart and purchases, the player reapplies the
//! saved volume, and a corrupted blob costs only its own record while the
//! rest of the session survives.

use jukebox::prelude::*;
use jukebox::store::keys;
use testresult::TestResult;

fn payer() -> Payer {
    Payer {
        id: "user_42".to_string(),
        name: "Asha".to_string(),
        email: "asha@example.com".to_string(),
    }
}

#[test]
fn ledger_survives_a_restart() -> TestResult {
    let dir = tempfile::tempdir()?;
    let catalog = jukebox::fixtures::catalog()?;

    {
        let mut ledger = Ledger::new(FileStore::open(dir.path())?);
        let carted = catalog.get(TrackId(2)).expect("track 2 is seeded").clone();
        ledger.add_to_cart(&carted);

        let mut flow = CheckoutFlow::new();
        flow.create_intent(&catalog, &[TrackId(1)], payer(), &ledger)?;
        flow.settle(&mut SimulatedGateway::approving(), &mut ledger)?;
    }

    let ledger = Ledger::new(FileStore::open(dir.path())?);

    assert!(ledger.is_in_cart(TrackId(2)));
    assert!(ledger.can_download(TrackId(1)));
    assert_eq!(ledger.cart_total(), 59_900);
    assert_eq!(ledger.purchases().len(), 1);

    Ok(())
}

#[test]
fn settlement_is_idempotent_across_restarts() -> TestResult {
    let dir = tempfile::tempdir()?;
    let catalog = jukebox::fixtures::catalog()?;

    let order_id = {
        let mut ledger = Ledger::new(FileStore::open(dir.path())?);
        let mut flow = CheckoutFlow::new();
        flow.create_intent(&catalog, &[TrackId(1)], payer(), &ledger)?;

        let outcome = flow.settle(&mut SimulatedGateway::approving(), &mut ledger)?;
        let CheckoutOutcome::Settled(receipt) = outcome else {
            panic!("expected Settled, got {outcome:?}");
        };

        receipt.order_id
    };

    // Replaying the same order after a restart must be a no-op.
    let mut ledger = Ledger::new(FileStore::open(dir.path())?);
    let replayed = ledger
        .purchases()
        .first()
        .cloned()
        .expect("purchase was recorded");

    assert_eq!(replayed.order_id, order_id);
    assert!(!ledger.record_purchase(replayed)?);
    assert_eq!(ledger.purchases().len(), 1);

    Ok(())
}

#[test]
fn a_corrupt_record_costs_only_itself() -> TestResult {
    let dir = tempfile::tempdir()?;
    let catalog = jukebox::fixtures::catalog()?;

    {
        let mut ledger = Ledger::new(FileStore::open(dir.path())?);
        let carted = catalog.get(TrackId(2)).expect("track 2 is seeded").clone();
        ledger.add_to_cart(&carted);

        let mut flow = CheckoutFlow::new();
        flow.create_intent(&catalog, &[TrackId(1)], payer(), &ledger)?;
        flow.settle(&mut SimulatedGateway::approving(), &mut ledger)?;
    }

    // Mangle the cart blob; the purchases record is untouched.
    std::fs::write(dir.path().join(format!("{}.json", keys::CART)), "{oops")?;

    let ledger = Ledger::new(FileStore::open(dir.path())?);

    assert_eq!(ledger.cart_len(), 0);
    assert!(ledger.can_download(TrackId(1)));

    Ok(())
}

#[test]
fn favorites_survive_a_restart() -> TestResult {
    let dir = tempfile::tempdir()?;
    let catalog = jukebox::fixtures::catalog()?;
    let track = catalog.get(TrackId(4)).expect("track 4 is seeded").clone();

    {
        let mut favorites = Favorites::new(FileStore::open(dir.path())?);
        favorites.toggle(&track);
    }

    let favorites = Favorites::new(FileStore::open(dir.path())?);

    assert!(favorites.is_favorite(TrackId(4)));

    Ok(())
}

#[test]
fn volume_preference_survives_a_restart() -> TestResult {
    let dir = tempfile::tempdir()?;

    {
        let mut player = Player::new(StaticMedia::new(), FileStore::open(dir.path())?);
        player.set_volume(0.25);
    }

    let player = Player::new(StaticMedia::new(), FileStore::open(dir.path())?);

    assert!(
        (player.session().volume - 0.25).abs() < 1e-9,
        "expected restored volume 0.25, got {}",
        player.session().volume
    );

    Ok(())
}

#[test]
fn transport_state_is_never_persisted() -> TestResult {
    let dir = tempfile::tempdir()?;
    let catalog = jukebox::fixtures::catalog()?;
    let track = catalog.get(TrackId(1)).expect("track 1 is seeded").clone();

    {
        let mut player = Player::new(jukebox::fixtures::media(), FileStore::open(dir.path())?);
        player.play(&track)?;
        player.seek(42.0);
    }

    let player = Player::new(jukebox::fixtures::media(), FileStore::open(dir.path())?);
    let session = player.session();

    assert!(session.active_track.is_none());
    assert!(!session.playing);
    assert!(
        session.position_seconds.abs() < 1e-9,
        "position must reset, got {}",
        session.position_seconds
    );

    Ok(())
}

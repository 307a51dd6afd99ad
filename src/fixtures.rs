//! Sample storefront data.
//!
//! A small compiled-in catalog and matching media backend, used by the demo
//! program and the integration tests.

use rust_decimal::{Decimal, prelude::ToPrimitive};
use rusty_money::iso::{self, Currency};
use thiserror::Error;

use crate::{
    catalog::{Catalog, CatalogError, Track, TrackId},
    player::{MediaSource, StaticMedia},
};

/// Errors related to building fixture data.
#[derive(Debug, Error)]
pub enum FixtureError {
    /// A price string could not be parsed.
    #[error("invalid price: {0}")]
    InvalidPrice(String),

    /// A price string names a currency that is not recognized.
    #[error("unknown currency: {0}")]
    UnknownCurrency(String),

    /// The assembled tracks did not form a valid catalog.
    #[error(transparent)]
    Catalog(#[from] CatalogError),
}

/// Parse a price string (e.g. "699 INR") into minor units and currency.
///
/// # Errors
///
/// Returns a [`FixtureError`] if the string is not in the format
/// "AMOUNT CURRENCY", if the amount cannot be parsed as a decimal, or if the
/// currency code is not recognized.
pub fn parse_price(s: &str) -> Result<(i64, &'static Currency), FixtureError> {
    let mut parts = s.split_whitespace();

    let (Some(amount), Some(code), None) = (parts.next(), parts.next(), parts.next()) else {
        return Err(FixtureError::InvalidPrice(format!(
            "expected format 'AMOUNT CURRENCY', got: {s}"
        )));
    };

    let amount = amount
        .parse::<Decimal>()
        .map_err(|_err| FixtureError::InvalidPrice(s.to_string()))?;

    let currency =
        iso::find(code).ok_or_else(|| FixtureError::UnknownCurrency(code.to_string()))?;

    let scale = Decimal::from(10u32.pow(currency.exponent));

    let minor_units = amount
        .checked_mul(scale)
        .and_then(|value| value.round_dp(0).to_i64())
        .ok_or_else(|| FixtureError::InvalidPrice(s.to_string()))?;

    Ok((minor_units, currency))
}

struct Seed {
    id: u32,
    title: &'static str,
    creator: &'static str,
    price: &'static str,
    bpm: &'static str,
    key: &'static str,
    tags: &'static [&'static str],
    media_ref: &'static str,
    duration_seconds: f64,
    artwork: &'static str,
}

const SEEDS: &[Seed] = &[
    Seed {
        id: 1,
        title: "slyrat",
        creator: "ProdTrendyB",
        price: "699 INR",
        bpm: "150 BPM",
        key: "D Major",
        tags: &["bouncy", "happy", "dance"],
        media_ref: "https://www.soundhelix.com/examples/mp3/SoundHelix-Song-1.mp3",
        duration_seconds: 158.0,
        artwork: "https://images.unsplash.com/photo-1614613535308-eb5fbd3d2c17",
    },
    Seed {
        id: 2,
        title: "Neon Lights",
        creator: "LxK Beats",
        price: "599 INR",
        bpm: "118 BPM",
        key: "C# Major",
        tags: &["Indian Pop Beat", "Pop Type Beat", "Electronic Pop"],
        media_ref: "https://www.soundhelix.com/examples/mp3/SoundHelix-Song-2.mp3",
        duration_seconds: 204.0,
        artwork: "https://images.unsplash.com/photo-1557683316-973673baf926",
    },
    Seed {
        id: 3,
        title: "EVEN",
        creator: "Exnegytressss",
        price: "999 INR",
        bpm: "125 BPM",
        key: "B Major",
        tags: &["JUICE WRLD", "LIL PEEP", "MC INSANE"],
        media_ref: "https://www.soundhelix.com/examples/mp3/SoundHelix-Song-3.mp3",
        duration_seconds: 176.0,
        artwork: "https://images.unsplash.com/photo-1470225620780-dba8ba36b745",
    },
    Seed {
        id: 4,
        title: "Lost in you",
        creator: "Itz_DS77",
        price: "699 INR",
        bpm: "76 BPM",
        key: "G# Minor",
        tags: &["Romantic", "hiphop", "soft"],
        media_ref: "https://www.soundhelix.com/examples/mp3/SoundHelix-Song-4.mp3",
        duration_seconds: 221.0,
        artwork: "https://images.unsplash.com/photo-1493225255756-d9584f8606e9",
    },
    Seed {
        id: 5,
        title: "GANGSTAR KARAN AUJLA",
        creator: "MAXXRANGEBEATZ",
        price: "999 INR",
        bpm: "95 BPM",
        key: "A Minor",
        tags: &["@KARANAUJLA", "@CHEEMAY"],
        media_ref: "https://www.soundhelix.com/examples/mp3/SoundHelix-Song-5.mp3",
        duration_seconds: 189.0,
        artwork: "https://images.unsplash.com/photo-1514525253361-bee87184919a",
    },
];

/// The sample catalog, priced in INR.
///
/// # Errors
///
/// Returns a [`FixtureError`] if a seed price fails to parse; fixture data is
/// expected to be valid.
pub fn catalog() -> Result<Catalog, FixtureError> {
    let mut tracks = Vec::with_capacity(SEEDS.len());

    for seed in SEEDS {
        let (price_minor, _currency) = parse_price(seed.price)?;

        tracks.push(Track {
            id: TrackId(seed.id),
            title: seed.title.to_string(),
            creator: seed.creator.to_string(),
            price_minor,
            media_ref: seed.media_ref.to_string(),
            duration_seconds: None,
            bpm: seed.bpm.to_string(),
            key: seed.key.to_string(),
            tags: seed.tags.iter().map(ToString::to_string).collect(),
            artwork: seed.artwork.to_string(),
        });
    }

    Ok(Catalog::new(tracks, iso::INR)?)
}

/// A media backend with a source for every sample track.
pub fn media() -> StaticMedia {
    SEEDS.iter().fold(StaticMedia::new(), |media, seed| {
        media.with_source(
            TrackId(seed.id),
            MediaSource {
                uri: seed.media_ref.to_string(),
                duration_seconds: seed.duration_seconds,
            },
        )
    })
}

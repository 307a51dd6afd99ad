//! Jukebox
//!
//! Jukebox is the client-side state core of a digital beat storefront: it
//! tracks what is playing, what is in the cart, what has been purchased, and
//! gates downloads behind settled payments.
//!
//! Three cooperating engines make up the core, each an explicit instance with
//! injected capabilities rather than ambient shared state:
//!
//! - [`player::Player`] owns the single active audio session, resolving
//!   tracks through a [`player::MediaBackend`].
//! - [`ledger::Ledger`] owns the cart and the append-only purchase set, and
//!   is the sole authority for download gating; every mutation is persisted
//!   through a [`store::BlobStore`] before returning.
//! - [`checkout::CheckoutFlow`] turns a purchase intent into recorded
//!   purchases via a pluggable [`checkout::PaymentGateway`].

pub mod catalog;
pub mod checkout;
pub mod favorites;
pub mod fixtures;
pub mod ledger;
pub mod player;
pub mod prelude;
pub mod store;

//!
//! # Seebu Store
//!
//! Contracts for the hosted backend Seebu runs on: a document database with live query
//! subscriptions and an email/password identity provider. Both are consumed through the
//! [`DocumentStore`] and [`IdentityProvider`] traits so the rest of the app never talks to a
//! concrete SDK.
//!
//! [`MemoryBackend`] implements both contracts in-process. It is what the tests run against and
//! what the CLI persists to disk between invocations.
//!
//! ## Subscriptions
//!
//! Every live read hands back a [`Subscription`]. It yields a full snapshot right away and then
//! one after every matching change, in the order the backend emitted them. Calling
//! [`Subscription::cancel`] (or dropping it) unregisters the listener, after which nothing else is
//! delivered.

#![warn(
	clippy::all,
	clippy::pedantic,
	clippy::correctness,
	clippy::perf,
	clippy::style,
	clippy::suspicious,
	clippy::complexity,
	clippy::nursery,
	clippy::unwrap_used,
	unused_qualifications,
	rust_2018_idioms,
	trivial_casts,
	trivial_numeric_casts,
	unused_allocation,
	clippy::unnecessary_cast,
	clippy::cast_lossless,
	clippy::cast_possible_truncation,
	clippy::cast_possible_wrap,
	clippy::cast_precision_loss,
	clippy::cast_sign_loss,
	clippy::dbg_macro,
	clippy::deprecated_cfg_attr,
	clippy::separated_literal_suffix,
	deprecated
)]
#![forbid(deprecated_in_future)]
#![allow(clippy::missing_errors_doc, clippy::module_name_repetitions)]

mod document;
mod error;
mod identity;
mod memory;
mod store;
mod subscription;

pub use document::{Document, DocumentId, DocumentSnapshot, Filter, QueryDocument, QuerySnapshot};
pub use error::{AuthError, StoreError};
pub use identity::{Credentials, IdentityProvider, UserId};
pub use memory::MemoryBackend;
pub use store::DocumentStore;
pub use subscription::{Subscription, SubscriptionGuard};

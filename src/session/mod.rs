//! The client side of the record store: a cache of one user's records that
//! stays consistent with the store.
//!
//! A [RecordSession] is the single source of truth a view renders from. It
//! talks to the store through the [RecordApi] trait, which is implemented
//! over HTTP by [HttpRecordApi] and in-process by [LocalRecordApi].
//!
//! Changes are only applied to the cache once the store has confirmed them,
//! so a failed request never leaves a half-applied edit behind.

mod api;
mod core;
mod error;
mod http_client;
mod local;

pub use api::RecordApi;
pub use core::{Identity, RecordSession};
pub use error::SessionError;
pub use http_client::{DEFAULT_TIMEOUT, HttpRecordApi};
pub use local::LocalRecordApi;

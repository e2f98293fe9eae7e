//! Eizi relay endpoint.
//!
//! Holds the provider credential and forwards `{ endpoint, method, body }`
//! envelopes from clients to the upstream provider, returning its answer
//! unchanged. The credential is read once at startup and never accepted from,
//! or returned to, a caller.

pub mod proxy;
pub mod server;

pub use proxy::RelayState;
pub use server::{router, run, serve};

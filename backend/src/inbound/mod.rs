//! Inbound adapters translating external requests into domain service calls.
//!
//! The board is served over HTTP only; see [`http`].

pub mod http;

//! Postboard: a small community blog.
//!
//! Layout follows a hexagonal split: [`domain`] holds entities, ports and
//! services; [`inbound`] adapts HTTP requests onto them; [`outbound`]
//! implements the ports over PostgreSQL, memory, the filesystem and caches.

pub mod domain;
pub mod inbound;
pub mod middleware;
pub mod outbound;

pub use domain::TraceId;
pub use middleware::Trace;

//! Outbound adapters implementing the domain ports.
//!
//! - **persistence**: PostgreSQL repositories using Diesel.
//! - **memory**: in-process repositories for database-less runs and tests.
//! - **media**: filesystem store for uploaded images.
//! - **cache**: TTL cache for rendered pages.
//! - **security**: Argon2id password hashing.
//!
//! Adapters only translate between domain types and their backing
//! technology; they contain no business rules.

pub mod cache;
pub mod media;
pub mod memory;
pub mod persistence;
pub mod security;

//! Outbound adapters implementing domain ports.
//!
//! - **http**: reqwest-backed portal API client
//! - **storage**: durable and in-memory credential stores
//!
//! Adapters translate between domain types and transport representations.
//! They contain no business logic.

pub mod http;
pub mod storage;

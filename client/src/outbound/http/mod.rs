//! Portal HTTP adapter.
//!
//! One reqwest client implements every remote port. Response-shape quirks
//! are resolved in `dto` and `envelope`; status mapping lives in `errors`.

mod dto;
mod envelope;
mod errors;
mod portal;

pub use portal::HttpPortal;

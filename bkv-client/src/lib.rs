//! # BinKV Client
//!
//! Purpose: Marshal schema-less mappings into typed store records and back,
//! and expose connect / disconnect / get / put / increment over any
//! `StoreClient`.
//!
//! ## Design Principles
//! 1. **Tagged Dispatch**: Encoding and decoding are exhaustive matches over
//!    value tags.
//! 2. **Checked Capacity**: Declared bin counts are enforced with errors.
//! 3. **Thin Shim**: Transport, retries and pooling stay with the store.
//! 4. **Two Surfaces**: `ConnectionHandle` returns `Result`s; `entry` returns
//!    status pairs for scripting hosts.

mod client;
mod decode;
mod encode;
pub mod entry;
mod incr;

pub use client::{ClientConfig, ClientError, ClientResult, ConnectionHandle};
pub use decode::{decode, decode_value};
pub use encode::{encode, encode_table, encode_value, BinKey};
pub use incr::build_increments;

// bkv-common - Shared types and store boundary for BinKV
//
// This crate defines the dynamic value model, the typed record model and the
// traits a record store implements.

pub mod error;
pub mod record;
pub mod status;
pub mod store;
pub mod types;

// Re-export for convenience
pub use error::*;
pub use record::*;
pub use status::*;
pub use store::*;
pub use types::*;

//! Core record types, tax-id validation, canonical formatting, and the
//! SHA-256 hash chain.
//!
//! Everything here is pure and synchronous: hashing, checksum validation,
//! and formatting never block and never touch shared mutable state, so
//! records for unrelated issuers can be computed in parallel. The one
//! ordering constraint — record N needs record N−1's finalized huella —
//! is handled per issuer by [`ChainRegistry`].

mod builder;
mod chain;
mod error;
mod format;
mod taxid;
mod types;

pub use builder::*;
pub use chain::*;
pub use error::*;
pub use format::*;
pub use taxid::*;
pub use types::*;

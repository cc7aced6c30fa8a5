//! # verifactu
//!
//! Spanish VeriFactu anti-fraud invoicing core: SHA-256 hash chaining
//! ("huella"), NIF/NIE/CIF checksum validation, AEAT RegistroAlta /
//! RegistroAnulacion XML generation, REST submission, and the QR tributario.
//!
//! All monetary values use [`rust_decimal::Decimal`] — never floating point.
//! Every invoicing record is cryptographically linked to its predecessor, so
//! any retroactive edit is detectable and every record can be re-derived
//! bit-for-bit by a third party.
//!
//! ## Quick Start
//!
//! ```rust
//! use chrono::{FixedOffset, NaiveDate, TimeZone};
//! use rust_decimal_macros::dec;
//! use verifactu::core::*;
//!
//! let madrid = FixedOffset::east_opt(2 * 3600).unwrap();
//! let record = IssuanceRecordBuilder::new(
//!     Issuer::new("B12345674", "ACME Gestión SL"),
//!     "F2024-001",
//!     NaiveDate::from_ymd_opt(2024, 6, 15).unwrap(),
//! )
//! .description("Servicios de gestión junio 2024")
//! .add_line(VatLine::subject(dec!(1000), dec!(21), dec!(210)))
//! .build(madrid.with_ymd_and_hms(2024, 6, 15, 10, 30, 0).unwrap())
//! .unwrap();
//!
//! assert_eq!(record.hash.len(), 64);
//! assert!(record.previous_hash.is_empty()); // chain head
//! ```
//!
//! ## Feature Flags
//!
//! | Feature | Description |
//! |---------|-------------|
//! | `core` (default) | Tax-id validation, canonical formatting, hash chain, record types |
//! | `xml` | RegistroAlta/RegistroAnulacion XML + SOAP envelope |
//! | `rest` | REST payload + async registrar submission client |
//! | `qr` | Validation URL + QR tributario rendering |
//! | `all` | Everything |

#[cfg(feature = "core")]
pub mod core;

#[cfg(feature = "xml")]
pub mod xml;

#[cfg(feature = "rest")]
pub mod rest;

#[cfg(feature = "qr")]
pub mod qr;

// Re-export core types at crate root for convenience
#[cfg(feature = "core")]
pub use crate::core::*;

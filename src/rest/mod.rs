//! REST submission path: denormalized payloads and the async registrar
//! client (third-party VeriFactu aggregator API).
//!
//! The client is the only part of the crate that performs I/O. Call it from
//! an async context, apply your own timeout, and treat a timeout as an
//! ERROR-class outcome: poll [`SubmissionClient::status`] before retrying
//! `create`, because submission is not idempotent.

mod client;
mod payload;
mod status;

pub use client::{CancelOptions, CreateResponse, SubmissionClient, SubmitError};
pub use payload::{RestCancellation, RestInvoice, RestVatLine};
pub use status::{SubmissionStatus, SubmissionTracker};

//! SHA-256 hash chaining ("huella" / "encadenamiento").
//!
//! The hash input is a single ampersand-joined `Key=Value` string over a
//! fixed key order, with amounts in the stripped canonical form. The exact
//! byte sequence is a legal contract: a third party must be able to
//! recompute every huella from the stored fields.

use std::collections::HashMap;
use std::sync::{Arc, Mutex, PoisonError};

use chrono::{DateTime, FixedOffset, NaiveDate};
use rust_decimal::Decimal;
use sha2::{Digest, Sha256};

use super::error::VerifactuError;
use super::format::{format_amount_for_hash, format_date, format_timestamp};
use super::types::{CancellationRecord, InvoiceType, IssuanceRecord, PreviousRecordRef};

/// Fields hashed for an issuance record, in canonical order.
#[derive(Debug, Clone, Copy)]
pub struct IssuanceHashFields<'a> {
    pub issuer_tax_id: &'a str,
    pub invoice_number: &'a str,
    pub issue_date: NaiveDate,
    pub invoice_type: InvoiceType,
    pub vat_total: Decimal,
    pub total: Decimal,
    /// Previous record's huella, empty for the chain head.
    pub previous_hash: &'a str,
    pub generated_at: DateTime<FixedOffset>,
}

/// Fields hashed for a cancellation record, in canonical order.
#[derive(Debug, Clone, Copy)]
pub struct CancellationHashFields<'a> {
    pub issuer_tax_id: &'a str,
    pub invoice_number: &'a str,
    pub issue_date: NaiveDate,
    /// Previous record's huella, empty for the chain head.
    pub previous_hash: &'a str,
    pub generated_at: DateTime<FixedOffset>,
}

fn sha256_hex(input: &str) -> String {
    hex::encode(Sha256::digest(input.as_bytes()))
}

/// The canonical pre-hash string for an issuance record. Exposed so audits
/// can show the exact bytes that produced a huella.
pub fn issuance_hash_input(f: &IssuanceHashFields<'_>) -> String {
    format!(
        "IDEmisorFactura={}&NumSerieFactura={}&FechaExpedicionFactura={}&TipoFactura={}&CuotaTotal={}&ImporteTotal={}&Huella={}&FechaHoraHusoGenRegistro={}",
        f.issuer_tax_id,
        f.invoice_number,
        format_date(f.issue_date),
        f.invoice_type.code(),
        format_amount_for_hash(f.vat_total),
        format_amount_for_hash(f.total),
        f.previous_hash,
        format_timestamp(f.generated_at),
    )
}

/// The canonical pre-hash string for a cancellation record.
pub fn cancellation_hash_input(f: &CancellationHashFields<'_>) -> String {
    format!(
        "IDEmisorFactura={}&NumSerieFactura={}&FechaExpedicionFactura={}&Huella={}&FechaHoraHusoGenRegistro={}",
        f.issuer_tax_id,
        f.invoice_number,
        format_date(f.issue_date),
        f.previous_hash,
        format_timestamp(f.generated_at),
    )
}

/// Lowercase hex SHA-256 huella for an issuance record. Deterministic:
/// identical fields always produce the identical 64-character digest.
pub fn compute_issuance_hash(f: &IssuanceHashFields<'_>) -> String {
    sha256_hex(&issuance_hash_input(f))
}

/// Lowercase hex SHA-256 huella for a cancellation record.
pub fn compute_cancellation_hash(f: &CancellationHashFields<'_>) -> String {
    sha256_hex(&cancellation_hash_input(f))
}

/// Recompute an issuance record's huella from its stored fields and compare.
pub fn verify_issuance(record: &IssuanceRecord) -> bool {
    record.hash
        == compute_issuance_hash(&IssuanceHashFields {
            issuer_tax_id: &record.issuer.tax_id,
            invoice_number: &record.invoice_number,
            issue_date: record.issue_date,
            invoice_type: record.invoice_type,
            vat_total: record.vat_total,
            total: record.total,
            previous_hash: &record.previous_hash,
            generated_at: record.generated_at,
        })
}

/// Recompute a cancellation record's huella from its stored fields and compare.
pub fn verify_cancellation(record: &CancellationRecord) -> bool {
    record.hash
        == compute_cancellation_hash(&CancellationHashFields {
            issuer_tax_id: &record.issuer.tax_id,
            invoice_number: &record.invoice_number,
            issue_date: record.issue_date,
            previous_hash: &record.previous_hash,
            generated_at: record.generated_at,
        })
}

/// Ordered `(hash, previous_hash)` pair for linkage verification.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ChainEntry {
    pub hash: String,
    pub previous_hash: String,
}

impl ChainEntry {
    pub fn new(hash: impl Into<String>, previous_hash: impl Into<String>) -> Self {
        Self {
            hash: hash.into(),
            previous_hash: previous_hash.into(),
        }
    }
}

/// Outcome of [`validate_chain`].
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ChainCheck {
    pub valid: bool,
    /// First index whose `previous_hash` does not match the predecessor.
    pub broken_at: Option<usize>,
}

impl ChainCheck {
    /// Convert into a `Result` carrying the breaking index.
    pub fn into_result(self) -> Result<(), VerifactuError> {
        match self.broken_at {
            None => Ok(()),
            Some(broken_at) => Err(VerifactuError::Chain { broken_at }),
        }
    }
}

/// Verify linkage of a chain: for all i > 0,
/// `entries[i].previous_hash == entries[i-1].hash`.
///
/// Checks linkage only — it does not recompute hashes from source fields.
/// Feed it outputs of [`compute_issuance_hash`] / [`compute_cancellation_hash`]
/// for end-to-end verification. A chain of length ≤ 1 is always valid.
pub fn validate_chain(entries: &[ChainEntry]) -> ChainCheck {
    for i in 1..entries.len() {
        if entries[i].previous_hash != entries[i - 1].hash {
            return ChainCheck {
                valid: false,
                broken_at: Some(i),
            };
        }
    }
    ChainCheck {
        valid: true,
        broken_at: None,
    }
}

/// Mutable head of one issuer's chain.
///
/// Record N's hash input needs record N−1's finalized huella, so all hash
/// computation for one issuer must go through `&mut self` here — the borrow
/// checker (or the [`ChainRegistry`] mutex across threads) serializes it.
/// Cancellation records share the same chain as issuance records.
#[derive(Debug, Clone)]
pub struct IssuerChain {
    issuer_tax_id: String,
    head: Option<PreviousRecordRef>,
}

impl IssuerChain {
    /// A fresh chain with no records yet.
    pub fn new(issuer_tax_id: impl Into<String>) -> Self {
        Self {
            issuer_tax_id: issuer_tax_id.into(),
            head: None,
        }
    }

    /// Resume a chain from the last persisted record.
    pub fn resuming(issuer_tax_id: impl Into<String>, head: PreviousRecordRef) -> Self {
        Self {
            issuer_tax_id: issuer_tax_id.into(),
            head: Some(head),
        }
    }

    pub fn issuer_tax_id(&self) -> &str {
        &self.issuer_tax_id
    }

    /// The last finalized record, if any.
    pub fn head(&self) -> Option<&PreviousRecordRef> {
        self.head.as_ref()
    }

    /// The huella the next record must chain to ("" for an empty chain).
    pub fn previous_hash(&self) -> &str {
        self.head.as_ref().map(|h| h.hash.as_str()).unwrap_or("")
    }

    /// Advance the head after a record for this issuer has been finalized.
    pub fn advance(&mut self, record: PreviousRecordRef) -> Result<(), VerifactuError> {
        if record.issuer_tax_id != self.issuer_tax_id {
            return Err(VerifactuError::Validation(format!(
                "record issuer {} does not belong to chain of {}",
                record.issuer_tax_id, self.issuer_tax_id
            )));
        }
        self.head = Some(record);
        Ok(())
    }
}

/// One serialized queue per issuer tax id.
///
/// A keyed mutex rather than a single global lock: two records for the same
/// issuer can never be hashed concurrently, while distinct issuers proceed
/// fully in parallel.
#[derive(Debug, Default)]
pub struct ChainRegistry {
    chains: Mutex<HashMap<String, Arc<Mutex<IssuerChain>>>>,
}

impl ChainRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    /// Get (or create) the chain handle for an issuer. Lock the returned
    /// mutex for the whole read-previous-hash / build / advance sequence.
    pub fn issuer(&self, tax_id: &str) -> Arc<Mutex<IssuerChain>> {
        let mut chains = self
            .chains
            .lock()
            .unwrap_or_else(PoisonError::into_inner);
        chains
            .entry(tax_id.to_string())
            .or_insert_with(|| Arc::new(Mutex::new(IssuerChain::new(tax_id))))
            .clone()
    }

    /// Seed an issuer's chain from a persisted head (e.g. on startup).
    pub fn resume(&self, head: PreviousRecordRef) {
        let mut chains = self
            .chains
            .lock()
            .unwrap_or_else(PoisonError::into_inner);
        let issuer = head.issuer_tax_id.clone();
        chains.insert(
            issuer.clone(),
            Arc::new(Mutex::new(IssuerChain::resuming(issuer, head))),
        );
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;
    use rust_decimal_macros::dec;

    fn fields<'a>(previous_hash: &'a str) -> IssuanceHashFields<'a> {
        let madrid = FixedOffset::east_opt(2 * 3600).unwrap();
        IssuanceHashFields {
            issuer_tax_id: "B12345674",
            invoice_number: "F2024-001",
            issue_date: NaiveDate::from_ymd_opt(2024, 6, 15).unwrap(),
            invoice_type: InvoiceType::Complete,
            vat_total: dec!(210.00),
            total: dec!(1210.00),
            previous_hash,
            generated_at: madrid.with_ymd_and_hms(2024, 6, 15, 10, 30, 0).unwrap(),
        }
    }

    #[test]
    fn issuance_input_has_fixed_key_order() {
        let input = issuance_hash_input(&fields(""));
        assert_eq!(
            input,
            "IDEmisorFactura=B12345674&NumSerieFactura=F2024-001&\
             FechaExpedicionFactura=15-06-2024&TipoFactura=F1&CuotaTotal=210&\
             ImporteTotal=1210&Huella=&FechaHoraHusoGenRegistro=2024-06-15T10:30:00+02:00"
        );
    }

    #[test]
    fn hash_is_deterministic_64_lowercase_hex() {
        let a = compute_issuance_hash(&fields(""));
        let b = compute_issuance_hash(&fields(""));
        assert_eq!(a, b);
        assert_eq!(a.len(), 64);
        assert!(a.chars().all(|c| c.is_ascii_hexdigit() && !c.is_ascii_uppercase()));
    }

    #[test]
    fn changing_total_changes_hash() {
        let mut f = fields("");
        let a = compute_issuance_hash(&f);
        f.total = dec!(1210.01);
        assert_ne!(a, compute_issuance_hash(&f));
    }

    #[test]
    fn cancellation_hash_uses_reduced_key_set() {
        let madrid = FixedOffset::east_opt(2 * 3600).unwrap();
        let f = CancellationHashFields {
            issuer_tax_id: "B12345674",
            invoice_number: "F2024-001",
            issue_date: NaiveDate::from_ymd_opt(2024, 6, 15).unwrap(),
            previous_hash: "abc",
            generated_at: madrid.with_ymd_and_hms(2024, 6, 20, 9, 0, 0).unwrap(),
        };
        let input = cancellation_hash_input(&f);
        assert!(!input.contains("TipoFactura"));
        assert!(!input.contains("ImporteTotal"));
        assert!(input.contains("Huella=abc"));
        assert_eq!(compute_cancellation_hash(&f).len(), 64);
    }

    #[test]
    fn two_linked_records_validate() {
        let a = compute_issuance_hash(&fields(""));
        let b = compute_issuance_hash(&fields(&a));
        let check = validate_chain(&[
            ChainEntry::new(a.clone(), ""),
            ChainEntry::new(b, a),
        ]);
        assert!(check.valid);
        assert_eq!(check.broken_at, None);
    }

    #[test]
    fn broken_chain_reports_index() {
        let check = validate_chain(&[
            ChainEntry::new("abc", ""),
            ChainEntry::new("def", "wrong"),
        ]);
        assert!(!check.valid);
        assert_eq!(check.broken_at, Some(1));
        assert!(matches!(
            check.into_result(),
            Err(VerifactuError::Chain { broken_at: 1 })
        ));
    }

    #[test]
    fn short_chains_are_valid() {
        assert!(validate_chain(&[]).valid);
        assert!(validate_chain(&[ChainEntry::new("abc", "")]).valid);
    }

    #[test]
    fn issuer_chain_advances_head() {
        let mut chain = IssuerChain::new("B12345674");
        assert_eq!(chain.previous_hash(), "");
        let h = compute_issuance_hash(&fields(""));
        chain
            .advance(PreviousRecordRef {
                issuer_tax_id: "B12345674".into(),
                invoice_number: "F2024-001".into(),
                issue_date: NaiveDate::from_ymd_opt(2024, 6, 15).unwrap(),
                hash: h.clone(),
            })
            .unwrap();
        assert_eq!(chain.previous_hash(), h);
    }

    #[test]
    fn issuer_chain_rejects_foreign_record() {
        let mut chain = IssuerChain::new("B12345674");
        let err = chain.advance(PreviousRecordRef {
            issuer_tax_id: "12345678Z".into(),
            invoice_number: "F2024-001".into(),
            issue_date: NaiveDate::from_ymd_opt(2024, 6, 15).unwrap(),
            hash: "abc".into(),
        });
        assert!(matches!(err, Err(VerifactuError::Validation(_))));
    }

    #[test]
    fn registry_hands_out_independent_chains() {
        let registry = ChainRegistry::new();
        let a = registry.issuer("B12345674");
        let b = registry.issuer("12345678Z");
        let a2 = registry.issuer("B12345674");
        assert!(Arc::ptr_eq(&a, &a2));
        assert!(!Arc::ptr_eq(&a, &b));
    }
}

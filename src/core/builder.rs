use chrono::{DateTime, FixedOffset, NaiveDate};
use rust_decimal::Decimal;

use super::chain::{
    CancellationHashFields, IssuanceHashFields, compute_cancellation_hash, compute_issuance_hash,
};
use super::error::VerifactuError;
use super::taxid::classify;
use super::types::*;

/// The XSD allows at most 12 breakdown lines per record.
const MAX_VAT_LINES: usize = 12;

/// Builder for issuance records. Seals the record by computing its huella
/// at `build()`; the result is immutable.
///
/// ```
/// use chrono::{FixedOffset, NaiveDate, TimeZone};
/// use rust_decimal_macros::dec;
/// use verifactu::core::*;
///
/// let madrid = FixedOffset::east_opt(2 * 3600).unwrap();
/// let record = IssuanceRecordBuilder::new(
///     Issuer::new("B12345674", "ACME Gestión SL"),
///     "F2024-001",
///     NaiveDate::from_ymd_opt(2024, 6, 15).unwrap(),
/// )
/// .description("Servicios de gestión junio 2024")
/// .recipient(Recipient::new("12345678Z", "Juan Pérez"))
/// .add_line(VatLine::subject(dec!(1000), dec!(21), dec!(210)))
/// .build(madrid.with_ymd_and_hms(2024, 6, 15, 10, 30, 0).unwrap())
/// .unwrap();
///
/// assert_eq!(record.total, dec!(1210));
/// ```
pub struct IssuanceRecordBuilder {
    issuer: Issuer,
    invoice_number: String,
    issue_date: NaiveDate,
    invoice_type: InvoiceType,
    description: String,
    recipient: Option<Recipient>,
    lines: Vec<VatLine>,
    vat_total: Option<Decimal>,
    total: Option<Decimal>,
    rectification: Option<Rectification>,
    previous: Option<PreviousRecordRef>,
    software: SoftwareInfo,
}

impl IssuanceRecordBuilder {
    pub fn new(issuer: Issuer, invoice_number: impl Into<String>, issue_date: NaiveDate) -> Self {
        Self {
            issuer,
            invoice_number: invoice_number.into(),
            issue_date,
            invoice_type: InvoiceType::Complete,
            description: String::new(),
            recipient: None,
            lines: Vec::new(),
            vat_total: None,
            total: None,
            rectification: None,
            previous: None,
            software: SoftwareInfo::default(),
        }
    }

    pub fn invoice_type(mut self, invoice_type: InvoiceType) -> Self {
        self.invoice_type = invoice_type;
        self
    }

    pub fn description(mut self, description: impl Into<String>) -> Self {
        self.description = description.into();
        self
    }

    pub fn recipient(mut self, recipient: Recipient) -> Self {
        self.recipient = Some(recipient);
        self
    }

    pub fn add_line(mut self, line: VatLine) -> Self {
        self.lines.push(line);
        self
    }

    /// Override the computed totals (CuotaTotal / ImporteTotal).
    pub fn totals(mut self, vat_total: Decimal, total: Decimal) -> Self {
        self.vat_total = Some(vat_total);
        self.total = Some(total);
        self
    }

    /// Mark this record as a rectifying invoice.
    ///
    /// The invoice type is set to R1 for both substitution and by-difference
    /// rectifications; R2/R3/R5 selection is out of scope for this core.
    pub fn rectifying(mut self, rectification: Rectification) -> Self {
        self.rectification = Some(rectification);
        self.invoice_type = InvoiceType::RectifyingLegal;
        self
    }

    /// Chain this record to the issuer's previous record. Omit for the
    /// chain's first record.
    pub fn previous(mut self, previous: PreviousRecordRef) -> Self {
        self.previous = Some(previous);
        self
    }

    pub fn software(mut self, software: SoftwareInfo) -> Self {
        self.software = software;
        self
    }

    /// Validate, compute totals, and seal the record with its huella.
    pub fn build(
        self,
        generated_at: DateTime<FixedOffset>,
    ) -> Result<IssuanceRecord, VerifactuError> {
        if !classify(&self.issuer.tax_id).valid {
            return Err(VerifactuError::Validation(format!(
                "invalid issuer tax id '{}'",
                self.issuer.tax_id
            )));
        }
        if let Some(tax_id) = self.recipient.as_ref().and_then(|r| r.tax_id.as_deref()) {
            if !classify(tax_id).valid {
                return Err(VerifactuError::Validation(format!(
                    "invalid recipient tax id '{tax_id}'"
                )));
            }
        }
        if self.invoice_number.trim().is_empty() {
            return Err(VerifactuError::Validation("empty invoice number".into()));
        }
        if self.lines.is_empty() {
            return Err(VerifactuError::Validation(
                "a record needs at least one VAT line".into(),
            ));
        }
        if self.lines.len() > MAX_VAT_LINES {
            return Err(VerifactuError::Validation(format!(
                "at most {MAX_VAT_LINES} VAT lines allowed, got {}",
                self.lines.len()
            )));
        }
        if let Some(r) = &self.rectification {
            if r.rectified.is_empty() {
                return Err(VerifactuError::Validation(
                    "rectification without rectified invoice references".into(),
                ));
            }
        }
        if let Some(prev) = &self.previous {
            if prev.issuer_tax_id != self.issuer.tax_id {
                return Err(VerifactuError::Validation(format!(
                    "previous record belongs to issuer {}, not {}",
                    prev.issuer_tax_id, self.issuer.tax_id
                )));
            }
        }

        let vat_total = self
            .vat_total
            .unwrap_or_else(|| self.lines.iter().map(VatLine::vat_amount).sum());
        let total = self.total.unwrap_or_else(|| {
            self.lines
                .iter()
                .map(|l| {
                    let surcharge = match &l.kind {
                        VatKind::Subject {
                            surcharge: Some(s), ..
                        } => s.amount,
                        _ => Decimal::ZERO,
                    };
                    l.base + l.vat_amount() + surcharge
                })
                .sum()
        });

        let previous_hash = self
            .previous
            .as_ref()
            .map(|p| p.hash.clone())
            .unwrap_or_default();
        let hash = compute_issuance_hash(&IssuanceHashFields {
            issuer_tax_id: &self.issuer.tax_id,
            invoice_number: &self.invoice_number,
            issue_date: self.issue_date,
            invoice_type: self.invoice_type,
            vat_total,
            total,
            previous_hash: &previous_hash,
            generated_at,
        });

        Ok(IssuanceRecord {
            issuer: self.issuer,
            invoice_number: self.invoice_number,
            issue_date: self.issue_date,
            invoice_type: self.invoice_type,
            description: self.description,
            recipient: self.recipient,
            lines: self.lines,
            vat_total,
            total,
            rectification: self.rectification,
            previous: self.previous,
            previous_hash,
            hash,
            generated_at,
            software: self.software,
        })
    }
}

/// Builder for cancellation records. Cancellations chain into the same
/// per-issuer sequence as issuance records.
pub struct CancellationRecordBuilder {
    issuer: Issuer,
    invoice_number: String,
    issue_date: NaiveDate,
    previous: Option<PreviousRecordRef>,
    software: SoftwareInfo,
}

impl CancellationRecordBuilder {
    pub fn new(issuer: Issuer, invoice_number: impl Into<String>, issue_date: NaiveDate) -> Self {
        Self {
            issuer,
            invoice_number: invoice_number.into(),
            issue_date,
            previous: None,
            software: SoftwareInfo::default(),
        }
    }

    /// Chain to the issuer's last record (issuance or cancellation).
    pub fn previous(mut self, previous: PreviousRecordRef) -> Self {
        self.previous = Some(previous);
        self
    }

    pub fn software(mut self, software: SoftwareInfo) -> Self {
        self.software = software;
        self
    }

    pub fn build(
        self,
        generated_at: DateTime<FixedOffset>,
    ) -> Result<CancellationRecord, VerifactuError> {
        if !classify(&self.issuer.tax_id).valid {
            return Err(VerifactuError::Validation(format!(
                "invalid issuer tax id '{}'",
                self.issuer.tax_id
            )));
        }
        if self.invoice_number.trim().is_empty() {
            return Err(VerifactuError::Validation("empty invoice number".into()));
        }
        if let Some(prev) = &self.previous {
            if prev.issuer_tax_id != self.issuer.tax_id {
                return Err(VerifactuError::Validation(format!(
                    "previous record belongs to issuer {}, not {}",
                    prev.issuer_tax_id, self.issuer.tax_id
                )));
            }
        }

        let previous_hash = self
            .previous
            .as_ref()
            .map(|p| p.hash.clone())
            .unwrap_or_default();
        let hash = compute_cancellation_hash(&CancellationHashFields {
            issuer_tax_id: &self.issuer.tax_id,
            invoice_number: &self.invoice_number,
            issue_date: self.issue_date,
            previous_hash: &previous_hash,
            generated_at,
        });

        Ok(CancellationRecord {
            issuer: self.issuer,
            invoice_number: self.invoice_number,
            issue_date: self.issue_date,
            previous: self.previous,
            previous_hash,
            hash,
            generated_at,
            software: self.software,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;
    use rust_decimal_macros::dec;

    fn madrid() -> FixedOffset {
        FixedOffset::east_opt(2 * 3600).unwrap()
    }

    fn ts() -> DateTime<FixedOffset> {
        madrid().with_ymd_and_hms(2024, 6, 15, 10, 30, 0).unwrap()
    }

    fn base_builder() -> IssuanceRecordBuilder {
        IssuanceRecordBuilder::new(
            Issuer::new("B12345674", "ACME Gestión SL"),
            "F2024-001",
            NaiveDate::from_ymd_opt(2024, 6, 15).unwrap(),
        )
        .description("Servicios junio")
        .add_line(VatLine::subject(dec!(1000), dec!(21), dec!(210)))
    }

    #[test]
    fn totals_computed_from_lines() {
        let record = base_builder()
            .add_line(VatLine::subject(dec!(100), dec!(10), dec!(10)))
            .build(ts())
            .unwrap();
        assert_eq!(record.vat_total, dec!(220));
        assert_eq!(record.total, dec!(1320));
    }

    #[test]
    fn exempt_lines_add_no_vat() {
        let record = base_builder()
            .add_line(VatLine::exempt(dec!(500), ExemptionCode::E1))
            .build(ts())
            .unwrap();
        assert_eq!(record.vat_total, dec!(210));
        assert_eq!(record.total, dec!(1710));
    }

    #[test]
    fn built_record_verifies() {
        let record = base_builder().build(ts()).unwrap();
        assert!(crate::core::verify_issuance(&record));
        assert!(record.previous_hash.is_empty());
    }

    #[test]
    fn chained_record_carries_previous_hash() {
        let first = base_builder().build(ts()).unwrap();
        let second = IssuanceRecordBuilder::new(
            Issuer::new("B12345674", "ACME Gestión SL"),
            "F2024-002",
            NaiveDate::from_ymd_opt(2024, 6, 16).unwrap(),
        )
        .description("Servicios")
        .add_line(VatLine::subject(dec!(200), dec!(21), dec!(42)))
        .previous(first.as_previous_ref())
        .build(ts())
        .unwrap();
        assert_eq!(second.previous_hash, first.hash);
        assert!(crate::core::verify_issuance(&second));
    }

    #[test]
    fn rejects_invalid_issuer() {
        let err = IssuanceRecordBuilder::new(
            Issuer::new("B12345670", "Bad SL"),
            "F2024-001",
            NaiveDate::from_ymd_opt(2024, 6, 15).unwrap(),
        )
        .add_line(VatLine::subject(dec!(100), dec!(21), dec!(21)))
        .build(ts());
        assert!(matches!(err, Err(VerifactuError::Validation(_))));
    }

    #[test]
    fn rejects_empty_lines_and_too_many() {
        assert!(matches!(
            IssuanceRecordBuilder::new(
                Issuer::new("B12345674", "ACME"),
                "F2024-001",
                NaiveDate::from_ymd_opt(2024, 6, 15).unwrap(),
            )
            .build(ts()),
            Err(VerifactuError::Validation(_))
        ));

        let mut b = IssuanceRecordBuilder::new(
            Issuer::new("B12345674", "ACME"),
            "F2024-001",
            NaiveDate::from_ymd_opt(2024, 6, 15).unwrap(),
        );
        for _ in 0..13 {
            b = b.add_line(VatLine::subject(dec!(1), dec!(21), dec!(0.21)));
        }
        assert!(matches!(b.build(ts()), Err(VerifactuError::Validation(_))));
    }

    #[test]
    fn rejects_previous_from_other_issuer() {
        let foreign = PreviousRecordRef {
            issuer_tax_id: "12345678Z".into(),
            invoice_number: "A-1".into(),
            issue_date: NaiveDate::from_ymd_opt(2024, 1, 1).unwrap(),
            hash: "abc".into(),
        };
        let err = base_builder().previous(foreign).build(ts());
        assert!(matches!(err, Err(VerifactuError::Validation(_))));
    }

    #[test]
    fn rectifying_forces_r1() {
        let record = base_builder()
            .rectifying(Rectification {
                kind: RectificationType::Difference,
                rectified: vec![RectifiedInvoiceRef {
                    invoice_number: "F2024-000".into(),
                    issue_date: NaiveDate::from_ymd_opt(2024, 5, 1).unwrap(),
                }],
                corrected_amounts: None,
            })
            .build(ts())
            .unwrap();
        assert_eq!(record.invoice_type, InvoiceType::RectifyingLegal);
    }

    #[test]
    fn cancellation_chains_after_issuance() {
        let issued = base_builder().build(ts()).unwrap();
        let cancelled = CancellationRecordBuilder::new(
            issued.issuer.clone(),
            issued.invoice_number.clone(),
            issued.issue_date,
        )
        .previous(issued.as_previous_ref())
        .build(madrid().with_ymd_and_hms(2024, 6, 20, 9, 0, 0).unwrap())
        .unwrap();
        assert_eq!(cancelled.previous_hash, issued.hash);
        assert!(crate::core::verify_cancellation(&cancelled));
    }
}

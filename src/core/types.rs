use chrono::{DateTime, FixedOffset, NaiveDate};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

/// Invoice type codes per the AEAT VeriFactu spec (TipoFactura).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum InvoiceType {
    /// F1 — Complete invoice (recipient identified).
    Complete,
    /// F2 — Simplified invoice (ticket).
    Simplified,
    /// F3 — Invoice replacing simplified invoices.
    ReplacingSimplified,
    /// R1 — Rectifying invoice (legal grounds, art. 80.1/80.2/80.6 LIVA).
    RectifyingLegal,
    /// R2 — Rectifying invoice (insolvency, art. 80.3).
    RectifyingInsolvency,
    /// R3 — Rectifying invoice (bad debt, art. 80.4).
    RectifyingBadDebt,
    /// R4 — Rectifying invoice (other grounds).
    RectifyingOther,
    /// R5 — Rectifying invoice for simplified invoices.
    RectifyingSimplified,
}

impl InvoiceType {
    /// AEAT code string.
    pub fn code(&self) -> &'static str {
        match self {
            Self::Complete => "F1",
            Self::Simplified => "F2",
            Self::ReplacingSimplified => "F3",
            Self::RectifyingLegal => "R1",
            Self::RectifyingInsolvency => "R2",
            Self::RectifyingBadDebt => "R3",
            Self::RectifyingOther => "R4",
            Self::RectifyingSimplified => "R5",
        }
    }

    /// Parse from an AEAT code string.
    pub fn from_code(code: &str) -> Option<Self> {
        match code {
            "F1" => Some(Self::Complete),
            "F2" => Some(Self::Simplified),
            "F3" => Some(Self::ReplacingSimplified),
            "R1" => Some(Self::RectifyingLegal),
            "R2" => Some(Self::RectifyingInsolvency),
            "R3" => Some(Self::RectifyingBadDebt),
            "R4" => Some(Self::RectifyingOther),
            "R5" => Some(Self::RectifyingSimplified),
            _ => None,
        }
    }

    /// True for the R-series codes.
    pub fn is_rectifying(&self) -> bool {
        !matches!(
            self,
            Self::Complete | Self::Simplified | Self::ReplacingSimplified
        )
    }
}

/// CalificacionOperacion for subject VAT lines.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum OperationQualification {
    /// S1 — Subject, no reverse charge.
    Subject,
    /// S2 — Subject, reverse charge.
    SubjectReverseCharge,
    /// N1 — Not subject (art. 7, 14, others).
    NotSubject,
    /// N2 — Not subject due to localisation rules.
    NotSubjectLocalisation,
}

impl OperationQualification {
    pub fn code(&self) -> &'static str {
        match self {
            Self::Subject => "S1",
            Self::SubjectReverseCharge => "S2",
            Self::NotSubject => "N1",
            Self::NotSubjectLocalisation => "N2",
        }
    }
}

/// OperacionExenta codes for exempt VAT lines.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum ExemptionCode {
    /// E1 — Exempt, art. 20 LIVA.
    E1,
    /// E2 — Exempt, art. 21 LIVA.
    E2,
    /// E3 — Exempt, art. 22 LIVA.
    E3,
    /// E4 — Exempt, arts. 23 and 24 LIVA.
    E4,
    /// E5 — Exempt, art. 25 LIVA.
    E5,
    /// E6 — Exempt, other grounds.
    E6,
}

impl ExemptionCode {
    pub fn code(&self) -> &'static str {
        match self {
            Self::E1 => "E1",
            Self::E2 => "E2",
            Self::E3 => "E3",
            Self::E4 => "E4",
            Self::E5 => "E5",
            Self::E6 => "E6",
        }
    }
}

/// Tax kind for a breakdown line (Impuesto).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum TaxType {
    /// 01 — IVA.
    Iva,
    /// 02 — IPSI (Ceuta/Melilla).
    Ipsi,
    /// 03 — IGIC (Canary Islands).
    Igic,
    /// 05 — Other.
    Other,
}

impl TaxType {
    pub fn code(&self) -> &'static str {
        match self {
            Self::Iva => "01",
            Self::Ipsi => "02",
            Self::Igic => "03",
            Self::Other => "05",
        }
    }
}

/// Equivalence surcharge attached to a subject line.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Surcharge {
    pub rate: Decimal,
    pub amount: Decimal,
}

/// The tax treatment of a breakdown line.
///
/// A line either carries a rate and VAT amount or an exemption code — never
/// both. The enum makes the illegal combination unrepresentable.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub enum VatKind {
    /// Subject operation with a rate and charged VAT.
    Subject {
        qualification: OperationQualification,
        rate: Decimal,
        vat_amount: Decimal,
        surcharge: Option<Surcharge>,
    },
    /// Exempt or non-subject operation identified by its code.
    Exempt(ExemptionCode),
}

/// One VAT breakdown line (DetalleDesglose). The XSD allows at most 12 per
/// record.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct VatLine {
    /// Tax kind; omitted from XML when `None` (IVA is assumed).
    pub tax: Option<TaxType>,
    /// Tax regime key (ClaveRegimen, "01".."20").
    pub regime_key: String,
    /// Taxable base or non-subject amount.
    pub base: Decimal,
    pub kind: VatKind,
}

impl VatLine {
    /// A standard subject line (S1, general regime).
    pub fn subject(base: Decimal, rate: Decimal, vat_amount: Decimal) -> Self {
        Self {
            tax: None,
            regime_key: "01".into(),
            base,
            kind: VatKind::Subject {
                qualification: OperationQualification::Subject,
                rate,
                vat_amount,
                surcharge: None,
            },
        }
    }

    /// An exempt line (general regime).
    pub fn exempt(base: Decimal, code: ExemptionCode) -> Self {
        Self {
            tax: None,
            regime_key: "01".into(),
            base,
            kind: VatKind::Exempt(code),
        }
    }

    /// The VAT charged on this line (zero for exempt lines).
    pub fn vat_amount(&self) -> Decimal {
        match &self.kind {
            VatKind::Subject { vat_amount, .. } => *vat_amount,
            VatKind::Exempt(_) => Decimal::ZERO,
        }
    }

    /// The rate applied, if the line is subject.
    pub fn rate(&self) -> Option<Decimal> {
        match &self.kind {
            VatKind::Subject { rate, .. } => Some(*rate),
            VatKind::Exempt(_) => None,
        }
    }
}

/// Invoice issuer (ObligadoEmision).
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Issuer {
    /// NIF/CIF, already validated via [`crate::core::classify`].
    pub tax_id: String,
    pub name: String,
}

impl Issuer {
    pub fn new(tax_id: impl Into<String>, name: impl Into<String>) -> Self {
        Self {
            tax_id: tax_id.into(),
            name: name.into(),
        }
    }
}

/// Invoice recipient (IDDestinatario). Optional for simplified invoices.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Recipient {
    pub tax_id: Option<String>,
    pub name: String,
}

impl Recipient {
    pub fn new(tax_id: impl Into<String>, name: impl Into<String>) -> Self {
        Self {
            tax_id: Some(tax_id.into()),
            name: name.into(),
        }
    }
}

/// Identification of the previous record in the issuer's chain
/// (RegistroAnterior). Absent only for the chain head.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PreviousRecordRef {
    pub issuer_tax_id: String,
    pub invoice_number: String,
    pub issue_date: NaiveDate,
    pub hash: String,
}

/// Rectification type (TipoRectificativa).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum RectificationType {
    /// S — Substitution.
    Substitution,
    /// I — By difference.
    Difference,
}

impl RectificationType {
    pub fn code(&self) -> &'static str {
        match self {
            Self::Substitution => "S",
            Self::Difference => "I",
        }
    }
}

/// Reference to a rectified invoice (IDFacturaRectificada).
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RectifiedInvoiceRef {
    pub invoice_number: String,
    pub issue_date: NaiveDate,
}

/// Original amounts replaced by a substitution-type rectification
/// (ImporteRectificacion).
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CorrectedAmounts {
    pub base: Decimal,
    pub vat: Decimal,
}

/// Rectification block of an R-series invoice.
///
/// The corrected-amounts sub-block is only emitted for substitution-type
/// rectifications; for by-difference it is ignored by the serializer.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Rectification {
    pub kind: RectificationType,
    pub rectified: Vec<RectifiedInvoiceRef>,
    pub corrected_amounts: Option<CorrectedAmounts>,
}

/// Software identification block (SistemaInformatico), required on every
/// record per the AEAT spec.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SoftwareInfo {
    /// Manufacturer name (NombreRazon).
    pub name: String,
    /// Manufacturer NIF.
    pub nif: String,
    /// Product name (NombreSistemaInformatico, max 30 chars).
    pub system_name: String,
    /// Software id (IdSistemaInformatico, max 2 chars).
    pub system_id: String,
    /// Version (max 50 chars).
    pub version: String,
    /// Installation number (max 100 chars).
    pub installation_number: String,
    /// TipoUsoPosibleSoloVerifactu — this software only emits VeriFactu records.
    pub verifactu_only: bool,
    /// TipoUsoPosibleMultiOT — supports multiple taxpayers.
    pub multi_taxpayer: bool,
    /// IndicadorMultiplesOT — currently serving multiple taxpayers.
    pub multiple_taxpayers_active: bool,
}

impl Default for SoftwareInfo {
    fn default() -> Self {
        Self {
            name: "Itineramio SL".into(),
            nif: "B12345678".into(),
            system_name: "Itineramio Gestion".into(),
            system_id: "IT".into(),
            version: env!("CARGO_PKG_VERSION").into(),
            installation_number: "1".into(),
            verifactu_only: true,
            multi_taxpayer: true,
            multiple_taxpayers_active: true,
        }
    }
}

/// An invoice issuance record (RegistroAlta).
///
/// Immutable once built: `hash` is the SHA-256 of the canonical field string,
/// so any field change invalidates it and breaks the chain for every
/// downstream record. Construct via [`crate::core::IssuanceRecordBuilder`].
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct IssuanceRecord {
    pub issuer: Issuer,
    /// Series + number (NumSerieFactura).
    pub invoice_number: String,
    pub issue_date: NaiveDate,
    pub invoice_type: InvoiceType,
    /// DescripcionOperacion free text.
    pub description: String,
    pub recipient: Option<Recipient>,
    pub lines: Vec<VatLine>,
    /// CuotaTotal.
    pub vat_total: Decimal,
    /// ImporteTotal.
    pub total: Decimal,
    pub rectification: Option<Rectification>,
    /// Previous record in this issuer's chain; `None` for the chain head.
    pub previous: Option<PreviousRecordRef>,
    /// Previous record's huella; empty string only for the chain head.
    pub previous_hash: String,
    /// This record's huella (lowercase hex SHA-256).
    pub hash: String,
    pub generated_at: DateTime<FixedOffset>,
    pub software: SoftwareInfo,
}

/// An invoice cancellation record (RegistroAnulacion).
///
/// Participates in the same per-issuer chain as issuance records, with its
/// own reduced hash formula. Construct via
/// [`crate::core::CancellationRecordBuilder`].
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CancellationRecord {
    pub issuer: Issuer,
    pub invoice_number: String,
    pub issue_date: NaiveDate,
    pub previous: Option<PreviousRecordRef>,
    pub previous_hash: String,
    pub hash: String,
    pub generated_at: DateTime<FixedOffset>,
    pub software: SoftwareInfo,
}

impl IssuanceRecord {
    /// Reference to this record for chaining the next one.
    pub fn as_previous_ref(&self) -> PreviousRecordRef {
        PreviousRecordRef {
            issuer_tax_id: self.issuer.tax_id.clone(),
            invoice_number: self.invoice_number.clone(),
            issue_date: self.issue_date,
            hash: self.hash.clone(),
        }
    }
}

impl CancellationRecord {
    /// Reference to this record for chaining the next one.
    pub fn as_previous_ref(&self) -> PreviousRecordRef {
        PreviousRecordRef {
            issuer_tax_id: self.issuer.tax_id.clone(),
            invoice_number: self.invoice_number.clone(),
            issue_date: self.issue_date,
            hash: self.hash.clone(),
        }
    }
}

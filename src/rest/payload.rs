use std::collections::BTreeMap;

use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

use crate::core::{
    CancellationRecord, IssuanceRecord, VatKind, VerifactuError, format_amount_for_display,
    format_date,
};

/// One flattened VAT line of the REST payload.
///
/// Unlike the XML Desglose, lines here are grouped by rate: one line per
/// distinct rate in the source record, base and quota summed. Exempt lines
/// are grouped per exemption code.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RestVatLine {
    #[serde(rename = "tipo_impositivo", skip_serializing_if = "Option::is_none")]
    pub rate: Option<String>,
    #[serde(rename = "operacion_exenta", skip_serializing_if = "Option::is_none")]
    pub exemption: Option<String>,
    #[serde(rename = "base_imponible")]
    pub base: String,
    #[serde(rename = "cuota_repercutida", skip_serializing_if = "Option::is_none")]
    pub vat_amount: Option<String>,
}

/// Denormalized issuance payload for the aggregator REST API.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RestInvoice {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub serie: Option<String>,
    pub numero: String,
    /// DD-MM-YYYY.
    pub fecha: String,
    /// AEAT invoice type code (F1, F2, R1, ...).
    pub tipo: String,
    pub descripcion: String,
    /// Recipient tax id, when the invoice identifies one.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub nif: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub nombre: Option<String>,
    pub lineas: Vec<RestVatLine>,
    pub importe_total: String,
}

impl RestInvoice {
    /// Build the payload from a finalized record.
    ///
    /// The series is split from the invoice number at the last `-`; numbers
    /// without a separator are sent without a series.
    pub fn from_record(record: &IssuanceRecord) -> Result<Self, VerifactuError> {
        if record.description.trim().is_empty() {
            return Err(VerifactuError::Serialization(
                "descripcion must not be empty".into(),
            ));
        }
        if record.lines.is_empty() {
            return Err(VerifactuError::Serialization(
                "payload needs at least one VAT line".into(),
            ));
        }

        let (serie, numero) = match record.invoice_number.rsplit_once('-') {
            Some((serie, numero)) => (Some(serie.to_string()), numero.to_string()),
            None => (None, record.invoice_number.clone()),
        };

        // Group subject lines by rate, exempt lines by code; BTreeMap keeps
        // the output order deterministic.
        let mut by_rate: BTreeMap<Decimal, (Decimal, Decimal)> = BTreeMap::new();
        let mut by_exemption: BTreeMap<&'static str, Decimal> = BTreeMap::new();
        for line in &record.lines {
            match &line.kind {
                VatKind::Subject {
                    rate, vat_amount, ..
                } => {
                    let entry = by_rate.entry(*rate).or_default();
                    entry.0 += line.base;
                    entry.1 += *vat_amount;
                }
                VatKind::Exempt(code) => {
                    *by_exemption.entry(code.code()).or_default() += line.base;
                }
            }
        }

        let mut lineas: Vec<RestVatLine> = by_rate
            .into_iter()
            .map(|(rate, (base, vat))| RestVatLine {
                rate: Some(format_amount_for_display(rate)),
                exemption: None,
                base: format_amount_for_display(base),
                vat_amount: Some(format_amount_for_display(vat)),
            })
            .collect();
        lineas.extend(by_exemption.into_iter().map(|(code, base)| RestVatLine {
            rate: None,
            exemption: Some(code.to_string()),
            base: format_amount_for_display(base),
            vat_amount: None,
        }));

        Ok(Self {
            serie,
            numero,
            fecha: format_date(record.issue_date),
            tipo: record.invoice_type.code().to_string(),
            descripcion: record.description.clone(),
            nif: record
                .recipient
                .as_ref()
                .and_then(|r| r.tax_id.clone()),
            nombre: record.recipient.as_ref().map(|r| r.name.clone()),
            lineas,
            importe_total: format_amount_for_display(record.total),
        })
    }
}

/// Cancellation payload for the aggregator REST API.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RestCancellation {
    /// Issuer tax id.
    pub nif: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub serie: Option<String>,
    pub numero: String,
    /// DD-MM-YYYY.
    pub fecha: String,
}

impl RestCancellation {
    pub fn from_record(record: &CancellationRecord) -> Self {
        let (serie, numero) = match record.invoice_number.rsplit_once('-') {
            Some((serie, numero)) => (Some(serie.to_string()), numero.to_string()),
            None => (None, record.invoice_number.clone()),
        };
        Self {
            nif: record.issuer.tax_id.clone(),
            serie,
            numero,
            fecha: format_date(record.issue_date),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::*;
    use chrono::{FixedOffset, NaiveDate, TimeZone};
    use rust_decimal_macros::dec;

    fn record() -> IssuanceRecord {
        let madrid = FixedOffset::east_opt(2 * 3600).unwrap();
        IssuanceRecordBuilder::new(
            Issuer::new("B12345674", "ACME Gestión SL"),
            "F2024-001",
            NaiveDate::from_ymd_opt(2024, 6, 15).unwrap(),
        )
        .description("Servicios junio")
        .recipient(Recipient::new("12345678Z", "Juan Pérez"))
        .add_line(VatLine::subject(dec!(100), dec!(21), dec!(21)))
        .add_line(VatLine::subject(dec!(50), dec!(21), dec!(10.50)))
        .add_line(VatLine::subject(dec!(200), dec!(10), dec!(20)))
        .add_line(VatLine::exempt(dec!(30), ExemptionCode::E1))
        .build(madrid.with_ymd_and_hms(2024, 6, 15, 10, 0, 0).unwrap())
        .unwrap()
    }

    #[test]
    fn lines_are_grouped_by_rate() {
        let payload = RestInvoice::from_record(&record()).unwrap();
        // 10% group, 21% group, one exempt group
        assert_eq!(payload.lineas.len(), 3);

        let line21 = payload
            .lineas
            .iter()
            .find(|l| l.rate.as_deref() == Some("21.00"))
            .unwrap();
        assert_eq!(line21.base, "150.00");
        assert_eq!(line21.vat_amount.as_deref(), Some("31.50"));

        let exempt = payload.lineas.iter().find(|l| l.exemption.is_some()).unwrap();
        assert_eq!(exempt.exemption.as_deref(), Some("E1"));
        assert_eq!(exempt.base, "30.00");
        assert!(exempt.vat_amount.is_none());
    }

    #[test]
    fn series_split_and_header_fields() {
        let payload = RestInvoice::from_record(&record()).unwrap();
        assert_eq!(payload.serie.as_deref(), Some("F2024"));
        assert_eq!(payload.numero, "001");
        assert_eq!(payload.fecha, "15-06-2024");
        assert_eq!(payload.tipo, "F1");
        assert_eq!(payload.nif.as_deref(), Some("12345678Z"));
        assert_eq!(payload.importe_total, "431.50");
    }

    #[test]
    fn serializes_with_spanish_keys() {
        let payload = RestInvoice::from_record(&record()).unwrap();
        let json = serde_json::to_value(&payload).unwrap();
        assert_eq!(json["importe_total"], "431.50");
        assert!(json["lineas"][0]["base_imponible"].is_string());
    }

    #[test]
    fn cancellation_payload_from_record() {
        let madrid = FixedOffset::east_opt(2 * 3600).unwrap();
        let cancelled = CancellationRecordBuilder::new(
            Issuer::new("B12345674", "ACME Gestión SL"),
            "F2024-001",
            NaiveDate::from_ymd_opt(2024, 6, 15).unwrap(),
        )
        .build(madrid.with_ymd_and_hms(2024, 6, 20, 9, 0, 0).unwrap())
        .unwrap();
        let payload = RestCancellation::from_record(&cancelled);
        assert_eq!(payload.nif, "B12345674");
        assert_eq!(payload.serie.as_deref(), Some("F2024"));
        assert_eq!(payload.fecha, "15-06-2024");
    }
}

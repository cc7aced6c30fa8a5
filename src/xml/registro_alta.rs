use crate::core::{
    IssuanceRecord, RectificationType, VatKind, VerifactuError, format_amount_for_display,
    format_date, format_timestamp,
};

use super::blocks::{write_encadenamiento, write_sistema_informatico};
use super::xml_utils::{XmlResult, XmlWriter};
use super::{ID_VERSION, SF_NAMESPACE, TIPO_HUELLA};

/// Generate the RegistroAlta XML document for an issuance record,
/// per the AEAT XSD `RegistroFacturacionAltaType`.
pub fn to_registro_alta_xml(record: &IssuanceRecord) -> XmlResult {
    // Fail before emitting anything — never produce a partial document.
    if record.hash.is_empty() {
        return Err(VerifactuError::Serialization(
            "record has no huella; build it via IssuanceRecordBuilder".into(),
        ));
    }
    if record.description.trim().is_empty() {
        return Err(VerifactuError::Serialization(
            "DescripcionOperacion must not be empty".into(),
        ));
    }
    if record.lines.is_empty() {
        return Err(VerifactuError::Serialization(
            "Desglose needs at least one line".into(),
        ));
    }

    let mut w = XmlWriter::new()?;
    w.start_element_with_attrs("sf:RegistroAlta", &[("xmlns:sf", SF_NAMESPACE)])?;
    w.text_element("sf:IDVersion", ID_VERSION)?;

    w.start_element("sf:IDFactura")?;
    w.text_element("sf:IDEmisorFactura", &record.issuer.tax_id)?;
    w.text_element("sf:NumSerieFactura", &record.invoice_number)?;
    w.text_element(
        "sf:FechaExpedicionFactura",
        &format_date(record.issue_date),
    )?;
    w.end_element("sf:IDFactura")?;

    w.text_element("sf:NombreRazonEmisor", &record.issuer.name)?;
    w.text_element("sf:TipoFactura", record.invoice_type.code())?;

    if let Some(rect) = &record.rectification {
        w.text_element("sf:TipoRectificativa", rect.kind.code())?;
        w.start_element("sf:FacturasRectificadas")?;
        for r in &rect.rectified {
            w.start_element("sf:IDFacturaRectificada")?;
            w.text_element("sf:NumSerieFactura", &r.invoice_number)?;
            w.text_element("sf:FechaExpedicionFactura", &format_date(r.issue_date))?;
            w.end_element("sf:IDFacturaRectificada")?;
        }
        w.end_element("sf:FacturasRectificadas")?;

        // Corrected amounts only apply to substitution-type rectifications
        if rect.kind == RectificationType::Substitution {
            if let Some(amounts) = &rect.corrected_amounts {
                w.start_element("sf:ImporteRectificacion")?;
                w.text_element(
                    "sf:BaseRectificada",
                    &format_amount_for_display(amounts.base),
                )?;
                w.text_element(
                    "sf:CuotaRectificada",
                    &format_amount_for_display(amounts.vat),
                )?;
                w.end_element("sf:ImporteRectificacion")?;
            }
        }
    }

    w.text_element("sf:DescripcionOperacion", &record.description)?;

    if let Some(recipient) = &record.recipient {
        w.start_element("sf:Destinatarios")?;
        w.start_element("sf:IDDestinatario")?;
        if let Some(tax_id) = &recipient.tax_id {
            w.text_element("sf:NIF", tax_id)?;
        }
        w.text_element("sf:NombreRazon", &recipient.name)?;
        w.end_element("sf:IDDestinatario")?;
        w.end_element("sf:Destinatarios")?;
    }

    w.start_element("sf:Desglose")?;
    for line in &record.lines {
        w.start_element("sf:DetalleDesglose")?;
        if let Some(tax) = line.tax {
            w.text_element("sf:Impuesto", tax.code())?;
        }
        w.text_element("sf:ClaveRegimen", &line.regime_key)?;
        match &line.kind {
            // Exemption code and rate/VAT tags are mutually exclusive per line
            VatKind::Exempt(code) => {
                w.text_element("sf:OperacionExenta", code.code())?;
                w.text_element(
                    "sf:BaseImponibleOimporteNoSujeto",
                    &format_amount_for_display(line.base),
                )?;
            }
            VatKind::Subject {
                qualification,
                rate,
                vat_amount,
                surcharge,
            } => {
                w.text_element("sf:CalificacionOperacion", qualification.code())?;
                w.text_element("sf:TipoImpositivo", &format_amount_for_display(*rate))?;
                w.text_element(
                    "sf:BaseImponibleOimporteNoSujeto",
                    &format_amount_for_display(line.base),
                )?;
                w.text_element(
                    "sf:CuotaRepercutida",
                    &format_amount_for_display(*vat_amount),
                )?;
                if let Some(s) = surcharge {
                    w.text_element(
                        "sf:TipoRecargoEquivalencia",
                        &format_amount_for_display(s.rate),
                    )?;
                    w.text_element(
                        "sf:CuotaRecargoEquivalencia",
                        &format_amount_for_display(s.amount),
                    )?;
                }
            }
        }
        w.end_element("sf:DetalleDesglose")?;
    }
    w.end_element("sf:Desglose")?;

    w.text_element("sf:CuotaTotal", &format_amount_for_display(record.vat_total))?;
    w.text_element("sf:ImporteTotal", &format_amount_for_display(record.total))?;

    write_encadenamiento(&mut w, &record.previous_hash, record.previous.as_ref())?;
    write_sistema_informatico(&mut w, &record.software)?;

    w.text_element(
        "sf:FechaHoraHusoGenRegistro",
        &format_timestamp(record.generated_at),
    )?;
    w.text_element("sf:TipoHuella", TIPO_HUELLA)?;
    w.text_element("sf:Huella", &record.hash)?;

    w.end_element("sf:RegistroAlta")?;
    w.into_string()
}

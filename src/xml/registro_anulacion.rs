use crate::core::{CancellationRecord, VerifactuError, format_date, format_timestamp};

use super::blocks::{write_encadenamiento, write_sistema_informatico};
use super::xml_utils::{XmlResult, XmlWriter};
use super::{ID_VERSION, SF_NAMESPACE, TIPO_HUELLA};

/// Generate the RegistroAnulacion XML document for a cancellation record,
/// per the AEAT XSD `RegistroFacturacionAnulacionType`.
///
/// The XSD uses different element names than issuance for the cancelled
/// invoice identity: `IDEmisorFacturaAnulada`, `NumSerieFacturaAnulada`,
/// `FechaExpedicionFacturaAnulada`.
pub fn to_registro_anulacion_xml(record: &CancellationRecord) -> XmlResult {
    if record.hash.is_empty() {
        return Err(VerifactuError::Serialization(
            "record has no huella; build it via CancellationRecordBuilder".into(),
        ));
    }

    let mut w = XmlWriter::new()?;
    w.start_element_with_attrs("sf:RegistroAnulacion", &[("xmlns:sf", SF_NAMESPACE)])?;
    w.text_element("sf:IDVersion", ID_VERSION)?;

    w.start_element("sf:IDFactura")?;
    w.text_element("sf:IDEmisorFacturaAnulada", &record.issuer.tax_id)?;
    w.text_element("sf:NumSerieFacturaAnulada", &record.invoice_number)?;
    w.text_element(
        "sf:FechaExpedicionFacturaAnulada",
        &format_date(record.issue_date),
    )?;
    w.end_element("sf:IDFactura")?;

    write_encadenamiento(&mut w, &record.previous_hash, record.previous.as_ref())?;
    write_sistema_informatico(&mut w, &record.software)?;

    w.text_element(
        "sf:FechaHoraHusoGenRegistro",
        &format_timestamp(record.generated_at),
    )?;
    w.text_element("sf:TipoHuella", TIPO_HUELLA)?;
    w.text_element("sf:Huella", &record.hash)?;

    w.end_element("sf:RegistroAnulacion")?;
    w.into_string()
}

//! XML blocks shared by issuance and cancellation records.

use crate::core::{PreviousRecordRef, SoftwareInfo, format_date};

use super::xml_utils::XmlWriter;
use crate::core::VerifactuError;

fn yes_no(v: bool) -> &'static str {
    if v { "S" } else { "N" }
}

/// Encadenamiento: first-record marker XOR previous-record reference.
///
/// When the previous reference is missing but a previous hash exists (e.g.
/// resuming from storage that only kept the huella), a hash-only
/// RegistroAnterior is emitted, which aggregators accept.
pub fn write_encadenamiento(
    w: &mut XmlWriter,
    previous_hash: &str,
    previous: Option<&PreviousRecordRef>,
) -> Result<(), VerifactuError> {
    w.start_element("sf:Encadenamiento")?;
    if previous_hash.is_empty() {
        w.text_element("sf:PrimerRegistro", "S")?;
    } else {
        w.start_element("sf:RegistroAnterior")?;
        match previous {
            Some(prev) => {
                w.text_element("sf:IDEmisorFactura", &prev.issuer_tax_id)?;
                w.text_element("sf:NumSerieFactura", &prev.invoice_number)?;
                w.text_element("sf:FechaExpedicionFactura", &format_date(prev.issue_date))?;
                w.text_element("sf:Huella", &prev.hash)?;
            }
            None => {
                w.text_element("sf:Huella", previous_hash)?;
            }
        }
        w.end_element("sf:RegistroAnterior")?;
    }
    w.end_element("sf:Encadenamiento")?;
    Ok(())
}

/// SistemaInformatico block (software identification, mandatory per record).
pub fn write_sistema_informatico(
    w: &mut XmlWriter,
    sw: &SoftwareInfo,
) -> Result<(), VerifactuError> {
    w.start_element("sf:SistemaInformatico")?;
    w.text_element("sf:NombreRazon", &sw.name)?;
    w.text_element("sf:NIF", &sw.nif)?;
    w.text_element("sf:NombreSistemaInformatico", &sw.system_name)?;
    w.text_element("sf:IdSistemaInformatico", &sw.system_id)?;
    w.text_element("sf:Version", &sw.version)?;
    w.text_element("sf:NumeroInstalacion", &sw.installation_number)?;
    w.text_element("sf:TipoUsoPosibleSoloVerifactu", yes_no(sw.verifactu_only))?;
    w.text_element("sf:TipoUsoPosibleMultiOT", yes_no(sw.multi_taxpayer))?;
    w.text_element(
        "sf:IndicadorMultiplesOT",
        yes_no(sw.multiple_taxpayers_active),
    )?;
    w.end_element("sf:SistemaInformatico")?;
    Ok(())
}

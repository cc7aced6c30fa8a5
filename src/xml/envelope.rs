use quick_xml::escape::escape;

use crate::core::VerifactuError;

use super::xml_utils::{XmlResult, strip_xml_decl};
use super::{SF_NAMESPACE, SFLR_NAMESPACE, SOAP_NAMESPACE};

/// Cabecera/ObligadoEmision: the submitter identity carried once per batch.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct EnvelopeHeader {
    pub tax_id: String,
    pub name: String,
}

impl EnvelopeHeader {
    pub fn new(tax_id: impl Into<String>, name: impl Into<String>) -> Self {
        Self {
            tax_id: tax_id.into(),
            name: name.into(),
        }
    }
}

/// Wrap already-built RegistroAlta/RegistroAnulacion documents in the SOAP
/// envelope for direct AEAT submission (RegFactuSistemaFacturacion).
///
/// Record ordering is preserved; embedded fragments have their XML
/// declaration stripped.
pub fn to_soap_envelope(records: &[String], header: &EnvelopeHeader) -> XmlResult {
    if records.is_empty() {
        return Err(VerifactuError::Serialization(
            "envelope needs at least one record".into(),
        ));
    }

    let registros = records
        .iter()
        .map(|r| {
            format!(
                "      <sfLR:RegistroFactura>\n        {}\n      </sfLR:RegistroFactura>",
                strip_xml_decl(r)
            )
        })
        .collect::<Vec<_>>()
        .join("\n");

    Ok(format!(
        r#"<?xml version="1.0" encoding="UTF-8"?>
<soapenv:Envelope xmlns:soapenv="{SOAP_NAMESPACE}" xmlns:sf="{SF_NAMESPACE}" xmlns:sfLR="{SFLR_NAMESPACE}">
  <soapenv:Header/>
  <soapenv:Body>
    <sfLR:RegFactuSistemaFacturacion>
      <sf:Cabecera>
        <sf:ObligadoEmision>
          <sf:NombreRazon>{}</sf:NombreRazon>
          <sf:NIF>{}</sf:NIF>
        </sf:ObligadoEmision>
      </sf:Cabecera>
{registros}
    </sfLR:RegFactuSistemaFacturacion>
  </soapenv:Body>
</soapenv:Envelope>"#,
        escape(header.name.as_str()),
        escape(header.tax_id.as_str()),
    ))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn envelope_preserves_order_and_escapes_header() {
        let records = vec![
            "<?xml version=\"1.0\" encoding=\"UTF-8\"?>\n<sf:RegistroAlta>A</sf:RegistroAlta>"
                .to_string(),
            "<sf:RegistroAnulacion>B</sf:RegistroAnulacion>".to_string(),
        ];
        let header = EnvelopeHeader::new("B12345674", "Tom & Jerry SL");
        let xml = to_soap_envelope(&records, &header).unwrap();

        let a = xml.find("<sf:RegistroAlta>").unwrap();
        let b = xml.find("<sf:RegistroAnulacion>").unwrap();
        assert!(a < b);
        assert!(xml.contains("Tom &amp; Jerry SL"));
        // The embedded fragment keeps only the envelope's declaration
        assert_eq!(xml.matches("<?xml").count(), 1);
    }

    #[test]
    fn empty_batch_is_an_error() {
        let header = EnvelopeHeader::new("B12345674", "ACME SL");
        assert!(to_soap_envelope(&[], &header).is_err());
    }
}

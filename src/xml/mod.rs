//! AEAT record XML generation (RegistroAlta / RegistroAnulacion) and the
//! SOAP submission envelope.
//!
//! Element and attribute names match the AEAT XSD verbatim, case included.
//! Amounts are always the 2-decimal display form and dates `DD-MM-YYYY`;
//! free text is entity-escaped by the writer over the raw values.
//!
//! # Example
//!
//! ```no_run
//! use verifactu::core::IssuanceRecord;
//! use verifactu::xml;
//!
//! let record: IssuanceRecord = todo!(); // build via IssuanceRecordBuilder
//! let alta_xml = xml::to_registro_alta_xml(&record).unwrap();
//! ```

mod blocks;
mod envelope;
mod registro_alta;
mod registro_anulacion;
pub(crate) mod xml_utils;

pub use envelope::{EnvelopeHeader, to_soap_envelope};
pub use registro_alta::to_registro_alta_xml;
pub use registro_anulacion::to_registro_anulacion_xml;

/// SuministroInformacion namespace (sf: prefix) per the AEAT XSD.
pub const SF_NAMESPACE: &str = "https://www2.agenciatributaria.gob.es/static_files/common/internet/dep/aplicaciones/es/aeat/tike/cont/ws/SuministroInformacion.xsd";

/// SuministroLR namespace (sfLR: prefix) per the AEAT WSDL.
pub const SFLR_NAMESPACE: &str = "https://www2.agenciatributaria.gob.es/static_files/common/internet/dep/aplicaciones/es/aeat/tike/cont/ws/SuministroLR.xsd";

/// SOAP 1.1 envelope namespace.
pub const SOAP_NAMESPACE: &str = "http://schemas.xmlsoap.org/soap/envelope/";

/// Record schema version (IDVersion).
pub const ID_VERSION: &str = "1.0";

/// Hash algorithm identifier (TipoHuella): 01 = SHA-256.
pub const TIPO_HUELLA: &str = "01";

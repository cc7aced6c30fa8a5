use quick_xml::Writer;
use quick_xml::events::{BytesDecl, BytesEnd, BytesStart, BytesText, Event};
use std::io::Cursor;

use crate::core::VerifactuError;

pub type XmlResult = Result<String, VerifactuError>;

fn xml_io(e: std::io::Error) -> VerifactuError {
    VerifactuError::Xml(format!("XML write error: {e}"))
}

pub struct XmlWriter {
    writer: Writer<Cursor<Vec<u8>>>,
}

impl XmlWriter {
    /// A writer for a standalone document, starting with the XML declaration.
    pub fn new() -> Result<Self, VerifactuError> {
        let mut writer = Writer::new_with_indent(Cursor::new(Vec::new()), b' ', 2);
        writer
            .write_event(Event::Decl(BytesDecl::new("1.0", Some("UTF-8"), None)))
            .map_err(xml_io)?;
        Ok(Self { writer })
    }

    pub fn into_string(self) -> Result<String, VerifactuError> {
        let buf = self.writer.into_inner().into_inner();
        String::from_utf8(buf).map_err(|e| VerifactuError::Xml(format!("XML UTF-8 error: {e}")))
    }

    pub fn start_element(&mut self, name: &str) -> Result<&mut Self, VerifactuError> {
        let elem = BytesStart::new(name);
        self.writer
            .write_event(Event::Start(elem))
            .map_err(xml_io)?;
        Ok(self)
    }

    pub fn start_element_with_attrs(
        &mut self,
        name: &str,
        attrs: &[(&str, &str)],
    ) -> Result<&mut Self, VerifactuError> {
        let mut elem = BytesStart::new(name);
        for (k, v) in attrs {
            elem.push_attribute((*k, *v));
        }
        self.writer
            .write_event(Event::Start(elem))
            .map_err(xml_io)?;
        Ok(self)
    }

    pub fn end_element(&mut self, name: &str) -> Result<&mut Self, VerifactuError> {
        self.writer
            .write_event(Event::End(BytesEnd::new(name)))
            .map_err(xml_io)?;
        Ok(self)
    }

    /// Write `<name>text</name>`. Text is entity-escaped by quick-xml over
    /// the raw value.
    pub fn text_element(&mut self, name: &str, text: &str) -> Result<&mut Self, VerifactuError> {
        self.start_element(name)?;
        self.writer
            .write_event(Event::Text(BytesText::new(text)))
            .map_err(xml_io)?;
        self.end_element(name)
    }
}

/// Drop a leading `<?xml ...?>` declaration from a pre-built document so it
/// can be embedded as a fragment.
pub fn strip_xml_decl(doc: &str) -> &str {
    let trimmed = doc.trim_start();
    if let Some(rest) = trimmed.strip_prefix("<?xml") {
        if let Some(end) = rest.find("?>") {
            return rest[end + 2..].trim_start();
        }
    }
    trimmed
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn text_is_escaped() {
        let mut w = XmlWriter::new().unwrap();
        w.text_element("sf:DescripcionOperacion", "Tom & Jerry <SL> \"cita\" 'x'")
            .unwrap();
        let xml = w.into_string().unwrap();
        assert!(xml.contains("Tom &amp; Jerry &lt;SL&gt;"));
        assert!(!xml.contains("<SL>"));
    }

    #[test]
    fn strip_decl_variants() {
        assert_eq!(
            strip_xml_decl("<?xml version=\"1.0\" encoding=\"UTF-8\"?>\n<a/>"),
            "<a/>"
        );
        assert_eq!(strip_xml_decl("<a/>"), "<a/>");
    }
}

//! SOAP request envelopes.
//!
//! Envelopes are written without indentation and with properties in a fixed
//! order, so identical requests produce identical bytes (the response cache
//! keys on them).

use quick_xml::events::{BytesDecl, BytesEnd, BytesStart, BytesText, Event};
use quick_xml::Writer;

use crate::config::{property, ConnectionConfig};
use crate::error::{XmlaError, XmlaResult};

const SOAP_ENV_NS: &str = "http://schemas.xmlsoap.org/soap/envelope/";
const SOAP_ENCODING: &str = "http://schemas.xmlsoap.org/soap/encoding/";
const XMLA_NS: &str = "urn:schemas-microsoft-com:xml-analysis";

/// Shape of the result requested from the server.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub enum ResponseFormat {
    /// Flat rowset: columns and rows.
    Tabular,
    /// Multidimensional dataset: axes, positions and cells.
    Multidimensional,
}

impl ResponseFormat {
    /// Value of the `Format` property.
    pub fn as_str(&self) -> &'static str {
        match self {
            ResponseFormat::Tabular => "Tabular",
            ResponseFormat::Multidimensional => "Multidimensional",
        }
    }
}

/// Builds an `Execute` envelope carrying `statement`.
pub fn execute_envelope(
    statement: &str,
    config: &ConnectionConfig,
    format: ResponseFormat,
) -> XmlaResult<Vec<u8>> {
    let mut w = EnvelopeWriter::new()?;
    w.start("Execute", Some(XMLA_NS))?;
    w.start("Command", None)?;
    w.text_element("Statement", statement)?;
    w.end("Command")?;
    w.properties(config, format)?;
    w.end("Execute")?;
    w.finish()
}

/// Builds a `Discover` envelope for `request_type` with the given
/// restrictions.
pub fn discover_envelope(
    request_type: &str,
    restrictions: &[(String, String)],
    config: &ConnectionConfig,
) -> XmlaResult<Vec<u8>> {
    check_name(request_type)?;
    let mut w = EnvelopeWriter::new()?;
    w.start("Discover", Some(XMLA_NS))?;
    w.text_element("RequestType", request_type)?;
    w.start("Restrictions", None)?;
    w.start("RestrictionList", None)?;
    for (name, value) in restrictions {
        check_name(name)?;
        w.text_element(name, value)?;
    }
    w.end("RestrictionList")?;
    w.end("Restrictions")?;
    w.properties(config, ResponseFormat::Tabular)?;
    w.end("Discover")?;
    w.finish()
}

/// Element names are spliced into the document, so only plain names pass.
fn check_name(name: &str) -> XmlaResult<()> {
    let mut chars = name.chars();
    let valid = match chars.next() {
        Some(first) => {
            (first.is_ascii_alphabetic() || first == '_')
                && chars.all(|c| c.is_ascii_alphanumeric() || c == '_')
        }
        None => false,
    };
    if valid {
        Ok(())
    } else {
        Err(XmlaError::InvalidRequest(format!(
            "'{}' is not a valid element name",
            name
        )))
    }
}

struct EnvelopeWriter {
    writer: Writer<Vec<u8>>,
}

impl EnvelopeWriter {
    fn new() -> XmlaResult<Self> {
        let mut w = Self {
            writer: Writer::new(Vec::new()),
        };
        w.event(Event::Decl(BytesDecl::new("1.0", Some("UTF-8"), None)))?;
        w.event(Event::Start(BytesStart::new("SOAP-ENV:Envelope").with_attributes([
            ("xmlns:SOAP-ENV", SOAP_ENV_NS),
            ("SOAP-ENV:encodingStyle", SOAP_ENCODING),
        ])))?;
        w.event(Event::Start(BytesStart::new("SOAP-ENV:Body")))?;
        Ok(w)
    }

    fn event(&mut self, event: Event<'_>) -> XmlaResult<()> {
        self.writer
            .write_event(event)
            .map_err(|e| XmlaError::InvalidRequest(e.to_string()))
    }

    fn start(&mut self, name: &str, namespace: Option<&str>) -> XmlaResult<()> {
        let mut start = BytesStart::new(name);
        if let Some(ns) = namespace {
            start.push_attribute(("xmlns", ns));
        }
        self.event(Event::Start(start))
    }

    fn end(&mut self, name: &str) -> XmlaResult<()> {
        self.event(Event::End(BytesEnd::new(name)))
    }

    fn text_element(&mut self, name: &str, text: &str) -> XmlaResult<()> {
        self.start(name, None)?;
        self.event(Event::Text(BytesText::new(text)))?;
        self.end(name)
    }

    fn properties(&mut self, config: &ConnectionConfig, format: ResponseFormat) -> XmlaResult<()> {
        self.start("Properties", None)?;
        self.start("PropertyList", None)?;
        if let Some(dsi) = &config.data_source_info {
            self.text_element(property::DATA_SOURCE_INFO, dsi)?;
        }
        if let Some(catalog) = &config.catalog {
            self.text_element(property::CATALOG, catalog)?;
        }
        if let Some(role) = &config.role {
            self.text_element(property::ROLES, role)?;
        }
        if let Some(locale) = config.locale {
            self.text_element(property::LOCALE_IDENTIFIER, &locale.to_string())?;
        }
        self.text_element("Format", format.as_str())?;
        self.text_element("Content", "SchemaData")?;
        if format == ResponseFormat::Multidimensional {
            self.text_element("AxisFormat", "TupleFormat")?;
        }
        self.end("PropertyList")?;
        self.end("Properties")
    }

    fn finish(mut self) -> XmlaResult<Vec<u8>> {
        self.end("SOAP-ENV:Body")?;
        self.end("SOAP-ENV:Envelope")?;
        Ok(self.writer.into_inner())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn config() -> ConnectionConfig {
        ConnectionConfig::builder()
            .with_url("http://olap/xmla")
            .with_data_source_info("Provider=Mondrian")
            .with_catalog("FoodMart")
            .build()
    }

    fn text(bytes: Vec<u8>) -> String {
        String::from_utf8(bytes).unwrap()
    }

    #[test]
    fn test_execute_envelope_shape() {
        let xml = text(
            execute_envelope("SELECT FROM [Sales]", &config(), ResponseFormat::Multidimensional)
                .unwrap(),
        );
        assert!(xml.starts_with("<?xml version=\"1.0\" encoding=\"UTF-8\"?>"));
        assert!(xml.contains("<SOAP-ENV:Envelope xmlns:SOAP-ENV=\"http://schemas.xmlsoap.org/soap/envelope/\""));
        assert!(xml.contains("<Execute xmlns=\"urn:schemas-microsoft-com:xml-analysis\">"));
        assert!(xml.contains("<Statement>SELECT FROM [Sales]</Statement>"));
        assert!(xml.contains("<Catalog>FoodMart</Catalog>"));
        assert!(xml.contains("<DataSourceInfo>Provider=Mondrian</DataSourceInfo>"));
        assert!(xml.contains("<Format>Multidimensional</Format>"));
        assert!(xml.contains("<AxisFormat>TupleFormat</AxisFormat>"));
        assert!(xml.ends_with("</SOAP-ENV:Body></SOAP-ENV:Envelope>"));
    }

    #[test]
    fn test_tabular_has_no_axis_format() {
        let xml = text(execute_envelope("x", &config(), ResponseFormat::Tabular).unwrap());
        assert!(xml.contains("<Format>Tabular</Format>"));
        assert!(!xml.contains("AxisFormat"));
    }

    #[test]
    fn test_statement_is_escaped() {
        let xml = text(
            execute_envelope("WITH MEMBER x AS 1 < 2 & 3", &config(), ResponseFormat::Tabular)
                .unwrap(),
        );
        assert!(xml.contains("1 &lt; 2 &amp; 3"));
    }

    #[test]
    fn test_unset_properties_are_omitted() {
        let xml = text(
            execute_envelope("x", &ConnectionConfig::default(), ResponseFormat::Tabular).unwrap(),
        );
        assert!(!xml.contains("<Catalog>"));
        assert!(!xml.contains("<Roles>"));
        assert!(!xml.contains("<LocaleIdentifier>"));
    }

    #[test]
    fn test_envelope_is_deterministic() {
        let a = execute_envelope("q", &config(), ResponseFormat::Multidimensional).unwrap();
        let b = execute_envelope("q", &config(), ResponseFormat::Multidimensional).unwrap();
        assert_eq!(a, b);
    }

    #[test]
    fn test_discover_envelope() {
        let restrictions = vec![("CATALOG_NAME".to_string(), "FoodMart".to_string())];
        let xml = text(discover_envelope("MDSCHEMA_CUBES", &restrictions, &config()).unwrap());
        assert!(xml.contains("<RequestType>MDSCHEMA_CUBES</RequestType>"));
        assert!(xml.contains(
            "<Restrictions><RestrictionList><CATALOG_NAME>FoodMart</CATALOG_NAME></RestrictionList></Restrictions>"
        ));
        assert!(xml.contains("<Format>Tabular</Format>"));
    }

    #[test]
    fn test_discover_rejects_bad_names() {
        let err = discover_envelope("DISCOVER<x>", &[], &config()).unwrap_err();
        assert!(matches!(err, XmlaError::InvalidRequest(_)));

        let restrictions = vec![("bad name".to_string(), "v".to_string())];
        let err = discover_envelope("MDSCHEMA_CUBES", &restrictions, &config()).unwrap_err();
        assert!(matches!(err, XmlaError::InvalidRequest(_)));
    }
}

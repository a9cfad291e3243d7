//! Response envelope decoding: faults and the `root` payload.

use crate::error::{XmlaError, XmlaResult};
use crate::xml::{parse_document, Element};

/// Parses a response envelope and returns its `root` element.
///
/// A SOAP `Fault` or an XMLA `Messages/Error` anywhere in the body becomes
/// [`XmlaError::ProtocolFault`].
pub(crate) fn parse_envelope(bytes: &[u8]) -> XmlaResult<Element> {
    let doc = parse_document(bytes)?;
    if let Some(fault) = doc.descendant("Fault") {
        return Err(soap_fault(fault));
    }
    if let Some(error) = doc.descendant("Messages").and_then(|m| m.child("Error")) {
        return Err(XmlaError::ProtocolFault {
            code: error.attr("ErrorCode").map(str::to_string),
            message: error
                .attr("Description")
                .unwrap_or("unknown server error")
                .to_string(),
            detail: error.attr("Source").map(str::to_string),
        });
    }
    find_root(doc)
}

fn soap_fault(fault: &Element) -> XmlaError {
    let code = fault
        .child_text("faultcode")
        .map(|c| c.trim().to_string())
        .filter(|c| !c.is_empty());
    let detail_error = fault.child("detail").and_then(|d| d.descendant("Error"));
    let message = fault
        .child_text("faultstring")
        .map(|s| s.trim().to_string())
        .filter(|s| !s.is_empty())
        .or_else(|| {
            detail_error
                .and_then(|e| e.attr("Description"))
                .map(str::to_string)
        })
        .unwrap_or_else(|| "unknown server fault".to_string());
    let detail = fault
        .child("detail")
        .map(|d| match d.descendant("Error").and_then(|e| e.attr("Description")) {
            Some(description) => description.to_string(),
            None => d.text_content(),
        })
        .filter(|d| !d.is_empty());
    XmlaError::ProtocolFault {
        code,
        message,
        detail,
    }
}

/// Takes the owned `root` element out of the document.
fn find_root(doc: Element) -> XmlaResult<Element> {
    let mut pending = vec![doc];
    while let Some(element) = pending.pop() {
        if element.name == "root" {
            return Ok(element);
        }
        pending.extend(element.children.into_iter().rev());
    }
    Err(XmlaError::InvalidResponse(
        "response has no root element".to_string(),
    ))
}

/// Decodes XML-encoded names such as `_x005B_Measures_x005D_`.
pub(crate) fn decode_xml_name(name: &str) -> String {
    let mut out = String::with_capacity(name.len());
    let mut rest = name;
    while let Some(start) = rest.find("_x") {
        out.push_str(&rest[..start]);
        let candidate = &rest[start..];
        let decoded = candidate
            .get(2..6)
            .filter(|_| candidate.as_bytes().get(6) == Some(&b'_'))
            .and_then(|hex| u32::from_str_radix(hex, 16).ok())
            .and_then(char::from_u32);
        match decoded {
            Some(ch) => {
                out.push(ch);
                rest = &candidate[7..];
            }
            None => {
                out.push_str("_x");
                rest = &candidate[2..];
            }
        }
    }
    out.push_str(rest);
    out
}

#[cfg(test)]
mod tests {
    use super::*;

    const SOAP_FAULT: &str = r#"<?xml version="1.0"?>
<SOAP-ENV:Envelope xmlns:SOAP-ENV="http://schemas.xmlsoap.org/soap/envelope/">
  <SOAP-ENV:Body>
    <SOAP-ENV:Fault>
      <faultcode>SOAP-ENV:Server.00HSBE02</faultcode>
      <faultstring>XMLA MDX parse failed</faultstring>
      <faultactor>Mondrian</faultactor>
      <detail>
        <XA:error xmlns:XA="http://mondrian.sourceforge.net">
          <code>00HSBE02</code>
          <desc>Syntax error at line 1, column 8</desc>
        </XA:error>
      </detail>
    </SOAP-ENV:Fault>
  </SOAP-ENV:Body>
</SOAP-ENV:Envelope>"#;

    #[test]
    fn test_soap_fault() {
        match parse_envelope(SOAP_FAULT.as_bytes()).unwrap_err() {
            XmlaError::ProtocolFault {
                code,
                message,
                detail,
            } => {
                assert_eq!(code.as_deref(), Some("SOAP-ENV:Server.00HSBE02"));
                assert_eq!(message, "XMLA MDX parse failed");
                assert_eq!(
                    detail.as_deref(),
                    Some("00HSBE02 Syntax error at line 1, column 8")
                );
            }
            other => panic!("unexpected: {other:?}"),
        }
    }

    #[test]
    fn test_messages_error() {
        let xml = br#"<Envelope><Body><ExecuteResponse><return><root>
            <Messages><Error ErrorCode="3238658121" Description="Cube not found" Source="Engine"/></Messages>
        </root></return></ExecuteResponse></Body></Envelope>"#;
        match parse_envelope(xml).unwrap_err() {
            XmlaError::ProtocolFault { code, message, .. } => {
                assert_eq!(code.as_deref(), Some("3238658121"));
                assert_eq!(message, "Cube not found");
            }
            other => panic!("unexpected: {other:?}"),
        }
    }

    #[test]
    fn test_root_is_returned() {
        let xml = br#"<Envelope><Body><ExecuteResponse><return><root><row/></root></return></ExecuteResponse></Body></Envelope>"#;
        let root = parse_envelope(xml).unwrap();
        assert_eq!(root.name, "root");
        assert_eq!(root.children.len(), 1);
    }

    #[test]
    fn test_missing_root() {
        let err = parse_envelope(b"<Envelope><Body/></Envelope>").unwrap_err();
        assert!(matches!(err, XmlaError::InvalidResponse(_)));
    }

    #[test]
    fn test_decode_xml_name() {
        assert_eq!(decode_xml_name("_x005B_Measures_x005D_"), "[Measures]");
        assert_eq!(decode_xml_name("CATALOG_NAME"), "CATALOG_NAME");
        assert_eq!(decode_xml_name("a_x0020_b"), "a b");
        assert_eq!(decode_xml_name("_xZZZZ_"), "_xZZZZ_");
        assert_eq!(decode_xml_name("tail_x00"), "tail_x00");
    }
}

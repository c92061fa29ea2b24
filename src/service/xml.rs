// rsdeploy/src/service/xml.rs
use quick_xml::Reader;
use quick_xml::escape::escape;
use quick_xml::events::{BytesStart, Event};

use crate::errors::{AppError, Result};

/// Target namespace of ReportService2010.
pub const REPORT_SERVER_NS: &str =
    "http://schemas.microsoft.com/sqlserver/reporting/2010/03/01/ReportServer";

const SOAP_ENVELOPE_NS: &str = "http://schemas.xmlsoap.org/soap/envelope/";

/// Wraps an operation body in a SOAP 1.1 envelope.
pub fn envelope(operation: &str, body: &str) -> String {
    format!(
        concat!(
            r#"<?xml version="1.0" encoding="utf-8"?>"#,
            r#"<soap:Envelope xmlns:soap="{soap}" xmlns:xsi="http://www.w3.org/2001/XMLSchema-instance">"#,
            r#"<soap:Body><{op} xmlns="{ns}">{body}</{op}></soap:Body></soap:Envelope>"#
        ),
        soap = SOAP_ENVELOPE_NS,
        ns = REPORT_SERVER_NS,
        op = operation,
        body = body,
    )
}

/// `<name>text</name>` with the text escaped.
pub fn text_element(name: &str, text: &str) -> String {
    format!("<{0}>{1}</{0}>", name, escape(text))
}

/// A parsed XML element with namespace prefixes stripped.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Element {
    pub name: String,
    pub text: String,
    pub nil: bool,
    pub children: Vec<Element>,
}

impl Element {
    pub fn child(&self, name: &str) -> Option<&Element> {
        self.children.iter().find(|c| c.name == name)
    }

    pub fn children_named<'a>(&'a self, name: &'a str) -> impl Iterator<Item = &'a Element> + 'a {
        self.children.iter().filter(move |c| c.name == name)
    }

    /// Text of the named child, if the child is present and not nil.
    pub fn child_text(&self, name: &str) -> Option<&str> {
        self.child(name)
            .filter(|c| !c.nil)
            .map(|c| c.text.as_str())
    }
}

fn local_name(start: &BytesStart) -> String {
    String::from_utf8_lossy(start.local_name().as_ref()).into_owned()
}

fn start_element(start: &BytesStart) -> Element {
    let nil = start.attributes().flatten().any(|attr| {
        attr.key.local_name().as_ref() == b"nil" && attr.value.as_ref() == b"true"
    });
    Element {
        name: local_name(start),
        nil,
        ..Element::default()
    }
}

/// Parses a document into its root element.
pub fn parse(xml: &str) -> Result<Element> {
    let mut reader = Reader::from_str(xml);
    reader.trim_text(true);

    let mut stack: Vec<Element> = Vec::new();
    let mut root: Option<Element> = None;

    loop {
        match reader.read_event()? {
            Event::Start(start) => stack.push(start_element(&start)),
            Event::Empty(start) => {
                let element = start_element(&start);
                match stack.last_mut() {
                    Some(parent) => parent.children.push(element),
                    None => root = Some(element),
                }
            }
            Event::Text(text) => {
                if let Some(current) = stack.last_mut() {
                    current.text.push_str(&text.unescape()?);
                }
            }
            Event::CData(data) => {
                if let Some(current) = stack.last_mut() {
                    current.text.push_str(&String::from_utf8_lossy(&data.into_inner()));
                }
            }
            Event::End(_) => {
                let element = stack.pop().ok_or_else(|| AppError::MalformedResponse {
                    operation: "document".to_string(),
                    reason: "unbalanced closing tag".to_string(),
                })?;
                match stack.last_mut() {
                    Some(parent) => parent.children.push(element),
                    None => root = Some(element),
                }
            }
            Event::Eof => break,
            _ => {}
        }
    }

    root.ok_or_else(|| AppError::MalformedResponse {
        operation: "document".to_string(),
        reason: "no root element".to_string(),
    })
}

/// Extracts `<operation>Response` from a SOAP envelope, turning a SOAP fault
/// into [`AppError::SoapFault`].
pub fn response_body(operation: &str, xml: &str) -> Result<Element> {
    let malformed = |reason: &str| AppError::MalformedResponse {
        operation: operation.to_string(),
        reason: reason.to_string(),
    };

    let envelope = parse(xml)?;
    if envelope.name != "Envelope" {
        return Err(malformed("missing SOAP envelope"));
    }
    let body = envelope
        .child("Body")
        .ok_or_else(|| malformed("missing SOAP body"))?;

    if let Some(fault) = body.child("Fault") {
        return Err(fault_error(operation, fault));
    }

    let response_name = format!("{}Response", operation);
    body.child(&response_name)
        .cloned()
        .ok_or_else(|| malformed(&format!("missing {} element", response_name)))
}

fn fault_error(operation: &str, fault: &Element) -> AppError {
    let message = fault
        .child_text("faultstring")
        .map(str::trim)
        .filter(|m| !m.is_empty())
        .unwrap_or("unknown SOAP fault")
        .to_string();
    let code = fault
        .child("detail")
        .and_then(|detail| detail.child_text("ErrorCode"))
        .map(|c| c.trim().to_string())
        .or_else(|| fault.child_text("faultcode").map(|c| c.trim().to_string()));

    AppError::SoapFault {
        operation: operation.to_string(),
        code,
        message,
    }
}

use derive_more::{Constructor, Display, From};

use quick_xml::events::BytesEnd;
use quick_xml::events::BytesStart;
use quick_xml::events::Event;
use quick_xml::name::QName;

use std::fmt;

/// top level parsing error, split by the stage of the document the reader
/// was working through when it failed
#[derive(Debug, thiserror::Error, From)]
pub enum ParseError {
    #[error("error reading the VTKFile document header: {0}")]
    Header(Header),
    #[error("error reading the UnstructuredGrid or Piece header: {0}")]
    GridHeader(GridHeader),
    #[error("error reading a PointData array: {0}")]
    PointData(PointData),
    #[error("error reading through the grid structure: {0}")]
    CloseElements(CloseElements),
    #[error("error reading the AppendedData section: {0}")]
    AppendedData(AppendedData),
}

#[derive(Debug, thiserror::Error, From)]
pub enum Header {
    #[error("{0}")]
    MalformedXml(MalformedXml),
    #[error("{0}")]
    MalformedAttribute(MalformedAttribute),
    #[error("{0}")]
    UnexpectedElement(UnexpectedElement),
    #[error("{0}")]
    UnexpectedAttributeValue(UnexpectedAttributeValue),
}

#[derive(Debug, thiserror::Error, From)]
pub enum GridHeader {
    #[error("{0}")]
    MalformedXml(MalformedXml),
    #[error("{0}")]
    MalformedAttribute(MalformedAttribute),
    #[error("{0}")]
    MissingAttribute(MissingAttribute),
    #[error("{0}")]
    UnexpectedElement(UnexpectedElement),
    #[error("{0}")]
    InvalidAttributeValue(InvalidAttributeValue),
}

#[derive(Debug, thiserror::Error, From)]
pub enum PointData {
    #[error("{0}")]
    MalformedXml(MalformedXml),
    #[error("{0}")]
    MalformedAttribute(MalformedAttribute),
    #[error("{0}")]
    MissingAttribute(MissingAttribute),
    #[error("{0}")]
    UnexpectedElement(UnexpectedElement),
    #[error("{0}")]
    UnexpectedAttributeValue(UnexpectedAttributeValue),
    #[error("{0}")]
    InvalidAttributeValue(InvalidAttributeValue),
    #[error("{0}")]
    InlineAsciiArray(InlineAsciiArray),
    #[error("{0}")]
    InvalidBase64(InvalidBase64),
    #[error("{0}")]
    TruncatedArray(TruncatedArray),
}

#[derive(Debug, thiserror::Error, From)]
pub enum CloseElements {
    #[error("{0}")]
    MalformedXml(MalformedXml),
    #[error("{0}")]
    UnexpectedElement(UnexpectedElement),
}

#[derive(Debug, thiserror::Error, From)]
pub enum AppendedData {
    #[error("{0}")]
    MalformedXml(MalformedXml),
    #[error("{0}")]
    MalformedAttribute(MalformedAttribute),
    #[error("{0}")]
    MissingAttribute(MissingAttribute),
    #[error("{0}")]
    UnexpectedElement(UnexpectedElement),
    #[error("{0}")]
    UnexpectedAttributeValue(UnexpectedAttributeValue),
    #[error("io error while reading appended binary data: {0}")]
    Io(std::io::Error),
    #[error("{0}")]
    InconsistentOffsets(InconsistentOffsets),
}

#[derive(From, Display, Debug)]
#[display(fmt = "failed to parse an xml element: {xml_err}")]
pub struct MalformedXml {
    xml_err: quick_xml::Error,
}

#[derive(From, Display, Debug)]
#[display(fmt = "failed to parse an xml attribute: {att_err}")]
pub struct MalformedAttribute {
    att_err: quick_xml::events::attributes::AttrError,
}

#[derive(Display, Debug)]
#[display(fmt = "unexpected element. Expected `{expected_name}`, got {actual_element}")]
pub struct UnexpectedElement {
    expected_name: String,
    actual_element: EventSummary,
}

impl UnexpectedElement {
    pub(crate) fn new<T: Into<String>>(expected_name: T, actual_element: EventSummary) -> Self {
        Self {
            expected_name: expected_name.into(),
            actual_element,
        }
    }
}

#[derive(From, Display, Debug, Constructor)]
#[display(
    fmt = "unexpected attribute value for {attribute_name} in {element_name} element: expected {expected_value}, got {actual_value}"
)]
pub struct UnexpectedAttributeValue {
    pub(crate) element_name: String,
    pub(crate) attribute_name: String,
    pub(crate) expected_value: String,
    pub(crate) actual_value: ParsedNameOrBytes,
}

#[derive(From, Display, Debug, Constructor)]
#[display(fmt = "missing attribute `{attribute_name}` in {element_name} element")]
pub struct MissingAttribute {
    element_name: String,
    attribute_name: String,
}

#[derive(From, Display, Debug, Constructor)]
#[display(
    fmt = "attribute `{attribute_name}` in {element_name} element has an unusable value: {actual_value}"
)]
pub struct InvalidAttributeValue {
    element_name: String,
    attribute_name: String,
    actual_value: ParsedNameOrBytes,
}

#[derive(From, Display, Debug, Constructor)]
#[display(fmt = "Failed to parse inline ascii array `{array_name}` in DataArray element")]
pub struct InlineAsciiArray {
    array_name: String,
}

#[derive(From, Display, Debug, Constructor)]
#[display(fmt = "Failed to decode base64 data for array `{array_name}` in DataArray element")]
pub struct InvalidBase64 {
    array_name: String,
}

#[derive(Display, Debug, Constructor)]
#[display(
    fmt = "point data array `{array_name}` contains {actual} values but {expected} were declared"
)]
pub struct TruncatedArray {
    array_name: String,
    expected: usize,
    actual: usize,
}

#[derive(Display, Debug, Constructor)]
#[display(
    fmt = "appended data block for array `{array_name}` declares {declared} bytes but the next block starts {available} bytes later"
)]
pub struct InconsistentOffsets {
    array_name: String,
    declared: usize,
    available: i64,
}

/// either a UTF8 name or the raw bytes of something that failed to convert
#[derive(From, Display, Debug)]
pub enum ParsedNameOrBytes {
    #[display(fmt = "{_0}")]
    Utf8(String),
    #[display(fmt = "{_0:?} (cannot convert to UTF8 string)")]
    Bytes(Vec<u8>),
}

impl ParsedNameOrBytes {
    pub(crate) fn new(bytes: &[u8]) -> Self {
        let vec = Vec::from(bytes);
        match String::from_utf8(vec) {
            Ok(string) => Self::Utf8(string),
            Err(e) => Self::Bytes(e.into_bytes()),
        }
    }
}

impl<'a> From<QName<'a>> for ParsedNameOrBytes {
    fn from(x: QName) -> Self {
        Self::new(x.as_ref())
    }
}

impl<'a> From<std::borrow::Cow<'a, [u8]>> for ParsedNameOrBytes {
    fn from(x: std::borrow::Cow<'a, [u8]>) -> Self {
        Self::new(x.as_ref())
    }
}

impl<'a> From<&'a str> for ParsedNameOrBytes {
    fn from(x: &str) -> Self {
        Self::Utf8(x.into())
    }
}

/// name and kind of an xml event, for "expected X, got Y" error messages
#[derive(Debug)]
pub(crate) struct EventSummary {
    name: Option<ParsedNameOrBytes>,
    e_type: &'static str,
}

impl fmt::Display for EventSummary {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match &self.name {
            Some(name) => write!(f, "element {name} with type {}", self.e_type),
            None => write!(f, "unnamed element with type {}", self.e_type),
        }
    }
}

impl EventSummary {
    pub(crate) fn new(event: &Event) -> Self {
        let name = match event {
            Event::Start(s) => Some(ParsedNameOrBytes::from(s.name())),
            Event::End(e) => Some(ParsedNameOrBytes::from(e.name())),
            Event::Empty(s) => Some(ParsedNameOrBytes::from(s.name())),
            _ => None,
        };

        Self {
            name,
            e_type: event_type(event),
        }
    }

    pub(crate) fn eof() -> Self {
        Self {
            name: None,
            e_type: "eof",
        }
    }

    pub(crate) fn start(bytes: &BytesStart<'_>) -> Self {
        Self {
            name: Some(ParsedNameOrBytes::from(bytes.name())),
            e_type: "start",
        }
    }

    pub(crate) fn end(bytes: &BytesEnd<'_>) -> Self {
        Self {
            name: Some(ParsedNameOrBytes::from(bytes.name())),
            e_type: "end",
        }
    }
}

fn event_type(event: &Event) -> &'static str {
    match event {
        Event::Start(_) => "start",
        Event::End(_) => "end",
        Event::Empty(_) => "empty",
        Event::Text(_) => "text",
        Event::Comment(_) => "comment",
        Event::CData(_) => "cdata",
        Event::Decl(_) => "decl",
        Event::PI(_) => "pi",
        Event::DocType(_) => "doctype",
        Event::Eof => "eof",
    }
}

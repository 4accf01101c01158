//! reading and parsing xml VTU (`UnstructuredGrid`) documents
//!
//! [`read_grid`] opens and parses a file; [`parse_xml_document`] does the
//! same for any buffered reader. The parser walks the document in one
//! forward pass: it validates the `VTKFile` header, reads the first
//! `<Piece>`'s point count, parses every array under `<PointData>` (ascii,
//! base64, and appended-raw encodings), skips the geometry and cell
//! sections wholesale, and finally drains the `<AppendedData>` section into
//! the arrays that deferred to it.
//!
//! `ComponentName<i>` attributes are not collected here; they are read by
//! an independent pass over the raw document, see
//! [`scan_component_names`].

mod component_names;
mod error;

pub use component_names::{scan_component_names, ComponentNames};
pub use error::ParseError;

use error::EventSummary;

use crate::grid::{PointArray, UnstructuredGrid};

use std::io::BufRead;

use quick_xml::events::attributes::Attribute;
use quick_xml::events::BytesStart;
use quick_xml::events::Event;
use quick_xml::name::QName;
use quick_xml::reader::Reader;

/// read and parse an entire vtu file at the given path
pub fn read_grid(path: &std::path::Path) -> Result<UnstructuredGrid, crate::Error> {
    let file = std::fs::File::open(path)?;
    let buf_reader = std::io::BufReader::new(file);
    let reader = Reader::from_reader(buf_reader);

    Ok(parse_xml_document(reader)?)
}

/// parse a whole vtu document from an already-opened reader
pub fn parse_xml_document<R: BufRead>(
    mut reader: Reader<R>,
) -> Result<UnstructuredGrid, ParseError> {
    let mut buffer = Vec::new();

    // ignore whitespace in the reader
    reader.trim_text(true);

    read_file_header(&mut reader, &mut buffer).map_err(ParseError::from)?;
    read_grid_header(&mut reader, &mut buffer).map_err(ParseError::from)?;
    let num_points = read_piece_header(&mut reader, &mut buffer).map_err(ParseError::from)?;

    let mut partials = Vec::new();
    loop {
        match next_piece_child(&mut reader, &mut buffer).map_err(ParseError::from)? {
            PieceChild::Section(name) if name == b"PointData" => {
                partials = read_point_data_arrays(&mut reader, &mut buffer, num_points)
                    .map_err(ParseError::from)?;
            }
            PieceChild::Section(name) => {
                skip_element(&mut reader, &mut buffer, &name).map_err(ParseError::from)?
            }
            PieceChild::EmptySection => {}
            PieceChild::EndPiece => break,
        }
    }

    // any further pieces are skipped: coloring works against the first one
    read_to_grid_end(&mut reader, &mut buffer).map_err(ParseError::from)?;

    read_appended_section(&mut reader, &mut buffer, &mut partials, num_points)
        .map_err(ParseError::from)?;

    let mut point_arrays = Vec::with_capacity(partials.len());
    for partial in partials {
        point_arrays.push(partial.into_point_array(num_points).map_err(ParseError::from)?);
    }

    Ok(UnstructuredGrid::new(num_points, point_arrays))
}

/// find the `VTKFile` leading element and check that it announces a little
/// endian unstructured grid
fn read_file_header<R: BufRead>(
    reader: &mut Reader<R>,
    buffer: &mut Vec<u8>,
) -> Result<(), error::Header> {
    loop {
        let event = reader
            .read_event_into(buffer)
            .map_err(error::MalformedXml::from)?;

        match &event {
            Event::Start(start) => {
                if start.name() != QName(b"VTKFile") {
                    let actual_event = EventSummary::new(&event);
                    let element_mismatch = error::UnexpectedElement::new("VTKFile", actual_event);
                    return Err(error::Header::from(element_mismatch));
                }

                for attribute in start.attributes() {
                    let attribute = attribute.map_err(error::MalformedAttribute::from)?;

                    if attribute.key.as_ref() == b"type" {
                        check_attribute_value(attribute, "VTKFile", "type", "UnstructuredGrid")?;
                    } else if attribute.key.as_ref() == b"byte_order" {
                        check_attribute_value(attribute, "VTKFile", "byte_order", "LittleEndian")?;
                    }
                }

                return Ok(());
            }
            // xml declarations and comments may lead the document
            Event::Decl(_) | Event::Comment(_) => continue,
            Event::Eof => {
                let element_mismatch =
                    error::UnexpectedElement::new("VTKFile", EventSummary::eof());
                return Err(error::Header::from(element_mismatch));
            }
            _ => {
                let element_mismatch =
                    error::UnexpectedElement::new("VTKFile", EventSummary::new(&event));
                return Err(error::Header::from(element_mismatch));
            }
        }
    }
}

fn read_grid_header<R: BufRead>(
    reader: &mut Reader<R>,
    buffer: &mut Vec<u8>,
) -> Result<(), error::GridHeader> {
    let _grid = read_starting_element_with_name::<error::GridHeader, _>(
        reader,
        buffer,
        "UnstructuredGrid",
    )?;

    Ok(())
}

/// parse the `Piece` element header, return the contents of its
/// `NumberOfPoints` attribute
fn read_piece_header<R: BufRead>(
    reader: &mut Reader<R>,
    buffer: &mut Vec<u8>,
) -> Result<usize, error::GridHeader> {
    let piece = read_starting_element_with_name::<error::GridHeader, _>(reader, buffer, "Piece")?;

    let number_of_points =
        get_attribute_value::<error::GridHeader>(&piece, "NumberOfPoints", "Piece")?;
    let num_points = parse_attribute_number(&number_of_points, "Piece", "NumberOfPoints")?;

    Ok(num_points)
}

enum PieceChild {
    Section(Vec<u8>),
    EmptySection,
    EndPiece,
}

fn next_piece_child<R: BufRead>(
    reader: &mut Reader<R>,
    buffer: &mut Vec<u8>,
) -> Result<PieceChild, error::CloseElements> {
    let event = reader
        .read_event_into(buffer)
        .map_err(error::MalformedXml::from)?;

    match &event {
        Event::Start(start) => Ok(PieceChild::Section(start.name().as_ref().to_vec())),
        Event::Empty(_) => Ok(PieceChild::EmptySection),
        Event::End(end) if end.name() == QName(b"Piece") => Ok(PieceChild::EndPiece),
        Event::Eof => {
            let unexpected = error::UnexpectedElement::new("/Piece", EventSummary::eof());
            Err(error::CloseElements::from(unexpected))
        }
        _ => {
            let unexpected = error::UnexpectedElement::new("/Piece", EventSummary::new(&event));
            Err(error::CloseElements::from(unexpected))
        }
    }
}

/// read through an already-opened element (and anything nested in it)
/// until its matching end tag
fn skip_element<R: BufRead>(
    reader: &mut Reader<R>,
    buffer: &mut Vec<u8>,
    name: &[u8],
) -> Result<(), error::CloseElements> {
    let mut depth = 1usize;

    loop {
        let event = reader
            .read_event_into(buffer)
            .map_err(error::MalformedXml::from)?;

        match event {
            Event::Start(_) => depth += 1,
            Event::End(_) => {
                depth -= 1;
                if depth == 0 {
                    break;
                }
            }
            Event::Eof => {
                let expected = format!("/{}", String::from_utf8_lossy(name));
                let unexpected = error::UnexpectedElement::new(expected, EventSummary::eof());
                return Err(error::CloseElements::from(unexpected));
            }
            // text, cdata, comments, and empty elements do not change depth
            _ => {}
        }
    }

    Ok(())
}

/// after the first `</Piece>`: skip any further pieces and consume the
/// `</UnstructuredGrid>` end tag
fn read_to_grid_end<R: BufRead>(
    reader: &mut Reader<R>,
    buffer: &mut Vec<u8>,
) -> Result<(), error::CloseElements> {
    loop {
        let skip_piece = {
            let event = reader
                .read_event_into(buffer)
                .map_err(error::MalformedXml::from)?;

            match &event {
                Event::Start(start) if start.name() == QName(b"Piece") => true,
                Event::Empty(_) => false,
                Event::End(end) if end.name() == QName(b"UnstructuredGrid") => return Ok(()),
                _ => {
                    let unexpected = error::UnexpectedElement::new(
                        "/UnstructuredGrid",
                        EventSummary::new(&event),
                    );
                    return Err(error::CloseElements::from(unexpected));
                }
            }
        };

        if skip_piece {
            skip_element(reader, buffer, b"Piece")?;
        }
    }
}

/// how the values of one `DataArray` are stored
enum ArrayFormat {
    Ascii,
    Base64,
    Appended { offset: i64 },
}

struct ArrayHeader {
    name: String,
    components: usize,
    format: ArrayFormat,
}

/// data for one array: already parsed, or waiting in the appended section
enum PartialData {
    Parsed(Vec<f64>),
    Appended { offset: i64 },
}

struct PartialPointArray {
    name: String,
    components: usize,
    data: PartialData,
}

impl PartialPointArray {
    fn into_point_array(self, num_points: usize) -> Result<PointArray, error::PointData> {
        let values = match self.data {
            PartialData::Parsed(values) => values,
            // an appended block the AppendedData section never filled
            PartialData::Appended { .. } => Vec::new(),
        };

        let expected = num_points * self.components;
        if values.len() != expected {
            let truncated = error::TruncatedArray::new(self.name, expected, values.len());
            return Err(error::PointData::from(truncated));
        }

        PointArray::from_buffer(self.name, self.components, values).map_err(|shape| {
            error::PointData::from(error::TruncatedArray::new(
                shape.name,
                expected,
                shape.len,
            ))
        })
    }
}

/// parse every `DataArray` under an opened `<PointData>` element,
/// consuming the closing `</PointData>` tag
fn read_point_data_arrays<R: BufRead>(
    reader: &mut Reader<R>,
    buffer: &mut Vec<u8>,
    num_points: usize,
) -> Result<Vec<PartialPointArray>, error::PointData> {
    let mut arrays = Vec::new();

    while let Some((was_empty, header)) = read_dataarray_header(reader, buffer)? {
        let size_hint = num_points * header.components;

        let data = match header.format {
            ArrayFormat::Appended { offset } => {
                if !was_empty {
                    read_ending_element::<error::PointData, _>(reader, buffer, "DataArray")?;
                }
                PartialData::Appended { offset }
            }
            ArrayFormat::Ascii => {
                if was_empty {
                    PartialData::Parsed(Vec::new())
                } else {
                    let values =
                        parse_ascii_array_body(reader, buffer, size_hint, &header.name)?;
                    PartialData::Parsed(values)
                }
            }
            ArrayFormat::Base64 => {
                if was_empty {
                    PartialData::Parsed(Vec::new())
                } else {
                    let values =
                        parse_base64_array_body(reader, buffer, size_hint, &header.name)?;
                    PartialData::Parsed(values)
                }
            }
        };

        arrays.push(PartialPointArray {
            name: header.name,
            components: header.components,
            data,
        });
    }

    Ok(arrays)
}

/// Read the next `DataArray` header under `<PointData>` into an owned
/// description, or `None` once `</PointData>` is reached.
///
/// The boolean is whether the element was self-closing (`<DataArray ../>`).
fn read_dataarray_header<R: BufRead>(
    reader: &mut Reader<R>,
    buffer: &mut Vec<u8>,
) -> Result<Option<(bool, ArrayHeader)>, error::PointData> {
    let event = reader
        .read_event_into(buffer)
        .map_err(error::MalformedXml::from)?;

    let (was_empty, start) = match event {
        Event::Start(start) => (false, start),
        Event::Empty(start) => (true, start),
        Event::End(end) if end.name() == QName(b"PointData") => return Ok(None),
        other => {
            let actual = EventSummary::new(&other);
            let unexpected = error::UnexpectedElement::new("DataArray", actual);
            return Err(error::PointData::from(unexpected));
        }
    };

    if start.name() != QName(b"DataArray") {
        let actual = EventSummary::start(&start);
        let unexpected = error::UnexpectedElement::new("DataArray", actual);
        return Err(error::PointData::from(unexpected));
    }

    // copy everything we need out of the attributes; the event borrows the
    // shared read buffer and must not outlive this function
    let mut name = String::new();
    let mut components = 1usize;
    let mut format: Option<Vec<u8>> = None;
    let mut offset: Option<i64> = None;

    for attribute in start.attributes() {
        let attribute = attribute.map_err(error::MalformedAttribute::from)?;

        match attribute.key.as_ref() {
            b"Name" => {
                name = attribute_string(&attribute, "DataArray", "Name")?;
            }
            b"NumberOfComponents" => {
                components = parse_attribute_number(&attribute, "DataArray", "NumberOfComponents")?;
            }
            b"format" => format = Some(attribute.value.to_vec()),
            b"offset" => {
                offset = Some(parse_attribute_number(&attribute, "DataArray", "offset")?);
            }
            _ => {}
        }
    }

    if components == 0 {
        let invalid = error::InvalidAttributeValue::new(
            "DataArray".into(),
            "NumberOfComponents".into(),
            error::ParsedNameOrBytes::from("0"),
        );
        return Err(error::PointData::from(invalid));
    }

    let format = match format.as_deref() {
        Some(b"ascii") => ArrayFormat::Ascii,
        Some(b"binary") => ArrayFormat::Base64,
        Some(b"appended") => {
            let offset = offset.ok_or_else(|| {
                error::MissingAttribute::new("DataArray".into(), "offset".into())
            })?;
            ArrayFormat::Appended { offset }
        }
        Some(other) => {
            let unexpected = error::UnexpectedAttributeValue::new(
                "DataArray".into(),
                "format".into(),
                "ascii, binary, or appended".into(),
                error::ParsedNameOrBytes::new(other),
            );
            return Err(error::PointData::from(unexpected));
        }
        None => {
            let missing = error::MissingAttribute::new("DataArray".into(), "format".into());
            return Err(error::PointData::from(missing));
        }
    };

    Ok(Some((
        was_empty,
        ArrayHeader {
            name,
            components,
            format,
        },
    )))
}

/// parse the values of a single inline ascii encoded array, consuming the
/// closing `</DataArray>` tag
fn parse_ascii_array_body<R: BufRead>(
    reader: &mut Reader<R>,
    buffer: &mut Vec<u8>,
    size_hint: usize,
    array_name: &str,
) -> Result<Vec<f64>, error::PointData> {
    let mut out = Vec::with_capacity(size_hint);

    loop {
        let event = reader
            .read_event_into(buffer)
            .map_err(error::MalformedXml::from)?;

        match event {
            Event::Text(text) => {
                let bytes = text.into_inner();
                let ascii = std::str::from_utf8(&bytes)
                    .map_err(|_| error::InlineAsciiArray::new(array_name.into()))?;

                for value in ascii.split_ascii_whitespace() {
                    let number = value
                        .parse()
                        .map_err(|_| error::InlineAsciiArray::new(array_name.into()))?;
                    out.push(number);
                }
            }
            Event::End(end) if end.name() == QName(b"DataArray") => break,
            other => {
                let actual = EventSummary::new(&other);
                let unexpected = error::UnexpectedElement::new("/DataArray", actual);
                return Err(error::PointData::from(unexpected));
            }
        }
    }

    Ok(out)
}

/// parse the values of a single inline base64 encoded array, consuming the
/// closing `</DataArray>` tag
///
/// ensure that before calling this function you have verified that the
/// data is base64 encoded via its header
fn parse_base64_array_body<R: BufRead>(
    reader: &mut Reader<R>,
    buffer: &mut Vec<u8>,
    size_hint: usize,
    array_name: &str,
) -> Result<Vec<f64>, error::PointData> {
    let mut out = Vec::with_capacity(size_hint);

    loop {
        let event = reader
            .read_event_into(buffer)
            .map_err(error::MalformedXml::from)?;

        match event {
            Event::Text(text) => {
                let encoded = text.into_inner();
                let decoded = base64::decode(encoded.as_ref())
                    .map_err(|_| error::InvalidBase64::new(array_name.into()))?;

                // the first 8 decoded bytes are a length header that
                // paraview writes ahead of the actual values
                extend_from_le_bytes(&mut out, decoded.get(8..).unwrap_or(&[]));
            }
            Event::End(end) if end.name() == QName(b"DataArray") => break,
            other => {
                let actual = EventSummary::new(&other);
                let unexpected = error::UnexpectedElement::new("/DataArray", actual);
                return Err(error::PointData::from(unexpected));
            }
        }
    }

    Ok(out)
}

/// decode little-endian f64 values, ignoring a trailing partial chunk
fn extend_from_le_bytes(out: &mut Vec<f64>, bytes: &[u8]) {
    for chunk in bytes.chunks_exact(8) {
        let mut word = [0u8; 8];
        word.copy_from_slice(chunk);
        out.push(f64::from_le_bytes(word));
    }
}

/// Drain the `<AppendedData encoding="raw">` section into every partial
/// array that recorded an offset. Does nothing when no array deferred to
/// the appended section.
///
/// Offsets only *order* the blocks; each block's byte length follows from
/// the declared point and component counts, and neighbouring offsets are
/// checked against it.
fn read_appended_section<R: BufRead>(
    reader: &mut Reader<R>,
    buffer: &mut Vec<u8>,
    partials: &mut [PartialPointArray],
    num_points: usize,
) -> Result<(), error::AppendedData> {
    let mut order: Vec<(usize, i64)> = partials
        .iter()
        .enumerate()
        .filter_map(|(index, partial)| match partial.data {
            PartialData::Appended { offset } => Some((index, offset)),
            PartialData::Parsed(_) => None,
        })
        .collect();

    if order.is_empty() {
        return Ok(());
    }

    order.sort_unstable_by_key(|&(_, offset)| offset);

    let appended =
        read_starting_element_with_name::<error::AppendedData, _>(reader, buffer, "AppendedData")?;

    let encoding =
        get_attribute_value::<error::AppendedData>(&appended, "encoding", "AppendedData")?;
    check_attribute_value(encoding, "AppendedData", "encoding", "raw")?;

    clean_garbage_from_reader(reader, buffer)?;

    for (position, &(index, offset)) in order.iter().enumerate() {
        let components = partials[index].components;
        let binary_length = components * num_points * std::mem::size_of::<f64>();

        if let Some(&(_, next_offset)) = order.get(position + 1) {
            let available = next_offset - offset;
            if available != binary_length as i64 {
                let inconsistent = error::InconsistentOffsets::new(
                    partials[index].name.clone(),
                    binary_length,
                    available,
                );
                return Err(error::AppendedData::from(inconsistent));
            }
        }

        let mut parsed = Vec::with_capacity(components * num_points);
        parse_appended_binary(reader, buffer, binary_length, &mut parsed)?;
        partials[index].data = PartialData::Parsed(parsed);
    }

    Ok(())
}

/// remove the bytes between the `<AppendedData>` header and the actual
/// data: the `_` marker character and the 8 filler bytes following it
fn clean_garbage_from_reader<R: BufRead>(
    reader: &mut Reader<R>,
    buffer: &mut Vec<u8>,
) -> Result<(), error::AppendedData> {
    let len = 9usize;

    ensure_buffer_length(buffer, len);

    // pull the bytes manually from the internal reader
    let inner = reader.get_mut();
    inner.read_exact(&mut buffer[0..len])?;

    Ok(())
}

/// read one array's worth of raw binary from the appended section
fn parse_appended_binary<R: BufRead>(
    reader: &mut Reader<R>,
    buffer: &mut Vec<u8>,
    length: usize,
    parsed: &mut Vec<f64>,
) -> Result<(), error::AppendedData> {
    ensure_buffer_length(buffer, length);

    let inner = reader.get_mut();
    inner.read_exact(&mut buffer.as_mut_slice()[0..length])?;

    extend_from_le_bytes(parsed, &buffer[0..length]);

    Ok(())
}

fn ensure_buffer_length(buffer: &mut Vec<u8>, length: usize) {
    if buffer.len() < length {
        buffer.resize(length, 0);
    }
}

fn read_starting_element_with_name<'a, E, R: BufRead>(
    reader: &mut Reader<R>,
    buffer: &'a mut Vec<u8>,
    expected_name: &str,
) -> Result<BytesStart<'a>, E>
where
    E: From<error::UnexpectedElement> + From<error::MalformedXml>,
{
    let element = reader
        .read_event_into(buffer)
        .map_err(error::MalformedXml::from)?;

    let event = if let Event::Start(event) = element {
        event
    } else {
        let actual_event = EventSummary::new(&element);
        let unexpected = error::UnexpectedElement::new(expected_name, actual_event);
        return Err(E::from(unexpected));
    };

    if event.name().as_ref() != expected_name.as_bytes() {
        let actual_event = EventSummary::start(&event);
        let unexpected = error::UnexpectedElement::new(expected_name, actual_event);
        return Err(E::from(unexpected));
    }

    Ok(event)
}

fn read_ending_element<'a, E, R: BufRead>(
    reader: &mut Reader<R>,
    buffer: &'a mut Vec<u8>,
    expected_name: &str,
) -> Result<(), E>
where
    E: From<error::UnexpectedElement> + From<error::MalformedXml>,
{
    let element = reader
        .read_event_into(buffer)
        .map_err(error::MalformedXml::from)?;

    let event = if let Event::End(event) = element {
        event
    } else {
        let actual_event = EventSummary::new(&element);
        let unexpected =
            error::UnexpectedElement::new(format!("/{expected_name}"), actual_event);
        return Err(E::from(unexpected));
    };

    if event.name().as_ref() != expected_name.as_bytes() {
        let actual_event = EventSummary::end(&event);
        let unexpected = error::UnexpectedElement::new(expected_name, actual_event);
        return Err(E::from(unexpected));
    }

    Ok(())
}

fn get_attribute_value<'a, E>(
    bytes_start: &'a BytesStart<'_>,
    attribute_key: &str,
    element_name: &str,
) -> Result<Attribute<'a>, E>
where
    E: From<error::MissingAttribute>,
{
    let attribute = bytes_start
        .attributes()
        .filter_map(|x| x.ok())
        .find(|x| x.key.as_ref() == attribute_key.as_bytes());

    if let Some(att) = attribute {
        Ok(att)
    } else {
        let err = error::MissingAttribute::new(element_name.into(), attribute_key.into());
        Err(E::from(err))
    }
}

/// ensure that an attribute's value is what we expect it to be, otherwise
/// return an error with some location information
fn check_attribute_value(
    att: Attribute<'_>,
    element_name: &str,
    attribute_name: &str,
    expected_attribute_value: &str,
) -> Result<(), error::UnexpectedAttributeValue> {
    if att.value.as_ref() != expected_attribute_value.as_bytes() {
        let unexpected_value = error::UnexpectedAttributeValue {
            element_name: element_name.into(),
            attribute_name: attribute_name.into(),
            expected_value: expected_attribute_value.into(),
            actual_value: error::ParsedNameOrBytes::from(att.value),
        };

        Err(unexpected_value)
    } else {
        Ok(())
    }
}

fn attribute_string(
    attribute: &Attribute<'_>,
    element_name: &str,
    attribute_name: &str,
) -> Result<String, error::InvalidAttributeValue> {
    String::from_utf8(attribute.value.to_vec()).map_err(|_| {
        error::InvalidAttributeValue::new(
            element_name.into(),
            attribute_name.into(),
            error::ParsedNameOrBytes::new(attribute.value.as_ref()),
        )
    })
}

fn parse_attribute_number<T: std::str::FromStr>(
    attribute: &Attribute<'_>,
    element_name: &str,
    attribute_name: &str,
) -> Result<T, error::InvalidAttributeValue> {
    std::str::from_utf8(&attribute.value)
        .ok()
        .and_then(|value| value.parse().ok())
        .ok_or_else(|| {
            error::InvalidAttributeValue::new(
                element_name.into(),
                attribute_name.into(),
                error::ParsedNameOrBytes::new(attribute.value.as_ref()),
            )
        })
}

//! Small helpers over `quick-xml` shared by every reader and writer.
//!
//! Readers are streaming (`Reader` over a `BufRead`, text trimmed); writers
//! indent by two spaces. All failures are mapped into [`ConceptBuildError`].

use std::io::{BufRead, Write};

use quick_xml::Reader;
use quick_xml::Writer;
use quick_xml::events::{BytesDecl, BytesEnd, BytesStart, BytesText, Event};

use crate::error::{ConceptBuildError, Result};

// ---------------------------------------------------------------------------
// Reading
// ---------------------------------------------------------------------------

/// Build a streaming reader with whitespace-only text trimmed.
pub fn reader<R: BufRead>(source: R) -> Reader<R> {
    let mut reader = Reader::from_reader(source);
    reader.config_mut().trim_text(true);
    reader
}

/// Local element name as an owned string.
pub fn local_name(e: &BytesStart<'_>) -> String {
    String::from_utf8_lossy(e.local_name().as_ref()).into_owned()
}

/// Look up an attribute by exact name, unescaping its value.
pub fn attribute(e: &BytesStart<'_>, name: &str) -> Result<Option<String>> {
    for attr in e.attributes() {
        let attr = attr.map_err(ConceptBuildError::xml)?;
        if attr.key.as_ref() == name.as_bytes() {
            let value = attr.unescape_value().map_err(ConceptBuildError::xml)?;
            return Ok(Some(value.into_owned()));
        }
    }
    Ok(None)
}

/// Parse an XML boolean attribute value (`true`/`false`, any case).
pub fn parse_bool(value: &str) -> Option<bool> {
    match value.trim().to_ascii_lowercase().as_str() {
        "true" | "1" => Some(true),
        "false" | "0" => Some(false),
        _ => None,
    }
}

/// Read the text content of the element whose start tag was just consumed,
/// up to and including its end tag. Nested markup is skipped, its text kept.
pub fn read_text<R: BufRead>(reader: &mut Reader<R>) -> Result<String> {
    let mut buf = Vec::new();
    let mut text = String::new();
    let mut depth = 0usize;
    loop {
        buf.clear();
        match reader.read_event_into(&mut buf).map_err(ConceptBuildError::xml)? {
            Event::Text(t) => {
                let value = t.unescape().map_err(ConceptBuildError::xml)?;
                text.push_str(&value);
            }
            Event::CData(c) => text.push_str(&String::from_utf8_lossy(&c)),
            Event::Start(_) => depth += 1,
            Event::End(_) => {
                if depth == 0 {
                    break;
                }
                depth -= 1;
            }
            Event::Eof => return Err(ConceptBuildError::parse("unexpected end of document")),
            _ => {}
        }
    }
    Ok(text.trim().to_string())
}

/// Error for a document that ends while `element` is still open.
pub fn unexpected_eof(element: &str) -> ConceptBuildError {
    ConceptBuildError::parse(format!("unexpected end of document inside <{element}>"))
}

/// Skip the remainder of the element whose start tag was just consumed.
pub fn skip_element<R: BufRead>(reader: &mut Reader<R>) -> Result<()> {
    let mut buf = Vec::new();
    let mut depth = 0usize;
    loop {
        buf.clear();
        match reader.read_event_into(&mut buf).map_err(ConceptBuildError::xml)? {
            Event::Start(_) => depth += 1,
            Event::End(_) => {
                if depth == 0 {
                    return Ok(());
                }
                depth -= 1;
            }
            Event::Eof => return Err(ConceptBuildError::parse("unexpected end of document")),
            _ => {}
        }
    }
}

// ---------------------------------------------------------------------------
// Writing
// ---------------------------------------------------------------------------

/// Wrap an output stream in an indenting XML writer.
pub fn writer<W: Write>(inner: W) -> Writer<W> {
    Writer::new_with_indent(inner, b' ', 2)
}

/// `<?xml version="1.0" encoding="utf-8"?>`
pub fn write_decl<W: Write>(w: &mut Writer<W>) -> Result<()> {
    w.write_event(Event::Decl(BytesDecl::new("1.0", Some("utf-8"), None)))
        .map_err(ConceptBuildError::xml)
}

fn start_tag<'a>(name: &'a str, attrs: &[(&'a str, &'a str)]) -> BytesStart<'a> {
    let mut start = BytesStart::new(name);
    for &(key, value) in attrs {
        start.push_attribute((key, value));
    }
    start
}

/// Open an element.
pub fn write_start<W: Write>(w: &mut Writer<W>, name: &str, attrs: &[(&str, &str)]) -> Result<()> {
    w.write_event(Event::Start(start_tag(name, attrs)))
        .map_err(ConceptBuildError::xml)
}

/// Close an element.
pub fn write_end<W: Write>(w: &mut Writer<W>, name: &str) -> Result<()> {
    w.write_event(Event::End(BytesEnd::new(name)))
        .map_err(ConceptBuildError::xml)
}

/// Write a self-closing element.
pub fn write_empty<W: Write>(w: &mut Writer<W>, name: &str, attrs: &[(&str, &str)]) -> Result<()> {
    w.write_event(Event::Empty(start_tag(name, attrs)))
        .map_err(ConceptBuildError::xml)
}

/// Write `<name attrs>text</name>` on one line.
pub fn write_text_element<W: Write>(
    w: &mut Writer<W>,
    name: &str,
    attrs: &[(&str, &str)],
    text: &str,
) -> Result<()> {
    write_start(w, name, attrs)?;
    w.write_event(Event::Text(BytesText::new(text)))
        .map_err(ConceptBuildError::xml)?;
    write_end(w, name)
}

use quick_xml::events::{BytesStart, Event};
use quick_xml::name::ResolveResult;
use quick_xml::reader::NsReader;

use super::{DocumentNode, Element, SourcePosition};

/// Errors raised while turning raw bytes into a [`DocumentNode`].
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum LoadError {
    #[error("The input is neither valid UTF-8 nor valid UTF-16 text.")]
    Encoding,

    #[error("The input contains no root element.")]
    NoRoot,

    #[error("{message} ({position})")]
    Syntax {
        message: String,
        position: SourcePosition,
    },
}

/// Decode and parse a document from raw file content.
pub fn parse_bytes(bytes: &[u8]) -> Result<DocumentNode, LoadError> {
    let text = decode(bytes)?;
    parse_str(&text)
}

/// Decode raw file content, honouring UTF-8 and UTF-16 byte order marks.
/// Content without a BOM must be UTF-8.
pub fn decode(bytes: &[u8]) -> Result<String, LoadError> {
    match bytes {
        [0xEF, 0xBB, 0xBF, rest @ ..] => String::from_utf8(rest.to_vec()).map_err(|_| LoadError::Encoding),
        [0xFF, 0xFE, rest @ ..] => decode_utf16(rest, u16::from_le_bytes),
        [0xFE, 0xFF, rest @ ..] => decode_utf16(rest, u16::from_be_bytes),
        _ => String::from_utf8(bytes.to_vec()).map_err(|_| LoadError::Encoding),
    }
}

fn decode_utf16(bytes: &[u8], to_unit: fn([u8; 2]) -> u16) -> Result<String, LoadError> {
    if bytes.len() % 2 != 0 {
        return Err(LoadError::Encoding);
    }
    let units: Vec<u16> = bytes
        .chunks_exact(2)
        .map(|pair| to_unit([pair[0], pair[1]]))
        .collect();
    String::from_utf16(&units).map_err(|_| LoadError::Encoding)
}

/// Parse a document from text.
#[tracing::instrument(skip(text), fields(len = text.len()))]
pub fn parse_str(text: &str) -> Result<DocumentNode, LoadError> {
    let mut reader = NsReader::from_str(text);
    let mut stack: Vec<Element> = Vec::new();
    let mut root: Option<Element> = None;

    loop {
        let offset = reader.buffer_position() as usize;
        let event = match reader.read_event() {
            Ok(event) => event,
            Err(err) => return Err(syntax(text, reader.error_position() as usize, err)),
        };

        match event {
            Event::Start(start) => {
                let element = open_element(&reader, text, offset, &start)?;
                stack.push(element);
            }
            Event::Empty(start) => {
                let element = open_element(&reader, text, offset, &start)?;
                close_element(element, &mut stack, &mut root, text, offset)?;
            }
            Event::End(_) => {
                let Some(element) = stack.pop() else {
                    return Err(syntax(text, offset, "Unexpected closing tag."));
                };
                close_element(element, &mut stack, &mut root, text, offset)?;
            }
            Event::Text(content) => {
                let content = content.unescape().map_err(|err| syntax(text, offset, err))?;
                append_text(&mut stack, &content, text, offset)?;
            }
            Event::CData(content) => {
                let content = String::from_utf8_lossy(&content.into_inner()).into_owned();
                append_text(&mut stack, &content, text, offset)?;
            }
            Event::Eof => break,
            _ => {}
        }
    }

    if let Some(open) = stack.last() {
        return Err(syntax(
            text,
            text.len(),
            format!("Unexpected end of input: <{}> is never closed.", open.name),
        ));
    }

    let root = root.ok_or(LoadError::NoRoot)?;
    log::debug!("Parsed document with root <{}>", root.name);
    Ok(DocumentNode::from_element(root))
}

fn open_element(
    reader: &NsReader<&[u8]>,
    text: &str,
    offset: usize,
    start: &BytesStart,
) -> Result<Element, LoadError> {
    let (namespace, local) = reader.resolve_element(start.name());
    let mut element = Element {
        name: String::from_utf8_lossy(local.as_ref()).into_owned(),
        namespace: resolved(namespace),
        position: position_at(text, offset),
        ..Default::default()
    };

    for attribute in start.attributes() {
        let attribute = attribute.map_err(|err| syntax(text, offset, err))?;
        if attribute.key.as_namespace_binding().is_some() {
            continue;
        }
        let (namespace, local) = reader.resolve_attribute(attribute.key);
        let value = attribute
            .unescape_value()
            .map_err(|err| syntax(text, offset, err))?;
        element.attributes.push((
            String::from_utf8_lossy(local.as_ref()).into_owned(),
            resolved(namespace),
            value.into_owned(),
        ));
    }

    Ok(element)
}

fn close_element(
    element: Element,
    stack: &mut Vec<Element>,
    root: &mut Option<Element>,
    text: &str,
    offset: usize,
) -> Result<(), LoadError> {
    if let Some(parent) = stack.last_mut() {
        parent.text.push_str(&element.text);
        parent.children.push(element);
        return Ok(());
    }
    if root.is_some() {
        return Err(syntax(
            text,
            offset,
            format!("Multiple root elements: <{}> follows the document root.", element.name),
        ));
    }
    *root = Some(element);
    Ok(())
}

fn append_text(stack: &mut [Element], content: &str, text: &str, offset: usize) -> Result<(), LoadError> {
    match stack.last_mut() {
        Some(element) => element.text.push_str(content),
        None if content.trim().is_empty() => {}
        None => return Err(syntax(text, offset, "Text outside of the root element.")),
    }
    Ok(())
}

fn resolved(result: ResolveResult) -> Option<String> {
    match result {
        ResolveResult::Bound(namespace) => Some(String::from_utf8_lossy(namespace.as_ref()).into_owned()),
        _ => None,
    }
}

fn syntax(text: &str, offset: usize, message: impl ToString) -> LoadError {
    LoadError::Syntax {
        message: message.to_string(),
        position: position_at(text, offset),
    }
}

fn position_at(text: &str, offset: usize) -> SourcePosition {
    let prefix = &text.as_bytes()[..offset.min(text.len())];
    let line = prefix.iter().filter(|&&b| b == b'\n').count() + 1;
    let line_start = prefix
        .iter()
        .rposition(|&b| b == b'\n')
        .map_or(0, |i| i + 1);
    SourcePosition {
        line,
        column: prefix.len() - line_start + 1,
    }
}

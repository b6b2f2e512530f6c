//! XML adapter built on the `quick-xml` pull reader.

use quick_xml::encoding::Decoder;
use quick_xml::events::{BytesStart, Event};
use quick_xml::Reader;

use super::{DocumentError, Node};

/// Parse an XML document into a [`Node`] tree.
///
/// Declarations, comments, processing instructions and doctypes are skipped.
/// Character data between elements is rejected since the suite shape carries
/// everything in attributes.
pub fn parse(content: &str) -> Result<Node, DocumentError> {
    let mut reader = Reader::from_str(content);
    reader.config_mut().trim_text(true);

    let mut open: Vec<Node> = Vec::new();
    let mut root: Option<Node> = None;

    loop {
        match reader.read_event()? {
            Event::Start(start) => open.push(element(&start, reader.decoder())?),
            Event::Empty(start) => {
                let node = element(&start, reader.decoder())?;
                attach(&mut open, &mut root, node)?;
            }
            Event::End(_) => {
                // the reader already verified the closing name
                let node = open
                    .pop()
                    .ok_or_else(|| DocumentError::Malformed("unbalanced closing tag".into()))?;
                attach(&mut open, &mut root, node)?;
            }
            Event::Text(_) | Event::CData(_) => {
                return Err(DocumentError::Malformed(format!(
                    "unexpected character data near byte {}",
                    reader.buffer_position()
                )));
            }
            Event::Eof => break,
            _ => {}
        }
    }

    if let Some(unclosed) = open.last() {
        return Err(DocumentError::Malformed(format!(
            "element <{}> is never closed",
            unclosed.tag
        )));
    }

    root.ok_or_else(|| DocumentError::Malformed("document has no root element".into()))
}

fn element(start: &BytesStart<'_>, decoder: Decoder) -> Result<Node, DocumentError> {
    let mut node = Node::new(String::from_utf8_lossy(start.name().as_ref()));

    for attribute in start.attributes() {
        let attribute = attribute?;
        let name = String::from_utf8_lossy(attribute.key.as_ref()).into_owned();
        let value = attribute.decode_and_unescape_value(decoder)?.into_owned();
        node.attributes.push((name, value));
    }

    Ok(node)
}

fn attach(open: &mut [Node], root: &mut Option<Node>, node: Node) -> Result<(), DocumentError> {
    if let Some(parent) = open.last_mut() {
        parent.children.push(node);
        return Ok(());
    }
    if root.is_some() {
        return Err(DocumentError::Malformed(format!(
            "second root element <{}>",
            node.tag
        )));
    }
    *root = Some(node);
    Ok(())
}

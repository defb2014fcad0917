//! Element tree parsing with quick-xml.

use quick_xml::events::{BytesStart, Event};
use quick_xml::Reader;

use super::tree::{NodeId, XmlTree};
use crate::error::{Error, Result};

/// Elements whose whitespace-only content is significant.
const TEXT_ELEMENTS: &[&str] = &["w:t", "w:instrText", "w:delText"];

/// Parse an XML document into an [`XmlTree`].
///
/// Comments, processing instructions and the declaration are dropped.
/// Whitespace-only text is kept only inside text-bearing elements.
pub fn parse_document(xml: &str) -> Result<XmlTree> {
    let mut reader = Reader::from_str(xml);
    reader.config_mut().trim_text(false);

    let mut tree: Option<XmlTree> = None;
    let mut stack: Vec<NodeId> = Vec::new();

    loop {
        match reader.read_event() {
            Ok(Event::Start(ref e)) => {
                let id = open_element(&mut tree, &stack, e)?;
                stack.push(id);
            }
            Ok(Event::Empty(ref e)) => {
                open_element(&mut tree, &stack, e)?;
            }
            Ok(Event::End(_)) => {
                stack.pop();
            }
            Ok(Event::Text(ref e)) => {
                let (Some(tree), Some(&top)) = (tree.as_mut(), stack.last()) else {
                    continue;
                };
                let text = e.unescape().map_err(|err| Error::XmlParse(err.to_string()))?;
                let keep = text.chars().any(|c| !c.is_whitespace())
                    || tree.name(top).is_some_and(|n| TEXT_ELEMENTS.contains(&n));
                if keep {
                    tree.push_text(top, &text);
                }
            }
            Ok(Event::CData(ref e)) => {
                if let (Some(tree), Some(&top)) = (tree.as_mut(), stack.last()) {
                    tree.push_text(top, &String::from_utf8_lossy(e.as_ref()));
                }
            }
            Ok(Event::Eof) => break,
            Ok(_) => {}
            Err(e) => {
                return Err(Error::XmlParse(format!(
                    "at byte {}: {}",
                    reader.error_position(),
                    e
                )))
            }
        }
    }

    tree.ok_or_else(|| Error::XmlParse("document has no root element".to_string()))
}

fn open_element(tree: &mut Option<XmlTree>, stack: &[NodeId], e: &BytesStart) -> Result<NodeId> {
    let name = String::from_utf8_lossy(e.name().as_ref()).into_owned();
    let id = match (tree.as_mut(), stack.last()) {
        (None, _) => {
            let new_tree = XmlTree::new(&name);
            let root = new_tree.root();
            *tree = Some(new_tree);
            root
        }
        (Some(t), Some(&parent)) => t
            .append_child(parent, &name)
            .ok_or_else(|| Error::XmlParse(format!("cannot attach <{}>", name)))?,
        (Some(_), None) => {
            return Err(Error::XmlParse(format!(
                "second root element <{}>",
                name
            )))
        }
    };

    let Some(t) = tree.as_mut() else {
        return Err(Error::XmlParse("tree not initialized".to_string()));
    };
    for attr in e.attributes() {
        let attr = attr?;
        let key = String::from_utf8_lossy(attr.key.as_ref()).into_owned();
        let value = attr
            .unescape_value()
            .map_err(|err| Error::XmlParse(err.to_string()))?;
        t.set_attr(id, &key, &value);
    }
    Ok(id)
}

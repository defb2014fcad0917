//! Element tree serialization with quick-xml.

use std::io::Write;

use quick_xml::events::{BytesDecl, BytesEnd, BytesStart, BytesText, Event};
use quick_xml::Writer;

use super::tree::{NodeId, XmlTree};
use crate::error::Result;

/// Serialize the whole tree, with an XML declaration, into `out`.
///
/// `indent` switches on pretty-printing with that many spaces per level.
pub fn write_document<W: Write>(tree: &XmlTree, out: W, indent: Option<usize>) -> Result<W> {
    let mut writer = match indent {
        Some(width) => Writer::new_with_indent(out, b' ', width),
        None => Writer::new(out),
    };
    writer.write_event(Event::Decl(BytesDecl::new("1.0", Some("UTF-8"), Some("yes"))))?;
    write_element(tree, tree.root(), &mut writer)?;
    Ok(writer.into_inner())
}

/// Serialize the subtree rooted at `node` without a declaration.
pub fn write_subtree<W: Write>(
    tree: &XmlTree,
    node: NodeId,
    out: W,
    indent: Option<usize>,
) -> Result<W> {
    let mut writer = match indent {
        Some(width) => Writer::new_with_indent(out, b' ', width),
        None => Writer::new(out),
    };
    write_element(tree, node, &mut writer)?;
    Ok(writer.into_inner())
}

/// Render a subtree to a string.
pub fn subtree_to_string(tree: &XmlTree, node: NodeId, indent: Option<usize>) -> Result<String> {
    let bytes = write_subtree(tree, node, Vec::new(), indent)?;
    Ok(String::from_utf8_lossy(&bytes).into_owned())
}

fn write_element<W: Write>(tree: &XmlTree, node: NodeId, writer: &mut Writer<W>) -> Result<()> {
    let Some(name) = tree.name(node) else {
        return Ok(());
    };
    let mut start = BytesStart::new(name);
    for (key, value) in tree.attrs(node) {
        start.push_attribute((key.as_str(), value.as_str()));
    }

    let children = tree.children(node);
    let text = tree.text(node);
    if children.is_empty() && text.is_empty() {
        writer.write_event(Event::Empty(start))?;
        return Ok(());
    }

    writer.write_event(Event::Start(start))?;
    if !text.is_empty() {
        writer.write_event(Event::Text(BytesText::new(text)))?;
    }
    for &child in children {
        write_element(tree, child, writer)?;
    }
    writer.write_event(Event::End(BytesEnd::new(name)))?;
    Ok(())
}

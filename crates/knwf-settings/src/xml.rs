//! Owned XML document model.
//!
//! Documents are parsed with quick-xml into a small element tree that keeps
//! everything a settings file or template can carry: the declaration, root
//! attributes (namespaces included), comments and element order. The tree is
//! plain data, so building an output document is a matter of constructing new
//! values instead of mutating parser state.
//!
//! Whitespace-only text is dropped on read and the writer re-indents with two
//! spaces, so formatting does not round-trip byte for byte.

use std::borrow::Cow;

use quick_xml::Reader;
use quick_xml::Writer;
use quick_xml::escape::escape;
use quick_xml::events::attributes::Attribute;
use quick_xml::events::{BytesCData, BytesDecl, BytesEnd, BytesStart, BytesText, Event};
use quick_xml::name::QName;

use crate::error::XmlError;

/// The `<?xml ...?>` declaration.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Declaration {
  pub version: String,
  pub encoding: Option<String>,
  pub standalone: Option<String>,
}

impl Default for Declaration {
  fn default() -> Self {
    Self {
      version: "1.0".to_string(),
      encoding: Some("UTF-8".to_string()),
      standalone: None,
    }
  }
}

/// A child of an element, or a top-level item around the root.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Node {
  Element(Element),
  Text(String),
  CData(String),
  Comment(String),
  ProcessingInstruction(String),
  DocType(String),
}

/// An element with its attributes in source order.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Element {
  /// Qualified tag name, prefix included.
  pub name: String,
  pub attributes: Vec<(String, String)>,
  pub children: Vec<Node>,
}

impl Element {
  pub fn new(name: impl Into<String>) -> Self {
    Self {
      name: name.into(),
      attributes: Vec::new(),
      children: Vec::new(),
    }
  }

  /// Builder-style attribute append.
  pub fn with_attribute(mut self, name: impl Into<String>, value: impl Into<String>) -> Self {
    self.attributes.push((name.into(), value.into()));
    self
  }

  /// Tag name without any namespace prefix.
  pub fn local_name(&self) -> &str {
    match self.name.rsplit_once(':') {
      Some((_, local)) => local,
      None => &self.name,
    }
  }

  /// Value of the first attribute with the given name.
  pub fn attr(&self, name: &str) -> Option<&str> {
    self
      .attributes
      .iter()
      .find(|(key, _)| key == name)
      .map(|(_, value)| value.as_str())
  }

  pub fn has_attr(&self, name: &str) -> bool {
    self.attributes.iter().any(|(key, _)| key == name)
  }

  pub fn push_element(&mut self, element: Element) {
    self.children.push(Node::Element(element));
  }

  /// Direct element children in document order.
  pub fn elements(&self) -> impl Iterator<Item = &Element> {
    self.children.iter().filter_map(|child| match child {
      Node::Element(element) => Some(element),
      _ => None,
    })
  }

  /// Depth-first, document-order search starting with this element.
  pub fn find(&self, predicate: &dyn Fn(&Element) -> bool) -> Option<&Element> {
    if predicate(self) {
      return Some(self);
    }
    self.elements().find_map(|child| child.find(predicate))
  }

  fn write<W: std::io::Write>(&self, writer: &mut Writer<W>) -> Result<(), XmlError> {
    let mut start = BytesStart::new(self.name.as_str());
    for (key, value) in &self.attributes {
      let escaped = escape_attribute(value);
      start.push_attribute(Attribute {
        key: QName(key.as_bytes()),
        value: Cow::Owned(escaped.into_bytes()),
      });
    }

    if self.children.is_empty() {
      return write_event(writer, Event::Empty(start));
    }

    write_event(writer, Event::Start(start))?;
    for child in &self.children {
      child.write(writer)?;
    }
    write_event(writer, Event::End(BytesEnd::new(self.name.as_str())))
  }
}

impl Node {
  fn write<W: std::io::Write>(&self, writer: &mut Writer<W>) -> Result<(), XmlError> {
    match self {
      Node::Element(element) => element.write(writer),
      Node::Text(text) => write_event(writer, Event::Text(BytesText::new(text))),
      Node::CData(text) => write_event(writer, Event::CData(BytesCData::new(text.as_str()))),
      Node::Comment(text) => write_event(
        writer,
        Event::Comment(BytesText::from_escaped(text.as_str())),
      ),
      Node::ProcessingInstruction(text) => {
        write_event(writer, Event::PI(BytesText::from_escaped(text.as_str())))
      }
      Node::DocType(text) => write_event(
        writer,
        Event::DocType(BytesText::from_escaped(text.as_str())),
      ),
    }
  }
}

/// A complete XML document.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Document {
  pub declaration: Option<Declaration>,
  /// Comments, processing instructions and doctype before the root.
  pub prolog: Vec<Node>,
  pub root: Element,
  /// Comments and processing instructions after the root.
  pub epilog: Vec<Node>,
}

impl Document {
  /// Wrap a root element with a default declaration.
  pub fn new(root: Element) -> Self {
    Self {
      declaration: Some(Declaration::default()),
      prolog: Vec::new(),
      root,
      epilog: Vec::new(),
    }
  }

  /// Parse XML text into an owned document.
  pub fn parse(xml: &str) -> Result<Self, XmlError> {
    let mut reader = Reader::from_str(xml);
    reader.trim_text(true);

    let mut buf = Vec::new();
    let mut declaration = None;
    let mut stack: Vec<Element> = Vec::new();
    let mut top_level: Vec<Node> = Vec::new();

    loop {
      let event = reader
        .read_event_into(&mut buf)
        .map_err(|err| malformed(&reader, err))?;

      match event {
        Event::Decl(ref decl) => {
          declaration = Some(read_declaration(decl).map_err(|err| malformed(&reader, err))?);
        }
        Event::Start(ref start) => {
          stack.push(read_element(&reader, start)?);
        }
        Event::Empty(ref start) => {
          let element = read_element(&reader, start)?;
          attach(&mut stack, &mut top_level, Node::Element(element));
        }
        Event::End(ref end) => {
          let element = stack.pop().ok_or_else(|| {
            XmlError::Unbalanced(format!(
              "unexpected closing tag </{}>",
              String::from_utf8_lossy(end.name().as_ref())
            ))
          })?;
          attach(&mut stack, &mut top_level, Node::Element(element));
        }
        Event::Text(ref text) => {
          let text = text.unescape().map_err(|err| malformed(&reader, err))?;
          if !stack.is_empty() && !text.is_empty() {
            attach(&mut stack, &mut top_level, Node::Text(text.into_owned()));
          }
        }
        Event::CData(ref data) => {
          let text = decode(&reader, data)?;
          attach(&mut stack, &mut top_level, Node::CData(text));
        }
        Event::Comment(ref comment) => {
          let text = decode(&reader, comment)?;
          attach(&mut stack, &mut top_level, Node::Comment(text));
        }
        Event::PI(ref pi) => {
          let text = decode(&reader, pi)?;
          attach(
            &mut stack,
            &mut top_level,
            Node::ProcessingInstruction(text),
          );
        }
        Event::DocType(ref doctype) => {
          let text = decode(&reader, doctype)?;
          attach(&mut stack, &mut top_level, Node::DocType(text));
        }
        Event::Eof => break,
      }
      buf.clear();
    }

    if let Some(open) = stack.last() {
      return Err(XmlError::Unbalanced(format!("unclosed tag <{}>", open.name)));
    }

    let root_index = top_level
      .iter()
      .position(|node| matches!(node, Node::Element(_)))
      .ok_or(XmlError::NoRoot)?;
    let epilog = top_level.split_off(root_index + 1);
    if epilog.iter().any(|node| matches!(node, Node::Element(_))) {
      return Err(XmlError::Unbalanced("multiple root elements".to_string()));
    }
    let root = match top_level.pop() {
      Some(Node::Element(root)) => root,
      _ => return Err(XmlError::NoRoot),
    };

    Ok(Self {
      declaration,
      prolog: top_level,
      root,
      epilog,
    })
  }

  /// Write the document as two-space indented XML text.
  pub fn to_xml(&self) -> Result<String, XmlError> {
    let mut writer = Writer::new_with_indent(Vec::new(), b' ', 2);

    if let Some(decl) = &self.declaration {
      let event = BytesDecl::new(
        &decl.version,
        decl.encoding.as_deref(),
        decl.standalone.as_deref(),
      );
      write_event(&mut writer, Event::Decl(event))?;
    }
    for node in &self.prolog {
      node.write(&mut writer)?;
    }
    self.root.write(&mut writer)?;
    for node in &self.epilog {
      node.write(&mut writer)?;
    }

    let mut xml =
      String::from_utf8(writer.into_inner()).map_err(|err| XmlError::Write(err.to_string()))?;
    xml.push('\n');
    Ok(xml)
  }

  /// Depth-first, document-order search from the root.
  pub fn find(&self, predicate: &dyn Fn(&Element) -> bool) -> Option<&Element> {
    self.root.find(predicate)
  }
}

fn attach(stack: &mut [Element], top_level: &mut Vec<Node>, node: Node) {
  match stack.last_mut() {
    Some(parent) => parent.children.push(node),
    None => top_level.push(node),
  }
}

fn read_element(reader: &Reader<&[u8]>, start: &BytesStart<'_>) -> Result<Element, XmlError> {
  let mut element = Element::new(String::from_utf8_lossy(start.name().as_ref()));
  for attr in start.attributes() {
    let attr = attr.map_err(|err| malformed(reader, err))?;
    let value = attr.unescape_value().map_err(|err| malformed(reader, err))?;
    element.attributes.push((
      String::from_utf8_lossy(attr.key.as_ref()).into_owned(),
      value.into_owned(),
    ));
  }
  Ok(element)
}

fn read_declaration(decl: &BytesDecl<'_>) -> Result<Declaration, quick_xml::Error> {
  let version = String::from_utf8_lossy(&decl.version()?).into_owned();
  let encoding = match decl.encoding() {
    Some(encoding) => Some(String::from_utf8_lossy(&encoding?).into_owned()),
    None => None,
  };
  let standalone = match decl.standalone() {
    Some(standalone) => Some(String::from_utf8_lossy(&standalone?).into_owned()),
    None => None,
  };
  Ok(Declaration {
    version,
    encoding,
    standalone,
  })
}

fn decode(reader: &Reader<&[u8]>, bytes: &[u8]) -> Result<String, XmlError> {
  reader
    .decoder()
    .decode(bytes)
    .map(|text| text.into_owned())
    .map_err(|err| malformed(reader, err))
}

fn malformed(reader: &Reader<&[u8]>, err: impl std::fmt::Display) -> XmlError {
  XmlError::Malformed {
    position: reader.buffer_position(),
    message: err.to_string(),
  }
}

fn write_event<W: std::io::Write>(writer: &mut Writer<W>, event: Event<'_>) -> Result<(), XmlError> {
  writer
    .write_event(event)
    .map_err(|err| XmlError::Write(err.to_string()))
}

/// Escape an attribute value, keeping line breaks and tabs as character
/// references so they survive attribute-value normalization on re-read.
fn escape_attribute(value: &str) -> String {
  escape(value)
    .replace('\n', "&#10;")
    .replace('\r', "&#13;")
    .replace('\t', "&#9;")
}

//! Minimal XML document model for `get_document`.
//!
//! Parsing goes through `quick_xml`'s streaming reader with whitespace-only
//! text dropped, so two documents that differ only in indentation compare
//! equal. Declarations, processing instructions and doctypes are not kept;
//! serialization always writes a UTF-8 declaration followed by compact
//! markup.

use std::io;

use quick_xml::events::{BytesCData, BytesDecl, BytesEnd, BytesStart, BytesText, Event};
use quick_xml::{Reader, Writer};
use thiserror::Error;

#[derive(Debug, Error)]
#[error("{0}")]
pub struct XmlError(String);

impl XmlError {
    fn new(message: impl Into<String>) -> Self {
        Self(message.into())
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Node {
    Element(Element),
    Text(String),
    CData(String),
    Comment(String),
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Element {
    pub name: String,
    pub attributes: Vec<(String, String)>,
    pub children: Vec<Node>,
}

impl Element {
    fn from_start(start: &BytesStart<'_>) -> Result<Self, XmlError> {
        let name = String::from_utf8(start.name().as_ref().to_vec())
            .map_err(|e| XmlError::new(e.to_string()))?;
        let mut attributes = Vec::new();
        for attr in start.attributes() {
            let attr = attr.map_err(|e| XmlError::new(e.to_string()))?;
            let key = String::from_utf8_lossy(attr.key.as_ref()).into_owned();
            let value = attr
                .unescape_value()
                .map_err(|e| XmlError::new(e.to_string()))?
                .into_owned();
            attributes.push((key, value));
        }
        Ok(Self {
            name,
            attributes,
            children: Vec::new(),
        })
    }

    pub fn attribute(&self, name: &str) -> Option<&str> {
        self.attributes
            .iter()
            .find(|(k, _)| k == name)
            .map(|(_, v)| v.as_str())
    }

    /// First child element called `name`.
    pub fn child(&self, name: &str) -> Option<&Element> {
        self.elements().find(|e| e.name == name)
    }

    pub fn elements(&self) -> impl Iterator<Item = &Element> {
        self.children.iter().filter_map(|n| match n {
            Node::Element(e) => Some(e),
            _ => None,
        })
    }

    /// Concatenated direct text and CDATA content.
    pub fn text(&self) -> String {
        self.children
            .iter()
            .filter_map(|n| match n {
                Node::Text(t) | Node::CData(t) => Some(t.as_str()),
                _ => None,
            })
            .collect()
    }

    fn write<W: io::Write>(&self, writer: &mut Writer<W>) -> io::Result<()> {
        let mut start = BytesStart::new(self.name.as_str());
        for (key, value) in &self.attributes {
            start.push_attribute((key.as_str(), value.as_str()));
        }
        if self.children.is_empty() {
            return emit(writer, Event::Empty(start));
        }
        emit(writer, Event::Start(start))?;
        for child in &self.children {
            match child {
                Node::Element(e) => e.write(writer)?,
                Node::Text(t) => emit(writer, Event::Text(BytesText::new(t)))?,
                Node::CData(c) => emit(writer, Event::CData(BytesCData::new(c.as_str())))?,
                Node::Comment(c) => emit(writer, Event::Comment(BytesText::from_escaped(c.as_str())))?,
            }
        }
        emit(writer, Event::End(BytesEnd::new(self.name.as_str())))
    }
}

fn emit<W: io::Write>(writer: &mut Writer<W>, event: Event<'_>) -> io::Result<()> {
    writer
        .write_event(event)
        .map_err(|e| io::Error::other(e.to_string()))
}

/// A parsed XML document with a single root element.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Document {
    root: Element,
}

impl Document {
    pub fn parse(text: &str) -> Result<Self, XmlError> {
        let mut reader = Reader::from_str(text);

        let mut stack: Vec<Element> = Vec::new();
        let mut root: Option<Element> = None;

        loop {
            match reader.read_event().map_err(|e| XmlError::new(e.to_string()))? {
                Event::Start(start) => stack.push(Element::from_start(&start)?),
                Event::Empty(start) => {
                    let element = Element::from_start(&start)?;
                    attach(&mut stack, &mut root, Node::Element(element))?;
                }
                Event::End(_) => {
                    let element = stack
                        .pop()
                        .ok_or_else(|| XmlError::new("unexpected closing tag"))?;
                    attach(&mut stack, &mut root, Node::Element(element))?;
                }
                Event::Text(t) => {
                    let text = t
                        .unescape()
                        .map_err(|e| XmlError::new(e.to_string()))?
                        .into_owned();
                    // Indentation between tags; meaningful text is kept verbatim.
                    if text.trim().is_empty() {
                        continue;
                    }
                    attach(&mut stack, &mut root, Node::Text(text))?;
                }
                Event::CData(data) => {
                    let data = String::from_utf8(data.into_inner().into_owned())
                        .map_err(|e| XmlError::new(e.to_string()))?;
                    attach(&mut stack, &mut root, Node::CData(data))?;
                }
                Event::Comment(comment) => {
                    // Comments outside the root element are dropped.
                    if let Some(parent) = stack.last_mut() {
                        let comment = String::from_utf8(comment.into_inner().into_owned())
                            .map_err(|e| XmlError::new(e.to_string()))?;
                        parent.children.push(Node::Comment(comment));
                    }
                }
                Event::Eof => break,
                _ => {}
            }
        }

        if let Some(open) = stack.last() {
            return Err(XmlError::new(format!("unclosed element <{}>", open.name)));
        }
        root.map(|root| Self { root })
            .ok_or_else(|| XmlError::new("document has no root element"))
    }

    pub fn root(&self) -> &Element {
        &self.root
    }

    pub fn to_xml_string(&self) -> io::Result<String> {
        let mut writer = Writer::new(Vec::new());
        emit(
            &mut writer,
            Event::Decl(BytesDecl::new("1.0", Some("UTF-8"), None)),
        )?;
        self.root.write(&mut writer)?;
        String::from_utf8(writer.into_inner()).map_err(io::Error::other)
    }
}

fn attach(stack: &mut [Element], root: &mut Option<Element>, node: Node) -> Result<(), XmlError> {
    if let Some(parent) = stack.last_mut() {
        parent.children.push(node);
        return Ok(());
    }
    match node {
        Node::Element(element) if root.is_none() => {
            *root = Some(element);
            Ok(())
        }
        Node::Element(element) => Err(XmlError::new(format!(
            "second root element <{}>",
            element.name
        ))),
        _ => Err(XmlError::new("content outside the root element")),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const CHILDREN: &str = "<root><children><child><id>0</id></child></children></root>";

    #[test]
    fn parses_nested_elements() {
        let doc = Document::parse(CHILDREN).unwrap();
        let id = doc
            .root()
            .child("children")
            .and_then(|c| c.child("child"))
            .and_then(|c| c.child("id"))
            .unwrap();
        assert_eq!(id.text(), "0");
    }

    #[test]
    fn serialization_round_trips() {
        let doc = Document::parse(CHILDREN).unwrap();
        let text = doc.to_xml_string().unwrap();
        assert_eq!(
            text,
            format!("<?xml version=\"1.0\" encoding=\"UTF-8\"?>{CHILDREN}")
        );
        assert_eq!(Document::parse(&text).unwrap(), doc);
    }

    #[test]
    fn indentation_does_not_affect_equality() {
        let pretty = "<?xml version=\"1.0\"?>\n<root>\n  <children>\n    <child><id>0</id></child>\n  </children>\n</root>\n";
        assert_eq!(
            Document::parse(pretty).unwrap(),
            Document::parse(CHILDREN).unwrap()
        );
    }

    #[test]
    fn attributes_and_entities_are_unescaped_and_reescaped() {
        let doc = Document::parse(r#"<a href="x&amp;y">1 &lt; 2<b/></a>"#).unwrap();
        assert_eq!(doc.root().attribute("href"), Some("x&y"));
        assert_eq!(doc.root().text(), "1 < 2");
        assert!(doc.root().child("b").is_some());

        let again = Document::parse(&doc.to_xml_string().unwrap()).unwrap();
        assert_eq!(again, doc);
    }

    #[test]
    fn cdata_and_comments_survive() {
        let doc = Document::parse("<r><!--note--><![CDATA[<raw>]]></r>").unwrap();
        assert_eq!(doc.root().text(), "<raw>");
        assert!(doc.root().children.contains(&Node::Comment("note".to_string())));
        assert_eq!(Document::parse(&doc.to_xml_string().unwrap()).unwrap(), doc);
    }

    #[test]
    fn padded_text_keeps_its_spaces() {
        let doc = Document::parse("<a><name> John Smith </name></a>").unwrap();
        assert_eq!(doc.root().child("name").unwrap().text(), " John Smith ");
        let text = doc.to_xml_string().unwrap();
        assert!(text.ends_with("<a><name> John Smith </name></a>"));
        assert_eq!(Document::parse(&text).unwrap(), doc);
    }

    #[test]
    fn mixed_content_keeps_separating_spaces() {
        let doc = Document::parse("<p>one <b>two</b> three</p>").unwrap();
        assert_eq!(
            doc.root().children,
            vec![
                Node::Text("one ".to_string()),
                Node::Element(Element {
                    name: "b".to_string(),
                    attributes: Vec::new(),
                    children: vec![Node::Text("two".to_string())],
                }),
                Node::Text(" three".to_string()),
            ]
        );
        assert_eq!(doc.root().text(), "one  three");
        let text = doc.to_xml_string().unwrap();
        assert!(text.ends_with("<p>one <b>two</b> three</p>"));
    }

    #[test]
    fn mismatched_tags_are_rejected() {
        assert!(Document::parse("<a><b></a></b>").is_err());
    }

    #[test]
    fn unclosed_element_is_rejected() {
        assert!(Document::parse("<a><b></b>").is_err());
    }

    #[test]
    fn empty_input_has_no_root() {
        assert!(Document::parse("").is_err());
        assert!(Document::parse("just text").is_err());
    }

    #[test]
    fn multiple_roots_are_rejected() {
        assert!(Document::parse("<a/><b/>").is_err());
    }
}

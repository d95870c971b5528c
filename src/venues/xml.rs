use crate::error::{Result, SlistError};
use quick_xml::events::{BytesDecl, BytesStart, BytesText, Event};
use quick_xml::{Reader, Writer};
use std::fmt::Display;
use std::io;

/// An XML element kept whole, so unknown tags and attributes survive a rewrite
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Element {
    pub name: String,
    pub attributes: Vec<(String, String)>,
    pub text: String,
    pub children: Vec<Element>,
}

impl Element {
    pub fn new(name: &str) -> Self {
        Self {
            name: name.to_string(),
            ..Self::default()
        }
    }

    pub fn with_text(name: &str, text: &str) -> Self {
        Self {
            text: text.to_string(),
            ..Self::new(name)
        }
    }

    pub fn attribute(&self, name: &str) -> Option<&str> {
        self.attributes
            .iter()
            .find(|(key, _)| key == name)
            .map(|(_, value)| value.as_str())
    }

    pub fn set_attribute(&mut self, name: &str, value: &str) {
        match self.attributes.iter_mut().find(|(key, _)| key == name) {
            Some((_, current)) => *current = value.to_string(),
            None => self
                .attributes
                .push((name.to_string(), value.to_string())),
        }
    }

    pub fn child(&self, name: &str) -> Option<&Element> {
        self.children.iter().find(|child| child.name == name)
    }

    /// The named child, appended first if missing
    pub fn child_or_insert(&mut self, name: &str) -> &mut Element {
        let index = match self.children.iter().position(|child| child.name == name) {
            Some(index) => index,
            None => {
                self.children.push(Element::new(name));
                self.children.len() - 1
            }
        };

        &mut self.children[index]
    }

    /// Trimmed text of the named child
    pub fn child_text(&self, name: &str) -> Option<&str> {
        self.child(name).map(|child| child.text.trim())
    }
}

fn xml_error(err: impl Display) -> SlistError {
    SlistError::Registry(err.to_string())
}

fn open_element(start: &BytesStart) -> Result<Element> {
    let name = String::from_utf8_lossy(start.name().as_ref()).into_owned();

    let attributes = start
        .attributes()
        .map(|attribute| {
            let attribute = attribute.map_err(xml_error)?;
            let key = String::from_utf8_lossy(attribute.key.as_ref()).into_owned();
            let value = attribute.unescape_value().map_err(xml_error)?.into_owned();

            Ok((key, value))
        })
        .collect::<Result<Vec<_>>>()?;

    Ok(Element {
        name,
        attributes,
        ..Element::default()
    })
}

fn close_element(
    open: &mut [Element],
    root: &mut Option<Element>,
    element: Element,
) -> Result<()> {
    match open.last_mut() {
        Some(parent) => parent.children.push(element),
        None if root.is_none() => *root = Some(element),
        None => return Err(xml_error("more than one root element")),
    }

    Ok(())
}

/// Parses a document into its root element
pub fn parse_document(xml: &str) -> Result<Element> {
    let mut reader = Reader::from_str(xml);
    reader.config_mut().trim_text(true);

    let mut open: Vec<Element> = Vec::new();
    let mut root = None;

    loop {
        match reader.read_event().map_err(xml_error)? {
            Event::Start(start) => open.push(open_element(&start)?),
            Event::Empty(start) => {
                let element = open_element(&start)?;
                close_element(&mut open, &mut root, element)?;
            }
            Event::End(_) => {
                let element = open
                    .pop()
                    .ok_or_else(|| xml_error("closing tag without an opening one"))?;
                close_element(&mut open, &mut root, element)?;
            }
            Event::Text(text) => {
                if let Some(current) = open.last_mut() {
                    current.text.push_str(&text.unescape().map_err(xml_error)?);
                }
            }
            Event::CData(data) => {
                if let Some(current) = open.last_mut() {
                    current.text.push_str(&String::from_utf8_lossy(&data));
                }
            }
            Event::Eof => break,
            _ => {}
        }
    }

    if let Some(unclosed) = open.last() {
        return Err(xml_error(format!("unclosed element <{}>", unclosed.name)));
    }

    root.ok_or_else(|| xml_error("no root element"))
}

fn write_element(writer: &mut Writer<Vec<u8>>, element: &Element) -> io::Result<()> {
    let start = writer.create_element(element.name.as_str()).with_attributes(
        element
            .attributes
            .iter()
            .map(|(key, value)| (key.as_str(), value.as_str())),
    );

    if !element.children.is_empty() {
        start.write_inner_content(|writer| {
            for child in &element.children {
                write_element(writer, child)?;
            }
            Ok(())
        })?;
    } else if element.text.is_empty() {
        start.write_empty()?;
    } else {
        start.write_text_content(BytesText::new(&element.text))?;
    }

    Ok(())
}

/// Renders the document with an XML declaration, two-space indented
pub fn write_document(root: &Element) -> Result<String> {
    let mut writer = Writer::new_with_indent(Vec::new(), b' ', 2);

    writer.write_event(Event::Decl(BytesDecl::new("1.0", Some("utf-8"), None)))?;
    write_element(&mut writer, root)?;

    let mut xml = String::from_utf8(writer.into_inner()).map_err(xml_error)?;
    xml.push('\n');

    Ok(xml)
}

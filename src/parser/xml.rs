//! Minimal element tree on top of the quick-xml event reader.
//!
//! Katalon markup files are small, so the parsers work on a tree instead
//! of a streaming state machine. Structural problems (unbalanced or
//! unterminated elements, several roots, stray text) are reported as
//! plain messages; the calling parser attaches path and kind.

use quick_xml::events::{BytesStart, Event};
use quick_xml::Reader;
use std::str::FromStr;

/// Element with its concatenated text and child elements
#[derive(Debug, Clone, Default, PartialEq)]
pub struct XmlElement {
    pub name: String,
    pub text: String,
    pub children: Vec<XmlElement>,
}

impl XmlElement {
    fn from_start(e: &BytesStart) -> Self {
        let name = String::from_utf8_lossy(e.local_name().as_ref()).to_string();

        Self {
            name,
            text: String::new(),
            children: Vec::new(),
        }
    }

    /// First child element with the given name
    pub fn child(&self, name: &str) -> Option<&XmlElement> {
        self.children.iter().find(|c| c.name == name)
    }

    /// All child elements with the given name, in document order
    pub fn children_named<'a>(&'a self, name: &'a str) -> impl Iterator<Item = &'a XmlElement> + 'a {
        self.children.iter().filter(move |c| c.name == name)
    }

    /// Trimmed text of a child, `None` when absent or blank
    pub fn child_text(&self, name: &str) -> Option<&str> {
        self.child(name)
            .map(|c| c.text.trim())
            .filter(|t| !t.is_empty())
    }

    /// Owned trimmed text of a child, empty when absent
    pub fn text_of(&self, name: &str) -> String {
        self.child_text(name).unwrap_or_default().to_string()
    }

    /// Owned trimmed text of a child, `None` when absent or blank
    pub fn optional_text(&self, name: &str) -> Option<String> {
        self.child_text(name).map(str::to_string)
    }

    /// Case-insensitive `true` flag; absent or blank yields `default`
    pub fn child_bool(&self, name: &str, default: bool) -> bool {
        match self.child_text(name) {
            Some(value) => value.eq_ignore_ascii_case("true"),
            None => default,
        }
    }

    /// Numeric child; absent or blank yields `default`, garbage is an error
    pub fn child_number<T: FromStr>(&self, name: &str, default: T) -> Result<T, String> {
        match self.child_text(name) {
            Some(value) => value
                .parse()
                .map_err(|_| format!("field <{}> is not a number: '{}'", name, value)),
            None => Ok(default),
        }
    }
}

/// Parses a whole document into its root element
pub fn parse_document(content: &str) -> Result<XmlElement, String> {
    let mut reader = Reader::from_str(content);
    reader.trim_text(true);

    let mut buf = Vec::new();
    let mut stack: Vec<XmlElement> = Vec::new();
    let mut root: Option<XmlElement> = None;

    loop {
        match reader.read_event_into(&mut buf) {
            Ok(Event::Start(ref e)) => {
                if stack.is_empty() && root.is_some() {
                    return Err("multiple root elements".to_string());
                }
                stack.push(XmlElement::from_start(e));
            }
            Ok(Event::Empty(ref e)) => {
                attach(&mut stack, &mut root, XmlElement::from_start(e))?;
            }
            Ok(Event::End(_)) => {
                let element = stack
                    .pop()
                    .ok_or_else(|| "closing tag without matching opening tag".to_string())?;
                attach(&mut stack, &mut root, element)?;
            }
            Ok(Event::Text(e)) => {
                let text = e
                    .unescape()
                    .map_err(|err| format!("invalid text content: {}", err))?;
                match stack.last_mut() {
                    Some(element) => element.text.push_str(&text),
                    None if text.trim().is_empty() => {}
                    None => return Err("text outside of the root element".to_string()),
                }
            }
            Ok(Event::CData(e)) => {
                let bytes = e.into_inner();
                if let Some(element) = stack.last_mut() {
                    element.text.push_str(&String::from_utf8_lossy(&bytes));
                }
            }
            Ok(Event::Eof) => break,
            // Декларация, комментарии, инструкции обработки
            Ok(_) => {}
            Err(e) => {
                return Err(format!(
                    "malformed markup at byte {}: {}",
                    reader.buffer_position(),
                    e
                ))
            }
        }
        buf.clear();
    }

    if let Some(open) = stack.last() {
        return Err(format!("unterminated element <{}>", open.name));
    }

    root.ok_or_else(|| "document has no root element".to_string())
}

fn attach(
    stack: &mut [XmlElement],
    root: &mut Option<XmlElement>,
    element: XmlElement,
) -> Result<(), String> {
    if let Some(parent) = stack.last_mut() {
        parent.children.push(element);
        return Ok(());
    }
    if root.is_some() {
        return Err("multiple root elements".to_string());
    }
    *root = Some(element);
    Ok(())
}
